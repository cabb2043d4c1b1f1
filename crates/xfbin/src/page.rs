//! Pages: the unit of index and reference scoping.

use crate::{ChunkArena, ChunkId, ChunkKind, ChunkReference};

/// An ordered run of chunks closed by a page marker on the wire.
///
/// A decoded page lists its chunks in record order, including the Null and
/// Page marker chunks. The encoder skips markers and writes fresh ones, so
/// pages built by hand only need their content chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub chunks: Vec<ChunkId>,
    /// Named pointers used by animation payloads.
    pub references: Vec<ChunkReference>,
    /// The page's index slice as it was read.
    ///
    /// Payloads kept as raw bytes still hold indices into this slice, so the
    /// encoder reserves these slots first when such payloads are present.
    pub initial_chunks: Vec<ChunkId>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = ChunkId> + '_ {
        self.chunks.iter().copied()
    }

    pub fn contains(&self, chunk: ChunkId) -> bool {
        self.chunks.contains(&chunk)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Add a chunk unless the page already lists it.
    ///
    /// Chunks are deduplicated by identity in the arena, so a chunk with the
    /// same identity is the same handle and replaces itself in place.
    pub fn add_chunk(&mut self, chunk: ChunkId) {
        if !self.contains(chunk) {
            self.chunks.push(chunk);
        }
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    /// Drop the Null and Page marker chunks.
    pub fn cleanup(&mut self, arena: &ChunkArena) {
        self.chunks
            .retain(|&id| !arena.get(id).is_some_and(|chunk| chunk.kind().is_marker()));
    }

    pub fn chunks_by_kind(&self, arena: &ChunkArena, kind: ChunkKind) -> Vec<ChunkId> {
        self.chunks
            .iter()
            .copied()
            .filter(|&id| arena.get(id).is_some_and(|chunk| chunk.kind() == kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChunkData, ChunkIdentity, PageMarker};

    #[test]
    fn test_add_and_cleanup() {
        let mut arena = ChunkArena::new();
        let null = arena.insert_with_data(ChunkIdentity::null(), ChunkData::Null);
        let coord = arena.insert(ChunkIdentity::new("nuccChunkCoord", "a.max", "root"));
        let marker = arena.insert_with_data(ChunkIdentity::page(), ChunkData::Page(PageMarker::default()));

        let mut page = Page::new();
        page.add_chunk(null);
        page.add_chunk(coord);
        page.add_chunk(coord);
        page.add_chunk(marker);
        assert_eq!(page.len(), 3);
        assert_eq!(page.chunks_by_kind(&arena, ChunkKind::Coord), vec![coord]);

        page.cleanup(&arena);
        assert_eq!(page.chunks, vec![coord]);

        page.clear();
        assert!(page.is_empty());
    }
}
