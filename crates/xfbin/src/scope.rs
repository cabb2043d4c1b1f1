//! Page-local index resolution.
//!
//! Chunk payloads refer to other chunks by their slot in the page's index
//! slice, or by position in the page's reference list. [`DecodeScope`] turns
//! those numbers into [`ChunkId`] handles; [`EncodeScope`] hands out slots
//! for handles while a page is written.

use indexmap::IndexSet;

use crate::error::count_u32;
use crate::{ChunkArena, ChunkId, ChunkIdentity, ChunkKind, ChunkReference, Error, RecordIds, Result};

/// Read-only view of one page while its payloads are decoded.
#[derive(Debug, Clone, Copy)]
pub struct DecodeScope<'a> {
    arena: &'a ChunkArena,
    locals: &'a [ChunkId],
    references: &'a [ChunkReference],
    ids: RecordIds,
}

impl<'a> DecodeScope<'a> {
    pub fn new(arena: &'a ChunkArena, locals: &'a [ChunkId], references: &'a [ChunkReference]) -> Self {
        Self {
            arena,
            locals,
            references,
            ids: RecordIds::default(),
        }
    }

    /// The same scope for a record with the given header words.
    pub fn with_ids(self, ids: RecordIds) -> Self {
        Self { ids, ..self }
    }

    pub fn ids(&self) -> RecordIds {
        self.ids
    }

    /// Resolve a page-local index.
    pub fn chunk(&self, index: u32) -> Result<ChunkId> {
        self.locals
            .get(index as usize)
            .copied()
            .ok_or(Error::ChunkIndexOutOfBounds {
                index,
                len: self.locals.len(),
            })
    }

    /// Resolve a page-local index, treating slots that hold the Null chunk as absent.
    pub fn optional_chunk(&self, index: u32) -> Result<Option<ChunkId>> {
        let id = self.chunk(index)?;
        Ok((!self.is_null(id)).then_some(id))
    }

    /// Resolve a signed page-local index where `-1` means absent.
    pub fn signed_chunk(&self, index: i32) -> Result<Option<ChunkId>> {
        match u32::try_from(index) {
            Ok(index) => self.chunk(index).map(Some),
            Err(_) => Ok(None),
        }
    }

    /// Resolve an index into the page's reference list.
    pub fn reference(&self, index: u32) -> Result<&'a ChunkReference> {
        self.references
            .get(index as usize)
            .ok_or(Error::ReferenceIndexOutOfBounds {
                index,
                len: self.references.len(),
            })
    }

    pub fn identity(&self, id: ChunkId) -> Option<&'a ChunkIdentity> {
        self.arena.get(id).map(|chunk| &chunk.identity)
    }

    fn is_null(&self, id: ChunkId) -> bool {
        self.identity(id)
            .is_some_and(|identity| identity.type_name == ChunkKind::Null.type_name())
    }
}

/// Slot assignment for one page while it is written.
#[derive(Debug)]
pub struct EncodeScope<'a> {
    arena: &'a ChunkArena,
    locals: IndexSet<ChunkIdentity>,
    references: Vec<ChunkReference>,
    ids: RecordIds,
}

impl<'a> EncodeScope<'a> {
    pub fn new(arena: &'a ChunkArena, references: Vec<ChunkReference>) -> Self {
        Self {
            arena,
            locals: IndexSet::new(),
            references,
            ids: RecordIds::default(),
        }
    }

    /// Reserve slots for `ids` in order, so previously decoded indices stay valid.
    pub fn seed(&mut self, ids: &[ChunkId]) -> Result<()> {
        for &id in ids {
            self.index_of(id)?;
        }
        Ok(())
    }

    pub fn ids(&self) -> RecordIds {
        self.ids
    }

    pub fn set_ids(&mut self, ids: RecordIds) {
        self.ids = ids;
    }

    /// The page-local slot of a chunk, assigned on first use.
    pub fn index_of(&mut self, id: ChunkId) -> Result<u32> {
        let identity = &self.arena.chunk(id)?.identity;
        self.identity_index(identity)
    }

    /// The page-local slot of an identity, assigned on first use.
    pub fn identity_index(&mut self, identity: &ChunkIdentity) -> Result<u32> {
        let index = match self.locals.get_index_of(identity) {
            Some(index) => index,
            None => self.locals.insert_full(identity.clone()).0,
        };
        count_u32("page-local index", index)
    }

    /// Slot of an optional chunk; absent chunks point at the Null chunk.
    pub fn optional_index(&mut self, id: Option<ChunkId>) -> Result<u32> {
        match id {
            Some(id) => self.index_of(id),
            None => self.identity_index(&ChunkIdentity::null()),
        }
    }

    /// Slot of an optional chunk; absent chunks are written as `-1`.
    pub fn signed_index(&mut self, id: Option<ChunkId>) -> Result<i32> {
        match id {
            Some(id) => {
                let index = self.index_of(id)?;
                i32::try_from(index).map_err(|_| Error::overflow("page-local index", index as usize))
            }
            None => Ok(-1),
        }
    }

    /// Position of a reference in the page's list, appending it if missing.
    pub fn reference_index(&mut self, reference: &ChunkReference) -> Result<u32> {
        self.arena.chunk(reference.chunk)?;
        let index = match self.references.iter().position(|r| r == reference) {
            Some(index) => index,
            None => {
                self.references.push(reference.clone());
                self.references.len() - 1
            }
        };
        count_u32("reference index", index)
    }

    pub fn references(&self) -> &[ChunkReference] {
        &self.references
    }

    pub fn locals(&self) -> &IndexSet<ChunkIdentity> {
        &self.locals
    }

    pub fn into_parts(self) -> (IndexSet<ChunkIdentity>, Vec<ChunkReference>) {
        (self.locals, self.references)
    }
}
