//! The XFBIN container: header, chunk table and pages.
//!
//! Decoding reads the header and chunk table, then pages until the end of
//! the file. Each page is a run of records closed by a `nuccChunkPage`
//! record whose payload says how many index slots and references the page
//! used. Record payloads are decoded only once the page's slice is known,
//! since payload indices point into that slice.
//!
//! Encoding walks the pages in order. Every page gets fresh Null and Page
//! records, local slots are handed out on first use, and the global chunk
//! maps are collected in first-seen order across all pages.

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace, warn};
use xfbin_common::{BinaryReader, BinaryWriter};
use zerocopy::IntoBytes;

use crate::chunks::{decode_payload, encode_payload};
use crate::error::count_u32;
use crate::{
    Chunk, ChunkArena, ChunkData, ChunkId, ChunkIdentity, ChunkKind, ChunkReference, ChunkRegistry,
    ChunkTable, DecodeScope, EncodeScope, Error, Page, PageMarker, RecordIds, Result, XfbinHeader,
};

/// Size of the fixed part of a record.
const RECORD_HEADER_SIZE: usize = 12;

/// A chunk whose payload could not be decoded and was kept as raw bytes.
#[derive(Debug)]
pub struct ChunkFailure {
    pub identity: ChunkIdentity,
    /// Index of the page the record was read from.
    pub page: usize,
    pub error: Error,
}

/// Recovered failures from one decode.
#[derive(Debug, Default)]
pub struct DecodeReport {
    pub failures: Vec<ChunkFailure>,
}

impl DecodeReport {
    /// True when every payload decoded into its typed form.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A decoded XFBIN file.
///
/// Chunks are owned by the container's arena and shared by handle; a chunk
/// listed in several pages is stored once.
#[derive(Debug, Clone, Default)]
pub struct Xfbin {
    pub header: XfbinHeader,
    pub pages: Vec<Page>,
    arena: ChunkArena,
}

/// One framed record, payload still undecoded.
struct Record<'a> {
    local: u32,
    ids: RecordIds,
    payload: &'a [u8],
}

impl<'a> Record<'a> {
    fn read(reader: &mut BinaryReader<'a>) -> Result<Self> {
        let size = reader.read_u32()? as usize;
        let local = reader.read_u32()?;
        let ids = RecordIds {
            id: reader.read_u16()?,
            unk: reader.read_u16()?,
        };
        let payload = reader.read_bytes(size)?;
        Ok(Self {
            local,
            ids,
            payload,
        })
    }
}

fn write_record(out: &mut BinaryWriter, local: u32, ids: RecordIds, payload: &[u8]) -> Result<()> {
    out.write_u32(count_u32("record size", payload.len())?);
    out.write_u32(local);
    out.write_u16(ids.id);
    out.write_u16(ids.unk);
    out.write_bytes(payload);
    Ok(())
}

/// The resolved chunk table, shared by every page during a decode.
struct Layout<'a> {
    indices: &'a [ChunkId],
    references: &'a [ChunkReference],
    page_start: usize,
    reference_start: usize,
}

impl<'a> Layout<'a> {
    fn resolve(&self, local: u32) -> Result<ChunkId> {
        self.page_start
            .checked_add(local as usize)
            .and_then(|index| self.indices.get(index))
            .copied()
            .ok_or(Error::ChunkIndexOutOfBounds {
                index: local,
                len: self.indices.len().saturating_sub(self.page_start),
            })
    }

    fn page_slices(&self, marker: PageMarker) -> Result<(&'a [ChunkId], &'a [ChunkReference])> {
        let locals = self
            .page_start
            .checked_add(marker.page_size as usize)
            .and_then(|end| self.indices.get(self.page_start..end))
            .ok_or(Error::ChunkIndexOutOfBounds {
                index: marker.page_size,
                len: self.indices.len().saturating_sub(self.page_start),
            })?;
        let references = self
            .reference_start
            .checked_add(marker.reference_size as usize)
            .and_then(|end| self.references.get(self.reference_start..end))
            .ok_or(Error::ReferenceIndexOutOfBounds {
                index: marker.reference_size,
                len: self.references.len().saturating_sub(self.reference_start),
            })?;
        Ok((locals, references))
    }
}

/// The codec for a record's payload. Markers are recognised by name so a
/// custom registry cannot break page framing.
fn payload_kind(registry: &ChunkRegistry, identity: &ChunkIdentity) -> ChunkKind {
    match ChunkKind::from_type_name(&identity.type_name) {
        Some(kind @ (ChunkKind::Null | ChunkKind::Page)) => kind,
        _ => registry.kind_of(&identity.type_name),
    }
}

/// Decode one payload, keeping the raw bytes when the typed decode fails.
fn decode_or_keep(
    chunk: &Chunk,
    kind: ChunkKind,
    payload: &[u8],
    scope: &DecodeScope<'_>,
    page: usize,
    report: &mut DecodeReport,
) -> Result<ChunkData> {
    match decode_payload(kind, payload, scope) {
        Ok(data) => Ok(data),
        Err(error) if error.is_recoverable() => {
            warn!(
                "Failed to decode {} in page {page}, keeping raw bytes: {error}",
                chunk.identity
            );
            report.failures.push(ChunkFailure {
                identity: chunk.identity.clone(),
                page,
                error,
            });
            Ok(ChunkData::Opaque(payload.to_vec()))
        }
        Err(error) => Err(error),
    }
}

fn decode_page(
    reader: &mut BinaryReader<'_>,
    arena: &mut ChunkArena,
    registry: &ChunkRegistry,
    layout: &mut Layout<'_>,
    page_index: usize,
    report: &mut DecodeReport,
) -> Result<Page> {
    let page_offset = reader.position();

    // Keyed by local slot; a repeated slot keeps its first position.
    let mut records: IndexMap<u32, Record<'_>> = IndexMap::new();
    let marker = loop {
        if reader.is_empty() {
            return Err(Error::MissingPageMarker {
                offset: page_offset,
            });
        }
        let record_offset = reader.position();
        let record = Record::read(reader)?;
        let identity = &arena.chunk(layout.resolve(record.local)?)?.identity;
        trace!(
            "Record at {record_offset:#x}: slot {} -> {identity}, {} bytes",
            record.local,
            record.payload.len()
        );

        let is_marker = identity.type_name == ChunkKind::Page.type_name();
        let marker_payload = record.payload;
        records.insert(record.local, record);
        if is_marker {
            break PageMarker::read(&mut BinaryReader::new(marker_payload))?;
        }
    };

    let (locals, references) = layout.page_slices(marker)?;

    let mut decoded = Vec::with_capacity(records.len());
    {
        let arena: &ChunkArena = &*arena;
        let scope = DecodeScope::new(arena, locals, references);
        for (&local, record) in &records {
            let id = scope.chunk(local)?;
            let chunk = arena.chunk(id)?;
            let kind = payload_kind(registry, &chunk.identity);
            let data = decode_or_keep(
                chunk,
                kind,
                record.payload,
                &scope.with_ids(record.ids),
                page_index,
                report,
            )?;
            decoded.push((id, record.ids, data));
        }
    }

    let mut page = Page {
        chunks: Vec::with_capacity(decoded.len()),
        references: references.to_vec(),
        initial_chunks: locals.to_vec(),
    };
    for (id, ids, data) in decoded {
        if let Some(chunk) = arena.get_mut(id) {
            chunk.data = Some(data);
            chunk.ids = ids;
        }
        page.chunks.push(id);
    }

    debug!(
        "Page {page_index} at {page_offset:#x}: {} chunks, {} slots, {} references",
        page.chunks.len(),
        marker.page_size,
        marker.reference_size
    );

    layout.page_start += marker.page_size as usize;
    layout.reference_start += marker.reference_size as usize;
    Ok(page)
}

/// What one encoded page contributes to the chunk table.
struct EncodedPage {
    locals: IndexSet<ChunkIdentity>,
    references: Vec<ChunkReference>,
    null_slot: u32,
}

impl Xfbin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a file with the standard registry, logging recovered failures.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let (xfbin, _) = Self::decode_with_report(data, &ChunkRegistry::standard())?;
        Ok(xfbin)
    }

    /// Decode a file, returning the chunks whose payloads were kept as raw bytes.
    pub fn decode_with_report(data: &[u8], registry: &ChunkRegistry) -> Result<(Self, DecodeReport)> {
        let mut reader = BinaryReader::new(data);
        let header = XfbinHeader::read(&mut reader)?;
        let table = ChunkTable::read(&mut reader)?;

        let mut arena = ChunkArena::new();
        let mut map_ids = Vec::with_capacity(table.maps.len());
        for map_index in 0..table.maps.len() {
            map_ids.push(arena.insert(table.identity(map_index as u32)?));
        }
        let map_id = |index: u32| {
            map_ids
                .get(index as usize)
                .copied()
                .ok_or(Error::ChunkMapIndexOutOfBounds {
                    index,
                    len: map_ids.len(),
                })
        };

        let references = table
            .references
            .iter()
            .map(|reference| {
                Ok(ChunkReference::new(
                    table.reference_name(reference)?,
                    map_id(reference.map_index)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        let indices = table
            .indices
            .iter()
            .map(|&index| map_id(index))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Chunk table: {} chunk maps, {} indices, {} references",
            table.maps.len(),
            indices.len(),
            references.len()
        );

        let mut layout = Layout {
            indices: &indices,
            references: &references,
            page_start: 0,
            reference_start: 0,
        };
        let mut report = DecodeReport::default();
        let mut pages = Vec::new();
        while !reader.is_empty() {
            let page = decode_page(
                &mut reader,
                &mut arena,
                registry,
                &mut layout,
                pages.len(),
                &mut report,
            )?;
            pages.push(page);
        }

        Ok((
            Self {
                header,
                pages,
                arena,
            },
            report,
        ))
    }

    /// Encode the container.
    ///
    /// Every handle is checked before any payload is written, so a dangling
    /// handle or a chunk without data fails without partial output.
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.validate()?;

        let mut global: IndexSet<ChunkIdentity> = IndexSet::new();
        let mut indices = Vec::new();
        let mut named_targets = Vec::new();
        let mut leading_null = None;
        let mut pages = BinaryWriter::new();

        for page in &self.pages {
            let encoded = self.encode_page(page, &mut pages)?;
            leading_null.get_or_insert(encoded.null_slot);

            for identity in encoded.locals {
                let (index, _) = global.insert_full(identity);
                indices.push(count_u32("chunk map index", index)?);
            }
            for reference in encoded.references {
                let identity = self.arena.chunk(reference.chunk)?.identity.clone();
                named_targets.push((reference.name, identity));
            }
        }

        // A reference may point at a chunk no page lists; it still needs a map.
        let references: Vec<(String, usize)> = named_targets
            .into_iter()
            .map(|(name, identity)| (name, global.insert_full(identity).0))
            .collect();

        let table = ChunkTable::build(&global, &references, indices)?;
        let table_bytes = table.to_bytes()?;
        let table_size = count_u32(
            "chunk table size",
            table_bytes.len() - table.reference_section_size(),
        )?;

        let mut out = BinaryWriter::with_capacity(
            crate::header::RawHeader::SIZE + table_bytes.len() + RECORD_HEADER_SIZE + pages.position(),
        );
        out.write_bytes(self.header.to_raw(table_size).as_bytes());
        out.write_bytes(&table_bytes);
        if let Some(slot) = leading_null {
            write_record(&mut out, slot, RecordIds::default(), &[])?;
        }
        out.write_bytes(pages.as_bytes());

        debug!(
            "Encoded {} pages, {} chunk maps, {} bytes",
            self.pages.len(),
            global.len(),
            out.position()
        );
        Ok(out.into_bytes())
    }

    fn validate(&self) -> Result<()> {
        for page in &self.pages {
            for &id in page.chunks.iter().chain(&page.initial_chunks) {
                self.arena.chunk(id)?;
            }
            for reference in &page.references {
                self.arena.chunk(reference.chunk)?;
            }
            for &id in &page.chunks {
                let chunk = self.arena.chunk(id)?;
                if chunk.data.is_none() && !chunk.kind().is_marker() {
                    return Err(missing_data(chunk));
                }
            }
        }
        Ok(())
    }

    /// The identity a page uses for a marker kind, preferring the one it was read with.
    fn marker_identity(&self, page: &Page, kind: ChunkKind) -> ChunkIdentity {
        page.chunks
            .iter()
            .chain(&page.initial_chunks)
            .filter_map(|&id| self.arena.get(id))
            .find(|chunk| chunk.identity.type_name == kind.type_name())
            .map(|chunk| chunk.identity.clone())
            .unwrap_or_else(|| match kind {
                ChunkKind::Null => ChunkIdentity::null(),
                ChunkKind::Page => ChunkIdentity::page(),
                _ => ChunkIdentity::index(),
            })
    }

    fn marker_ids(&self, identity: &ChunkIdentity) -> RecordIds {
        self.arena
            .find(identity)
            .and_then(|id| self.arena.get(id))
            .map_or_else(RecordIds::default, |chunk| chunk.ids)
    }

    fn encode_page(&self, page: &Page, out: &mut BinaryWriter) -> Result<EncodedPage> {
        let content = page
            .chunks
            .iter()
            .map(|&id| self.arena.chunk(id))
            .filter(|chunk| !chunk.as_ref().is_ok_and(|chunk| chunk.kind().is_marker()))
            .collect::<Result<Vec<_>>>()?;

        let mut scope = EncodeScope::new(&self.arena, page.references.clone());
        if content.iter().any(|chunk| chunk.is_passthrough()) {
            scope.seed(&page.initial_chunks)?;
        }

        let null = self.marker_identity(page, ChunkKind::Null);
        let null_slot = scope.identity_index(&null)?;
        write_record(out, null_slot, self.marker_ids(&null), &[])?;

        for chunk in content {
            let data = chunk.data.as_ref().ok_or_else(|| missing_data(chunk))?;
            scope.set_ids(chunk.ids);
            let slot = scope.identity_index(&chunk.identity)?;
            let payload = encode_payload(data, &mut scope)?;
            write_record(out, slot, chunk.ids, &payload)?;
        }

        let page_identity = self.marker_identity(page, ChunkKind::Page);
        let page_slot = scope.identity_index(&page_identity)?;
        // The index chunk takes the last slot but has no record.
        scope.identity_index(&self.marker_identity(page, ChunkKind::Index))?;

        let marker = PageMarker {
            page_size: count_u32("page size", scope.locals().len())?,
            reference_size: count_u32("page reference count", scope.references().len())?,
        };
        let mut payload = BinaryWriter::with_capacity(PageMarker::SIZE);
        marker.write(&mut payload);
        write_record(out, page_slot, self.marker_ids(&page_identity), payload.as_bytes())?;

        let (locals, references) = scope.into_parts();
        Ok(EncodedPage {
            locals,
            references,
            null_slot,
        })
    }

    pub fn arena(&self) -> &ChunkArena {
        &self.arena
    }

    pub fn chunk(&self, id: ChunkId) -> Result<&Chunk> {
        self.arena.chunk(id)
    }

    pub fn chunk_mut(&mut self, id: ChunkId) -> Result<&mut Chunk> {
        self.arena.get_mut(id).ok_or(Error::DanglingChunk(id.index()))
    }

    pub fn find(&self, identity: &ChunkIdentity) -> Option<ChunkId> {
        self.arena.find(identity)
    }

    /// Store a chunk, replacing the data of an existing chunk with the same identity.
    ///
    /// The chunk is not added to any page.
    pub fn add_chunk(&mut self, identity: ChunkIdentity, data: ChunkData) -> ChunkId {
        self.arena.insert_with_data(identity, data)
    }

    /// Get or create the chunk with this identity, without data.
    pub fn insert_identity(&mut self, identity: ChunkIdentity) -> ChunkId {
        self.arena.insert(identity)
    }

    /// Chunks of a kind, in page order. A chunk listed in several pages appears once per page.
    pub fn chunks_by_kind(&self, kind: ChunkKind) -> Vec<ChunkId> {
        self.pages
            .iter()
            .flat_map(|page| page.chunks_by_kind(&self.arena, kind))
            .collect()
    }

    /// Content chunks grouped by kind, kinds in first-seen order.
    pub fn type_chunk_map(&self) -> IndexMap<ChunkKind, Vec<ChunkId>> {
        let mut map: IndexMap<ChunkKind, Vec<ChunkId>> = IndexMap::new();
        for &id in self.pages.iter().flat_map(|page| &page.chunks) {
            let Some(chunk) = self.arena.get(id) else {
                continue;
            };
            let kind = chunk.kind();
            if !kind.is_marker() {
                map.entry(kind).or_default().push(id);
            }
        }
        map
    }

    /// Indices of the pages holding at least one chunk of a kind.
    pub fn pages_by_kind(&self, kind: ChunkKind) -> Vec<usize> {
        self.pages
            .iter()
            .enumerate()
            .filter(|(_, page)| !page.chunks_by_kind(&self.arena, kind).is_empty())
            .map(|(index, _)| index)
            .collect()
    }

    /// Index of the first page listing the chunk.
    pub fn chunk_page(&self, chunk: ChunkId) -> Option<usize> {
        self.pages.iter().position(|page| page.contains(chunk))
    }

    /// Replace the page listing the chunk with a page holding only the chunk.
    ///
    /// Returns the page index, or `None` when no page lists the chunk.
    pub fn update_chunk_page(&mut self, chunk: ChunkId) -> Option<usize> {
        let index = self.chunk_page(chunk)?;
        let mut page = Page::new();
        page.add_chunk(chunk);
        self.pages[index] = page;
        Some(index)
    }

    /// Put the chunk on its own page, replacing the page that listed it or appending a new one.
    pub fn add_chunk_page(&mut self, chunk: ChunkId) -> usize {
        if let Some(index) = self.update_chunk_page(chunk) {
            return index;
        }
        let mut page = Page::new();
        page.add_chunk(chunk);
        self.pages.push(page);
        self.pages.len() - 1
    }

    /// Remove the page listing the chunk. Returns whether a page was removed.
    pub fn remove_chunk_page(&mut self, chunk: ChunkId) -> bool {
        match self.chunk_page(chunk) {
            Some(index) => {
                self.pages.remove(index);
                true
            }
            None => false,
        }
    }

    /// Build a page for a clump and everything it uses, replacing its old page.
    ///
    /// The page lists each model (after its hit volume), the coords, the clump
    /// and the models' materials. Textures with data get pages of their own,
    /// updated in place when one exists and otherwise added before the clump
    /// page. Returns the clump page's index.
    pub fn add_clump_page(&mut self, clump_id: ChunkId) -> Result<usize> {
        let chunk = self.arena.chunk(clump_id)?;
        let Some(ChunkData::Clump(clump)) = &chunk.data else {
            return Err(Error::invalid(
                "clump",
                format!("{} is not a decoded clump", chunk.identity),
            ));
        };

        let mut page = Page::new();
        let mut materials = IndexSet::new();
        let models: IndexSet<ChunkId> = clump.models.iter().copied().chain(clump.group_models()).collect();
        for model_id in models {
            if let Some(ChunkData::Model(model)) = &self.arena.chunk(model_id)?.data {
                if let Some(hit) = model.hit {
                    if self.arena.chunk(hit)?.kind() == ChunkKind::ModelHit {
                        page.add_chunk(hit);
                    }
                }
                materials.extend(model.materials.iter().copied());
            }
            page.add_chunk(model_id);
        }

        for coord in clump.coords() {
            page.add_chunk(coord);
        }
        page.add_chunk(clump_id);

        let mut textures = IndexSet::new();
        for material_id in materials {
            page.add_chunk(material_id);
            if let Some(ChunkData::Material(material)) = &self.arena.chunk(material_id)?.data {
                textures.extend(material.textures());
            }
        }
        let textures: Vec<ChunkId> = textures
            .into_iter()
            .filter(|&texture| self.arena.get(texture).is_some_and(|chunk| chunk.data.is_some()))
            .collect();

        self.remove_chunk_page(clump_id);

        let mut texture_pages = Vec::new();
        for texture in textures {
            if self.update_chunk_page(texture).is_none() {
                let mut texture_page = Page::new();
                texture_page.add_chunk(texture);
                texture_pages.push(texture_page);
            }
        }

        self.pages.extend(texture_pages);
        self.pages.push(page);
        Ok(self.pages.len() - 1)
    }

    /// Remove every page. Chunks stay in the arena, so handles remain valid.
    pub fn clear(&mut self) {
        self.pages.clear();
    }

    /// Encode one chunk's payload with indices relative to the page's initial slice.
    ///
    /// This is the payload [`import_page`](Self::import_page) expects back.
    pub fn encode_chunk_payload(&self, page: &Page, chunk: ChunkId) -> Result<Vec<u8>> {
        let chunk = self.arena.chunk(chunk)?;
        let data = chunk.data.as_ref().ok_or_else(|| missing_data(chunk))?;

        let mut scope = EncodeScope::new(&self.arena, page.references.clone());
        scope.seed(&page.initial_chunks)?;
        scope.set_ids(chunk.ids);
        encode_payload(data, &mut scope)
    }

    /// Rebuild a page from its index slice, references and raw payloads.
    ///
    /// Payload indices resolve against `chunk_maps`. Payloads that fail to
    /// decode are kept as raw bytes with a warning. Returns the new page's index.
    pub fn import_page(
        &mut self,
        registry: &ChunkRegistry,
        chunk_maps: &[ChunkIdentity],
        references: &[(String, ChunkIdentity)],
        chunks: &[(ChunkIdentity, Vec<u8>)],
    ) -> Result<usize> {
        let locals: Vec<ChunkId> = chunk_maps
            .iter()
            .map(|identity| self.arena.insert(identity.clone()))
            .collect();
        let references: Vec<ChunkReference> = references
            .iter()
            .map(|(name, identity)| ChunkReference::new(name.as_str(), self.arena.insert(identity.clone())))
            .collect();
        let ids: Vec<ChunkId> = chunks
            .iter()
            .map(|(identity, _)| self.arena.insert(identity.clone()))
            .collect();

        let page_index = self.pages.len();
        let mut report = DecodeReport::default();
        let mut decoded = Vec::with_capacity(chunks.len());
        {
            let scope = DecodeScope::new(&self.arena, &locals, &references);
            for (&id, (_, payload)) in ids.iter().zip(chunks) {
                let chunk = self.arena.chunk(id)?;
                let kind = payload_kind(registry, &chunk.identity);
                let data = decode_or_keep(chunk, kind, payload, &scope, page_index, &mut report)?;
                decoded.push((id, data));
            }
        }
        for (id, data) in decoded {
            if let Some(chunk) = self.arena.get_mut(id) {
                chunk.data = Some(data);
            }
        }

        let mut page = Page {
            references,
            initial_chunks: locals,
            ..Page::default()
        };
        for id in ids {
            page.add_chunk(id);
        }
        self.pages.push(page);
        Ok(page_index)
    }
}

fn missing_data(chunk: &Chunk) -> Error {
    Error::MissingChunkData {
        name: chunk.identity.name.clone(),
        type_name: chunk.identity.type_name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::Coord;

    fn coord_chunk(xfbin: &mut Xfbin, name: &str) -> ChunkId {
        xfbin.add_chunk(
            ChunkIdentity::new("nuccChunkCoord", "c/body.max", name),
            ChunkData::Coord(Coord::default()),
        )
    }

    #[test]
    fn test_empty_container_round_trip() {
        let bytes = Xfbin::new().encode().unwrap();
        let decoded = Xfbin::decode(&bytes).unwrap();
        assert!(decoded.pages.is_empty());
        assert_eq!(decoded.header, XfbinHeader::default());
    }

    #[test]
    fn test_page_framing() {
        let mut xfbin = Xfbin::new();
        let coord = coord_chunk(&mut xfbin, "root");
        xfbin.add_chunk_page(coord);

        let bytes = xfbin.encode().unwrap();
        let decoded = Xfbin::decode(&bytes).unwrap();
        assert_eq!(decoded.pages.len(), 1);

        // Null, coord, page marker; the index chunk has a slot but no record.
        let page = &decoded.pages[0];
        assert_eq!(page.chunks.len(), 3);
        assert_eq!(page.initial_chunks.len(), 4);
        let kinds: Vec<ChunkKind> = page
            .chunks
            .iter()
            .map(|&id| decoded.chunk(id).unwrap().kind())
            .collect();
        assert_eq!(kinds, [ChunkKind::Null, ChunkKind::Coord, ChunkKind::Page]);

        let marker = page.chunks[2];
        assert_eq!(
            decoded.chunk(marker).unwrap().data,
            Some(ChunkData::Page(PageMarker {
                page_size: 4,
                reference_size: 0
            }))
        );
    }

    #[test]
    fn test_missing_page_marker() {
        let mut xfbin = Xfbin::new();
        let coord = coord_chunk(&mut xfbin, "root");
        xfbin.add_chunk_page(coord);
        let bytes = xfbin.encode().unwrap();

        // Drop the 20-byte page marker record.
        let truncated = &bytes[..bytes.len() - 20];
        assert!(matches!(
            Xfbin::decode(truncated),
            Err(Error::MissingPageMarker { .. })
        ));
    }

    #[test]
    fn test_missing_data_fails_encode() {
        let mut xfbin = Xfbin::new();
        let coord = xfbin.insert_identity(ChunkIdentity::new("nuccChunkCoord", "a.max", "root"));
        xfbin.add_chunk_page(coord);
        assert!(matches!(
            xfbin.encode(),
            Err(Error::MissingChunkData { .. })
        ));
    }

    #[test]
    fn test_chunk_page_editing() {
        let mut xfbin = Xfbin::new();
        let a = coord_chunk(&mut xfbin, "a");
        let b = coord_chunk(&mut xfbin, "b");

        assert_eq!(xfbin.add_chunk_page(a), 0);
        assert_eq!(xfbin.add_chunk_page(b), 1);
        xfbin.pages[0].add_chunk(b);

        assert_eq!(xfbin.chunk_page(b), Some(0));
        assert_eq!(xfbin.update_chunk_page(b), Some(0));
        assert_eq!(xfbin.pages[0].chunks, vec![b]);
        assert_eq!(xfbin.chunk_page(a), None);

        assert!(xfbin.remove_chunk_page(b));
        assert_eq!(xfbin.pages.len(), 1);
        assert!(!xfbin.remove_chunk_page(a));

        let map = xfbin.type_chunk_map();
        assert_eq!(map.get(&ChunkKind::Coord), Some(&vec![b]));
        assert_eq!(xfbin.pages_by_kind(ChunkKind::Coord), vec![0]);

        xfbin.clear();
        assert!(xfbin.pages.is_empty());
        assert!(xfbin.chunk(a).is_ok());
    }
}
