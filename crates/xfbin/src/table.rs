//! The chunk table: string pools, chunk maps, references and page indices.
//!
//! ```text
//! u32 type count, type pool size
//! u32 path count, path pool size
//! u32 name count, name pool size
//! u32 map count,  map section size
//! u32 index count
//! u32 reference count
//! type pool, path pool, name pool   (null-terminated strings, aligned to 4)
//! maps        [type, path, name] u32 triples
//! references  [name, map] u32 pairs
//! indices     u32 map index per page-local slot, pages concatenated
//! ```

use indexmap::IndexSet;
use xfbin_common::{BinaryReader, BinaryWriter};

use crate::error::count_u32;
use crate::{ChunkIdentity, Error, Result};

const MAP_ENTRY_SIZE: usize = 12;
const REFERENCE_ENTRY_SIZE: usize = 8;

/// Pool indices of one chunk identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkMap {
    pub type_index: u32,
    pub path_index: u32,
    pub name_index: u32,
}

/// A named reference to a chunk map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkMapReference {
    pub name_index: u32,
    pub map_index: u32,
}

/// The decoded chunk table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkTable {
    pub types: Vec<String>,
    pub paths: Vec<String>,
    pub names: Vec<String>,
    pub maps: Vec<ChunkMap>,
    pub references: Vec<ChunkMapReference>,
    pub indices: Vec<u32>,
}

impl ChunkTable {
    /// Read the table that follows the file header.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let type_count = reader.read_u32()? as usize;
        let _type_size = reader.read_u32()?;
        let path_count = reader.read_u32()? as usize;
        let _path_size = reader.read_u32()?;
        let name_count = reader.read_u32()? as usize;
        let _name_size = reader.read_u32()?;
        let map_count = reader.read_u32()? as usize;
        let _map_size = reader.read_u32()?;
        let index_count = reader.read_u32()? as usize;
        let reference_count = reader.read_u32()? as usize;

        let types = read_pool(reader, type_count)?;
        let paths = read_pool(reader, path_count)?;
        let names = read_pool(reader, name_count)?;
        reader.align(4)?;

        // Check the fixed-size sections up front so a corrupt count fails
        // before any allocation.
        let needed = map_count
            .saturating_mul(MAP_ENTRY_SIZE)
            .saturating_add(reference_count.saturating_mul(REFERENCE_ENTRY_SIZE))
            .saturating_add(index_count.saturating_mul(4));
        if needed > reader.remaining() {
            return Err(xfbin_common::Error::UnexpectedEof {
                offset: reader.position(),
                needed,
                available: reader.remaining(),
            }
            .into());
        }

        let mut maps = Vec::with_capacity(map_count);
        for _ in 0..map_count {
            maps.push(ChunkMap {
                type_index: reader.read_u32()?,
                path_index: reader.read_u32()?,
                name_index: reader.read_u32()?,
            });
        }

        let mut references = Vec::with_capacity(reference_count);
        for _ in 0..reference_count {
            references.push(ChunkMapReference {
                name_index: reader.read_u32()?,
                map_index: reader.read_u32()?,
            });
        }

        let indices = reader.read_u32_vec(index_count)?;

        Ok(Self {
            types,
            paths,
            names,
            maps,
            references,
            indices,
        })
    }

    /// Build a table from identities in global order.
    ///
    /// Pool entries are assigned in first-seen order while walking the
    /// identities, then reference names are appended to the name pool.
    /// `references` pairs a reference name with the global index of its target.
    pub fn build(
        identities: &IndexSet<ChunkIdentity>,
        references: &[(String, usize)],
        indices: Vec<u32>,
    ) -> Result<Self> {
        let mut types = IndexSet::new();
        let mut paths = IndexSet::new();
        let mut names = IndexSet::new();

        let mut maps = Vec::with_capacity(identities.len());
        for identity in identities {
            maps.push(ChunkMap {
                type_index: pool_index(&mut types, &identity.type_name)?,
                path_index: pool_index(&mut paths, &identity.path)?,
                name_index: pool_index(&mut names, &identity.name)?,
            });
        }

        let mut chunk_references = Vec::with_capacity(references.len());
        for (name, map_index) in references {
            chunk_references.push(ChunkMapReference {
                name_index: pool_index(&mut names, name)?,
                map_index: count_u32("chunk map index", *map_index)?,
            });
        }

        Ok(Self {
            types: types.into_iter().collect(),
            paths: paths.into_iter().collect(),
            names: names.into_iter().collect(),
            maps,
            references: chunk_references,
            indices,
        })
    }

    /// Serialize the table.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut pools = BinaryWriter::new();
        let mut pool_sizes = [0u32; 3];
        for (size, pool) in pool_sizes
            .iter_mut()
            .zip([&self.types, &self.paths, &self.names])
        {
            let start = pools.position();
            for entry in pool {
                pools.write_cstring(entry);
            }
            *size = count_u32("string pool size", pools.position() - start)?;
        }

        let mut out = BinaryWriter::new();
        for (pool, size) in [&self.types, &self.paths, &self.names]
            .into_iter()
            .zip(pool_sizes)
        {
            out.write_u32(count_u32("string pool count", pool.len())?);
            out.write_u32(size);
        }
        out.write_u32(count_u32("chunk map count", self.maps.len())?);
        out.write_u32(count_u32("chunk map size", self.maps.len() * MAP_ENTRY_SIZE)?);
        out.write_u32(count_u32("chunk map index count", self.indices.len())?);
        out.write_u32(count_u32("chunk reference count", self.references.len())?);

        out.write_bytes(pools.as_bytes());
        out.align(4);

        for map in &self.maps {
            out.write_u32(map.type_index);
            out.write_u32(map.path_index);
            out.write_u32(map.name_index);
        }
        for reference in &self.references {
            out.write_u32(reference.name_index);
            out.write_u32(reference.map_index);
        }
        out.write_u32_slice(&self.indices);

        Ok(out.into_bytes())
    }

    /// Bytes taken by the reference section, which the header's table size excludes.
    pub fn reference_section_size(&self) -> usize {
        self.references.len() * REFERENCE_ENTRY_SIZE
    }

    /// The (type, path, name) strings of a chunk map.
    pub fn props(&self, map_index: u32) -> Result<(&str, &str, &str)> {
        let map = self
            .maps
            .get(map_index as usize)
            .ok_or(Error::ChunkMapIndexOutOfBounds {
                index: map_index,
                len: self.maps.len(),
            })?;
        Ok((
            pool_entry(&self.types, "type", map.type_index)?,
            pool_entry(&self.paths, "path", map.path_index)?,
            pool_entry(&self.names, "name", map.name_index)?,
        ))
    }

    /// Build the identity of a chunk map.
    pub fn identity(&self, map_index: u32) -> Result<ChunkIdentity> {
        let (type_name, path, name) = self.props(map_index)?;
        Ok(ChunkIdentity::new(type_name, path, name))
    }

    /// The name string of a reference entry.
    pub fn reference_name(&self, reference: &ChunkMapReference) -> Result<&str> {
        pool_entry(&self.names, "name", reference.name_index)
    }
}

fn read_pool(reader: &mut BinaryReader<'_>, count: usize) -> Result<Vec<String>> {
    // Every entry takes at least its terminator.
    if count > reader.remaining() {
        return Err(xfbin_common::Error::UnexpectedEof {
            offset: reader.position(),
            needed: count,
            available: reader.remaining(),
        }
        .into());
    }
    (0..count)
        .map(|_| Ok(reader.read_cstring()?.to_owned()))
        .collect()
}

fn pool_index(pool: &mut IndexSet<String>, value: &str) -> Result<u32> {
    let index = match pool.get_index_of(value) {
        Some(index) => index,
        None => pool.insert_full(value.to_owned()).0,
    };
    count_u32("string pool index", index)
}

fn pool_entry<'a>(pool: &'a [String], name: &'static str, index: u32) -> Result<&'a str> {
    pool.get(index as usize)
        .map(String::as_str)
        .ok_or(Error::StringIndexOutOfBounds {
            pool: name,
            index,
            len: pool.len(),
        })
}
