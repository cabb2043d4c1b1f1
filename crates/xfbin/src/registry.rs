//! Type name to codec dispatch.

use std::collections::HashMap;

use log::debug;

use crate::ChunkKind;

/// Maps on-disk type names to the codec used for their payloads.
///
/// Built once and passed by reference to the decoder. Names that are not
/// registered decode as opaque raw bytes.
#[derive(Debug, Clone)]
pub struct ChunkRegistry {
    kinds: HashMap<String, ChunkKind>,
}

impl ChunkRegistry {
    /// An empty registry. Every name decodes as opaque bytes.
    pub fn empty() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// A registry with every built-in chunk type.
    pub fn standard() -> Self {
        let kinds = ChunkKind::ALL
            .into_iter()
            .map(|kind| (kind.type_name().to_owned(), kind))
            .collect();
        Self { kinds }
    }

    /// Register a type name whose payload is kept as raw bytes.
    pub fn register_opaque(&mut self, type_name: impl Into<String>) -> &mut Self {
        self.kinds.insert(type_name.into(), ChunkKind::Binary);
        self
    }

    pub fn register(&mut self, type_name: impl Into<String>, kind: ChunkKind) -> &mut Self {
        self.kinds.insert(type_name.into(), kind);
        self
    }

    /// Resolve a type name, falling back to [`ChunkKind::Unknown`].
    pub fn kind_of(&self, type_name: &str) -> ChunkKind {
        match self.kinds.get(type_name) {
            Some(kind) => *kind,
            None => {
                debug!("Unknown chunk type '{type_name}', keeping raw bytes");
                ChunkKind::Unknown
            }
        }
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.kinds.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for ChunkRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
