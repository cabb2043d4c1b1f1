//! XFBIN (NUCC) chunk container codec.
//!
//! An XFBIN file bundles scene assets as chunks. Each chunk is named by a
//! (type, path, name) [`ChunkIdentity`]. The file is laid out as:
//!
//! - a 28-byte header starting with `NUCC`
//! - the [`ChunkTable`]: string pools, one chunk map per unique identity,
//!   named references and the page index slices
//! - pages of framed records, each page closed by a `nuccChunkPage` record
//!
//! Records refer to chunks through their page's index slice. Decoding
//! resolves those indices into [`ChunkId`] handles into the container's
//! [`ChunkArena`]; encoding assigns fresh indices on first use.
//!
//! # Example
//!
//! ```no_run
//! use xfbin::{ChunkData, ChunkKind, Xfbin};
//!
//! let data = std::fs::read("1nrtbod1.xfbin")?;
//! let xfbin = Xfbin::decode(&data)?;
//!
//! for id in xfbin.chunks_by_kind(ChunkKind::Clump) {
//!     let chunk = xfbin.chunk(id)?;
//!     if let Some(ChunkData::Clump(clump)) = &chunk.data {
//!         println!("{}: {} bones", chunk.name(), clump.nodes.len());
//!     }
//! }
//!
//! std::fs::write("out.xfbin", xfbin.encode()?)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod chunk;
mod container;
mod error;
mod header;
mod identity;
mod page;
mod registry;
mod scope;
mod table;

pub mod chunks;

pub use chunk::{Chunk, ChunkArena, ChunkData, ChunkId, ChunkReference, PageMarker, RecordIds};
pub use container::{ChunkFailure, DecodeReport, Xfbin};
pub use error::{Error, Result};
pub use header::{XfbinHeader, CPK_MAGIC, XFBIN_MAGIC};
pub use identity::{ChunkIdentity, ChunkKind, TYPE_PREFIX};
pub use page::Page;
pub use registry::ChunkRegistry;
pub use scope::{DecodeScope, EncodeScope};
pub use table::{ChunkMap, ChunkMapReference, ChunkTable};

// Re-export the embedded sub-format crates
pub use xfbin_nud as nud;
pub use xfbin_nut as nut;
