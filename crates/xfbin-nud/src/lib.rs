//! NDP3 mesh format.
//!
//! Model chunks embed a complete NDP3 file. A file holds mesh groups, each
//! group holds meshes, and each mesh owns:
//!
//! - a vertex buffer whose layout is picked by a two-nibble format byte
//!   (bone influence kind × vertex attribute kind)
//! - face indices, usually a triangle strip with `0xFFFF` restarts
//! - up to four materials, each with texture bindings and named float properties
//!
//! # Example
//!
//! ```no_run
//! use xfbin_nud::Nud;
//!
//! let data = std::fs::read("model.nud")?;
//! let nud = Nud::parse(&data)?;
//! for group in &nud.mesh_groups {
//!     for mesh in &group.meshes {
//!         println!("{}: {} triangles", group.name, mesh.triangles().len());
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod header;
mod mesh;
mod parser;
mod writer;

pub mod strip;

pub use error::{Error, Result};
pub use header::NudHeader;
pub use mesh::{
    BoneType, Material, MaterialProperty, MaterialTexture, Mesh, MeshGroup, Nud, Vertex,
    VertexType, FACE_SIZE_TRIANGLE_LIST,
};

/// NDP3 file magic bytes.
pub const NUD_MAGIC: &[u8; 4] = b"NDP3";
