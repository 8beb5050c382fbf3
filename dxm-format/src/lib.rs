//! dxm-format: decoder for the DXM/DLM binary mesh container
//!
//! This crate reads the raw (`.dlm`) form of a DXM model into a [`DxmModel`]:
//! header, group table, de-interleaved vertex attributes and per-group index
//! runs. It performs no geometry processing; deduplication and OBJ export live
//! in `dxm-export`.
//!
//! # Layout Overview
//!
//! ```text
//! header        40 bytes (see header::HEADER_SIZE)
//! group table   group_count x (offset u64, length u64, name_len u16, name bytes)
//! vertex chunk  descriptor (2 x u64) + positions [+ normals + uvs | colors]
//! index chunk   descriptor (2 x u64) + per-group u16/u32 index runs
//! ```
//!
//! All values are little-endian with no padding between fields.
//!
//! # Usage
//!
//! ```ignore
//! use dxm_format::load_model;
//!
//! let model = load_model("tree.dlm")?;
//! println!("{} vertices in {} groups", model.vertex_count(), model.groups.len());
//! ```

mod cursor;
mod error;
mod header;
mod model;
mod parser;

pub use cursor::DxmReader;
pub use error::DxmError;
pub use header::{
    AcceptedLayouts, Compression, DxmHeader, Encoding, HEADER_SIZE, VertexFlags, read_header,
    validate_header,
};
pub use model::{
    AttributePools, ChunkDescriptor, DxmGroup, DxmModel, FaceIndices, Indices, VertexLayout,
};
pub use parser::{load_model, read_model, resolve_source_path};

// =============================================================================
// Constants
// =============================================================================

/// Format identifier expected in the first four header bytes
pub const DXM_MAGIC: &[u8; 4] = b"DXM1";

/// Oldest supported (major, minor) format version
pub const MIN_VERSION: (u8, u8) = (2, 2);

/// Extension of the packed/archival container (not decodable)
pub const PACKED_EXTENSION: &str = "dxm";

/// Extension of the directly readable raw container
pub const RAW_EXTENSION: &str = "dlm";
