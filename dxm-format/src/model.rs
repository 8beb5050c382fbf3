//! In-memory DXM model

use std::path::PathBuf;

use crate::header::DxmHeader;

/// Accepted vertex compositions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexLayout {
    /// Position + normal + texture coordinate
    Mesh,
    /// Position + RGBA8 color
    PointCloud,
}

impl VertexLayout {
    pub fn name(self) -> &'static str {
        match self {
            Self::Mesh => "mesh",
            Self::PointCloud => "point-cloud",
        }
    }
}

/// Chunk size descriptor preceding the vertex and index payloads
///
/// Only uncompressed chunks are supported, so `compressed_size` is carried
/// for diagnostics only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub compressed_size: u64,
    pub uncompressed_size: u64,
}

/// Raw per-group index run, width chosen by the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Indices {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl Indices {
    pub fn len(&self) -> usize {
        match self {
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate indices widened to `u32`
    pub fn iter(&self) -> Box<dyn Iterator<Item = u32> + '_> {
        match self {
            Self::U16(v) => Box::new(v.iter().map(|&x| x as u32)),
            Self::U32(v) => Box::new(v.iter().copied()),
        }
    }

    /// Width of one stored index in bytes
    pub fn byte_width(&self) -> u8 {
        match self {
            Self::U16(_) => 2,
            Self::U32(_) => 4,
        }
    }
}

/// Remapped face-corner indices into the attribute pools
///
/// All present arrays have the same length as the group's raw index run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FaceIndices {
    pub positions: Vec<u32>,
    pub normals: Option<Vec<u32>>,
    pub uvs: Option<Vec<u32>>,
}

impl FaceIndices {
    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }
}

/// One sub-mesh sharing a single texture
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DxmGroup {
    /// Byte offset into the index table (informational)
    pub offset: u64,
    /// Number of indices in this group
    pub length: u64,
    /// Texture name exactly as stored, `None` for untextured groups
    pub texture: Option<String>,
    /// Raw per-vertex indices, `None` when the group was never populated
    pub indices: Option<Indices>,
    /// Pool indices per face corner, filled in by optimization
    pub faces: Option<FaceIndices>,
}

/// Canonical attribute pools produced by deduplication
///
/// Entries are canonical decimal text (`"x y z"` / `"u v"`) in first
/// occurrence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributePools {
    pub positions: Vec<String>,
    pub normals: Option<Vec<String>>,
    pub uvs: Option<Vec<String>>,
}

/// Decoded DXM model
#[derive(Debug, Clone, PartialEq)]
pub struct DxmModel {
    /// File the model was decoded from, if it came from disk
    pub source: Option<PathBuf>,
    pub header: DxmHeader,
    pub groups: Vec<DxmGroup>,
    pub vertex_chunk: ChunkDescriptor,
    pub index_chunk: ChunkDescriptor,
    /// `vertex_count * 3` floats
    pub positions: Vec<f32>,
    /// `vertex_count * 3` floats, mesh layout only
    pub normals: Option<Vec<f32>>,
    /// `vertex_count * 2` floats, mesh layout only
    pub uvs: Option<Vec<f32>>,
    /// `vertex_count * 4` bytes, point-cloud layout only
    pub colors: Option<Vec<u8>>,
    /// Deduplicated attributes, `None` until optimized
    pub pools: Option<AttributePools>,
}

impl DxmModel {
    pub fn new(header: DxmHeader) -> Self {
        Self {
            source: None,
            header,
            groups: Vec::new(),
            vertex_chunk: ChunkDescriptor::default(),
            index_chunk: ChunkDescriptor::default(),
            positions: Vec::new(),
            normals: None,
            uvs: None,
            colors: None,
            pools: None,
        }
    }

    pub fn layout(&self) -> Option<VertexLayout> {
        self.header.layout()
    }

    /// Number of raw vertices actually decoded
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Triangles across all groups, counted from the raw index runs
    pub fn triangle_count(&self) -> usize {
        self.groups
            .iter()
            .filter_map(|g| g.indices.as_ref())
            .map(|i| i.len() / 3)
            .sum()
    }

    pub fn is_optimized(&self) -> bool {
        self.pools.is_some()
    }
}
