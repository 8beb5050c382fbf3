//! DXM header record and validation
//!
//! # Layout
//! ```text
//! 0x00: identifier [u8; 4]  ("DXM1")
//! 0x04: major_version u8
//! 0x05: minor_version u8
//! 0x06: encoding u8
//! 0x07: compression u8
//! 0x08: vertex_count u64
//! 0x10: vertex_flags u32
//! 0x14: group_count u16
//! 0x16: index_format u8
//! 0x17: index_byte_width u8 (2 or 4)
//! 0x18: vertex_table_offset u64
//! 0x20: index_table_offset u64
//! ```

use std::fmt;
use std::io::Read;

use crate::cursor::DxmReader;
use crate::error::DxmError;
use crate::model::VertexLayout;
use crate::{DXM_MAGIC, MIN_VERSION};

/// Size of the fixed header record in bytes
pub const HEADER_SIZE: usize = 40;

/// Vertex attribute encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Attributes interleaved per vertex (not implemented)
    Interleaved = 0,
    /// One contiguous block per attribute
    DeInterleaved = 1,
    /// Quantized byte-packed attributes (not implemented)
    BytePack = 2,
}

impl Encoding {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Interleaved),
            1 => Some(Self::DeInterleaved),
            2 => Some(Self::BytePack),
            _ => None,
        }
    }
}

/// Chunk compression scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None = 0,
    /// LZ77 compressed chunks (not implemented)
    Lz77 = 1,
}

impl Compression {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Lz77),
            _ => None,
        }
    }
}

/// Vertex composition bit set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VertexFlags(pub u32);

impl VertexFlags {
    /// Position, 3 x f32
    pub const POSITION: Self = Self(1);
    /// Normal, 3 x f32
    pub const NORMAL: Self = Self(1 << 1);
    /// Texture coordinate, 2 x f32
    pub const TEXCOORD: Self = Self(1 << 2);
    /// Vertex color, 4 x u8
    pub const COLOR: Self = Self(1 << 3);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl std::ops::BitOr for VertexFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl fmt::Display for VertexFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (Self::POSITION, "POSITION"),
            (Self::NORMAL, "NORMAL"),
            (Self::TEXCOORD, "TEXCOORD"),
            (Self::COLOR, "COLOR"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("NONE")?;
        }
        Ok(())
    }
}

/// The two vertex compositions this decoder accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptedLayouts {
    pub mesh: VertexFlags,
    pub point_cloud: VertexFlags,
}

impl AcceptedLayouts {
    pub const fn new() -> Self {
        Self {
            mesh: VertexFlags::POSITION
                .union(VertexFlags::NORMAL)
                .union(VertexFlags::TEXCOORD),
            point_cloud: VertexFlags::POSITION.union(VertexFlags::COLOR),
        }
    }

    /// Map a composition to its layout, if it is one of the accepted ones
    pub fn classify(&self, flags: VertexFlags) -> Option<VertexLayout> {
        if flags == self.mesh {
            Some(VertexLayout::Mesh)
        } else if flags == self.point_cloud {
            Some(VertexLayout::PointCloud)
        } else {
            None
        }
    }

    pub fn flags_for(&self, layout: VertexLayout) -> VertexFlags {
        match layout {
            VertexLayout::Mesh => self.mesh,
            VertexLayout::PointCloud => self.point_cloud,
        }
    }
}

impl Default for AcceptedLayouts {
    fn default() -> Self {
        Self::new()
    }
}

/// DXM header record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DxmHeader {
    pub identifier: [u8; 4],
    pub major_version: u8,
    pub minor_version: u8,
    pub encoding: u8,
    pub compression: u8,
    pub vertex_count: u64,
    pub vertex_flags: VertexFlags,
    pub group_count: u16,
    pub index_format: u8,
    pub index_byte_width: u8,
    pub vertex_table_offset: u64,
    pub index_table_offset: u64,
}

impl DxmHeader {
    /// Header for a supported file (DXM1 2.2, de-interleaved, uncompressed)
    pub fn new(
        layout: VertexLayout,
        vertex_count: u64,
        group_count: u16,
        index_byte_width: u8,
    ) -> Self {
        Self {
            identifier: *DXM_MAGIC,
            major_version: MIN_VERSION.0,
            minor_version: MIN_VERSION.1,
            encoding: Encoding::DeInterleaved as u8,
            compression: Compression::None as u8,
            vertex_count,
            vertex_flags: AcceptedLayouts::new().flags_for(layout),
            group_count,
            index_format: 0,
            index_byte_width,
            vertex_table_offset: 0,
            index_table_offset: 0,
        }
    }

    /// Identifier bytes mapped one-to-one onto characters
    pub fn identifier_text(&self) -> String {
        self.identifier.iter().map(|&b| b as char).collect()
    }

    /// Packed version number (`major * 256 + minor`)
    pub fn version(&self) -> u32 {
        self.major_version as u32 * 256 + self.minor_version as u32
    }

    /// Layout of this header's composition flags, if accepted
    pub fn layout(&self) -> Option<VertexLayout> {
        AcceptedLayouts::new().classify(self.vertex_flags)
    }
}

/// Read the fixed header fields in storage order
pub fn read_header<R: Read>(reader: &mut DxmReader<R>) -> Result<DxmHeader, DxmError> {
    tracing::info!("Loading DXM header...");

    let identifier = reader.read_bytes(4, "identifier")?;
    let identifier = [identifier[0], identifier[1], identifier[2], identifier[3]];

    Ok(DxmHeader {
        identifier,
        major_version: reader.read_u8("major version")?,
        minor_version: reader.read_u8("minor version")?,
        encoding: reader.read_u8("encoding")?,
        compression: reader.read_u8("compression")?,
        vertex_count: reader.read_u64("vertex count")?,
        vertex_flags: VertexFlags(reader.read_u32("vertex flags")?),
        group_count: reader.read_u16("group count")?,
        index_format: reader.read_u8("index format")?,
        index_byte_width: reader.read_u8("index byte width")?,
        vertex_table_offset: reader.read_u64("vertex table offset")?,
        index_table_offset: reader.read_u64("index table offset")?,
    })
}

/// Validate a decoded header before any data chunk is read
///
/// Returns the accepted layout combinations so callers can branch on the
/// header's composition without rebuilding them.
pub fn validate_header(header: &DxmHeader) -> Result<AcceptedLayouts, DxmError> {
    tracing::info!("Validating DXM header...");

    let layouts = AcceptedLayouts::new();

    if &header.identifier != DXM_MAGIC {
        return Err(DxmError::UnsupportedFormat(header.identifier_text()));
    }

    let minimum = MIN_VERSION.0 as u32 * 256 + MIN_VERSION.1 as u32;
    if header.version() < minimum {
        return Err(DxmError::OutdatedFormatVersion {
            major: header.major_version,
            minor: header.minor_version,
        });
    }

    if Encoding::from_u8(header.encoding) != Some(Encoding::DeInterleaved) {
        return Err(DxmError::UnsupportedEncoding(header.encoding));
    }

    if Compression::from_u8(header.compression) != Some(Compression::None) {
        return Err(DxmError::UnsupportedCompression(header.compression));
    }

    if layouts.classify(header.vertex_flags).is_none() {
        return Err(DxmError::UnsupportedVertexLayout(header.vertex_flags.bits()));
    }

    if !matches!(header.index_byte_width, 2 | 4) {
        return Err(DxmError::UnsupportedIndexWidth(header.index_byte_width));
    }

    tracing::debug!(
        "DXM {}.{}: {} vertices ({}), {} groups, {}-byte indices",
        header.major_version,
        header.minor_version,
        header.vertex_count,
        header.vertex_flags,
        header.group_count,
        header.index_byte_width
    );

    Ok(layouts)
}
