//! DXM decoding error types

use std::path::PathBuf;
use thiserror::Error;

/// DXM decoding error types
///
/// Every variant is fatal for the model being loaded; there is no partial
/// model fallback.
#[derive(Error, Debug)]
pub enum DxmError {
    /// Stream ended before a field or block was fully read
    #[error(
        "truncated input while reading {field} at byte {offset}: expected {expected} bytes, {available} available"
    )]
    TruncatedInput {
        field: &'static str,
        offset: u64,
        expected: usize,
        available: usize,
    },

    /// Identifier bytes are not "DXM1"
    #[error("unsupported file format of type {0:?} (expected \"DXM1\")")]
    UnsupportedFormat(String),

    /// Version older than 2.2
    #[error("outdated format version {major}.{minor} (minimum supported is 2.2)")]
    OutdatedFormatVersion { major: u8, minor: u8 },

    /// Anything but de-interleaved vertex data
    #[error("unsupported vertex encoding {0} (only de-interleaved data is supported)")]
    UnsupportedEncoding(u8),

    /// Anything but uncompressed chunks
    #[error("unsupported compression {0} (only uncompressed data is supported)")]
    UnsupportedCompression(u8),

    /// Vertex composition flags other than the mesh or point-cloud layouts
    #[error("unsupported vertex layout 0x{0:08X} (expected 0x00000007 or 0x00000009)")]
    UnsupportedVertexLayout(u32),

    /// Index width other than 2 or 4 bytes
    #[error("unsupported index width of {0} bytes (expected 2 or 4)")]
    UnsupportedIndexWidth(u8),

    /// A block size that cannot be addressed on this platform
    #[error("{field} of {elements} elements is too large to load")]
    BlockTooLarge { field: &'static str, elements: u64 },

    /// A `.dxm` archive without an unpacked `.dlm` sibling
    #[error("unpacking of DXM files is not supported: {0:?} has no .dlm sibling")]
    PackedContainer(PathBuf),

    /// The input file (or its required `.dlm` sibling) does not exist
    #[error("source file not found: {0:?}")]
    MissingSourceFile(PathBuf),

    /// IO error while opening or reading the source
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
