//! DXM file parser

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::cursor::DxmReader;
use crate::error::DxmError;
use crate::header::{AcceptedLayouts, DxmHeader, read_header, validate_header};
use crate::model::{ChunkDescriptor, DxmGroup, DxmModel, Indices, VertexLayout};
use crate::{PACKED_EXTENSION, RAW_EXTENSION};


/// Load a DXM model from disk
///
/// A `.dxm` path is redirected to its unpacked `.dlm` sibling; any other
/// extension is read directly. The file is closed before this returns,
/// whether decoding succeeded or not.
///
/// # Example
/// ```ignore
/// let model = dxm_format::load_model("crate.dlm")?;
/// println!("{} groups", model.groups.len());
/// ```
pub fn load_model(path: impl AsRef<Path>) -> Result<DxmModel, DxmError> {
    tracing::info!("## Loading DXM ##");

    let source = resolve_source_path(path.as_ref())?;
    let file = File::open(&source).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DxmError::MissingSourceFile(source.clone()),
        _ => DxmError::Io(e),
    })?;

    let mut model = read_model(BufReader::new(file))?;
    model.source = Some(source);
    Ok(model)
}

/// Pick the file that actually holds decodable data for `path`
///
/// - `foo.dxm` with a `foo.dlm` sibling resolves to the sibling
/// - `foo.dxm` without a sibling is rejected as a packed container
/// - anything else must exist as given
pub fn resolve_source_path(path: &Path) -> Result<PathBuf, DxmError> {
    let packed = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(PACKED_EXTENSION));

    if packed {
        let sibling = path.with_extension(RAW_EXTENSION);
        if sibling.is_file() {
            tracing::debug!("Reading {:?} in place of {:?}", sibling, path);
            return Ok(sibling);
        }
        if path.exists() {
            return Err(DxmError::PackedContainer(path.to_path_buf()));
        }
        return Err(DxmError::MissingSourceFile(sibling));
    }

    if !path.is_file() {
        return Err(DxmError::MissingSourceFile(path.to_path_buf()));
    }
    Ok(path.to_path_buf())
}

/// Decode a complete model from a byte stream
///
/// Bytes after the last group's indices are left unread.
pub fn read_model<R: Read>(source: R) -> Result<DxmModel, DxmError> {
    let mut reader = DxmReader::new(source);

    let header = read_header(&mut reader)?;
    let layouts = validate_header(&header)?;

    let mut model = DxmModel::new(header);
    model.groups = read_groups(&mut reader, model.header.group_count)?;

    read_vertex_chunk(&mut reader, &layouts, &mut model)?;
    read_index_chunk(&mut reader, &model.header, &mut model.groups, &mut model.index_chunk)?;

    tracing::info!(
        "Loaded DXM model: {} vertices, {} groups, {} triangles",
        model.vertex_count(),
        model.groups.len(),
        model.triangle_count()
    );

    Ok(model)
}

/// Read `count` group table entries in storage order
pub(crate) fn read_groups<R: Read>(
    reader: &mut DxmReader<R>,
    count: u16,
) -> Result<Vec<DxmGroup>, DxmError> {
    tracing::info!("Loading DXM groups...");

    let mut groups = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let offset = reader.read_u64("group offset")?;
        let length = reader.read_u64("group length")?;
        let texture = read_texture_name(reader)?;

        tracing::debug!(
            "Group {}: offset={}, length={}, texture={:?}",
            groups.len(),
            offset,
            length,
            texture
        );

        groups.push(DxmGroup {
            offset,
            length,
            texture,
            ..Default::default()
        });
    }

    Ok(groups)
}

/// Read a length-prefixed, null-terminated texture name
///
/// The length counts the terminator, so zero means "no texture".
pub(crate) fn read_texture_name<R: Read>(
    reader: &mut DxmReader<R>,
) -> Result<Option<String>, DxmError> {
    let len = reader.read_u16("texture name length")?;
    if len == 0 {
        return Ok(None);
    }

    let bytes = reader.read_bytes(len as usize - 1, "texture name")?;
    let _terminator = reader.read_u8("texture name terminator")?;

    Ok(Some(latin1_to_string(&bytes)))
}

fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn read_chunk_descriptor<R: Read>(reader: &mut DxmReader<R>) -> Result<ChunkDescriptor, DxmError> {
    Ok(ChunkDescriptor {
        compressed_size: reader.read_u64("chunk compressed size")?,
        uncompressed_size: reader.read_u64("chunk uncompressed size")?,
    })
}

/// Read the vertex chunk according to the validated layout
pub(crate) fn read_vertex_chunk<R: Read>(
    reader: &mut DxmReader<R>,
    layouts: &AcceptedLayouts,
    model: &mut DxmModel,
) -> Result<(), DxmError> {
    tracing::info!("Loading DXM vertex data...");

    model.vertex_chunk = read_chunk_descriptor(reader)?;
    let start = reader.position();
    let count = model.header.vertex_count;

    model.positions = reader.read_f32s(count.saturating_mul(3), "positions")?;

    match layouts.classify(model.header.vertex_flags) {
        Some(VertexLayout::Mesh) => {
            model.normals = Some(reader.read_f32s(count.saturating_mul(3), "normals")?);
            model.uvs = Some(reader.read_f32s(count.saturating_mul(2), "uvs")?);
        }
        Some(VertexLayout::PointCloud) => {
            model.colors = Some(reader.read_elements(count, 4, "colors")?);
        }
        None => {
            return Err(DxmError::UnsupportedVertexLayout(
                model.header.vertex_flags.bits(),
            ));
        }
    }

    log_size_mismatch("vertex", &model.vertex_chunk, reader.position() - start);
    Ok(())
}

/// Read every group's index run, contiguous and in group order
pub(crate) fn read_index_chunk<R: Read>(
    reader: &mut DxmReader<R>,
    header: &DxmHeader,
    groups: &mut [DxmGroup],
    descriptor: &mut ChunkDescriptor,
) -> Result<(), DxmError> {
    tracing::info!("Loading DXM index data...");

    *descriptor = read_chunk_descriptor(reader)?;
    let start = reader.position();

    for group in groups.iter_mut() {
        group.indices = Some(match header.index_byte_width {
            2 => Indices::U16(reader.read_u16s(group.length, "indices")?),
            4 => Indices::U32(reader.read_u32s(group.length, "indices")?),
            width => return Err(DxmError::UnsupportedIndexWidth(width)),
        });
    }

    log_size_mismatch("index", descriptor, reader.position() - start);
    Ok(())
}

fn log_size_mismatch(chunk: &str, descriptor: &ChunkDescriptor, consumed: u64) {
    if descriptor.uncompressed_size != consumed {
        tracing::debug!(
            "{} chunk declares {} bytes but {} were read",
            chunk,
            descriptor.uncompressed_size,
            consumed
        );
    }
}
