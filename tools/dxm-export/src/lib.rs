//! dxm-export library
//!
//! Converts DXM/DLM meshes to OBJ/MTL: decode with `dxm-format`, deduplicate
//! attributes with [`optimize`], then write text files with [`export`].

pub mod canonical;
pub mod export;
pub mod optimize;
pub mod output;
pub mod texture;
pub mod transform;

use std::path::Path;

use thiserror::Error;

pub use dxm_format::{DxmError, DxmModel, load_model};
pub use export::{ExportError, ExportOptions, ExportReport, export};
pub use optimize::{OptimizeError, OptimizeStats, optimize, optimize_with_stats};
pub use transform::ExportTransform;

/// Any failure of the load → optimize → export pipeline
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error(transparent)]
    Decode(#[from] DxmError),

    #[error(transparent)]
    Optimize(#[from] OptimizeError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Load, optimize and export one file
///
/// The output folder is created inside `destination`, or next to the model
/// when `None`.
pub fn convert_file(
    input: &Path,
    destination: Option<&Path>,
    options: &ExportOptions,
) -> Result<ExportReport, ConvertError> {
    let model = optimize(load_model(input)?)?;

    let source_folder = model
        .source
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let destination = destination.unwrap_or(&source_folder);

    Ok(export(&model, destination, options)?)
}
