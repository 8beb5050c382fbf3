//! OBJ/MTL emission
//!
//! Writes an optimized model into a fresh folder as `<name>.obj` and
//! `<name>.mtl`, then copies any textures it can find next to them.

use std::io::Write;
use std::path::{Path, PathBuf};

use dxm_format::{AttributePools, DxmModel, FaceIndices};
use thiserror::Error;

use crate::output::create_output_dir;
use crate::texture::{TextureSearch, normalize_texture_name};
use crate::transform::{ExportTransform, Pose};

/// Material name written for groups without a texture
pub const NULL_MATERIAL: &str = "null";

/// Base name used when the model has no source path
pub const DEFAULT_NAME: &str = "model";

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    /// `export` was called before `optimize`
    #[error("model has not been optimized; run optimize before export")]
    NotOptimized,

    /// Creating the output folder or writing a file failed
    #[error("failed to write {path:?}: {source}")]
    OutputWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Copying a resolved texture failed (logged, never returned)
    #[error("failed to copy texture {name:?}: {source}")]
    TextureCopyFailure {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Export settings
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Output base name; defaults to the source file stem
    pub name: Option<String>,
    /// Folders searched for textures after the model folder and its `Textures` subfolder
    pub texture_dirs: Vec<PathBuf>,
    pub transform: ExportTransform,
}

/// What an export produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub directory: PathBuf,
    pub obj_path: PathBuf,
    pub mtl_path: PathBuf,
    /// Distinct materials in the `.mtl`
    pub materials: Vec<String>,
    pub copied_textures: Vec<PathBuf>,
    /// Referenced textures found in none of the search folders
    pub missing_textures: Vec<String>,
    /// Textures found but not copied
    pub failed_textures: Vec<String>,
}

/// Write an optimized model to a new folder inside `destination`
pub fn export(
    model: &DxmModel,
    destination: &Path,
    options: &ExportOptions,
) -> Result<ExportReport, ExportError> {
    tracing::info!("## Exporting OBJ ##");

    let pools = model.pools.as_ref().ok_or(ExportError::NotOptimized)?;

    let name = options
        .name
        .clone()
        .or_else(|| {
            model
                .source
                .as_deref()
                .and_then(Path::file_stem)
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| DEFAULT_NAME.to_string());

    let directory = create_output_dir(destination, &name)?;
    let obj_path = directory.join(format!("{}.obj", name));
    let mtl_path = directory.join(format!("{}.mtl", name));
    let mtl_file = format!("{}.mtl", name);

    let materials = collect_materials(model);
    let pose = options.transform.pose();

    let mut obj = Vec::new();
    write_obj(&mut obj, model, pools, &name, &mtl_file, pose.as_ref()).map_err(|source| {
        ExportError::OutputWriteFailure {
            path: obj_path.clone(),
            source,
        }
    })?;
    write_file(&obj_path, &obj)?;

    let mut mtl = Vec::new();
    write_mtl(&mut mtl, &materials, &name).map_err(|source| ExportError::OutputWriteFailure {
        path: mtl_path.clone(),
        source,
    })?;
    write_file(&mtl_path, &mtl)?;

    let search = match model.source.as_deref() {
        Some(source) => TextureSearch::for_model(source, &options.texture_dirs),
        None => TextureSearch::new(options.texture_dirs.clone()),
    };

    let mut report = ExportReport {
        directory,
        obj_path,
        mtl_path,
        materials,
        ..Default::default()
    };
    copy_textures(&search, &mut report);

    tracing::info!(
        "Exported {:?}: {} materials, {} textures copied, {} missing",
        report.obj_path,
        report.materials.len(),
        report.copied_textures.len(),
        report.missing_textures.len()
    );

    Ok(report)
}

fn write_file(path: &Path, data: &[u8]) -> Result<(), ExportError> {
    std::fs::write(path, data).map_err(|source| ExportError::OutputWriteFailure {
        path: path.to_path_buf(),
        source,
    })
}

/// Distinct normalized texture names in first-appearance group order
pub fn collect_materials(model: &DxmModel) -> Vec<String> {
    let mut materials: Vec<String> = Vec::new();
    for name in model
        .groups
        .iter()
        .filter_map(|g| g.texture.as_deref())
        .filter_map(normalize_texture_name)
    {
        if !materials.contains(&name) {
            materials.push(name);
        }
    }
    materials
}

fn copy_textures(search: &TextureSearch, report: &mut ExportReport) {
    for name in &report.materials {
        let Some(source) = search.resolve(name) else {
            tracing::info!("Texture {:?} not found, skipping", name);
            report.missing_textures.push(name.clone());
            continue;
        };

        let target = report.directory.join(name);
        if target.exists() {
            let err = ExportError::TextureCopyFailure {
                name: name.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    format!("{:?} already exists in the output folder", name),
                ),
            };
            tracing::warn!("{}", err);
            report.failed_textures.push(name.clone());
            continue;
        }

        match std::fs::copy(&source, &target) {
            Ok(_) => {
                tracing::debug!("Copied texture {:?} -> {:?}", source, target);
                report.copied_textures.push(target);
            }
            Err(source) => {
                let err = ExportError::TextureCopyFailure {
                    name: name.clone(),
                    source,
                };
                tracing::warn!("{}", err);
                report.failed_textures.push(name.clone());
            }
        }
    }
}

/// Write the OBJ text for an optimized model
///
/// Pooled tuples are emitted verbatim unless a pose is given.
pub fn write_obj<W: Write>(
    w: &mut W,
    model: &DxmModel,
    pools: &AttributePools,
    name: &str,
    mtl_file: &str,
    pose: Option<&Pose>,
) -> std::io::Result<()> {
    let normals = pools.normals.as_deref().unwrap_or_default();
    let uvs = pools.uvs.as_deref().unwrap_or_default();
    let triangles: usize = model
        .groups
        .iter()
        .filter_map(|g| g.faces.as_ref())
        .map(FaceIndices::triangle_count)
        .sum();

    writeln!(w, "# DXM model exported by dxm-export {}", env!("CARGO_PKG_VERSION"))?;
    if let Some(source) = model.source.as_deref().and_then(Path::file_name) {
        writeln!(w, "# Source: {}", source.to_string_lossy())?;
    }
    writeln!(w, "# Vertices: {}", pools.positions.len())?;
    writeln!(w, "# Normals: {}", normals.len())?;
    writeln!(w, "# UVs: {}", uvs.len())?;
    writeln!(w, "# Groups: {}", model.groups.len())?;
    writeln!(w, "# Faces: {}", triangles)?;
    writeln!(w)?;

    writeln!(w, "mtllib {}", mtl_file)?;
    writeln!(w, "o {}", name)?;

    for v in &pools.positions {
        match pose {
            Some(pose) => writeln!(w, "v {}", pose.position(v))?,
            None => writeln!(w, "v {}", v)?,
        }
    }
    for vn in normals {
        match pose {
            Some(pose) => writeln!(w, "vn {}", pose.normal(vn))?,
            None => writeln!(w, "vn {}", vn)?,
        }
    }
    for vt in uvs {
        writeln!(w, "vt {}", vt)?;
    }

    let mirrored = pose.is_some_and(Pose::mirrors);
    for group in &model.groups {
        let material = group
            .texture
            .as_deref()
            .and_then(normalize_texture_name)
            .unwrap_or_else(|| NULL_MATERIAL.to_string());
        writeln!(w, "usemtl {}", material)?;

        if let Some(faces) = &group.faces {
            for t in 0..faces.triangle_count() {
                let base = t * 3;
                let corners = if mirrored {
                    [base + 2, base + 1, base]
                } else {
                    [base, base + 1, base + 2]
                };
                writeln!(w, "f {}", face_line(faces, corners))?;
            }
        }
    }

    Ok(())
}

/// Face corners in `p/t/n` order, dropping absent channels the OBJ way
/// (`p//n`, `p/t`, or `p`), 1-based
pub fn face_line(faces: &FaceIndices, corners: [usize; 3]) -> String {
    let corner = |i: usize| {
        let p = faces.positions[i] + 1;
        let t = faces.uvs.as_ref().map(|uvs| uvs[i] + 1);
        let n = faces.normals.as_ref().map(|normals| normals[i] + 1);
        match (t, n) {
            (Some(t), Some(n)) => format!("{}/{}/{}", p, t, n),
            (None, Some(n)) => format!("{}//{}", p, n),
            (Some(t), None) => format!("{}/{}", p, t),
            (None, None) => p.to_string(),
        }
    };
    format!("{} {} {}", corner(corners[0]), corner(corners[1]), corner(corners[2]))
}

/// Write the MTL text: one `newmtl`/`map_Kd` block per material
pub fn write_mtl<W: Write>(w: &mut W, materials: &[String], name: &str) -> std::io::Result<()> {
    writeln!(w, "# Materials for {}.obj", name)?;
    writeln!(w, "# Materials: {}", materials.len())?;

    for material in materials {
        writeln!(w)?;
        writeln!(w, "newmtl {}", material)?;
        writeln!(w, "map_Kd {}", material)?;
    }

    Ok(())
}
