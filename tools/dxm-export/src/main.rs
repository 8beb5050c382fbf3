//! dxm-export - DXM/DLM to OBJ/MTL converter
//!
//! Reads a raw `.dlm` mesh (or the `.dlm` next to a `.dxm`), merges duplicate
//! vertex attributes and writes `<name>/<name>.obj` plus `<name>.mtl`.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};

use dxm_export::{
    DxmModel, ExportOptions, ExportTransform, OptimizeStats, convert_file, load_model,
    optimize_with_stats,
};

#[derive(Parser)]
#[command(name = "dxm-export")]
#[command(about = "Convert DXM/DLM meshes to OBJ/MTL")]
#[command(version)]
struct Cli {
    /// Input model (.dlm, or .dxm with a .dlm sibling)
    input: PathBuf,

    /// Folder the export folder is created in (default: the input's folder)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extra folder searched for textures (repeatable)
    #[arg(short, long)]
    texture_dir: Vec<PathBuf>,

    /// Mirror along X on export
    #[arg(long)]
    flip_x: bool,

    /// Mirror along Y on export
    #[arg(long)]
    flip_y: bool,

    /// Mirror along Z on export
    #[arg(long)]
    flip_z: bool,

    /// Rotation about X in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    rotate_x: f32,

    /// Rotation about Y in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    rotate_y: f32,

    /// Rotation about Z in degrees
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    rotate_z: f32,

    /// Print a model summary instead of exporting
    #[arg(long)]
    info: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.info {
        let model = load_model(&cli.input)
            .with_context(|| format!("Failed to load {:?}", cli.input))?;
        let (model, stats) = optimize_with_stats(model)
            .with_context(|| format!("Failed to optimize {:?}", cli.input))?;
        print_info(&model, &stats);
        return Ok(());
    }

    let options = ExportOptions {
        name: None,
        texture_dirs: cli.texture_dir,
        transform: ExportTransform {
            flip: [cli.flip_x, cli.flip_y, cli.flip_z],
            rotation_degrees: [cli.rotate_x, cli.rotate_y, cli.rotate_z],
        },
    };

    tracing::info!("Converting {:?}", cli.input);
    let report = convert_file(&cli.input, cli.output.as_deref(), &options)
        .with_context(|| format!("Failed to convert {:?}", cli.input))?;

    tracing::info!("Done! Wrote {:?}", report.directory);

    Ok(())
}

fn print_info(model: &DxmModel, stats: &OptimizeStats) {
    let header = &model.header;
    let source = model.source.as_deref().unwrap_or(Path::new("?"));

    println!("File:      {}", source.display());
    println!(
        "Format:    {} v{}.{}",
        header.identifier_text(),
        header.major_version,
        header.minor_version
    );
    println!(
        "Layout:    {} ({})",
        model.layout().map_or("unknown", |l| l.name()),
        header.vertex_flags
    );
    println!("Vertices:  {}", stats.raw_vertices);
    println!("Triangles: {}", stats.triangles);
    println!("Groups:    {}", model.groups.len());
    for (i, group) in model.groups.iter().enumerate() {
        println!(
            "  [{}] {} indices, texture: {}",
            i,
            group.length,
            group.texture.as_deref().unwrap_or("none")
        );
    }
    println!("Pooled positions: {}", stats.positions);
    if stats.normals_dropped {
        println!("Pooled normals:   dropped (all zero)");
    } else {
        println!("Pooled normals:   {}", stats.normals);
    }
    println!("Pooled UVs:       {}", stats.uvs);
}
