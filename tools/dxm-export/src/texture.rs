//! Texture lookup and copying
//!
//! Textures are opaque files: they are located next to the source model and
//! copied byte-for-byte, never decoded.

use std::path::{Path, PathBuf};

/// Subfolder of the model's folder searched second
pub const TEXTURES_SUBFOLDER: &str = "Textures";

/// Reduce a stored texture name to a plain file name
///
/// Stored names may be Windows-style relative paths; only the last component
/// is used for materials and lookup. Returns `None` when nothing is left.
pub fn normalize_texture_name(raw: &str) -> Option<String> {
    let name = raw.rsplit(['\\', '/']).next().unwrap_or(raw).trim();
    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

/// Ordered list of folders searched for texture files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextureSearch {
    folders: Vec<PathBuf>,
}

impl TextureSearch {
    pub fn new(folders: Vec<PathBuf>) -> Self {
        Self { folders }
    }

    /// Standard search order for a model file: its own folder, then its
    /// `Textures` subfolder, then any `extra` folders
    pub fn for_model(model_path: &Path, extra: &[PathBuf]) -> Self {
        let folder = model_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut folders = vec![folder.clone(), folder.join(TEXTURES_SUBFOLDER)];
        folders.extend(extra.iter().cloned());
        Self { folders }
    }

    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }

    /// First existing file named `name`, or `None` if unresolved
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        self.folders
            .iter()
            .map(|folder| folder.join(name))
            .find(|candidate| candidate.is_file())
    }
}
