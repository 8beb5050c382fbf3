//! Output folder allocation

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::export::ExportError;

/// Upper bound on collision suffixes tried before giving up
const MAX_SUFFIX: u32 = 10_000;

/// Candidate folder name for the given collision attempt
///
/// Attempt 0 is the bare name, later attempts append ` (n)`.
pub fn candidate_name(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{} ({})", base, attempt)
    }
}

/// Create a fresh folder named after `base` inside `parent`
///
/// Never reuses an existing folder: `base`, `base (1)`, `base (2)`, ... are
/// tried in order and the first one that does not exist is created.
pub fn create_output_dir(parent: &Path, base: &str) -> Result<PathBuf, ExportError> {
    if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent).map_err(|source| ExportError::OutputWriteFailure {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    for attempt in 0..=MAX_SUFFIX {
        let dir = parent.join(candidate_name(base, attempt));
        match std::fs::create_dir(&dir) {
            Ok(()) => {
                tracing::debug!("Created output folder {:?}", dir);
                return Ok(dir);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(source) => return Err(ExportError::OutputWriteFailure { path: dir, source }),
        }
    }

    Err(ExportError::OutputWriteFailure {
        path: parent.join(base),
        source: std::io::Error::new(ErrorKind::AlreadyExists, "no free output folder name"),
    })
}
