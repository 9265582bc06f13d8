//! Output locations: the output directory and per-image file names.

use std::path::{Path, PathBuf};

/// Extension of every output file (lossless PNG).
pub const OUTPUT_EXTENSION: &str = "png";

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// The output directory could not be created.
///
/// Fatal for the whole run: nothing can be written without it.
#[derive(Debug, thiserror::Error)]
#[error("cannot create output directory {}: {source}", .path.display())]
pub struct OutputDirError {
    /// Directory that was requested.
    pub path: PathBuf,
    /// Underlying filesystem error.
    #[source]
    pub source: std::io::Error,
}

/// Create `dir` (and any missing parents) if it does not exist.
///
/// An existing directory is not an error.
///
/// # Errors
///
/// Returns [`OutputDirError`] if the directory cannot be created, or if
/// `dir` exists but is not a directory.
pub fn ensure_output_dir(dir: &Path) -> Result<(), OutputDirError> {
    std::fs::create_dir_all(dir).map_err(|source| OutputDirError {
        path: dir.to_path_buf(),
        source,
    })
}

/// Base name used for the output of `input`.
///
/// Takes the last path component (splitting on both `/` and `\`, so
/// Windows-style paths behave the same everywhere) and cuts it at the
/// first `.`: `photos/cat.small.jpg` becomes `cat`.
///
/// Dot-files would otherwise produce an empty name; those fall back to
/// the whole component with its leading dots removed, and to `image` if
/// nothing is left.
#[must_use]
pub fn derive_output_name(input: &Path) -> String {
    let text = input.to_string_lossy();
    let component = text.rsplit(['/', '\\']).next().unwrap_or_default();

    match component.split('.').next() {
        Some(stem) if !stem.is_empty() => stem.to_owned(),
        _ => {
            let trimmed = component.trim_start_matches('.');
            let stem = trimmed.split('.').next().unwrap_or_default();
            if stem.is_empty() {
                "image".to_owned()
            } else {
                stem.to_owned()
            }
        }
    }
}

/// Full path of the output file for base name `name` inside `dir`.
#[must_use]
pub fn output_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{OUTPUT_EXTENSION}"))
}
