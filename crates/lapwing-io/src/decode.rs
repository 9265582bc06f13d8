//! Input decoding.
//!
//! Accepts raw image bytes in any format the `image` crate is built with
//! here (PNG, JPEG, GIF, BMP, WebP) and widens them to 16 bits per
//! channel, the representation the engine reads.

use std::path::{Path, PathBuf};

use lapwing_engine::{ImageSource, NamedImage, Rgba16Image};

use crate::output::derive_output_name;

/// Errors from reading or decoding one input file.
///
/// Both are per-file: the batch skips the input and carries on.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The file could not be opened or read.
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        /// Input path.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// The file contents are not a decodable image.
    #[error("cannot decode {}: {source}", .path.display())]
    Decode {
        /// Input path.
        path: PathBuf,
        /// Underlying decoder error.
        #[source]
        source: image::ImageError,
    },
}

/// Decode raw image bytes into a 16-bit RGBA grid.
///
/// # Errors
///
/// Returns [`image::ImageError`] if the format is unrecognized or the
/// data is corrupt (including empty input).
pub fn decode_bytes(bytes: &[u8]) -> Result<Rgba16Image, image::ImageError> {
    Ok(image::load_from_memory(bytes)?.to_rgba16())
}

/// An image file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Wrap an input path. Nothing is read until [`ImageSource::load`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Input path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ImageSource for FileSource {
    type Grid = Rgba16Image;
    type Error = SourceError;

    fn label(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<NamedImage<Rgba16Image>, SourceError> {
        let bytes = std::fs::read(&self.path).map_err(|source| SourceError::Open {
            path: self.path.clone(),
            source,
        })?;
        let grid = decode_bytes(&bytes).map_err(|source| SourceError::Decode {
            path: self.path.clone(),
            source,
        })?;
        log::info!(
            "Opened {} ({}x{}, {} bytes)",
            self.path.display(),
            grid.width(),
            grid.height(),
            bytes.len(),
        );
        Ok(NamedImage::new(derive_output_name(&self.path), grid))
    }
}
