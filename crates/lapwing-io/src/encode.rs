//! Output encoding.
//!
//! Every output grid is written as an 8-bit RGBA PNG. Encoding happens
//! in memory first, so an encoder failure never leaves a truncated file
//! behind.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use image::ImageEncoder;
use lapwing_engine::{OutputGrid, PixelSink};

use crate::output::output_path;

/// Errors from writing one output file.
///
/// All are per-image: the batch records the failure and carries on.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// PNG encoding failed.
    #[error("PNG encoding failed for {}: {source}", .path.display())]
    Encode {
        /// Intended output path.
        path: PathBuf,
        /// Underlying encoder error.
        #[source]
        source: image::ImageError,
    },

    /// The output file could not be created.
    #[error("cannot create {}: {source}", .path.display())]
    Create {
        /// Output path.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },

    /// The output file was created but writing to it failed.
    #[error("cannot write {}: {source}", .path.display())]
    Write {
        /// Output path.
        path: PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: std::io::Error,
    },
}

/// Encode an output grid as PNG bytes.
///
/// # Errors
///
/// Returns [`image::ImageError`] if PNG encoding fails.
pub fn encode_png(grid: &OutputGrid) -> Result<Vec<u8>, image::ImageError> {
    let image = grid.as_image();
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(png_bytes)
}

/// Writes each output as `<dir>/<name>.png`.
///
/// The directory must already exist; see
/// [`ensure_output_dir`](crate::output::ensure_output_dir). A file with
/// the same name is overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngDirSink {
    dir: PathBuf,
}

impl PngDirSink {
    /// Sink writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Output directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PixelSink for PngDirSink {
    type Error = SinkError;

    fn store(&self, name: &str, grid: OutputGrid) -> Result<(), SinkError> {
        let path = output_path(&self.dir, name);

        let bytes = encode_png(&grid).map_err(|source| SinkError::Encode {
            path: path.clone(),
            source,
        })?;
        drop(grid);

        let mut file = std::fs::File::create(&path).map_err(|source| SinkError::Create {
            path: path.clone(),
            source,
        })?;
        file.write_all(&bytes)
            .and_then(|()| file.flush())
            .map_err(|source| SinkError::Write {
                path: path.clone(),
                source,
            })?;

        log::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}
