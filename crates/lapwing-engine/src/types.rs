//! Shared types for the lapwing convolution engine.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::kernel::KernelError;

/// Re-export `RgbaImage` so downstream crates can reference 8-bit
/// raster data without depending on `image` directly.
pub use image::RgbaImage;

/// 16-bit-per-channel RGBA image, the internal representation every
/// decoded input is converted to before convolution.
pub type Rgba16Image = image::ImageBuffer<image::Rgba<u16>, Vec<u16>>;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Concurrency settings for the engine and the batch runner.
///
/// Both counts default to the number of logical CPUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of row bands each image is split into. One band worker
    /// runs per band.
    pub band_workers: NonZeroUsize,

    /// Number of images processed concurrently. Bounds the size of the
    /// batch thread pool, so memory use does not grow with batch size.
    pub image_workers: NonZeroUsize,
}

impl EngineConfig {
    /// Number of logical CPUs, never less than one.
    #[must_use]
    pub fn detected_parallelism() -> NonZeroUsize {
        NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let detected = Self::detected_parallelism();
        Self {
            band_workers: detected,
            image_workers: detected,
        }
    }
}

/// Errors that can occur while setting up the engine.
///
/// Convolution itself cannot fail; everything here happens before the
/// first pixel is touched.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The supplied kernel is malformed.
    #[error("invalid kernel: {0}")]
    InvalidKernel(#[from] KernelError),

    /// The batch thread pool could not be created.
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
