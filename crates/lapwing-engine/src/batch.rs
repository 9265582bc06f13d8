//! Batch processing over a bounded worker pool.
//!
//! The engine does no I/O of its own. Inputs arrive through
//! [`ImageSource`] and outputs leave through [`PixelSink`]; the
//! filesystem implementations live in `lapwing-io`.
//!
//! [`BatchRunner::run`] processes every source on a dedicated rayon
//! pool of `image_workers` threads. Each image is loaded, convolved with
//! its bands forked onto the same pool, then stored. A failure on one
//! image is logged and recorded in the report; the rest of the batch
//! carries on. `run` returns only after every image has been attempted.

use std::time::Instant;

use rayon::prelude::*;

use crate::convolve::ConvolutionEngine;
use crate::grid::{NamedImage, OutputGrid, PixelGrid};
use crate::kernel::Kernel;
use crate::report::{BatchReport, ImageFailure, ImageOutcome};
use crate::types::{EngineConfig, EngineError};

/// Something that can produce one decoded, named image.
pub trait ImageSource: Sync {
    /// Decoded pixel type.
    type Grid: PixelGrid + Sync;
    /// Failure to open or decode.
    type Error: std::error::Error + Send;

    /// Identifier used in logs and reports.
    fn label(&self) -> String;

    /// Load and decode the image.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the batch skips this input on error.
    fn load(&self) -> Result<NamedImage<Self::Grid>, Self::Error>;
}

/// Destination for finished output grids.
pub trait PixelSink: Sync {
    /// Failure to create or encode the output.
    type Error: std::error::Error + Send;

    /// Persist `grid` under the base name `name`.
    ///
    /// # Errors
    ///
    /// Implementation-defined; the batch records the failure and moves on.
    fn store(&self, name: &str, grid: OutputGrid) -> Result<(), Self::Error>;
}

/// Report type produced for a given source/sink pair.
pub type Report<S, K> = BatchReport<<S as ImageSource>::Error, <K as PixelSink>::Error>;

/// Runs a [`ConvolutionEngine`] over many images on a bounded pool.
#[derive(Debug)]
pub struct BatchRunner {
    engine: ConvolutionEngine,
    pool: rayon::ThreadPool,
}

impl BatchRunner {
    /// Create a runner with its own pool of `config.image_workers`
    /// threads.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::WorkerPool`] if the thread pool cannot be
    /// created.
    pub fn new(kernel: Kernel, config: &EngineConfig) -> Result<Self, EngineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.image_workers.get())
            .thread_name(|i| format!("lapwing-worker-{i}"))
            .build()?;

        Ok(Self {
            engine: ConvolutionEngine::new(kernel, config.band_workers),
            pool,
        })
    }

    /// The engine applied to every image.
    #[must_use]
    pub const fn engine(&self) -> &ConvolutionEngine {
        &self.engine
    }

    /// Number of images processed concurrently.
    #[must_use]
    pub fn image_workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Process every source and store results in `sink`.
    ///
    /// Outcomes are reported in the same order as `sources`. Each source
    /// is attempted exactly once.
    pub fn run<S, K>(&self, sources: &[S], sink: &K) -> Report<S, K>
    where
        S: ImageSource,
        K: PixelSink,
    {
        let started = Instant::now();
        let outcomes = self.pool.install(|| {
            sources
                .par_iter()
                .map(|source| self.process(source, sink))
                .collect()
        });

        BatchReport {
            outcomes,
            total_duration: started.elapsed(),
        }
    }

    fn process<S, K>(&self, source: &S, sink: &K) -> ImageOutcome<S::Error, K::Error>
    where
        S: ImageSource,
        K: PixelSink,
    {
        let started = Instant::now();
        let label = source.label();

        let result = source
            .load()
            .map_err(ImageFailure::Load)
            .and_then(|image| {
                let (name, grid) = image.into_parts();
                let convolved = Instant::now();
                let output = self.engine.apply(&grid);
                log::debug!(
                    "{label}: convolved {}x{} in {:.3}ms",
                    output.width(),
                    output.height(),
                    convolved.elapsed().as_secs_f64() * 1000.0,
                );
                drop(grid);
                sink.store(&name, output)
                    .map(|()| name)
                    .map_err(ImageFailure::Store)
            });

        match &result {
            Ok(name) => log::info!("Saved {name}"),
            Err(e) => log::warn!("{label}: {e}"),
        }

        ImageOutcome {
            label,
            result,
            elapsed: started.elapsed(),
        }
    }
}
