//! lapwing-engine: parallel Laplacian convolution (sans-IO).
//!
//! Turns decoded pixel grids into edge-highlighted output grids:
//! kernel-weighted neighbor sums with toroidal wrap-around sampling,
//! saturated to `0..=255`, alpha copied through untouched.
//!
//! Work fans out at two levels:
//!
//! 1. [`BatchRunner`] processes images concurrently on a bounded pool.
//! 2. [`ConvolutionEngine`] splits each image into disjoint row bands and
//!    joins all band workers before returning the finished grid.
//!
//! This crate has **no I/O dependencies**. Decoding, encoding and the
//! filesystem live in `lapwing-io`, behind the [`ImageSource`] and
//! [`PixelSink`] traits.

pub mod band;
pub mod batch;
pub mod convolve;
pub mod grid;
pub mod kernel;
pub mod report;
pub mod types;

pub use band::{Band, partition_rows};
pub use batch::{BatchRunner, ImageSource, PixelSink, Report};
pub use convolve::{BandWorker, ConvolutionEngine, apply};
pub use grid::{NamedImage, OutputGrid, PixelGrid};
pub use kernel::{Kernel, KernelError, KernelKind};
pub use report::{BatchReport, ImageFailure, ImageOutcome};
pub use types::{Dimensions, EngineConfig, EngineError, Rgba16Image, RgbaImage};
