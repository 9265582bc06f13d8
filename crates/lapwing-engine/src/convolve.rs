//! Parallel convolution.
//!
//! [`BandWorker`] computes output pixels for one band of rows.
//! [`ConvolutionEngine`] splits an image into bands, carves the output
//! buffer into one disjoint mutable slice per band, runs a worker per
//! band inside a [`rayon::scope`] and returns once all of them are done.
//!
//! Sampling wraps around both axes (the image is treated as a torus), so
//! a pixel on the left edge sees the right edge as its left neighbor.

use std::num::NonZeroUsize;

use crate::band::{Band, partition_rows};
use crate::grid::{CHANNELS, OutputGrid, PixelGrid};
use crate::kernel::Kernel;

/// Wrap `coord + offset` into `0..extent`.
///
/// `extent` must be non-zero. Works for offsets of any magnitude.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn wrap(coord: u32, offset: i32, extent: u32) -> u32 {
    debug_assert!(extent > 0);
    // rem_euclid keeps the result in 0..extent, which always fits in u32.
    (i64::from(coord) + i64::from(offset)).rem_euclid(i64::from(extent)) as u32
}

/// Saturate an accumulated channel sum to `0..=255`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub const fn clamp_channel(sum: i64) -> u8 {
    if sum < 0 {
        0
    } else if sum > 255 {
        255
    } else {
        sum as u8
    }
}

/// Reduce a 16-bit channel to the 0-255 working range.
fn scale(channel: u16) -> i64 {
    i64::from(channel >> 8)
}

/// Computes the output pixels for a band of rows.
///
/// Holds shared references only; any number of workers can run against
/// the same kernel and source at once.
#[derive(Debug)]
pub struct BandWorker<'a, G: ?Sized> {
    kernel: &'a Kernel,
    source: &'a G,
}

impl<'a, G: PixelGrid + ?Sized> BandWorker<'a, G> {
    /// Create a worker reading from `source`.
    pub const fn new(kernel: &'a Kernel, source: &'a G) -> Self {
        Self { kernel, source }
    }

    /// Output RGBA for the pixel at `(x, y)`.
    ///
    /// R, G and B are the clamped kernel-weighted sums of the wrapped
    /// neighborhood. Alpha is copied from the source pixel, never
    /// convolved.
    ///
    /// Sums are accumulated in `i64`: nine taps of any `i32` weight times
    /// 255 cannot overflow it.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let (width, height) = (self.source.width(), self.source.height());
        let alpha = (self.source.at(x, y)[3] >> 8) as u8;

        let (mut r, mut g, mut b) = (0_i64, 0_i64, 0_i64);
        for tap in self.kernel.taps() {
            let sx = wrap(x, tap.dx, width);
            let sy = wrap(y, tap.dy, height);
            let [sr, sg, sb, _] = self.source.at(sx, sy);
            let weight = i64::from(tap.weight);
            r += weight * scale(sr);
            g += weight * scale(sg);
            b += weight * scale(sb);
        }

        [clamp_channel(r), clamp_channel(g), clamp_channel(b), alpha]
    }

    /// Fill `rows` with the output for `band`.
    ///
    /// `rows` is the slice of the output buffer covering exactly the
    /// band's rows: `band.len() * width * 4` bytes, starting at row
    /// `band.start()`.
    pub fn run(&self, band: Band, rows: &mut [u8]) {
        let stride = self.source.width() as usize * CHANNELS;
        debug_assert_eq!(rows.len(), band.len() as usize * stride);
        if stride == 0 {
            return;
        }

        for (y, row) in band.rows().zip(rows.chunks_exact_mut(stride)) {
            for (x, out) in (0..).zip(row.chunks_exact_mut(CHANNELS)) {
                out.copy_from_slice(&self.pixel(x, y));
            }
        }
    }
}

/// Convolve `source` with `kernel` using `workers` concurrent bands.
///
/// The band count is capped at the image height, so each band holds at
/// least one row. Blocks until every band is finished; the returned grid
/// is always complete.
#[must_use]
pub fn apply<G>(kernel: &Kernel, source: &G, workers: NonZeroUsize) -> OutputGrid
where
    G: PixelGrid + Sync + ?Sized,
{
    let (width, height) = (source.width(), source.height());
    let mut output = OutputGrid::new(width, height);
    if width == 0 || height == 0 {
        return output;
    }

    let stride = output.row_stride();
    let max_bands = NonZeroUsize::new(height as usize).unwrap_or(NonZeroUsize::MIN);
    let bands = partition_rows(height, workers.min(max_bands));
    let worker = BandWorker::new(kernel, source);
    let worker = &worker;

    rayon::scope(|scope| {
        let mut rest = output.as_mut_bytes();
        for band in bands {
            let (rows, tail) = std::mem::take(&mut rest).split_at_mut(band.len() as usize * stride);
            rest = tail;
            debug_assert!(!band.is_empty());
            scope.spawn(move |_| worker.run(band, rows));
        }
    });

    output
}

/// A kernel bound to a band count, reusable across images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvolutionEngine {
    kernel: Kernel,
    band_workers: NonZeroUsize,
}

impl ConvolutionEngine {
    /// Create an engine that splits every image into `band_workers` bands.
    #[must_use]
    pub const fn new(kernel: Kernel, band_workers: NonZeroUsize) -> Self {
        Self {
            kernel,
            band_workers,
        }
    }

    /// The kernel every image is convolved with.
    #[must_use]
    pub const fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Number of bands each image is split into.
    #[must_use]
    pub const fn band_workers(&self) -> NonZeroUsize {
        self.band_workers
    }

    /// Convolve one image. See [`apply`].
    #[must_use]
    pub fn apply<G>(&self, source: &G) -> OutputGrid
    where
        G: PixelGrid + Sync + ?Sized,
    {
        apply(&self.kernel, source, self.band_workers)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Rgba16Image, RgbaImage};

    fn workers(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn single(weight: i32) -> Kernel {
        Kernel::from_rows(vec![vec![weight]]).unwrap()
    }

    /// Deterministic, non-uniform test pattern with varying alpha.
    #[allow(clippy::cast_possible_truncation)]
    fn pattern(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([
                ((x * 37 + y * 11) % 256) as u8,
                ((x * 5 + y * 71) % 256) as u8,
                ((x * y * 13 + 7) % 256) as u8,
                ((x + y * 3) * 17 % 256) as u8,
            ])
        })
    }

    #[test]
    fn wrap_left_edge_reads_last_column() {
        assert_eq!(wrap(0, -1, 10), 9);
        assert_eq!(wrap(9, 1, 10), 0);
        assert_eq!(wrap(4, 1, 10), 5);
    }

    #[test]
    fn wrap_single_pixel_always_zero() {
        for offset in -3..=3 {
            assert_eq!(wrap(0, offset, 1), 0);
        }
    }

    #[test]
    fn wrap_offsets_larger_than_extent() {
        assert_eq!(wrap(0, -5, 2), 1);
        assert_eq!(wrap(1, 7, 3), 2);
    }

    #[test]
    fn clamp_boundaries() {
        assert_eq!(clamp_channel(-1), 0);
        assert_eq!(clamp_channel(-10_000), 0);
        assert_eq!(clamp_channel(0), 0);
        assert_eq!(clamp_channel(255), 255);
        assert_eq!(clamp_channel(256), 255);
        assert_eq!(clamp_channel(10_000), 255);
        assert_eq!(clamp_channel(128), 128);
    }

    #[test]
    fn clamp_extremes_of_wide_sums() {
        assert_eq!(clamp_channel(i64::MIN), 0);
        assert_eq!(clamp_channel(i64::MAX), 255);
    }

    #[test]
    fn huge_weights_saturate_instead_of_overflowing() {
        let white = RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        let out = apply(&single(10_000_000), &white, workers(1));
        assert_eq!(out.pixel(0, 0), [255, 255, 255, 255]);

        let out = apply(&single(i32::MIN), &white, workers(1));
        assert_eq!(out.pixel(0, 0), [0, 0, 0, 255]);

        // Nine taps at i32::MAX all landing on the same white pixel.
        let max = Kernel::from_rows(vec![vec![i32::MAX; 3]; 3]).unwrap();
        let out = apply(&max, &white, workers(1));
        assert_eq!(out.pixel(0, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn absurd_worker_count_is_capped_at_height() {
        let img = pattern(4, 4);
        let kernel = Kernel::laplacian_8();
        assert_eq!(
            apply(&kernel, &img, NonZeroUsize::MAX),
            apply(&kernel, &img, workers(1)),
        );
    }

    #[test]
    fn uniform_gray_has_no_edge_response() {
        let img = RgbaImage::from_pixel(4, 4, image::Rgba([200, 200, 200, 255]));
        let out = apply(&Kernel::laplacian_8(), &img, workers(4));
        assert_eq!(out.dimensions(), PixelGrid::dimensions(&img));
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(out.pixel(x, y), [0, 0, 0, 255], "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn pre_clamp_minus_one_becomes_zero() {
        let img = RgbaImage::from_pixel(2, 2, image::Rgba([1, 1, 1, 255]));
        let out = apply(&single(-1), &img, workers(1));
        assert_eq!(out.pixel(0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn pre_clamp_256_becomes_255() {
        let img = RgbaImage::from_pixel(2, 2, image::Rgba([128, 128, 128, 255]));
        let out = apply(&single(2), &img, workers(1));
        assert_eq!(out.pixel(1, 1), [255, 255, 255, 255]);
    }

    #[test]
    fn pre_clamp_255_is_unchanged() {
        let img = RgbaImage::from_pixel(2, 2, image::Rgba([255, 255, 255, 255]));
        let out = apply(&single(1), &img, workers(1));
        assert_eq!(out.pixel(0, 1), [255, 255, 255, 255]);
    }

    #[test]
    fn identity_kernel_reproduces_rgb() {
        let img = pattern(9, 7);
        let out = apply(&single(1), &img, workers(3));
        assert_eq!(out.as_image(), &img);
    }

    #[test]
    fn single_pixel_wraps_onto_itself() {
        // Every tap of a 3x3 kernel lands on (0, 0), so the result is the
        // pixel value times the weight sum.
        let img = RgbaImage::from_pixel(1, 1, image::Rgba([10, 20, 30, 99]));
        let kernel = Kernel::from_rows(vec![vec![1, 1, 1], vec![1, 1, 1], vec![1, 1, 1]]).unwrap();
        let out = apply(&kernel, &img, workers(2));
        assert_eq!(out.pixel(0, 0), [90, 180, 255, 99]);

        let out = apply(&Kernel::laplacian_8(), &img, workers(1));
        assert_eq!(out.pixel(0, 0), [0, 0, 0, 99]);
    }

    #[test]
    fn left_neighbor_of_column_zero_is_last_column() {
        // Kernel picks only the left neighbor (dx = -1).
        let kernel = Kernel::from_rows(vec![vec![0, 0, 0], vec![1, 0, 0], vec![0, 0, 0]]).unwrap();
        let img = RgbaImage::from_fn(5, 1, |x, _| {
            if x == 4 {
                image::Rgba([250, 150, 50, 255])
            } else {
                image::Rgba([0, 0, 0, 255])
            }
        });
        let out = apply(&kernel, &img, workers(1));
        assert_eq!(out.pixel(0, 0), [250, 150, 50, 255]);
        assert_eq!(out.pixel(1, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn top_neighbor_of_row_zero_is_last_row() {
        let kernel = Kernel::from_rows(vec![vec![0, 1, 0], vec![0, 0, 0], vec![0, 0, 0]]).unwrap();
        let img = RgbaImage::from_fn(1, 6, |_, y| {
            if y == 5 {
                image::Rgba([9, 8, 7, 255])
            } else {
                image::Rgba([0, 0, 0, 255])
            }
        });
        let out = apply(&kernel, &img, workers(3));
        assert_eq!(out.pixel(0, 0), [9, 8, 7, 255]);
    }

    #[test]
    fn alpha_passes_through_any_kernel() {
        let img = pattern(11, 13);
        for kernel in [
            Kernel::laplacian_8(),
            Kernel::laplacian_4(),
            single(-7),
            single(0),
        ] {
            let out = apply(&kernel, &img, workers(4));
            for (x, y, px) in img.enumerate_pixels() {
                assert_eq!(out.pixel(x, y)[3], px.0[3], "alpha at ({x},{y})");
            }
        }
    }

    #[test]
    fn worker_count_does_not_change_output() {
        let img = pattern(23, 17);
        let kernel = Kernel::laplacian_8();
        let reference = apply(&kernel, &img, workers(1));
        for n in [2, 3, 4, 8, 16, 17, 40] {
            assert_eq!(apply(&kernel, &img, workers(n)), reference, "workers={n}");
        }
    }

    #[test]
    fn repeated_runs_are_identical() {
        let img = pattern(31, 29);
        let kernel = Kernel::laplacian_4();
        let first = apply(&kernel, &img, workers(8));
        for _ in 0..5 {
            assert_eq!(apply(&kernel, &img, workers(8)), first);
        }
    }

    #[test]
    fn parallel_matches_per_pixel_reference() {
        let img = pattern(12, 10);
        let kernel = Kernel::laplacian_8();
        let worker = BandWorker::new(&kernel, &img);
        let out = apply(&kernel, &img, workers(4));
        for y in 0..10 {
            for x in 0..12 {
                assert_eq!(out.pixel(x, y), worker.pixel(x, y));
            }
        }
    }

    #[test]
    fn laplacian_highlights_isolated_bright_pixel() {
        let mut img = RgbaImage::from_pixel(5, 5, image::Rgba([0, 0, 0, 255]));
        img.put_pixel(2, 2, image::Rgba([20, 20, 20, 255]));
        let out = apply(&Kernel::laplacian_8(), &img, workers(2));
        // Center: 8 * 20. Neighbors: -20, clamped to 0.
        assert_eq!(out.pixel(2, 2), [160, 160, 160, 255]);
        assert_eq!(out.pixel(1, 1), [0, 0, 0, 255]);
        assert_eq!(out.pixel(0, 0), [0, 0, 0, 255]);
    }

    #[test]
    fn sixteen_bit_source_is_scaled_by_256() {
        let img = Rgba16Image::from_pixel(1, 1, image::Rgba([0x1234, 0x00FF, 0xFFFF, 0x8000]));
        let out = apply(&single(1), &img, workers(1));
        assert_eq!(out.pixel(0, 0), [0x12, 0x00, 0xFF, 0x80]);
    }

    #[test]
    fn band_worker_fills_only_its_rows() {
        let img = pattern(4, 6);
        let kernel = Kernel::laplacian_8();
        let worker = BandWorker::new(&kernel, &img);
        let band = Band::new(2, 4);
        let mut rows = vec![0_u8; band.len() as usize * 4 * CHANNELS];
        worker.run(band, &mut rows);
        for (i, px) in rows.chunks_exact(CHANNELS).enumerate() {
            let (x, y) = ((i % 4) as u32, 2 + (i / 4) as u32);
            assert_eq!(px, worker.pixel(x, y));
        }
    }

    #[test]
    fn empty_image_yields_empty_output() {
        let img = RgbaImage::new(0, 5);
        let out = apply(&Kernel::laplacian_8(), &img, workers(4));
        assert_eq!(out.width(), 0);
        assert_eq!(out.height(), 5);
    }

    #[test]
    fn engine_applies_its_kernel() {
        let engine = ConvolutionEngine::new(Kernel::laplacian_4(), workers(3));
        let img = pattern(8, 8);
        assert_eq!(engine.apply(&img), apply(&Kernel::laplacian_4(), &img, workers(3)));
        assert_eq!(engine.band_workers().get(), 3);
        assert_eq!(engine.kernel(), &Kernel::laplacian_4());
    }
}
