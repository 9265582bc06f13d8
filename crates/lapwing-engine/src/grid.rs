//! Pixel grids read and written by the engine.
//!
//! [`PixelGrid`] is the read side: anything that can report its size and
//! return a 16-bit-per-channel RGBA value for an in-bounds coordinate.
//! [`OutputGrid`] is the write side: an 8-bit RGBA buffer sized to match
//! its source, filled band by band and handed to the encoder once every
//! band has finished.

use crate::types::{Dimensions, Rgba16Image, RgbaImage};

/// Number of interleaved channels per pixel (R, G, B, A).
pub const CHANNELS: usize = 4;

/// Read-only access to a rectangular grid of RGBA pixels.
///
/// Channels are reported at 16-bit precision regardless of the source
/// file's depth. Callers must only query `0 <= x < width()` and
/// `0 <= y < height()`.
pub trait PixelGrid {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// RGBA channels at `(x, y)`, each in `0..=u16::MAX`.
    fn at(&self, x: u32, y: u32) -> [u16; 4];

    /// Width and height together.
    fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }
}

impl PixelGrid for Rgba16Image {
    fn width(&self) -> u32 {
        Self::width(self)
    }

    fn height(&self) -> u32 {
        Self::height(self)
    }

    fn at(&self, x: u32, y: u32) -> [u16; 4] {
        self.get_pixel(x, y).0
    }
}

/// 8-bit images are widened the same way `image` does it (`v * 257`), so
/// scaling back down by 256 recovers the original byte exactly.
impl PixelGrid for RgbaImage {
    fn width(&self) -> u32 {
        Self::width(self)
    }

    fn height(&self) -> u32 {
        Self::height(self)
    }

    fn at(&self, x: u32, y: u32) -> [u16; 4] {
        self.get_pixel(x, y).0.map(|c| u16::from(c) * 257)
    }
}

/// Destination raster for one convolution, 8 bits per channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputGrid {
    image: RgbaImage,
}

impl OutputGrid {
    /// Allocate a zeroed grid.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Width and height together.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    /// RGBA channels at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if the coordinate is out of bounds (same contract as
    /// [`image::ImageBuffer::get_pixel`]).
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    /// Number of bytes in one row.
    #[must_use]
    pub fn row_stride(&self) -> usize {
        self.width() as usize * CHANNELS
    }

    /// Borrow the underlying image.
    #[must_use]
    pub const fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    /// Consume the grid and return the underlying image.
    #[must_use]
    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Interleaved RGBA bytes, row-major.
    pub(crate) fn as_mut_bytes(&mut self) -> &mut [u8] {
        &mut self.image
    }
}

/// A decoded grid paired with the name its output will be written under.
///
/// The name is a bare base name: no directory and no extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedImage<G> {
    name: String,
    grid: G,
}

impl<G: PixelGrid> NamedImage<G> {
    /// Pair a grid with its output name.
    pub fn new(name: impl Into<String>, grid: G) -> Self {
        Self {
            name: name.into(),
            grid,
        }
    }

    /// Output base name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decoded pixels.
    #[must_use]
    pub const fn grid(&self) -> &G {
        &self.grid
    }

    /// Split into name and grid.
    #[must_use]
    pub fn into_parts(self) -> (String, G) {
        (self.name, self.grid)
    }
}
