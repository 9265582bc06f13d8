//! Row bands: the unit of work handed to a single band worker.
//!
//! [`partition_rows`] splits `[0, height)` into exactly `workers`
//! contiguous half-open ranges. Every band but the last holds
//! `height / workers` rows; the last also takes the `height % workers`
//! remainder. The bands never overlap and leave no gaps, which is what
//! lets the engine hand each worker its own mutable slice of the output
//! buffer.

use std::num::NonZeroUsize;
use std::ops::Range;

/// Half-open row range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Band {
    start: u32,
    end: u32,
}

impl Band {
    /// Create a band. `start` must not exceed `end`.
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// First row (inclusive).
    #[must_use]
    pub const fn start(self) -> u32 {
        self.start
    }

    /// One past the last row.
    #[must_use]
    pub const fn end(self) -> u32 {
        self.end
    }

    /// Number of rows.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.end - self.start
    }

    /// Returns `true` when the band holds no rows.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// The rows as a range.
    #[must_use]
    pub const fn rows(self) -> Range<u32> {
        self.start..self.end
    }
}

/// Split `[0, height)` into `workers` bands, remainder rows in the last.
///
/// When `height < workers` the leading bands are empty and the last band
/// holds every row. One entry is allocated per worker, so callers cap
/// `workers` at `height` first (as [`apply`](crate::convolve::apply)
/// does).
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn partition_rows(height: u32, workers: NonZeroUsize) -> Vec<Band> {
    let count = workers.get();
    let base = height as usize / count;
    let last = count - 1;

    (0..count)
        .map(|i| {
            // i * base <= height, so both bounds fit back into u32.
            let start = (i * base) as u32;
            let end = if i == last {
                height
            } else {
                ((i + 1) * base) as u32
            };
            Band::new(start, end)
        })
        .collect()
}
