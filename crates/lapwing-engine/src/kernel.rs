//! Convolution kernels.
//!
//! A [`Kernel`] is an immutable, square, odd-sided matrix of signed
//! integer weights. Its center sits at `(side / 2, side / 2)`; every
//! cell is exposed to the convolution loop as a [`Tap`] holding the
//! cell's offset from that center and its weight.
//!
//! Only 3x3 (and the degenerate 1x1) kernels are accepted. The two
//! built-in Laplacians are available through [`KernelKind`].

use serde::{Deserialize, Serialize};

/// Largest accepted kernel side length.
pub const MAX_SIDE: usize = 3;
const _: () = assert!(MAX_SIDE % 2 == 1);

/// Errors produced when building a [`Kernel`] from raw rows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KernelError {
    /// The matrix has no rows.
    #[error("kernel has no rows")]
    Empty,

    /// A row length differs from the number of rows.
    #[error("kernel is not square: {rows} rows but row {row} has {len} weights")]
    NotSquare {
        /// Number of rows in the matrix.
        rows: usize,
        /// Index of the first offending row.
        row: usize,
        /// Length of the offending row.
        len: usize,
    },

    /// The side length is even, so there is no center cell.
    #[error("kernel side length must be odd, got {0}")]
    EvenSide(usize),

    /// The side length exceeds [`MAX_SIDE`].
    #[error("kernel side length {0} exceeds the maximum of {max}", max = MAX_SIDE)]
    TooLarge(usize),
}

/// One kernel cell, expressed relative to the kernel center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tap {
    /// Horizontal offset from the center column.
    pub dx: i32,
    /// Vertical offset from the center row.
    pub dy: i32,
    /// Weight applied to the sampled channel values.
    pub weight: i32,
}

/// Square, odd-sided matrix of integer weights.
///
/// Weights are stored row-major. A kernel is never mutated after
/// construction, so a single instance can be shared by reference across
/// every band worker of every image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<i32>>", into = "Vec<Vec<i32>>")]
pub struct Kernel {
    side: usize,
    weights: Vec<i32>,
}

impl Kernel {
    /// Build a kernel from its rows.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Empty`] if `rows` is empty,
    /// [`KernelError::NotSquare`] if any row length differs from the row
    /// count, [`KernelError::EvenSide`] for even side lengths, and
    /// [`KernelError::TooLarge`] when the side exceeds [`MAX_SIDE`].
    pub fn from_rows(rows: Vec<Vec<i32>>) -> Result<Self, KernelError> {
        let side = rows.len();
        if side == 0 {
            return Err(KernelError::Empty);
        }
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != side) {
            return Err(KernelError::NotSquare {
                rows: side,
                row,
                len: r.len(),
            });
        }
        if side % 2 == 0 {
            return Err(KernelError::EvenSide(side));
        }
        if side > MAX_SIDE {
            return Err(KernelError::TooLarge(side));
        }

        Ok(Self {
            side,
            weights: rows.into_iter().flatten().collect(),
        })
    }

    /// The 8-neighbor Laplacian:
    ///
    /// ```text
    /// -1 -1 -1
    /// -1  8 -1
    /// -1 -1 -1
    /// ```
    #[must_use]
    pub fn laplacian_8() -> Self {
        Self {
            side: 3,
            weights: vec![-1, -1, -1, -1, 8, -1, -1, -1, -1],
        }
    }

    /// The 4-neighbor Laplacian:
    ///
    /// ```text
    ///  0 -1  0
    /// -1  4 -1
    ///  0 -1  0
    /// ```
    #[must_use]
    pub fn laplacian_4() -> Self {
        Self {
            side: 3,
            weights: vec![0, -1, 0, -1, 4, -1, 0, -1, 0],
        }
    }

    /// Side length (the kernel is `side x side`).
    #[must_use]
    pub const fn side(&self) -> usize {
        self.side
    }

    /// Center cell as `(column, row)`.
    #[must_use]
    pub const fn center(&self) -> (usize, usize) {
        (self.side / 2, self.side / 2)
    }

    /// Every cell as a [`Tap`], in row-major order.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn taps(&self) -> impl Iterator<Item = Tap> + '_ {
        // side <= MAX_SIDE, so every index fits in an i32.
        let half = self.center().0 as i32;
        let side = self.side();
        self.weights.iter().enumerate().map(move |(i, &weight)| Tap {
            dx: (i % side) as i32 - half,
            dy: (i / side) as i32 - half,
            weight,
        })
    }

    /// Rows of the kernel, top to bottom.
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<i32>> {
        self.weights.chunks(self.side).map(<[i32]>::to_vec).collect()
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::laplacian_8()
    }
}

impl TryFrom<Vec<Vec<i32>>> for Kernel {
    type Error = KernelError;

    fn try_from(rows: Vec<Vec<i32>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<Kernel> for Vec<Vec<i32>> {
    fn from(kernel: Kernel) -> Self {
        kernel.rows()
    }
}

/// Built-in kernel selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KernelKind {
    /// 8-neighbor Laplacian (diagonals included).
    #[default]
    Laplacian8,
    /// 4-neighbor Laplacian (edge-adjacent cells only).
    Laplacian4,
}

impl KernelKind {
    /// Build the kernel for this selection.
    #[must_use]
    pub fn kernel(self) -> Kernel {
        match self {
            Self::Laplacian8 => Kernel::laplacian_8(),
            Self::Laplacian4 => Kernel::laplacian_4(),
        }
    }
}
