use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Dense matrix stored as per-column 8-bit linear quantization.
///
/// Each column is mapped onto 256 levels between its own minimum and
/// maximum, quartering the storage of f32 data at the cost of at most half
/// a quantization step of error per value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressedMatrix {
    pub rows: usize,
    pub cols: usize,
    /// Per-column minimum value.
    pub col_min: Vec<f32>,
    /// Per-column quantization step, `(max - min) / 255`.
    pub col_step: Vec<f32>,
    /// Row-major quantized levels, `rows * cols` entries.
    pub data: Vec<u8>,
}

pub fn compress(matrix: &Array2<f32>) -> CompressedMatrix {
    let (rows, cols) = matrix.dim();
    let mut col_min = vec![0.0f32; cols];
    let mut col_step = vec![0.0f32; cols];

    for (c, column) in matrix.columns().into_iter().enumerate() {
        let min = column.fold(f32::INFINITY, |acc, &v| acc.min(v));
        let max = column.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
        if min.is_finite() && max > min {
            col_min[c] = min;
            col_step[c] = (max - min) / 255.0;
        } else if min.is_finite() {
            // Constant column: store the value, no quantization error.
            col_min[c] = min;
        }
    }

    let mut data = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            let level = if col_step[c] > 0.0 {
                ((matrix[[r, c]] - col_min[c]) / col_step[c])
                    .round()
                    .clamp(0.0, 255.0) as u8
            } else {
                0
            };
            data.push(level);
        }
    }

    CompressedMatrix {
        rows,
        cols,
        col_min,
        col_step,
        data,
    }
}

impl CompressedMatrix {
    /// Reconstructs the dense matrix; each value lands within half a
    /// quantization step of the source.
    pub fn decompress(&self) -> Array2<f32> {
        Array2::from_shape_fn((self.rows, self.cols), |(r, c)| {
            self.col_min[c] + self.col_step[c] * self.data[r * self.cols + c] as f32
        })
    }
}
