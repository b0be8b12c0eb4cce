use ndarray::Array2;

use crate::sampling::FrameSampler;
use crate::types::ChunkTimeInfo;

/// Resolves the auxiliary-matrix row for one chunk: a frame drawn uniformly
/// from anywhere in the padded window, mapped to the auxiliary signal's own
/// coarser indexing and clamped to its valid rows.
///
/// One representative vector per chunk approximates a slowly-varying signal
/// (e.g., speaker characteristics) without re-deriving it per frame. The
/// randomized choice is part of the contract; downstream models depend on
/// this distribution.
fn sample_row(
    chunk: &ChunkTimeInfo,
    period: usize,
    aux_rows: usize,
    sampler: &mut dyn FrameSampler,
) -> usize {
    let start = chunk.window_start();
    let frame = sampler.pick(start, start + chunk.window_len() as i64 - 1);
    let subsampled = frame / period as i64;
    subsampled.clamp(0, aux_rows as i64 - 1) as usize
}

/// Input-side stream: a single representative auxiliary vector, as a
/// one-row matrix.
pub fn input_vector(
    aux: &Array2<f32>,
    chunk: &ChunkTimeInfo,
    period: usize,
    sampler: &mut dyn FrameSampler,
) -> Array2<f32> {
    let row = sample_row(chunk, period, aux.nrows(), sampler);
    let mut out = Array2::zeros((1, aux.ncols()));
    out.row_mut(0).assign(&aux.row(row));
    out
}

/// Output-side stream: one sampled auxiliary vector broadcast over every
/// output frame of the chunk and scaled, for auxiliary regression targets.
pub fn output_matrix(
    aux: &Array2<f32>,
    chunk: &ChunkTimeInfo,
    period: usize,
    num_frames_subsampled: usize,
    scale_factor: f32,
    sampler: &mut dyn FrameSampler,
) -> Array2<f32> {
    let row = sample_row(chunk, period, aux.nrows(), sampler);
    let source = aux.row(row).mapv(|v| v * scale_factor);
    let mut out = Array2::zeros((num_frames_subsampled, aux.ncols()));
    for mut dest in out.rows_mut() {
        dest.assign(&source);
    }
    out
}

#[cfg(test)]
mod tests {
    use ndarray::{array, Array2};

    use super::{input_vector, output_matrix};
    use crate::sampling::FixedSampler;
    use crate::types::ChunkTimeInfo;

    fn aux() -> Array2<f32> {
        array![[1.0, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0]]
    }

    fn chunk(first_frame: usize, num_frames: usize, left: usize, right: usize) -> ChunkTimeInfo {
        ChunkTimeInfo {
            first_frame,
            num_frames,
            left_context: left,
            right_context: right,
            output_weights: vec![1.0; num_frames],
        }
    }

    #[test]
    fn picks_from_the_full_padded_window() {
        let aux = aux();
        // Window spans frames 2..17; a pick of 16 maps to aux row 16/5 = 3.
        let mut sampler = FixedSampler::new(vec![16]);
        let vector = input_vector(&aux, &chunk(5, 10, 3, 2), 5, &mut sampler);
        assert_eq!(vector.nrows(), 1);
        assert_eq!(vector.row(0), aux.row(3));
    }

    #[test]
    fn negative_window_frames_clamp_to_first_row() {
        let aux = aux();
        let mut sampler = FixedSampler::new(vec![-3]);
        let vector = input_vector(&aux, &chunk(0, 10, 3, 0), 5, &mut sampler);
        assert_eq!(vector.row(0), aux.row(0));
    }

    #[test]
    fn overlong_window_frames_clamp_to_last_row() {
        let aux = aux();
        // 90/5 = 18 exceeds the 4 auxiliary rows.
        let mut sampler = FixedSampler::new(vec![90]);
        let vector = input_vector(&aux, &chunk(80, 20, 0, 0), 5, &mut sampler);
        assert_eq!(vector.row(0), aux.row(3));
    }

    #[test]
    fn output_matrix_broadcasts_and_scales_one_row() {
        let aux = aux();
        let mut sampler = FixedSampler::new(vec![7]);
        let out = output_matrix(&aux, &chunk(0, 20, 0, 0), 5, 20, 2.0, &mut sampler);
        assert_eq!(out.nrows(), 20);
        // 7/5 = 1, scaled by 2.
        for row in out.rows() {
            assert_eq!(row.to_vec(), vec![4.0, 40.0]);
        }
    }
}
