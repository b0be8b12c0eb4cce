use ndarray::Array2;

use crate::types::ChunkTimeInfo;

/// Builds the context-padded input window for one chunk.
///
/// The window spans `left_context + num_frames + right_context` consecutive
/// frames anchored at `first_frame - left_context`. Positions outside the
/// utterance replicate the nearest real frame, so statistics near utterance
/// edges look like real signal rather than zeros.
pub fn input_window(feats: &Array2<f32>, chunk: &ChunkTimeInfo) -> Array2<f32> {
    let num_input_frames = feats.nrows() as i64;
    let start = chunk.window_start();
    let len = chunk.window_len();

    let mut window = Array2::zeros((len, feats.ncols()));
    for j in 0..len {
        let t = (start + j as i64).clamp(0, num_input_frames - 1) as usize;
        window.row_mut(j).assign(&feats.row(t));
    }
    window
}
