use crate::error::FatalError;
use crate::types::{ChunkTimeInfo, Posterior, PosteriorFrame};

/// Extracts the subsampled label window for one chunk and rescales every
/// (class, weight) pair by the chunk's position-matched output weight.
///
/// The planner is contractually required to keep the window inside the
/// posterior sequence; a violation is an internal consistency fault, not a
/// recoverable per-utterance error.
pub fn label_window(
    pdf_post: &[PosteriorFrame],
    chunk: &ChunkTimeInfo,
    frame_subsampling_factor: usize,
) -> Result<Posterior, FatalError> {
    let start_subsampled = chunk.first_frame / frame_subsampling_factor;
    let num_subsampled = chunk.num_frames / frame_subsampling_factor;

    if start_subsampled + num_subsampled > pdf_post.len() {
        return Err(FatalError::consistency(format!(
            "chunk at frame {} needs label frames {}..{} but the posterior \
             sequence has only {}",
            chunk.first_frame,
            start_subsampled,
            start_subsampled + num_subsampled,
            pdf_post.len()
        )));
    }

    let mut frames = Vec::with_capacity(num_subsampled);
    for i in 0..num_subsampled {
        let weight = chunk.output_weights[i];
        let frame: PosteriorFrame = pdf_post[start_subsampled + i]
            .iter()
            .map(|&(class, w)| (class, w * weight))
            .collect();
        frames.push(frame);
    }
    Ok(frames)
}
