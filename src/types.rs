//! Core types for the eggen example-generation pipeline

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::egs::CompressedMatrix;

/// One frame's sparse posterior: (class index, weight) pairs.
///
/// Weights need not sum to 1; they are whatever the alignment pipeline
/// produced, later rescaled by per-frame chunk weights.
pub type PosteriorFrame = Vec<(u32, f32)>;

/// Per-utterance posterior sequence, one entry per subsampled output frame.
pub type Posterior = Vec<PosteriorFrame>;

/// Time placement of one chunk within its utterance, produced by the splitter.
///
/// Invariant: `first_frame` and `num_frames` are multiples of the frame
/// subsampling factor.
#[derive(Debug, Clone)]
pub struct ChunkTimeInfo {
    /// Absolute index of the first core frame, pre-subsampling.
    pub first_frame: usize,
    /// Core length in input frames, pre-subsampling.
    pub num_frames: usize,
    pub left_context: usize,
    pub right_context: usize,
    /// One weight per subsampled output frame; frames covered by more than
    /// one chunk carry fractional weight so totals across chunks stay 1.
    pub output_weights: Vec<f32>,
}

impl ChunkTimeInfo {
    /// Absolute frame index where the padded window starts (may be negative).
    pub fn window_start(&self) -> i64 {
        self.first_frame as i64 - self.left_context as i64
    }

    /// Total padded window length in input frames.
    pub fn window_len(&self) -> usize {
        self.left_context + self.num_frames + self.right_context
    }
}

/// Payload of one named stream inside an example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StreamData {
    Dense(Array2<f32>),
    Compressed(CompressedMatrix),
    Sparse { num_classes: u32, frames: Posterior },
}

/// One named signal stream with its placement on the chunk timeline.
///
/// A negative `t_offset` means frame 0 of the stream sits before the chunk's
/// first core frame (left context).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stream {
    pub name: String,
    pub t_offset: i64,
    pub data: StreamData,
}

/// One training example: an ordered list of named streams, assembled once
/// per chunk and handed to the example sink.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Example {
    pub io: Vec<Stream>,
}
