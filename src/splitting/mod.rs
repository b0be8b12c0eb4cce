//! Chunk planner: decides how each utterance is cut into training chunks.
//!
//! The per-utterance example core consumes these decisions; it never makes
//! them itself.

mod stats;

pub use stats::SplitStats;

use crate::error::FatalError;
use crate::types::ChunkTimeInfo;

/// Chunk-sizing policy shared by every utterance of a run.
#[derive(Debug, Clone, Copy)]
pub struct SplitConfig {
    /// Core chunk length in input frames, pre-subsampling.
    pub chunk_size: usize,
    pub left_context: usize,
    pub right_context: usize,
    /// Ratio between the input frame rate and the label/output frame rate.
    pub frame_subsampling_factor: usize,
}

impl SplitConfig {
    pub fn validate(&self) -> Result<(), FatalError> {
        if self.frame_subsampling_factor == 0 {
            return Err(FatalError::config(
                "frame subsampling factor must be at least 1",
            ));
        }
        if self.chunk_size == 0 {
            return Err(FatalError::config("chunk size must be positive"));
        }
        if self.chunk_size % self.frame_subsampling_factor != 0 {
            return Err(FatalError::config(format!(
                "chunk size {} must be a multiple of the frame subsampling factor {}",
                self.chunk_size, self.frame_subsampling_factor
            )));
        }
        Ok(())
    }
}

/// Plans chunk placements per utterance and accumulates run statistics.
pub struct UtteranceSplitter {
    config: SplitConfig,
    stats: SplitStats,
}

impl UtteranceSplitter {
    pub fn new(config: SplitConfig) -> Result<Self, FatalError> {
        config.validate()?;
        Ok(Self {
            config,
            stats: SplitStats::default(),
        })
    }

    pub fn config(&self) -> &SplitConfig {
        &self.config
    }

    pub fn stats(&self) -> &SplitStats {
        &self.stats
    }

    /// Chunk placements for an utterance of `num_frames` input frames, in
    /// non-decreasing `first_frame` order. Empty when the utterance is
    /// shorter than one chunk.
    ///
    /// Every placement keeps `first_frame` and `num_frames` multiples of the
    /// subsampling factor, and its label window inside the utterance's
    /// subsampled length.
    pub fn chunks_for_utterance(&mut self, num_frames: usize) -> Vec<ChunkTimeInfo> {
        let fsf = self.config.frame_subsampling_factor;
        let chunk_size = self.config.chunk_size;
        let usable = num_frames - num_frames % fsf;

        self.stats.utterances += 1;
        self.stats.input_frames += num_frames;

        let full_chunks = usable / chunk_size;
        if full_chunks == 0 {
            self.stats.too_short += 1;
            return Vec::new();
        }

        let mut first_frames: Vec<usize> = (0..full_chunks).map(|i| i * chunk_size).collect();
        let remainder = usable % chunk_size;
        if remainder >= fsf {
            // Cover the tail with one extra full-size chunk anchored at the
            // end of the usable region; it overlaps the last full chunk.
            let anchored = usable - chunk_size;
            first_frames.push(anchored - anchored % fsf);
        }

        let chunks = self.place_chunks(&first_frames);
        self.stats.chunks += chunks.len();
        self.stats.kept_frames += chunks.iter().map(|c| c.num_frames).sum::<usize>();
        chunks
    }

    /// Whether the run produced any usable training frames.
    pub fn exit_ok(&self) -> bool {
        self.stats.kept_frames > 0
    }

    fn place_chunks(&self, first_frames: &[usize]) -> Vec<ChunkTimeInfo> {
        let fsf = self.config.frame_subsampling_factor;
        let chunk_size = self.config.chunk_size;
        let num_subsampled = chunk_size / fsf;

        // Count how many chunks cover each output frame; overlapped frames
        // get their weight split so totals across chunks stay 1.
        let mut coverage: std::collections::HashMap<usize, u32> = std::collections::HashMap::new();
        for &first in first_frames {
            let start_subsampled = first / fsf;
            for i in 0..num_subsampled {
                *coverage.entry(start_subsampled + i).or_insert(0) += 1;
            }
        }

        first_frames
            .iter()
            .map(|&first| {
                let start_subsampled = first / fsf;
                let output_weights = (0..num_subsampled)
                    .map(|i| 1.0 / coverage[&(start_subsampled + i)] as f32)
                    .collect();
                ChunkTimeInfo {
                    first_frame: first,
                    num_frames: chunk_size,
                    left_context: self.config.left_context,
                    right_context: self.config.right_context,
                    output_weights,
                }
            })
            .collect()
    }
}
