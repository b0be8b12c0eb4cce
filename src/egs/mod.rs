//! Per-utterance example construction: the core of the tool.
//!
//! For each chunk the planner decides, this module aligns the main feature
//! window, the optional auxiliary vector, and the label window onto the
//! chunk timeline and assembles them into one training example.

mod compress;
mod ivector;
mod labels;
mod window;

pub use compress::{compress, CompressedMatrix};
pub use labels::label_window;
pub use window::input_window;

use ndarray::Array2;
use tracing::warn;

use crate::error::FatalError;
use crate::sampling::FrameSampler;
use crate::splitting::UtteranceSplitter;
use crate::types::{Example, PosteriorFrame, Stream, StreamData};

/// Per-chunk behaviour knobs consumed by [`process_utterance`].
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    /// Number of pdf classes in the acoustic model; sizes the dense target
    /// on the consumer side.
    pub num_pdfs: u32,
    /// Store dense streams with per-column 8-bit quantization.
    pub compress: bool,
    pub ivector_as_input: bool,
    pub ivector_as_output: bool,
    /// Applied to the `ivector_aux_output` stream only.
    pub ivector_scale_factor: f32,
    /// Number of input frames between consecutive auxiliary vectors.
    pub online_ivector_period: usize,
}

impl ProcessConfig {
    pub fn validate(&self) -> Result<(), FatalError> {
        if self.num_pdfs == 0 {
            return Err(FatalError::config("the number of pdfs must be positive"));
        }
        if self.online_ivector_period == 0 {
            return Err(FatalError::config(
                "the online ivector period must be positive",
            ));
        }
        Ok(())
    }
}

/// Destination for finished examples. One `put` per chunk; keys are unique
/// across a run.
pub trait ExampleSink {
    fn put(&mut self, key: &str, example: Example) -> anyhow::Result<()>;
}

/// Why an utterance produced no examples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Posterior sequence length disagrees with the feature frame count.
    LengthMismatch { labels: usize, expected: usize },
    /// Shorter than one chunk; the planner returned nothing.
    TooShort { frames: usize },
}

/// Result of processing one utterance. Skips are recoverable and counted by
/// the caller; fatal faults propagate as errors instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceOutcome {
    Written { chunks: usize },
    Skipped(SkipReason),
}

/// Materializes every chunk of one utterance as a training example.
///
/// Writes one example per chunk to `sink`, keyed
/// `"<utt_id>-<chunk first frame>"`, in the planner's chunk order.
#[allow(clippy::too_many_arguments)]
pub fn process_utterance(
    feats: &Array2<f32>,
    ivector_feats: Option<&Array2<f32>>,
    pdf_post: &[PosteriorFrame],
    utt_id: &str,
    config: &ProcessConfig,
    splitter: &mut UtteranceSplitter,
    sampler: &mut dyn FrameSampler,
    sink: &mut dyn ExampleSink,
) -> anyhow::Result<UtteranceOutcome> {
    let num_input_frames = feats.nrows();
    let fsf = splitter.config().frame_subsampling_factor;

    let expected_labels = num_input_frames.div_ceil(fsf);
    if pdf_post.len() != expected_labels {
        warn!(
            utterance = utt_id,
            labels = pdf_post.len(),
            expected = expected_labels,
            "posterior length does not match feature length; skipping"
        );
        return Ok(UtteranceOutcome::Skipped(SkipReason::LengthMismatch {
            labels: pdf_post.len(),
            expected: expected_labels,
        }));
    }

    let chunks = splitter.chunks_for_utterance(num_input_frames);
    if chunks.is_empty() {
        warn!(
            utterance = utt_id,
            frames = num_input_frames,
            "utterance too short for one chunk; producing no examples"
        );
        return Ok(UtteranceOutcome::Skipped(SkipReason::TooShort {
            frames: num_input_frames,
        }));
    }

    for chunk in &chunks {
        let mut example = Example::default();

        let input = window::input_window(feats, chunk);
        example.io.push(matrix_stream(
            "input",
            -(chunk.left_context as i64),
            input,
            config.compress,
        ));

        if let Some(aux) = ivector_feats {
            if config.ivector_as_input {
                let vector =
                    ivector::input_vector(aux, chunk, config.online_ivector_period, sampler);
                example
                    .io
                    .push(matrix_stream("ivector", 0, vector, config.compress));
            }
        }

        let frames = labels::label_window(pdf_post, chunk, fsf)?;
        example.io.push(Stream {
            name: "output".to_string(),
            t_offset: 0,
            data: StreamData::Sparse {
                num_classes: config.num_pdfs,
                frames,
            },
        });

        if let Some(aux) = ivector_feats {
            if config.ivector_as_output {
                let matrix = ivector::output_matrix(
                    aux,
                    chunk,
                    config.online_ivector_period,
                    chunk.num_frames / fsf,
                    config.ivector_scale_factor,
                    sampler,
                );
                example
                    .io
                    .push(matrix_stream("ivector_aux_output", 0, matrix, config.compress));
            }
        }

        let key = format!("{}-{}", utt_id, chunk.first_frame);
        sink.put(&key, example)?;
    }

    Ok(UtteranceOutcome::Written {
        chunks: chunks.len(),
    })
}

fn matrix_stream(name: &str, t_offset: i64, matrix: Array2<f32>, compressed: bool) -> Stream {
    let data = if compressed {
        StreamData::Compressed(compress::compress(&matrix))
    } else {
        StreamData::Dense(matrix)
    };
    Stream {
        name: name.to_string(),
        t_offset,
        data,
    }
}
