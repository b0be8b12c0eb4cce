use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use eggen::egs::{self, ProcessConfig, UtteranceOutcome};
use eggen::io::{ExampleWriter, MatrixMap, MatrixReader, PosteriorMap};
use eggen::sampling::ThreadRngSampler;
use eggen::splitting::{SplitConfig, UtteranceSplitter};

/// Eggen - chunked training example generator
///
/// Converts per-utterance feature matrices and frame-level posteriors into
/// fixed-size, context-padded training examples for neural network
/// training. Essentially a format change from features and posteriors into
/// a per-chunk example format.
#[derive(Parser, Debug)]
#[command(name = "eggen")]
#[command(version = "0.1.0")]
#[command(about = "Chunked training example generator", long_about = None)]
struct Args {
    /// Feature store (JSONL, one matrix record per utterance)
    #[arg(value_name = "FEATURES")]
    features: PathBuf,

    /// Posterior store (JSONL, one sparse label sequence per utterance)
    #[arg(value_name = "POSTERIORS")]
    posteriors: PathBuf,

    /// Output example store (JSONL, one example per chunk)
    #[arg(value_name = "EGS_OUT")]
    egs_out: PathBuf,

    /// Number of pdf classes in the acoustic model
    #[arg(long, value_name = "N")]
    num_pdfs: u32,

    /// Write dense streams with per-column 8-bit quantization
    #[arg(long, action = clap::ArgAction::Set, default_value_t = true, value_name = "BOOL")]
    compress: bool,

    /// Auxiliary vector store (JSONL matrix records, same keys as FEATURES)
    #[arg(long, value_name = "PATH")]
    online_ivectors: Option<PathBuf>,

    /// Number of input frames between auxiliary vectors in the store
    #[arg(long, default_value_t = 1, value_name = "N")]
    online_ivector_period: usize,

    /// Add the auxiliary vector to the input side of each example
    #[arg(long, action = clap::ArgAction::Set, default_value_t = true, value_name = "BOOL")]
    ivector_as_input: bool,

    /// Add the auxiliary vector as an output-side regression target
    #[arg(long, action = clap::ArgAction::Set, default_value_t = false, value_name = "BOOL")]
    ivector_as_output: bool,

    /// Scale applied to the output-side auxiliary stream
    #[arg(long, default_value_t = 1.0, value_name = "FACTOR")]
    ivector_scale_factor: f32,

    /// Allowed frame-count difference between features and auxiliary vectors
    #[arg(long, default_value_t = 100, value_name = "FRAMES")]
    length_tolerance: usize,

    /// Core chunk length in input frames
    #[arg(long, default_value_t = 150, value_name = "FRAMES")]
    chunk_size: usize,

    /// Frames of left context padded onto each chunk
    #[arg(long, default_value_t = 0, value_name = "FRAMES")]
    left_context: usize,

    /// Frames of right context padded onto each chunk
    #[arg(long, default_value_t = 0, value_name = "FRAMES")]
    right_context: usize,

    /// Ratio between the input frame rate and the label frame rate
    #[arg(long, default_value_t = 1, value_name = "N")]
    frame_subsampling_factor: usize,
}

impl Args {
    fn validate(&self) -> Result<()> {
        if !self.features.is_file() {
            bail!("feature store does not exist: {:?}", self.features);
        }
        if !self.posteriors.is_file() {
            bail!("posterior store does not exist: {:?}", self.posteriors);
        }
        if let Some(path) = &self.online_ivectors {
            if !path.is_file() {
                bail!("auxiliary vector store does not exist: {:?}", path);
            }
        }
        Ok(())
    }

    fn process_config(&self) -> ProcessConfig {
        ProcessConfig {
            num_pdfs: self.num_pdfs,
            compress: self.compress,
            ivector_as_input: self.ivector_as_input,
            ivector_as_output: self.ivector_as_output,
            ivector_scale_factor: self.ivector_scale_factor,
            online_ivector_period: self.online_ivector_period,
        }
    }

    fn split_config(&self) -> SplitConfig {
        SplitConfig {
            chunk_size: self.chunk_size,
            left_context: self.left_context,
            right_context: self.right_context,
            frame_subsampling_factor: self.frame_subsampling_factor,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    args.validate()
        .context("failed to validate command-line arguments")?;

    let process_config = args.process_config();
    process_config.validate()?;
    let mut splitter = UtteranceSplitter::new(args.split_config())?;

    let posteriors = PosteriorMap::load(&args.posteriors)
        .context("failed to load the posterior store")?;
    let ivectors = match &args.online_ivectors {
        Some(path) => Some(
            MatrixMap::load(path).context("failed to load the auxiliary vector store")?,
        ),
        None => None,
    };
    let mut writer = ExampleWriter::create(&args.egs_out)?;
    let mut sampler = ThreadRngSampler::new();

    let mut num_done = 0usize;
    let mut num_err = 0usize;

    for entry in MatrixReader::open(&args.features)? {
        let (key, feats) = entry?;

        let Some(pdf_post) = posteriors.get(&key) else {
            warn!(utterance = %key, "no posterior entry for utterance");
            num_err += 1;
            continue;
        };

        let aux = match &ivectors {
            Some(map) => match map.get(&key) {
                Some(matrix) => Some(matrix),
                None => {
                    warn!(utterance = %key, "no auxiliary vectors for utterance");
                    num_err += 1;
                    continue;
                }
            },
            None => None,
        };

        if let Some(aux_matrix) = aux {
            let aux_rows = aux_matrix.nrows();
            let covered = aux_rows * args.online_ivector_period;
            if aux_rows == 0 || covered.abs_diff(feats.nrows()) > args.length_tolerance {
                warn!(
                    utterance = %key,
                    feature_frames = feats.nrows(),
                    aux_rows,
                    "length difference between features and auxiliary vectors \
                     exceeds tolerance {}",
                    args.length_tolerance
                );
                num_err += 1;
                continue;
            }
        }

        match egs::process_utterance(
            &feats,
            aux,
            pdf_post,
            &key,
            &process_config,
            &mut splitter,
            &mut sampler,
            &mut writer,
        )? {
            UtteranceOutcome::Written { chunks } => {
                info!(utterance = %key, chunks, "wrote examples");
                num_done += 1;
            }
            UtteranceOutcome::Skipped(_) => num_err += 1,
        }
    }

    writer.finish()?;
    splitter.stats().log_summary();
    if num_err > 0 {
        warn!("{num_err} utterances had errors and could not be processed");
    }
    if num_done == 0 || !splitter.exit_ok() {
        bail!("no utterances were successfully processed");
    }
    info!("successfully processed {num_done} utterances");
    Ok(())
}
