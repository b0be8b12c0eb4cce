//! Chunked training-example generation for neural acoustic model training.
//!
//! Converts per-utterance feature matrices and frame-level posterior label
//! distributions into fixed-size, context-padded training examples. This is
//! a format-translation utility between a feature-extraction/alignment
//! pipeline and a model trainer.

pub mod egs;
pub mod error;
pub mod io;
pub mod sampling;
pub mod splitting;
pub mod types;
