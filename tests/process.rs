use ndarray::{array, Array2};

use eggen::egs::{process_utterance, ProcessConfig, SkipReason, UtteranceOutcome};
use eggen::io::MemorySink;
use eggen::sampling::FixedSampler;
use eggen::splitting::{SplitConfig, UtteranceSplitter};
use eggen::types::{Posterior, StreamData};

fn splitter(chunk_size: usize) -> UtteranceSplitter {
    UtteranceSplitter::new(SplitConfig {
        chunk_size,
        left_context: 0,
        right_context: 0,
        frame_subsampling_factor: 1,
    })
    .unwrap()
}

fn config() -> ProcessConfig {
    ProcessConfig {
        num_pdfs: 10,
        compress: false,
        ivector_as_input: false,
        ivector_as_output: false,
        ivector_scale_factor: 1.0,
        online_ivector_period: 1,
    }
}

fn feats(rows: usize, cols: usize) -> Array2<f32> {
    Array2::from_shape_fn((rows, cols), |(r, c)| r as f32 + c as f32 * 0.25)
}

fn single_class_labels(frames: usize) -> Posterior {
    (0..frames).map(|_| vec![(0, 1.0)]).collect()
}

#[test]
fn one_chunk_utterance_round_trips_exactly() {
    let feats = feats(20, 3);
    let labels = single_class_labels(20);
    let mut splitter = splitter(20);
    let mut sampler = FixedSampler::new(vec![]);
    let mut sink = MemorySink::default();

    let outcome = process_utterance(
        &feats,
        None,
        &labels,
        "utt",
        &config(),
        &mut splitter,
        &mut sampler,
        &mut sink,
    )
    .unwrap();

    assert_eq!(outcome, UtteranceOutcome::Written { chunks: 1 });
    assert_eq!(sink.examples.len(), 1);

    let (key, example) = &sink.examples[0];
    assert_eq!(key, "utt-0");
    assert_eq!(example.io.len(), 2);

    assert_eq!(example.io[0].name, "input");
    assert_eq!(example.io[0].t_offset, 0);
    match &example.io[0].data {
        StreamData::Dense(matrix) => assert_eq!(matrix, &feats),
        other => panic!("expected dense input stream, got {other:?}"),
    }

    assert_eq!(example.io[1].name, "output");
    assert_eq!(example.io[1].t_offset, 0);
    match &example.io[1].data {
        StreamData::Sparse {
            num_classes,
            frames,
        } => {
            assert_eq!(*num_classes, 10);
            assert_eq!(frames.len(), 20);
            for frame in frames {
                assert_eq!(frame, &vec![(0, 1.0)]);
            }
        }
        other => panic!("expected sparse output stream, got {other:?}"),
    }
}

#[test]
fn auxiliary_output_stream_broadcasts_one_scaled_row() {
    let feats = feats(20, 3);
    let labels = single_class_labels(20);
    let aux = array![[1.0f32, 10.0], [2.0, 20.0], [3.0, 30.0], [4.0, 40.0]];
    let mut splitter = splitter(20);
    // 12 / period 5 = auxiliary row 2.
    let mut sampler = FixedSampler::new(vec![12]);
    let mut sink = MemorySink::default();
    let config = ProcessConfig {
        ivector_as_output: true,
        ivector_scale_factor: 2.0,
        online_ivector_period: 5,
        ..config()
    };

    process_utterance(
        &feats,
        Some(&aux),
        &labels,
        "utt",
        &config,
        &mut splitter,
        &mut sampler,
        &mut sink,
    )
    .unwrap();

    let example = &sink.examples[0].1;
    let stream = example
        .io
        .iter()
        .find(|s| s.name == "ivector_aux_output")
        .expect("auxiliary output stream present");
    assert_eq!(stream.t_offset, 0);
    match &stream.data {
        StreamData::Dense(matrix) => {
            assert_eq!(matrix.nrows(), 20);
            let first = matrix.row(0);
            for row in matrix.rows() {
                assert_eq!(row, first);
            }
            assert_eq!(first.to_vec(), vec![6.0, 60.0]);
        }
        other => panic!("expected dense auxiliary stream, got {other:?}"),
    }
}

#[test]
fn both_auxiliary_modes_add_both_streams_in_order() {
    let feats = feats(20, 3);
    let labels = single_class_labels(20);
    let aux = array![[1.0f32], [2.0], [3.0], [4.0]];
    let mut splitter = splitter(20);
    let mut sampler = FixedSampler::new(vec![0, 19]);
    let mut sink = MemorySink::default();
    let config = ProcessConfig {
        ivector_as_input: true,
        ivector_as_output: true,
        online_ivector_period: 5,
        ..config()
    };

    process_utterance(
        &feats,
        Some(&aux),
        &labels,
        "utt",
        &config,
        &mut splitter,
        &mut sampler,
        &mut sink,
    )
    .unwrap();

    let names: Vec<_> = sink.examples[0]
        .1
        .io
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(names, vec!["input", "ivector", "output", "ivector_aux_output"]);
}

#[test]
fn length_mismatch_skips_without_writing() {
    let feats = feats(20, 3);
    let labels = single_class_labels(19);
    let mut splitter = splitter(20);
    let mut sampler = FixedSampler::new(vec![]);
    let mut sink = MemorySink::default();

    let outcome = process_utterance(
        &feats,
        None,
        &labels,
        "utt",
        &config(),
        &mut splitter,
        &mut sampler,
        &mut sink,
    )
    .unwrap();

    assert_eq!(
        outcome,
        UtteranceOutcome::Skipped(SkipReason::LengthMismatch {
            labels: 19,
            expected: 20,
        })
    );
    assert!(sink.examples.is_empty());
}

#[test]
fn short_utterance_skips_without_writing() {
    let feats = feats(5, 3);
    let labels = single_class_labels(5);
    let mut splitter = splitter(20);
    let mut sampler = FixedSampler::new(vec![]);
    let mut sink = MemorySink::default();

    let outcome = process_utterance(
        &feats,
        None,
        &labels,
        "utt",
        &config(),
        &mut splitter,
        &mut sampler,
        &mut sink,
    )
    .unwrap();

    assert_eq!(
        outcome,
        UtteranceOutcome::Skipped(SkipReason::TooShort { frames: 5 })
    );
    assert!(sink.examples.is_empty());
}

#[test]
fn chunk_keys_are_distinct_and_weights_split_on_overlap() {
    let feats = feats(25, 2);
    let labels = single_class_labels(25);
    let mut splitter = splitter(10);
    let mut sampler = FixedSampler::new(vec![]);
    let mut sink = MemorySink::default();

    let outcome = process_utterance(
        &feats,
        None,
        &labels,
        "utt",
        &config(),
        &mut splitter,
        &mut sampler,
        &mut sink,
    )
    .unwrap();

    assert_eq!(outcome, UtteranceOutcome::Written { chunks: 3 });
    let keys: Vec<_> = sink.examples.iter().map(|(k, _)| k.clone()).collect();
    assert_eq!(keys, vec!["utt-0", "utt-10", "utt-15"]);

    // Frames 15..19 are shared by the chunks at 10 and 15; their label
    // weights are halved on each side.
    let weight_of = |example_idx: usize, frame: usize| -> f32 {
        match &sink.examples[example_idx].1.io[1].data {
            StreamData::Sparse { frames, .. } => frames[frame][0].1,
            other => panic!("expected sparse output stream, got {other:?}"),
        }
    };
    for i in 0..5 {
        assert_eq!(weight_of(1, 5 + i), 0.5);
        assert_eq!(weight_of(2, i), 0.5);
        assert_eq!(weight_of(2, 5 + i), 1.0);
    }
}

#[test]
fn compression_quantizes_dense_streams() {
    let feats = feats(20, 3);
    let labels = single_class_labels(20);
    let mut splitter = splitter(20);
    let mut sampler = FixedSampler::new(vec![]);
    let mut sink = MemorySink::default();
    let config = ProcessConfig {
        compress: true,
        ..config()
    };

    process_utterance(
        &feats,
        None,
        &labels,
        "utt",
        &config,
        &mut splitter,
        &mut sampler,
        &mut sink,
    )
    .unwrap();

    match &sink.examples[0].1.io[0].data {
        StreamData::Compressed(compressed) => {
            let restored = compressed.decompress();
            assert_eq!(restored.dim(), (20, 3));
            for (restored, original) in restored.iter().zip(feats.iter()) {
                let step = (20.0 - 1.0) / 255.0f32;
                assert!((restored - original).abs() <= step);
            }
        }
        other => panic!("expected compressed input stream, got {other:?}"),
    }
}
