//! JSON Lines key-value stores for features, posteriors and examples.
//!
//! Features are read sequentially in store order; posteriors and auxiliary
//! matrices are loaded whole for random access by utterance key; examples
//! are appended one object per line.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::egs::ExampleSink;
use crate::types::{Example, Posterior, Stream};

/// On-disk record for one dense matrix.
#[derive(Debug, Serialize, Deserialize)]
pub struct MatrixRecord {
    pub key: String,
    pub rows: usize,
    pub cols: usize,
    /// Row-major values, `rows * cols` entries.
    pub data: Vec<f32>,
}

impl MatrixRecord {
    pub fn from_matrix(key: &str, matrix: &Array2<f32>) -> Self {
        Self {
            key: key.to_string(),
            rows: matrix.nrows(),
            cols: matrix.ncols(),
            data: matrix.iter().copied().collect(),
        }
    }

    pub fn into_matrix(self) -> Result<(String, Array2<f32>)> {
        ensure!(
            self.data.len() == self.rows * self.cols,
            "matrix record '{}' declares {}x{} but carries {} values",
            self.key,
            self.rows,
            self.cols,
            self.data.len()
        );
        let matrix = Array2::from_shape_vec((self.rows, self.cols), self.data)
            .context("failed to shape matrix record")?;
        Ok((self.key, matrix))
    }
}

/// On-disk record for one utterance's posterior sequence.
#[derive(Debug, Serialize, Deserialize)]
pub struct PosteriorRecord {
    pub key: String,
    pub frames: Posterior,
}

/// Sequential reader over a JSONL matrix store, yielding entries in file
/// order.
pub struct MatrixReader {
    lines: Lines<BufReader<File>>,
    path: PathBuf,
    line_number: usize,
}

impl MatrixReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open matrix store {path:?}"))?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            path: path.to_path_buf(),
            line_number: 0,
        })
    }
}

impl Iterator for MatrixReader {
    type Item = Result<(String, Array2<f32>)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(err.into())),
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            let parsed = serde_json::from_str::<MatrixRecord>(&line)
                .with_context(|| {
                    format!("bad matrix record at {:?}:{}", self.path, self.line_number)
                })
                .and_then(MatrixRecord::into_matrix);
            return Some(parsed);
        }
    }
}

/// Random-access matrix store, fully loaded into memory.
pub struct MatrixMap {
    entries: HashMap<String, Array2<f32>>,
}

impl MatrixMap {
    pub fn load(path: &Path) -> Result<Self> {
        let entries = MatrixReader::open(path)?.collect::<Result<HashMap<_, _>>>()?;
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&Array2<f32>> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Random-access posterior store, fully loaded into memory.
pub struct PosteriorMap {
    entries: HashMap<String, Posterior>,
}

impl PosteriorMap {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open posterior store {path:?}"))?;
        let mut entries = HashMap::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: PosteriorRecord = serde_json::from_str(&line)
                .with_context(|| format!("bad posterior record at {:?}:{}", path, index + 1))?;
            entries.insert(record.key, record.frames);
        }
        Ok(Self { entries })
    }

    pub fn get(&self, key: &str) -> Option<&Posterior> {
        self.entries.get(key)
    }
}

#[derive(Serialize)]
struct ExampleRecord<'a> {
    key: &'a str,
    io: &'a [Stream],
}

/// Append-only JSONL example writer; one `{"key", "io"}` object per line.
pub struct ExampleWriter {
    out: BufWriter<File>,
}

impl ExampleWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file =
            File::create(path).with_context(|| format!("failed to create example store {path:?}"))?;
        Ok(Self {
            out: BufWriter::new(file),
        })
    }

    pub fn finish(mut self) -> Result<()> {
        self.out.flush().context("failed to flush example store")?;
        Ok(())
    }
}

impl ExampleSink for ExampleWriter {
    fn put(&mut self, key: &str, example: Example) -> Result<()> {
        let record = ExampleRecord {
            key,
            io: &example.io,
        };
        serde_json::to_writer(&mut self.out, &record)
            .with_context(|| format!("failed to serialize example '{key}'"))?;
        self.out.write_all(b"\n")?;
        Ok(())
    }
}

/// In-memory sink capturing everything written, for tests.
#[derive(Default)]
pub struct MemorySink {
    pub examples: Vec<(String, Example)>,
}

impl ExampleSink for MemorySink {
    fn put(&mut self, key: &str, example: Example) -> Result<()> {
        self.examples.push((key.to_string(), example));
        Ok(())
    }
}
