//! Delimited visualization export.
//!
//! One line per neuron, in scan order:
//!
//! ```text
//! x,y,z,label,w_1,...,w_n
//! ```
//!
//! `label` is [`UNLABELED`] (-1) for neurons without a label. The data
//! loader rejects -1 as a class label, so labels read back unchanged. Weights are
//! written with Rust's shortest round-trip float formatting, so reading the
//! file back yields the exact in-memory values.

use crate::config::DataConfig;
use crate::dataset::Dataset;
use crate::error::{KohonenError, Result};
use crate::som::{Coord, LabelMap, Som, UNLABELED};
use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// One exported neuron.
#[derive(Debug, Clone, PartialEq)]
pub struct NeuronRecord {
    /// Grid position.
    pub coord: Coord,
    /// Resolved label, `None` when unlabeled.
    ///
    /// A label of [`UNLABELED`] in a hand-built [`Dataset`] is written as -1
    /// and therefore reads back as `None`.
    pub label: Option<i64>,
    /// Weight vector at export time.
    pub weights: Vec<f64>,
}

impl NeuronRecord {
    /// Builds the records that an export of `som` with `labels` would write.
    pub fn collect(som: &Som, labels: &LabelMap) -> Vec<NeuronRecord> {
        som.neurons()
            .map(|n| NeuronRecord {
                coord: n.coord,
                label: labels.label(n.coord),
                weights: n.weights.to_vec(),
            })
            .collect()
    }

    fn parse(line: &str, line_no: usize) -> Result<Self> {
        let bad = |message: String| KohonenError::DataFormat {
            line: line_no,
            message,
        };
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 5 {
            return Err(bad(format!(
                "expected x,y,z,label and at least one weight, got {} fields",
                fields.len()
            )));
        }

        let mut axes = [0usize; 3];
        for (axis, token) in axes.iter_mut().zip(&fields[..3]) {
            *axis = token
                .parse()
                .map_err(|_| bad(format!("invalid coordinate '{}'", token)))?;
        }
        let label: i64 = fields[3]
            .parse()
            .map_err(|_| bad(format!("invalid label '{}'", fields[3])))?;
        let weights = fields[4..]
            .iter()
            .map(|t| {
                t.parse::<f64>()
                    .map_err(|_| bad(format!("invalid weight '{}'", t)))
            })
            .collect::<Result<Vec<f64>>>()?;

        Ok(Self {
            coord: Coord::new(axes[0], axes[1], axes[2]),
            label: (label != UNLABELED).then_some(label),
            weights,
        })
    }
}

/// Summary of an export run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    /// Lines written.
    pub neurons: usize,
    /// Neurons written with a label.
    pub labeled: usize,
}

/// Writes every neuron of `som` with its label from `labels`.
pub fn write_visualization<P: AsRef<Path>>(path: P, som: &Som, labels: &LabelMap) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| KohonenError::unavailable(path, e))?;
    let mut writer = BufWriter::new(file);

    for (i, neuron) in som.neurons().enumerate() {
        let Coord { x, y, z } = neuron.coord;
        write!(writer, "{},{},{},{}", x, y, z, labels.label_or_sentinel(i))?;
        for w in neuron.weights {
            write!(writer, ",{}", w)?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a file written by [`write_visualization`].
pub fn read_visualization<P: AsRef<Path>>(path: P) -> Result<Vec<NeuronRecord>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| KohonenError::unavailable(path, e))?;

    let mut records = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(NeuronRecord::parse(&line, i + 1)?);
    }
    Ok(records)
}

/// Labels `som` from the dataset at `labeled_path` and writes the export.
///
/// A labeled dataset that cannot be opened is logged and every neuron is
/// exported unlabeled. Malformed labeled data is still an error.
pub fn export_visualization<P: AsRef<Path>, Q: AsRef<Path>>(
    som: &Som,
    labeled_path: P,
    output_path: Q,
    config: &DataConfig,
) -> Result<ExportSummary> {
    let labeled_path = labeled_path.as_ref();
    let labels = match Dataset::load(labeled_path, som.input_size(), config) {
        Ok(dataset) => LabelMap::build(som, &dataset)?,
        Err(err @ KohonenError::ResourceUnavailable { .. }) => {
            warn!("{}; exporting all neurons unlabeled", err);
            LabelMap::unlabeled(som)
        }
        Err(err) => return Err(err),
    };

    write_visualization(output_path.as_ref(), som, &labels)?;

    let summary = ExportSummary {
        neurons: som.total_neurons(),
        labeled: labels.labeled_count(),
    };
    info!(
        "Wrote {} neurons ({} labeled) to {}",
        summary.neurons,
        summary.labeled,
        output_path.as_ref().display()
    );
    Ok(summary)
}
