//! Labeled sample storage and delimited-file loading.
//!
//! Files carry a header (`label,<f1>,...,<fn>`) followed by one row per
//! sample: an integer label and `input_size` raw feature values. Features are
//! divided by [`DataConfig::scale`](crate::config::DataConfig) on load.

mod csv;
mod validation;

pub use csv::{parse_header, parse_row};
pub use validation::{validate_file, RowIssue, ValidationReport};

use crate::config::DataConfig;
use crate::error::Result;
use std::path::Path;

/// One labeled training sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Class label from the first column.
    pub label: i64,
    /// Scaled feature values.
    pub features: Vec<f64>,
}

impl Sample {
    /// Creates a new sample.
    pub fn new(label: i64, features: Vec<f64>) -> Self {
        Self { label, features }
    }
}

/// An ordered collection of samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    samples: Vec<Sample>,
}

impl Dataset {
    /// Creates a dataset from samples, keeping their order.
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// Loads a dataset from a delimited text file.
    ///
    /// Stops at the first malformed line.
    pub fn load<P: AsRef<Path>>(path: P, input_size: usize, config: &DataConfig) -> Result<Self> {
        csv::load(path.as_ref(), input_size, config)
    }

    /// Number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterates over samples in stored order.
    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    /// Returns the samples as a slice.
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

impl FromIterator<Sample> for Dataset {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}
