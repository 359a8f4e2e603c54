//! # Kohonen3D - Three-Dimensional Self-Organizing Maps
//!
//! Kohonen3D trains a self-organizing map whose neurons sit on a dense
//! `x * y * z` grid. Each neuron holds a weight vector in the same space as
//! the training samples; training pulls the best matching neuron and its
//! grid neighborhood toward every sample, so the map approximates the input
//! distribution while keeping nearby neurons similar.
//!
//! ## Key Features
//!
//! - **Flat weight arena** with deterministic, scan-ordered BMU search
//! - **Exponential decay** of learning rate and neighborhood radius per epoch
//! - **Batched progress reporting** that never changes the numeric result
//! - **Label inference** by BMU voting and neighbor-majority resolution
//! - **Delimited export** of coordinates, labels and weights
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kohonen3d::{Config, Dataset, Som, SomTrainer, export_visualization};
//!
//! let config = Config::default();
//! let train = Dataset::load("train.csv", config.som.input_size, &config.data)?;
//!
//! let mut som = Som::new(&config.som)?;
//! let trainer = SomTrainer::new(config.som.clone())?;
//! trainer.train_with_batches(&mut som, &train, 100, |p| {
//!     println!("epoch {} {:.1}%", p.epoch + 1, p.epoch_percent());
//! })?;
//!
//! export_visualization(&som, "test.csv", "som_output.txt", &config.data)?;
//! ```
//!
//! ## Architecture
//!
//! - [`config`] - Engine and data file configuration
//! - [`dataset`] - Sample loading and validation
//! - [`som`] - Grid, BMU search, update rule, training, labeling
//! - [`storage`] - Visualization export

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod dataset;
pub mod error;
pub mod som;
pub mod storage;

// Re-export commonly used types
pub use config::{Config, DataConfig, SomConfig};
pub use dataset::{validate_file, Dataset, Sample, ValidationReport};
pub use error::{KohonenError, Result};
pub use som::{
    Coord, LabelMap, Neuron, Som, SomTrainer, TrainingMetrics, TrainingProgress, UNLABELED,
};
pub use storage::{export_visualization, read_visualization, write_visualization, NeuronRecord};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_unlabeled_sentinel() {
        assert_eq!(UNLABELED, -1);
    }
}
