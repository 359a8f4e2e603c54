//! Self-Organizing Map (SOM) engine.
//!
//! - **Grid**: flat weight arena with BMU search and the update rule (map.rs)
//! - **Distances**: sample and grid distances, Gaussian falloff (distance.rs, neuron.rs)
//! - **Training**: epoch loop with exponential decay and batched progress (training.rs)
//! - **Labeling**: vote collection and neighbor-majority resolution (labeling.rs)

mod distance;
mod map;
mod neuron;
pub mod labeling;
pub mod training;

pub use distance::{neighborhood_weight, sample_distance};
pub use labeling::{LabelMap, UNLABELED};
pub use map::Som;
pub use neuron::{Coord, Neuron};
pub use training::{SomTrainer, TrainingMetrics, TrainingProgress};
