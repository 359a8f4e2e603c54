//! SOM training loop.
//!
//! Each epoch `e` uses
//! `learning_rate = initial_learning_rate * exp(-e / epochs)` and
//! `sigma = initial_sigma * exp(-e / epochs)`, then visits every sample in
//! stored order: find its BMU, pull the neighborhood toward it.
//!
//! Batched training walks the same samples in the same order and only groups
//! them for progress reporting, so both entry points produce identical grids.

use crate::config::SomConfig;
use crate::dataset::Dataset;
use crate::error::{KohonenError, Result};
use crate::som::Som;
use log::{debug, info};

/// Progress snapshot passed to the callback after every batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingProgress {
    /// Zero-based epoch index.
    pub epoch: usize,
    /// Total number of epochs.
    pub epochs: usize,
    /// Zero-based batch index within the epoch.
    pub batch: usize,
    /// Number of batches per epoch.
    pub batches: usize,
    /// Samples processed so far in this epoch.
    pub samples_done: usize,
    /// Samples per epoch.
    pub samples_total: usize,
    /// Learning rate used for this epoch.
    pub learning_rate: f64,
    /// Neighborhood radius used for this epoch.
    pub sigma: f64,
}

impl TrainingProgress {
    /// Percentage of the current epoch completed.
    pub fn epoch_percent(&self) -> f64 {
        100.0 * self.samples_done as f64 / self.samples_total as f64
    }

    /// Percentage of the whole run completed.
    pub fn overall_percent(&self) -> f64 {
        let done = self.epoch * self.samples_total + self.samples_done;
        100.0 * done as f64 / (self.epochs * self.samples_total) as f64
    }
}

/// What a training run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingMetrics {
    /// Learning rate used in each epoch.
    pub learning_rates: Vec<f64>,
    /// Neighborhood radius used in each epoch.
    pub sigmas: Vec<f64>,
    /// Total number of BMU search + update steps.
    pub steps: usize,
}

/// SOM trainer with an exponential decay schedule.
pub struct SomTrainer {
    config: SomConfig,
}

impl SomTrainer {
    /// Creates a new trainer with the given configuration.
    pub fn new(config: SomConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the trainer's configuration.
    pub fn config(&self) -> &SomConfig {
        &self.config
    }

    #[inline]
    fn decay(&self, epoch: usize) -> f64 {
        (-(epoch as f64) / self.config.epochs as f64).exp()
    }

    /// Computes the learning rate at a given epoch.
    #[inline]
    pub fn learning_rate(&self, epoch: usize) -> f64 {
        self.config.initial_learning_rate * self.decay(epoch)
    }

    /// Computes the neighborhood radius at a given epoch.
    #[inline]
    pub fn sigma(&self, epoch: usize) -> f64 {
        self.config.initial_sigma * self.decay(epoch)
    }

    fn check(&self, som: &Som, dataset: &Dataset) -> Result<()> {
        if dataset.is_empty() {
            return Err(KohonenError::EmptyDataset);
        }
        if som.input_size() != self.config.input_size {
            return Err(KohonenError::DimensionMismatch {
                expected: self.config.input_size,
                actual: som.input_size(),
            });
        }
        // Reject bad rows before the first update so the grid is never left half-trained.
        if let Some(sample) = dataset
            .iter()
            .find(|s| s.features.len() != som.input_size())
        {
            return Err(KohonenError::DimensionMismatch {
                expected: som.input_size(),
                actual: sample.features.len(),
            });
        }
        Ok(())
    }

    /// Trains the SOM over every sample for every epoch.
    pub fn train(&self, som: &mut Som, dataset: &Dataset) -> Result<TrainingMetrics> {
        self.train_with_batches(som, dataset, dataset.len().max(1), |_| {})
    }

    /// Trains the SOM, reporting progress after every `batch_size` samples.
    ///
    /// A `batch_size` larger than the dataset yields a single batch per
    /// epoch. Zero is rejected.
    pub fn train_with_batches<F>(
        &self,
        som: &mut Som,
        dataset: &Dataset,
        batch_size: usize,
        mut on_progress: F,
    ) -> Result<TrainingMetrics>
    where
        F: FnMut(&TrainingProgress),
    {
        if batch_size == 0 {
            return Err(KohonenError::InvalidBatchSize(batch_size));
        }
        self.check(som, dataset)?;

        let samples = dataset.samples();
        let batch_size = batch_size.min(samples.len());
        let batches = samples.len().div_ceil(batch_size);
        let epochs = self.config.epochs;

        info!(
            "Training SOM: {} samples, {} neurons, {} epochs, {} batches of up to {}",
            samples.len(),
            som.total_neurons(),
            epochs,
            batches,
            batch_size
        );

        let mut metrics = TrainingMetrics::default();

        for epoch in 0..epochs {
            let learning_rate = self.learning_rate(epoch);
            let sigma = self.sigma(epoch);
            metrics.learning_rates.push(learning_rate);
            metrics.sigmas.push(sigma);

            info!(
                "Epoch {}/{}: lr={:.6}, sigma={:.4}",
                epoch + 1,
                epochs,
                learning_rate,
                sigma
            );

            let mut samples_done = 0;
            for (batch, chunk) in samples.chunks(batch_size).enumerate() {
                for sample in chunk {
                    let bmu = som.find_bmu(&sample.features)?;
                    som.update_weights(&sample.features, bmu, learning_rate, sigma)?;
                }
                samples_done += chunk.len();
                metrics.steps += chunk.len();

                let progress = TrainingProgress {
                    epoch,
                    epochs,
                    batch,
                    batches,
                    samples_done,
                    samples_total: samples.len(),
                    learning_rate,
                    sigma,
                };
                debug!(
                    "Epoch {} batch {}/{} ({:.1}% of epoch)",
                    epoch + 1,
                    batch + 1,
                    batches,
                    progress.epoch_percent()
                );
                on_progress(&progress);
            }
        }

        info!("SOM training completed after {} steps", metrics.steps);
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Sample;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn test_config() -> SomConfig {
        SomConfig {
            grid_x: 3,
            grid_y: 3,
            grid_z: 2,
            input_size: 4,
            epochs: 5,
            initial_learning_rate: 0.5,
            initial_sigma: 2.0,
            seed: Some(42),
            ..Default::default()
        }
    }

    fn random_dataset(n: usize, dim: usize, seed: u64) -> Dataset {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n)
            .map(|i| Sample::new(i as i64 % 3, (0..dim).map(|_| rng.gen::<f64>()).collect()))
            .collect()
    }

    #[test]
    fn test_schedule_decay() {
        let trainer = SomTrainer::new(test_config()).unwrap();

        assert!((trainer.learning_rate(0) - 0.5).abs() < 1e-12);
        assert!((trainer.sigma(0) - 2.0).abs() < 1e-12);
        for epoch in 1..5 {
            assert!(trainer.learning_rate(epoch) < trainer.learning_rate(epoch - 1));
            assert!(trainer.sigma(epoch) < trainer.sigma(epoch - 1));
            assert!(trainer.learning_rate(epoch) > 0.0);
            assert!(trainer.sigma(epoch) > 0.0);
        }
        assert!((trainer.sigma(4) - 2.0 * (-0.8f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SomConfig {
            epochs: 0,
            ..test_config()
        };
        assert!(matches!(
            SomTrainer::new(config),
            Err(KohonenError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_empty_dataset_is_reported() {
        let config = test_config();
        let mut som = Som::new(&config).unwrap();
        let before = som.clone();
        let trainer = SomTrainer::new(config).unwrap();

        let result = trainer.train(&mut som, &Dataset::default());
        assert!(matches!(result, Err(KohonenError::EmptyDataset)));
        assert_eq!(som, before);
    }

    #[test]
    fn test_bad_sample_rejected_before_training() {
        let config = test_config();
        let mut som = Som::new(&config).unwrap();
        let before = som.clone();
        let trainer = SomTrainer::new(config).unwrap();

        let dataset = Dataset::new(vec![
            Sample::new(0, vec![0.1; 4]),
            Sample::new(1, vec![0.1; 3]),
        ]);
        assert!(matches!(
            trainer.train(&mut som, &dataset),
            Err(KohonenError::DimensionMismatch { expected: 4, actual: 3 })
        ));
        assert_eq!(som, before);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = test_config();
        let mut som = Som::new(&config).unwrap();
        let trainer = SomTrainer::new(config).unwrap();
        let dataset = random_dataset(5, 4, 1);

        assert!(matches!(
            trainer.train_with_batches(&mut som, &dataset, 0, |_| {}),
            Err(KohonenError::InvalidBatchSize(0))
        ));
    }

    #[test]
    fn test_batching_is_bit_identical() {
        let config = test_config();
        let dataset = random_dataset(12, 4, 9);
        let trainer = SomTrainer::new(config.clone()).unwrap();

        let mut reference = Som::new(&config).unwrap();
        trainer.train(&mut reference, &dataset).unwrap();

        for batch_size in [1, 12, 4, 5, 100] {
            let mut som = Som::new(&config).unwrap();
            trainer
                .train_with_batches(&mut som, &dataset, batch_size, |_| {})
                .unwrap();
            assert_eq!(som.as_slice(), reference.as_slice(), "batch size {}", batch_size);
        }
    }

    #[test]
    fn test_parallel_training_matches() {
        let config = test_config();
        let dataset = random_dataset(10, 4, 5);
        let trainer = SomTrainer::new(config.clone()).unwrap();

        let mut sequential = Som::new(&config).unwrap();
        trainer.train(&mut sequential, &dataset).unwrap();

        let mut parallel = Som::new(&config).unwrap();
        parallel.set_parallel(true);
        trainer.train(&mut parallel, &dataset).unwrap();

        assert_eq!(sequential.as_slice(), parallel.as_slice());
    }

    #[test]
    fn test_progress_reports() {
        let config = test_config();
        let dataset = random_dataset(10, 4, 2);
        let mut som = Som::new(&config).unwrap();
        let trainer = SomTrainer::new(config).unwrap();

        let mut reports = Vec::new();
        let metrics = trainer
            .train_with_batches(&mut som, &dataset, 4, |p| reports.push(*p))
            .unwrap();

        // 3 batches (4 + 4 + 2) for each of 5 epochs.
        assert_eq!(reports.len(), 15);
        assert_eq!(reports[2].samples_done, 10);
        assert_eq!(reports[2].batches, 3);
        assert!((reports[2].epoch_percent() - 100.0).abs() < 1e-12);
        assert!((reports[14].overall_percent() - 100.0).abs() < 1e-12);
        assert_eq!(metrics.steps, 50);
        assert_eq!(metrics.learning_rates.len(), 5);
    }

    #[test]
    fn test_oversized_batch_is_single_batch() {
        let config = test_config();
        let dataset = random_dataset(3, 4, 2);
        let mut som = Som::new(&config).unwrap();
        let trainer = SomTrainer::new(config).unwrap();

        let mut batches = Vec::new();
        trainer
            .train_with_batches(&mut som, &dataset, 1000, |p| batches.push(p.batches))
            .unwrap();
        assert!(batches.iter().all(|&b| b == 1));
        assert_eq!(batches.len(), 5);
    }
}
