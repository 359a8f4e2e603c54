//! Configuration for the Kohonen3D engine.

use crate::error::{KohonenError, Result};
use serde::{Deserialize, Serialize};

/// Main configuration for the Kohonen3D engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// SOM (Self-Organizing Map) configuration.
    pub som: SomConfig,

    /// Delimited data file configuration.
    pub data: DataConfig,
}

/// Self-Organizing Map configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SomConfig {
    /// Grid extent along x.
    /// Default: 10.
    pub grid_x: usize,

    /// Grid extent along y.
    /// Default: 10.
    pub grid_y: usize,

    /// Grid extent along z.
    /// Default: 10.
    pub grid_z: usize,

    /// Length of every sample and weight vector.
    /// Default: 784 (28x28 pixel images).
    pub input_size: usize,

    /// Number of full passes over the training set.
    /// Default: 10.
    pub epochs: usize,

    /// Learning rate at epoch 0.
    /// Default: 0.1.
    pub initial_learning_rate: f64,

    /// Neighborhood radius at epoch 0.
    /// Default: 5.0.
    pub initial_sigma: f64,

    /// Random seed for weight initialization.
    /// Default: None (random).
    pub seed: Option<u64>,

    /// Search for the BMU on the rayon thread pool.
    /// Default: false.
    pub parallel: bool,
}

impl Default for SomConfig {
    fn default() -> Self {
        Self {
            grid_x: 10,
            grid_y: 10,
            grid_z: 10,
            input_size: 784,
            epochs: 10,
            initial_learning_rate: 0.1,
            initial_sigma: 5.0,
            seed: None,
            parallel: false,
        }
    }
}

impl SomConfig {
    /// Creates a configuration with the given shape and schedule, leaving
    /// `seed` and `parallel` at their defaults.
    pub fn new(
        grid: (usize, usize, usize),
        input_size: usize,
        epochs: usize,
        initial_learning_rate: f64,
        initial_sigma: f64,
    ) -> Self {
        Self {
            grid_x: grid.0,
            grid_y: grid.1,
            grid_z: grid.2,
            input_size,
            epochs,
            initial_learning_rate,
            initial_sigma,
            ..Default::default()
        }
    }

    /// Returns the total number of neurons in the grid.
    #[inline]
    pub fn total_neurons(&self) -> usize {
        self.grid_x * self.grid_y * self.grid_z
    }

    /// Checks every invariant the engine relies on.
    pub fn validate(&self) -> Result<()> {
        let counts = [
            ("grid_x", self.grid_x),
            ("grid_y", self.grid_y),
            ("grid_z", self.grid_z),
            ("input_size", self.input_size),
            ("epochs", self.epochs),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(KohonenError::InvalidConfiguration(format!(
                    "{} must be greater than zero",
                    name
                )));
            }
        }

        let rates = [
            ("initial_learning_rate", self.initial_learning_rate),
            ("initial_sigma", self.initial_sigma),
        ];
        for (name, value) in rates {
            if !(value.is_finite() && value > 0.0) {
                return Err(KohonenError::InvalidConfiguration(format!(
                    "{} must be a positive finite number, got {}",
                    name, value
                )));
            }
        }

        if self
            .grid_x
            .checked_mul(self.grid_y)
            .and_then(|n| n.checked_mul(self.grid_z))
            .and_then(|n| n.checked_mul(self.input_size))
            .is_none()
        {
            return Err(KohonenError::InvalidConfiguration(
                "grid is too large to allocate".to_string(),
            ));
        }

        Ok(())
    }
}

/// Delimited data file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Name of the first header column.
    /// Default: "label".
    pub label_column: String,

    /// Field separator.
    /// Default: ','.
    pub delimiter: char,

    /// Raw feature values are divided by this on load.
    /// Default: 255.0 (8-bit pixel intensities).
    pub scale: f64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            label_column: "label".to_string(),
            delimiter: ',',
            scale: 255.0,
        }
    }
}

impl DataConfig {
    /// Checks that rows can be parsed and scaled with these settings.
    pub fn validate(&self) -> Result<()> {
        if self.label_column.trim().is_empty() {
            return Err(KohonenError::InvalidConfiguration(
                "label_column must not be empty".to_string(),
            ));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(KohonenError::InvalidConfiguration(format!(
                "scale must be positive and finite, got {}",
                self.scale
            )));
        }
        Ok(())
    }
}
