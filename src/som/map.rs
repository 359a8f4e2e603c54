//! Self-Organizing Map (SOM) implementation.

use crate::config::SomConfig;
use crate::dataset::Dataset;
use crate::error::{KohonenError, Result};
use crate::som::distance::{euclidean, neighborhood_weight};
use crate::som::{Coord, Neuron};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Uniform};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// A three-dimensional Self-Organizing Map.
///
/// All weight vectors live in one flat buffer, neuron after neuron in
/// x-major, y, z order. The extents and the input size are fixed at
/// construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Som {
    grid_x: usize,
    grid_y: usize,
    grid_z: usize,
    input_size: usize,
    weights: Vec<f64>,
    parallel: bool,
}

impl Som {
    /// Creates a new SOM with uniformly random weights in `[0, 1)`.
    ///
    /// The generator is seeded from `config.seed`, or from entropy when no
    /// seed is given.
    pub fn new(config: &SomConfig) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_rng(config, &mut rng)
    }

    /// Creates a new SOM drawing initial weights from a caller-owned generator.
    pub fn with_rng<R: Rng + ?Sized>(config: &SomConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;

        let uniform = Uniform::new(0.0, 1.0);
        let len = config.total_neurons() * config.input_size;
        let weights: Vec<f64> = (0..len).map(|_| uniform.sample(rng)).collect();

        Ok(Self {
            grid_x: config.grid_x,
            grid_y: config.grid_y,
            grid_z: config.grid_z,
            input_size: config.input_size,
            weights,
            parallel: config.parallel,
        })
    }

    /// Creates a SOM from an existing flat weight buffer.
    ///
    /// `weights` must hold `grid_x * grid_y * grid_z * input_size` values in
    /// scan order.
    pub fn from_weights(
        grid: (usize, usize, usize),
        input_size: usize,
        weights: Vec<f64>,
    ) -> Result<Self> {
        let som = Self {
            grid_x: grid.0,
            grid_y: grid.1,
            grid_z: grid.2,
            input_size,
            weights,
            parallel: false,
        };
        som.check_shape()?;
        Ok(som)
    }

    fn check_shape(&self) -> Result<()> {
        if self.grid_x == 0 || self.grid_y == 0 || self.grid_z == 0 || self.input_size == 0 {
            return Err(KohonenError::InvalidConfiguration(format!(
                "grid {}x{}x{} with input size {} has no neurons",
                self.grid_x, self.grid_y, self.grid_z, self.input_size
            )));
        }
        let expected = self
            .grid_x
            .checked_mul(self.grid_y)
            .and_then(|n| n.checked_mul(self.grid_z))
            .and_then(|n| n.checked_mul(self.input_size))
            .ok_or_else(|| {
                KohonenError::InvalidConfiguration(format!(
                    "grid {}x{}x{} with input size {} is too large to allocate",
                    self.grid_x, self.grid_y, self.grid_z, self.input_size
                ))
            })?;
        if self.weights.len() != expected {
            return Err(KohonenError::DimensionMismatch {
                expected,
                actual: self.weights.len(),
            });
        }
        Ok(())
    }

    /// Returns the grid extents as `(x, y, z)`.
    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.grid_x, self.grid_y, self.grid_z)
    }

    /// Returns the length of every weight vector.
    #[inline]
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Returns the total number of neurons.
    #[inline]
    pub fn total_neurons(&self) -> usize {
        self.grid_x * self.grid_y * self.grid_z
    }

    /// Whether BMU search runs on the rayon thread pool.
    #[inline]
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Enables or disables parallel BMU search. Results are identical either way.
    pub fn set_parallel(&mut self, parallel: bool) {
        self.parallel = parallel;
    }

    /// Converts a coordinate to its position in scan order.
    #[inline]
    pub fn index_of(&self, coord: Coord) -> Option<usize> {
        if coord.x < self.grid_x && coord.y < self.grid_y && coord.z < self.grid_z {
            Some((coord.x * self.grid_y + coord.y) * self.grid_z + coord.z)
        } else {
            None
        }
    }

    /// Converts a scan-order position back to a coordinate.
    #[inline]
    pub fn coord_of(&self, index: usize) -> Coord {
        let z = index % self.grid_z;
        let y = (index / self.grid_z) % self.grid_y;
        let x = index / (self.grid_z * self.grid_y);
        Coord::new(x, y, z)
    }

    /// Gets a neuron's weight vector by its coordinate.
    #[inline]
    pub fn weights(&self, coord: Coord) -> Option<&[f64]> {
        self.index_of(coord).map(|i| self.slot(i))
    }

    /// Returns the raw weight buffer in scan order.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.weights
    }

    #[inline]
    fn slot(&self, index: usize) -> &[f64] {
        let offset = index * self.input_size;
        &self.weights[offset..offset + self.input_size]
    }

    /// Iterates over all neurons in scan order.
    pub fn neurons(&self) -> impl Iterator<Item = Neuron<'_>> + '_ {
        self.weights
            .chunks_exact(self.input_size)
            .enumerate()
            .map(move |(i, weights)| Neuron {
                coord: self.coord_of(i),
                weights,
            })
    }

    fn check_sample(&self, sample: &[f64]) -> Result<()> {
        if sample.len() != self.input_size {
            return Err(KohonenError::DimensionMismatch {
                expected: self.input_size,
                actual: sample.len(),
            });
        }
        Ok(())
    }

    /// Finds the Best Matching Unit (BMU) for a sample.
    ///
    /// Neurons are scanned in x-major, y, z order and the first one reaching
    /// the smallest Euclidean distance wins.
    pub fn find_bmu(&self, sample: &[f64]) -> Result<Coord> {
        if self.parallel {
            self.find_bmu_parallel(sample)
        } else {
            self.find_bmu_sequential(sample)
        }
    }

    /// Finds the BMU with a single sequential scan.
    pub fn find_bmu_sequential(&self, sample: &[f64]) -> Result<Coord> {
        self.check_sample(sample)?;

        let mut best_idx = 0;
        let mut best_dist = f64::INFINITY;
        for (i, weights) in self.weights.chunks_exact(self.input_size).enumerate() {
            let dist = euclidean(sample, weights);
            if dist < best_dist {
                best_dist = dist;
                best_idx = i;
            }
        }

        Ok(self.coord_of(best_idx))
    }

    /// Finds the BMU in parallel.
    ///
    /// The reduction keeps the lower scan index on equal distances, so the
    /// result always matches [`Som::find_bmu_sequential`].
    pub fn find_bmu_parallel(&self, sample: &[f64]) -> Result<Coord> {
        self.check_sample(sample)?;

        let (best_idx, _) = self
            .weights
            .par_chunks_exact(self.input_size)
            .enumerate()
            .map(|(i, weights)| {
                let dist = euclidean(sample, weights);
                (i, if dist.is_nan() { f64::INFINITY } else { dist })
            })
            .reduce(
                || (usize::MAX, f64::INFINITY),
                |a, b| {
                    if b.1 < a.1 || (b.1 == a.1 && b.0 < a.0) {
                        b
                    } else {
                        a
                    }
                },
            );

        Ok(self.coord_of(if best_idx == usize::MAX { 0 } else { best_idx }))
    }

    /// Pulls every neuron within `sigma` of `bmu` toward `sample`.
    ///
    /// Each neuron at grid distance `d <= sigma` moves by
    /// `learning_rate * exp(-d^2 / (2 sigma^2))` of the way to the sample.
    /// Neurons farther than `sigma` are left untouched.
    pub fn update_weights(
        &mut self,
        sample: &[f64],
        bmu: Coord,
        learning_rate: f64,
        sigma: f64,
    ) -> Result<()> {
        self.check_sample(sample)?;
        if sigma.is_nan() || sigma <= 0.0 {
            return Err(KohonenError::InvalidConfiguration(format!(
                "sigma must be positive, got {}",
                sigma
            )));
        }

        // |dx|, |dy|, |dz| can never exceed floor(sigma) inside the radius.
        let reach = sigma.floor() as usize;
        let span = |center: usize, extent: usize| {
            let lo = center.saturating_sub(reach);
            let hi = center.saturating_add(reach).min(extent - 1);
            lo..=hi
        };

        for x in span(bmu.x, self.grid_x) {
            for y in span(bmu.y, self.grid_y) {
                for z in span(bmu.z, self.grid_z) {
                    let coord = Coord::new(x, y, z);
                    let dist = coord.grid_distance(&bmu);
                    if dist > sigma {
                        continue;
                    }

                    let influence = learning_rate * neighborhood_weight(dist, sigma);
                    let offset = ((x * self.grid_y + y) * self.grid_z + z) * self.input_size;
                    let neuron = &mut self.weights[offset..offset + self.input_size];
                    for (w, s) in neuron.iter_mut().zip(sample.iter()) {
                        *w += influence * (s - *w);
                    }
                }
            }
        }

        Ok(())
    }

    /// Mean distance between each sample and its BMU.
    pub fn quantization_error(&self, dataset: &Dataset) -> Result<f64> {
        if dataset.is_empty() {
            return Err(KohonenError::EmptyDataset);
        }

        let mut total = 0.0;
        for sample in dataset.iter() {
            let bmu = self.find_bmu(&sample.features)?;
            if let Some(weights) = self.weights(bmu) {
                total += euclidean(&sample.features, weights);
            }
        }
        Ok(total / dataset.len() as f64)
    }

    /// Saves a snapshot of the grid to a binary file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| KohonenError::unavailable(path, e))?;
        let mut writer = BufWriter::new(file);
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Loads a grid snapshot written by [`Som::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| KohonenError::unavailable(path, e))?;
        let som: Som = bincode::deserialize_from(BufReader::new(file))?;
        som.check_shape()?;
        Ok(som)
    }
}
