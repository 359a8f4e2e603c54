//! Neuron coordinates and views for the Self-Organizing Map.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer position of a neuron in the 3D grid.
///
/// Coordinates order x-major, then y, then z, which is also the scan order
/// used by BMU search and export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coord {
    /// Position along x.
    pub x: usize,
    /// Position along y.
    pub y: usize,
    /// Position along z.
    pub z: usize,
}

impl Coord {
    /// Creates a new coordinate.
    #[inline]
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to another coordinate in real-valued space.
    pub fn grid_distance(&self, other: &Coord) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        let dz = self.z as f64 - other.z as f64;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl From<(usize, usize, usize)> for Coord {
    fn from((x, y, z): (usize, usize, usize)) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// A borrowed view of one neuron: its position and its weight vector.
#[derive(Debug, Clone, Copy)]
pub struct Neuron<'a> {
    /// Position on the grid.
    pub coord: Coord,
    /// Weight vector, always `input_size` long.
    pub weights: &'a [f64],
}
