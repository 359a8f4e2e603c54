//! Post-training label inference.
//!
//! Labels are assigned in two passes over a labeled dataset:
//!
//! 1. **Vote collection**: each sample's BMU takes that sample's label and
//!    its vote counter goes up by one. The label field is simply overwritten,
//!    so a neuron hit by several classes keeps whichever came last.
//! 2. **Conflict resolution**: every neuron with at least one vote is
//!    relabeled with the most common label among labeled neurons closer than
//!    [`RESOLUTION_RADIUS`] on the grid (itself and its face neighbors). Ties
//!    go to the label seen first in scan order. Tallies read the labels from
//!    pass 1, so the result does not depend on visiting order.

use crate::dataset::Dataset;
use crate::error::Result;
use crate::som::{Coord, Som};
use log::info;

/// Label written for neurons that never became a BMU.
///
/// Reserved: `Dataset::load` rejects rows carrying this label.
pub const UNLABELED: i64 = -1;

/// Grid distance below which neurons take part in a neighbor tally.
pub const RESOLUTION_RADIUS: f64 = 1.0;

/// Per-neuron labels and vote counts, parallel to a [`Som`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMap {
    dims: (usize, usize, usize),
    labels: Vec<Option<i64>>,
    votes: Vec<usize>,
}

impl LabelMap {
    /// Creates an empty map (every neuron unlabeled) shaped like `som`.
    pub fn unlabeled(som: &Som) -> Self {
        let n = som.total_neurons();
        Self {
            dims: som.dims(),
            labels: vec![None; n],
            votes: vec![0; n],
        }
    }

    /// Runs both passes over `dataset`.
    pub fn build(som: &Som, dataset: &Dataset) -> Result<Self> {
        let mut map = Self::collect_votes(som, dataset)?;
        map.resolve_conflicts(som);
        Ok(map)
    }

    /// Pass 1: records every sample's label on its BMU.
    pub fn collect_votes(som: &Som, dataset: &Dataset) -> Result<Self> {
        let mut map = Self::unlabeled(som);
        for sample in dataset {
            let bmu = som.find_bmu(&sample.features)?;
            if let Some(i) = som.index_of(bmu) {
                map.labels[i] = Some(sample.label);
                map.votes[i] += 1;
            }
        }
        info!(
            "Collected {} votes on {} neurons",
            dataset.len(),
            map.votes.iter().filter(|&&v| v > 0).count()
        );
        Ok(map)
    }

    /// Pass 2: replaces each voted neuron's label with its neighborhood majority.
    pub fn resolve_conflicts(&mut self, som: &Som) {
        let snapshot = self.labels.clone();

        for i in 0..self.labels.len() {
            if self.votes[i] == 0 {
                continue;
            }
            let center = som.coord_of(i);

            // (label, count) in first-seen order.
            let mut tally: Vec<(i64, usize)> = Vec::new();
            for neighbor in neighbors_within(som, center, RESOLUTION_RADIUS) {
                let Some(label) = som.index_of(neighbor).and_then(|j| snapshot[j]) else {
                    continue;
                };
                match tally.iter_mut().find(|(l, _)| *l == label) {
                    Some((_, count)) => *count += 1,
                    None => tally.push((label, 1)),
                }
            }

            let mut winner: Option<(i64, usize)> = None;
            for &(label, count) in &tally {
                if winner.map_or(true, |(_, best)| count > best) {
                    winner = Some((label, count));
                }
            }
            self.labels[i] = winner.map(|(label, _)| label);
        }
    }

    /// Label at `coord`, if any.
    pub fn label(&self, coord: Coord) -> Option<i64> {
        self.index(coord).and_then(|i| self.labels[i])
    }

    /// Number of samples whose BMU was `coord`.
    pub fn votes(&self, coord: Coord) -> usize {
        self.index(coord).map_or(0, |i| self.votes[i])
    }

    /// Label at scan position `index`, or [`UNLABELED`].
    pub fn label_or_sentinel(&self, index: usize) -> i64 {
        self.labels.get(index).copied().flatten().unwrap_or(UNLABELED)
    }

    /// Number of neurons carrying a label.
    pub fn labeled_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_some()).count()
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        let (gx, gy, gz) = self.dims;
        if coord.x < gx && coord.y < gy && coord.z < gz {
            Some((coord.x * gy + coord.y) * gz + coord.z)
        } else {
            None
        }
    }
}

/// Coordinates strictly closer than `radius` to `center`, in scan order.
fn neighbors_within(som: &Som, center: Coord, radius: f64) -> Vec<Coord> {
    let (gx, gy, gz) = som.dims();
    let reach = radius.ceil() as usize;
    let span = |c: usize, extent: usize| c.saturating_sub(reach)..=(c + reach).min(extent - 1);

    let mut out = Vec::new();
    for x in span(center.x, gx) {
        for y in span(center.y, gy) {
            for z in span(center.z, gz) {
                let coord = Coord::new(x, y, z);
                if coord.grid_distance(&center) < radius {
                    out.push(coord);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Sample;

    /// A 3x3x1 grid where neuron `i` has the single weight `i`.
    fn ramp_som() -> Som {
        Som::from_weights((3, 3, 1), 1, (0..9).map(|i| i as f64).collect()).unwrap()
    }

    fn at(i: usize) -> Sample {
        Sample::new(0, vec![i as f64])
    }

    #[test]
    fn test_neighbors_are_face_adjacent() {
        let som = Som::from_weights((3, 3, 3), 1, vec![0.0; 27]).unwrap();
        let center = Coord::new(1, 1, 1);
        let neighbors = neighbors_within(&som, center, RESOLUTION_RADIUS);
        assert_eq!(
            neighbors,
            vec![
                Coord::new(0, 1, 1),
                Coord::new(1, 0, 1),
                Coord::new(1, 1, 0),
                Coord::new(1, 1, 1),
                Coord::new(1, 1, 2),
                Coord::new(1, 2, 1),
                Coord::new(2, 1, 1),
            ]
        );

        let corner = neighbors_within(&som, Coord::new(0, 0, 0), RESOLUTION_RADIUS);
        assert_eq!(corner.len(), 4);
    }

    #[test]
    fn test_votes_last_writer_wins() {
        let som = ramp_som();
        let dataset = Dataset::new(vec![
            Sample::new(7, vec![4.0]),
            Sample::new(7, vec![4.0]),
            Sample::new(2, vec![4.0]),
        ]);
        let map = LabelMap::collect_votes(&som, &dataset).unwrap();
        let center = Coord::new(1, 1, 0);
        assert_eq!(map.votes(center), 3);
        // The majority is 7 but the last sample wrote 2.
        assert_eq!(map.label(center), Some(2));
    }

    #[test]
    fn test_isolated_neuron_keeps_own_label() {
        let som = ramp_som();
        let dataset = Dataset::new(vec![Sample::new(5, vec![0.0])]);
        let map = LabelMap::build(&som, &dataset).unwrap();

        assert_eq!(map.label(Coord::new(0, 0, 0)), Some(5));
        assert_eq!(map.labeled_count(), 1);
        // Never a BMU, so never relabeled even next to a labeled neuron.
        assert_eq!(map.label(Coord::new(0, 1, 0)), None);
        assert_eq!(map.label_or_sentinel(1), UNLABELED);
    }

    #[test]
    fn test_unanimous_neighbors_win() {
        let som = ramp_som();
        // Center (index 4) gets label 9; its four in-plane neighbors get 3.
        let mut samples: Vec<Sample> = [1, 3, 5, 7]
            .iter()
            .map(|&i| Sample::new(3, at(i).features))
            .collect();
        samples.push(Sample::new(9, at(4).features));
        let map = LabelMap::build(&som, &Dataset::new(samples)).unwrap();

        assert_eq!(map.label(Coord::new(1, 1, 0)), Some(3));
        assert_eq!(map.votes(Coord::new(1, 1, 0)), 1);
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        let som = ramp_som();
        // Index 1 -> (0,1,0) label 4, index 4 -> (1,1,0) label 8.
        let samples = vec![Sample::new(4, at(1).features), Sample::new(8, at(4).features)];
        let map = LabelMap::build(&som, &Dataset::new(samples)).unwrap();

        // Both see one 4 and one 8; (0,1,0) comes first in scan order.
        assert_eq!(map.label(Coord::new(1, 1, 0)), Some(4));
        assert_eq!(map.label(Coord::new(0, 1, 0)), Some(4));
    }

    #[test]
    fn test_diagonals_do_not_vote() {
        let som = ramp_som();
        // Corners of the center are diagonal (distance sqrt 2).
        let mut samples: Vec<Sample> = [0, 2, 6, 8]
            .iter()
            .map(|&i| Sample::new(1, at(i).features))
            .collect();
        samples.push(Sample::new(6, at(4).features));
        let map = LabelMap::build(&som, &Dataset::new(samples)).unwrap();

        assert_eq!(map.label(Coord::new(1, 1, 0)), Some(6));
    }

    #[test]
    fn test_resolution_reads_pass_one_labels() {
        let som = Som::from_weights((3, 1, 1), 1, vec![0.0, 1.0, 2.0]).unwrap();
        let samples = vec![
            Sample::new(1, vec![0.0]),
            Sample::new(2, vec![1.0]),
            Sample::new(2, vec![2.0]),
        ];
        let map = LabelMap::build(&som, &Dataset::new(samples)).unwrap();

        // (0,0,0) sees {1, 2}: tie, own label first.
        assert_eq!(map.label(Coord::new(0, 0, 0)), Some(1));
        // (1,0,0) sees {1, 2, 2} from pass 1.
        assert_eq!(map.label(Coord::new(1, 0, 0)), Some(2));
        assert_eq!(map.label(Coord::new(2, 0, 0)), Some(2));
    }
}
