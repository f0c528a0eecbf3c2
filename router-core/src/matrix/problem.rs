//! Precomputed problem matrix

use std::collections::HashMap;

use super::{GeoPort, Matrix};
use crate::domain::Location;
use crate::error::{Error, Result};

/// Square distance/time matrix stored as flattened row-major arrays
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemMatrix {
    location_ids: Vec<i64>,
    index: HashMap<i64, usize>,
    travel_distances: Vec<f64>,
    travel_times: Vec<i64>,
}

impl ProblemMatrix {
    /// Builds a matrix over `location_ids`
    ///
    /// Both arrays must hold exactly `n * n` entries, row `i` holding the
    /// values from `location_ids[i]`.
    pub fn new(
        location_ids: Vec<i64>,
        travel_distances: Vec<f64>,
        travel_times: Vec<i64>,
    ) -> Result<Self> {
        let n = location_ids.len();
        if travel_distances.len() != n * n || travel_times.len() != n * n {
            return Err(Error::InvalidMatrix(format!(
                "expected {} entries for {} locations, got {} distances and {} times",
                n * n,
                n,
                travel_distances.len(),
                travel_times.len()
            )));
        }

        let index: HashMap<i64, usize> = location_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (*id, idx))
            .collect();
        if index.len() != n {
            return Err(Error::InvalidMatrix("duplicate location ids".to_string()));
        }

        Ok(Self {
            location_ids,
            index,
            travel_distances,
            travel_times,
        })
    }

    /// Routes every ordered pair of distinct locations through `geo`
    ///
    /// The diagonal is zero.
    pub fn from_geo(locations: &[Location], geo: &dyn GeoPort) -> Result<Self> {
        let n = locations.len();
        let mut distances = vec![0.0; n * n];
        let mut times = vec![0; n * n];

        for (i, a) in locations.iter().enumerate() {
            for (j, b) in locations.iter().enumerate() {
                if i != j {
                    let path = geo.simple_path(a, b)?;
                    distances[i * n + j] = path.distance;
                    times[i * n + j] = path.time;
                }
            }
        }

        Self::new(locations.iter().map(|l| l.id).collect(), distances, times)
    }

    pub fn location_ids(&self) -> &[i64] {
        &self.location_ids
    }

    pub fn travel_distances(&self) -> &[f64] {
        &self.travel_distances
    }

    pub fn travel_times(&self) -> &[i64] {
        &self.travel_times
    }

    fn position(&self, origin_id: i64, target_id: i64) -> Result<usize> {
        let i = self
            .index
            .get(&origin_id)
            .ok_or_else(|| Error::unknown_location(origin_id))?;
        let j = self
            .index
            .get(&target_id)
            .ok_or_else(|| Error::unknown_location(target_id))?;
        Ok(i * self.location_ids.len() + j)
    }
}

impl Matrix for ProblemMatrix {
    fn distance(&self, origin_id: i64, target_id: i64) -> Result<f64> {
        Ok(self.travel_distances[self.position(origin_id, target_id)?])
    }

    fn time(&self, origin_id: i64, target_id: i64) -> Result<i64> {
        Ok(self.travel_times[self.position(origin_id, target_id)?])
    }
}
