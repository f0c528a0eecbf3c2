//! Distance/time matrices
//!
//! Solvers only ever see the [`Matrix`] trait. [`ProblemMatrix`] is the
//! precomputed source stored alongside a problem; [`CachedMatrix`] memoizes
//! lookups against any other matrix.

mod cached;
mod problem;

pub use cached::CachedMatrix;
pub use problem::ProblemMatrix;

use serde::{Deserialize, Serialize};

use crate::domain::{LatLng, Location};
use crate::error::Result;

/// Pairwise distance/time lookup between location ids
///
/// Both lookups are pure: the same pair always yields the same value.
/// An id the matrix does not know yields [`crate::Error::NotFound`].
pub trait Matrix: Send + Sync {
    /// Distance from `origin_id` to `target_id`, in meters
    fn distance(&self, origin_id: i64, target_id: i64) -> Result<f64>;

    /// Travel time from `origin_id` to `target_id`, in milliseconds
    fn time(&self, origin_id: i64, target_id: i64) -> Result<i64>;
}

/// A routed path between two locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    /// Meters
    pub distance: f64,
    /// Milliseconds
    pub time: i64,
    pub coordinates: Vec<LatLng>,
}

/// Geo source able to route between two locations
pub trait GeoPort: Send + Sync {
    fn simple_path(&self, from: &Location, to: &Location) -> Result<Path>;
}
