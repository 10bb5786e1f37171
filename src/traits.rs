//! Core seams for the planner.
//!
//! The planner never talks to a geocoder or a language model directly. It
//! consumes these traits, and concrete clients live in their own modules
//! (`arcgis`, `advisor`) so callers can swap them out or stub them in tests.

use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, OracleError};
use crate::haversine;

/// A resolved point on the globe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Resolves addresses and measures the distance between them.
///
/// A failed lookup is an ordinary outcome: the planner turns it into an
/// infinite edge cost for the routes that touch the address.
pub trait DistanceOracle: Send + Sync {
    /// Resolve a free-form address to a coordinate.
    fn geocode(&self, address: &str) -> Result<Coordinate, OracleError>;

    /// Distance in kilometres between two resolved points.
    ///
    /// Defaults to the great-circle distance.
    fn distance(&self, from: Coordinate, to: Coordinate) -> f64 {
        haversine::haversine_km(from, to)
    }
}

impl<T: DistanceOracle + ?Sized> DistanceOracle for &T {
    fn geocode(&self, address: &str) -> Result<Coordinate, OracleError> {
        (**self).geocode(address)
    }

    fn distance(&self, from: Coordinate, to: Coordinate) -> f64 {
        (**self).distance(from, to)
    }
}

/// Produces free-text commentary over a set of candidate plans.
///
/// Advisory only. Its output is attached to the response after selection
/// and never feeds back into it.
pub trait PlanAdvisor: Send + Sync {
    fn advise(
        &self,
        destination: &str,
        intent: &str,
        candidates: &str,
    ) -> Result<String, AdvisorError>;
}
