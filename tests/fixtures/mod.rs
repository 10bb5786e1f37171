//! Shared test fixtures.
//!
//! Provides real-world addresses and a geocoder stub backed by them.

#![allow(dead_code)]

pub mod las_vegas_locations;

use std::collections::HashMap;
use std::sync::Mutex;

use bus_planner::error::{AdvisorError, OracleError};
use bus_planner::model::{FleetEntry, Item, Job};
use bus_planner::traits::{Coordinate, DistanceOracle, PlanAdvisor};

/// Geocoder answering from a fixed table and recording every lookup.
pub struct FixtureOracle {
    table: HashMap<String, Coordinate>,
    lookups: Mutex<Vec<String>>,
}

impl FixtureOracle {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn las_vegas() -> Self {
        las_vegas_locations::all()
            .into_iter()
            .fold(Self::new(), |oracle, loc| oracle.with(loc.address, loc.lat, loc.lon))
    }

    pub fn with(mut self, address: &str, lat: f64, lon: f64) -> Self {
        self.table.insert(address.to_string(), Coordinate::new(lat, lon));
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    pub fn lookup_count(&self, address: &str) -> usize {
        self.lookups.lock().unwrap().iter().filter(|a| *a == address).count()
    }
}

impl DistanceOracle for FixtureOracle {
    fn geocode(&self, address: &str) -> Result<Coordinate, OracleError> {
        self.lookups.lock().unwrap().push(address.to_string());
        self.table
            .get(address)
            .copied()
            .ok_or_else(|| OracleError::NotFound {
                address: address.to_string(),
            })
    }
}

/// Oracle on a flat line: latitude is the position, distance is the gap.
///
/// Makes expected costs easy to compute by hand.
pub struct LineOracle {
    inner: FixtureOracle,
}

impl LineOracle {
    pub fn new(points: &[(&str, f64)]) -> Self {
        let inner = points
            .iter()
            .fold(FixtureOracle::new(), |oracle, (address, x)| oracle.with(address, *x, 0.0));
        Self { inner }
    }

    pub fn lookups(&self) -> Vec<String> {
        self.inner.lookups()
    }
}

impl DistanceOracle for LineOracle {
    fn geocode(&self, address: &str) -> Result<Coordinate, OracleError> {
        self.inner.geocode(address)
    }

    fn distance(&self, from: Coordinate, to: Coordinate) -> f64 {
        (from.lat - to.lat).abs()
    }
}

/// Advisor returning a canned reply and remembering what it was shown.
pub struct RecordingAdvisor {
    reply: Option<String>,
    seen: Mutex<Vec<(String, String, String)>>,
}

impl RecordingAdvisor {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Advisor that always fails.
    pub fn failing() -> Self {
        Self {
            reply: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.seen.lock().unwrap().clone()
    }
}

impl PlanAdvisor for RecordingAdvisor {
    fn advise(
        &self,
        destination: &str,
        intent: &str,
        candidates: &str,
    ) -> Result<String, AdvisorError> {
        self.seen.lock().unwrap().push((
            destination.to_string(),
            intent.to_string(),
            candidates.to_string(),
        ));
        self.reply.clone().ok_or(AdvisorError::Empty)
    }
}

pub fn bus(id: &str, capacity: u32) -> FleetEntry {
    FleetEntry {
        id: id.to_string(),
        capacity,
        count: None,
    }
}

pub fn student(id: i64, address: &str) -> Item {
    Item::new(id, format!("Student {id}"), address)
}

pub fn job(carriers: Vec<FleetEntry>, items: Vec<Item>, destination: &str) -> Job {
    Job {
        carriers,
        items,
        destination: destination.to_string(),
        intent: String::new(),
    }
}
