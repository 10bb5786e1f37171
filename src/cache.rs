//! Per-evaluation memoisation of geocodes and distances.
//!
//! Both maps are append-only: once an address or a pair has an answer (or a
//! recorded failure) it keeps that answer until the cache is dropped, so a
//! pair always costs the same within one evaluation.

use std::collections::HashMap;

use parking_lot::RwLock;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::traits::{Coordinate, DistanceOracle};

/// Unordered address pair, stored smaller first.
type PairKey = (String, String);

fn pair_key(a: &str, b: &str) -> PairKey {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Geocode and distance memo shared by every route search of one evaluation.
pub struct DistanceCache<'o, O: DistanceOracle + ?Sized> {
    oracle: &'o O,
    coordinates: RwLock<HashMap<String, Option<Coordinate>>>,
    /// `None` when either end of the pair could not be resolved.
    distances: RwLock<HashMap<PairKey, Option<f64>>>,
}

impl<'o, O: DistanceOracle + ?Sized> DistanceCache<'o, O> {
    pub fn new(oracle: &'o O) -> Self {
        Self {
            oracle,
            coordinates: RwLock::new(HashMap::new()),
            distances: RwLock::new(HashMap::new()),
        }
    }

    /// Geocode every distinct unseen address up front.
    ///
    /// With `parallel` the lookups fan out over the rayon pool, which bounds
    /// how many run at once. Once `cancel` trips the remaining addresses are
    /// left unresolved and unrecorded.
    pub fn prefetch<'a, I>(&self, addresses: I, parallel: bool, cancel: &CancelToken)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut pending: Vec<&str> = {
            let known = self.coordinates.read();
            addresses
                .into_iter()
                .filter(|address| !known.contains_key(*address))
                .collect()
        };
        pending.sort_unstable();
        pending.dedup();
        if pending.is_empty() {
            return;
        }

        debug!(count = pending.len(), parallel, "resolving addresses");
        let resolve = |address: &&'a str| {
            if cancel.is_cancelled() {
                return None;
            }
            Some((*address, self.lookup(address)))
        };
        let resolved: Vec<(&str, Option<Coordinate>)> = if parallel {
            pending.par_iter().filter_map(resolve).collect()
        } else {
            pending.iter().filter_map(resolve).collect()
        };
        if resolved.len() < pending.len() {
            debug!(skipped = pending.len() - resolved.len(), "prefetch cancelled");
        }

        let mut coordinates = self.coordinates.write();
        for (address, coordinate) in resolved {
            coordinates.entry(address.to_string()).or_insert(coordinate);
        }
    }

    /// Resolved position of `address`, geocoding it on first use.
    pub fn coordinate(&self, address: &str) -> Option<Coordinate> {
        if let Some(known) = self.coordinates.read().get(address) {
            return *known;
        }
        let looked_up = self.lookup(address);
        *self
            .coordinates
            .write()
            .entry(address.to_string())
            .or_insert(looked_up)
    }

    /// Kilometres between two addresses, `f64::INFINITY` if either is
    /// unresolved.
    pub fn distance(&self, a: &str, b: &str) -> f64 {
        let key = pair_key(a, b);
        if let Some(known) = self.distances.read().get(&key) {
            return known.unwrap_or(f64::INFINITY);
        }
        let measured = match (self.coordinate(a), self.coordinate(b)) {
            (Some(from), Some(to)) => Some(self.oracle.distance(from, to)),
            _ => None,
        };
        self.distances
            .write()
            .entry(key)
            .or_insert(measured)
            .unwrap_or(f64::INFINITY)
    }

    /// Addresses that failed to resolve, sorted.
    pub fn unresolved(&self) -> Vec<String> {
        let mut failed: Vec<String> = self
            .coordinates
            .read()
            .iter()
            .filter(|(_, coordinate)| coordinate.is_none())
            .map(|(address, _)| address.clone())
            .collect();
        failed.sort();
        failed
    }

    pub fn cached_pairs(&self) -> usize {
        self.distances.read().len()
    }

    fn lookup(&self, address: &str) -> Option<Coordinate> {
        match self.oracle.geocode(address) {
            Ok(coordinate) => Some(coordinate),
            Err(err) => {
                warn!(%address, error = %err, "address unresolved");
                None
            }
        }
    }
}
