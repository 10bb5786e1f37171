//! Exhaustive visiting-order search for a single group.
//!
//! Cost of an order is the sum of the legs between consecutive stops plus the
//! leg from the last stop to the destination. Every permutation is scored, so
//! the group size is capped.

use crate::cancel::CancelToken;
use crate::error::RouteError;

/// Largest group searched by default (8! = 40320 orders).
pub const DEFAULT_MAX_GROUP_SIZE: usize = 8;

/// Permutations scored between cancellation checks.
const CANCEL_CHECK_INTERVAL: usize = 4096;

/// Best order found for a group.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteOrder {
    /// Positions into the stops slice, in visiting order.
    pub order: Vec<usize>,
    pub cost: f64,
}

/// Advance `perm` to its lexicographic successor. False at the last one.
fn next_permutation(perm: &mut [usize]) -> bool {
    let Some(pivot) = perm.windows(2).rposition(|w| w[0] < w[1]) else {
        return false;
    };
    let Some(swap) = perm.iter().rposition(|&v| v > perm[pivot]) else {
        return false;
    };
    perm.swap(pivot, swap);
    perm[pivot + 1..].reverse();
    true
}

#[derive(Debug, Clone)]
pub struct RouteOptimizer {
    max_group_size: usize,
    cancel: Option<CancelToken>,
}

impl Default for RouteOptimizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_GROUP_SIZE)
    }
}

impl RouteOptimizer {
    pub fn new(max_group_size: usize) -> Self {
        Self {
            max_group_size,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Find the cheapest order to visit `stops` before reaching `destination`.
    ///
    /// `distance` returns `f64::INFINITY` for legs it cannot measure; such
    /// orders stay in the race with infinite cost. Ties go to the first order
    /// in lexicographic permutation order of `stops`. An empty group costs
    /// nothing and never calls `distance`.
    pub fn optimize<F>(
        &self,
        stops: &[&str],
        destination: &str,
        distance: F,
    ) -> Result<RouteOrder, RouteError>
    where
        F: Fn(&str, &str) -> f64,
    {
        let size = stops.len();
        if size == 0 {
            return Ok(RouteOrder {
                order: Vec::new(),
                cost: 0.0,
            });
        }
        if size > self.max_group_size {
            return Err(RouteError::GroupTooLarge {
                size,
                limit: self.max_group_size,
            });
        }

        // Leg costs for this group, fetched once per pair of positions.
        let mut legs = vec![vec![0.0; size]; size];
        for (i, from) in stops.iter().enumerate() {
            for (j, to) in stops.iter().enumerate() {
                if i != j {
                    legs[i][j] = distance(*from, *to);
                }
            }
        }
        let to_destination: Vec<f64> = stops.iter().map(|stop| distance(*stop, destination)).collect();

        let cost_of = |perm: &[usize]| -> f64 {
            let travel: f64 = perm.windows(2).map(|w| legs[w[0]][w[1]]).sum();
            travel + perm.last().map_or(0.0, |&last| to_destination[last])
        };

        let mut perm: Vec<usize> = (0..size).collect();
        let mut best = RouteOrder {
            cost: cost_of(&perm),
            order: perm.clone(),
        };
        let mut scored = 1usize;

        while next_permutation(&mut perm) {
            if scored % CANCEL_CHECK_INTERVAL == 0 && self.is_cancelled() {
                return Err(RouteError::Cancelled);
            }
            scored += 1;
            let cost = cost_of(&perm);
            if cost < best.cost {
                best.cost = cost;
                best.order.clone_from(&perm);
            }
        }

        Ok(best)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}
