//! Plan search and selection.
//!
//! The evaluator enumerates partitions, orders every group, scores each plan
//! by average distance per item and returns the cheapest. The advisory call,
//! when enabled, runs only after the winner is fixed.

use std::time::Duration;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::advisor::render_candidates;
use crate::cache::DistanceCache;
use crate::cancel::CancelToken;
use crate::error::{PlanError, RouteError};
use crate::model::{
    Carrier, DestinationPoint, Item, Job, Partition, Plan, PlanOutcome, PlanResponse,
    PlannedRoute, RouteStop, RouteSummary,
};
use crate::partition::PartitionEnumerator;
use crate::route::{DEFAULT_MAX_GROUP_SIZE, RouteOptimizer};
use crate::traits::{DistanceOracle, PlanAdvisor};

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Partitions evaluated per job, taken in generation order.
    pub max_partitions: usize,
    /// Largest group the exhaustive route search accepts.
    pub max_group_size: usize,
    /// Abort the search after this long.
    pub timeout: Option<Duration>,
    /// Do not call the advisor even when one is configured.
    pub skip_advisor: bool,
    /// Resolve addresses and score partitions on the rayon pool.
    pub parallel: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_partitions: 25,
            max_group_size: DEFAULT_MAX_GROUP_SIZE,
            timeout: None,
            skip_advisor: false,
            parallel: true,
        }
    }
}

/// Label for the plan at `index`: `A`..`Z`, then `AA`, `AB`, ...
pub fn plan_label(index: usize) -> String {
    let mut label = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        label.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    label.reverse();
    String::from_utf8_lossy(&label).into_owned()
}

/// Drives the search for one job at a time.
///
/// The oracle and advisor are borrowed; the caller builds them once and
/// reuses them across jobs. Nothing else outlives a call to [`evaluate`].
///
/// [`evaluate`]: PlanEvaluator::evaluate
pub struct PlanEvaluator<'a, O: DistanceOracle + ?Sized> {
    oracle: &'a O,
    advisor: Option<&'a dyn PlanAdvisor>,
    options: SolveOptions,
}

impl<'a, O: DistanceOracle + ?Sized> PlanEvaluator<'a, O> {
    pub fn new(oracle: &'a O, options: SolveOptions) -> Self {
        Self {
            oracle,
            advisor: None,
            options,
        }
    }

    pub fn with_advisor(mut self, advisor: &'a dyn PlanAdvisor) -> Self {
        self.advisor = Some(advisor);
        self
    }

    /// Evaluate `job`, honouring the configured timeout.
    pub fn evaluate(&self, job: &Job) -> Result<PlanOutcome, PlanError> {
        let token = match self.options.timeout {
            Some(timeout) => CancelToken::with_timeout(timeout),
            None => CancelToken::new(),
        };
        self.evaluate_with_cancel(job, &token)
    }

    /// Evaluate `job`, stopping early with [`PlanOutcome::Cancelled`] once
    /// `token` trips.
    pub fn evaluate_with_cancel(
        &self,
        job: &Job,
        token: &CancelToken,
    ) -> Result<PlanOutcome, PlanError> {
        job.validate()?;
        let carriers = job.fleet();
        let items = &job.items;

        let capacity: u64 = carriers.iter().map(|c| u64::from(c.capacity)).sum();
        if capacity < items.len() as u64 {
            info!(capacity, items = items.len(), "not enough carrier capacity");
            return Ok(PlanOutcome::CapacityShortfall {
                capacity,
                items: items.len(),
            });
        }

        let capacities: Vec<u32> = carriers.iter().map(|c| c.capacity).collect();
        let mut enumerator =
            PartitionEnumerator::new(items.len(), &capacities).with_cancel(token.clone());
        let partitions: Vec<Partition> = enumerator.by_ref().take(self.options.max_partitions).collect();
        let truncated =
            partitions.len() == self.options.max_partitions && enumerator.next().is_some();
        if enumerator.was_cancelled() {
            info!("search cancelled during enumeration");
            return Ok(PlanOutcome::Cancelled);
        }
        if truncated {
            warn!(cap = self.options.max_partitions, "partition search truncated");
        }
        debug!(partitions = partitions.len(), "partitions enumerated");
        let considered = partitions.len();

        let limit = self.options.max_group_size;
        let partitions: Vec<(usize, Partition)> = partitions
            .into_iter()
            .enumerate()
            .filter(|(index, partition)| match oversize_group(partition, limit) {
                Some(size) => {
                    let err = RouteError::GroupTooLarge { size, limit };
                    warn!(label = %plan_label(*index), error = %err, "partition skipped");
                    false
                }
                None => true,
            })
            .collect();
        if partitions.is_empty() {
            info!(considered, "no feasible partition");
            return Ok(PlanOutcome::NoPartitionFound {
                partitions_considered: considered,
            });
        }

        let cache = DistanceCache::new(self.oracle);
        cache.prefetch(
            items
                .iter()
                .map(|item| item.address.as_str())
                .chain(std::iter::once(job.destination.as_str())),
            self.options.parallel,
            token,
        );
        if token.is_cancelled() {
            info!("search cancelled while resolving addresses");
            return Ok(PlanOutcome::Cancelled);
        }
        let unresolved = cache.unresolved();
        if !unresolved.is_empty() {
            warn!(count = unresolved.len(), addresses = ?unresolved, "some addresses did not resolve");
        }
        let Some(destination) = cache.coordinate(&job.destination) else {
            warn!(address = %job.destination, "destination unresolved");
            return Ok(PlanOutcome::DestinationUnresolved {
                address: job.destination.clone(),
            });
        };

        let optimizer =
            RouteOptimizer::new(self.options.max_group_size).with_cancel(token.clone());
        let scored: Vec<Result<Plan, RouteError>> = if self.options.parallel {
            partitions
                .into_par_iter()
                .map(|(index, partition)| {
                    score_partition(index, partition, items, &job.destination, &cache, &optimizer)
                })
                .collect()
        } else {
            partitions
                .into_iter()
                .map(|(index, partition)| {
                    score_partition(index, partition, items, &job.destination, &cache, &optimizer)
                })
                .collect()
        };

        let mut plans = Vec::with_capacity(scored.len());
        for result in scored {
            match result {
                Ok(plan) => plans.push(plan),
                Err(RouteError::Cancelled) => {
                    info!("search cancelled during route optimisation");
                    return Ok(PlanOutcome::Cancelled);
                }
                Err(err @ RouteError::GroupTooLarge { .. }) => {
                    warn!(error = %err, "partition skipped");
                }
            }
        }

        let Some(best) = select_best(&plans) else {
            info!(considered, "no feasible plan");
            return Ok(PlanOutcome::NoPartitionFound {
                partitions_considered: considered,
            });
        };
        info!(
            label = %best.label,
            average_km = best.average_distance,
            plans = plans.len(),
            "plan selected"
        );

        let advisory_text = self.advise(job, &plans);

        let (routes, route_summaries) = describe_routes(best, items, &carriers, &cache);
        Ok(PlanOutcome::Selected(PlanResponse {
            routes,
            route_summaries,
            destination: DestinationPoint {
                name: job.destination.clone(),
                lat: destination.lat,
                lon: destination.lon,
            },
            selected_plan: best.label.clone(),
            average_distance: best.average_distance,
            advisory_text,
            partition_cap: self.options.max_partitions,
            plans_evaluated: plans.len(),
            truncated,
        }))
    }

    fn advise(&self, job: &Job, plans: &[Plan]) -> Option<String> {
        if self.options.skip_advisor {
            return None;
        }
        let advisor = self.advisor?;
        let candidates = render_candidates(plans, &job.items, &job.destination);
        match advisor.advise(&job.destination, &job.intent, &candidates) {
            Ok(text) => Some(text),
            Err(err) => {
                warn!(error = %err, "advisor unavailable");
                None
            }
        }
    }
}

/// Evaluate `job` with a one-off evaluator.
pub fn solve<O: DistanceOracle + ?Sized>(
    job: &Job,
    oracle: &O,
    advisor: Option<&dyn PlanAdvisor>,
    options: SolveOptions,
) -> Result<PlanOutcome, PlanError> {
    let mut evaluator = PlanEvaluator::new(oracle, options);
    if let Some(advisor) = advisor {
        evaluator = evaluator.with_advisor(advisor);
    }
    evaluator.evaluate(job)
}

fn score_partition<O: DistanceOracle + ?Sized>(
    index: usize,
    partition: Partition,
    items: &[Item],
    destination: &str,
    cache: &DistanceCache<'_, O>,
    optimizer: &RouteOptimizer,
) -> Result<Plan, RouteError> {
    let mut routes = Vec::with_capacity(partition.groups.len());
    for group in &partition.groups {
        let stops: Vec<&str> = group
            .members
            .iter()
            .map(|&member| items[member].address.as_str())
            .collect();
        let best = optimizer.optimize(&stops, destination, |a, b| cache.distance(a, b))?;
        routes.push(PlannedRoute {
            carrier: group.carrier,
            stops: best.order.iter().map(|&pos| group.members[pos]).collect(),
            distance: best.cost,
        });
    }
    let plan = Plan::new(plan_label(index), partition, routes);
    debug!(label = %plan.label, average_km = plan.average_distance, "plan scored");
    Ok(plan)
}

/// Size of the first group the route search would refuse, if any.
fn oversize_group(partition: &Partition, limit: usize) -> Option<usize> {
    partition
        .groups
        .iter()
        .map(|group| group.members.len())
        .find(|&size| size > limit)
}

/// Lowest average distance; the earliest plan wins ties.
pub fn select_best(plans: &[Plan]) -> Option<&Plan> {
    let mut best: Option<&Plan> = None;
    for plan in plans {
        if best.is_none_or(|b| plan.average_distance < b.average_distance) {
            best = Some(plan);
        }
    }
    best
}

fn describe_routes<O: DistanceOracle + ?Sized>(
    plan: &Plan,
    items: &[Item],
    carriers: &[Carrier],
    cache: &DistanceCache<'_, O>,
) -> (Vec<Vec<RouteStop>>, Vec<RouteSummary>) {
    let mut routes = Vec::with_capacity(plan.routes.len());
    let mut summaries = Vec::with_capacity(plan.routes.len());
    for route in &plan.routes {
        let mut stops = Vec::with_capacity(route.stops.len());
        for &stop in &route.stops {
            let item = &items[stop];
            let Some(position) = cache.coordinate(&item.address) else {
                warn!(id = item.id, address = %item.address, "stop omitted, address unresolved");
                continue;
            };
            stops.push(RouteStop {
                id: item.id,
                name: item.name.clone(),
                address: item.address.clone(),
                lat: position.lat,
                lon: position.lon,
            });
        }
        routes.push(stops);
        summaries.push(RouteSummary {
            carrier_id: carriers[route.carrier].id.clone(),
            distance_km: route.distance,
        });
    }
    (routes, summaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_with_average(label: &str, average: f64) -> Plan {
        Plan {
            label: label.to_string(),
            partition: Partition { groups: Vec::new() },
            routes: Vec::new(),
            total_distance: average,
            item_count: 1,
            average_distance: average,
        }
    }

    #[test]
    fn test_plan_labels() {
        assert_eq!(plan_label(0), "A");
        assert_eq!(plan_label(25), "Z");
        assert_eq!(plan_label(26), "AA");
        assert_eq!(plan_label(27), "AB");
        assert_eq!(plan_label(51), "AZ");
        assert_eq!(plan_label(52), "BA");
    }

    #[test]
    fn test_select_best_prefers_lowest_average() {
        let plans = vec![
            plan_with_average("A", 5.0),
            plan_with_average("B", 2.0),
            plan_with_average("C", 3.0),
        ];
        assert_eq!(select_best(&plans).map(|p| p.label.as_str()), Some("B"));
    }

    #[test]
    fn test_select_best_ties_go_to_first() {
        let plans = vec![
            plan_with_average("A", 4.0),
            plan_with_average("B", 2.0),
            plan_with_average("C", 2.0),
        ];
        assert_eq!(select_best(&plans).map(|p| p.label.as_str()), Some("B"));
    }

    #[test]
    fn test_select_best_all_infinite_takes_first() {
        let plans = vec![
            plan_with_average("A", f64::INFINITY),
            plan_with_average("B", f64::INFINITY),
        ];
        assert_eq!(select_best(&plans).map(|p| p.label.as_str()), Some("A"));
    }

    #[test]
    fn test_select_best_empty() {
        assert!(select_best(&[]).is_none());
    }

    #[test]
    fn test_finite_beats_infinite() {
        let plans = vec![
            plan_with_average("A", f64::INFINITY),
            plan_with_average("B", 900.0),
        ];
        assert_eq!(select_best(&plans).map(|p| p.label.as_str()), Some("B"));
    }
}
