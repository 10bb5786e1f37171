//! Job, plan and response types.
//!
//! Items and carriers come in with the job and stay read-only for the whole
//! evaluation. Partitions and plans are built during the search and only the
//! winner survives, converted into a [`PlanResponse`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::PlanError;

/// Someone to be picked up (a student).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub address: String,
}

impl Item {
    pub fn new(id: i64, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            address: address.into(),
        }
    }
}

/// A capacity-bounded vehicle (a bus).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carrier {
    pub id: String,
    pub capacity: u32,
}

impl Carrier {
    pub fn new(id: impl Into<String>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            capacity,
        }
    }
}

/// One line of the submitted fleet.
///
/// Without a `count` the entry is a single carrier that keeps its id. With a
/// count it stands for that many identical carriers named `"<id>-1"`,
/// `"<id>-2"`, and so on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetEntry {
    pub id: String,
    pub capacity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

/// Expand fleet entries into individual carriers, preserving order.
pub fn expand_fleet(entries: &[FleetEntry]) -> Vec<Carrier> {
    let mut carriers = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry.count {
            None => carriers.push(Carrier::new(entry.id.clone(), entry.capacity)),
            Some(count) => carriers.extend(
                (1..=count).map(|n| Carrier::new(format!("{}-{}", entry.id, n), entry.capacity)),
            ),
        }
    }
    carriers
}

/// A routing job as submitted by a client.
///
/// Accepts both the lowercase field names and the capitalised names used by
/// the web form (`Buses`, `Locations`, `Destination`, `Request`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(alias = "Buses")]
    pub carriers: Vec<FleetEntry>,
    #[serde(alias = "Locations")]
    pub items: Vec<Item>,
    #[serde(alias = "Destination")]
    pub destination: String,
    /// Soft preference text. Only the advisor reads it.
    #[serde(alias = "Request", default)]
    pub intent: String,
}

impl Job {
    /// Parse and validate a job document.
    pub fn from_json(raw: &str) -> Result<Self, PlanError> {
        let job: Job = serde_json::from_str(raw)?;
        job.validate()?;
        Ok(job)
    }

    pub fn fleet(&self) -> Vec<Carrier> {
        expand_fleet(&self.carriers)
    }

    pub fn validate(&self) -> Result<(), PlanError> {
        if let Some(position) = self.carriers.iter().position(|c| c.id.trim().is_empty()) {
            return Err(PlanError::EmptyCarrierId(position));
        }
        let mut seen = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if !seen.insert(item.id) {
                return Err(PlanError::DuplicateItem(item.id));
            }
        }
        Ok(())
    }
}

/// Items assigned to one carrier slot.
///
/// `carrier` indexes the fleet, `members` index the job's items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub carrier: usize,
    pub members: Vec<usize>,
}

/// A full assignment of every item, one group per chosen carrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub groups: Vec<Group>,
}

impl Partition {
    pub fn item_count(&self) -> usize {
        self.groups.iter().map(|group| group.members.len()).sum()
    }
}

/// One group of a plan after its visiting order has been optimised.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRoute {
    pub carrier: usize,
    /// Item indices in visiting order.
    pub stops: Vec<usize>,
    /// Kilometres from the first stop to the destination.
    pub distance: f64,
}

/// An evaluated partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub label: String,
    pub partition: Partition,
    pub routes: Vec<PlannedRoute>,
    pub total_distance: f64,
    pub item_count: usize,
    /// `total_distance / item_count`, infinite when there are no items.
    pub average_distance: f64,
}

impl Plan {
    pub fn new(label: String, partition: Partition, routes: Vec<PlannedRoute>) -> Self {
        let total_distance: f64 = routes.iter().map(|route| route.distance).sum();
        let item_count = partition.item_count();
        let average_distance = if item_count == 0 {
            f64::INFINITY
        } else {
            total_distance / item_count as f64
        };
        Self {
            label,
            partition,
            routes,
            total_distance,
            item_count,
            average_distance,
        }
    }
}

/// A stop of the selected plan with its resolved position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStop {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lon: f64,
}

/// Which carrier drives a route of the selected plan, and how far.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub carrier_id: String,
    pub distance_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DestinationPoint {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// The selected plan as returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanResponse {
    pub routes: Vec<Vec<RouteStop>>,
    /// Parallel to `routes`.
    pub route_summaries: Vec<RouteSummary>,
    pub destination: DestinationPoint,
    pub selected_plan: String,
    pub average_distance: f64,
    pub advisory_text: Option<String>,
    pub partition_cap: usize,
    pub plans_evaluated: usize,
    /// More partitions existed than `partition_cap` allowed.
    pub truncated: bool,
}

/// Result of evaluating a job.
///
/// Every way of not producing a plan is its own variant, so a caller can
/// never confuse "nothing feasible" with "nothing to do".
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlanOutcome {
    Selected(PlanResponse),
    CapacityShortfall { capacity: u64, items: usize },
    NoPartitionFound { partitions_considered: usize },
    DestinationUnresolved { address: String },
    Cancelled,
}

impl PlanOutcome {
    pub fn selected(&self) -> Option<&PlanResponse> {
        match self {
            Self::Selected(response) => Some(response),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_from_json_rejects_bad_documents() {
        let err = Job::from_json(r#"{"carriers": [], "items": 3}"#).unwrap_err();
        assert!(matches!(err, PlanError::InvalidJob(_)), "got {:?}", err);

        let duplicate = r#"{
            "carriers": [{"id": "1", "capacity": 2}],
            "items": [
                {"id": 7, "name": "Ana", "address": "1 Oak St"},
                {"id": 7, "name": "Ben", "address": "2 Elm St"}
            ],
            "destination": "High School"
        }"#;
        assert!(matches!(Job::from_json(duplicate), Err(PlanError::DuplicateItem(7))));
    }

    #[test]
    fn test_expand_fleet_counts() {
        let entries = vec![
            FleetEntry { id: "1".into(), capacity: 3, count: Some(2) },
            FleetEntry { id: "van".into(), capacity: 1, count: None },
            FleetEntry { id: "2".into(), capacity: 5, count: Some(0) },
        ];
        let carriers = expand_fleet(&entries);
        assert_eq!(
            carriers,
            vec![
                Carrier::new("1-1", 3),
                Carrier::new("1-2", 3),
                Carrier::new("van", 1),
            ]
        );
    }

    #[test]
    fn test_job_accepts_form_field_names() {
        let json = r#"{
            "Buses": [{"id": "1-1", "capacity": 2}],
            "Locations": [{"id": 1, "name": "Ana", "address": "1 Main St"}],
            "Destination": "High School",
            "Request": "keep siblings together"
        }"#;
        let job: Job = serde_json::from_str(json).unwrap();
        assert_eq!(job.carriers[0].id, "1-1");
        assert_eq!(job.items[0].name, "Ana");
        assert_eq!(job.destination, "High School");
        assert_eq!(job.intent, "keep siblings together");
    }

    #[test]
    fn test_job_intent_defaults_to_empty() {
        let json = r#"{"carriers": [], "items": [], "destination": "X"}"#;
        let job: Job = serde_json::from_str(json).unwrap();
        assert!(job.intent.is_empty());
    }

    #[test]
    fn test_validate_rejects_duplicate_items() {
        let job = Job {
            carriers: vec![FleetEntry { id: "a".into(), capacity: 2, count: None }],
            items: vec![Item::new(7, "A", "x"), Item::new(7, "B", "y")],
            destination: "d".into(),
            intent: String::new(),
        };
        assert!(matches!(job.validate(), Err(PlanError::DuplicateItem(7))));
    }

    #[test]
    fn test_validate_rejects_blank_carrier_id() {
        let job = Job {
            carriers: vec![
                FleetEntry { id: "a".into(), capacity: 2, count: None },
                FleetEntry { id: " ".into(), capacity: 2, count: None },
            ],
            items: Vec::new(),
            destination: "d".into(),
            intent: String::new(),
        };
        assert!(matches!(job.validate(), Err(PlanError::EmptyCarrierId(1))));
    }

    #[test]
    fn test_plan_average_is_infinite_without_items() {
        let partition = Partition {
            groups: vec![Group { carrier: 0, members: Vec::new() }],
        };
        let routes = vec![PlannedRoute { carrier: 0, stops: Vec::new(), distance: 0.0 }];
        let plan = Plan::new("A".into(), partition, routes);
        assert_eq!(plan.item_count, 0);
        assert!(plan.average_distance.is_infinite());
    }

    #[test]
    fn test_plan_average() {
        let partition = Partition {
            groups: vec![
                Group { carrier: 0, members: vec![0, 1] },
                Group { carrier: 1, members: vec![2] },
            ],
        };
        let routes = vec![
            PlannedRoute { carrier: 0, stops: vec![1, 0], distance: 4.0 },
            PlannedRoute { carrier: 1, stops: vec![2], distance: 2.0 },
        ];
        let plan = Plan::new("A".into(), partition, routes);
        assert_eq!(plan.total_distance, 6.0);
        assert_eq!(plan.average_distance, 2.0);
    }

    #[test]
    fn test_outcome_is_tagged() {
        let outcome = PlanOutcome::CapacityShortfall { capacity: 2, items: 3 };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "capacity_shortfall");
        assert_eq!(value["capacity"], 2);
        assert_eq!(value["items"], 3);
    }
}
