//! Error types.
//!
//! Planning outcomes such as a capacity shortfall are not errors; they are
//! variants of [`crate::model::PlanOutcome`]. The types here cover genuine
//! faults and the per-call failures of the external collaborators.

use thiserror::Error;

/// Faults that stop a job from being evaluated at all.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Two items share the same id.
    #[error("duplicate item id {0}")]
    DuplicateItem(i64),
    /// The job document is not valid JSON or has the wrong shape.
    #[error("invalid job document: {0}")]
    InvalidJob(#[from] serde_json::Error),
    /// A carrier was submitted without an id.
    #[error("carrier at position {0} has an empty id")]
    EmptyCarrierId(usize),
    /// An HTTP client for one of the collaborators could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Failure to resolve a single address.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The geocoder answered but had no candidate for the address.
    #[error("no geocoding candidate for {address:?}")]
    NotFound { address: String },
    /// The request itself failed (connection, timeout, non-2xx status).
    #[error("geocoding request for {address:?} failed: {source}")]
    Http {
        address: String,
        #[source]
        source: reqwest::Error,
    },
    /// The geocoder answered with something that is not a usable location.
    #[error("malformed geocoder response for {address:?}: {reason}")]
    Malformed { address: String, reason: String },
}

/// Failure of the advisory side step.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("advisor request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("advisor reply is not a chat completion: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("advisor returned no text")]
    Empty,
}

/// Failure while ordering one group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Exhaustive search over this many stops is refused.
    #[error("group of {size} stops exceeds the exhaustive search limit of {limit}")]
    GroupTooLarge { size: usize, limit: usize },
    /// The evaluation was cancelled or ran past its deadline.
    #[error("route search cancelled")]
    Cancelled,
}
