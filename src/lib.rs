//! bus-planner core
//!
//! Assigns students to capacity-bounded buses, orders each bus's pickups to
//! minimise distance to a shared destination, and selects the plan with the
//! lowest average distance per student.

pub mod traits;
pub mod error;
pub mod model;
pub mod haversine;
pub mod cache;
pub mod cancel;
pub mod partition;
pub mod route;
pub mod solver;
pub mod arcgis;
pub mod advisor;
