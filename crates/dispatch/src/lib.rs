//! Deterministic auto-assignment core for site visits.
//!
//! Pure selection logic only: callers fetch the candidate pool, precompute
//! workload counts, and persist/notify after a decision is returned.

pub mod geo;
pub mod resolver;

pub use geo::{Coordinates, EARTH_RADIUS_KM, UNKNOWN_DISTANCE_KM, distance_km};
pub use resolver::{AssignmentDecision, Candidate, MatchTier, VisitTarget, resolve_assignment};
