//! Structural development of a plant: primordia and node appearance on the
//! main stem, branch (tiller) initiation and mortality, and plant height.
//!
//! Main components:
//! - [`state`] — cumulative counters and derived outputs for one plant.
//! - [`phases`] — the two ordered daily growth phases.
//! - [`lifecycle`] — commencing, sowing, ending and thinning transitions.
//! - [`structure`] — per-plant facade wiring state, providers and lifecycle.
//! - [`functions`] — scalar rate/function providers.
//! - [`host`] — traits for the host-owned collaborators.
//! - [`config`] — serde-friendly parameter structs.
//! - [`error`] — error type returned by validated operations.
//! - [`types`] — shared type aliases and IDs.

pub mod config;
pub mod error;
pub mod functions;
pub mod host;
pub mod lifecycle;
pub mod phases;
pub mod state;
pub mod structure;
pub mod types;

pub use error::{Result, StructureError};
pub use structure::Structure;
