//! Migration emission planning.
//!
//! This module provides:
//! - A timestamp allocator producing sortable, collision-free identifiers
//! - An ordering engine sequencing schema objects by dependency

pub mod allocator;
pub mod ordering;

pub use allocator::{TimestampAllocator, QUANTUM_SECONDS, TIMESTAMP_FORMAT};
pub use ordering::{
    EmissionPlan, EmissionUnit, MigrationCategory, MigrationOrderingEngine, UnitPayload,
};
