//! Extraction passes over audit issue bodies.
//!
//! Each pass is an independent pattern match over the raw markdown, so a
//! malformed section only costs the fields that section carries.

pub mod breakdown;
pub mod metadata;
pub mod table;
pub mod trials;

pub use breakdown::{derive_breakdown, parse_breakdown};
pub use metadata::{extract_declared_violations, extract_environment, extract_violation_types};
pub use table::{extract_tables, Table};
pub use trials::parse_trials;
