//! Domain layer - pure business logic with no external dependencies.
//!
//! This layer contains the core concepts and invariants of click throttling:
//! - Actor identity, click kinds and permission sets
//! - Sliding click windows
//! - Threshold profiles and their resolution order
//! - Penalty kinds and expiring ledger entries
//!
//! All types in this layer are pure and easily testable.

pub mod actor;
pub mod penalty;
pub mod profile;
pub mod window;
