//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic and owns all per-actor state:
//! - Window registry (click history per actor and kind)
//! - Expiry ledgers (penalties and cooldowns)
//! - Session gates (teardown exclusion)
//! - Rate limiter (decision making and penalty protocol)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod catalog;
pub mod ledger;
pub mod limiter;
pub mod metrics;
pub mod penalty;
pub mod ports;
pub mod registry;
pub mod sessions;
