//! Infrastructure layer - external adapters and integrations.
//!
//! This layer provides adapters for:
//! - Clock abstraction (system time vs mock)
//! - Storage implementations (sharded maps)
//! - Diagnostics forwarded to `tracing`
//! - Declarative settings and the `ClickThrottle` facade
//! - Async click ingestion (`async` feature)

pub mod clock;
pub mod diagnostics;
pub mod settings;
pub mod storage;
pub mod throttle;

#[cfg(feature = "async")]
pub mod pump;

/// Mock implementations for testing.
///
/// This module is only available when the `test-helpers` feature is enabled,
/// or during test builds.
///
/// To use these mocks in integration tests, add to your `Cargo.toml`:
/// ```toml
/// [dev-dependencies]
/// click-throttle = { version = "*", features = ["test-helpers"] }
/// ```
#[cfg(any(test, feature = "test-helpers"))]
pub mod mocks;
