//! Mock implementations for testing.
//!
//! Test doubles for every port the rate limiter talks to, plus a tracing
//! layer that captures log output.

pub mod clock;
pub mod directory;
pub mod gateway;
pub mod layer;

pub use clock::MockClock;
pub use directory::MockDirectory;
pub use gateway::{RecordingDiagnostics, RecordingGateway};
pub use layer::{CapturedEvent, MockCaptureLayer};
