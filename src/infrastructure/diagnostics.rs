//! Default diagnostic sink.

use crate::application::ports::DiagnosticSink;
use tracing::debug;

/// Forwards diagnostics to `tracing` at `DEBUG`.
///
/// Events use the target `click_throttle::diagnostics`, so they can be
/// routed or filtered separately from the crate's other logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn diagnostic(&self, message: &str) {
        debug!(target: "click_throttle::diagnostics", "{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mocks::MockCaptureLayer;
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_diagnostics_go_to_tracing() {
        let capture = MockCaptureLayer::new();
        let subscriber = tracing_subscriber::registry().with(capture.clone());

        tracing::subscriber::with_default(subscriber, || {
            TracingDiagnostics.diagnostic("Hit allowed for 01 (primary=1/18)");
        });

        let events = capture.at_level(Level::DEBUG);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].target, "click_throttle::diagnostics");
        assert_eq!(events[0].message, "Hit allowed for 01 (primary=1/18)");
    }
}
