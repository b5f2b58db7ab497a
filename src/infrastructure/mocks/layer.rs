//! Mock tracing layer for testing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::field::{Field, Visit};
use tracing::Level;
use tracing_subscriber::Layer;

/// Layer that captures events so tests can assert on log output.
#[derive(Debug, Clone, Default)]
pub struct MockCaptureLayer {
    captured: Arc<Mutex<Vec<CapturedEvent>>>,
}

/// Captured event information.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
    /// Non-message fields as `(name, debug-formatted value)`.
    pub fields: Vec<(String, String)>,
}

impl CapturedEvent {
    /// Value of a field by name, debug-formatted.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

impl MockCaptureLayer {
    /// Create a new mock capture layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all captured events.
    pub fn get_captured(&self) -> Vec<CapturedEvent> {
        self.lock().clone()
    }

    /// Captured events at exactly `level`.
    pub fn at_level(&self, level: Level) -> Vec<CapturedEvent> {
        self.lock()
            .iter()
            .filter(|event| event.level == level)
            .cloned()
            .collect()
    }

    /// Whether any event at `level` has a message containing `needle`.
    ///
    /// # Examples
    ///
    /// ```
    /// use click_throttle::infrastructure::mocks::MockCaptureLayer;
    /// use tracing::{warn, Level};
    /// use tracing_subscriber::layer::SubscriberExt;
    ///
    /// let capture = MockCaptureLayer::new();
    /// let subscriber = tracing_subscriber::registry().with(capture.clone());
    ///
    /// tracing::subscriber::with_default(subscriber, || {
    ///     warn!(percentage = 140, "attenuation percentage clamped");
    /// });
    ///
    /// assert!(capture.contains(Level::WARN, "clamped"));
    /// assert!(!capture.contains(Level::INFO, "clamped"));
    /// ```
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.lock()
            .iter()
            .any(|event| event.level == level && event.message.contains(needle))
    }

    /// Get the count of captured events.
    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Clear all captured events.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<CapturedEvent>> {
        self.captured.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S> Layer<S> for MockCaptureLayer
where
    S: tracing::Subscriber,
{
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        self.lock().push(CapturedEvent {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.message,
            fields: visitor.fields,
        });
    }
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields
                .push((field.name().to_string(), format!("{:?}", value)));
        }
    }
}
