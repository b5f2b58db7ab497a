//! Recording session gateway and diagnostic sink for testing.

use crate::application::ports::{DiagnosticSink, SessionGateway};
use crate::domain::actor::ActorId;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type EjectHook = Arc<dyn Fn(ActorId) + Send + Sync>;

#[derive(Default)]
struct GatewayLog {
    notifications: Vec<(ActorId, String)>,
    ejections: Vec<(ActorId, String)>,
    on_eject: Option<EjectHook>,
}

/// Gateway that records every notification and ejection.
///
/// Clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingGateway {
    log: Arc<Mutex<GatewayLog>>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent with `notify`, in order.
    pub fn notifications(&self) -> Vec<(ActorId, String)> {
        self.lock().notifications.clone()
    }

    /// Reasons given to `eject`, in order.
    pub fn ejections(&self) -> Vec<(ActorId, String)> {
        self.lock().ejections.clone()
    }

    /// Run `hook` after each recorded ejection, outside the log lock.
    ///
    /// Lets a test play the host's session manager, which typically ends
    /// the session in response.
    pub fn on_eject(&self, hook: impl Fn(ActorId) + Send + Sync + 'static) {
        self.lock().on_eject = Some(Arc::new(hook));
    }

    pub fn clear(&self) {
        let mut log = self.lock();
        log.notifications.clear();
        log.ejections.clear();
    }

    fn lock(&self) -> MutexGuard<'_, GatewayLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionGateway for RecordingGateway {
    fn notify(&self, actor: ActorId, message: &str) {
        self.lock().notifications.push((actor, message.to_string()));
    }

    fn eject(&self, actor: ActorId, reason: &str) {
        let hook = {
            let mut log = self.lock();
            log.ejections.push((actor, reason.to_string()));
            log.on_eject.clone()
        };
        if let Some(hook) = hook {
            hook(actor);
        }
    }
}

impl fmt::Debug for RecordingGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let log = self.lock();
        f.debug_struct("RecordingGateway")
            .field("notifications", &log.notifications)
            .field("ejections", &log.ejections)
            .finish()
    }
}

/// Diagnostic sink that keeps every message.
#[derive(Debug, Clone, Default)]
pub struct RecordingDiagnostics {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages received, in order.
    pub fn messages(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DiagnosticSink for RecordingDiagnostics {
    fn diagnostic(&self, message: &str) {
        self.lock().push(message.to_string());
    }
}
