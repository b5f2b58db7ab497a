//! The click throttle facade.
//!
//! `ClickThrottle` is what the host wires into its event source and game
//! logic. It owns a `RateLimiter` over sharded storage and exposes the four
//! inbound operations plus catalog reload and introspection.

use crate::application::catalog::SharedCatalog;
use crate::application::limiter::{
    Collaborators, ConfigError, LimiterConfig, PrimaryDecision, RateLimiter, SecondaryDecision,
};
use crate::application::metrics::Metrics;
use crate::application::ports::{ActorDirectory, Clock, DiagnosticSink, SessionGateway};
use crate::domain::actor::{ActorId, ClickEvent, ClickKind};
use crate::domain::penalty::ActivePenalty;
use crate::domain::profile::{ProfileCatalog, ProfileError};
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::diagnostics::TracingDiagnostics;
use crate::infrastructure::settings::{SettingsError, ThrottleSettings};
use crate::infrastructure::storage::Sharded;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Errors that can occur when building a `ClickThrottle`.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    /// No actor directory was supplied
    MissingDirectory,
    /// No session gateway was supplied
    MissingGateway,
    /// Settings validation failed
    Settings(SettingsError),
    /// Engine configuration was rejected
    Config(ConfigError),
    /// A profile definition was rejected
    Profile(ProfileError),
}

impl std::fmt::Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::MissingDirectory => write!(f, "an actor directory is required"),
            BuildError::MissingGateway => write!(f, "a session gateway is required"),
            BuildError::Settings(e) => write!(f, "settings error: {}", e),
            BuildError::Config(e) => write!(f, "configuration error: {}", e),
            BuildError::Profile(e) => write!(f, "profile error: {}", e),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Settings(e) => Some(e),
            BuildError::Config(e) => Some(e),
            BuildError::Profile(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SettingsError> for BuildError {
    fn from(e: SettingsError) -> Self {
        BuildError::Settings(e)
    }
}

impl From<ConfigError> for BuildError {
    fn from(e: ConfigError) -> Self {
        BuildError::Config(e)
    }
}

impl From<ProfileError> for BuildError {
    fn from(e: ProfileError) -> Self {
        BuildError::Profile(e)
    }
}

/// Builder for constructing a `ClickThrottle`.
///
/// The directory and gateway are required. Everything else has a default:
/// system clock, `LimiterConfig::default()`, the default catalog, and
/// diagnostics forwarded to `tracing`.
#[derive(Default)]
pub struct ClickThrottleBuilder {
    clock: Option<Arc<dyn Clock>>,
    config: Option<LimiterConfig>,
    catalog: Option<ProfileCatalog>,
    settings: Option<ThrottleSettings>,
    strict: bool,
    directory: Option<Arc<dyn ActorDirectory>>,
    gateway: Option<Arc<dyn SessionGateway>>,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
}

impl ClickThrottleBuilder {
    /// Set a custom clock (mainly for tests).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the engine config. Takes precedence over settings.
    pub fn with_config(mut self, config: LimiterConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the profile catalog. Takes precedence over settings.
    pub fn with_catalog(mut self, catalog: ProfileCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Derive config and catalog from declarative settings, correcting
    /// bad values with a warning.
    pub fn with_settings(mut self, settings: ThrottleSettings) -> Self {
        self.settings = Some(settings);
        self.strict = false;
        self
    }

    /// Like `with_settings`, but bad values fail the build.
    pub fn with_strict_settings(mut self, settings: ThrottleSettings) -> Self {
        self.settings = Some(settings);
        self.strict = true;
        self
    }

    /// Source of permissions and latency estimates.
    pub fn with_directory(mut self, directory: Arc<dyn ActorDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Receiver of notifications and ejections.
    pub fn with_gateway(mut self, gateway: Arc<dyn SessionGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Receiver of diagnostic text. Defaults to `TracingDiagnostics`.
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Build the throttle.
    ///
    /// # Errors
    /// Returns `BuildError` if the directory or gateway is missing, or if
    /// settings fail validation.
    pub fn build(self) -> Result<ClickThrottle, BuildError> {
        let directory = self.directory.ok_or(BuildError::MissingDirectory)?;
        let gateway = self.gateway.ok_or(BuildError::MissingGateway)?;

        let (settings_config, settings_catalog) = match self.settings {
            Some(settings) => {
                let (config, catalog) = settings.into_parts(self.strict)?;
                (Some(config), Some(catalog))
            }
            None => (None, None),
        };
        let config = self.config.or(settings_config).unwrap_or_default();
        let catalog = self.catalog.or(settings_catalog).unwrap_or_default();

        let collaborators = Collaborators {
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock::new())),
            directory,
            gateway,
            diagnostics: self
                .diagnostics
                .unwrap_or_else(|| Arc::new(TracingDiagnostics)),
        };

        info!(
            base_window_ms = config.base_window().as_millis() as u64,
            profiles = catalog.len(),
            strict = self.strict,
            "click throttle configured"
        );

        let limiter = RateLimiter::new(
            SharedCatalog::new(catalog),
            config,
            collaborators,
            Metrics::new(),
        );

        Ok(ClickThrottle {
            limiter: Arc::new(limiter),
            strict: self.strict,
        })
    }
}

/// Click-rate throttle shared between the event source and game logic.
///
/// Cheap to clone; clones share all state.
///
/// # Examples
///
/// ```
/// use click_throttle::infrastructure::mocks::{MockDirectory, RecordingGateway};
/// use click_throttle::{ActorId, BuildError, ClickKind, ClickThrottle, LimiterConfig};
/// use std::sync::Arc;
/// use std::time::{Duration, Instant};
///
/// fn main() -> Result<(), BuildError> {
///     let throttle = ClickThrottle::builder()
///         .with_config(LimiterConfig::new(Duration::from_millis(800))?)
///         .with_directory(Arc::new(MockDirectory::new()))
///         .with_gateway(Arc::new(RecordingGateway::new()))
///         .build()?;
///
///     let actor = ActorId::new(7);
///     throttle.on_click(actor, ClickKind::Primary, Instant::now());
///     assert_eq!(throttle.check_primary_confirmation(actor).apply(6.0), Some(6.0));
///     throttle.on_session_end(actor);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ClickThrottle {
    limiter: Arc<RateLimiter<Sharded>>,
    strict: bool,
}

impl ClickThrottle {
    pub fn builder() -> ClickThrottleBuilder {
        ClickThrottleBuilder::default()
    }

    /// Record a raw click notification.
    pub fn on_click(&self, actor: ActorId, kind: ClickKind, at: Instant) {
        self.limiter.on_click(actor, kind, at);
    }

    /// Record a raw click notification from an event.
    pub fn record(&self, event: ClickEvent) {
        self.limiter.on_click(event.actor, event.kind, event.at);
    }

    /// Gate a secondary action before its effect.
    pub fn check_secondary_action(&self, actor: ActorId) -> SecondaryDecision {
        self.limiter.check_secondary_action(actor)
    }

    /// Gate a primary effect at confirmation time.
    pub fn check_primary_confirmation(&self, actor: ActorId) -> PrimaryDecision {
        self.limiter.check_primary_confirmation(actor)
    }

    /// Discard all state for an actor. Idempotent.
    pub fn on_session_end(&self, actor: ActorId) {
        self.limiter.on_session_end(actor);
    }

    /// Atomically replace the profile catalog.
    pub fn reload_catalog(&self, catalog: ProfileCatalog) {
        let previous = self.limiter.catalog().replace(catalog);
        info!(
            previous_profiles = previous.len(),
            profiles = self.limiter.catalog().snapshot().len(),
            "profile catalog reloaded"
        );
    }

    /// Rebuild the profile catalog from settings and swap it in.
    ///
    /// Uses the same strictness the throttle was built with. Engine-wide
    /// values (window, fallback latency, penalty duration, bypass) are fixed
    /// at build time; a change to them is logged and ignored.
    ///
    /// # Errors
    /// Returns `SettingsError` if validation fails; the current catalog is
    /// kept.
    pub fn reload_settings(&self, settings: ThrottleSettings) -> Result<(), SettingsError> {
        let (config, catalog) = settings.into_parts(self.strict)?;
        if &config != self.limiter.config() {
            warn!("engine-wide settings changed; they take effect only on rebuild");
        }
        self.reload_catalog(catalog);
        Ok(())
    }

    /// Clicks currently held in the actor's window, without pruning.
    pub fn window_len(&self, actor: ActorId, kind: ClickKind) -> usize {
        self.limiter.window_len(actor, kind)
    }

    /// The actor's active penalty, if any.
    pub fn active_penalty(&self, actor: ActorId) -> Option<ActivePenalty> {
        self.limiter.active_penalty(actor)
    }

    /// Time left on the actor's primary cooldown, if any.
    pub fn cooldown_remaining(&self, actor: ActorId) -> Option<Duration> {
        self.limiter.cooldown_remaining(actor)
    }

    /// Number of (actor, kind) windows currently tracked.
    pub fn tracked_windows(&self) -> usize {
        self.limiter.tracked_windows()
    }

    pub fn metrics(&self) -> &Metrics {
        self.limiter.metrics()
    }

    pub fn catalog(&self) -> Arc<ProfileCatalog> {
        self.limiter.catalog().snapshot()
    }

    pub fn config(&self) -> &LimiterConfig {
        self.limiter.config()
    }
}
