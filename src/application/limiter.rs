//! Rate limiter coordination logic.
//!
//! The rate limiter owns every per-actor structure (click windows, penalty
//! and cooldown ledgers, session gates) and answers the two gate questions:
//! may this secondary action happen, and may this primary effect be
//! confirmed. Raw click observations only feed the windows.
//!
//! All decisions for one actor run under that actor's session gate, so
//! teardown never interleaves with a decision. Notifications, ejections and
//! diagnostics are collected while the gate is held and delivered after it
//! is released.

use crate::application::catalog::SharedCatalog;
use crate::application::ledger::{CooldownLedger, ExpiryLedger, PenaltyLedger};
use crate::application::metrics::Metrics;
use crate::application::penalty::{self, Sanction};
use crate::application::ports::{
    ActorDirectory, Clock, DiagnosticSink, SessionGateway, StorageFamily,
};
use crate::application::registry::WindowRegistry;
use crate::application::sessions::SessionGates;
use crate::domain::actor::{ActorId, ClickKind, Permissions};
use crate::domain::penalty::{expiry_after, ActivePenalty, PenaltyKind};
use crate::domain::window::window_length;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, warn};

/// Default base window length.
pub const DEFAULT_BASE_WINDOW: Duration = Duration::from_secs(1);

/// Half round-trip time assumed when the directory has no estimate.
pub const DEFAULT_FALLBACK_HALF_RTT: Duration = Duration::from_millis(50);

/// Default lifetime of a Suppress or Attenuate penalty.
pub const DEFAULT_PENALTY_DURATION: Duration = Duration::from_secs(5);

/// Errors that can occur when configuring the rate limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The base window was zero, so no click could ever be counted
    ZeroBaseWindow,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroBaseWindow => write!(f, "base window must be greater than zero"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Engine-wide settings that do not vary per profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimiterConfig {
    base_window: Duration,
    fallback_half_rtt: Duration,
    penalty_duration: Duration,
    bypass_permission: Option<String>,
}

impl LimiterConfig {
    /// Create a config with the given base window and default everything else.
    ///
    /// # Errors
    /// Returns `ConfigError::ZeroBaseWindow` if `base_window` is zero.
    pub fn new(base_window: Duration) -> Result<Self, ConfigError> {
        if base_window.is_zero() {
            return Err(ConfigError::ZeroBaseWindow);
        }
        Ok(Self {
            base_window,
            ..Self::default()
        })
    }

    /// Latency substituted when an actor's estimate is unavailable.
    pub fn with_fallback_half_rtt(mut self, half_rtt: Duration) -> Self {
        self.fallback_half_rtt = half_rtt;
        self
    }

    /// How long Suppress and Attenuate penalties last.
    pub fn with_penalty_duration(mut self, duration: Duration) -> Self {
        self.penalty_duration = duration;
        self
    }

    /// Permission that exempts an actor from throttling entirely.
    ///
    /// An empty string disables the bypass.
    pub fn with_bypass_permission(mut self, permission: impl Into<String>) -> Self {
        let permission = permission.into();
        self.bypass_permission = (!permission.is_empty()).then_some(permission);
        self
    }

    pub fn base_window(&self) -> Duration {
        self.base_window
    }

    pub fn fallback_half_rtt(&self) -> Duration {
        self.fallback_half_rtt
    }

    pub fn penalty_duration(&self) -> Duration {
        self.penalty_duration
    }

    pub fn bypass_permission(&self) -> Option<&str> {
        self.bypass_permission.as_deref()
    }
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            base_window: DEFAULT_BASE_WINDOW,
            fallback_half_rtt: DEFAULT_FALLBACK_HALF_RTT,
            penalty_duration: DEFAULT_PENALTY_DURATION,
            bypass_permission: None,
        }
    }
}

/// Outcome of the secondary-action gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryDecision {
    /// Let the action happen; it has been recorded
    Allow,
    /// Block the action; it has not been recorded
    Deny,
}

impl SecondaryDecision {
    pub fn is_allow(&self) -> bool {
        matches!(self, SecondaryDecision::Allow)
    }
}

/// Outcome of the primary confirmation gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrimaryDecision {
    /// Apply the effect unmodified
    Allow,
    /// Cancel the effect
    Deny,
    /// Apply the effect scaled by this factor (0.0 to 1.0)
    Attenuate(f64),
}

impl PrimaryDecision {
    /// Apply the decision to an effect magnitude.
    ///
    /// Returns `None` when the effect is denied.
    ///
    /// ```
    /// use click_throttle::PrimaryDecision;
    ///
    /// assert_eq!(PrimaryDecision::Allow.apply(10.0), Some(10.0));
    /// assert_eq!(PrimaryDecision::Attenuate(0.5).apply(10.0), Some(5.0));
    /// assert_eq!(PrimaryDecision::Deny.apply(10.0), None);
    /// ```
    pub fn apply(&self, magnitude: f64) -> Option<f64> {
        match self {
            PrimaryDecision::Allow => Some(magnitude),
            PrimaryDecision::Attenuate(factor) => Some(magnitude * factor),
            PrimaryDecision::Deny => None,
        }
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, PrimaryDecision::Deny)
    }
}

/// The collaborators a rate limiter talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub clock: Arc<dyn Clock>,
    pub directory: Arc<dyn ActorDirectory>,
    pub gateway: Arc<dyn SessionGateway>,
    pub diagnostics: Arc<dyn DiagnosticSink>,
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

/// Side effects produced while a gate is held.
#[derive(Debug, Default)]
struct Outbox {
    diagnostics: Vec<String>,
    sanction: Option<Sanction>,
}

impl Outbox {
    fn diagnostic(&mut self, message: String) {
        self.diagnostics.push(message);
    }
}

/// Capability view of an actor backed by the directory.
struct DirectoryPermissions<'a> {
    directory: &'a dyn ActorDirectory,
    actor: ActorId,
}

impl Permissions for DirectoryPermissions<'_> {
    fn has_permission(&self, permission: &str) -> bool {
        self.directory.has_permission(self.actor, permission)
    }
}

/// Coordinates click throttling decisions.
pub struct RateLimiter<F: StorageFamily> {
    windows: WindowRegistry<F::Windows>,
    penalties: PenaltyLedger<F::Penalties>,
    cooldowns: CooldownLedger<F::Cooldowns>,
    gates: SessionGates<F::Gates>,
    catalog: SharedCatalog,
    config: LimiterConfig,
    collaborators: Collaborators,
    metrics: Metrics,
}

impl<F: StorageFamily> RateLimiter<F> {
    /// Create a rate limiter with empty state.
    ///
    /// # Arguments
    /// * `catalog` - Shared profile catalog, may be replaced later
    /// * `config` - Engine-wide settings
    /// * `collaborators` - Clock, directory, gateway and diagnostic sink
    /// * `metrics` - Metrics tracker
    pub fn new(
        catalog: SharedCatalog,
        config: LimiterConfig,
        collaborators: Collaborators,
        metrics: Metrics,
    ) -> Self {
        Self {
            windows: WindowRegistry::new(F::Windows::default()),
            penalties: ExpiryLedger::new(F::Penalties::default()),
            cooldowns: ExpiryLedger::new(F::Cooldowns::default()),
            gates: SessionGates::new(F::Gates::default()),
            catalog,
            config,
            collaborators,
            metrics,
        }
    }

    /// Record a raw click observation.
    ///
    /// Prunes the actor's window for `kind` and appends `at`. Makes no
    /// decision. A timestamp older than the newest recorded click is clamped
    /// forward and still counted. The clamped click then ages out later than
    /// its true timestamp would, so out-of-order bursts err toward denial.
    pub fn on_click(&self, actor: ActorId, kind: ClickKind, at: Instant) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.gates.enter(actor, || {
                if self.is_exempt(actor) {
                    return;
                }
                let window = self.window_for(actor);
                let recorded = self.windows.with_window(actor, kind, |w| {
                    w.prune_and_count(at, window);
                    w.record_monotonic(at)
                });
                if recorded != at {
                    warn!(
                        actor = %actor,
                        kind = ?kind,
                        behind_us = recorded.saturating_duration_since(at).as_micros() as u64,
                        "out-of-order click clamped to newest timestamp"
                    );
                }
                self.metrics.record_click();
            })
        }));

        if result.is_err() {
            self.metrics.record_fault();
            error!(actor = %actor, kind = ?kind, "click recording panicked; click dropped");
        }
    }

    /// Gate a secondary action at the moment it occurs.
    ///
    /// Denies when the actor already has `secondary_threshold` actions in
    /// the window. A denied action is not recorded and triggers the
    /// profile's penalty.
    pub fn check_secondary_action(&self, actor: ActorId) -> SecondaryDecision {
        self.decide(actor, SecondaryDecision::Deny, |outbox| {
            if self.is_exempt(actor) {
                self.metrics.record_allowed();
                return SecondaryDecision::Allow;
            }

            let now = self.collaborators.clock.now();
            let catalog = self.catalog.snapshot();
            let profile = catalog.resolve(&self.permissions(actor));
            let window = self.window_for(actor);
            let threshold = profile.secondary_threshold();

            let (count, allowed) =
                self.windows
                    .with_window(actor, ClickKind::Secondary, |w| {
                        let count = w.prune_and_count(now, window);
                        let allowed = count < threshold as usize;
                        if allowed {
                            w.record_monotonic(now);
                        }
                        (count, allowed)
                    });

            debug!(
                actor = %actor,
                profile = profile.name(),
                count,
                threshold,
                allowed,
                "secondary action checked"
            );

            if allowed {
                self.metrics.record_allowed();
                return SecondaryDecision::Allow;
            }

            self.metrics.record_denied();
            outbox.diagnostic(format!(
                "Secondary action penalty for {} (secondary={}/{})",
                actor, count, threshold
            ));
            outbox.sanction = Some(self.penalize(actor, profile.penalty(), now));
            SecondaryDecision::Deny
        })
    }

    /// Gate a primary effect at confirmation time.
    ///
    /// Checked in order: active Suppress penalty, active Attenuate penalty,
    /// active cooldown, then the primary window. Only the passive recorder
    /// writes the primary window; this gate reads it.
    pub fn check_primary_confirmation(&self, actor: ActorId) -> PrimaryDecision {
        self.decide(actor, PrimaryDecision::Deny, |outbox| {
            if self.is_exempt(actor) {
                self.metrics.record_allowed();
                return PrimaryDecision::Allow;
            }

            let now = self.collaborators.clock.now();

            match self.penalties.get_if_active(actor, now) {
                Some(ActivePenalty::Suppress) => {
                    debug!(actor = %actor, "primary effect suppressed by active penalty");
                    self.metrics.record_denied();
                    return PrimaryDecision::Deny;
                }
                Some(ActivePenalty::Attenuate(pct)) => {
                    debug!(actor = %actor, percentage = pct.value(), "primary effect attenuated");
                    self.metrics.record_attenuated();
                    return PrimaryDecision::Attenuate(pct.factor());
                }
                None => {}
            }

            if self.cooldowns.get_if_active(actor, now).is_some() {
                self.metrics.record_denied();
                outbox.diagnostic(format!("Hit by {} cancelled (in cooldown)", actor));
                return PrimaryDecision::Deny;
            }

            let catalog = self.catalog.snapshot();
            let profile = catalog.resolve(&self.permissions(actor));
            let window = self.window_for(actor);
            let threshold = profile.primary_threshold();
            let count = self
                .windows
                .prune_and_count(actor, ClickKind::Primary, now, window);

            debug!(
                actor = %actor,
                profile = profile.name(),
                count,
                threshold,
                "primary confirmation checked"
            );

            if count > threshold as usize {
                let cooldown = profile.cooldown();
                self.cooldowns.set(actor, (), expiry_after(now, cooldown));
                self.metrics.record_cooldown();
                self.metrics.record_denied();
                outbox.diagnostic(format!(
                    "Hit penalized for {} (primary={}/{}), cooldown={:.1}s",
                    actor,
                    count,
                    threshold,
                    cooldown.as_secs_f64()
                ));
                outbox.sanction = Some(self.penalize(actor, profile.penalty(), now));
                return PrimaryDecision::Deny;
            }

            self.metrics.record_allowed();
            outbox.diagnostic(format!(
                "Hit allowed for {} (primary={}/{})",
                actor, count, threshold
            ));
            PrimaryDecision::Allow
        })
    }

    /// Discard every window and ledger entry for `actor`.
    ///
    /// Waits for in-flight decisions for the actor to finish. Calling it for
    /// an actor with no state is a no-op.
    pub fn on_session_end(&self, actor: ActorId) {
        let torn_down = self.gates.end_session(actor, || {
            let windows = self.windows.discard_actor(actor);
            let penalty = self.penalties.clear(actor);
            let cooldown = self.cooldowns.clear(actor);
            (windows, penalty, cooldown)
        });

        match torn_down {
            Some((windows, penalty, cooldown)) => debug!(
                actor = %actor,
                windows,
                penalty,
                cooldown,
                "session state discarded"
            ),
            None => debug!(actor = %actor, "session end for actor with no state"),
        }
    }

    /// Clicks currently held in the actor's window, without pruning.
    pub fn window_len(&self, actor: ActorId, kind: ClickKind) -> usize {
        self.windows.window_len(actor, kind)
    }

    /// The actor's active penalty, if any.
    pub fn active_penalty(&self, actor: ActorId) -> Option<ActivePenalty> {
        self.penalties
            .get_if_active(actor, self.collaborators.clock.now())
    }

    /// Time left on the actor's cooldown, if any.
    pub fn cooldown_remaining(&self, actor: ActorId) -> Option<Duration> {
        self.cooldowns
            .remaining(actor, self.collaborators.clock.now())
    }

    /// Number of (actor, kind) windows currently tracked.
    pub fn tracked_windows(&self) -> usize {
        self.windows.len()
    }

    /// Number of actors with a live session gate.
    pub fn live_sessions(&self) -> usize {
        self.gates.len()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &LimiterConfig {
        &self.config
    }

    /// Run a decision under the actor's gate, failing closed on panic.
    fn decide<D, G>(&self, actor: ActorId, denied: D, gate: G) -> D
    where
        G: FnOnce(&mut Outbox) -> D,
    {
        let mut outbox = Outbox::default();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.gates.enter(actor, || gate(&mut outbox))
        }));

        let decision = match result {
            Ok(decision) => decision,
            Err(_) => {
                self.metrics.record_fault();
                self.metrics.record_denied();
                error!(actor = %actor, "decision panicked; failing closed");
                outbox = Outbox::default();
                outbox.diagnostic(format!("Decision for {} failed closed", actor));
                denied
            }
        };

        self.deliver(actor, outbox);
        decision
    }

    fn deliver(&self, actor: ActorId, outbox: Outbox) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            for message in &outbox.diagnostics {
                self.collaborators.diagnostics.diagnostic(message);
            }
            if let Some(sanction) = &outbox.sanction {
                sanction.deliver(actor, self.collaborators.gateway.as_ref());
            }
        }));

        if result.is_err() {
            self.metrics.record_fault();
            error!(actor = %actor, "delivering throttle side effects panicked");
        }
    }

    fn penalize(&self, actor: ActorId, kind: PenaltyKind, now: Instant) -> Sanction {
        let sanction = penalty::enforce(
            &self.penalties,
            actor,
            kind,
            self.config.penalty_duration,
            now,
        );
        if sanction.is_eject() {
            self.metrics.record_ejection();
        } else {
            self.metrics.record_penalty();
        }
        sanction
    }

    fn is_exempt(&self, actor: ActorId) -> bool {
        self.config
            .bypass_permission
            .as_deref()
            .is_some_and(|permission| self.collaborators.directory.has_permission(actor, permission))
    }

    fn window_for(&self, actor: ActorId) -> Duration {
        let half_rtt = self
            .collaborators
            .directory
            .half_rtt(actor)
            .unwrap_or_else(|| {
                debug!(actor = %actor, "latency estimate unavailable, using fallback");
                self.config.fallback_half_rtt
            });
        window_length(self.config.base_window, half_rtt)
    }

    fn permissions(&self, actor: ActorId) -> DirectoryPermissions<'_> {
        DirectoryPermissions {
            directory: self.collaborators.directory.as_ref(),
            actor,
        }
    }
}

impl<F: StorageFamily> fmt::Debug for RateLimiter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .field("tracked_windows", &self.windows.len())
            .field("live_sessions", &self.gates.len())
            .finish_non_exhaustive()
    }
}
