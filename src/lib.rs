//! # click-throttle
//!
//! Latency-compensated click-rate limiting with escalating penalties for
//! tick-driven interactive sessions.
//!
//! The crate sits between a raw input source and the effect of an action.
//! Raw clicks feed per-(actor, kind) sliding windows; game logic then asks
//! one of two gates whether an action may happen:
//!
//! - **Secondary gate**: checked when a low-stakes action occurs. Allowed
//!   actions are recorded; the action that would exceed the profile's
//!   secondary threshold is denied, not recorded, and penalized.
//! - **Primary confirmation gate**: checked when a high-stakes effect is
//!   confirmed. An active Suppress penalty denies, an active Attenuate
//!   penalty scales the effect, an active cooldown denies, and only then is
//!   the primary window consulted. A violation starts a cooldown and
//!   penalizes the actor.
//!
//! ## Quick Start
//!
//! ```rust
//! use click_throttle::infrastructure::mocks::{MockDirectory, RecordingGateway};
//! use click_throttle::{ActorId, ClickKind, ClickThrottle, PrimaryDecision, ThrottleSettings};
//! use std::sync::Arc;
//! use std::time::Instant;
//!
//! let settings = ThrottleSettings {
//!     primary_threshold: 3,
//!     ..ThrottleSettings::default()
//! };
//!
//! let throttle = ClickThrottle::builder()
//!     .with_settings(settings)
//!     .with_directory(Arc::new(MockDirectory::new()))
//!     .with_gateway(Arc::new(RecordingGateway::new()))
//!     .build()
//!     .unwrap();
//!
//! let actor = ActorId::new(42);
//! let now = Instant::now();
//! for _ in 0..4 {
//!     throttle.on_click(actor, ClickKind::Primary, now);
//! }
//!
//! // Four clicks in the window against a threshold of three
//! assert_eq!(throttle.check_primary_confirmation(actor), PrimaryDecision::Deny);
//!
//! throttle.on_session_end(actor);
//! ```
//!
//! In a real host the directory answers permission and latency queries from
//! the session manager, and the gateway delivers messages and ejections.
//!
//! ## Windows and latency
//!
//! Each window is `base_window + half_rtt` long, where `half_rtt` is the
//! actor's current latency estimate from the `ActorDirectory`. When no
//! estimate exists a fallback (50 ms by default) is used. The length is
//! recomputed at every prune, so a latency change takes effect immediately.
//!
//! ## Profiles
//!
//! A `ProfileCatalog` holds named profiles in priority order plus a default.
//! An actor gets the first profile whose permission it holds. The catalog
//! can be replaced at runtime with `ClickThrottle::reload_catalog`; the swap
//! is atomic.
//!
//! ## Penalties
//!
//! - **Eject**: the actor's session is terminated through the gateway.
//!   Nothing is recorded.
//! - **Suppress**: primary effects are denied until the penalty expires.
//! - **Attenuate(pct)**: primary effects are scaled to `pct` percent until
//!   the penalty expires.
//!
//! A new penalty replaces the previous one. Penalties and cooldowns expire
//! lazily, on the first read after their deadline.
//!
//! ## Concurrency
//!
//! All per-actor state lives in sharded maps. Every access to one window or
//! ledger entry is exclusive, and different actors never contend on the
//! same lock unless they hash to the same shard. `on_session_end` waits for
//! in-flight decisions for that actor, then discards all of its state.
//!
//! Notifications, ejections and diagnostics are delivered after the actor's
//! locks are released, so a gateway may call back into the throttle.
//!
//! ## Failure behavior
//!
//! Decision calls never return errors. If a collaborator panics during a
//! decision, the decision fails closed (`Deny`), the fault is counted in
//! `Metrics::faults`, and a diagnostic is emitted.
//!
//! ## Features
//!
//! - `serde`: derive `Deserialize` for `ThrottleSettings`
//! - `async`: `ClickPump`, a tokio task that drains a click channel
//! - `test-helpers`: mocks for every port plus a log-capturing layer

// Domain layer - pure business logic
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    actor::{ActorId, Capabilities, ClickEvent, ClickKind, Permissions},
    penalty::{ActivePenalty, PenaltyKind, Percentage},
    profile::{Profile, ProfileCatalog, ProfileError},
    window::{window_length, RateWindow, WindowError},
};

pub use application::{
    catalog::SharedCatalog,
    limiter::{
        Collaborators, ConfigError, LimiterConfig, PrimaryDecision, RateLimiter,
        SecondaryDecision,
    },
    metrics::{Metrics, MetricsSnapshot},
    ports::{ActorDirectory, Clock, DiagnosticSink, SessionGateway, Storage, StorageFamily},
};

pub use infrastructure::{
    clock::SystemClock,
    diagnostics::TracingDiagnostics,
    settings::{ProfileSettings, SettingsError, ThrottleSettings},
    storage::{Sharded, ShardedStorage},
    throttle::{BuildError, ClickThrottle, ClickThrottleBuilder},
};

#[cfg(feature = "async")]
pub use infrastructure::pump::{ClickPump, PumpHandle, ShutdownError};
