//! Penalty protocol.
//!
//! Turns a profile's penalty kind into ledger state plus the actor-facing
//! side effect. The side effect is returned rather than performed so the
//! caller can deliver it after releasing the actor's locks.

use crate::application::ledger::PenaltyLedger;
use crate::application::ports::{SessionGateway, Storage};
use crate::domain::actor::ActorId;
use crate::domain::penalty::{expiry_after, ActivePenalty, Expiring, PenaltyKind};
use std::time::{Duration, Instant};
use tracing::info;

/// Reason given to an ejected actor.
pub const EJECT_REASON: &str = "You have been ejected for exceeding click-rate limits.";

/// Actor-facing outcome of a penalty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sanction {
    /// Terminate the actor's session.
    Eject { reason: String },
    /// Tell the actor about a penalty recorded in the ledger.
    Notify { message: String },
}

impl Sanction {
    /// Deliver through the gateway.
    pub fn deliver(&self, actor: ActorId, gateway: &dyn SessionGateway) {
        match self {
            Sanction::Eject { reason } => gateway.eject(actor, reason),
            Sanction::Notify { message } => gateway.notify(actor, message),
        }
    }

    pub fn is_eject(&self) -> bool {
        matches!(self, Sanction::Eject { .. })
    }
}

/// Apply `kind` to `actor` at `now` for `duration`.
///
/// `Eject` leaves no ledger state. `Suppress` and `Attenuate` overwrite any
/// existing penalty for the actor.
pub fn enforce<S>(
    ledger: &PenaltyLedger<S>,
    actor: ActorId,
    kind: PenaltyKind,
    duration: Duration,
    now: Instant,
) -> Sanction
where
    S: Storage<ActorId, Expiring<ActivePenalty>> + Clone,
{
    let Some(penalty) = kind.persisted() else {
        info!(actor = %actor, "ejecting actor for exceeding click-rate limits");
        return Sanction::Eject {
            reason: EJECT_REASON.to_string(),
        };
    };

    ledger.set(actor, penalty, expiry_after(now, duration));
    info!(
        actor = %actor,
        penalty = kind.name(),
        duration_ms = duration.as_millis() as u64,
        "click-rate penalty applied"
    );

    let message = match penalty {
        ActivePenalty::Suppress => format!(
            "You have exceeded the click-rate limit. You cannot deal damage for {:.1} seconds.",
            duration.as_secs_f64()
        ),
        ActivePenalty::Attenuate(pct) => format!(
            "Your click rate was too high. Until the penalty expires, your damage is scaled to {}.",
            pct
        ),
    };
    Sanction::Notify { message }
}
