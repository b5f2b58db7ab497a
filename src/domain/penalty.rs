//! Penalty kinds and expiring ledger entries.

use std::fmt;
use std::time::{Duration, Instant};

/// An attenuation percentage, always within `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Percentage(u8);

impl Percentage {
    pub const ZERO: Percentage = Percentage(0);
    pub const FULL: Percentage = Percentage(100);

    /// Create a percentage, returning `None` when out of range.
    pub fn new(value: i64) -> Option<Self> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .map(Percentage)
    }

    /// Create a percentage, clamping into `[0, 100]`.
    pub fn clamped(value: i64) -> Self {
        Percentage(value.clamp(0, 100) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    /// Multiplier applied to an effect magnitude.
    pub fn factor(&self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// What happens to an actor that exceeds a threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PenaltyKind {
    /// Terminate the session immediately. Never persisted.
    Eject,
    /// Block the primary effect entirely while active.
    #[default]
    Suppress,
    /// Scale the primary effect by the percentage while active.
    Attenuate(Percentage),
}

impl PenaltyKind {
    /// Parse a penalty kind name.
    ///
    /// Accepts `eject`/`kick`, `suppress`/`no_damage` and
    /// `attenuate`/`mitigate`, case-insensitively. Attenuation uses the
    /// supplied percentage.
    pub fn parse(name: &str, percentage: Percentage) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "eject" | "kick" => Some(PenaltyKind::Eject),
            "suppress" | "no_damage" => Some(PenaltyKind::Suppress),
            "attenuate" | "mitigate" => Some(PenaltyKind::Attenuate(percentage)),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PenaltyKind::Eject => "eject",
            PenaltyKind::Suppress => "suppress",
            PenaltyKind::Attenuate(_) => "attenuate",
        }
    }

    /// The ledger state this kind leaves behind, if any.
    pub fn persisted(&self) -> Option<ActivePenalty> {
        match self {
            PenaltyKind::Eject => None,
            PenaltyKind::Suppress => Some(ActivePenalty::Suppress),
            PenaltyKind::Attenuate(pct) => Some(ActivePenalty::Attenuate(*pct)),
        }
    }
}

/// A penalty recorded in the penalty ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivePenalty {
    Suppress,
    Attenuate(Percentage),
}

/// A value that stops being active at `expires_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expiring<V> {
    pub value: V,
    pub expires_at: Instant,
}

impl<V> Expiring<V> {
    pub fn new(value: V, expires_at: Instant) -> Self {
        Self { value, expires_at }
    }

    /// Active strictly before the expiry instant.
    pub fn is_active(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    /// Time left before expiry, zero once expired.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

/// The instant `duration` after `now`.
///
/// A duration past what `Instant` can represent saturates to the latest
/// representable deadline instead of overflowing, so an oversized cooldown
/// or penalty still holds for as long as the clock can express.
pub fn expiry_after(now: Instant, duration: Duration) -> Instant {
    if let Some(deadline) = now.checked_add(duration) {
        return deadline;
    }
    let mut latest = now;
    let mut step = duration;
    while !step.is_zero() {
        match latest.checked_add(step) {
            Some(next) => latest = next,
            None => step /= 2,
        }
    }
    latest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_bounds() {
        assert_eq!(Percentage::new(0), Some(Percentage::ZERO));
        assert_eq!(Percentage::new(100), Some(Percentage::FULL));
        assert_eq!(Percentage::new(101), None);
        assert_eq!(Percentage::new(-1), None);

        assert_eq!(Percentage::clamped(-20).value(), 0);
        assert_eq!(Percentage::clamped(250).value(), 100);
        assert_eq!(Percentage::clamped(35).value(), 35);
    }

    #[test]
    fn test_attenuation_factor() {
        let half = Percentage::clamped(50);
        assert!((10.0 * half.factor() - 5.0).abs() < f64::EPSILON);
        assert_eq!(Percentage::ZERO.factor(), 0.0);
        assert_eq!(Percentage::FULL.factor(), 1.0);
    }

    #[test]
    fn test_parse_penalty_kind() {
        let pct = Percentage::clamped(30);
        assert_eq!(PenaltyKind::parse("kick", pct), Some(PenaltyKind::Eject));
        assert_eq!(PenaltyKind::parse("EJECT", pct), Some(PenaltyKind::Eject));
        assert_eq!(
            PenaltyKind::parse("no_damage", pct),
            Some(PenaltyKind::Suppress)
        );
        assert_eq!(
            PenaltyKind::parse(" Mitigate ", pct),
            Some(PenaltyKind::Attenuate(pct))
        );
        assert_eq!(PenaltyKind::parse("explode", pct), None);
    }

    #[test]
    fn test_eject_is_not_persisted() {
        assert_eq!(PenaltyKind::Eject.persisted(), None);
        assert_eq!(
            PenaltyKind::Suppress.persisted(),
            Some(ActivePenalty::Suppress)
        );
        let pct = Percentage::clamped(40);
        assert_eq!(
            PenaltyKind::Attenuate(pct).persisted(),
            Some(ActivePenalty::Attenuate(pct))
        );
    }

    #[test]
    fn test_expiry_after() {
        let now = Instant::now();
        assert_eq!(
            expiry_after(now, Duration::from_millis(250)),
            now + Duration::from_millis(250)
        );

        let far = expiry_after(now, Duration::MAX);
        assert!(far > now + Duration::from_secs(365 * 24 * 3600));
        assert!(Expiring::new((), far).is_active(now + Duration::from_secs(3600)));
    }

    #[test]
    fn test_expiring_boundary() {
        let now = Instant::now();
        let entry = Expiring::new((), now + Duration::from_millis(100));

        assert!(entry.is_active(now));
        assert!(entry.is_active(now + Duration::from_millis(99)));
        assert!(!entry.is_active(now + Duration::from_millis(100)));
        assert_eq!(entry.remaining(now), Duration::from_millis(100));
        assert_eq!(
            entry.remaining(now + Duration::from_secs(1)),
            Duration::ZERO
        );
    }
}
