//! Actor identity and capability types.

use ahash::AHashSet;
use std::fmt;
use std::time::Instant;

/// Opaque, stable identity of a rate-limited participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(u128);

impl ActorId {
    /// Create an actor id from its raw value.
    pub const fn new(raw: u128) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub const fn as_u128(&self) -> u128 {
        self.0
    }
}

impl From<u128> for ActorId {
    fn from(raw: u128) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// The two independently tracked click streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClickKind {
    /// The high-stakes stream (attacks), gated at effect confirmation.
    Primary,
    /// The low-stakes stream (interactions), gated when the action occurs.
    Secondary,
}

impl ClickKind {
    /// Both kinds, in a fixed order.
    pub const ALL: [ClickKind; 2] = [ClickKind::Primary, ClickKind::Secondary];

    /// Short lowercase label used in logs and diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            ClickKind::Primary => "primary",
            ClickKind::Secondary => "secondary",
        }
    }
}

/// A raw click notification delivered by the event source.
///
/// Consumed immediately; only its timestamp is ever retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    pub actor: ActorId,
    pub kind: ClickKind,
    pub at: Instant,
}

impl ClickEvent {
    pub fn new(actor: ActorId, kind: ClickKind, at: Instant) -> Self {
        Self { actor, kind, at }
    }
}

/// Anything that can answer "does this actor hold permission X".
pub trait Permissions {
    fn has_permission(&self, permission: &str) -> bool;
}

/// An owned capability set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capabilities {
    granted: AHashSet<String>,
}

impl Capabilities {
    /// An empty capability set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant a permission, returning the updated set.
    pub fn with(mut self, permission: impl Into<String>) -> Self {
        self.granted.insert(permission.into());
        self
    }

    pub fn grant(&mut self, permission: impl Into<String>) {
        self.granted.insert(permission.into());
    }

    pub fn revoke(&mut self, permission: &str) -> bool {
        self.granted.remove(permission)
    }

    pub fn len(&self) -> usize {
        self.granted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.granted.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Capabilities {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            granted: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl Permissions for Capabilities {
    fn has_permission(&self, permission: &str) -> bool {
        self.granted.contains(permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_id_display_is_fixed_width_hex() {
        let id = ActorId::new(0xabc);
        assert_eq!(id.to_string(), format!("{:0>32}", "abc"));
        assert_eq!(id.as_u128(), 0xabc);
    }

    #[test]
    fn test_capabilities_grant_and_revoke() {
        let mut caps = Capabilities::new().with("vip");
        assert!(caps.has_permission("vip"));
        assert!(!caps.has_permission("staff"));

        caps.grant("staff");
        assert_eq!(caps.len(), 2);

        assert!(caps.revoke("vip"));
        assert!(!caps.revoke("vip"));
        assert!(!caps.has_permission("vip"));
    }

    #[test]
    fn test_capabilities_from_iter() {
        let caps: Capabilities = ["a", "b"].into_iter().collect();
        assert!(caps.has_permission("a"));
        assert!(caps.has_permission("b"));
        assert!(!Capabilities::new().has_permission("a"));
    }
}
