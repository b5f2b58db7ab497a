//! Threshold profiles and their resolution.
//!
//! A `ProfileCatalog` holds named profiles in declaration order plus one
//! default profile. Resolution walks the declared profiles and returns the
//! first whose permission the actor holds, falling back to the default.

use crate::domain::actor::Permissions;
use crate::domain::penalty::PenaltyKind;
use std::fmt;
use std::time::Duration;

/// Default primary threshold, in clicks per window.
pub const DEFAULT_PRIMARY_THRESHOLD: u32 = 18;

/// Default cooldown applied to the primary stream after a violation.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(1);

/// Error returned when a profile definition is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// Thresholds must be positive
    ZeroThreshold {
        /// Profile name
        profile: String,
    },
    /// Named profiles need a permission to be selectable
    EmptyPermission {
        /// Profile name
        profile: String,
    },
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileError::ZeroThreshold { profile } => {
                write!(f, "profile '{}': thresholds must be greater than 0", profile)
            }
            ProfileError::EmptyPermission { profile } => {
                write!(f, "profile '{}': permission must not be empty", profile)
            }
        }
    }
}

impl std::error::Error for ProfileError {}

/// Thresholds, cooldown and penalty for one class of actors.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    name: String,
    permission: Option<String>,
    primary_threshold: u32,
    secondary_threshold: u32,
    cooldown: Duration,
    penalty: PenaltyKind,
}

impl Profile {
    /// Create a named profile selected by `permission`.
    ///
    /// # Errors
    /// Returns `ProfileError` if a threshold is zero or the permission is empty.
    pub fn new(
        name: impl Into<String>,
        permission: impl Into<String>,
        primary_threshold: u32,
        secondary_threshold: u32,
    ) -> Result<Self, ProfileError> {
        let name = name.into();
        let permission = permission.into().trim().to_string();
        if permission.is_empty() {
            return Err(ProfileError::EmptyPermission { profile: name });
        }
        Self::build(name, Some(permission), primary_threshold, secondary_threshold)
    }

    /// Create the fallback profile. It never matches by permission.
    ///
    /// # Errors
    /// Returns `ProfileError::ZeroThreshold` if a threshold is zero.
    pub fn fallback(primary_threshold: u32, secondary_threshold: u32) -> Result<Self, ProfileError> {
        Self::build(
            "default".to_string(),
            None,
            primary_threshold,
            secondary_threshold,
        )
    }

    fn build(
        name: String,
        permission: Option<String>,
        primary_threshold: u32,
        secondary_threshold: u32,
    ) -> Result<Self, ProfileError> {
        if primary_threshold == 0 || secondary_threshold == 0 {
            return Err(ProfileError::ZeroThreshold { profile: name });
        }
        Ok(Self {
            name,
            permission,
            primary_threshold,
            secondary_threshold,
            cooldown: DEFAULT_COOLDOWN,
            penalty: PenaltyKind::default(),
        })
    }

    /// Set the primary cooldown duration.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Set the penalty applied on violation.
    pub fn with_penalty(mut self, penalty: PenaltyKind) -> Self {
        self.penalty = penalty;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    pub fn primary_threshold(&self) -> u32 {
        self.primary_threshold
    }

    pub fn secondary_threshold(&self) -> u32 {
        self.secondary_threshold
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn penalty(&self) -> PenaltyKind {
        self.penalty
    }

    /// Whether this profile applies to an actor with the given permissions.
    pub fn matches(&self, actor: &(impl Permissions + ?Sized)) -> bool {
        match self.permission.as_deref() {
            Some(permission) if !permission.is_empty() => actor.has_permission(permission),
            _ => false,
        }
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            permission: None,
            primary_threshold: DEFAULT_PRIMARY_THRESHOLD,
            secondary_threshold: DEFAULT_PRIMARY_THRESHOLD,
            cooldown: DEFAULT_COOLDOWN,
            penalty: PenaltyKind::default(),
        }
    }
}

/// Ordered profiles plus the fallback profile.
///
/// Immutable once built; reloading replaces the whole catalog.
///
/// # Example
/// ```
/// use click_throttle::{Capabilities, Profile, ProfileCatalog};
///
/// let catalog = ProfileCatalog::new(Profile::fallback(18, 18).unwrap())
///     .with_profile(Profile::new("vip", "rank.vip", 20, 20).unwrap())
///     .with_profile(Profile::new("staff", "rank.staff", 25, 25).unwrap());
///
/// let vip = Capabilities::new().with("rank.vip").with("rank.staff");
/// assert_eq!(catalog.resolve(&vip).name(), "vip");
/// assert_eq!(catalog.resolve(&Capabilities::new()).name(), "default");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileCatalog {
    profiles: Vec<Profile>,
    fallback: Profile,
}

impl ProfileCatalog {
    /// Create a catalog with no named profiles.
    pub fn new(fallback: Profile) -> Self {
        Self {
            profiles: Vec::new(),
            fallback,
        }
    }

    /// Append a profile. Earlier profiles take priority.
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profiles.push(profile);
        self
    }

    /// Resolve the effective profile for an actor.
    pub fn resolve(&self, actor: &(impl Permissions + ?Sized)) -> &Profile {
        self.profiles
            .iter()
            .find(|profile| profile.matches(actor))
            .unwrap_or(&self.fallback)
    }

    /// Named profiles in priority order.
    pub fn profiles(&self) -> &[Profile] {
        &self.profiles
    }

    pub fn fallback(&self) -> &Profile {
        &self.fallback
    }

    /// Number of named profiles (the fallback is not counted).
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
