//! Declarative throttle settings.
//!
//! `ThrottleSettings` is the shape an operator writes: global defaults plus
//! an ordered list of named profiles. With the `serde` feature it can be
//! deserialized from any serde format, with kebab-case keys and every field
//! optional:
//!
//! ```toml
//! penalty-type = "attenuate"
//! attenuation-percentage = 40
//! primary-threshold = 16
//!
//! [[profiles]]
//! name = "staff"
//! permission = "throttle.staff"
//! primary-threshold = 30
//! ```
//!
//! `into_parts` validates the settings into a `LimiterConfig` and a
//! `ProfileCatalog`. In lenient mode bad values are clamped or defaulted
//! with a warning; in strict mode they are errors.

use crate::application::limiter::{
    ConfigError, LimiterConfig, DEFAULT_FALLBACK_HALF_RTT, DEFAULT_PENALTY_DURATION,
};
use crate::domain::penalty::{PenaltyKind, Percentage};
use crate::domain::profile::{
    Profile, ProfileCatalog, ProfileError, DEFAULT_COOLDOWN, DEFAULT_PRIMARY_THRESHOLD,
};
use std::fmt;
use std::time::Duration;
use tracing::warn;

/// Default attenuation percentage.
pub const DEFAULT_ATTENUATION_PERCENTAGE: i64 = 50;

const GLOBAL: &str = "default";

/// Errors that can occur when validating settings.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    /// Penalty type is not one of the known names
    UnknownPenaltyKind { profile: String, value: String },
    /// Attenuation percentage outside `[0, 100]`
    PercentageOutOfRange { profile: String, value: i64 },
    /// A duration was negative or not a number
    InvalidDuration {
        profile: String,
        field: &'static str,
        value: f64,
    },
    /// A profile definition was rejected
    Profile(ProfileError),
    /// The engine config was rejected
    Config(ConfigError),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::UnknownPenaltyKind { profile, value } => {
                write!(f, "profile '{}': unknown penalty type '{}'", profile, value)
            }
            SettingsError::PercentageOutOfRange { profile, value } => write!(
                f,
                "profile '{}': attenuation percentage {} is outside 0..=100",
                profile, value
            ),
            SettingsError::InvalidDuration {
                profile,
                field,
                value,
            } => write!(f, "profile '{}': {} must be non-negative, got {}", profile, field, value),
            SettingsError::Profile(e) => write!(f, "{}", e),
            SettingsError::Config(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Profile(e) => Some(e),
            SettingsError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ProfileError> for SettingsError {
    fn from(e: ProfileError) -> Self {
        SettingsError::Profile(e)
    }
}

impl From<ConfigError> for SettingsError {
    fn from(e: ConfigError) -> Self {
        SettingsError::Config(e)
    }
}

/// Global throttle settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "kebab-case"))]
pub struct ThrottleSettings {
    /// Base sliding-window length in milliseconds
    pub base_window_ms: u64,
    /// Half round-trip time assumed when no estimate exists, in milliseconds
    pub fallback_half_rtt_ms: u64,
    /// Penalty type name for the default profile and for profiles that omit it
    pub penalty_type: String,
    #[cfg_attr(feature = "serde", serde(alias = "mitigate-percentage"))]
    pub attenuation_percentage: i64,
    pub penalty_duration_seconds: f64,
    pub primary_threshold: u32,
    /// Defaults to `primary_threshold`
    pub secondary_threshold: Option<u32>,
    pub cooldown_seconds: f64,
    /// Permission that exempts an actor from throttling
    pub bypass_permission: Option<String>,
    /// Named profiles, highest priority first
    pub profiles: Vec<ProfileSettings>,
}

impl Default for ThrottleSettings {
    fn default() -> Self {
        Self {
            base_window_ms: 1000,
            fallback_half_rtt_ms: DEFAULT_FALLBACK_HALF_RTT.as_millis() as u64,
            penalty_type: PenaltyKind::default().name().to_string(),
            attenuation_percentage: DEFAULT_ATTENUATION_PERCENTAGE,
            penalty_duration_seconds: DEFAULT_PENALTY_DURATION.as_secs_f64(),
            primary_threshold: DEFAULT_PRIMARY_THRESHOLD,
            secondary_threshold: None,
            cooldown_seconds: DEFAULT_COOLDOWN.as_secs_f64(),
            bypass_permission: None,
            profiles: Vec::new(),
        }
    }
}

/// One named profile. Omitted fields inherit the global settings.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, rename_all = "kebab-case"))]
pub struct ProfileSettings {
    pub name: String,
    pub permission: String,
    pub primary_threshold: Option<u32>,
    pub secondary_threshold: Option<u32>,
    pub cooldown_seconds: Option<f64>,
    pub penalty_type: Option<String>,
    #[cfg_attr(feature = "serde", serde(alias = "mitigate-percentage"))]
    pub attenuation_percentage: Option<i64>,
}

impl ProfileSettings {
    pub fn new(name: impl Into<String>, permission: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permission: permission.into(),
            ..Self::default()
        }
    }
}

impl ThrottleSettings {
    /// Append a named profile.
    pub fn with_profile(mut self, profile: ProfileSettings) -> Self {
        self.profiles.push(profile);
        self
    }

    /// Validate into an engine config and a profile catalog.
    ///
    /// # Errors
    /// Zero thresholds and a zero base window are always errors. With
    /// `strict`, unknown penalty types, out-of-range percentages, negative
    /// durations and profiles without a permission are errors too; without
    /// it they are corrected and logged at `warn`.
    pub fn into_parts(self, strict: bool) -> Result<(LimiterConfig, ProfileCatalog), SettingsError> {
        let mut config = LimiterConfig::new(Duration::from_millis(self.base_window_ms))?
            .with_fallback_half_rtt(Duration::from_millis(self.fallback_half_rtt_ms))
            .with_penalty_duration(seconds(
                GLOBAL,
                "penalty-duration-seconds",
                self.penalty_duration_seconds,
                strict,
            )?);
        if let Some(permission) = &self.bypass_permission {
            config = config.with_bypass_permission(permission.trim());
        }

        let global_percentage =
            percentage(GLOBAL, self.attenuation_percentage, strict)?;
        let global_penalty =
            penalty_kind(GLOBAL, &self.penalty_type, global_percentage, None, strict)?;
        let global_cooldown = seconds(GLOBAL, "cooldown-seconds", self.cooldown_seconds, strict)?;
        let primary = self.primary_threshold;
        let secondary = self.secondary_threshold.unwrap_or(primary);

        let fallback = Profile::fallback(primary, secondary)?
            .with_cooldown(global_cooldown)
            .with_penalty(global_penalty);
        let mut catalog = ProfileCatalog::new(fallback);

        for settings in self.profiles {
            let name = settings.name.clone();
            let pct = match settings.attenuation_percentage {
                Some(value) => percentage(&name, value, strict)?,
                None => global_percentage,
            };
            let penalty = match &settings.penalty_type {
                Some(value) => penalty_kind(&name, value, pct, Some(global_penalty), strict)?,
                None => with_percentage(global_penalty, pct),
            };
            let cooldown = match settings.cooldown_seconds {
                Some(value) => seconds(&name, "cooldown-seconds", value, strict)?,
                None => global_cooldown,
            };

            let profile = match Profile::new(
                settings.name,
                settings.permission,
                settings.primary_threshold.unwrap_or(primary),
                settings.secondary_threshold.unwrap_or(secondary),
            ) {
                Ok(profile) => profile,
                Err(ProfileError::EmptyPermission { profile }) if !strict => {
                    warn!(profile = %profile, "profile has no permission and can never match; skipping");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            catalog = catalog.with_profile(profile.with_cooldown(cooldown).with_penalty(penalty));
        }

        Ok((config, catalog))
    }
}

/// Attenuation carries the profile's own percentage even when the kind is inherited.
fn with_percentage(kind: PenaltyKind, pct: Percentage) -> PenaltyKind {
    match kind {
        PenaltyKind::Attenuate(_) => PenaltyKind::Attenuate(pct),
        other => other,
    }
}

fn percentage(profile: &str, value: i64, strict: bool) -> Result<Percentage, SettingsError> {
    if let Some(pct) = Percentage::new(value) {
        return Ok(pct);
    }
    if strict {
        return Err(SettingsError::PercentageOutOfRange {
            profile: profile.to_string(),
            value,
        });
    }
    let clamped = Percentage::clamped(value);
    warn!(
        profile = %profile,
        value,
        clamped = clamped.value(),
        "attenuation percentage out of range; clamping"
    );
    Ok(clamped)
}

fn penalty_kind(
    profile: &str,
    value: &str,
    pct: Percentage,
    inherited: Option<PenaltyKind>,
    strict: bool,
) -> Result<PenaltyKind, SettingsError> {
    if let Some(kind) = PenaltyKind::parse(value, pct) {
        return Ok(kind);
    }
    if strict {
        return Err(SettingsError::UnknownPenaltyKind {
            profile: profile.to_string(),
            value: value.to_string(),
        });
    }
    let fallback = with_percentage(inherited.unwrap_or_default(), pct);
    warn!(
        profile = %profile,
        value = %value,
        fallback = fallback.name(),
        "unknown penalty type; using default"
    );
    Ok(fallback)
}

fn seconds(
    profile: &str,
    field: &'static str,
    value: f64,
    strict: bool,
) -> Result<Duration, SettingsError> {
    if let Ok(duration) = Duration::try_from_secs_f64(value) {
        return Ok(duration);
    }
    if strict {
        return Err(SettingsError::InvalidDuration {
            profile: profile.to_string(),
            field,
            value,
        });
    }
    warn!(profile = %profile, field, value, "invalid duration; using zero");
    Ok(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::Capabilities;
    use crate::infrastructure::mocks::MockCaptureLayer;
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;

    fn lenient(settings: ThrottleSettings) -> ((LimiterConfig, ProfileCatalog), MockCaptureLayer) {
        let capture = MockCaptureLayer::new();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let parts = tracing::subscriber::with_default(subscriber, || {
            settings.into_parts(false).unwrap()
        });
        (parts, capture)
    }

    #[test]
    fn test_defaults() {
        let (config, catalog) = ThrottleSettings::default().into_parts(true).unwrap();

        assert_eq!(config, LimiterConfig::default());
        let fallback = catalog.fallback();
        assert_eq!(fallback.primary_threshold(), 18);
        assert_eq!(fallback.secondary_threshold(), 18);
        assert_eq!(fallback.cooldown(), Duration::from_secs(1));
        assert_eq!(fallback.penalty(), PenaltyKind::Suppress);
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_profiles_inherit_globals() {
        let settings = ThrottleSettings {
            penalty_type: "mitigate".to_string(),
            attenuation_percentage: 40,
            primary_threshold: 12,
            secondary_threshold: Some(8),
            cooldown_seconds: 0.5,
            ..ThrottleSettings::default()
        }
        .with_profile(ProfileSettings {
            primary_threshold: Some(20),
            attenuation_percentage: Some(25),
            ..ProfileSettings::new("vip", "throttle.vip")
        })
        .with_profile(ProfileSettings {
            penalty_type: Some("kick".to_string()),
            cooldown_seconds: Some(2.0),
            ..ProfileSettings::new("strict", "throttle.strict")
        });

        let (_, catalog) = settings.into_parts(true).unwrap();
        let profiles = catalog.profiles();
        assert_eq!(profiles.len(), 2);

        let vip = &profiles[0];
        assert_eq!(vip.primary_threshold(), 20);
        assert_eq!(vip.secondary_threshold(), 8);
        assert_eq!(vip.cooldown(), Duration::from_millis(500));
        assert_eq!(vip.penalty(), PenaltyKind::Attenuate(Percentage::clamped(25)));

        let strict = &profiles[1];
        assert_eq!(strict.primary_threshold(), 12);
        assert_eq!(strict.cooldown(), Duration::from_secs(2));
        assert_eq!(strict.penalty(), PenaltyKind::Eject);

        let both = Capabilities::new().with("throttle.strict").with("throttle.vip");
        assert_eq!(catalog.resolve(&both).name(), "vip");
    }

    #[test]
    fn test_lenient_unknown_kind_uses_global_default() {
        let settings = ThrottleSettings {
            penalty_type: "smite".to_string(),
            ..ThrottleSettings::default()
        }
        .with_profile(ProfileSettings {
            penalty_type: Some("banish".to_string()),
            ..ProfileSettings::new("vip", "throttle.vip")
        });

        let ((_, catalog), capture) = lenient(settings);
        assert_eq!(catalog.fallback().penalty(), PenaltyKind::Suppress);
        assert_eq!(catalog.profiles()[0].penalty(), PenaltyKind::Suppress);
        assert_eq!(capture.at_level(Level::WARN).len(), 2);
        assert!(capture.contains(Level::WARN, "unknown penalty type"));
    }

    #[test]
    fn test_lenient_clamps_percentage() {
        let settings = ThrottleSettings {
            penalty_type: "attenuate".to_string(),
            attenuation_percentage: 140,
            ..ThrottleSettings::default()
        };

        let ((_, catalog), capture) = lenient(settings);
        assert_eq!(
            catalog.fallback().penalty(),
            PenaltyKind::Attenuate(Percentage::FULL)
        );
        let warnings = capture.at_level(Level::WARN);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field("clamped"), Some("100"));
    }

    #[test]
    fn test_lenient_skips_profile_without_permission() {
        let settings = ThrottleSettings::default().with_profile(ProfileSettings::new("nobody", "  "));
        let ((_, catalog), capture) = lenient(settings);
        assert!(catalog.is_empty());
        assert!(capture.contains(Level::WARN, "can never match"));
    }

    #[test]
    fn test_strict_rejects_bad_values() {
        let unknown = ThrottleSettings {
            penalty_type: "smite".to_string(),
            ..ThrottleSettings::default()
        };
        assert_eq!(
            unknown.into_parts(true).unwrap_err(),
            SettingsError::UnknownPenaltyKind {
                profile: "default".to_string(),
                value: "smite".to_string()
            }
        );

        let pct = ThrottleSettings::default().with_profile(ProfileSettings {
            attenuation_percentage: Some(-5),
            ..ProfileSettings::new("vip", "throttle.vip")
        });
        assert_eq!(
            pct.into_parts(true).unwrap_err(),
            SettingsError::PercentageOutOfRange {
                profile: "vip".to_string(),
                value: -5
            }
        );

        let cooldown = ThrottleSettings {
            cooldown_seconds: -1.0,
            ..ThrottleSettings::default()
        };
        assert!(matches!(
            cooldown.into_parts(true),
            Err(SettingsError::InvalidDuration { field: "cooldown-seconds", .. })
        ));

        let empty = ThrottleSettings::default().with_profile(ProfileSettings::new("nobody", ""));
        assert!(matches!(
            empty.into_parts(true),
            Err(SettingsError::Profile(ProfileError::EmptyPermission { .. }))
        ));
    }

    #[test]
    fn test_zero_values_always_rejected() {
        let zero_threshold = ThrottleSettings {
            primary_threshold: 0,
            ..ThrottleSettings::default()
        };
        assert!(matches!(
            zero_threshold.into_parts(false),
            Err(SettingsError::Profile(ProfileError::ZeroThreshold { .. }))
        ));

        let zero_window = ThrottleSettings {
            base_window_ms: 0,
            ..ThrottleSettings::default()
        };
        assert_eq!(
            zero_window.into_parts(false).unwrap_err(),
            SettingsError::Config(ConfigError::ZeroBaseWindow)
        );
    }

    #[test]
    fn test_bypass_permission() {
        let settings = ThrottleSettings {
            bypass_permission: Some(" throttle.bypass ".to_string()),
            ..ThrottleSettings::default()
        };
        let (config, _) = settings.into_parts(true).unwrap();
        assert_eq!(config.bypass_permission(), Some("throttle.bypass"));
    }
}
