//! Refresh token rotation policy.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// When a presented refresh token gets a new payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RefreshTokenUpdatePolicy {
    /// Reuse the payload until it expires
    Never,
    /// Rotate on every refresh
    #[default]
    Always,
    /// Rotate once a quarter of the lifetime has elapsed
    QuarterLife,
    /// Rotate once half of the lifetime has elapsed
    HalfLife,
    /// Rotate once three quarters of the lifetime have elapsed
    ThreeQuarterLife,
}

impl RefreshTokenUpdatePolicy {
    /// Parse a configured policy name
    ///
    /// Matching ignores case, `_` and `-`. Unset and unknown names fall back
    /// to [`RefreshTokenUpdatePolicy::Always`].
    pub fn parse(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::default();
        };
        let normalized: String = value
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "never" => Self::Never,
            "always" => Self::Always,
            "quarterlife" => Self::QuarterLife,
            "halflife" => Self::HalfLife,
            "threequarterlife" => Self::ThreeQuarterLife,
            _ => Self::default(),
        }
    }

    /// Elapsed lifetime fraction at which rotation starts, if fractional
    pub fn threshold(&self) -> Option<f64> {
        match self {
            Self::Never | Self::Always => None,
            Self::QuarterLife => Some(0.25),
            Self::HalfLife => Some(0.5),
            Self::ThreeQuarterLife => Some(0.75),
        }
    }

    /// Decide whether a token created at `created_at` and expiring at
    /// `expires_at` is rotated when refreshed at `now`
    ///
    /// Ages are measured in whole minutes. A lifetime under one minute
    /// always rotates.
    pub fn should_rotate(
        &self,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> bool {
        if *self == Self::Never {
            return false;
        }
        let Some(threshold) = self.threshold() else {
            return true;
        };

        let lifetime = (expires_at - created_at).num_minutes();
        if lifetime <= 0 {
            return true;
        }
        let elapsed = (now - created_at).num_minutes();
        elapsed as f64 / lifetime as f64 >= threshold
    }
}

impl fmt::Display for RefreshTokenUpdatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Never => "Never",
            Self::Always => "Always",
            Self::QuarterLife => "QuarterLife",
            Self::HalfLife => "HalfLife",
            Self::ThreeQuarterLife => "ThreeQuarterLife",
        };
        f.write_str(name)
    }
}
