//! Push platform tags.

use crate::ValidationError;

/// Target push platform.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Apple devices, delivered through APNs.
    Ios,
    /// Android devices, delivered through an FCM-like gateway.
    Android,
    /// Browsers, delivered through Web Push.
    Webpush,
}

impl Platform {
    /// Every supported platform.
    pub const ALL: [Platform; 3] = [Self::Ios, Self::Android, Self::Webpush];

    /// Wire tag of the platform.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
            Self::Webpush => "webpush",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnsupportedPlatform(s.to_string()))
    }
}
