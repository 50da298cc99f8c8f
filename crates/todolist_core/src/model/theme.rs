//! Theme preference.
//!
//! Stored as an upper-case token. Older hosts wrote `AUTO` for "follow the
//! OS", so parsing treats it as `System`.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Light/dark selection persisted under the `theme` preference key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThemePreference {
    Light,
    Dark,
    /// Follow the operating system setting.
    #[default]
    System,
}

impl ThemePreference {
    /// Persisted token for this value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "LIGHT",
            Self::Dark => "DARK",
            Self::System => "SYSTEM",
        }
    }

    /// Parses a persisted or host-supplied token.
    ///
    /// Returns `None` for unknown input so callers decide how to fail closed.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LIGHT" => Some(Self::Light),
            "DARK" => Some(Self::Dark),
            "SYSTEM" | "AUTO" => Some(Self::System),
            _ => None,
        }
    }

    /// Resolves whether the dark palette applies.
    pub fn resolve_dark(self, system_is_dark: bool) -> bool {
        match self {
            Self::Dark => true,
            Self::Light => false,
            Self::System => system_is_dark,
        }
    }
}

impl Display for ThemePreference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
