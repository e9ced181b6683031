//! Theme preference
//!
//! Stored as a bare string under one settings key; an absent or
//! unrecognised value falls back to following the system.

use std::fmt;
use std::str::FromStr;

pub const THEME_KEY: &str = "tracker-theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }

    /// Concrete light/dark value to render with.
    pub fn resolve(self, system_prefers_dark: bool) -> Theme {
        match self {
            Theme::System => {
                if system_prefers_dark {
                    Theme::Dark
                } else {
                    Theme::Light
                }
            }
            other => other,
        }
    }

    /// Next theme when the user hits the toggle: light and dark swap, and
    /// from system the toggle moves away from the current system value.
    pub fn toggled(self, system_prefers_dark: bool) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
            Theme::System => {
                if system_prefers_dark {
                    Theme::Light
                } else {
                    Theme::Dark
                }
            }
        }
    }
}

impl FromStr for Theme {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
