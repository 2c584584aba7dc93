//! The four formation modes.

use std::fmt;
use std::str::FromStr;

use crate::error::GestureError;

/// Exactly one mode is active at any time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AppMode {
    #[default]
    Tree,
    Scatter,
    Focus,
    Gallery,
}

impl AppMode {
    pub const ALL: [AppMode; 4] = [AppMode::Tree, AppMode::Scatter, AppMode::Focus, AppMode::Gallery];

    pub fn name(self) -> &'static str {
        match self {
            AppMode::Tree    => "TREE",
            AppMode::Scatter => "SCATTER",
            AppMode::Focus   => "FOCUS",
            AppMode::Gallery => "GALLERY",
        }
    }

    /// Short gesture hint shown next to the mode name.
    pub fn hint(self) -> &'static str {
        match self {
            AppMode::Tree    => "Fist to form tree",
            AppMode::Scatter => "Open palm to rotate",
            AppMode::Focus   => "Pinch to view photo",
            AppMode::Gallery => "Peace sign activated",
        }
    }
}

impl fmt::Display for AppMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AppMode {
    type Err = GestureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AppMode::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GestureError::UnknownMode(s.to_string()))
    }
}
