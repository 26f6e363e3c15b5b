//! Filter view over the item list.

use crate::types::Item;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which items the list shows
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// Every item
    #[default]
    All,
    /// Items not completed yet
    Active,
    /// Completed items
    Completed,
}

impl Filter {
    /// All filters in display order
    pub const ALL: [Self; 3] = [Self::All, Self::Active, Self::Completed];

    /// Whether `item` is visible under this filter
    #[must_use]
    pub const fn matches(self, item: &Item) -> bool {
        match self {
            Self::All => true,
            Self::Active => !item.completed,
            Self::Completed => item.completed,
        }
    }

    /// Lowercase name, as parsed by [`FromStr`]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown filter name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter '{0}' (expected all, active or completed)")]
pub struct ParseFilterError(String);

impl FromStr for Filter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(ParseFilterError(other.to_string())),
        }
    }
}

/// Items visible under `mode`, in list order.
///
/// Never mutates `items`; the same inputs always give the same output.
#[must_use]
pub fn filter(items: &[Item], mode: Filter) -> Vec<&Item> {
    items.iter().filter(|item| mode.matches(item)).collect()
}
