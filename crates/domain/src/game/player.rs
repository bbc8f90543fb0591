//! Player identity and seating.

use serde::{Deserialize, Serialize};

use super::Move;

/// Opaque identifier of a player, as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Creates a new player ID from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the player ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PlayerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Which of the two seats at the table a player occupies.
///
/// The first player to move takes `First`, the next distinct player `Second`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerSlot {
    First,
    Second,
}

impl PlayerSlot {
    /// Returns the other seat.
    pub fn opponent(self) -> Self {
        match self {
            PlayerSlot::First => PlayerSlot::Second,
            PlayerSlot::Second => PlayerSlot::First,
        }
    }
}

/// A move made by the player in a given seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerMove {
    pub slot: PlayerSlot,
    #[serde(rename = "move")]
    pub r#move: Move,
}

impl PlayerMove {
    pub fn new(slot: PlayerSlot, r#move: Move) -> Self {
        Self { slot, r#move }
    }
}
