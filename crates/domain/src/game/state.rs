//! Game lifecycle state and end-of-game policy.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The state of a game in its lifecycle.
///
/// State transitions:
/// ```text
/// NotStarted ──► Ongoing ──┬──► Won
///                          └──► Tied
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    /// No GameStarted event yet.
    #[default]
    NotStarted,

    /// Players may join and move.
    Ongoing,

    /// A player won the game (terminal state).
    Won,

    /// The game ended level (terminal state).
    Tied,
}

impl GameState {
    /// Returns true if a StartGame command is accepted in this state.
    pub fn can_start(&self) -> bool {
        matches!(self, GameState::NotStarted)
    }

    /// Returns true if moves are accepted in this state.
    pub fn accepts_moves(&self) -> bool {
        matches!(self, GameState::Ongoing)
    }

    /// Returns true if this is a terminal state (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, GameState::Won | GameState::Tied)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::NotStarted => "not_started",
            GameState::Ongoing => "ongoing",
            GameState::Won => "won",
            GameState::Tied => "tied",
        }
    }
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when a string does not name a game state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid game state: {0:?}")]
pub struct ParseGameStateError(pub String);

impl FromStr for GameState {
    type Err = ParseGameStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "not_started" | "notstarted" => Ok(GameState::NotStarted),
            "ongoing" => Ok(GameState::Ongoing),
            "won" => Ok(GameState::Won),
            "tied" => Ok(GameState::Tied),
            _ => Err(ParseGameStateError(s.to_string())),
        }
    }
}

/// When a game is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TerminationPolicy {
    /// The game ends as soon as one player has won a strict majority of the
    /// configured rounds, or after the last round.
    #[default]
    BestOf,

    /// Every configured round is played; the player with more round wins
    /// takes the game.
    AllRounds,
}

impl TerminationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationPolicy::BestOf => "best_of",
            TerminationPolicy::AllRounds => "all_rounds",
        }
    }
}

impl std::fmt::Display for TerminationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TerminationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "best_of" => Ok(TerminationPolicy::BestOf),
            "all_rounds" => Ok(TerminationPolicy::AllRounds),
            other => Err(format!("unknown termination policy: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_not_started() {
        assert_eq!(GameState::default(), GameState::NotStarted);
    }

    #[test]
    fn only_ongoing_accepts_moves() {
        assert!(!GameState::NotStarted.accepts_moves());
        assert!(GameState::Ongoing.accepts_moves());
        assert!(!GameState::Won.accepts_moves());
        assert!(!GameState::Tied.accepts_moves());
    }

    #[test]
    fn terminal_states() {
        assert!(!GameState::NotStarted.is_terminal());
        assert!(!GameState::Ongoing.is_terminal());
        assert!(GameState::Won.is_terminal());
        assert!(GameState::Tied.is_terminal());
    }

    #[test]
    fn parse_accepts_any_case() {
        assert_eq!("ONGOING".parse::<GameState>().unwrap(), GameState::Ongoing);
        assert_eq!("Not_Started".parse::<GameState>().unwrap(), GameState::NotStarted);
        assert_eq!("tied".parse::<GameState>().unwrap(), GameState::Tied);
        assert!("finished".parse::<GameState>().is_err());
    }

    #[test]
    fn serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&GameState::NotStarted).unwrap(),
            "\"not_started\""
        );
        assert_eq!(
            serde_json::to_string(&TerminationPolicy::AllRounds).unwrap(),
            "\"all_rounds\""
        );
    }
}
