//! The three moves and what beats what.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{PlayerSlot, RoundOutcome};

/// One of the three hand shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Move {
    Rock,
    Paper,
    Scissors,
}

impl Move {
    /// All moves, in declaration order.
    pub const ALL: [Move; 3] = [Move::Rock, Move::Paper, Move::Scissors];

    /// Returns true if `self` defeats `other`.
    ///
    /// Rock beats scissors, scissors beats paper, paper beats rock.
    pub fn beats(self, other: Move) -> bool {
        matches!(
            (self, other),
            (Move::Rock, Move::Scissors)
                | (Move::Scissors, Move::Paper)
                | (Move::Paper, Move::Rock)
        )
    }

    /// Returns the move name in lowercase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Move::Rock => "rock",
            Move::Paper => "paper",
            Move::Scissors => "scissors",
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when a string does not name a move.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid move: {0:?} (expected rock, paper or scissors)")]
pub struct ParseMoveError(pub String);

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rock" => Ok(Move::Rock),
            "paper" => Ok(Move::Paper),
            "scissors" => Ok(Move::Scissors),
            _ => Err(ParseMoveError(s.to_string())),
        }
    }
}

impl TryFrom<String> for Move {
    type Error = ParseMoveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Decides a round between the first and second player's moves.
pub fn resolve(first: Move, second: Move) -> RoundOutcome {
    if first.beats(second) {
        RoundOutcome::Won(PlayerSlot::First)
    } else if second.beats(first) {
        RoundOutcome::Won(PlayerSlot::Second)
    } else {
        RoundOutcome::Tied
    }
}
