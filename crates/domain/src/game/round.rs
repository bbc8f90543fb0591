//! A single round of play.

use serde::{Deserialize, Serialize};

use super::{Move, PlayerMove, PlayerSlot, rules};

/// Where a round stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundOutcome {
    /// Nobody has moved yet.
    NotStarted,
    /// One of the two players has moved.
    Ongoing,
    /// Both moved and the given seat won.
    Won(PlayerSlot),
    /// Both moved the same shape.
    Tied,
}

impl RoundOutcome {
    /// Returns true once both players have moved.
    pub fn is_ended(&self) -> bool {
        matches!(self, RoundOutcome::Won(_) | RoundOutcome::Tied)
    }
}

/// A numbered round holding at most one move per seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    number: u32,
    moves: Vec<PlayerMove>,
}

impl Round {
    /// Creates an empty round. Rounds are numbered from 1.
    pub fn new(number: u32) -> Self {
        Self {
            number,
            moves: Vec::with_capacity(2),
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Moves in the order they were made.
    pub fn moves(&self) -> &[PlayerMove] {
        &self.moves
    }

    /// Returns the move made from `slot`, if any.
    pub fn move_of(&self, slot: PlayerSlot) -> Option<Move> {
        self.moves
            .iter()
            .find(|m| m.slot == slot)
            .map(|m| m.r#move)
    }

    pub fn has_played(&self, slot: PlayerSlot) -> bool {
        self.move_of(slot).is_some()
    }

    /// Records a move.
    ///
    /// A second move from the same seat, or any move after the round has
    /// ended, is ignored. Returns whether the move was recorded.
    pub fn play(&mut self, slot: PlayerSlot, r#move: Move) -> bool {
        if self.is_ended() || self.has_played(slot) {
            return false;
        }
        self.moves.push(PlayerMove::new(slot, r#move));
        true
    }

    pub fn outcome(&self) -> RoundOutcome {
        match (
            self.move_of(PlayerSlot::First),
            self.move_of(PlayerSlot::Second),
        ) {
            (Some(first), Some(second)) => rules::resolve(first, second),
            (None, None) => RoundOutcome::NotStarted,
            _ => RoundOutcome::Ongoing,
        }
    }

    pub fn is_ended(&self) -> bool {
        self.outcome().is_ended()
    }

    /// The winning seat, if the round has been won.
    pub fn winner(&self) -> Option<PlayerSlot> {
        match self.outcome() {
            RoundOutcome::Won(slot) => Some(slot),
            _ => None,
        }
    }
}
