//! Game domain events.

use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::DomainEvent;

use super::{Move, PlayerId, TerminationPolicy};

/// Events that can occur on a game aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GameEvent {
    /// Game was created and is open for players.
    GameStarted(GameStartedData),

    /// The first player made their first move.
    FirstPlayerJoined(PlayerJoinedData),

    /// A second, distinct player made their first move.
    SecondPlayerJoined(PlayerJoinedData),

    /// A new round opened.
    RoundStarted(RoundData),

    /// A player chose a move in a round.
    MoveMade(MoveMadeData),

    /// A round was won.
    RoundWon(RoundWonData),

    /// A round was tied.
    RoundTied(RoundData),

    /// A round closed; always follows RoundWon or RoundTied.
    RoundEnded(RoundData),

    /// The game was won.
    GameWon(GameWonData),

    /// The game ended level.
    GameTied,

    /// The game closed; always follows GameWon or GameTied.
    GameEnded,
}

impl DomainEvent for GameEvent {
    fn event_type(&self) -> &'static str {
        match self {
            GameEvent::GameStarted(_) => "GameStarted",
            GameEvent::FirstPlayerJoined(_) => "FirstPlayerJoined",
            GameEvent::SecondPlayerJoined(_) => "SecondPlayerJoined",
            GameEvent::RoundStarted(_) => "RoundStarted",
            GameEvent::MoveMade(_) => "MoveMade",
            GameEvent::RoundWon(_) => "RoundWon",
            GameEvent::RoundTied(_) => "RoundTied",
            GameEvent::RoundEnded(_) => "RoundEnded",
            GameEvent::GameWon(_) => "GameWon",
            GameEvent::GameTied => "GameTied",
            GameEvent::GameEnded => "GameEnded",
        }
    }
}

/// Data for GameStarted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStartedData {
    /// The game being started.
    pub game_id: AggregateId,

    /// Who created the game. Not seated until they move.
    pub started_by: PlayerId,

    /// Configured number of rounds.
    pub rounds: u32,

    /// Absent in logs written before the policy existed.
    #[serde(default)]
    pub policy: TerminationPolicy,
}

/// Data for FirstPlayerJoined and SecondPlayerJoined events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerJoinedData {
    pub player: PlayerId,
}

/// Data for events that only identify a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundData {
    pub round_number: u32,
}

/// Data for MoveMade event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveMadeData {
    pub player: PlayerId,
    pub round_number: u32,
    #[serde(rename = "move")]
    pub r#move: Move,
}

/// Data for RoundWon event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundWonData {
    pub round_number: u32,
    pub winner: PlayerId,
}

/// Data for GameWon event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameWonData {
    pub winner: PlayerId,
}

// Event constructors
impl GameEvent {
    pub fn game_started(
        game_id: AggregateId,
        started_by: PlayerId,
        rounds: u32,
        policy: TerminationPolicy,
    ) -> Self {
        GameEvent::GameStarted(GameStartedData {
            game_id,
            started_by,
            rounds,
            policy,
        })
    }

    pub fn first_player_joined(player: PlayerId) -> Self {
        GameEvent::FirstPlayerJoined(PlayerJoinedData { player })
    }

    pub fn second_player_joined(player: PlayerId) -> Self {
        GameEvent::SecondPlayerJoined(PlayerJoinedData { player })
    }

    pub fn round_started(round_number: u32) -> Self {
        GameEvent::RoundStarted(RoundData { round_number })
    }

    pub fn move_made(player: PlayerId, round_number: u32, r#move: Move) -> Self {
        GameEvent::MoveMade(MoveMadeData {
            player,
            round_number,
            r#move,
        })
    }

    pub fn round_won(round_number: u32, winner: PlayerId) -> Self {
        GameEvent::RoundWon(RoundWonData {
            round_number,
            winner,
        })
    }

    pub fn round_tied(round_number: u32) -> Self {
        GameEvent::RoundTied(RoundData { round_number })
    }

    pub fn round_ended(round_number: u32) -> Self {
        GameEvent::RoundEnded(RoundData { round_number })
    }

    pub fn game_won(winner: PlayerId) -> Self {
        GameEvent::GameWon(GameWonData { winner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_is_tagged() {
        let event = GameEvent::move_made(PlayerId::new("alice"), 2, Move::Paper);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "type": "MoveMade",
                "data": { "player": "alice", "round_number": 2, "move": "paper" }
            })
        );
        assert_eq!(event.event_type(), "MoveMade");
    }

    #[test]
    fn unit_events_have_no_data() {
        let json = serde_json::to_value(GameEvent::GameEnded).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "GameEnded" }));

        let back: GameEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, GameEvent::GameEnded);
    }

    #[test]
    fn game_started_without_policy_defaults_to_best_of() {
        let json = serde_json::json!({
            "type": "GameStarted",
            "data": { "game_id": "g1", "started_by": "alice", "rounds": 3 }
        });

        let event: GameEvent = serde_json::from_value(json).unwrap();
        let GameEvent::GameStarted(data) = event else {
            panic!("expected GameStarted");
        };
        assert_eq!(data.policy, TerminationPolicy::BestOf);
        assert_eq!(data.rounds, 3);
    }
}
