//! Game aggregate implementation.

use std::cmp::Ordering;

use common::AggregateId;
use event_store::Version;

use crate::aggregate::Aggregate;

use super::{
    GameCommand, GameError, GameEvent, GameState, Move, PlayerId, PlayerSlot, Round,
    RoundOutcome, StartGame, TerminationPolicy,
};

/// Game aggregate root.
///
/// Two players play a fixed number of rounds. A player takes a seat with
/// their first move; the game creator is not seated until they move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Game {
    /// Unique game identifier.
    id: Option<AggregateId>,

    /// Current version for optimistic concurrency.
    version: Version,

    state: GameState,

    started_by: Option<PlayerId>,

    first_player: Option<PlayerId>,

    second_player: Option<PlayerId>,

    /// Configured number of rounds.
    rounds_in_game: u32,

    policy: TerminationPolicy,

    /// Rounds played so far, in ascending number.
    rounds: Vec<Round>,

    winner: Option<PlayerId>,
}

impl Aggregate for Game {
    type Event = GameEvent;
    type Error = GameError;

    fn aggregate_type() -> &'static str {
        "Game"
    }

    fn id(&self) -> Option<&AggregateId> {
        self.id.as_ref()
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn apply(&mut self, event: Self::Event) -> Result<(), Self::Error> {
        match event {
            GameEvent::GameStarted(data) => {
                self.id = Some(data.game_id);
                self.started_by = Some(data.started_by);
                self.rounds_in_game = data.rounds;
                self.policy = data.policy;
                self.state = GameState::Ongoing;
            }
            GameEvent::FirstPlayerJoined(data) => {
                self.first_player = Some(data.player);
            }
            GameEvent::SecondPlayerJoined(data) => {
                self.second_player = Some(data.player);
            }
            GameEvent::RoundStarted(data) => {
                self.rounds.push(Round::new(data.round_number));
            }
            GameEvent::MoveMade(data) => {
                let slot = self
                    .slot_of(&data.player)
                    .ok_or_else(|| GameError::UnknownPlayer {
                        player: data.player.clone(),
                    })?;
                let round = self
                    .rounds
                    .iter_mut()
                    .find(|round| round.number() == data.round_number)
                    .ok_or(GameError::UnknownRound {
                        round_number: data.round_number,
                    })?;
                round.play(slot, data.r#move);
            }
            GameEvent::RoundWon(_) | GameEvent::RoundTied(_) | GameEvent::RoundEnded(_) => {
                // Round outcome is derived from its moves
            }
            GameEvent::GameWon(data) => {
                self.state = GameState::Won;
                self.winner = Some(data.winner);
            }
            GameEvent::GameTied => {
                self.state = GameState::Tied;
            }
            GameEvent::GameEnded => {}
        }
        Ok(())
    }
}

// Query methods
impl Game {
    pub fn state(&self) -> GameState {
        self.state
    }

    /// Returns who created the game.
    pub fn started_by(&self) -> Option<&PlayerId> {
        self.started_by.as_ref()
    }

    pub fn first_player(&self) -> Option<&PlayerId> {
        self.first_player.as_ref()
    }

    pub fn second_player(&self) -> Option<&PlayerId> {
        self.second_player.as_ref()
    }

    /// Returns the player seated in `slot`.
    pub fn player_in(&self, slot: PlayerSlot) -> Option<&PlayerId> {
        match slot {
            PlayerSlot::First => self.first_player.as_ref(),
            PlayerSlot::Second => self.second_player.as_ref(),
        }
    }

    /// Returns the seat `player` occupies, if any.
    pub fn slot_of(&self, player: &PlayerId) -> Option<PlayerSlot> {
        if self.first_player.as_ref() == Some(player) {
            Some(PlayerSlot::First)
        } else if self.second_player.as_ref() == Some(player) {
            Some(PlayerSlot::Second)
        } else {
            None
        }
    }

    /// Returns the configured number of rounds.
    pub fn rounds_in_game(&self) -> u32 {
        self.rounds_in_game
    }

    pub fn policy(&self) -> TerminationPolicy {
        self.policy
    }

    /// Returns all rounds played or in progress, oldest first.
    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    /// Returns the most recent round.
    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    pub fn round(&self, round_number: u32) -> Option<&Round> {
        self.rounds.iter().find(|round| round.number() == round_number)
    }

    /// Returns how many rounds the player in `slot` has won.
    pub fn round_wins(&self, slot: PlayerSlot) -> u32 {
        self.rounds
            .iter()
            .filter(|round| round.winner() == Some(slot))
            .count() as u32
    }

    pub fn winner(&self) -> Option<&PlayerId> {
        self.winner.as_ref()
    }

    /// Returns true if the game is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Number of the round still waiting for a move, if any.
    fn open_round(&self) -> Option<u32> {
        self.current_round()
            .filter(|round| !round.is_ended())
            .map(Round::number)
    }

    fn seated(&self, slot: PlayerSlot) -> Result<&PlayerId, GameError> {
        self.player_in(slot).ok_or(GameError::EmptySeat { slot })
    }
}

// Command methods (return events)
impl Game {
    /// Decides any game command against the current state.
    pub fn handle(&self, command: &GameCommand) -> Result<Vec<GameEvent>, GameError> {
        match command {
            GameCommand::Start(cmd) => self.start(cmd),
            GameCommand::Move(cmd) => self.make_move(&cmd.player, cmd.r#move),
        }
    }

    /// Starts a new game.
    pub fn start(&self, cmd: &StartGame) -> Result<Vec<GameEvent>, GameError> {
        if !self.state.can_start() {
            return Err(GameError::InvalidState {
                current_state: self.state,
                action: "start game",
            });
        }

        if cmd.rounds == 0 {
            return Err(GameError::InvalidRounds { rounds: cmd.rounds });
        }

        Ok(vec![GameEvent::game_started(
            cmd.game_id.clone(),
            cmd.started_by.clone(),
            cmd.rounds,
            cmd.policy,
        )])
    }

    /// Makes a move for `player`, seating them first if they are new.
    ///
    /// Emits, in order: RoundStarted when no round is open, the join event
    /// for a new player, MoveMade, and then the round and game conclusions
    /// the move causes. A player who already moved in the open round gets no
    /// events.
    pub fn make_move(&self, player: &PlayerId, r#move: Move) -> Result<Vec<GameEvent>, GameError> {
        if !self.state.accepts_moves() {
            return Err(GameError::InvalidState {
                current_state: self.state,
                action: "make move",
            });
        }

        let seat = self.slot_of(player);
        if seat.is_none() && self.second_player.is_some() {
            return Err(GameError::Capacity {
                player: player.clone(),
            });
        }

        if let Some(slot) = seat
            && let Some(round_number) = self.open_round()
            && self
                .round(round_number)
                .is_some_and(|round| round.has_played(slot))
        {
            return Ok(vec![]);
        }

        // Fold every emitted event into a working copy so later decisions
        // see the state the earlier events produce.
        let mut game = self.clone();
        let mut events = Vec::new();

        let round_number = match self.open_round() {
            Some(number) => number,
            None => {
                let next = self.current_round().map_or(1, |round| round.number() + 1);
                game.record(&mut events, GameEvent::round_started(next))?;
                next
            }
        };

        if seat.is_none() {
            let joined = if self.first_player.is_none() {
                GameEvent::first_player_joined(player.clone())
            } else {
                GameEvent::second_player_joined(player.clone())
            };
            game.record(&mut events, joined)?;
        }

        game.record(
            &mut events,
            GameEvent::move_made(player.clone(), round_number, r#move),
        )?;

        let outcome = game
            .round(round_number)
            .ok_or(GameError::UnknownRound { round_number })?
            .outcome();

        let round_result = match outcome {
            RoundOutcome::Won(slot) => {
                GameEvent::round_won(round_number, game.seated(slot)?.clone())
            }
            RoundOutcome::Tied => GameEvent::round_tied(round_number),
            RoundOutcome::NotStarted | RoundOutcome::Ongoing => return Ok(events),
        };
        game.record(&mut events, round_result)?;
        game.record(&mut events, GameEvent::round_ended(round_number))?;

        if let Some(game_result) = game.game_result(round_number)? {
            game.record(&mut events, game_result)?;
            game.record(&mut events, GameEvent::GameEnded)?;
        }

        Ok(events)
    }

    /// Decides whether the game is over once `round_number` has ended.
    fn game_result(&self, round_number: u32) -> Result<Option<GameEvent>, GameError> {
        let first_wins = self.round_wins(PlayerSlot::First);
        let second_wins = self.round_wins(PlayerSlot::Second);

        if self.policy() == TerminationPolicy::BestOf {
            let majority = self.rounds_in_game / 2;
            if first_wins > majority {
                return Ok(Some(GameEvent::game_won(self.seated(PlayerSlot::First)?.clone())));
            }
            if second_wins > majority {
                return Ok(Some(GameEvent::game_won(self.seated(PlayerSlot::Second)?.clone())));
            }
        }

        if round_number < self.rounds_in_game {
            return Ok(None);
        }

        let result = match first_wins.cmp(&second_wins) {
            Ordering::Equal => GameEvent::GameTied,
            Ordering::Greater => GameEvent::game_won(self.seated(PlayerSlot::First)?.clone()),
            Ordering::Less => GameEvent::game_won(self.seated(PlayerSlot::Second)?.clone()),
        };
        Ok(Some(result))
    }

    fn record(&mut self, events: &mut Vec<GameEvent>, event: GameEvent) -> Result<(), GameError> {
        self.apply(event.clone())?;
        events.push(event);
        Ok(())
    }
}
