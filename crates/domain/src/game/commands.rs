//! Game commands.

use common::AggregateId;

use crate::command::Command;

use super::{Game, Move, PlayerId, TerminationPolicy};

/// Number of rounds used when the caller does not choose.
pub const DEFAULT_ROUNDS: u32 = 3;

/// Command to create a new game.
#[derive(Debug, Clone)]
pub struct StartGame {
    /// The game ID to create. Chosen by the caller.
    pub game_id: AggregateId,

    /// The player creating the game.
    pub started_by: PlayerId,

    /// Number of rounds to play; must be at least 1.
    pub rounds: u32,

    /// When the game is decided.
    pub policy: TerminationPolicy,
}

impl StartGame {
    /// Creates a StartGame command with the default best-of policy.
    pub fn new(
        game_id: impl Into<AggregateId>,
        started_by: impl Into<PlayerId>,
        rounds: u32,
    ) -> Self {
        Self {
            game_id: game_id.into(),
            started_by: started_by.into(),
            rounds,
            policy: TerminationPolicy::default(),
        }
    }

    /// Sets when the game is decided.
    pub fn with_policy(mut self, policy: TerminationPolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Command for StartGame {
    type Aggregate = Game;

    fn aggregate_id(&self) -> &AggregateId {
        &self.game_id
    }
}

/// Command for a player to make a move, joining the game if needed.
#[derive(Debug, Clone)]
pub struct MakeMove {
    /// The game to play in.
    pub game_id: AggregateId,

    /// The player making the move.
    pub player: PlayerId,

    /// The chosen move.
    pub r#move: Move,
}

impl MakeMove {
    /// Creates a new MakeMove command.
    pub fn new(game_id: impl Into<AggregateId>, player: impl Into<PlayerId>, r#move: Move) -> Self {
        Self {
            game_id: game_id.into(),
            player: player.into(),
            r#move,
        }
    }
}

impl Command for MakeMove {
    type Aggregate = Game;

    fn aggregate_id(&self) -> &AggregateId {
        &self.game_id
    }
}

/// Any command a game accepts.
#[derive(Debug, Clone)]
pub enum GameCommand {
    Start(StartGame),
    Move(MakeMove),
}

impl Command for GameCommand {
    type Aggregate = Game;

    fn aggregate_id(&self) -> &AggregateId {
        match self {
            GameCommand::Start(cmd) => cmd.aggregate_id(),
            GameCommand::Move(cmd) => cmd.aggregate_id(),
        }
    }
}

impl From<StartGame> for GameCommand {
    fn from(cmd: StartGame) -> Self {
        GameCommand::Start(cmd)
    }
}

impl From<MakeMove> for GameCommand {
    fn from(cmd: MakeMove) -> Self {
        GameCommand::Move(cmd)
    }
}
