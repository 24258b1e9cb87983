use crate::models::{BowlGameId, GameId, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Failures surfaced by the backing store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("row not found")]
    RowNotFound,
}

/// Failures surfaced directly by engine operations. Per-item failures in
/// batch operations are reported as [`Rejection`]s instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("game {0} not found")]
    GameNotFound(GameId),
    #[error("bowl game {0} not found")]
    BowlGameNotFound(BowlGameId),
    #[error("user {0} not found")]
    UserNotFound(UserId),
    /// Batch-level precondition failure; nothing was written
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why one selection in a submission batch was rejected. The rest of the
/// batch is unaffected.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    #[error("game {game_id} not found")]
    GameNotFound { game_id: GameId },
    #[error("game {game_id} locked since kickoff at {kickoff}")]
    Locked {
        game_id: GameId,
        kickoff: DateTime<Utc>,
    },
    #[error("{team} is not playing in game {game_id}")]
    InvalidTeam { game_id: GameId, team: String },
    #[error("{team} is not a valid outright pick for game {game_id}")]
    InvalidOutrightTeam { game_id: GameId, team: String },
}
