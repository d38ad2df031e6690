use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Manual session already active (spin {spin_id})")]
    SessionAlreadyActive { spin_id: u64 },

    #[error("No manual session active")]
    NoActiveSession,

    #[error("Manual session not finished: {stopped} of {total} reels confirmed")]
    SessionNotFinished { stopped: usize, total: usize },

    #[error("Column {column} out of range (machine has {columns} columns)")]
    ColumnOutOfRange { column: usize, columns: usize },

    #[error("Reel {column} has not stopped yet")]
    ReelNotStopped { column: usize },

    #[error("No spins remaining")]
    NoSpinsRemaining,

    #[error("Round is not active")]
    RoundNotActive,

    #[error("Fight is not active")]
    FightNotActive,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SlotResult<T> = Result<T, SlotError>;
