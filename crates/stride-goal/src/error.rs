// error.rs — Error taxonomy for the goal lifecycle.
//
// Validation and state-machine errors abort a command before anything is
// persisted. `Event` covers only the synchronous leg of publishing (payload
// serialization); asynchronous broker failures never become a GoalError.

use thiserror::Error;
use uuid::Uuid;

use stride_events::EventError;

/// Errors that can occur during goal lifecycle operations.
#[derive(Debug, Error)]
pub enum GoalError {
    /// A goal draft or patch violated an entity invariant.
    #[error("invalid goal: {reason}")]
    InvalidGoal { reason: String },

    /// Progress increments must be positive.
    #[error("invalid increment {0}: must be positive")]
    InvalidIncrement(i64),

    /// The requested goal does not exist.
    #[error("goal not found: {0}")]
    NotFound(Uuid),

    /// Mutation attempted against a goal that already completed.
    #[error("goal {0} is already completed")]
    AlreadyCompleted(Uuid),

    /// Mutation attempted against a goal that was canceled.
    #[error("goal {0} is already canceled")]
    AlreadyCanceled(Uuid),

    /// Redundant start command against a goal already in progress.
    #[error("goal {0} is already in progress")]
    AlreadyInProgress(Uuid),

    /// A concurrent writer updated the goal first; reload and retry.
    #[error("version conflict on goal {goal_id}: expected {expected}, stored {actual}")]
    VersionConflict {
        goal_id: Uuid,
        expected: u64,
        actual: u64,
    },

    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Failed to serialize/deserialize goal data.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The synchronous leg of event publishing failed.
    #[error("event publish error: {0}")]
    Event(#[from] EventError),
}
