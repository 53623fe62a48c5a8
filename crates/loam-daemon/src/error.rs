//! Wire-visible errors.

use loam_naming::LoadError;
use serde::{Deserialize, Serialize};

/// Errors a response can carry.
///
/// Backlog failures are deliberately absent: they are logged and swallowed.
/// Transport failures never reach the wire; they terminate the loop.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum DaemonError {
    /// The saved-state loader failed.
    #[error("failed to initialize: {0}")]
    InitLoadFailure(#[from] LoadError),

    /// Anything else that went wrong during initialize.
    #[error("failed to initialize: {debug}")]
    InitUncaught { debug: String },

    /// A message arrived in a state that does not accept it.
    #[error("{message}")]
    WrongState { state: String, message: String },

    /// A handler failed while processing an accepted request. The daemon
    /// stays up.
    #[error("request failed: {debug}")]
    HandlerUncaught { debug: String },
}

impl DaemonError {
    pub fn not_yet_initialized() -> Self {
        Self::WrongState {
            state: "initializing".to_string(),
            message: "not yet initialized".to_string(),
        }
    }

    pub fn already_initialized() -> Self {
        Self::WrongState {
            state: "initialized".to_string(),
            message: "already initialized".to_string(),
        }
    }
}
