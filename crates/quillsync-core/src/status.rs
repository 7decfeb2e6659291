//! Shared status taxonomy for remote operations and tasks
//!
//! Every backend adapter translates its native errors into [`OpStatus`],
//! the single status space the rest of the system reasons about. The
//! engine's readiness is an ordered [`EngineStatus`] level; tasks carry a
//! [`TaskStatus`] lifecycle.

use thiserror::Error;

// ============================================================================
// OpStatus - normalized operation outcome
// ============================================================================

/// Normalized outcome of a remote operation
///
/// Backend adapters own the mapping from their native error types into
/// this enumeration; nothing above the adapter layer sees backend errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpStatus {
    /// The operation succeeded
    Ok,
    /// The backend host could not be resolved
    UnknownHost,
    /// The connection could not be established or was dropped
    ConnectError,
    /// The backend rejected the credentials or denied permission
    AuthError,
    /// The requested remote path does not exist
    PathNotFound,
    /// Any other failure
    OtherError,
}

impl OpStatus {
    /// True only for [`OpStatus::Ok`]
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, OpStatus::Ok)
    }

    /// True for reachability-related failures: unknown host, connect
    /// failures, and authentication errors
    #[must_use]
    pub fn is_network_error(self) -> bool {
        matches!(
            self,
            OpStatus::UnknownHost | OpStatus::ConnectError | OpStatus::AuthError
        )
    }
}

impl std::fmt::Display for OpStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OpStatus::Ok => "ok",
            OpStatus::UnknownHost => "unknown host",
            OpStatus::ConnectError => "connect error",
            OpStatus::AuthError => "auth error",
            OpStatus::PathNotFound => "path not found",
            OpStatus::OtherError => "other error",
        };
        f.write_str(s)
    }
}

// ============================================================================
// TaskError / TaskResult
// ============================================================================

/// A failed remote operation, carrying its normalized status and a message
///
/// Replaces a parallel result-class hierarchy with one closed error type:
/// successful operations return their payload, failures return this.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{status}: {message}")]
pub struct TaskError {
    /// The normalized status; never [`OpStatus::Ok`]
    pub status: OpStatus,
    /// Human-readable detail from the backend
    pub message: String,
}

impl TaskError {
    /// Creates a new error with the given status and message
    pub fn new(status: OpStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Shorthand for an [`OpStatus::OtherError`]
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(OpStatus::OtherError, message)
    }

    /// Shorthand for an [`OpStatus::PathNotFound`]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(OpStatus::PathNotFound, message)
    }

    /// True for reachability-related failures
    #[must_use]
    pub fn is_network_error(&self) -> bool {
        self.status.is_network_error()
    }
}

/// Result of a remote operation or task
pub type TaskResult<T> = Result<T, TaskError>;

/// Collapses [`OpStatus::PathNotFound`] into `Ok(None)`.
///
/// "The thing we tried to fetch simply isn't there yet" is a normal,
/// recoverable condition during a sync pass, not an error.
pub fn tolerate_not_found<T>(result: TaskResult<T>) -> TaskResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.status == OpStatus::PathNotFound => Ok(None),
        Err(err) => Err(err),
    }
}

// ============================================================================
// EngineStatus - ordered readiness levels
// ============================================================================

/// Readiness level of an engine
///
/// Not a state machine with fixed transitions: the level doubles as the
/// current confidence in backend reachability and as the gate threshold
/// tasks wait for (`status >= trigger`). Mutated only through the engine's
/// transition methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum EngineStatus {
    /// The backend is not selected in preferences
    Disabled = 0,
    /// A connection probe is currently running
    Testing = 1,
    /// Configured but not yet verified
    Ready = 2,
    /// The last probe failed with a non-auth error
    Error = 3,
    /// The last probe failed with an authentication error
    AuthError = 4,
    /// The last probe confirmed both required remote directories
    Ok = 5,
}

impl std::fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EngineStatus::Disabled => "disabled",
            EngineStatus::Testing => "testing",
            EngineStatus::Ready => "ready",
            EngineStatus::Error => "error",
            EngineStatus::AuthError => "auth error",
            EngineStatus::Ok => "ok",
        };
        f.write_str(s)
    }
}

// ============================================================================
// TaskStatus - per-task lifecycle
// ============================================================================

/// Lifecycle of a single gated task
///
/// `Waiting -> Running -> Finished`, or `Waiting -> Cancelled` if the task
/// is cancelled before its gate opens. A running task cannot be preempted;
/// `Finished` is reached exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Created, gate not yet satisfied
    Waiting,
    /// Gate satisfied, operation in flight
    Running,
    /// Cancelled before the gate opened; never ran
    Cancelled,
    /// Completed (successfully or not) and notified
    Finished,
}

impl TaskStatus {
    /// True for [`TaskStatus::Cancelled`] and [`TaskStatus::Finished`]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Cancelled | TaskStatus::Finished)
    }
}
