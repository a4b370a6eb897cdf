/*
[INPUT]:  Key validation failures, wiring mismatches, task function errors.
[OUTPUT]: Crate error type with helper predicates and a Result alias.
[POS]:    Error layer - everything fallible in the crate returns these.
[UPDATE]: When adding new failure categories.
*/

use thiserror::Error;

use crate::key::{KeyError, StateKey};

/// Boxed error carried out of user task and check functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by stores and dispatched actions.
#[derive(Debug, Error)]
pub enum TaskGateError {
    #[error("invalid state key: {0}")]
    Key(#[from] KeyError),

    #[error("no task slice for state key '{state_key}' in the root state")]
    UnknownStateKey { state_key: StateKey },

    #[error("task for state key '{state_key}' failed: {source}")]
    Task {
        state_key: StateKey,
        #[source]
        source: BoxError,
    },
}

impl TaskGateError {
    /// Key the failure relates to, when one is known.
    pub fn state_key(&self) -> Option<&StateKey> {
        match self {
            TaskGateError::Key(_) => None,
            TaskGateError::UnknownStateKey { state_key } => Some(state_key),
            TaskGateError::Task { state_key, .. } => Some(state_key),
        }
    }

    /// True for wiring mismatches between action keys and the root reducer.
    pub fn is_unknown_state_key(&self) -> bool {
        matches!(self, TaskGateError::UnknownStateKey { .. })
    }

    /// True when the task or check function itself failed.
    pub fn is_task_failure(&self) -> bool {
        matches!(self, TaskGateError::Task { .. })
    }
}

pub type Result<T> = std::result::Result<T, TaskGateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_state_key() {
        let error = TaskGateError::UnknownStateKey {
            state_key: StateKey::new("sync.task").unwrap(),
        };
        assert!(error.to_string().contains("sync.task"));
        assert_eq!(error.state_key().unwrap().to_string(), "sync.task");
    }

    #[test]
    fn test_task_failure_keeps_source() {
        let source: BoxError = "backend unavailable".into();
        let error = TaskGateError::Task {
            state_key: StateKey::new("sync").unwrap(),
            source,
        };
        assert!(error.is_task_failure());
        assert!(error.to_string().contains("backend unavailable"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_key_error_converts() {
        let error: TaskGateError = StateKey::new("a..b").unwrap_err().into();
        assert!(matches!(error, TaskGateError::Key(_)));
        assert!(error.state_key().is_none());
        assert!(!error.is_unknown_state_key());
    }
}
