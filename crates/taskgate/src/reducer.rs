/*
[INPUT]:  Dispatched actions and the previous slice state.
[OUTPUT]: New slice state per the task lifecycle; identity for foreign actions.
[POS]:    Pure transition layer - no IO, no clocks, no registry.
[UPDATE]: When lifecycle fields or transition rules change.
*/

use serde_json::Value;

use crate::action::{Action, ActionKind};
use crate::key::StateKey;
use crate::state::{CheckState, TaskMeta, TaskState};

pub(crate) const CHECK_SEGMENT: &str = "check";
pub(crate) const TASK_SEGMENT: &str = "task";

/// A pure state transition: `(previous, action) -> next`.
///
/// `None` stands for state that does not exist yet; reducers answer it with
/// their default so composed roots materialize without dispatching anything.
pub trait Reducer {
    type State;

    fn initial_state(&self) -> Self::State;
    fn reduce(&self, state: Option<&Self::State>, action: &Action) -> Self::State;
}

/// Reducer for a single task slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReducer {
    state_key: StateKey,
}

impl TaskReducer {
    pub fn new(state_key: StateKey) -> Self {
        Self { state_key }
    }

    pub fn state_key(&self) -> &StateKey {
        &self.state_key
    }
}

impl Reducer for TaskReducer {
    type State = TaskState;

    fn initial_state(&self) -> TaskState {
        TaskState::initial(self.state_key.clone())
    }

    fn reduce(&self, state: Option<&TaskState>, action: &Action) -> TaskState {
        let current = match state {
            Some(state) => state.clone(),
            None => self.initial_state(),
        };

        // Only actions declaring this exact key mutate the slice.
        if *action.state_key() != self.state_key {
            return current;
        }

        match action.kind() {
            ActionKind::Performing => TaskState {
                meta: TaskMeta {
                    performing: true,
                    complete: false,
                    timing: None,
                },
                results: Value::Null,
                ..current
            },
            ActionKind::Complete => {
                let performance = action.performance();
                TaskState {
                    meta: TaskMeta {
                        performing: false,
                        complete: true,
                        timing: performance.timing.clone(),
                    },
                    results: performance.results.clone(),
                    ..current
                }
            }
        }
    }
}

/// Reducer composing the `<key>.check` and `<key>.task` sub-slices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReducer {
    check: TaskReducer,
    task: TaskReducer,
}

impl CheckReducer {
    pub fn new(state_key: StateKey) -> Self {
        Self {
            check: TaskReducer::new(state_key.child_fixed(CHECK_SEGMENT)),
            task: TaskReducer::new(state_key.child_fixed(TASK_SEGMENT)),
        }
    }

    pub fn check_key(&self) -> &StateKey {
        self.check.state_key()
    }

    pub fn task_key(&self) -> &StateKey {
        self.task.state_key()
    }
}

impl Reducer for CheckReducer {
    type State = CheckState;

    fn initial_state(&self) -> CheckState {
        CheckState {
            check: self.check.initial_state(),
            task: self.task.initial_state(),
        }
    }

    fn reduce(&self, state: Option<&CheckState>, action: &Action) -> CheckState {
        CheckState {
            check: self.check.reduce(state.map(|s| &s.check), action),
            task: self.task.reduce(state.map(|s| &s.task), action),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::state::{Performance, Timing};

    fn key(path: &str) -> StateKey {
        StateKey::new(path).unwrap()
    }

    fn performance(results: Value) -> Performance {
        Performance {
            timing: Some(Timing {
                started: Utc::now(),
                duration: Duration::from_millis(7),
            }),
            results,
        }
    }

    #[test]
    fn reduces_missing_state_to_the_default() {
        let reducer = TaskReducer::new(key("sync"));
        let state = reducer.reduce(None, &Action::performing(key("other")));
        assert_eq!(state, reducer.initial_state());
    }

    #[test]
    fn performing_action_marks_performing_and_clears_results() {
        let reducer = TaskReducer::new(key("sync"));
        let mut previous = reducer.initial_state();
        previous.meta.complete = true;
        previous.results = json!({"stale": true});

        let state = reducer.reduce(Some(&previous), &Action::performing(key("sync")));
        assert!(state.meta.performing);
        assert!(!state.meta.complete);
        assert!(state.meta.timing.is_none());
        assert_eq!(state.results, Value::Null);
    }

    #[test]
    fn complete_action_records_results_and_timing() {
        let reducer = TaskReducer::new(key("sync"));
        let performing = reducer.reduce(None, &Action::performing(key("sync")));

        let state = reducer.reduce(
            Some(&performing),
            &Action::complete(key("sync"), performance(json!({"rows": 3}))),
        );
        assert!(!state.meta.performing);
        assert!(state.meta.complete);
        assert!(state.meta.timing.is_some());
        assert_eq!(state.results, json!({"rows": 3}));
    }

    #[test]
    fn foreign_key_action_leaves_state_unchanged() {
        let reducer = TaskReducer::new(key("sync"));
        let previous = reducer.reduce(None, &Action::performing(key("sync")));

        let state = reducer.reduce(Some(&previous), &Action::performing(key("other")));
        assert_eq!(state, previous);
    }

    #[test]
    fn parent_key_does_not_match_child_slice() {
        let reducer = TaskReducer::new(key("sync.check"));
        let previous = reducer.initial_state();

        let state = reducer.reduce(Some(&previous), &Action::performing(key("sync")));
        assert_eq!(state, previous);
    }

    #[test]
    fn check_reducer_keys_sub_slices() {
        let reducer = CheckReducer::new(key("sync"));
        assert_eq!(reducer.check_key().to_string(), "sync.check");
        assert_eq!(reducer.task_key().to_string(), "sync.task");
    }

    #[test]
    fn check_reducer_default_state_reachable_without_dispatch() {
        let reducer = CheckReducer::new(key("sync"));
        let state = reducer.initial_state();
        assert_eq!(state.check.state_key.to_string(), "sync.check");
        assert_eq!(state.task.state_key.to_string(), "sync.task");
        assert!(!state.check.meta.performing);
        assert!(!state.task.meta.complete);
    }

    #[test]
    fn check_reducer_routes_actions_to_sub_slices() {
        let reducer = CheckReducer::new(key("sync"));
        let initial = reducer.initial_state();

        let after_check = reducer.reduce(
            Some(&initial),
            &Action::complete(key("sync.check"), performance(json!(true))),
        );
        assert!(after_check.check.meta.complete);
        assert_eq!(after_check.check.results, json!(true));
        assert_eq!(after_check.task, initial.task);

        let after_task = reducer.reduce(
            Some(&after_check),
            &Action::performing(key("sync.task")),
        );
        assert_eq!(after_task.check, after_check.check);
        assert!(after_task.task.meta.performing);
    }
}
