/*
[INPUT]:  Test root-state requirements
[OUTPUT]: Shared demo state, reducer, and store helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for taskgate tests

use taskgate::{
    Action, CheckReducer, CheckState, Reducer, StateKey, TaskReducer, TaskSlices, TaskState,
    TaskStore,
};

/// Demo application state: one plain task slice plus one gated task.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoState {
    pub warmup: TaskState,
    pub sync: CheckState,
}

impl TaskSlices for DemoState {
    fn task_state(&self, key: &StateKey) -> Option<&TaskState> {
        self.warmup
            .task_state(key)
            .or_else(|| self.sync.task_state(key))
    }
}

/// Root reducer composing the demo slices, keyed `warmup` and `sync`.
pub struct DemoReducer {
    warmup: TaskReducer,
    sync: CheckReducer,
}

impl DemoReducer {
    pub fn new() -> Self {
        Self {
            warmup: TaskReducer::new(key("warmup")),
            sync: CheckReducer::new(key("sync")),
        }
    }
}

impl Reducer for DemoReducer {
    type State = DemoState;

    fn initial_state(&self) -> DemoState {
        DemoState {
            warmup: self.warmup.initial_state(),
            sync: self.sync.initial_state(),
        }
    }

    fn reduce(&self, state: Option<&DemoState>, action: &Action) -> DemoState {
        DemoState {
            warmup: self.warmup.reduce(state.map(|s| &s.warmup), action),
            sync: self.sync.reduce(state.map(|s| &s.sync), action),
        }
    }
}

pub fn key(path: &str) -> StateKey {
    StateKey::new(path).unwrap()
}

pub fn demo_store() -> TaskStore<DemoState> {
    TaskStore::new(DemoReducer::new())
}
