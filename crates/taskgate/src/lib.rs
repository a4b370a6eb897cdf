/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public taskgate crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod action;
pub mod check;
pub mod error;
pub mod key;
pub mod reducer;
pub mod registry;
pub mod state;
pub mod store;
pub mod task;

// Re-export the key types
pub use key::{KeyError, KeyScope, StateKey};

// Re-export the state model
pub use state::{CheckState, Performance, TaskMeta, TaskSlices, TaskState, Timing};

// Re-export actions and reducers
pub use action::{Action, ActionKind, ActionTypeMismatch};
pub use reducer::{CheckReducer, Reducer, TaskReducer};

// Re-export the store and run layer
pub use check::{CheckAction, CheckOptions, CheckRun};
pub use error::{BoxError, Result, TaskGateError};
pub use registry::{InFlightGuard, InFlightRegistry};
pub use store::{TaskStore, Thunk};
pub use task::{BoxFuture, TaskAction, TaskFn, TaskOutcome, TaskRun};
