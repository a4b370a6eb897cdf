/*
[INPUT]:  Lifecycle actions applied by reducers; wire JSON payloads.
[OUTPUT]: Task/check slice shapes with camelCase serde and slice lookup.
[POS]:    Data model - the state carried by the store and reported by runs.
[UPDATE]: When the wire shape or lifecycle fields change.
*/

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::key::StateKey;

/// Wall-clock timing of one completed run.
///
/// `started` crosses the wire as RFC 3339, `duration` as integer milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    pub started: DateTime<Utc>,
    #[serde(with = "serde_helpers::duration_millis")]
    pub duration: Duration,
}

/// Timing and results of one run: the payload a complete action carries, and
/// the snapshot reconstructed from a completed slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    pub timing: Option<Timing>,
    pub results: Value,
}

impl Performance {
    /// Payload of a performing action: nothing measured yet.
    pub fn empty() -> Self {
        Self {
            timing: None,
            results: Value::Null,
        }
    }
}

/// Lifecycle flags of one task slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskMeta {
    pub performing: bool,
    pub complete: bool,
    pub timing: Option<Timing>,
}

/// One task's slice of the state tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskState {
    pub state_key: StateKey,
    pub meta: TaskMeta,
    pub results: Value,
}

impl TaskState {
    /// Default slice for a key: not performing, not complete, nothing measured.
    pub fn initial(state_key: StateKey) -> Self {
        Self {
            state_key,
            meta: TaskMeta {
                performing: false,
                complete: false,
                timing: None,
            },
            results: Value::Null,
        }
    }

    /// Performance of the last completed run, if the slice ever completed.
    pub fn performance(&self) -> Option<Performance> {
        self.meta.complete.then(|| Performance {
            timing: self.meta.timing.clone(),
            results: self.results.clone(),
        })
    }
}

/// Combined state of a gated task: the check slice and the task slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckState {
    pub check: TaskState,
    pub task: TaskState,
}

/// Lookup of a task slice by full key inside an arbitrary root state.
///
/// Root states compose by delegating to their fields; `TaskState` and
/// `CheckState` terminate the recursion.
pub trait TaskSlices {
    fn task_state(&self, key: &StateKey) -> Option<&TaskState>;
}

impl TaskSlices for TaskState {
    fn task_state(&self, key: &StateKey) -> Option<&TaskState> {
        (self.state_key == *key).then_some(self)
    }
}

impl TaskSlices for CheckState {
    fn task_state(&self, key: &StateKey) -> Option<&TaskState> {
        self.check
            .task_state(key)
            .or_else(|| self.task.task_state(key))
    }
}

mod serde_helpers {
    pub mod duration_millis {
        use std::time::Duration;

        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_u64(duration.as_millis() as u64)
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
        where
            D: Deserializer<'de>,
        {
            let millis = u64::deserialize(deserializer)?;
            Ok(Duration::from_millis(millis))
        }
    }
}
