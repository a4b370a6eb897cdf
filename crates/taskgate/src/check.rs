/*
[INPUT]:  A state key, a boolean check function, a task function, and options.
[OUTPUT]: The check-then-task workflow over `<key>.check` / `<key>.task`.
[POS]:    Action layer - gates one task behind one check per dispatch.
[UPDATE]: When gating rules, option defaults, or the report shape change.
*/

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{BoxError, Result, TaskGateError};
use crate::key::StateKey;
use crate::reducer::{CHECK_SEGMENT, TASK_SEGMENT};
use crate::state::{TaskSlices, TaskState};
use crate::store::{TaskStore, Thunk};
use crate::task::{TaskAction, TaskFn, TaskRun};

/// Gating behavior of a [`CheckAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckOptions {
    /// Skip the check once its slice is complete.
    pub check_only_once: bool,
    /// Run the task in the same dispatch when the check passes. On by
    /// default; turn off to have the report carry an unperformed task the
    /// caller dispatches later.
    pub auto_perform_task: bool,
    /// Skip the task once its slice is complete.
    pub task_only_once: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            check_only_once: false,
            auto_perform_task: true,
            task_only_once: false,
        }
    }
}

/// Report of one check-action dispatch: the check run and the task run.
///
/// Every branch reports this shape, short-circuits included; a branch that
/// never reached the task carries it as `Unperformed` with whatever prior
/// performance the slice held.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRun {
    pub check: TaskRun,
    pub task: TaskRun,
}

impl CheckRun {
    /// True when the check ran this dispatch and resolved truthy.
    pub fn check_passed(&self) -> bool {
        self.check.results().is_some_and(truthy)
    }

    /// True when the task ran to completion during this dispatch.
    pub fn task_performed(&self) -> bool {
        self.task.is_performed()
    }
}

// Check functions are typed bool, so a slice holds Bool or Null; anything
// else arrived through an externally dispatched complete action.
fn truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

/// Dispatchable thunk sequencing a gating check before a task.
///
/// The check runs as a task under `<key>.check` with its boolean result stored
/// as that slice's results; the main task lives under `<key>.task` and runs
/// only when the check resolves truthy.
pub struct CheckAction<S> {
    state_key: StateKey,
    check_key: StateKey,
    task_key: StateKey,
    options: CheckOptions,
    check: TaskFn<S>,
    task: TaskFn<S>,
}

impl<S> Clone for CheckAction<S> {
    fn clone(&self) -> Self {
        Self {
            state_key: self.state_key.clone(),
            check_key: self.check_key.clone(),
            task_key: self.task_key.clone(),
            options: self.options,
            check: Arc::clone(&self.check),
            task: Arc::clone(&self.task),
        }
    }
}

impl<S> fmt::Debug for CheckAction<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckAction")
            .field("state_key", &self.state_key)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<S> CheckAction<S>
where
    S: TaskSlices + Clone + Send + Sync + 'static,
{
    pub fn new<C, CFut, F, Fut>(state_key: StateKey, check: C, task: F) -> Self
    where
        C: Fn(TaskStore<S>) -> CFut + Send + Sync + 'static,
        CFut: Future<Output = std::result::Result<bool, BoxError>> + Send + 'static,
        F: Fn(TaskStore<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Value, BoxError>> + Send + 'static,
    {
        let check: TaskFn<S> = Arc::new(move |store| {
            let fut = check(store);
            Box::pin(async move { fut.await.map(Value::Bool) })
        });
        let task: TaskFn<S> = Arc::new(move |store| Box::pin(task(store)));

        Self {
            check_key: state_key.child_fixed(CHECK_SEGMENT),
            task_key: state_key.child_fixed(TASK_SEGMENT),
            state_key,
            options: CheckOptions::default(),
            check,
            task,
        }
    }

    pub fn options(mut self, options: CheckOptions) -> Self {
        self.options = options;
        self
    }

    pub fn state_key(&self) -> &StateKey {
        &self.state_key
    }

    /// The main task as a standalone action, keyed `<key>.task`.
    ///
    /// For the non-auto flow: dispatch the check action first, then dispatch
    /// this once the report says the check passed.
    pub fn task_action(&self) -> TaskAction<S> {
        TaskAction::from_task_fn(
            self.task_key.clone(),
            self.options.task_only_once,
            Arc::clone(&self.task),
        )
    }

    /// Execute the two-step workflow against `store`.
    pub async fn perform(&self, store: &TaskStore<S>) -> Result<CheckRun> {
        let check_slice = self.slice(store, &self.check_key)?;
        let task_slice = self.slice(store, &self.task_key)?;

        // Snapshot short-circuit before touching the check at all.
        if check_slice.meta.performing
            || (self.options.check_only_once && check_slice.meta.complete)
        {
            debug!(
                state_key = %self.state_key,
                performing = check_slice.meta.performing,
                complete = check_slice.meta.complete,
                "check already performed; skipping workflow"
            );
            return Ok(CheckRun {
                check: TaskRun::already_performed(
                    self.check_key.clone(),
                    self.options.check_only_once,
                    check_slice.performance(),
                ),
                task: TaskRun::unperformed(
                    self.task_key.clone(),
                    self.options.task_only_once,
                    task_slice.performance(),
                ),
            });
        }

        let check_action = TaskAction::from_task_fn(
            self.check_key.clone(),
            self.options.check_only_once,
            Arc::clone(&self.check),
        );
        let check_run = check_action.perform(store).await?;

        if !check_run.results().is_some_and(truthy) {
            info!(state_key = %self.state_key, "check resolved falsy; task gated");
            return Ok(CheckRun {
                check: check_run,
                task: self.unperformed_task(store)?,
            });
        }

        if !self.options.auto_perform_task {
            debug!(state_key = %self.state_key, "check passed; task left to the caller");
            return Ok(CheckRun {
                check: check_run,
                task: self.unperformed_task(store)?,
            });
        }

        let task_run = self.task_action().perform(store).await?;
        Ok(CheckRun {
            check: check_run,
            task: task_run,
        })
    }

    fn slice(&self, store: &TaskStore<S>, key: &StateKey) -> Result<TaskState> {
        store
            .task_state(key)
            .ok_or_else(|| TaskGateError::UnknownStateKey {
                state_key: key.clone(),
            })
    }

    fn unperformed_task(&self, store: &TaskStore<S>) -> Result<TaskRun> {
        let slice = self.slice(store, &self.task_key)?;
        Ok(TaskRun::unperformed(
            self.task_key.clone(),
            self.options.task_only_once,
            slice.performance(),
        ))
    }
}

#[async_trait]
impl<S> Thunk<S> for CheckAction<S>
where
    S: TaskSlices + Clone + Send + Sync + 'static,
{
    type Output = CheckRun;

    async fn run(&self, store: &TaskStore<S>) -> Result<CheckRun> {
        self.perform(store).await
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::task::TaskOutcome;

    fn key(path: &str) -> StateKey {
        StateKey::new(path).unwrap()
    }

    #[rstest]
    #[case(json!(true), true)]
    #[case(json!(false), false)]
    #[case(json!(null), false)]
    #[case(json!({"ok": true}), true)]
    #[case(json!(0), true)]
    #[case(json!(""), true)]
    fn truthiness_of_check_results(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(truthy(&value), expected);
    }

    #[test]
    fn options_default_to_auto_perform_only() {
        let options = CheckOptions::default();
        assert!(!options.check_only_once);
        assert!(options.auto_perform_task);
        assert!(!options.task_only_once);
    }

    #[test]
    fn options_deserialize_with_field_defaults() {
        let options: CheckOptions =
            serde_json::from_value(json!({"checkOnlyOnce": true})).unwrap();
        assert!(options.check_only_once);
        assert!(options.auto_perform_task);
        assert!(!options.task_only_once);

        let options: CheckOptions =
            serde_json::from_value(json!({"autoPerformTask": false})).unwrap();
        assert!(!options.auto_perform_task);
    }

    #[test]
    fn action_derives_sub_keys_from_its_key() {
        let action: CheckAction<TaskState> = CheckAction::new(
            key("sync.users"),
            |_| async { Ok(true) },
            |_| async { Ok(json!(1)) },
        );
        assert_eq!(action.state_key().to_string(), "sync.users");
        assert_eq!(action.task_action().state_key().to_string(), "sync.users.task");
    }

    #[test]
    fn run_report_exposes_gating_outcome() {
        let run = CheckRun {
            check: TaskRun::performed(
                key("sync.check"),
                false,
                crate::state::Performance {
                    timing: None,
                    results: json!(false),
                },
            ),
            task: TaskRun::unperformed(key("sync.task"), false, None),
        };
        assert!(!run.check_passed());
        assert!(!run.task_performed());
        assert!(matches!(run.task.outcome, TaskOutcome::Unperformed(None)));
    }
}
