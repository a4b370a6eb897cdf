/*
[INPUT]:  A state key, an async task function, and the owning store.
[OUTPUT]: Performing/complete dispatches plus a normalized TaskRun report.
[POS]:    Action layer - executes one tracked unit of work per dispatch.
[UPDATE]: When run gating, timing capture, or the report shape change.
*/

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::action::Action;
use crate::error::{BoxError, Result, TaskGateError};
use crate::key::StateKey;
use crate::state::{Performance, TaskSlices, Timing};
use crate::store::{TaskStore, Thunk};

/// Boxed future returned by task and check functions.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

/// Async task function: receives a store handle, resolves to its results.
pub type TaskFn<S> =
    Arc<dyn Fn(TaskStore<S>) -> BoxFuture<std::result::Result<Value, BoxError>> + Send + Sync>;

/// How one dispatch of a task action concluded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "performance", rename_all = "camelCase")]
pub enum TaskOutcome {
    /// The task ran to completion during this dispatch.
    Performed(Performance),
    /// A run was in flight or `only_once` blocked a rerun; the prior
    /// performance rides along when the slice ever completed.
    AlreadyPerformed(Option<Performance>),
    /// The task was deliberately not started (check gating, auto-run off).
    Unperformed(Option<Performance>),
}

/// Report of one task-action dispatch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRun {
    pub state_key: StateKey,
    pub only_once: bool,
    #[serde(flatten)]
    pub outcome: TaskOutcome,
}

impl TaskRun {
    pub(crate) fn performed(state_key: StateKey, only_once: bool, performance: Performance) -> Self {
        Self {
            state_key,
            only_once,
            outcome: TaskOutcome::Performed(performance),
        }
    }

    pub(crate) fn already_performed(
        state_key: StateKey,
        only_once: bool,
        prior: Option<Performance>,
    ) -> Self {
        Self {
            state_key,
            only_once,
            outcome: TaskOutcome::AlreadyPerformed(prior),
        }
    }

    pub(crate) fn unperformed(
        state_key: StateKey,
        only_once: bool,
        prior: Option<Performance>,
    ) -> Self {
        Self {
            state_key,
            only_once,
            outcome: TaskOutcome::Unperformed(prior),
        }
    }

    /// True when the task ran during this dispatch.
    pub fn is_performed(&self) -> bool {
        matches!(self.outcome, TaskOutcome::Performed(_))
    }

    /// True when this dispatch skipped the task because a run already had
    /// performed it (or still is performing it).
    pub fn is_already_performed(&self) -> bool {
        matches!(self.outcome, TaskOutcome::AlreadyPerformed(_))
    }

    /// Performance from this run, or the prior one a short-circuit carried.
    pub fn performance(&self) -> Option<&Performance> {
        match &self.outcome {
            TaskOutcome::Performed(performance) => Some(performance),
            TaskOutcome::AlreadyPerformed(prior) | TaskOutcome::Unperformed(prior) => {
                prior.as_ref()
            }
        }
    }

    /// Results value from [`TaskRun::performance`], if any.
    pub fn results(&self) -> Option<&Value> {
        self.performance().map(|performance| &performance.results)
    }
}

/// Dispatchable thunk tracking one asynchronous task.
///
/// Dispatches `<key>-performing`, awaits the task function, then dispatches
/// `<key>-complete` with timing and results. At most one run per key executes
/// at a time through a given store.
pub struct TaskAction<S> {
    state_key: StateKey,
    only_once: bool,
    task: TaskFn<S>,
}

impl<S> Clone for TaskAction<S> {
    fn clone(&self) -> Self {
        Self {
            state_key: self.state_key.clone(),
            only_once: self.only_once,
            task: Arc::clone(&self.task),
        }
    }
}

impl<S> fmt::Debug for TaskAction<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskAction")
            .field("state_key", &self.state_key)
            .field("only_once", &self.only_once)
            .finish_non_exhaustive()
    }
}

impl<S> TaskAction<S>
where
    S: TaskSlices + Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(state_key: StateKey, task: F) -> Self
    where
        F: Fn(TaskStore<S>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<Value, BoxError>> + Send + 'static,
    {
        let task: TaskFn<S> = Arc::new(move |store| Box::pin(task(store)));
        Self {
            state_key,
            only_once: false,
            task,
        }
    }

    pub(crate) fn from_task_fn(state_key: StateKey, only_once: bool, task: TaskFn<S>) -> Self {
        Self {
            state_key,
            only_once,
            task,
        }
    }

    /// Gate reruns once the slice is complete.
    pub fn only_once(mut self, only_once: bool) -> Self {
        self.only_once = only_once;
        self
    }

    pub fn state_key(&self) -> &StateKey {
        &self.state_key
    }

    /// Execute against `store`.
    ///
    /// Registers the key as in flight before anything else; the losing side of
    /// a concurrent dispatch reports `AlreadyPerformed` without touching the
    /// slice or invoking the task.
    pub async fn perform(&self, store: &TaskStore<S>) -> Result<TaskRun> {
        let Some(_guard) = store.begin_in_flight(&self.state_key) else {
            debug!(state_key = %self.state_key, "run already in flight");
            let prior = self.slice_performance(store)?;
            return Ok(TaskRun::already_performed(
                self.state_key.clone(),
                self.only_once,
                prior,
            ));
        };

        let slice = store
            .task_state(&self.state_key)
            .ok_or_else(|| TaskGateError::UnknownStateKey {
                state_key: self.state_key.clone(),
            })?;

        if slice.meta.performing || (self.only_once && slice.meta.complete) {
            debug!(
                state_key = %self.state_key,
                performing = slice.meta.performing,
                complete = slice.meta.complete,
                "task already performed; skipping"
            );
            return Ok(TaskRun::already_performed(
                self.state_key.clone(),
                self.only_once,
                slice.performance(),
            ));
        }

        let run_id = Uuid::new_v4();
        debug!(state_key = %self.state_key, %run_id, "task performing");
        store.dispatch(Action::performing(self.state_key.clone()));

        let started = Utc::now();
        let clock = Instant::now();

        let results = (self.task)(store.clone())
            .await
            .map_err(|source| TaskGateError::Task {
                state_key: self.state_key.clone(),
                source,
            })?;

        let duration = clock.elapsed();
        let performance = Performance {
            timing: Some(Timing { started, duration }),
            results,
        };
        store.dispatch(Action::complete(
            self.state_key.clone(),
            performance.clone(),
        ));
        info!(
            state_key = %self.state_key,
            %run_id,
            duration_ms = duration.as_millis() as u64,
            "task complete"
        );

        Ok(TaskRun::performed(
            self.state_key.clone(),
            self.only_once,
            performance,
        ))
    }

    fn slice_performance(&self, store: &TaskStore<S>) -> Result<Option<Performance>> {
        let slice = store
            .task_state(&self.state_key)
            .ok_or_else(|| TaskGateError::UnknownStateKey {
                state_key: self.state_key.clone(),
            })?;
        Ok(slice.performance())
    }
}

#[async_trait]
impl<S> Thunk<S> for TaskAction<S>
where
    S: TaskSlices + Clone + Send + Sync + 'static,
{
    type Output = TaskRun;

    async fn run(&self, store: &TaskStore<S>) -> Result<TaskRun> {
        self.perform(store).await
    }
}
