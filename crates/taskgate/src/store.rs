/*
[INPUT]:  A root reducer, dispatched actions, and thunks.
[OUTPUT]: Shared state snapshots, change notifications, per-key run coordination.
[POS]:    Coordinating owner - single authority for state and in-flight runs.
[UPDATE]: When dispatch, subscription, or in-flight semantics change.
*/

use std::fmt;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::debug;

use crate::action::Action;
use crate::error::Result;
use crate::key::StateKey;
use crate::reducer::Reducer;
use crate::registry::{InFlightGuard, InFlightRegistry};
use crate::state::{TaskSlices, TaskState};

/// Shared handle to one state store.
///
/// Clones share the same state, change channel, and in-flight registry, so
/// every action dispatched through any clone contends on the same per-key
/// registry. Actions dispatched through different stores never contend.
pub struct TaskStore<S> {
    inner: Arc<StoreInner<S>>,
}

struct StoreInner<S> {
    reduce: Box<dyn Fn(Option<&S>, &Action) -> S + Send + Sync>,
    state: RwLock<S>,
    changes: watch::Sender<S>,
    in_flight: InFlightRegistry,
}

impl<S> Clone for TaskStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> fmt::Debug for TaskStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskStore").finish_non_exhaustive()
    }
}

impl<S> TaskStore<S>
where
    S: TaskSlices + Clone + Send + Sync + 'static,
{
    /// Build a store seeded with the reducer's default state.
    pub fn new<R>(reducer: R) -> Self
    where
        R: Reducer<State = S> + Send + Sync + 'static,
    {
        let initial = reducer.initial_state();
        let (changes, _) = watch::channel(initial.clone());

        Self {
            inner: Arc::new(StoreInner {
                reduce: Box::new(move |state, action| reducer.reduce(state, action)),
                state: RwLock::new(initial),
                changes,
                in_flight: InFlightRegistry::new(),
            }),
        }
    }

    /// Apply `action` to the current state and publish the new snapshot.
    pub fn dispatch(&self, action: Action) -> S {
        let mut state = self.inner.state.write().expect("store state lock");
        let next = (self.inner.reduce)(Some(&*state), &action);
        *state = next.clone();
        // Publication stays under the lock so subscribers observe dispatch order.
        let _ = self.inner.changes.send(next.clone());
        drop(state);

        debug!(action_type = %action.action_type(), "action dispatched");
        next
    }

    /// Current state snapshot.
    pub fn state(&self) -> S {
        self.inner.state.read().expect("store state lock").clone()
    }

    /// Slice snapshot for `key`, if the root state carries it.
    pub fn task_state(&self, key: &StateKey) -> Option<TaskState> {
        self.inner
            .state
            .read()
            .expect("store state lock")
            .task_state(key)
            .cloned()
    }

    /// Subscribe to state changes; the receiver always holds the latest snapshot.
    pub fn subscribe(&self) -> watch::Receiver<S> {
        self.inner.changes.subscribe()
    }

    /// Run a dispatchable thunk against this store.
    pub async fn dispatch_thunk<T>(&self, thunk: &T) -> Result<T::Output>
    where
        T: Thunk<S>,
    {
        thunk.run(self).await
    }

    /// Whether a run for `key` is currently executing through this store.
    pub fn is_in_flight(&self, key: &StateKey) -> bool {
        self.inner.in_flight.is_in_flight(key)
    }

    pub(crate) fn begin_in_flight(&self, key: &StateKey) -> Option<InFlightGuard> {
        self.inner.in_flight.try_begin(key)
    }
}

/// A dispatchable unit of work receiving the store handle.
///
/// The seam between the store and async actions: task and check actions
/// implement it, and user code can implement it for custom workflows.
#[async_trait]
pub trait Thunk<S> {
    type Output;

    async fn run(&self, store: &TaskStore<S>) -> Result<Self::Output>;
}
