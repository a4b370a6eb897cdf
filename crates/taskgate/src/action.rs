/*
[INPUT]:  State keys and run payloads; wire JSON from external dispatchers.
[OUTPUT]: Typed performing/complete actions with `<key>-<phase>` type strings.
[POS]:    Dispatch unit - the only values that mutate store state.
[UPDATE]: When the action wire contract changes.
*/

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::key::StateKey;
use crate::state::Performance;

/// Lifecycle phase an action announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Performing,
    Complete,
}

impl ActionKind {
    /// Suffix appended to the state key in the wire `type` string.
    pub fn suffix(&self) -> &'static str {
        match self {
            ActionKind::Performing => "performing",
            ActionKind::Complete => "complete",
        }
    }
}

/// A dispatched lifecycle notification for one task slice.
///
/// Constructed through [`Action::performing`] / [`Action::complete`] so the
/// wire `type` string always matches the key and phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireAction", into = "WireAction")]
pub struct Action {
    kind: ActionKind,
    state_key: StateKey,
    performance: Performance,
}

impl Action {
    /// Announce that the task for `state_key` started.
    pub fn performing(state_key: StateKey) -> Self {
        Self {
            kind: ActionKind::Performing,
            state_key,
            performance: Performance::empty(),
        }
    }

    /// Announce that the task for `state_key` finished with `performance`.
    pub fn complete(state_key: StateKey, performance: Performance) -> Self {
        Self {
            kind: ActionKind::Complete,
            state_key,
            performance,
        }
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn state_key(&self) -> &StateKey {
        &self.state_key
    }

    pub fn performance(&self) -> &Performance {
        &self.performance
    }

    /// Wire `type` string, `<stateKey>-<phase>`.
    pub fn action_type(&self) -> String {
        format!("{}-{}", self.state_key, self.kind.suffix())
    }
}

/// Rejection of a wire action whose `type` does not match its `stateKey`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("action type '{action_type}' does not match state key '{state_key}'")]
pub struct ActionTypeMismatch {
    pub action_type: String,
    pub state_key: StateKey,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAction {
    #[serde(rename = "type")]
    action_type: String,
    state_key: StateKey,
    performance: Performance,
}

impl From<Action> for WireAction {
    fn from(action: Action) -> Self {
        let action_type = action.action_type();
        Self {
            action_type,
            state_key: action.state_key,
            performance: action.performance,
        }
    }
}

impl TryFrom<WireAction> for Action {
    type Error = ActionTypeMismatch;

    fn try_from(wire: WireAction) -> Result<Self, Self::Error> {
        let kind = [ActionKind::Performing, ActionKind::Complete]
            .into_iter()
            .find(|kind| wire.action_type == format!("{}-{}", wire.state_key, kind.suffix()))
            .ok_or_else(|| ActionTypeMismatch {
                action_type: wire.action_type.clone(),
                state_key: wire.state_key.clone(),
            })?;

        Ok(Self {
            kind,
            state_key: wire.state_key,
            performance: wire.performance,
        })
    }
}
