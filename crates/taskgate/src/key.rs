/*
[INPUT]:  Dot-delimited key paths from user code and wire payloads.
[OUTPUT]: Validated hierarchical state keys and scoped reducer factories.
[POS]:    Foundation type - every slice, action, and run is addressed by a StateKey.
[UPDATE]: When segment validation rules or scope composition change.
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reducer::{CheckReducer, TaskReducer};

/// Errors raised while constructing a [`StateKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("state key path is empty")]
    EmptyPath,

    #[error("state key '{path}' contains an empty segment")]
    EmptySegment { path: String },

    #[error("state key segment '{segment}' contains invalid character '{found}'")]
    InvalidChar { segment: String, found: char },
}

/// Hierarchical state key: one or more validated segments joined by `.`.
///
/// A key addresses one task slice in the state tree and prefixes the action
/// types that mutate it (`<key>-performing`, `<key>-complete`). Keys that
/// exist are valid; malformed paths fail at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StateKey {
    segments: Vec<String>,
}

impl StateKey {
    /// Parse a dot-delimited path.
    pub fn new(path: &str) -> Result<Self, KeyError> {
        if path.is_empty() {
            return Err(KeyError::EmptyPath);
        }

        let mut segments = Vec::new();
        for segment in path.split('.') {
            if segment.is_empty() {
                return Err(KeyError::EmptySegment {
                    path: path.to_string(),
                });
            }
            validate_segment(segment)?;
            segments.push(segment.to_string());
        }

        Ok(Self { segments })
    }

    /// Key one level deeper, with `segment` validated.
    pub fn child(&self, segment: &str) -> Result<Self, KeyError> {
        if segment.is_empty() {
            return Err(KeyError::EmptySegment {
                path: format!("{self}."),
            });
        }
        validate_segment(segment)?;

        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    /// Concatenation of two keys.
    pub fn join(&self, other: &StateKey) -> StateKey {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        StateKey { segments }
    }

    /// Segments in order, outermost first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Child for a segment known valid at compile time.
    pub(crate) fn child_fixed(&self, segment: &'static str) -> Self {
        debug_assert!(!segment.is_empty() && segment.chars().all(is_segment_char));
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Self { segments }
    }
}

fn is_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn validate_segment(segment: &str) -> Result<(), KeyError> {
    match segment.chars().find(|c| !is_segment_char(*c)) {
        Some(found) => Err(KeyError::InvalidChar {
            segment: segment.to_string(),
            found,
        }),
        None => Ok(()),
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl FromStr for StateKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for StateKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<StateKey> for String {
    fn from(key: StateKey) -> Self {
        key.to_string()
    }
}

/// Namespace under which families of reducers are keyed.
///
/// Renders the scoped-factory chain with validated keys: scope levels come
/// first, the slice name last, so `KeyScope::new("pages")?.nested("admin")?`
/// keys `userList` as `pages.admin.userList`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyScope {
    prefix: Option<StateKey>,
}

impl KeyScope {
    /// Scope with no prefix; produced keys are the bare names.
    pub fn root() -> Self {
        Self { prefix: None }
    }

    /// Scope under a validated prefix path.
    pub fn new(prefix: &str) -> Result<Self, KeyError> {
        Ok(Self {
            prefix: Some(StateKey::new(prefix)?),
        })
    }

    /// Scope one or more levels deeper.
    pub fn nested(&self, path: &str) -> Result<Self, KeyError> {
        let suffix = StateKey::new(path)?;
        let prefix = match &self.prefix {
            Some(prefix) => prefix.join(&suffix),
            None => suffix,
        };
        Ok(Self {
            prefix: Some(prefix),
        })
    }

    /// Full key for a name inside this scope.
    pub fn key(&self, name: &str) -> Result<StateKey, KeyError> {
        let name = StateKey::new(name)?;
        Ok(match &self.prefix {
            Some(prefix) => prefix.join(&name),
            None => name,
        })
    }

    /// Task reducer keyed `<scope>.<name>`.
    pub fn task_reducer(&self, name: &str) -> Result<TaskReducer, KeyError> {
        Ok(TaskReducer::new(self.key(name)?))
    }

    /// Check reducer keyed `<scope>.<name>`.
    pub fn check_reducer(&self, name: &str) -> Result<CheckReducer, KeyError> {
        Ok(CheckReducer::new(self.key(name)?))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::reducer::Reducer;

    #[test]
    fn parses_dot_delimited_paths() {
        let key = StateKey::new("sync.users.check").unwrap();
        assert_eq!(key.segments().collect::<Vec<_>>(), ["sync", "users", "check"]);
        assert_eq!(key.to_string(), "sync.users.check");
    }

    #[test]
    fn accepts_underscore_and_dash_segments() {
        assert!(StateKey::new("user_list.re-sync").is_ok());
    }

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("a..b")]
    #[case(".a")]
    #[case("a.")]
    #[case("a b")]
    #[case("sync/check")]
    #[case("héllo")]
    fn rejects_invalid_paths(#[case] path: &str) {
        assert!(StateKey::new(path).is_err());
    }

    #[test]
    fn empty_path_and_empty_segment_are_distinct_errors() {
        assert_eq!(StateKey::new(""), Err(KeyError::EmptyPath));
        assert_eq!(
            StateKey::new("a..b"),
            Err(KeyError::EmptySegment {
                path: "a..b".to_string()
            })
        );
    }

    #[test]
    fn child_appends_one_validated_segment() {
        let key = StateKey::new("sync").unwrap();
        assert_eq!(key.child("check").unwrap().to_string(), "sync.check");
        assert!(key.child("").is_err());
        assert!(key.child("a.b").is_err());
    }

    #[test]
    fn join_concatenates_segments() {
        let prefix = StateKey::new("pages.admin").unwrap();
        let name = StateKey::new("userList").unwrap();
        assert_eq!(prefix.join(&name).to_string(), "pages.admin.userList");
    }

    #[test]
    fn display_round_trips_through_from_str() {
        let key: StateKey = "sync.users.task".parse().unwrap();
        assert_eq!(key.to_string().parse::<StateKey>().unwrap(), key);
    }

    #[test]
    fn serializes_as_dotted_string() {
        let key = StateKey::new("sync.check").unwrap();
        assert_eq!(serde_json::to_value(&key).unwrap(), json!("sync.check"));

        let parsed: StateKey = serde_json::from_value(json!("sync.check")).unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn deserialization_rejects_malformed_paths() {
        assert!(serde_json::from_value::<StateKey>(json!("a..b")).is_err());
        assert!(serde_json::from_value::<StateKey>(json!("")).is_err());
    }

    #[test]
    fn scope_keys_prefix_before_name() {
        let scope = KeyScope::new("pages").unwrap().nested("admin").unwrap();
        assert_eq!(scope.key("userList").unwrap().to_string(), "pages.admin.userList");
    }

    #[test]
    fn root_scope_keys_are_bare_names() {
        assert_eq!(KeyScope::root().key("warmup").unwrap().to_string(), "warmup");
    }

    #[test]
    fn scope_rejects_empty_levels() {
        assert!(KeyScope::new("").is_err());
        assert!(KeyScope::root().nested("").is_err());
    }

    #[test]
    fn scoped_reducers_carry_the_full_key() {
        let scope = KeyScope::new("pages").unwrap();
        let reducer = scope.task_reducer("userList").unwrap();
        assert_eq!(reducer.state_key().to_string(), "pages.userList");

        let check = scope.check_reducer("session").unwrap();
        assert_eq!(check.initial_state().check.state_key.to_string(), "pages.session.check");
    }
}
