//! World state representation for the transition planner.
//!
//! A [`WorldState`] maps state variable keys to typed [`StateValue`]s and
//! carries the cost accumulated by the operators applied to reach it.
//!
//! Equality and hashing only look at the variables, never at the cost, so two
//! states reached along different paths compare equal when every variable
//! holds the same value.
//!
//! # Example
//!
//! ```
//! use transition_planner::WorldState;
//!
//! let mut state = WorldState::new();
//! state.add_state("DeadState", false).unwrap();
//! state.add_state("StandingActionCountState", 0u32).unwrap();
//!
//! assert_eq!(state.get_state::<bool>("DeadState"), Some(false));
//!
//! // Missing keys and kind mismatches are query failures
//! assert_eq!(state.get_state::<bool>("ShotState"), None);
//! assert_eq!(state.get_state::<u32>("DeadState"), None);
//!
//! // Cloning is a deep copy, including the accumulated cost
//! state.add_cost(1.5);
//! let copy = state.clone();
//! assert_eq!(copy, state);
//! assert_eq!(copy.cost(), 1.5);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{PlannerError, Result};
use crate::state::{StateKind, StateValue};

/// A snapshot of all tracked planning variables plus the accumulated path cost.
#[derive(Clone, Debug, Default)]
pub struct WorldState {
    vars: BTreeMap<String, StateValue>,
    cost: f32,
}

impl WorldState {
    /// Creates an empty state with no accumulated cost.
    pub fn new() -> Self {
        Self {
            vars: BTreeMap::new(),
            cost: 0.0,
        }
    }

    /// Registers a state variable under `key`.
    ///
    /// Re-adding an existing key replaces its value, but only with a value of
    /// the same kind: a key never changes kind once registered.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::StateKindMismatch`] if `key` already holds a
    /// value of another kind.
    pub fn add_state(&mut self, key: impl Into<String>, value: impl Into<StateValue>) -> Result<()> {
        let key = key.into();
        let value = value.into();
        if let Some(existing) = self.vars.get(&key) {
            if !existing.same_kind(&value) {
                return Err(PlannerError::StateKindMismatch {
                    key,
                    expected: existing.kind_name().to_string(),
                    found: value.kind_name().to_string(),
                });
            }
        }
        self.vars.insert(key, value);
        Ok(())
    }

    /// Typed lookup. Returns `None` when the key is missing or holds another kind.
    pub fn get_state<T: StateKind>(&self, key: &str) -> Option<T> {
        self.vars.get(key).and_then(T::from_value)
    }

    /// Typed lookup that reports why the query failed.
    pub fn try_get_state<T: StateKind>(&self, key: &str) -> Result<T> {
        let value = self
            .vars
            .get(key)
            .ok_or_else(|| PlannerError::MissingState(key.to_string()))?;
        T::from_value(value).ok_or_else(|| PlannerError::StateKindMismatch {
            key: key.to_string(),
            expected: T::kind_name().to_string(),
            found: value.kind_name().to_string(),
        })
    }

    /// Overwrites an existing variable with a value of the same kind.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::MissingState`] if the key was never registered
    /// and [`PlannerError::StateKindMismatch`] if it holds another kind.
    pub fn set_state<T: StateKind>(&mut self, key: &str, value: T) -> Result<()> {
        let value = value.into_value();
        match self.vars.get_mut(key) {
            None => Err(PlannerError::MissingState(key.to_string())),
            Some(existing) if !existing.same_kind(&value) => {
                Err(PlannerError::StateKindMismatch {
                    key: key.to_string(),
                    expected: existing.kind_name().to_string(),
                    found: value.kind_name().to_string(),
                })
            }
            Some(existing) => {
                *existing = value;
                Ok(())
            }
        }
    }

    /// Raw access to the value stored under `key`.
    pub fn value(&self, key: &str) -> Option<&StateValue> {
        self.vars.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Iterates over the variables in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &StateValue)> {
        self.vars.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// The sum of the costs of every operator applied to reach this state.
    pub fn cost(&self) -> f32 {
        self.cost
    }

    pub fn add_cost(&mut self, cost: f32) {
        self.cost += cost;
    }

    pub fn reset_cost(&mut self) {
        self.cost = 0.0;
    }
}

impl PartialEq for WorldState {
    fn eq(&self, other: &Self) -> bool {
        self.vars == other.vars
    }
}

impl Eq for WorldState {}

impl Hash for WorldState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.vars.hash(state);
    }
}

/// Builds a state from key/value pairs. A later pair replaces an earlier one
/// with the same key.
impl<K, V> FromIterator<(K, V)> for WorldState
where
    K: Into<String>,
    V: Into<StateValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            cost: 0.0,
        }
    }
}

impl fmt::Display for WorldState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.vars {
            writeln!(f, "{}: \"{}\"", key, value)?;
        }
        write!(f, "Cost: {}", self.cost)
    }
}
