//! # Operators
//!
//! An [`Operator`] is one candidate animation transition: a name, a cost, a
//! list of [`Precondition`]s that must all hold and a list of [`Effect`]s
//! applied in order.
//!
//! ```
//! use transition_planner::{Effect, Operator, Precondition, WorldState};
//!
//! let mut state = WorldState::new();
//! state.add_state("TransitionState", true).unwrap();
//! state.add_state("ActionCount", 0u32).unwrap();
//!
//! let op = Operator::new("Act")
//!     .with_precondition(Precondition::flag("TransitionState", true))
//!     .with_effect(Effect::increment("ActionCount"))
//!     .with_effect(Effect::set_flag("TransitionState", false));
//!
//! assert!(op.can_apply(&state));
//! op.apply(&mut state).unwrap();
//! assert_eq!(state.get_state::<u32>("ActionCount"), Some(1));
//! assert_eq!(state.cost(), 1.0);
//! assert!(!op.can_apply(&state));
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::error::{PlannerError, Result};
use crate::state::{EnumValue, StateEnum, StateValue};
use crate::world_state::WorldState;

pub type PredicateFn = dyn Fn(&WorldState) -> bool + Send + Sync;
pub type MutatorFn = dyn Fn(&mut WorldState) -> Result<()> + Send + Sync;

/// A pure predicate over a world state.
///
/// A precondition on a missing key, or on a key of another kind, never holds.
#[derive(Clone)]
pub enum Precondition {
    /// The flag stored under `key` equals `value`
    Flag { key: String, value: bool },
    /// The enumerated value stored under `key` equals `value`
    Enumerated { key: String, value: EnumValue },
    /// Any other test, registered as a function
    Custom {
        name: String,
        predicate: Arc<PredicateFn>,
    },
}

impl Precondition {
    pub fn flag(key: impl Into<String>, value: bool) -> Self {
        Precondition::Flag {
            key: key.into(),
            value,
        }
    }

    pub fn enumerated<E: StateEnum>(key: impl Into<String>, value: E) -> Self {
        Precondition::Enumerated {
            key: key.into(),
            value: value.enum_value(),
        }
    }

    pub fn custom<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&WorldState) -> bool + Send + Sync + 'static,
    {
        Precondition::Custom {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn evaluate(&self, state: &WorldState) -> bool {
        match self {
            Precondition::Flag { key, value } => state.get_state::<bool>(key) == Some(*value),
            Precondition::Enumerated { key, value } => {
                state.value(key) == Some(&StateValue::Enumerated(*value))
            }
            Precondition::Custom { predicate, .. } => predicate(state),
        }
    }
}

impl fmt::Debug for Precondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precondition::Flag { key, value } => write!(f, "{} == {}", key, value),
            Precondition::Enumerated { key, value } => write!(f, "{} == {}", key, value),
            Precondition::Custom { name, .. } => write!(f, "custom({})", name),
        }
    }
}

/// A mutation of a world state.
#[derive(Clone)]
pub enum Effect {
    /// Stores an enumerated value under `key`
    SetEnumerated { key: String, value: EnumValue },
    /// Adds one to the counter stored under `key`
    Increment { key: String },
    /// Stores a flag under `key`
    SetFlag { key: String, value: bool },
    /// Any other mutation, registered as a function
    Custom { name: String, mutator: Arc<MutatorFn> },
}

impl Effect {
    pub fn set_enumerated<E: StateEnum>(key: impl Into<String>, value: E) -> Self {
        Effect::SetEnumerated {
            key: key.into(),
            value: value.enum_value(),
        }
    }

    pub fn increment(key: impl Into<String>) -> Self {
        Effect::Increment { key: key.into() }
    }

    pub fn set_flag(key: impl Into<String>, value: bool) -> Self {
        Effect::SetFlag {
            key: key.into(),
            value,
        }
    }

    pub fn custom<F>(name: impl Into<String>, mutator: F) -> Self
    where
        F: Fn(&mut WorldState) -> Result<()> + Send + Sync + 'static,
    {
        Effect::Custom {
            name: name.into(),
            mutator: Arc::new(mutator),
        }
    }

    /// Applies the effect to `state`.
    ///
    /// # Errors
    ///
    /// Fails if the target key is missing or holds a value of another kind.
    pub fn apply(&self, state: &mut WorldState) -> Result<()> {
        match self {
            Effect::SetEnumerated { key, value } => match state.value(key) {
                None => Err(PlannerError::MissingState(key.clone())),
                Some(StateValue::Enumerated(existing))
                    if existing.type_name() == value.type_name() =>
                {
                    state.add_state(key.as_str(), *value)
                }
                Some(existing) => Err(PlannerError::StateKindMismatch {
                    key: key.clone(),
                    expected: value.type_name().to_string(),
                    found: existing.kind_name().to_string(),
                }),
            },
            Effect::Increment { key } => {
                let count = state.try_get_state::<u32>(key)?;
                state.set_state(key, count.saturating_add(1))
            }
            Effect::SetFlag { key, value } => state.set_state(key, *value),
            Effect::Custom { mutator, .. } => mutator(state),
        }
    }
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::SetEnumerated { key, value } => write!(f, "{} = {}", key, value),
            Effect::Increment { key } => write!(f, "{} += 1", key),
            Effect::SetFlag { key, value } => write!(f, "{} = {}", key, value),
            Effect::Custom { name, .. } => write!(f, "custom({})", name),
        }
    }
}

/// A named, costed, precondition-gated state transformation.
#[derive(Debug, Clone)]
pub struct Operator {
    name: String,
    cost: f32,
    preconditions: Vec<Precondition>,
    effects: Vec<Effect>,
    replacement_anims: VecDeque<String>,
}

impl Operator {
    /// Creates an operator with a cost of 1.0 and no conditions or effects.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cost: 1.0,
            preconditions: Vec::new(),
            effects: Vec::new(),
            replacement_anims: VecDeque::new(),
        }
    }

    /// Replaces the cost of the operator.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::InvalidOperatorCost`] unless the cost is positive and finite.
    pub fn with_cost(mut self, cost: f32) -> Result<Self> {
        if !(cost > 0.0 && cost.is_finite()) {
            return Err(PlannerError::InvalidOperatorCost);
        }
        self.cost = cost;
        Ok(self)
    }

    pub fn with_precondition(mut self, precondition: Precondition) -> Self {
        self.preconditions.push(precondition);
        self
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn add_precondition(&mut self, precondition: Precondition) {
        self.preconditions.push(precondition);
    }

    pub fn add_effect(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cost(&self) -> f32 {
        self.cost
    }

    pub fn preconditions(&self) -> &[Precondition] {
        &self.preconditions
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    /// Returns `true` if every precondition holds in `state`.
    pub fn can_apply(&self, state: &WorldState) -> bool {
        self.preconditions.iter().all(|p| p.evaluate(state))
    }

    /// Runs the effects in order and adds the operator's cost to `state`.
    ///
    /// Preconditions are not checked here; callers filter with
    /// [`can_apply`](Self::can_apply) first. A failing effect stops the
    /// application and leaves the state partially mutated.
    pub fn apply(&self, state: &mut WorldState) -> Result<()> {
        for effect in &self.effects {
            effect.apply(state)?;
        }
        state.add_cost(self.cost);
        Ok(())
    }

    /// Queues a specific clip to play the next time this operator is resolved
    /// to an animation.
    pub fn enqueue_replacement_anim(&mut self, anim_name: impl Into<String>) {
        self.replacement_anims.push_back(anim_name.into());
    }

    /// Dequeues the next replacement clip, if any.
    pub fn next_replacement_anim(&mut self) -> Option<String> {
        self.replacement_anims.pop_front()
    }

    /// Looks at the next replacement clip without consuming it.
    pub fn peek_replacement_anim(&self) -> Option<&str> {
        self.replacement_anims.front().map(String::as_str)
    }

    pub fn replacement_anim_count(&self) -> usize {
        self.replacement_anims.len()
    }

    /// The animation name this operator resolves to: the next queued
    /// replacement, or the operator's own name once the queue is drained.
    pub fn resolve_animation_name(&mut self) -> String {
        self.next_replacement_anim()
            .unwrap_or_else(|| self.name.clone())
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (cost {})", self.name, self.cost)
    }
}
