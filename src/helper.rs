//! The planner helper binds a goal to a current world state and an operator registry.
//!
//! The search engine only ever talks to a [`PlannerHelper`]; it never sees the
//! component that owns it.

use std::collections::HashMap;
use std::fmt;

use crate::error::{PlannerError, Result};
use crate::operator::Operator;
use crate::world_state::WorldState;

/// Handle to an operator registered in a [`PlannerHelper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperatorId(usize);

impl OperatorId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

/// What the planner is trying to reach.
pub trait Goal {
    /// Estimated cost still to pay from `state` to a desired state.
    ///
    /// Should only be zero when [`is_desired_state`](Self::is_desired_state) also holds.
    fn remaining_cost(&self, state: &WorldState) -> f32;

    /// The terminal test of the search.
    fn is_desired_state(&self, state: &WorldState) -> bool;
}

/// A [`Goal`] built from a heuristic closure and a desired-state closure.
///
/// ```
/// use transition_planner::{FnGoal, Goal, WorldState};
///
/// let goal = FnGoal::new(
///     |s: &WorldState| if s.get_state::<bool>("done") == Some(true) { 0.0 } else { 1.0 },
///     |s: &WorldState| s.get_state::<bool>("done") == Some(true),
/// );
///
/// let mut state = WorldState::new();
/// state.add_state("done", false).unwrap();
/// assert!(!goal.is_desired_state(&state));
/// assert_eq!(goal.remaining_cost(&state), 1.0);
/// ```
pub struct FnGoal<H, D> {
    heuristic: H,
    desired: D,
}

impl<H, D> FnGoal<H, D>
where
    H: Fn(&WorldState) -> f32,
    D: Fn(&WorldState) -> bool,
{
    pub fn new(heuristic: H, desired: D) -> Self {
        Self { heuristic, desired }
    }
}

impl<H, D> Goal for FnGoal<H, D>
where
    H: Fn(&WorldState) -> f32,
    D: Fn(&WorldState) -> bool,
{
    fn remaining_cost(&self, state: &WorldState) -> f32 {
        (self.heuristic)(state)
    }

    fn is_desired_state(&self, state: &WorldState) -> bool {
        (self.desired)(state)
    }
}

/// Owns the current world state, the operator registry and the goal.
pub struct PlannerHelper<G> {
    current: WorldState,
    operators: Vec<Operator>,
    by_name: HashMap<String, OperatorId>,
    goal: G,
}

impl<G: Goal> PlannerHelper<G> {
    pub fn new(goal: G) -> Self {
        Self {
            current: WorldState::new(),
            operators: Vec::new(),
            by_name: HashMap::new(),
            goal,
        }
    }

    /// Replaces the working state wholesale.
    pub fn set_current_state(&mut self, state: WorldState) {
        self.current = state;
    }

    pub fn current_state(&self) -> &WorldState {
        &self.current
    }

    /// Registers an operator under its name.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::DuplicateOperator`] if the name is taken.
    pub fn add_operator(&mut self, operator: Operator) -> Result<OperatorId> {
        if self.by_name.contains_key(operator.name()) {
            return Err(PlannerError::DuplicateOperator(operator.name().to_string()));
        }
        let id = OperatorId(self.operators.len());
        self.by_name.insert(operator.name().to_string(), id);
        self.operators.push(operator);
        Ok(id)
    }

    pub fn operator_id(&self, name: &str) -> Option<OperatorId> {
        self.by_name.get(name).copied()
    }

    /// # Panics
    ///
    /// Panics if `id` was not handed out by this helper.
    pub fn operator(&self, id: OperatorId) -> &Operator {
        &self.operators[id.0]
    }

    /// # Panics
    ///
    /// Panics if `id` was not handed out by this helper.
    pub fn operator_mut(&mut self, id: OperatorId) -> &mut Operator {
        &mut self.operators[id.0]
    }

    pub fn operator_by_name(&self, name: &str) -> Option<&Operator> {
        self.operator_id(name).map(|id| self.operator(id))
    }

    pub fn operator_by_name_mut(&mut self, name: &str) -> Option<&mut Operator> {
        let id = self.operator_id(name)?;
        Some(self.operator_mut(id))
    }

    /// Iterates over the registry in registration order.
    pub fn operators(&self) -> impl Iterator<Item = (OperatorId, &Operator)> {
        self.operators
            .iter()
            .enumerate()
            .map(|(index, op)| (OperatorId(index), op))
    }

    pub fn operator_count(&self) -> usize {
        self.operators.len()
    }

    /// Applies a registered operator to the current state.
    pub fn apply_to_current(&mut self, id: OperatorId) -> Result<()> {
        let operator = self
            .operators
            .get(id.0)
            .ok_or_else(|| PlannerError::UnknownOperator(id.to_string()))?;
        operator.apply(&mut self.current)
    }

    pub fn remaining_cost(&self, state: &WorldState) -> f32 {
        self.goal.remaining_cost(state)
    }

    pub fn is_desired_state(&self, state: &WorldState) -> bool {
        self.goal.is_desired_state(state)
    }

    pub fn goal(&self) -> &G {
        &self.goal
    }

    pub fn goal_mut(&mut self) -> &mut G {
        &mut self.goal
    }
}
