//! # Planner
//!
//! The [`Planner`] runs a time-bounded, cost-guided forward search from a
//! [`PlannerHelper`]'s current state to any state the helper's goal accepts.
//!
//! ```
//! use transition_planner::{
//!     Effect, FnGoal, Operator, Planner, PlannerConfig, PlannerHelper, PlannerResult,
//!     Precondition, WorldState,
//! };
//!
//! let goal = FnGoal::new(
//!     |s: &WorldState| if s.get_state::<bool>("has_wood") == Some(true) { 0.0 } else { 1.0 },
//!     |s: &WorldState| s.get_state::<bool>("has_wood") == Some(true),
//! );
//! let mut helper = PlannerHelper::new(goal);
//! helper
//!     .add_operator(
//!         Operator::new("chop_wood")
//!             .with_precondition(Precondition::flag("has_axe", true))
//!             .with_effect(Effect::set_flag("has_wood", true)),
//!     )
//!     .unwrap();
//!
//! let mut state = WorldState::new();
//! state.add_state("has_axe", true).unwrap();
//! state.add_state("has_wood", false).unwrap();
//! helper.set_current_state(state);
//!
//! let mut planner = Planner::new(PlannerConfig::default());
//! assert_eq!(planner.generate_plan(&helper), PlannerResult::PlanFound);
//! assert_eq!(helper.operator(planner.result()[0]).name(), "chop_wood");
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PlannerError, Result};
use crate::helper::{Goal, OperatorId, PlannerHelper};
use crate::search::{best_first_search, SearchOutcome};
use crate::world_state::WorldState;

/// Configuration of the search engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Wall-clock budget of one `generate_plan` call, in seconds
    pub max_time_per_iteration: f64,
}

impl PlannerConfig {
    /// The budget as a `Duration`. Negative and NaN budgets are zero; budgets
    /// too large to represent, infinity included, saturate to `Duration::MAX`.
    pub fn time_budget(&self) -> Duration {
        Duration::try_from_secs_f64(self.max_time_per_iteration.max(0.0)).unwrap_or(Duration::MAX)
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_time_per_iteration: 0.5,
        }
    }
}

/// Where the planner is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerStatus {
    Idle,
    Searching,
    PlanFound,
    NoPlanFound,
}

/// Result of one [`Planner::generate_plan`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerResult {
    PlanFound,
    NoPlanFound,
}

impl fmt::Display for PlannerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerResult::PlanFound => f.write_str("PLAN_FOUND"),
            PlannerResult::NoPlanFound => f.write_str("NO_PLAN_FOUND"),
        }
    }
}

/// Time-bounded forward state-space planner.
///
/// The planner keeps the outcome of its last run (plan, elapsed time, search
/// counters and, on failure, the closest state it reached) until the next
/// [`reset`](Self::reset).
#[derive(Debug)]
pub struct Planner {
    config: PlannerConfig,
    status: PlannerStatus,
    result: Vec<OperatorId>,
    total_elapsed: Duration,
    nodes_expanded: usize,
    nodes_generated: usize,
    failed_state: Option<WorldState>,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            status: PlannerStatus::Idle,
            result: Vec::new(),
            total_elapsed: Duration::ZERO,
            nodes_expanded: 0,
            nodes_generated: 0,
            failed_state: None,
        }
    }

    /// Clears the last plan and diagnostics and returns to [`PlannerStatus::Idle`].
    pub fn reset(&mut self) {
        self.status = PlannerStatus::Idle;
        self.result.clear();
        self.total_elapsed = Duration::ZERO;
        self.nodes_expanded = 0;
        self.nodes_generated = 0;
        self.failed_state = None;
    }

    /// Searches for a plan from `helper`'s current state.
    ///
    /// The search runs to completion, or until the configured time budget is
    /// exceeded, on the calling thread.
    pub fn generate_plan<G: Goal>(&mut self, helper: &PlannerHelper<G>) -> PlannerResult {
        self.reset();
        self.status = PlannerStatus::Searching;

        let (outcome, stats) = best_first_search(helper, self.config.time_budget());
        self.total_elapsed = stats.elapsed;
        self.nodes_expanded = stats.nodes_expanded;
        self.nodes_generated = stats.nodes_generated;

        match outcome {
            SearchOutcome::Found(plan) => {
                log::debug!(
                    target: "transition_planner",
                    "Plan found with {} steps in {:?} ({} nodes expanded)",
                    plan.len(),
                    self.total_elapsed,
                    self.nodes_expanded
                );
                self.result = plan;
                self.status = PlannerStatus::PlanFound;
                PlannerResult::PlanFound
            }
            SearchOutcome::Exhausted | SearchOutcome::TimedOut => {
                log::debug!(
                    target: "transition_planner",
                    "No plan found in {:?} ({:?}, {} nodes expanded)",
                    self.total_elapsed,
                    outcome,
                    self.nodes_expanded
                );
                self.failed_state = stats.best_state;
                self.status = PlannerStatus::NoPlanFound;
                PlannerResult::NoPlanFound
            }
        }
    }

    /// Like [`generate_plan`](Self::generate_plan), returning the plan directly.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::NoPlanFound`] when the search fails.
    pub fn plan<G: Goal>(&mut self, helper: &PlannerHelper<G>) -> Result<Vec<OperatorId>> {
        match self.generate_plan(helper) {
            PlannerResult::PlanFound => Ok(self.result.clone()),
            PlannerResult::NoPlanFound => Err(PlannerError::NoPlanFound {
                elapsed: self.total_elapsed,
            }),
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PlannerConfig {
        &mut self.config
    }

    pub fn status(&self) -> PlannerStatus {
        self.status
    }

    /// The last plan found, empty otherwise.
    pub fn result(&self) -> &[OperatorId] {
        &self.result
    }

    pub fn total_elapsed(&self) -> Duration {
        self.total_elapsed
    }

    pub fn nodes_expanded(&self) -> usize {
        self.nodes_expanded
    }

    pub fn nodes_generated(&self) -> usize {
        self.nodes_generated
    }

    /// The state with the lowest remaining cost reached by a failed search.
    pub fn failed_state(&self) -> Option<&WorldState> {
        self.failed_state.as_ref()
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}
