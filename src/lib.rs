pub mod anim;
mod error;
mod helper;
mod operator;
mod planner;
mod search;
mod state;
mod world_state;

pub use error::{PlannerError, Result};
pub use helper::{FnGoal, Goal, OperatorId, PlannerHelper};
pub use operator::{Effect, MutatorFn, Operator, Precondition, PredicateFn};
pub use planner::{Planner, PlannerConfig, PlannerResult, PlannerStatus};
pub use state::{EnumValue, StateEnum, StateKind, StateValue};
pub use world_state::WorldState;
