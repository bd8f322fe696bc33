//! The animation domain: stances, weapon states, the transition operator
//! library and the component that plays planned transitions.

mod animatable;
pub mod operators;
mod stance;
mod transition_planner;

pub use animatable::{Animatable, AnimatableKind, AnimationPlayer, AnimationSequence};
pub use stance::{BasicStance, WeaponState};
pub use transition_planner::{
    baseline_state, AnimationTransitionPlanner, TransitionEvent, TransitionGoal,
    TransitionPlannerConfig,
};
