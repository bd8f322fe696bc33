//! The animation operator library and the state variable keys it works on.
//!
//! Every operator is named after the animation clip it plays.

use crate::anim::stance::{BasicStance, WeaponState};
use crate::error::Result;
use crate::helper::{Goal, PlannerHelper};
use crate::operator::{Effect, Operator, Precondition};

pub const STATE_BASIC_STANCE: &str = "BasicStanceState";
pub const STATE_WEAPON: &str = "WeaponState";
pub const STATE_DEAD: &str = "DeadState";
pub const STATE_TRANSITION: &str = "TransitionState";
pub const STATE_STANDING_ACTION_COUNT: &str = "StandingActionCountState";
pub const STATE_KNEELING_ACTION_COUNT: &str = "KneelingActionCountState";
pub const STATE_PRONE_ACTION_COUNT: &str = "ProneActionCountState";
pub const STATE_SHOT: &str = "ShotState";

pub const ANIM_WALK_READY: &str = "Walk Run Ready";
pub const ANIM_WALK_DEPLOYED: &str = "Walk Run Deployed";

pub const ANIM_LOW_WALK_READY: &str = "Kneel-Low Walk Ready";
pub const ANIM_LOW_WALK_DEPLOYED: &str = "Kneel-Low Walk Deployed";

pub const ANIM_STAND_TO_KNEEL: &str = "Stand To Kneel";
pub const ANIM_KNEEL_TO_STAND: &str = "Kneel To Stand";

pub const ANIM_CRAWL_READY: &str = "Prone-Crawl Ready";
pub const ANIM_CRAWL_DEPLOYED: &str = "Prone-Crawl Deployed";

pub const ANIM_PRONE_TO_KNEEL: &str = "Prone To Kneel";
pub const ANIM_KNEEL_TO_PRONE: &str = "Kneel To Prone";

pub const ANIM_SHOT_STANDING: &str = "Shot Standing";
pub const ANIM_SHOT_KNEELING: &str = "Shot Kneeling";
pub const ANIM_SHOT_PRONE: &str = "Shot Prone";

pub const ANIM_DEAD_STANDING: &str = "Dead Standing";
pub const ANIM_DEAD_KNEELING: &str = "Dead Kneeling";
pub const ANIM_DEAD_PRONE: &str = "Dead Prone";

pub const ANIM_STANDING_ACTION: &str = "Standing Action";
pub const ANIM_KNEELING_ACTION: &str = "Kneeling Action";
pub const ANIM_PRONE_ACTION: &str = "Prone Action";

pub const OPER_DEPLOYED_TO_READY: &str = "Deployed To Ready";
pub const OPER_READY_TO_DEPLOYED: &str = "Ready To Deployed";

/// The generic action operator for a stance. Idle has none.
pub fn action_operator_name(stance: BasicStance) -> Option<&'static str> {
    match stance {
        BasicStance::Standing => Some(ANIM_STANDING_ACTION),
        BasicStance::Kneeling => Some(ANIM_KNEELING_ACTION),
        BasicStance::Prone => Some(ANIM_PRONE_ACTION),
        BasicStance::Idle => None,
    }
}

/// The counter key tracking actions performed in a stance. Idle has none.
pub fn action_count_key(stance: BasicStance) -> Option<&'static str> {
    match stance {
        BasicStance::Standing => Some(STATE_STANDING_ACTION_COUNT),
        BasicStance::Kneeling => Some(STATE_KNEELING_ACTION_COUNT),
        BasicStance::Prone => Some(STATE_PRONE_ACTION_COUNT),
        BasicStance::Idle => None,
    }
}

fn stance_is(stance: BasicStance) -> Precondition {
    Precondition::enumerated(STATE_BASIC_STANCE, stance)
}

fn weapon_is(weapon: WeaponState) -> Precondition {
    Precondition::enumerated(STATE_WEAPON, weapon)
}

fn set_stance(stance: BasicStance) -> Effect {
    Effect::set_enumerated(STATE_BASIC_STANCE, stance)
}

fn set_weapon(weapon: WeaponState) -> Effect {
    Effect::set_enumerated(STATE_WEAPON, weapon)
}

fn set_transition(value: bool) -> Effect {
    Effect::set_flag(STATE_TRANSITION, value)
}

/// Locomotion loop: keeps the stance and ends any transition.
fn locomotion(name: &str, stance: BasicStance, weapon: WeaponState) -> Operator {
    Operator::new(name)
        .with_precondition(stance_is(stance))
        .with_precondition(weapon_is(weapon))
        .with_effect(set_stance(stance))
        .with_effect(set_transition(false))
}

/// Stance change, only possible with the weapon deployed.
fn stance_change(name: &str, from: BasicStance, to: BasicStance) -> Operator {
    Operator::new(name)
        .with_precondition(stance_is(from))
        .with_precondition(weapon_is(WeaponState::Deployed))
        .with_effect(set_stance(to))
        .with_effect(set_transition(true))
}

fn weapon_change(name: &str, from: WeaponState, to: WeaponState) -> Operator {
    Operator::new(name)
        .with_precondition(weapon_is(from))
        .with_effect(set_weapon(to))
        .with_effect(set_transition(true))
}

fn shot(name: &str, stance: BasicStance) -> Operator {
    Operator::new(name)
        .with_precondition(stance_is(stance))
        .with_effect(Effect::set_flag(STATE_SHOT, true))
        .with_effect(set_transition(true))
}

fn death(name: &str, stance: BasicStance) -> Operator {
    Operator::new(name)
        .with_precondition(stance_is(stance))
        .with_precondition(Precondition::flag(STATE_SHOT, true))
        .with_effect(Effect::set_flag(STATE_DEAD, true))
        .with_effect(set_transition(false))
}

fn action(name: &str, stance: BasicStance, count_key: &str) -> Operator {
    Operator::new(name)
        .with_precondition(stance_is(stance))
        .with_precondition(weapon_is(WeaponState::Deployed))
        .with_effect(Effect::increment(count_key))
        .with_effect(set_transition(true))
}

/// Builds the full operator library.
pub fn create_operators() -> Vec<Operator> {
    use BasicStance::{Kneeling, Prone, Standing};
    use WeaponState::{Deployed, FiringPosition};

    vec![
        locomotion(ANIM_WALK_READY, Standing, FiringPosition),
        locomotion(ANIM_WALK_DEPLOYED, Standing, Deployed),
        locomotion(ANIM_LOW_WALK_READY, Kneeling, FiringPosition),
        locomotion(ANIM_LOW_WALK_DEPLOYED, Kneeling, Deployed),
        stance_change(ANIM_STAND_TO_KNEEL, Standing, Kneeling),
        stance_change(ANIM_KNEEL_TO_STAND, Kneeling, Standing),
        stance_change(ANIM_PRONE_TO_KNEEL, Prone, Kneeling),
        locomotion(ANIM_CRAWL_READY, Prone, FiringPosition),
        locomotion(ANIM_CRAWL_DEPLOYED, Prone, Deployed),
        stance_change(ANIM_KNEEL_TO_PRONE, Kneeling, Prone),
        weapon_change(OPER_READY_TO_DEPLOYED, FiringPosition, Deployed),
        weapon_change(OPER_DEPLOYED_TO_READY, Deployed, FiringPosition),
        shot(ANIM_SHOT_STANDING, Standing),
        shot(ANIM_SHOT_KNEELING, Kneeling),
        shot(ANIM_SHOT_PRONE, Prone),
        death(ANIM_DEAD_STANDING, Standing),
        death(ANIM_DEAD_KNEELING, Kneeling),
        death(ANIM_DEAD_PRONE, Prone),
        action(ANIM_STANDING_ACTION, Standing, STATE_STANDING_ACTION_COUNT),
        action(ANIM_KNEELING_ACTION, Kneeling, STATE_KNEELING_ACTION_COUNT),
        action(ANIM_PRONE_ACTION, Prone, STATE_PRONE_ACTION_COUNT),
    ]
}

/// Registers the operator library with `helper`.
pub fn register_operators<G: Goal>(helper: &mut PlannerHelper<G>) -> Result<()> {
    for operator in create_operators() {
        helper.add_operator(operator)?;
    }
    Ok(())
}
