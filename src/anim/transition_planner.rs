//! # Animation transition planner
//!
//! [`AnimationTransitionPlanner`] keeps a character's animation state as a
//! [`WorldState`], plans the chain of transition clips that reaches the
//! desired stance, weapon state and death state, and turns that plan into a
//! blended [`AnimationSequence`] on an [`AnimationPlayer`].
//!
//! Planning priority is encoded in [`TransitionGoal`]'s heuristic: pending
//! actions first, then the stance change, then the death reaction.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::mpsc::{self, Receiver, Sender};

use serde::{Deserialize, Serialize};

use crate::anim::animatable::{Animatable, AnimationPlayer, AnimationSequence};
use crate::anim::operators::{
    action_count_key, action_operator_name, register_operators, ANIM_WALK_DEPLOYED,
    STATE_BASIC_STANCE, STATE_DEAD, STATE_KNEELING_ACTION_COUNT, STATE_PRONE_ACTION_COUNT,
    STATE_SHOT, STATE_STANDING_ACTION_COUNT, STATE_TRANSITION, STATE_WEAPON,
};
use crate::anim::stance::{BasicStance, WeaponState};
use crate::error::{PlannerError, Result};
use crate::helper::{Goal, OperatorId, PlannerHelper};
use crate::planner::{Planner, PlannerConfig, PlannerResult};
use crate::state::{StateEnum, StateValue};
use crate::world_state::WorldState;

const LOG_TARGET: &str = "transition_planner";

/// Stances that have an action counter, in heuristic order.
const ACTION_STANCES: [BasicStance; 3] = [
    BasicStance::Standing,
    BasicStance::Kneeling,
    BasicStance::Prone,
];

/// Runtime settings of an [`AnimationTransitionPlanner`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionPlannerConfig {
    /// Search budget of one planning attempt, in seconds
    pub max_time_per_iteration: f64,
    /// Overlap between consecutive clips and their fade time, in seconds
    pub blend_time: f32,
    /// Played when no plan can be found even after a reset
    pub fallback_animation: String,
}

impl Default for TransitionPlannerConfig {
    fn default() -> Self {
        Self {
            max_time_per_iteration: 0.5,
            blend_time: 0.2,
            fallback_animation: ANIM_WALK_DEPLOYED.to_string(),
        }
    }
}

/// Published to subscribers whenever new animations start playing.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionEvent {
    AnimationsTransitioning {
        /// Name of the generated sequence, `None` when the fallback was forced
        sequence_id: Option<String>,
        fallback: bool,
    },
}

/// The desired character state and the actions requested so far.
#[derive(Debug, Clone)]
pub struct TransitionGoal {
    stance: BasicStance,
    weapon_state: WeaponState,
    is_dead: bool,
    executed_action_counts: HashMap<BasicStance, u32>,
}

impl TransitionGoal {
    pub fn new() -> Self {
        Self {
            stance: BasicStance::Standing,
            weapon_state: WeaponState::Stowed,
            is_dead: false,
            executed_action_counts: BasicStance::ALL.into_iter().map(|s| (s, 0)).collect(),
        }
    }

    pub fn stance(&self) -> BasicStance {
        self.stance
    }

    pub fn set_stance(&mut self, stance: BasicStance) {
        self.stance = stance;
    }

    pub fn weapon_state(&self) -> WeaponState {
        self.weapon_state
    }

    pub fn set_weapon_state(&mut self, weapon_state: WeaponState) {
        self.weapon_state = weapon_state;
    }

    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    pub fn set_is_dead(&mut self, is_dead: bool) {
        self.is_dead = is_dead;
    }

    pub fn executed_action_count(&self, stance: BasicStance) -> u32 {
        self.executed_action_counts.get(&stance).copied().unwrap_or(0)
    }

    /// Records one more requested action in `stance`.
    pub fn record_action(&mut self, stance: BasicStance) {
        let count = self.executed_action_counts.entry(stance).or_insert(0);
        *count = count.saturating_add(1);
    }

    /// Actions requested in `stance` that `state` has not performed yet.
    ///
    /// A missing counter counts as nothing pending.
    pub fn pending_actions(&self, state: &WorldState, stance: BasicStance) -> u32 {
        let Some(key) = action_count_key(stance) else {
            return 0;
        };
        match state.get_state::<u32>(key) {
            Some(performed) => self.executed_action_count(stance).saturating_sub(performed),
            None => 0,
        }
    }

    fn total_pending_actions(&self, state: &WorldState) -> u32 {
        ACTION_STANCES
            .into_iter()
            .map(|stance| self.pending_actions(state, stance))
            .sum()
    }
}

impl Default for TransitionGoal {
    fn default() -> Self {
        Self::new()
    }
}

impl Goal for TransitionGoal {
    fn remaining_cost(&self, state: &WorldState) -> f32 {
        let mut value = 1.0;

        if let Some(weapon) = state.get_state::<WeaponState>(STATE_WEAPON) {
            if weapon != self.weapon_state.effective() {
                value += 1.0;
            }
        }

        let pending = self.total_pending_actions(state);
        value += 2.0 * pending as f32;

        // The stance only counts once every pending action is done.
        if pending == 0 {
            if let Some(stance) = state.get_state::<BasicStance>(STATE_BASIC_STANCE) {
                value += (stance.cost_value() - self.stance.cost_value()).abs();
            }
        }

        if state.get_state::<bool>(STATE_DEAD).unwrap_or(false) != self.is_dead {
            value += 1.0;
        }

        value
    }

    fn is_desired_state(&self, state: &WorldState) -> bool {
        if state.get_state::<bool>(STATE_TRANSITION).unwrap_or(false) {
            return false;
        }

        let dead = state.get_state::<bool>(STATE_DEAD).unwrap_or(false);
        if dead != self.is_dead {
            return false;
        }
        if dead {
            return true;
        }

        if let Some(stance) = state.get_state::<BasicStance>(STATE_BASIC_STANCE) {
            if stance != self.stance {
                return false;
            }
        }

        if let Some(weapon) = state.get_state::<WeaponState>(STATE_WEAPON) {
            if weapon != self.weapon_state.effective() {
                return false;
            }
        }

        self.total_pending_actions(state) == 0
    }
}

/// The state a character starts from, and returns to after a reset.
///
/// The transition flag starts raised so the first plan always ends in a
/// locomotion clip.
pub fn baseline_state() -> WorldState {
    [
        (STATE_BASIC_STANCE, StateValue::from(BasicStance::Standing.enum_value())),
        (STATE_WEAPON, StateValue::from(WeaponState::Deployed.enum_value())),
        (STATE_DEAD, StateValue::from(false)),
        (STATE_TRANSITION, StateValue::from(true)),
        (STATE_STANDING_ACTION_COUNT, StateValue::from(0u32)),
        (STATE_KNEELING_ACTION_COUNT, StateValue::from(0u32)),
        (STATE_PRONE_ACTION_COUNT, StateValue::from(0u32)),
        (STATE_SHOT, StateValue::from(false)),
    ]
    .into_iter()
    .collect()
}

/// Plans and plays animation transitions for one character.
///
/// ```
/// use transition_planner::anim::{AnimationTransitionPlanner, BasicStance};
///
/// let mut planner = AnimationTransitionPlanner::new(Default::default()).unwrap();
/// planner.setup();
/// planner.set_stance(BasicStance::Prone);
///
/// assert!(planner.generate_new_animation_sequence());
/// assert_eq!(
///     planner.current_plan_names(),
///     vec!["Stand To Kneel", "Kneel To Prone", "Prone-Crawl Deployed"]
/// );
/// ```
pub struct AnimationTransitionPlanner {
    helper: PlannerHelper<TransitionGoal>,
    planner: Planner,
    config: TransitionPlannerConfig,
    current_plan: Vec<OperatorId>,
    sequence_counter: Option<u8>,
    listeners: Vec<Sender<TransitionEvent>>,
}

impl AnimationTransitionPlanner {
    /// Creates a planner with the full operator library registered.
    ///
    /// The current state is empty until [`setup`](Self::setup) or
    /// [`on_entered_world`](Self::on_entered_world) runs.
    pub fn new(config: TransitionPlannerConfig) -> Result<Self> {
        let mut helper = PlannerHelper::new(TransitionGoal::new());
        register_operators(&mut helper)?;
        let planner = Planner::new(PlannerConfig {
            max_time_per_iteration: config.max_time_per_iteration,
        });
        Ok(Self {
            helper,
            planner,
            config,
            current_plan: Vec::new(),
            sequence_counter: None,
            listeners: Vec::new(),
        })
    }

    /// Resets the current state to the baseline. Requested action counts are kept.
    pub fn setup(&mut self) {
        self.helper.set_current_state(baseline_state());
    }

    pub fn config(&self) -> &TransitionPlannerConfig {
        &self.config
    }

    pub fn stance(&self) -> BasicStance {
        self.helper.goal().stance()
    }

    pub fn set_stance(&mut self, stance: BasicStance) {
        self.helper.goal_mut().set_stance(stance);
    }

    pub fn weapon_state(&self) -> WeaponState {
        self.helper.goal().weapon_state()
    }

    pub fn set_weapon_state(&mut self, weapon_state: WeaponState) {
        self.helper.goal_mut().set_weapon_state(weapon_state);
    }

    pub fn is_dead(&self) -> bool {
        self.helper.goal().is_dead()
    }

    pub fn set_is_dead(&mut self, is_dead: bool) {
        self.helper.goal_mut().set_is_dead(is_dead);
    }

    pub fn max_time_per_iteration(&self) -> f64 {
        self.config.max_time_per_iteration
    }

    pub fn set_max_time_per_iteration(&mut self, seconds: f64) {
        self.config.max_time_per_iteration = seconds;
    }

    pub fn executed_action_count(&self, stance: BasicStance) -> u32 {
        self.helper.goal().executed_action_count(stance)
    }

    /// Requests one action in `stance`, played as `animatable_name`.
    ///
    /// When the name differs from the stance's generic action clip it is
    /// queued on that action operator and used the next time the operator is
    /// played.
    pub fn execute_action(&mut self, animatable_name: &str, stance: BasicStance) {
        self.helper.goal_mut().record_action(stance);

        let Some(action_name) = action_operator_name(stance) else {
            return;
        };
        if animatable_name != action_name {
            if let Some(operator) = self.helper.operator_by_name_mut(action_name) {
                operator.enqueue_replacement_anim(animatable_name);
            }
        }
    }

    pub fn current_state(&self) -> &WorldState {
        self.helper.current_state()
    }

    pub fn is_desired_state(&self, state: &WorldState) -> bool {
        self.helper.is_desired_state(state)
    }

    pub fn remaining_cost(&self, state: &WorldState) -> f32 {
        self.helper.remaining_cost(state)
    }

    pub fn helper(&self) -> &PlannerHelper<TransitionGoal> {
        &self.helper
    }

    /// The search engine, for diagnostics of the last planning attempt.
    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    /// The last plan found. Empty after a failed attempt.
    pub fn current_plan(&self) -> &[OperatorId] {
        &self.current_plan
    }

    pub fn current_plan_names(&self) -> Vec<&str> {
        self.current_plan
            .iter()
            .map(|&id| self.helper.operator(id).name())
            .collect()
    }

    /// Name of the last generated sequence, `seq:0` through `seq:9`.
    pub fn sequence_id(&self) -> Option<String> {
        self.sequence_counter.map(|n| format!("seq:{}", n))
    }

    /// Registers a listener for [`TransitionEvent`]s.
    pub fn subscribe(&mut self) -> Receiver<TransitionEvent> {
        let (sender, receiver) = mpsc::channel();
        self.listeners.push(sender);
        receiver
    }

    /// Replans if the current state is not the desired one.
    pub fn check_and_update_animation_state(&mut self, player: &mut dyn AnimationPlayer) {
        if !self.helper.is_desired_state(self.helper.current_state()) {
            log::debug!(
                target: LOG_TARGET,
                "The planner is not in the desired state. Generating animations."
            );
            self.update_plan_and_animations(player);
        }
    }

    /// Plans from the current state and plays the result.
    ///
    /// A failed plan is retried once from the baseline state. If that fails
    /// too, every animation is cleared and the fallback animation is forced.
    pub fn update_plan_and_animations(&mut self, player: &mut dyn AnimationPlayer) {
        let blend_time = self.config.blend_time;

        let was_dead = self
            .helper
            .current_state()
            .get_state::<bool>(STATE_DEAD)
            .unwrap_or(false);
        if was_dead && !self.is_dead() {
            log::debug!(target: LOG_TARGET, "Character is no longer dead, resetting state");
            self.setup();
        }

        let mut found = self.generate_new_animation_sequence();
        if !found {
            self.setup();
            found = self.generate_new_animation_sequence();
        }

        if !found {
            player.clear_all(blend_time);
            if !player.play_registered(&self.config.fallback_animation) {
                log::warn!(
                    target: LOG_TARGET,
                    "{}",
                    PlannerError::AnimationNotRegistered(self.config.fallback_animation.clone())
                );
            }
            self.notify(TransitionEvent::AnimationsTransitioning {
                sequence_id: None,
                fallback: true,
            });
            return;
        }

        let sequence_id = self.advance_sequence_id();
        log::debug!(
            target: LOG_TARGET,
            "Current animation plan has {} steps.",
            self.current_plan.len()
        );
        if self.current_plan.is_empty() {
            return;
        }

        let mut sequence = AnimationSequence::new(sequence_id.clone());
        let mut accumulated_start = 0.0f32;
        let mut previous_scheduled = false;

        let plan = self.current_plan.clone();
        for id in plan {
            // A clip followed by another one plays once and ends.
            if previous_scheduled {
                if let Some(previous) = sequence.last_mut() {
                    if let Some(duration) = previous.duration() {
                        accumulated_start += duration - blend_time;
                        previous.set_max_duration(duration);
                        previous.set_action(true);
                    }
                }
            }

            match self.apply_operator_and_get_animatable(id, &*player) {
                Some(mut animatable) => {
                    log::debug!(
                        target: LOG_TARGET,
                        "Adding animatable named \"{}\".",
                        animatable.name()
                    );
                    animatable.set_start_delay(accumulated_start.max(0.0));
                    animatable.set_fade_in(blend_time);
                    animatable.set_fade_out(blend_time);
                    sequence.add_animation(animatable);
                    previous_scheduled = true;
                }
                None => previous_scheduled = false,
            }
        }

        player.clear_active_animations(blend_time);
        player.play_animation(sequence);
        self.notify(TransitionEvent::AnimationsTransitioning {
            sequence_id: Some(sequence_id),
            fallback: false,
        });
    }

    /// Runs one planning attempt from the current state.
    ///
    /// On failure the plan is left empty and the full context of the attempt
    /// is logged as an error.
    pub fn generate_new_animation_sequence(&mut self) -> bool {
        self.current_plan.clear();
        self.planner.config_mut().max_time_per_iteration = self.config.max_time_per_iteration;

        match self.planner.generate_plan(&self.helper) {
            PlannerResult::PlanFound => {
                self.current_plan = self.planner.result().to_vec();
                true
            }
            PlannerResult::NoPlanFound => {
                log::error!(target: LOG_TARGET, "{}", self.failure_report());
                false
            }
        }
    }

    /// Runs the initial setup when the character enters the world.
    pub fn on_entered_world(&mut self, player: &mut dyn AnimationPlayer) {
        if player.has_model() {
            self.on_model_loaded(player);
        } else {
            self.setup();
        }
    }

    pub fn on_model_loaded(&mut self, player: &mut dyn AnimationPlayer) {
        self.setup();
        self.update_plan_and_animations(player);
    }

    pub fn on_model_unloaded(&mut self) {
        log::debug!(target: LOG_TARGET, "Model unloaded, keeping planner state");
    }

    fn apply_operator_and_get_animatable(
        &mut self,
        id: OperatorId,
        player: &dyn AnimationPlayer,
    ) -> Option<Animatable> {
        if let Err(err) = self.helper.apply_to_current(id) {
            log::warn!(
                target: LOG_TARGET,
                "Applying \"{}\" failed: {}",
                self.helper.operator(id).name(),
                err
            );
        }

        let name = self.helper.operator_mut(id).resolve_animation_name();
        match player.registered_animation(&name) {
            Some(animatable) => Some(animatable.clone()),
            None => {
                log::warn!(target: LOG_TARGET, "{}", PlannerError::AnimationNotRegistered(name));
                None
            }
        }
    }

    fn advance_sequence_id(&mut self) -> String {
        let next = match self.sequence_counter {
            None => 0,
            Some(n) => (n + 1) % 10,
        };
        self.sequence_counter = Some(next);
        format!("seq:{}", next)
    }

    fn notify(&mut self, event: TransitionEvent) {
        self.listeners
            .retain(|listener| listener.send(event.clone()).is_ok());
    }

    fn failure_report(&self) -> String {
        let goal = self.helper.goal();
        let mut report = format!(
            "Unable to generate a plan. Time[{:?}]\n\nGoing from:\n\n{}\n\n Going To:\n\n\
             Stance: \"{}\"\n Primary Weapon: \"{}\"\n IsDead: \"{}\"\n",
            self.planner.total_elapsed(),
            self.helper.current_state(),
            goal.stance(),
            goal.weapon_state(),
            goal.is_dead()
        );
        for stance in BasicStance::ALL {
            let _ = writeln!(
                report,
                "{}: \"{}\"",
                stance,
                goal.executed_action_count(stance)
            );
        }
        report
    }
}
