use std::collections::HashMap;

use transition_planner::anim::operators::create_operators;
use transition_planner::anim::{
    baseline_state, Animatable, AnimationPlayer, AnimationSequence, AnimationTransitionPlanner,
    BasicStance, TransitionEvent, TransitionPlannerConfig, WeaponState,
};
use transition_planner::PlannerStatus;

/// Records every call the planner makes on the animation system.
#[derive(Default)]
struct RecordingPlayer {
    has_model: bool,
    registered: HashMap<String, Animatable>,
    played: Vec<AnimationSequence>,
    forced: Vec<String>,
    active_clears: usize,
    full_clears: usize,
}

impl RecordingPlayer {
    fn with_all_clips() -> Self {
        let mut player = RecordingPlayer {
            has_model: true,
            ..Default::default()
        };
        for op in create_operators() {
            player.register(Animatable::channel(op.name(), 1.0));
        }
        player.register(Animatable::channel("CustomClip", 0.5));
        player
    }

    fn register(&mut self, animatable: Animatable) {
        self.registered
            .insert(animatable.name().to_string(), animatable);
    }

    fn last_played_names(&self) -> Vec<&str> {
        self.played
            .last()
            .map(|seq| seq.animations().iter().map(|a| a.name()).collect())
            .unwrap_or_default()
    }
}

impl AnimationPlayer for RecordingPlayer {
    fn has_model(&self) -> bool {
        self.has_model
    }

    fn registered_animation(&self, name: &str) -> Option<&Animatable> {
        self.registered.get(name)
    }

    fn play_animation(&mut self, sequence: AnimationSequence) {
        self.played.push(sequence);
    }

    fn clear_active_animations(&mut self, _blend_time: f32) {
        self.active_clears += 1;
    }

    fn clear_all(&mut self, _blend_time: f32) {
        self.full_clears += 1;
    }

    fn play_registered(&mut self, name: &str) -> bool {
        self.forced.push(name.to_string());
        self.registered.contains_key(name)
    }
}

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-5
}

fn entered_planner(player: &mut RecordingPlayer) -> AnimationTransitionPlanner {
    let mut planner = AnimationTransitionPlanner::new(TransitionPlannerConfig::default()).unwrap();
    planner.on_entered_world(player);
    planner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_plan_ends_in_deployed_walk() {
        let mut player = RecordingPlayer::with_all_clips();
        let mut planner = AnimationTransitionPlanner::new(TransitionPlannerConfig::default()).unwrap();
        let events = planner.subscribe();

        planner.on_entered_world(&mut player);

        assert_eq!(planner.current_plan_names(), vec!["Walk Run Deployed"]);
        assert_eq!(player.played.len(), 1);
        assert_eq!(player.played[0].name(), "seq:0");
        assert_eq!(player.last_played_names(), vec!["Walk Run Deployed"]);
        assert_eq!(player.active_clears, 1);
        assert_eq!(
            events.try_recv().unwrap(),
            TransitionEvent::AnimationsTransitioning {
                sequence_id: Some("seq:0".to_string()),
                fallback: false,
            }
        );

        // Nothing left to do
        assert!(planner.is_desired_state(planner.current_state()));
        planner.check_and_update_animation_state(&mut player);
        assert_eq!(player.played.len(), 1);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_standing_to_prone_goes_through_kneeling() {
        let mut player = RecordingPlayer::with_all_clips();
        let mut planner = entered_planner(&mut player);

        planner.set_stance(BasicStance::Prone);
        planner.check_and_update_animation_state(&mut player);

        assert_eq!(
            planner.current_plan_names(),
            vec!["Stand To Kneel", "Kneel To Prone", "Prone-Crawl Deployed"]
        );
        assert_eq!(
            planner.current_state().get_state::<BasicStance>("BasicStanceState"),
            Some(BasicStance::Prone)
        );

        let sequence = player.played.last().unwrap();
        assert_eq!(sequence.name(), "seq:1");
        let clips = sequence.animations();
        assert_eq!(clips.len(), 3);

        // Every clip but the last plays once, overlapping the next by the blend time
        assert!(approx_eq(clips[0].start_delay(), 0.0));
        assert!(approx_eq(clips[1].start_delay(), 0.8));
        assert!(approx_eq(clips[2].start_delay(), 1.6));
        assert!(clips[0].is_action());
        assert!(clips[1].is_action());
        assert!(!clips[2].is_action());
        assert_eq!(clips[0].max_duration(), Some(1.0));
        assert_eq!(clips[2].max_duration(), None);
        for clip in clips {
            assert!(approx_eq(clip.fade_in(), 0.2));
            assert!(approx_eq(clip.fade_out(), 0.2));
        }
    }

    #[test]
    fn test_death_plays_shot_then_one_death() {
        let mut player = RecordingPlayer::with_all_clips();
        let mut planner = AnimationTransitionPlanner::new(TransitionPlannerConfig::default()).unwrap();
        planner.setup();
        planner.set_is_dead(true);

        planner.update_plan_and_animations(&mut player);

        let plan = planner.current_plan_names();
        assert_eq!(plan, vec!["Shot Standing", "Dead Standing"]);
        assert_eq!(plan.iter().filter(|n| n.starts_with("Dead")).count(), 1);
        assert!(planner.is_desired_state(planner.current_state()));
    }

    #[test]
    fn test_revival_resets_to_baseline() {
        let mut player = RecordingPlayer::with_all_clips();
        let mut planner = entered_planner(&mut player);
        planner.set_is_dead(true);
        planner.check_and_update_animation_state(&mut player);
        assert_eq!(
            planner.current_state().get_state::<bool>("DeadState"),
            Some(true)
        );

        planner.set_is_dead(false);
        planner.check_and_update_animation_state(&mut player);

        assert_eq!(planner.current_plan_names(), vec!["Walk Run Deployed"]);
        assert_eq!(
            planner.current_state().get_state::<bool>("DeadState"),
            Some(false)
        );
        assert_eq!(
            planner.current_state().get_state::<bool>("ShotState"),
            Some(false)
        );
    }

    #[test]
    fn test_action_plays_requested_clip_once() {
        let mut player = RecordingPlayer::with_all_clips();
        let mut planner = entered_planner(&mut player);

        planner.execute_action("CustomClip", BasicStance::Standing);
        planner.check_and_update_animation_state(&mut player);

        assert_eq!(
            planner.current_plan_names(),
            vec!["Standing Action", "Walk Run Deployed"]
        );
        assert_eq!(player.last_played_names(), vec!["CustomClip", "Walk Run Deployed"]);
        let clips = player.played.last().unwrap().animations();
        assert_eq!(clips[0].max_duration(), Some(0.5));
        assert!(approx_eq(clips[1].start_delay(), 0.3));

        // A generic request falls back to the operator's own clip
        planner.execute_action("Standing Action", BasicStance::Standing);
        planner.check_and_update_animation_state(&mut player);
        assert_eq!(
            player.last_played_names(),
            vec!["Standing Action", "Walk Run Deployed"]
        );
        assert_eq!(planner.executed_action_count(BasicStance::Standing), 2);
    }

    #[test]
    fn test_unreachable_goal_forces_fallback() {
        let mut player = RecordingPlayer::with_all_clips();
        let config = TransitionPlannerConfig {
            max_time_per_iteration: 0.05,
            ..Default::default()
        };
        let mut planner = AnimationTransitionPlanner::new(config).unwrap();
        planner.on_entered_world(&mut player);
        let events = planner.subscribe();
        let played_before = player.played.len();

        planner.set_stance(BasicStance::Idle);
        planner.check_and_update_animation_state(&mut player);

        assert_eq!(planner.planner().status(), PlannerStatus::NoPlanFound);
        assert!(planner.current_plan().is_empty());
        assert_eq!(player.full_clears, 1);
        assert_eq!(player.forced, vec!["Walk Run Deployed"]);
        assert_eq!(player.played.len(), played_before);
        assert_eq!(
            events.try_recv().unwrap(),
            TransitionEvent::AnimationsTransitioning {
                sequence_id: None,
                fallback: true,
            }
        );
        // The retry ran from the baseline state
        assert_eq!(planner.current_state(), &baseline_state());
    }

    #[test]
    fn test_sequence_names_cycle() {
        let mut player = RecordingPlayer::with_all_clips();
        let mut planner = entered_planner(&mut player);

        for i in 0..10 {
            let stance = if i % 2 == 0 {
                BasicStance::Kneeling
            } else {
                BasicStance::Standing
            };
            planner.set_stance(stance);
            planner.check_and_update_animation_state(&mut player);
        }

        let names: Vec<_> = player.played.iter().map(|seq| seq.name()).collect();
        assert_eq!(names.len(), 11);
        assert_eq!(names[0], "seq:0");
        assert_eq!(names[9], "seq:9");
        assert_eq!(names[10], "seq:0");
    }

    #[test]
    fn test_empty_plan_plays_nothing() {
        let mut player = RecordingPlayer::with_all_clips();
        let mut planner = entered_planner(&mut player);
        let events = planner.subscribe();

        planner.update_plan_and_animations(&mut player);

        assert!(planner.current_plan().is_empty());
        assert_eq!(player.played.len(), 1);
        assert_eq!(player.active_clears, 1);
        assert!(events.try_recv().is_err());
        assert_eq!(planner.sequence_id(), Some("seq:1".to_string()));
    }

    #[test]
    fn test_missing_clip_is_skipped() {
        let mut player = RecordingPlayer::with_all_clips();
        player.registered.remove("Stand To Kneel");
        let mut planner = entered_planner(&mut player);

        planner.set_stance(BasicStance::Kneeling);
        planner.check_and_update_animation_state(&mut player);

        assert_eq!(
            planner.current_plan_names(),
            vec!["Stand To Kneel", "Kneel-Low Walk Deployed"]
        );
        let clips = player.played.last().unwrap().animations();
        assert_eq!(clips.len(), 1);
        assert_eq!(clips[0].name(), "Kneel-Low Walk Deployed");
        assert!(approx_eq(clips[0].start_delay(), 0.0));
        // The state still advanced past the missing clip
        assert_eq!(
            planner.current_state().get_state::<BasicStance>("BasicStanceState"),
            Some(BasicStance::Kneeling)
        );
    }

    #[test]
    fn test_firing_position_is_planned() {
        let mut player = RecordingPlayer::with_all_clips();
        let mut planner = entered_planner(&mut player);

        planner.set_weapon_state(WeaponState::FiringPosition);
        planner.check_and_update_animation_state(&mut player);

        assert_eq!(
            planner.current_plan_names(),
            vec!["Deployed To Ready", "Walk Run Ready"]
        );
        assert_eq!(
            planner.current_state().get_state::<WeaponState>("WeaponState"),
            Some(WeaponState::FiringPosition)
        );
    }

    #[test]
    fn test_entering_without_model_only_sets_up() {
        let mut player = RecordingPlayer::with_all_clips();
        player.has_model = false;
        let mut planner = entered_planner(&mut player);

        assert!(player.played.is_empty());
        assert_eq!(planner.current_state(), &baseline_state());

        player.has_model = true;
        planner.on_model_loaded(&mut player);
        assert_eq!(player.played.len(), 1);

        planner.on_model_unloaded();
        assert_eq!(
            planner.current_state().get_state::<bool>("TransitionState"),
            Some(false)
        );
    }

    #[test]
    fn test_dropped_subscriber_does_not_block_others() {
        let mut player = RecordingPlayer::with_all_clips();
        let mut planner = AnimationTransitionPlanner::new(TransitionPlannerConfig::default()).unwrap();
        let dropped = planner.subscribe();
        let kept = planner.subscribe();
        drop(dropped);

        planner.on_entered_world(&mut player);
        assert!(kept.try_recv().is_ok());
    }

    #[test]
    fn test_unbounded_budget_still_plans() {
        let config: TransitionPlannerConfig =
            serde_json::from_str(r#"{ "max_time_per_iteration": 1e300 }"#).unwrap();
        let mut planner = AnimationTransitionPlanner::new(config).unwrap();
        planner.setup();
        assert!(planner.generate_new_animation_sequence());
        assert_eq!(planner.current_plan_names(), vec!["Walk Run Deployed"]);

        let mut planner = AnimationTransitionPlanner::new(TransitionPlannerConfig::default()).unwrap();
        planner.set_max_time_per_iteration(f64::INFINITY);
        planner.setup();
        planner.set_stance(BasicStance::Kneeling);
        assert!(planner.generate_new_animation_sequence());
        assert_eq!(
            planner.current_plan_names(),
            vec!["Stand To Kneel", "Kneel-Low Walk Deployed"]
        );
    }

    #[test]
    fn test_config_from_json() {
        let config: TransitionPlannerConfig =
            serde_json::from_str(r#"{ "blend_time": 0.1 }"#).unwrap();
        assert!(approx_eq(config.blend_time, 0.1));
        assert_eq!(config.max_time_per_iteration, 0.5);
        assert_eq!(config.fallback_animation, "Walk Run Deployed");

        let stance: BasicStance = serde_json::from_str(r#""PRONE""#).unwrap();
        assert_eq!(stance, BasicStance::Prone);
    }
}
