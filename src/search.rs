use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

use crate::helper::{Goal, OperatorId, PlannerHelper};
use crate::world_state::WorldState;

/// A node of the search tree. Parents are indices into the arena.
#[derive(Debug)]
struct Node {
    state: WorldState,
    parent: Option<usize>,
    operator: Option<OperatorId>,
    h_cost: f32,
}

impl Node {
    /// Path cost from the root, accumulated on the state itself.
    fn g_cost(&self) -> f32 {
        self.state.cost()
    }

    fn f_cost(&self) -> f32 {
        self.g_cost() + self.h_cost
    }
}

/// Heap entry ordering open nodes by estimated total cost.
#[derive(Debug, Clone)]
struct NodeWrapper {
    idx: usize,
    f_cost: f32,
    g_cost: f32,
}

impl PartialEq for NodeWrapper {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NodeWrapper {}

impl PartialOrd for NodeWrapper {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeWrapper {
    // Wrapped in `Reverse`, so "smaller" pops first: lowest f, then the deeper
    // node (higher g), then the earliest generated.
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_cost
            .partial_cmp(&other.f_cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                other
                    .g_cost
                    .partial_cmp(&self.g_cost)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| self.idx.cmp(&other.idx))
    }
}

/// How a search run ended.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SearchOutcome {
    /// Operators from the start state to a desired state, in order
    Found(Vec<OperatorId>),
    /// Every reachable state was expanded without reaching the goal
    Exhausted,
    /// The time budget ran out first
    TimedOut,
}

/// Counters and the most promising dead end of a search run.
#[derive(Debug, Clone, Default)]
pub(crate) struct SearchStats {
    pub elapsed: Duration,
    pub nodes_expanded: usize,
    pub nodes_generated: usize,
    pub best_state: Option<WorldState>,
}

/// The arena of one search run. Dropped as a whole when the run ends.
struct SearchContext {
    nodes: Vec<Node>,
    open_set: BinaryHeap<Reverse<NodeWrapper>>,
    /// Cheapest path cost seen for each distinct state
    best_g: HashMap<WorldState, f32>,
    best_h: Option<(usize, f32)>,
}

impl SearchContext {
    fn new<G: Goal>(helper: &PlannerHelper<G>) -> Self {
        let mut start = helper.current_state().clone();
        start.reset_cost();
        let h_cost = helper.remaining_cost(&start);

        let mut context = Self {
            nodes: Vec::new(),
            open_set: BinaryHeap::new(),
            best_g: HashMap::new(),
            best_h: None,
        };
        context.push(Node {
            state: start,
            parent: None,
            operator: None,
            h_cost,
        });
        context
    }

    fn push(&mut self, node: Node) -> usize {
        let idx = self.nodes.len();
        let (f_cost, g_cost) = (node.f_cost(), node.g_cost());
        self.best_g.insert(node.state.clone(), g_cost);
        if self.best_h.map_or(true, |(_, h)| node.h_cost < h) {
            self.best_h = Some((idx, node.h_cost));
        }
        self.nodes.push(node);
        self.open_set.push(Reverse(NodeWrapper { idx, f_cost, g_cost }));
        idx
    }

    /// Pops the open node with the lowest estimated total, skipping entries
    /// superseded by a cheaper path to the same state.
    fn next_node(&mut self) -> Option<usize> {
        while let Some(Reverse(wrapper)) = self.open_set.pop() {
            let node = &self.nodes[wrapper.idx];
            let superseded = self
                .best_g
                .get(&node.state)
                .map_or(false, |&best| best < node.g_cost());
            if !superseded {
                return Some(wrapper.idx);
            }
        }
        None
    }

    /// Returns `true` if `state` was already reached at a cost no higher than its own.
    fn already_reached(&self, state: &WorldState) -> bool {
        self.best_g
            .get(state)
            .map_or(false, |&best| best <= state.cost())
    }

    fn reconstruct_path(&self, node_idx: usize) -> Vec<OperatorId> {
        let mut path = Vec::new();
        let mut current = Some(node_idx);
        while let Some(idx) = current {
            let node = &self.nodes[idx];
            if let Some(operator) = node.operator {
                path.push(operator);
            }
            current = node.parent;
        }
        path.reverse();
        path
    }

    fn best_state(&self) -> Option<WorldState> {
        self.best_h.map(|(idx, _)| self.nodes[idx].state.clone())
    }
}

/// Best-first forward search from the helper's current state.
///
/// Expands the open state with the lowest accumulated plus remaining cost and
/// stops as soon as a generated successor satisfies the desired-state test.
/// The budget is polled before every expansion.
pub(crate) fn best_first_search<G: Goal>(
    helper: &PlannerHelper<G>,
    budget: Duration,
) -> (SearchOutcome, SearchStats) {
    let started = Instant::now();
    let mut context = SearchContext::new(helper);
    let mut stats = SearchStats {
        nodes_generated: 1,
        ..SearchStats::default()
    };

    let outcome = if helper.is_desired_state(&context.nodes[0].state) {
        SearchOutcome::Found(Vec::new())
    } else {
        expand_until_goal(helper, &mut context, &mut stats, started, budget)
    };

    stats.elapsed = started.elapsed();
    if !matches!(outcome, SearchOutcome::Found(_)) {
        stats.best_state = context.best_state();
    }
    (outcome, stats)
}

fn expand_until_goal<G: Goal>(
    helper: &PlannerHelper<G>,
    context: &mut SearchContext,
    stats: &mut SearchStats,
    started: Instant,
    budget: Duration,
) -> SearchOutcome {
    loop {
        if started.elapsed() > budget {
            return SearchOutcome::TimedOut;
        }
        let Some(current_idx) = context.next_node() else {
            return SearchOutcome::Exhausted;
        };
        stats.nodes_expanded += 1;

        for (id, operator) in helper.operators() {
            let parent = &context.nodes[current_idx].state;
            if !operator.can_apply(parent) {
                continue;
            }

            let mut successor = parent.clone();
            if let Err(err) = operator.apply(&mut successor) {
                log::warn!(
                    target: "transition_planner",
                    "Operator \"{}\" failed during expansion: {}",
                    operator.name(),
                    err
                );
                continue;
            }
            if context.already_reached(&successor) {
                continue;
            }

            let is_goal = helper.is_desired_state(&successor);
            let h_cost = helper.remaining_cost(&successor);
            let idx = context.push(Node {
                state: successor,
                parent: Some(current_idx),
                operator: Some(id),
                h_cost,
            });
            stats.nodes_generated += 1;

            if is_goal {
                return SearchOutcome::Found(context.reconstruct_path(idx));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helper::FnGoal;
    use crate::operator::{Effect, Operator, Precondition};

    fn flag_goal(
        key: &'static str,
    ) -> FnGoal<impl Fn(&WorldState) -> f32, impl Fn(&WorldState) -> bool> {
        FnGoal::new(
            move |s: &WorldState| {
                if s.get_state::<bool>(key) == Some(true) {
                    0.0
                } else {
                    1.0
                }
            },
            move |s: &WorldState| s.get_state::<bool>(key) == Some(true),
        )
    }

    fn make_operator(name: &str, cost: f32, pre: &[(&str, bool)], eff: &[(&str, bool)]) -> Operator {
        let mut op = Operator::new(name).with_cost(cost).unwrap();
        for (k, v) in pre {
            op.add_precondition(Precondition::flag(*k, *v));
        }
        for (k, v) in eff {
            op.add_effect(Effect::set_flag(*k, *v));
        }
        op
    }

    fn names<G: Goal>(helper: &PlannerHelper<G>, plan: &[OperatorId]) -> Vec<String> {
        plan.iter()
            .map(|id| helper.operator(*id).name().to_string())
            .collect()
    }

    fn initial(keys: &[(&str, bool)]) -> WorldState {
        let mut state = WorldState::new();
        for (k, v) in keys {
            state.add_state(*k, *v).unwrap();
        }
        state
    }

    #[test]
    fn test_already_desired_gives_empty_plan() {
        let mut helper = PlannerHelper::new(flag_goal("goal"));
        helper.set_current_state(initial(&[("goal", true)]));
        let (outcome, stats) = best_first_search(&helper, Duration::from_secs(1));
        assert_eq!(outcome, SearchOutcome::Found(Vec::new()));
        assert_eq!(stats.nodes_expanded, 0);
    }

    #[test]
    fn test_prefers_cheaper_operator() {
        let mut helper = PlannerHelper::new(flag_goal("goal"));
        helper
            .add_operator(make_operator("expensive", 5.0, &[("start", true)], &[("mid", true)]))
            .unwrap();
        helper
            .add_operator(make_operator("cheap", 1.0, &[("start", true)], &[("mid", true)]))
            .unwrap();
        helper
            .add_operator(make_operator("finish", 1.0, &[("mid", true)], &[("goal", true)]))
            .unwrap();
        helper.set_current_state(initial(&[("start", true), ("mid", false), ("goal", false)]));

        let (outcome, _) = best_first_search(&helper, Duration::from_secs(1));
        let SearchOutcome::Found(plan) = outcome else {
            panic!("expected a plan, got {:?}", outcome);
        };
        assert_eq!(names(&helper, &plan), ["cheap", "finish"]);
    }

    #[test]
    fn test_multi_step_plan() {
        let mut helper = PlannerHelper::new(flag_goal("goal"));
        helper
            .add_operator(make_operator("c", 1.0, &[("end", true)], &[("goal", true)]))
            .unwrap();
        helper
            .add_operator(make_operator("b", 1.0, &[("mid", true)], &[("end", true)]))
            .unwrap();
        helper
            .add_operator(make_operator("a", 1.0, &[("start", true)], &[("mid", true)]))
            .unwrap();
        helper.set_current_state(initial(&[
            ("start", true),
            ("mid", false),
            ("end", false),
            ("goal", false),
        ]));

        let (outcome, stats) = best_first_search(&helper, Duration::from_secs(1));
        let SearchOutcome::Found(plan) = outcome else {
            panic!("expected a plan, got {:?}", outcome);
        };
        assert_eq!(names(&helper, &plan), ["a", "b", "c"]);
        assert!(stats.nodes_generated >= 4);
    }

    #[test]
    fn test_unreachable_goal_exhausts_finite_space() {
        let mut helper = PlannerHelper::new(flag_goal("goal"));
        helper
            .add_operator(make_operator("toggle_on", 1.0, &[("x", false)], &[("x", true)]))
            .unwrap();
        helper
            .add_operator(make_operator("toggle_off", 1.0, &[("x", true)], &[("x", false)]))
            .unwrap();
        helper.set_current_state(initial(&[("x", false), ("goal", false)]));

        let (outcome, stats) = best_first_search(&helper, Duration::from_secs(1));
        assert_eq!(outcome, SearchOutcome::Exhausted);
        assert!(stats.best_state.is_some());
        // Only two distinct states exist
        assert_eq!(stats.nodes_generated, 2);
    }

    #[test]
    fn test_infinite_space_times_out() {
        let mut helper = PlannerHelper::new(flag_goal("goal"));
        helper
            .add_operator(Operator::new("count").with_effect(Effect::increment("n")))
            .unwrap();
        let mut state = initial(&[("goal", false)]);
        state.add_state("n", 0u32).unwrap();
        helper.set_current_state(state);

        let budget = Duration::from_millis(20);
        let (outcome, stats) = best_first_search(&helper, budget);
        assert_eq!(outcome, SearchOutcome::TimedOut);
        assert!(stats.elapsed >= budget);
        assert!(stats.nodes_expanded > 0);
    }

    #[test]
    fn test_node_ordering() {
        let low = NodeWrapper { idx: 5, f_cost: 1.0, g_cost: 0.0 };
        let high = NodeWrapper { idx: 0, f_cost: 2.0, g_cost: 0.0 };
        let deep = NodeWrapper { idx: 6, f_cost: 1.0, g_cost: 1.0 };
        let early = NodeWrapper { idx: 1, f_cost: 1.0, g_cost: 1.0 };
        assert!(low < high);
        assert!(deep < low);
        assert!(early < deep);
    }
}
