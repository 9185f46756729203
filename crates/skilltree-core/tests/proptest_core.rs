//! Property-based tests for the skill catalog and progression engine.
//!
//! Uses proptest to generate random prerequisite DAGs and unlock sequences,
//! then verify structural invariants hold.

use proptest::prelude::*;
use skilltree_core::catalog::{CatalogIntegrityError, SkillCatalogBuilder, SkillNode};
use skilltree_core::effect::Effect;
use skilltree_core::engine::{NodeState, ProgressionEngine};
use skilltree_core::id::{Category, SkillId};
use skilltree_core::test_utils::*;
use std::collections::HashSet;
use std::sync::Arc;

// ===========================================================================
// Generators
// ===========================================================================

fn id(i: usize) -> String {
    format!("n{i}")
}

/// Random acyclic skill definitions. Node `i` may only require nodes `< i`.
fn arb_dag(max_nodes: usize) -> impl Strategy<Value = Vec<SkillNode>> {
    (1..=max_nodes).prop_flat_map(|n| {
        proptest::collection::vec((1..60u32, 1..=5u8, 0..5usize, any::<u64>(), any::<u64>()), n)
            .prop_map(|specs| {
                specs
                    .into_iter()
                    .enumerate()
                    .map(|(i, (cost, tier, cat, mask_a, mask_b))| {
                        // Two masks and-ed together keep roughly a quarter of
                        // the candidate edges.
                        let mask = mask_a & mask_b;
                        let prereqs: Vec<String> =
                            (0..i).filter(|j| mask >> (j % 64) & 1 == 1).map(id).collect();
                        SkillNode::new(
                            id(i),
                            id(i),
                            cost,
                            tier,
                            Category::ALL[cat],
                            Effect::Damage(1.0),
                        )
                        .with_prerequisites(prereqs)
                    })
                    .collect()
            })
    })
}

/// A built engine plus a sequence of unlock attempts (node indices) and XP.
fn arb_session(max_nodes: usize) -> impl Strategy<Value = (Vec<SkillNode>, Vec<usize>, u32)> {
    arb_dag(max_nodes).prop_flat_map(|nodes| {
        let n = nodes.len();
        (
            Just(nodes),
            proptest::collection::vec(0..n, 0..40),
            0..80u32,
        )
    })
}

fn engine_for(nodes: Vec<SkillNode>) -> ProgressionEngine {
    ProgressionEngine::new(catalog_of(nodes))
}

/// Unlock whatever the attempts allow; rejections are expected and ignored.
fn play(engine: &mut ProgressionEngine, attempts: &[usize], xp: u32) {
    let mut player = TestPlayer::new(xp);
    for &i in attempts {
        let _ = engine.unlock(&id(i), &mut player);
    }
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Forward-only prerequisites always build.
    #[test]
    fn dags_always_build(nodes in arb_dag(30)) {
        let mut builder = SkillCatalogBuilder::new();
        builder.extend(nodes);
        prop_assert!(builder.build().is_ok());
    }

    /// Making an ancestor depend on its descendant is reported as a cycle.
    #[test]
    fn back_edge_is_a_cycle(nodes in arb_dag(20), pick in any::<usize>()) {
        let catalog = catalog_of(nodes.clone());
        let with_ancestors: Vec<(usize, Vec<&SkillId>)> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (i, catalog.ancestors(&n.id).into_iter().collect::<Vec<_>>()))
            .filter(|(_, a)| !a.is_empty())
            .collect();
        prop_assume!(!with_ancestors.is_empty());

        let (descendant, ancestors) = &with_ancestors[pick % with_ancestors.len()];
        let ancestor = ancestors[pick % ancestors.len()].clone();
        let descendant_id = nodes[*descendant].id.clone();

        let mut broken = nodes.clone();
        if let Some(node) = broken.iter_mut().find(|n| n.id == ancestor) {
            node.prerequisites.push(descendant_id);
        }

        let mut builder = SkillCatalogBuilder::new();
        builder.extend(broken);
        let is_cycle = matches!(builder.build(), Err(CatalogIntegrityError::Cycle { .. }));
        prop_assert!(is_cycle);
    }

    /// `can_unlock` agrees with the four eligibility conditions.
    #[test]
    fn can_unlock_matches_definition((nodes, attempts, xp) in arb_session(20), query_xp in 0..80u32) {
        let mut engine = engine_for(nodes.clone());
        play(&mut engine, &attempts, xp);

        for node in &nodes {
            let expected = !engine.is_unlocked(node.id.as_str())
                && query_xp >= node.cost
                && node.prerequisites.iter().all(|p| engine.is_unlocked(p.as_str()));
            prop_assert_eq!(engine.can_unlock(node.id.as_str(), query_xp), expected);
            prop_assert_eq!(
                engine.node_state(node.id.as_str(), query_xp) == Some(NodeState::Available),
                expected
            );
        }
        prop_assert!(!engine.can_unlock("not-a-skill", u32::MAX));
    }

    /// Every unlocked skill has all of its prerequisites unlocked.
    #[test]
    fn unlocked_set_is_prerequisite_closed((nodes, attempts, xp) in arb_session(20)) {
        let mut engine = engine_for(nodes);
        play(&mut engine, &attempts, xp);
        engine.undo().ok();

        let catalog = Arc::clone(engine.catalog());
        for id in engine.unlocked() {
            let node = catalog.get(id).unwrap();
            for p in &node.prerequisites {
                prop_assert!(engine.is_unlocked(p.as_str()), "{} unlocked without {}", id, p);
            }
        }
    }

    /// Undoing a successful unlock restores the previous set exactly.
    #[test]
    fn unlock_then_undo_round_trips((nodes, attempts, xp) in arb_session(20)) {
        let mut engine = engine_for(nodes.clone());
        play(&mut engine, &attempts, xp);

        let before: HashSet<SkillId> = engine.unlocked_set().clone();
        let count = engine.unlocked_count();
        let mut player = TestPlayer::new(u32::MAX);

        if let Some(target) = engine.available(u32::MAX).first().cloned() {
            engine.unlock(target.as_str(), &mut player).unwrap();
            prop_assert_eq!(engine.unlocked_count(), count + 1);
            let record = engine.undo().unwrap();
            prop_assert_eq!(record.skill, target);
            prop_assert_eq!(engine.unlocked_set(), &before);
            prop_assert_eq!(engine.unlocked_count(), count);
            prop_assert_eq!(player.xp, u32::MAX);
        }
    }

    /// Paths are duplicate-free, end at the target, contain only the target
    /// and its ancestors, respect prerequisite order, and sum to the
    /// reported cost.
    #[test]
    fn unlock_path_properties((nodes, attempts, xp) in arb_session(25), pick in any::<usize>()) {
        let mut engine = engine_for(nodes.clone());
        play(&mut engine, &attempts, xp);

        let target = &nodes[pick % nodes.len()];
        let path = engine.unlock_path(target.id.as_str()).unwrap();
        let catalog = Arc::clone(engine.catalog());

        if engine.is_unlocked(target.id.as_str()) {
            prop_assert!(path.is_empty());
            return Ok(());
        }

        let unique: HashSet<&SkillId> = path.iter().collect();
        prop_assert_eq!(unique.len(), path.len());
        prop_assert_eq!(path.last(), Some(&target.id));

        let ancestors = catalog.ancestors(&target.id);
        for (pos, step) in path.iter().enumerate() {
            prop_assert!(!engine.is_unlocked(step.as_str()));
            prop_assert!(step == &target.id || ancestors.contains(step));
            for p in &catalog.get(step).unwrap().prerequisites {
                prop_assert!(engine.is_unlocked(p.as_str()) || path[..pos].contains(p));
            }
        }

        let sum: u64 = path.iter().map(|s| u64::from(catalog.get(s).unwrap().cost)).sum();
        prop_assert_eq!(engine.total_unlock_cost(target.id.as_str()), Some(sum));

        // Walking the path with enough XP unlocks the target.
        let mut player = TestPlayer::new(u32::MAX);
        for step in &path {
            prop_assert!(engine.unlock(step.as_str(), &mut player).is_ok());
        }
        prop_assert!(engine.is_unlocked(target.id.as_str()));
    }

    /// Recommendation order is deterministic and sorted by the documented key.
    #[test]
    fn optimal_order_is_stable((nodes, attempts, xp) in arb_session(25), cat in 0..5usize, query_xp in 0..80u32) {
        let mut engine = engine_for(nodes);
        play(&mut engine, &attempts, xp);
        let priority = Category::ALL[cat];

        let first = engine.optimal_unlock_order(priority, query_xp);
        prop_assert_eq!(&first, &engine.optimal_unlock_order(priority, query_xp));

        let mut available = engine.available(query_xp);
        let mut sorted = first.clone();
        available.sort();
        sorted.sort();
        prop_assert_eq!(available, sorted);

        let catalog = Arc::clone(engine.catalog());
        let keys: Vec<_> = first
            .iter()
            .map(|s| {
                let n = catalog.get(s).unwrap();
                (n.category != priority, n.cost, n.tier)
            })
            .collect();
        prop_assert!(keys.windows(2).all(|w| w[0] <= w[1]));
    }

    /// Statistics partition the catalog.
    #[test]
    fn statistics_partition_catalog((nodes, attempts, xp) in arb_session(25), query_xp in 0..80u32) {
        let total = nodes.len();
        let mut engine = engine_for(nodes);
        play(&mut engine, &attempts, xp);

        let stats = engine.statistics(query_xp);
        prop_assert_eq!(stats.overall.total, total);
        prop_assert_eq!(stats.overall.unlocked, engine.unlocked_count());
        prop_assert_eq!(stats.by_category.values().map(|c| c.total).sum::<usize>(), total);
        prop_assert_eq!(stats.by_tier.values().map(|c| c.unlocked).sum::<usize>(), engine.unlocked_count());
        prop_assert!(stats.overall.available <= stats.overall.affordable);
        prop_assert_eq!(engine.awaiting_prerequisites(query_xp).len(),
            stats.overall.affordable - stats.overall.available);
    }
}
