//! Cross-crate progression scenarios.
//!
//! Each test drives a full engine through a realistic sequence: catalogs come
//! from the built-in standard set or from data files on disk, players are
//! `TestPlayer`s, and observers subscribe to the event bus.

use skilltree_core::catalog::{CatalogIntegrityError, SkillCatalogBuilder};
use skilltree_core::engine::{NodeState, ProgressionEngine, UndoRejected, UnlockRejected};
use skilltree_core::event::{EventKind, ProgressionEvent};
use skilltree_core::id::{Category, SkillId};
use skilltree_core::player::{Player, Stat};
use skilltree_core::standard::standard_catalog;
use skilltree_core::test_utils::*;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

fn ids(list: &[&str]) -> Vec<SkillId> {
    list.iter().map(|s| SkillId::new(*s)).collect()
}

// ===========================================================================
// Canonical three-node tree
// ===========================================================================

#[test]
fn branch_path_and_cost() {
    let engine = ProgressionEngine::new(abc_catalog());
    assert_eq!(engine.unlock_path("b"), Some(ids(&["a", "b"])));
    assert_eq!(engine.total_unlock_cost("b"), Some(35));
}

#[test]
fn five_xp_cannot_afford_root() {
    let engine = ProgressionEngine::new(abc_catalog());
    assert!(matches!(
        engine.check_unlock("a", 5),
        Err(UnlockRejected::InsufficientXp { cost: 10, xp: 5, .. })
    ));
}

#[test]
fn two_node_cycle_rejected_at_construction() {
    let mut builder = SkillCatalogBuilder::new();
    builder
        .add(node("a", 10, &[]))
        .add(node("b", 25, &["a", "c"]))
        .add(node("c", 25, &["b"]));

    match builder.build() {
        Err(CatalogIntegrityError::Cycle { skill }) => {
            assert!(skill == SkillId::new("b") || skill == SkillId::new("c"));
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
}

#[test]
fn eleventh_unlock_evicts_oldest_and_undo_reverts_it() {
    let mut engine = ProgressionEngine::new(flat_catalog(11));
    let mut player = TestPlayer::new(100);

    for i in 0..11 {
        engine.unlock(&format!("s{i}"), &mut player).unwrap();
    }
    assert_eq!(engine.history().len(), 10);
    assert_eq!(engine.history().evicted_count(), 1);
    assert_eq!(
        engine.history().iter().next().map(|r| r.skill.clone()),
        Some(SkillId::new("s1"))
    );

    assert_eq!(engine.undo().unwrap().skill, SkillId::new("s10"));
    assert_eq!(engine.unlocked_count(), 10);
}

// ===========================================================================
// Standard catalog playthrough
// ===========================================================================

#[test]
fn standard_catalog_playthrough() {
    let mut engine = ProgressionEngine::new(Arc::new(standard_catalog().unwrap()));
    let unlocked_log = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&unlocked_log);
    engine.events_mut().on_passive(
        EventKind::SkillUnlocked,
        Box::new(move |event| {
            if let ProgressionEvent::SkillUnlocked(n) = event {
                log.borrow_mut().push(n.skill.clone());
            }
        }),
    );

    let mut player = TestPlayer::new(0).with_stat(Stat::Health, 100.0);

    // Nothing is affordable with no XP, but every root is one step away.
    assert!(engine.available(0).is_empty());
    assert_eq!(engine.node_state("avatar", 0), Some(NodeState::Locked));

    player.set_xp(250);
    let path = engine.unlock_path("avatar").unwrap();
    assert_eq!(path.last(), Some(&SkillId::new("avatar")));
    assert!(!path.contains(&SkillId::new("scavenger")));
    assert!(engine.can_eventually_unlock("avatar", u32::MAX));

    for step in &path {
        engine.unlock(step.as_str(), &mut player).unwrap();
    }

    assert!(engine.is_unlocked("avatar"));
    assert_eq!(*unlocked_log.borrow(), path);
    assert_eq!(player.xp(), 250);

    // Last Stand's condition was false (health 100+), so no bonus damage
    // from it; Avatar adds its timed damage.
    assert!(player.stat(Stat::Damage) > 0.0);
    assert!(player.stat(Stat::Health) > 100.0);

    // Sprint and Avatar both started temporary effects.
    let running: Vec<SkillId> = engine.active_effects().iter().map(|a| a.skill.clone()).collect();
    assert_eq!(running, ids(&["sprint", "avatar"]));
    assert_eq!(engine.tick_effects(5.0), ids(&["sprint"]));
    assert_eq!(engine.tick_effects(5.0), ids(&["avatar"]));

    let stats = engine.statistics(player.xp());
    assert_eq!(stats.overall.unlocked, path.len());
    assert_eq!(stats.by_category[&Category::Special].unlocked, 1);
}

#[test]
fn recommendations_follow_priority() {
    let engine = ProgressionEngine::new(Arc::new(standard_catalog().unwrap()));
    let order = engine.optimal_unlock_order(Category::Movement, 10);
    assert_eq!(order.first(), Some(&SkillId::new("light_step")));
    assert_eq!(order.len(), 4);
}

// ===========================================================================
// Re-entrant events
// ===========================================================================

#[test]
fn reactive_follow_ups_are_delivered_after_unlock() {
    let mut engine = ProgressionEngine::new(abc_catalog());
    let seen = Rc::new(RefCell::new(Vec::new()));

    engine.events_mut().on_reactive(
        EventKind::SkillUnlocked,
        Box::new(|event| match event {
            ProgressionEvent::SkillUnlocked(n) if n.unlocked_count == 2 => {
                vec![ProgressionEvent::TemporaryExpired {
                    skill: n.skill.clone(),
                }]
            }
            _ => Vec::new(),
        }),
    );
    let s = Rc::clone(&seen);
    engine
        .events_mut()
        .subscribe(Box::new(move |event| s.borrow_mut().push(event.kind())));

    let mut player = TestPlayer::new(50);
    engine.unlock("a", &mut player).unwrap();
    engine.unlock("b", &mut player).unwrap();
    engine.undo().unwrap();
    assert_eq!(engine.undo().unwrap().skill, SkillId::new("a"));
    assert_eq!(engine.undo(), Err(UndoRejected::NoHistory));

    assert_eq!(
        *seen.borrow(),
        vec![
            EventKind::SkillUnlocked,
            EventKind::SkillUnlocked,
            EventKind::TemporaryExpired,
            EventKind::UnlockUndone,
            EventKind::UnlockUndone,
        ]
    );
}

// ===========================================================================
// Data-driven catalogs
// ===========================================================================

fn data_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "skilltree_integration_{suffix}_{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn data_loaded_tree_drives_engine() {
    let dir = data_dir("loaded_tree");
    std::fs::write(
        dir.join("skills.ron"),
        r#"[
            (name: "a", cost: 10, tier: 1, category: Combat, effect: damage(1.0)),
            (name: "b", cost: 25, tier: 2, category: Combat, effect: damage(2.0), requires: ["a"]),
            (name: "c", cost: 25, tier: 2, category: Defense, effect: defense(1.0), requires: ["a"]),
        ]"#,
    )
    .unwrap();
    std::fs::write(dir.join("engine.toml"), "history_capacity = 1\n").unwrap();

    let data = skilltree_data::load_skill_tree(&dir).unwrap();
    let mut engine = ProgressionEngine::with_config(Arc::new(data.catalog), &data.config);
    let mut player = TestPlayer::new(40);

    assert_eq!(engine.unlock_path("b"), Some(ids(&["a", "b"])));
    assert_eq!(engine.total_unlock_cost("b"), Some(35));

    engine.unlock("a", &mut player).unwrap();
    engine.unlock("c", &mut player).unwrap();
    assert_eq!(engine.history().capacity(), 1);
    engine.undo().unwrap();
    assert_eq!(engine.undo(), Err(UndoRejected::NoHistory));
    assert_eq!(engine.unlocked(), vec![&SkillId::new("a")]);

    let _ = std::fs::remove_dir_all(&dir);
}
