//! Progression example: unlocking skills from the standard catalog.
//!
//! Builds the standard catalog, gives a hero some XP, and walks through
//! eligibility checks, unlocks, undo, temporary effects, and statistics.
//!
//! Run with: `cargo run -p skilltree-examples --example progression`
//! (set `RUST_LOG=debug` to see rejected unlocks).

use skilltree_core::standard::standard_catalog;
use skilltree_core::*;
use std::collections::HashMap;
use std::sync::Arc;

/// Minimal game-side player.
struct Hero {
    xp: u32,
    stats: HashMap<Stat, f32>,
}

impl Hero {
    fn new(xp: u32) -> Self {
        let stats = Stat::ALL.iter().map(|&s| (s, 0.0)).collect();
        Self { xp, stats }
    }
}

impl Player for Hero {
    fn xp(&self) -> u32 {
        self.xp
    }

    fn stat(&self, stat: Stat) -> f32 {
        self.stats.get(&stat).copied().unwrap_or(0.0)
    }

    fn modify_stat(&mut self, stat: Stat, amount: f32) -> Result<(), PlayerError> {
        *self.stats.entry(stat).or_insert(0.0) += amount;
        Ok(())
    }
}

fn print_stats(hero: &Hero) {
    let line: Vec<String> = Stat::ALL
        .iter()
        .map(|&s| format!("{} {:.1}", s.label(), hero.stat(s)))
        .collect();
    println!("Hero: {}", line.join(", "));
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let catalog = match standard_catalog() {
        Ok(catalog) => Arc::new(catalog),
        Err(err) => {
            eprintln!("standard catalog is invalid: {err}");
            return;
        }
    };
    println!("Catalog: {} skills.\n", catalog.len());

    let mut engine = ProgressionEngine::new(catalog);
    engine.events_mut().subscribe(Box::new(|event| {
        if let ProgressionEvent::SkillUnlocked(n) = event {
            println!(
                "  -> unlocked {} ({} XP, {} skills held)",
                n.skill, n.xp_spent, n.unlocked_count
            );
        }
    }));

    let mut hero = Hero::new(60);

    // --- What can we afford? ---

    println!("=== Available at {} XP ===", hero.xp);
    for id in engine.optimal_unlock_order(Category::Combat, hero.xp) {
        println!("  {id}");
    }

    // --- Planning ---

    let target = "blade_dancer";
    if let Some(path) = engine.unlock_path(target) {
        let names: Vec<&str> = path.iter().map(SkillId::as_str).collect();
        println!("\nPath to {target}: {}", names.join(" -> "));
    }
    println!(
        "Total cost: {:?}, reachable with {} XP: {}\n",
        engine.total_unlock_cost(target),
        hero.xp,
        engine.can_eventually_unlock(target, hero.xp)
    );

    // --- Unlocking ---

    println!("=== Unlocking ===");
    for id in ["sharpened_edge", "quick_hands", "veteran", "light_step", "sprint"] {
        match engine.unlock(id, &mut hero) {
            Ok(receipt) => {
                if let Some(node) = engine.catalog().get(id) {
                    println!("  {} gives {}", node.name, node.effect.describe());
                }
                if let Err(err) = receipt.effect {
                    println!("  effect failed: {err}");
                }
            }
            Err(reason) => println!("  cannot unlock {id}: {reason}"),
        }
    }
    print_stats(&hero);

    // --- Undo ---

    println!("\n=== Undo ===");
    match engine.undo() {
        Ok(record) => println!("  reverted {}", record.skill),
        Err(err) => println!("  {err}"),
    }
    hero.xp = 200;
    if let Err(reason) = engine.unlock("veteran", &mut hero) {
        println!("  cannot unlock veteran: {reason}");
    }

    // --- Temporary effects ---

    println!("\n=== Ticking temporary effects ===");
    for step in 1..=6 {
        for skill in engine.tick_effects(1.0) {
            println!("  t={step}s: {skill} expired");
        }
    }

    // --- Statistics ---

    let stats = engine.statistics(hero.xp);
    println!("\n=== Statistics at {} XP ===", hero.xp);
    println!(
        "  {}/{} unlocked ({:.0}%), {} available, {} blocked",
        stats.overall.unlocked,
        stats.overall.total,
        stats.completion_percent,
        stats.overall.available,
        stats.overall.blocked
    );
    for (category, counts) in &stats.by_category {
        println!("  {category}: {}/{}", counts.unlocked, counts.total);
    }
    print_stats(&hero);
}
