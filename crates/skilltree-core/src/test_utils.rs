//! Shared test helpers for unit tests, integration tests, and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::catalog::{Catalog, SkillCatalogBuilder, SkillNode};
use crate::effect::Effect;
use crate::id::Category;
use crate::player::{Player, PlayerError, Stat};
use std::collections::HashMap;
use std::sync::Arc;

// ===========================================================================
// Test player
// ===========================================================================

/// In-memory [`Player`] that records every modification it accepts.
#[derive(Debug, Clone, Default)]
pub struct TestPlayer {
    pub xp: u32,
    pub stats: HashMap<Stat, f32>,
    /// Accepted modifications in application order.
    pub applied: Vec<(Stat, f32)>,
    /// Reject any modification of this stat.
    pub fail_on: Option<Stat>,
}

impl TestPlayer {
    pub fn new(xp: u32) -> Self {
        Self {
            xp,
            ..Self::default()
        }
    }

    pub fn with_stat(mut self, stat: Stat, value: f32) -> Self {
        self.stats.insert(stat, value);
        self
    }

    pub fn failing_on(mut self, stat: Stat) -> Self {
        self.fail_on = Some(stat);
        self
    }

    pub fn set_xp(&mut self, xp: u32) {
        self.xp = xp;
    }
}

impl Player for TestPlayer {
    fn xp(&self) -> u32 {
        self.xp
    }

    fn stat(&self, stat: Stat) -> f32 {
        self.stats.get(&stat).copied().unwrap_or(0.0)
    }

    fn modify_stat(&mut self, stat: Stat, amount: f32) -> Result<(), PlayerError> {
        if self.fail_on == Some(stat) {
            return Err(PlayerError::Rejected {
                stat,
                amount,
                reason: "test player refuses this stat".to_string(),
            });
        }
        *self.stats.entry(stat).or_insert(0.0) += amount;
        self.applied.push((stat, amount));
        Ok(())
    }
}

// ===========================================================================
// Node constructors
// ===========================================================================

/// Tier-1 combat skill granting +1 damage.
pub fn node(id: &str, cost: u32, prerequisites: &[&str]) -> SkillNode {
    SkillNode::new(id, id, cost, 1, Category::Combat, Effect::Damage(1.0))
        .with_prerequisites(prerequisites.iter().copied())
}

/// Build a catalog, panicking on integrity errors.
pub fn catalog_of(nodes: Vec<SkillNode>) -> Arc<Catalog> {
    let mut builder = SkillCatalogBuilder::new();
    builder.extend(nodes);
    match builder.build() {
        Ok(catalog) => Arc::new(catalog),
        Err(err) => panic!("test catalog rejected: {err}"),
    }
}

// ===========================================================================
// Catalog fixtures
// ===========================================================================

/// `a` (10, +10 health) with two children `b` (25, +5 damage) and
/// `c` (25, +1 speed).
pub fn abc_catalog() -> Arc<Catalog> {
    catalog_of(vec![
        node("a", 10, &[]).with_effect(Effect::Health(10.0)),
        node("b", 25, &["a"]).with_effect(Effect::Damage(5.0)),
        node("c", 25, &["a"]).with_effect(Effect::Speed(1.0)),
    ])
}

/// [`abc_catalog`] plus `d` (40), which requires both `b` and `c`.
pub fn diamond_catalog() -> Arc<Catalog> {
    catalog_of(vec![
        node("a", 10, &[]).with_effect(Effect::Health(10.0)),
        node("b", 25, &["a"]).with_effect(Effect::Damage(5.0)),
        node("c", 25, &["a"]).with_effect(Effect::Speed(1.0)),
        node("d", 40, &["b", "c"]).with_effect(Effect::Defense(2.0)),
    ])
}

/// `n` independent roots `s0..s{n-1}`, each costing 1.
pub fn flat_catalog(n: usize) -> Arc<Catalog> {
    catalog_of((0..n).map(|i| node(&format!("s{i}"), 1, &[])).collect())
}

/// Roots spread over categories, costs, and tiers.
pub fn mixed_roots_catalog() -> Arc<Catalog> {
    let root = |id: &str, cost, tier, category| {
        SkillNode::new(id, id, cost, tier, category, Effect::Utility(1.0))
    };
    catalog_of(vec![
        root("lunge", 8, 1, Category::Combat),
        root("sprint", 5, 2, Category::Movement),
        root("bulwark", 20, 2, Category::Defense),
        root("jab", 5, 1, Category::Combat),
        root("guard", 20, 1, Category::Defense),
    ])
}

/// Layered catalog for benchmarks and property tests: `layers` rows of
/// `width` skills, each skill requiring up to two skills from the row above.
pub fn layered_catalog(layers: usize, width: usize) -> Arc<Catalog> {
    let mut nodes = Vec::with_capacity(layers * width);
    for layer in 0..layers {
        for col in 0..width {
            let id = format!("l{layer}_{col}");
            let tier = (layer % 5) as u8 + 1;
            let category = Category::ALL[col % Category::ALL.len()];
            let mut skill = SkillNode::new(
                id.as_str(),
                id.as_str(),
                (layer as u32 + 1) * 10,
                tier,
                category,
                Effect::scalar(Stat::ALL[col % Stat::ALL.len()], 1.0),
            );
            if layer > 0 {
                let above = layer - 1;
                let mut prereqs = vec![format!("l{above}_{col}")];
                if col + 1 < width {
                    prereqs.push(format!("l{above}_{}", col + 1));
                }
                skill = skill.with_prerequisites(prereqs);
            }
            nodes.push(skill);
        }
    }
    catalog_of(nodes)
}
