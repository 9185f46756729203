//! The built-in skill catalog.
//!
//! Five tiers, every category, and at least one skill per effect variant.
//! Games with their own content load a catalog through `skilltree-data`
//! instead.

use crate::catalog::{Catalog, CatalogIntegrityError, SkillCatalogBuilder, SkillNode};
use crate::effect::{Condition, Effect};
use crate::id::{Category, SkillId};
use crate::player::Stat;

/// Build the standard catalog.
pub fn standard_catalog() -> Result<Catalog, CatalogIntegrityError> {
    let mut builder = SkillCatalogBuilder::new();
    builder.extend(standard_nodes());
    builder.build()
}

/// Nodes of the standard catalog, in definition order.
pub fn standard_nodes() -> Vec<SkillNode> {
    use Category::*;

    vec![
        // -- Tier 1 --
        SkillNode::new("toughness", "Toughness", 10, 1, Defense, Effect::Health(15.0))
            .with_description("Raises maximum health."),
        SkillNode::new("sharpened_edge", "Sharpened Edge", 10, 1, Combat, Effect::Damage(2.0))
            .with_description("Every hit lands harder."),
        SkillNode::new("light_step", "Light Step", 10, 1, Movement, Effect::Speed(1.5))
            .with_description("Move a little faster."),
        SkillNode::new("scavenger", "Scavenger", 10, 1, Utility, Effect::Utility(1.0))
            .with_description("Find more useful items."),
        // -- Tier 2 --
        SkillNode::new("iron_skin", "Iron Skin", 25, 2, Defense, Effect::Defense(3.0))
            .with_description("Reduces incoming damage.")
            .with_prerequisites(["toughness"]),
        SkillNode::new("long_reach", "Long Reach", 25, 2, Combat, Effect::Range(1.0))
            .with_description("Extends attack range.")
            .with_prerequisites(["sharpened_edge"]),
        SkillNode::new("quick_hands", "Quick Hands", 25, 2, Combat, Effect::AttackSpeed(0.2))
            .with_description("Attack more often.")
            .with_prerequisites(["sharpened_edge"]),
        SkillNode::new(
            "sprint",
            "Sprint",
            25,
            2,
            Movement,
            Effect::timed(Effect::Speed(4.0), 5.0),
        )
        .with_description("A short burst of speed.")
        .with_prerequisites(["light_step"]),
        // -- Tier 3 --
        SkillNode::new(
            "fortified",
            "Fortified",
            50,
            3,
            Defense,
            Effect::Composite(vec![Effect::Health(10.0), Effect::Defense(2.0)]),
        )
        .with_description("Tougher in every way.")
        .with_prerequisites(["iron_skin"]),
        SkillNode::new(
            "last_stand",
            "Last Stand",
            50,
            3,
            Defense,
            Effect::when(
                Condition::StatBelow {
                    stat: Stat::Health,
                    threshold: 30.0,
                },
                Effect::Damage(6.0),
            ),
        )
        .with_description("Hit harder when badly hurt.")
        .with_prerequisites(["iron_skin", "sharpened_edge"]),
        SkillNode::new(
            "veteran",
            "Veteran",
            50,
            3,
            Combat,
            Effect::Scaling {
                stat: Stat::Damage,
                base: 1.0,
                increment: 0.5,
                step: 100,
            },
        )
        .with_description("Damage grows with experience.")
        .with_prerequisites(["quick_hands"]),
        // -- Tier 4 --
        SkillNode::new(
            "blade_dancer",
            "Blade Dancer",
            100,
            4,
            Combat,
            Effect::Synergy {
                stat: Stat::AttackSpeed,
                base: 0.1,
                multiplier: 1.5,
                companions: vec![
                    SkillId::new("quick_hands"),
                    SkillId::new("light_step"),
                    SkillId::new("long_reach"),
                ],
            },
        )
        .with_description("Each mastered form quickens the next.")
        .with_prerequisites(["veteran", "sprint"]),
        SkillNode::new(
            "pathfinder",
            "Pathfinder",
            100,
            4,
            Utility,
            Effect::when(
                Condition::XpAtLeast(500),
                Effect::Composite(vec![Effect::Utility(2.0), Effect::Speed(1.0)]),
            ),
        )
        .with_description("Seasoned travellers find the way.")
        .with_prerequisites(["scavenger", "sprint"]),
        // -- Tier 5 --
        SkillNode::new(
            "avatar",
            "Avatar",
            250,
            5,
            Special,
            Effect::Composite(vec![
                Effect::timed(Effect::Damage(10.0), 10.0),
                Effect::when(
                    Condition::SkillUnlocked(SkillId::new("blade_dancer")),
                    Effect::AttackSpeed(0.5),
                ),
                Effect::Health(25.0),
            ]),
        )
        .with_description("Become the storm.")
        .with_prerequisites(["fortified", "last_stand", "blade_dancer"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::Tier;

    #[test]
    fn standard_catalog_builds() {
        let catalog = standard_catalog().unwrap();
        assert_eq!(catalog.len(), standard_nodes().len());
        assert!(catalog.validate().is_empty());
    }

    #[test]
    fn covers_every_tier_and_category() {
        let catalog = standard_catalog().unwrap();
        for tier in Tier::ALL {
            assert!(catalog.by_tier(tier).next().is_some(), "no skill in {tier}");
        }
        for category in Category::ALL {
            assert!(
                catalog.by_category(category).next().is_some(),
                "no skill in {category}"
            );
        }
    }

    #[test]
    fn capstone_path_runs_through_every_branch() {
        let catalog = standard_catalog().unwrap();
        let ancestors = catalog.ancestors("avatar");
        assert!(ancestors.contains(&SkillId::new("toughness")));
        assert!(ancestors.contains(&SkillId::new("light_step")));
        assert!(!ancestors.contains(&SkillId::new("scavenger")));
    }
}
