//! Serde data file structs for skill definitions.
//!
//! These structs define the on-disk format for skills and their effects.
//! Skills refer to each other by name; the loader resolves those names into
//! [`SkillId`](skilltree_core::id::SkillId)s before the catalog is built.

use serde::Deserialize;
use skilltree_core::id::Category;
use skilltree_core::player::Stat;

// ===========================================================================
// Skills
// ===========================================================================

/// A skill definition in a data file.
#[derive(Debug, Clone, Deserialize)]
pub struct SkillData {
    /// Unique key. Other skills refer to this one by it.
    pub name: String,
    /// Shown to players. Defaults to `name`.
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: String,
    pub cost: u32,
    pub tier: u8,
    pub category: Category,
    pub effect: EffectData,
    /// Names of prerequisite skills.
    #[serde(default)]
    pub requires: Vec<String>,
}

// ===========================================================================
// Effects
// ===========================================================================

/// An effect as written in a data file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectData {
    Health(f32),
    Speed(f32),
    Damage(f32),
    Range(f32),
    AttackSpeed(f32),
    Defense(f32),
    Utility(f32),
    Composite(Vec<EffectData>),
    Conditional {
        when: ConditionData,
        effect: Box<EffectData>,
    },
    Temporary {
        effect: Box<EffectData>,
        duration: f32,
    },
    Scaling {
        stat: Stat,
        base: f32,
        increment: f32,
        /// XP per increment. 0 disables scaling.
        #[serde(default)]
        step: u32,
    },
    Synergy {
        stat: Stat,
        base: f32,
        multiplier: f32,
        /// Names of companion skills.
        with: Vec<String>,
    },
}

/// A condition as written in a data file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionData {
    StatBelow { stat: Stat, threshold: f32 },
    StatAtLeast { stat: Stat, threshold: f32 },
    XpAtLeast(u32),
    /// Name of a skill.
    SkillUnlocked(String),
    All(Vec<ConditionData>),
    Any(Vec<ConditionData>),
    Not(Box<ConditionData>),
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // RON
    // -----------------------------------------------------------------------

    #[test]
    fn skill_ron_minimal() {
        let skill: SkillData = ron::from_str(
            r#"(name: "toughness", cost: 10, tier: 1, category: Defense, effect: health(15.0))"#,
        )
        .unwrap();
        assert_eq!(skill.name, "toughness");
        assert!(skill.display_name.is_none());
        assert!(skill.requires.is_empty());
        assert!(matches!(skill.effect, EffectData::Health(v) if v == 15.0));
    }

    #[test]
    fn skill_ron_nested_effect() {
        let skill: SkillData = ron::from_str(
            r#"(
                name: "last_stand",
                display_name: Some("Last Stand"),
                cost: 50,
                tier: 3,
                category: Defense,
                requires: ["iron_skin"],
                effect: conditional(
                    when: stat_below(stat: Health, threshold: 30.0),
                    effect: composite([damage(6.0), temporary(effect: speed(2.0), duration: 3.0)]),
                ),
            )"#,
        )
        .unwrap();
        assert_eq!(skill.display_name.as_deref(), Some("Last Stand"));
        assert_eq!(skill.requires, vec!["iron_skin".to_string()]);
        match skill.effect {
            EffectData::Conditional { when, effect } => {
                assert!(matches!(when, ConditionData::StatBelow { stat: Stat::Health, .. }));
                assert!(matches!(*effect, EffectData::Composite(ref v) if v.len() == 2));
            }
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn scaling_step_defaults_to_zero() {
        let effect: EffectData =
            ron::from_str("scaling(stat: Damage, base: 1.0, increment: 0.5)").unwrap();
        assert!(matches!(effect, EffectData::Scaling { step: 0, .. }));
    }

    // -----------------------------------------------------------------------
    // JSON
    // -----------------------------------------------------------------------

    #[test]
    fn skill_json_synergy() {
        let skill: SkillData = serde_json::from_str(
            r#"{
                "name": "blade_dancer",
                "cost": 100,
                "tier": 4,
                "category": "Combat",
                "effect": {"synergy": {"stat": "AttackSpeed", "base": 0.1, "multiplier": 1.5, "with": ["quick_hands"]}}
            }"#,
        )
        .unwrap();
        match skill.effect {
            EffectData::Synergy { with, .. } => assert_eq!(with, vec!["quick_hands".to_string()]),
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn unknown_category_rejected() {
        let result: Result<SkillData, _> = serde_json::from_str(
            r#"{"name": "x", "cost": 1, "tier": 1, "category": "Cooking", "effect": {"health": 1.0}}"#,
        );
        assert!(result.is_err());
    }

    // -----------------------------------------------------------------------
    // TOML
    // -----------------------------------------------------------------------

    #[test]
    fn skills_toml_array_of_tables() {
        let mut table: toml::Table = toml::from_str(
            r#"
[[skills]]
name = "light_step"
cost = 10
tier = 1
category = "Movement"
effect = { speed = 1.5 }

[[skills]]
name = "sprint"
cost = 25
tier = 2
category = "Movement"
requires = ["light_step"]
effect = { temporary = { effect = { speed = 4.0 }, duration = 5.0 } }
"#,
        )
        .unwrap();
        let skills: Vec<SkillData> = table.remove("skills").unwrap().try_into().unwrap();
        assert_eq!(skills.len(), 2);
        assert_eq!(skills[1].requires, vec!["light_step".to_string()]);
        assert!(matches!(
            skills[1].effect,
            EffectData::Temporary { duration, .. } if duration == 5.0
        ));
    }
}
