//! Resolution pipeline: reads skill and engine files, resolves skill names,
//! and builds the catalog.

use skilltree_core::catalog::{Catalog, SkillCatalogBuilder, SkillNode};
use skilltree_core::config::EngineConfig;
use skilltree_core::effect::{Condition, Effect};
use skilltree_core::id::SkillId;
use std::collections::HashMap;
use std::path::Path;

use crate::loader::{
    DataLoadError, check_duplicate, deserialize_file, deserialize_list, find_data_file,
    require_data_file, resolve_name,
};
use crate::schema::{ConditionData, EffectData, SkillData};

/// Base name of the skill definitions file.
pub const SKILLS_FILE: &str = "skills";
/// Base name of the optional engine configuration file.
pub const ENGINE_FILE: &str = "engine";

/// Everything loaded from a data directory.
#[derive(Debug, Clone)]
pub struct SkillTreeData {
    pub catalog: Catalog,
    pub config: EngineConfig,
}

/// Load `skills.*` and the optional `engine.*` from `dir`.
pub fn load_skill_tree(dir: &Path) -> Result<SkillTreeData, DataLoadError> {
    Ok(SkillTreeData {
        catalog: load_catalog(dir)?,
        config: load_engine_config(dir)?,
    })
}

/// Load and build the catalog from `skills.{ron,toml,json}` in `dir`.
pub fn load_catalog(dir: &Path) -> Result<Catalog, DataLoadError> {
    let path = require_data_file(dir, SKILLS_FILE)?;
    let data: Vec<SkillData> = deserialize_list(&path, "skills")?;
    let nodes = resolve_skills(data, &path)?;

    let mut builder = SkillCatalogBuilder::new();
    builder.extend(nodes);
    let catalog = builder.build()?;

    tracing::info!(file = %path.display(), skills = catalog.len(), "skill catalog loaded");
    Ok(catalog)
}

/// Load `engine.{ron,toml,json}` from `dir`, or defaults if absent.
pub fn load_engine_config(dir: &Path) -> Result<EngineConfig, DataLoadError> {
    match find_data_file(dir, ENGINE_FILE)? {
        Some(path) => {
            let config: EngineConfig = deserialize_file(&path)?;
            tracing::debug!(file = %path.display(), ?config, "engine config loaded");
            Ok(config)
        }
        None => {
            tracing::debug!(dir = %dir.display(), "no engine config, using defaults");
            Ok(EngineConfig::default())
        }
    }
}

// ===========================================================================
// Name resolution
// ===========================================================================

/// Turn data-file skills into catalog nodes. Every skill name referenced by
/// a prerequisite or an effect must be defined in the same file.
///
/// Graph checks (self and repeated references, cycles, tiers) are left to the catalog
/// builder.
pub fn resolve_skills(data: Vec<SkillData>, file: &Path) -> Result<Vec<SkillNode>, DataLoadError> {
    let mut names: HashMap<String, SkillId> = HashMap::with_capacity(data.len());
    for skill in &data {
        check_duplicate(&names, &skill.name, file)?;
        names.insert(skill.name.clone(), SkillId::new(skill.name.as_str()));
    }

    data.into_iter()
        .map(|skill| {
            let prerequisites = skill
                .requires
                .iter()
                .map(|r| resolve_name(&names, r, file, "skill").cloned())
                .collect::<Result<Vec<_>, DataLoadError>>()?;
            let effect = resolve_effect(&skill.effect, &names, file)?;
            let display = skill.display_name.unwrap_or_else(|| skill.name.clone());

            Ok(SkillNode::new(
                skill.name,
                display,
                skill.cost,
                skill.tier,
                skill.category,
                effect,
            )
            .with_description(skill.description)
            .with_prerequisites(prerequisites))
        })
        .collect()
}

fn resolve_effect(
    data: &EffectData,
    names: &HashMap<String, SkillId>,
    file: &Path,
) -> Result<Effect, DataLoadError> {
    let effect = match data {
        EffectData::Health(v) => Effect::Health(*v),
        EffectData::Speed(v) => Effect::Speed(*v),
        EffectData::Damage(v) => Effect::Damage(*v),
        EffectData::Range(v) => Effect::Range(*v),
        EffectData::AttackSpeed(v) => Effect::AttackSpeed(*v),
        EffectData::Defense(v) => Effect::Defense(*v),
        EffectData::Utility(v) => Effect::Utility(*v),
        EffectData::Composite(effects) => Effect::Composite(
            effects
                .iter()
                .map(|e| resolve_effect(e, names, file))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        EffectData::Conditional { when, effect } => Effect::when(
            resolve_condition(when, names, file)?,
            resolve_effect(effect, names, file)?,
        ),
        EffectData::Temporary { effect, duration } => {
            Effect::timed(resolve_effect(effect, names, file)?, *duration)
        }
        EffectData::Scaling {
            stat,
            base,
            increment,
            step,
        } => Effect::Scaling {
            stat: *stat,
            base: *base,
            increment: *increment,
            step: *step,
        },
        EffectData::Synergy {
            stat,
            base,
            multiplier,
            with,
        } => Effect::Synergy {
            stat: *stat,
            base: *base,
            multiplier: *multiplier,
            companions: with
                .iter()
                .map(|n| resolve_name(names, n, file, "skill").cloned())
                .collect::<Result<Vec<_>, _>>()?,
        },
    };
    Ok(effect)
}

fn resolve_condition(
    data: &ConditionData,
    names: &HashMap<String, SkillId>,
    file: &Path,
) -> Result<Condition, DataLoadError> {
    let resolve_all = |list: &[ConditionData]| {
        list.iter()
            .map(|c| resolve_condition(c, names, file))
            .collect::<Result<Vec<_>, _>>()
    };

    let condition = match data {
        ConditionData::StatBelow { stat, threshold } => Condition::StatBelow {
            stat: *stat,
            threshold: *threshold,
        },
        ConditionData::StatAtLeast { stat, threshold } => Condition::StatAtLeast {
            stat: *stat,
            threshold: *threshold,
        },
        ConditionData::XpAtLeast(xp) => Condition::XpAtLeast(*xp),
        ConditionData::SkillUnlocked(name) => {
            Condition::SkillUnlocked(resolve_name(names, name, file, "skill")?.clone())
        }
        ConditionData::All(list) => Condition::All(resolve_all(list)?),
        ConditionData::Any(list) => Condition::Any(resolve_all(list)?),
        ConditionData::Not(inner) => {
            Condition::Not(Box::new(resolve_condition(inner, names, file)?))
        }
    };
    Ok(condition)
}

// ===========================================================================
// Tests
// ===========================================================================
