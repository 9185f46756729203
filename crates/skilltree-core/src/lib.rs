//! Skilltree Core -- the progression engine for skill-tree games.
//!
//! This crate provides the skill catalog and its prerequisite graph, the
//! effect model, the unlock/undo engine, bounded command history, and a
//! synchronous event bus. Rendering, input, and persistence live elsewhere.
//!
//! # Flow
//!
//! 1. **Define** -- Add [`catalog::SkillNode`]s to a
//!    [`catalog::SkillCatalogBuilder`]. `build` rejects duplicate ids, bad
//!    tiers, dangling or self prerequisites, and cycles.
//! 2. **Share** -- Wrap the [`catalog::Catalog`] in an `Arc`. It never
//!    changes after construction.
//! 3. **Progress** -- Drive an [`engine::ProgressionEngine`] with
//!    `unlock(id, player)` and `undo()`. Query eligibility, paths, and
//!    statistics at any time.
//! 4. **Tick** -- Call `tick_effects(dt)` from the game loop to expire
//!    temporary effects.
//!
//! ```rust,ignore
//! let catalog = Arc::new(standard_catalog()?);
//! let mut engine = ProgressionEngine::new(catalog);
//! engine.unlock("toughness", &mut player)?;
//! let path = engine.unlock_path("avatar");
//! ```
//!
//! # Key Types
//!
//! - [`engine::ProgressionEngine`] -- Owns unlocked state, history, timers, and events.
//! - [`effect::Effect`] -- Closed set of skill effects, applied through [`player::Player`].
//! - [`catalog::Catalog`] -- Immutable, validated prerequisite graph.
//! - [`command_log::CommandLog`] -- Bounded unlock history for undo.
//! - [`event::EventBus`] -- Subscription-based event bus with queued follow-ups.

pub mod catalog;
pub mod command_log;
pub mod config;
pub mod effect;
pub mod engine;
pub mod event;
pub mod id;
pub mod player;
pub mod standard;
pub mod stats;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use catalog::{Catalog, CatalogIntegrityError, SkillCatalogBuilder, SkillNode};
pub use config::EngineConfig;
pub use effect::{Condition, Effect, EffectContext, EffectOutcome};
pub use engine::{NodeState, ProgressionEngine, UndoRejected, UnlockReceipt, UnlockRejected};
pub use event::{EventBus, EventKind, ProgressionEvent};
pub use id::{Category, SkillId, Tier};
pub use player::{Player, PlayerError, Stat};
