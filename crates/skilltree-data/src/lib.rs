//! Data-driven skill definitions for skilltree.
//!
//! Reads `skills.{ron,toml,json}` and an optional `engine.{ron,toml,json}`
//! from a directory, resolves skill names, and builds a validated
//! [`Catalog`](skilltree_core::catalog::Catalog).

pub mod loader;
pub mod resolve;
pub mod schema;

pub use loader::DataLoadError;
pub use resolve::{SkillTreeData, load_catalog, load_engine_config, load_skill_tree};
