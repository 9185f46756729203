//! The player capability surface consumed by the progression engine.
//!
//! The engine only ever reads the player's XP and stats, and mutates stats
//! through [`Player::modify_stat`]. How the player stores those values is
//! opaque to the engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A player statistic that skill effects can modify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stat {
    Health,
    Speed,
    Damage,
    Range,
    AttackSpeed,
    Defense,
    Utility,
}

impl Stat {
    pub const ALL: [Stat; 7] = [
        Stat::Health,
        Stat::Speed,
        Stat::Damage,
        Stat::Range,
        Stat::AttackSpeed,
        Stat::Defense,
        Stat::Utility,
    ];

    /// Short display label.
    pub fn label(self) -> &'static str {
        match self {
            Stat::Health => "health",
            Stat::Speed => "speed",
            Stat::Damage => "damage",
            Stat::Range => "range",
            Stat::AttackSpeed => "attack speed",
            Stat::Defense => "defense",
            Stat::Utility => "utility",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Failure reported by a [`Player`] implementation while applying a modifier.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlayerError {
    #[error("player rejected {stat} modifier of {amount}: {reason}")]
    Rejected {
        stat: Stat,
        amount: f32,
        reason: String,
    },
}

/// What the engine needs from the player.
pub trait Player {
    /// Current XP balance.
    fn xp(&self) -> u32;

    /// Current value of a stat. Used by conditional effects.
    fn stat(&self, stat: Stat) -> f32;

    /// Add `amount` to a stat.
    fn modify_stat(&mut self, stat: Stat, amount: f32) -> Result<(), PlayerError>;
}
