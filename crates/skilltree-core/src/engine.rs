//! The progression engine: eligibility, unlocking, undo, and derived queries.
//!
//! [`ProgressionEngine`] is the single authority over which skills a player
//! holds. It reads a shared, immutable [`Catalog`] and owns everything that
//! changes at runtime: the unlocked set, the unlock history, timers for
//! temporary effects, and the event bus.
//!
//! # Eligibility
//!
//! A skill's [`NodeState`] is computed on demand from the unlocked set and
//! the XP value supplied by the caller:
//!
//! - `Unlocked` if held;
//! - otherwise `Locked` if any prerequisite is not held;
//! - otherwise `CannotAfford` if XP is below the cost;
//! - otherwise `Available`.
//!
//! [`ProgressionEngine::unlock`] re-checks these gates against the player's
//! XP at call time, so an earlier [`ProgressionEngine::can_unlock`] result is
//! never trusted.
//!
//! # XP
//!
//! Unlocking never deducts XP. The cost is only a threshold.

use crate::catalog::{Catalog, SkillNode};
use crate::command_log::{CommandLog, CommandRecord, CommandStatus};
use crate::config::EngineConfig;
use crate::effect::{EffectContext, EffectOutcome, TemporaryTimer};
use crate::event::{EventBus, ProgressionEvent, UnlockNotification};
use crate::id::{Category, SkillId, Tier};
use crate::player::{Player, PlayerError};
use crate::stats::{Progress, ProgressionStats, StateCounts};
use std::collections::HashSet;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// States and results
// ---------------------------------------------------------------------------

/// Derived unlock state of a single skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    Unlocked,
    /// At least one prerequisite is not unlocked.
    Locked,
    /// Prerequisites met, XP below cost.
    CannotAfford,
    Available,
}

/// Why an unlock was refused. Returned as a value; state is untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnlockRejected {
    #[error("unknown skill: {0}")]
    UnknownSkill(SkillId),

    #[error("skill {0} is already unlocked")]
    AlreadyUnlocked(SkillId),

    #[error("skill {skill} requires {missing:?}")]
    PrerequisitesUnmet {
        skill: SkillId,
        missing: Vec<SkillId>,
    },

    #[error("skill {skill} costs {cost} XP, player has {xp}")]
    InsufficientXp { skill: SkillId, cost: u32, xp: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum UndoRejected {
    #[error("no unlock to undo")]
    NoHistory,
}

/// What a successful unlock did.
#[derive(Debug, Clone, PartialEq)]
pub struct UnlockReceipt {
    pub skill: SkillId,
    pub cost: u32,
    pub xp_before: u32,
    /// Result of applying the skill's effect. A player failure does not
    /// undo the unlock.
    pub effect: Result<EffectOutcome, PlayerError>,
    /// History record pushed out to make room, if any.
    pub evicted: Option<CommandRecord>,
}

/// A running temporary effect.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEffect {
    pub skill: SkillId,
    pub timer: TemporaryTimer,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct ProgressionEngine {
    catalog: Arc<Catalog>,
    unlocked: HashSet<SkillId>,
    history: CommandLog,
    active: Vec<ActiveEffect>,
    events: EventBus,
    unlocks_performed: u64,
    undos_performed: u64,
}

impl ProgressionEngine {
    /// Create an engine with default configuration. Nothing is unlocked.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_config(catalog, &EngineConfig::default())
    }

    pub fn with_config(catalog: Arc<Catalog>, config: &EngineConfig) -> Self {
        Self {
            catalog,
            unlocked: HashSet::new(),
            history: CommandLog::new(config.history_capacity),
            active: Vec::new(),
            events: EventBus::new(config.event_log_capacity),
            unlocks_performed: 0,
            undos_performed: 0,
        }
    }

    // -- Accessors --

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn history(&self) -> &CommandLog {
        &self.history
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Register subscribers here.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.contains(id)
    }

    pub fn unlocked_count(&self) -> usize {
        self.unlocked.len()
    }

    /// Unlocked skills in catalog order.
    pub fn unlocked(&self) -> Vec<&SkillId> {
        self.catalog
            .iter()
            .filter(|n| self.unlocked.contains(&n.id))
            .map(|n| &n.id)
            .collect()
    }

    pub fn unlocked_set(&self) -> &HashSet<SkillId> {
        &self.unlocked
    }

    pub fn effect_context(&self, xp: u32) -> EffectContext<'_> {
        EffectContext::new(xp, &self.unlocked)
    }

    /// Effective magnitude of a skill's effect for the given XP and the
    /// current unlocked set.
    pub fn effective_magnitude(&self, id: &str, xp: u32) -> Option<f32> {
        let node = self.catalog.get(id)?;
        Some(node.effect.effective_magnitude(&self.effect_context(xp)))
    }

    // -- Eligibility --

    pub fn node_state(&self, id: &str, xp: u32) -> Option<NodeState> {
        self.catalog.get(id).map(|node| self.state_of(node, xp))
    }

    fn state_of(&self, node: &SkillNode, xp: u32) -> NodeState {
        if self.unlocked.contains(&node.id) {
            NodeState::Unlocked
        } else if !self.prerequisites_met(node) {
            NodeState::Locked
        } else if xp < node.cost {
            NodeState::CannotAfford
        } else {
            NodeState::Available
        }
    }

    fn prerequisites_met(&self, node: &SkillNode) -> bool {
        node.prerequisites.iter().all(|p| self.unlocked.contains(p))
    }

    /// Check every unlock gate for `id` against `xp`.
    pub fn check_unlock(&self, id: &str, xp: u32) -> Result<(), UnlockRejected> {
        gate(&self.catalog, &self.unlocked, id, xp).map(|_| ())
    }

    pub fn can_unlock(&self, id: &str, xp: u32) -> bool {
        self.check_unlock(id, xp).is_ok()
    }

    // -- Unlock / undo --

    /// Unlock `id` for `player`.
    ///
    /// On success the skill is marked unlocked, its effect is applied, the
    /// operation is recorded for undo, and a
    /// [`ProgressionEvent::SkillUnlocked`] is published. A rejection leaves
    /// every piece of engine state unchanged.
    pub fn unlock(
        &mut self,
        id: &str,
        player: &mut dyn Player,
    ) -> Result<UnlockReceipt, UnlockRejected> {
        let xp = player.xp();
        let catalog = Arc::clone(&self.catalog);
        let node = gate(&catalog, &self.unlocked, id, xp).inspect_err(|reason| {
            tracing::debug!(skill = id, xp, %reason, "unlock rejected");
        })?;

        self.unlocked.insert(node.id.clone());

        let ctx = EffectContext::new(xp, &self.unlocked);
        let effect = node.effect.apply(player, &ctx);
        match &effect {
            Ok(outcome) => {
                for &duration in &outcome.started_timers {
                    let mut timer = TemporaryTimer::new(duration);
                    timer.start();
                    if timer.is_active() {
                        self.active.push(ActiveEffect {
                            skill: node.id.clone(),
                            timer,
                        });
                    }
                }
            }
            Err(err) => {
                tracing::warn!(skill = %node.id, error = %err, "skill effect failed to apply");
            }
        }

        let evicted = self
            .history
            .push(CommandRecord::executed(node.id.clone(), xp));
        self.unlocks_performed += 1;

        tracing::info!(
            skill = %node.id,
            cost = node.cost,
            xp,
            unlocked = self.unlocked.len(),
            "skill unlocked"
        );

        self.events
            .publish(ProgressionEvent::SkillUnlocked(UnlockNotification {
                skill: node.id.clone(),
                xp_spent: node.cost,
                remaining_xp: xp.saturating_sub(node.cost),
                unlocked_count: self.unlocked.len(),
            }));

        Ok(UnlockReceipt {
            skill: node.id.clone(),
            cost: node.cost,
            xp_before: xp,
            effect,
            evicted,
        })
    }

    /// Revert the most recent unlock still in history.
    ///
    /// The skill is removed from the unlocked set and its timers stop. The
    /// effect already applied to the player is not reversed and no XP is
    /// refunded.
    pub fn undo(&mut self) -> Result<CommandRecord, UndoRejected> {
        let Some(mut record) = self.history.pop_latest() else {
            tracing::debug!("undo with empty history");
            return Err(UndoRejected::NoHistory);
        };

        self.unlocked.remove(&record.skill);
        self.active.retain(|a| a.skill != record.skill);
        record.status = CommandStatus::Undone;
        self.undos_performed += 1;

        tracing::info!(skill = %record.skill, unlocked = self.unlocked.len(), "unlock undone");

        self.events.publish(ProgressionEvent::UnlockUndone {
            skill: record.skill.clone(),
            unlocked_count: self.unlocked.len(),
        });

        Ok(record)
    }

    /// Forget every unlock, the history, and running timers.
    pub fn reset(&mut self) {
        self.unlocked.clear();
        self.history.clear();
        self.active.clear();
        tracing::info!("progression reset");
        self.events.publish(ProgressionEvent::ProgressionReset);
    }

    // -- Temporary effects --

    pub fn active_effects(&self) -> &[ActiveEffect] {
        &self.active
    }

    /// Advance every running temporary effect by `dt`. Expired timers are
    /// removed and announced. Returns the skills whose timers expired, in
    /// start order.
    pub fn tick_effects(&mut self, dt: f32) -> Vec<SkillId> {
        let mut expired = Vec::new();
        self.active.retain_mut(|a| {
            if a.timer.tick(dt) {
                expired.push(a.skill.clone());
                false
            } else {
                true
            }
        });

        tracing::trace!(dt, running = self.active.len(), expired = expired.len(), "effects ticked");

        for skill in &expired {
            self.events.publish(ProgressionEvent::TemporaryExpired {
                skill: skill.clone(),
            });
        }
        expired
    }

    // -- Queries --

    fn ids_where(&self, mut pred: impl FnMut(&SkillNode) -> bool) -> Vec<SkillId> {
        self.catalog
            .iter()
            .filter(|n| pred(n))
            .map(|n| n.id.clone())
            .collect()
    }

    /// Skills that can be unlocked right now.
    pub fn available(&self, xp: u32) -> Vec<SkillId> {
        self.ids_where(|n| self.state_of(n, xp) == NodeState::Available)
    }

    /// Locked skills whose cost is within `xp`, prerequisites ignored.
    pub fn affordable(&self, xp: u32) -> Vec<SkillId> {
        self.ids_where(|n| !self.unlocked.contains(&n.id) && n.cost <= xp)
    }

    /// Locked skills with at least one missing prerequisite.
    pub fn blocked(&self) -> Vec<SkillId> {
        self.ids_where(|n| !self.unlocked.contains(&n.id) && !self.prerequisites_met(n))
    }

    /// Skills the player could pay for but whose prerequisites are missing.
    pub fn awaiting_prerequisites(&self, xp: u32) -> Vec<SkillId> {
        self.ids_where(|n| {
            !self.unlocked.contains(&n.id) && n.cost <= xp && !self.prerequisites_met(n)
        })
    }

    /// Locked skills that must be unlocked to reach `target`, prerequisites
    /// first and `target` last. Each skill appears once. Empty if `target`
    /// is already unlocked; `None` if it is unknown.
    pub fn unlock_path(&self, target: &str) -> Option<Vec<SkillId>> {
        let node = self.catalog.get(target)?;
        let mut visited = HashSet::new();
        let mut path = Vec::new();
        self.collect_path(node, &mut visited, &mut path);
        Some(path)
    }

    fn collect_path<'c>(
        &'c self,
        node: &'c SkillNode,
        visited: &mut HashSet<&'c SkillId>,
        path: &mut Vec<SkillId>,
    ) {
        // Unlocked nodes always have unlocked prerequisites, so stop there.
        if self.unlocked.contains(&node.id) || !visited.insert(&node.id) {
            return;
        }
        for prereq in &node.prerequisites {
            if let Some(p) = self.catalog.get(prereq) {
                self.collect_path(p, visited, path);
            }
        }
        path.push(node.id.clone());
    }

    /// Sum of costs along [`unlock_path`](Self::unlock_path).
    pub fn total_unlock_cost(&self, target: &str) -> Option<u64> {
        let path = self.unlock_path(target)?;
        Some(
            path.iter()
                .filter_map(|id| self.catalog.get(id))
                .map(|n| u64::from(n.cost))
                .sum(),
        )
    }

    /// Whether `xp` covers the whole path to `target`.
    pub fn can_eventually_unlock(&self, target: &str, xp: u32) -> bool {
        self.total_unlock_cost(target)
            .is_some_and(|cost| u64::from(xp) >= cost)
    }

    /// Available skills ordered for recommendation: `priority` category
    /// first, then cheaper, then lower tier. Ties keep catalog order.
    pub fn optimal_unlock_order(&self, priority: Category, xp: u32) -> Vec<SkillId> {
        let mut nodes: Vec<&SkillNode> = self
            .catalog
            .iter()
            .filter(|n| self.state_of(n, xp) == NodeState::Available)
            .collect();
        nodes.sort_by_key(|n| (n.category != priority, n.cost, n.tier));
        nodes.into_iter().map(|n| n.id.clone()).collect()
    }

    // -- Statistics --

    pub fn statistics(&self, xp: u32) -> ProgressionStats {
        let mut stats = ProgressionStats {
            by_category: Category::ALL
                .iter()
                .map(|&c| (c, StateCounts::default()))
                .collect(),
            by_tier: Tier::ALL
                .iter()
                .map(|&t| (t, StateCounts::default()))
                .collect(),
            unlocks_performed: self.unlocks_performed,
            undos_performed: self.undos_performed,
            ..ProgressionStats::default()
        };

        for node in self.catalog.iter() {
            let state = self.state_of(node, xp);
            let unlocked = state == NodeState::Unlocked;
            let counts = StateCounts {
                total: 1,
                unlocked: usize::from(unlocked),
                available: usize::from(state == NodeState::Available),
                affordable: usize::from(!unlocked && node.cost <= xp),
                blocked: usize::from(state == NodeState::Locked),
            };
            add_counts(&mut stats.overall, counts);
            add_counts(stats.by_category.entry(node.category).or_default(), counts);
            add_counts(stats.by_tier.entry(node.tier).or_default(), counts);
        }

        stats.completion_percent = stats.overall.completion_percent();
        stats
    }

    pub fn progress(&self) -> Progress {
        let total = self.catalog.len();
        let unlocked = self.unlocked.len();
        let percent = if total == 0 {
            0.0
        } else {
            unlocked as f64 / total as f64 * 100.0
        };
        Progress {
            unlocked,
            total,
            percent,
        }
    }

    /// Re-run the catalog integrity checks and describe any issue found.
    pub fn validate_catalog(&self) -> Vec<String> {
        let issues: Vec<String> = self
            .catalog
            .validate()
            .iter()
            .map(ToString::to_string)
            .collect();
        for issue in &issues {
            tracing::warn!(%issue, "catalog integrity issue");
        }
        issues
    }
}

/// The eligibility gate, in node-state order.
fn gate<'c>(
    catalog: &'c Catalog,
    unlocked: &HashSet<SkillId>,
    id: &str,
    xp: u32,
) -> Result<&'c SkillNode, UnlockRejected> {
    let node = catalog
        .get(id)
        .ok_or_else(|| UnlockRejected::UnknownSkill(SkillId::new(id)))?;

    if unlocked.contains(&node.id) {
        return Err(UnlockRejected::AlreadyUnlocked(node.id.clone()));
    }

    let missing: Vec<SkillId> = node
        .prerequisites
        .iter()
        .filter(|p| !unlocked.contains(*p))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(UnlockRejected::PrerequisitesUnmet {
            skill: node.id.clone(),
            missing,
        });
    }

    if xp < node.cost {
        return Err(UnlockRejected::InsufficientXp {
            skill: node.id.clone(),
            cost: node.cost,
            xp,
        });
    }

    Ok(node)
}

fn add_counts(into: &mut StateCounts, c: StateCounts) {
    into.total += c.total;
    into.unlocked += c.unlocked;
    into.available += c.available;
    into.affordable += c.affordable;
    into.blocked += c.blocked;
}

// ===========================================================================
// Tests
// ===========================================================================
