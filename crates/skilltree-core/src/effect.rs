//! Skill effects: what unlocking a skill does to the player.
//!
//! [`Effect`] is a closed set of variants. Scalar variants add a flat amount
//! to one [`Stat`]; the remaining variants compose, gate, time-limit, or
//! scale other effects. Effects never touch player storage directly; every
//! mutation goes through [`Player::modify_stat`].
//!
//! # Magnitude
//!
//! [`Effect::magnitude`] is the static value of an effect as defined in the
//! catalog. [`Effect::effective_magnitude`] resolves the XP- and
//! unlock-dependent variants (`Scaling`, `Synergy`) against an
//! [`EffectContext`].
//!
//! # Temporary effects
//!
//! Applying a `Temporary` effect applies its inner effect once and reports
//! the duration in [`EffectOutcome::started_timers`]. The caller owns the
//! resulting [`TemporaryTimer`] and advances it with [`TemporaryTimer::tick`].

use crate::id::SkillId;
use crate::player::{Player, PlayerError, Stat};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Engine-side state an effect may depend on.
#[derive(Debug, Clone, Copy)]
pub struct EffectContext<'a> {
    /// The player's XP at the time of evaluation.
    pub xp: u32,
    /// Skills currently held.
    pub unlocked: &'a HashSet<SkillId>,
}

impl<'a> EffectContext<'a> {
    pub fn new(xp: u32, unlocked: &'a HashSet<SkillId>) -> Self {
        Self { xp, unlocked }
    }
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// A predicate over player state, evaluated when a conditional effect is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    /// The stat is strictly below the threshold.
    StatBelow { stat: Stat, threshold: f32 },
    /// The stat is at or above the threshold.
    StatAtLeast { stat: Stat, threshold: f32 },
    /// The player holds at least this much XP.
    XpAtLeast(u32),
    /// The given skill is already unlocked.
    SkillUnlocked(SkillId),
    /// Every inner condition holds. Empty is true.
    All(Vec<Condition>),
    /// At least one inner condition holds. Empty is false.
    Any(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn evaluate(&self, player: &dyn Player, ctx: &EffectContext<'_>) -> bool {
        match self {
            Condition::StatBelow { stat, threshold } => player.stat(*stat) < *threshold,
            Condition::StatAtLeast { stat, threshold } => player.stat(*stat) >= *threshold,
            Condition::XpAtLeast(xp) => ctx.xp >= *xp,
            Condition::SkillUnlocked(id) => ctx.unlocked.contains(id),
            Condition::All(inner) => inner.iter().all(|c| c.evaluate(player, ctx)),
            Condition::Any(inner) => inner.iter().any(|c| c.evaluate(player, ctx)),
            Condition::Not(inner) => !inner.evaluate(player, ctx),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Condition::StatBelow { stat, threshold } => format!("{stat} below {threshold}"),
            Condition::StatAtLeast { stat, threshold } => format!("{stat} at least {threshold}"),
            Condition::XpAtLeast(xp) => format!("at least {xp} XP"),
            Condition::SkillUnlocked(id) => format!("{id} unlocked"),
            Condition::All(inner) => join_conditions(inner, " and "),
            Condition::Any(inner) => join_conditions(inner, " or "),
            Condition::Not(inner) => format!("not ({})", inner.describe()),
        }
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a SkillId>) {
        match self {
            Condition::SkillUnlocked(id) => out.push(id),
            Condition::All(inner) | Condition::Any(inner) => {
                for condition in inner {
                    condition.collect_references(out);
                }
            }
            Condition::Not(inner) => inner.collect_references(out),
            Condition::StatBelow { .. } | Condition::StatAtLeast { .. } | Condition::XpAtLeast(_) => {}
        }
    }
}

fn join_conditions(conditions: &[Condition], sep: &str) -> String {
    let parts: Vec<String> = conditions.iter().map(Condition::describe).collect();
    format!("({})", parts.join(sep))
}

// ---------------------------------------------------------------------------
// Effect
// ---------------------------------------------------------------------------

/// The gameplay modifier granted by a skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    Health(f32),
    Speed(f32),
    Damage(f32),
    Range(f32),
    AttackSpeed(f32),
    Defense(f32),
    Utility(f32),

    /// Sub-effects applied in list order. Magnitude is the sum.
    Composite(Vec<Effect>),

    /// Applies `effect` only if `condition` holds at apply time.
    Conditional {
        condition: Condition,
        effect: Box<Effect>,
    },

    /// Applies `effect` and starts a timer of `duration` time units.
    Temporary { effect: Box<Effect>, duration: f32 },

    /// `base + increment * floor(xp / step)` added to `stat`.
    Scaling {
        stat: Stat,
        base: f32,
        increment: f32,
        step: u32,
    },

    /// `base * multiplier^n` added to `stat`, where `n` is the number of
    /// `companions` already unlocked.
    Synergy {
        stat: Stat,
        base: f32,
        multiplier: f32,
        companions: Vec<SkillId>,
    },
}

/// Result of a successful [`Effect::apply`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectOutcome {
    /// Every stat modification made, in application order.
    pub modifications: Vec<(Stat, f32)>,
    /// Number of conditional effects whose condition was false.
    pub skipped_conditions: usize,
    /// Durations of temporary effects started by this application.
    pub started_timers: Vec<f32>,
}

impl EffectOutcome {
    fn merge(&mut self, other: EffectOutcome) {
        self.modifications.extend(other.modifications);
        self.skipped_conditions += other.skipped_conditions;
        self.started_timers.extend(other.started_timers);
    }
}

impl Effect {
    /// Build the scalar variant for `stat`.
    pub fn scalar(stat: Stat, amount: f32) -> Effect {
        match stat {
            Stat::Health => Effect::Health(amount),
            Stat::Speed => Effect::Speed(amount),
            Stat::Damage => Effect::Damage(amount),
            Stat::Range => Effect::Range(amount),
            Stat::AttackSpeed => Effect::AttackSpeed(amount),
            Stat::Defense => Effect::Defense(amount),
            Stat::Utility => Effect::Utility(amount),
        }
    }

    /// The stat and amount of a scalar variant.
    pub fn as_scalar(&self) -> Option<(Stat, f32)> {
        match self.shape() {
            Shape::Scalar(stat, amount) => Some((stat, amount)),
            _ => None,
        }
    }

    /// Convenience constructor for [`Effect::Conditional`].
    pub fn when(condition: Condition, effect: Effect) -> Effect {
        Effect::Conditional {
            condition,
            effect: Box::new(effect),
        }
    }

    /// Convenience constructor for [`Effect::Temporary`].
    pub fn timed(effect: Effect, duration: f32) -> Effect {
        Effect::Temporary {
            effect: Box::new(effect),
            duration,
        }
    }

    /// Every skill id this effect names, as a synergy companion or in a
    /// `SkillUnlocked` condition, in definition order.
    pub fn referenced_skills(&self) -> Vec<&SkillId> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a SkillId>) {
        match self.shape() {
            Shape::Scalar(..) | Shape::Scaling { .. } => {}
            Shape::Composite(effects) => {
                for effect in effects {
                    effect.collect_references(out);
                }
            }
            Shape::Conditional(condition, effect) => {
                condition.collect_references(out);
                effect.collect_references(out);
            }
            Shape::Temporary(effect, _) => effect.collect_references(out),
            Shape::Synergy { companions, .. } => out.extend(companions),
        }
    }

    fn shape(&self) -> Shape<'_> {
        match self {
            Effect::Health(v) => Shape::Scalar(Stat::Health, *v),
            Effect::Speed(v) => Shape::Scalar(Stat::Speed, *v),
            Effect::Damage(v) => Shape::Scalar(Stat::Damage, *v),
            Effect::Range(v) => Shape::Scalar(Stat::Range, *v),
            Effect::AttackSpeed(v) => Shape::Scalar(Stat::AttackSpeed, *v),
            Effect::Defense(v) => Shape::Scalar(Stat::Defense, *v),
            Effect::Utility(v) => Shape::Scalar(Stat::Utility, *v),
            Effect::Composite(effects) => Shape::Composite(effects),
            Effect::Conditional { condition, effect } => Shape::Conditional(condition, effect),
            Effect::Temporary { effect, duration } => Shape::Temporary(effect, *duration),
            Effect::Scaling {
                stat,
                base,
                increment,
                step,
            } => Shape::Scaling {
                stat: *stat,
                base: *base,
                increment: *increment,
                step: *step,
            },
            Effect::Synergy {
                stat,
                base,
                multiplier,
                companions,
            } => Shape::Synergy {
                stat: *stat,
                base: *base,
                multiplier: *multiplier,
                companions,
            },
        }
    }

    /// Human-readable description.
    pub fn describe(&self) -> String {
        match self.shape() {
            Shape::Scalar(stat, amount) => format!("{amount:+} {stat}"),
            Shape::Composite(effects) => {
                let parts: Vec<String> = effects.iter().map(Effect::describe).collect();
                parts.join(", ")
            }
            Shape::Conditional(condition, effect) => {
                format!("{} while {}", effect.describe(), condition.describe())
            }
            Shape::Temporary(effect, duration) => {
                format!("{} for {duration}s", effect.describe())
            }
            Shape::Scaling {
                stat,
                base,
                increment,
                step,
            } => format!("{base:+} {stat}, {increment:+} per {step} XP"),
            Shape::Synergy {
                stat,
                base,
                multiplier,
                companions,
            } => {
                let names: Vec<&str> = companions.iter().map(SkillId::as_str).collect();
                format!(
                    "{base:+} {stat}, x{multiplier} per unlocked companion ({})",
                    names.join(", ")
                )
            }
        }
    }

    /// Static magnitude as defined in the catalog. Scaling and synergy
    /// effects report their base value.
    pub fn magnitude(&self) -> f32 {
        match self.shape() {
            Shape::Scalar(_, amount) => amount,
            Shape::Composite(effects) => effects.iter().map(Effect::magnitude).sum(),
            Shape::Conditional(_, effect) | Shape::Temporary(effect, _) => effect.magnitude(),
            Shape::Scaling { base, .. } | Shape::Synergy { base, .. } => base,
        }
    }

    /// Magnitude with XP scaling and synergy bonuses resolved. Conditional
    /// effects pass through regardless of their predicate.
    pub fn effective_magnitude(&self, ctx: &EffectContext<'_>) -> f32 {
        match self.shape() {
            Shape::Scalar(_, amount) => amount,
            Shape::Composite(effects) => effects.iter().map(|e| e.effective_magnitude(ctx)).sum(),
            Shape::Conditional(_, effect) | Shape::Temporary(effect, _) => {
                effect.effective_magnitude(ctx)
            }
            Shape::Scaling {
                base,
                increment,
                step,
                ..
            } => scaled_value(base, increment, step, ctx.xp),
            Shape::Synergy {
                base,
                multiplier,
                companions,
                ..
            } => synergy_value(base, multiplier, companions, ctx.unlocked),
        }
    }

    /// Apply the effect to the player.
    ///
    /// Composite effects apply their children in order and stop at the first
    /// player failure. Modifications already made are not rolled back.
    pub fn apply(
        &self,
        player: &mut dyn Player,
        ctx: &EffectContext<'_>,
    ) -> Result<EffectOutcome, PlayerError> {
        let mut outcome = EffectOutcome::default();

        match self.shape() {
            Shape::Scalar(stat, amount) => {
                player.modify_stat(stat, amount)?;
                outcome.modifications.push((stat, amount));
            }
            Shape::Composite(effects) => {
                for effect in effects {
                    outcome.merge(effect.apply(player, ctx)?);
                }
            }
            Shape::Conditional(condition, effect) => {
                if condition.evaluate(player, ctx) {
                    outcome.merge(effect.apply(player, ctx)?);
                } else {
                    outcome.skipped_conditions += 1;
                }
            }
            Shape::Temporary(effect, duration) => {
                outcome.merge(effect.apply(player, ctx)?);
                outcome.started_timers.push(duration);
            }
            Shape::Scaling { stat, .. } | Shape::Synergy { stat, .. } => {
                let amount = self.effective_magnitude(ctx);
                player.modify_stat(stat, amount)?;
                outcome.modifications.push((stat, amount));
            }
        }

        Ok(outcome)
    }
}

/// Borrowed view of an [`Effect`] with the scalar variants folded together.
enum Shape<'a> {
    Scalar(Stat, f32),
    Composite(&'a [Effect]),
    Conditional(&'a Condition, &'a Effect),
    Temporary(&'a Effect, f32),
    Scaling {
        stat: Stat,
        base: f32,
        increment: f32,
        step: u32,
    },
    Synergy {
        stat: Stat,
        base: f32,
        multiplier: f32,
        companions: &'a [SkillId],
    },
}

fn scaled_value(base: f32, increment: f32, step: u32, xp: u32) -> f32 {
    if step == 0 {
        return base;
    }
    base + increment * (xp / step) as f32
}

fn synergy_value(
    base: f32,
    multiplier: f32,
    companions: &[SkillId],
    unlocked: &HashSet<SkillId>,
) -> f32 {
    let active = companions.iter().filter(|c| unlocked.contains(*c)).count();
    base * multiplier.powi(active as i32)
}

// ---------------------------------------------------------------------------
// Temporary timers
// ---------------------------------------------------------------------------

/// Runtime state of a temporary effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerState {
    Inactive,
    Active { remaining: f32 },
}

/// Countdown for a started temporary effect. Advanced only by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporaryTimer {
    duration: f32,
    state: TimerState,
}

impl TemporaryTimer {
    /// A timer for `duration`, not yet started.
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            state: TimerState::Inactive,
        }
    }

    /// Start (or restart) the countdown. A non-positive duration leaves the
    /// timer inactive.
    pub fn start(&mut self) {
        self.state = if self.duration > 0.0 {
            TimerState::Active {
                remaining: self.duration,
            }
        } else {
            TimerState::Inactive
        };
    }

    pub fn stop(&mut self) {
        self.state = TimerState::Inactive;
    }

    /// Advance by `dt`. Returns true if the timer expired during this tick.
    /// Negative and NaN steps count as zero; time never runs backwards.
    pub fn tick(&mut self, dt: f32) -> bool {
        let dt = if dt.is_nan() { 0.0 } else { dt.max(0.0) };
        match self.state {
            TimerState::Inactive => false,
            TimerState::Active { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    self.state = TimerState::Inactive;
                    true
                } else {
                    self.state = TimerState::Active { remaining };
                    false
                }
            }
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TimerState::Active { .. })
    }

    /// Remaining time, zero when inactive.
    pub fn remaining(&self) -> f32 {
        match self.state {
            TimerState::Inactive => 0.0,
            TimerState::Active { remaining } => remaining,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
