//! Achievement evaluation for Evolution Clicker.
//!
//! [`evaluate`] walks the catalog's achievements in definition order, skips
//! the ones already unlocked, and unlocks every one whose requirement is met.
//! An unlock records the id, adds the reward to the save state's bonus
//! scalars, and recomputes derived stats on the spot, so a reward granted
//! early in a pass is visible to the requirements checked after it.
//!
//! Unlocking is one-way. An achievement already in the unlocked list is never
//! re-checked and its reward is never applied twice.

pub mod progress;

pub use progress::{UnlockCounts, requirement_progress, unlock_counts};

use evoclick_core::config::BalanceConfig;
use evoclick_core::defs::{Catalog, Requirement, Reward};
use evoclick_core::id::AchievementId;
use evoclick_core::state::SaveState;
use evoclick_core::stats::{DerivedStats, recompute};

/// One achievement unlocked by an evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AchievementUnlock {
    pub id: AchievementId,
    pub name: String,
    pub reward: Reward,
}

/// Whether `requirement` holds for the given state and stats.
///
/// A research requirement naming a node the catalog does not define is never
/// met.
pub fn requirement_met(
    catalog: &Catalog,
    state: &SaveState,
    stats: &DerivedStats,
    requirement: &Requirement,
) -> bool {
    match requirement {
        Requirement::TotalClicks(n) => state.total_clicks() >= *n,
        Requirement::TotalPoints(p) => state.total_points() >= *p,
        Requirement::ResearchLevel { node, level } => {
            catalog.node(node).is_some() && state.level(node) >= *level
        }
        Requirement::PassiveIncome(p) => stats.passive_income >= *p,
    }
}

/// Add a reward's magnitude to the matching bonus scalar.
pub fn apply_reward(state: &mut SaveState, reward: Reward) {
    match reward {
        Reward::ClickMultiplierBonus(v) => state.add_click_multiplier_bonus(v),
        Reward::PassiveMultiplierBonus(v) => state.add_passive_multiplier_bonus(v),
    }
}

/// Unlock every achievement whose requirement is now met.
///
/// `stats` must be current on entry and is kept current: it is recomputed
/// after each reward. Returns the unlocks in the order they happened.
pub fn evaluate(
    catalog: &Catalog,
    config: &BalanceConfig,
    state: &mut SaveState,
    stats: &mut DerivedStats,
) -> Vec<AchievementUnlock> {
    let mut unlocked = Vec::new();

    for def in catalog.achievements() {
        if state.is_unlocked(&def.id) {
            continue;
        }
        if !requirement_met(catalog, state, stats, &def.requirement) {
            continue;
        }
        if !state.unlock_achievement(def.id.clone()) {
            continue;
        }
        apply_reward(state, def.reward);
        *stats = recompute(catalog, state, config);

        tracing::info!(achievement = %def.id, reward = ?def.reward, "achievement unlocked");
        unlocked.push(AchievementUnlock {
            id: def.id.clone(),
            name: def.name.clone(),
            reward: def.reward,
        });
    }

    unlocked
}

// ===========================================================================
// Tests
// ===========================================================================
