//! The persisted save record.
//!
//! [`SaveState`] is the single source of truth for player progress. Every
//! field round-trips through the save codec; nothing derived (click power,
//! passive income) is stored here.
//!
//! Field names on the wire are the camelCase names of the browser record the
//! game has always written, so old saves deserialize directly once migrated.

use crate::defs::Catalog;
use crate::id::{AchievementId, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Current save format version. Records without a version are legacy (0).
pub const SAVE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ru,
    En,
}

impl Language {
    pub fn toggled(self) -> Self {
        match self {
            Language::Ru => Language::En,
            Language::En => Language::Ru,
        }
    }
}

/// User preferences. Survive a progress reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    pub sound_enabled: bool,
    pub theme: Theme,
    pub language: Language,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            sound_enabled: true,
            theme: Theme::Light,
            language: Language::Ru,
        }
    }
}

// ---------------------------------------------------------------------------
// SaveState
// ---------------------------------------------------------------------------

/// Player progress.
///
/// Invariants maintained by the mutators:
/// - the balance is never negative;
/// - an achievement id appears in the unlocked list at most once, and is only
///   removed by [`SaveState::reset`];
/// - lifetime totals never decrease.
///
/// Levels are bounded by the catalog; [`SaveState::sanitize`] enforces that
/// for records read from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SaveState {
    save_version: u32,

    /// Current spendable balance.
    #[serde(rename = "points")]
    balance: f64,

    /// Lifetime points earned.
    total_points: f64,

    /// Lifetime points spent on research.
    points_spent: f64,

    total_clicks: u64,

    /// Node levels. Absent means 0.
    research: BTreeMap<NodeId, u32>,

    /// Unlocked achievements in unlock order.
    unlocked_achievements: Vec<AchievementId>,

    /// Accumulated achievement rewards. Start at 0.
    click_multiplier_bonus: f64,
    passive_multiplier_bonus: f64,

    /// Whole seconds of play folded in at each save.
    #[serde(rename = "totalPlayTime")]
    total_play_time_secs: u64,

    /// Epoch milliseconds at which progress started.
    #[serde(rename = "sessionStartTime")]
    session_start_ms: u64,

    /// Epoch milliseconds of the last successful save.
    #[serde(rename = "lastSave")]
    last_save_ms: u64,

    options: Options,
}

impl Default for SaveState {
    fn default() -> Self {
        Self::new(0)
    }
}

impl SaveState {
    /// Fresh progress starting at `now_ms`.
    pub fn new(now_ms: u64) -> Self {
        Self {
            save_version: SAVE_VERSION,
            balance: 0.0,
            total_points: 0.0,
            points_spent: 0.0,
            total_clicks: 0,
            research: BTreeMap::new(),
            unlocked_achievements: Vec::new(),
            click_multiplier_bonus: 0.0,
            passive_multiplier_bonus: 0.0,
            total_play_time_secs: 0,
            session_start_ms: now_ms,
            last_save_ms: now_ms,
            options: Options::default(),
        }
    }

    /// Wipe all progress, keeping options.
    pub fn reset(&mut self, now_ms: u64) {
        let options = std::mem::take(&mut self.options);
        *self = Self {
            options,
            ..Self::new(now_ms)
        };
    }

    // -- Query API --

    pub fn save_version(&self) -> u32 {
        self.save_version
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn total_points(&self) -> f64 {
        self.total_points
    }

    pub fn points_spent(&self) -> f64 {
        self.points_spent
    }

    pub fn total_clicks(&self) -> u64 {
        self.total_clicks
    }

    /// Level of a node; 0 if never purchased.
    pub fn level(&self, id: &NodeId) -> u32 {
        self.research.get(id).copied().unwrap_or(0)
    }

    /// All recorded levels, including zero entries and ids unknown to the
    /// current catalog.
    pub fn levels(&self) -> impl Iterator<Item = (&NodeId, u32)> {
        self.research.iter().map(|(id, &level)| (id, level))
    }

    pub fn unlocked_achievements(&self) -> &[AchievementId] {
        &self.unlocked_achievements
    }

    pub fn is_unlocked(&self, id: &AchievementId) -> bool {
        self.unlocked_achievements.contains(id)
    }

    pub fn click_multiplier_bonus(&self) -> f64 {
        self.click_multiplier_bonus
    }

    pub fn passive_multiplier_bonus(&self) -> f64 {
        self.passive_multiplier_bonus
    }

    pub fn total_play_time_secs(&self) -> u64 {
        self.total_play_time_secs
    }

    pub fn session_start_ms(&self) -> u64 {
        self.session_start_ms
    }

    pub fn last_save_ms(&self) -> u64 {
        self.last_save_ms
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    // -- Mutation API --

    /// Overwrite the spendable balance. Negative or non-finite values clamp
    /// to 0. Lifetime totals are untouched.
    pub fn set_balance(&mut self, balance: f64) {
        self.balance = if balance.is_finite() {
            balance.max(0.0)
        } else {
            0.0
        };
    }

    /// Add earned points to the balance and the lifetime total. Non-positive
    /// or non-finite amounts are ignored.
    pub fn credit(&mut self, amount: f64) {
        if amount.is_finite() && amount > 0.0 {
            self.balance += amount;
            self.total_points += amount;
        }
    }

    pub fn record_click(&mut self) {
        self.total_clicks = self.total_clicks.saturating_add(1);
    }

    /// Debit `amount` and count it as spent. On insufficient balance, returns
    /// the shortfall and leaves the state untouched.
    pub fn try_spend(&mut self, amount: f64) -> Result<(), f64> {
        if amount > self.balance {
            return Err(amount - self.balance);
        }
        self.balance -= amount;
        self.points_spent += amount;
        Ok(())
    }

    pub fn set_level(&mut self, id: NodeId, level: u32) {
        self.research.insert(id, level);
    }

    /// Add an achievement to the unlocked list. Returns `false` if it was
    /// already there.
    pub fn unlock_achievement(&mut self, id: AchievementId) -> bool {
        if self.unlocked_achievements.contains(&id) {
            return false;
        }
        self.unlocked_achievements.push(id);
        true
    }

    pub fn add_click_multiplier_bonus(&mut self, amount: f64) {
        self.click_multiplier_bonus += amount;
    }

    pub fn add_passive_multiplier_bonus(&mut self, amount: f64) {
        self.passive_multiplier_bonus += amount;
    }

    pub fn add_play_time(&mut self, secs: u64) {
        self.total_play_time_secs = self.total_play_time_secs.saturating_add(secs);
    }

    pub fn mark_saved(&mut self, now_ms: u64) {
        self.last_save_ms = now_ms;
    }

    /// Repair a record read from storage against the catalog. Returns the
    /// number of corrections made.
    ///
    /// Levels above a node's `max_level` are clamped, a negative or non-finite
    /// balance becomes 0, and duplicate achievement ids are dropped. Levels for
    /// node ids the catalog does not know are kept untouched.
    pub fn sanitize(&mut self, catalog: &Catalog) -> usize {
        let mut fixes = 0;

        if !self.balance.is_finite() || self.balance < 0.0 {
            tracing::warn!(balance = self.balance, "save balance out of range, reset to 0");
            self.balance = 0.0;
            fixes += 1;
        }

        for (id, level) in self.research.iter_mut() {
            if let Some(node) = catalog.node(id)
                && *level > node.max_level
            {
                tracing::warn!(
                    node = %id,
                    level = *level,
                    max = node.max_level,
                    "clamped research level"
                );
                *level = node.max_level;
                fixes += 1;
            }
        }

        let before = self.unlocked_achievements.len();
        let mut seen = std::collections::HashSet::new();
        self.unlocked_achievements.retain(|id| seen.insert(id.clone()));
        let removed = before - self.unlocked_achievements.len();
        if removed > 0 {
            tracing::warn!(removed, "dropped duplicate achievement ids");
            fixes += removed;
        }

        fixes
    }
}

// ===========================================================================
// Tests
// ===========================================================================
