//! Aggregate stat recompute.
//!
//! Click power and passive income are a pure function of the save state, the
//! catalog and the balance config. They are rebuilt from scratch after every
//! mutation that can change them; nothing is patched incrementally.

use crate::config::BalanceConfig;
use crate::defs::{Catalog, EffectKind};
use crate::state::SaveState;

/// Derived, never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedStats {
    /// Points per click.
    pub click_power: f64,
    /// Points per second.
    pub passive_income: f64,
}

/// Intermediate accumulators of a recompute, before the final product and
/// rounding. Exposed for stat tooltips and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatBreakdown {
    pub base_click: f64,
    pub base_passive: f64,
    pub additive_click: f64,
    pub additive_passive: f64,
    /// Multiplier-node contribution plus the click reward bonus.
    pub click_multiplier: f64,
    /// Multiplier-node contribution plus the passive reward bonus.
    pub passive_multiplier: f64,
}

impl StatBreakdown {
    /// Unrounded `(base + additive) * (1 + multiplier)` for each stream.
    pub fn totals(&self) -> (f64, f64) {
        (
            (self.base_click + self.additive_click) * (1.0 + self.click_multiplier),
            (self.base_passive + self.additive_passive) * (1.0 + self.passive_multiplier),
        )
    }
}

/// Sum every researched node's contribution.
///
/// Nodes at level 0 contribute nothing. Levels recorded for ids the catalog
/// does not define are skipped.
pub fn breakdown(catalog: &Catalog, state: &SaveState, config: &BalanceConfig) -> StatBreakdown {
    let mut out = StatBreakdown {
        base_click: config.base_click_power,
        base_passive: config.base_passive_income,
        ..StatBreakdown::default()
    };

    for (id, level) in state.levels() {
        if level == 0 {
            continue;
        }
        let Some(node) = catalog.node(id) else {
            tracing::debug!(node = %id, level, "level recorded for unknown node, skipped");
            continue;
        };
        let value = node.effect_value(level);
        match node.effect.kind {
            EffectKind::Click => out.additive_click += value,
            EffectKind::Passive => out.additive_passive += value,
            EffectKind::Multiplier => {
                let scaled = value * f64::from(level);
                out.click_multiplier += scaled;
                out.passive_multiplier += scaled;
            }
        }
    }

    out.click_multiplier += state.click_multiplier_bonus();
    out.passive_multiplier += state.passive_multiplier_bonus();
    out
}

/// Recompute click power and passive income, rounded to the configured
/// precision.
pub fn recompute(catalog: &Catalog, state: &SaveState, config: &BalanceConfig) -> DerivedStats {
    let (click, passive) = breakdown(catalog, state, config).totals();
    DerivedStats {
        click_power: config.round(click),
        passive_income: config.round(passive),
    }
}

// ===========================================================================
// Tests
// ===========================================================================
