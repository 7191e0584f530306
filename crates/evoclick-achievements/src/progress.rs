//! Partial progress toward requirements, for tooltips and summaries.

use evoclick_core::defs::{Catalog, Requirement};
use evoclick_core::state::SaveState;
use evoclick_core::stats::DerivedStats;

/// Fraction in `[0, 1]` of the way to meeting `requirement`.
///
/// A zero threshold counts as met. A research requirement on an unknown node
/// stays at 0.
pub fn requirement_progress(
    catalog: &Catalog,
    state: &SaveState,
    stats: &DerivedStats,
    requirement: &Requirement,
) -> f64 {
    let (current, target) = match requirement {
        Requirement::TotalClicks(n) => (state.total_clicks() as f64, *n as f64),
        Requirement::TotalPoints(p) => (state.total_points(), *p),
        Requirement::ResearchLevel { node, level } => {
            if catalog.node(node).is_none() {
                return 0.0;
            }
            (f64::from(state.level(node)), f64::from(*level))
        }
        Requirement::PassiveIncome(p) => (stats.passive_income, *p),
    };
    if target <= 0.0 {
        return 1.0;
    }
    (current / target).clamp(0.0, 1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlockCounts {
    pub unlocked: usize,
    pub total: usize,
}

/// Unlocked achievements out of those the catalog defines. Ids in the save
/// that the catalog no longer defines are not counted.
pub fn unlock_counts(catalog: &Catalog, state: &SaveState) -> UnlockCounts {
    UnlockCounts {
        unlocked: catalog
            .achievements()
            .filter(|a| state.is_unlocked(&a.id))
            .count(),
        total: catalog.achievement_count(),
    }
}
