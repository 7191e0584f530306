//! Session statistics for the footer panel.

use evoclick_achievements::{UnlockCounts, unlock_counts};
use evoclick_core::defs::Catalog;
use evoclick_core::format::{format_duration, format_number};
use evoclick_core::state::SaveState;
use evoclick_research::{ResearchTree, TreeProgress};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    /// Persisted play time plus the unsaved part of this session.
    pub play_time_secs: u64,
    /// Start of the first session, epoch milliseconds.
    pub session_start_ms: u64,
    pub achievements: UnlockCounts,
    pub points_spent: f64,
    pub research: TreeProgress,
}

impl SessionSummary {
    /// Build a summary. `unsaved_secs` is session time not yet folded into
    /// the save.
    pub fn collect(catalog: &Catalog, state: &SaveState, unsaved_secs: u64) -> Self {
        Self {
            play_time_secs: state.total_play_time_secs().saturating_add(unsaved_secs),
            session_start_ms: state.session_start_ms(),
            achievements: unlock_counts(catalog, state),
            points_spent: state.points_spent(),
            research: ResearchTree::new(catalog).progress(state),
        }
    }

    /// `(label, value)` rows as the footer shows them.
    pub fn rows(&self) -> [(&'static str, String); 5] {
        [
            ("play_time", format_duration(self.play_time_secs)),
            (
                "achievements",
                format!("{}/{}", self.achievements.unlocked, self.achievements.total),
            ),
            ("points_spent", format_number(self.points_spent)),
            (
                "research",
                format!("{}/{}", self.research.researched, self.research.total),
            ),
            ("progress", format!("{}%", self.research.percent)),
        ]
    }
}
