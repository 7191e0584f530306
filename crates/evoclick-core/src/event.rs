//! Typed engine-to-presentation events.
//!
//! Handlers on the engine emit [`GameEvent`]s into an [`EventQueue`] while
//! they run, then call [`EventQueue::deliver`] once at the end. Delivery
//! hands each pending event, oldest first, to the passive listeners
//! registered for its kind, then moves it into a bounded history the host
//! can [`drain`](EventQueue::drain) instead of (or as well as) listening.
//!
//! # Suppression
//!
//! Kinds can be suppressed via [`EventQueue::suppress`]. Suppressed events
//! are dropped at emit time and never reach listeners or the history.

use crate::defs::Reward;
use crate::format::{format_duration, format_number};
use crate::id::{AchievementId, NodeId};
use crate::state::{Language, Options};
use crate::stats::DerivedStats;
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// Sound effects the presentation layer may play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Click,
    Unlock,
    Upgrade,
    Achievement,
    Error,
    Toggle,
}

/// How a research node should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeStatus {
    /// A parent is below the required level.
    Locked,
    /// Purchasable, level 0.
    Available,
    /// Level 1 or more.
    Researched { maxed: bool },
}

/// A user-facing message. Rendered to text per language by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// First level of a node bought.
    ResearchUnlocked { name: String },
    /// More than one level bought in one purchase.
    ResearchLeveled { name: String, levels: u32 },
    AchievementUnlocked { name: String },
    /// Purchase attempted on a node already at max level.
    MaxLevel,
    /// Purchase attempted without enough balance.
    NotEnoughPoints { shortfall: f64 },
    /// Offline earnings claimed.
    OfflineEarnings { amount: f64, elapsed_secs: u64 },
    ProgressReset,
}

impl Notice {
    pub fn render(&self, language: Language) -> String {
        match (self, language) {
            (Notice::ResearchUnlocked { name }, Language::Ru) => {
                format!("Исследование открыто: {name}")
            }
            (Notice::ResearchUnlocked { name }, Language::En) => {
                format!("Research unlocked: {name}")
            }
            (Notice::ResearchLeveled { name, levels }, Language::Ru) => {
                format!("{name} +{levels} уровней")
            }
            (Notice::ResearchLeveled { name, levels }, Language::En) => {
                format!("{name} +{levels} levels")
            }
            (Notice::AchievementUnlocked { name }, Language::Ru) => {
                format!("Достижение разблокировано: {name}")
            }
            (Notice::AchievementUnlocked { name }, Language::En) => {
                format!("Achievement unlocked: {name}")
            }
            (Notice::MaxLevel, Language::Ru) => "Максимальный уровень!".to_string(),
            (Notice::MaxLevel, Language::En) => "Maximum level!".to_string(),
            (Notice::NotEnoughPoints { shortfall }, Language::Ru) => format!(
                "Недостаточно очков эволюции! Не хватает {} очков.",
                format_number(*shortfall)
            ),
            (Notice::NotEnoughPoints { shortfall }, Language::En) => format!(
                "Not enough evolution points! {} more needed.",
                format_number(*shortfall)
            ),
            (Notice::OfflineEarnings { amount, elapsed_secs }, Language::Ru) => format!(
                "Пока вас не было ({}), вы заработали: {}",
                format_duration(*elapsed_secs),
                format_number(*amount)
            ),
            (Notice::OfflineEarnings { amount, elapsed_secs }, Language::En) => format!(
                "While you were away ({}), you earned: {}",
                format_duration(*elapsed_secs),
                format_number(*amount)
            ),
            (Notice::ProgressReset, Language::Ru) => "Прогресс сброшен".to_string(),
            (Notice::ProgressReset, Language::En) => "Progress reset".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    // -- Numbers --
    StatsChanged(DerivedStats),
    BalanceChanged {
        balance: f64,
        total_points: f64,
    },

    // -- Research --
    /// A node's drawn state may have changed.
    NodeChanged {
        node: NodeId,
        level: u32,
        status: NodeStatus,
        /// `None` when maxed.
        next_cost: Option<f64>,
    },
    /// A node went from level 0 to level 1 or more.
    ResearchUnlocked {
        node: NodeId,
    },
    ResearchLeveled {
        node: NodeId,
        from: u32,
        to: u32,
        cost: f64,
    },

    // -- Achievements --
    AchievementUnlocked {
        achievement: AchievementId,
        reward: Reward,
    },

    // -- Offline earnings --
    OfflineEarningsAvailable {
        amount: f64,
        elapsed_secs: u64,
    },
    OfflineEarningsClaimed {
        amount: f64,
    },

    // -- Session --
    OptionsChanged(Options),
    ProgressReset,

    // -- Presentation --
    Notice(Notice),
    Sound(SoundCue),
}

/// Discriminant tag for event types, used for suppression and listener
/// registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameEventKind {
    StatsChanged,
    BalanceChanged,
    NodeChanged,
    ResearchUnlocked,
    ResearchLeveled,
    AchievementUnlocked,
    OfflineEarningsAvailable,
    OfflineEarningsClaimed,
    OptionsChanged,
    ProgressReset,
    Notice,
    Sound,
}

const EVENT_KIND_COUNT: usize = 12;

impl GameEvent {
    pub fn kind(&self) -> GameEventKind {
        match self {
            GameEvent::StatsChanged(_) => GameEventKind::StatsChanged,
            GameEvent::BalanceChanged { .. } => GameEventKind::BalanceChanged,
            GameEvent::NodeChanged { .. } => GameEventKind::NodeChanged,
            GameEvent::ResearchUnlocked { .. } => GameEventKind::ResearchUnlocked,
            GameEvent::ResearchLeveled { .. } => GameEventKind::ResearchLeveled,
            GameEvent::AchievementUnlocked { .. } => GameEventKind::AchievementUnlocked,
            GameEvent::OfflineEarningsAvailable { .. } => GameEventKind::OfflineEarningsAvailable,
            GameEvent::OfflineEarningsClaimed { .. } => GameEventKind::OfflineEarningsClaimed,
            GameEvent::OptionsChanged(_) => GameEventKind::OptionsChanged,
            GameEvent::ProgressReset => GameEventKind::ProgressReset,
            GameEvent::Notice(_) => GameEventKind::Notice,
            GameEvent::Sound(_) => GameEventKind::Sound,
        }
    }
}

impl GameEventKind {
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventQueue
// ---------------------------------------------------------------------------

/// A passive listener receives events read-only.
pub type Listener = Box<dyn FnMut(&GameEvent)>;

/// Pending events, per-kind listeners, suppression flags and a bounded
/// history of delivered events.
pub struct EventQueue {
    pending: Vec<GameEvent>,
    history: VecDeque<GameEvent>,
    history_capacity: usize,
    /// Events dropped from the history because it was full.
    dropped: u64,
    suppressed: [bool; EVENT_KIND_COUNT],
    listeners: [Vec<Listener>; EVENT_KIND_COUNT],
}

impl std::fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("pending", &self.pending)
            .field("history_len", &self.history.len())
            .field("history_capacity", &self.history_capacity)
            .field("dropped", &self.dropped)
            .field("suppressed", &self.suppressed)
            .finish_non_exhaustive()
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventQueue {
    /// Create a queue keeping at most `history_capacity` delivered events.
    /// A capacity of 0 is clamped to 1.
    pub fn new(history_capacity: usize) -> Self {
        Self {
            pending: Vec::new(),
            history: VecDeque::new(),
            history_capacity: history_capacity.max(1),
            dropped: 0,
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: Default::default(),
        }
    }

    pub fn suppress(&mut self, kind: GameEventKind) {
        self.suppressed[kind.index()] = true;
        self.pending.retain(|e| e.kind() != kind);
    }

    pub fn unsuppress(&mut self, kind: GameEventKind) {
        self.suppressed[kind.index()] = false;
    }

    pub fn is_suppressed(&self, kind: GameEventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Queue an event. No-ops if its kind is suppressed.
    pub fn emit(&mut self, event: GameEvent) {
        if self.suppressed[event.kind().index()] {
            return;
        }
        self.pending.push(event);
    }

    /// Register a listener for one kind. Listeners of a kind run in
    /// registration order.
    pub fn on(&mut self, kind: GameEventKind, listener: Listener) {
        self.listeners[kind.index()].push(listener);
    }

    /// Hand every pending event to its listeners, oldest first, then move it
    /// into the history.
    pub fn deliver(&mut self) {
        for event in std::mem::take(&mut self.pending) {
            for listener in &mut self.listeners[event.kind().index()] {
                listener(&event);
            }
            if self.history.len() == self.history_capacity {
                self.history.pop_front();
                self.dropped += 1;
            }
            self.history.push_back(event);
        }
    }

    /// Take every delivered event still in the history, oldest first.
    pub fn drain(&mut self) -> Vec<GameEvent> {
        self.history.drain(..).collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// Discard pending events and the history. Listeners are kept.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.history.clear();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
