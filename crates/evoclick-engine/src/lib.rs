//! Evolution Clicker Engine -- the game session.
//!
//! [`GameContext`] owns everything a running game needs: the content
//! catalog, balance tunables, the save state, derived stats, the event queue,
//! persistence and the cooperative timers. The presentation layer calls its
//! handlers and reacts to the [`GameEvent`](evoclick_core::event::GameEvent)s
//! it emits.
//!
//! # Handler Pipeline
//!
//! Every handler runs to completion before returning:
//!
//! 1. Mutate the save state (or reject the request without touching it).
//! 2. Recompute derived stats if research levels changed.
//! 3. Evaluate achievements.
//! 4. Queue events, then deliver them to listeners.
//!
//! Nothing suspends mid-handler, so listeners never observe a half-applied
//! change.
//!
//! # Time
//!
//! The engine never reads the clock. Hosts pass wall-clock milliseconds to
//! [`GameContext::advance`], which fires passive-income ticks and autosaves
//! for the elapsed time.

pub mod context;
pub mod summary;
pub mod timer;

pub use context::{GameContext, OfflineClaim};
pub use summary::SessionSummary;
pub use timer::{Interval, TimerFirings, Timers};
