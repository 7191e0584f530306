//! Evolution Clicker Core -- the progression model for an incremental game.
//!
//! This crate holds everything the progression engine needs that is not an
//! operation on the research tree or the achievement list: static content
//! definitions, the persisted save record, balance tunables, the aggregate
//! stat recompute, and the typed events the engine hands to the presentation
//! layer.
//!
//! # Data Flow
//!
//! ```text
//! UI event (click / tick / purchase)
//!     -> engine mutates SaveState
//!     -> stats::recompute(Catalog, SaveState, BalanceConfig)
//!     -> GameEvents queued, delivered to listeners
//!     -> save record persisted
//! ```
//!
//! Derived stats are never patched incrementally. They are recomputed from
//! scratch as a pure function of the save state and the definitions.
//!
//! # Key Types
//!
//! - [`defs::Catalog`] -- Validated, immutable research nodes and achievements.
//! - [`state::SaveState`] -- The single source of truth for player progress.
//! - [`config::BalanceConfig`] -- Base values, rounding, offline and timer constants.
//! - [`stats::DerivedStats`] -- Click power and passive income.
//! - [`event::EventQueue`] -- Buffered, typed engine-to-presentation events.

pub mod config;
pub mod defs;
pub mod event;
pub mod format;
pub mod id;
pub mod state;
pub mod stats;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
