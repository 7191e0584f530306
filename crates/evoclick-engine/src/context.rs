//! The game session and its handlers.

use crate::summary::SessionSummary;
use crate::timer::{TimerFirings, Timers};
use evoclick_achievements::evaluate;
use evoclick_core::config::BalanceConfig;
use evoclick_core::defs::Catalog;
use evoclick_core::event::{EventQueue, GameEvent, GameEventKind, Listener, Notice, SoundCue};
use evoclick_core::id::NodeId;
use evoclick_core::state::SaveState;
use evoclick_core::stats::{DerivedStats, recompute};
use evoclick_data::{DataLoadError, GameData};
use evoclick_research::{PurchaseReceipt, ResearchError, ResearchTree};
use evoclick_storage::{LoadedSave, Persistence, SaveOrigin, SaveStore};
use std::path::Path;

/// Offline earnings waiting for the player to collect them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OfflineClaim {
    pub amount: f64,
    /// Real time away, uncapped.
    pub elapsed_secs: u64,
}

/// A running game.
pub struct GameContext<S> {
    catalog: Catalog,
    config: BalanceConfig,
    state: SaveState,
    stats: DerivedStats,
    events: EventQueue,
    persistence: Persistence<S>,
    timers: Timers,
    pending_offline: Option<OfflineClaim>,
    origin: SaveOrigin,
    /// Play time before this instant has been folded into the save.
    play_clock_ms: u64,
}

impl<S: SaveStore> GameContext<S> {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Load the saved game from `store` (or start fresh) and start the timers.
    ///
    /// A restored save is repaired against the catalog, and offline earnings
    /// are offered for the time since it was last saved.
    pub fn new(catalog: Catalog, config: BalanceConfig, store: S, now_ms: u64) -> Self {
        let mut persistence = Persistence::new(store);
        let LoadedSave { mut state, origin } = persistence.load(now_ms);
        state.sanitize(&catalog);
        let stats = recompute(&catalog, &state, &config);

        let mut timers = Timers::new(config.tick_interval_ms, config.autosave_interval_ms);
        timers.start(now_ms);

        let mut ctx = Self {
            catalog,
            config,
            state,
            stats,
            events: EventQueue::default(),
            persistence,
            timers,
            pending_offline: None,
            origin,
            play_clock_ms: now_ms,
        };
        tracing::info!(
            nodes = ctx.catalog.node_count(),
            achievements = ctx.catalog.achievement_count(),
            origin = ?ctx.origin,
            "game session started"
        );

        ctx.refresh_all();
        ctx.events.deliver();
        if matches!(ctx.origin, SaveOrigin::Restored { .. }) {
            let away = now_ms.saturating_sub(ctx.state.last_save_ms());
            ctx.on_offline_return(away);
        }
        ctx
    }

    /// [`new`](Self::new) with the content compiled into the binary.
    pub fn with_bundled_content(store: S, now_ms: u64) -> Result<Self, DataLoadError> {
        let GameData { catalog, balance } = evoclick_data::bundled()?;
        Ok(Self::new(catalog, balance, store, now_ms))
    }

    /// [`new`](Self::new) with content loaded from a data directory.
    pub fn from_data_dir(dir: &Path, store: S, now_ms: u64) -> Result<Self, DataLoadError> {
        let GameData { catalog, balance } = evoclick_data::load_game_data(dir)?;
        Ok(Self::new(catalog, balance, store, now_ms))
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &BalanceConfig {
        &self.config
    }

    pub fn state(&self) -> &SaveState {
        &self.state
    }

    pub fn stats(&self) -> DerivedStats {
        self.stats
    }

    /// Cost, availability and search queries over the loaded tree.
    pub fn research(&self) -> ResearchTree<'_> {
        ResearchTree::new(&self.catalog)
    }

    /// How the save state was obtained at startup.
    pub fn origin(&self) -> SaveOrigin {
        self.origin
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn pending_offline(&self) -> Option<OfflineClaim> {
        self.pending_offline
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Suppression and other queue settings.
    pub fn events_mut(&mut self) -> &mut EventQueue {
        &mut self.events
    }

    /// Register a listener for one event kind.
    pub fn on(&mut self, kind: GameEventKind, listener: Listener) {
        self.events.on(kind, listener);
    }

    /// Take every delivered event, oldest first.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }

    // -----------------------------------------------------------------------
    // Click and tick
    // -----------------------------------------------------------------------

    /// One click. Returns the points earned.
    pub fn on_click(&mut self) -> f64 {
        let earned = self.stats.click_power;
        self.state.record_click();
        self.state.credit(earned);
        self.emit_balance();
        self.sound(SoundCue::Click);
        self.check_achievements();
        self.events.deliver();
        earned
    }

    /// One passive-income period. Returns the points earned; 0 when there is
    /// no passive income, in which case nothing happens at all.
    pub fn on_tick(&mut self) -> f64 {
        let income = self.stats.passive_income;
        if income <= 0.0 {
            return 0.0;
        }
        self.state.credit(income);
        self.emit_balance();
        self.check_achievements();
        self.events.deliver();
        income
    }

    // -----------------------------------------------------------------------
    // Research
    // -----------------------------------------------------------------------

    /// Buy up to `count` levels of `node`. Nothing changes on error.
    pub fn purchase_levels(
        &mut self,
        node: &NodeId,
        count: u32,
    ) -> Result<PurchaseReceipt, ResearchError> {
        let result = ResearchTree::new(&self.catalog).purchase_levels(node, count, &mut self.state);
        self.finish_purchase(result)
    }

    /// Buy as many levels of `node` as the balance allows.
    pub fn purchase_max(&mut self, node: &NodeId) -> Result<PurchaseReceipt, ResearchError> {
        let result = ResearchTree::new(&self.catalog).purchase_max(node, &mut self.state);
        self.finish_purchase(result)
    }

    fn finish_purchase(
        &mut self,
        result: Result<PurchaseReceipt, ResearchError>,
    ) -> Result<PurchaseReceipt, ResearchError> {
        match &result {
            Ok(receipt) => self.apply_purchase(receipt),
            Err(e) => self.reject_purchase(e),
        }
        self.events.deliver();
        result
    }

    fn apply_purchase(&mut self, receipt: &PurchaseReceipt) {
        self.stats = recompute(&self.catalog, &self.state, &self.config);
        tracing::debug!(stats = ?self.stats, "stats recomputed after purchase");

        let language = self.state.options().language;
        let name = self
            .catalog
            .node(&receipt.node)
            .map_or_else(|| receipt.node.to_string(), |def| def.name_in(language).to_owned());

        self.events.emit(GameEvent::ResearchLeveled {
            node: receipt.node.clone(),
            from: receipt.from,
            to: receipt.to,
            cost: receipt.cost,
        });
        if receipt.first_unlock() {
            self.events.emit(GameEvent::ResearchUnlocked {
                node: receipt.node.clone(),
            });
            self.notice(Notice::ResearchUnlocked { name });
            self.sound(SoundCue::Unlock);
        } else {
            if receipt.levels() > 1 {
                self.notice(Notice::ResearchLeveled {
                    name,
                    levels: receipt.levels(),
                });
            }
            self.sound(SoundCue::Upgrade);
        }

        self.events.emit(GameEvent::StatsChanged(self.stats));
        self.emit_balance();
        self.emit_node(&receipt.node);
        // Children may have become available.
        for child in self.catalog.children(&receipt.node).to_vec() {
            self.emit_node(&child);
        }
        self.check_achievements();
    }

    fn reject_purchase(&mut self, error: &ResearchError) {
        match error {
            ResearchError::NodeNotFound(node) => {
                tracing::error!(node = %node, "purchase requested for undefined research node");
            }
            ResearchError::Locked { node, parent } => {
                tracing::debug!(node = %node, parent = %parent, "purchase of locked node ignored");
            }
            ResearchError::AlreadyMaxed(_) => {
                self.notice(Notice::MaxLevel);
                self.sound(SoundCue::Error);
            }
            ResearchError::InsufficientFunds { shortfall, .. } => {
                self.notice(Notice::NotEnoughPoints {
                    shortfall: *shortfall,
                });
                self.sound(SoundCue::Error);
            }
            ResearchError::NothingRequested(_) => {}
        }
    }

    // -----------------------------------------------------------------------
    // Offline earnings
    // -----------------------------------------------------------------------

    /// Offer earnings for `elapsed_ms` spent away.
    ///
    /// Absences shorter than `offline_min_secs`, or with no passive income,
    /// earn nothing. Longer ones earn `floor(passive * seconds)` with seconds
    /// capped at `offline_cap_secs`. The amount is held until
    /// [`claim_offline`](Self::claim_offline); a new offer replaces an
    /// unclaimed one.
    pub fn on_offline_return(&mut self, elapsed_ms: u64) -> Option<OfflineClaim> {
        let passive = self.stats.passive_income;
        if passive <= 0.0 || elapsed_ms < self.config.offline_min_secs.saturating_mul(1_000) {
            return None;
        }

        let secs = (elapsed_ms as f64 / 1_000.0).min(self.config.offline_cap_secs as f64);
        let amount = (passive * secs).floor();
        if amount <= 0.0 {
            return None;
        }

        let claim = OfflineClaim {
            amount,
            elapsed_secs: elapsed_ms / 1_000,
        };
        tracing::info!(amount, elapsed_secs = claim.elapsed_secs, "offline earnings available");
        self.pending_offline = Some(claim);
        self.events.emit(GameEvent::OfflineEarningsAvailable {
            amount,
            elapsed_secs: claim.elapsed_secs,
        });
        self.notice(Notice::OfflineEarnings {
            amount,
            elapsed_secs: claim.elapsed_secs,
        });
        self.events.deliver();
        Some(claim)
    }

    /// Credit the pending offline earnings. Returns the amount credited.
    pub fn claim_offline(&mut self) -> Option<f64> {
        let claim = self.pending_offline.take()?;
        self.state.credit(claim.amount);
        self.events.emit(GameEvent::OfflineEarningsClaimed {
            amount: claim.amount,
        });
        self.emit_balance();
        self.check_achievements();
        self.events.deliver();
        Some(claim.amount)
    }

    /// Discard the pending offline earnings. Returns whether there were any.
    pub fn dismiss_offline(&mut self) -> bool {
        self.pending_offline.take().is_some()
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Wipe all progress except options and persist the empty state.
    pub fn reset(&mut self, now_ms: u64) {
        self.state.reset(now_ms);
        self.stats = recompute(&self.catalog, &self.state, &self.config);
        self.pending_offline = None;
        self.play_clock_ms = now_ms;
        self.timers.start(now_ms);
        tracing::info!("progress reset");

        self.events.emit(GameEvent::ProgressReset);
        self.notice(Notice::ProgressReset);
        self.refresh_all();
        self.persist(now_ms);
        self.events.deliver();
    }

    /// Pump the timers to `now_ms`, running every passive tick and autosave
    /// that came due.
    pub fn advance(&mut self, now_ms: u64) -> TimerFirings {
        let firings = self.timers.advance(now_ms);
        if firings.ticks > 0 {
            tracing::debug!(ticks = firings.ticks, "passive ticks due");
        }
        for _ in 0..firings.ticks {
            self.on_tick();
        }
        if firings.autosaves > 0 {
            self.persist(now_ms);
        }
        firings
    }

    /// Fold elapsed session time into the play-time total, stamp the save
    /// time, and write the record. Returns whether it reached durable storage.
    pub fn persist(&mut self, now_ms: u64) -> bool {
        let secs = now_ms.saturating_sub(self.play_clock_ms) / 1_000;
        self.state.add_play_time(secs);
        self.play_clock_ms += secs * 1_000;
        self.state.mark_saved(now_ms);

        let durable = self.persistence.save(&self.state);
        tracing::debug!(durable, play_time = self.state.total_play_time_secs(), "game saved");
        durable
    }

    /// Stop the timers and save.
    pub fn shutdown(&mut self, now_ms: u64) -> bool {
        self.timers.stop();
        tracing::info!("game session ending");
        self.persist(now_ms)
    }

    pub fn summary(&self, now_ms: u64) -> SessionSummary {
        let unsaved = now_ms.saturating_sub(self.play_clock_ms) / 1_000;
        SessionSummary::collect(&self.catalog, &self.state, unsaved)
    }

    // -----------------------------------------------------------------------
    // Options
    // -----------------------------------------------------------------------

    /// Returns whether sound is now enabled.
    pub fn toggle_sound(&mut self) -> bool {
        let options = self.state.options_mut();
        options.sound_enabled = !options.sound_enabled;
        let enabled = options.sound_enabled;
        self.options_changed();
        enabled
    }

    pub fn toggle_theme(&mut self) {
        let options = self.state.options_mut();
        options.theme = options.theme.toggled();
        self.options_changed();
    }

    pub fn toggle_language(&mut self) {
        let options = self.state.options_mut();
        options.language = options.language.toggled();
        self.options_changed();
    }

    fn options_changed(&mut self) {
        self.events
            .emit(GameEvent::OptionsChanged(self.state.options().clone()));
        self.sound(SoundCue::Toggle);
        self.events.deliver();
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn check_achievements(&mut self) {
        let unlocks = evaluate(&self.catalog, &self.config, &mut self.state, &mut self.stats);
        if unlocks.is_empty() {
            return;
        }
        let language = self.state.options().language;
        for unlock in unlocks {
            let name = match self.catalog.achievement(&unlock.id) {
                Some(def) => def.name_in(language).to_owned(),
                None => unlock.name,
            };
            self.events.emit(GameEvent::AchievementUnlocked {
                achievement: unlock.id,
                reward: unlock.reward,
            });
            self.notice(Notice::AchievementUnlocked { name });
            self.sound(SoundCue::Achievement);
        }
        self.events.emit(GameEvent::StatsChanged(self.stats));
    }

    /// Stats, balance and every node, for a full redraw.
    fn refresh_all(&mut self) {
        self.events.emit(GameEvent::StatsChanged(self.stats));
        self.emit_balance();
        let ids: Vec<NodeId> = self.catalog.nodes().map(|n| n.id.clone()).collect();
        for id in &ids {
            self.emit_node(id);
        }
    }

    fn emit_balance(&mut self) {
        self.events.emit(GameEvent::BalanceChanged {
            balance: self.state.balance(),
            total_points: self.state.total_points(),
        });
    }

    fn emit_node(&mut self, id: &NodeId) {
        let tree = ResearchTree::new(&self.catalog);
        let (Ok(status), Ok(next_cost)) = (
            tree.node_status(id, &self.state),
            tree.next_cost(id, &self.state),
        ) else {
            return;
        };
        self.events.emit(GameEvent::NodeChanged {
            node: id.clone(),
            level: self.state.level(id),
            status,
            next_cost,
        });
    }

    fn notice(&mut self, notice: Notice) {
        self.events.emit(GameEvent::Notice(notice));
    }

    /// Sound cues are dropped while sound is off.
    fn sound(&mut self, cue: SoundCue) {
        if self.state.options().sound_enabled {
            self.events.emit(GameEvent::Sound(cue));
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
