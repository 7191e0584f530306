//! Cooperative fixed-period timers.
//!
//! The host pumps [`Timers::advance`] with the current wall-clock time. Each
//! timer accumulates elapsed time and fires once per whole period that fits,
//! carrying the remainder forward, so irregular pumping neither loses nor
//! double-counts time.

/// A single fixed-period timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    period_ms: u64,
    accumulator_ms: u64,
}

impl Interval {
    /// A period of 0 is clamped to 1 ms.
    pub fn new(period_ms: u64) -> Self {
        Self {
            period_ms: period_ms.max(1),
            accumulator_ms: 0,
        }
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// Time accumulated toward the next firing.
    pub fn pending_ms(&self) -> u64 {
        self.accumulator_ms
    }

    /// Add `dt_ms` and return how many times the timer fires.
    pub fn accumulate(&mut self, dt_ms: u64) -> u64 {
        self.accumulator_ms = self.accumulator_ms.saturating_add(dt_ms);
        let fires = self.accumulator_ms / self.period_ms;
        self.accumulator_ms %= self.period_ms;
        fires
    }

    pub fn reset(&mut self) {
        self.accumulator_ms = 0;
    }
}

/// What one [`Timers::advance`] call fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerFirings {
    pub ticks: u64,
    pub autosaves: u64,
}

impl TimerFirings {
    pub fn is_empty(&self) -> bool {
        self.ticks == 0 && self.autosaves == 0
    }
}

/// The passive-income tick and the autosave timer, sharing one clock.
#[derive(Debug, Clone)]
pub struct Timers {
    tick: Interval,
    autosave: Interval,
    /// Time of the last `advance`, `None` while stopped.
    last_ms: Option<u64>,
}

impl Timers {
    /// Stopped timers. Call [`start`](Self::start) to begin counting.
    pub fn new(tick_interval_ms: u64, autosave_interval_ms: u64) -> Self {
        Self {
            tick: Interval::new(tick_interval_ms),
            autosave: Interval::new(autosave_interval_ms),
            last_ms: None,
        }
    }

    /// Start or restart both timers from `now_ms` with nothing accumulated.
    pub fn start(&mut self, now_ms: u64) {
        self.tick.reset();
        self.autosave.reset();
        self.last_ms = Some(now_ms);
    }

    /// Clear both timers. Later `advance` calls fire nothing until restarted.
    pub fn stop(&mut self) {
        self.tick.reset();
        self.autosave.reset();
        self.last_ms = None;
    }

    pub fn is_running(&self) -> bool {
        self.last_ms.is_some()
    }

    /// Move the clock to `now_ms`. A clock that went backwards advances by
    /// nothing.
    pub fn advance(&mut self, now_ms: u64) -> TimerFirings {
        let Some(last) = self.last_ms else {
            return TimerFirings::default();
        };
        let dt = now_ms.saturating_sub(last);
        self.last_ms = Some(last.max(now_ms));
        TimerFirings {
            ticks: self.tick.accumulate(dt),
            autosaves: self.autosave.accumulate(dt),
        }
    }

    pub fn tick(&self) -> &Interval {
        &self.tick
    }

    pub fn autosave(&self) -> &Interval {
        &self.autosave
    }
}
