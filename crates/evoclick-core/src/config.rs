use serde::{Deserialize, Serialize};

/// Balance tunables. Loaded from `balance.toml` in a data directory; any key
/// left out takes its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Click power with no research or bonuses.
    pub base_click_power: f64,
    /// Passive income with no research or bonuses.
    pub base_passive_income: f64,
    /// Decimal places kept on derived stats.
    pub precision_decimals: u32,
    /// Absences shorter than this earn nothing.
    pub offline_min_secs: u64,
    /// Absences are credited for at most this long.
    pub offline_cap_secs: u64,
    pub tick_interval_ms: u64,
    pub autosave_interval_ms: u64,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            base_click_power: 1.0,
            base_passive_income: 0.0,
            precision_decimals: 2,
            offline_min_secs: 20,
            offline_cap_secs: 86_400,
            tick_interval_ms: 1_000,
            autosave_interval_ms: 30_000,
        }
    }
}

impl BalanceConfig {
    /// Round half away from zero to `precision_decimals` places.
    pub fn round(&self, value: f64) -> f64 {
        let scale = 10f64.powi(self.precision_decimals as i32);
        (value * scale).round() / scale
    }
}
