//! Display formatting for amounts and durations.

/// Short-scale suffixes, largest first.
const SUFFIXES: [(f64, &str); 11] = [
    (1e33, "D"),
    (1e30, "N"),
    (1e27, "O"),
    (1e24, "Sp"),
    (1e21, "S"),
    (1e18, "Qi"),
    (1e15, "Q"),
    (1e12, "T"),
    (1e9, "B"),
    (1e6, "M"),
    (1e3, "K"),
];

/// Format an amount for display.
///
/// The value is rounded up to a whole number first. Amounts of a thousand or
/// more get two decimals and a suffix; smaller amounts print as integers.
/// Infinity (the cost of a maxed node) prints as `MAX`.
pub fn format_number(value: f64) -> String {
    if value == f64::INFINITY {
        return "MAX".to_string();
    }
    if value.is_nan() {
        return "0".to_string();
    }
    let value = value.ceil();
    for (scale, suffix) in SUFFIXES {
        if value >= scale {
            return format!("{:.2}{suffix}", value / scale);
        }
    }
    format!("{value:.0}")
}

/// Format whole seconds as `HH:MM:SS`. Hours are not wrapped.
pub fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
