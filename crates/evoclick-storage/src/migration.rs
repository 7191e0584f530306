//! Save format version migration.
//!
//! A registry of functions that each transform a decoded save document from
//! version N to N+1. The codec chains them to bring any older document up to
//! [`SAVE_VERSION`](evoclick_core::state::SAVE_VERSION) before deserializing it.
//!
//! Documents without a `saveVersion` key are version 0: the record written by
//! the original browser build.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Errors that can occur during migration.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("no migration path from version {from} to version {to}")]
    NoMigrationPath { from: u32, to: u32 },
    #[error("migration from version {from} to version {to} failed: {reason}")]
    MigrationFailed { from: u32, to: u32, reason: String },
}

/// One upgrade step over a parsed save document.
pub type MigrationFn = fn(Value) -> Result<Value, MigrationError>;

/// Upgrade steps keyed by the version they upgrade from.
pub struct MigrationRegistry {
    migrations: BTreeMap<u32, MigrationFn>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self {
            migrations: BTreeMap::new(),
        }
    }

    /// Every step needed to reach the current save version.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(0, legacy_to_v1);
        registry
    }

    /// Add the step from `version` to `version + 1`, replacing any earlier one.
    pub fn register(&mut self, version: u32, step: MigrationFn) {
        self.migrations.insert(version, step);
    }

    /// Whether every step from `from` up to `to` is registered.
    pub fn can_migrate(&self, from: u32, to: u32) -> bool {
        from <= to && (from..to).all(|v| self.migrations.contains_key(&v))
    }

    /// Run every step from `from` up to `to` in order. With `from == to` the
    /// document comes back untouched.
    pub fn migrate(&self, mut doc: Value, from: u32, to: u32) -> Result<Value, MigrationError> {
        if from > to {
            return Err(MigrationError::NoMigrationPath { from, to });
        }
        for version in from..to {
            let step = self
                .migrations
                .get(&version)
                .ok_or(MigrationError::NoMigrationPath { from, to })?;
            doc = step(doc)?;
            tracing::debug!(from = version, to = version + 1, "save document migrated");
        }
        Ok(doc)
    }

    pub fn step_count(&self) -> usize {
        self.migrations.len()
    }
}

impl Default for MigrationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Version 0 -> 1
// ---------------------------------------------------------------------------

fn object(doc: Value, from: u32) -> Result<Map<String, Value>, MigrationError> {
    match doc {
        Value::Object(map) => Ok(map),
        other => Err(MigrationError::MigrationFailed {
            from,
            to: from + 1,
            reason: format!("expected an object, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The browser record kept multiplicative `clickMultiplier` /
/// `passiveMultiplier` fields starting at 1, an `achievements` map of
/// `{id: true}`, and cached derived stats.
///
/// Multipliers become additive bonuses `max(0, m - 1)` unless a bonus is
/// already present. Truthy `achievements` entries are merged into the
/// `unlockedAchievements` list. Derived stats are dropped.
fn legacy_to_v1(doc: Value) -> Result<Value, MigrationError> {
    let mut map = object(doc, 0)?;

    for (legacy, bonus) in [
        ("clickMultiplier", "clickMultiplierBonus"),
        ("passiveMultiplier", "passiveMultiplierBonus"),
    ] {
        let multiplier = map.remove(legacy).and_then(|v| v.as_f64());
        if let Some(m) = multiplier
            && !map.contains_key(bonus)
        {
            map.insert(bonus.to_string(), Value::from((m - 1.0).max(0.0)));
        }
    }

    let mut unlocked: Vec<Value> = match map.remove("unlockedAchievements") {
        Some(Value::Array(ids)) => ids.into_iter().filter(Value::is_string).collect(),
        _ => Vec::new(),
    };
    if let Some(Value::Object(legacy)) = map.remove("achievements") {
        for (id, flag) in legacy {
            let truthy = match flag {
                Value::Bool(b) => b,
                Value::Null => false,
                _ => true,
            };
            let id = Value::String(id);
            if truthy && !unlocked.contains(&id) {
                unlocked.push(id);
            }
        }
    }
    map.insert("unlockedAchievements".to_string(), Value::Array(unlocked));

    map.remove("clickPower");
    map.remove("passiveIncome");
    map.insert("saveVersion".to_string(), Value::from(1u32));

    Ok(Value::Object(map))
}

// ===========================================================================
// Tests
// ===========================================================================
