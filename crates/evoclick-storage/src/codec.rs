//! Save record encoding.
//!
//! The record is a JSON object with camelCase keys. Decoding merges the
//! stored object over a fresh save field by field: missing keys, `null`
//! values and values of the wrong shape keep the fresh value, so older,
//! partial or partly damaged records still load. Objects (`options`,
//! `research`) and lists are merged entry by entry, so one bad entry costs
//! only that entry.

use crate::migration::{MigrationError, MigrationRegistry};
use evoclick_core::state::{SAVE_VERSION, SaveState};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Errors that can occur while encoding or decoding a save record.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("save record is not valid JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("save record must be a JSON object")]
    NotAnObject,

    #[error("save version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error(transparent)]
    Migration(#[from] MigrationError),

    #[error("save record has a field of the wrong type: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("failed to encode save record: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Serialize the full save record.
pub fn encode(state: &SaveState) -> Result<String, SaveError> {
    serde_json::to_string(state).map_err(SaveError::Encode)
}

/// Parse a save record, upgrading older versions.
///
/// The fresh save merged under the record is created at `now_ms`, so a
/// record without `sessionStartTime` or `lastSave` gets the load time.
pub fn decode(text: &str, now_ms: u64) -> Result<SaveState, SaveError> {
    decode_with(text, now_ms, &MigrationRegistry::standard())
}

/// [`decode`] with an explicit migration registry.
pub fn decode_with(
    text: &str,
    now_ms: u64,
    migrations: &MigrationRegistry,
) -> Result<SaveState, SaveError> {
    decode_versioned(text, now_ms, migrations).map(|(state, _)| state)
}

/// [`decode_with`], also returning the version the record was stored at.
pub fn decode_versioned(
    text: &str,
    now_ms: u64,
    migrations: &MigrationRegistry,
) -> Result<(SaveState, u32), SaveError> {
    let doc: Value = serde_json::from_str(text).map_err(SaveError::Syntax)?;
    let mut map = match doc {
        Value::Object(map) => map,
        _ => return Err(SaveError::NotAnObject),
    };
    strip_nulls(&mut map);

    let version = stored_version(&map);
    if version > SAVE_VERSION {
        return Err(SaveError::UnsupportedVersion {
            found: version,
            supported: SAVE_VERSION,
        });
    }

    let doc = migrations.migrate(Value::Object(map), version, SAVE_VERSION)?;
    let Value::Object(stored) = doc else {
        return Err(SaveError::NotAnObject);
    };

    let mut merged = match serde_json::to_value(SaveState::new(now_ms)) {
        Ok(Value::Object(fresh)) => fresh,
        Ok(_) => return Err(SaveError::NotAnObject),
        Err(e) => return Err(SaveError::Encode(e)),
    };
    let dropped = overlay(&mut merged, stored);
    if dropped > 0 {
        tracing::warn!(dropped, "unreadable save fields replaced by defaults");
    }

    let state = SaveState::deserialize(&Value::Object(merged)).map_err(SaveError::Malformed)?;
    Ok((state, version))
}

/// Apply `stored` over `merged` one field at a time. Returns how many
/// fields lost some or all of their stored value.
fn overlay(merged: &mut Map<String, Value>, stored: Map<String, Value>) -> usize {
    let mut dropped = 0;
    for (key, value) in stored {
        let applied = match value {
            Value::Object(entries) if merged.get(&key).is_some_and(Value::is_object) => {
                let mut all = true;
                for (entry, entry_value) in entries {
                    all &= try_apply(merged, &format!("{key}.{entry}"), |doc| {
                        if let Some(Value::Object(slot)) = doc.get_mut(&key) {
                            slot.insert(entry, entry_value);
                        }
                    });
                }
                all
            }
            Value::Array(items) if merged.get(&key).is_some_and(Value::is_array) => {
                let mut all = true;
                for item in items {
                    all &= try_apply(merged, &key, |doc| {
                        if let Some(Value::Array(slot)) = doc.get_mut(&key) {
                            slot.push(item);
                        }
                    });
                }
                all
            }
            value => try_apply(merged, &key, |doc| {
                doc.insert(key.clone(), value);
            }),
        };
        if !applied {
            dropped += 1;
        }
    }
    dropped
}

/// Keep `edit` only if the document still reads as a [`SaveState`].
fn try_apply(
    merged: &mut Map<String, Value>,
    field: &str,
    edit: impl FnOnce(&mut Map<String, Value>),
) -> bool {
    let mut candidate = Value::Object(merged.clone());
    if let Value::Object(doc) = &mut candidate {
        edit(doc);
    }
    match SaveState::deserialize(&candidate) {
        Ok(_) => {
            if let Value::Object(doc) = candidate {
                *merged = doc;
            }
            true
        }
        Err(e) => {
            tracing::warn!(field, error = %e, "save field ignored");
            false
        }
    }
}

/// Version recorded in the document. Missing or unreadable means 0.
fn stored_version(map: &Map<String, Value>) -> u32 {
    map.get("saveVersion")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}

/// Drop top-level `null` values so they fall back to defaults.
fn strip_nulls(map: &mut Map<String, Value>) {
    map.retain(|_, v| !v.is_null());
}

// ===========================================================================
// Tests
// ===========================================================================
