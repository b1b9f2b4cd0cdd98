//! User settings: a flat key-value map of preferences.
//!
//! Settings are stored locally as JSON values in a key-value table and
//! synchronized as a flat JSON object on the remote account document.
//! A few keys are local-only and must never travel.

use serde_json::{Map, Value};

/// Settings keys that describe device-local state and are excluded from
/// remote sync in both directions.
pub const LOCAL_ONLY_KEYS: &[&str] = &["localPlayers"];

/// Filters a remote settings object down to the keys that may be applied
/// locally.
///
/// Drops `Value::Null` entries (the JSON image of `undefined` from web
/// clients) and every local-only key. The result may be empty; callers
/// treat that as nothing-to-do, not an error.
pub fn sanitize_remote_settings(remote: &Map<String, Value>) -> Map<String, Value> {
    remote
        .iter()
        .filter(|(key, value)| !value.is_null() && !LOCAL_ONLY_KEYS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Filters local settings before pushing them to the remote document.
///
/// Same rules as [`sanitize_remote_settings`]; local-only keys stay home.
pub fn sanitize_local_settings(local: &Map<String, Value>) -> Map<String, Value> {
    sanitize_remote_settings(local)
}
