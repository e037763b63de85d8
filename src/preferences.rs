//! Persisted user preferences.
//!
//! The host exposes a string key-value store. Each concern is stored as one
//! JSON blob under its own key. Blobs that fail to parse fall back to the
//! default value with a warning; a preferences problem never blocks a render.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

pub const MEASURE_GROUPS_KEY: &str = "flextable_measure_groups";
pub const PIVOT_STATE_KEY: &str = "flextable_pivot_state";
pub const FORMATTING_KEY: &str = "flextable_formatting";
pub const LAYOUT_KEY: &str = "flextable_layout";
pub const DERIVED_COLUMNS_KEY: &str = "flextable_derived_columns";

/// String key-value preference storage.
pub trait Preferences {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String) -> Result<()>;
}

/// In-memory store used natively and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: HashMap<String, String>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Preferences for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// Read and decode `key`, falling back to `T::default()` when the key is
/// missing or its blob is malformed.
pub fn load_or_default<T, P>(prefs: &P, key: &str) -> T
where
    T: DeserializeOwned + Default,
    P: Preferences + ?Sized,
{
    let Some(raw) = prefs.get(key) else {
        return T::default();
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("ignoring malformed preference {key}: {e}");
            T::default()
        }
    }
}

/// Encode `value` and store it under `key`.
pub fn store<T, P>(prefs: &mut P, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    P: Preferences + ?Sized,
{
    let json = serde_json::to_string(value)?;
    prefs.set(key, json)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::{FormattingSettings, MeasureGroup};

    #[test]
    fn test_round_trip() {
        let mut prefs = MemoryPreferences::new();
        let groups = vec![MeasureGroup::new("G", vec!["A".into(), "B".into()], true)];
        store(&mut prefs, MEASURE_GROUPS_KEY, &groups).unwrap();
        let back: Vec<MeasureGroup> = load_or_default(&prefs, MEASURE_GROUPS_KEY);
        assert_eq!(back, groups);
        assert_eq!(prefs.len(), 1);
    }

    #[test]
    fn test_malformed_falls_back() {
        let mut prefs = MemoryPreferences::new();
        prefs.set(PIVOT_STATE_KEY, "{not json".into()).unwrap();
        let state: Vec<(String, bool)> = load_or_default(&prefs, PIVOT_STATE_KEY);
        assert!(state.is_empty());
    }

    #[test]
    fn test_partial_formatting_merges_onto_defaults() {
        let mut prefs = MemoryPreferences::new();
        prefs
            .set(FORMATTING_KEY, r#"{"numberFormat":{"decimals":0}}"#.into())
            .unwrap();
        let settings: FormattingSettings = load_or_default(&prefs, FORMATTING_KEY);
        assert_eq!(settings.number_format.decimals, 0);
        assert_eq!(settings.number_format.currency, "USD");
        assert!(settings.row_formatting.alternating_rows);
    }
}
