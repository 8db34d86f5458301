//! Persisted preferences
//!
//! Hosts persist small JSON values through a [`KeyValueStore`]. Reads never fail:
//! a missing, unreadable, unparsable or invalid value yields the default.

use crate::error::FixtureError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use tracing::warn;

/// String key-value storage provided by the host
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, FixtureError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), FixtureError>;
    fn remove(&mut self, key: &str) -> Result<(), FixtureError>;
}

/// In-process store, used when the host provides none
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, FixtureError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), FixtureError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), FixtureError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Read a JSON value, falling back to `T::default()` on any failure
pub fn load_or_default<T, F>(store: &dyn KeyValueStore, key: &str, validate: F) -> T
where
    T: DeserializeOwned + Default,
    F: Fn(&T) -> bool,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(e) => {
            warn!(key, error = %e, "preference read failed, using default");
            return T::default();
        }
    };

    match serde_json::from_str::<T>(&raw) {
        Ok(value) if validate(&value) => value,
        Ok(_) => {
            warn!(key, "preference failed validation, using default");
            T::default()
        }
        Err(e) => {
            warn!(key, error = %e, "preference is not valid JSON, using default");
            T::default()
        }
    }
}

/// JSON-encode and store a value
pub fn save<T: Serialize>(
    store: &mut dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), FixtureError> {
    let json = serde_json::to_string(value)?;
    store.set(key, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
    struct DemoSettings {
        enabled: bool,
        days: u32,
    }

    fn valid(settings: &DemoSettings) -> bool {
        settings.days <= 3_650
    }

    fn load_settings(store: &dyn KeyValueStore) -> DemoSettings {
        load_or_default(store, "demo", valid)
    }

    /// Store whose reads always fail
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, key: &str) -> Result<Option<String>, FixtureError> {
            Err(FixtureError::Storage(format!("cannot read {key}")))
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), FixtureError> {
            Err(FixtureError::Storage(format!("cannot write {key}")))
        }

        fn remove(&mut self, _key: &str) -> Result<(), FixtureError> {
            Ok(())
        }
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let settings = DemoSettings { enabled: true, days: 90 };
        save(&mut store, "demo", &settings).unwrap();

        assert_eq!(store.get("demo").unwrap().as_deref(), Some(r#"{"enabled":true,"days":90}"#));
        assert_eq!(load_settings(&store), settings);
    }

    #[test]
    fn test_missing_key_defaults() {
        let store = MemoryStore::new();
        assert_eq!(load_settings(&store), DemoSettings::default());
    }

    #[test]
    fn test_corrupt_value_defaults() {
        let mut store = MemoryStore::new();
        store.set("demo", "{not json").unwrap();
        assert_eq!(load_settings(&store), DemoSettings::default());
    }

    #[test]
    fn test_invalid_value_defaults() {
        let mut store = MemoryStore::new();
        save(&mut store, "demo", &DemoSettings { enabled: true, days: 99_999 }).unwrap();
        assert_eq!(load_settings(&store), DemoSettings::default());
    }

    #[test]
    fn test_read_failure_defaults() {
        let store = BrokenStore;
        assert_eq!(load_settings(&store), DemoSettings::default());
    }

    #[test]
    fn test_write_failure_surfaces() {
        let mut store = BrokenStore;
        let err = save(&mut store, "demo", &DemoSettings::default()).unwrap_err();
        assert!(matches!(err, FixtureError::Storage(_)));
    }

    #[test]
    fn test_remove() {
        let mut store = MemoryStore::new();
        store.set("demo", "true").unwrap();
        store.remove("demo").unwrap();
        assert_eq!(store.get("demo").unwrap(), None);
    }
}
