//! Adapter runtime configuration.
//!
//! An ordered store of option key/value pairs. The store itself never
//! validates value types against keys and performs no I/O; deciding
//! whether a value is applicable, and pushing it into the kernel, is the
//! socket transport's job at apply time. That split lets adapter-specific
//! or plain unknown keys be stored without failing.

use std::fmt;

use crate::filter::CanFilter;

/// A recognized configuration parameter, or `Other` for everything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigKey {
    /// Deliver locally transmitted frames back to local receivers.
    Loopback,
    /// Deliver frames sent on this very socket back to it.
    ReceiveOwnMessages,
    /// Bitmask selecting which error frame classes the kernel delivers.
    ErrorMask,
    /// Kernel acceptance filter list.
    CanFilter,
    /// Not recognized by this transport. Stored, never applied.
    Other(String),
}

impl ConfigKey {
    /// Map a textual key to its enumerated kind.
    pub fn from_name(name: &str) -> ConfigKey {
        match name {
            "Loopback" => ConfigKey::Loopback,
            "ReceiveOwnMessages" => ConfigKey::ReceiveOwnMessages,
            "ErrorMask" => ConfigKey::ErrorMask,
            "CanFilter" => ConfigKey::CanFilter,
            other => ConfigKey::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ConfigKey::Loopback => write!(f, "Loopback"),
            ConfigKey::ReceiveOwnMessages => write!(f, "ReceiveOwnMessages"),
            ConfigKey::ErrorMask => write!(f, "ErrorMask"),
            ConfigKey::CanFilter => write!(f, "CanFilter"),
            ConfigKey::Other(ref name) => write!(f, "{}", name),
        }
    }
}

/// Typed value of a configuration parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Bool(bool),
    Integer(u32),
    Filters(Vec<CanFilter>),
}

/// Ordered key/value store for adapter options.
///
/// Keys keep their insertion order; re-setting an existing key replaces
/// its value in place, so a key never appears twice.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    entries: Vec<(ConfigKey, ConfigValue)>,
}

impl ConfigStore {
    /// An empty store.
    pub fn new() -> ConfigStore {
        ConfigStore { entries: Vec::new() }
    }

    /// The store a fresh transport starts with: loopback on, own-message
    /// reception off, no error reporting, no acceptance filters.
    pub fn with_defaults() -> ConfigStore {
        let mut store = ConfigStore::new();
        store.set(ConfigKey::Loopback, ConfigValue::Bool(true));
        store.set(ConfigKey::ReceiveOwnMessages, ConfigValue::Bool(false));
        store.set(ConfigKey::ErrorMask, ConfigValue::Integer(0));
        store.set(ConfigKey::CanFilter, ConfigValue::Filters(Vec::new()));
        store
    }

    /// Look up the value for `key`. Absent is a valid result for keys
    /// that were never set, not an error.
    pub fn get(&self, key: &ConfigKey) -> Option<&ConfigValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Insert or replace the value for `key`. A first-seen key is
    /// appended; an existing key keeps its position.
    pub fn set(&mut self, key: ConfigKey, value: ConfigValue) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// All configured keys, in store order.
    pub fn keys(&self) -> Vec<ConfigKey> {
        self.entries.iter().map(|(k, _)| k.clone()).collect()
    }

    /// Iterate over the entries in store order.
    pub fn iter(&self) -> impl Iterator<Item = (&ConfigKey, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ConfigStore {
    fn default() -> ConfigStore {
        ConfigStore::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_fresh_adapter() {
        let store = ConfigStore::with_defaults();
        assert_eq!(
            store.keys(),
            vec![
                ConfigKey::Loopback,
                ConfigKey::ReceiveOwnMessages,
                ConfigKey::ErrorMask,
                ConfigKey::CanFilter,
            ]
        );
        assert_eq!(store.get(&ConfigKey::Loopback), Some(&ConfigValue::Bool(true)));
        assert_eq!(
            store.get(&ConfigKey::ReceiveOwnMessages),
            Some(&ConfigValue::Bool(false))
        );
        assert_eq!(store.get(&ConfigKey::ErrorMask), Some(&ConfigValue::Integer(0)));
        assert_eq!(
            store.get(&ConfigKey::CanFilter),
            Some(&ConfigValue::Filters(Vec::new()))
        );
    }

    #[test]
    fn get_of_an_unset_key_is_absent() {
        let store = ConfigStore::new();
        assert_eq!(store.get(&ConfigKey::from_name("BitRate")), None);
    }

    #[test]
    fn set_is_idempotent() {
        let mut store = ConfigStore::with_defaults();
        let before = store.len();

        store.set(ConfigKey::ErrorMask, ConfigValue::Integer(0xFF));
        store.set(ConfigKey::ErrorMask, ConfigValue::Integer(0xFF));

        assert_eq!(store.len(), before);
        assert_eq!(store.get(&ConfigKey::ErrorMask), Some(&ConfigValue::Integer(0xFF)));
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut store = ConfigStore::new();
        let names = ["One", "Two", "Three", "Four", "Five"];
        for name in &names {
            store.set(ConfigKey::from_name(name), ConfigValue::Bool(true));
        }

        let keys: Vec<String> = store.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, names);
    }

    #[test]
    fn resetting_a_key_keeps_its_position() {
        let mut store = ConfigStore::new();
        store.set(ConfigKey::from_name("A"), ConfigValue::Bool(true));
        store.set(ConfigKey::from_name("B"), ConfigValue::Bool(true));
        store.set(ConfigKey::from_name("C"), ConfigValue::Bool(true));

        store.set(ConfigKey::from_name("A"), ConfigValue::Integer(7));

        let keys: Vec<String> = store.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, ["A", "B", "C"]);
        assert_eq!(
            store.get(&ConfigKey::from_name("A")),
            Some(&ConfigValue::Integer(7))
        );
    }

    #[test]
    fn stores_unknown_keys_without_complaint() {
        let mut store = ConfigStore::with_defaults();
        store.set(ConfigKey::from_name("VendorQuirk"), ConfigValue::Integer(1));
        assert_eq!(
            store.get(&ConfigKey::Other("VendorQuirk".to_string())),
            Some(&ConfigValue::Integer(1))
        );
    }
}
