//! Keyed collections shared by every reconciled sub-resource.
//!
//! Terraform stores variables, secrets, ports, domains and friends as sets of
//! objects. Qovery identifies them by backend ID, but the user only ever names
//! them by key, so every comparison in this crate matches on the key.

use std::borrow::Cow;
use std::collections::HashSet;

use thiserror::Error;

/// An entry of a keyed collection.
pub trait Keyed {
    /// Stable key used for matching between state, plan and API.
    fn key(&self) -> Cow<'_, str>;

    /// Backend identifier, `None` until the entry has been created.
    fn id(&self) -> Option<&str>;

    fn set_id(&mut self, id: Option<String>);

    /// Whether both entries carry the same payload. IDs are ignored.
    fn same_value(&self, other: &Self) -> bool;
}

/// Returns the first entry whose key matches.
pub fn find_by_key<'a, T: Keyed>(items: &'a [T], key: &str) -> Option<&'a T> {
    items.iter().find(|item| item.key() == key)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("duplicate key '{key}' in {collection}")]
pub struct DuplicateKeyError {
    pub collection: String,
    pub key: String,
}

/// Rejects collections where two entries share a key.
///
/// The differ itself resolves duplicates with first-match-wins; user supplied
/// documents go through this check before they reach it.
pub fn ensure_unique_keys<T: Keyed>(
    collection: &str,
    items: &[T],
) -> Result<(), DuplicateKeyError> {
    let mut seen = HashSet::new();
    for item in items {
        let key = item.key();
        if !seen.insert(key.clone()) {
            return Err(DuplicateKeyError {
                collection: collection.to_string(),
                key: key.into_owned(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal keyed entry used across the crate's unit tests.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Entry {
        pub id: Option<String>,
        pub key: String,
        pub value: String,
    }

    impl Entry {
        pub fn new(key: &str, value: &str) -> Self {
            Self {
                id: None,
                key: key.to_string(),
                value: value.to_string(),
            }
        }

        pub fn with_id(mut self, id: &str) -> Self {
            self.id = Some(id.to_string());
            self
        }
    }

    impl Keyed for Entry {
        fn key(&self) -> Cow<'_, str> {
            Cow::Borrowed(&self.key)
        }

        fn id(&self) -> Option<&str> {
            self.id.as_deref()
        }

        fn set_id(&mut self, id: Option<String>) {
            self.id = id;
        }

        fn same_value(&self, other: &Self) -> bool {
            self.value == other.value
        }
    }

    #[test]
    fn test_find_by_key_first_match_wins() {
        let items = vec![
            Entry::new("A", "first").with_id("1"),
            Entry::new("A", "second").with_id("2"),
        ];
        let found = find_by_key(&items, "A").unwrap();
        assert_eq!(found.value, "first");
    }

    #[test]
    fn test_find_by_key_missing() {
        let items = vec![Entry::new("A", "a")];
        assert!(find_by_key(&items, "B").is_none());
    }

    #[test]
    fn test_ensure_unique_keys_accepts_distinct() {
        let items = vec![Entry::new("A", "a"), Entry::new("B", "a")];
        assert!(ensure_unique_keys("environment_variables", &items).is_ok());
    }

    #[test]
    fn test_ensure_unique_keys_rejects_duplicates() {
        let items = vec![Entry::new("A", "a"), Entry::new("B", "b"), Entry::new("A", "c")];
        let err = ensure_unique_keys("secrets", &items).unwrap_err();
        assert_eq!(err.key, "A");
        assert_eq!(err.to_string(), "duplicate key 'A' in secrets");
    }

    #[test]
    fn test_ensure_unique_keys_empty() {
        let items: Vec<Entry> = vec![];
        assert!(ensure_unique_keys("ports", &items).is_ok());
    }
}
