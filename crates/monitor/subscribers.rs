use serde::Deserialize;
use std::{
    collections::{BTreeSet, HashMap},
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Read-only lookup of who follows a validator.
pub trait SubscriberRegistry: Send + Sync {
    /// Subscriber ids following `operator_address`. Addresses are compared lower-cased.
    fn resolve_subscribers(&self, operator_address: &str) -> BTreeSet<String>;
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read subscriber file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse subscriber file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// In-memory registry, usually loaded once at startup from a JSON file of the form
/// `{ "<subscriber id>": "<operator address>" }`, where the value may also be a list.
#[derive(Debug, Clone, Default)]
pub struct StaticSubscriberRegistry {
    by_address: HashMap<String, BTreeSet<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Follows {
    One(String),
    Many(Vec<String>),
}

impl StaticSubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn follow(&mut self, subscriber_id: impl Into<String>, operator_address: &str) {
        self.by_address
            .entry(operator_address.to_lowercase())
            .or_default()
            .insert(subscriber_id.into());
    }

    pub fn from_json_file(path: &Path) -> Result<Self, RegistryError> {
        let raw = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let entries: HashMap<String, Follows> =
            serde_json::from_str(&raw).map_err(|source| RegistryError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut registry = Self::new();
        for (subscriber_id, follows) in entries {
            match follows {
                Follows::One(address) => registry.follow(subscriber_id, &address),
                Follows::Many(addresses) => {
                    for address in addresses {
                        registry.follow(subscriber_id.clone(), &address);
                    }
                }
            }
        }
        Ok(registry)
    }

    pub fn subscriber_count(&self) -> usize {
        self.by_address
            .values()
            .flatten()
            .collect::<BTreeSet<_>>()
            .len()
    }
}

impl SubscriberRegistry for StaticSubscriberRegistry {
    fn resolve_subscribers(&self, operator_address: &str) -> BTreeSet<String> {
        self.by_address
            .get(&operator_address.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn matches_addresses_case_insensitively() {
        let mut registry = StaticSubscriberRegistry::new();
        registry.follow("111", "StoryValoper1ABC");
        registry.follow("222", "storyvaloper1abc");

        let subscribers = registry.resolve_subscribers("storyvaloper1abc");
        assert_eq!(
            subscribers,
            BTreeSet::from(["111".to_owned(), "222".to_owned()])
        );
        assert!(registry.resolve_subscribers("storyvaloper1xyz").is_empty());
    }

    #[test]
    fn loads_single_and_list_entries_from_file() -> Result<(), Box<dyn std::error::Error>> {
        let mut file = NamedTempFile::new()?;
        write!(
            file,
            r#"{{"111": "storyvaloper1AAA", "222": ["storyvaloper1aaa", "storyvaloper1bbb"]}}"#
        )?;

        let registry = StaticSubscriberRegistry::from_json_file(file.path())?;

        assert_eq!(registry.subscriber_count(), 2);
        assert_eq!(registry.resolve_subscribers("storyvaloper1aaa").len(), 2);
        assert_eq!(
            registry.resolve_subscribers("STORYVALOPER1BBB"),
            BTreeSet::from(["222".to_owned()])
        );
        Ok(())
    }

    #[test]
    fn reports_unreadable_and_malformed_files() -> Result<(), Box<dyn std::error::Error>> {
        let missing = StaticSubscriberRegistry::from_json_file(Path::new("/nonexistent/subs.json"));
        assert!(matches!(missing, Err(RegistryError::Io { .. })));

        let mut file = NamedTempFile::new()?;
        write!(file, r#"{{"111": 42}}"#)?;
        let malformed = StaticSubscriberRegistry::from_json_file(file.path());
        assert!(matches!(malformed, Err(RegistryError::Parse { .. })));
        Ok(())
    }
}
