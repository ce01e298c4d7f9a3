//! Engine registry and its JSON-backed store.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::SearchEngine;
use crate::error::RegistryError;

/// Read-only view over the stored engines.
pub trait EngineRegistry {
    /// Engine registered under `shortcut`.
    fn lookup(&self, shortcut: &str) -> Option<&SearchEngine>;

    /// Shortcuts of enabled engines, sorted.
    fn enabled_shortcuts(&self) -> BTreeSet<String>;

    /// All shortcuts, sorted.
    fn all_shortcuts(&self) -> BTreeSet<String>;

    /// Engine used when the input has no shortcut.
    fn default_engine(&self) -> Option<&SearchEngine>;
}

/// On-disk layout of the store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredEngines {
    #[serde(default)]
    default: Option<String>,
    #[serde(default)]
    engines: BTreeMap<String, SearchEngine>,
}

/// Engines keyed by shortcut, rewritten to disk after every mutation.
#[derive(Clone, Debug, Default)]
pub struct EngineStore {
    engines: BTreeMap<String, SearchEngine>,
    default_shortcut: Option<String>,
    path: Option<PathBuf>,
}

impl EngineStore {
    /// A store that is never persisted.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the store at `path`; a missing file yields an empty store.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let stored = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str::<StoredEngines>(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no engine store yet, starting empty");
                StoredEngines::default()
            }
            Err(e) => return Err(e.into()),
        };

        let mut engines = BTreeMap::new();
        for (key, engine) in stored.engines {
            if key != engine.shortcut {
                tracing::warn!(
                    %key,
                    shortcut = %engine.shortcut,
                    "re-keying engine by its shortcut"
                );
            }
            if validate_shortcut(&engine.shortcut).is_err() {
                tracing::warn!(
                    shortcut = %engine.shortcut,
                    "skipping engine with invalid shortcut"
                );
                continue;
            }
            engines.insert(engine.shortcut.clone(), engine);
        }

        let default_shortcut = stored.default.filter(|s| engines.contains_key(s));
        tracing::debug!(count = engines.len(), "engine store loaded");

        Ok(Self {
            engines,
            default_shortcut,
            path: Some(path),
        })
    }

    /// File backing this store, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// All engines sorted by shortcut.
    pub fn engines(&self) -> impl Iterator<Item = &SearchEngine> {
        self.engines.values()
    }

    /// Shortcut of the default engine.
    #[must_use]
    pub fn default_shortcut(&self) -> Option<&str> {
        self.default_shortcut.as_deref()
    }

    /// Add a new engine.
    ///
    /// # Errors
    /// Returns an error if the shortcut is invalid or taken, or saving fails.
    pub fn add(&mut self, engine: SearchEngine) -> Result<(), RegistryError> {
        validate_shortcut(&engine.shortcut)?;
        if self.engines.contains_key(&engine.shortcut) {
            return Err(RegistryError::DuplicateShortcut(engine.shortcut));
        }
        tracing::info!(shortcut = %engine.shortcut, name = %engine.name, "adding engine");

        let mut engines = self.engines.clone();
        engines.insert(engine.shortcut.clone(), engine);
        self.commit(engines, self.default_shortcut.clone())
    }

    /// Replace the engine stored under `shortcut`, possibly renaming it.
    ///
    /// # Errors
    /// Returns an error if `shortcut` is unknown, the new shortcut is invalid
    /// or taken, or saving fails.
    pub fn update(&mut self, shortcut: &str, engine: SearchEngine) -> Result<(), RegistryError> {
        if !self.engines.contains_key(shortcut) {
            return Err(RegistryError::UnknownShortcut(shortcut.to_string()));
        }
        validate_shortcut(&engine.shortcut)?;
        if engine.shortcut != shortcut && self.engines.contains_key(&engine.shortcut) {
            return Err(RegistryError::DuplicateShortcut(engine.shortcut));
        }

        let mut default_shortcut = self.default_shortcut.clone();
        if default_shortcut.as_deref() == Some(shortcut) {
            default_shortcut = Some(engine.shortcut.clone());
        }
        let mut engines = self.engines.clone();
        engines.remove(shortcut);
        engines.insert(engine.shortcut.clone(), engine);
        self.commit(engines, default_shortcut)
    }

    /// Remove an engine, clearing the default if it pointed there.
    ///
    /// # Errors
    /// Returns an error if `shortcut` is unknown or saving fails.
    pub fn remove(&mut self, shortcut: &str) -> Result<SearchEngine, RegistryError> {
        let mut engines = self.engines.clone();
        let engine = engines
            .remove(shortcut)
            .ok_or_else(|| RegistryError::UnknownShortcut(shortcut.to_string()))?;
        let default_shortcut = self.default_shortcut.clone().filter(|s| s != shortcut);
        self.commit(engines, default_shortcut)?;
        Ok(engine)
    }

    /// Designate the default engine.
    ///
    /// # Errors
    /// Returns an error if `shortcut` is unknown or saving fails.
    pub fn set_default(&mut self, shortcut: &str) -> Result<(), RegistryError> {
        if !self.engines.contains_key(shortcut) {
            return Err(RegistryError::UnknownShortcut(shortcut.to_string()));
        }
        self.commit(self.engines.clone(), Some(shortcut.to_string()))
    }

    /// Write the whole store to its file through a temporary sibling.
    ///
    /// # Errors
    /// Returns an error if serialization or any file operation fails.
    pub fn save(&self) -> Result<(), RegistryError> {
        self.write(&self.engines, self.default_shortcut.as_ref())
    }

    /// Persist the new contents, adopting them only once they are on disk.
    fn commit(
        &mut self,
        engines: BTreeMap<String, SearchEngine>,
        default_shortcut: Option<String>,
    ) -> Result<(), RegistryError> {
        self.write(&engines, default_shortcut.as_ref())?;
        self.engines = engines;
        self.default_shortcut = default_shortcut;
        Ok(())
    }

    fn write(
        &self,
        engines: &BTreeMap<String, SearchEngine>,
        default_shortcut: Option<&String>,
    ) -> Result<(), RegistryError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let stored = StoredEngines {
            default: default_shortcut.cloned(),
            engines: engines.clone(),
        };
        let json = serde_json::to_string_pretty(&stored)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), count = engines.len(), "engine store saved");
        Ok(())
    }
}

impl EngineRegistry for EngineStore {
    fn lookup(&self, shortcut: &str) -> Option<&SearchEngine> {
        self.engines.get(shortcut)
    }

    fn enabled_shortcuts(&self) -> BTreeSet<String> {
        self.engines
            .values()
            .filter(|e| e.is_enabled)
            .map(|e| e.shortcut.clone())
            .collect()
    }

    fn all_shortcuts(&self) -> BTreeSet<String> {
        self.engines.keys().cloned().collect()
    }

    fn default_engine(&self) -> Option<&SearchEngine> {
        self.default_shortcut
            .as_deref()
            .and_then(|s| self.engines.get(s))
    }
}

/// Check that a shortcut is usable both as a typed token and as a file name.
///
/// # Errors
/// Returns an error describing the first violated rule.
pub fn validate_shortcut(shortcut: &str) -> Result<(), RegistryError> {
    if shortcut.is_empty() {
        return Err(RegistryError::EmptyShortcut);
    }
    let forbidden = |c: char| {
        c.is_whitespace() || c.is_control() || matches!(c, '/' | '\\' | ':' | '\0')
    };
    if shortcut == "." || shortcut == ".." || shortcut.chars().any(forbidden) {
        return Err(RegistryError::InvalidShortcut(shortcut.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(shortcut: &str) -> SearchEngine {
        SearchEngine::new(
            format!("Engine {shortcut}"),
            shortcut,
            "https://example.com/search",
            BTreeMap::new(),
        )
    }

    #[test]
    fn test_validate_shortcut() {
        assert!(validate_shortcut("g").is_ok());
        assert!(validate_shortcut("yt-music").is_ok());
        assert!(validate_shortcut("위키").is_ok());
        assert!(matches!(validate_shortcut(""), Err(RegistryError::EmptyShortcut)));
        for bad in ["a b", "a/b", "a\\b", "c:", "..", ".", "tab\t"] {
            assert!(
                matches!(validate_shortcut(bad), Err(RegistryError::InvalidShortcut(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let mut store = EngineStore::in_memory();
        store.add(engine("g")).unwrap();
        let err = store.add(engine("g")).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateShortcut(s) if s == "g"));
    }

    #[test]
    fn test_shortcut_views() {
        let mut store = EngineStore::in_memory();
        store.add(engine("w")).unwrap();
        store.add(engine("g")).unwrap();
        store.add(engine("b").with_enabled(false)).unwrap();

        let enabled: Vec<_> = store.enabled_shortcuts().into_iter().collect();
        assert_eq!(enabled, vec!["g", "w"]);
        let all: Vec<_> = store.all_shortcuts().into_iter().collect();
        assert_eq!(all, vec!["b", "g", "w"]);
    }

    #[test]
    fn test_default_follows_rename_and_removal() {
        let mut store = EngineStore::in_memory();
        store.add(engine("g")).unwrap();
        store.set_default("g").unwrap();
        assert_eq!(store.default_engine().map(|e| e.shortcut.as_str()), Some("g"));

        store.update("g", engine("gg")).unwrap();
        assert_eq!(store.default_shortcut(), Some("gg"));
        assert!(store.lookup("g").is_none());

        store.remove("gg").unwrap();
        assert!(store.default_engine().is_none());
        assert!(matches!(
            store.set_default("gg"),
            Err(RegistryError::UnknownShortcut(_))
        ));
    }

    #[test]
    fn test_update_rejects_taken_shortcut() {
        let mut store = EngineStore::in_memory();
        store.add(engine("g")).unwrap();
        store.add(engine("w")).unwrap();
        assert!(matches!(
            store.update("g", engine("w")),
            Err(RegistryError::DuplicateShortcut(_))
        ));
        assert!(matches!(
            store.update("x", engine("x")),
            Err(RegistryError::UnknownShortcut(_))
        ));
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("engines.json");

        let mut store = EngineStore::load(&path).unwrap();
        assert_eq!(store.engines().count(), 0);
        store.add(engine("g")).unwrap();
        store.add(engine("w").with_enabled(false)).unwrap();
        store.set_default("g").unwrap();

        let reloaded = EngineStore::load(&path).unwrap();
        assert_eq!(reloaded.engines().count(), 2);
        assert_eq!(reloaded.default_shortcut(), Some("g"));
        assert!(!reloaded.lookup("w").unwrap().is_enabled);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_failed_save_leaves_store_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("sub");
        let path = parent.join("engines.json");

        let mut store = EngineStore::load(&path).unwrap();
        store.add(engine("g")).unwrap();
        store.set_default("g").unwrap();

        // A regular file where the store directory should be makes every save fail.
        fs::remove_dir_all(&parent).unwrap();
        fs::write(&parent, "not a directory").unwrap();

        assert!(matches!(store.add(engine("w")), Err(RegistryError::Io(_))));
        assert!(store.lookup("w").is_none());

        assert!(store.update("g", engine("go")).is_err());
        assert!(store.lookup("g").is_some());
        assert!(store.lookup("go").is_none());

        assert!(store.remove("g").is_err());
        assert!(store.lookup("g").is_some());
        assert_eq!(store.default_shortcut(), Some("g"));
        assert_eq!(store.engines().count(), 1);
    }

    #[test]
    fn test_load_repairs_keys_and_dangling_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engines.json");
        fs::write(
            &path,
            r#"{
                "default": "missing",
                "engines": {
                    "old": {"name": "G", "shortcut": "g", "base_url": "https://g.example/"},
                    "bad": {"name": "B", "shortcut": "b d", "base_url": "https://b.example/"}
                }
            }"#,
        )
        .unwrap();

        let store = EngineStore::load(&path).unwrap();
        assert!(store.lookup("g").is_some());
        assert!(store.lookup("old").is_none());
        assert!(store.lookup("b d").is_none());
        assert!(store.default_shortcut().is_none());
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engines.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(EngineStore::load(&path), Err(RegistryError::Json(_))));
    }
}
