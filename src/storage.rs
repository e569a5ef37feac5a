// SPDX-License-Identifier: GPL-3.0-or-later
// src/storage.rs
//
// File-backed key/value storage and the scenario store built on it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::constant::SCENARIO_STORAGE_KEY;
use crate::domain::scenario::ScenarioList;

/// String items in a JSON object on disk.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    pub fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut items = self.read_for_write()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }

    pub fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let mut items = self.read_for_write()?;
        items.remove(key);
        self.write_all(&items)
    }

    fn read_all(&self) -> anyhow::Result<BTreeMap<String, String>> {
        let Some(raw) = self.read_raw()? else {
            return Ok(BTreeMap::new());
        };
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", self.path.display()))
    }

    /// Items to rewrite. A file that no longer parses is replaced, not kept.
    fn read_for_write(&self) -> anyhow::Result<BTreeMap<String, String>> {
        let Some(raw) = self.read_raw()? else {
            return Ok(BTreeMap::new());
        };
        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(e) => {
                log::warn!(
                    "Discarding unreadable storage {}: {e}",
                    self.path.display()
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn read_raw(&self) -> anyhow::Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&self.path)
            .map(Some)
            .with_context(|| format!("reading {}", self.path.display()))
    }

    /// Write to a sibling temp file, then rename over the original.
    fn write_all(&self, items: &BTreeMap<String, String>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(items)?)
            .with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

/// User scenarios persisted in local storage.
#[derive(Debug, Clone)]
pub struct ScenarioStore {
    storage: LocalStorage,
}

impl ScenarioStore {
    pub fn new(storage: LocalStorage) -> Self {
        Self { storage }
    }

    /// Saved scenarios, or the defaults when nothing usable is stored.
    pub fn load(&self) -> ScenarioList {
        match self.storage.get_item(SCENARIO_STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(list) => list,
                Err(e) => {
                    log::error!("Failed to parse scenarios from storage: {e}");
                    ScenarioList::defaults()
                }
            },
            Ok(None) => ScenarioList::defaults(),
            Err(e) => {
                log::error!("Failed to read scenario storage: {e:#}");
                ScenarioList::defaults()
            }
        }
    }

    pub fn save(&self, scenarios: &ScenarioList) -> anyhow::Result<()> {
        let raw = serde_json::to_string(scenarios)?;
        self.storage.set_item(SCENARIO_STORAGE_KEY, &raw)?;
        log::info!(
            "Saved {} scenarios to {}",
            scenarios.len(),
            self.storage.path().display()
        );
        Ok(())
    }

    /// Forget user edits; the next load returns the defaults.
    pub fn reset(&self) -> anyhow::Result<()> {
        self.storage.remove_item(SCENARIO_STORAGE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scenario::Scenario;

    fn store(dir: &tempfile::TempDir) -> ScenarioStore {
        ScenarioStore::new(LocalStorage::new(dir.path().join("nested").join("storage.json")))
    }

    #[test]
    fn items_persist_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.json");
        LocalStorage::new(&path).set_item("k", "v").unwrap();

        let again = LocalStorage::new(&path);
        assert_eq!(again.get_item("k").unwrap().as_deref(), Some("v"));
        again.remove_item("k").unwrap();
        assert_eq!(again.get_item("k").unwrap(), None);
    }

    #[test]
    fn empty_storage_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(store(&dir).load(), ScenarioList::defaults());
    }

    #[test]
    fn saved_list_is_loaded_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let list = ScenarioList::new(vec![Scenario {
            label: "Mine".into(),
            value: "mine".into(),
            description: "Stand at the back.".into(),
        }])
        .unwrap();

        store.save(&list).unwrap();
        assert_eq!(store.load(), list);

        store.reset().unwrap();
        assert_eq!(store.load(), ScenarioList::defaults());
    }

    #[test]
    fn corrupt_or_empty_entries_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path().join("storage.json"));
        let store = ScenarioStore::new(storage.clone());

        storage.set_item(SCENARIO_STORAGE_KEY, "{oops").unwrap();
        assert_eq!(store.load(), ScenarioList::defaults());

        storage.set_item(SCENARIO_STORAGE_KEY, "[]").unwrap();
        assert_eq!(store.load(), ScenarioList::defaults());
    }

    #[test]
    fn corrupt_file_is_replaced_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{ truncated").unwrap();
        let store = ScenarioStore::new(LocalStorage::new(&path));

        let loaded = store.load();
        assert_eq!(loaded, ScenarioList::defaults());
        store.save(&loaded).unwrap();
        assert_eq!(store.load(), loaded);

        std::fs::write(&path, "not json").unwrap();
        store.reset().unwrap();
        assert_eq!(LocalStorage::new(&path).get_item(SCENARIO_STORAGE_KEY).unwrap(), None);
    }
}
