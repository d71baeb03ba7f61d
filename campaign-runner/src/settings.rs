// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The explicit setting-store context object (§4.I, §9).

use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;

use crate::errors::EngineError;

/// Replaces the reference source's static/global setting singleton with an explicit
/// object threaded through component construction, so tests can point a private
/// store at a temp directory (§9).
///
/// Static sections live under `root`, one file per section (`<root>/<Section>.setting`);
/// per-case settings are resolved lazily against a `(case_setting_path, setting_file)`
/// pair supplied by the case-ref.
pub struct SettingStore {
    root: Utf8PathBuf,
    /// Per-case setting files already loaded this run, keyed by full path, so a case
    /// type that runs many times only reads its file once (§4.I "resolved lazily the
    /// first time a case of that type runs").
    case_cache: Mutex<HashMap<Utf8PathBuf, serde_json::Value>>,
}

impl SettingStore {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root: root.into(),
            case_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    fn section_path(&self, section: &str) -> Utf8PathBuf {
        self.root.join(format!("{section}.setting"))
    }

    /// Load one static section by name. Unknown keys in the file are ignored
    /// (forward-compatible, §4.I); a missing file yields `T::default()`.
    pub fn load_section<T>(&self, section: &str) -> Result<T, EngineError>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.section_path(section);
        campaign_metadata::settings_file::load_section(&path)
            .map(|value| value.unwrap_or_default())
            .map_err(|source| EngineError::Setting {
                section: section.to_string(),
                source,
            })
    }

    pub fn save_section<T: Serialize>(&self, section: &str, value: &T) -> Result<(), EngineError> {
        let path = self.section_path(section);
        campaign_metadata::settings_file::save_section(&path, value).map_err(|source| EngineError::Setting {
            section: section.to_string(),
            source,
        })
    }

    /// Load every section named in `sections` (`load_all`); a setting-error on any
    /// one of them is fatal at startup (§7).
    pub fn load_all<T>(&self, sections: &[&str]) -> Result<Vec<T>, EngineError>
    where
        T: DeserializeOwned + Default,
    {
        sections.iter().map(|section| self.load_section(section)).collect()
    }

    /// Resolve a per-case settings record from `<case_setting_path>/<setting_file>`,
    /// caching it after first load.
    pub fn case_setting<T>(&self, case_setting_path: &Utf8Path, setting_file: &str) -> Result<T, EngineError>
    where
        T: DeserializeOwned + Default + Clone + Serialize,
    {
        let path = case_setting_path.join(setting_file);
        if let Some(cached) = self.case_cache.lock().get(&path) {
            return serde_json::from_value(cached.clone()).map_err(|err| EngineError::Setting {
                section: setting_file.to_string(),
                source: campaign_metadata::MetadataError::json(&path, err),
            });
        }
        let value: T = campaign_metadata::settings_file::load_section(&path)
            .map_err(|source| EngineError::Setting {
                section: setting_file.to_string(),
                source,
            })?
            .unwrap_or_default();
        let as_json = serde_json::to_value(&value).map_err(|err| EngineError::Setting {
            section: setting_file.to_string(),
            source: campaign_metadata::MetadataError::json(&path, err),
        })?;
        self.case_cache.lock().insert(path, as_json);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Default, Clone, Serialize, Deserialize, PartialEq, Debug)]
    struct SampleSection {
        #[serde(default)]
        enabled: bool,
        #[serde(default)]
        count: u32,
    }

    #[test]
    fn missing_section_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingStore::new(Utf8Path::from_path(dir.path()).unwrap().to_path_buf());
        let section: SampleSection = store.load_section("Missing").unwrap();
        assert_eq!(section, SampleSection::default());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingStore::new(Utf8Path::from_path(dir.path()).unwrap().to_path_buf());
        let section = SampleSection { enabled: true, count: 7 };
        store.save_section("CaseRunner", &section).unwrap();
        let loaded: SampleSection = store.load_section("CaseRunner").unwrap();
        assert_eq!(loaded, section);
    }

    #[test]
    fn unknown_keys_are_ignored_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8Path::from_path(dir.path()).unwrap().join("CaseRunner.setting");
        std::fs::write(&path, r#"{"enabled": true, "count": 3, "mystery_field": 42}"#).unwrap();
        let store = SettingStore::new(Utf8Path::from_path(dir.path()).unwrap().to_path_buf());
        let loaded: SampleSection = store.load_section("CaseRunner").unwrap();
        assert_eq!(loaded, SampleSection { enabled: true, count: 3 });
    }
}
