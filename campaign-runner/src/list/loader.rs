// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Loading and saving test list files (§4.D).

use camino::{Utf8Path, Utf8PathBuf};
use campaign_metadata::{ListSettingsSummary, TestListFileSummary};

use super::model::{CaseRef, ListSettings, TestList};
use crate::errors::{EngineError, TestListError};

/// `TestList::load(path, strict)`: parses `path`, recursively loads sub-lists
/// relative to its directory. A sub-list whose load fails is omitted silently
/// unless `strict`, in which case it is a hard error surfaced to the top-level
/// caller (§4.D, §9 open question c).
pub fn load(path: &Utf8Path, strict: bool) -> Result<TestList, EngineError> {
    load_inner(path, strict).map_err(|source| EngineError::TestList {
        path: path.to_path_buf(),
        source,
    })
}

fn load_inner(path: &Utf8Path, strict: bool) -> Result<TestList, TestListError> {
    let text = std::fs::read_to_string(path).map_err(|err| campaign_metadata::MetadataError::io(path, err))?;
    let summary: TestListFileSummary = serde_json::from_str(&text).map_err(|err| campaign_metadata::MetadataError::json(path, err))?;

    let dir = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    let settings = load_settings(&summary, path, dir)?;

    let mut sub_lists = Vec::new();
    for relative in &summary.sublist {
        let sub_path = dir.join(relative);
        match load_inner(&sub_path, strict) {
            Ok(sub_list) => sub_lists.push(sub_list),
            Err(_err) if strict => return Err(TestListError::SubList(sub_path)),
            Err(_) => continue,
        }
    }

    Ok(TestList {
        name: summary.name,
        description: summary.description,
        setting_path: Utf8PathBuf::from(&summary.setting_path),
        cases: summary.cases.iter().map(|raw| CaseRef::parse(raw)).collect(),
        sub_lists,
        settings,
        source_path: path.to_path_buf(),
    })
}

fn load_settings(summary: &TestListFileSummary, list_path: &Utf8Path, dir: &Utf8Path) -> Result<ListSettings, TestListError> {
    let settings_path = if !summary.setting_path.is_empty() {
        Utf8PathBuf::from(&summary.setting_path)
    } else {
        let stem = list_path.file_stem().unwrap_or(&summary.name);
        dir.join(format!("{stem}.settings"))
    };

    if !settings_path.exists() {
        return Ok(ListSettings::default());
    }
    let text = std::fs::read_to_string(&settings_path).map_err(|err| campaign_metadata::MetadataError::io(&settings_path, err))?;
    let summary: ListSettingsSummary = serde_json::from_str(&text).map_err(|err| campaign_metadata::MetadataError::json(&settings_path, err))?;
    Ok(ListSettings::from_summary(&summary))
}

/// `save()`: the exact inverse of `load` — writes the list file and, if any
/// non-default settings exist, the sibling settings file.
pub fn save(list: &TestList) -> Result<(), EngineError> {
    save_inner(list).map_err(|source| EngineError::TestList {
        path: list.source_path.clone(),
        source,
    })
}

fn save_inner(list: &TestList) -> Result<(), TestListError> {
    let dir = list.source_path.parent().unwrap_or_else(|| Utf8Path::new("."));

    let summary = TestListFileSummary {
        name: list.name.clone(),
        description: list.description.clone(),
        setting_path: list.setting_path.to_string(),
        cases: list.cases.iter().map(CaseRef::to_raw).collect(),
        sublist: list
            .sub_lists
            .iter()
            .map(|sub| {
                sub.source_path
                    .strip_prefix(dir)
                    .map(|p| p.to_string())
                    .unwrap_or_else(|_| sub.source_path.to_string())
            })
            .collect(),
    };
    let text = serde_json::to_string_pretty(&summary).map_err(|err| campaign_metadata::MetadataError::json(&list.source_path, err))?;
    std::fs::write(&list.source_path, text).map_err(|err| campaign_metadata::MetadataError::io(&list.source_path, err))?;

    let settings_path = if !list.setting_path.as_str().is_empty() {
        list.setting_path.clone()
    } else {
        let stem = list.source_path.file_stem().unwrap_or(&list.name);
        dir.join(format!("{stem}.settings"))
    };
    let settings_text = serde_json::to_string_pretty(&list.settings.to_summary())
        .map_err(|err| campaign_metadata::MetadataError::json(&settings_path, err))?;
    std::fs::write(&settings_path, settings_text).map_err(|err| campaign_metadata::MetadataError::io(&settings_path, err))?;

    for sub_list in &list.sub_lists {
        save_inner(sub_list)?;
    }
    Ok(())
}
