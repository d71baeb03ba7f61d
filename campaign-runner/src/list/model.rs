// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The in-memory test list tree (§3, §4.D).

use camino::Utf8PathBuf;

/// A parsed `"module.Class[,setting_file]"` entry from a list file's `cases` array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseRef {
    pub type_id: String,
    pub setting_file: Option<String>,
}

impl CaseRef {
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(',') {
            Some((type_id, setting_file)) => Self {
                type_id: type_id.trim().to_string(),
                setting_file: Some(setting_file.trim().to_string()),
            },
            None => Self {
                type_id: raw.trim().to_string(),
                setting_file: None,
            },
        }
    }

    pub fn to_raw(&self) -> String {
        match &self.setting_file {
            Some(file) => format!("{},{}", self.type_id, file),
            None => self.type_id.clone(),
        }
    }
}

/// Per-list execution settings (§3), defaults matching
/// [`campaign_metadata::ListSettingsSummary::default`].
#[derive(Clone, Debug)]
pub struct ListSettings {
    pub random_seed: u64,
    pub case_setting_path: Utf8PathBuf,
    pub skip_if_high_priority_failed: bool,
    pub follow_priority: bool,
    pub run_type: u32,
    pub priority_to_run: Vec<i64>,
}

impl Default for ListSettings {
    fn default() -> Self {
        let summary = campaign_metadata::ListSettingsSummary::default();
        Self::from_summary(&summary)
    }
}

impl ListSettings {
    pub fn from_summary(summary: &campaign_metadata::ListSettingsSummary) -> Self {
        Self {
            random_seed: summary.random_seed,
            case_setting_path: Utf8PathBuf::from(&summary.case_setting_path),
            skip_if_high_priority_failed: summary.skip_if_high_priority_failed,
            follow_priority: summary.follow_priority,
            run_type: summary.run_type,
            priority_to_run: summary.priority_to_run.iter().map(|&p| p as i64).collect(),
        }
    }

    pub fn to_summary(&self) -> campaign_metadata::ListSettingsSummary {
        campaign_metadata::ListSettingsSummary {
            random_seed: self.random_seed,
            case_setting_path: self.case_setting_path.to_string(),
            skip_if_high_priority_failed: self.skip_if_high_priority_failed,
            follow_priority: self.follow_priority,
            run_type: self.run_type,
            priority_to_run: self.priority_to_run.iter().map(|&p| p as i32).collect(),
        }
    }
}

/// A loaded test list, with its sub-lists already resolved (§3, §4.D).
#[derive(Clone, Debug)]
pub struct TestList {
    pub name: String,
    pub description: String,
    pub setting_path: Utf8PathBuf,
    pub cases: Vec<CaseRef>,
    pub sub_lists: Vec<TestList>,
    pub settings: ListSettings,
    pub source_path: Utf8PathBuf,
}
