// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The on-disk JSON shape of a test list file and its sibling settings file (§6).

use serde::{Deserialize, Serialize};

/// Root object of a `.testlist` file.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TestListFileSummary {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Explicit settings-file path. When empty, the loader falls back to
    /// `<basename>.settings` next to the list file.
    #[serde(default)]
    pub setting_path: String,
    /// `"module.Class[,setting_file]"` entries, in the order cases should run.
    #[serde(default)]
    pub cases: Vec<String>,
    /// Paths to sub-list files, relative to this file's directory.
    #[serde(default)]
    pub sublist: Vec<String>,
}

/// Per-list execution settings, stored in `<list>.settings`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ListSettingsSummary {
    pub random_seed: u64,
    pub case_setting_path: String,
    pub skip_if_high_priority_failed: bool,
    pub follow_priority: bool,
    /// Bitmask of `TestType` flags a case must intersect to be eligible.
    pub run_type: u32,
    /// When non-empty, a case's priority must be a member of this set.
    pub priority_to_run: Vec<i32>,
}

impl Default for ListSettingsSummary {
    fn default() -> Self {
        Self {
            random_seed: 0,
            case_setting_path: String::new(),
            skip_if_high_priority_failed: false,
            follow_priority: true,
            run_type: crate::ALL_TEST_TYPES,
            priority_to_run: Vec::new(),
        }
    }
}

/// The full bitmask of all test-type flags, equivalent to the reference source's
/// `TestType.ALL`.
pub const ALL_TEST_TYPES: u32 = 255;
