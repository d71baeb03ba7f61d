// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Public wire formats for the campaign test execution engine.
//!
//! This crate has no engine logic in it: it only describes the JSON shapes the
//! engine reads and writes (resource files, test-list files, setting sections, and
//! the result tree's `to_dict` projection), so that the CLI, the REST facade, and
//! any external tooling can agree on them without depending on `campaign-runner`.

pub mod errors;
pub mod list_file;
pub mod resource_file;
pub mod result_node;
pub mod settings_file;

pub use errors::MetadataError;
pub use list_file::{ALL_TEST_TYPES, ListSettingsSummary, TestListFileSummary};
pub use resource_file::{DeviceSummary, PortSummary, RemotePortRef, ReservationSummary, ResourceFileSummary};
pub use result_node::{NodeType, ResultNodeSummary, Status, StatusTally};
