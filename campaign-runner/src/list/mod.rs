// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The test list loader (§4.D).

mod loader;
mod model;

pub use loader::{load, save};
pub use model::{CaseRef, ListSettings, TestList};
