// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The case runner (§4.E).

mod imp;

pub use imp::{CaseRunner, RunnerStatus};
