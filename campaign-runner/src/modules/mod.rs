// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The logic module manager (§4.G).

mod manager;
mod module_trait;

pub use manager::{ModuleListEntry, ModuleManager};
pub use module_trait::{LogicModule, ModuleType, RunningModule};
