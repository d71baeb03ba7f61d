// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring a [`CaseRunner`] from the CLI's four required flags (§4.K).

use std::sync::Arc;

use campaign_runner::case::CaseRegistry;
use campaign_runner::errors::EngineError;
use campaign_runner::list;
use campaign_runner::modules::ModuleManager;
use campaign_runner::report::Reporter;
use campaign_runner::runner::CaseRunner;
use campaign_runner::settings::SettingStore;

use crate::cli::Cli;

/// The extension point a deployment uses to register its concrete case types
/// (§4.H): the reference source's dynamic class discovery has no equivalent here,
/// so a binary that ships real cases calls `registry.register(...)` for each one
/// before constructing a [`CaseRunner`]. This build ships none.
pub fn register_cases(_registry: &mut CaseRegistry) {}

/// The extension point for registering logic modules (§4.G), analogous to
/// [`register_cases`].
pub fn register_modules(_manager: &mut ModuleManager) {}

pub struct Engine {
    pub runner: Arc<CaseRunner>,
}

impl Engine {
    pub fn wire(args: &Cli) -> Self {
        let reporter = Reporter::new();

        let mut registry = CaseRegistry::new();
        register_cases(&mut registry);

        let mut modules = ModuleManager::new();
        register_modules(&mut modules);

        let settings = Arc::new(SettingStore::new(args.setting.clone()));

        let runner = CaseRunner::new(reporter, Arc::new(registry), settings, Arc::new(modules), None);
        Self { runner: Arc::new(runner) }
    }

    pub fn load_and_run(&self, args: &Cli) -> Result<(), EngineError> {
        self.runner.load_resource(&args.resource, &args.user)?;
        let test_list = list::load(&args.testlist, false)?;
        self.runner.load_test_list(test_list);
        self.runner.start()
    }
}
