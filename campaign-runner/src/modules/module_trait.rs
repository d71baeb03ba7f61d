// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The logic module trait and its running-instance wrapper (§4.G).

use std::sync::Arc;
use std::thread::JoinHandle;

use crate::report::Reporter;
use crate::resource::ResourcePool;

/// `module_type` classification: PRE/POST run blocking around the case; PARALLEL
/// runs in the background for the duration of `setup`+`test` (§4.G).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModuleType {
    Pre,
    Parallel,
    Post,
}

/// A logic module instance, fresh per case execution (`get_module_instances`).
/// `stop()` must interrupt a `Parallel` module cooperatively — it does not get
/// forcibly killed.
pub trait LogicModule: Send + Sync {
    fn do_action(&self, reporter: &Reporter, pool: &ResourcePool);

    /// No-op default; `Parallel` modules override this to flip a cooperative flag
    /// their `do_action` loop checks.
    fn stop(&self) {}

    fn priority(&self) -> i64 {
        999
    }
}

/// Wraps a module instance for the duration of one case, handling the
/// blocking-vs-background distinction the runner itself shouldn't need to know
/// about.
pub struct RunningModule {
    module: Arc<dyn LogicModule>,
    reporter: Arc<Reporter>,
    handle: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl RunningModule {
    pub fn new(module: Arc<dyn LogicModule>, reporter: Arc<Reporter>) -> Self {
        Self {
            module,
            reporter,
            handle: std::sync::Mutex::new(None),
        }
    }

    /// Blocking invocation, used for PRE/POST modules.
    pub fn do_work(&self, pool: &ResourcePool) {
        self.module.do_action(&self.reporter, pool);
    }

    /// Fire-and-forget background invocation, used for PARALLEL modules. Gets the
    /// same pool PRE/POST modules see, matching the reference source's
    /// `ModuleBase.__init__(self, report, resource)`, which stores one `resource`
    /// object shared by every module type regardless of when it runs.
    pub fn spawn(&self, reporter: Arc<Reporter>, pool: Arc<ResourcePool>) {
        let module = Arc::clone(&self.module);
        let handle = std::thread::spawn(move || {
            module.do_action(&reporter, &pool);
        });
        *self.handle.lock().expect("module handle mutex poisoned") = Some(handle);
    }

    pub fn stop(&self) {
        self.module.stop();
        if let Some(handle) = self.handle.lock().expect("module handle mutex poisoned").take() {
            let _ = handle.join();
        }
    }
}
