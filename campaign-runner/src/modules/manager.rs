// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The logic module manager: registry and instance construction (§4.G).

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::module_trait::{LogicModule, ModuleType, RunningModule};
use crate::errors::EngineError;
use crate::report::Reporter;

type ModuleFactory = Arc<dyn Fn() -> Arc<dyn LogicModule> + Send + Sync>;

struct RegisteredModule {
    module_type: ModuleType,
    priority: i64,
    factory: ModuleFactory,
}

/// `name -> {class, setting_file, setting_path}`, persisted to a JSON module-list
/// file (§4.G). The persisted record only carries the bookkeeping fields; the
/// constructor closure itself is supplied at registration time in-process (there is
/// no dynamic class loading here, consistent with the case registry's approach, §4.H).
#[derive(Default)]
pub struct ModuleManager {
    entries: std::collections::HashMap<String, RegisteredModule>,
    /// Insertion order, so `get_module_instances` returns modules of a given type in
    /// registration order (ties within a phase keep registration order; cross-phase
    /// ordering is governed by `priority`).
    order: Vec<String>,
}

/// One row of a persisted module-list file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModuleListEntry {
    pub name: String,
    pub setting_file: String,
    pub setting_path: String,
}

impl ModuleManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, module_type: ModuleType, priority: i64, factory: ModuleFactory) {
        let name = name.into();
        self.order.push(name.clone());
        self.entries.insert(
            name,
            RegisteredModule {
                module_type,
                priority,
                factory,
            },
        );
    }

    /// `get_module_instances(type, reporter, resources)`: fresh instances for the
    /// given phase, in registration order, lowest-priority-number first.
    pub fn instantiate(&self, module_type: ModuleType, reporter: &Arc<Reporter>) -> Vec<RunningModule> {
        let mut matching: Vec<&str> = self
            .order
            .iter()
            .map(String::as_str)
            .filter(|name| self.entries[*name].module_type == module_type)
            .collect();
        matching.sort_by_key(|name| self.entries[*name].priority);

        matching
            .into_iter()
            .map(|name| RunningModule::new((self.entries[name].factory)(), Arc::clone(reporter)))
            .collect()
    }

    pub fn load_module_list(path: &Utf8Path) -> Result<Vec<ModuleListEntry>, EngineError> {
        let text = std::fs::read_to_string(path).map_err(|err| EngineError::Setting {
            section: "module_list".to_string(),
            source: campaign_metadata::MetadataError::io(path, err),
        })?;
        serde_json::from_str(&text).map_err(|err| EngineError::Setting {
            section: "module_list".to_string(),
            source: campaign_metadata::MetadataError::json(path, err),
        })
    }

    pub fn save_module_list(path: &Utf8Path, entries: &[ModuleListEntry]) -> Result<(), EngineError> {
        let text = serde_json::to_string_pretty(entries).map_err(|err| EngineError::Setting {
            section: "module_list".to_string(),
            source: campaign_metadata::MetadataError::json(path, err),
        })?;
        std::fs::write(path, text).map_err(|err| EngineError::Setting {
            section: "module_list".to_string(),
            source: campaign_metadata::MetadataError::io(path, err),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourcePool;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingModule {
        calls: Arc<AtomicUsize>,
    }
    impl LogicModule for CountingModule {
        fn do_action(&self, _reporter: &Reporter, _pool: &ResourcePool) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn instances_run_in_priority_order_and_fresh_each_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut manager = ModuleManager::new();
        {
            let calls = Arc::clone(&calls);
            manager.register(
                "low-priority",
                ModuleType::Pre,
                10,
                Arc::new(move || Arc::new(CountingModule { calls: Arc::clone(&calls) }) as Arc<dyn LogicModule>),
            );
        }
        {
            let calls = Arc::clone(&calls);
            manager.register(
                "high-priority",
                ModuleType::Pre,
                1,
                Arc::new(move || Arc::new(CountingModule { calls: Arc::clone(&calls) }) as Arc<dyn LogicModule>),
            );
        }
        let reporter = Reporter::new();
        let instances = manager.instantiate(ModuleType::Pre, &reporter);
        assert_eq!(instances.len(), 2);
        let pool = ResourcePool::new();
        for instance in &instances {
            instance.do_work(&pool);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn only_matching_type_is_returned() {
        let manager_calls = Arc::new(AtomicUsize::new(0));
        let mut manager = ModuleManager::new();
        manager.register(
            "post-only",
            ModuleType::Post,
            1,
            Arc::new(move || Arc::new(CountingModule { calls: Arc::new(AtomicUsize::new(0)) }) as Arc<dyn LogicModule>),
        );
        let reporter = Reporter::new();
        assert!(manager.instantiate(ModuleType::Pre, &reporter).is_empty());
        assert_eq!(manager.instantiate(ModuleType::Post, &reporter).len(), 1);
        let _ = manager_calls;
    }
}
