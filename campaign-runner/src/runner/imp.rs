// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The case runner: campaign lifecycle, DFS over the list tree (§4.E).

use camino::Utf8PathBuf;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::case::{Case, CaseContext, CaseRegistry, CaseResultEntry, CaseResults, evaluate_chain};
use crate::errors::EngineError;
use crate::list::TestList;
use crate::log::RunLogFolder;
use crate::modules::{ModuleManager, ModuleType};
use crate::report::Reporter;
use crate::resource::ResourcePool;
use crate::settings::SettingStore;
use campaign_metadata::Status;

/// `Idle -> Running -> Idle` (§4.E).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunnerStatus {
    Idle,
    Running,
}

pub struct CaseRunner {
    reporter: Arc<Reporter>,
    registry: Arc<CaseRegistry>,
    settings: Arc<SettingStore>,
    modules: Arc<ModuleManager>,
    log_folder: Option<Arc<RunLogFolder>>,
    resource_pool: Mutex<Option<Arc<ResourcePool>>>,
    test_list: Mutex<Option<TestList>>,
    status: Mutex<RunnerStatus>,
    results: Mutex<CaseResults>,
}

impl CaseRunner {
    pub fn new(
        reporter: Arc<Reporter>,
        registry: Arc<CaseRegistry>,
        settings: Arc<SettingStore>,
        modules: Arc<ModuleManager>,
        log_folder: Option<Arc<RunLogFolder>>,
    ) -> Self {
        Self {
            reporter,
            registry,
            settings,
            modules,
            log_folder,
            resource_pool: Mutex::new(None),
            test_list: Mutex::new(None),
            status: Mutex::new(RunnerStatus::Idle),
            results: Mutex::new(CaseResults::new()),
        }
    }

    pub fn load_resource(&self, path: &camino::Utf8Path, owner: &str) -> Result<(), EngineError> {
        let pool = ResourcePool::load(path, owner)?;
        *self.resource_pool.lock() = Some(Arc::new(pool));
        Ok(())
    }

    pub fn load_test_list(&self, list: TestList) {
        *self.test_list.lock() = Some(list);
    }

    /// The currently loaded test list, if any (cloned out from under the lock).
    pub fn test_list(&self) -> Option<TestList> {
        self.test_list.lock().clone()
    }

    pub fn status(&self) -> RunnerStatus {
        *self.status.lock()
    }

    pub fn reporter(&self) -> &Arc<Reporter> {
        &self.reporter
    }

    /// `start()`: no-op while already `Running`; fails `engine-not-ready` unless both
    /// a resource pool and a test list are loaded (§4.E).
    pub fn start(&self) -> Result<(), EngineError> {
        {
            let mut status = self.status.lock();
            if *status == RunnerStatus::Running {
                return Ok(());
            }
            *status = RunnerStatus::Running;
        }

        let outcome = self.run();

        *self.status.lock() = RunnerStatus::Idle;
        outcome
    }

    fn run(&self) -> Result<(), EngineError> {
        let pool = self
            .resource_pool
            .lock()
            .as_ref()
            .cloned()
            .ok_or(EngineError::EngineNotReady("no resource pool loaded"))?;
        let list_guard = self.test_list.lock();
        let list = list_guard
            .as_ref()
            .ok_or(EngineError::EngineNotReady("no test list loaded"))?;

        self.results.lock().clear();
        self.run_list(list, &pool);
        Ok(())
    }

    fn run_list(&self, list: &TestList, pool: &Arc<ResourcePool>) {
        self.reporter.add_list(&list.name);
        for case_ref in &list.cases {
            self.run_case(list, case_ref, pool);
        }
        for sub_list in &list.sub_lists {
            self.run_list(sub_list, pool);
        }
        self.reporter.end_list();
    }

    fn run_case(&self, list: &TestList, case_ref: &crate::list::CaseRef, pool: &Arc<ResourcePool>) {
        let Some((descriptor, constructor)) = self.registry.lookup(&case_ref.type_id) else {
            tracing::error!(type_id = %case_ref.type_id, "case import failed: type id not registered");
            return;
        };
        let descriptor = descriptor.clone();

        self.reporter.add_test(&descriptor.type_id);

        let case_log = self.log_folder.as_ref().and_then(|folder| {
            folder.open_case_log(&list.name, &descriptor.type_id).ok()
        });

        let priority_to_run = &list.settings.priority_to_run;
        let results_snapshot = self.results.lock().clone();
        let may_run = evaluate_chain(&descriptor, priority_to_run, &results_snapshot, &self.reporter);

        if !may_run {
            self.reporter.add(Status::Info, "skip", "preconditions not met, case not invoked");
            self.reporter.end_test();
            return;
        }

        let setting = case_ref
            .setting_file
            .as_deref()
            .map(|file| self.settings.case_setting::<serde_json::Value>(&list.settings.case_setting_path, file))
            .transpose()
            .unwrap_or(None)
            .unwrap_or(serde_json::Value::Null);

        let context = CaseContext {
            reporter: Arc::clone(&self.reporter),
            setting,
        };
        let mut case = constructor(context);

        let final_status = self.run_case_lifecycle(case.as_mut(), pool);

        if let Some(log) = case_log {
            let _ = log.write_line(&format!("case {} finished with {:?}", descriptor.type_id, final_status));
        }

        // Read the case's actual promoted status back out of the result tree rather
        // than trusting `final_status` alone: a case can fail without setup/test ever
        // returning `Err` by calling `context.reporter.add(Status::Fail, ...)` directly.
        let case_status = self
            .reporter
            .search_result(&descriptor.type_id)
            .map(|node| node.status)
            .unwrap_or(final_status);

        self.results.lock().insert(
            descriptor.type_id.clone(),
            CaseResultEntry {
                priority: descriptor.priority,
                result: case_status == Status::Pass,
            },
        );

        self.reporter.end_test();
    }

    /// The per-case phase sequence (§4.E "Per-case lifecycle"): collect resources,
    /// PRE modules, setup, TEST modules (PARALLEL), test, cleanup always runs, POST
    /// modules.
    fn run_case_lifecycle(&self, case: &mut dyn Case, pool: &Arc<ResourcePool>) -> Status {
        self.reporter.add_step_group("Collect Test Resources");
        let collected = case.collect_resource(pool);
        self.reporter.end_step_group();
        if let Err(err) = collected {
            self.reporter.add(Status::Exception, "collect_resource failed", &err.to_string());
            return Status::Exception;
        }

        let pre = self.modules.instantiate(ModuleType::Pre, &self.reporter);
        for module in &pre {
            module.do_work(pool);
        }

        let parallel = self.modules.instantiate(ModuleType::Parallel, &self.reporter);
        for module in &parallel {
            module.spawn(Arc::clone(&self.reporter), Arc::clone(pool));
        }

        self.reporter.add_step_group("SETUP");
        let setup_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| case.setup()));
        let setup_failed = match setup_result {
            Ok(Ok(())) => false,
            Ok(Err(err)) => {
                self.reporter.add(Status::Exception, "setup failed", &err.to_string());
                true
            }
            Err(_) => {
                self.reporter.add(Status::Exception, "setup panicked", "unexpected panic in setup()");
                true
            }
        };
        self.reporter.end_step_group();

        let mut test_failed = setup_failed;
        if !setup_failed {
            self.reporter.add_step_group("TEST");
            let test_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| case.test()));
            match test_result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    self.reporter.add(Status::Exception, "test failed", &err.to_string());
                    test_failed = true;
                }
                Err(_) => {
                    self.reporter.add(Status::Exception, "test panicked", "unexpected panic in test()");
                    test_failed = true;
                }
            }
            self.reporter.end_step_group();
        }

        for module in &parallel {
            module.stop();
        }

        let cleanup_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| case.cleanup()));
        match cleanup_result {
            Ok(Ok(())) => {}
            Ok(Err(err)) => self.reporter.add(Status::Exception, "cleanup failed", &err.to_string()),
            Err(_) => self.reporter.add(Status::Exception, "cleanup panicked", "unexpected panic in cleanup()"),
        }

        let post = self.modules.instantiate(ModuleType::Post, &self.reporter);
        for module in &post {
            module.do_work(pool);
        }

        if test_failed {
            Status::Exception
        } else {
            Status::Pass
        }
    }

    pub fn results(&self) -> CaseResults {
        self.results.lock().clone()
    }

    pub fn archive_logs(&self) -> Result<Option<Utf8PathBuf>, std::io::Error> {
        match &self.log_folder {
            Some(folder) if folder.should_archive_on_finish() => folder.archive().map(Some),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::{CaseDescriptor, test_type};
    use crate::modules::ModuleManager;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCase {
        setup_calls: Arc<AtomicUsize>,
        test_calls: Arc<AtomicUsize>,
        cleanup_calls: Arc<AtomicUsize>,
        fail_in: Option<&'static str>,
    }

    impl Case for CountingCase {
        fn setup(&mut self) -> anyhow::Result<()> {
            self.setup_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_in == Some("setup") {
                anyhow::bail!("setup boom");
            }
            Ok(())
        }
        fn test(&mut self) -> anyhow::Result<()> {
            self.test_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_in == Some("test") {
                anyhow::bail!("test boom");
            }
            Ok(())
        }
        fn cleanup(&mut self) -> anyhow::Result<()> {
            self.cleanup_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn make_runner() -> (CaseRunner, Arc<AtomicUsize>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let setup_calls = Arc::new(AtomicUsize::new(0));
        let test_calls = Arc::new(AtomicUsize::new(0));
        let cleanup_calls = Arc::new(AtomicUsize::new(0));

        let mut registry = CaseRegistry::new();
        {
            let setup_calls = Arc::clone(&setup_calls);
            let test_calls = Arc::clone(&test_calls);
            let cleanup_calls = Arc::clone(&cleanup_calls);
            registry.register(
                CaseDescriptor::new("fixtures.Passing"),
                Arc::new(move |_ctx| {
                    Box::new(CountingCase {
                        setup_calls: Arc::clone(&setup_calls),
                        test_calls: Arc::clone(&test_calls),
                        cleanup_calls: Arc::clone(&cleanup_calls),
                        fail_in: None,
                    }) as Box<dyn Case>
                }),
            );
        }
        {
            let setup_calls = Arc::clone(&setup_calls);
            let test_calls = Arc::clone(&test_calls);
            let cleanup_calls = Arc::clone(&cleanup_calls);
            let mut failing_descriptor = CaseDescriptor::new("fixtures.FailingSetup");
            failing_descriptor.test_type = test_type::ALL;
            registry.register(
                failing_descriptor,
                Arc::new(move |_ctx| {
                    Box::new(CountingCase {
                        setup_calls: Arc::clone(&setup_calls),
                        test_calls: Arc::clone(&test_calls),
                        cleanup_calls: Arc::clone(&cleanup_calls),
                        fail_in: Some("setup"),
                    }) as Box<dyn Case>
                }),
            );
        }

        let dir = tempfile::tempdir().unwrap();
        let runner = CaseRunner::new(
            Reporter::new(),
            Arc::new(registry),
            Arc::new(SettingStore::new(camino::Utf8Path::from_path(dir.path()).unwrap().to_path_buf())),
            Arc::new(ModuleManager::new()),
            None,
        );
        (runner, setup_calls, test_calls, cleanup_calls)
    }

    #[test]
    fn passing_case_runs_setup_test_cleanup_once_each() {
        let (runner, setup_calls, test_calls, cleanup_calls) = make_runner();
        let list = TestList {
            name: "suite".to_string(),
            description: String::new(),
            setting_path: Utf8PathBuf::new(),
            cases: vec![crate::list::CaseRef::parse("fixtures.Passing")],
            sub_lists: vec![],
            settings: crate::list::ListSettings::default(),
            source_path: Utf8PathBuf::from("suite.testlist"),
        };
        runner.load_test_list(list);
        *runner.resource_pool.lock() = Some(Arc::new(ResourcePool::new()));
        runner.start().unwrap();
        assert_eq!(setup_calls.load(Ordering::SeqCst), 1);
        assert_eq!(test_calls.load(Ordering::SeqCst), 1);
        assert_eq!(cleanup_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn setup_failure_skips_test_but_still_runs_cleanup() {
        let (runner, setup_calls, test_calls, cleanup_calls) = make_runner();
        let list = TestList {
            name: "suite".to_string(),
            description: String::new(),
            setting_path: Utf8PathBuf::new(),
            cases: vec![crate::list::CaseRef::parse("fixtures.FailingSetup")],
            sub_lists: vec![],
            settings: crate::list::ListSettings::default(),
            source_path: Utf8PathBuf::from("suite.testlist"),
        };
        runner.load_test_list(list);
        *runner.resource_pool.lock() = Some(Arc::new(ResourcePool::new()));
        runner.start().unwrap();
        assert_eq!(setup_calls.load(Ordering::SeqCst), 1);
        assert_eq!(test_calls.load(Ordering::SeqCst), 0, "TEST step group must never open");
        assert_eq!(cleanup_calls.load(Ordering::SeqCst), 1, "cleanup still runs");
    }

    #[test]
    fn start_without_test_list_is_engine_not_ready() {
        let (runner, ..) = make_runner();
        *runner.resource_pool.lock() = Some(Arc::new(ResourcePool::new()));
        let result = runner.start();
        assert!(matches!(result, Err(EngineError::EngineNotReady(_))));
    }

    #[test]
    fn unregistered_case_ref_is_omitted_not_fatal() {
        let (runner, ..) = make_runner();
        let list = TestList {
            name: "suite".to_string(),
            description: String::new(),
            setting_path: Utf8PathBuf::new(),
            cases: vec![crate::list::CaseRef::parse("fixtures.DoesNotExist")],
            sub_lists: vec![],
            settings: crate::list::ListSettings::default(),
            source_path: Utf8PathBuf::from("suite.testlist"),
        };
        runner.load_test_list(list);
        *runner.resource_pool.lock() = Some(Arc::new(ResourcePool::new()));
        assert!(runner.start().is_ok());
    }
}
