// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The case descriptor record and the `Case` trait (§3, §4.C, §4.H).

use std::sync::Arc;

use crate::errors::ResourceError;
use crate::report::Reporter;
use crate::resource::ResourcePool;

/// Bitmask classification of a case, mirroring the reference source's `TestType`
/// bitmask (`UNIT|SANITY|FEATURE|REGRESSION|SYSTEM`, `ALL = 255`).
pub mod test_type {
    pub const UNIT: u32 = 1;
    pub const SANITY: u32 = 2;
    pub const FEATURE: u32 = 4;
    pub const REGRESSION: u32 = 8;
    pub const SYSTEM: u32 = 16;
    pub const ALL: u32 = 255;
}

/// Metadata attached to a case type at registration (§3, §4.H). Default values match
/// the reference source: `priority = 999`, `test_type = ALL`, `pre_tests = []`,
/// `skip_if_high_priority_failed = false`.
#[derive(Clone, Debug)]
pub struct CaseDescriptor {
    pub type_id: String,
    pub priority: i64,
    pub test_type: u32,
    pub feature_name: String,
    pub testcase_id: String,
    pub pre_tests: Vec<String>,
    pub skip_if_high_priority_failed: bool,
    pub doc: String,
}

impl CaseDescriptor {
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            priority: 999,
            test_type: test_type::ALL,
            feature_name: String::new(),
            testcase_id: String::new(),
            pre_tests: Vec::new(),
            skip_if_high_priority_failed: false,
            doc: String::new(),
        }
    }
}

/// Everything a constructed case instance needs: the reporter to write into, the
/// resource pool to collect from, and the per-case setting section resolved by the
/// runner before construction.
pub struct CaseContext {
    pub reporter: Arc<Reporter>,
    pub setting: serde_json::Value,
}

/// The four user-supplied lifecycle methods (§3). Implementations are produced by a
/// registered constructor closure, one fresh instance per case execution.
pub trait Case: Send {
    /// Resolve and reserve whatever devices/ports this case needs from `pool`.
    /// Raising [`ResourceError`] here becomes a single `EXCEPTION` step and skips
    /// the remaining phases (§4.E).
    fn collect_resource(&mut self, pool: &ResourcePool) -> Result<(), ResourceError> {
        let _ = pool;
        Ok(())
    }

    fn setup(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn test(&mut self) -> anyhow::Result<()>;

    fn cleanup(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Invoked for `<func:name>` substitution tokens in data-driven records (§4.C).
    /// The default rejects every name; data-driven cases that use function tokens
    /// must override this.
    fn call_data_function(&mut self, name: &str) -> anyhow::Result<String> {
        anyhow::bail!("case has no data function named `{name}`")
    }

    /// Run one data-driven record (already substituted) against `test`. Overridden
    /// by cases that are data-driven; the default ignores the record and calls
    /// `test()` once.
    fn test_with_record(&mut self, record: &serde_json::Value) -> anyhow::Result<()> {
        let _ = record;
        self.test()
    }
}

pub type CaseConstructor = Arc<dyn Fn(CaseContext) -> Box<dyn Case> + Send + Sync>;
