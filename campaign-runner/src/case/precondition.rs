// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Precondition evaluators that gate whether a case runs at all (§4.C).

use indexmap::IndexMap;

use super::descriptor::CaseDescriptor;
use crate::report::Reporter;

/// `case_name -> {priority, result}` (§3 case-result record). Insertion order
/// matches run order, so `IsHigherPriorityPassed` sees cases in the order they
/// actually ran.
pub type CaseResults = IndexMap<String, CaseResultEntry>;

#[derive(Clone, Copy, Debug)]
pub struct CaseResultEntry {
    pub priority: i64,
    pub result: bool,
}

/// One gate in the precondition chain. The gate is the logical AND of evaluators in
/// order; the first failure short-circuits and the case is *skipped*, not failed.
pub trait Precondition {
    /// Returns `true` if the case may run. Writes one INFO step into `reporter`
    /// describing the outcome either way.
    fn is_meet(&self, descriptor: &CaseDescriptor, results: &CaseResults, reporter: &Reporter) -> bool;
}

pub struct IsTestCaseType {
    pub mask: u32,
}

impl Precondition for IsTestCaseType {
    fn is_meet(&self, descriptor: &CaseDescriptor, _results: &CaseResults, reporter: &Reporter) -> bool {
        let ok = descriptor.test_type & self.mask != 0;
        reporter.add(
            campaign_metadata::Status::Info,
            "IsTestCaseType",
            &format!(
                "case test_type {:#x} {} required mask {:#x}",
                descriptor.test_type,
                if ok { "matches" } else { "does not match" },
                self.mask
            ),
        );
        ok
    }
}

pub struct IsTestCasePriority {
    /// Empty means "no restriction" (skip this evaluator entirely).
    pub priority_to_run: Vec<i64>,
}

impl Precondition for IsTestCasePriority {
    fn is_meet(&self, descriptor: &CaseDescriptor, _results: &CaseResults, reporter: &Reporter) -> bool {
        if self.priority_to_run.is_empty() {
            return true;
        }
        let ok = self.priority_to_run.contains(&descriptor.priority);
        // The reference source passes a malformed message tuple to `reporter.add` on
        // the failure branch; here it's a single formatted message (§9 open question b).
        reporter.add(
            campaign_metadata::Status::Info,
            "IsTestCasePriority",
            &format!(
                "case priority {} {} the configured priorities {:?}",
                descriptor.priority,
                if ok { "is in" } else { "is not in" },
                self.priority_to_run
            ),
        );
        ok
    }
}

pub struct IsPreCasePassed;

impl Precondition for IsPreCasePassed {
    fn is_meet(&self, descriptor: &CaseDescriptor, results: &CaseResults, reporter: &Reporter) -> bool {
        let missing: Vec<&str> = descriptor
            .pre_tests
            .iter()
            .filter(|name| !results.get(name.as_str()).map(|entry| entry.result).unwrap_or(false))
            .map(String::as_str)
            .collect();
        let ok = missing.is_empty();
        reporter.add(
            campaign_metadata::Status::Info,
            "IsPreCasePassed",
            &if ok {
                "all pre-tests passed".to_string()
            } else {
                format!("pre-tests not passed or not run: {missing:?}")
            },
        );
        ok
    }
}

pub struct IsHigherPriorityPassed {
    pub threshold: i64,
}

impl Precondition for IsHigherPriorityPassed {
    fn is_meet(&self, descriptor: &CaseDescriptor, results: &CaseResults, reporter: &Reporter) -> bool {
        if !descriptor.skip_if_high_priority_failed {
            return true;
        }
        let ok = results
            .values()
            .filter(|entry| entry.priority < self.threshold)
            .all(|entry| entry.result);
        reporter.add(
            campaign_metadata::Status::Info,
            "IsHigherPriorityPassed",
            &if ok {
                "no higher-priority case failed".to_string()
            } else {
                format!("a case with priority < {} failed", self.threshold)
            },
        );
        ok
    }
}

/// Evaluate the standard chain in the documented order, short-circuiting on the
/// first failure.
pub fn evaluate_chain(
    descriptor: &CaseDescriptor,
    priority_to_run: &[i64],
    results: &CaseResults,
    reporter: &Reporter,
) -> bool {
    let threshold = descriptor.priority;
    let chain: Vec<Box<dyn Precondition>> = vec![
        Box::new(IsTestCaseType { mask: descriptor.test_type }),
        Box::new(IsTestCasePriority {
            priority_to_run: priority_to_run.to_vec(),
        }),
        Box::new(IsPreCasePassed),
        Box::new(IsHigherPriorityPassed { threshold }),
    ];
    chain.iter().all(|gate| gate.is_meet(descriptor, results, reporter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Reporter;

    fn descriptor() -> CaseDescriptor {
        let mut d = CaseDescriptor::new("mod.Case");
        d.priority = 5;
        d
    }

    #[test]
    fn missing_pre_test_blocks_the_case() {
        let mut d = descriptor();
        d.pre_tests = vec!["A".to_string()];
        let reporter = Reporter::new();
        let results = CaseResults::new();
        assert!(!IsPreCasePassed.is_meet(&d, &results, &reporter));
    }

    #[test]
    fn passed_pre_test_allows_the_case() {
        let mut d = descriptor();
        d.pre_tests = vec!["A".to_string()];
        let reporter = Reporter::new();
        let mut results = CaseResults::new();
        results.insert("A".to_string(), CaseResultEntry { priority: 1, result: true });
        assert!(IsPreCasePassed.is_meet(&d, &results, &reporter));
    }

    #[test]
    fn skip_if_high_priority_failed_blocks_on_any_earlier_failure() {
        let mut d = descriptor();
        d.skip_if_high_priority_failed = true;
        let reporter = Reporter::new();
        let mut results = CaseResults::new();
        results.insert("earlier".to_string(), CaseResultEntry { priority: 1, result: false });
        assert!(!IsHigherPriorityPassed { threshold: d.priority }.is_meet(&d, &results, &reporter));
    }

    #[test]
    fn skip_if_high_priority_failed_is_noop_when_unset() {
        let d = descriptor();
        let reporter = Reporter::new();
        let mut results = CaseResults::new();
        results.insert("earlier".to_string(), CaseResultEntry { priority: 1, result: false });
        assert!(IsHigherPriorityPassed { threshold: d.priority }.is_meet(&d, &results, &reporter));
    }

    #[test]
    fn empty_priority_to_run_is_unrestricted() {
        let d = descriptor();
        let reporter = Reporter::new();
        let results = CaseResults::new();
        assert!(IsTestCasePriority { priority_to_run: vec![] }.is_meet(&d, &results, &reporter));
    }
}
