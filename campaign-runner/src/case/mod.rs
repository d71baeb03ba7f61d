// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The case model: descriptors, preconditions, and data-driven wrapping (§4.C, §4.H).

mod data_driven;
mod descriptor;
mod precondition;
mod registry;

pub use data_driven::{DataDrivenFile, run_data_driven, substitute_functions, substitute_vars};
pub use descriptor::{Case, CaseConstructor, CaseContext, CaseDescriptor, test_type};
pub use precondition::{
    CaseResultEntry, CaseResults, IsHigherPriorityPassed, IsPreCasePassed, IsTestCasePriority, IsTestCaseType, Precondition,
    evaluate_chain,
};
pub use registry::CaseRegistry;
