// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by the campaign engine (§7).

use camino::Utf8PathBuf;
use thiserror::Error;

/// The error taxonomy of §7, collapsed into a single enum so the CLI/REST layer has
/// one type to match on and render.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The resource file could not be read or parsed.
    #[error("failed to load resource pool from `{path}`")]
    ResourceLoad {
        path: Utf8PathBuf,
        #[source]
        source: ResourceError,
    },

    /// The resource pool is reserved by someone else.
    #[error("resource pool `{path}` is reserved by `{owner}`")]
    ResourceReservedByOther { path: Utf8PathBuf, owner: String },

    /// A case's `collect_resource` could not satisfy its constraints.
    #[error("resource constraints not met: {0}")]
    ResourceNotMeetConstraint(String),

    /// A case-ref in a test list could not be resolved against the case registry.
    #[error("case `{case_ref}` could not be imported: {reason}")]
    CaseImport { case_ref: String, reason: String },

    /// `start()` was called before the engine had both a resource pool and a test list.
    #[error("engine not ready: {0}")]
    EngineNotReady(&'static str),

    /// A lock-pool `lock()` call timed out.
    #[error("resource `{resource}` is locked by `{holder}` and was not released within {timeout_secs}s")]
    ResourceIsLocked {
        resource: String,
        holder: String,
        timeout_secs: u64,
    },

    /// A lock-pool `release()` call was made by a non-holder, or for an unlocked
    /// resource.
    #[error("invalid lock operation on `{resource}`: {reason}")]
    InvalidLockOperation { resource: String, reason: String },

    /// A setting section failed to load or save.
    #[error("setting error for section `{section}`")]
    Setting {
        section: String,
        #[source]
        source: campaign_metadata::MetadataError,
    },

    /// The top-level test list (or a sub-list, under `strict` loading) failed to load.
    #[error("failed to load test list `{path}`")]
    TestList {
        path: Utf8PathBuf,
        #[source]
        source: TestListError,
    },
}

/// Errors specific to the resource pool (§4.B).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResourceError {
    #[error("file not found")]
    NotFound,
    #[error(transparent)]
    Metadata(#[from] campaign_metadata::MetadataError),
    #[error("device `{0}` already exists")]
    DuplicateDevice(String),
    #[error("port `{port}` already exists on device `{device}`")]
    DuplicatePort { device: String, port: String },
    #[error("remote port reference `{device}.{port}` does not resolve to a known port")]
    DanglingRemotePort { device: String, port: String },
    #[error("resource type `{0}` is not registered")]
    UnregisteredType(String),
}

/// Errors specific to the test list loader (§4.D).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TestListError {
    #[error(transparent)]
    Metadata(#[from] campaign_metadata::MetadataError),
    #[error("sub-list `{0}` failed to load")]
    SubList(Utf8PathBuf),
}

/// A constraint, or list of constraints, that a resource failed to satisfy. Carries
/// enough human-readable description to surface directly as an `EXCEPTION` step
/// message (§4.E).
#[derive(Debug, Clone)]
pub struct ResourceNotMeetConstraint {
    pub description: String,
}

impl std::fmt::Display for ResourceNotMeetConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description)
    }
}

impl std::error::Error for ResourceNotMeetConstraint {}
