// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use thiserror::Error;

/// An error produced while reading or writing one of the engine's JSON wire formats.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MetadataError {
    /// The file could not be found or opened.
    #[error("failed to read `{path}`")]
    Io {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },

    /// The file's contents were not valid JSON, or didn't match the expected shape.
    #[error("failed to parse `{path}` as JSON")]
    Json {
        path: Utf8PathBuf,
        #[source]
        err: serde_json::Error,
    },
}

impl MetadataError {
    pub fn io(path: impl Into<Utf8PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            err,
        }
    }

    pub fn json(path: impl Into<Utf8PathBuf>, err: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            err,
        }
    }
}
