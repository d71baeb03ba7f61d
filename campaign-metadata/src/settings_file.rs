// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared helpers for the JSON-file-backed setting sections described in §4.I: a
//! section is a `serde_json::Value` object persisted at
//! `<setting_path>/<name>.setting`, with unknown keys ignored on load so that older
//! section files keep working against a newer, stricter schema.

use crate::errors::MetadataError;
use camino::Utf8Path;
use serde::{Serialize, de::DeserializeOwned};
use std::fs;

/// Reads a setting section file and deserializes it, ignoring unknown JSON keys.
///
/// Returns `Ok(None)` if the file does not exist yet; callers are expected to write
/// the type's `Default` back out in that case (mirroring the reference source's
/// write-defaults-on-first-load behavior).
pub fn load_section<T: DeserializeOwned>(path: &Utf8Path) -> Result<Option<T>, MetadataError> {
    match fs::read_to_string(path) {
        Ok(contents) => {
            let value = serde_json::from_str(&contents)
                .map_err(|err| MetadataError::json(path, err))?;
            Ok(Some(value))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(MetadataError::io(path, err)),
    }
}

/// Serializes a setting section and writes it to `<setting_path>/<name>.setting`,
/// creating the parent directory if necessary.
pub fn save_section<T: Serialize>(path: &Utf8Path, value: &T) -> Result<(), MetadataError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| MetadataError::io(parent, err))?;
    }
    let contents =
        serde_json::to_string_pretty(value).map_err(|err| MetadataError::json(path, err))?;
    fs::write(path, contents).map_err(|err| MetadataError::io(path, err))
}
