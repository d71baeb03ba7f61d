// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-case log sinks and archival (§4.J, §6).
//!
//! The reference source's `logger.register(case)`/`logger.unregister(case)` pair
//! becomes a [`CaseLogGuard`]: a file writer pushed for the duration of a case and
//! popped on drop, so exactly one `<case_name>.log` is produced per run, matching
//! `add_test`/`end_test`'s lifecycle in §4.A/§4.E.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs::File;
use std::io::Write;
use std::sync::Mutex;
use zip::write::SimpleFileOptions;

/// The per-run folder everything under this campaign logs into:
/// `<case_log>/<ts>/<list-path>/<case>.log` (§6).
pub struct RunLogFolder {
    root: Utf8PathBuf,
    archive_on_finish: bool,
}

impl RunLogFolder {
    pub fn new(case_log_root: &Utf8Path, timestamp: &str, archive_on_finish: bool) -> std::io::Result<Self> {
        let root = case_log_root.join(timestamp);
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            archive_on_finish,
        })
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Open a case log sink at `<root>/<list_path>/<case_name>.log`.
    pub fn open_case_log(&self, list_path: &str, case_name: &str) -> std::io::Result<CaseLogGuard> {
        let dir = self.root.join(list_path);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{case_name}.log"));
        let file = File::create(&path)?;
        Ok(CaseLogGuard {
            path,
            file: Mutex::new(file),
        })
    }

    /// Zip every `*.log` file under the run folder into `achieved_logs_<ts>.zip` and
    /// delete the raw files, matching `logger.unregister(..., zip=True)` (§6).
    pub fn archive(&self) -> std::io::Result<Utf8PathBuf> {
        let ts = self
            .root
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| "unknown".to_string());
        let archive_path = self.root.join(format!("achieved_logs_{ts}.zip"));
        let archive_file = File::create(&archive_path)?;
        let mut writer = zip::ZipWriter::new(archive_file);
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let mut log_files = Vec::new();
        collect_log_files(&self.root, &mut log_files)?;

        for log_path in &log_files {
            let relative = log_path.strip_prefix(&self.root).unwrap_or(log_path);
            writer
                .start_file(relative.as_str(), options)
                .map_err(std::io::Error::other)?;
            let contents = std::fs::read(log_path)?;
            writer.write_all(&contents)?;
        }
        writer.finish().map_err(std::io::Error::other)?;

        for log_path in &log_files {
            std::fs::remove_file(log_path)?;
        }
        Ok(archive_path)
    }

    pub fn should_archive_on_finish(&self) -> bool {
        self.archive_on_finish
    }
}

fn collect_log_files(dir: &Utf8Path, out: &mut Vec<Utf8PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = Utf8PathBuf::from_path_buf(entry.path()).map_err(|p| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, format!("non-utf8 path: {}", p.display()))
        })?;
        if path.is_dir() {
            collect_log_files(&path, out)?;
        } else if path.extension() == Some("log") {
            out.push(path);
        }
    }
    Ok(())
}

/// A single case's log file, written to directly (bypassing `tracing` dispatch) so
/// the per-case log contains exactly the events produced while this case ran,
/// independent of whatever global subscriber is installed.
pub struct CaseLogGuard {
    path: Utf8PathBuf,
    file: Mutex<File>,
}

impl CaseLogGuard {
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut file = self.file.lock().expect("case log mutex poisoned");
        writeln!(file, "{line}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_log_file_is_created_under_the_run_folder() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let folder = RunLogFolder::new(root, "20260101T000000", false).unwrap();
        let guard = folder.open_case_log("suite", "CaseOne").unwrap();
        guard.write_line("hello").unwrap();
        assert!(guard.path().exists());
        assert!(guard.path().as_str().ends_with("suite/CaseOne.log"));
    }

    #[test]
    fn archive_zips_and_removes_raw_logs() {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let folder = RunLogFolder::new(root, "20260101T000000", true).unwrap();
        let guard = folder.open_case_log("suite", "CaseOne").unwrap();
        guard.write_line("hello").unwrap();
        drop(guard);

        let archive_path = folder.archive().unwrap();
        assert!(archive_path.exists());
        assert!(archive_path.as_str().contains("achieved_logs_"));

        let mut remaining = Vec::new();
        collect_log_files(folder.root(), &mut remaining).unwrap();
        assert!(remaining.is_empty(), "raw logs must be deleted after archival");
    }
}
