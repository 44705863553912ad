// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Merging rendered interface files into per-host Ignition documents.
//!
//! The installer leaves one base document per role in the install directory
//! (`bootstrap.ign`, `master.ign`, `worker.ign`). For every host a copy of the
//! role's base is taken, the host's interface files are appended to
//! `storage.files`, and the result is written to `<hostname>.ign`
//! (`bootstrap-node.ign` for the bootstrap host, whose name is also a role).
//!
//! The base documents are only ever read. Each derived document starts from
//! the pristine base, so running the merge again for a host overwrites its
//! document instead of accumulating entries.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::constants::{
    DATA_URL_BASE64_PREFIX, HOST_DOCUMENT_SUFFIX, IFCFG_FILE_MODE, IGNITION_EXTENSION,
    IGNITION_FILESYSTEM,
};
use crate::errors::DocumentIoError;
use crate::ifcfg::RenderedInterface;
use crate::topology::{HostRole, ROLE_RULES};

/// Inline file contents of an Ignition file entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContents {
    pub source: String,
}

/// An Ignition `storage.files` entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub filesystem: String,
    pub path: String,
    pub mode: u32,
    pub contents: FileContents,
}

impl FileEntry {
    /// Entry for a rendered interface, embedded as a base64 data URL.
    #[must_use]
    pub fn from_interface(interface: &RenderedInterface) -> Self {
        Self {
            filesystem: IGNITION_FILESYSTEM.to_string(),
            path: interface.path.clone(),
            mode: IFCFG_FILE_MODE,
            contents: FileContents {
                source: format!("{DATA_URL_BASE64_PREFIX}{}", interface.encoded()),
            },
        }
    }
}

/// Append `entries` to `storage.files` of a copy of `base`.
///
/// Missing `storage` or `storage.files` are created. Existing entries are
/// kept unchanged and new ones follow in the order given.
///
/// # Errors
///
/// Returns [`DocumentIoError::Malformed`] if the root or `storage` is not an
/// object, or if `storage.files` is not an array. `origin` names the document
/// in the error.
pub fn merge_files(
    base: &Value,
    entries: &[FileEntry],
    origin: &str,
) -> Result<Value, DocumentIoError> {
    let malformed = |reason: &str| DocumentIoError::Malformed {
        path: origin.to_string(),
        reason: reason.to_string(),
    };

    let mut document = base.clone();

    let root = document
        .as_object_mut()
        .ok_or_else(|| malformed("document root is not an object"))?;
    let storage = root
        .entry("storage")
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| malformed("'storage' is not an object"))?;
    let files = storage
        .entry("files")
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| malformed("'storage.files' is not an array"))?;

    for entry in entries {
        let value = serde_json::to_value(entry).map_err(|e| malformed(&e.to_string()))?;
        files.push(value);
    }

    Ok(document)
}

/// Reads role base documents from an install directory and writes per-host
/// documents next to them.
#[derive(Clone, Debug)]
pub struct IgnitionMerger {
    install_dir: PathBuf,
}

impl IgnitionMerger {
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            install_dir: install_dir.into(),
        }
    }

    /// Path of the base document for `role`.
    #[must_use]
    pub fn base_path(&self, role: HostRole) -> PathBuf {
        self.document_path(role.as_str())
    }

    /// Path of the derived document for `hostname`.
    ///
    /// A hostname equal to a role name (the `bootstrap` host) would land on
    /// that role's base document, so it gets [`HOST_DOCUMENT_SUFFIX`] appended.
    #[must_use]
    pub fn host_path(&self, hostname: &str) -> PathBuf {
        if ROLE_RULES.iter().any(|rule| rule.role.as_str() == hostname) {
            self.document_path(&format!("{hostname}{HOST_DOCUMENT_SUFFIX}"))
        } else {
            self.document_path(hostname)
        }
    }

    fn document_path(&self, stem: &str) -> PathBuf {
        self.install_dir.join(format!("{stem}.{IGNITION_EXTENSION}"))
    }

    /// Load the base document for `role`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentIoError::ReadFailed`] if the document is missing,
    /// unreadable or not JSON.
    pub fn load_base(&self, role: HostRole, hostname: &str) -> Result<Value, DocumentIoError> {
        let path = self.base_path(role);
        let read_failed = |reason: String| DocumentIoError::ReadFailed {
            role: role.to_string(),
            host: hostname.to_string(),
            path: path.display().to_string(),
            reason,
        };

        let content = fs::read_to_string(&path).map_err(|e| read_failed(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| read_failed(e.to_string()))
    }

    /// Write the derived document for `hostname`, starting from the `role`
    /// base document and appending one file entry per interface.
    ///
    /// Returns the path written.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentIoError`] if the base cannot be read, is malformed,
    /// or the output cannot be written.
    pub fn materialize(
        &self,
        role: HostRole,
        hostname: &str,
        interfaces: &[RenderedInterface],
    ) -> Result<PathBuf, DocumentIoError> {
        let base = self.load_base(role, hostname)?;
        let entries: Vec<FileEntry> = interfaces.iter().map(FileEntry::from_interface).collect();

        let base_path = self.base_path(role);
        let document = merge_files(&base, &entries, &base_path.display().to_string())?;

        let path = self.host_path(hostname);
        let write_failed = |reason: String| DocumentIoError::WriteFailed {
            host: hostname.to_string(),
            path: path.display().to_string(),
            reason,
        };

        let content = serde_json::to_string(&document).map_err(|e| write_failed(e.to_string()))?;
        fs::write(&path, content).map_err(|e| write_failed(e.to_string()))?;

        debug!(
            "Appended {} file entries to {} base for {}",
            entries.len(),
            role,
            hostname
        );
        info!("Wrote Ignition document {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
#[path = "ignition_tests.rs"]
mod ignition_tests;
