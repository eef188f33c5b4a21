// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Archives: read/write cursors over binary or text backing stores.
//!
//! # Lifecycle
//!
//! ```text
//! Closed --open()--> Open --close()--> Closed
//! ```
//!
//! Reads and writes on a closed archive fail with `ArchiveNotOpen`. Opening
//! an open archive, or closing a closed one, fails with `InvalidState`.
//!
//! # Quick start
//!
//! ```rust,ignore
//! let registry = Registry::with_builtins()?;
//! let bytes = archive::to_binary(&registry, &Version::current())?;
//! let back = archive::from_binary(&registry, &bytes, "Version")?;
//! ```

pub mod binary;
pub mod text;

pub use binary::BinaryArchive;
pub use text::TextArchive;

use crate::config::{ArchiveOptions, BINARY_EXTENSION, TEXT_EXTENSION};
use crate::error::{Diagnostic, ReflectError, Result};
use crate::object::{Object, ObjectPtr};
use crate::registry::Registry;
use std::path::{Path, PathBuf};

/// Direction of an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveMode {
    Read,
    Write,
}

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveState {
    Closed,
    Open,
}

/// Encoding of an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// Little-endian, descriptor-ordered, no field names.
    Binary,
    /// Field-name-tagged XML.
    Text,
}

impl ArchiveFormat {
    /// Pick the format from a file extension (`.rb` or `.rx`).
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case(BINARY_EXTENSION) => Ok(Self::Binary),
            Some(ext) if ext.eq_ignore_ascii_case(TEXT_EXTENSION) => Ok(Self::Text),
            _ => Err(ReflectError::InvalidFormat(format!(
                "no archive format for {}",
                path.display()
            ))),
        }
    }

    /// File extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Binary => BINARY_EXTENSION,
            Self::Text => TEXT_EXTENSION,
        }
    }
}

/// Backing store of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Store {
    Memory,
    File(PathBuf),
}

/// A read or write cursor over a sequence of root objects.
pub trait Archive {
    fn format(&self) -> ArchiveFormat;

    fn mode(&self) -> ArchiveMode;

    fn state(&self) -> ArchiveState;

    fn is_open(&self) -> bool {
        self.state() == ArchiveState::Open
    }

    /// Open the archive. In read mode this loads and validates the store.
    fn open(&mut self) -> Result<()>;

    /// Close the archive. In write mode this finalizes the store.
    fn close(&mut self) -> Result<()>;

    /// Append one root object.
    ///
    /// On error nothing is appended.
    fn write_object(&mut self, registry: &Registry, object: &dyn Object) -> Result<()>;

    /// Read the next root object.
    ///
    /// The result must be `expected` or derive from it. Binary archives
    /// require `expected`. On error the cursor does not move and nothing is
    /// published.
    fn read_object(&mut self, registry: &Registry, expected: Option<&str>) -> Result<ObjectPtr>;

    /// True when a read archive has no more root objects.
    fn at_end(&self) -> Result<bool>;

    /// Diagnostics collected so far.
    fn diagnostics(&self) -> &[Diagnostic];

    /// Drain the collected diagnostics.
    fn take_diagnostics(&mut self) -> Vec<Diagnostic>;
}

pub(crate) fn require_open(state: ArchiveState) -> Result<()> {
    match state {
        ArchiveState::Open => Ok(()),
        ArchiveState::Closed => Err(ReflectError::ArchiveNotOpen),
    }
}

pub(crate) fn require_mode(actual: ArchiveMode, wanted: ArchiveMode) -> Result<()> {
    match (actual, wanted) {
        (a, w) if a == w => Ok(()),
        (ArchiveMode::Read, _) => Err(ReflectError::InvalidState("archive is open for reading")),
        (ArchiveMode::Write, _) => Err(ReflectError::InvalidState("archive is open for writing")),
    }
}

/// File-backed archive in the format matching the path's extension.
pub fn for_path(
    path: impl AsRef<Path>,
    mode: ArchiveMode,
    options: ArchiveOptions,
) -> Result<Box<dyn Archive>> {
    let path = path.as_ref();
    Ok(match (ArchiveFormat::from_path(path)?, mode) {
        (ArchiveFormat::Binary, ArchiveMode::Read) => {
            Box::new(BinaryArchive::file_reader(path).with_options(options))
        }
        (ArchiveFormat::Binary, ArchiveMode::Write) => {
            Box::new(BinaryArchive::file_writer(path).with_options(options))
        }
        (ArchiveFormat::Text, ArchiveMode::Read) => {
            Box::new(TextArchive::file_reader(path).with_options(options))
        }
        (ArchiveFormat::Text, ArchiveMode::Write) => {
            Box::new(TextArchive::file_writer(path).with_options(options))
        }
    })
}

/// Serialize one object to binary bytes.
pub fn to_binary(registry: &Registry, object: &dyn Object) -> Result<Vec<u8>> {
    let mut archive = BinaryArchive::writer();
    archive.open()?;
    archive.write_object(registry, object)?;
    archive.close()?;
    archive.into_bytes()
}

/// Deserialize one object of type `expected` (or a descendant) from binary
/// bytes.
pub fn from_binary(registry: &Registry, bytes: &[u8], expected: &str) -> Result<ObjectPtr> {
    let mut archive = BinaryArchive::reader(bytes.to_vec());
    archive.open()?;
    let object = archive.read_object(registry, Some(expected))?;
    archive.close()?;
    Ok(object)
}

/// Serialize one object to XML text.
pub fn to_text(registry: &Registry, object: &dyn Object) -> Result<String> {
    let mut archive = TextArchive::writer();
    archive.open()?;
    archive.write_object(registry, object)?;
    archive.close()?;
    archive.into_string()
}

/// Deserialize the first object from XML text.
pub fn from_text(registry: &Registry, text: &str, expected: Option<&str>) -> Result<ObjectPtr> {
    let mut archive = TextArchive::reader(text);
    archive.open()?;
    let object = archive.read_object(registry, expected)?;
    archive.close()?;
    Ok(object)
}

/// Write one object to `path`, choosing the format from the extension.
pub fn save_file(registry: &Registry, path: impl AsRef<Path>, object: &dyn Object) -> Result<()> {
    let mut archive = for_path(path, ArchiveMode::Write, ArchiveOptions::default())?;
    archive.open()?;
    archive.write_object(registry, object)?;
    archive.close()
}

/// Read the first object from `path`, choosing the format from the
/// extension.
pub fn load_file(
    registry: &Registry,
    path: impl AsRef<Path>,
    expected: Option<&str>,
) -> Result<ObjectPtr> {
    let mut archive = for_path(path, ArchiveMode::Read, ArchiveOptions::default())?;
    archive.open()?;
    let object = archive.read_object(registry, expected)?;
    archive.close()?;
    Ok(object)
}
