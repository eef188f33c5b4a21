// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error and diagnostic types.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ReflectError>;

/// Errors produced by the registry, descriptors and archives.
#[derive(Debug, Error)]
pub enum ReflectError {
    #[error("type already registered: {0}")]
    DuplicateType(String),

    #[error("type {name} names unregistered parent {parent}")]
    UnknownParent { name: String, parent: String },

    #[error("unknown type: {0}")]
    UnknownType(String),

    #[error("archive is not open")]
    ArchiveNotOpen,

    #[error("unexpected end of stream: need {need} bytes, have {have}")]
    UnexpectedEnd { need: usize, have: usize },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("field {field} declared twice in the {type_name} hierarchy")]
    DuplicateField { type_name: String, field: String },

    #[error("invalid type name: {0:?}")]
    InvalidName(String),

    #[error("invalid archive state: {0}")]
    InvalidState(&'static str),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("invalid archive format: {0}")]
    InvalidFormat(String),

    #[error("unsupported format version {found} (supported up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("registry is frozen")]
    RegistryFrozen,

    #[error("registry has been shut down")]
    RegistryShutdown,

    #[error("XML error: {0}")]
    Xml(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{type_name}.{field}: {source}")]
    Field {
        type_name: String,
        field: String,
        #[source]
        source: Box<ReflectError>,
    },
}

impl ReflectError {
    /// Attach the type and field that were being processed.
    pub fn in_field(self, type_name: &str, field: &str) -> Self {
        Self::Field {
            type_name: type_name.to_string(),
            field: field.to_string(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all field context stripped.
    pub fn root_cause(&self) -> &ReflectError {
        match self {
            Self::Field { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<roxmltree::Error> for ReflectError {
    fn from(e: roxmltree::Error) -> Self {
        Self::Xml(e.to_string())
    }
}

/// Non-fatal conditions reported while reading or writing.
///
/// Diagnostics never abort an operation; the affected value round-trips
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// An enumeration or bitfield value with no matching symbol.
    ///
    /// For bitfields `value` holds only the unknown bits.
    MalformedEnumValue {
        type_name: String,
        field: String,
        enumeration: String,
        value: u32,
    },
    /// A text field tag the type does not declare (skipped).
    UnknownField { type_name: String, field: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedEnumValue {
                type_name,
                field,
                enumeration,
                value,
            } => write!(
                f,
                "{}.{}: value {:#x} has no symbol in enumeration {}",
                type_name, field, value, enumeration
            ),
            Self::UnknownField { type_name, field } => {
                write!(f, "{}: skipped unknown field {}", type_name, field)
            }
        }
    }
}
