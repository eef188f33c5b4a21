// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Built-in version stamp.

use crate::class::Compositor;
use crate::field::FieldFlags;
use crate::object::Reflect;

/// Version stamp written at the head of versioned documents.
///
/// Both fields are forced so a reader always finds them, and in the binary
/// format they are the first values after the root type-id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Version {
    /// Tool that produced the document.
    pub source: String,
    /// Version of that tool.
    pub source_version: String,
}

impl Version {
    pub fn new(source: impl Into<String>, source_version: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            source_version: source_version.into(),
        }
    }

    /// Stamp for this library.
    pub fn current() -> Self {
        Self::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }
}

impl Reflect for Version {
    const TYPE_NAME: &'static str = "Version";

    fn enumerate(c: &mut Compositor<Self>) {
        c.add_field_with_flags(
            "source",
            FieldFlags::FORCE,
            |v| &v.source,
            |v| &mut v.source,
        )
        .add_field_with_flags(
            "source_version",
            FieldFlags::FORCE,
            |v| &v.source_version,
            |v| &mut v.source_version,
        );
    }
}
