// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Archive format constants and runtime options.
//!
//! Every magic number of the binary and text formats lives here.
//! **Never hardcode them elsewhere!**
//!
//! # Binary header layout
//!
//! ```text
//! +------------------+------------------+------------------+
//! | BOM u16 (0xFEFF) | version u32 (LE) | CRC-32 u32 (LE)  |
//! +------------------+------------------+------------------+
//! | record stream ...                                      |
//! +--------------------------------------------------------+
//! ```

/// Byte-order mark written first in every binary archive.
pub const BYTE_ORDER_MARK: u16 = 0xFEFF;

/// Current archive format version (binary and text).
///
/// Readers accept any version up to and including this one.
pub const CURRENT_VERSION: u32 = 7;

/// Checksum value meaning "no checksum, skip verification".
pub const CRC_DEFAULT: u32 = 0x1010_1010;

/// Checksum placeholder written while an archive is still being written.
///
/// Reading it back means the writer never reached `close()`.
pub const CRC_INVALID: u32 = 0xFFFF_FFFF;

/// Size of the binary header in bytes.
pub const HEADER_SIZE: usize = 10;

/// Byte offset of the checksum inside the binary header.
pub const CRC_OFFSET: usize = 6;

/// Type-id written for an absent (null) object reference.
pub const NULL_TYPE_ID: u32 = 0;

/// Default upper bound on container element counts accepted by readers.
pub const DEFAULT_MAX_CONTAINER_LEN: u32 = 16 * 1024 * 1024;

/// Default upper bound on object nesting accepted by readers; the root
/// object is depth 1.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default indentation width of the text format.
pub const DEFAULT_INDENT: usize = 2;

/// File extension of binary archives.
pub const BINARY_EXTENSION: &str = "rb";

/// File extension of text archives.
pub const TEXT_EXTENSION: &str = "rx";

/// Root element of the text format.
pub const TEXT_ROOT_TAG: &str = "Reflect";

/// Version attribute of the text root element.
pub const TEXT_VERSION_ATTR: &str = "FileFormatVersion";

/// Options shared by binary and text archives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveOptions {
    /// Verify the binary checksum on open.
    pub verify_checksum: bool,
    /// Reject containers with more elements than this.
    pub max_container_len: u32,
    /// Reject records whose objects nest deeper than this.
    pub max_depth: usize,
    /// Spaces per nesting level in text output.
    pub indent: usize,
}

impl ArchiveOptions {
    /// Options with every setting at its default.
    pub fn new() -> Self {
        Self {
            verify_checksum: true,
            max_container_len: DEFAULT_MAX_CONTAINER_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
            indent: DEFAULT_INDENT,
        }
    }

    /// Enable or disable checksum verification.
    pub fn with_checksum_verification(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }

    /// Set the container length guard.
    pub fn with_max_container_len(mut self, max: u32) -> Self {
        self.max_container_len = max;
        self
    }

    /// Set the object nesting guard.
    pub fn with_max_depth(mut self, max: usize) -> Self {
        self.max_depth = max;
        self
    }

    /// Set the text indentation width.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self::new()
    }
}
