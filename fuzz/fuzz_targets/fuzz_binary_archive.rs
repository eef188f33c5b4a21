// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

mod types;

use helium_reflect::{Archive, ArchiveOptions, BinaryArchive};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let registry = types::registry();

    // Fuzz the checked path (header, checksum)
    let _ = helium_reflect::from_binary(registry, data, "Node");

    // Fuzz the decoder itself, every record until the first error
    let options = ArchiveOptions::new().with_checksum_verification(false);
    let mut archive = BinaryArchive::reader(data).with_options(options);
    if archive.open().is_ok() {
        while let Ok(false) = archive.at_end() {
            if archive.read_object(registry, Some("Node")).is_err() {
                break;
            }
        }
    }
});
