// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

mod types;

use helium_reflect::{Archive, TextArchive};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Text archives are UTF-8 XML
    if let Ok(xml) = std::str::from_utf8(data) {
        let registry = types::registry();

        let mut archive = TextArchive::reader(xml);
        if archive.open().is_ok() {
            while let Ok(false) = archive.at_end() {
                if archive.read_object(registry, None).is_err() {
                    break;
                }
            }
        }
    }
});
