// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// File-backed archives selected by extension.

mod common;

use common::*;
use helium_reflect::archive::{self, for_path};
use helium_reflect::{ArchiveFormat, ArchiveMode, ArchiveOptions, ReflectError, Version};
use std::fs;
use tempfile::TempDir;

#[test]
fn save_and_load_binary_file() {
    let registry = registry();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rock.rb");

    archive::save_file(&registry, &path, &sample_model()).unwrap();
    let raw = fs::read(&path).unwrap();
    assert_eq!(&raw[0..2], &[0xFF, 0xFE]);

    let back = archive::load_file(&registry, &path, Some("Model")).unwrap();
    assert!(registry.equals(&sample_model(), back.as_object()).unwrap());
}

#[test]
fn save_and_load_text_file() {
    let registry = registry();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("level.RX");

    archive::save_file(&registry, &path, &sample_scene()).unwrap();
    let raw = fs::read_to_string(&path).unwrap();
    assert!(raw.contains("<Reflect FileFormatVersion=\"7\">"));

    let back = archive::load_file(&registry, &path, None).unwrap();
    assert_eq!(back.class_name(), "Scene");
    assert!(registry.equals(&sample_scene(), back.as_object()).unwrap());
}

#[test]
fn unknown_extension_is_rejected() {
    let registry = registry();
    let dir = TempDir::new().unwrap();

    for name in ["scene.xml", "scene", "scene.rbx"] {
        let path = dir.path().join(name);
        assert!(matches!(
            archive::save_file(&registry, &path, &sample_scene()),
            Err(ReflectError::InvalidFormat(_))
        ));
        assert!(!path.exists());
    }
    assert_eq!(
        ArchiveFormat::from_path(&dir.path().join("a.rb")).unwrap(),
        ArchiveFormat::Binary
    );
}

#[test]
fn missing_file_is_an_io_error() {
    let registry = registry();
    let dir = TempDir::new().unwrap();

    for name in ["absent.rb", "absent.rx"] {
        assert!(matches!(
            archive::load_file(&registry, dir.path().join(name), Some("Scene")),
            Err(ReflectError::Io(_))
        ));
    }
}

#[test]
fn several_objects_per_file() {
    let registry = registry();
    let dir = TempDir::new().unwrap();

    for name in ["bundle.rb", "bundle.rx"] {
        let path = dir.path().join(name);

        let mut out = for_path(&path, ArchiveMode::Write, ArchiveOptions::default()).unwrap();
        out.open().unwrap();
        out.write_object(&registry, &Version::new("bundler", "1.0"))
            .unwrap();
        out.write_object(&registry, &sample_model()).unwrap();
        out.write_object(&registry, circle("marker", 0.25).as_object())
            .unwrap();
        out.close().unwrap();

        let mut input = for_path(&path, ArchiveMode::Read, ArchiveOptions::default()).unwrap();
        input.open().unwrap();
        let version = input.read_object(&registry, Some("Version")).unwrap();
        assert_eq!(
            version.downcast_ref::<Version>().map(|v| v.source.as_str()),
            Some("bundler")
        );
        let model = input.read_object(&registry, Some("Asset")).unwrap();
        assert_eq!(model.class_name(), "Model");
        let marker = input.read_object(&registry, Some("Shape")).unwrap();
        assert_eq!(marker.downcast_ref::<Circle>().map(|c| c.radius), Some(0.25));
        assert!(input.at_end().unwrap(), "{}", name);
        input.close().unwrap();
    }
}

#[test]
fn unclosed_binary_writer_leaves_no_file() {
    let registry = registry();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("partial.rb");

    let mut out = for_path(&path, ArchiveMode::Write, ArchiveOptions::default()).unwrap();
    out.open().unwrap();
    out.write_object(&registry, &sample_model()).unwrap();
    drop(out);

    assert!(!path.exists());
}
