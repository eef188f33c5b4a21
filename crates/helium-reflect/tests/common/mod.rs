// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sample types shared by the integration tests.

#![allow(dead_code)]

use helium_reflect::{
    Compositor, EnumValue, Enumeration, EnumerationBuilder, FieldFlags, Object, ObjectPtr,
    Reflect, Registry,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ===================================================================
// Assets
// ===================================================================

#[derive(Debug, Default, Clone)]
pub struct Asset {
    pub version: i32,
}

impl Reflect for Asset {
    const TYPE_NAME: &'static str = "Asset";

    fn enumerate(c: &mut Compositor<Self>) {
        c.add_field_with_flags(
            "version",
            FieldFlags::FORCE,
            |a| &a.version,
            |a| &mut a.version,
        );
    }
}

#[derive(Debug, Default)]
pub struct Model {
    pub base: Asset,
    pub mesh_path: String,
    pub lod_distances: Vec<f32>,
    pub tags: BTreeMap<String, u32>,
    pub material: Option<ObjectPtr>,
}

impl Reflect for Model {
    const TYPE_NAME: &'static str = "Model";
    const PARENT: Option<&'static str> = Some("Asset");

    fn enumerate(c: &mut Compositor<Self>) {
        c.add_field("mesh_path", |m| &m.mesh_path, |m| &mut m.mesh_path)
            .add_field("lod_distances", |m| &m.lod_distances, |m| &mut m.lod_distances)
            .add_field("tags", |m| &m.tags, |m| &mut m.tags)
            .add_field("material", |m| &m.material, |m| &mut m.material);
    }

    fn base(&self) -> Option<&dyn Object> {
        Some(&self.base)
    }

    fn base_mut(&mut self) -> Option<&mut dyn Object> {
        Some(&mut self.base)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFormat {
    #[default]
    Rgba8,
    Bc1,
    Bc7,
    Other(u32),
}

impl EnumValue for TextureFormat {
    fn to_raw(&self) -> u32 {
        match self {
            Self::Rgba8 => 0,
            Self::Bc1 => 1,
            Self::Bc7 => 7,
            Self::Other(raw) => *raw,
        }
    }

    fn from_raw(raw: u32) -> Self {
        match raw {
            0 => Self::Rgba8,
            1 => Self::Bc1,
            7 => Self::Bc7,
            other => Self::Other(other),
        }
    }
}

pub fn texture_format_table() -> Arc<Enumeration> {
    static TABLE: OnceLock<Arc<Enumeration>> = OnceLock::new();
    TABLE
        .get_or_init(|| {
            EnumerationBuilder::new("TextureFormat")
                .symbol("RGBA8")
                .symbol("BC1")
                .symbol_value("BC7", 7)
                .build()
                .expect("enumeration table")
        })
        .clone()
}

pub const USAGE_SAMPLED: u32 = 1 << 0;
pub const USAGE_RENDER_TARGET: u32 = 1 << 1;
pub const USAGE_STREAMED: u32 = 1 << 2;

pub fn texture_usage_table() -> Arc<Enumeration> {
    static TABLE: OnceLock<Arc<Enumeration>> = OnceLock::new();
    TABLE
        .get_or_init(|| {
            EnumerationBuilder::new("TextureUsage")
                .symbol_value("NONE", 0)
                .flag("SAMPLED", 0)
                .flag("RENDER_TARGET", 1)
                .flag("STREAMED", 2)
                .build()
                .expect("enumeration table")
        })
        .clone()
}

pub static TEXTURES_SERIALIZED: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Default)]
pub struct Texture {
    pub base: Asset,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: u32,
    /// Derived on load, never stored.
    pub texel_count: u64,
}

impl Reflect for Texture {
    const TYPE_NAME: &'static str = "Texture";
    const PARENT: Option<&'static str> = Some("Asset");

    fn enumerate(c: &mut Compositor<Self>) {
        c.add_field("width", |t| &t.width, |t| &mut t.width)
            .add_field("height", |t| &t.height, |t| &mut t.height)
            .add_enumeration_field(
                "format",
                texture_format_table(),
                |t| &t.format,
                |t| &mut t.format,
            )
            .add_bitfield_field(
                "usage",
                texture_usage_table(),
                |t| &t.usage,
                |t| &mut t.usage,
            );
    }

    fn base(&self) -> Option<&dyn Object> {
        Some(&self.base)
    }

    fn base_mut(&mut self) -> Option<&mut dyn Object> {
        Some(&mut self.base)
    }

    fn pre_serialize(&self) {
        TEXTURES_SERIALIZED.fetch_add(1, Ordering::Relaxed);
    }

    fn post_deserialize(&mut self) {
        self.texel_count = u64::from(self.width) * u64::from(self.height);
    }
}

// ===================================================================
// Shapes
// ===================================================================

#[derive(Debug, Default)]
pub struct Shape {
    pub name: String,
}

impl Reflect for Shape {
    const TYPE_NAME: &'static str = "Shape";

    fn enumerate(c: &mut Compositor<Self>) {
        c.add_field("name", |s| &s.name, |s| &mut s.name);
    }
}

#[derive(Debug, Default)]
pub struct Circle {
    pub base: Shape,
    pub radius: f32,
}

impl Reflect for Circle {
    const TYPE_NAME: &'static str = "Circle";
    const PARENT: Option<&'static str> = Some("Shape");

    fn enumerate(c: &mut Compositor<Self>) {
        c.add_field("radius", |s| &s.radius, |s| &mut s.radius);
    }

    fn base(&self) -> Option<&dyn Object> {
        Some(&self.base)
    }

    fn base_mut(&mut self) -> Option<&mut dyn Object> {
        Some(&mut self.base)
    }
}

#[derive(Debug, Default)]
pub struct Square {
    pub base: Shape,
    pub side: f64,
}

impl Reflect for Square {
    const TYPE_NAME: &'static str = "Square";
    const PARENT: Option<&'static str> = Some("Shape");

    fn enumerate(c: &mut Compositor<Self>) {
        c.add_field("side", |s| &s.side, |s| &mut s.side);
    }

    fn base(&self) -> Option<&dyn Object> {
        Some(&self.base)
    }

    fn base_mut(&mut self) -> Option<&mut dyn Object> {
        Some(&mut self.base)
    }
}

/// Root document holding polymorphic shapes.
#[derive(Debug, Default)]
pub struct Scene {
    pub base: Asset,
    pub shapes: Vec<ObjectPtr>,
    pub by_name: BTreeMap<String, ObjectPtr>,
    pub labels: Vec<String>,
    pub layers: Vec<u32>,
    pub palette: Option<ObjectPtr>,
    pub scratch: u32,
}

impl Reflect for Scene {
    const TYPE_NAME: &'static str = "Scene";
    const PARENT: Option<&'static str> = Some("Asset");

    fn enumerate(c: &mut Compositor<Self>) {
        c.add_field("shapes", |s| &s.shapes, |s| &mut s.shapes)
            .add_field("by_name", |s| &s.by_name, |s| &mut s.by_name)
            .add_field("labels", |s| &s.labels, |s| &mut s.labels)
            .add_field_with_flags("layers", FieldFlags::FORCE, |s| &s.layers, |s| &mut s.layers)
            .add_field_with_flags(
                "palette",
                FieldFlags::SHARE,
                |s| &s.palette,
                |s| &mut s.palette,
            )
            .add_field_with_flags(
                "scratch",
                FieldFlags::DISCARD,
                |s| &s.scratch,
                |s| &mut s.scratch,
            );
    }

    fn base(&self) -> Option<&dyn Object> {
        Some(&self.base)
    }

    fn base_mut(&mut self) -> Option<&mut dyn Object> {
        Some(&mut self.base)
    }
}

// ===================================================================
// Helpers
// ===================================================================

/// Registry with every sample type.
pub fn registry() -> Registry {
    init_logging();
    let registry = Registry::with_builtins().expect("builtins");
    registry.register_type::<Asset>().expect("Asset");
    registry.register_type::<Model>().expect("Model");
    registry.register_type::<Texture>().expect("Texture");
    registry.register_type::<Shape>().expect("Shape");
    registry.register_type::<Circle>().expect("Circle");
    registry.register_type::<Square>().expect("Square");
    registry.register_type::<Scene>().expect("Scene");
    registry
}

pub fn circle(name: &str, radius: f32) -> ObjectPtr {
    ObjectPtr::new(Circle {
        base: Shape { name: name.into() },
        radius,
    })
}

pub fn square(name: &str, side: f64) -> ObjectPtr {
    ObjectPtr::new(Square {
        base: Shape { name: name.into() },
        side,
    })
}

pub fn sample_model() -> Model {
    let mut tags = BTreeMap::new();
    tags.insert("lod".to_string(), 3);
    tags.insert("collision".to_string(), 1);
    Model {
        base: Asset { version: 4 },
        mesh_path: "meshes/rock_01.mesh".into(),
        lod_distances: vec![10.0, 25.5, 80.0],
        tags,
        material: Some(ObjectPtr::new(Texture {
            base: Asset { version: 2 },
            width: 512,
            height: 256,
            format: TextureFormat::Bc7,
            usage: USAGE_SAMPLED | USAGE_STREAMED,
            texel_count: 0,
        })),
    }
}

pub fn sample_scene() -> Scene {
    let mut by_name = BTreeMap::new();
    by_name.insert("sun".to_string(), circle("sun", 100.0));
    by_name.insert("tile".to_string(), square("tile", 0.5));
    Scene {
        base: Asset { version: 1 },
        shapes: vec![circle("c1", 1.0), square("s1", 2.0), circle("c2", 3.0)],
        by_name,
        labels: vec!["outdoor".into(), "day".into()],
        layers: Vec::new(),
        palette: Some(square("palette", 8.0)),
        scratch: 99,
    }
}
