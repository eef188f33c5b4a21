// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sample types for unit tests.

use crate::class::Compositor;
use crate::enumeration::{Enumeration, EnumerationBuilder};
use crate::error::Result;
use crate::field::FieldFlags;
use crate::object::{Object, ObjectPtr, Reflect};
use crate::registry::Registry;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

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

pub fn register_shapes(registry: &Registry) -> Result<()> {
    registry.register_type::<Shape>()?;
    registry.register_type::<Circle>()?;
    registry.register_type::<Square>()?;
    Ok(())
}

pub fn mode_table() -> Arc<Enumeration> {
    static TABLE: OnceLock<Arc<Enumeration>> = OnceLock::new();
    TABLE
        .get_or_init(|| {
            EnumerationBuilder::new("Mode")
                .symbol("IDLE")
                .symbol("RUNNING")
                .symbol("STOPPED")
                .build()
                .expect("enumeration table")
        })
        .clone()
}

pub fn access_table() -> Arc<Enumeration> {
    static TABLE: OnceLock<Arc<Enumeration>> = OnceLock::new();
    TABLE
        .get_or_init(|| {
            EnumerationBuilder::new("Access")
                .symbol_value("NONE", 0)
                .flag("READ", 0)
                .flag("WRITE", 1)
                .build()
                .expect("enumeration table")
        })
        .clone()
}

/// One field of every shape.
#[derive(Debug, Default)]
pub struct Gadget {
    pub enabled: bool,
    pub count: u8,
    pub offset: i16,
    pub serial: u64,
    pub delta: i64,
    pub ratio: f64,
    pub label: String,
    pub mode: u32,
    pub access: u32,
    pub tags: Vec<String>,
    pub weights: BTreeMap<u32, f32>,
    pub shapes: Vec<ObjectPtr>,
    pub named: BTreeMap<String, ObjectPtr>,
    pub part: Option<ObjectPtr>,
    pub scratch: u32,
    pub forced: Vec<u32>,
}

impl Reflect for Gadget {
    const TYPE_NAME: &'static str = "Gadget";

    fn enumerate(c: &mut Compositor<Self>) {
        c.add_field("enabled", |g| &g.enabled, |g| &mut g.enabled)
            .add_field("count", |g| &g.count, |g| &mut g.count)
            .add_field("offset", |g| &g.offset, |g| &mut g.offset)
            .add_field("serial", |g| &g.serial, |g| &mut g.serial)
            .add_field("delta", |g| &g.delta, |g| &mut g.delta)
            .add_field("ratio", |g| &g.ratio, |g| &mut g.ratio)
            .add_field("label", |g| &g.label, |g| &mut g.label)
            .add_enumeration_field("mode", mode_table(), |g| &g.mode, |g| &mut g.mode)
            .add_bitfield_field("access", access_table(), |g| &g.access, |g| &mut g.access)
            .add_field("tags", |g| &g.tags, |g| &mut g.tags)
            .add_field("weights", |g| &g.weights, |g| &mut g.weights)
            .add_field("shapes", |g| &g.shapes, |g| &mut g.shapes)
            .add_field("named", |g| &g.named, |g| &mut g.named)
            .add_field("part", |g| &g.part, |g| &mut g.part)
            .add_field_with_flags(
                "scratch",
                FieldFlags::DISCARD,
                |g| &g.scratch,
                |g| &mut g.scratch,
            )
            .add_field_with_flags(
                "forced",
                FieldFlags::FORCE,
                |g| &g.forced,
                |g| &mut g.forced,
            );
    }
}

pub fn test_registry() -> Registry {
    let registry = Registry::new();
    register_shapes(&registry).expect("shapes");
    registry.register_type::<Gadget>().expect("gadget");
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

/// A gadget with every field set to a non-default value.
pub fn full_gadget() -> Gadget {
    let mut weights = BTreeMap::new();
    weights.insert(3, 0.5);
    weights.insert(1, -2.25);
    let mut named = BTreeMap::new();
    named.insert("first".to_string(), square("sq", 4.0));
    Gadget {
        enabled: true,
        count: 200,
        offset: -1234,
        serial: u64::MAX - 1,
        delta: i64::MIN + 7,
        ratio: 0.1,
        label: "a <b> & \"c\"\nline".into(),
        mode: 2,
        access: 0b11,
        tags: vec!["x".into(), String::new(), "z".into()],
        weights,
        shapes: vec![circle("c1", 1.5), square("s1", 2.5)],
        named,
        part: Some(circle("part", 9.0)),
        scratch: 77,
        forced: Vec::new(),
    }
}

/// A chain of gadgets linked through `part`, `levels` objects deep.
pub fn nested_gadget(levels: usize) -> Gadget {
    let mut gadget = Gadget::default();
    for _ in 1..levels {
        gadget = Gadget {
            part: Some(ObjectPtr::new(gadget)),
            ..Gadget::default()
        };
    }
    gadget
}
