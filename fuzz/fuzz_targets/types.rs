// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

// Self-referential sample types shared by the archive targets.

use helium_reflect::{Compositor, Object, ObjectPtr, Reflect, Registry};
use std::collections::BTreeMap;
use std::sync::OnceLock;

#[derive(Debug, Default)]
pub struct Node {
    pub name: String,
    pub weight: f64,
    pub flags: u32,
    pub tags: Vec<String>,
    pub children: Vec<ObjectPtr>,
    pub links: BTreeMap<u32, ObjectPtr>,
    pub next: Option<ObjectPtr>,
}

impl Reflect for Node {
    const TYPE_NAME: &'static str = "Node";

    fn enumerate(c: &mut Compositor<Self>) {
        c.add_field("name", |n| &n.name, |n| &mut n.name)
            .add_field("weight", |n| &n.weight, |n| &mut n.weight)
            .add_field("flags", |n| &n.flags, |n| &mut n.flags)
            .add_field("tags", |n| &n.tags, |n| &mut n.tags)
            .add_field("children", |n| &n.children, |n| &mut n.children)
            .add_field("links", |n| &n.links, |n| &mut n.links)
            .add_field("next", |n| &n.next, |n| &mut n.next);
    }
}

#[derive(Debug, Default)]
pub struct Leaf {
    pub base: Node,
    pub value: i64,
}

impl Reflect for Leaf {
    const TYPE_NAME: &'static str = "Leaf";
    const PARENT: Option<&'static str> = Some("Node");

    fn enumerate(c: &mut Compositor<Self>) {
        c.add_field("value", |l| &l.value, |l| &mut l.value);
    }

    fn base(&self) -> Option<&dyn Object> {
        Some(&self.base)
    }

    fn base_mut(&mut self) -> Option<&mut dyn Object> {
        Some(&mut self.base)
    }
}

pub fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let registry = Registry::with_builtins().expect("builtins");
        registry.register_type::<Node>().expect("Node");
        registry.register_type::<Leaf>().expect("Leaf");
        registry.freeze();
        registry
    })
}
