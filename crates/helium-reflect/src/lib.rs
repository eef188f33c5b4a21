// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # helium-reflect
//!
//! Runtime type registry and object serialization.
//!
//! Types describe their fields once, through [`Reflect::enumerate`]; the
//! [`Registry`] turns that into [`Class`] descriptors which the archives walk
//! to write and read objects in a little-endian binary format or in XML.
//!
//! ## Quick Start
//!
//! ```rust
//! use helium_reflect::{archive, Compositor, FieldFlags, Reflect, Registry};
//!
//! #[derive(Debug, Default)]
//! struct Asset {
//!     version: i32,
//!     name: String,
//! }
//!
//! impl Reflect for Asset {
//!     const TYPE_NAME: &'static str = "Asset";
//!
//!     fn enumerate(c: &mut Compositor<Self>) {
//!         c.add_field_with_flags("version", FieldFlags::FORCE, |a| &a.version, |a| &mut a.version)
//!             .add_field("name", |a| &a.name, |a| &mut a.name);
//!     }
//! }
//!
//! let registry = Registry::new();
//! registry.register_type::<Asset>()?;
//!
//! let asset = Asset { version: 3, name: "rock".into() };
//! let bytes = archive::to_binary(&registry, &asset)?;
//! let back = archive::from_binary(&registry, &bytes, "Asset")?;
//! assert_eq!(back.downcast_ref::<Asset>().map(|a| a.version), Some(3));
//! # Ok::<(), helium_reflect::ReflectError>(())
//! ```
//!
//! ## Modules
//!
//! - [`object`]: `Object`/`Reflect` traits, `ObjectPtr`, `WeakObjectPtr`
//! - [`registry`]: type registry (lock-free lookups)
//! - [`class`]: class descriptors and the `Compositor`
//! - [`field`]: field descriptors and value conversions
//! - [`archive`]: binary and text archives
//! - [`visitor`]: read-only traversal of object graphs

pub mod archive;
pub mod class;
pub mod config;
pub mod enumeration;
pub mod error;
pub mod field;
pub mod object;
pub mod registry;
pub mod value;
pub mod version;
pub mod visitor;

mod serializer;

#[cfg(test)]
mod testing;

pub use archive::{
    from_binary, from_text, load_file, save_file, to_binary, to_text, Archive, ArchiveFormat,
    ArchiveMode, ArchiveState, BinaryArchive, TextArchive,
};
pub use class::{create_default, Class, ClassBuilder, Compositor, Creator};
pub use config::ArchiveOptions;
pub use enumeration::{EnumSymbol, Enumeration, EnumerationBuilder};
pub use error::{Diagnostic, ReflectError, Result};
pub use field::{
    ElementKind, ElementValue, EnumValue, FieldDescriptor, FieldFlags, FieldShape, FieldValue,
    ScalarKind, ScalarValue,
};
pub use object::{upcast, upcast_mut, Object, ObjectPtr, Reflect, TypeId, WeakObjectPtr};
pub use registry::Registry;
pub use value::Value;
pub use version::Version;
pub use visitor::Visitor;
