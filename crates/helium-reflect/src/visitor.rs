// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read-only traversal of object graphs.
//!
//! [`Registry::visit`](crate::Registry::visit) walks an object through its
//! descriptors: the object itself, then every field in serialization order,
//! descending into sub-objects held directly, in sequences and in map
//! values. Discarded fields are visited too; check
//! [`FieldDescriptor::is_discarded`] to skip them.
//!
//! # Example
//! ```ignore
//! struct TypeCounter(BTreeMap<String, usize>);
//!
//! impl Visitor for TypeCounter {
//!     fn visit_object(&mut self, _object: &dyn Object, class: &Class) -> bool {
//!         *self.0.entry(class.name().to_string()).or_default() += 1;
//!         true
//!     }
//! }
//! ```

use crate::class::Class;
use crate::error::Result;
use crate::field::FieldDescriptor;
use crate::object::Object;
use crate::registry::Registry;
use crate::value::Value;

/// Callbacks for [`Registry::visit`].
///
/// Every method has a default that continues the walk, so implementors
/// override only what they inspect.
pub trait Visitor {
    /// Called once per object, before its fields. Return `false` to skip
    /// the fields (and everything below them).
    fn visit_object(&mut self, _object: &dyn Object, _class: &Class) -> bool {
        true
    }

    /// Called once per field with its current value. Return `false` to
    /// keep the walk out of the sub-objects the field holds.
    fn visit_field(&mut self, _object: &dyn Object, _field: &FieldDescriptor, _value: &Value) -> bool {
        true
    }

    /// Called after the fields of an object were visited.
    fn leave_object(&mut self, _object: &dyn Object, _class: &Class) {}
}

impl Registry {
    /// Walk `object` and everything it references.
    pub fn visit(&self, object: &dyn Object, visitor: &mut dyn Visitor) -> Result<()> {
        let class = self.class_of(object)?;
        if !visitor.visit_object(object, &class) {
            return Ok(());
        }
        for field in class.fields() {
            let value = field
                .get(object)
                .map_err(|e| e.in_field(class.name(), field.name()))?;
            if visitor.visit_field(object, field, &value) {
                self.visit_value(&value, visitor)
                    .map_err(|e| e.in_field(class.name(), field.name()))?;
            }
        }
        visitor.leave_object(object, &class);
        Ok(())
    }

    fn visit_value(&self, value: &Value, visitor: &mut dyn Visitor) -> Result<()> {
        match value {
            Value::Object(Some(ptr)) => self.visit(ptr.as_object(), visitor),
            Value::Sequence(items) => items
                .iter()
                .try_for_each(|item| self.visit_value(item, visitor)),
            Value::Map(entries) => entries
                .iter()
                .try_for_each(|(_, v)| self.visit_value(v, visitor)),
            _ => Ok(()),
        }
    }
}
