// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Class descriptors and the compositor that populates them.
//!
//! A [`Class`] holds its own fields plus the flattened list used for
//! serialization: ancestor-most fields first, then each descendant's own
//! fields in declaration order. The flattened list is computed once when the
//! class is registered.

use crate::enumeration::Enumeration;
use crate::error::{ReflectError, Result};
use crate::field::{
    EnumValue, FieldDescriptor, FieldFlags, FieldShape, FieldValue, Getter, Setter,
};
use crate::object::{upcast, upcast_mut, Object, Reflect, TypeId};
use crate::value::Value;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Default-constructor stored in every class.
pub type Creator = fn() -> Box<dyn Object>;

/// Creator for a [`Reflect`] type.
pub fn create_default<T: Reflect>() -> Box<dyn Object> {
    Box::new(T::default())
}

/// Metadata of one reflected type.
pub struct Class {
    name: String,
    id: TypeId,
    parent: Option<Arc<Class>>,
    own_fields: Vec<Arc<FieldDescriptor>>,
    fields: Vec<Arc<FieldDescriptor>>,
    creator: Creator,
}

impl Class {
    pub(crate) fn new(
        name: String,
        parent: Option<Arc<Class>>,
        own_fields: Vec<Arc<FieldDescriptor>>,
        creator: Creator,
    ) -> Self {
        let mut fields = parent
            .as_ref()
            .map(|p| p.fields.clone())
            .unwrap_or_default();
        fields.extend(own_fields.iter().cloned());
        Self {
            id: TypeId::of_name(&name),
            name,
            parent,
            own_fields,
            fields,
            creator,
        }
    }

    /// Type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type-id.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Parent class.
    pub fn parent(&self) -> Option<&Arc<Class>> {
        self.parent.as_ref()
    }

    /// Fields declared by this type only.
    pub fn own_fields(&self) -> &[Arc<FieldDescriptor>] {
        &self.own_fields
    }

    /// All fields in serialization order.
    pub fn fields(&self) -> &[Arc<FieldDescriptor>] {
        &self.fields
    }

    /// Find a field by name, own fields first, then ancestors.
    pub fn field(&self, name: &str) -> Option<&Arc<FieldDescriptor>> {
        self.fields.iter().rev().find(|f| f.name() == name)
    }

    /// Enumeration tables referenced by the fields of this type and its
    /// ancestors.
    pub fn enumerations(&self) -> Vec<Arc<Enumeration>> {
        let mut tables: Vec<Arc<Enumeration>> = Vec::new();
        for table in self.fields.iter().filter_map(|f| f.shape().enumeration()) {
            if !tables.iter().any(|t| Arc::ptr_eq(t, table)) {
                tables.push(Arc::clone(table));
            }
        }
        tables
    }

    /// Default-construct an instance.
    pub fn create(&self) -> Box<dyn Object> {
        (self.creator)()
    }

    /// True if this class is `id` or derives from it.
    pub fn is_a(&self, id: TypeId) -> bool {
        self.ancestors().any(|c| c.id == id)
    }

    /// This class followed by its ancestors, most-derived first.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Number of ancestors.
    pub fn depth(&self) -> usize {
        self.ancestors().count() - 1
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("parent", &self.parent.as_ref().map(|p| p.name.as_str()))
            .field("fields", &self.fields)
            .finish()
    }
}

/// Iterator over a class and its ancestors.
pub struct Ancestors<'a> {
    next: Option<&'a Class>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Class;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent.as_deref();
        Some(current)
    }
}

/// Collects the own fields of a type being registered.
///
/// The first error is kept and reported by [`finish`](Self::finish); later
/// calls are ignored once an error is recorded.
pub struct ClassBuilder {
    type_name: String,
    inherited: Vec<Arc<FieldDescriptor>>,
    fields: Vec<Arc<FieldDescriptor>>,
    error: Option<ReflectError>,
}

impl ClassBuilder {
    pub(crate) fn new(type_name: &str, parent: Option<&Class>) -> Self {
        Self {
            type_name: type_name.to_string(),
            inherited: parent.map(|p| p.fields.clone()).unwrap_or_default(),
            fields: Vec::new(),
            error: None,
        }
    }

    /// Name of the type being described.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Append a field. Names must be unique across the whole hierarchy.
    pub fn field(&mut self, descriptor: FieldDescriptor) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        let taken = self
            .inherited
            .iter()
            .chain(self.fields.iter())
            .any(|f| f.name() == descriptor.name());
        if taken {
            self.error = Some(ReflectError::DuplicateField {
                type_name: self.type_name.clone(),
                field: descriptor.name().to_string(),
            });
        } else if descriptor.name().is_empty() {
            self.error = Some(ReflectError::InvalidName(String::new()));
        } else {
            self.fields.push(Arc::new(descriptor));
        }
        self
    }

    pub(crate) fn finish(self) -> Result<Vec<Arc<FieldDescriptor>>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.fields),
        }
    }
}

/// Typed view of a [`ClassBuilder`] handed to [`Reflect::enumerate`].
///
/// Accessors are plain function pointers projecting the field out of `T`;
/// they are wrapped once into type-erased getters and setters that reach `T`
/// inside derived instances through their base chain.
pub struct Compositor<'a, T: Reflect> {
    builder: &'a mut ClassBuilder,
    _marker: PhantomData<fn(T)>,
}

impl<'a, T: Reflect> Compositor<'a, T> {
    pub fn new(builder: &'a mut ClassBuilder) -> Self {
        Self {
            builder,
            _marker: PhantomData,
        }
    }

    /// Add a scalar, container or object-reference field.
    pub fn add_field<F: FieldValue>(
        &mut self,
        name: &str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> &mut Self {
        self.add_field_with_flags(name, FieldFlags::empty(), get, get_mut)
    }

    /// Add a field with flags.
    pub fn add_field_with_flags<F: FieldValue>(
        &mut self,
        name: &str,
        flags: FieldFlags,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> &mut Self {
        let getter: Getter = Arc::new(move |object: &dyn Object| {
            upcast::<T>(object).map(|t| get(t).to_value())
        });
        let setter = Self::setter(move |t: &mut T, value| {
            *get_mut(t) = F::from_value(value)?;
            Ok(())
        });
        self.push(name, flags, F::shape(), getter, setter)
    }

    /// Add a field holding one value of `table`.
    pub fn add_enumeration_field<E: EnumValue>(
        &mut self,
        name: &str,
        table: Arc<Enumeration>,
        get: fn(&T) -> &E,
        get_mut: fn(&mut T) -> &mut E,
    ) -> &mut Self {
        let getter: Getter = Arc::new(move |object: &dyn Object| {
            upcast::<T>(object).map(|t| Value::Enum(get(t).to_raw()))
        });
        let setter = Self::setter(move |t: &mut T, value| {
            *get_mut(t) = E::from_raw(raw_enum(value, "enumeration")?);
            Ok(())
        });
        self.push(
            name,
            FieldFlags::empty(),
            FieldShape::Enumeration(table),
            getter,
            setter,
        )
    }

    /// Add a field holding an OR of `table` values.
    pub fn add_bitfield_field<E: EnumValue>(
        &mut self,
        name: &str,
        table: Arc<Enumeration>,
        get: fn(&T) -> &E,
        get_mut: fn(&mut T) -> &mut E,
    ) -> &mut Self {
        let getter: Getter = Arc::new(move |object: &dyn Object| {
            upcast::<T>(object).map(|t| Value::Bitfield(get(t).to_raw()))
        });
        let setter = Self::setter(move |t: &mut T, value| {
            *get_mut(t) = E::from_raw(raw_enum(value, "bitfield")?);
            Ok(())
        });
        self.push(
            name,
            FieldFlags::empty(),
            FieldShape::Bitfield(table),
            getter,
            setter,
        )
    }

    fn setter<S>(assign: S) -> Setter
    where
        S: Fn(&mut T, Value) -> Result<()> + Send + Sync + 'static,
    {
        Arc::new(move |object: &mut dyn Object, value: Value| {
            let found = object.class_name();
            let target = upcast_mut::<T>(object).ok_or_else(|| ReflectError::TypeMismatch {
                expected: T::TYPE_NAME.to_string(),
                found: found.to_string(),
            })?;
            assign(target, value)
        })
    }

    fn push(
        &mut self,
        name: &str,
        flags: FieldFlags,
        shape: FieldShape,
        getter: Getter,
        setter: Setter,
    ) -> &mut Self {
        self.builder.field(FieldDescriptor::new(
            name,
            T::TYPE_NAME,
            flags,
            shape,
            getter,
            setter,
        ));
        self
    }
}

fn raw_enum(value: Value, expected: &str) -> Result<u32> {
    match value {
        Value::Enum(raw) | Value::Bitfield(raw) | Value::U32(raw) => Ok(raw),
        other => Err(ReflectError::TypeMismatch {
            expected: expected.to_string(),
            found: other.kind_name().to_string(),
        }),
    }
}
