// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field descriptors and the value conversions behind their accessors.

use crate::enumeration::Enumeration;
use crate::error::{ReflectError, Result};
use crate::object::{Object, ObjectPtr, TypeId};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::BitOr;
use std::sync::Arc;

/// Scalar kinds (strings included).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
    String,
}

impl ScalarKind {
    /// Short name, matching [`Value::kind_name`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "u8",
            Self::I8 => "i8",
            Self::U16 => "u16",
            Self::I16 => "i16",
            Self::U32 => "u32",
            Self::I32 => "i32",
            Self::U64 => "u64",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::String => "string",
        }
    }
}

/// Element kind of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Scalar(ScalarKind),
    /// Polymorphic sub-object, preceded by its type-id when encoded.
    Object,
}

/// Which serializer variant handles a field.
#[derive(Debug, Clone)]
pub enum FieldShape {
    Scalar(ScalarKind),
    Enumeration(Arc<Enumeration>),
    Bitfield(Arc<Enumeration>),
    Sequence(ElementKind),
    Map { key: ScalarKind, value: ElementKind },
    /// Optional polymorphic sub-object.
    Object,
}

impl FieldShape {
    /// Short name for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scalar(kind) => kind.name(),
            Self::Enumeration(_) => "enumeration",
            Self::Bitfield(_) => "bitfield",
            Self::Sequence(_) => "sequence",
            Self::Map { .. } => "map",
            Self::Object => "object",
        }
    }

    /// Enumeration table, for enumeration and bitfield shapes.
    pub fn enumeration(&self) -> Option<&Arc<Enumeration>> {
        match self {
            Self::Enumeration(e) | Self::Bitfield(e) => Some(e),
            _ => None,
        }
    }
}

/// Field flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FieldFlags(pub u32);

impl FieldFlags {
    /// Always emitted, even when it holds an empty container.
    pub const FORCE: FieldFlags = FieldFlags(0x1);
    /// Never serialized; left at its default on read.
    pub const DISCARD: FieldFlags = FieldFlags(0x2);
    /// Object reference to a shared pointee; cloning copies the handle.
    pub const SHARE: FieldFlags = FieldFlags(0x4);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn contains(self, other: FieldFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for FieldFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

fn kind_mismatch(expected: &str, found: &Value) -> ReflectError {
    ReflectError::TypeMismatch {
        expected: expected.to_string(),
        found: found.kind_name().to_string(),
    }
}

/// Conversion between a concrete field type and [`Value`].
pub trait FieldValue: Sized + Send + Sync + 'static {
    /// Serializer variant for this field type.
    fn shape() -> FieldShape;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self>;
}

/// Types allowed as container elements.
pub trait ElementValue: Sized + Send + Sync + 'static {
    fn element_kind() -> ElementKind;

    fn to_element(&self) -> Value;

    fn from_element(value: Value) -> Result<Self>;
}

/// Scalar field types; also usable as map keys when `Ord`.
pub trait ScalarValue: ElementValue {
    const KIND: ScalarKind;
}

macro_rules! impl_scalar {
    ($ty:ty, $kind:ident, $variant:ident) => {
        impl ScalarValue for $ty {
            const KIND: ScalarKind = ScalarKind::$kind;
        }

        impl ElementValue for $ty {
            fn element_kind() -> ElementKind {
                ElementKind::Scalar(ScalarKind::$kind)
            }

            fn to_element(&self) -> Value {
                Value::$variant(self.clone())
            }

            fn from_element(value: Value) -> Result<Self> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(kind_mismatch(ScalarKind::$kind.name(), &other)),
                }
            }
        }

        impl FieldValue for $ty {
            fn shape() -> FieldShape {
                FieldShape::Scalar(ScalarKind::$kind)
            }

            fn to_value(&self) -> Value {
                self.to_element()
            }

            fn from_value(value: Value) -> Result<Self> {
                Self::from_element(value)
            }
        }
    };
}

impl_scalar!(bool, Bool, Bool);
impl_scalar!(u8, U8, U8);
impl_scalar!(i8, I8, I8);
impl_scalar!(u16, U16, U16);
impl_scalar!(i16, I16, I16);
impl_scalar!(u32, U32, U32);
impl_scalar!(i32, I32, I32);
impl_scalar!(u64, U64, U64);
impl_scalar!(i64, I64, I64);
impl_scalar!(f32, F32, F32);
impl_scalar!(f64, F64, F64);
impl_scalar!(String, String, String);

impl ElementValue for ObjectPtr {
    fn element_kind() -> ElementKind {
        ElementKind::Object
    }

    fn to_element(&self) -> Value {
        Value::Object(Some(self.clone()))
    }

    fn from_element(value: Value) -> Result<Self> {
        match value {
            Value::Object(Some(ptr)) => Ok(ptr),
            Value::Object(None) => Err(ReflectError::InvalidValue(
                "null element in object container".into(),
            )),
            other => Err(kind_mismatch("object", &other)),
        }
    }
}

impl<T: ElementValue> FieldValue for Vec<T> {
    fn shape() -> FieldShape {
        FieldShape::Sequence(T::element_kind())
    }

    fn to_value(&self) -> Value {
        Value::Sequence(self.iter().map(ElementValue::to_element).collect())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Sequence(items) => items.into_iter().map(T::from_element).collect(),
            other => Err(kind_mismatch("sequence", &other)),
        }
    }
}

impl<K, V> FieldValue for BTreeMap<K, V>
where
    K: ScalarValue + Ord,
    V: ElementValue,
{
    fn shape() -> FieldShape {
        FieldShape::Map {
            key: K::KIND,
            value: V::element_kind(),
        }
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.to_element(), v.to_element()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self> {
        let entries = match value {
            Value::Map(entries) => entries,
            other => return Err(kind_mismatch("map", &other)),
        };
        let mut map = BTreeMap::new();
        for (key, value) in entries {
            let key_text = format!("{:?}", key);
            if map
                .insert(K::from_element(key)?, V::from_element(value)?)
                .is_some()
            {
                return Err(ReflectError::InvalidValue(format!(
                    "duplicate map key {}",
                    key_text
                )));
            }
        }
        Ok(map)
    }
}

impl FieldValue for Option<ObjectPtr> {
    fn shape() -> FieldShape {
        FieldShape::Object
    }

    fn to_value(&self) -> Value {
        Value::Object(self.clone())
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(ptr) => Ok(ptr),
            other => Err(kind_mismatch("object", &other)),
        }
    }
}

/// Field types stored through an enumeration table.
///
/// Implemented for `u32` directly; Rust enums implement it to keep unknown
/// raw values around (typically through an `Other(u32)` variant).
pub trait EnumValue: Sized + Send + Sync + 'static {
    fn to_raw(&self) -> u32;

    fn from_raw(raw: u32) -> Self;
}

impl EnumValue for u32 {
    fn to_raw(&self) -> u32 {
        *self
    }

    fn from_raw(raw: u32) -> Self {
        raw
    }
}

/// Reads a field out of any instance carrying the owning type.
///
/// Returns `None` when the instance is not (and does not derive from) the
/// owning type.
pub type Getter = Arc<dyn Fn(&dyn Object) -> Option<Value> + Send + Sync>;

/// Writes a field on any instance carrying the owning type.
pub type Setter = Arc<dyn Fn(&mut dyn Object, Value) -> Result<()> + Send + Sync>;

/// One reflected field.
///
/// Built once during registration and immutable afterward.
#[derive(Clone)]
pub struct FieldDescriptor {
    name: String,
    owner: TypeId,
    owner_name: String,
    flags: FieldFlags,
    shape: FieldShape,
    getter: Getter,
    setter: Setter,
}

impl FieldDescriptor {
    /// Create a field descriptor.
    pub fn new(
        name: impl Into<String>,
        owner_name: impl Into<String>,
        flags: FieldFlags,
        shape: FieldShape,
        getter: Getter,
        setter: Setter,
    ) -> Self {
        let owner_name = owner_name.into();
        Self {
            name: name.into(),
            owner: TypeId::of_name(&owner_name),
            owner_name,
            flags,
            shape,
            getter,
            setter,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type-id of the type that declared the field.
    pub fn owner(&self) -> TypeId {
        self.owner
    }

    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    pub fn flags(&self) -> FieldFlags {
        self.flags
    }

    pub fn shape(&self) -> &FieldShape {
        &self.shape
    }

    pub fn is_forced(&self) -> bool {
        self.flags.contains(FieldFlags::FORCE)
    }

    pub fn is_discarded(&self) -> bool {
        self.flags.contains(FieldFlags::DISCARD)
    }

    pub fn is_shared(&self) -> bool {
        self.flags.contains(FieldFlags::SHARE)
    }

    /// Read the field from `object`.
    pub fn get(&self, object: &dyn Object) -> Result<Value> {
        (self.getter)(object).ok_or_else(|| ReflectError::TypeMismatch {
            expected: self.owner_name.clone(),
            found: object.class_name().to_string(),
        })
    }

    /// Write the field on `object`.
    pub fn set(&self, object: &mut dyn Object, value: Value) -> Result<()> {
        (self.setter)(object, value)
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("owner", &self.owner_name)
            .field("flags", &self.flags)
            .field("shape", &self.shape.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_combine() {
        let flags = FieldFlags::FORCE | FieldFlags::SHARE;
        assert!(flags.contains(FieldFlags::FORCE));
        assert!(flags.contains(FieldFlags::SHARE));
        assert!(!flags.contains(FieldFlags::DISCARD));
        assert!(FieldFlags::empty().is_empty());
        assert_eq!(FieldFlags::default(), FieldFlags::empty());
    }

    #[test]
    fn scalar_conversions() {
        assert!(matches!(f32::shape(), FieldShape::Scalar(ScalarKind::F32)));
        assert_eq!(7u16.to_value(), Value::U16(7));
        assert_eq!(i64::from_value(Value::I64(-3)).unwrap(), -3);
        assert!(matches!(
            i64::from_value(Value::I32(-3)),
            Err(ReflectError::TypeMismatch { .. })
        ));
        assert_eq!(String::from_value("abc".into()).unwrap(), "abc");
    }

    #[test]
    fn sequence_conversions() {
        let v = vec![1.5f32, 2.5];
        assert!(matches!(
            Vec::<f32>::shape(),
            FieldShape::Sequence(ElementKind::Scalar(ScalarKind::F32))
        ));
        let value = v.to_value();
        assert_eq!(Vec::<f32>::from_value(value).unwrap(), v);
        assert!(Vec::<f32>::from_value(Value::Sequence(vec![Value::U8(1)])).is_err());
    }

    #[test]
    fn map_rejects_duplicate_keys() {
        let value = Value::Map(vec![
            (Value::from("a"), Value::U32(1)),
            (Value::from("a"), Value::U32(2)),
        ]);
        let err = BTreeMap::<String, u32>::from_value(value).unwrap_err();
        assert!(matches!(err, ReflectError::InvalidValue(_)));
    }

    #[test]
    fn map_conversions() {
        let mut map = BTreeMap::new();
        map.insert("b".to_string(), 2u32);
        map.insert("a".to_string(), 1u32);
        let value = map.to_value();
        // Entries come out in key order.
        assert_eq!(
            value.as_map().map(|e| e[0].0.clone()),
            Some(Value::from("a"))
        );
        assert_eq!(BTreeMap::<String, u32>::from_value(value).unwrap(), map);
    }

    #[test]
    fn object_element_rejects_null() {
        assert!(ObjectPtr::from_element(Value::Object(None)).is_err());
        assert_eq!(
            Option::<ObjectPtr>::from_value(Value::Object(None)).unwrap(),
            None
        );
    }
}
