// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Pieces of the serializer variants shared by both archive formats:
//! enumeration checks, scalar text forms and object instantiation.

use crate::class::Class;
use crate::error::{Diagnostic, ReflectError, Result};
use crate::field::{FieldDescriptor, FieldShape, ScalarKind};
use crate::object::{Object, ObjectPtr, TypeId};
use crate::registry::Registry;
use crate::value::Value;
use std::str::FromStr;
use std::sync::Arc;

/// Record a diagnostic when an enumeration or bitfield value has bits no
/// symbol covers. Other shapes are ignored.
pub(crate) fn check_enum(
    diagnostics: &mut Vec<Diagnostic>,
    type_name: &str,
    field: &FieldDescriptor,
    raw: u32,
) {
    let unknown = match field.shape() {
        FieldShape::Enumeration(table) if !table.is_known(raw) => Some((table, raw)),
        FieldShape::Bitfield(table) if table.unknown_bits(raw) != 0 => {
            Some((table, table.unknown_bits(raw)))
        }
        _ => None,
    };
    if let Some((table, value)) = unknown {
        log::warn!(
            "[archive] {}.{}: value {:#x} has no symbol in {}",
            type_name,
            field.name(),
            value,
            table.name()
        );
        diagnostics.push(Diagnostic::MalformedEnumValue {
            type_name: type_name.to_string(),
            field: field.name().to_string(),
            enumeration: table.name().to_string(),
            value,
        });
    }
}

/// Raw integer of an enumeration or bitfield value.
pub(crate) fn raw_enum(value: &Value) -> Result<u32> {
    value.as_raw_enum().ok_or_else(|| ReflectError::TypeMismatch {
        expected: "enumeration".into(),
        found: value.kind_name().into(),
    })
}

/// Text form of a scalar.
pub(crate) fn format_scalar(value: &Value) -> Result<String> {
    Ok(match value {
        Value::Bool(v) => v.to_string(),
        Value::U8(v) => v.to_string(),
        Value::I8(v) => v.to_string(),
        Value::U16(v) => v.to_string(),
        Value::I16(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        // Shortest text that parses back to the same bits; exponent form
        // for very large and very small magnitudes.
        Value::F32(v) => format!("{:?}", v),
        Value::F64(v) => format!("{:?}", v),
        Value::String(v) => v.clone(),
        other => {
            return Err(ReflectError::TypeMismatch {
                expected: "scalar".into(),
                found: other.kind_name().into(),
            })
        }
    })
}

fn parse_number<T: FromStr>(kind: ScalarKind, text: &str) -> Result<T> {
    text.trim().parse().map_err(|_| {
        ReflectError::InvalidValue(format!("{:?} is not a valid {}", text, kind.name()))
    })
}

/// Parse the text form of a scalar.
pub(crate) fn parse_scalar(kind: ScalarKind, text: &str) -> Result<Value> {
    Ok(match kind {
        ScalarKind::Bool => match text.trim() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            _ => {
                return Err(ReflectError::InvalidValue(format!(
                    "{:?} is not a valid bool",
                    text
                )))
            }
        },
        ScalarKind::U8 => Value::U8(parse_number(kind, text)?),
        ScalarKind::I8 => Value::I8(parse_number(kind, text)?),
        ScalarKind::U16 => Value::U16(parse_number(kind, text)?),
        ScalarKind::I16 => Value::I16(parse_number(kind, text)?),
        ScalarKind::U32 => Value::U32(parse_number(kind, text)?),
        ScalarKind::I32 => Value::I32(parse_number(kind, text)?),
        ScalarKind::U64 => Value::U64(parse_number(kind, text)?),
        ScalarKind::I64 => Value::I64(parse_number(kind, text)?),
        ScalarKind::F32 => Value::F32(parse_number(kind, text)?),
        ScalarKind::F64 => Value::F64(parse_number(kind, text)?),
        ScalarKind::String => Value::String(text.to_string()),
    })
}

/// Check that `class` can stand where `expected` is required.
pub(crate) fn check_expected(class: &Class, expected: Option<&Class>) -> Result<()> {
    match expected {
        Some(expected) if !class.is_a(expected.id()) => Err(ReflectError::TypeMismatch {
            expected: expected.name().to_string(),
            found: class.name().to_string(),
        }),
        _ => Ok(()),
    }
}

/// Class of a stored type-id.
pub(crate) fn class_by_id(registry: &Registry, id: TypeId) -> Result<Arc<Class>> {
    registry
        .find_by_id(id)
        .ok_or_else(|| ReflectError::UnknownType(id.to_string()))
}

/// Class of a stored type name (aliases included).
pub(crate) fn class_by_name(registry: &Registry, name: &str) -> Result<Arc<Class>> {
    registry
        .find_by_name(name)
        .ok_or_else(|| ReflectError::UnknownType(name.to_string()))
}

/// Run the post-read hook and publish a fully populated object.
pub(crate) fn publish(mut object: Box<dyn Object>) -> ObjectPtr {
    object.post_deserialize();
    ObjectPtr::from_box(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldFlags;
    use crate::testing::{access_table, mode_table};

    fn enum_field(shape: FieldShape) -> FieldDescriptor {
        FieldDescriptor::new(
            "mode",
            "Gadget",
            FieldFlags::empty(),
            shape,
            Arc::new(|_: &dyn Object| -> Option<Value> { None }),
            Arc::new(|_: &mut dyn Object, _: Value| -> Result<()> { Ok(()) }),
        )
    }

    #[test]
    fn unknown_enum_values_are_reported() {
        let field = enum_field(FieldShape::Enumeration(mode_table()));
        let mut diags = Vec::new();
        check_enum(&mut diags, "Gadget", &field, 1);
        assert!(diags.is_empty());
        check_enum(&mut diags, "Gadget", &field, 42);
        assert_eq!(
            diags,
            [Diagnostic::MalformedEnumValue {
                type_name: "Gadget".into(),
                field: "mode".into(),
                enumeration: "Mode".into(),
                value: 42,
            }]
        );
    }

    #[test]
    fn unknown_bits_are_reported() {
        let field = enum_field(FieldShape::Bitfield(access_table()));
        let mut diags = Vec::new();
        check_enum(&mut diags, "Gadget", &field, 0b11);
        assert!(diags.is_empty());
        check_enum(&mut diags, "Gadget", &field, 0b1011);
        assert!(matches!(
            diags.as_slice(),
            [Diagnostic::MalformedEnumValue { value: 0b1000, .. }]
        ));
    }

    #[test]
    fn scalar_text_round_trip() {
        for value in [
            Value::Bool(true),
            Value::I8(-5),
            Value::U64(u64::MAX),
            Value::I64(i64::MIN),
            Value::F32(0.1),
            Value::F64(-1.0e-300),
            Value::F32(f32::INFINITY),
            Value::String(" padded ".into()),
        ] {
            let kind = match &value {
                Value::Bool(_) => ScalarKind::Bool,
                Value::I8(_) => ScalarKind::I8,
                Value::U64(_) => ScalarKind::U64,
                Value::I64(_) => ScalarKind::I64,
                Value::F32(_) => ScalarKind::F32,
                Value::F64(_) => ScalarKind::F64,
                _ => ScalarKind::String,
            };
            let text = format_scalar(&value).unwrap();
            assert!(parse_scalar(kind, &text).unwrap().bit_eq(&value), "{}", text);
        }
    }

    #[test]
    fn scalar_parse_errors() {
        assert!(parse_scalar(ScalarKind::U8, "256").is_err());
        assert!(parse_scalar(ScalarKind::Bool, "yes").is_err());
        assert_eq!(parse_scalar(ScalarKind::I32, " 12 ").unwrap(), Value::I32(12));
        assert!(format_scalar(&Value::Enum(1)).is_err());
    }
}
