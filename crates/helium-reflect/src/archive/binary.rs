// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Binary archive.
//!
//! # Layout
//!
//! ```text
//! header : BOM u16 | version u32 | CRC-32 u32        (little-endian)
//! record : root type-id u32 | fields...
//! field  : scalar      -> fixed width; bool = 1 byte
//!          string      -> u32 byte length | UTF-8
//!          enum/bits   -> u32
//!          sequence    -> u32 count | elements
//!          map         -> u32 count | (key, value)...
//!          object      -> type-id u32 | fields...   (type-id 0 = null)
//! ```
//!
//! Fields carry no names; their order is the flattened descriptor order, so
//! reader and writer must agree on the registered types.

use super::{require_mode, require_open, Archive, ArchiveFormat, ArchiveMode, ArchiveState, Store};
use crate::class::Class;
use crate::config::{
    ArchiveOptions, BYTE_ORDER_MARK, CRC_DEFAULT, CRC_INVALID, CRC_OFFSET, CURRENT_VERSION,
    HEADER_SIZE,
};
use crate::error::{Diagnostic, ReflectError, Result};
use crate::field::{ElementKind, FieldDescriptor, FieldShape, ScalarKind};
use crate::object::{Object, ObjectPtr, TypeId};
use crate::registry::Registry;
use crate::serializer;
use crate::value::Value;
use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use std::path::Path;

/// Binary archive over a memory buffer or a file.
#[derive(Debug)]
pub struct BinaryArchive {
    mode: ArchiveMode,
    state: ArchiveState,
    store: Store,
    options: ArchiveOptions,
    buffer: Vec<u8>,
    offset: usize,
    diagnostics: Vec<Diagnostic>,
}

impl BinaryArchive {
    fn with_store(mode: ArchiveMode, store: Store, buffer: Vec<u8>) -> Self {
        Self {
            mode,
            state: ArchiveState::Closed,
            store,
            options: ArchiveOptions::default(),
            buffer,
            offset: 0,
            diagnostics: Vec::new(),
        }
    }

    /// In-memory writer; fetch the result with [`into_bytes`](Self::into_bytes).
    pub fn writer() -> Self {
        Self::with_store(ArchiveMode::Write, Store::Memory, Vec::new())
    }

    /// In-memory reader over `bytes`.
    pub fn reader(bytes: impl Into<Vec<u8>>) -> Self {
        Self::with_store(ArchiveMode::Read, Store::Memory, bytes.into())
    }

    /// Writer that stores to `path` on close.
    pub fn file_writer(path: impl AsRef<Path>) -> Self {
        Self::with_store(
            ArchiveMode::Write,
            Store::File(path.as_ref().to_path_buf()),
            Vec::new(),
        )
    }

    /// Reader that loads `path` on open.
    pub fn file_reader(path: impl AsRef<Path>) -> Self {
        Self::with_store(
            ArchiveMode::Read,
            Store::File(path.as_ref().to_path_buf()),
            Vec::new(),
        )
    }

    pub fn with_options(mut self, options: ArchiveOptions) -> Self {
        self.options = options;
        self
    }

    /// Bytes of a closed writer.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        if self.mode != ArchiveMode::Write || self.state != ArchiveState::Closed {
            return Err(ReflectError::InvalidState(
                "bytes are only available from a closed writer",
            ));
        }
        Ok(self.buffer)
    }

    /// Current contents (header included).
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    fn write_header(&mut self) -> Result<()> {
        self.buffer.clear();
        self.buffer.write_u16::<LittleEndian>(BYTE_ORDER_MARK)?;
        self.buffer.write_u32::<LittleEndian>(CURRENT_VERSION)?;
        self.buffer.write_u32::<LittleEndian>(CRC_INVALID)?;
        Ok(())
    }

    fn check_header(&self) -> Result<()> {
        if self.buffer.len() < HEADER_SIZE {
            return Err(ReflectError::UnexpectedEnd {
                need: HEADER_SIZE,
                have: self.buffer.len(),
            });
        }
        let bom = LittleEndian::read_u16(&self.buffer[0..2]);
        if bom != BYTE_ORDER_MARK {
            log::warn!("[archive] bad byte-order mark {:#06x}", bom);
            return Err(ReflectError::InvalidFormat(if bom == BYTE_ORDER_MARK.swap_bytes() {
                "byte-swapped archive".to_string()
            } else {
                format!("bad byte-order mark {:#06x}", bom)
            }));
        }
        let version = LittleEndian::read_u32(&self.buffer[2..CRC_OFFSET]);
        if version > CURRENT_VERSION {
            log::warn!("[archive] unsupported format version {}", version);
            return Err(ReflectError::UnsupportedVersion {
                found: version,
                supported: CURRENT_VERSION,
            });
        }
        let stored = LittleEndian::read_u32(&self.buffer[CRC_OFFSET..HEADER_SIZE]);
        if stored == CRC_INVALID {
            log::warn!("[archive] archive was never closed by its writer");
            return Err(ReflectError::InvalidFormat("incomplete write".into()));
        }
        if self.options.verify_checksum && stored != CRC_DEFAULT {
            let computed = crc32fast::hash(&self.buffer[HEADER_SIZE..]);
            if computed != stored {
                log::warn!(
                    "[archive] checksum mismatch: stored {:#010x}, computed {:#010x}",
                    stored,
                    computed
                );
                return Err(ReflectError::ChecksumMismatch { stored, computed });
            }
        }
        Ok(())
    }
}

impl Archive for BinaryArchive {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Binary
    }

    fn mode(&self) -> ArchiveMode {
        self.mode
    }

    fn state(&self) -> ArchiveState {
        self.state
    }

    fn open(&mut self) -> Result<()> {
        if self.state == ArchiveState::Open {
            return Err(ReflectError::InvalidState("archive is already open"));
        }
        match self.mode {
            ArchiveMode::Write => self.write_header()?,
            ArchiveMode::Read => {
                if let Store::File(path) = &self.store {
                    self.buffer = std::fs::read(path)?;
                }
                self.check_header()?;
                self.offset = HEADER_SIZE;
            }
        }
        self.state = ArchiveState::Open;
        log::debug!(
            "[archive] opened binary archive for {:?} ({:?})",
            self.mode,
            self.store
        );
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.state == ArchiveState::Closed {
            return Err(ReflectError::InvalidState("archive is already closed"));
        }
        if self.mode == ArchiveMode::Write {
            let mut crc = crc32fast::hash(&self.buffer[HEADER_SIZE..]);
            if crc == CRC_INVALID {
                crc = CRC_DEFAULT;
            }
            LittleEndian::write_u32(&mut self.buffer[CRC_OFFSET..HEADER_SIZE], crc);
            if let Store::File(path) = &self.store {
                std::fs::write(path, &self.buffer)?;
            }
        }
        self.state = ArchiveState::Closed;
        log::debug!(
            "[archive] closed binary archive ({} bytes)",
            self.buffer.len()
        );
        Ok(())
    }

    fn write_object(&mut self, registry: &Registry, object: &dyn Object) -> Result<()> {
        require_open(self.state)?;
        require_mode(self.mode, ArchiveMode::Write)?;

        let mut encoder = Encoder::new(registry);
        let class = registry.class_of(object)?;
        encoder.out.write_u32::<LittleEndian>(class.id().raw())?;
        encoder.encode_object(&class, object)?;

        self.buffer.extend_from_slice(&encoder.out);
        self.diagnostics.append(&mut encoder.diagnostics);
        Ok(())
    }

    fn read_object(&mut self, registry: &Registry, expected: Option<&str>) -> Result<ObjectPtr> {
        require_open(self.state)?;
        require_mode(self.mode, ArchiveMode::Read)?;
        let expected = expected.ok_or_else(|| {
            ReflectError::InvalidValue("binary archives need an expected root type".into())
        })?;
        let expected = serializer::class_by_name(registry, expected)?;

        let mut decoder = Decoder::new(registry, &self.buffer[self.offset..], &self.options);
        let id = TypeId(decoder.read_u32()?);
        let class = serializer::class_by_id(registry, id)?;
        serializer::check_expected(&class, Some(&expected))?;
        let mut object = class.create();
        decoder.enter()?;
        decoder.decode_object(&class, object.as_mut())?;

        self.offset += decoder.pos;
        self.diagnostics.append(&mut decoder.diagnostics);
        Ok(serializer::publish(object))
    }

    fn at_end(&self) -> Result<bool> {
        require_open(self.state)?;
        require_mode(self.mode, ArchiveMode::Read)?;
        Ok(self.offset >= self.buffer.len())
    }

    fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

// ===================================================================
// Encoder
// ===================================================================

/// Encodes one record into a scratch buffer.
struct Encoder<'r> {
    registry: &'r Registry,
    out: Vec<u8>,
    diagnostics: Vec<Diagnostic>,
}

impl<'r> Encoder<'r> {
    fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            out: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn encode_object(&mut self, class: &Class, object: &dyn Object) -> Result<()> {
        object.pre_serialize();
        for field in class.fields().iter().filter(|f| !f.is_discarded()) {
            let value = field
                .get(object)
                .map_err(|e| e.in_field(class.name(), field.name()))?;
            self.encode_field(class, field, &value)
                .map_err(|e| e.in_field(class.name(), field.name()))?;
        }
        Ok(())
    }

    fn encode_field(&mut self, class: &Class, field: &FieldDescriptor, value: &Value) -> Result<()> {
        match field.shape() {
            FieldShape::Scalar(_) => self.encode_scalar(value),
            FieldShape::Enumeration(_) | FieldShape::Bitfield(_) => {
                let raw = serializer::raw_enum(value)?;
                serializer::check_enum(&mut self.diagnostics, class.name(), field, raw);
                self.out.write_u32::<LittleEndian>(raw)?;
                Ok(())
            }
            FieldShape::Sequence(kind) => {
                let items = value.as_sequence().ok_or_else(|| mismatch("sequence", value))?;
                self.encode_len(items.len())?;
                for item in items {
                    self.encode_element(*kind, item)?;
                }
                Ok(())
            }
            FieldShape::Map { value: kind, .. } => {
                let entries = value.as_map().ok_or_else(|| mismatch("map", value))?;
                self.encode_len(entries.len())?;
                for (k, v) in entries {
                    self.encode_scalar(k)?;
                    self.encode_element(*kind, v)?;
                }
                Ok(())
            }
            FieldShape::Object => self.encode_element(ElementKind::Object, value),
        }
    }

    fn encode_element(&mut self, kind: ElementKind, value: &Value) -> Result<()> {
        match (kind, value) {
            (ElementKind::Scalar(_), _) => self.encode_scalar(value),
            (ElementKind::Object, Value::Object(None)) => {
                self.out.write_u32::<LittleEndian>(TypeId::NULL.raw())?;
                Ok(())
            }
            (ElementKind::Object, Value::Object(Some(ptr))) => {
                let class = self.registry.class_of(ptr.as_object())?;
                self.out.write_u32::<LittleEndian>(class.id().raw())?;
                self.encode_object(&class, ptr.as_object())
            }
            (ElementKind::Object, other) => Err(mismatch("object", other)),
        }
    }

    fn encode_len(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len)
            .map_err(|_| ReflectError::InvalidValue(format!("length {} exceeds u32", len)))?;
        self.out.write_u32::<LittleEndian>(len)?;
        Ok(())
    }

    fn encode_scalar(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Bool(v) => self.out.write_u8(u8::from(*v))?,
            Value::U8(v) => self.out.write_u8(*v)?,
            Value::I8(v) => self.out.write_i8(*v)?,
            Value::U16(v) => self.out.write_u16::<LittleEndian>(*v)?,
            Value::I16(v) => self.out.write_i16::<LittleEndian>(*v)?,
            Value::U32(v) => self.out.write_u32::<LittleEndian>(*v)?,
            Value::I32(v) => self.out.write_i32::<LittleEndian>(*v)?,
            Value::U64(v) => self.out.write_u64::<LittleEndian>(*v)?,
            Value::I64(v) => self.out.write_i64::<LittleEndian>(*v)?,
            Value::F32(v) => self.out.write_f32::<LittleEndian>(*v)?,
            Value::F64(v) => self.out.write_f64::<LittleEndian>(*v)?,
            Value::String(s) => {
                self.encode_len(s.len())?;
                self.out.extend_from_slice(s.as_bytes());
            }
            other => return Err(mismatch("scalar", other)),
        }
        Ok(())
    }
}

fn mismatch(expected: &str, found: &Value) -> ReflectError {
    ReflectError::TypeMismatch {
        expected: expected.to_string(),
        found: found.kind_name().to_string(),
    }
}

// ===================================================================
// Decoder
// ===================================================================

/// Decodes one record; `pos` only matters once the whole record succeeded.
struct Decoder<'a> {
    registry: &'a Registry,
    data: &'a [u8],
    pos: usize,
    max_len: u32,
    max_depth: usize,
    depth: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Decoder<'a> {
    fn new(registry: &'a Registry, data: &'a [u8], options: &ArchiveOptions) -> Self {
        Self {
            registry,
            data,
            pos: 0,
            max_len: options.max_container_len,
            max_depth: options.max_depth,
            depth: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Step one object deeper.
    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ReflectError::InvalidFormat(format!(
                "objects nest deeper than {}",
                self.max_depth
            )));
        }
        Ok(())
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        let have = self.data.len() - self.pos;
        if have < n {
            return Err(ReflectError::UnexpectedEnd { need: n, have });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    fn read_len(&mut self) -> Result<usize> {
        let len = self.read_u32()?;
        if len > self.max_len {
            return Err(ReflectError::InvalidFormat(format!(
                "length {} exceeds limit {}",
                len, self.max_len
            )));
        }
        Ok(len as usize)
    }

    fn decode_object(&mut self, class: &Class, object: &mut dyn Object) -> Result<()> {
        for field in class.fields().iter().filter(|f| !f.is_discarded()) {
            let value = self
                .decode_field(class, field)
                .map_err(|e| e.in_field(class.name(), field.name()))?;
            field
                .set(object, value)
                .map_err(|e| e.in_field(class.name(), field.name()))?;
        }
        Ok(())
    }

    fn decode_field(&mut self, class: &Class, field: &FieldDescriptor) -> Result<Value> {
        match field.shape() {
            FieldShape::Scalar(kind) => self.decode_scalar(*kind),
            FieldShape::Enumeration(_) => {
                let raw = self.read_u32()?;
                serializer::check_enum(&mut self.diagnostics, class.name(), field, raw);
                Ok(Value::Enum(raw))
            }
            FieldShape::Bitfield(_) => {
                let raw = self.read_u32()?;
                serializer::check_enum(&mut self.diagnostics, class.name(), field, raw);
                Ok(Value::Bitfield(raw))
            }
            FieldShape::Sequence(kind) => {
                let len = self.read_len()?;
                let mut items = Vec::with_capacity(len.min(self.data.len() - self.pos));
                for _ in 0..len {
                    items.push(self.decode_element(*kind)?);
                }
                Ok(Value::Sequence(items))
            }
            FieldShape::Map { key, value } => {
                let len = self.read_len()?;
                let mut entries = Vec::with_capacity(len.min(self.data.len() - self.pos));
                for _ in 0..len {
                    let k = self.decode_scalar(*key)?;
                    let v = self.decode_element(*value)?;
                    entries.push((k, v));
                }
                Ok(Value::Map(entries))
            }
            FieldShape::Object => self.decode_element(ElementKind::Object),
        }
    }

    fn decode_element(&mut self, kind: ElementKind) -> Result<Value> {
        match kind {
            ElementKind::Scalar(scalar) => self.decode_scalar(scalar),
            ElementKind::Object => {
                let id = TypeId(self.read_u32()?);
                if id.is_null() {
                    return Ok(Value::Object(None));
                }
                let class = serializer::class_by_id(self.registry, id)?;
                self.enter()?;
                let mut object = class.create();
                self.decode_object(&class, object.as_mut())?;
                self.depth -= 1;
                Ok(Value::Object(Some(serializer::publish(object))))
            }
        }
    }

    fn decode_scalar(&mut self, kind: ScalarKind) -> Result<Value> {
        Ok(match kind {
            ScalarKind::Bool => match self.read_u8()? {
                0 => Value::Bool(false),
                1 => Value::Bool(true),
                other => {
                    return Err(ReflectError::InvalidValue(format!(
                        "bool byte {:#04x}",
                        other
                    )))
                }
            },
            ScalarKind::U8 => Value::U8(self.read_u8()?),
            ScalarKind::I8 => Value::I8(self.read_u8()? as i8),
            ScalarKind::U16 => Value::U16(LittleEndian::read_u16(self.read_bytes(2)?)),
            ScalarKind::I16 => Value::I16(LittleEndian::read_i16(self.read_bytes(2)?)),
            ScalarKind::U32 => Value::U32(self.read_u32()?),
            ScalarKind::I32 => Value::I32(LittleEndian::read_i32(self.read_bytes(4)?)),
            ScalarKind::U64 => Value::U64(LittleEndian::read_u64(self.read_bytes(8)?)),
            ScalarKind::I64 => Value::I64(LittleEndian::read_i64(self.read_bytes(8)?)),
            ScalarKind::F32 => Value::F32(LittleEndian::read_f32(self.read_bytes(4)?)),
            ScalarKind::F64 => Value::F64(LittleEndian::read_f64(self.read_bytes(8)?)),
            ScalarKind::String => {
                let len = self.read_u32()? as usize;
                let bytes = self.read_bytes(len)?;
                let text = std::str::from_utf8(bytes).map_err(|e| {
                    ReflectError::InvalidValue(format!("string is not UTF-8: {}", e))
                })?;
                Value::String(text.to_string())
            }
        })
    }
}
