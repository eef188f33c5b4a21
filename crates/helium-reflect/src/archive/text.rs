// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Text (XML) archive.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <Reflect FileFormatVersion="7">
//!   <Object Type="Circle">
//!     <Field Name="name">disc</Field>
//!     <Field Name="radius">2.5</Field>
//!   </Object>
//! </Reflect>
//! ```
//!
//! Fields are matched by name, so readers tolerate reordering, unknown tags
//! (skipped with a diagnostic) and missing tags (default kept). Empty
//! containers and null references are omitted unless the field is forced.

use super::{require_mode, require_open, Archive, ArchiveFormat, ArchiveMode, ArchiveState, Store};
use crate::class::Class;
use crate::config::{ArchiveOptions, CURRENT_VERSION, TEXT_ROOT_TAG, TEXT_VERSION_ATTR};
use crate::error::{Diagnostic, ReflectError, Result};
use crate::field::{ElementKind, FieldDescriptor, FieldShape};
use crate::object::{Object, ObjectPtr};
use crate::registry::Registry;
use crate::serializer;
use crate::value::Value;
use std::path::Path;

const OBJECT_TAG: &str = "Object";
const TYPE_ATTR: &str = "Type";
const FIELD_TAG: &str = "Field";
const NAME_ATTR: &str = "Name";
const ITEM_TAG: &str = "Item";
const ENTRY_TAG: &str = "Entry";
const KEY_TAG: &str = "Key";
const VALUE_TAG: &str = "Value";

/// Most elements one object level can span: `Object`, `Field`, `Entry`
/// and `Value`.
const ELEMENTS_PER_LEVEL: usize = 4;

/// Text archive over a memory string or a file.
#[derive(Debug)]
pub struct TextArchive {
    mode: ArchiveMode,
    state: ArchiveState,
    store: Store,
    options: ArchiveOptions,
    text: String,
    roots: Vec<Node>,
    cursor: usize,
    diagnostics: Vec<Diagnostic>,
}

impl TextArchive {
    fn with_store(mode: ArchiveMode, store: Store, text: String) -> Self {
        Self {
            mode,
            state: ArchiveState::Closed,
            store,
            options: ArchiveOptions::default(),
            text,
            roots: Vec::new(),
            cursor: 0,
            diagnostics: Vec::new(),
        }
    }

    /// In-memory writer; fetch the result with [`into_string`](Self::into_string).
    pub fn writer() -> Self {
        Self::with_store(ArchiveMode::Write, Store::Memory, String::new())
    }

    /// In-memory reader over `text`.
    pub fn reader(text: impl Into<String>) -> Self {
        Self::with_store(ArchiveMode::Read, Store::Memory, text.into())
    }

    /// Writer that stores to `path` on close.
    pub fn file_writer(path: impl AsRef<Path>) -> Self {
        Self::with_store(
            ArchiveMode::Write,
            Store::File(path.as_ref().to_path_buf()),
            String::new(),
        )
    }

    /// Reader that loads `path` on open.
    pub fn file_reader(path: impl AsRef<Path>) -> Self {
        Self::with_store(
            ArchiveMode::Read,
            Store::File(path.as_ref().to_path_buf()),
            String::new(),
        )
    }

    pub fn with_options(mut self, options: ArchiveOptions) -> Self {
        self.options = options;
        self
    }

    /// Text of a closed writer.
    pub fn into_string(self) -> Result<String> {
        if self.mode != ArchiveMode::Write || self.state != ArchiveState::Closed {
            return Err(ReflectError::InvalidState(
                "text is only available from a closed writer",
            ));
        }
        Ok(self.text)
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    fn parse(&mut self) -> Result<()> {
        let doc = roxmltree::Document::parse(&self.text)?;
        let root = doc.root_element();
        if root.tag_name().name() != TEXT_ROOT_TAG {
            return Err(ReflectError::InvalidFormat(format!(
                "root element is <{}>, expected <{}>",
                root.tag_name().name(),
                TEXT_ROOT_TAG
            )));
        }
        let version = root
            .attribute(TEXT_VERSION_ATTR)
            .ok_or_else(|| ReflectError::InvalidFormat(format!("missing {}", TEXT_VERSION_ATTR)))?;
        let version: u32 = version.trim().parse().map_err(|_| {
            ReflectError::InvalidFormat(format!("bad {} {:?}", TEXT_VERSION_ATTR, version))
        })?;
        if version > CURRENT_VERSION {
            log::warn!("[archive] unsupported format version {}", version);
            return Err(ReflectError::UnsupportedVersion {
                found: version,
                supported: CURRENT_VERSION,
            });
        }

        let max_elements = self.options.max_depth.saturating_mul(ELEMENTS_PER_LEVEL);
        let mut roots = Vec::new();
        for child in root.children().filter(|n| n.is_element()) {
            if child.tag_name().name() == OBJECT_TAG {
                roots.push(Node::from_xml(child, max_elements)?);
            } else {
                log::debug!(
                    "[archive] skipping <{}> at document level",
                    child.tag_name().name()
                );
            }
        }
        self.roots = roots;
        self.cursor = 0;
        Ok(())
    }
}

impl Archive for TextArchive {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::Text
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
            ArchiveMode::Write => {
                self.text.clear();
                self.text
                    .push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
                self.text.push_str(&format!(
                    "<{} {}=\"{}\">\n",
                    TEXT_ROOT_TAG, TEXT_VERSION_ATTR, CURRENT_VERSION
                ));
            }
            ArchiveMode::Read => {
                if let Store::File(path) = &self.store {
                    self.text = std::fs::read_to_string(path)?;
                }
                self.parse()?;
            }
        }
        self.state = ArchiveState::Open;
        log::debug!(
            "[archive] opened text archive for {:?} ({:?})",
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
            self.text.push_str(&format!("</{}>\n", TEXT_ROOT_TAG));
            if let Store::File(path) = &self.store {
                std::fs::write(path, &self.text)?;
            }
        } else {
            self.roots.clear();
        }
        self.state = ArchiveState::Closed;
        log::debug!("[archive] closed text archive ({} bytes)", self.text.len());
        Ok(())
    }

    fn write_object(&mut self, registry: &Registry, object: &dyn Object) -> Result<()> {
        require_open(self.state)?;
        require_mode(self.mode, ArchiveMode::Write)?;

        let mut writer = Writer::new(registry, self.options.indent);
        writer.write_object(1, object)?;

        self.text.push_str(&writer.out);
        self.diagnostics.append(&mut writer.diagnostics);
        Ok(())
    }

    fn read_object(&mut self, registry: &Registry, expected: Option<&str>) -> Result<ObjectPtr> {
        require_open(self.state)?;
        require_mode(self.mode, ArchiveMode::Read)?;
        let expected = expected
            .map(|name| serializer::class_by_name(registry, name))
            .transpose()?;
        let node = self
            .roots
            .get(self.cursor)
            .ok_or(ReflectError::UnexpectedEnd { need: 1, have: 0 })?;

        let mut reader = Reader::new(registry, &self.options);
        let object = reader.read_object(node, expected.as_deref())?;

        self.cursor += 1;
        self.diagnostics.append(&mut reader.diagnostics);
        Ok(object)
    }

    fn at_end(&self) -> Result<bool> {
        require_open(self.state)?;
        require_mode(self.mode, ArchiveMode::Read)?;
        Ok(self.cursor >= self.roots.len())
    }

    fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

// ===================================================================
// Writer
// ===================================================================

struct Writer<'r> {
    registry: &'r Registry,
    indent: usize,
    out: String,
    diagnostics: Vec<Diagnostic>,
}

impl<'r> Writer<'r> {
    fn new(registry: &'r Registry, indent: usize) -> Self {
        Self {
            registry,
            indent,
            out: String::new(),
            diagnostics: Vec::new(),
        }
    }

    fn pad(&mut self, depth: usize) {
        self.out
            .extend(std::iter::repeat(' ').take(depth * self.indent));
    }

    fn line(&mut self, depth: usize, text: &str) {
        self.pad(depth);
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn write_object(&mut self, depth: usize, object: &dyn Object) -> Result<()> {
        let class = self.registry.class_of(object)?;
        object.pre_serialize();
        let open = format!("<{} {}=\"{}\">", OBJECT_TAG, TYPE_ATTR, escape(class.name(), true)?);
        self.line(depth, &open);
        for field in class.fields().iter().filter(|f| !f.is_discarded()) {
            let value = field
                .get(object)
                .map_err(|e| e.in_field(class.name(), field.name()))?;
            self.write_field(depth + 1, &class, field, &value)
                .map_err(|e| e.in_field(class.name(), field.name()))?;
        }
        self.line(depth, &format!("</{}>", OBJECT_TAG));
        Ok(())
    }

    fn write_field(
        &mut self,
        depth: usize,
        class: &Class,
        field: &FieldDescriptor,
        value: &Value,
    ) -> Result<()> {
        let open = format!("<{} {}=\"{}\"", FIELD_TAG, NAME_ATTR, escape(field.name(), true)?);
        let close = format!("</{}>", FIELD_TAG);

        match field.shape() {
            FieldShape::Scalar(_) => {
                let text = escape(&serializer::format_scalar(value)?, false)?;
                self.line(depth, &format!("{}>{}{}", open, text, close));
            }
            FieldShape::Enumeration(table) => {
                let raw = serializer::raw_enum(value)?;
                serializer::check_enum(&mut self.diagnostics, class.name(), field, raw);
                let text = escape(&table.format_value(raw), false)?;
                self.line(depth, &format!("{}>{}{}", open, text, close));
            }
            FieldShape::Bitfield(table) => {
                let raw = serializer::raw_enum(value)?;
                serializer::check_enum(&mut self.diagnostics, class.name(), field, raw);
                let text = escape(&table.format_bits(raw), false)?;
                self.line(depth, &format!("{}>{}{}", open, text, close));
            }
            FieldShape::Sequence(kind) => {
                let items = value.as_sequence().ok_or_else(|| mismatch("sequence", value))?;
                if items.is_empty() {
                    if field.is_forced() {
                        self.line(depth, &format!("{}/>", open));
                    }
                    return Ok(());
                }
                self.line(depth, &format!("{}>", open));
                for item in items {
                    self.write_element(depth + 1, ITEM_TAG, *kind, item)?;
                }
                self.line(depth, &close);
            }
            FieldShape::Map { value: kind, .. } => {
                let entries = value.as_map().ok_or_else(|| mismatch("map", value))?;
                if entries.is_empty() {
                    if field.is_forced() {
                        self.line(depth, &format!("{}/>", open));
                    }
                    return Ok(());
                }
                self.line(depth, &format!("{}>", open));
                for (k, v) in entries {
                    self.line(depth + 1, &format!("<{}>", ENTRY_TAG));
                    let key = escape(&serializer::format_scalar(k)?, false)?;
                    self.line(depth + 2, &format!("<{0}>{1}</{0}>", KEY_TAG, key));
                    self.write_element(depth + 2, VALUE_TAG, *kind, v)?;
                    self.line(depth + 1, &format!("</{}>", ENTRY_TAG));
                }
                self.line(depth, &close);
            }
            FieldShape::Object => match value {
                Value::Object(Some(ptr)) => {
                    self.line(depth, &format!("{}>", open));
                    self.write_object(depth + 1, ptr.as_object())?;
                    self.line(depth, &close);
                }
                Value::Object(None) => {
                    if field.is_forced() {
                        self.line(depth, &format!("{}/>", open));
                    }
                }
                other => return Err(mismatch("object", other)),
            },
        }
        Ok(())
    }

    /// `<tag>scalar</tag>`, `<tag><Object/></tag>` or `<tag/>` for null.
    fn write_element(
        &mut self,
        depth: usize,
        tag: &str,
        kind: ElementKind,
        value: &Value,
    ) -> Result<()> {
        match (kind, value) {
            (ElementKind::Scalar(_), _) => {
                let text = escape(&serializer::format_scalar(value)?, false)?;
                self.line(depth, &format!("<{0}>{1}</{0}>", tag, text));
            }
            (ElementKind::Object, Value::Object(Some(ptr))) => {
                self.line(depth, &format!("<{}>", tag));
                self.write_object(depth + 1, ptr.as_object())?;
                self.line(depth, &format!("</{}>", tag));
            }
            (ElementKind::Object, Value::Object(None)) => {
                self.line(depth, &format!("<{}/>", tag));
            }
            (ElementKind::Object, other) => return Err(mismatch("object", other)),
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

/// Escape text for element content (`attr = false`) or a quoted attribute.
///
/// XML 1.0 cannot carry most C0 control characters at all; those are
/// rejected. Carriage returns are written as references so line-ending
/// normalization does not eat them.
fn escape(text: &str, attr: bool) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attr => out.push_str("&quot;"),
            '\r' => out.push_str("&#13;"),
            '\n' if attr => out.push_str("&#10;"),
            '\t' if attr => out.push_str("&#9;"),
            '\n' | '\t' => out.push(c),
            c if (c as u32) < 0x20 => {
                return Err(ReflectError::InvalidValue(format!(
                    "control character U+{:04X} cannot be written as XML",
                    c as u32
                )))
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

// ===================================================================
// Reader
// ===================================================================

/// Owned copy of one XML element.
#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Node>,
}

impl Node {
    /// Copy `node` and its descendants, at most `levels` elements deep.
    fn from_xml(node: roxmltree::Node<'_, '_>, levels: usize) -> Result<Self> {
        if levels == 0 {
            return Err(ReflectError::InvalidFormat(format!(
                "<{}> nests too deep",
                node.tag_name().name()
            )));
        }
        let mut text = String::new();
        let mut children = Vec::new();
        for child in node.children() {
            if child.is_element() {
                children.push(Self::from_xml(child, levels - 1)?);
            } else if child.is_text() {
                text.push_str(child.text().unwrap_or_default());
            }
        }
        Ok(Self {
            tag: node.tag_name().name().to_string(),
            attributes: node
                .attributes()
                .map(|a| (a.name().to_string(), a.value().to_string()))
                .collect(),
            text,
            children,
        })
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn child(&self, tag: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.tag == tag)
    }

    fn children_tagged<'n>(&'n self, tag: &'n str) -> impl Iterator<Item = &'n Node> + 'n {
        self.children.iter().filter(move |c| c.tag == tag)
    }
}

struct Reader<'r> {
    registry: &'r Registry,
    max_len: u32,
    max_depth: usize,
    depth: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'r> Reader<'r> {
    fn new(registry: &'r Registry, options: &ArchiveOptions) -> Self {
        Self {
            registry,
            max_len: options.max_container_len,
            max_depth: options.max_depth,
            depth: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Build the object described by an `<Object>` node.
    fn read_object(&mut self, node: &Node, expected: Option<&Class>) -> Result<ObjectPtr> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(ReflectError::InvalidFormat(format!(
                "objects nest deeper than {}",
                self.max_depth
            )));
        }
        let object = self.read_fields(node, expected)?;
        self.depth -= 1;
        Ok(object)
    }

    fn read_fields(&mut self, node: &Node, expected: Option<&Class>) -> Result<ObjectPtr> {
        let type_name = node.attribute(TYPE_ATTR).ok_or_else(|| {
            ReflectError::InvalidFormat(format!("<{}> without {}", OBJECT_TAG, TYPE_ATTR))
        })?;
        let class = serializer::class_by_name(self.registry, type_name)?;
        serializer::check_expected(&class, expected)?;

        let mut object = class.create();
        for child in &node.children {
            if child.tag != FIELD_TAG {
                log::debug!("[archive] {}: skipping <{}>", class.name(), child.tag);
                continue;
            }
            let Some(name) = child.attribute(NAME_ATTR) else {
                log::debug!("[archive] {}: skipping unnamed field", class.name());
                continue;
            };
            let Some(field) = class.field(name) else {
                log::debug!("[archive] {}: skipping unknown field {}", class.name(), name);
                self.diagnostics.push(Diagnostic::UnknownField {
                    type_name: class.name().to_string(),
                    field: name.to_string(),
                });
                continue;
            };
            if field.is_discarded() {
                continue;
            }
            let value = self
                .read_field(&class, field, child)
                .map_err(|e| e.in_field(class.name(), field.name()))?;
            field
                .set(object.as_mut(), value)
                .map_err(|e| e.in_field(class.name(), field.name()))?;
        }
        Ok(serializer::publish(object))
    }

    fn read_field(&mut self, class: &Class, field: &FieldDescriptor, node: &Node) -> Result<Value> {
        match field.shape() {
            FieldShape::Scalar(kind) => serializer::parse_scalar(*kind, &node.text),
            FieldShape::Enumeration(table) => {
                let raw = table.parse_value(&node.text)?;
                serializer::check_enum(&mut self.diagnostics, class.name(), field, raw);
                Ok(Value::Enum(raw))
            }
            FieldShape::Bitfield(table) => {
                let raw = table.parse_bits(&node.text)?;
                serializer::check_enum(&mut self.diagnostics, class.name(), field, raw);
                Ok(Value::Bitfield(raw))
            }
            FieldShape::Sequence(kind) => {
                self.check_len(node, ITEM_TAG)?;
                let items = node
                    .children_tagged(ITEM_TAG)
                    .map(|item| self.read_element(*kind, item))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Value::Sequence(items))
            }
            FieldShape::Map { key, value } => {
                self.check_len(node, ENTRY_TAG)?;
                let mut entries = Vec::new();
                for entry in node.children_tagged(ENTRY_TAG) {
                    let k = entry.child(KEY_TAG).ok_or_else(|| {
                        ReflectError::InvalidFormat(format!("<{}> without <{}>", ENTRY_TAG, KEY_TAG))
                    })?;
                    let v = entry.child(VALUE_TAG).ok_or_else(|| {
                        ReflectError::InvalidFormat(format!(
                            "<{}> without <{}>",
                            ENTRY_TAG, VALUE_TAG
                        ))
                    })?;
                    entries.push((
                        serializer::parse_scalar(*key, &k.text)?,
                        self.read_element(*value, v)?,
                    ));
                }
                Ok(Value::Map(entries))
            }
            FieldShape::Object => self.read_element(ElementKind::Object, node),
        }
    }

    /// Scalar text, or the optional `<Object>` child.
    fn read_element(&mut self, kind: ElementKind, node: &Node) -> Result<Value> {
        match kind {
            ElementKind::Scalar(scalar) => serializer::parse_scalar(scalar, &node.text),
            ElementKind::Object => match node.child(OBJECT_TAG) {
                Some(child) => Ok(Value::Object(Some(self.read_object(child, None)?))),
                None => Ok(Value::Object(None)),
            },
        }
    }

    fn check_len(&self, node: &Node, tag: &str) -> Result<()> {
        let len = node.children_tagged(tag).count();
        if len > self.max_len as usize {
            return Err(ReflectError::InvalidFormat(format!(
                "length {} exceeds limit {}",
                len, self.max_len
            )));
        }
        Ok(())
    }
}
