// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Enumeration tables shared by enumeration and bitfield fields.

use crate::error::{ReflectError, Result};
use std::sync::Arc;

/// One named value of an enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSymbol {
    /// Symbol name.
    pub name: String,
    /// Underlying value.
    pub value: u32,
}

impl EnumSymbol {
    /// Create enum symbol.
    pub fn new(name: impl Into<String>, value: u32) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Symbol ↔ integer table.
///
/// Enumeration fields store exactly one value of the table; bitfield fields
/// store the bitwise OR of several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumeration {
    name: String,
    symbols: Vec<EnumSymbol>,
}

impl Enumeration {
    /// Create an enumeration from its symbols.
    ///
    /// Symbol names must be identifiers (a letter or `_`, then letters,
    /// digits or `_`) and unique, so that the text form of every value
    /// parses back to the same value.
    pub fn new(name: impl Into<String>, symbols: Vec<EnumSymbol>) -> Result<Self> {
        let name = name.into();
        for (i, symbol) in symbols.iter().enumerate() {
            if !is_symbol_name(&symbol.name) {
                return Err(ReflectError::InvalidValue(format!(
                    "{}: {:?} is not a valid symbol name",
                    name, symbol.name
                )));
            }
            if symbols[..i].iter().any(|s| s.name == symbol.name) {
                return Err(ReflectError::InvalidValue(format!(
                    "{}: symbol {} declared twice",
                    name, symbol.name
                )));
            }
        }
        Ok(Self { name, symbols })
    }

    /// Enumeration name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All symbols in declaration order.
    pub fn symbols(&self) -> &[EnumSymbol] {
        &self.symbols
    }

    /// Get symbol by name.
    pub fn symbol(&self, name: &str) -> Option<&EnumSymbol> {
        self.symbols.iter().find(|s| s.name == name)
    }

    /// Get symbol by value.
    pub fn symbol_by_value(&self, value: u32) -> Option<&EnumSymbol> {
        self.symbols.iter().find(|s| s.value == value)
    }

    /// True if `value` names a symbol.
    pub fn is_known(&self, value: u32) -> bool {
        self.symbol_by_value(value).is_some()
    }

    /// OR of every symbol value.
    pub fn known_bits(&self) -> u32 {
        self.symbols.iter().fold(0, |acc, s| acc | s.value)
    }

    /// Bits of `value` not covered by any symbol.
    pub fn unknown_bits(&self, value: u32) -> u32 {
        value & !self.known_bits()
    }

    /// Text form of an enumeration value: the symbol name, or the decimal
    /// integer when no symbol matches.
    pub fn format_value(&self, value: u32) -> String {
        match self.symbol_by_value(value) {
            Some(symbol) => symbol.name.clone(),
            None => value.to_string(),
        }
    }

    /// Parse a symbol name or an integer literal.
    pub fn parse_value(&self, text: &str) -> Result<u32> {
        let text = text.trim();
        if let Some(symbol) = self.symbol(text) {
            return Ok(symbol.value);
        }
        parse_integer(text).ok_or_else(|| {
            ReflectError::InvalidValue(format!(
                "{:?} is neither a symbol of {} nor an integer",
                text, self.name
            ))
        })
    }

    /// Text form of a bitfield value: `|`-joined symbols, with any bits no
    /// symbol covers appended as a hex literal.
    pub fn format_bits(&self, value: u32) -> String {
        if value == 0 {
            return self
                .symbol_by_value(0)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| "0".to_string());
        }

        let mut parts = Vec::new();
        let mut covered = 0u32;
        for symbol in &self.symbols {
            if symbol.value != 0 && value & symbol.value == symbol.value {
                parts.push(symbol.name.clone());
                covered |= symbol.value;
            }
        }
        let rest = value & !covered;
        if rest != 0 {
            parts.push(format!("{:#x}", rest));
        }
        parts.join("|")
    }

    /// Parse the output of [`format_bits`](Self::format_bits).
    pub fn parse_bits(&self, text: &str) -> Result<u32> {
        let mut value = 0u32;
        for part in text.split('|').map(str::trim).filter(|p| !p.is_empty()) {
            value |= self.parse_value(part)?;
        }
        Ok(value)
    }
}

fn is_symbol_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Accepts decimal and `0x`-prefixed hex.
fn parse_integer(text: &str) -> Option<u32> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// Builder for enumeration tables.
#[derive(Debug)]
pub struct EnumerationBuilder {
    name: String,
    symbols: Vec<EnumSymbol>,
    next_value: u32,
}

impl EnumerationBuilder {
    /// Create a new enumeration builder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbols: Vec::new(),
            next_value: 0,
        }
    }

    /// Add a symbol with auto-incrementing value.
    pub fn symbol(mut self, name: impl Into<String>) -> Self {
        self.symbols.push(EnumSymbol::new(name, self.next_value));
        self.next_value = self.next_value.wrapping_add(1);
        self
    }

    /// Add a symbol with explicit value.
    pub fn symbol_value(mut self, name: impl Into<String>, value: u32) -> Self {
        self.symbols.push(EnumSymbol::new(name, value));
        self.next_value = value.wrapping_add(1);
        self
    }

    /// Add a bitfield flag occupying bit `bit`.
    pub fn flag(self, name: impl Into<String>, bit: u32) -> Self {
        self.symbol_value(name, 1u32 << bit)
    }

    /// Build the table.
    pub fn build(self) -> Result<Arc<Enumeration>> {
        Enumeration::new(self.name, self.symbols).map(Arc::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> Arc<Enumeration> {
        EnumerationBuilder::new("Color")
            .symbol("RED")
            .symbol("GREEN")
            .symbol_value("BLUE", 10)
            .symbol("CYAN")
            .build()
            .unwrap()
    }

    fn access() -> Arc<Enumeration> {
        EnumerationBuilder::new("Access")
            .symbol_value("NONE", 0)
            .flag("READ", 0)
            .flag("WRITE", 1)
            .flag("EXEC", 2)
            .build()
            .unwrap()
    }

    #[test]
    fn builder_assigns_values() {
        let e = colors();
        assert_eq!(e.symbol("GREEN").map(|s| s.value), Some(1));
        assert_eq!(e.symbol("CYAN").map(|s| s.value), Some(11));
        assert_eq!(e.symbol_by_value(10).map(|s| s.name.as_str()), Some("BLUE"));
        assert!(!e.is_known(5));
    }

    #[test]
    fn enum_text_round_trip() {
        let e = colors();
        assert_eq!(e.format_value(1), "GREEN");
        assert_eq!(e.format_value(99), "99");
        assert_eq!(e.parse_value(" GREEN ").unwrap(), 1);
        assert_eq!(e.parse_value("99").unwrap(), 99);
        assert_eq!(e.parse_value("0x10").unwrap(), 16);
        assert!(e.parse_value("MAGENTA").is_err());
    }

    #[test]
    fn bits_keep_unknown_bits() {
        let e = access();
        assert_eq!(e.known_bits(), 0b111);
        assert_eq!(e.format_bits(0), "NONE");
        assert_eq!(e.format_bits(0b011), "READ|WRITE");
        assert_eq!(e.format_bits(0b1000_0101), "READ|EXEC|0x80");
        assert_eq!(e.unknown_bits(0b1000_0101), 0x80);

        for value in [0, 0b011, 0b1000_0101, 0xffff_ffff] {
            assert_eq!(e.parse_bits(&e.format_bits(value)).unwrap(), value);
        }
    }

    #[test]
    fn bits_without_zero_symbol() {
        let e = EnumerationBuilder::new("Flags").flag("A", 3).build().unwrap();
        assert_eq!(e.format_bits(0), "0");
        assert_eq!(e.parse_bits("0").unwrap(), 0);
        assert_eq!(e.parse_bits("").unwrap(), 0);
    }

    #[test]
    fn symbol_names_must_parse_back() {
        for bad in ["1", "0x10", "READ|WRITE", "", " PAD", "two words", "-1"] {
            assert!(
                EnumerationBuilder::new("Bad").symbol(bad).build().is_err(),
                "{:?} accepted",
                bad
            );
        }
        assert!(matches!(
            EnumerationBuilder::new("Twice").symbol("A").symbol("A").build(),
            Err(ReflectError::InvalidValue(_))
        ));
        assert!(Enumeration::new("Ok", vec![EnumSymbol::new("_x1", 4)]).is_ok());
    }
}
