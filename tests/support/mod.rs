// Test element type with a required field, shared by the integration tests.

#![allow(dead_code)]

use std::fmt;

use bytes::Bytes;
use wirelite::codec::decode::ParseContext;
use wirelite::codec::encode::{length_delimited_field_size, varint_field_size};
use wirelite::message::{CachedSize, FieldDescriptor, FieldLabel, MessageDescriptor};
use wirelite::prelude::*;
use wirelite::{Blob, DecodeErrorKind, Error, FieldValue, MessageWriter, Result, WireType};

static SYMBOL_FIELDS: [FieldDescriptor; 3] = [
    FieldDescriptor::new(1, "id", WireType::Varint, FieldLabel::Required),
    FieldDescriptor::new(2, "name", WireType::LengthDelimited, FieldLabel::Optional),
    FieldDescriptor::new(3, "flags", WireType::Fixed32, FieldLabel::Optional),
];

static SYMBOL: MessageDescriptor = MessageDescriptor::new("Symbol", &SYMBOL_FIELDS);

/// `id` is required; `name` and `flags` are optional scalars.
#[derive(Clone, Default)]
pub struct Symbol {
    id: Option<u64>,
    name: Option<Bytes>,
    flags: Option<u32>,
    unknown_fields: Blob,
    cached_size: CachedSize,
}

impl Symbol {
    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn name(&self) -> Option<&[u8]> {
        self.name.as_deref()
    }

    pub fn flags(&self) -> Option<u32> {
        self.flags
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.flags == other.flags
            && self.unknown_fields == other.unknown_fields
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Symbol")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("unknown_fields", &self.unknown_fields)
            .finish()
    }
}

impl Message for Symbol {
    type Builder = SymbolBuilder;

    fn descriptor() -> &'static MessageDescriptor {
        &SYMBOL
    }

    fn unknown_fields(&self) -> &Blob {
        &self.unknown_fields
    }

    fn cached_size(&self) -> &CachedSize {
        &self.cached_size
    }

    fn compute_fields_size(&self) -> usize {
        let mut size = 0;
        if let Some(id) = self.id {
            size += varint_field_size(1, id);
        }
        if let Some(name) = &self.name {
            size += length_delimited_field_size(2, name.len());
        }
        if self.flags.is_some() {
            size += 1 + 4;
        }
        size
    }

    fn write_fields(&self, writer: &mut MessageWriter) {
        if let Some(id) = self.id {
            writer.write_varint_field(1, id);
        }
        if let Some(name) = &self.name {
            writer.write_bytes_field(2, name);
        }
        if let Some(flags) = self.flags {
            writer.write_fixed32_field(3, flags);
        }
    }

    fn is_initialized(&self) -> bool {
        self.id.is_some()
    }

    fn missing_fields(&self) -> Vec<String> {
        if self.id.is_some() {
            Vec::new()
        } else {
            vec!["id".to_string()]
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SymbolBuilder {
    id: Option<u64>,
    name: Option<Bytes>,
    flags: Option<u32>,
    unknown_fields: Blob,
}

impl SymbolBuilder {
    pub fn set_id(&mut self, id: u64) -> &mut Self {
        self.id = Some(id);
        self
    }

    pub fn set_name(&mut self, name: impl Into<Bytes>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn set_flags(&mut self, flags: u32) -> &mut Self {
        self.flags = Some(flags);
        self
    }
}

impl Builder for SymbolBuilder {
    type Message = Symbol;

    fn merge_field(
        &mut self,
        field: &FieldDescriptor,
        value: FieldValue,
        _ctx: &mut ParseContext<'_>,
    ) -> Result<()> {
        match (field.number, value) {
            (1, FieldValue::Varint(id)) => self.id = Some(id),
            (2, FieldValue::LengthDelimited(name)) => self.name = Some(name),
            (3, FieldValue::Fixed32(flags)) => self.flags = Some(flags),
            (number, other) => {
                return Err(Error::malformed(
                    SYMBOL.name,
                    DecodeErrorKind::WireTypeMismatch {
                        field: number,
                        expected: field.wire_type as u8,
                        found: other.wire_type() as u8,
                    },
                ))
            }
        }
        Ok(())
    }

    fn unknown_fields(&self) -> &Blob {
        &self.unknown_fields
    }

    fn set_unknown_fields(&mut self, unknown_fields: Blob) -> &mut Self {
        self.unknown_fields = unknown_fields;
        self
    }

    fn is_initialized(&self) -> bool {
        self.id.is_some()
    }

    fn build_partial(&mut self) -> Symbol {
        Symbol {
            id: self.id,
            name: self.name.clone(),
            flags: self.flags,
            unknown_fields: self.unknown_fields.clone(),
            cached_size: CachedSize::new(),
        }
    }

    fn merge_from(&mut self, other: &Symbol) -> &mut Self {
        if other.id.is_some() {
            self.id = other.id;
        }
        if other.name.is_some() {
            self.name = other.name.clone();
        }
        if other.flags.is_some() {
            self.flags = other.flags;
        }
        self.merge_unknown_fields(other.unknown_fields.clone())
    }

    fn clear(&mut self) -> &mut Self {
        *self = SymbolBuilder::default();
        self
    }
}

pub fn symbol(id: u64, name: &'static str) -> Symbol {
    let mut builder = Symbol::new_builder();
    builder.set_id(id).set_name(name.as_bytes());
    match builder.build() {
        Ok(symbol) => symbol,
        Err(err) => panic!("{}", err),
    }
}
