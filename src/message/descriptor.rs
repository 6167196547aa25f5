use crate::codec::types::{Tag, WireType};

/// Cardinality of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLabel {
    Optional,
    Required,
    Repeated,
}

/// Static description of one known field.
///
/// Known fields use `Varint`, `Fixed32`, `Fixed64` or `LengthDelimited`;
/// groups are only ever skipped as unknown fields.
#[derive(Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub number: u32,
    pub name: &'static str,
    pub wire_type: WireType,
    pub label: FieldLabel,
}

impl FieldDescriptor {
    pub const fn new(number: u32, name: &'static str, wire_type: WireType, label: FieldLabel) -> Self {
        FieldDescriptor {
            number,
            name,
            wire_type,
            label,
        }
    }

    pub const fn tag(&self) -> Tag {
        Tag::new(self.number, self.wire_type)
    }
}

/// Field table of one message type, sorted by field number.
#[derive(Debug)]
pub struct MessageDescriptor {
    pub name: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl MessageDescriptor {
    pub const fn new(name: &'static str, fields: &'static [FieldDescriptor]) -> Self {
        MessageDescriptor { name, fields }
    }

    pub fn field(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields
            .binary_search_by_key(&number, |f| f.number)
            .ok()
            .map(|i| &self.fields[i])
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.label == FieldLabel::Required)
    }
}
