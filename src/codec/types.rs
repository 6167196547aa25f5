use std::fmt;

use bytes::Bytes;

use crate::internal::error::DecodeErrorKind;

/// Largest field number a tag can carry.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Framing category of the bytes following a tag.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
}

impl WireType {
    /// Converts the low three bits of a tag into a wire type.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::LengthDelimited),
            3 => Some(WireType::StartGroup),
            4 => Some(WireType::EndGroup),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireType::Varint => "varint",
            WireType::Fixed64 => "fixed64",
            WireType::LengthDelimited => "length-delimited",
            WireType::StartGroup => "start-group",
            WireType::EndGroup => "end-group",
            WireType::Fixed32 => "fixed32",
        };
        f.write_str(name)
    }
}

/// A field tag: `field_number << 3 | wire_type`.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub struct Tag {
    field_number: u32,
    wire_type: WireType,
}

impl Tag {
    /// Creates a tag. `field_number` must be in `1..=MAX_FIELD_NUMBER`.
    pub const fn new(field_number: u32, wire_type: WireType) -> Self {
        Tag {
            field_number,
            wire_type,
        }
    }

    /// Splits a raw tag value into field number and wire type.
    ///
    /// Zero is not a valid tag and is rejected along with unknown wire types
    /// and out-of-range field numbers.
    pub fn from_raw(raw: u64) -> Result<Self, DecodeErrorKind> {
        let field_number = raw >> 3;
        if field_number == 0 || field_number > MAX_FIELD_NUMBER as u64 {
            return Err(DecodeErrorKind::InvalidTag(raw));
        }
        let wire_type =
            WireType::from_byte((raw & 0x7) as u8).ok_or(DecodeErrorKind::InvalidTag(raw))?;
        Ok(Tag {
            field_number: field_number as u32,
            wire_type,
        })
    }

    pub const fn raw(self) -> u64 {
        ((self.field_number as u64) << 3) | self.wire_type as u64
    }

    pub const fn field_number(self) -> u32 {
        self.field_number
    }

    pub const fn wire_type(self) -> WireType {
        self.wire_type
    }
}

/// A decoded value of a known field, before the message type interprets it.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum FieldValue {
    Varint(u64),
    Fixed64(u64),
    Fixed32(u32),
    /// Zero-copy slice of the input.
    LengthDelimited(Bytes),
}

impl FieldValue {
    pub fn wire_type(&self) -> WireType {
        match self {
            FieldValue::Varint(_) => WireType::Varint,
            FieldValue::Fixed64(_) => WireType::Fixed64,
            FieldValue::Fixed32(_) => WireType::Fixed32,
            FieldValue::LengthDelimited(_) => WireType::LengthDelimited,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_tag() {
        let tag = Tag::from_raw(10).unwrap();
        assert_eq!(tag.field_number(), 1);
        assert_eq!(tag.wire_type(), WireType::LengthDelimited);
        assert_eq!(tag.raw(), 10);

        let tag = Tag::from_raw((150 << 3) | 5).unwrap();
        assert_eq!(tag, Tag::new(150, WireType::Fixed32));
    }

    #[test]
    fn test_invalid_tags() {
        // Field number zero.
        assert_eq!(Tag::from_raw(2), Err(DecodeErrorKind::InvalidTag(2)));
        // Wire types 6 and 7 do not exist.
        assert_eq!(Tag::from_raw(14), Err(DecodeErrorKind::InvalidTag(14)));
        assert_eq!(Tag::from_raw(15), Err(DecodeErrorKind::InvalidTag(15)));
        // Field number past 2^29 - 1.
        let raw = ((MAX_FIELD_NUMBER as u64) + 1) << 3;
        assert_eq!(Tag::from_raw(raw), Err(DecodeErrorKind::InvalidTag(raw)));
        assert!(Tag::from_raw((MAX_FIELD_NUMBER as u64) << 3).is_ok());
    }

    #[test]
    fn test_wire_type_from_byte() {
        assert_eq!(WireType::from_byte(0), Some(WireType::Varint));
        assert_eq!(WireType::from_byte(2), Some(WireType::LengthDelimited));
        assert_eq!(WireType::from_byte(6), None);
        assert_eq!(WireType::LengthDelimited.to_string(), "length-delimited");
    }
}
