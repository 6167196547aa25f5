use byteorder::{ByteOrder, LittleEndian};
use bytes::Bytes;

use crate::codec::types::{FieldValue, Tag, WireType};
use crate::codec::varint::decode_varint;
use crate::internal::error::DecodeErrorKind;

type ReadResult<T> = std::result::Result<T, DecodeErrorKind>;

/// A forward-only cursor over one message body.
///
/// Length-delimited payloads are returned as slices of the input `Bytes`,
/// so nested messages and captured unknown fields share the caller's buffer.
#[derive(Debug, Clone)]
pub struct MessageReader {
    data: Bytes,
    pos: usize,
}

impl MessageReader {
    pub fn new(data: Bytes) -> Self {
        MessageReader { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// The whole input, including bytes already consumed.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn read_varint(&mut self) -> ReadResult<u64> {
        let (value, read) = decode_varint(&self.data[self.pos..])?;
        self.pos += read;
        Ok(value)
    }

    /// Reads the next tag. Returns `None` once the input is exhausted; a
    /// zero tag inside the body is an invalid tag.
    pub fn read_tag(&mut self) -> ReadResult<Option<Tag>> {
        if self.is_at_end() {
            return Ok(None);
        }
        let raw = self.read_varint()?;
        Tag::from_raw(raw).map(Some)
    }

    pub fn read_fixed32(&mut self) -> ReadResult<u32> {
        let bytes = self.take(4, "fixed32")?;
        Ok(LittleEndian::read_u32(&bytes))
    }

    pub fn read_fixed64(&mut self) -> ReadResult<u64> {
        let bytes = self.take(8, "fixed64")?;
        Ok(LittleEndian::read_u64(&bytes))
    }

    /// Reads a length prefix and returns exactly that many following bytes.
    pub fn read_length_delimited(&mut self) -> ReadResult<Bytes> {
        let declared = self.read_varint()?;
        let remaining = self.remaining();
        if declared > remaining as u64 {
            return Err(DecodeErrorKind::TruncatedPayload {
                declared,
                remaining,
            });
        }
        let end = self.pos + declared as usize;
        let payload = self.data.slice(self.pos..end);
        self.pos = end;
        Ok(payload)
    }

    /// Reads the value following `tag` for a known field.
    pub fn read_value(&mut self, tag: Tag) -> ReadResult<FieldValue> {
        match tag.wire_type() {
            WireType::Varint => self.read_varint().map(FieldValue::Varint),
            WireType::Fixed64 => self.read_fixed64().map(FieldValue::Fixed64),
            WireType::Fixed32 => self.read_fixed32().map(FieldValue::Fixed32),
            WireType::LengthDelimited => self.read_length_delimited().map(FieldValue::LengthDelimited),
            // Known fields never use groups.
            WireType::StartGroup | WireType::EndGroup => Err(DecodeErrorKind::InvalidTag(tag.raw())),
        }
    }

    /// Advances past the payload of `tag` without interpreting it.
    ///
    /// Groups are skipped up to and including their matching end-group tag.
    /// A bare end-group tag is an error: it can only appear inside a group.
    pub fn skip_field(&mut self, tag: Tag) -> ReadResult<()> {
        match tag.wire_type() {
            WireType::Varint => self.read_varint().map(drop),
            WireType::Fixed64 => self.take(8, "fixed64").map(drop),
            WireType::Fixed32 => self.take(4, "fixed32").map(drop),
            WireType::LengthDelimited => self.read_length_delimited().map(drop),
            WireType::StartGroup => self.skip_group(tag.field_number()),
            WireType::EndGroup => Err(DecodeErrorKind::UnmatchedEndGroup(tag.field_number())),
        }
    }

    fn skip_group(&mut self, field_number: u32) -> ReadResult<()> {
        // Open groups, innermost last. Kept on the heap so deeply nested
        // groups cannot exhaust the call stack.
        let mut open = vec![field_number];
        while let Some(&current) = open.last() {
            if self.is_at_end() {
                return Err(DecodeErrorKind::UnexpectedEof("group"));
            }
            let raw = self.read_varint()?;
            let tag = Tag::from_raw(raw)?;
            match tag.wire_type() {
                WireType::StartGroup => open.push(tag.field_number()),
                WireType::EndGroup if tag.field_number() == current => {
                    open.pop();
                }
                WireType::EndGroup => {
                    return Err(DecodeErrorKind::UnmatchedEndGroup(tag.field_number()))
                }
                _ => self.skip_field(tag)?,
            }
        }
        Ok(())
    }

    fn take(&mut self, len: usize, what: &'static str) -> ReadResult<Bytes> {
        if self.remaining() < len {
            return Err(DecodeErrorKind::UnexpectedEof(what));
        }
        let bytes = self.data.slice(self.pos..self.pos + len);
        self.pos += len;
        Ok(bytes)
    }
}
