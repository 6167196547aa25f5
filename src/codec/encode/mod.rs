// Encode module: wire-level writer and size helpers

use std::io;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::trace;

use crate::codec::blob::Blob;
use crate::codec::types::{Tag, WireType};
use crate::codec::varint::{put_varint, varint_size};
use crate::internal::error::Result;
use crate::message::Message;

/// Size of the tag for `field_number` (independent of the wire type).
pub fn tag_size(field_number: u32) -> usize {
    varint_size((field_number as u64) << 3)
}

/// Size of a varint field including its tag.
pub fn varint_field_size(field_number: u32, value: u64) -> usize {
    tag_size(field_number) + varint_size(value)
}

/// Size of a length-delimited field with a payload of `len` bytes, including
/// its tag and length prefix.
pub fn length_delimited_field_size(field_number: u32, len: usize) -> usize {
    tag_size(field_number) + varint_size(len as u64) + len
}

/// Size of an embedded message field. Memoizes the message's own size.
pub fn message_field_size<M: Message>(field_number: u32, message: &M) -> usize {
    length_delimited_field_size(field_number, message.serialized_size())
}

/// Append-only encoder backed by a `BytesMut`.
#[derive(Debug, Default)]
pub struct MessageWriter {
    buf: BytesMut,
}

impl MessageWriter {
    pub fn new() -> Self {
        MessageWriter::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        MessageWriter {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }

    pub fn write_tag(&mut self, field_number: u32, wire_type: WireType) {
        put_varint(&mut self.buf, Tag::new(field_number, wire_type).raw());
    }

    pub fn write_varint(&mut self, value: u64) {
        put_varint(&mut self.buf, value);
    }

    pub fn write_varint_field(&mut self, field_number: u32, value: u64) {
        self.write_tag(field_number, WireType::Varint);
        self.write_varint(value);
    }

    pub fn write_fixed32_field(&mut self, field_number: u32, value: u32) {
        self.write_tag(field_number, WireType::Fixed32);
        self.buf.put_u32_le(value);
    }

    pub fn write_fixed64_field(&mut self, field_number: u32, value: u64) {
        self.write_tag(field_number, WireType::Fixed64);
        self.buf.put_u64_le(value);
    }

    pub fn write_bytes_field(&mut self, field_number: u32, value: &[u8]) {
        self.write_tag(field_number, WireType::LengthDelimited);
        self.write_varint(value.len() as u64);
        self.buf.put_slice(value);
    }

    /// Writes `message` as a length-delimited field. The length prefix
    /// comes from the message's memoized size.
    pub fn write_message_field<M: Message>(&mut self, field_number: u32, message: &M) {
        self.write_tag(field_number, WireType::LengthDelimited);
        self.write_varint(message.serialized_size() as u64);
        message.write_to(self);
    }

    /// Copies raw, already-encoded bytes.
    pub fn write_blob(&mut self, blob: &Blob) {
        blob.write_to(&mut self.buf);
    }
}

/// Writes `message` as known fields followed by its unknown-field blob.
///
/// The size is computed first so every enclosing length prefix is already
/// memoized and agrees with the bytes written.
pub(crate) fn write_message<M: Message>(message: &M, writer: &mut MessageWriter) {
    let expected = message.serialized_size();
    let start = writer.len();
    message.write_fields(writer);
    writer.write_blob(message.unknown_fields());
    debug_assert_eq!(
        writer.len() - start,
        expected,
        "{} wrote a different number of bytes than it reported",
        M::descriptor().name
    );
}

/// Serializes `message` into a fresh buffer of exactly the right size.
pub(crate) fn serialize<M: Message>(message: &M) -> Bytes {
    let size = message.serialized_size();
    let mut writer = MessageWriter::with_capacity(size);
    message.write_to(&mut writer);
    trace!(message = M::descriptor().name, bytes = size, "serialized message");
    writer.into_bytes()
}

/// Serializes `message` prefixed with its length as a varint.
pub(crate) fn serialize_delimited<M: Message>(message: &M) -> Bytes {
    let size = message.serialized_size();
    let mut writer = MessageWriter::with_capacity(varint_size(size as u64) + size);
    writer.write_varint(size as u64);
    message.write_to(&mut writer);
    writer.into_bytes()
}

pub(crate) fn write_delimited_to<M: Message, W: io::Write>(message: &M, out: &mut W) -> Result<()> {
    out.write_all(&serialize_delimited(message))?;
    Ok(())
}
