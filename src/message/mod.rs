// Message protocol: immutable messages, their builders, and the shared
// read/write entry points every message type inherits.

pub mod descriptor;
pub mod raw;
pub mod repeated;
pub mod type_table;

use std::fmt;
use std::io;
use std::sync::OnceLock;

use bytes::Bytes;

use crate::codec::blob::Blob;
use crate::codec::decode::{self, ParseContext};
use crate::codec::encode::{self, MessageWriter};
use crate::codec::types::FieldValue;
use crate::config::ReaderOptions;
use crate::internal::error::{Error, Result, UninitializedMessage};

pub use descriptor::{FieldDescriptor, FieldLabel, MessageDescriptor};
pub use raw::{RawMessage, RawMessageBuilder};
pub use repeated::{FrozenList, RepeatedField};
pub use type_table::{TypeTable, TypeTableBuilder};

/// Lazily computed serialized size of an immutable message.
#[derive(Debug, Clone, Default)]
pub struct CachedSize(OnceLock<usize>);

impl CachedSize {
    pub fn new() -> Self {
        CachedSize::default()
    }

    pub fn get(&self) -> Option<usize> {
        self.0.get().copied()
    }

    pub fn get_or_compute(&self, compute: impl FnOnce() -> usize) -> usize {
        *self.0.get_or_init(compute)
    }
}

/// An immutable, fully constructed message.
///
/// Implementors provide field access and the encoding of their known
/// fields; framing, unknown-field handling, size memoization and the parse
/// entry points are shared.
pub trait Message: Clone + PartialEq + fmt::Debug + Send + Sync + Sized + 'static {
    type Builder: Builder<Message = Self>;

    fn descriptor() -> &'static MessageDescriptor;

    /// Raw bytes of every field this type did not recognize when parsed.
    fn unknown_fields(&self) -> &Blob;

    fn cached_size(&self) -> &CachedSize;

    /// Encoded size of the known fields only.
    fn compute_fields_size(&self) -> usize;

    /// Writes the known fields in field-number order.
    fn write_fields(&self, writer: &mut MessageWriter);

    /// True when every required field, recursively, is present.
    fn is_initialized(&self) -> bool;

    /// Paths of missing required fields, e.g. `types[2].id`. Empty when
    /// `is_initialized()` holds.
    fn missing_fields(&self) -> Vec<String>;

    fn new_builder() -> Self::Builder {
        Self::Builder::default()
    }

    /// A builder that starts out sharing `prototype`'s storage.
    fn new_builder_from(prototype: &Self) -> Self::Builder {
        prototype.to_builder()
    }

    fn to_builder(&self) -> Self::Builder {
        let mut builder = Self::Builder::default();
        builder.merge_from(self);
        builder
    }

    /// Exact encoded length, computed once per message.
    fn serialized_size(&self) -> usize {
        self.cached_size()
            .get_or_compute(|| self.compute_fields_size() + self.unknown_fields().len())
    }

    fn write_to(&self, writer: &mut MessageWriter) {
        encode::write_message(self, writer);
    }

    fn serialize(&self) -> Bytes {
        encode::serialize(self)
    }

    /// Serializes with a leading varint length, for back-to-back framing.
    fn serialize_delimited(&self) -> Bytes {
        encode::serialize_delimited(self)
    }

    fn write_delimited_to<W: io::Write>(&self, out: &mut W) -> Result<()> {
        encode::write_delimited_to(self, out)
    }

    /// Parses a complete message. Required fields are not enforced; check
    /// `is_initialized()` or use `parse_initialized`.
    fn parse(data: impl Into<Bytes>) -> Result<Self> {
        Self::parse_with_options(data, &ReaderOptions::default())
    }

    fn parse_with_options(data: impl Into<Bytes>, options: &ReaderOptions) -> Result<Self> {
        decode::parse_message(data.into(), options)
    }

    /// Parses and fails with `UninitializedMessage` if required fields are missing.
    fn parse_initialized(data: impl Into<Bytes>) -> Result<Self> {
        let message = Self::parse(data)?;
        if message.is_initialized() {
            Ok(message)
        } else {
            Err(Error::UninitializedMessage {
                message: Self::descriptor().name,
                missing: message.missing_fields(),
            })
        }
    }

    /// Parses one length-prefixed message from the front of `buf`,
    /// advancing it. `Ok(None)` when `buf` is empty.
    fn parse_delimited(buf: &mut Bytes) -> Result<Option<Self>> {
        Self::parse_delimited_with_options(buf, &ReaderOptions::default())
    }

    fn parse_delimited_with_options(buf: &mut Bytes, options: &ReaderOptions) -> Result<Option<Self>> {
        decode::parse_delimited(buf, options)
    }

    /// Reads one length-prefixed message from a stream. `Ok(None)` on a
    /// clean end of stream.
    fn read_delimited<R: io::Read>(reader: &mut R) -> Result<Option<Self>> {
        Self::read_delimited_with_options(reader, &ReaderOptions::default())
    }

    fn read_delimited_with_options<R: io::Read>(
        reader: &mut R,
        options: &ReaderOptions,
    ) -> Result<Option<Self>> {
        decode::read_delimited(reader, options)
    }
}

/// Mutable, single-owner accumulator for a `Message`.
pub trait Builder: Default + Clone + fmt::Debug {
    type Message: Message<Builder = Self>;

    /// Accepts one decoded known field. Called by the parse loop only for
    /// fields listed in the message descriptor, with the declared wire type.
    fn merge_field(
        &mut self,
        field: &FieldDescriptor,
        value: FieldValue,
        ctx: &mut ParseContext<'_>,
    ) -> Result<()>;

    fn unknown_fields(&self) -> &Blob;

    fn set_unknown_fields(&mut self, unknown_fields: Blob) -> &mut Self;

    /// Appends raw unknown-field bytes after those already held.
    fn merge_unknown_fields(&mut self, raw: Blob) -> &mut Self {
        let merged = self.unknown_fields().concat(&raw);
        self.set_unknown_fields(merged)
    }

    fn is_initialized(&self) -> bool;

    /// Freezes the current state into a message without checking required
    /// fields. Meant for diagnostics; production paths use `build`.
    fn build_partial(&mut self) -> Self::Message;

    /// Appends `other`'s repeated elements after ours, overwrites scalars
    /// `other` sets, and appends its unknown fields after ours.
    fn merge_from(&mut self, other: &Self::Message) -> &mut Self;

    /// Resets every field, including unknown fields.
    fn clear(&mut self) -> &mut Self;

    fn build(&mut self) -> std::result::Result<Self::Message, UninitializedMessage<Self::Message>> {
        let message = self.build_partial();
        if message.is_initialized() {
            Ok(message)
        } else {
            let missing = message.missing_fields();
            Err(UninitializedMessage::new(
                <Self::Message as Message>::descriptor().name,
                missing,
                message,
            ))
        }
    }

    /// Parses `data` and merges the result. On failure the builder is
    /// left as it was.
    fn merge_from_bytes(&mut self, data: impl Into<Bytes>) -> Result<&mut Self> {
        let parsed = <Self::Message as Message>::parse(data)?;
        Ok(self.merge_from(&parsed))
    }
}
