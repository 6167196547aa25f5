use std::fmt;

use crate::codec::blob::Blob;
use crate::codec::decode::ParseContext;
use crate::codec::encode::MessageWriter;
use crate::codec::types::FieldValue;
use crate::internal::error::Result;
use crate::message::{Builder, CachedSize, FieldDescriptor, Message, MessageDescriptor};

static RAW_MESSAGE: MessageDescriptor = MessageDescriptor::new("RawMessage", &[]);

/// A message with no known fields: every field is kept as raw bytes and
/// written back unchanged.
///
/// Useful as the element type of a container whose elements are opaque, and
/// for inspecting arbitrary encoded data.
#[derive(Clone, Default)]
pub struct RawMessage {
    unknown_fields: Blob,
    cached_size: CachedSize,
}

impl RawMessage {
    pub fn new() -> Self {
        RawMessage::default()
    }

    pub fn from_blob(raw: Blob) -> Self {
        RawMessage {
            unknown_fields: raw,
            cached_size: CachedSize::new(),
        }
    }
}

impl PartialEq for RawMessage {
    fn eq(&self, other: &Self) -> bool {
        self.unknown_fields == other.unknown_fields
    }
}

impl fmt::Debug for RawMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawMessage")
            .field("unknown_fields", &self.unknown_fields)
            .finish()
    }
}

impl Message for RawMessage {
    type Builder = RawMessageBuilder;

    fn descriptor() -> &'static MessageDescriptor {
        &RAW_MESSAGE
    }

    fn unknown_fields(&self) -> &Blob {
        &self.unknown_fields
    }

    fn cached_size(&self) -> &CachedSize {
        &self.cached_size
    }

    fn compute_fields_size(&self) -> usize {
        0
    }

    fn write_fields(&self, _writer: &mut MessageWriter) {}

    fn is_initialized(&self) -> bool {
        true
    }

    fn missing_fields(&self) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RawMessageBuilder {
    unknown_fields: Blob,
}

impl Builder for RawMessageBuilder {
    type Message = RawMessage;

    fn merge_field(
        &mut self,
        _field: &FieldDescriptor,
        _value: FieldValue,
        _ctx: &mut ParseContext<'_>,
    ) -> Result<()> {
        // No known fields; the parse loop never calls this.
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
        true
    }

    fn build_partial(&mut self) -> RawMessage {
        RawMessage::from_blob(self.unknown_fields.clone())
    }

    fn merge_from(&mut self, other: &RawMessage) -> &mut Self {
        self.merge_unknown_fields(other.unknown_fields.clone())
    }

    fn clear(&mut self) -> &mut Self {
        self.unknown_fields = Blob::new();
        self
    }
}
