// wirelite library entry point
//
// Schema-agnostic binary message codec: varints, tags and wire types,
// unknown-field preservation, and an immutable message / copy-on-write
// builder lifecycle.

pub mod codec;
pub mod config;
pub mod internal;
pub mod message;

pub use codec::blob::Blob;
pub use codec::encode::MessageWriter;
pub use codec::types::{FieldValue, Tag, WireType};
pub use config::ReaderOptions;
pub use internal::error::{DecodeErrorKind, Error, FieldPath, Result, UninitializedMessage, VarintError};
pub use message::{Builder, Message, RawMessage, RawMessageBuilder, TypeTable, TypeTableBuilder};

/// Traits needed to call `parse`, `serialize` and `build`.
pub mod prelude {
    pub use crate::message::{Builder, Message};
}
