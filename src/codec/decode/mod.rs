// Decode module: the descriptor-driven parse loop shared by every message type

pub mod reader;
mod unknown;

use std::io::{self, Read};
use std::ops::Range;

use bytes::{Buf, Bytes};
use tracing::{debug, trace};

use crate::codec::types::WireType;
use crate::codec::varint::{self, MAX_VARINT_LEN};
use crate::config::ReaderOptions;
use crate::internal::error::{DecodeErrorKind, Error, Result, VarintError};
use crate::message::{Builder, Message};

pub use reader::MessageReader;
use unknown::UnknownFieldCollector;

/// State threaded through one top-level parse and all of its nested parses.
#[derive(Debug)]
pub struct ParseContext<'o> {
    options: &'o ReaderOptions,
    depth: usize,
}

impl<'o> ParseContext<'o> {
    pub fn new(options: &'o ReaderOptions) -> Self {
        ParseContext { options, depth: 0 }
    }

    pub fn options(&self) -> &ReaderOptions {
        self.options
    }

    /// Nesting depth of the message currently being parsed (top level is 0).
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Parses `data` as a complete nested message of type `M`.
    ///
    /// Errors carry `M`'s name; the caller's parse loop re-labels them with
    /// its own name and field number as they unwind.
    pub fn parse_nested<M: Message>(&mut self, data: Bytes) -> Result<M> {
        if let Some(limit) = self.options.recursion_limit {
            if self.depth >= limit {
                return Err(Error::malformed(
                    M::descriptor().name,
                    DecodeErrorKind::RecursionLimit(limit),
                ));
            }
        }
        self.depth += 1;
        let result = parse_body::<M>(data, self);
        self.depth -= 1;
        result
    }
}

/// Runs the parse loop over one message body, feeding `builder`.
///
/// Known fields with the declared wire type go to `Builder::merge_field`.
/// A known field with any other wire type is malformed. Unknown fields are
/// captured as raw bytes, in encounter order, and appended to the builder's
/// unknown-field blob once the body has been consumed.
pub fn merge_message<B: Builder>(builder: &mut B, data: Bytes, ctx: &mut ParseContext<'_>) -> Result<()> {
    let descriptor = B::Message::descriptor();
    let name = descriptor.name;
    let mut reader = MessageReader::new(data);
    let mut unknown = UnknownFieldCollector::new();

    loop {
        let start = reader.position();
        let tag = match reader.read_tag().map_err(|kind| Error::malformed(name, kind))? {
            Some(tag) => tag,
            None => break,
        };
        let field_number = tag.field_number();

        match descriptor.field(field_number) {
            Some(field) => {
                if field.wire_type != tag.wire_type() {
                    return Err(Error::malformed(
                        name,
                        DecodeErrorKind::WireTypeMismatch {
                            field: field_number,
                            expected: field.wire_type as u8,
                            found: tag.wire_type() as u8,
                        },
                    )
                    .within(name, field_number));
                }
                let value = reader
                    .read_value(tag)
                    .map_err(|kind| Error::malformed(name, kind).within(name, field_number))?;
                builder
                    .merge_field(field, value, ctx)
                    .map_err(|err| err.within(name, field_number))?;
            }
            None => {
                if tag.wire_type() == WireType::EndGroup {
                    return Err(Error::malformed(
                        name,
                        DecodeErrorKind::UnmatchedEndGroup(field_number),
                    ));
                }
                reader
                    .skip_field(tag)
                    .map_err(|kind| Error::malformed(name, kind).within(name, field_number))?;
                trace!(
                    message = name,
                    field = field_number,
                    wire_type = %tag.wire_type(),
                    bytes = reader.position() - start,
                    "captured unknown field"
                );
                unknown.capture(start..reader.position());
            }
        }
    }

    if let Some(raw) = unknown.finish(reader.data()) {
        builder.merge_unknown_fields(raw);
    }
    Ok(())
}

/// Parses one message body into a fresh builder and freezes it.
///
/// Initialization is not checked here; see `Message::parse_initialized`.
fn parse_body<M: Message>(data: Bytes, ctx: &mut ParseContext<'_>) -> Result<M> {
    let mut builder = M::Builder::default();
    merge_message(&mut builder, data, ctx)?;
    Ok(builder.build_partial())
}

fn check_size_limit<M: Message>(size: u64, options: &ReaderOptions) -> Result<()> {
    match options.size_limit {
        Some(limit) if size > limit as u64 => Err(Error::malformed(
            M::descriptor().name,
            DecodeErrorKind::SizeLimit { size, limit },
        )),
        _ => Ok(()),
    }
}

/// Parses `data` as exactly one top-level message.
pub fn parse_message<M: Message>(data: Bytes, options: &ReaderOptions) -> Result<M> {
    check_size_limit::<M>(data.len() as u64, options)?;
    let len = data.len();
    let mut ctx = ParseContext::new(options);
    let message = parse_body::<M>(data, &mut ctx)?;
    debug!(message = M::descriptor().name, bytes = len, "parsed message");
    Ok(message)
}

/// Parses one length-prefixed message from the front of `buf`.
///
/// Returns `Ok(None)` if `buf` is empty. `buf` is advanced past the message
/// only on success.
pub fn parse_delimited<M: Message>(buf: &mut Bytes, options: &ReaderOptions) -> Result<Option<M>> {
    if buf.is_empty() {
        return Ok(None);
    }
    let (declared, prefix_len) = varint::decode_varint(&buf[..])?;
    let remaining = buf.len() - prefix_len;
    if declared > remaining as u64 {
        return Err(Error::malformed(
            M::descriptor().name,
            DecodeErrorKind::TruncatedPayload {
                declared,
                remaining,
            },
        ));
    }
    check_size_limit::<M>(declared, options)?;

    let body: Range<usize> = prefix_len..prefix_len + declared as usize;
    let message = parse_message::<M>(buf.slice(body.clone()), options)?;
    buf.advance(body.end);
    Ok(Some(message))
}

/// Reads one length-prefixed message from a byte stream.
///
/// Returns `Ok(None)` on a clean end of stream before the length prefix.
pub fn read_delimited<M: Message, R: Read>(reader: &mut R, options: &ReaderOptions) -> Result<Option<M>> {
    let declared = match read_length_prefix(reader)? {
        Some(len) => len,
        None => return Ok(None),
    };
    check_size_limit::<M>(declared, options)?;

    // Read through `take` so a bogus length cannot force a huge allocation.
    let mut body = Vec::new();
    reader.by_ref().take(declared).read_to_end(&mut body)?;
    if (body.len() as u64) < declared {
        return Err(Error::malformed(
            M::descriptor().name,
            DecodeErrorKind::TruncatedPayload {
                declared,
                remaining: body.len(),
            },
        ));
    }
    parse_message::<M>(Bytes::from(body), options).map(Some)
}

fn read_length_prefix<R: Read>(reader: &mut R) -> Result<Option<u64>> {
    let mut prefix = [0u8; MAX_VARINT_LEN];
    for i in 0..MAX_VARINT_LEN {
        let mut byte = [0u8; 1];
        loop {
            match reader.read(&mut byte) {
                Ok(0) if i == 0 => return Ok(None),
                Ok(0) => return Err(Error::MalformedVarint(VarintError::Truncated(i))),
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        prefix[i] = byte[0];
        if byte[0] & 0x80 == 0 {
            let (value, _) = varint::decode_varint(&prefix[..=i])?;
            return Ok(Some(value));
        }
    }
    Err(Error::MalformedVarint(VarintError::Overflow))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{RawMessage, TypeTable};

    #[test]
    fn test_read_length_prefix() {
        let mut input: &[u8] = &[0xAC, 0x02, 0xFF];
        assert_eq!(read_length_prefix(&mut input).unwrap(), Some(300));
        assert_eq!(input, &[0xFF]);

        let mut empty: &[u8] = &[];
        assert_eq!(read_length_prefix(&mut empty).unwrap(), None);

        let mut truncated: &[u8] = &[0x80];
        assert!(matches!(
            read_length_prefix(&mut truncated),
            Err(Error::MalformedVarint(VarintError::Truncated(1)))
        ));
    }

    #[test]
    fn test_recursion_limit() {
        // TypeTable { types: [ TypeTable { types: [ RawMessage {} ] } ] }
        let data = Bytes::from_static(&[0x0a, 0x02, 0x0a, 0x00]);
        let nested: TypeTable<TypeTable<RawMessage>> =
            parse_message(data.clone(), &ReaderOptions::default()).unwrap();
        assert_eq!(nested.types_list()[0].types_count(), 1);

        let options = ReaderOptions::new().with_recursion_limit(1);
        let err = parse_message::<TypeTable<TypeTable<RawMessage>>>(data, &options).unwrap_err();
        match err {
            Error::MalformedMessage { message, path, kind } => {
                assert_eq!(message, "TypeTable");
                assert_eq!(path.field_numbers(), &[1, 1]);
                assert_eq!(kind, DecodeErrorKind::RecursionLimit(1));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_size_limit() {
        let options = ReaderOptions::new().with_size_limit(2);
        let err = parse_message::<RawMessage>(Bytes::from_static(&[0x08, 0x01, 0x08]), &options)
            .unwrap_err();
        assert_eq!(
            err.decode_kind(),
            Some(&DecodeErrorKind::SizeLimit { size: 3, limit: 2 })
        );
    }

    #[test]
    fn test_parse_delimited_leaves_buffer_on_error() {
        // Declares 4 bytes but only 2 follow.
        let mut buf = Bytes::from_static(&[0x04, 0x08, 0x01]);
        let err = parse_delimited::<RawMessage>(&mut buf, &ReaderOptions::default()).unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn test_zero_tag_inside_message_is_malformed() {
        let err = parse_message::<RawMessage>(
            Bytes::from_static(&[0x08, 0x01, 0x00, 0x08, 0x02]),
            &ReaderOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.decode_kind(), Some(&DecodeErrorKind::InvalidTag(0)));

        // Inside a nested element the error carries the outer name and path.
        let err = parse_message::<TypeTable<RawMessage>>(
            Bytes::from_static(&[0x0a, 0x05, 0x08, 0x01, 0x00, 0x08, 0x02]),
            &ReaderOptions::default(),
        )
        .unwrap_err();
        match err {
            Error::MalformedMessage { message, path, kind } => {
                assert_eq!(message, "TypeTable");
                assert_eq!(path.field_numbers(), &[1]);
                assert_eq!(kind, DecodeErrorKind::InvalidTag(0));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
