use std::fmt;
use std::io;

use thiserror::Error;

/// Failure while decoding a single varint.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarintError {
    /// Input ended before a byte without the continuation bit.
    #[error("varint truncated after {0} bytes")]
    Truncated(usize),

    /// The continuation chain carries more than 64 bits of payload.
    #[error("varint exceeds 64 bits")]
    Overflow,
}

/// The specific reason a message failed to decode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeErrorKind {
    #[error(transparent)]
    Varint(#[from] VarintError),

    #[error("declared length {declared} exceeds the {remaining} remaining bytes")]
    TruncatedPayload { declared: u64, remaining: usize },

    #[error("unexpected end of input while reading {0}")]
    UnexpectedEof(&'static str),

    #[error("invalid tag {0:#x}")]
    InvalidTag(u64),

    #[error("field {field} expects wire type {expected}, found {found}")]
    WireTypeMismatch { field: u32, expected: u8, found: u8 },

    #[error("end-group tag for field {0} without a matching start-group")]
    UnmatchedEndGroup(u32),

    #[error("nesting depth exceeds the recursion limit of {0}")]
    RecursionLimit(usize),

    #[error("message of {size} bytes exceeds the size limit of {limit}")]
    SizeLimit { size: u64, limit: usize },
}

/// Field numbers leading from the outermost message to the failing field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<u32>);

impl FieldPath {
    pub fn new() -> Self {
        FieldPath(Vec::new())
    }

    pub fn field_numbers(&self) -> &[u32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn prepend(&mut self, field_number: u32) {
        self.0.insert(0, field_number);
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, number) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" > ")?;
            }
            write!(f, "{}", number)?;
        }
        Ok(())
    }
}

/// Unified error type for the wirelite library.
#[derive(Error, Debug)]
pub enum Error {
    /// A varint decoded outside of a message body (e.g. a delimited length prefix).
    #[error("Malformed varint: {0}")]
    MalformedVarint(#[from] VarintError),

    /// The input is not a well-formed encoding of `message`.
    ///
    /// `message` names the outermost message being parsed; `path` lists the
    /// field numbers walked through nested messages to reach the failure.
    #[error("Malformed {message} message{}: {kind}", at_path(.path))]
    MalformedMessage {
        message: &'static str,
        path: FieldPath,
        kind: DecodeErrorKind,
    },

    /// `build()` found required fields missing.
    #[error("{message} is missing required fields: {}", .missing.join(", "))]
    UninitializedMessage {
        message: &'static str,
        missing: Vec<String>,
    },

    /// A repeated field was handed an absent element.
    #[error("{message}.{field} cannot hold an absent element (index {index})")]
    NullElement {
        message: &'static str,
        field: &'static str,
        index: usize,
    },

    #[error("index {index} out of bounds for {message}.{field} of length {len}")]
    IndexOutOfBounds {
        message: &'static str,
        field: &'static str,
        index: usize,
        len: usize,
    },

    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
}

fn at_path(path: &FieldPath) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" at field {}", path)
    }
}

impl Error {
    /// Creates a `MalformedMessage` error raised directly inside `message`.
    pub fn malformed(message: &'static str, kind: impl Into<DecodeErrorKind>) -> Self {
        Error::MalformedMessage {
            message,
            path: FieldPath::new(),
            kind: kind.into(),
        }
    }

    /// Re-labels a decode failure that surfaced while parsing `field_number`
    /// of the enclosing `message`. Other variants pass through untouched.
    pub fn within(self, message: &'static str, field_number: u32) -> Self {
        match self {
            Error::MalformedMessage { mut path, kind, .. } => {
                path.prepend(field_number);
                Error::MalformedMessage { message, path, kind }
            }
            other => other,
        }
    }

    /// The decode reason, if this is a `MalformedMessage`.
    pub fn decode_kind(&self) -> Option<&DecodeErrorKind> {
        match self {
            Error::MalformedMessage { kind, .. } => Some(kind),
            _ => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Error::MalformedMessage { .. } | Error::MalformedVarint(_))
    }
}

/// A specialized `Result` type for wirelite operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Returned by `Builder::build` when required fields are absent.
///
/// Carries the partially built message so callers can report on it.
#[derive(Debug, Clone)]
pub struct UninitializedMessage<M> {
    message: &'static str,
    missing: Vec<String>,
    partial: M,
}

impl<M> UninitializedMessage<M> {
    pub fn new(message: &'static str, missing: Vec<String>, partial: M) -> Self {
        UninitializedMessage {
            message,
            missing,
            partial,
        }
    }

    pub fn message_name(&self) -> &'static str {
        self.message
    }

    /// Paths of the missing required fields, e.g. `types[2].id`.
    pub fn missing_fields(&self) -> &[String] {
        &self.missing
    }

    pub fn partial(&self) -> &M {
        &self.partial
    }

    pub fn into_partial(self) -> M {
        self.partial
    }
}

impl<M> fmt::Display for UninitializedMessage<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} is missing required fields: {}",
            self.message,
            self.missing.join(", ")
        )
    }
}

impl<M: fmt::Debug> std::error::Error for UninitializedMessage<M> {}

impl<M> From<UninitializedMessage<M>> for Error {
    fn from(err: UninitializedMessage<M>) -> Self {
        Error::UninitializedMessage {
            message: err.message,
            missing: err.missing,
        }
    }
}
