// TypeTable: a container holding an ordered list of element messages in
// field 1.

use std::fmt;
use std::sync::OnceLock;

use tracing::{debug, trace};

use crate::codec::blob::Blob;
use crate::codec::decode::ParseContext;
use crate::codec::encode::{message_field_size, MessageWriter};
use crate::codec::types::{FieldValue, WireType};
use crate::internal::error::{DecodeErrorKind, Error, Result};
use crate::message::raw::RawMessage;
use crate::message::repeated::{FrozenList, RepeatedField};
use crate::message::{Builder, CachedSize, FieldDescriptor, FieldLabel, Message, MessageDescriptor};

pub const TYPES_FIELD_NUMBER: u32 = 1;

static TYPE_TABLE_FIELDS: [FieldDescriptor; 1] = [FieldDescriptor::new(
    TYPES_FIELD_NUMBER,
    "types",
    WireType::LengthDelimited,
    FieldLabel::Repeated,
)];

static TYPE_TABLE: MessageDescriptor = MessageDescriptor::new("TypeTable", &TYPE_TABLE_FIELDS);

/// Immutable container of element messages.
///
/// Elements keep their insertion order and are never absent. The element
/// type defaults to `RawMessage`, which carries each element's bytes
/// verbatim.
pub struct TypeTable<E: Message = RawMessage> {
    types: FrozenList<E>,
    unknown_fields: Blob,
    cached_size: CachedSize,
    initialized: OnceLock<bool>,
}

impl<E: Message> TypeTable<E> {
    /// The empty table.
    pub fn new() -> Self {
        TypeTable {
            types: FrozenList::empty(),
            unknown_fields: Blob::new(),
            cached_size: CachedSize::new(),
            initialized: OnceLock::new(),
        }
    }

    pub fn types_list(&self) -> &[E] {
        self.types.as_slice()
    }

    pub fn types_count(&self) -> usize {
        self.types.len()
    }

    pub fn types(&self, index: usize) -> Option<&E> {
        self.types.get(index)
    }

    /// True when `other` holds the very same element storage, not merely
    /// equal elements.
    pub fn shares_types_with(&self, other: &TypeTable<E>) -> bool {
        self.types.shares_storage_with(&other.types)
    }
}

impl<E: Message> Default for TypeTable<E> {
    fn default() -> Self {
        TypeTable::new()
    }
}

impl<E: Message> Clone for TypeTable<E> {
    fn clone(&self) -> Self {
        TypeTable {
            types: self.types.clone(),
            unknown_fields: self.unknown_fields.clone(),
            cached_size: self.cached_size.clone(),
            initialized: self.initialized.clone(),
        }
    }
}

impl<E: Message> PartialEq for TypeTable<E> {
    fn eq(&self, other: &Self) -> bool {
        self.types == other.types && self.unknown_fields == other.unknown_fields
    }
}

impl<E: Message> fmt::Debug for TypeTable<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeTable")
            .field("types", &self.types)
            .field("unknown_fields", &self.unknown_fields)
            .finish()
    }
}

impl<E: Message> Message for TypeTable<E> {
    type Builder = TypeTableBuilder<E>;

    fn descriptor() -> &'static MessageDescriptor {
        &TYPE_TABLE
    }

    fn unknown_fields(&self) -> &Blob {
        &self.unknown_fields
    }

    fn cached_size(&self) -> &CachedSize {
        &self.cached_size
    }

    fn compute_fields_size(&self) -> usize {
        self.types
            .iter()
            .map(|element| message_field_size(TYPES_FIELD_NUMBER, element))
            .sum()
    }

    fn write_fields(&self, writer: &mut MessageWriter) {
        for element in self.types.iter() {
            writer.write_message_field(TYPES_FIELD_NUMBER, element);
        }
    }

    fn is_initialized(&self) -> bool {
        *self
            .initialized
            .get_or_init(|| self.types.iter().all(Message::is_initialized))
    }

    fn missing_fields(&self) -> Vec<String> {
        self.types
            .iter()
            .enumerate()
            .flat_map(|(index, element)| {
                element
                    .missing_fields()
                    .into_iter()
                    .map(move |path| format!("types[{}].{}", index, path))
            })
            .collect()
    }
}

/// Mutable accumulator for a `TypeTable`.
///
/// Element storage is copy-on-write: a builder created from a message shares
/// that message's list until the first mutation.
pub struct TypeTableBuilder<E: Message = RawMessage> {
    types: RepeatedField<E>,
    unknown_fields: Blob,
}

impl<E: Message> TypeTableBuilder<E> {
    pub fn new() -> Self {
        TypeTableBuilder {
            types: RepeatedField::new(),
            unknown_fields: Blob::new(),
        }
    }

    pub fn types_list(&self) -> &[E] {
        self.types.as_slice()
    }

    pub fn types_count(&self) -> usize {
        self.types.len()
    }

    pub fn types(&self, index: usize) -> Option<&E> {
        self.types.get(index)
    }

    fn out_of_bounds(&self, index: usize) -> Error {
        Error::IndexOutOfBounds {
            message: TYPE_TABLE.name,
            field: TYPE_TABLE_FIELDS[0].name,
            index,
            len: self.types.len(),
        }
    }

    /// Replaces the element at `index`.
    pub fn set_types(&mut self, index: usize, value: E) -> Result<&mut Self> {
        if index >= self.types.len() {
            return Err(self.out_of_bounds(index));
        }
        self.types.make_mut()[index] = value;
        Ok(self)
    }

    pub fn add_types(&mut self, value: E) -> &mut Self {
        self.types.push(value);
        self
    }

    /// Inserts at `index`, shifting later elements. `index` may equal the
    /// current count.
    pub fn insert_types(&mut self, index: usize, value: E) -> Result<&mut Self> {
        if index > self.types.len() {
            return Err(self.out_of_bounds(index));
        }
        self.types.make_mut().insert(index, value);
        Ok(self)
    }

    /// Builds `builder` and appends the result.
    ///
    /// Fails with `UninitializedMessage` if the element is missing required
    /// fields; the table is left unchanged.
    pub fn add_types_from_builder(&mut self, builder: &mut E::Builder) -> Result<&mut Self> {
        let element = builder.build()?;
        Ok(self.add_types(element))
    }

    pub fn add_all_types<I: IntoIterator<Item = E>>(&mut self, values: I) -> &mut Self {
        self.types.extend(values);
        self
    }

    /// Appends every element, or none of them if any is absent.
    pub fn try_add_all_types<I>(&mut self, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = Option<E>>,
    {
        let mut staged = Vec::new();
        for (index, value) in values.into_iter().enumerate() {
            match value {
                Some(element) => staged.push(element),
                None => {
                    return Err(Error::NullElement {
                        message: TYPE_TABLE.name,
                        field: TYPE_TABLE_FIELDS[0].name,
                        index,
                    })
                }
            }
        }
        Ok(self.add_all_types(staged))
    }

    pub fn remove_types(&mut self, index: usize) -> Result<E> {
        if index >= self.types.len() {
            return Err(self.out_of_bounds(index));
        }
        Ok(self.types.make_mut().remove(index))
    }

    pub fn clear_types(&mut self) -> &mut Self {
        self.types.clear();
        self
    }
}

impl<E: Message> Default for TypeTableBuilder<E> {
    fn default() -> Self {
        TypeTableBuilder::new()
    }
}

impl<E: Message> Clone for TypeTableBuilder<E> {
    fn clone(&self) -> Self {
        TypeTableBuilder {
            types: self.types.clone(),
            unknown_fields: self.unknown_fields.clone(),
        }
    }
}

impl<E: Message> fmt::Debug for TypeTableBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeTableBuilder")
            .field("types", &self.types)
            .field("unknown_fields", &self.unknown_fields)
            .finish()
    }
}

impl<E: Message> Builder for TypeTableBuilder<E> {
    type Message = TypeTable<E>;

    fn merge_field(
        &mut self,
        field: &FieldDescriptor,
        value: FieldValue,
        ctx: &mut ParseContext<'_>,
    ) -> Result<()> {
        match (field.number, value) {
            (TYPES_FIELD_NUMBER, FieldValue::LengthDelimited(payload)) => {
                let element = ctx.parse_nested::<E>(payload)?;
                self.types.push(element);
                Ok(())
            }
            (number, other) => Err(Error::malformed(
                TYPE_TABLE.name,
                DecodeErrorKind::WireTypeMismatch {
                    field: number,
                    expected: field.wire_type as u8,
                    found: other.wire_type() as u8,
                },
            )),
        }
    }

    fn unknown_fields(&self) -> &Blob {
        &self.unknown_fields
    }

    fn set_unknown_fields(&mut self, unknown_fields: Blob) -> &mut Self {
        self.unknown_fields = unknown_fields;
        self
    }

    fn is_initialized(&self) -> bool {
        self.types.as_slice().iter().all(Message::is_initialized)
    }

    fn build_partial(&mut self) -> TypeTable<E> {
        trace!(types = self.types.len(), "freezing TypeTable builder");
        TypeTable {
            types: self.types.freeze(),
            unknown_fields: self.unknown_fields.clone(),
            cached_size: CachedSize::new(),
            initialized: OnceLock::new(),
        }
    }

    fn merge_from(&mut self, other: &TypeTable<E>) -> &mut Self {
        debug!(
            existing = self.types.len(),
            incoming = other.types.len(),
            unknown_bytes = other.unknown_fields.len(),
            "merging TypeTable"
        );
        self.types.append_frozen(&other.types);
        self.merge_unknown_fields(other.unknown_fields.clone())
    }

    fn clear(&mut self) -> &mut Self {
        self.types.clear();
        self.unknown_fields = Blob::new();
        self
    }
}
