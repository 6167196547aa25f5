mod support;

use bytes::Bytes;
use proptest::collection::vec;
use proptest::option;
use proptest::prelude::*;
use support::Symbol;
use wirelite::codec::varint::encode_varint;
use wirelite::prelude::*;
use wirelite::{Blob, RawMessage, Tag, TypeTable, WireType};

/// Encodes `(field, value)` pairs as varint fields.
fn unknown_varints(fields: &[(u32, u64)]) -> Blob {
    let mut out = Vec::new();
    for &(field, value) in fields {
        out.extend(encode_varint(Tag::new(field, WireType::Varint).raw()));
        out.extend(encode_varint(value));
    }
    Blob::from(out)
}

fn arb_symbol() -> impl Strategy<Value = Symbol> {
    (
        any::<u64>(),
        option::of(vec(any::<u8>(), 0..24)),
        option::of(any::<u32>()),
        vec((4u32..2000, any::<u64>()), 0..3),
    )
        .prop_map(|(id, name, flags, unknown)| {
            let mut builder = Symbol::new_builder();
            builder.set_id(id);
            if let Some(name) = name {
                builder.set_name(name);
            }
            if let Some(flags) = flags {
                builder.set_flags(flags);
            }
            builder.set_unknown_fields(unknown_varints(&unknown));
            builder.build_partial()
        })
}

fn arb_table() -> impl Strategy<Value = TypeTable<Symbol>> {
    (vec(arb_symbol(), 0..8), vec((2u32..50, any::<u64>()), 0..3)).prop_map(|(elements, unknown)| {
        let mut builder = TypeTable::<Symbol>::new_builder();
        builder
            .add_all_types(elements)
            .set_unknown_fields(unknown_varints(&unknown));
        builder.build_partial()
    })
}

proptest! {
    #[test]
    fn round_trip_preserves_everything(table in arb_table()) {
        let bytes = table.serialize();
        prop_assert_eq!(bytes.len(), table.serialized_size());
        let parsed = TypeTable::<Symbol>::parse(bytes.clone()).unwrap();
        prop_assert_eq!(&parsed, &table);
        prop_assert_eq!(parsed.serialize(), bytes);
    }

    #[test]
    fn opaque_elements_round_trip_byte_for_byte(table in arb_table()) {
        let bytes = table.serialize();
        let raw = TypeTable::<RawMessage>::parse(bytes.clone()).unwrap();
        prop_assert_eq!(raw.types_count(), table.types_count());
        prop_assert_eq!(raw.serialize(), bytes);
    }

    #[test]
    fn builder_mutation_never_leaks_into_source(
        table in arb_table(),
        extra in arb_symbol(),
        remove in any::<prop::sample::Index>(),
    ) {
        let snapshot = table.serialize();
        let mut builder = table.to_builder();
        if builder.types_count() > 0 {
            let index = remove.index(builder.types_count());
            builder.remove_types(index).unwrap();
        }
        builder.add_types(extra.clone());
        let changed = builder.build_partial();

        prop_assert_eq!(table.serialize(), snapshot);
        prop_assert_eq!(changed.types_list().last(), Some(&extra));
    }

    #[test]
    fn merge_concatenates_in_order(left in arb_table(), right in arb_table()) {
        let merged = left.to_builder().merge_from(&right).build_partial();
        let expected: Vec<Symbol> = left
            .types_list()
            .iter()
            .chain(right.types_list())
            .cloned()
            .collect();
        prop_assert_eq!(merged.types_list(), expected.as_slice());
        prop_assert_eq!(
            merged.unknown_fields(),
            &left.unknown_fields().concat(right.unknown_fields())
        );
    }

    #[test]
    fn arbitrary_input_never_panics(data in vec(any::<u8>(), 0..64)) {
        let bytes = Bytes::from(data);
        if let Ok(raw) = TypeTable::<RawMessage>::parse(bytes.clone()) {
            prop_assert_eq!(raw.serialize().len(), raw.serialized_size());
        }
        let _ = TypeTable::<Symbol>::parse(bytes.clone());
        let _ = RawMessage::parse(bytes);
    }
}
