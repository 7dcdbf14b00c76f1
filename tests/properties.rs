use proptest::prelude::*;
use structcraft::{
    Branch, Decimal, Endianness, Enumeration, Field, FixedPoint, Primitive, Record, Schema,
};

fn schema(endianness: Endianness) -> Schema {
    let mode = Enumeration::new("Mode", [("Idle", 0), ("Run", 1), ("Halt", 7)]).unwrap();
    let run = Schema::compile(
        "Run",
        &[
            Field::primitive("speed", Primitive::U16),
            Field::primitive("ok", Primitive::Bool),
        ],
        endianness,
    )
    .unwrap();
    let halt = Schema::compile("Halt", &[Field::primitive("code", Primitive::I8)], endianness)
        .unwrap();

    Schema::compile(
        "Status",
        &[
            Field::primitive("id", Primitive::I16),
            Field::primitive("count", Primitive::U32),
            Field::padding(1),
            Field::string("name", 8),
            Field::fixed_point("level", Primitive::I32, 4),
            Field::enumerated("mode", Primitive::U8, mode),
            Field::union(
                "detail",
                "mode",
                [Branch::empty("Idle"), Branch::new("Run", run), Branch::new("Halt", halt)],
            ),
        ],
        endianness,
    )
    .unwrap()
}

fn any_status() -> impl Strategy<Value = Record> {
    let detail = prop_oneof![
        Just(("Idle", Record::new())),
        (any::<u16>(), any::<bool>())
            .prop_map(|(speed, ok)| ("Run", Record::new().with("speed", speed).with("ok", ok))),
        any::<i8>().prop_map(|code| ("Halt", Record::new().with("code", code))),
    ];

    (
        any::<i16>(),
        any::<u32>(),
        "[a-z ]{0,8}",
        -(1i64 << 31)..(1i64 << 31),
        detail,
    )
        .prop_map(|(id, count, name, raw_level, (mode, detail))| {
            let level = Decimal::new(raw_level as i128 * 625, 4);
            let mut record = Record::new()
                .with("id", id)
                .with("count", count)
                .with("name", name)
                .with("level", level)
                .with("mode", mode);
            if mode != "Idle" {
                record.insert("detail", detail);
            }
            record
        })
}

fn endianness() -> impl Strategy<Value = Endianness> {
    prop_oneof![Just(Endianness::Big), Just(Endianness::Little)]
}

proptest! {
    #[test]
    fn unpack_of_pack_is_make(record in any_status(), endianness in endianness()) {
        let schema = schema(endianness);
        let data = schema.pack(&record).unwrap();
        let made = schema.make(&record).unwrap();

        prop_assert_eq!(schema.unpack(&data).unwrap(), made.clone());
        prop_assert!(schema.conforms(&made));
    }

    #[test]
    fn pack_of_unpack_is_identity(raw in proptest::collection::vec(any::<u8>(), 14)) {
        let schema = Schema::compile(
            "Raw",
            &[
                Field::primitive("a", Primitive::I32),
                Field::bytes("b", 4),
                Field::fixed_point("c", Primitive::U16, 12),
                Field::primitive("d", Primitive::U32),
            ],
            Endianness::Little,
        )
        .unwrap();

        let record = schema.unpack(&raw).unwrap();
        prop_assert_eq!(schema.pack(&record).unwrap(), raw);
    }

    #[test]
    fn fixed_point_decode_is_exact(raw in any::<i32>(), fraction_bits in 0u32..=24) {
        let fp = FixedPoint::new(Primitive::I32, fraction_bits).unwrap();
        let decimal = fp.from_raw(raw as i128);
        prop_assert_eq!(fp.to_raw(&decimal).unwrap(), raw as i128);
    }

    #[test]
    fn quantize_is_idempotent(mantissa in -1_000_000_000i64..1_000_000_000, scale in 0u32..9) {
        let fp = FixedPoint::new(Primitive::I64, 10).unwrap();
        let value = Decimal::new(mantissa as i128, scale);
        let once = fp.quantize(&value).unwrap();
        prop_assert_eq!(fp.quantize(&once).unwrap(), once);
    }

    #[test]
    fn quantize_error_is_at_most_half_step(mantissa in -1_000_000i64..1_000_000, scale in 0u32..6) {
        let fp = FixedPoint::new(Primitive::I32, 6).unwrap();
        let value = Decimal::new(mantissa as i128, scale);
        let quantized = fp.quantize(&value).unwrap();
        prop_assert!((quantized.to_f64() - value.to_f64()).abs() <= 0.5 / 64.0 + 1e-9);
    }
}
