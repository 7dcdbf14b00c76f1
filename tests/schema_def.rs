#![cfg(feature = "serde")]

use structcraft::{
    Record, Schema, SchemaError, Value,
    serde::SchemaDef,
};

const EXAMPLE: &str = r#"{
    "name": "Example",
    "endianness": "Big",
    "fields": [
        { "name": "an_important_integer", "kind": { "type": "Primitive", "code": "i" } },
        { "name": "ten_long_string", "kind": { "type": "String", "len": 10 } },
        { "name": "a_fixed_point_number", "kind": { "type": "FixedPoint", "code": "i", "fraction_bits": 4 } },
        {
            "name": "union_identifier",
            "kind": {
                "type": "Enum",
                "code": "B",
                "enumeration": {
                    "name": "UnionKind",
                    "members": [
                        { "name": "DataSize", "value": 0 },
                        { "name": "AnotherDataSize", "value": 1 }
                    ]
                }
            }
        },
        {
            "name": "like_a_c_union",
            "kind": {
                "type": "Union",
                "discriminant": "union_identifier",
                "branches": [
                    {
                        "key": "DataSize",
                        "schema": {
                            "name": "DataSize",
                            "fields": [{ "name": "size", "kind": { "type": "Primitive", "code": "Q" } }]
                        }
                    },
                    {
                        "key": 1,
                        "schema": {
                            "name": "AnotherDataSize",
                            "fields": [{ "name": "status", "kind": { "type": "Primitive", "code": "B" } }]
                        }
                    }
                ]
            }
        }
    ]
}"#;

fn compile(json: &str) -> Result<Schema, SchemaError> {
    let def: SchemaDef = serde_json::from_str(json).unwrap();
    Schema::try_from(def)
}

#[test]
fn test_schema_from_json() {
    let schema = compile(EXAMPLE).unwrap();

    let record = Record::new()
        .with("an_important_integer", 42)
        .with("ten_long_string", "wow! stuff")
        .with("a_fixed_point_number", "1.25")
        .with("union_identifier", "AnotherDataSize")
        .with("like_a_c_union", Record::new().with("status", 1));

    let data = schema.pack(&record).unwrap();
    assert_eq!(data, b"\x00\x00\x00\x2awow! stuff\x00\x00\x00\x14\x01\x01");
}

#[test]
fn test_record_to_json() {
    let schema = compile(EXAMPLE).unwrap();
    let record = schema
        .unpack(b"\x00\x00\x00\x2awow! stuff\x00\x00\x00\x14\x01\x01")
        .unwrap();

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "an_important_integer": 42,
            "ten_long_string": "wow! stuff",
            "a_fixed_point_number": "1.25",
            "union_identifier": "AnotherDataSize",
            "like_a_c_union": { "status": 1 }
        })
    );
}

#[test]
fn test_repeated_from_json() {
    let schema = compile(
        r#"{
            "name": "List",
            "endianness": "Little",
            "fields": [
                { "kind": { "type": "Padding", "len": 1 } },
                { "name": "n", "kind": { "type": "Length", "code": "H", "target": "items" } },
                {
                    "name": "items",
                    "kind": {
                        "type": "Repeated",
                        "count": "n",
                        "schema": { "name": "Item", "fields": [{ "name": "v", "kind": { "type": "Primitive", "code": "h" } }] }
                    }
                },
                {
                    "name": "pair",
                    "kind": {
                        "type": "Repeated",
                        "count": 2,
                        "schema": { "name": "Byte", "fields": [{ "name": "b", "kind": { "type": "Bytes", "len": 1 } }] }
                    }
                }
            ]
        }"#,
    )
    .unwrap();

    let data = [0, 1, 0, 0xfe, 0xff, 0xaa, 0xbb];
    let record = schema.unpack(&data).unwrap();
    assert_eq!(record["n"], Value::U64(1));
    assert_eq!(record["items"][0]["v"], Value::I64(-2));
    assert_eq!(record["pair"][1]["b"], Value::Bytes(vec![0xbb]));
    assert_eq!(schema.pack(&record).unwrap(), data);
}

#[test]
fn test_unknown_code_in_json() {
    let err = compile(
        r#"{ "name": "Bad", "fields": [{ "name": "x", "kind": { "type": "Primitive", "code": "Z" } }] }"#,
    )
    .unwrap_err();
    assert!(matches!(err, SchemaError::InvalidWireCode { field, .. } if field == "x"));
}

#[test]
fn test_byte_length_and_alignment_from_json() {
    let schema = compile(
        r#"{
            "name": "Sized",
            "alignment": 2,
            "fields": [
                { "name": "size", "kind": { "type": "Length", "code": "B", "target": "items", "unit": "Bytes" } },
                {
                    "name": "items",
                    "kind": {
                        "type": "Repeated",
                        "count": "size",
                        "schema": { "name": "Item", "fields": [{ "name": "v", "kind": { "type": "Primitive", "code": "B" } }] }
                    }
                }
            ]
        }"#,
    )
    .unwrap();
    assert_eq!(schema.alignment(), 2);

    let data = [3, 0, 7, 8, 9];
    let record = schema.unpack(&data).unwrap();
    assert_eq!(record["size"], Value::U64(3));
    assert_eq!(record["items"][2]["v"], Value::U64(9));
    assert_eq!(schema.pack(&record).unwrap(), data);
}
