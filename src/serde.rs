//! JSON-deserializable schema description.
//!
//! These types describe the *shape* of a binary message. They are intended
//! to be constructed from JSON (for example a message catalog shipped with
//! your application) and then compiled into a [Schema] with
//! [Schema::try_from].
//!
//! [Value] and [Record] serialize as plain data: decimals as strings,
//! enumeration members as their names, empty union branches as `null`.

use serde::{
    Deserialize, Serialize,
    ser::{SerializeMap, SerializeSeq, Serializer},
};

use crate::{
    enumeration::Enumeration,
    errors::SchemaError,
    field::{Field, FieldKind, LengthUnit, RepeatCount},
    schema::Schema,
    union::{Branch, BranchKey},
    value::{Record, Value},
    wire::{Endianness, Primitive},
};

/// Top-level message definition consisting of a list of fields.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchemaDef {
    /// Message name, used in diagnostics.
    pub name: String,
    /// Byte order; defaults to big-endian.
    #[serde(default)]
    pub endianness: Endianness,
    /// Scalar field alignment in bytes; defaults to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<usize>,
    /// All fields in wire order.
    pub fields: Vec<FieldDef>,
}

/// Description of a single field.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FieldDef {
    /// Key in the record. Omitted for padding.
    #[serde(default)]
    pub name: String,
    pub kind: FieldKindDef,
}

/// Wire layout of a field. Numeric types are given as struct-style format
/// characters (`?bBhHiIlLqQfd`).
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "type")]
pub enum FieldKindDef {
    Primitive {
        code: String,
    },
    /// Raw bytes, returned verbatim.
    Bytes {
        len: usize,
    },
    /// NUL-padded text.
    String {
        len: usize,
    },
    Padding {
        len: usize,
    },
    FixedPoint {
        code: String,
        fraction_bits: u32,
    },
    Enum {
        code: String,
        enumeration: EnumerationDef,
    },
    Union {
        /// Name of the earlier field selecting the branch.
        discriminant: String,
        branches: Vec<BranchDef>,
    },
    Nested {
        schema: SchemaDef,
    },
    Repeated {
        schema: SchemaDef,
        count: CountDef,
    },
    Length {
        code: String,
        /// Name of the repeated field whose size this holds.
        target: String,
        /// Whether the size counts elements (the default) or bytes.
        #[serde(default)]
        unit: LengthUnit,
    },
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EnumerationDef {
    pub name: String,
    pub members: Vec<EnumMemberDef>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EnumMemberDef {
    pub name: String,
    pub value: i64,
}

/// One union arm. A branch without a schema occupies no bytes.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BranchDef {
    pub key: BranchKeyDef,
    #[serde(default)]
    pub schema: Option<SchemaDef>,
}

/// Branch key: a raw integer or an enumeration member name.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub enum BranchKeyDef {
    Value(i64),
    Member(String),
}

/// Element count of a repeated field: a constant, or the name of its
/// length field.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub enum CountDef {
    Fixed(usize),
    Field(String),
}

impl TryFrom<SchemaDef> for Schema {
    type Error = SchemaError;

    fn try_from(def: SchemaDef) -> Result<Self, Self::Error> {
        let fields = def
            .fields
            .into_iter()
            .map(Field::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let schema = Schema::compile(def.name, &fields, def.endianness)?;
        Ok(match def.alignment {
            Some(alignment) => schema.with_alignment(alignment),
            None => schema,
        })
    }
}

impl TryFrom<FieldDef> for Field {
    type Error = SchemaError;

    fn try_from(def: FieldDef) -> Result<Self, Self::Error> {
        let name = def.name;
        let primitive = |code: &str| {
            Primitive::from_code(code).ok_or_else(|| SchemaError::InvalidWireCode {
                field: name.clone(),
                detail: format!("unknown type code `{code}`"),
            })
        };

        let field = match def.kind {
            FieldKindDef::Primitive { code } => Field::primitive(&name, primitive(&code)?),
            FieldKindDef::Bytes { len } => Field::bytes(&name, len),
            FieldKindDef::String { len } => Field::string(&name, len),
            FieldKindDef::Padding { len } => Field::padding(len),
            FieldKindDef::FixedPoint {
                code,
                fraction_bits,
            } => Field::fixed_point(&name, primitive(&code)?, fraction_bits),
            FieldKindDef::Enum { code, enumeration } => {
                let members = enumeration.members.into_iter().map(|m| (m.name, m.value));
                let enumeration = Enumeration::new(enumeration.name, members)?;
                Field::enumerated(&name, primitive(&code)?, enumeration)
            }
            FieldKindDef::Union {
                discriminant,
                branches,
            } => {
                let mut compiled = Vec::with_capacity(branches.len());
                for branch in branches {
                    let key = match branch.key {
                        BranchKeyDef::Value(v) => BranchKey::Value(v),
                        BranchKeyDef::Member(m) => BranchKey::Member(m),
                    };
                    compiled.push(match branch.schema {
                        Some(schema) => Branch::new(key, Schema::try_from(schema)?),
                        None => Branch::empty(key),
                    });
                }
                Field::union(&name, discriminant, compiled)
            }
            FieldKindDef::Nested { schema } => Field::nested(&name, Schema::try_from(schema)?),
            FieldKindDef::Repeated { schema, count } => {
                let count = match count {
                    CountDef::Fixed(n) => RepeatCount::Fixed(n),
                    CountDef::Field(length) => RepeatCount::Field(length),
                };
                Field::repeated(&name, Schema::try_from(schema)?, count)
            }
            FieldKindDef::Length { code, target, unit } => Field::new(
                &name,
                FieldKind::Length {
                    base: primitive(&code)?,
                    target,
                    unit,
                },
            ),
        };

        Ok(field)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::I64(v) => serializer.serialize_i64(*v),
            Value::U64(v) => serializer.serialize_u64(*v),
            Value::F64(v) => serializer.serialize_f64(*v),
            Value::Decimal(d) => serializer.collect_str(d),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::String(s) => serializer.serialize_str(s),
            Value::Enum(member) => serializer.serialize_str(&member.name),
            Value::Record(record) => record.serialize(serializer),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
