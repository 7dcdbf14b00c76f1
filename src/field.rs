//! Definition of logical fields used to build a [crate::schema::Schema].

use std::sync::Arc;

use crate::{
    enumeration::Enumeration,
    schema::Schema,
    union::{Branch, UnionSpec},
    wire::Primitive,
};

/// A single named field in a schema.
#[derive(Debug, Clone)]
pub struct Field {
    /// Name used as the key in records. Empty for padding.
    pub name: String,
    /// Wire format and auxiliary parameters.
    pub kind: FieldKind,
}

/// How a field is laid out on the wire.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Fixed-width number or bool.
    Primitive(Primitive),
    /// Fixed-width byte string.
    FixedBytes(FixedBytesSpec),
    /// Anonymous zero bytes.
    Padding(usize),
    /// Decimal number carried as a scaled integer.
    FixedPoint { base: Primitive, fraction_bits: u32 },
    /// Integer carried as a member of an enumeration.
    Enumerated {
        base: Primitive,
        enumeration: Arc<Enumeration>,
    },
    /// Sub-schema selected by an earlier discriminant field.
    Union(UnionSpec),
    /// Sub-schema that is always present.
    Nested(Arc<Schema>),
    /// Sub-schema repeated a fixed or length-driven number of times.
    Repeated {
        element: Arc<Schema>,
        count: RepeatCount,
    },
    /// Element count or byte size of a later repeated field, filled in on
    /// encode.
    Length {
        base: Primitive,
        target: String,
        unit: LengthUnit,
    },
}

/// Parameters of a fixed-width byte string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedBytesSpec {
    /// Width in bytes.
    pub len: usize,
    /// If true, the field decodes to a string with trailing NUL bytes removed;
    /// otherwise it decodes to the verbatim bytes.
    pub c_string: bool,
}

/// Number of elements of a [FieldKind::Repeated] field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepeatCount {
    /// Always this many elements. Missing trailing elements are packed as
    /// zero bytes.
    Fixed(usize),
    /// Name of the earlier [FieldKind::Length] field holding the count.
    Field(String),
}

/// What a [FieldKind::Length] field measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum LengthUnit {
    /// Number of elements.
    #[default]
    Elements,
    /// Encoded size of all elements in bytes.
    Bytes,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Field {
            name: name.into(),
            kind,
        }
    }

    pub fn primitive(name: impl Into<String>, primitive: Primitive) -> Self {
        Field::new(name, FieldKind::Primitive(primitive))
    }

    /// Raw fixed-width bytes, returned verbatim on decode.
    pub fn bytes(name: impl Into<String>, len: usize) -> Self {
        Field::new(
            name,
            FieldKind::FixedBytes(FixedBytesSpec {
                len,
                c_string: false,
            }),
        )
    }

    /// NUL-padded string, trimmed of trailing NULs on decode.
    pub fn string(name: impl Into<String>, len: usize) -> Self {
        Field::new(
            name,
            FieldKind::FixedBytes(FixedBytesSpec {
                len,
                c_string: true,
            }),
        )
    }

    pub fn padding(len: usize) -> Self {
        Field::new(String::new(), FieldKind::Padding(len))
    }

    pub fn fixed_point(name: impl Into<String>, base: Primitive, fraction_bits: u32) -> Self {
        Field::new(
            name,
            FieldKind::FixedPoint {
                base,
                fraction_bits,
            },
        )
    }

    pub fn enumerated(
        name: impl Into<String>,
        base: Primitive,
        enumeration: impl Into<Arc<Enumeration>>,
    ) -> Self {
        Field::new(
            name,
            FieldKind::Enumerated {
                base,
                enumeration: enumeration.into(),
            },
        )
    }

    pub fn union<I>(name: impl Into<String>, discriminant: impl Into<String>, branches: I) -> Self
    where
        I: IntoIterator<Item = Branch>,
    {
        Field::new(
            name,
            FieldKind::Union(UnionSpec {
                discriminant: discriminant.into(),
                branches: branches.into_iter().collect(),
            }),
        )
    }

    pub fn nested(name: impl Into<String>, schema: impl Into<Arc<Schema>>) -> Self {
        Field::new(name, FieldKind::Nested(schema.into()))
    }

    pub fn repeated(
        name: impl Into<String>,
        element: impl Into<Arc<Schema>>,
        count: RepeatCount,
    ) -> Self {
        Field::new(
            name,
            FieldKind::Repeated {
                element: element.into(),
                count,
            },
        )
    }

    /// Element count of the repeated field `target`.
    pub fn length(name: impl Into<String>, base: Primitive, target: impl Into<String>) -> Self {
        Field::new(
            name,
            FieldKind::Length {
                base,
                target: target.into(),
                unit: LengthUnit::Elements,
            },
        )
    }

    /// Encoded byte size of the repeated field `target`.
    pub fn byte_length(
        name: impl Into<String>,
        base: Primitive,
        target: impl Into<String>,
    ) -> Self {
        Field::new(
            name,
            FieldKind::Length {
                base,
                target: target.into(),
                unit: LengthUnit::Bytes,
            },
        )
    }

    pub fn is_padding(&self) -> bool {
        matches!(self.kind, FieldKind::Padding(_))
    }
}
