//! Error types for schema compilation, packing and unpacking.

/// Errors produced when compiling a list of [crate::field::Field]s into a [crate::schema::Schema].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// Two non-padding fields share a name.
    #[error("duplicate field name `{0}`")]
    DuplicateFieldName(String),
    /// A non-padding field has an empty name.
    #[error("field name must not be empty")]
    InvalidFieldName,
    /// A union references a discriminant that is absent or declared after it.
    #[error("union `{field}` references unknown or later discriminant `{discriminant}`")]
    UnresolvedDiscriminant { field: String, discriminant: String },
    /// A union discriminant is neither an integer nor an enumerated field.
    #[error("union `{field}` discriminant `{discriminant}` is not an integer or enumerated field")]
    InvalidDiscriminant { field: String, discriminant: String },
    /// A branch key does not match the discriminant (unknown member, duplicate, out of range).
    #[error("union `{field}` has invalid branch key `{key}`")]
    InvalidBranchKey { field: String, key: String },
    /// A length field and a repeated field do not reference each other.
    #[error("field `{field}` has unresolved length reference `{target}`")]
    UnresolvedLength { field: String, target: String },
    /// The wire format of a field is not a valid combination.
    #[error("field `{field}` has invalid wire code: {detail}")]
    InvalidWireCode { field: String, detail: String },
    /// An enumeration has duplicate members.
    #[error("enumeration `{enumeration}` is invalid: {detail}")]
    InvalidEnumeration { enumeration: String, detail: String },
}

/// Errors produced by [crate::schema::Schema::pack] and [crate::schema::Schema::make].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// The input mapping has no value for a required field.
    #[error("missing field `{0}`")]
    MissingField(String),
    /// The supplied value has the wrong type for the field.
    #[error("field `{field}` expects {expected}")]
    InvalidValue { field: String, expected: String },
    /// The value of an enumerated field is not a member of its enumeration.
    #[error("field `{field}`: `{member}` is not a member of `{enumeration}`")]
    UnknownEnumMember {
        field: String,
        enumeration: String,
        member: String,
    },
    /// The discriminant selects no branch of the union.
    #[error("union `{field}` has no branch for discriminant {discriminant}")]
    UnknownUnionBranch { field: String, discriminant: String },
    /// A fixed-width byte field was given more bytes than it can hold.
    #[error("field `{field}` holds {max} bytes, got {len}")]
    FieldTooLong { field: String, len: usize, max: usize },
    /// A numeric value does not fit the field's wire width.
    #[error("field `{field}`: value {value} is out of range")]
    OutOfRange { field: String, value: String },
    /// A fixed-count repeated field was given the wrong number of elements.
    #[error("field `{field}` expects {expected} elements, got {actual}")]
    CountMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },
}

impl EncodeError {
    /// Prefixes the field path with the enclosing field name.
    pub(crate) fn within(self, parent: &str) -> Self {
        let nest = |field: String| format!("{parent}.{field}");

        match self {
            EncodeError::MissingField(field) => EncodeError::MissingField(nest(field)),
            EncodeError::InvalidValue { field, expected } => EncodeError::InvalidValue {
                field: nest(field),
                expected,
            },
            EncodeError::UnknownEnumMember {
                field,
                enumeration,
                member,
            } => EncodeError::UnknownEnumMember {
                field: nest(field),
                enumeration,
                member,
            },
            EncodeError::UnknownUnionBranch {
                field,
                discriminant,
            } => EncodeError::UnknownUnionBranch {
                field: nest(field),
                discriminant,
            },
            EncodeError::FieldTooLong { field, len, max } => EncodeError::FieldTooLong {
                field: nest(field),
                len,
                max,
            },
            EncodeError::OutOfRange { field, value } => EncodeError::OutOfRange {
                field: nest(field),
                value,
            },
            EncodeError::CountMismatch {
                field,
                expected,
                actual,
            } => EncodeError::CountMismatch {
                field: nest(field),
                expected,
                actual,
            },
        }
    }
}

/// Errors produced by [crate::schema::Schema::unpack].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Input ended before the field could be read.
    #[error("input truncated at `{field}`: needed {needed} bytes, {available} available")]
    TruncatedInput {
        field: String,
        needed: usize,
        available: usize,
    },
    /// Input was not fully consumed.
    #[error("{0} trailing bytes after message")]
    TrailingBytes(usize),
    /// A raw integer has no matching enumeration member.
    #[error("field `{field}`: {value} is not a member of `{enumeration}`")]
    UnknownEnumValue {
        field: String,
        enumeration: String,
        value: i128,
    },
    /// The decoded discriminant selects no branch of the union.
    #[error("union `{field}` has no branch for discriminant {discriminant}")]
    UnknownUnionBranch { field: String, discriminant: i128 },
    /// The discriminant of a union has no decoded integer value.
    #[error("union `{field}` discriminant `{discriminant}` was not decoded as an integer")]
    MissingDiscriminant { field: String, discriminant: String },
    /// A C-style string field does not hold valid UTF-8.
    #[error("field `{0}` is not valid UTF-8")]
    InvalidUtf8(String),
}

impl DecodeError {
    /// Prefixes the field path with the enclosing field name.
    pub(crate) fn within(self, parent: &str) -> Self {
        let nest = |field: String| format!("{parent}.{field}");

        match self {
            DecodeError::TruncatedInput {
                field,
                needed,
                available,
            } => DecodeError::TruncatedInput {
                field: nest(field),
                needed,
                available,
            },
            DecodeError::TrailingBytes(n) => DecodeError::TrailingBytes(n),
            DecodeError::UnknownEnumValue {
                field,
                enumeration,
                value,
            } => DecodeError::UnknownEnumValue {
                field: nest(field),
                enumeration,
                value,
            },
            DecodeError::UnknownUnionBranch {
                field,
                discriminant,
            } => DecodeError::UnknownUnionBranch {
                field: nest(field),
                discriminant,
            },
            DecodeError::MissingDiscriminant {
                field,
                discriminant,
            } => DecodeError::MissingDiscriminant {
                field: nest(field),
                discriminant,
            },
            DecodeError::InvalidUtf8(field) => DecodeError::InvalidUtf8(nest(field)),
        }
    }
}
