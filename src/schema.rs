//! Schema: compiled, ordered set of fields used to pack records into bytes
//! and unpack bytes into records.

use std::collections::BTreeSet;

use crate::{
    codec::{self, Reader},
    compiled::{CompiledField, CompiledKind},
    errors::{DecodeError, EncodeError, SchemaError},
    field::{Field, FieldKind, RepeatCount},
    value::Record,
    wire::Endianness,
};

/// A compiled message layout. Use [Schema::compile] to build one from
/// [Field]s, then [Schema::pack] / [Schema::unpack] to move between records
/// and bytes.
///
/// Schemas are immutable once compiled and can be shared across threads.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    endianness: Endianness,
    alignment: usize,
    fields: Vec<CompiledField>,
    fixed_size: Option<usize>,
    min_size: usize,
}

impl Schema {
    /// Compiles `fields` into a schema. Field names must be unique, and
    /// every union discriminant or length field must be declared before the
    /// field that depends on it.
    pub fn compile(
        name: impl Into<String>,
        fields: &[Field],
        endianness: Endianness,
    ) -> Result<Self, SchemaError> {
        let name = name.into();
        let mut compiled: Vec<CompiledField> = Vec::with_capacity(fields.len());
        let mut names = BTreeSet::new();

        for field in fields {
            if !field.is_padding() {
                if field.name.is_empty() {
                    return Err(SchemaError::InvalidFieldName);
                }
                if !names.insert(field.name.as_str()) {
                    return Err(SchemaError::DuplicateFieldName(field.name.clone()));
                }
            }

            let compiled_field = CompiledField::compile(field, &compiled)?;
            compiled.push(compiled_field);
        }

        // Every length field must be claimed by a later repeated field.
        for field in fields {
            if let FieldKind::Length { target, .. } = &field.kind {
                let claimed = fields.iter().any(|f| {
                    f.name == *target
                        && matches!(&f.kind, FieldKind::Repeated { count: RepeatCount::Field(len), .. } if *len == field.name)
                });

                if !claimed {
                    return Err(SchemaError::UnresolvedLength {
                        field: field.name.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        let (fixed_size, min_size) = sizes(&compiled, 1);

        tracing::debug!(
            schema = %name,
            fields = compiled.len(),
            ?fixed_size,
            min_size,
            "compiled schema"
        );

        Ok(Schema {
            name,
            endianness,
            alignment: 1,
            fields: compiled,
            fixed_size,
            min_size,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Every scalar field occupies a multiple of this many bytes.
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Compiled fields in declaration order.
    pub fn fields(&self) -> &[CompiledField] {
        &self.fields
    }

    /// Encoded width in bytes, or `None` if it depends on the data
    /// (unions and length-driven repeated fields).
    pub fn fixed_size(&self) -> Option<usize> {
        self.fixed_size
    }

    /// Fewest bytes any encoding of this schema can occupy.
    pub fn min_size(&self) -> usize {
        self.min_size
    }

    /// Copy of this schema using a different byte order.
    pub fn with_endianness(&self, endianness: Endianness) -> Self {
        Schema {
            endianness,
            ..self.clone()
        }
    }

    /// Copy of this schema that pads every scalar field with trailing zero
    /// bytes up to a multiple of `alignment`. Nested, repeated and union
    /// schemas keep their own alignment. `0` is treated as `1`.
    pub fn with_alignment(&self, alignment: usize) -> Self {
        let alignment = alignment.max(1);
        let (fixed_size, min_size) = sizes(&self.fields, alignment);

        Schema {
            alignment,
            fixed_size,
            min_size,
            ..self.clone()
        }
    }

    /// Encodes `record` into bytes.
    pub fn pack(&self, record: &Record) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::with_capacity(self.fixed_size.unwrap_or(self.min_size));
        codec::encode(self, record, self.endianness, &mut out)?;

        tracing::trace!(schema = %self.name, len = out.len(), "packed");
        Ok(out)
    }

    /// Validates `record` and returns it as [Schema::unpack] would return
    /// its packed bytes: fields in declaration order, padding omitted,
    /// strings trimmed, fixed-point values quantized.
    pub fn make(&self, record: &Record) -> Result<Record, EncodeError> {
        let mut scratch = Vec::with_capacity(self.fixed_size.unwrap_or(self.min_size));
        codec::encode(self, record, self.endianness, &mut scratch)
    }

    /// Decodes `data`, which must hold exactly one message.
    pub fn unpack(&self, data: &[u8]) -> Result<Record, DecodeError> {
        let (record, rest) = self.unpack_partial(data)?;

        if !rest.is_empty() {
            return Err(DecodeError::TrailingBytes(rest.len()));
        }

        Ok(record)
    }

    /// Decodes one message from the front of `data` and returns it with the
    /// unconsumed remainder.
    pub fn unpack_partial<'a>(&self, data: &'a [u8]) -> Result<(Record, &'a [u8]), DecodeError> {
        if data.len() < self.min_size {
            return Err(DecodeError::TruncatedInput {
                field: self.name.clone(),
                needed: self.min_size,
                available: data.len(),
            });
        }

        let mut reader = Reader::new(data);
        let record = codec::decode(self, &mut reader, self.endianness)?;

        tracing::trace!(
            schema = %self.name,
            consumed = data.len() - reader.rest().len(),
            "unpacked"
        );
        Ok((record, reader.rest()))
    }

    /// True if `record` is already in the form [Schema::make] produces.
    pub fn conforms(&self, record: &Record) -> bool {
        self.make(record).is_ok_and(|made| made == *record)
    }

    /// True if any field of this schema (or a nested one) is a union.
    pub fn has_unions(&self) -> bool {
        self.fields.iter().any(|f| match &f.kind {
            CompiledKind::Union(_) => true,
            CompiledKind::Nested(schema) | CompiledKind::Repeated { element: schema, .. } => {
                schema.has_unions()
            }
            _ => false,
        })
    }
}

/// Width of a scalar field once padded to `alignment`.
pub(crate) fn aligned(width: usize, alignment: usize) -> usize {
    width.next_multiple_of(alignment)
}

/// Total fixed size and minimum size of `fields` at `alignment`.
fn sizes(fields: &[CompiledField], alignment: usize) -> (Option<usize>, usize) {
    let pad = |f: &CompiledField, width: usize| {
        if f.is_scalar() {
            aligned(width, alignment)
        } else {
            width
        }
    };

    let fixed_size = fields.iter().try_fold(0usize, |acc, f| {
        f.fixed_size().and_then(|s| acc.checked_add(pad(f, s)))
    });
    let min_size = fields
        .iter()
        .fold(0usize, |acc, f| acc.saturating_add(pad(f, f.min_size())));

    (fixed_size, min_size)
}
