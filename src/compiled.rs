use std::sync::Arc;

use crate::{
    enumeration::Enumeration,
    errors::SchemaError,
    field::{Field, FieldKind, FixedBytesSpec, LengthUnit, RepeatCount},
    fixed_point::FixedPoint,
    schema::Schema,
    union::BranchTable,
    wire::Primitive,
};

#[derive(Debug, Clone)]
pub enum CompiledKind {
    Primitive(Primitive),
    FixedBytes(FixedBytesSpec),
    Padding(usize),
    FixedPoint(FixedPoint),
    Enumerated {
        base: Primitive,
        enumeration: Arc<Enumeration>,
    },
    Union(BranchTable),
    Nested(Arc<Schema>),
    Repeated {
        element: Arc<Schema>,
        count: CompiledCount,
    },
    Length {
        base: Primitive,
        target: String,
        unit: LengthUnit,
    },
}

/// Element count of a repeated field, resolved against its length field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledCount {
    /// Exactly this many elements, zero-filled when fewer are given.
    Fixed(usize),
    /// Element count held by the named length field.
    Elements(String),
    /// Byte size held by the named length field.
    Bytes(String),
}

#[derive(Debug, Clone)]
pub struct CompiledField {
    pub name: String,
    pub kind: CompiledKind,
}

impl CompiledField {
    /// Compiles `field` against the fields declared before it.
    pub(crate) fn compile(field: &Field, earlier: &[CompiledField]) -> Result<Self, SchemaError> {
        let invalid = |detail: &str| SchemaError::InvalidWireCode {
            field: field.name.clone(),
            detail: detail.to_string(),
        };

        let kind = match &field.kind {
            FieldKind::Primitive(p) => CompiledKind::Primitive(*p),
            FieldKind::FixedBytes(spec) => {
                if spec.len == 0 {
                    return Err(invalid("byte field must be at least one byte wide"));
                }
                CompiledKind::FixedBytes(*spec)
            }
            FieldKind::Padding(len) => {
                if *len == 0 {
                    return Err(invalid("padding must be at least one byte wide"));
                }
                CompiledKind::Padding(*len)
            }
            FieldKind::FixedPoint {
                base,
                fraction_bits,
            } => {
                let fixed_point = FixedPoint::new(*base, *fraction_bits)
                    .map_err(|e| invalid(&e.to_string()))?;
                CompiledKind::FixedPoint(fixed_point)
            }
            FieldKind::Enumerated { base, enumeration } => {
                if !base.is_integer() {
                    return Err(invalid("enumeration base must be an integer"));
                }
                if let Some(member) = enumeration
                    .members()
                    .iter()
                    .find(|m| !base.fits(m.value as i128))
                {
                    return Err(invalid(&format!(
                        "member `{}` = {} does not fit `{}`",
                        member.name,
                        member.value,
                        base.code()
                    )));
                }
                CompiledKind::Enumerated {
                    base: *base,
                    enumeration: enumeration.clone(),
                }
            }
            FieldKind::Union(spec) => {
                CompiledKind::Union(BranchTable::compile(&field.name, spec, earlier)?)
            }
            FieldKind::Nested(schema) => CompiledKind::Nested(schema.clone()),
            FieldKind::Repeated { element, count } => {
                if element.min_size() == 0 {
                    return Err(invalid("repeated element must occupy at least one byte"));
                }

                let count = match count {
                    RepeatCount::Fixed(n) => CompiledCount::Fixed(*n),
                    RepeatCount::Field(length) => {
                        let unit = earlier.iter().find_map(|f| match &f.kind {
                            CompiledKind::Length { target, unit, .. }
                                if f.name == *length && *target == field.name =>
                            {
                                Some(*unit)
                            }
                            _ => None,
                        });

                        match unit {
                            Some(LengthUnit::Elements) => CompiledCount::Elements(length.clone()),
                            Some(LengthUnit::Bytes) => CompiledCount::Bytes(length.clone()),
                            None => {
                                return Err(SchemaError::UnresolvedLength {
                                    field: field.name.clone(),
                                    target: length.clone(),
                                });
                            }
                        }
                    }
                };

                CompiledKind::Repeated {
                    element: element.clone(),
                    count,
                }
            }
            FieldKind::Length { base, target, unit } => {
                if !base.is_integer() || base.is_signed() {
                    return Err(invalid("length must be an unsigned integer"));
                }
                CompiledKind::Length {
                    base: *base,
                    target: target.clone(),
                    unit: *unit,
                }
            }
        };

        Ok(CompiledField {
            name: field.name.clone(),
            kind,
        })
    }

    /// False for padding, which never appears in records.
    pub fn is_named(&self) -> bool {
        !matches!(self.kind, CompiledKind::Padding(_))
    }

    /// True for fields stored inline at a fixed width, which are padded to
    /// the schema alignment.
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self.kind,
            CompiledKind::Union(_) | CompiledKind::Nested(_) | CompiledKind::Repeated { .. }
        )
    }

    /// Width in bytes when it does not depend on the data.
    pub fn fixed_size(&self) -> Option<usize> {
        match &self.kind {
            CompiledKind::Primitive(p) => Some(p.width()),
            CompiledKind::FixedBytes(spec) => Some(spec.len),
            CompiledKind::Padding(len) => Some(*len),
            CompiledKind::FixedPoint(fp) => Some(fp.width()),
            CompiledKind::Enumerated { base, .. } => Some(base.width()),
            CompiledKind::Length { base, .. } => Some(base.width()),
            CompiledKind::Union(_) => None,
            CompiledKind::Nested(schema) => schema.fixed_size(),
            CompiledKind::Repeated { element, count } => match count {
                CompiledCount::Fixed(n) => element.fixed_size().and_then(|s| s.checked_mul(*n)),
                CompiledCount::Elements(_) | CompiledCount::Bytes(_) => None,
            },
        }
    }

    /// Fewest bytes this field can occupy.
    pub fn min_size(&self) -> usize {
        match &self.kind {
            CompiledKind::Union(table) => table.min_size(),
            CompiledKind::Nested(schema) => schema.min_size(),
            CompiledKind::Repeated { element, count } => match count {
                CompiledCount::Fixed(n) => element.min_size().saturating_mul(*n),
                CompiledCount::Elements(_) | CompiledCount::Bytes(_) => 0,
            },
            _ => self.fixed_size().unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::Endianness;

    fn compile_one(field: Field) -> Result<CompiledField, SchemaError> {
        CompiledField::compile(&field, &[])
    }

    #[test]
    fn test_fixed_sizes() {
        assert_eq!(compile_one(Field::primitive("a", Primitive::I32)).unwrap().fixed_size(), Some(4));
        assert_eq!(compile_one(Field::string("s", 10)).unwrap().fixed_size(), Some(10));
        assert_eq!(compile_one(Field::padding(3)).unwrap().fixed_size(), Some(3));
        assert_eq!(
            compile_one(Field::fixed_point("f", Primitive::U16, 4)).unwrap().fixed_size(),
            Some(2)
        );
    }

    #[test]
    fn test_padding_is_unnamed() {
        assert!(!compile_one(Field::padding(1)).unwrap().is_named());
        assert!(compile_one(Field::bytes("b", 1)).unwrap().is_named());
    }

    #[test]
    fn test_zero_width_rejected() {
        assert!(matches!(
            compile_one(Field::bytes("b", 0)),
            Err(SchemaError::InvalidWireCode { .. })
        ));
        assert!(matches!(
            compile_one(Field::padding(0)),
            Err(SchemaError::InvalidWireCode { .. })
        ));
    }

    #[test]
    fn test_fixed_point_on_float_rejected() {
        assert!(matches!(
            compile_one(Field::fixed_point("f", Primitive::F64, 4)),
            Err(SchemaError::InvalidWireCode { .. })
        ));
    }

    #[test]
    fn test_enum_member_must_fit_base() {
        let e = Enumeration::new("Wide", [("Small", 1), ("Big", 300)]).unwrap();
        assert!(matches!(
            compile_one(Field::enumerated("e", Primitive::U8, e.clone())),
            Err(SchemaError::InvalidWireCode { .. })
        ));
        assert!(compile_one(Field::enumerated("e", Primitive::U16, e)).is_ok());
    }

    #[test]
    fn test_signed_length_rejected() {
        assert!(matches!(
            compile_one(Field::length("n", Primitive::I16, "items")),
            Err(SchemaError::InvalidWireCode { .. })
        ));
    }

    #[test]
    fn test_repeated_sizes() {
        let element = Schema::compile(
            "Pair",
            &[
                Field::primitive("x", Primitive::U8),
                Field::primitive("y", Primitive::U16),
            ],
            Endianness::Big,
        )
        .unwrap();

        let fixed = compile_one(Field::repeated("r", element.clone(), RepeatCount::Fixed(4))).unwrap();
        assert_eq!(fixed.fixed_size(), Some(12));
        assert_eq!(fixed.min_size(), 12);

        let length = CompiledField::compile(&Field::length("n", Primitive::U8, "r"), &[]).unwrap();
        let driven = CompiledField::compile(
            &Field::repeated("r", element, RepeatCount::Field("n".to_string())),
            &[length],
        )
        .unwrap();
        assert_eq!(driven.fixed_size(), None);
        assert_eq!(driven.min_size(), 0);
        assert!(matches!(
            &driven.kind,
            CompiledKind::Repeated { count: CompiledCount::Elements(n), .. } if n == "n"
        ));
        assert!(!driven.is_scalar());
        assert!(!fixed.is_scalar());
    }

    #[test]
    fn test_byte_length_pairing() {
        let element =
            Schema::compile("One", &[Field::primitive("x", Primitive::U8)], Endianness::Big).unwrap();
        let size = CompiledField::compile(&Field::byte_length("size", Primitive::U16, "r"), &[])
            .unwrap();
        assert!(size.is_scalar());

        let driven = CompiledField::compile(
            &Field::repeated("r", element, RepeatCount::Field("size".to_string())),
            &[size],
        )
        .unwrap();
        assert!(matches!(
            &driven.kind,
            CompiledKind::Repeated { count: CompiledCount::Bytes(n), .. } if n == "size"
        ));
    }

    #[test]
    fn test_repeated_without_length_field() {
        let element =
            Schema::compile("One", &[Field::primitive("x", Primitive::U8)], Endianness::Big).unwrap();
        let err = compile_one(Field::repeated("r", element, RepeatCount::Field("n".to_string())))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnresolvedLength {
                field: "r".to_string(),
                target: "n".to_string()
            }
        );
    }
}
