//! The encode/decode engine: one left-to-right walk over a schema's compiled
//! fields, threading a byte accumulator (encode) or a cursor (decode).
//!
//! Encoding produces the bytes and the materialized [Record] in the same
//! walk, so `make` is exactly what `unpack(pack(..))` returns.

use crate::{
    bytes,
    compiled::{CompiledCount, CompiledKind},
    enumeration::{EnumMember, Enumeration},
    errors::{DecodeError, EncodeError},
    field::{FixedBytesSpec, LengthUnit},
    fixed_point::{Decimal, ParseDecimalError},
    schema::{Schema, aligned},
    value::{Record, Value},
    wire::{Endianness, Primitive},
};

/// Read cursor over the input bytes.
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Reader { data, pos: 0 }
    }

    fn take(&mut self, field: &str, n: usize) -> Result<&'a [u8], DecodeError> {
        let available = self.remaining();
        if n > available {
            return Err(DecodeError::TruncatedInput {
                field: field.to_string(),
                needed: n,
                available,
            });
        }

        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Bytes not consumed yet.
    pub(crate) fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }
}

/// Encodes `input` against `schema`, appending to `out`. Returns the
/// materialized record.
pub(crate) fn encode(
    schema: &Schema,
    input: &Record,
    endianness: Endianness,
    out: &mut Vec<u8>,
) -> Result<Record, EncodeError> {
    let mut made = Record::with_capacity(schema.fields().len());
    // Offsets of byte-length fields, patched once their target is encoded.
    let mut byte_lengths: Vec<(&str, usize)> = Vec::new();

    for field in schema.fields() {
        let name = field.name.as_str();
        let start = out.len();

        let value = match &field.kind {
            CompiledKind::Padding(len) => {
                out.resize(start + aligned(*len, schema.alignment()), 0);
                continue;
            }
            CompiledKind::Primitive(p) => {
                encode_primitive(name, *p, required(input, name)?, endianness, out)?
            }
            CompiledKind::FixedBytes(spec) => {
                encode_fixed_bytes(name, spec, required(input, name)?, out)?
            }
            CompiledKind::FixedPoint(fp) => {
                let decimal = to_decimal(name, required(input, name)?)?;
                let raw = fp.to_raw(&decimal).map_err(|_| EncodeError::OutOfRange {
                    field: name.to_string(),
                    value: decimal.to_string(),
                })?;
                bytes::write_integer(out, raw, fp.base(), endianness);
                Value::Decimal(fp.from_raw(raw))
            }
            CompiledKind::Enumerated { base, enumeration } => {
                let member = to_member(name, enumeration, required(input, name)?)?;
                bytes::write_integer(out, member.value as i128, *base, endianness);
                Value::Enum(member)
            }
            CompiledKind::Length { base, target, unit } => match unit {
                LengthUnit::Elements => {
                    let count = required(input, target)?
                        .as_array()
                        .ok_or_else(|| invalid(target, "array"))?
                        .len();
                    write_length(name, count, *base, endianness, out)?;
                    Value::U64(count as u64)
                }
                LengthUnit::Bytes => {
                    byte_lengths.push((name, start));
                    bytes::write_integer(out, 0, *base, endianness);
                    Value::U64(0)
                }
            },
            CompiledKind::Repeated { element, count } => {
                let items = required(input, name)?
                    .as_array()
                    .ok_or_else(|| invalid(name, "array of records"))?;

                if let CompiledCount::Fixed(expected) = count {
                    if items.len() > *expected {
                        return Err(EncodeError::CountMismatch {
                            field: name.to_string(),
                            expected: *expected,
                            actual: items.len(),
                        });
                    }
                }

                let mut made_items = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let path = format!("{name}[{i}]");
                    let record = item.as_record().ok_or_else(|| invalid(&path, "record"))?;
                    let made_item =
                        encode(element, record, endianness, out).map_err(|e| e.within(&path))?;
                    made_items.push(Value::Record(made_item));
                }

                match count {
                    CompiledCount::Fixed(expected) if items.len() < *expected => {
                        let filler = zero_element(element, endianness).ok_or_else(|| {
                            EncodeError::CountMismatch {
                                field: name.to_string(),
                                expected: *expected,
                                actual: items.len(),
                            }
                        })?;
                        for _ in items.len()..*expected {
                            out.resize(out.len() + filler.0, 0);
                            made_items.push(Value::Record(filler.1.clone()));
                        }
                    }
                    CompiledCount::Bytes(length) => {
                        let size = out.len() - start;
                        patch_length(schema, length, &byte_lengths, size, endianness, out)?;
                        made.insert(length.as_str(), Value::U64(size as u64));
                    }
                    _ => {}
                }

                Value::Array(made_items)
            }
            CompiledKind::Nested(nested) => {
                let record = required(input, name)?
                    .as_record()
                    .ok_or_else(|| invalid(name, "record"))?;
                let made_nested =
                    encode(nested, record, endianness, out).map_err(|e| e.within(name))?;
                Value::Record(made_nested)
            }
            CompiledKind::Union(table) => match table.select_encode(name, &made)? {
                None => Value::Null,
                Some(branch) => {
                    let record = match input.get(name) {
                        Some(Value::Record(record)) => record,
                        None | Some(Value::Null) => {
                            return Err(EncodeError::MissingField(name.to_string()));
                        }
                        Some(_) => return Err(invalid(name, "record")),
                    };
                    let made_branch =
                        encode(branch, record, endianness, out).map_err(|e| e.within(name))?;
                    Value::Record(made_branch)
                }
            },
        };

        if field.is_scalar() {
            out.resize(start + aligned(out.len() - start, schema.alignment()), 0);
        }

        made.insert(name, value);
    }

    Ok(made)
}

fn write_length(
    name: &str,
    len: usize,
    base: Primitive,
    endianness: Endianness,
    out: &mut Vec<u8>,
) -> Result<(), EncodeError> {
    if !base.fits(len as i128) {
        return Err(EncodeError::OutOfRange {
            field: name.to_string(),
            value: len.to_string(),
        });
    }
    bytes::write_integer(out, len as i128, base, endianness);
    Ok(())
}

/// Overwrites the placeholder written for byte-length field `length`.
fn patch_length(
    schema: &Schema,
    length: &str,
    offsets: &[(&str, usize)],
    size: usize,
    endianness: Endianness,
    out: &mut [u8],
) -> Result<(), EncodeError> {
    let base = schema.fields().iter().find_map(|f| match &f.kind {
        CompiledKind::Length { base, .. } if f.name == length => Some(*base),
        _ => None,
    });
    let offset = offsets.iter().find(|(n, _)| *n == length).map(|(_, o)| *o);

    // Compilation pairs every byte-driven repeat with an earlier length field.
    let (Some(base), Some(offset)) = (base, offset) else {
        return Err(EncodeError::MissingField(length.to_string()));
    };

    let mut encoded = Vec::with_capacity(base.width());
    write_length(length, size, base, endianness, &mut encoded)?;
    out[offset..offset + encoded.len()].copy_from_slice(&encoded);
    Ok(())
}

/// Width and decoded value of an all-zero `element`, used to fill the
/// missing tail of a fixed-count repeat. `None` if the element has no fixed
/// width or zero bytes do not decode (an enumeration without a zero member).
fn zero_element(element: &Schema, endianness: Endianness) -> Option<(usize, Record)> {
    let width = element.fixed_size()?;
    let zeros = vec![0u8; width];
    let mut reader = Reader::new(&zeros);
    let record = decode(element, &mut reader, endianness).ok()?;
    Some((width, record))
}

/// Decodes one `schema` worth of fields from `reader`.
pub(crate) fn decode(
    schema: &Schema,
    reader: &mut Reader<'_>,
    endianness: Endianness,
) -> Result<Record, DecodeError> {
    let mut record = Record::with_capacity(schema.fields().len());

    for field in schema.fields() {
        let name = field.name.as_str();

        let value = match &field.kind {
            CompiledKind::Padding(len) => {
                let len = aligned(*len, schema.alignment());
                reader.take(if name.is_empty() { "padding" } else { name }, len)?;
                continue;
            }
            CompiledKind::Primitive(p) => {
                decode_primitive(*p, reader.take(name, p.width())?, endianness)
            }
            CompiledKind::FixedBytes(spec) => {
                let raw = reader.take(name, spec.len)?;
                fixed_bytes_value(spec, raw)
                    .ok_or_else(|| DecodeError::InvalidUtf8(name.to_string()))?
            }
            CompiledKind::FixedPoint(fp) => {
                Value::Decimal(fp.decode(reader.take(name, fp.width())?, endianness))
            }
            CompiledKind::Enumerated { base, enumeration } => {
                let raw = bytes::read_integer(reader.take(name, base.width())?, *base, endianness);
                let member = i64::try_from(raw)
                    .ok()
                    .and_then(|v| enumeration.by_value(v))
                    .ok_or_else(|| DecodeError::UnknownEnumValue {
                        field: name.to_string(),
                        enumeration: enumeration.name().to_string(),
                        value: raw,
                    })?;
                Value::Enum(member.clone())
            }
            CompiledKind::Length { base, .. } => {
                let raw = bytes::read_integer(reader.take(name, base.width())?, *base, endianness);
                Value::U64(raw as u64)
            }
            CompiledKind::Repeated {
                element,
                count: CompiledCount::Bytes(length),
            } => {
                let size = decoded_length(&record, length);
                let mut items_reader = Reader::new(reader.take(name, size)?);

                let mut items = Vec::new();
                while items_reader.remaining() > 0 {
                    let i = items.len();
                    let item = decode(element, &mut items_reader, endianness)
                        .map_err(|e| e.within(&format!("{name}[{i}]")))?;
                    items.push(Value::Record(item));
                }
                Value::Array(items)
            }
            CompiledKind::Repeated { element, count } => {
                let count = match count {
                    CompiledCount::Fixed(n) => *n,
                    CompiledCount::Elements(length) | CompiledCount::Bytes(length) => {
                        decoded_length(&record, length)
                    }
                };

                let needed = element.min_size().saturating_mul(count);
                if needed > reader.remaining() {
                    return Err(DecodeError::TruncatedInput {
                        field: name.to_string(),
                        needed,
                        available: reader.remaining(),
                    });
                }

                let mut items = Vec::with_capacity(count);
                for i in 0..count {
                    let item = decode(element, reader, endianness)
                        .map_err(|e| e.within(&format!("{name}[{i}]")))?;
                    items.push(Value::Record(item));
                }
                Value::Array(items)
            }
            CompiledKind::Nested(nested) => {
                Value::Record(decode(nested, reader, endianness).map_err(|e| e.within(name))?)
            }
            CompiledKind::Union(table) => match table.select_decode(name, &record)? {
                None => Value::Null,
                Some(branch) => {
                    Value::Record(decode(branch, reader, endianness).map_err(|e| e.within(name))?)
                }
            },
        };

        if field.is_scalar() {
            let width = field.fixed_size().unwrap_or(0);
            reader.take(name, aligned(width, schema.alignment()) - width)?;
        }

        record.insert(name, value);
    }

    Ok(record)
}

/// Value of an already decoded length field. The length field precedes the
/// repeat that uses it.
fn decoded_length(record: &Record, length: &str) -> usize {
    record
        .get(length)
        .and_then(Value::as_u64)
        .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX))
}

fn required<'a>(input: &'a Record, name: &str) -> Result<&'a Value, EncodeError> {
    input
        .get(name)
        .ok_or_else(|| EncodeError::MissingField(name.to_string()))
}

fn invalid(field: &str, expected: &str) -> EncodeError {
    EncodeError::InvalidValue {
        field: field.to_string(),
        expected: expected.to_string(),
    }
}

fn encode_primitive(
    name: &str,
    primitive: Primitive,
    value: &Value,
    endianness: Endianness,
    out: &mut Vec<u8>,
) -> Result<Value, EncodeError> {
    match primitive {
        Primitive::Bool => {
            let flag = match value {
                Value::Bool(b) => *b,
                _ => value.as_i128().ok_or_else(|| invalid(name, "bool"))? != 0,
            };
            out.push(flag as u8);
            Ok(Value::Bool(flag))
        }
        Primitive::F32 | Primitive::F64 => {
            let float = match value {
                Value::F64(f) => *f,
                Value::Decimal(d) => d.to_f64(),
                _ => value.as_i128().ok_or_else(|| invalid(name, "number"))? as f64,
            };
            if primitive == Primitive::F32 {
                let single = float as f32;
                bytes::write_f32(out, single, endianness);
                Ok(Value::F64(single as f64))
            } else {
                bytes::write_f64(out, float, endianness);
                Ok(Value::F64(float))
            }
        }
        _ => {
            let int = match value {
                Value::Enum(member) => member.value as i128,
                _ => value.as_i128().ok_or_else(|| invalid(name, "integer"))?,
            };
            if !primitive.fits(int) {
                return Err(EncodeError::OutOfRange {
                    field: name.to_string(),
                    value: int.to_string(),
                });
            }
            bytes::write_integer(out, int, primitive, endianness);
            Ok(integer_value(primitive, int))
        }
    }
}

fn decode_primitive(primitive: Primitive, raw: &[u8], endianness: Endianness) -> Value {
    match primitive {
        Primitive::Bool => Value::Bool(raw[0] != 0),
        Primitive::F32 => Value::F64(bytes::read_f32(raw, endianness) as f64),
        Primitive::F64 => Value::F64(bytes::read_f64(raw, endianness)),
        _ => integer_value(primitive, bytes::read_integer(raw, primitive, endianness)),
    }
}

/// Signed primitives surface as `I64`, unsigned ones as `U64`.
fn integer_value(primitive: Primitive, int: i128) -> Value {
    if primitive.is_signed() {
        Value::I64(int as i64)
    } else {
        Value::U64(int as u64)
    }
}

fn encode_fixed_bytes(
    name: &str,
    spec: &FixedBytesSpec,
    value: &Value,
    out: &mut Vec<u8>,
) -> Result<Value, EncodeError> {
    let data = match value {
        Value::String(s) => s.as_bytes(),
        Value::Bytes(b) => b.as_slice(),
        _ => return Err(invalid(name, "string or bytes")),
    };

    if data.len() > spec.len {
        return Err(EncodeError::FieldTooLong {
            field: name.to_string(),
            len: data.len(),
            max: spec.len,
        });
    }

    let start = out.len();
    out.extend_from_slice(data);
    out.resize(start + spec.len, 0);

    fixed_bytes_value(spec, &out[start..]).ok_or_else(|| invalid(name, "UTF-8 text"))
}

/// Value of a fixed-width byte field as decoding presents it. `None` if a
/// C-style string is not valid UTF-8.
fn fixed_bytes_value(spec: &FixedBytesSpec, raw: &[u8]) -> Option<Value> {
    if !spec.c_string {
        return Some(Value::Bytes(raw.to_vec()));
    }

    let end = raw.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    std::str::from_utf8(&raw[..end])
        .ok()
        .map(|s| Value::String(s.to_string()))
}

fn to_decimal(name: &str, value: &Value) -> Result<Decimal, EncodeError> {
    match value {
        Value::Decimal(d) => Ok(*d),
        Value::String(s) => s.parse().map_err(|e| parse_error(name, e, "decimal number")),
        Value::I64(v) => Ok(Decimal::from(*v)),
        Value::U64(v) => Ok(Decimal::from(*v)),
        Value::F64(f) => Decimal::from_f64(*f).map_err(|e| parse_error(name, e, "finite number")),
        _ => Err(invalid(name, "decimal number")),
    }
}

/// Too many integer digits is a range error; anything else is a bad value.
fn parse_error(name: &str, err: ParseDecimalError, expected: &str) -> EncodeError {
    match err {
        ParseDecimalError::Overflow(value) => EncodeError::OutOfRange {
            field: name.to_string(),
            value,
        },
        ParseDecimalError::Invalid(_) => invalid(name, expected),
    }
}

fn to_member(
    name: &str,
    enumeration: &Enumeration,
    value: &Value,
) -> Result<EnumMember, EncodeError> {
    let found = match value {
        Value::String(s) => enumeration.by_name(s),
        Value::I64(_) | Value::U64(_) => value.as_i64().and_then(|v| enumeration.by_value(v)),
        Value::Enum(member) => enumeration.contains(member).then_some(member),
        _ => return Err(invalid(name, "enum member")),
    };

    found.cloned().ok_or_else(|| EncodeError::UnknownEnumMember {
        field: name.to_string(),
        enumeration: enumeration.name().to_string(),
        member: match value {
            Value::String(s) => s.clone(),
            Value::Enum(member) => member.name.clone(),
            other => other.as_i128().map_or_else(String::new, |v| v.to_string()),
        },
    })
}
