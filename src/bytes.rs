//! Low-level integer and float packing for byte slices.
//!
//! Integers are carried as `i128` so every signed and unsigned width up to
//! 64 bits shares one code path.

use crate::wire::{Endianness, Primitive};

/// Reads an unsigned integer of `data.len()` bytes (at most 8).
pub fn read_uint(data: &[u8], endianness: Endianness) -> u64 {
    let mut value = 0u64;

    match endianness {
        Endianness::Big => {
            for byte in data {
                value = (value << 8) | *byte as u64;
            }
        }
        Endianness::Little => {
            for byte in data.iter().rev() {
                value = (value << 8) | *byte as u64;
            }
        }
    }

    value
}

/// Appends the low `width` bytes of `value`.
pub fn write_uint(out: &mut Vec<u8>, value: u64, width: usize, endianness: Endianness) {
    match endianness {
        Endianness::Big => out.extend_from_slice(&value.to_be_bytes()[8 - width..]),
        Endianness::Little => out.extend_from_slice(&value.to_le_bytes()[..width]),
    }
}

/// Sign-extends the low `bits` of `value` to a full `i64`.
pub fn sign_extend(value: u64, bits: usize) -> i64 {
    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}

/// Reads an integer primitive from exactly `primitive.width()` bytes.
pub fn read_integer(data: &[u8], primitive: Primitive, endianness: Endianness) -> i128 {
    let raw = read_uint(data, endianness);

    if primitive.is_signed() {
        sign_extend(raw, primitive.bits() as usize) as i128
    } else {
        raw as i128
    }
}

/// Appends an integer that the caller has already range-checked against `primitive`.
pub fn write_integer(out: &mut Vec<u8>, value: i128, primitive: Primitive, endianness: Endianness) {
    // Truncating to the low 64 bits yields the two's complement pattern for
    // negative values and the plain pattern for unsigned ones.
    write_uint(out, value as u64, primitive.width(), endianness);
}

pub fn read_f32(data: &[u8], endianness: Endianness) -> f32 {
    f32::from_bits(read_uint(data, endianness) as u32)
}

pub fn read_f64(data: &[u8], endianness: Endianness) -> f64 {
    f64::from_bits(read_uint(data, endianness))
}

pub fn write_f32(out: &mut Vec<u8>, value: f32, endianness: Endianness) {
    write_uint(out, value.to_bits() as u64, 4, endianness);
}

pub fn write_f64(out: &mut Vec<u8>, value: f64, endianness: Endianness) {
    write_uint(out, value.to_bits(), 8, endianness);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_uint_big() {
        assert_eq!(read_uint(&[0x01, 0x02], Endianness::Big), 0x0102);
    }

    #[test]
    fn test_read_uint_little() {
        assert_eq!(read_uint(&[0x01, 0x02], Endianness::Little), 0x0201);
    }

    #[test]
    fn test_write_uint() {
        let mut out = Vec::new();
        write_uint(&mut out, 0x0102_0304, 4, Endianness::Big);
        write_uint(&mut out, 0x0102_0304, 4, Endianness::Little);
        assert_eq!(out, vec![1, 2, 3, 4, 4, 3, 2, 1]);
    }

    #[test]
    fn test_sign_extend() {
        assert_eq!(sign_extend(0b11111111, 8), -1);
        assert_eq!(sign_extend(0x7f, 8), 127);
        assert_eq!(sign_extend(u64::MAX, 64), -1);
    }

    #[test]
    fn test_negative_integer() {
        let mut out = Vec::new();
        write_integer(&mut out, -2, Primitive::I16, Endianness::Big);
        assert_eq!(out, vec![0xff, 0xfe]);
        assert_eq!(read_integer(&out, Primitive::I16, Endianness::Big), -2);
        assert_eq!(read_integer(&out, Primitive::U16, Endianness::Big), 0xfffe);
    }

    #[test]
    fn test_u64_max() {
        let mut out = Vec::new();
        write_integer(&mut out, u64::MAX as i128, Primitive::U64, Endianness::Little);
        assert_eq!(out, vec![0xff; 8]);
        assert_eq!(
            read_integer(&out, Primitive::U64, Endianness::Little),
            u64::MAX as i128
        );
    }

    #[test]
    fn test_floats() {
        let mut out = Vec::new();
        write_f32(&mut out, 1.5, Endianness::Little);
        write_f64(&mut out, -2.25, Endianness::Big);
        assert_eq!(read_f32(&out[..4], Endianness::Little), 1.5);
        assert_eq!(read_f64(&out[4..], Endianness::Big), -2.25);
    }
}
