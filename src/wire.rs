//! Wire-level building blocks: byte order and primitive numeric codes.

/// Byte order used when packing multi-byte values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Endianness {
    #[default]
    Big,
    Little,
}

impl Endianness {
    /// Byte order of the target platform.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

/// A fixed-width primitive with a numeric interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl Primitive {
    /// Parses a struct-style format character (`?bBhHiIlLqQfd`).
    pub fn from_code(code: &str) -> Option<Self> {
        let primitive = match code {
            "?" => Primitive::Bool,
            "b" => Primitive::I8,
            "B" => Primitive::U8,
            "h" => Primitive::I16,
            "H" => Primitive::U16,
            "i" | "l" => Primitive::I32,
            "I" | "L" => Primitive::U32,
            "q" => Primitive::I64,
            "Q" => Primitive::U64,
            "f" => Primitive::F32,
            "d" => Primitive::F64,
            _ => return None,
        };

        Some(primitive)
    }

    /// The canonical format character for this primitive.
    pub fn code(self) -> char {
        match self {
            Primitive::Bool => '?',
            Primitive::I8 => 'b',
            Primitive::U8 => 'B',
            Primitive::I16 => 'h',
            Primitive::U16 => 'H',
            Primitive::I32 => 'i',
            Primitive::U32 => 'I',
            Primitive::I64 => 'q',
            Primitive::U64 => 'Q',
            Primitive::F32 => 'f',
            Primitive::F64 => 'd',
        }
    }

    /// Width in bytes.
    pub fn width(self) -> usize {
        match self {
            Primitive::Bool | Primitive::I8 | Primitive::U8 => 1,
            Primitive::I16 | Primitive::U16 => 2,
            Primitive::I32 | Primitive::U32 | Primitive::F32 => 4,
            Primitive::I64 | Primitive::U64 | Primitive::F64 => 8,
        }
    }

    pub fn bits(self) -> u32 {
        self.width() as u32 * 8
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Primitive::Bool | Primitive::F32 | Primitive::F64)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Primitive::I8 | Primitive::I16 | Primitive::I32 | Primitive::I64
        )
    }

    /// Inclusive range of an integer primitive, `None` for bool and floats.
    pub fn int_range(self) -> Option<(i128, i128)> {
        if !self.is_integer() {
            return None;
        }

        let bits = self.bits();
        if self.is_signed() {
            Some((-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1))
        } else {
            Some((0, (1i128 << bits) - 1))
        }
    }

    /// True if `value` is representable by this integer primitive.
    pub fn fits(self, value: i128) -> bool {
        self.int_range()
            .is_some_and(|(min, max)| value >= min && value <= max)
    }
}
