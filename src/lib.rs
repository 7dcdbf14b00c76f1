//! # structcraft
//!
//! A library for packing and unpacking fixed-layout binary messages using
//! declarative schemas.
//!
//! Define a message as an ordered list of named fields (integers, floats,
//! fixed-width strings, padding, fixed-point numbers, enumerations and
//! discriminated unions), then pack records into bytes and unpack bytes back
//! into records.
//!
//! ## Example
//!
//! ```
//! use structcraft::{Endianness, Field, Primitive, Record, Schema, Value};
//!
//! let schema = Schema::compile(
//!     "Reading",
//!     &[
//!         Field::primitive("id", Primitive::U16),
//!         Field::string("label", 6),
//!         Field::fixed_point("level", Primitive::I32, 4),
//!     ],
//!     Endianness::Big,
//! )
//! .unwrap();
//!
//! let record = Record::new()
//!     .with("id", 7u16)
//!     .with("label", "tank")
//!     .with("level", "1.25");
//!
//! let data = schema.pack(&record).unwrap();
//! assert_eq!(data, b"\x00\x07tank\x00\x00\x00\x00\x00\x14");
//!
//! let unpacked = schema.unpack(&data).unwrap();
//! assert_eq!(unpacked["label"], Value::from("tank"));
//! assert_eq!(unpacked["level"].as_decimal().unwrap().to_string(), "1.25");
//! ```

pub mod bytes;
mod codec;
pub mod compiled;
pub mod enumeration;
pub mod errors;
pub mod field;
pub mod fixed_point;
pub mod schema;
#[cfg(feature = "serde")]
pub mod serde;
pub mod union;
pub mod value;
pub mod wire;

pub use enumeration::{EnumMember, Enumeration};
pub use errors::{DecodeError, EncodeError, SchemaError};
pub use field::{Field, FieldKind, LengthUnit, RepeatCount};
pub use fixed_point::{Decimal, FixedPoint};
pub use schema::Schema;
pub use union::{Branch, BranchKey};
pub use value::{Record, Value};
pub use wire::{Endianness, Primitive};
