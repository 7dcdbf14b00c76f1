//! Values handed to [crate::schema::Schema::pack] and returned by
//! [crate::schema::Schema::unpack].

use std::ops::Index;

use indexmap::IndexMap;

use crate::{enumeration::EnumMember, fixed_point::Decimal};

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The value of an empty union branch.
    Null,
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    Decimal(Decimal),
    Bytes(Vec<u8>),
    String(String),
    Enum(EnumMember),
    Record(Record),
    Array(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer view of `I64` and `U64` values.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::I64(v) => Some(*v as i128),
            Value::U64(v) => Some(*v as i128),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.as_i128().and_then(|v| i64::try_from(v).ok())
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_i128().and_then(|v| u64::try_from(v).ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            Value::Decimal(d) => Some(d.to_f64()),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<&Decimal> {
        match self {
            Value::Decimal(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumMember> {
        match self {
            Value::Enum(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Short type name used in error messages.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I64(_) | Value::U64(_) => "integer",
            Value::F64(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::Enum(_) => "enum member",
            Value::Record(_) => "record",
            Value::Array(_) => "array",
        }
    }
}

macro_rules! impl_from_int {
    ($variant:ident, $target:ty, $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::$variant(value as $target)
                }
            }
        )*
    };
}

impl_from_int!(I64, i64, i8, i16, i32, i64);
impl_from_int!(U64, u64, u8, u16, u32, u64);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::F64(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<EnumMember> for Value {
    fn from(value: EnumMember) -> Self {
        Value::Enum(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Record(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Vec<Record>> for Value {
    fn from(value: Vec<Record>) -> Self {
        Value::Array(value.into_iter().map(Value::Record).collect())
    }
}

static NULL: Value = Value::Null;

/// Field access on nested records. Yields [Value::Null] for non-records.
impl Index<&str> for Value {
    type Output = Value;

    fn index(&self, name: &str) -> &Value {
        match self {
            Value::Record(record) => &record[name],
            _ => &NULL,
        }
    }
}

impl Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        match self {
            Value::Array(items) => items.get(index).unwrap_or(&NULL),
            _ => &NULL,
        }
    }
}

/// An ordered mapping from field name to [Value].
///
/// Used both as the input of `pack`/`make` and as the result view of
/// `make`/`unpack`, where it lists fields in declaration order. Indexing a
/// missing name yields [Value::Null]. Equality compares fields in order.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Record {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Inserts or replaces a field, keeping the position of an existing one.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.fields.len() == other.fields.len() && self.fields.iter().eq(other.fields.iter())
    }
}

impl Index<&str> for Record {
    type Output = Value;

    fn index(&self, name: &str) -> &Value {
        self.get(name).unwrap_or(&NULL)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.insert(name, value);
        }
        record
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Record {
    fn from(fields: [(K, V); N]) -> Self {
        fields.into_iter().collect()
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_order() {
        let mut record = Record::new();
        record.insert("b", 1);
        record.insert("a", 2);
        record.insert("b", 3);

        let names: Vec<_> = record.names().collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(record["b"], Value::I64(3));
    }

    #[test]
    fn test_equality_is_ordered() {
        let ab = Record::new().with("a", 1).with("b", 2);
        let ba = Record::new().with("b", 2).with("a", 1);
        assert_ne!(ab, ba);
        assert_eq!(ab, Record::new().with("a", 0).with("b", 2).with("a", 1));
    }

    #[test]
    fn test_many_fields() {
        let record: Record = (0..20_000).map(|i| (format!("f{i}"), i)).collect();
        assert_eq!(record.len(), 20_000);
        assert_eq!(record["f19999"], Value::I64(19_999));
        assert_eq!(record.names().nth(3), Some("f3"));
    }

    #[test]
    fn test_missing_index_is_null() {
        let record = Record::from([("a", 1u8)]);
        assert!(record["missing"].is_null());
        assert_eq!(record.get("missing"), None);
    }

    #[test]
    fn test_nested_access() {
        let inner = Record::new().with("status", 1u8);
        let outer = Record::new().with("like_a_c_union", inner);
        assert_eq!(outer["like_a_c_union"].as_record().unwrap()["status"].as_u64(), Some(1));
        assert_eq!(outer["like_a_c_union"]["status"].as_u64(), Some(1));
        assert!(outer["like_a_c_union"]["missing"]["deeper"].is_null());
        assert!(outer["like_a_c_union"][3].is_null());
    }

    #[test]
    fn test_integer_views() {
        assert_eq!(Value::from(-1i32).as_u64(), None);
        assert_eq!(Value::from(-1i32).as_i64(), Some(-1));
        assert_eq!(Value::from(u64::MAX).as_i64(), None);
        assert_eq!(Value::from(u64::MAX).as_i128(), Some(u64::MAX as i128));
    }
}
