//! Discriminated unions: a branch table keyed by the value of an earlier
//! sibling field.

use std::{collections::BTreeMap, fmt, sync::Arc};

use crate::{
    compiled::{CompiledField, CompiledKind},
    errors::{DecodeError, EncodeError, SchemaError},
    schema::Schema,
    value::{Record, Value},
};

/// Key of a union branch: a raw integer, or a member name when the
/// discriminant is an enumerated field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchKey {
    Value(i64),
    Member(String),
}

impl fmt::Display for BranchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchKey::Value(v) => write!(f, "{v}"),
            BranchKey::Member(name) => write!(f, "{name}"),
        }
    }
}

macro_rules! impl_branch_key_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for BranchKey {
                fn from(value: $t) -> Self {
                    BranchKey::Value(value as i64)
                }
            }
        )*
    };
}

impl_branch_key_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<&str> for BranchKey {
    fn from(value: &str) -> Self {
        BranchKey::Member(value.to_string())
    }
}

impl From<String> for BranchKey {
    fn from(value: String) -> Self {
        BranchKey::Member(value)
    }
}

/// One arm of a union. A branch without a schema occupies no bytes.
#[derive(Debug, Clone)]
pub struct Branch {
    pub key: BranchKey,
    pub schema: Option<Arc<Schema>>,
}

impl Branch {
    pub fn new(key: impl Into<BranchKey>, schema: impl Into<Arc<Schema>>) -> Self {
        Branch {
            key: key.into(),
            schema: Some(schema.into()),
        }
    }

    pub fn empty(key: impl Into<BranchKey>) -> Self {
        Branch {
            key: key.into(),
            schema: None,
        }
    }
}

/// Uncompiled union parameters, see [crate::field::FieldKind::Union].
#[derive(Debug, Clone)]
pub struct UnionSpec {
    /// Name of the earlier sibling field whose value selects the branch.
    pub discriminant: String,
    pub branches: Vec<Branch>,
}

/// Compiled union: branch keys resolved to the discriminant's integer values.
#[derive(Debug, Clone)]
pub struct BranchTable {
    discriminant: String,
    branches: BTreeMap<i64, Option<Arc<Schema>>>,
}

impl BranchTable {
    pub(crate) fn compile(
        field: &str,
        spec: &UnionSpec,
        earlier: &[CompiledField],
    ) -> Result<Self, SchemaError> {
        let target = earlier
            .iter()
            .find(|f| f.is_named() && f.name == spec.discriminant)
            .ok_or_else(|| SchemaError::UnresolvedDiscriminant {
                field: field.to_string(),
                discriminant: spec.discriminant.clone(),
            })?;

        let (base, enumeration) = match &target.kind {
            CompiledKind::Primitive(p) if p.is_integer() => (*p, None),
            CompiledKind::Enumerated { base, enumeration } => (*base, Some(enumeration)),
            _ => {
                return Err(SchemaError::InvalidDiscriminant {
                    field: field.to_string(),
                    discriminant: spec.discriminant.clone(),
                });
            }
        };

        let mut branches = BTreeMap::new();

        for branch in &spec.branches {
            let invalid = || SchemaError::InvalidBranchKey {
                field: field.to_string(),
                key: branch.key.to_string(),
            };

            let value = match (&branch.key, enumeration) {
                (BranchKey::Value(v), None) if base.fits(*v as i128) => *v,
                (BranchKey::Value(v), Some(e)) if e.by_value(*v).is_some() => *v,
                (BranchKey::Member(name), Some(e)) => {
                    e.by_name(name).map(|m| m.value).ok_or_else(invalid)?
                }
                _ => return Err(invalid()),
            };

            if branches.insert(value, branch.schema.clone()).is_some() {
                return Err(invalid());
            }
        }

        Ok(BranchTable {
            discriminant: spec.discriminant.clone(),
            branches,
        })
    }

    /// Name of the field selecting the branch.
    pub fn discriminant(&self) -> &str {
        &self.discriminant
    }

    /// Branch for a discriminant value: `None` if there is no such branch,
    /// `Some(None)` for an empty branch.
    pub fn resolve(&self, key: i128) -> Option<Option<&Arc<Schema>>> {
        let key = i64::try_from(key).ok()?;
        self.branches.get(&key).map(Option::as_ref)
    }

    pub fn keys(&self) -> impl Iterator<Item = i64> + '_ {
        self.branches.keys().copied()
    }

    /// Smallest width any branch can occupy.
    pub fn min_size(&self) -> usize {
        self.branches
            .values()
            .map(|b| b.as_ref().map_or(0, |s| s.min_size()))
            .min()
            .unwrap_or(0)
    }

    pub(crate) fn select_encode(
        &self,
        field: &str,
        made: &Record,
    ) -> Result<Option<&Arc<Schema>>, EncodeError> {
        let value = made
            .get(&self.discriminant)
            .ok_or_else(|| EncodeError::MissingField(self.discriminant.clone()))?;

        let unknown = || EncodeError::UnknownUnionBranch {
            field: field.to_string(),
            discriminant: describe(value),
        };

        let key = discriminant_key(value).ok_or_else(unknown)?;
        let branch = self.resolve(key).ok_or_else(unknown)?;

        tracing::trace!(
            field,
            discriminant = key as i64,
            empty = branch.is_none(),
            "selected union branch"
        );
        Ok(branch)
    }

    pub(crate) fn select_decode(
        &self,
        field: &str,
        decoded: &Record,
    ) -> Result<Option<&Arc<Schema>>, DecodeError> {
        // Compilation places an integer or enumerated discriminant before the
        // union, so a missing key means the record was not decoded by this schema.
        let key = decoded
            .get(&self.discriminant)
            .and_then(discriminant_key)
            .ok_or_else(|| DecodeError::MissingDiscriminant {
                field: field.to_string(),
                discriminant: self.discriminant.clone(),
            })?;

        let branch = self
            .resolve(key)
            .ok_or_else(|| DecodeError::UnknownUnionBranch {
                field: field.to_string(),
                discriminant: key,
            })?;

        tracing::trace!(
            field,
            discriminant = key as i64,
            empty = branch.is_none(),
            "selected union branch"
        );
        Ok(branch)
    }
}

/// Resolved integer value of a discriminant: the member value for enumerated
/// fields, the number itself for integer fields.
fn discriminant_key(value: &Value) -> Option<i128> {
    match value {
        Value::Enum(member) => Some(member.value as i128),
        _ => value.as_i128(),
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::Enum(member) => format!("{} ({})", member.name, member.value),
        Value::I64(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        other => other.kind().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        enumeration::Enumeration,
        field::Field,
        wire::{Endianness, Primitive},
    };

    fn earlier() -> Vec<CompiledField> {
        let kind = Arc::new(Enumeration::new("Kind", [("A", 0), ("B", 1)]).unwrap());
        let fields = [
            Field::primitive("count", Primitive::U8),
            Field::enumerated("kind", Primitive::U8, kind),
            Field::fixed_point("level", Primitive::I16, 2),
        ];

        let mut compiled = Vec::new();
        for field in &fields {
            let c = CompiledField::compile(field, &compiled).unwrap();
            compiled.push(c);
        }
        compiled
    }

    fn body() -> Schema {
        Schema::compile("Body", &[Field::primitive("x", Primitive::U16)], Endianness::Big).unwrap()
    }

    fn spec(discriminant: &str, branches: Vec<Branch>) -> UnionSpec {
        UnionSpec {
            discriminant: discriminant.to_string(),
            branches,
        }
    }

    #[test]
    fn test_member_keys_resolve_to_values() {
        let table = BranchTable::compile(
            "u",
            &spec("kind", vec![Branch::empty("A"), Branch::new("B", body())]),
            &earlier(),
        )
        .unwrap();

        assert_eq!(table.keys().collect::<Vec<_>>(), vec![0, 1]);
        assert!(matches!(table.resolve(0), Some(None)));
        assert!(matches!(table.resolve(1), Some(Some(_))));
        assert!(table.resolve(2).is_none());
        assert_eq!(table.min_size(), 0);
    }

    #[test]
    fn test_unresolved_discriminant() {
        let err = BranchTable::compile("u", &spec("later", vec![]), &earlier()).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnresolvedDiscriminant {
                field: "u".to_string(),
                discriminant: "later".to_string()
            }
        );
    }

    #[test]
    fn test_fixed_point_discriminant_rejected() {
        let err = BranchTable::compile("u", &spec("level", vec![]), &earlier()).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidDiscriminant { .. }));
    }

    #[test]
    fn test_invalid_keys() {
        let cases = vec![
            spec("kind", vec![Branch::empty("C")]),
            spec("kind", vec![Branch::empty(5)]),
            spec("count", vec![Branch::empty("A")]),
            spec("count", vec![Branch::empty(256)]),
            spec("count", vec![Branch::empty(1), Branch::new(1, body())]),
        ];

        for case in cases {
            let err = BranchTable::compile("u", &case, &earlier()).unwrap_err();
            assert!(matches!(err, SchemaError::InvalidBranchKey { .. }), "{case:?}");
        }
    }

    #[test]
    fn test_select_encode_unknown_branch() {
        let table =
            BranchTable::compile("u", &spec("count", vec![Branch::new(1, body())]), &earlier())
                .unwrap();
        let made = Record::new().with("count", 2u8);

        assert_eq!(
            table.select_encode("u", &made).unwrap_err(),
            EncodeError::UnknownUnionBranch {
                field: "u".to_string(),
                discriminant: "2".to_string()
            }
        );
    }

    #[test]
    fn test_select_decode_without_discriminant() {
        let table =
            BranchTable::compile("u", &spec("count", vec![Branch::empty(0)]), &earlier()).unwrap();

        for decoded in [Record::new(), Record::new().with("count", "zero")] {
            assert_eq!(
                table.select_decode("u", &decoded).unwrap_err(),
                DecodeError::MissingDiscriminant {
                    field: "u".to_string(),
                    discriminant: "count".to_string()
                }
            );
        }
    }

    #[test]
    fn test_select_decode_unknown_branch() {
        let table =
            BranchTable::compile("u", &spec("count", vec![Branch::new(1, body())]), &earlier())
                .unwrap();
        let decoded = Record::new().with("count", 9u8);

        assert_eq!(
            table.select_decode("u", &decoded).unwrap_err(),
            DecodeError::UnknownUnionBranch {
                field: "u".to_string(),
                discriminant: 9
            }
        );
    }
}
