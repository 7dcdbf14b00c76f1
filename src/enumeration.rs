//! Enumerations: closed, bidirectional tables between integers and symbolic names.

use std::collections::BTreeMap;

use crate::errors::SchemaError;

/// A single member of an [Enumeration].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}

impl EnumMember {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        EnumMember {
            name: name.into(),
            value,
        }
    }
}

/// A named set of members, looked up either by value or by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumeration {
    name: String,
    members: Vec<EnumMember>,
    by_value: BTreeMap<i64, usize>,
    by_name: BTreeMap<String, usize>,
}

impl Enumeration {
    /// Builds an enumeration. Fails on duplicate names or values.
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let name = name.into();
        let mut enumeration = Enumeration {
            name,
            members: Vec::new(),
            by_value: BTreeMap::new(),
            by_name: BTreeMap::new(),
        };

        for (member_name, value) in members {
            let member = EnumMember::new(member_name, value);
            let index = enumeration.members.len();

            if member.name.is_empty() {
                return Err(enumeration.invalid("empty member name".to_string()));
            }
            if enumeration.by_name.insert(member.name.clone(), index).is_some() {
                return Err(enumeration.invalid(format!("duplicate member `{}`", member.name)));
            }
            if enumeration.by_value.insert(value, index).is_some() {
                return Err(enumeration.invalid(format!("duplicate value {value}")));
            }

            enumeration.members.push(member);
        }

        Ok(enumeration)
    }

    fn invalid(&self, detail: String) -> SchemaError {
        SchemaError::InvalidEnumeration {
            enumeration: self.name.clone(),
            detail,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[EnumMember] {
        &self.members
    }

    pub fn by_value(&self, value: i64) -> Option<&EnumMember> {
        self.by_value.get(&value).map(|&i| &self.members[i])
    }

    pub fn by_name(&self, name: &str) -> Option<&EnumMember> {
        self.by_name.get(name).map(|&i| &self.members[i])
    }

    pub fn contains(&self, member: &EnumMember) -> bool {
        self.by_name(&member.name) == Some(member)
    }
}
