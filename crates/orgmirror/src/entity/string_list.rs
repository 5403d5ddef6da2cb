//! JSON-backed list of strings used for labels, assignees, files and paths.

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// An ordered list of strings persisted as a JSON array column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct StringList(pub Vec<String>);

impl StringList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, value: impl Into<String>) {
        self.0.push(value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|v| v == value)
    }
}

impl From<Vec<String>> for StringList {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

impl FromIterator<String> for StringList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a StringList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_plain_json_array() {
        let list: StringList = vec!["bug".to_string(), "area/networking".to_string()].into();
        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(json, r#"["bug","area/networking"]"#);

        let back: StringList = serde_json::from_str(&json).unwrap();
        assert_eq!(back, list);
    }

    #[test]
    fn contains_matches_exact_entries() {
        let list: StringList = ["a".to_string(), "b/c".to_string()].into_iter().collect();
        assert!(list.contains("b/c"));
        assert!(!list.contains("b"));
        assert_eq!(list.len(), 2);
    }
}
