//! Request parameter parsing
//!
//! Request parameters arrive as loosely typed `key=value` pairs. Three keys
//! are reserved for result control:
//! - `sort_by`: comma-separated `attribute[.asc|.desc]` tokens
//! - `page`: 1-based page number
//! - `page_size`: rows per page
//!
//! Every other key is a candidate filter attribute whose value is either a
//! scalar or a comma-separated list (set membership).

use crate::{Error, Result};
use std::collections::BTreeMap;

pub const SORT_BY: &str = "sort_by";
pub const PAGE: &str = "page";
pub const PAGE_SIZE: &str = "page_size";

pub const RESERVED_KEYS: [&str; 3] = [SORT_BY, PAGE, PAGE_SIZE];

/// Separator between list items in a parameter value.
pub const LIST_SEPARATOR: char = ',';
/// Separator between path segments in a filter key.
pub const PATH_SEPARATOR: char = '.';
/// Word separator removed when normalizing keys.
pub const WORD_SEPARATOR: char = '_';

pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Raw request parameters keyed by name.
///
/// Keys are kept in sorted order so filters and predicates are built in the
/// same order for the same request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParameters {
    values: BTreeMap<String, String>,
}

impl RequestParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse ordered (key, value) items, e.g. from a query string.
    ///
    /// A key may appear only once.
    pub fn from_items(items: &[(String, String)]) -> Result<Self> {
        let mut values = BTreeMap::new();
        for (key, value) in items {
            if values.insert(key.clone(), value.clone()).is_some() {
                return Err(Error::DuplicateParameter(key.clone()));
            }
        }
        Ok(Self { values })
    }

    /// Builder-style insert; a repeated key replaces the earlier value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn sort_by(&self) -> Option<&str> {
        self.get(SORT_BY)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Non-reserved parameters, in key order.
    pub fn filter_candidates(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter(|(k, _)| !is_reserved(k))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestParameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Convert a separated key into its single-word form: each `_` is removed
/// and the character after it is uppercased (`user_name` -> `userName`).
pub fn camelize(key: &str) -> String {
    if !key.contains(WORD_SEPARATOR) {
        return key.to_string();
    }

    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if c == WORD_SEPARATOR {
            upper_next = true;
            continue;
        }
        if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Split on `sep`, dropping trailing empty items (`"a,b,"` -> `["a", "b"]`).
pub fn split_list(value: &str, sep: char) -> Vec<&str> {
    let mut items: Vec<&str> = value.split(sep).collect();
    while items.last().is_some_and(|s| s.is_empty()) {
        items.pop();
    }
    items
}
