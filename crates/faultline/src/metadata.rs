// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::Args;

/// A materialized key/value snapshot.
///
/// Keys are unique and iterate in sorted order. A snapshot attached to a [`Fault`](crate::Fault)
/// is owned by that fault alone, so deriving further contexts never changes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    entries: BTreeMap<String, Value>,
}

impl Metadata {
    /// Creates an empty snapshot.
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: BTreeMap::new() }
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the snapshot holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Converts the snapshot into a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect::<Map<_, _>>())
    }

    /// Applies `args` in order on top of the existing entries.
    pub(crate) fn apply(&mut self, args: Args) {
        for arg in args {
            let (key, value) = arg.into_entry();
            self.entries.insert(key, value);
        }
    }

    pub(crate) fn merged(&self, args: Args) -> Self {
        let mut copy = self.clone();
        copy.apply(args);
        copy
    }
}

impl<'a> IntoIterator for &'a Metadata {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl From<Args> for Metadata {
    fn from(args: Args) -> Self {
        Self::new().merged(args)
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(&self.entries)
    }
}

/// Compact JSON, suitable for a single structured log field.
impl fmt::Display for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}
