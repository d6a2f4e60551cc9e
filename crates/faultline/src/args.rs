// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Ordered key/value argument lists used to derive and attach metadata.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::Value;

/// Key under which unpaired or non-string-keyed arguments are recorded.
pub const BAD_KEY: &str = "!BADKEY";

/// A single metadata argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A well-formed key/value pair.
    Pair(Cow<'static, str>, Value),
    /// A value that could not be paired with a string key. Recorded under [`BAD_KEY`].
    BadKey(Value),
}

impl Arg {
    /// Returns the key this argument is recorded under.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Pair(key, _) => key,
            Self::BadKey(_) => BAD_KEY,
        }
    }

    /// Returns the value of this argument.
    #[must_use]
    pub fn value(&self) -> &Value {
        match self {
            Self::Pair(_, value) | Self::BadKey(value) => value,
        }
    }

    pub(crate) fn into_entry(self) -> (String, Value) {
        match self {
            Self::Pair(key, value) => (key.into_owned(), value),
            Self::BadKey(value) => (BAD_KEY.to_owned(), value),
        }
    }
}

/// An ordered list of metadata arguments.
///
/// Arguments are applied in order, so a later write to the same key overwrites an earlier one.
/// This includes [`BAD_KEY`]: only the last bad argument of a list survives.
///
/// # Examples
///
/// ```rust
/// use faultline::{Args, Context, kv};
///
/// let ctx = Context::background()
///     .with_meta(Args::new().pair("tenant", "contoso"))
///     .with_meta(kv!("user" => 42, "admin" => false));
///
/// assert_eq!(ctx.metadata().len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    items: Vec<Arg>,
}

impl Args {
    /// Creates an empty argument list.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Parses a raw, untyped argument sequence.
    ///
    /// A string takes the next value as its pair. A trailing string with nothing after it, and
    /// any non-string value found where a key is expected, is kept as [`Arg::BadKey`] with its
    /// raw value and consumes only itself.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use faultline::{Arg, Args};
    /// use serde_json::json;
    ///
    /// let args = Args::from_raw([json!("key"), json!("value"), json!(42)]);
    /// let items: Vec<_> = args.iter().cloned().collect();
    ///
    /// assert_eq!(items, vec![Arg::Pair("key".into(), json!("value")), Arg::BadKey(json!(42))]);
    /// ```
    #[must_use]
    pub fn from_raw(values: impl IntoIterator<Item = Value>) -> Self {
        let mut values = values.into_iter();
        let mut items = Vec::new();

        while let Some(value) = values.next() {
            let arg = match value {
                Value::String(key) => match values.next() {
                    Some(value) => Arg::Pair(Cow::Owned(key), value),
                    None => Arg::BadKey(Value::String(key)),
                },
                other => Arg::BadKey(other),
            };
            items.push(arg);
        }

        Self { items }
    }

    /// Appends a key/value pair.
    #[must_use]
    pub fn pair(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        self.items.push(Arg::Pair(key.into(), value.into()));
        self
    }

    /// Appends a pair whose value is converted with [`serde_json::to_value`].
    ///
    /// If the conversion fails, the failure text is recorded as the value so the key is never
    /// silently lost.
    #[must_use]
    pub fn serialized<T>(self, key: impl Into<Cow<'static, str>>, value: &T) -> Self
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(value).unwrap_or_else(|e| Value::String(e.to_string()));
        self.pair(key, value)
    }

    /// Appends an argument that has no usable key.
    #[must_use]
    pub fn bad_key(mut self, value: impl Into<Value>) -> Self {
        self.items.push(Arg::BadKey(value.into()));
        self
    }

    /// Returns the number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates the arguments in application order.
    pub fn iter(&self) -> impl Iterator<Item = &Arg> {
        self.items.iter()
    }
}

impl IntoIterator for Args {
    type Item = Arg;
    type IntoIter = std::vec::IntoIter<Arg>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<Arg> for Args {
    fn from_iter<I: IntoIterator<Item = Arg>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl From<()> for Args {
    fn from((): ()) -> Self {
        Self::new()
    }
}

impl From<Vec<Arg>> for Args {
    fn from(items: Vec<Arg>) -> Self {
        Self { items }
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Args
where
    K: Into<Cow<'static, str>>,
    V: Into<Value>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().map(|(k, v)| Arg::Pair(k.into(), v.into())).collect()
    }
}

/// Builds [`Args`] from `key => value` pairs of mixed value types.
///
/// ```rust
/// use faultline::kv;
///
/// let args = kv!("id" => 404_i64, "name" => "ghost");
/// assert_eq!(args.len(), 2);
/// ```
#[macro_export]
macro_rules! kv {
    () => {
        $crate::Args::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::Args::new()$(.pair($key, $value))+
    };
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn raw_even_sequence_pairs_up() {
        let args = Args::from_raw([json!("a"), json!(1), json!("b"), json!("two")]);
        let items: Vec<_> = args.into_iter().collect();

        assert_eq!(items, vec![Arg::Pair("a".into(), json!(1)), Arg::Pair("b".into(), json!("two"))]);
    }

    #[test]
    fn raw_trailing_key_is_bad() {
        let args = Args::from_raw([json!("key"), json!("value"), json!("missingkey")]);
        let items: Vec<_> = args.into_iter().collect();

        assert_eq!(items[1], Arg::BadKey(json!("missingkey")));
        assert_eq!(items[1].key(), BAD_KEY);
    }

    #[test]
    fn raw_non_string_key_consumes_only_itself() {
        let args = Args::from_raw([json!(42), json!("key"), json!("value")]);
        let items: Vec<_> = args.into_iter().collect();

        assert_eq!(items, vec![Arg::BadKey(json!(42)), Arg::Pair("key".into(), json!("value"))]);
    }

    #[test]
    fn raw_single_value() {
        let args = Args::from_raw([json!(42)]);
        assert_eq!(args.iter().collect::<Vec<_>>(), vec![&Arg::BadKey(json!(42))]);
    }

    #[test]
    fn serialized_struct() {
        #[derive(serde::Serialize)]
        struct Params {
            id: i64,
        }

        let args = Args::new().serialized("params", &Params { id: 7 });
        let arg = args.iter().next().unwrap();

        assert_eq!(arg.key(), "params");
        assert_eq!(arg.value(), &json!({ "id": 7 }));
    }

    #[test]
    fn serialized_failure_keeps_key() {
        let mut map = std::collections::HashMap::new();
        map.insert(vec![1_u8], 1);

        let args = Args::new().serialized("broken", &map);
        let arg = args.iter().next().unwrap();

        assert_eq!(arg.key(), "broken");
        assert!(arg.value().is_string());
    }

    #[test]
    fn kv_macro_mixed_types() {
        let args = kv!("id" => 1, "name" => "x", "ok" => true);
        let keys: Vec<_> = args.iter().map(Arg::key).collect();

        assert_eq!(keys, vec!["id", "name", "ok"]);
        assert!(kv!().is_empty());
    }

    #[test]
    fn array_conversion() {
        let args = Args::from([("a", "1"), ("b", "2")]);
        assert_eq!(args.len(), 2);
    }
}
