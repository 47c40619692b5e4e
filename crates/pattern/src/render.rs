use std::borrow::{Borrow, Cow};
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

/// Outcome of looking a token up in a [`Tokens`] source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<'a> {
    /// The token has a value.
    Value(Cow<'a, str>),
    /// The token is known to the source but has no value (e.g. an artifact
    /// without a classifier).
    Absent,
    /// The source doesn't define this token. Its placeholder is left in the
    /// output for a later substitution pass.
    Unknown,
}
impl<'a> From<Option<&'a str>> for Lookup<'a> {
    fn from(value: Option<&'a str>) -> Self {
        match value {
            Some(value) => Lookup::Value(Cow::Borrowed(value)),
            None => Lookup::Absent,
        }
    }
}
impl<'a> From<&'a str> for Lookup<'a> {
    fn from(value: &'a str) -> Self {
        Lookup::Value(Cow::Borrowed(value))
    }
}

/// A source of token values for [`PathPattern::render`](crate::PathPattern::render).
pub trait Tokens {
    fn lookup(&self, token: &str) -> Lookup<'_>;
}

impl<T: Tokens + ?Sized> Tokens for &T {
    fn lookup(&self, token: &str) -> Lookup<'_> {
        (**self).lookup(token)
    }
}

// Maps are mostly a convenience for tests and ad-hoc rendering: a key mapped
// to `None` is absent, a missing key is unknown.
impl<K, V, S> Tokens for HashMap<K, Option<V>, S>
where
    K: Borrow<str> + Hash + Eq,
    V: AsRef<str>,
    S: BuildHasher,
{
    fn lookup(&self, token: &str) -> Lookup<'_> {
        match self.get(token) {
            Some(Some(value)) => Lookup::Value(Cow::Borrowed(value.as_ref())),
            Some(None) => Lookup::Absent,
            None => Lookup::Unknown,
        }
    }
}

impl<K, V> Tokens for BTreeMap<K, Option<V>>
where
    K: Borrow<str> + Ord,
    V: AsRef<str>,
{
    fn lookup(&self, token: &str) -> Lookup<'_> {
        match self.get(token) {
            Some(Some(value)) => Lookup::Value(Cow::Borrowed(value.as_ref())),
            Some(None) => Lookup::Absent,
            None => Lookup::Unknown,
        }
    }
}

/// Replaces every `[token]` placeholder in already-rendered text with
/// `value`.
///
/// This is the second rendering pass: values that only become known after
/// the first pass (such as a content hash) are spliced in as plain text.
///
/// ```
/// use depot_pattern::substitute_token;
///
/// let path = substitute_token("org/lib/1.0/jar/[sha1]/lib-1.0.jar", "sha1", "abc123");
/// assert_eq!(path, "org/lib/1.0/jar/abc123/lib-1.0.jar");
/// ```
pub fn substitute_token(rendered: &str, token: &str, value: &str) -> String {
    rendered.replace(&format!("[{token}]"), value)
}
