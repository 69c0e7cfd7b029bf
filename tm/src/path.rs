//! Field path parsing and resolution
//!
//! A field path locates a value inside a source object. Segments are
//! separated by `.`; a numeric segment indexes into an array. Bracket
//! segments are an alternative spelling: `jobs[0].label` and
//! `jobs.0.label` are the same path, and `meta["a.b"]` keeps the dot
//! inside a single key.

use std::borrow::Cow;
use std::convert::Infallible;
use std::str::FromStr;

use serde_json::Value;

/// A parsed path into a source object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    /// Parse a path string. Parsing never fails; an unterminated bracket is
    /// kept as literal text.
    pub fn parse(raw: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut after_bracket = false;
        let mut rest = raw;

        while let Some(c) = rest.chars().next() {
            rest = &rest[c.len_utf8()..];
            match c {
                '.' => {
                    if !(after_bracket && current.is_empty()) {
                        segments.push(std::mem::take(&mut current));
                    }
                    after_bracket = false;
                }
                '[' => match split_bracket(rest) {
                    Some((key, remainder)) => {
                        if !current.is_empty() {
                            segments.push(std::mem::take(&mut current));
                        }
                        segments.push(key);
                        rest = remainder;
                        after_bracket = true;
                    }
                    None => current.push('['),
                },
                _ => current.push(c),
            }
        }

        if !(after_bracket && current.is_empty()) {
            segments.push(current);
        }

        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    /// The path exactly as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed segments, in traversal order
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolve this path against a source value.
    ///
    /// Returns `None` when any step is missing: an absent key, an index out
    /// of range, or a scalar where a container was expected. If the source
    /// object has a key equal to the whole raw path, that key wins.
    ///
    /// Strings can be indexed by character (`name.0`), and strings and
    /// arrays answer `length`. Those steps produce new values, hence `Cow`.
    pub fn resolve<'a>(&self, source: &'a Value) -> Option<Cow<'a, Value>> {
        if let Value::Object(map) = source
            && let Some(value) = map.get(&self.raw)
        {
            return Some(Cow::Borrowed(value));
        }

        self.segments
            .iter()
            .try_fold(Cow::Borrowed(source), |current, segment| match current {
                Cow::Borrowed(value) => step(value, segment),
                Cow::Owned(value) => step(&value, segment).map(|next| Cow::Owned(next.into_owned())),
            })
    }
}

/// Move one segment down from `value`
fn step<'a>(value: &'a Value, segment: &str) -> Option<Cow<'a, Value>> {
    match value {
        Value::Object(map) => map.get(segment).map(Cow::Borrowed),
        Value::Array(items) if segment == "length" => Some(Cow::Owned(Value::from(items.len()))),
        Value::Array(items) => array_index(segment).and_then(|i| items.get(i)).map(Cow::Borrowed),
        Value::String(s) if segment == "length" => Some(Cow::Owned(Value::from(s.chars().count()))),
        Value::String(s) => array_index(segment)
            .and_then(|i| s.chars().nth(i))
            .map(|c| Cow::Owned(Value::String(c.to_string()))),
        _ => None,
    }
}

/// Split the contents of a bracket segment off `rest` (text after `[`)
fn split_bracket(rest: &str) -> Option<(String, &str)> {
    match rest.chars().next() {
        Some(quote @ ('"' | '\'')) => {
            let inner = &rest[1..];
            let end = inner.find(quote)?;
            let after = inner[end + 1..].strip_prefix(']')?;
            Some((inner[..end].to_string(), after))
        }
        _ => {
            let end = rest.find(']')?;
            Some((rest[..end].to_string(), &rest[end + 1..]))
        }
    }
}

/// Plain decimal digits only; `usize::from_str` would also accept `+1`
fn array_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for FieldPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for FieldPath {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl serde::Serialize for FieldPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> serde::Deserialize<'de> for FieldPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::parse(&s))
    }
}
