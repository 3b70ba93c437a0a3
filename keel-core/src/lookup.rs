//! Process-wide lookup registry
//!
//! Values are stored under `/`-separated keys such as `provider/device/lihuiyu`.
//! Patterns passed to [`Lookup::find`], [`Glob`] and [`glob_matches`] may use `*` to
//! match any run of characters, including `/`.

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

/// Compile a `*` glob into an anchored regex
fn glob_regex(pattern: &str) -> Option<Regex> {
    let escaped = regex::escape(pattern).replace(r"\*", ".*");
    Regex::new(&format!("^{}$", escaped)).ok()
}

/// A `*` glob compiled once and matched many times
#[derive(Debug, Clone)]
pub struct Glob {
    pattern: String,
    /// `None` for literal patterns, which compare by equality
    regex: Option<Regex>,
}

impl Glob {
    pub fn new(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let regex = if pattern.contains('*') {
            glob_regex(&pattern)
        } else {
            None
        };
        Self { pattern, regex }
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    pub fn is_literal(&self) -> bool {
        !self.pattern.contains('*')
    }

    pub fn matches(&self, key: &str) -> bool {
        match &self.regex {
            Some(re) => re.is_match(key),
            None => self.is_literal() && self.pattern == key,
        }
    }
}

impl PartialEq for Glob {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for Glob {}

/// Check whether `key` matches a `*` glob pattern
pub fn glob_matches(pattern: &str, key: &str) -> bool {
    Glob::new(pattern).matches(key)
}

/// Key/value registry shared by the kernel and its plugins
#[derive(Debug, Default, Clone)]
pub struct Lookup {
    values: BTreeMap<String, Value>,
}

impl Lookup {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing any previous value under the same key
    pub fn register(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        tracing::trace!("📝 lookup register {} = {}", key, value);
        self.values.insert(key, value);
    }

    /// Retrieve a previously registered value
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Remove a key, returning its value
    pub fn unregister(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// All entries whose key matches `pattern`, in key order
    pub fn find(&self, pattern: &str) -> Vec<(&str, &Value)> {
        if !pattern.contains('*') {
            return self
                .values
                .get_key_value(pattern)
                .map(|(k, v)| (k.as_str(), v))
                .into_iter()
                .collect();
        }

        let glob = Glob::new(pattern);
        self.values
            .iter()
            .filter(|(k, _)| glob.matches(k))
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
