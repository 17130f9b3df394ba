//! Tolerant access to JSON response bodies.
//!
//! The service's payloads differ by endpoint and by engine, so nothing here
//! assumes a schema. A body is decoded once into a [`serde_json::Value`]
//! tree and fields are read with dotted paths such as
//! `scan_results.progress_percentage`. A missing path is `None`; only a body
//! that is not JSON at all is an error.

use crate::core::error::{Phase, ScanError};

use serde_json::Value;

/// A decoded JSON response body.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    root: Value,
}

impl Payload {
    /// Decodes raw response bytes.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::Decode` tagged with `phase` if the bytes are not
    /// valid JSON.
    pub fn decode(bytes: &[u8], phase: Phase) -> Result<Self, ScanError> {
        serde_json::from_slice(bytes)
            .map(Self::from_value)
            .map_err(|e| ScanError::decode(phase, e.to_string()))
    }

    /// Wraps an already decoded value.
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Returns the root value.
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Consumes the payload and returns the root value.
    pub fn into_value(self) -> Value {
        self.root
    }

    /// Looks up a dot-separated path through nested objects.
    ///
    /// The empty path returns the root. Descending into anything that is not
    /// an object yields `None`.
    ///
    /// ```rust
    /// use metascan::core::Payload;
    ///
    /// let payload = Payload::from_value(serde_json::json!({"a": {"b": 42}}));
    /// assert_eq!(payload.lookup("a.b"), Some(&serde_json::json!(42)));
    /// assert_eq!(payload.lookup("a.c"), None);
    /// ```
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(&self.root);
        }
        path.split('.')
            .try_fold(&self.root, |node, key| node.as_object()?.get(key))
    }

    /// Returns the keys of the object at `path`, in document order.
    ///
    /// Empty when the path is absent or does not name an object.
    pub fn keys(&self, path: &str) -> Vec<&str> {
        self.entries(path).map(|(key, _)| key).collect()
    }

    /// Iterates the `(key, value)` pairs of the object at `path`.
    pub fn entries<'a>(&'a self, path: &str) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        self.lookup(path)
            .and_then(Value::as_object)
            .into_iter()
            .flat_map(|map| map.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Returns the string at `path`, if present and a string.
    pub fn str_at(&self, path: &str) -> Option<&str> {
        self.lookup(path).and_then(Value::as_str)
    }

    /// Returns the number at `path` as `f64`, if present and numeric.
    pub fn f64_at(&self, path: &str) -> Option<f64> {
        self.lookup(path).and_then(Value::as_f64)
    }

    /// Returns the number at `path` as `i64`, if present and integral.
    pub fn i64_at(&self, path: &str) -> Option<i64> {
        self.lookup(path).and_then(Value::as_i64)
    }

    /// Returns the number at `path` as `u64`, if present and a non-negative integer.
    pub fn u64_at(&self, path: &str) -> Option<u64> {
        self.lookup(path).and_then(Value::as_u64)
    }

    /// Extracts a human-readable error message from a rejection body.
    ///
    /// The service has reported errors as `{"error": {"messages": [..]}}`,
    /// `{"error": {"message": ..}}`, `{"error": ".."}` and
    /// `{"message": ".."}`; the first match wins.
    pub fn message(&self) -> Option<String> {
        if let Some(first) = self
            .lookup("error.messages")
            .and_then(Value::as_array)
            .and_then(|messages| messages.first())
            .and_then(Value::as_str)
        {
            return Some(first.to_string());
        }

        self.str_at("error.message")
            .or_else(|| self.str_at("error"))
            .or_else(|| self.str_at("message"))
            .map(str::to_string)
    }
}

impl From<Value> for Payload {
    fn from(root: Value) -> Self {
        Self::from_value(root)
    }
}

/// Reads a field of a JSON object as a display string.
///
/// Strings are returned verbatim, other scalars in their JSON form, and
/// `null` or a missing key as the empty string.
pub(crate) fn field_text(object: &Value, key: &str) -> String {
    match object.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
