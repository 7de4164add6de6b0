//! Query and form parameters carried alongside a request.
//!
//! Parameters are a flat `name -> value` mapping. On the client side they are
//! written into the query string (bodiless methods) or as an
//! `application/x-www-form-urlencoded` body; on the server side they are read
//! back from both places.

use std::collections::BTreeMap;

use crate::protocol::{DecodeError, EncodeError};

/// A flat mapping of request parameter names to values.
///
/// Insertion order carries no meaning; a later insert with the same name
/// replaces the earlier value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    inner: BTreeMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an url-encoded string such as `a=1&b=two`.
    pub fn parse(encoded: &str) -> Result<Self, DecodeError> {
        let mut params = Self::new();
        params.extend_from_urlencoded(encoded)?;
        Ok(params)
    }

    /// Merges the pairs of an url-encoded string into this mapping.
    pub fn extend_from_urlencoded(&mut self, encoded: &str) -> Result<(), DecodeError> {
        let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(encoded).map_err(DecodeError::invalid_params)?;
        self.inner.extend(pairs);
        Ok(())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.inner.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Serializes the mapping as `application/x-www-form-urlencoded`.
    pub fn to_urlencoded(&self) -> Result<String, EncodeError> {
        serde_urlencoded::to_string(&self.inner).map_err(EncodeError::invalid_params)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { inner: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_lookup() {
        let params = Params::parse("Type=Log&Param1=ACCESS&Param2=20").unwrap();

        assert_eq!(params.len(), 3);
        assert_eq!(params.get("Type"), Some("Log"));
        assert_eq!(params.get("Param1"), Some("ACCESS"));
        assert_eq!(params.get("Param2"), Some("20"));
        assert_eq!(params.get("Param3"), None);
    }

    #[test]
    fn later_value_wins() {
        let params = Params::parse("a=1&b=2&a=3").unwrap();
        assert_eq!(params.get("a"), Some("3"));
    }

    #[test]
    fn encodes_reserved_characters() {
        let params: Params = [("name", "a b&c"), ("age", "32")].into_iter().collect();
        assert_eq!(params.to_urlencoded().unwrap(), "age=32&name=a+b%26c");
    }

    #[test]
    fn decodes_percent_escapes() {
        let params = Params::parse("name=%E6%B5%8B%E8%AF%95&x=a+b").unwrap();
        assert_eq!(params.get("name"), Some("测试"));
        assert_eq!(params.get("x"), Some("a b"));
    }
}
