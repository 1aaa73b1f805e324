//! Query-string arguments of the current request.

use std::collections::HashMap;
use url::form_urlencoded;

/// Decoded query-string parameters
///
/// Repeated keys keep their first value, as web frameworks usually do for
/// single-valued lookups.
///
/// ```rust
/// use hatchling::RequestArgs;
///
/// let args = RequestArgs::from_target("/posts?page=2&q=hello%20world&page=9");
/// assert_eq!(args.get("page"), Some("2"));
/// assert_eq!(args.get("q"), Some("hello world"));
/// assert_eq!(args.get("per_page"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestArgs {
    values: HashMap<String, String>,
}

impl RequestArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string (without the leading `?`)
    pub fn parse(query: &str) -> Self {
        let mut values = HashMap::new();
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            values.entry(key.into_owned()).or_insert_with(|| value.into_owned());
        }
        Self { values }
    }

    /// Parse the query part of a request target such as `/posts?page=2`
    pub fn from_target(target: &str) -> Self {
        match target.split_once('?') {
            Some((_, query)) => Self::parse(query),
            None => Self::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decodes_plus_and_percent() {
        let args = RequestArgs::parse("?name=a+b&tag=%E2%9C%93");
        assert_eq!(args.get("name"), Some("a b"));
        assert_eq!(args.get("tag"), Some("✓"));
    }

    #[test]
    fn test_from_target_without_query() {
        assert!(RequestArgs::from_target("/posts").is_empty());
        assert!(RequestArgs::from_target("/posts?").is_empty());
    }

    #[test]
    fn test_with_overrides() {
        let args = RequestArgs::parse("page=1").with("page", "3");
        assert_eq!(args.get("page"), Some("3"));
        assert_eq!(args.len(), 1);
    }
}
