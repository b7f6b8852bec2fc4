//! Query string and location types.

use std::fmt;

use url::form_urlencoded;

/// Ordered list of query parameters.
///
/// Keeps the first-seen position of each key so that rewriting a value does
/// not reshuffle the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a query string, with or without the leading `?`.
    ///
    /// Later duplicates of a key are dropped.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = Self::new();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if !params.has(&key) {
                params.pairs.push((key.into_owned(), value.into_owned()));
            }
        }
        params
    }

    /// Returns the decoded value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if the key is present.
    pub fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Sets a value, keeping the key's position if it already exists.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    /// Removes a key.
    pub fn delete(&mut self, key: &str) {
        self.pairs.retain(|(k, _)| k != key);
    }

    /// Iterates over `(key, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns `true` if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Renders the form-encoded query string without a leading `?`.
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.pairs {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_query_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.set(&key.into(), value);
        }
        params
    }
}

/// A path plus its query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub params: QueryParams,
}

impl Location {
    /// Creates a location with no query.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: QueryParams::new(),
        }
    }

    /// Parses `path?query`. A fragment, if any, is dropped.
    pub fn parse(href: &str) -> Self {
        let href = href.split('#').next().unwrap_or_default();
        match href.split_once('?') {
            Some((path, query)) => Self {
                path: path.to_string(),
                params: QueryParams::parse(query),
            },
            None => Self::new(href),
        }
    }

    /// Returns the same path with different parameters.
    pub fn with_params(&self, params: QueryParams) -> Self {
        Self {
            path: self.path.clone(),
            params,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            f.write_str(&self.path)
        } else {
            write!(f, "{}?{}", self.path, self.params)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_render() {
        let params = QueryParams::parse("?page=2&search=hello+world&sortBy=name");
        assert_eq!(params.get("page"), Some("2"));
        assert_eq!(params.get("search"), Some("hello world"));
        assert_eq!(params.to_query_string(), "page=2&search=hello+world&sortBy=name");
    }

    #[test]
    fn test_set_keeps_position() {
        let mut params = QueryParams::parse("page=1&pageSize=10");
        params.set("page", "3");
        params.set("sortBy", "name");
        assert_eq!(params.to_query_string(), "page=3&pageSize=10&sortBy=name");

        params.delete("pageSize");
        assert_eq!(params.to_query_string(), "page=3&sortBy=name");
    }

    #[test]
    fn test_duplicate_keys_keep_first() {
        let params = QueryParams::parse("a=1&a=2");
        assert_eq!(params.get("a"), Some("1"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_location_round_trip() {
        let location = Location::parse("/users?page=2&pageSize=20#top");
        assert_eq!(location.path, "/users");
        assert_eq!(location.params.get("pageSize"), Some("20"));
        assert_eq!(location.to_string(), "/users?page=2&pageSize=20");
        assert_eq!(Location::parse("/users").to_string(), "/users");
    }
}
