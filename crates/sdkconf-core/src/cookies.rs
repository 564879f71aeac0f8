//! Read-only access to the request's cookies.

use std::collections::HashMap;

use cookie::Cookie;

/// Source of raw (still encrypted) cookie values.
///
/// Lookups are read-only; implementations must be safe to share across the
/// threads of a parallel assembly.
pub trait CookieStore: Send + Sync {
    fn get(&self, name: &str) -> Option<&str>;
}

/// In-memory cookie jar, typically parsed from a `Cookie:` request header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: HashMap<String, String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `name=value; name2=value2` with the `cookie` crate. Values are
    /// percent-decoded and surrounding double quotes are removed. Pairs the
    /// parser rejects (no `=`, empty name, bad encoding) are skipped.
    /// The first occurrence of a name wins, as browsers send the most
    /// specific cookie first.
    pub fn from_header(header: &str) -> Self {
        let mut jar = Self::new();
        for cookie in Cookie::split_parse_encoded(header).flatten() {
            jar.cookies
                .entry(cookie.name().to_string())
                .or_insert_with(|| cookie.value_trimmed().to_string());
        }
        jar
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

impl CookieStore for CookieJar {
    fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }
}

impl CookieStore for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<&str> {
        HashMap::get(self, name).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CookieJar {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut jar = Self::new();
        for (k, v) in iter {
            jar.insert(k, v);
        }
        jar
    }
}
