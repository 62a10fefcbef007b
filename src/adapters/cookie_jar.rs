//! Cookie source backed by a `Cookie` header string.

use std::collections::HashMap;

use crate::traits::CookieSource;

/// Cookies parsed from a `name=value; name2=value2` string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: HashMap<String, String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `Cookie` header. Values are URL-decoded; malformed pairs are
    /// skipped and a later duplicate wins.
    pub fn parse(header: &str) -> Self {
        let cookies = header
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                let value = urlencoding::decode(value.trim())
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| value.trim().to_string());
                Some((name.to_string(), value))
            })
            .collect();
        Self { cookies }
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

impl CookieSource for CookieJar {
    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }
}
