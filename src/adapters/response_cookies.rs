//! Cookie source fed by the cookies the server sets.
//!
//! The backend issues the cross-site-protection token with `Set-Cookie` when
//! the user signs in. [`ReqwestHttpClient::with_cookie_store`] stores those
//! cookies in a shared [`Jar`] and [`ResponseCookies`] reads them back, the
//! way a browser exposes readable cookies to page scripts.
//!
//! [`ReqwestHttpClient::with_cookie_store`]: crate::adapters::ReqwestHttpClient::with_cookie_store

use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::Url;

use crate::adapters::CookieJar;
use crate::traits::CookieSource;

/// Cookies visible at `url` in a jar shared with the HTTP client.
#[derive(Debug, Clone)]
pub struct ResponseCookies {
    jar: Arc<Jar>,
    url: Url,
}

impl ResponseCookies {
    pub fn new(jar: Arc<Jar>, url: Url) -> Self {
        Self { jar, url }
    }

    /// Seed the jar from a `Cookie` header string, as if the server had set
    /// each pair for `url`.
    pub fn seed(&self, header: &str) {
        header
            .split(';')
            .map(str::trim)
            .filter(|pair| pair.contains('='))
            .for_each(|pair| self.jar.add_cookie_str(pair, &self.url));
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl CookieSource for ResponseCookies {
    fn cookie(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.url)?;
        let header = header.to_str().ok()?;
        CookieJar::parse(header).cookie(name)
    }
}
