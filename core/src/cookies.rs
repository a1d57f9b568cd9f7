/*
 * cookies.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Settee, a client for CouchDB-style document databases.
 *
 * Settee is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Settee is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Settee.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Session cookie jar.
//!
//! The jar is a plain value: applying a response's `Set-Cookie` headers to a
//! copy of the request's jar and comparing the two (`==`) is how a renewed or
//! newly issued session is detected.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// One cookie as set by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub expires: Option<DateTime<Utc>>,
    pub secure: bool,
    pub http_only: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            expires: None,
            secure: false,
            http_only: false,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.map(|t| t <= now).unwrap_or(false)
    }

    /// Parse a `Set-Cookie` header value. `Max-Age` wins over `Expires`.
    pub fn parse_set_cookie(header: &str, now: DateTime<Utc>) -> Option<Self> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let mut cookie = Cookie::new(name, value.trim().trim_matches('"'));
        let mut max_age: Option<i64> = None;
        for attr in parts {
            let (key, val) = match attr.split_once('=') {
                Some((k, v)) => (k.trim(), v.trim()),
                None => (attr.trim(), ""),
            };
            match key.to_ascii_lowercase().as_str() {
                "domain" if !val.is_empty() => {
                    cookie.domain = Some(val.trim_start_matches('.').to_ascii_lowercase());
                }
                "path" if val.starts_with('/') => cookie.path = Some(val.to_string()),
                "max-age" => max_age = val.parse().ok(),
                "expires" => cookie.expires = parse_cookie_date(val),
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                _ => {}
            }
        }
        if let Some(secs) = max_age {
            cookie.expires = if secs <= 0 {
                Some(now)
            } else {
                Duration::try_seconds(secs)
                    .and_then(|d| now.checked_add_signed(d))
                    .or(Some(DateTime::<Utc>::MAX_UTC))
            };
        }
        Some(cookie)
    }

    fn key(&self) -> CookieKey {
        (
            self.name.clone(),
            self.domain.clone().unwrap_or_default(),
            self.path.clone().unwrap_or_else(|| "/".to_string()),
        )
    }
}

/// `Expires` dates: RFC 1123 (`Wed, 21 Oct 2015 07:28:00 GMT`) or the
/// older dashed form (`Wed, 21-Oct-2015 07:28:00 GMT`).
fn parse_cookie_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%a, %d-%b-%Y %H:%M:%S GMT")
        .ok()
        .map(|naive| naive.and_utc())
}

type CookieKey = (String, String, String);

/// Cookies keyed by (name, domain, path). Two jars are equal when they hold the same cookies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: BTreeMap<CookieKey, Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.values()
    }

    /// First cookie with this name, regardless of domain and path.
    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.cookies.values().find(|c| c.name == name)
    }

    pub fn insert(&mut self, cookie: Cookie) {
        self.cookies.insert(cookie.key(), cookie);
    }

    pub fn remove(&mut self, name: &str) {
        self.cookies.retain(|_, c| c.name != name);
    }

    /// Apply one `Set-Cookie` header. An already-expired cookie deletes its namesake.
    pub fn apply_set_cookie(&mut self, header: &str, now: DateTime<Utc>) {
        let Some(cookie) = Cookie::parse_set_cookie(header, now) else {
            tracing::warn!(header, "ignoring unparsable Set-Cookie");
            return;
        };
        if cookie.is_expired(now) {
            self.cookies.remove(&cookie.key());
        } else {
            self.insert(cookie);
        }
    }

    /// Value for a `Cookie` request header, or None if there is nothing live to send.
    pub fn header_value(&self, now: DateTime<Utc>) -> Option<String> {
        let pairs: Vec<String> = self
            .cookies
            .values()
            .filter(|c| !c.is_expired(now))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }
}

impl FromIterator<Cookie> for CookieJar {
    fn from_iter<I: IntoIterator<Item = Cookie>>(iter: I) -> Self {
        let mut jar = CookieJar::new();
        for cookie in iter {
            jar.insert(cookie);
        }
        jar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn parses_couch_auth_session() {
        let c = Cookie::parse_set_cookie(
            "AuthSession=YWRtaW46NjlBM0U; Version=1; Path=/; HttpOnly; Max-Age=600",
            now(),
        )
        .unwrap();
        assert_eq!(c.name, "AuthSession");
        assert_eq!(c.value, "YWRtaW46NjlBM0U");
        assert_eq!(c.path.as_deref(), Some("/"));
        assert!(c.http_only);
        assert_eq!(c.expires, Some(now() + Duration::seconds(600)));
    }

    #[test]
    fn expires_in_both_date_forms() {
        let a = Cookie::parse_set_cookie("a=1; Expires=Wed, 21 Oct 2026 07:28:00 GMT", now()).unwrap();
        let b = Cookie::parse_set_cookie("b=1; Expires=Wed, 21-Oct-2026 07:28:00 GMT", now()).unwrap();
        assert_eq!(a.expires, b.expires);
        assert!(a.expires.is_some());
    }

    #[test]
    fn same_cookie_twice_leaves_jar_equal() {
        let mut a = CookieJar::new();
        a.apply_set_cookie("AuthSession=x; Path=/", now());
        let mut b = a.clone();
        b.apply_set_cookie("AuthSession=x; Path=/", now());
        assert_eq!(a, b);
        b.apply_set_cookie("AuthSession=y; Path=/", now());
        assert_ne!(a, b);
        assert_eq!(b.len(), 1);
    }

    #[test]
    fn expired_cookie_deletes() {
        let mut jar = CookieJar::new();
        jar.apply_set_cookie("AuthSession=x; Path=/", now());
        jar.apply_set_cookie("AuthSession=; Path=/; Max-Age=0", now());
        assert!(jar.is_empty());
        assert_eq!(jar.header_value(now()), None);
    }

    #[test]
    fn header_joins_live_cookies() {
        let jar: CookieJar = vec![Cookie::new("a", "1"), Cookie::new("b", "2")].into_iter().collect();
        assert_eq!(jar.header_value(now()).as_deref(), Some("a=1; b=2"));
    }
}
