/*
 * response.rs
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


//! Interpreting a parsed response.
//!
//! A response parser is any `FnOnce(&ResponseParts) -> CouchResult<T>`. The
//! helpers here compose with `?`; [`standard_parse`] is the one most
//! endpoints use.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{CouchError, CouchResult};
use crate::types::DocRev;

/// Status codes treated as success.
const SUCCESS: [u16; 4] = [200, 201, 202, 304];

/// Status, headers and body value of one response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseParts {
    status: u16,
    headers: Vec<(String, String)>,
    value: Value,
}

impl ResponseParts {
    pub fn new(status: u16, headers: Vec<(String, String)>, value: Value) -> Self {
        Self {
            status,
            headers,
            value,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// First value of a header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Map a non-success status onto the error taxonomy.
    pub fn check_status_code(&self) -> CouchResult<()> {
        if SUCCESS.contains(&self.status) {
            return Ok(());
        }
        let reason = self.error_reason();
        Err(match self.status {
            400 => CouchError::InvalidName(reason),
            401 => CouchError::Unauthorized,
            403 => CouchError::Forbidden(reason),
            404 => CouchError::NotFound,
            409 => CouchError::Conflict,
            412 => CouchError::AlreadyExists,
            status => CouchError::Server {
                status,
                message: reason,
            },
        })
    }

    /// `reason` from an error body, else `error`, else empty.
    fn error_reason(&self) -> String {
        ["reason", "error"]
            .iter()
            .find_map(|k| self.value.get(k).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string()
    }

    pub fn require_status(&self, expected: u16) -> CouchResult<()> {
        if self.status == expected {
            Ok(())
        } else {
            Err(CouchError::Unexpected {
                expected,
                actual: self.status,
            })
        }
    }

    /// Field `key` of the body object, decoded as `T`.
    pub fn get_key<T: DeserializeOwned>(&self, key: &str) -> CouchResult<T> {
        let field = self
            .value
            .get(key)
            .ok_or_else(|| CouchError::parse_fail(format!("missing key {:?}", key)))?;
        T::deserialize(field).map_err(|e| CouchError::parse_fail(format!("key {:?}: {}", key, e)))
    }

    /// Like [`get_key`](Self::get_key), but a missing or null field is `None`.
    pub fn get_key_opt<T: DeserializeOwned>(&self, key: &str) -> CouchResult<Option<T>> {
        match self.value.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.get_key(key).map(Some),
        }
    }

    /// Require field `key` to equal `expected`.
    pub fn expect_key(&self, key: &str, expected: &Value) -> CouchResult<()> {
        match self.value.get(key) {
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => Err(CouchError::parse_fail(format!(
                "key {:?}: expected {}, got {}",
                key, expected, actual
            ))),
            None => Err(CouchError::parse_fail(format!("missing key {:?}", key))),
        }
    }

    /// Revision from the `ETag` header.
    pub fn etag(&self) -> CouchResult<DocRev> {
        self.header("etag")
            .map(DocRev::from_etag)
            .ok_or_else(|| CouchError::parse_fail("missing ETag header"))
    }

    /// The whole body decoded as `T`.
    pub fn to_output<T: DeserializeOwned>(&self) -> CouchResult<T> {
        Ok(T::deserialize(&self.value)?)
    }
}

/// Check the status, then decode the whole body.
pub fn standard_parse<T: DeserializeOwned>(parts: &ResponseParts) -> CouchResult<T> {
    parts.check_status_code()?;
    parts.to_output()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn parts(status: u16, value: Value) -> ResponseParts {
        ResponseParts::new(status, vec![("ETag".into(), "\"3-ccc\"".into())], value)
    }

    #[test]
    fn success_codes_pass() {
        for status in [200, 201, 202, 304] {
            assert!(parts(status, Value::Null).check_status_code().is_ok());
        }
    }

    #[test]
    fn error_codes_map_to_taxonomy() {
        let body = json!({"error": "conflict", "reason": "Document update conflict."});
        assert!(matches!(parts(409, body).check_status_code(), Err(CouchError::Conflict)));
        assert!(matches!(parts(404, json!({})).check_status_code(), Err(CouchError::NotFound)));
        assert!(matches!(parts(401, json!({})).check_status_code(), Err(CouchError::Unauthorized)));
        assert!(matches!(parts(412, json!({})).check_status_code(), Err(CouchError::AlreadyExists)));
        match parts(403, json!({"error": "forbidden", "reason": "admins only"})).check_status_code() {
            Err(CouchError::Forbidden(reason)) => assert_eq!(reason, "admins only"),
            other => panic!("unexpected {:?}", other),
        }
        match parts(400, json!({"error": "illegal_database_name"})).check_status_code() {
            Err(CouchError::InvalidName(reason)) => assert_eq!(reason, "illegal_database_name"),
            other => panic!("unexpected {:?}", other),
        }
        match parts(500, json!("boom")).check_status_code() {
            Err(CouchError::Server { status: 500, message }) => assert!(message.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
        // 204 is not in the success list.
        assert!(matches!(
            parts(204, Value::Null).check_status_code(),
            Err(CouchError::Server { status: 204, .. })
        ));
    }

    #[test]
    fn key_helpers() {
        let p = parts(201, json!({"ok": true, "id": "a", "rev": "1-x", "n": null}));
        assert_eq!(p.get_key::<String>("id").unwrap(), "a");
        assert_eq!(p.get_key::<DocRev>("rev").unwrap(), DocRev::new("1-x"));
        assert!(matches!(p.get_key::<u32>("id"), Err(CouchError::ParseFail(_))));
        assert!(matches!(p.get_key::<String>("missing"), Err(CouchError::ParseFail(_))));
        assert_eq!(p.get_key_opt::<String>("n").unwrap(), None);
        assert_eq!(p.get_key_opt::<String>("id").unwrap().as_deref(), Some("a"));
        assert!(p.expect_key("ok", &json!(true)).is_ok());
        assert!(p.expect_key("ok", &json!(false)).is_err());
        assert!(p.require_status(201).is_ok());
        assert!(matches!(
            p.require_status(200),
            Err(CouchError::Unexpected { expected: 200, actual: 201 })
        ));
        assert_eq!(p.etag().unwrap(), DocRev::new("3-ccc"));
    }

    #[test]
    fn standard_parse_checks_then_decodes() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Doc {
            title: String,
        }
        let ok = parts(200, json!({"_id": "a", "title": "hi"}));
        assert_eq!(standard_parse::<Doc>(&ok).unwrap(), Doc { title: "hi".into() });
        let missing = parts(404, json!({"error": "not_found", "reason": "missing"}));
        assert!(matches!(standard_parse::<Doc>(&missing), Err(CouchError::NotFound)));
        let wrong = parts(200, json!([1, 2]));
        assert!(matches!(standard_parse::<Doc>(&wrong), Err(CouchError::ParseFail(_))));
    }
}
