/*
 * request.rs
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


//! Request builder.
//!
//! A request is assembled from the context's defaults followed by an
//! endpoint's own steps, each a method on [`RequestBuilder`]. Headers and
//! query parameters merge in three tiers:
//!
//! - `add_*` appends, even when the key is already present;
//! - `default_*` inserts only keys that are not present yet;
//! - `set_*` drops every existing value for the key, then inserts.
//!
//! Header names compare case-insensitively; query keys compare exactly.
//! [`RequestBuilder::finish`] consumes the builder, so a finished [`Request`]
//! cannot be changed.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use serde::Serialize;

use crate::context::{Context, Credentials};
use crate::error::{CouchError, CouchResult};
use crate::protocol::http::{HttpRequest, Method};
use crate::types::{DbName, DocId, DocRev};
use crate::uri::{encode_doc_id, encode_path_segment, encode_query_component};

pub const APPLICATION_JSON: &str = "application/json";

/// A finished request: everything the transport needs to put it on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    host: String,
    port: u16,
    secure: bool,
    method: Method,
    path: String,
    query: Vec<(String, Option<String>)>,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl Request {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// Encoded path, always starting with `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Query parameters in insertion order, not encoded.
    pub fn query(&self) -> &[(String, Option<String>)] {
        &self.query
    }

    pub fn query_param(&self, key: &str) -> Option<Option<&str>> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_deref())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// First value of a header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// `k=v&flag&...`, encoded, without the leading `?`.
    pub fn query_string(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.query {
            if !out.is_empty() {
                out.push('&');
            }
            out.push_str(&encode_query_component(key));
            if let Some(v) = value {
                out.push('=');
                out.push_str(&encode_query_component(v));
            }
        }
        out
    }

    /// Origin-form request target: path plus `?query` when there is one.
    pub fn target(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string())
        }
    }

    /// View of this request for one exchange on an HTTP connection.
    pub fn as_http(&self) -> HttpRequest<'_> {
        HttpRequest {
            method: self.method,
            target: self.target(),
            headers: &self.headers,
            body: self.body.as_deref(),
        }
    }
}

/// A request under construction.
pub struct RequestBuilder<'a> {
    context: &'a Context,
    method: Method,
    headers: Vec<(String, String)>,
    query: Vec<(String, Option<String>)>,
    database: Option<String>,
    segments: Vec<String>,
    body: Option<Vec<u8>>,
}

impl<'a> RequestBuilder<'a> {
    /// Bare skeleton: GET, no headers, no path, no body. See [`apply_defaults`](Self::apply_defaults).
    pub fn new(context: &'a Context) -> Self {
        Self {
            context,
            method: Method::Get,
            headers: Vec::new(),
            query: Vec::new(),
            database: None,
            segments: Vec::new(),
            body: None,
        }
    }

    pub fn context(&self) -> &'a Context {
        self.context
    }

    /// Steps every request starts with: JSON `Accept`/`Content-Type`, Basic
    /// auth and session cookie from the context, and GET.
    pub fn apply_defaults(&mut self) -> &mut Self {
        let ctx = self.context;
        self.default_headers(&[("Accept", APPLICATION_JSON), ("Content-Type", APPLICATION_JSON)]);
        if let Credentials::Basic { username, password } = ctx.credentials() {
            let auth = format!("Basic {}", STANDARD.encode(format!("{}:{}", username, password)));
            self.set_headers(&[("Authorization", auth.as_str())]);
        }
        if let Some(cookie) = ctx.cookies().header_value(Utc::now()) {
            self.set_headers(&[("Cookie", cookie.as_str())]);
        }
        self.set_method(Method::Get)
    }

    pub fn add_headers(&mut self, headers: &[(&str, &str)]) -> &mut Self {
        for (name, value) in headers {
            self.headers.push((name.to_string(), value.to_string()));
        }
        self
    }

    pub fn default_headers(&mut self, headers: &[(&str, &str)]) -> &mut Self {
        for (name, value) in headers {
            if !self.has_header(name) {
                self.headers.push((name.to_string(), value.to_string()));
            }
        }
        self
    }

    pub fn set_headers(&mut self, headers: &[(&str, &str)]) -> &mut Self {
        for (name, _) in headers {
            self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        }
        self.add_headers(headers)
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    pub fn add_query_param(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        self.query.push((key.to_string(), value.map(str::to_string)));
        self
    }

    pub fn default_query_param(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if !self.query.iter().any(|(k, _)| k == key) {
            self.add_query_param(key, value);
        }
        self
    }

    pub fn set_query_param(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        self.query.retain(|(k, _)| k != key);
        self.add_query_param(key, value)
    }

    /// Append a path component verbatim (`_all_dbs`, `_design`, ...).
    pub fn add_path_segment(&mut self, segment: &str) -> &mut Self {
        self.segments.push(segment.to_string());
        self
    }

    pub fn select_document(&mut self, id: &DocId) -> &mut Self {
        self.segments.push(encode_doc_id(id.as_str()));
        self
    }

    /// Use the context's database as the path prefix.
    pub fn select_database(&mut self) -> CouchResult<&mut Self> {
        let db = self.context.database().ok_or(CouchError::NoDatabase)?;
        self.database = Some(encode_path_segment(db.as_str()));
        Ok(self)
    }

    /// Use `db` as the path prefix, whatever the context selects.
    pub fn select_named_database(&mut self, db: &DbName) -> &mut Self {
        self.database = Some(encode_path_segment(db.as_str()));
        self
    }

    /// Send the revision as `If-Match`.
    pub fn add_revision(&mut self, rev: &DocRev) -> &mut Self {
        let etag = rev.to_etag();
        self.set_headers(&[("If-Match", etag.as_str())])
    }

    pub fn maybe_add_revision(&mut self, rev: Option<&DocRev>) -> &mut Self {
        if let Some(rev) = rev {
            self.add_revision(rev);
        }
        self
    }

    pub fn set_json_body<T: Serialize + ?Sized>(&mut self, value: &T) -> CouchResult<&mut Self> {
        let body = serde_json::to_vec(value).map_err(|e| CouchError::Encode(e.to_string()))?;
        self.body = Some(body);
        Ok(self)
    }

    pub fn set_raw_body(&mut self, body: Vec<u8>) -> &mut Self {
        self.body = Some(body);
        self
    }

    pub fn set_method(&mut self, method: Method) -> &mut Self {
        self.method = method;
        self
    }

    /// Join prefix and segments into the path and freeze the request.
    pub fn finish(self) -> Request {
        let mut path = String::new();
        for part in self.database.iter().chain(self.segments.iter()) {
            if part.is_empty() {
                continue;
            }
            path.push('/');
            path.push_str(part);
        }
        if path.is_empty() {
            path.push('/');
        }
        Request {
            host: self.context.host().to_string(),
            port: self.context.port(),
            secure: self.context.is_secure(),
            method: self.method,
            path,
            query: self.query,
            headers: self.headers,
            body: self.body,
        }
    }
}

/// Build a request: defaults, then `script`, then finish.
pub fn build<F>(ctx: &Context, script: F) -> CouchResult<Request>
where
    F: FnOnce(&mut RequestBuilder<'_>) -> CouchResult<()>,
{
    let mut builder = RequestBuilder::new(ctx);
    builder.apply_defaults();
    script(&mut builder)?;
    Ok(builder.finish())
}
