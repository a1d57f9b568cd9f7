/*
 * body.rs
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


//! Response collection: status and headers as they arrive, body pushed through
//! the incremental JSON parser chunk by chunk.

use bytes::BytesMut;
use serde_json::Value;

use crate::json::{JsonError, JsonParser, ValueBuilder};
use crate::protocol::http::{Response, ResponseHandler};

/// How a response body ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// One full JSON value was read.
    Complete(Value),
    /// The body ended before a value was finished, or carried no value at all.
    Incomplete,
    /// The body is not JSON.
    Malformed(String),
}

impl ParseOutcome {
    fn from_error(e: JsonError) -> Self {
        if e.is_truncated() {
            ParseOutcome::Incomplete
        } else {
            ParseOutcome::Malformed(e.message().to_string())
        }
    }
}

/// `ResponseHandler` that records status and headers and parses the body as JSON.
///
/// Once a complete top-level value has been read, later bytes are drained
/// without parsing.
pub struct BodyCollector {
    skip_body: bool,
    status: u16,
    headers: Vec<(String, String)>,
    parser: JsonParser,
    builder: ValueBuilder,
    buf: BytesMut,
    error: Option<JsonError>,
    done: bool,
}

impl BodyCollector {
    pub fn new() -> Self {
        Self {
            skip_body: false,
            status: 0,
            headers: Vec::new(),
            parser: JsonParser::new(),
            builder: ValueBuilder::new(),
            buf: BytesMut::new(),
            error: None,
            done: false,
        }
    }

    /// Collector that never looks at the body; the outcome is `Complete(Null)`.
    pub fn headers_only() -> Self {
        Self {
            skip_body: true,
            ..Self::new()
        }
    }

    /// Flush the parser and classify the body.
    pub fn finish(mut self) -> (u16, Vec<(String, String)>, ParseOutcome) {
        let outcome = self.outcome();
        (self.status, self.headers, outcome)
    }

    fn outcome(&mut self) -> ParseOutcome {
        if self.skip_body {
            return ParseOutcome::Complete(Value::Null);
        }
        if let Some(e) = self.error.take() {
            return ParseOutcome::from_error(e);
        }
        if !self.done {
            if let Err(e) = self.parser.close(&mut self.buf, &mut self.builder) {
                return ParseOutcome::from_error(e);
            }
        }
        match self.builder.take() {
            Some(value) => ParseOutcome::Complete(value),
            None => ParseOutcome::Incomplete,
        }
    }
}

impl Default for BodyCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseHandler for BodyCollector {
    fn status(&mut self, response: &Response) {
        self.status = response.code;
    }

    fn header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn body_chunk(&mut self, data: &[u8]) {
        if self.skip_body || self.done || self.error.is_some() {
            return;
        }
        self.buf.extend_from_slice(data);
        match self.parser.receive(&mut self.buf, &mut self.builder) {
            Ok(()) if self.parser.is_complete() => {
                self.done = true;
                self.buf.clear();
            }
            Ok(()) => {}
            Err(e) => {
                tracing::warn!(error = %e, "malformed JSON in response body");
                self.error = Some(e);
            }
        }
    }
}

/// Classify a body delivered in the given chunks.
pub fn parse_chunks<'a, I>(chunks: I) -> ParseOutcome
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut collector = BodyCollector::new();
    for chunk in chunks {
        collector.body_chunk(chunk);
    }
    collector.finish().2
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: &str) -> ParseOutcome {
        parse_chunks([body.as_bytes()])
    }

    #[test]
    fn complete_body_in_pieces() {
        let body = br#"{"ok":true,"id":"doc","rev":"1-abc"}"#;
        let outcome = parse_chunks(body.chunks(3));
        assert_eq!(
            outcome,
            ParseOutcome::Complete(json!({"ok": true, "id": "doc", "rev": "1-abc"}))
        );
    }

    #[test]
    fn truncated_mid_object_is_incomplete() {
        assert_eq!(parse(r#"{"a":1,"b":[1,2"#), ParseOutcome::Incomplete);
        assert_eq!(parse(r#"{"a":"unterminated"#), ParseOutcome::Incomplete);
        assert_eq!(parse(""), ParseOutcome::Incomplete);
    }

    #[test]
    fn dangling_separator_is_malformed() {
        assert!(matches!(parse(r#"{"a":"#), ParseOutcome::Malformed(_)));
        assert!(matches!(parse("[1,"), ParseOutcome::Malformed(_)));
    }

    #[test]
    fn garbage_is_malformed() {
        assert!(matches!(parse("<html>"), ParseOutcome::Malformed(_)));
        assert!(matches!(parse(r#"{"a" 1}"#), ParseOutcome::Malformed(_)));
        assert!(matches!(parse(r#"{"n":1e400}"#), ParseOutcome::Malformed(_)));
    }

    #[test]
    fn bytes_after_the_value_are_drained() {
        let outcome = parse_chunks([&b"{\"a\":1}"[..], &b"\nnot json"[..]]);
        assert_eq!(outcome, ParseOutcome::Complete(json!({"a": 1})));
    }

    #[test]
    fn bytes_after_the_value_in_the_same_chunk_are_drained() {
        assert_eq!(parse("{\"a\":1}\nnot json"), ParseOutcome::Complete(json!({"a": 1})));
        assert_eq!(parse("{\"a\":1}{\"b\":2}"), ParseOutcome::Complete(json!({"a": 1})));
        assert_eq!(parse("[1] x"), ParseOutcome::Complete(json!([1])));
    }

    #[test]
    fn top_level_scalar_completes_at_end() {
        assert_eq!(parse("42"), ParseOutcome::Complete(json!(42)));
        assert_eq!(parse("\"x\""), ParseOutcome::Complete(json!("x")));
    }

    #[test]
    fn headers_only_ignores_body() {
        let mut collector = BodyCollector::headers_only();
        collector.status(&Response::new(200));
        collector.header("ETag", "\"1-abc\"");
        collector.body_chunk(b"not json at all");
        let (status, headers, outcome) = collector.finish();
        assert_eq!(status, 200);
        assert_eq!(headers.len(), 1);
        assert_eq!(outcome, ParseOutcome::Complete(Value::Null));
    }
}
