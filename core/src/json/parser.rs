/*
 * parser.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Settee.
 *
 * Settee is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This file is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this file.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Push-model JSON parser: feed bytes via `receive()`, get events on a handler.
//!
//! # Buffer management contract
//!
//! The parser consumes only **complete** tokens from the buffer. Incomplete tokens
//! (a string whose closing `"` has not yet arrived, a partial number or literal)
//! are **left in the buffer**: the parser advances zero bytes and returns.
//!
//! The caller must keep unconsumed bytes at the front of the buffer and append
//! new data after them before the next `receive()`. `BytesMut` does this
//! naturally: `extend_from_slice` then `receive` again.
//!
//! At end of input call `close()` with the same buffer. A number still waiting
//! for its delimiter is delivered then; anything else left over means the input
//! was cut short.

use bytes::Buf;
use bytes::BytesMut;

use crate::json::error::JsonError;
use crate::json::handler::JsonContentHandler;
use crate::json::number::JsonNumber;

/// Enclosing structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Object,
    Array,
}

/// What we expect next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Value,
    Key,
    Colon,
    AfterValue,
}

/// Push-model JSON parser for a single document.
pub struct JsonParser {
    bom_checked: bool,
    closed: bool,
    context_stack: Vec<Context>,
    expect: Expect,
    after_comma: bool,
    seen_any_token: bool,
}

impl JsonParser {
    pub fn new() -> Self {
        Self {
            bom_checked: false,
            closed: false,
            context_stack: Vec::new(),
            expect: Expect::Value,
            after_comma: false,
            seen_any_token: false,
        }
    }

    /// True once one top-level value has been fully delivered to the handler.
    pub fn is_complete(&self) -> bool {
        self.seen_any_token && self.context_stack.is_empty() && self.expect == Expect::AfterValue
    }

    /// Nesting depth of the structure currently open.
    pub fn depth(&self) -> usize {
        self.context_stack.len()
    }

    /// Push bytes into the parser. Events are delivered to the handler as complete
    /// tokens are recognised; incomplete tokens stay in `buf`.
    ///
    /// Parsing stops at the end of the first top-level value. Whatever follows
    /// it is left in `buf` for the caller.
    pub fn receive<H: JsonContentHandler + ?Sized>(
        &mut self,
        buf: &mut BytesMut,
        handler: &mut H,
    ) -> Result<(), JsonError> {
        if self.closed {
            return Err(JsonError::new("cannot receive after close"));
        }
        if buf.is_empty() || !self.skip_bom(buf) {
            return Ok(());
        }
        while !buf.is_empty() && !self.is_complete() {
            match self.parse_one(buf, handler)? {
                Some(n) => buf.advance(n),
                None => return Ok(()),
            }
        }
        Ok(())
    }

    /// Signal end of input, flushing whatever token is still pending in `buf`.
    ///
    /// Running out of input inside a value is reported as a truncation error;
    /// a dangling `:` or `,` is a syntax error, because no continuation of the
    /// stream could have been valid without a value there.
    pub fn close<H: JsonContentHandler + ?Sized>(
        &mut self,
        buf: &mut BytesMut,
        handler: &mut H,
    ) -> Result<(), JsonError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if !buf.is_empty() && !self.skip_bom(buf) {
            return Err(JsonError::truncated("input ended inside byte order mark"));
        }
        while !buf.is_empty() {
            match self.parse_one(buf, handler)? {
                Some(n) => buf.advance(n),
                None => return Err(JsonError::truncated("input ended inside a token")),
            }
        }
        if !self.seen_any_token {
            return Err(JsonError::truncated("no data"));
        }
        if self.after_comma {
            return Err(JsonError::new("expected value after ','"));
        }
        if self.expect == Expect::Value && self.context_stack.last() == Some(&Context::Object) {
            return Err(JsonError::new("expected value after ':'"));
        }
        if !self.context_stack.is_empty() {
            return Err(JsonError::truncated("unclosed structure"));
        }
        Ok(())
    }

    /// Reset for parsing a new document.
    pub fn reset(&mut self) {
        self.bom_checked = false;
        self.closed = false;
        self.context_stack.clear();
        self.expect = Expect::Value;
        self.after_comma = false;
        self.seen_any_token = false;
    }

    /// Skip a UTF-8 BOM on the first bytes. Returns false if we must wait for more data.
    fn skip_bom(&mut self, buf: &mut BytesMut) -> bool {
        if self.bom_checked {
            return true;
        }
        if buf.len() >= 3 && buf[..3] == [0xef, 0xbb, 0xbf] {
            buf.advance(3);
        } else if buf[0] == 0xef && buf.len() < 3 {
            return false;
        }
        self.bom_checked = true;
        true
    }

    fn value_done(&mut self) {
        self.expect = Expect::AfterValue;
        self.after_comma = false;
        self.seen_any_token = true;
    }

    fn expect_value(&self, what: &str) -> Result<(), JsonError> {
        if self.expect != Expect::Value {
            return Err(JsonError::new(format!("unexpected {}", what)));
        }
        Ok(())
    }

    /// Parse one token from the front of `data`. Returns bytes consumed, or None if need more data.
    fn parse_one<H: JsonContentHandler + ?Sized>(
        &mut self,
        data: &[u8],
        handler: &mut H,
    ) -> Result<Option<usize>, JsonError> {
        let b = data[0];
        match b {
            b'{' => {
                self.expect_value("'{'")?;
                handler.start_object();
                self.context_stack.push(Context::Object);
                self.expect = Expect::Key;
                self.after_comma = false;
                self.seen_any_token = true;
                Ok(Some(1))
            }
            b'}' => {
                if self.context_stack.last() != Some(&Context::Object)
                    || (self.expect != Expect::Key && self.expect != Expect::AfterValue)
                {
                    return Err(JsonError::new("unexpected '}'"));
                }
                if self.after_comma {
                    return Err(JsonError::new("trailing comma before '}'"));
                }
                handler.end_object();
                self.context_stack.pop();
                self.value_done();
                Ok(Some(1))
            }
            b'[' => {
                self.expect_value("'['")?;
                handler.start_array();
                self.context_stack.push(Context::Array);
                self.expect = Expect::Value;
                self.after_comma = false;
                self.seen_any_token = true;
                Ok(Some(1))
            }
            b']' => {
                if self.context_stack.last() != Some(&Context::Array)
                    || (self.expect != Expect::Value && self.expect != Expect::AfterValue)
                {
                    return Err(JsonError::new("unexpected ']'"));
                }
                if self.after_comma {
                    return Err(JsonError::new("trailing comma before ']'"));
                }
                handler.end_array();
                self.context_stack.pop();
                self.value_done();
                Ok(Some(1))
            }
            b',' => {
                if self.expect != Expect::AfterValue {
                    return Err(JsonError::new("unexpected ','"));
                }
                self.expect = match self.context_stack.last() {
                    Some(Context::Object) => Expect::Key,
                    Some(Context::Array) => Expect::Value,
                    None => return Err(JsonError::new("unexpected comma at root")),
                };
                self.after_comma = true;
                Ok(Some(1))
            }
            b':' => {
                if self.expect != Expect::Colon {
                    return Err(JsonError::new("unexpected ':'"));
                }
                self.expect = Expect::Value;
                Ok(Some(1))
            }
            b' ' | b'\t' | b'\n' | b'\r' => Ok(Some(skip_whitespace(data))),
            b'"' => {
                if self.expect == Expect::Colon || self.expect == Expect::AfterValue {
                    return Err(JsonError::new("unexpected string"));
                }
                let is_key = self.expect == Expect::Key;
                let (consumed, s) = match parse_string(data, self.closed)? {
                    Some(parsed) => parsed,
                    None => return Ok(None),
                };
                if is_key {
                    handler.key(&s);
                    self.expect = Expect::Colon;
                    self.after_comma = false;
                    self.seen_any_token = true;
                } else {
                    handler.string_value(&s);
                    self.value_done();
                }
                Ok(Some(consumed))
            }
            b't' | b'f' | b'n' => {
                let (suffix, name): (&[u8], &str) = match b {
                    b't' => (b"rue", "'true'"),
                    b'f' => (b"alse", "'false'"),
                    _ => (b"ull", "'null'"),
                };
                self.expect_value(name)?;
                let n = match parse_literal(data, suffix, self.closed)? {
                    Some(n) => n,
                    None => return Ok(None),
                };
                match b {
                    b't' => handler.boolean_value(true),
                    b'f' => handler.boolean_value(false),
                    _ => handler.null_value(),
                }
                self.value_done();
                Ok(Some(n))
            }
            b'-' | b'0'..=b'9' => {
                self.expect_value("number")?;
                match parse_number(data, self.closed)? {
                    Some((n, num)) => {
                        handler.number_value(num);
                        self.value_done();
                        Ok(Some(n))
                    }
                    None => Ok(None),
                }
            }
            _ => Err(JsonError::new(format!("unexpected character: {}", b as char))),
        }
    }
}

impl Default for JsonParser {
    fn default() -> Self {
        Self::new()
    }
}

fn need_more<T>(closed: bool, what: &str) -> Result<Option<T>, JsonError> {
    if closed {
        Err(JsonError::truncated(what))
    } else {
        Ok(None)
    }
}

fn skip_whitespace(data: &[u8]) -> usize {
    data.iter()
        .take_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
        .count()
}

/// Parse a JSON string starting at data[0] (opening quote). Returns (consumed, unescaped string).
///
/// Raw bytes are collected and validated as UTF-8 once the closing quote is seen,
/// so multi-byte characters split across reads need no special handling.
fn parse_string(data: &[u8], closed: bool) -> Result<Option<(usize, String)>, JsonError> {
    let mut i = 1;
    let mut out = Vec::new();
    while i < data.len() {
        match data[i] {
            b'"' => {
                let s = String::from_utf8(out)
                    .map_err(|_| JsonError::new("invalid UTF-8 in string"))?;
                return Ok(Some((i + 1, s)));
            }
            b'\\' => match parse_escape(&data[i + 1..], closed)? {
                Some((adv, ch)) => {
                    let mut tmp = [0u8; 4];
                    out.extend_from_slice(ch.encode_utf8(&mut tmp).as_bytes());
                    i += 1 + adv;
                }
                None => return Ok(None),
            },
            c if c < 0x20 => {
                return Err(JsonError::new("unescaped control character in string"));
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
    }
    need_more(closed, "unclosed string")
}

/// Parse escape sequence after `\`. Returns (bytes consumed, char).
fn parse_escape(data: &[u8], closed: bool) -> Result<Option<(usize, char)>, JsonError> {
    let c = match data.first() {
        Some(&c) => c,
        None => return need_more(closed, "unclosed string"),
    };
    let ch = match c {
        b'"' => '"',
        b'\\' => '\\',
        b'/' => '/',
        b'b' => '\u{8}',
        b'f' => '\u{c}',
        b'n' => '\n',
        b'r' => '\r',
        b't' => '\t',
        b'u' => return parse_unicode_escape(data, closed),
        _ => return Err(JsonError::new(format!("invalid escape: \\{}", c as char))),
    };
    Ok(Some((1, ch)))
}

fn hex4(data: &[u8]) -> Result<u32, JsonError> {
    if !data.iter().all(u8::is_ascii_hexdigit) {
        return Err(JsonError::new("invalid \\u escape"));
    }
    let hex = std::str::from_utf8(data).map_err(|_| JsonError::new("invalid \\u escape"))?;
    u32::from_str_radix(hex, 16).map_err(|_| JsonError::new("invalid \\u hex"))
}

/// `\uXXXX`, combining a UTF-16 surrogate pair into one char. `data[0]` is the `u`.
fn parse_unicode_escape(data: &[u8], closed: bool) -> Result<Option<(usize, char)>, JsonError> {
    if data.len() < 5 {
        return need_more(closed, "incomplete \\u escape");
    }
    let hi = hex4(&data[1..5])?;
    if (0xd800..0xdc00).contains(&hi) {
        if data.len() < 11 {
            return need_more(closed, "incomplete surrogate pair");
        }
        if data[5] != b'\\' || data[6] != b'u' {
            return Err(JsonError::new("unpaired surrogate in \\u escape"));
        }
        let lo = hex4(&data[7..11])?;
        if !(0xdc00..0xe000).contains(&lo) {
            return Err(JsonError::new("unpaired surrogate in \\u escape"));
        }
        let code = 0x10000 + ((hi - 0xd800) << 10) + (lo - 0xdc00);
        let ch = char::from_u32(code).ok_or_else(|| JsonError::new("invalid Unicode code point"))?;
        return Ok(Some((11, ch)));
    }
    let ch = char::from_u32(hi).ok_or_else(|| JsonError::new("invalid Unicode code point"))?;
    Ok(Some((5, ch)))
}

/// Parse literal: first byte already matched (t/f/n), check suffix. Returns Some(consumed) when complete.
fn parse_literal(data: &[u8], suffix: &[u8], closed: bool) -> Result<Option<usize>, JsonError> {
    let end = data.len().min(1 + suffix.len());
    let available = &data[1..end];
    if !suffix.starts_with(available) {
        return Err(JsonError::new("invalid literal"));
    }
    if available.len() < suffix.len() {
        return need_more(closed, "incomplete literal");
    }
    Ok(Some(1 + suffix.len()))
}

/// Parse number. Returns Some((consumed, JsonNumber)) when complete.
///
/// A number is only complete once a delimiter follows it (or input is closed),
/// since `12` may still become `123` on the next read.
fn parse_number(data: &[u8], closed: bool) -> Result<Option<(usize, JsonNumber)>, JsonError> {
    let digits = |from: usize| data[from..].iter().take_while(|b| b.is_ascii_digit()).count();
    let mut i = 0;
    if data[i] == b'-' {
        i += 1;
        if i >= data.len() {
            return Ok(None);
        }
    }
    match data[i] {
        b'0' => {
            i += 1;
            if i < data.len() && data[i].is_ascii_digit() {
                return Err(JsonError::new("numbers cannot have leading zeros"));
            }
        }
        b'1'..=b'9' => i += digits(i),
        _ => return Err(JsonError::new("invalid number")),
    }
    let mut integral = true;
    if i < data.len() && data[i] == b'.' {
        integral = false;
        i += 1;
        if i >= data.len() {
            return Ok(None);
        }
        if !data[i].is_ascii_digit() {
            return Err(JsonError::new("decimal point must be followed by digit"));
        }
        i += digits(i);
    }
    if i < data.len() && (data[i] == b'e' || data[i] == b'E') {
        integral = false;
        i += 1;
        if i < data.len() && (data[i] == b'+' || data[i] == b'-') {
            i += 1;
        }
        if i >= data.len() {
            return Ok(None);
        }
        if !data[i].is_ascii_digit() {
            return Err(JsonError::new("exponent must have digit"));
        }
        i += digits(i);
    }
    if i < data.len() {
        if matches!(data[i], b'.' | b'e' | b'E' | b'0'..=b'9') {
            return Err(JsonError::new("invalid number"));
        }
    } else if !closed {
        return Ok(None);
    }
    let s = std::str::from_utf8(&data[..i]).map_err(|_| JsonError::new("invalid UTF-8 in number"))?;
    let num = if integral {
        if let Ok(n) = s.parse::<i64>() {
            JsonNumber::I64(n)
        } else if let Ok(n) = s.parse::<u64>() {
            JsonNumber::U64(n)
        } else {
            JsonNumber::F64(parse_finite(s)?)
        }
    } else {
        JsonNumber::F64(parse_finite(s)?)
    };
    Ok(Some((i, num)))
}

fn parse_finite(s: &str) -> Result<f64, JsonError> {
    let f: f64 = s.parse().map_err(|_| JsonError::new("invalid number"))?;
    if !f.is_finite() {
        return Err(JsonError::new(format!("number out of range: {}", s)));
    }
    Ok(f)
}
