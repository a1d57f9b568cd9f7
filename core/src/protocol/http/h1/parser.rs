/*
 * parser.rs
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

//! HTTP/1.1 response push parser: status line, headers, body (Content-Length, chunked, or until close).

use bytes::Buf;
use bytes::BytesMut;
use std::io;

/// Callback for HTTP/1.1 response events. The connection implements this and forwards to `ResponseHandler`.
pub trait H1ResponseHandler {
    fn status(&mut self, code: u16, reason: Option<&str>);
    fn header(&mut self, name: &str, value: &str);
    fn body_chunk(&mut self, data: &[u8]);
    fn end_body(&mut self);
    fn trailer(&mut self, name: &str, value: &str);
    fn complete(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    Idle,
    StatusLine,
    Headers,
    /// Headers done; the connection must call `set_body_mode()`.
    HeadersComplete,
    Body,
    UntilClose,
    ChunkSize,
    ChunkData,
    ChunkDataEnd,
    ChunkTrailer,
}

/// How the body of the current response is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// HEAD responses, 204, 304: headers only, whatever Content-Length says.
    None,
    Length(u64),
    Chunked,
    /// No framing headers: the body runs until the server closes the connection.
    UntilClose,
}

fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

/// Push parser for one HTTP/1.1 response at a time. Feed bytes via `receive`.
pub struct ResponseParser {
    state: ParseState,
    remaining: u64,
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::StatusLine,
            remaining: 0,
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = ParseState::StatusLine;
        self.remaining = 0;
    }

    /// Split one CRLF-terminated line off the front of `buf`, without the CRLF.
    fn take_line(buf: &mut BytesMut) -> Result<Option<String>, io::Error> {
        let end = match buf.windows(2).position(|w| w == b"\r\n") {
            Some(n) => n,
            None => return Ok(None),
        };
        let line = buf.split_to(end + 2);
        let text = std::str::from_utf8(&line[..end]).map_err(|_| invalid("invalid UTF-8 in response head"))?;
        Ok(Some(text.to_string()))
    }

    fn split_header(line: &str) -> Option<(&str, &str)> {
        let colon = line.find(':')?;
        Some((line[..colon].trim(), line[colon + 1..].trim()))
    }

    /// Consume and parse as much as possible from buf. Partial lines stay in buf.
    ///
    /// Returns when more data is needed, at `HeadersComplete`, or when the
    /// response is done (`Idle`); bytes of a following response are left alone.
    pub fn receive<H: H1ResponseHandler + ?Sized>(
        &mut self,
        buf: &mut BytesMut,
        handler: &mut H,
    ) -> Result<(), io::Error> {
        while !buf.is_empty() {
            match self.state {
                ParseState::StatusLine => {
                    let Some(line) = Self::take_line(buf)? else {
                        return Ok(());
                    };
                    // HTTP/1.1 200 OK, or HTTP/1.1 200
                    let mut parts = line.splitn(3, ' ');
                    let version = parts.next().unwrap_or("");
                    if !version.starts_with("HTTP/") {
                        return Err(invalid("malformed status line"));
                    }
                    let code = parts
                        .next()
                        .and_then(|s| s.parse::<u16>().ok())
                        .ok_or_else(|| invalid("malformed status code"))?;
                    handler.status(code, parts.next());
                    self.state = ParseState::Headers;
                }
                ParseState::Headers => {
                    let Some(line) = Self::take_line(buf)? else {
                        return Ok(());
                    };
                    if line.is_empty() {
                        self.state = ParseState::HeadersComplete;
                        return Ok(());
                    }
                    if let Some((name, value)) = Self::split_header(&line) {
                        handler.header(name, value);
                    }
                }
                ParseState::HeadersComplete | ParseState::Idle => return Ok(()),
                ParseState::Body => {
                    let to_read = self.remaining.min(buf.len() as u64) as usize;
                    let chunk = buf.split_to(to_read);
                    handler.body_chunk(&chunk);
                    self.remaining -= to_read as u64;
                    if self.remaining == 0 {
                        self.finish(handler);
                    }
                }
                ParseState::UntilClose => {
                    let chunk = buf.split();
                    handler.body_chunk(&chunk);
                }
                ParseState::ChunkSize => {
                    let Some(line) = Self::take_line(buf)? else {
                        return Ok(());
                    };
                    let hex = line.split(';').next().unwrap_or("").trim();
                    self.remaining = u64::from_str_radix(hex, 16).map_err(|_| invalid("invalid chunk size"))?;
                    self.state = if self.remaining == 0 {
                        ParseState::ChunkTrailer
                    } else {
                        ParseState::ChunkData
                    };
                }
                ParseState::ChunkData => {
                    let to_read = self.remaining.min(buf.len() as u64) as usize;
                    let chunk = buf.split_to(to_read);
                    handler.body_chunk(&chunk);
                    self.remaining -= to_read as u64;
                    if self.remaining == 0 {
                        self.state = ParseState::ChunkDataEnd;
                    }
                }
                ParseState::ChunkDataEnd => {
                    if buf.len() < 2 {
                        return Ok(());
                    }
                    if &buf[..2] != b"\r\n" {
                        return Err(invalid("missing CRLF after chunk data"));
                    }
                    buf.advance(2);
                    self.state = ParseState::ChunkSize;
                }
                ParseState::ChunkTrailer => {
                    let Some(line) = Self::take_line(buf)? else {
                        return Ok(());
                    };
                    if line.is_empty() {
                        self.finish(handler);
                    } else if let Some((name, value)) = Self::split_header(&line) {
                        handler.trailer(name, value);
                    }
                }
            }
        }
        Ok(())
    }

    fn finish<H: H1ResponseHandler + ?Sized>(&mut self, handler: &mut H) {
        handler.end_body();
        handler.complete();
        self.state = ParseState::Idle;
    }

    /// Called by the connection once headers are in (state `HeadersComplete`).
    /// Returns true if a body follows.
    pub fn set_body_mode(&mut self, mode: BodyMode) -> bool {
        if self.state != ParseState::HeadersComplete {
            return false;
        }
        self.remaining = 0;
        self.state = match mode {
            BodyMode::None | BodyMode::Length(0) => ParseState::Idle,
            BodyMode::Length(n) => {
                self.remaining = n;
                ParseState::Body
            }
            BodyMode::Chunked => ParseState::ChunkSize,
            BodyMode::UntilClose => ParseState::UntilClose,
        };
        self.state != ParseState::Idle
    }

    /// The peer closed the connection. Legitimate only while reading an unframed body.
    pub fn finish_at_eof<H: H1ResponseHandler + ?Sized>(&mut self, handler: &mut H) -> Result<(), io::Error> {
        match self.state {
            ParseState::UntilClose => {
                self.finish(handler);
                Ok(())
            }
            ParseState::Idle => Ok(()),
            _ => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "HTTP connection closed mid-response",
            )),
        }
    }
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        status: Option<u16>,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
        complete: bool,
    }

    impl H1ResponseHandler for Recorder {
        fn status(&mut self, code: u16, _reason: Option<&str>) {
            self.status = Some(code);
        }
        fn header(&mut self, name: &str, value: &str) {
            self.headers.push((name.to_string(), value.to_string()));
        }
        fn body_chunk(&mut self, data: &[u8]) {
            self.body.extend_from_slice(data);
        }
        fn end_body(&mut self) {}
        fn trailer(&mut self, name: &str, value: &str) {
            self.header(name, value);
        }
        fn complete(&mut self) {
            self.complete = true;
        }
    }

    #[test]
    fn chunked_body_split_at_every_byte() {
        let wire = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\n{\"a\"\r\n3\r\n:1}\r\n0\r\n\r\n";
        let mut parser = ResponseParser::new();
        let mut rec = Recorder::default();
        let mut buf = BytesMut::new();
        for b in wire.iter() {
            buf.extend_from_slice(&[*b]);
            parser.receive(&mut buf, &mut rec).unwrap();
            if parser.state() == ParseState::HeadersComplete {
                assert!(parser.set_body_mode(BodyMode::Chunked));
                parser.receive(&mut buf, &mut rec).unwrap();
            }
        }
        assert_eq!(rec.status, Some(200));
        assert_eq!(rec.body, b"{\"a\":1}");
        assert!(rec.complete);
        assert_eq!(parser.state(), ParseState::Idle);
    }

    #[test]
    fn head_response_ignores_content_length() {
        let mut buf = BytesMut::from(&b"HTTP/1.1 200 OK\r\nETag: \"1-abc\"\r\nContent-Length: 120\r\n\r\n"[..]);
        let mut parser = ResponseParser::new();
        let mut rec = Recorder::default();
        parser.receive(&mut buf, &mut rec).unwrap();
        assert_eq!(parser.state(), ParseState::HeadersComplete);
        assert!(!parser.set_body_mode(BodyMode::None));
        assert_eq!(parser.state(), ParseState::Idle);
        assert_eq!(rec.headers.len(), 2);
    }

    #[test]
    fn eof_mid_body_is_an_error() {
        let mut buf = BytesMut::from(&b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\n{\"a\""[..]);
        let mut parser = ResponseParser::new();
        let mut rec = Recorder::default();
        parser.receive(&mut buf, &mut rec).unwrap();
        parser.set_body_mode(BodyMode::Length(10));
        parser.receive(&mut buf, &mut rec).unwrap();
        let err = parser.finish_at_eof(&mut rec).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
