/*
 * connection.rs
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

//! HTTP connection: one TCP or TLS stream, drives the H1 parser, invokes `ResponseHandler`.
//!
//! A connection carries one exchange at a time. After a response completes it
//! can be reused for the next request unless the server asked to close or the
//! body ran until end of stream.

use bytes::BytesMut;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::client::TlsStream as TokioTlsStream;

use crate::protocol::http::h1::{BodyMode, H1ResponseHandler, ParseState, ResponseParser};
use crate::protocol::http::request::{HttpRequest, Method};
use crate::protocol::http::response::Response;
use crate::protocol::http::ResponseHandler;

const READ_CHUNK: usize = 8192;

/// Unified stream: plain TCP or TLS. Implements AsyncRead + AsyncWrite.
pub enum HttpStream {
    Plain(TcpStream),
    Tls(Box<TokioTlsStream<TcpStream>>),
}

impl AsyncRead for HttpStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_read(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for HttpStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_write(cx, buf),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_flush(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match &mut *self {
            HttpStream::Plain(s) => Pin::new(s).poll_shutdown(cx),
            HttpStream::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

/// Bridges H1 parser callbacks to the connection state and the caller's `ResponseHandler`.
struct H1Driver<'a> {
    status: &'a mut Option<(u16, Option<String>)>,
    headers: &'a mut Vec<(String, String)>,
    handler: &'a mut (dyn ResponseHandler + Send),
}

impl H1ResponseHandler for H1Driver<'_> {
    fn status(&mut self, code: u16, reason: Option<&str>) {
        *self.status = Some((code, reason.map(|s| s.to_string())));
    }

    fn header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn body_chunk(&mut self, data: &[u8]) {
        tracing::trace!(bytes = data.len(), "body chunk");
        self.handler.body_chunk(data);
    }

    fn end_body(&mut self) {
        self.handler.end_body();
    }

    fn trailer(&mut self, name: &str, value: &str) {
        self.handler.header(name, value);
    }

    fn complete(&mut self) {
        self.handler.complete();
    }
}

/// HTTP/1.1 connection. Call `send()` to run one request/response exchange.
pub struct HttpConnection {
    stream: HttpStream,
    host: String,
    port: u16,
    secure: bool,
    read_timeout: Duration,
    read_buf: BytesMut,
    parser: ResponseParser,
    status: Option<(u16, Option<String>)>,
    headers: Vec<(String, String)>,
    reusable: bool,
    started: bool,
}

impl HttpConnection {
    /// Wrap an already-connected stream. Used by `HttpClient::connect()`.
    pub fn new(stream: HttpStream, host: String, port: u16, secure: bool, read_timeout: Duration) -> Self {
        Self {
            stream,
            host,
            port,
            secure,
            read_timeout,
            read_buf: BytesMut::with_capacity(READ_CHUNK),
            parser: ResponseParser::new(),
            status: None,
            headers: Vec::new(),
            reusable: true,
            started: false,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    /// False once the server closed (or asked to close) the connection, or an exchange failed.
    pub fn is_reusable(&self) -> bool {
        self.reusable
    }

    /// True once the last exchange delivered a final status to its handler.
    pub fn response_started(&self) -> bool {
        self.started
    }

    /// Send the request and run the read loop until the response is complete.
    /// On error, `handler.failed` is called and the connection is no longer reusable.
    pub async fn send(
        &mut self,
        request: &HttpRequest<'_>,
        handler: &mut (dyn ResponseHandler + Send),
    ) -> io::Result<()> {
        let result = self.exchange(request, handler).await;
        if let Err(e) = &result {
            self.reusable = false;
            handler.failed(e);
        }
        result
    }

    async fn exchange(
        &mut self,
        request: &HttpRequest<'_>,
        handler: &mut (dyn ResponseHandler + Send),
    ) -> io::Result<()> {
        self.status = None;
        self.started = false;
        self.headers.clear();
        self.parser.reset();
        self.read_buf.clear();

        self.write_request(request).await?;

        loop {
            let mut driver = H1Driver {
                status: &mut self.status,
                headers: &mut self.headers,
                handler: &mut *handler,
            };
            self.parser.receive(&mut self.read_buf, &mut driver)?;

            match self.parser.state() {
                ParseState::HeadersComplete => {
                    let (code, reason) = self.status.take().unwrap_or((0, None));
                    if (100..200).contains(&code) {
                        // Interim response (e.g. 100 Continue): the real one follows.
                        self.headers.clear();
                        self.parser.reset();
                        continue;
                    }
                    let response = match reason {
                        Some(r) => Response::with_reason(code, r),
                        None => Response::new(code),
                    };
                    self.started = true;
                    handler.status(&response);
                    for (name, value) in &self.headers {
                        handler.header(name, value);
                    }
                    if self.header_has_token("connection", "close") {
                        self.reusable = false;
                    }
                    let mode = self.body_mode(request.method, code);
                    if mode == BodyMode::UntilClose {
                        self.reusable = false;
                    }
                    if self.parser.set_body_mode(mode) {
                        handler.start_body();
                    } else {
                        handler.complete();
                    }
                    continue;
                }
                ParseState::Idle => break,
                _ => {}
            }

            let mut tmp = [0u8; READ_CHUNK];
            let n = timeout(self.read_timeout, self.stream.read(&mut tmp))
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "HTTP read timed out"))??;
            if n == 0 {
                self.reusable = false;
                let mut driver = H1Driver {
                    status: &mut self.status,
                    headers: &mut self.headers,
                    handler: &mut *handler,
                };
                self.parser.finish_at_eof(&mut driver)?;
                break;
            }
            self.read_buf.extend_from_slice(&tmp[..n]);
        }
        Ok(())
    }

    fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn header_has_token(&self, name: &str, token: &str) -> bool {
        self.header_value(name)
            .map(|v| v.split(',').any(|t| t.trim().eq_ignore_ascii_case(token)))
            .unwrap_or(false)
    }

    fn body_mode(&self, method: Method, code: u16) -> BodyMode {
        if method == Method::Head || code == 204 || code == 304 {
            return BodyMode::None;
        }
        if self.header_has_token("transfer-encoding", "chunked") {
            return BodyMode::Chunked;
        }
        match self
            .header_value("content-length")
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            Some(n) => BodyMode::Length(n),
            None => BodyMode::UntilClose,
        }
    }

    async fn write_request(&mut self, request: &HttpRequest<'_>) -> io::Result<()> {
        let host_header = host_header(&self.host, self.port, self.secure);
        let mut head = format!(
            "{} {} HTTP/1.1\r\nHost: {}\r\n",
            request.method.as_str(),
            request.target,
            host_header
        );
        for (k, v) in request.headers {
            head.push_str(k);
            head.push_str(": ");
            head.push_str(v);
            head.push_str("\r\n");
        }
        let body_len = request.body.map(|b| b.len());
        if !request.has_header("Content-Length") {
            match body_len {
                Some(n) => head.push_str(&format!("Content-Length: {}\r\n", n)),
                None if request.method.expects_body() => head.push_str("Content-Length: 0\r\n"),
                None => {}
            }
        }
        head.push_str("\r\n");
        self.stream.write_all(head.as_bytes()).await?;
        if let Some(body) = request.body {
            self.stream.write_all(body).await?;
        }
        self.stream.flush().await?;
        Ok(())
    }
}

/// `Host` header value: IPv6 literals bracketed, default ports omitted.
fn host_header(host: &str, port: u16, secure: bool) -> String {
    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{}]", host)
    } else {
        host.to_string()
    };
    if (secure && port == 443) || (!secure && port == 80) {
        host
    } else {
        format!("{}:{}", host, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_header_brackets_ipv6_and_omits_default_port() {
        assert_eq!(host_header("::1", 5984, false), "[::1]:5984");
        assert_eq!(host_header("fe80::2", 443, true), "[fe80::2]");
        assert_eq!(host_header("[::1]", 80, false), "[::1]");
        assert_eq!(host_header("couch.example", 6984, true), "couch.example:6984");
        assert_eq!(host_header("couch.example", 80, false), "couch.example");
    }
}
