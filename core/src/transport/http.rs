/*
 * http.rs
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


//! The bundled transport: HTTP/1.1 over TCP or TLS, with idle keep-alive
//! connections kept per (host, port, secure).

use std::collections::HashMap;
use std::io;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::protocol::http::{HttpClient, HttpConnection, ResponseHandler, Timeouts};
use crate::request::Request;
use crate::transport::Transport;

const DEFAULT_MAX_IDLE_PER_HOST: usize = 4;

type PoolKey = (String, u16, bool);

pub struct HttpTransport {
    timeouts: Timeouts,
    max_idle_per_host: usize,
    idle: Mutex<HashMap<PoolKey, Vec<HttpConnection>>>,
}

impl HttpTransport {
    pub fn new(timeouts: Timeouts) -> Self {
        Self {
            timeouts,
            max_idle_per_host: DEFAULT_MAX_IDLE_PER_HOST,
            idle: Mutex::new(HashMap::new()),
        }
    }

    /// Keep at most `max` idle connections per server; 0 disables reuse.
    pub fn with_max_idle_per_host(mut self, max: usize) -> Self {
        self.max_idle_per_host = max;
        self
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    /// Number of idle connections currently pooled, across all servers.
    pub async fn idle_count(&self) -> usize {
        self.idle.lock().await.values().map(Vec::len).sum()
    }

    async fn checkout(&self, key: &PoolKey) -> Option<HttpConnection> {
        self.idle.lock().await.get_mut(key).and_then(Vec::pop)
    }

    async fn checkin(&self, key: PoolKey, conn: HttpConnection) {
        if !conn.is_reusable() {
            return;
        }
        let mut idle = self.idle.lock().await;
        let conns = idle.entry(key).or_default();
        if conns.len() < self.max_idle_per_host {
            conns.push(conn);
        }
    }

    async fn connect(&self, request: &Request) -> io::Result<HttpConnection> {
        HttpClient::connect(request.host(), request.port(), request.is_secure(), self.timeouts).await
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(Timeouts::default())
    }
}

/// Errors that mean the server closed the connection under us.
fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
    )
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: &Request,
        handler: &mut (dyn ResponseHandler + Send),
    ) -> io::Result<()> {
        let key: PoolKey = (request.host().to_string(), request.port(), request.is_secure());
        let http = request.as_http();

        if let Some(mut conn) = self.checkout(&key).await {
            match conn.send(&http, handler).await {
                Ok(()) => {
                    self.checkin(key, conn).await;
                    return Ok(());
                }
                Err(e) if !conn.response_started() && is_disconnect(&e) => {
                    tracing::debug!(host = request.host(), error = %e, "idle connection went stale, reconnecting");
                }
                Err(e) => return cut_short(&conn, e),
            }
        }

        let mut conn = self.connect(request).await?;
        match conn.send(&http, handler).await {
            Ok(()) => {
                self.checkin(key, conn).await;
                Ok(())
            }
            Err(e) => cut_short(&conn, e),
        }
    }
}

/// A response whose body was cut off by the server is left to the handler to
/// classify; the status and headers already reached it.
fn cut_short(conn: &HttpConnection, e: io::Error) -> io::Result<()> {
    if conn.response_started() && is_disconnect(&e) {
        tracing::warn!(host = conn.host(), error = %e, "connection closed mid-body");
        Ok(())
    } else {
        Err(e)
    }
}
