/*
 * client.rs
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

//! HTTP client: connect to a host, then use the connection to send requests with a callback handler.

use std::io;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::TlsConnector;

use crate::net::http_client_config;
use crate::protocol::http::connection::{HttpConnection, HttpStream};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection timeouts applied by `HttpClient::connect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub read: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT_TIMEOUT,
            read: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// HTTP client. `HttpClient::connect(host, port, use_tls, timeouts)` returns a connection to send requests on.
pub struct HttpClient;

impl HttpClient {
    /// Connect to the given host and port. If `use_tls` is true, performs a TLS
    /// handshake offering ALPN `http/1.1`.
    pub async fn connect(
        host: &str,
        port: u16,
        use_tls: bool,
        timeouts: Timeouts,
    ) -> io::Result<HttpConnection> {
        let tcp = timeout(timeouts.connect, TcpStream::connect((host, port)))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "TCP connect timed out"))??;
        tcp.set_nodelay(true)?;

        let stream = if use_tls {
            let server_name = ServerName::try_from(host)
                .map(|name| name.to_owned())
                .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "invalid host name"))?;
            let connector = TlsConnector::from(http_client_config());
            let tls = timeout(timeouts.connect, connector.connect(server_name, tcp))
                .await
                .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "TLS handshake timed out"))?
                .map_err(|e| io::Error::new(io::ErrorKind::ConnectionRefused, e))?;
            HttpStream::Tls(Box::new(tls))
        } else {
            HttpStream::Plain(tcp)
        };
        tracing::debug!(host, port, tls = use_tls, "HTTP connection established");
        Ok(HttpConnection::new(stream, host.to_string(), port, use_tls, timeouts.read))
    }
}
