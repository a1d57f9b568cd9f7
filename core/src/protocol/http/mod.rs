/*
 * mod.rs
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

//! HTTP client: HTTP/1.1 over plain TCP or TLS with push-parsed responses.
//!
//! - Callback-based response API: `ResponseHandler` with `status`, `header`,
//!   `start_body`, `body_chunk`, `end_body`, `complete`, `failed`.
//! - Buffers: `bytes` crate (BytesMut for the parse buffer).
//! - HTTP/1.1 state-machine response parser with Content-Length, chunked and
//!   read-until-close bodies.

mod handler;
mod request;
mod response;

pub mod client;
pub mod connection;
pub mod h1;

pub use client::{HttpClient, Timeouts};
pub use connection::{HttpConnection, HttpStream};
pub use handler::ResponseHandler;
pub use request::{HttpRequest, Method};
pub use response::Response;
