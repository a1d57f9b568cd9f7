/*
 * handler.rs
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

//! HTTP response handler trait.
//!
//! Events: status → header (×n) → start_body → body_chunk (×n) → end_body → complete,
//! or `failed` on connection/protocol error.

use crate::protocol::http::response::Response;

/// Handler for HTTP response events (push model). The connection drives this as data arrives.
///
/// For a response without a body (HEAD, 204, 304, `Content-Length: 0`) the
/// body callbacks are skipped and `complete` follows the last header.
pub trait ResponseHandler {
    /// Status line received.
    fn status(&mut self, response: &Response);

    /// Called for each response or trailer header. Name may repeat for multi-value headers.
    fn header(&mut self, name: &str, value: &str);

    /// The response body is about to start.
    fn start_body(&mut self) {}

    /// One chunk of body data. Data is only valid for the duration of the call.
    fn body_chunk(&mut self, data: &[u8]);

    /// The response body is complete. Trailers may follow.
    fn end_body(&mut self) {}

    /// The response is fully complete.
    fn complete(&mut self) {}

    /// The request failed (connection error, protocol error).
    fn failed(&mut self, _error: &std::io::Error) {}
}
