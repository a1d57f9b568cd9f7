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


//! Transport adapter: puts a finished [`Request`] on the wire and classifies
//! what comes back.
//!
//! The only suspension point of a request is the `.await` on
//! [`Transport::send`]. Body bytes are parsed as they arrive; by the time the
//! send returns, the body is either a complete JSON value or a failure.

mod body;
mod http;

use std::io;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::context::Context;
use crate::cookies::CookieJar;
use crate::error::{CouchError, CouchResult};
use crate::protocol::http::{Method, ResponseHandler};
use crate::request::Request;

pub use body::{parse_chunks, BodyCollector, ParseOutcome};
pub use http::HttpTransport;

/// Sends requests and drives a handler with the response.
///
/// Implementations deliver `status`, then each `header`, then body chunks,
/// and return once the response is complete. Tests substitute in-memory
/// implementations.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: &Request,
        handler: &mut (dyn ResponseHandler + Send),
    ) -> io::Result<()>;
}

/// A response whose body parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// The context's jar with this response's `Set-Cookie` headers applied.
    pub cookies: CookieJar,
    pub value: Value,
}

/// Send `request` over the context's transport and parse the body.
///
/// HEAD responses are not parsed; their value is `Null`. A body that ended
/// early is [`CouchError::ParseIncomplete`], one that is not JSON is
/// [`CouchError::ParseFail`].
pub async fn execute(ctx: &Context, request: &Request) -> CouchResult<Fetched> {
    let mut collector = if request.method() == Method::Head {
        BodyCollector::headers_only()
    } else {
        BodyCollector::new()
    };
    tracing::debug!(method = %request.method(), target = %request.target(), "sending request");
    ctx.transport().send(request, &mut collector).await?;
    let (status, headers, outcome) = collector.finish();
    tracing::debug!(status, "response received");

    let value = match outcome {
        ParseOutcome::Complete(value) => value,
        ParseOutcome::Incomplete => {
            tracing::warn!(status, "response body ended before a complete JSON value");
            return Err(CouchError::ParseIncomplete);
        }
        ParseOutcome::Malformed(message) => {
            tracing::warn!(status, %message, "response body is not JSON");
            return Err(CouchError::ParseFail(message));
        }
    };

    let mut cookies = ctx.cookies().clone();
    let now = Utc::now();
    for (name, header) in &headers {
        if name.eq_ignore_ascii_case("set-cookie") {
            cookies.apply_set_cookie(header, now);
        }
    }

    Ok(Fetched {
        status,
        headers,
        cookies,
        value,
    })
}
