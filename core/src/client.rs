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


//! Request orchestration: build, send, parse, and notice session changes.

use serde::de::DeserializeOwned;
use tracing::Instrument;

use crate::context::Context;
use crate::error::CouchResult;
use crate::request::{self, RequestBuilder};
use crate::response::{standard_parse, ResponseParts};
use crate::transport;

/// Result of a request.
///
/// `context` is `Some` when the server changed the session (a cookie was set,
/// renewed or cleared); callers should use it for later requests.
#[derive(Debug)]
pub struct Reply<T> {
    pub value: T,
    pub context: Option<Context>,
}

impl<T> Reply<T> {
    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        Reply {
            value: f(self.value),
            context: self.context,
        }
    }

    /// The context to use from now on: the updated one, or a clone of `current`.
    pub fn next_context(&self, current: &Context) -> Context {
        self.context.clone().unwrap_or_else(|| current.clone())
    }
}

/// Build a request with `script`, send it, and interpret the response with `parse`.
///
/// Transport failures and unparsable bodies return before `parse` runs.
pub async fn structured_request<T, B, P>(ctx: &Context, script: B, parse: P) -> CouchResult<Reply<T>>
where
    B: FnOnce(&mut RequestBuilder<'_>) -> CouchResult<()>,
    P: FnOnce(&ResponseParts) -> CouchResult<T>,
{
    let request = request::build(ctx, script)?;
    let span = tracing::debug_span!("couch", method = %request.method(), path = %request.path());
    async move {
        let fetched = transport::execute(ctx, &request).await?;
        let context = if fetched.cookies == *ctx.cookies() {
            None
        } else {
            tracing::debug!("session cookies changed");
            Some(ctx.with_cookies(fetched.cookies))
        };
        let parts = ResponseParts::new(fetched.status, fetched.headers, fetched.value);
        let value = parse(&parts)?;
        Ok(Reply { value, context })
    }
    .instrument(span)
    .await
}

/// [`structured_request`] with [`standard_parse`]: check the status, decode the body as `T`.
pub async fn standard_request<T, B>(ctx: &Context, script: B) -> CouchResult<Reply<T>>
where
    T: DeserializeOwned,
    B: FnOnce(&mut RequestBuilder<'_>) -> CouchResult<()>,
{
    structured_request(ctx, script, standard_parse::<T>).await
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::{json, Value};

    use super::*;
    use crate::cookies::{Cookie, CookieJar};
    use crate::error::CouchError;
    use crate::protocol::http::{Response, ResponseHandler};
    use crate::request::Request;
    use crate::transport::Transport;

    /// Answers every request with the same status, cookie header and body.
    struct Scripted {
        status: u16,
        set_cookie: Option<&'static str>,
        body: &'static str,
        requests: Mutex<Vec<Request>>,
    }

    impl Scripted {
        fn new(status: u16, set_cookie: Option<&'static str>, body: &'static str) -> Arc<Self> {
            Arc::new(Self {
                status,
                set_cookie,
                body,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn send(
            &self,
            request: &Request,
            handler: &mut (dyn ResponseHandler + Send),
        ) -> io::Result<()> {
            self.requests.lock().unwrap().push(request.clone());
            handler.status(&Response::new(self.status));
            if let Some(cookie) = self.set_cookie {
                handler.header("Set-Cookie", cookie);
            }
            handler.body_chunk(self.body.as_bytes());
            handler.complete();
            Ok(())
        }
    }

    fn session(value: &str) -> CookieJar {
        let mut cookie = Cookie::new("AuthSession", value);
        cookie.path = Some("/".into());
        [cookie].into_iter().collect()
    }

    #[tokio::test]
    async fn same_cookie_means_no_new_context() {
        let transport = Scripted::new(200, Some("AuthSession=abc; Path=/"), r#"{"ok":true}"#);
        let ctx = Context::new("localhost", 5984, transport.clone()).with_cookies(session("abc"));
        let reply: Reply<Value> = standard_request(&ctx, |_| Ok(())).await.unwrap();
        assert_eq!(reply.value, json!({"ok": true}));
        assert!(reply.context.is_none());
        let sent = transport.requests.lock().unwrap();
        assert_eq!(sent[0].header("Cookie"), Some("AuthSession=abc"));
    }

    #[tokio::test]
    async fn renewed_cookie_hands_back_context() {
        let transport = Scripted::new(200, Some("AuthSession=def; Path=/"), "{}");
        let ctx = Context::new("localhost", 5984, transport).with_cookies(session("abc"));
        let reply: Reply<Value> = standard_request(&ctx, |_| Ok(())).await.unwrap();
        let next = reply.next_context(&ctx);
        assert_eq!(next.cookies(), &session("def"));
        assert_eq!(ctx.cookies(), &session("abc"));
    }

    #[tokio::test]
    async fn first_cookie_hands_back_context() {
        let transport = Scripted::new(200, Some("AuthSession=new; Path=/"), "{}");
        let ctx = Context::new("localhost", 5984, transport);
        let reply: Reply<Value> = standard_request(&ctx, |_| Ok(())).await.unwrap();
        assert_eq!(reply.context.map(|c| c.cookies().clone()), Some(session("new")));
    }

    #[tokio::test]
    async fn parser_is_skipped_on_bad_body() {
        let transport = Scripted::new(200, None, "{\"a\":");
        let ctx = Context::new("localhost", 5984, transport);
        let mut ran = false;
        let result = structured_request(&ctx, |_| Ok(()), |_| {
            ran = true;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(CouchError::ParseFail(_))));
        assert!(!ran);
    }

    #[tokio::test]
    async fn build_failure_sends_nothing() {
        let transport = Scripted::new(200, None, "{}");
        let ctx = Context::new("localhost", 5984, transport.clone());
        let result: CouchResult<Reply<Value>> = standard_request(&ctx, |b| {
            b.select_database()?;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(CouchError::NoDatabase)));
        assert!(transport.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn custom_parser_sees_status_and_headers() {
        let transport = Scripted::new(202, None, r#"{"ok":true,"rev":"2-b"}"#);
        let ctx = Context::new("localhost", 5984, transport);
        let reply = structured_request(&ctx, |_| Ok(()), |parts| {
            parts.require_status(202)?;
            parts.expect_key("ok", &json!(true))?;
            parts.get_key::<String>("rev")
        })
        .await
        .unwrap();
        assert_eq!(reply.into_value(), "2-b");
    }
}
