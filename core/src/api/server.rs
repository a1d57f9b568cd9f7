/*
 * server.rs
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


//! Server-level endpoints: welcome, `_all_dbs`, `_uuids` and cookie sessions.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::{standard_request, structured_request, Reply};
use crate::context::Context;
use crate::error::CouchResult;
use crate::protocol::http::Method;
use crate::types::DbName;

/// `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub couchdb: String,
    pub version: String,
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCtx {
    pub name: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// `GET /_session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(rename = "userCtx")]
    pub user_ctx: UserCtx,
}

pub async fn info(ctx: &Context) -> CouchResult<Reply<ServerInfo>> {
    standard_request(ctx, |_| Ok(())).await
}

pub async fn all_dbs(ctx: &Context) -> CouchResult<Reply<Vec<DbName>>> {
    standard_request(ctx, |b| {
        b.add_path_segment("_all_dbs");
        Ok(())
    })
    .await
}

/// `count` server-generated ids.
pub async fn uuids(ctx: &Context, count: u32) -> CouchResult<Reply<Vec<String>>> {
    let count = count.to_string();
    structured_request(
        ctx,
        |b| {
            b.add_path_segment("_uuids").set_query_param("count", Some(count.as_str()));
            Ok(())
        },
        |parts| {
            parts.check_status_code()?;
            parts.get_key("uuids")
        },
    )
    .await
}

/// `POST /_session`. The reply's context carries the session cookie; use it
/// for later requests.
pub async fn login(ctx: &Context, name: &str, password: &str) -> CouchResult<Reply<UserCtx>> {
    structured_request(
        ctx,
        |b| {
            b.set_method(Method::Post)
                .add_path_segment("_session")
                .set_json_body(&json!({ "name": name, "password": password }))?;
            Ok(())
        },
        |parts| {
            parts.check_status_code()?;
            parts.expect_key("ok", &json!(true))?;
            Ok(UserCtx {
                name: parts.get_key_opt("name")?,
                roles: parts.get_key_opt("roles")?.unwrap_or_default(),
            })
        },
    )
    .await
}

pub async fn session(ctx: &Context) -> CouchResult<Reply<SessionInfo>> {
    standard_request(ctx, |b| {
        b.add_path_segment("_session");
        Ok(())
    })
    .await
}

/// `DELETE /_session`. The server expires the cookie, so the reply's context
/// has an empty jar.
pub async fn logout(ctx: &Context) -> CouchResult<Reply<()>> {
    structured_request(
        ctx,
        |b| {
            b.set_method(Method::Delete).add_path_segment("_session");
            Ok(())
        },
        |parts| {
            parts.check_status_code()?;
            parts.expect_key("ok", &json!(true))
        },
    )
    .await
}
