/*
 * database.rs
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


//! Database administration.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::{standard_request, structured_request, Reply};
use crate::context::Context;
use crate::error::{CouchError, CouchResult};
use crate::protocol::http::Method;
use crate::types::DbName;

/// `GET /{db}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbInfo {
    pub db_name: DbName,
    pub doc_count: u64,
    pub doc_del_count: u64,
    /// Opaque: a number on old servers, a string on newer ones.
    pub update_seq: Value,
}

/// `PUT /{db}`. An existing database is [`CouchError::AlreadyExists`].
pub async fn create(ctx: &Context, db: &DbName) -> CouchResult<Reply<()>> {
    structured_request(
        ctx,
        |b| {
            b.set_method(Method::Put).select_named_database(db);
            Ok(())
        },
        |parts| {
            parts.check_status_code()?;
            parts.expect_key("ok", &json!(true))
        },
    )
    .await
}

pub async fn delete(ctx: &Context, db: &DbName) -> CouchResult<Reply<()>> {
    structured_request(
        ctx,
        |b| {
            b.set_method(Method::Delete).select_named_database(db);
            Ok(())
        },
        |parts| {
            parts.check_status_code()?;
            parts.expect_key("ok", &json!(true))
        },
    )
    .await
}

/// `HEAD /{db}`: true on 200, false on 404.
pub async fn exists(ctx: &Context, db: &DbName) -> CouchResult<Reply<bool>> {
    structured_request(
        ctx,
        |b| {
            b.set_method(Method::Head).select_named_database(db);
            Ok(())
        },
        |parts| match parts.check_status_code() {
            Ok(()) => Ok(true),
            Err(CouchError::NotFound) => Ok(false),
            Err(e) => Err(e),
        },
    )
    .await
}

/// Info for the context's database.
pub async fn info(ctx: &Context) -> CouchResult<Reply<DbInfo>> {
    standard_request(ctx, |b| {
        b.select_database()?;
        Ok(())
    })
    .await
}
