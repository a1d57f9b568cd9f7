/*
 * document.rs
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


//! Document endpoints in the context's database.
//!
//! Revisions travel in `If-Match`; the server answers with the new one in the
//! body and in `ETag`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::{standard_request, structured_request, Reply};
use crate::context::Context;
use crate::error::{CouchError, CouchResult};
use crate::protocol::http::Method;
use crate::response::ResponseParts;
use crate::types::{DocId, DocRev};

/// Id and new revision returned by a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocUpdate {
    pub id: DocId,
    pub rev: DocRev,
}

fn parse_update(parts: &ResponseParts) -> CouchResult<DocUpdate> {
    parts.check_status_code()?;
    parts.expect_key("ok", &json!(true))?;
    Ok(DocUpdate {
        id: parts.get_key("id")?,
        rev: parts.get_key("rev")?,
    })
}

/// `GET /{db}/{id}`, decoded as `T`.
pub async fn get<T: DeserializeOwned>(ctx: &Context, id: &DocId) -> CouchResult<Reply<T>> {
    standard_request(ctx, |b| {
        b.select_database()?.select_document(id);
        Ok(())
    })
    .await
}

/// `GET /{db}/{id}?rev=...`: an older revision, if the server still has it.
pub async fn get_at<T: DeserializeOwned>(ctx: &Context, id: &DocId, rev: &DocRev) -> CouchResult<Reply<T>> {
    standard_request(ctx, |b| {
        b.select_database()?
            .select_document(id)
            .set_query_param("rev", Some(rev.as_str()));
        Ok(())
    })
    .await
}

/// `PUT /{db}/{id}`. Pass the current revision to update; `None` creates.
pub async fn put<T: Serialize + ?Sized>(
    ctx: &Context,
    id: &DocId,
    doc: &T,
    rev: Option<&DocRev>,
) -> CouchResult<Reply<DocUpdate>> {
    structured_request(
        ctx,
        |b| {
            b.set_method(Method::Put)
                .select_database()?
                .select_document(id)
                .maybe_add_revision(rev)
                .set_json_body(doc)?;
            Ok(())
        },
        parse_update,
    )
    .await
}

/// `POST /{db}`: create with a server-assigned id.
pub async fn create<T: Serialize + ?Sized>(ctx: &Context, doc: &T) -> CouchResult<Reply<DocUpdate>> {
    structured_request(
        ctx,
        |b| {
            b.set_method(Method::Post).select_database()?.set_json_body(doc)?;
            Ok(())
        },
        parse_update,
    )
    .await
}

/// `DELETE /{db}/{id}` at revision `rev`. Returns the tombstone's revision.
pub async fn delete(ctx: &Context, id: &DocId, rev: &DocRev) -> CouchResult<Reply<DocRev>> {
    structured_request(
        ctx,
        |b| {
            b.set_method(Method::Delete)
                .select_database()?
                .select_document(id)
                .add_revision(rev);
            Ok(())
        },
        |parts| parse_update(parts).map(|u| u.rev),
    )
    .await
}

/// `HEAD /{db}/{id}`: current revision from `ETag`, without fetching the body.
pub async fn get_rev(ctx: &Context, id: &DocId) -> CouchResult<Reply<DocRev>> {
    structured_request(
        ctx,
        |b| {
            b.set_method(Method::Head).select_database()?.select_document(id);
            Ok(())
        },
        |parts| {
            parts.check_status_code()?;
            parts.etag()
        },
    )
    .await
}

/// `HEAD /{db}/{id}`: true on 200, false on 404.
pub async fn exists(ctx: &Context, id: &DocId) -> CouchResult<Reply<bool>> {
    structured_request(
        ctx,
        |b| {
            b.set_method(Method::Head).select_database()?.select_document(id);
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
