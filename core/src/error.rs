/*
 * error.rs
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

//! Error taxonomy shared by every request.
//!
//! Status codes map onto domain variants in `response::check_status_code`;
//! transport and body-parse failures are raised before any response parser runs.
//! Nothing here is retried: callers that want retry-on-conflict loop on
//! [`CouchError::Conflict`] themselves.

use std::io;

use thiserror::Error;

use crate::json::JsonError;

#[derive(Debug, Error)]
pub enum CouchError {
    /// 404: database or document does not exist.
    #[error("not found")]
    NotFound,

    /// 409: the supplied revision is not the current one.
    #[error("document update conflict")]
    Conflict,

    /// 401: missing or rejected credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// 403: authenticated, but not allowed.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// 412: the database already exists, or another precondition failed.
    #[error("already exists")]
    AlreadyExists,

    /// 400: the server rejected a name or request shape.
    #[error("invalid name or request: {0}")]
    InvalidName(String),

    /// Body ended before a complete JSON value was read.
    #[error("response body ended before a complete JSON value")]
    ParseIncomplete,

    /// Body was not JSON, or the JSON did not have the expected shape.
    #[error("could not parse response: {0}")]
    ParseFail(String),

    /// Any other non-success status.
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    /// A parser required a specific status and got another.
    #[error("expected status {expected}, got {actual}")]
    Unexpected { expected: u16, actual: u16 },

    /// `select_database` on a context without a database.
    #[error("no database selected in context")]
    NoDatabase,

    /// Request body could not be serialised.
    #[error("could not encode request body: {0}")]
    Encode(String),

    /// Connect, read or write failure.
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
}

impl CouchError {
    pub fn parse_fail(message: impl Into<String>) -> Self {
        Self::ParseFail(message.into())
    }

    /// Status code behind this error, when it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            CouchError::NotFound => Some(404),
            CouchError::Conflict => Some(409),
            CouchError::Unauthorized => Some(401),
            CouchError::Forbidden(_) => Some(403),
            CouchError::AlreadyExists => Some(412),
            CouchError::InvalidName(_) => Some(400),
            CouchError::Server { status, .. } => Some(*status),
            CouchError::Unexpected { actual, .. } => Some(*actual),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CouchError::NotFound)
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, CouchError::Conflict)
    }
}

impl From<JsonError> for CouchError {
    fn from(e: JsonError) -> Self {
        if e.is_truncated() {
            CouchError::ParseIncomplete
        } else {
            CouchError::ParseFail(e.message().to_string())
        }
    }
}

impl From<serde_json::Error> for CouchError {
    fn from(e: serde_json::Error) -> Self {
        CouchError::ParseFail(e.to_string())
    }
}

pub type CouchResult<T> = Result<T, CouchError>;
