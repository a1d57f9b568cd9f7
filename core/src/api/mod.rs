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


//! Endpoint callers. Each is a builder script plus a response parser handed
//! to [`structured_request`](crate::client::structured_request) or
//! [`standard_request`](crate::client::standard_request).

pub mod database;
pub mod document;
pub mod server;

pub use database::DbInfo;
pub use document::DocUpdate;
pub use server::{ServerInfo, SessionInfo, UserCtx};
