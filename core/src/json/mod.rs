/*
 * mod.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Settee.
 *
 * Settee is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This file is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this file.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Incremental JSON: push parser plus a handler that builds `serde_json::Value`.
//!
//! Response bodies arrive in arbitrary chunks; the parser consumes complete
//! tokens as they appear and reports events, so a document can be assembled
//! without first buffering the whole body.

mod error;
mod handler;
mod number;
mod parser;
mod value;

pub use error::{JsonError, JsonErrorKind};
pub use handler::JsonContentHandler;
pub use number::JsonNumber;
pub use parser::JsonParser;
pub use value::ValueBuilder;
