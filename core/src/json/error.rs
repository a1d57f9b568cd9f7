/*
 * error.rs
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

//! JSON parse errors.

use std::fmt;

/// What went wrong: bad syntax, or input that stopped before the document did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonErrorKind {
    /// The bytes seen so far cannot be the prefix of any JSON document.
    Syntax,
    /// Input ended at a point where more data would have been valid.
    Truncated,
}

/// Error during JSON parsing.
#[derive(Debug, Clone)]
pub struct JsonError {
    kind: JsonErrorKind,
    message: String,
}

impl JsonError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            kind: JsonErrorKind::Syntax,
            message: msg.into(),
        }
    }

    pub fn truncated(msg: impl Into<String>) -> Self {
        Self {
            kind: JsonErrorKind::Truncated,
            message: msg.into(),
        }
    }

    pub fn kind(&self) -> JsonErrorKind {
        self.kind
    }

    pub fn is_truncated(&self) -> bool {
        self.kind == JsonErrorKind::Truncated
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for JsonError {}
