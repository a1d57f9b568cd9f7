/*
 * types.rs
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

//! Opaque identifiers: database names, document ids, document revisions.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Database name, as it appears in the first path segment.
    DbName
);

string_id!(
    /// Document id. Ids starting with `_design/` name design documents.
    DocId
);

string_id!(
    /// Document revision (`N-hash`). Sent as `If-Match` or `rev=` for
    /// optimistic concurrency, returned as `_rev`, `rev` or the `ETag` header.
    DocRev
);

impl DocId {
    /// True for `_design/...` ids, whose `/` is part of the path rather than the name.
    pub fn is_design(&self) -> bool {
        self.0.starts_with("_design/")
    }
}

impl DocRev {
    /// Parse the value of an `ETag` header, which carries the revision in quotes.
    pub fn from_etag(etag: &str) -> Self {
        let trimmed = etag.trim();
        let unquoted = trimmed
            .strip_prefix("W/")
            .unwrap_or(trimmed)
            .trim_matches('"');
        Self(unquoted.to_string())
    }

    /// The revision in `ETag` form (quoted), for `If-Match`.
    pub fn to_etag(&self) -> String {
        format!("\"{}\"", self.0)
    }

    /// The generation number before the dash, if well formed.
    pub fn generation(&self) -> Option<u64> {
        self.0.split_once('-').and_then(|(n, _)| n.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn etag_round_trip() {
        let rev = DocRev::from_etag("\"3-917fa2381192822767f010b95b45325b\"");
        assert_eq!(rev.as_str(), "3-917fa2381192822767f010b95b45325b");
        assert_eq!(rev.generation(), Some(3));
        assert_eq!(rev.to_etag(), "\"3-917fa2381192822767f010b95b45325b\"");
    }

    #[test]
    fn serde_is_transparent() {
        let id: DocId = serde_json::from_str("\"_design/app\"").unwrap();
        assert!(id.is_design());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"_design/app\"");
    }
}
