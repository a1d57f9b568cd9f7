/*
 * context.rs
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


//! Connection context threaded through every request.
//!
//! A `Context` is a value. Requests read it and never change it; a request
//! that renewed the session hands back a new one (see `client::Reply`).

use std::fmt;
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::cookies::CookieJar;
use crate::transport::{HttpTransport, Transport};
use crate::types::DbName;

/// Credentials sent with every request.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum Credentials {
    #[default]
    None,
    Basic { username: String, password: String },
}

impl Credentials {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Basic {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::None => f.write_str("None"),
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Clone)]
pub struct Context {
    host: String,
    port: u16,
    secure: bool,
    credentials: Credentials,
    database: Option<DbName>,
    cookies: CookieJar,
    transport: Arc<dyn Transport>,
}

impl Context {
    /// Plain HTTP, no credentials, no database, empty cookie jar.
    pub fn new(host: impl Into<String>, port: u16, transport: Arc<dyn Transport>) -> Self {
        Self {
            host: host.into(),
            port,
            secure: false,
            credentials: Credentials::None,
            database: None,
            cookies: CookieJar::new(),
            transport,
        }
    }

    /// Context for a configured server, over a fresh [`HttpTransport`] with the configured timeouts.
    pub fn from_config(config: &ServerConfig) -> Self {
        let transport = Arc::new(HttpTransport::new(config.timeouts()));
        let mut ctx = Context::new(config.host.clone(), config.port, transport).with_secure(config.secure);
        if let Some(username) = &config.username {
            ctx = ctx.with_credentials(Credentials::basic(
                username.clone(),
                config.password.clone().unwrap_or_default(),
            ));
        }
        if let Some(db) = &config.database {
            ctx = ctx.with_database(db.clone());
        }
        ctx
    }

    pub fn with_database(mut self, database: impl Into<DbName>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn without_database(mut self) -> Self {
        self.database = None;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_cookies(&self, cookies: CookieJar) -> Self {
        Self {
            cookies,
            ..self.clone()
        }
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_secure(&self) -> bool {
        self.secure
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn database(&self) -> Option<&DbName> {
        self.database.as_ref()
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("credentials", &self.credentials)
            .field("database", &self.database)
            .field("cookies", &self.cookies.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_shows_password() {
        let creds = Credentials::basic("admin", "hunter2");
        let shown = format!("{:?}", creds);
        assert!(shown.contains("admin"));
        assert!(!shown.contains("hunter2"));
    }

    #[test]
    fn from_config_carries_everything() {
        let config = ServerConfig::from_url("https://admin:pw@db.example:6984/notes").unwrap();
        let ctx = Context::from_config(&config);
        assert_eq!(ctx.host(), "db.example");
        assert_eq!(ctx.port(), 6984);
        assert!(ctx.is_secure());
        assert_eq!(ctx.credentials(), &Credentials::basic("admin", "pw"));
        assert_eq!(ctx.database().map(DbName::as_str), Some("notes"));
        assert!(ctx.cookies().is_empty());
    }

    #[test]
    fn with_cookies_leaves_original_untouched() {
        let config = ServerConfig::default();
        let ctx = Context::from_config(&config);
        let jar: CookieJar = [crate::cookies::Cookie::new("AuthSession", "abc")].into_iter().collect();
        let renewed = ctx.with_cookies(jar.clone());
        assert!(ctx.cookies().is_empty());
        assert_eq!(renewed.cookies(), &jar);
        assert!(Arc::ptr_eq(ctx.transport(), renewed.transport()));
    }
}
