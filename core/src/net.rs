/*
 * net.rs
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

//! TLS client configuration for `https` servers.
//!
//! Trust roots come from the platform store, falling back to the bundled
//! Mozilla roots when the platform store is empty or unreadable.

use std::sync::{Arc, OnceLock};

use tokio_rustls::rustls::client::ClientConfig;
use tokio_rustls::rustls::RootCertStore;

/// Build a root certificate store: platform native certs first, then webpki-roots as fallback.
fn build_root_store() -> RootCertStore {
    let mut root_store = RootCertStore::empty();
    match rustls_native_certs::load_native_certs() {
        Ok(certs) => {
            let (added, ignored) = root_store.add_parsable_certificates(certs);
            tracing::debug!(added, ignored, "loaded platform trust roots");
        }
        Err(e) => tracing::warn!(error = %e, "platform trust roots unavailable"),
    }
    if root_store.is_empty() {
        root_store.roots = webpki_roots::TLS_SERVER_ROOTS.iter().cloned().collect();
    }
    root_store
}

static HTTP_CLIENT_CONFIG: OnceLock<Arc<ClientConfig>> = OnceLock::new();

/// TLS client config for HTTP/1.1 with ALPN `http/1.1`. Built once per process.
pub fn http_client_config() -> Arc<ClientConfig> {
    HTTP_CLIENT_CONFIG
        .get_or_init(|| {
            let mut config = ClientConfig::builder()
                .with_root_certificates(build_root_store())
                .with_no_client_auth();
            config.alpn_protocols = vec![b"http/1.1".to_vec()];
            Arc::new(config)
        })
        .clone()
}
