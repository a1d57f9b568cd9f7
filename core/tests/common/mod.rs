/*
 * common/mod.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * In-memory stand-in for a CouchDB server, used by the integration tests.
 * It answers the subset of the HTTP API the endpoint callers use, with the
 * same status codes, error bodies, ETags and session cookie behaviour.
 */

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use settee_core::protocol::http::{Response, ResponseHandler};
use settee_core::uri::decode;
use settee_core::{Method, Request, Transport};

const SESSION_TOKEN: &str = "c2V0dGVlOjY1NDMyMTpzZXNzaW9u";

#[derive(Default)]
struct State {
    databases: BTreeMap<String, BTreeMap<String, Stored>>,
    next_uuid: u64,
    log: Vec<String>,
}

#[derive(Clone)]
struct Stored {
    generation: u64,
    body: Map<String, Value>,
    deleted: bool,
}

impl Stored {
    fn rev(&self) -> String {
        format!("{}-{:032x}", self.generation, self.generation * 7919)
    }
}

/// What the fake sends back for one request.
struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Reply {
    fn json(status: u16, value: Value) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: format!("{}\n", value).into_bytes(),
        }
    }

    fn error(status: u16, error: &str, reason: &str) -> Self {
        Self::json(status, json!({ "error": error, "reason": reason }))
    }

    fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

pub struct FakeCouch {
    admin: Option<(String, String)>,
    state: Mutex<State>,
}

impl FakeCouch {
    /// A server that accepts every request.
    pub fn open() -> Self {
        Self {
            admin: None,
            state: Mutex::new(State::default()),
        }
    }

    /// A server that requires Basic auth or a session cookie for this admin.
    pub fn with_admin(name: &str, password: &str) -> Self {
        Self {
            admin: Some((name.to_string(), password.to_string())),
            state: Mutex::new(State::default()),
        }
    }

    pub fn create_db(&self, name: &str) {
        self.state.lock().unwrap().databases.entry(name.to_string()).or_default();
    }

    /// `METHOD target` of every request seen, in order.
    pub fn log(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    fn authorized(&self, request: &Request) -> bool {
        let Some((name, password)) = &self.admin else {
            return true;
        };
        let basic = format!(
            "Basic {}",
            base64::Engine::encode(&base64::engine::general_purpose::STANDARD, format!("{}:{}", name, password))
        );
        let cookie = format!("AuthSession={}", SESSION_TOKEN);
        request.headers().iter().any(|(k, v)| {
            (k.eq_ignore_ascii_case("authorization") && *v == basic)
                || (k.eq_ignore_ascii_case("cookie") && v.split("; ").any(|c| c == cookie))
        })
    }

    fn route(&self, request: &Request) -> Reply {
        let segments: Vec<String> = request
            .path()
            .trim_start_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| decode(s).into_owned())
            .collect();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
        let method = request.method();

        if segments.first() == Some(&"_session") {
            return self.session(method, request);
        }
        if !self.authorized(request) {
            return Reply::error(401, "unauthorized", "Name or password is incorrect.");
        }

        let mut state = self.state.lock().unwrap();
        match (method, segments.as_slice()) {
            (Method::Get, []) => Reply::json(
                200,
                json!({"couchdb": "Welcome", "version": "3.3.3", "uuid": "fake", "features": ["access-ready"]}),
            ),
            (Method::Get, ["_all_dbs"]) => {
                let names: Vec<&String> = state.databases.keys().collect();
                Reply::json(200, json!(names))
            }
            (Method::Get, ["_uuids"]) => {
                let count = request
                    .query_param("count")
                    .flatten()
                    .and_then(|c| c.parse::<u64>().ok())
                    .unwrap_or(1);
                let uuids: Vec<String> = (0..count)
                    .map(|_| {
                        state.next_uuid += 1;
                        format!("{:032x}", state.next_uuid)
                    })
                    .collect();
                Reply::json(200, json!({ "uuids": uuids }))
            }
            (_, [db]) => database(&mut state, method, db, request),
            (_, [db, "_design", name]) => {
                let id = format!("_design/{}", name);
                document(&mut state, method, db, &id, request)
            }
            (_, [db, id]) => document(&mut state, method, db, id, request),
            _ => Reply::error(404, "not_found", "missing"),
        }
    }

    fn session(&self, method: Method, request: &Request) -> Reply {
        let cookie = |value: &str, extra: &str| format!("AuthSession={}; Version=1; Path=/; HttpOnly{}", value, extra);
        match method {
            Method::Post => {
                let body: Value = request
                    .body()
                    .and_then(|b| serde_json::from_slice(b).ok())
                    .unwrap_or(Value::Null);
                let matches = match &self.admin {
                    Some((name, password)) => body["name"] == json!(name) && body["password"] == json!(password),
                    None => true,
                };
                if !matches {
                    return Reply::error(401, "unauthorized", "Name or password is incorrect.");
                }
                Reply::json(200, json!({"ok": true, "name": body["name"], "roles": ["_admin"]}))
                    .header("Set-Cookie", &cookie(SESSION_TOKEN, ""))
            }
            Method::Get => {
                let name = if self.admin.is_some() && self.authorized(request) {
                    self.admin.as_ref().map(|(n, _)| json!(n)).unwrap_or(Value::Null)
                } else {
                    Value::Null
                };
                let roles = if name.is_null() { json!([]) } else { json!(["_admin"]) };
                Reply::json(200, json!({"ok": true, "userCtx": {"name": name, "roles": roles}}))
            }
            Method::Delete => Reply::json(200, json!({"ok": true}))
                .header("Set-Cookie", &cookie("", "; Expires=Thu, 01-Jan-1970 00:00:00 GMT; Max-Age=0")),
            _ => Reply::error(405, "method_not_allowed", "Only GET,POST,DELETE allowed"),
        }
    }
}

fn if_match(request: &Request) -> Option<String> {
    request.header("If-Match").map(|v| v.trim_matches('"').to_string())
}

fn database(state: &mut State, method: Method, db: &str, request: &Request) -> Reply {
    match method {
        Method::Put => {
            if state.databases.contains_key(db) {
                return Reply::error(412, "file_exists", "The database could not be created, the file already exists.");
            }
            if db.starts_with('_') || db.chars().any(|c| c.is_ascii_uppercase()) {
                return Reply::error(400, "illegal_database_name", "Name is not a valid database name.");
            }
            state.databases.insert(db.to_string(), BTreeMap::new());
            Reply::json(201, json!({"ok": true}))
        }
        Method::Delete => match state.databases.remove(db) {
            Some(_) => Reply::json(200, json!({"ok": true})),
            None => Reply::error(404, "not_found", "Database does not exist."),
        },
        Method::Head | Method::Get => {
            let Some(docs) = state.databases.get(db) else {
                return Reply::error(404, "not_found", "Database does not exist.");
            };
            let live = docs.values().filter(|d| !d.deleted).count();
            let dead = docs.len() - live;
            Reply::json(
                200,
                json!({"db_name": db, "doc_count": live, "doc_del_count": dead, "update_seq": format!("{}-g1AAAA", docs.len())}),
            )
        }
        Method::Post => {
            if !state.databases.contains_key(db) {
                return Reply::error(404, "not_found", "Database does not exist.");
            }
            state.next_uuid += 1;
            let id = format!("{:032x}", state.next_uuid);
            document(state, Method::Put, db, &id, request)
        }
        _ => Reply::error(405, "method_not_allowed", "Only DELETE,GET,HEAD,POST,PUT allowed"),
    }
}

fn document(state: &mut State, method: Method, db: &str, id: &str, request: &Request) -> Reply {
    let Some(docs) = state.databases.get_mut(db) else {
        return Reply::error(404, "not_found", "Database does not exist.");
    };
    let current = docs.get(id).filter(|d| !d.deleted).cloned();
    match method {
        Method::Get | Method::Head => match current {
            Some(doc) => {
                let rev = doc.rev();
                let mut body = doc.body.clone();
                body.insert("_id".into(), json!(id));
                body.insert("_rev".into(), json!(rev));
                Reply::json(200, Value::Object(body)).header("ETag", &format!("\"{}\"", rev))
            }
            None => Reply::error(404, "not_found", if docs.contains_key(id) { "deleted" } else { "missing" }),
        },
        Method::Put | Method::Delete => {
            let body: Map<String, Value> = request
                .body()
                .and_then(|b| serde_json::from_slice(b).ok())
                .unwrap_or_default();
            if method == Method::Delete && current.is_none() {
                return Reply::error(404, "not_found", "missing");
            }
            let given = if_match(request).or_else(|| body.get("_rev").and_then(Value::as_str).map(str::to_string));
            let current_rev = current.as_ref().map(Stored::rev);
            if given != current_rev {
                return Reply::error(409, "conflict", "Document update conflict.");
            }
            let generation = docs.get(id).map(|d| d.generation).unwrap_or(0) + 1;
            let mut stored_body = body;
            stored_body.remove("_id");
            stored_body.remove("_rev");
            let stored = Stored {
                generation,
                body: stored_body,
                deleted: method == Method::Delete,
            };
            let rev = stored.rev();
            docs.insert(id.to_string(), stored);
            let status = if method == Method::Delete { 200 } else { 201 };
            Reply::json(status, json!({"ok": true, "id": id, "rev": rev})).header("ETag", &format!("\"{}\"", rev))
        }
        _ => Reply::error(405, "method_not_allowed", "Only DELETE,GET,HEAD,PUT allowed"),
    }
}

#[async_trait]
impl Transport for FakeCouch {
    async fn send(&self, request: &Request, handler: &mut (dyn ResponseHandler + Send)) -> io::Result<()> {
        self.state
            .lock()
            .unwrap()
            .log
            .push(format!("{} {}", request.method(), request.target()));
        let reply = self.route(request);
        handler.status(&Response::new(reply.status));
        for (name, value) in &reply.headers {
            handler.header(name, value);
        }
        handler.start_body();
        // HEAD responses go out with their body so tests can tell it was ignored.
        for chunk in reply.body.chunks(7) {
            handler.body_chunk(chunk);
        }
        handler.end_body();
        handler.complete();
        Ok(())
    }
}

/// Collected set of database names, for assertions.
pub fn names(dbs: &[settee_core::DbName]) -> BTreeSet<String> {
    dbs.iter().map(|d| d.to_string()).collect()
}
