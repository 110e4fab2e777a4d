//! In-process fake of the club administration backend

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use admin::ApiClient;
use axum::{Json, Router};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use common::TokenStore;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Map, Value, json};
use uuid::Uuid;

/// Mint an HS256 token for `sub` expiring `offset_secs` from now
pub fn mint_token(sub: &str, offset_secs: i64) -> String {
    let claims = json!({
        "sub": sub,
        "email": format!("{}@club.org", sub),
        "exp": Utc::now().timestamp() + offset_secs,
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"fake-backend-secret"),
    )
    .unwrap()
}

#[derive(Default)]
struct Data {
    collections: HashMap<String, Vec<Value>>,
    requests: Vec<(Method, String)>,
    delays: HashMap<Method, Duration>,
    next_delay: Option<(Method, Duration)>,
    fail_next: Option<(StatusCode, Value)>,
    required_token: Option<String>,
    login: Option<(String, String, Value)>,
}

type Shared = Arc<Mutex<Data>>;

pub struct FakeBackend {
    pub url: String,
    data: Shared,
}

impl FakeBackend {
    pub async fn spawn() -> Self {
        let data: Shared = Arc::default();
        let app = Router::new().fallback(handle).with_state(data.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            data,
        }
    }

    pub fn client(&self, store: Arc<dyn TokenStore>) -> ApiClient {
        ApiClient::new(&self.url, store)
    }

    pub fn seed(&self, collection: &str, items: Vec<Value>) {
        self.data
            .lock()
            .unwrap()
            .collections
            .entry(collection.to_string())
            .or_default()
            .extend(items);
    }

    pub fn items(&self, collection: &str) -> Vec<Value> {
        self.data
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<(Method, String)> {
        self.data.lock().unwrap().requests.clone()
    }

    /// Requests with `method` whose path starts with `prefix`
    pub fn count(&self, method: Method, prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|(m, path)| *m == method && path.starts_with(prefix))
            .count()
    }

    pub fn delay(&self, method: Method, delay: Duration) {
        self.data.lock().unwrap().delays.insert(method, delay);
    }

    /// Hold back only the next `method` answer by `delay`
    pub fn delay_next(&self, method: Method, delay: Duration) {
        self.data.lock().unwrap().next_delay = Some((method, delay));
    }

    /// Answer the next request with `status` and `{"message": message}`
    pub fn fail_next(&self, status: u16, message: &str) {
        let status = StatusCode::from_u16(status).unwrap();
        self.data.lock().unwrap().fail_next = Some((status, json!({ "message": message })));
    }

    /// Refuse requests outside `/auth` unless they carry `token`
    pub fn require_token(&self, token: &str) {
        self.data.lock().unwrap().required_token = Some(token.to_string());
    }

    /// Answer `POST /auth/login` for these credentials with `response`
    pub fn accept_login(&self, email: &str, password: &str, response: Value) {
        self.data.lock().unwrap().login =
            Some((email.to_string(), password.to_string(), response));
    }
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn not_found() -> Response {
    reply(StatusCode::NOT_FOUND, json!({ "message": "Not found" }))
}

async fn handle(
    State(data): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_string();
    let delay = {
        let mut data = data.lock().unwrap();
        data.requests.push((method.clone(), path.clone()));
        match data.next_delay.take() {
            Some((delayed, delay)) if delayed == method => Some(delay),
            other => {
                data.next_delay = other;
                data.delays.get(&method).copied()
            }
        }
    };

    // The answer reflects the data at arrival time, however late it is sent
    let response = respond(&data, &method, &path, &headers, &body);
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    response
}

fn respond(
    data: &Shared,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Response {
    let body: Value = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(body) {
            Ok(body) => body,
            Err(_) => return reply(StatusCode::BAD_REQUEST, json!({ "message": "Bad JSON" })),
        }
    };

    let mut data = data.lock().unwrap();
    if let Some((status, body)) = data.fail_next.take() {
        return reply(status, body);
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if segments.first() != Some(&"auth") {
        if let Some(token) = &data.required_token {
            let expected = format!("Bearer {}", token);
            let sent = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());
            if sent != Some(expected.as_str()) {
                return reply(StatusCode::UNAUTHORIZED, json!({ "message": "Unauthorized" }));
            }
        }
    }

    match (method.as_str(), segments.as_slice()) {
        ("POST", ["auth", "login"]) => match &data.login {
            Some((email, password, response))
                if body["email"] == json!(email) && body["password"] == json!(password) =>
            {
                reply(StatusCode::OK, response.clone())
            }
            _ => reply(
                StatusCode::UNAUTHORIZED,
                json!({ "message": "Invalid credentials" }),
            ),
        },
        ("POST", ["auth", "register"]) => {
            let created = insert(&mut data, "users", body);
            reply(StatusCode::CREATED, created)
        }
        ("GET", ["user-club", "user", user_id]) => {
            let associations: Vec<Value> = collection(&data, "user-club")
                .into_iter()
                .filter(|uc| uc["userId"] == json!(user_id))
                .collect();
            reply(StatusCode::OK, Value::Array(associations))
        }
        ("GET", ["users", id]) => match find(&data, "users", id) {
            Some(mut user) => {
                let clubs = collection(&data, "clubs");
                let joined: Vec<Value> = collection(&data, "user-club")
                    .into_iter()
                    .filter(|uc| uc["userId"] == json!(id))
                    .filter_map(|uc| clubs.iter().find(|c| c["id"] == uc["clubId"]).cloned())
                    .collect();
                user["clubs"] = Value::Array(joined);
                reply(StatusCode::OK, user)
            }
            None => not_found(),
        },
        ("GET", [name]) => reply(StatusCode::OK, Value::Array(collection(&data, name))),
        ("POST", [name]) => {
            if *name == "clubs" {
                let wanted = body["name"].as_str().unwrap_or("").trim().to_lowercase();
                let taken = collection(&data, "clubs").iter().any(|c| {
                    c["name"].as_str().unwrap_or("").trim().to_lowercase() == wanted
                });
                if taken {
                    return reply(
                        StatusCode::CONFLICT,
                        json!({ "message": "Club already exists" }),
                    );
                }
            }
            let created = insert(&mut data, name, body);
            reply(StatusCode::CREATED, created)
        }
        ("DELETE", ["user-club"]) => {
            let items = data.collections.entry("user-club".to_string()).or_default();
            let before = items.len();
            items.retain(|uc| !(uc["userId"] == body["userId"] && uc["clubId"] == body["clubId"]));
            if items.len() == before {
                return not_found();
            }
            reply(StatusCode::OK, json!({ "deleted": true }))
        }
        ("GET", [name, id]) => match find(&data, name, id) {
            Some(item) => reply(StatusCode::OK, item),
            None => not_found(),
        },
        ("PATCH", [name, id]) => {
            let items = data.collections.entry(name.to_string()).or_default();
            match items.iter_mut().find(|item| item["id"] == json!(id)) {
                Some(item) => {
                    if let (Some(target), Value::Object(changes)) = (item.as_object_mut(), body) {
                        target.extend(changes);
                    }
                    reply(StatusCode::OK, item.clone())
                }
                None => not_found(),
            }
        }
        // Associations are only removed through `DELETE /user-club` with a body
        ("DELETE", [name, id]) if *name != "user-club" => {
            let items = data.collections.entry(name.to_string()).or_default();
            let before = items.len();
            items.retain(|item| item["id"] != json!(id));
            if items.len() == before {
                return not_found();
            }
            StatusCode::NO_CONTENT.into_response()
        }
        _ => not_found(),
    }
}

fn collection(data: &Data, name: &str) -> Vec<Value> {
    data.collections.get(name).cloned().unwrap_or_default()
}

fn find(data: &Data, name: &str, id: &str) -> Option<Value> {
    collection(data, name)
        .into_iter()
        .find(|item| item["id"] == json!(id))
}

fn insert(data: &mut Data, name: &str, body: Value) -> Value {
    let mut item = match body {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    item.insert("id".to_string(), json!(Uuid::new_v4().to_string()));
    let item = Value::Object(item);
    data.collections
        .entry(name.to_string())
        .or_default()
        .push(item.clone());
    item
}
