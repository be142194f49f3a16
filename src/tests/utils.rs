// src/tests/utils.rs
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use astra::Body;
use http::{Method, Request};
use serde_json::Value;

use crate::auth::{sessions, Role};
use crate::db::connection::Database;
use crate::db::{properties, users};
use crate::errors::ServerError;
use crate::meetings::MeetingLifecycle;
use crate::notify::testing::FakeNotifier;
use crate::router::AppState;

pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

pub struct TestApp {
    pub state: AppState,
    pub fake: Arc<FakeNotifier>,
}

/// Fresh in-memory DB with the production schema, wired to a recording
/// fake notifier. In-memory SQLite is per thread and every #[test] runs
/// on its own thread, so state never leaks between tests.
pub fn test_app() -> TestApp {
    let db = Database::new(":memory:");
    db.with_conn(|conn| {
        conn.execute_batch(include_str!("../../sql/schema.sql"))
            .map_err(|e| ServerError::db("apply schema failed", e))
    })
    .expect("database initialization failed");

    let fake = Arc::new(FakeNotifier::new());
    let state = AppState {
        db,
        lifecycle: MeetingLifecycle::new(fake.clone()),
    };
    TestApp { state, fake }
}

/// Create an account and mint a bearer token for it.
pub fn seed_user(db: &Database, name: &str, email: &str, role: Role) -> (i64, String) {
    let now = now_unix();
    db.with_conn(|conn| {
        let id = match role {
            Role::Admin => users::ensure_admin(conn, name, email, now)?,
            Role::User => users::ensure_user(conn, name, email, role, now)?,
        };
        let token = sessions::issue(conn, id, now)?;
        Ok((id, token))
    })
    .expect("failed to seed user")
}

pub fn seed_property(db: &Database, title: &str, agent: Option<&str>) -> i64 {
    db.with_conn(|conn| {
        properties::insert_property(
            conn,
            title,
            "Tunis",
            250_000,
            agent,
            r#"["cover.jpg"]"#,
            now_unix(),
        )
    })
    .expect("failed to seed property")
}

pub fn get(path: &str, token: Option<&str>) -> Request<Body> {
    build(Method::GET, path, token, None)
}

pub fn delete(path: &str, token: Option<&str>) -> Request<Body> {
    build(Method::DELETE, path, token, None)
}

pub fn post_json(path: &str, token: Option<&str>, body: Value) -> Request<Body> {
    build(Method::POST, path, token, Some(body))
}

pub fn patch_json(path: &str, token: Option<&str>, body: Value) -> Request<Body> {
    build(Method::PATCH, path, token, Some(body))
}

fn build(method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let body = match body {
        Some(v) => Body::from(v.to_string()),
        None => Body::empty(),
    };
    builder.body(body).expect("failed to build request")
}

/// Collapse a handler result for assertions: responses become their
/// status code so expected-error matches stay printable.
pub fn outcome(result: Result<astra::Response, ServerError>) -> Result<u16, ServerError> {
    result.map(|r| r.status().as_u16())
}

pub fn body_json(resp: astra::Response) -> Value {
    let mut body = String::new();
    resp.into_body()
        .reader()
        .read_to_string(&mut body)
        .expect("failed to read response body");
    serde_json::from_str(&body).expect("response body was not json")
}

/// RFC 3339 string for `now + secs`, for scheduling inputs.
pub fn future_date(secs_from_now: i64) -> String {
    chrono::DateTime::from_timestamp(now_unix() + secs_from_now, 0)
        .expect("valid timestamp")
        .to_rfc3339()
}

/// The admin fan-out runs detached; poll briefly until it lands.
pub fn wait_for_sends(fake: &FakeNotifier, expected: usize) {
    for _ in 0..100 {
        if fake.sent_count() >= expected {
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!(
        "expected {expected} notification sends, saw {}",
        fake.sent_count()
    );
}
