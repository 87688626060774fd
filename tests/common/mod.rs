#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response},
};
use openpack_gateway::{
    AppState, Config, app_router,
    db::{DbSite, DbUser, NewUser, Storage},
};
use serde_json::Value;
use std::{
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

pub const API_TOKEN: &str = "api-secret";
pub const ADMIN_TOKEN: &str = "admin-secret";
pub const OPENPACK_TOKEN: &str = "openpack-secret";
pub const PROXY_USERNAME: &str = "dfre";

/// Router plus the temp-file database behind it; the file is removed on drop.
pub struct TestApp {
    pub app: Router,
    pub storage: Storage,
    db_path: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_path);
    }
}

pub fn test_config() -> Config {
    Config {
        api_token: API_TOKEN.to_string(),
        admin_token: ADMIN_TOKEN.to_string(),
        openpack_token: OPENPACK_TOKEN.to_string(),
        openpack_username: PROXY_USERNAME.to_string(),
        ..Config::default()
    }
}

pub async fn spawn_app(tag: &str, cfg: Config) -> TestApp {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();
    let mut db_path = std::env::temp_dir();
    db_path.push(format!(
        "openpack-{tag}-{}-{nanos}.sqlite",
        std::process::id()
    ));

    let storage = Storage::connect(&format!("sqlite:{}", db_path.display()))
        .await
        .expect("failed to open test database");
    let state = AppState::new(cfg, storage.clone()).expect("failed to build state");
    TestApp {
        app: app_router(state),
        storage,
        db_path,
    }
}

/// Insert the proxy account (vendor user `U`, vendor password `P`) linked to one site.
pub async fn seed_proxy_account(storage: &Storage, instance_url: &str) -> (DbUser, DbSite) {
    let site = storage
        .insert_site(
            "Factory".to_string(),
            instance_url.to_string(),
            "112233".to_string(),
        )
        .await
        .expect("insert site");
    let user = storage
        .insert_user(NewUser {
            username: PROXY_USERNAME.to_string(),
            ivion_username: "U".to_string(),
            ivion_password: "P".to_string(),
            hashed_password: "$argon2id$test".to_string(),
        })
        .await
        .expect("insert user");
    storage
        .link_sites(user.id, &[site.id])
        .await
        .expect("link site");
    (user, site)
}

pub fn get(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    builder.body(Body::empty()).expect("failed to build request")
}

pub fn post_json(uri: &str, authorization: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", authorization)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

pub fn token(secret: &str) -> String {
    format!("Token {secret}")
}

pub async fn body_json(resp: Response<Body>) -> Value {
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&body).expect("response body was not json")
}

pub async fn session_count(storage: &Storage) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM session")
        .fetch_one(storage.pool())
        .await
        .expect("count sessions");
    count
}
