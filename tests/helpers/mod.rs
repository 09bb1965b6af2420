use std::net::TcpListener;

use chirpy::auth::{PasswordHasher, TokenService};
use chirpy::configuration::{JwtSettings, PolkaSettings};
use chirpy::database::Database;
use chirpy::startup::run;
use serde_json::{json, Value};
use tempfile::TempDir;

pub const POLKA_KEY: &str = "f271c81ff7084ee5b99a5091b42d486e";

#[allow(dead_code)]
pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub tokens: TokenService,
    // Keeps the store file and static root alive for the test
    pub dir: TempDir,
}

#[allow(dead_code)]
pub struct LoggedInUser {
    pub id: u64,
    pub token: String,
    pub refresh_token: String,
}

pub fn jwt_settings() -> JwtSettings {
    JwtSettings {
        secret: "integration-test-secret-of-decent-length".to_string(),
        access_token_expiry: 3600,
        refresh_token_expiry: 5_184_000,
        leeway: 0,
    }
}

pub fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let static_root = dir.path().join("public");
    std::fs::create_dir(&static_root).expect("Failed to create static root");
    std::fs::write(static_root.join("index.html"), "<h1>Welcome to Chirpy</h1>")
        .expect("Failed to write index.html");

    let db = Database::open(dir.path().join("database.json"), PasswordHasher::new(4))
        .expect("Failed to open database");
    let tokens = TokenService::new(&jwt_settings()).expect("Failed to build token service");

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let server = run(
        listener,
        db,
        tokens.clone(),
        PolkaSettings {
            api_key: POLKA_KEY.to_string(),
        },
        static_root.to_string_lossy().to_string(),
    )
    .expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        tokens,
        dir,
    }
}

#[allow(dead_code)]
impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_user(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/users"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn register_and_login(&self, email: &str) -> LoggedInUser {
        let response = self.post_user(email, "04234").await;
        assert_eq!(201, response.status().as_u16());

        let body: Value = self
            .login(email, "04234")
            .await
            .json()
            .await
            .expect("Failed to parse response");

        LoggedInUser {
            id: body["id"].as_u64().expect("Missing id"),
            token: body["token"].as_str().expect("Missing token").to_string(),
            refresh_token: body["refresh_token"]
                .as_str()
                .expect("Missing refresh token")
                .to_string(),
        }
    }

    pub async fn post_chirp(&self, token: &str, body: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/chirps"))
            .bearer_auth(token)
            .json(&json!({ "body": body }))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}
