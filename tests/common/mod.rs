#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use uuid::Uuid;

use clipstack_api::auth::{encode_with_secret, Claims};
use clipstack_api::authz::Role;

/// Signing secret handed to the spawned server
pub const JWT_SECRET: &str = "integration-test-secret";
pub const WEBHOOK_SECRET: &str = "integration-webhook-secret";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_clipstack-api"));
        cmd.env("API_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("JWT_SECRET", JWT_SECRET)
            .env("VIDEO_WEBHOOK_SECRET", WEBHOOK_SECRET)
            .env("RUST_LOG", "clipstack_api=warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // DATABASE_URL is inherited; without it the server still serves every DB-independent path
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                let status = resp.status();
                if status == StatusCode::OK || status == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

pub fn member_token(role: Role) -> Result<String> {
    let claims = Claims::for_member(Uuid::new_v4(), Uuid::new_v4(), "member@example.com", role);
    Ok(encode_with_secret(&claims, JWT_SECRET)?)
}

pub fn internal_token() -> Result<String> {
    let claims = Claims::for_internal(Uuid::new_v4(), "staff@example.com");
    Ok(encode_with_secret(&claims, JWT_SECRET)?)
}

/// Assert the error envelope shape and return its `code`
pub async fn error_code(res: reqwest::Response) -> Result<String> {
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["success"], false, "unexpected body: {}", body);
    assert!(body["error"].is_string(), "missing error message: {}", body);
    Ok(body["code"].as_str().unwrap_or_default().to_string())
}

/// DB-backed tests run only when `DATABASE_URL` reaches a Postgres the spawned
/// server can use. Migrations are applied from the test process first.
pub async fn database_ready() -> Result<bool> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.is_empty() => url,
        _ => {
            eprintln!("DATABASE_URL not set; skipping database test");
            return Ok(false);
        }
    };

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .context("DATABASE_URL is set but unreachable")?;
    clipstack_api::database::MIGRATOR.run(&pool).await?;
    pool.close().await;

    let server = ensure_server().await?;
    let res = reqwest::get(server.url("/health")).await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "server reports database unhealthy");
    Ok(true)
}

/// Organization provisioned through the internal API, with a token for its owner
pub struct SeededOrg {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_token: String,
}

pub async fn seed_org(plan: &str) -> Result<SeededOrg> {
    let server = ensure_server().await?;
    let tag = Uuid::new_v4().simple().to_string();
    let slug = format!("test-{}", &tag[..12]);
    let owner_email = format!("owner-{}@example.com", &tag[..12]);

    let res = reqwest::Client::new()
        .post(server.url("/api/internal/organizations"))
        .bearer_auth(internal_token()?)
        .json(&serde_json::json!({
            "name": format!("Org {}", &tag[..6]),
            "slug": slug,
            "plan": plan,
            "owner_email": owner_email,
        }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "seed failed: {}", res.status());

    let body: serde_json::Value = res.json().await?;
    let id = parse_id(&body["data"]["organization"]["id"])?;
    let owner_id = parse_id(&body["data"]["owner"]["id"])?;
    let claims = Claims::for_member(owner_id, id, owner_email, Role::Owner);
    Ok(SeededOrg {
        id,
        owner_id,
        owner_token: encode_with_secret(&claims, JWT_SECRET)?,
    })
}

/// Invite someone with `role` and accept on their behalf; returns (user id, session token)
pub async fn add_member(org: &SeededOrg, role: &str) -> Result<(Uuid, String)> {
    let server = ensure_server().await?;
    let client = reqwest::Client::new();
    let email = format!("{}-{}@example.com", role, &Uuid::new_v4().simple().to_string()[..12]);

    let res = client
        .post(server.url("/api/invites"))
        .bearer_auth(&org.owner_token)
        .json(&serde_json::json!({"email": email, "role": role}))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "invite failed: {}", res.status());
    let body: serde_json::Value = res.json().await?;
    let invite_token = body["data"]["token"].as_str().context("invite token")?.to_string();

    let res = client
        .post(server.url(&format!("/invites/{}/accept", invite_token)))
        .json(&serde_json::json!({"name": "Test Member"}))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "accept failed: {}", res.status());
    let body: serde_json::Value = res.json().await?;
    let user_id = parse_id(&body["data"]["user"]["id"])?;
    let token = body["data"]["token"].as_str().context("session token")?.to_string();
    Ok((user_id, token))
}

/// `data` of a success envelope, after checking the status
pub async fn expect_data(res: reqwest::Response, status: StatusCode) -> Result<serde_json::Value> {
    let actual = res.status();
    let body: serde_json::Value = res.json().await?;
    anyhow::ensure!(actual == status, "expected {}, got {}: {}", status, actual, body);
    Ok(body["data"].clone())
}

pub fn parse_id(value: &serde_json::Value) -> Result<Uuid> {
    let raw = value.as_str().context("id is not a string")?;
    Ok(Uuid::parse_str(raw)?)
}
