#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    missing_debug_implementations,
    clippy::clone_on_ref_ptr,
    unreachable_pub,
    dead_code
)]

use clap::Parser;
use printdrop_server::api::{MgmtState, app_router, mgmt_router};
use printdrop_server::config::Config;
use printdrop_server::domain::document::Document;
use printdrop_server::print::PrintDispatcher;
use printdrop_server::services::document_service::DocumentService;
use printdrop_server::services::extract::Utf8Extractor;
use printdrop_server::services::health_service::HealthService;
use printdrop_server::storage;
use printdrop_server::storage::document_repo::DocumentRepository;
use std::sync::Arc;
use std::sync::Once;
use time::{Duration, OffsetDateTime};

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("printdrop_server=debug".parse().unwrap())
            .add_directive("sqlx=warn".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

pub struct TestApp {
    pub server_url: String,
    pub mgmt_url: String,
    pub client: reqwest::Client,
    pub config: Config,
    pub repo: DocumentRepository,
    pub document_service: DocumentService,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    /// Boots the full app against a fresh in-memory database on ephemeral
    /// ports. `mutate` can adjust the config before wiring.
    pub async fn spawn_with(mutate: impl FnOnce(&mut Config)) -> Self {
        setup_tracing();

        let mut config = Config::parse_from(["printdrop-server"]);
        config.database_url = "sqlite::memory:".to_string();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.server.mgmt_port = 0;
        mutate(&mut config);

        let pool = storage::init_pool(&config.database_url).await.expect("Failed to open in-memory database");
        storage::init_schema(&pool).await.expect("Failed to bootstrap schema");

        let repo = DocumentRepository::new(pool.clone());
        let dispatcher = PrintDispatcher::new(config.print.clone());
        let document_service =
            DocumentService::new(repo.clone(), Arc::new(Utf8Extractor), dispatcher, config.store.clone());
        let health_service = HealthService::new(pool, config.health.clone());

        let app = app_router(config.clone(), document_service.clone());
        let mgmt = mgmt_router(MgmtState { health_service });

        let api_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let api_addr = api_listener.local_addr().unwrap();
        let _ = tokio::spawn(async move {
            axum::serve(api_listener, app).await.unwrap();
        });

        let mgmt_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mgmt_addr = mgmt_listener.local_addr().unwrap();
        let _ = tokio::spawn(async move {
            axum::serve(mgmt_listener, mgmt).await.unwrap();
        });

        Self {
            server_url: format!("http://{api_addr}"),
            mgmt_url: format!("http://{mgmt_addr}"),
            client: reqwest::Client::new(),
            config,
            repo,
            document_service,
        }
    }

    /// Uploads a document and returns its code.
    pub async fn upload(&self, filename: &str, body: &'static [u8], ttl_minutes: i64) -> String {
        let resp = self
            .client
            .post(format!("{}/v1/documents?filename={filename}&ttl_minutes={ttl_minutes}", self.server_url))
            .body(body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201, "upload failed");
        let json: serde_json::Value = resp.json().await.unwrap();
        json["code"].as_str().unwrap().to_string()
    }

    /// Inserts a record directly through the repository, bypassing the
    /// service, so tests can plant documents with arbitrary expiry instants.
    pub async fn insert_document(&self, code: &str, expires_in: Duration) -> Document {
        let now = OffsetDateTime::from_unix_timestamp(OffsetDateTime::now_utc().unix_timestamp()).unwrap();
        let document = Document {
            code: code.to_string(),
            filename: "planted.txt".to_string(),
            content: b"planted content".to_vec(),
            extracted_text: "planted content".to_string(),
            created_at: now,
            ttl_minutes: 1,
            expires_at: now + expires_in,
        };
        self.repo.insert(&document).await.expect("Failed to plant document");
        document
    }
}

/// Writes an executable stub shell script into `dir` and returns its path.
/// Print tests use these in place of the real lp / shell / fallback programs.
#[cfg(unix)]
pub fn write_stub_script(dir: &tempfile::TempDir, name: &str, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.path().join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path.display().to_string()
}
