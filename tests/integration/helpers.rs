//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tokio::sync::Mutex;
use tower::ServiceExt;

use modhub_core::config::{AppConfig, PluginConfig};
use modhub_core::result::AppResult;
use modhub_database::{MemoryPluginRepository, PluginRepository};
use modhub_plugin::{CommandOutput, CommandRunner, EventDispatcher, PluginInstaller, PluginStore};

/// Records every command instead of spawning it.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    pub calls: Mutex<Vec<String>>,
    pub exit_code: AtomicI32,
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[String], _cwd: &Path) -> AppResult<CommandOutput> {
        self.calls
            .lock()
            .await
            .push(format!("{program} {}", args.join(" ")));
        let code = self.exit_code.load(Ordering::SeqCst);
        Ok(CommandOutput {
            status: Some(code),
            stdout: String::new(),
            stderr: if code == 0 { String::new() } else { "command failed".to_string() },
        })
    }
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Temporary application root
    pub dir: TempDir,
    /// Persisted plugin state
    pub repo: Arc<MemoryPluginRepository>,
    /// Installer commands issued so far
    pub runner: Arc<RecordingRunner>,
}

impl TestApp {
    /// Create a test application with an empty plugins directory
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::create_dir_all(dir.path().join("plugins")).expect("Failed to create plugins dir");
        std::fs::write(
            dir.path().join("composer.json"),
            "{\n    \"name\": \"acme/app\",\n    \"autoload\": {\n        \"psr-4\": {\n            \"App\\\\\": \"app/\"\n        }\n    }\n}\n",
        )
        .expect("Failed to write composer.json");

        let mut config = AppConfig::default();
        config.plugins = PluginConfig {
            app_root: dir.path().to_string_lossy().into_owned(),
            ..PluginConfig::default()
        };

        let repo = Arc::new(MemoryPluginRepository::new());
        let runner = Arc::new(RecordingRunner::default());

        let repository: Arc<dyn PluginRepository> = repo.clone();
        let store = PluginStore::from_config(
            &config.plugins,
            Some(repository),
            Arc::new(EventDispatcher::default()),
        );
        let installer = PluginInstaller::new(runner.clone(), &config.plugins);

        let state = modhub_api::AppState::new(config, store, installer, None);
        let router = modhub_api::build_router(state);

        Self {
            router,
            dir,
            repo,
            runner,
        }
    }

    /// Write `plugins/<name>/module.json`
    pub fn add_plugin(&self, name: &str, manifest: Value) {
        let path = self.dir.path().join("plugins").join(name);
        std::fs::create_dir_all(&path).expect("Failed to create plugin dir");
        std::fs::write(path.join("module.json"), manifest.to_string())
            .expect("Failed to write manifest");
    }

    pub fn composer_path(&self) -> PathBuf {
        self.dir.path().join("composer.json")
    }

    pub fn composer_text(&self) -> String {
        std::fs::read_to_string(self.composer_path()).expect("Failed to read composer.json")
    }

    pub fn composer(&self) -> Value {
        serde_json::from_str(&self.composer_text()).expect("composer.json is not JSON")
    }

    /// Make an HTTP request to the test app
    pub async fn request(&self, method: &str, path: &str) -> TestResponse {
        let req = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}
