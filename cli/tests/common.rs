//! # RagChat CLI Integration Test Common Helpers
//!
//! File: cli/tests/common.rs
//!
//! ## Overview
//!
//! Shared helpers for the integration tests. Each test gets a [`TestEnv`]: a
//! temporary directory holding a configuration file and a SQLite store, and a
//! way to run the `ragchat` binary against them with a clean environment.
//!

// Different test files use different helpers.
#![allow(dead_code)]

pub use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Collection the seeding config writes exchange-shaped documents into. It is
/// the history collection of the default config.
pub const HISTORY_COLLECTION: &str = "chats";

/// Returns a command for the compiled `ragchat` binary.
pub fn ragchat_cmd() -> Command {
    Command::cargo_bin("ragchat").expect("Failed to find ragchat binary for testing")
}

/// A throwaway workspace: config files plus a store path.
pub struct TestEnv {
    dir: TempDir,
    config: PathBuf,
    seed_config: PathBuf,
    store: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_config("")
    }

    /// `extra` is appended to the main configuration file.
    pub fn with_config(extra: &str) -> Self {
        Self::build("http://127.0.0.1:9", extra)
    }

    /// Sends model requests to `base_url`.
    pub fn with_model(base_url: &str) -> Self {
        Self::build(base_url, "")
    }

    fn build(base_url: &str, extra: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let config = dir.path().join("ragchat.toml");
        fs::write(
            &config,
            format!("[model]\nbase_url = \"{}\"\n{}", base_url, extra),
        )
        .expect("Failed to write config");

        // Points `records add` at the history collection, keyed by owner, so
        // tests can seed exchanges without a model.
        let seed_config = dir.path().join("seed.toml");
        fs::write(
            &seed_config,
            format!(
                "[store]\nrecords_collection = \"{}\"\nhistory_collection = \"unused\"\n\
                 [retrieval]\nname_field = \"owner\"\n",
                HISTORY_COLLECTION
            ),
        )
        .expect("Failed to write seed config");

        let store = dir.path().join("data").join("ragchat.db");
        Self {
            dir,
            config,
            seed_config,
            store,
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `ragchat` with this environment's config and store and nothing inherited
    /// from the caller's identity, key or log settings.
    pub fn cmd(&self) -> Command {
        self.cmd_with_config(&self.config)
    }

    fn cmd_with_config(&self, config: &Path) -> Command {
        let mut cmd = ragchat_cmd();
        cmd.current_dir(self.dir.path())
            .env_remove("RAGCHAT_USER")
            .env_remove("GEMINI_API_KEY")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(config)
            .arg("--store")
            .arg(&self.store);
        cmd
    }

    /// Adds an entity record.
    pub fn add_record(&self, json: &str) {
        self.cmd().args(["records", "add", json]).assert().success();
    }

    /// Stores an exchange directly, bypassing the model.
    pub fn seed_exchange(&self, owner: &str, question: &str, created_at: &str) {
        let document = serde_json::json!({
            "owner": owner,
            "role": "standard",
            "question": question,
            "answer": format!("answer to {}", question),
            "created_at": created_at,
        });
        self.cmd_with_config(&self.seed_config)
            .args(["records", "add", &document.to_string()])
            .assert()
            .success();
    }
}

/// A local stand-in for the model API. Answers every request with the same
/// `generateContent` payload and keeps the raw requests.
pub struct ModelStub {
    base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ModelStub {
    /// Starts serving on a free local port, on a background thread.
    pub fn answering(answer: &str) -> Self {
        let body = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": answer }] } }]
        })
        .to_string();
        let std_listener =
            std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind model stub");
        std_listener
            .set_nonblocking(true)
            .expect("Failed to configure model stub");
        let base_url = format!("http://{}", std_listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("Failed to start model stub runtime");
            runtime.block_on(async move {
                let listener = TcpListener::from_std(std_listener).unwrap();
                loop {
                    let Ok((mut stream, _)) = listener.accept().await else {
                        break;
                    };
                    let request = read_request(&mut stream).await;
                    seen.lock().unwrap().push(request);
                    let response = format!(
                        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                }
            });
        });

        Self { base_url, requests }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Raw HTTP requests received so far.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .to_ascii_lowercase()
                .lines()
                .find_map(|l| l.strip_prefix("content-length:").map(str::to_string))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
