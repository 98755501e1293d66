//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use command_router::config::{ListenerConfig, RouteConfig, ServerConfig};
use command_router::http::BoundAddrs;
use command_router::{HttpServer, Shutdown};
use tokio::task::JoinHandle;

/// A running server on loopback ephemeral ports.
pub struct TestServer {
    pub addrs: BoundAddrs,
    pub client: reqwest::Client,
    shutdown: Shutdown,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    pub fn user_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addrs.user, path)
    }

    pub fn control_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addrs.control, path)
    }

    pub fn data_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addrs.data, path)
    }

    /// Trigger shutdown and wait for every listener to stop.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let result = tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked");
        result.expect("server returned an error");
    }
}

/// Config bound to 127.0.0.1:0 on every listener.
pub fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.user = ListenerConfig::new("127.0.0.1:0");
    config.control = ListenerConfig::new("127.0.0.1:0");
    config.data = ListenerConfig::new("127.0.0.1:0");
    config
}

pub fn route(method: &str, url_pattern: &str, command: &str) -> RouteConfig {
    RouteConfig {
        method: method.into(),
        url_pattern: url_pattern.into(),
        entrypoint: None,
        command: command.into(),
    }
}

/// Bind and serve `config` in the background.
pub async fn start_server(config: ServerConfig) -> TestServer {
    let server = HttpServer::bind(config).await.expect("failed to bind server");
    let addrs = server.local_addrs();
    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(shutdown.clone()));

    TestServer {
        addrs,
        client: reqwest::Client::new(),
        shutdown,
        handle,
    }
}

/// Poll until `path` exists and return its trimmed contents.
pub async fn wait_for_file(path: &Path) -> String {
    for _ in 0..200 {
        if let Ok(text) = std::fs::read_to_string(path) {
            return text.trim().to_string();
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("{} never appeared", path.display());
}
