//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use address_ws::config::AppConfig;
use address_ws::{AppContext, Application, Shutdown, StartupError};
use tokio::task::JoinHandle;

/// Default configuration bound to an OS-assigned loopback port.
pub fn local_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.bind_address = "127.0.0.1:0".to_string();
    config.server.shutdown_grace_secs = 1;
    config
}

/// A running application and the handles needed to stop it.
pub struct RunningApp {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), StartupError>>,
}

impl RunningApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server task to finish.
    pub async fn stop(self) -> Result<(), StartupError> {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("application did not stop in time")
            .expect("application task panicked")
    }
}

/// Build, bind and serve `config` in the background.
pub async fn spawn_app(config: AppConfig) -> RunningApp {
    let context = AppContext::build(config).expect("context should build");
    let app = Application::bind(context).await.expect("listener should bind");
    let addr = app.local_addr();
    let shutdown = app.shutdown_handle();
    let handle = tokio::spawn(app.serve());

    RunningApp {
        addr,
        shutdown,
        handle,
    }
}

/// Client that never reuses connections, so shutdown is not held up.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
