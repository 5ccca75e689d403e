//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging, metrics and the router in dependency order
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - `AppContext` has no network side effects, so it can be built in tests
//! - Listener binds last (traffic only when ready)

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;

use crate::cli::{self, Cli};
use crate::config::loader::{self, ConfigError};
use crate::config::validation::validate_config;
use crate::config::{AppConfig, ObservabilityConfig};
use crate::error::Result;
use crate::http::{build_router, AppState, HttpServer};
use crate::lifecycle::{signals, Shutdown};
use crate::net::listener;
use crate::observability::{logging, metrics};

/// Validated configuration plus every wired component, ready to serve.
pub struct AppContext {
    config: Arc<AppConfig>,
    state: AppState,
    router: Router,
    shutdown: Shutdown,
}

impl AppContext {
    /// Build the application context.
    ///
    /// Installs the Prometheus recorder when metrics are enabled, which can
    /// only succeed once per process.
    pub fn build(config: AppConfig) -> Result<Self> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let shutdown = Shutdown::new();
        let metrics_handle = if config.observability.metrics_enabled {
            Some(metrics::install()?)
        } else {
            None
        };

        let state = AppState::new(&config, shutdown.clone(), metrics_handle);
        let router = build_router(&config, state.clone());

        tracing::info!(
            name = %config.application.name,
            environment = %config.application.environment,
            metrics_enabled = config.observability.metrics_enabled,
            "Application context initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            state,
            router,
            shutdown,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// A clone of the fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle that stops the application when triggered.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }
}

/// An application context bound to its listener.
pub struct Application {
    context: AppContext,
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl Application {
    /// Bind the configured address.
    pub async fn bind(context: AppContext) -> Result<Self> {
        let listener = listener::bind(&context.config.server).await?;
        let local_addr = listener.local_addr()?;
        Ok(Self {
            context,
            listener,
            local_addr,
        })
    }

    /// Address actually bound (differs from config when port 0 was asked for).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown_handle(&self) -> Shutdown {
        self.context.shutdown_handle()
    }

    /// Serve until the shutdown handle is triggered.
    pub async fn serve(self) -> Result<()> {
        let shutdown = self.context.shutdown_handle();
        let receiver = shutdown.subscribe();
        if shutdown.is_triggered() {
            tracing::info!("Shutdown requested before serving; not starting");
            return Ok(());
        }

        let grace = Duration::from_secs(self.context.config.server.shutdown_grace_secs);
        let server = HttpServer::new(self.context.router(), grace);
        server.run(self.listener, receiver).await?;
        Ok(())
    }

    /// Serve until SIGINT/SIGTERM or the shutdown handle is triggered.
    pub async fn run(self) -> Result<()> {
        let signal_task = signals::spawn_signal_listener(self.shutdown_handle());
        let result = self.serve().await;
        signal_task.abort();
        result
    }
}

/// Process entry: load configuration, start logging, build the context, bind
/// and serve. Returns once the service has stopped.
pub async fn run(cli: Cli) -> Result<()> {
    let sources = cli.config_sources(cli::process_env());

    let (config, report) = match loader::load_with_report(&sources) {
        Ok(loaded) => loaded,
        Err(e) => {
            logging::init(&ObservabilityConfig::default());
            return Err(e.into());
        }
    };

    logging::init(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "{} starting",
        config.application.name
    );
    match &report.file {
        Some(path) => tracing::info!(path = %path.display(), "Configuration file loaded"),
        None => tracing::info!("No configuration file found, using defaults"),
    }
    for name in &report.ignored_env {
        tracing::warn!(variable = %name, "Ignoring unknown environment setting");
    }

    let context = AppContext::build(config)?;
    let app = Application::bind(context).await?;
    tracing::info!(address = %app.local_addr(), "Listening for connections");

    app.run().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
