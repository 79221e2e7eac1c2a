//! # Reactor Node
//!
//! Reactor service binary with the endpoints other instances call.

use std::net::SocketAddr;

use axum::{
    routing::{get, post},
    Router,
};
use reactor_core::ReactorConfig;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

mod api;
mod state;

use state::AppState;

/// Install the global subscriber. `RUST_LOG` wins over the debug flag.
fn init_tracing(config: &ReactorConfig) -> anyhow::Result<()> {
    let level = if config.is_debug() {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Run the Reactor node server.
pub async fn run_server(config: ReactorConfig) -> anyhow::Result<()> {
    init_tracing(&config)?;

    info!(
        app = %config.app_name,
        version = %config.app_version,
        deployment = ?config.deployment,
        profiling = config.is_profiling(),
        "Reactor node starting"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = create_router(AppState::new(config));

    info!("Listening on http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the API router.
fn create_router(state: AppState) -> Router {
    let base = state.config.base_path.clone();

    Router::new()
        // Health check
        .route("/health", get(api::health::health_check))

        // Dispatch targets
        .route(&format!("{}/atom/:symbol", base), get(api::element::atom))
        .route(&format!("{}/orbit/:orbit", base), get(api::element::orbit))

        // Plan execution
        .route(&format!("{}/plan", base), post(api::plan::execute_plan))

        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ReactorConfig::from_env()?;
    run_server(config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use reactor_core::{Deployment, ReactorError, Result};
    use reactor_plan::{Dispatcher, ExecContext, Transport};
    use serde_json::{json, Value};

    #[derive(Default)]
    struct RecordingTransport {
        urls: Mutex<Vec<String>>,
        unreachable: bool,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn get(&self, url: &str, _ctx: &ExecContext) -> Result<()> {
            self.urls.lock().unwrap().push(url.to_string());
            if self.unreachable {
                return Err(ReactorError::Transport("connection refused".to_string()));
            }
            Ok(())
        }
    }

    fn server() -> (TestServer, Arc<RecordingTransport>) {
        server_with(RecordingTransport::default())
    }

    fn server_with(transport: RecordingTransport) -> (TestServer, Arc<RecordingTransport>) {
        let config = ReactorConfig {
            port: 8080,
            deployment: Deployment::Local,
            ..ReactorConfig::default()
        };
        let transport = Arc::new(transport);
        let dispatcher = Dispatcher::new(Arc::new(config), transport.clone());
        let app = create_router(AppState::with_dispatcher(dispatcher));
        (TestServer::new(app).unwrap(), transport)
    }

    #[tokio::test]
    async fn test_health() {
        let (server, _) = server();
        let response = server.get("/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["app"], "reactor");
    }

    #[tokio::test]
    async fn test_atom_endpoint() {
        let (server, _) = server();
        let response = server.get("/rr/atom/H?symbol=H,extra").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["symbol"], "H");
        assert_eq!(body["payload"], "H,extra");
    }

    #[tokio::test]
    async fn test_orbit_endpoint_keeps_molecule_verbatim() {
        let (server, _) = server();
        let response = server.get("/rr/orbit/inf?molecule=2H+O").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["orbit"], "inf");
        assert_eq!(body["molecule"], "2H+O");
        assert_eq!(body["max_orbit"], 5);
    }

    #[tokio::test]
    async fn test_atom_endpoint_decodes_escapes() {
        let (server, _) = server();
        let response = server.get("/rr/atom/H?symbol=H%2Cx").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["payload"], "H,x");
    }

    #[tokio::test]
    async fn test_execute_plan() {
        let (server, transport) = server();
        let request = json!({
            "plan": {
                "kind": "operator",
                "combinator": "+",
                "left": { "kind": "block", "times": 2, "mode": "p", "target": "H,extra" },
                "right": { "kind": "block", "times": 1, "mode": "s", "target": "2H+O" }
            }
        });

        let response = server.post("/rr/plan").json(&request).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["plan"], "2p[H,extra]+1s[2H+O]");
        assert_eq!(body["dispatches"], 3);

        let urls = transport.urls.lock().unwrap();
        assert_eq!(urls.len(), 3);
        assert_eq!(urls[2], "http://localhost:8080/rr/orbit/inf?molecule=2H+O");
    }

    #[tokio::test]
    async fn test_execute_plan_rejects_unknown_mode() {
        let (server, transport) = server();
        let request = json!({
            "plan": {
                "kind": "operator",
                "combinator": "+",
                "left": { "kind": "block", "times": 2, "mode": "s", "target": "H" },
                "right": { "kind": "block", "times": 1, "mode": "x", "target": "O" }
            }
        });

        let response = server.post("/rr/plan").json(&request).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert!(transport.urls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_execute_plan_with_unreachable_targets_succeeds() {
        let (server, transport) = server_with(RecordingTransport {
            unreachable: true,
            ..RecordingTransport::default()
        });
        let request = json!({
            "plan": { "kind": "block", "times": 3, "mode": "p", "target": "H" }
        });

        let response = server.post("/rr/plan").json(&request).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["dispatches"], 3);
        assert_eq!(transport.urls.lock().unwrap().len(), 3);
    }
}
