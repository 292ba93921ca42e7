//! HTTP server for the gateway tool surface.
//!
//! Exposes schema discovery (`GET /api/tools`) and invocation
//! (`POST /api/tools/{name}`), plus health and status endpoints.
//! Every request passes the X-API-Key check; when no key is configured
//! all requests are allowed, matching a development deployment.

use anyhow::Result;
use axum::{
    Router,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::config::Config;
use crate::gateway::Gateway;
use crate::tools::{Tool, ToolSchema, create_gateway_tools};

pub struct Server {
    config: Config,
}

struct AppState {
    tools: Vec<Box<dyn Tool>>,
    api_key: Option<String>,
}

impl Server {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
        })
    }

    pub async fn run(&self) -> Result<()> {
        let protected = self.config.protected_file_path();
        let state_dir = self.config.paths.state_dir.clone();

        info!(
            "Guarding protected file: {} (basename match, case-insensitive)",
            protected.display()
        );

        let gateway = Arc::new(Gateway::new(protected, state_dir));

        let state = Arc::new(AppState {
            tools: create_gateway_tools(gateway),
            api_key: self.config.server.api_key.clone(),
        });

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let app = Router::new()
            .route("/health", get(health_check))
            .route("/api/status", get(status))
            .route("/api/tools", get(list_tools))
            .route("/api/tools/{name}", post(invoke_tool))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                require_api_key,
            ))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr: SocketAddr =
            format!("{}:{}", self.config.server.bind, self.config.server.port).parse()?;

        info!("Starting HTTP server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }
}

// Error response type
struct AppError(StatusCode, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.0, self.1).into_response()
    }
}

/// One equality check against the configured key. A missing
/// configuration allows everything.
fn key_allows(expected: Option<&str>, provided: Option<&str>) -> bool {
    match expected {
        None => true,
        Some(expected) => provided == Some(expected),
    }
}

async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok());

    if !key_allows(state.api_key.as_deref(), provided) {
        return AppError(StatusCode::UNAUTHORIZED, "Invalid API Key".to_string()).into_response();
    }

    next.run(request).await
}

// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// Status endpoint
#[derive(Serialize)]
struct StatusResponse {
    version: String,
    tools: usize,
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        tools: state.tools.len(),
    })
}

// Tool discovery endpoint
#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolSchema>,
}

async fn list_tools(State(state): State<Arc<AppState>>) -> Json<ToolListResponse> {
    Json(ToolListResponse {
        tools: state.tools.iter().map(|t| t.schema()).collect(),
    })
}

// Tool invocation endpoint. The body is the tool's argument object;
// the response is the structured operation outcome.
async fn invoke_tool(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(arguments): Json<Value>,
) -> Response {
    let Some(tool) = state.tools.iter().find(|t| t.name() == name) else {
        return AppError(StatusCode::NOT_FOUND, format!("Unknown tool: {}", name))
            .into_response();
    };

    debug!("Invoking tool: {}", name);

    match tool.execute(&arguments.to_string()).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => AppError(StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_configured_key_allows_all() {
        assert!(key_allows(None, None));
        assert!(key_allows(None, Some("whatever")));
    }

    #[test]
    fn configured_key_requires_exact_match() {
        assert!(key_allows(Some("sekrit"), Some("sekrit")));
        assert!(!key_allows(Some("sekrit"), Some("SEKRIT")));
        assert!(!key_allows(Some("sekrit"), Some("wrong")));
        assert!(!key_allows(Some("sekrit"), None));
    }
}
