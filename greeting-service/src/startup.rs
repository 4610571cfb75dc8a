//! Application startup and lifecycle management.

use crate::config::GreetingConfig;
use crate::handlers::{
    generate::{greeting, post_required, wish},
    index::{health_check, index, metrics, readiness_check},
    models::probe_models,
    quote::{get_quote, post_quote},
};
use crate::services::generator::Generator;
use crate::services::metrics::http_metrics_middleware;
use crate::services::providers::gemini::GeminiTextProvider;
use crate::services::providers::TextProvider;
use axum::{
    http::{header, Method},
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, RequestId};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GreetingConfig>,
    pub provider: Arc<dyn TextProvider>,
    pub generator: Arc<Generator>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: GreetingConfig, provider: Arc<dyn TextProvider>) -> Self {
        let generator = Generator::new(provider.clone(), config.generation_config());
        Self {
            config: Arc::new(config),
            provider,
            generator: Arc::new(generator),
            started_at: Instant::now(),
        }
    }
}

/// Build the HTTP router. The CORS layer answers every `OPTIONS` request
/// itself, so handlers never see pre-flights.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .route("/api", get(index))
        .route("/api/health", get(health_check))
        .route("/api/greeting", post(greeting).fallback(post_required))
        .route("/api/wish", post(wish).fallback(post_required))
        .route("/api/quote", get(get_quote).post(post_quote))
        .route("/api/models", get(probe_models))
        .layer(from_fn(http_metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .extensions()
                    .get::<RequestId>()
                    .map(RequestId::as_str)
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(cors)
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    http_listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the Gemini provider.
    pub async fn build(config: GreetingConfig) -> Result<Self, AppError> {
        let provider = GeminiTextProvider::new(config.gemini_config()).map_err(|e| {
            tracing::error!("Failed to initialize Gemini provider: {}", e);
            AppError::ConfigError(anyhow::anyhow!(e))
        })?;

        tracing::info!(
            base_url = %config.gemini.base_url,
            models = ?config.generation.model_priority,
            api_key_configured = config.has_api_key(),
            "Initialized Gemini text provider"
        );

        if !config.has_api_key() {
            tracing::warn!("GEMINI_API_KEY not set, every response will be a fallback");
        }

        Self::build_with_provider(config, Arc::new(provider)).await
    }

    /// Build the application around an existing provider.
    pub async fn build_with_provider(
        config: GreetingConfig,
        provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        // Bind HTTP listener (port 0 = random port for testing)
        let http_addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", http_addr, e);
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        tracing::info!("Greeting service: HTTP on port {}", http_port);

        Ok(Self {
            http_port,
            http_listener,
            state: AppState::new(config, provider),
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Run the application until `shutdown` completes.
    pub async fn run_until_stopped<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = build_router(self.state);

        axum::serve(self.http_listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                std::io::Error::other(format!("HTTP server error: {}", e))
            })
    }
}
