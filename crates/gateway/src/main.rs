//! DocIntel dashboard server
//!
//! Serves the browser dashboard and its JSON API:
//! - Document processing and session status
//! - Single-shot question answering
//! - The multi-agent analysis workflow and its report
//! - Observability (logging, metrics, request ids)

mod handlers;
mod middleware;
mod render;
mod state;

#[cfg(test)]
mod tests;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use docintel_common::{
    config::AppConfig,
    errors::Result,
    logging, metrics, ModelGateway,
};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use middleware::rate_limit::{rate_limit_middleware, ModelRateLimit};
use state::AppState;
use std::net::SocketAddr;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init(&config.observability);

    info!("Starting DocIntel dashboard v{}", docintel_common::VERSION);

    let metrics_handle = if config.observability.metrics_enabled {
        Some(install_metrics_recorder()?)
    } else {
        None
    };

    let models = ModelGateway::from_config(&config.llm).await.map_err(|e| {
        error!(error = %e, "Failed to initialise model provider");
        e
    })?;
    info!(provider = models.provider(), "Model provider ready");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let load_on_startup = config.documents.load_on_startup;

    let state = AppState::new(config, models);
    if load_on_startup {
        state.restore_index().await;
    }

    let app = create_router(state, metrics_handle)?;

    info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Install the Prometheus recorder behind the `metrics` facade
fn install_metrics_recorder() -> std::result::Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            metrics::MODEL_BUCKETS,
        )?
        .install_recorder()?;
    metrics::register_metrics();
    Ok(handle)
}

/// Create the main application router
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Result<Router> {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // Routes that call the model provider
    let mut model_routes = Router::new()
        .route("/documents/process", post(handlers::documents::process))
        .route("/qa/ask", post(handlers::qa::ask))
        .route("/analysis/run", post(handlers::analysis::run));

    if state.config.rate_limit.enabled {
        let limit = ModelRateLimit::from_config(&state.config.rate_limit)?;
        model_routes = model_routes.route_layer(from_fn_with_state(limit, rate_limit_middleware));
    }

    let api_routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Session endpoints
        .route("/status", get(handlers::documents::status))
        .route("/documents/reset", post(handlers::documents::reset))

        // Report endpoints
        .route("/analysis/report", get(handlers::analysis::report))
        .route("/analysis/report/download", get(handlers::analysis::download))
        .merge(model_routes);

    let mut app = Router::new()
        .route("/", get(handlers::page::index))
        .nest("/api", api_routes);

    if let Some(handle) = metrics_handle {
        app = app.route(
            "/metrics",
            get(move || {
                let handle = handle.clone();
                async move { handle.render() }
            }),
        );
    }

    Ok(app
        .layer(from_fn(middleware::metrics::track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
