mod dto;
mod error;
mod handlers;
mod services;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::routing::{get, post};
use axum::Router;
use relay_client::AixplainClient;
use relay_config::RelayConfig;
use relay_engine::{Relay, SegmentMode};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub struct ServerState {
    pub relay: Relay,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let config = RelayConfig::from_env()?;
    let state = Arc::new(init_server_state(&config).await);
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn init_server_state(config: &RelayConfig) -> ServerState {
    let client = AixplainClient::new(config.upstream.clone());
    let pipeline = services::pipeline::load(&client).await;

    let segment_mode = match config.legacy_extraction {
        true => SegmentMode::UrlOnly,
        false => SegmentMode::UrlOrText,
    };

    let relay = Relay::new(Arc::new(client), pipeline, config.poll).with_segment_mode(segment_mode);
    ServerState { relay }
}

fn router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_LENGTH]);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                id = %uuid::Uuid::new_v4(),
                method = %req.method(),
                uri = %req.uri(),
                version = ?req.version(),
            )
        })
        .on_response(|res: &Response<Body>, latency: Duration, _span: &tracing::Span| {
            info!(
                latency = %format!("{} ms", latency.as_millis()),
                status = %res.status().as_u16(),
                "finished processing request"
            );
        });

    let api_routes = Router::new()
        .route("/api/chat", post(handlers::chat::chat))
        .route("/api/ping", get(handlers::ping))
        .layer(trace_layer)
        .layer(cors);

    Router::new()
        .merge(api_routes)
        .route("/health", get(handlers::health))
        .with_state(state)
}
