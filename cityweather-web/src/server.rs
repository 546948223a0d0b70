use anyhow::Context;
use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use cityweather_core::{
    CityDirectory, CityRecord, HomeOutcome, PageError, WeatherProvider, pages,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::render;

/// Shared, read-only state handed to every request.
#[derive(Debug, Clone)]
pub struct AppState {
    directory: Arc<CityDirectory>,
    provider: Arc<dyn WeatherProvider>,
    default_city_id: u64,
    featured: Arc<[CityRecord]>,
}

impl AppState {
    pub fn new(
        directory: CityDirectory,
        provider: Arc<dyn WeatherProvider>,
        default_city_id: u64,
        featured_ids: &[u64],
    ) -> Self {
        if directory.lookup(default_city_id).is_none() {
            warn!(default_city_id, "default city is not in the directory");
        }

        let featured: Arc<[CityRecord]> =
            directory.featured(featured_ids).into_iter().cloned().collect();

        Self { directory: Arc::new(directory), provider, default_city_id, featured }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/city/{id}", get(city))
        .route("/health", get(health_check))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, bind: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;

    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[derive(Debug, Deserialize)]
struct HomeParams {
    q: Option<String>,
}

async fn home(State(state): State<AppState>, Query(params): Query<HomeParams>) -> Response {
    match pages::home(&state.directory, state.default_city_id, params.q.as_deref()) {
        HomeOutcome::Redirect(city_id) => Redirect::to(&format!("/city/{city_id}")).into_response(),
        HomeOutcome::Results { query, cities } => {
            Html(render::search_page(&state.featured, &query, &cities)).into_response()
        }
    }
}

async fn city(State(state): State<AppState>, Path(raw_id): Path<String>) -> Response {
    match pages::city_forecast(&state.directory, state.provider.as_ref(), &raw_id).await {
        Ok(page) => Html(render::city_page(&state.featured, &page)).into_response(),
        Err(err) => error_response(&state, err),
    }
}

fn error_response(state: &AppState, err: PageError) -> Response {
    let (status, message) = match &err {
        PageError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "Missing or invalid city id."),
        PageError::NotFound(_) => (StatusCode::NOT_FOUND, "No city with that id."),
        PageError::Upstream(source) => {
            error!("Forecast request failed: {source:#}");
            (StatusCode::BAD_GATEWAY, "The weather service is unavailable right now.")
        }
    };

    if status.is_client_error() {
        info!(status = status.as_u16(), "{err}");
    }

    (status, Html(render::error_page(&state.featured, status, message))).into_response()
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn not_found(State(state): State<AppState>) -> Response {
    let status = StatusCode::NOT_FOUND;
    (status, Html(render::error_page(&state.featured, status, "Page not found."))).into_response()
}
