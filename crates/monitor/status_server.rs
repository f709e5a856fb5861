//! Read-only HTTP view over the snapshot cache.
//!
//! - `GET /health`: 200 with the age of the snapshot, 503 before the first successful cycle
//! - `GET /api/v1/summary`
//! - `GET /api/v1/validators`: active validators sorted by moniker, with their uptime band
//! - `GET /api/v1/validators/{operator_address}`: any validator, address matched
//!   case-insensitively

use crate::cache::{CachedSnapshot, SnapshotCache};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Serialize;
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use valwatch_common::{BondStatus, Summary, UptimeBand, ValidatorSnapshotEntry};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub last_updated: u64,
    pub age_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    #[serde(flatten)]
    pub summary: Summary,
    pub last_updated: u64,
}

#[derive(Debug, Serialize)]
pub struct ValidatorView {
    pub operator_address: String,
    pub moniker: String,
    pub uptime_percent: f64,
    pub uptime_band: Option<UptimeBand>,
    pub status: BondStatus,
    pub jailed: bool,
    pub commission: f64,
}

impl ValidatorView {
    fn new(operator_address: &str, entry: &ValidatorSnapshotEntry) -> Self {
        Self {
            operator_address: operator_address.to_owned(),
            moniker: entry.moniker.clone(),
            uptime_percent: entry.uptime_percent,
            uptime_band: entry.uptime_band(),
            status: entry.status,
            jailed: entry.jailed,
            commission: entry.commission,
        }
    }
}

type ApiError = (StatusCode, String);

pub fn router(cache: SnapshotCache) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/api/v1/summary", get(handle_summary))
        .route("/api/v1/validators", get(handle_validators))
        .route(
            "/api/v1/validators/{operator_address}",
            get(handle_validator),
        )
        .with_state(cache)
}

/// Serves the status API on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    cache: SnapshotCache,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Starting status server at {addr}");
    }
    axum::serve(listener, router(cache))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

fn current(cache: &SnapshotCache) -> Result<Arc<CachedSnapshot>, ApiError> {
    cache.get().ok_or((
        StatusCode::SERVICE_UNAVAILABLE,
        "no successful poll cycle yet".to_owned(),
    ))
}

fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

async fn handle_health(State(cache): State<SnapshotCache>) -> Result<Json<HealthResponse>, ApiError> {
    let cached = current(&cache)?;
    let age_seconds = SystemTime::now()
        .duration_since(cached.last_updated)
        .map(|age| age.as_secs())
        .unwrap_or(0);

    Ok(Json(HealthResponse {
        status: "ok",
        last_updated: unix_seconds(cached.last_updated),
        age_seconds,
    }))
}

async fn handle_summary(State(cache): State<SnapshotCache>) -> Result<Json<SummaryResponse>, ApiError> {
    let cached = current(&cache)?;
    Ok(Json(SummaryResponse {
        summary: cached.summary(),
        last_updated: unix_seconds(cached.last_updated),
    }))
}

async fn handle_validators(
    State(cache): State<SnapshotCache>,
) -> Result<Json<Vec<ValidatorView>>, ApiError> {
    let cached = current(&cache)?;
    let mut views: Vec<ValidatorView> = cached
        .snapshot
        .iter()
        .filter(|(_, entry)| entry.is_active())
        .map(|(address, entry)| ValidatorView::new(address, entry))
        .collect();
    views.sort_by_cached_key(|view| view.moniker.to_lowercase());
    Ok(Json(views))
}

async fn handle_validator(
    State(cache): State<SnapshotCache>,
    Path(operator_address): Path<String>,
) -> Result<Json<ValidatorView>, ApiError> {
    let cached = current(&cache)?;
    cached
        .snapshot
        .iter()
        .find(|(address, _)| address.eq_ignore_ascii_case(&operator_address))
        .map(|(address, entry)| Json(ValidatorView::new(address, entry)))
        .ok_or((
            StatusCode::NOT_FOUND,
            format!("unknown validator {operator_address}"),
        ))
}
