use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use apollo_core::aggregate::{
    self, DailyReport, DashboardSummary, Dimension, GroupRow, MonthlyReport, PivotTable,
    RankingRow, VendorSummary,
};
use apollo_core::domain::{normalize, DateBasis, DateRange};
use apollo_core::ingest::error::IngestError;
use apollo_core::ingest::{HttpProposalSource, ProposalSource};
use apollo_core::store::{ProposalStore, SnapshotInfo};
use apollo_core::time::br_calendar;

const DEFAULT_RANKING_LIMIT: usize = 10;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = apollo_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let source: Option<Arc<dyn ProposalSource>> = match HttpProposalSource::from_settings(&settings)
    {
        Ok(source) => Some(Arc::new(source)),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "proposals source unavailable; starting API in degraded mode");
            None
        }
    };

    let state = AppState {
        store: ProposalStore::new(),
        source,
    };

    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/proposals/refresh", post(refresh_proposals))
        .route("/proposals/status", get(proposals_status))
        .route("/reports/summary", get(get_summary))
        .route("/reports/groups/:dimension", get(get_groups))
        .route("/reports/vendors", get(get_vendors))
        .route("/reports/ranking", get(get_ranking))
        .route("/reports/daily", get(get_daily))
        .route("/reports/monthly", get(get_monthly))
        .route("/reports/daily/by-vendor", get(get_daily_by_vendor))
        .route("/reports/monthly/by-vendor", get(get_monthly_by_vendor))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    store: ProposalStore,
    source: Option<Arc<dyn ProposalSource>>,
}

#[derive(Debug, Default, Deserialize)]
struct RangeQuery {
    start: Option<String>,
    end: Option<String>,
    limit: Option<usize>,
}

impl RangeQuery {
    fn range(&self) -> Result<Option<DateRange>, StatusCode> {
        match (self.start.as_deref(), self.end.as_deref()) {
            (None, None) => Ok(None),
            (Some(start), Some(end)) => DateRange::parse(start, end)
                .map(Some)
                .map_err(|_| StatusCode::BAD_REQUEST),
            _ => Err(StatusCode::BAD_REQUEST),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PeriodQuery {
    year: Option<i32>,
    month: Option<u32>,
    basis: Option<String>,
}

impl PeriodQuery {
    fn basis(&self) -> Result<DateBasis, StatusCode> {
        match self.basis.as_deref() {
            None => Ok(DateBasis::default()),
            Some(s) => s.parse().map_err(|_| StatusCode::BAD_REQUEST),
        }
    }
}

async fn refresh_proposals(
    State(state): State<AppState>,
    Query(q): Query<RangeQuery>,
) -> Result<Json<SnapshotInfo>, StatusCode> {
    let Some(source) = &state.source else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let range = match q.range()? {
        Some(range) => range,
        None => br_calendar::resolve_month(None, None, chrono::Utc::now())
            .map_err(|e| {
                sentry_anyhow::capture_anyhow(&e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .range(),
    };

    let raws = source.fetch_proposals(&range).await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(%range, error = %e, "proposals refresh failed");
        if e.downcast_ref::<IngestError>().is_some() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    })?;

    let records = normalize(raws);
    let info = state
        .store
        .replace(records, range, source.source_name())
        .await;
    tracing::info!(%range, loaded = info.loaded, "proposal store refreshed");

    Ok(Json(info))
}

async fn proposals_status(State(state): State<AppState>) -> Json<SnapshotInfo> {
    Json(state.store.snapshot().await.info())
}

async fn get_summary(
    State(state): State<AppState>,
    Query(q): Query<RangeQuery>,
) -> Result<Json<DashboardSummary>, StatusCode> {
    let range = q.range()?;
    let snapshot = state.store.snapshot().await;
    Ok(Json(aggregate::dashboard_summary(
        &snapshot.records,
        range.as_ref(),
    )))
}

async fn get_groups(
    State(state): State<AppState>,
    Path(dimension): Path<String>,
    Query(q): Query<RangeQuery>,
) -> Result<Json<Vec<GroupRow>>, StatusCode> {
    let dimension = parse_dimension(&dimension)?;
    let range = q.range()?;
    let snapshot = state.store.snapshot().await;
    Ok(Json(aggregate::group_by_dimension(
        &snapshot.records,
        dimension,
        range.as_ref(),
    )))
}

/// Unknown dimensions are bad input (400).
fn parse_dimension(s: &str) -> Result<Dimension, StatusCode> {
    s.parse().map_err(|_| StatusCode::BAD_REQUEST)
}

async fn get_vendors(
    State(state): State<AppState>,
    Query(q): Query<RangeQuery>,
) -> Result<Json<Vec<VendorSummary>>, StatusCode> {
    let range = q.range()?;
    let snapshot = state.store.snapshot().await;
    Ok(Json(aggregate::vendor_summaries(
        &snapshot.records,
        range.as_ref(),
    )))
}

async fn get_ranking(
    State(state): State<AppState>,
    Query(q): Query<RangeQuery>,
) -> Result<Json<Vec<RankingRow>>, StatusCode> {
    let range = q.range()?;
    let limit = q.limit.unwrap_or(DEFAULT_RANKING_LIMIT);
    let snapshot = state.store.snapshot().await;
    Ok(Json(aggregate::vendor_ranking(
        &snapshot.records,
        range.as_ref(),
        limit,
    )))
}

async fn get_daily(
    State(state): State<AppState>,
    Query(q): Query<PeriodQuery>,
) -> Result<Json<DailyReport>, StatusCode> {
    let period = br_calendar::resolve_month(q.year, q.month, chrono::Utc::now())
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    let basis = q.basis()?;
    let snapshot = state.store.snapshot().await;
    Ok(Json(aggregate::daily_report(&snapshot.records, period, basis)))
}

async fn get_monthly(
    State(state): State<AppState>,
    Query(q): Query<PeriodQuery>,
) -> Result<Json<MonthlyReport>, StatusCode> {
    let year = br_calendar::resolve_year(q.year, chrono::Utc::now())
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    let basis = q.basis()?;
    let snapshot = state.store.snapshot().await;
    Ok(Json(aggregate::monthly_report(&snapshot.records, year, basis)))
}

async fn get_daily_by_vendor(
    State(state): State<AppState>,
    Query(q): Query<PeriodQuery>,
) -> Result<Json<PivotTable>, StatusCode> {
    let period = br_calendar::resolve_month(q.year, q.month, chrono::Utc::now())
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    let basis = q.basis()?;
    let snapshot = state.store.snapshot().await;
    Ok(Json(aggregate::daily_by_vendor(
        &snapshot.records,
        period,
        basis,
    )))
}

async fn get_monthly_by_vendor(
    State(state): State<AppState>,
    Query(q): Query<PeriodQuery>,
) -> Result<Json<PivotTable>, StatusCode> {
    let year = br_calendar::resolve_year(q.year, chrono::Utc::now())
        .map_err(|_| StatusCode::BAD_REQUEST)?;
    let basis = q.basis()?;
    let snapshot = state.store.snapshot().await;
    Ok(Json(aggregate::monthly_by_vendor(
        &snapshot.records,
        year,
        basis,
    )))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &apollo_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
