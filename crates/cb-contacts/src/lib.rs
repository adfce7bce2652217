use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use cb_core::{db, http, logging, metrics, server};
use serde::Serialize;
use sqlx::{Pool, Postgres};
use std::sync::Arc;
use utoipa::OpenApi;

pub mod aggregator;
mod api;
pub mod backfill;
pub mod config;
pub mod merge;
pub mod payload;
pub mod signal;
pub mod source;
pub mod sources;
pub mod timestamp;


pub use aggregator::{AggregationResult, ContactAggregator, ContactsError};
pub use config::ContactsConfig;
pub use signal::{ContactFilter, ContactPoint, ContactSelection, ContactSignal, Direction};

pub(crate) const SERVICE_NAME: &str = "cb-contacts";

#[derive(Clone)]
pub(crate) struct AppState {
    aggregator: Arc<ContactAggregator>,
    default_selection: ContactSelection,
    app_pool: Pool<Postgres>,
    indexer_pool: Pool<Postgres>,
}

#[derive(Serialize, utoipa::ToSchema)]
struct HealthStatus {
    status: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
}

#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl From<ContactsError> for ApiError {
    fn from(err: ContactsError) -> Self {
        tracing::error!(error = %err, detail = ?err, "aggregation failed");
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "AGGREGATION_FAILED",
            "contacts could not be loaded",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let payload = ErrorResponse {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(payload)).into_response()
    }
}

pub(crate) type ApiResult<T> = Result<T, ApiError>;

#[derive(OpenApi)]
#[openapi(
    paths(
        healthz,
        metrics_endpoint,
        api::aggregate_contacts,
        api::list_contacts,
        api::get_contact
    ),
    components(schemas(
        HealthStatus,
        api::AggregateRequest,
        api::FilterInput,
        payload::ContactsPayload,
        payload::ContactPayload,
        payload::ContactPointPayload,
        payload::ProfilePayload
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "contacts", description = "Contact aggregation")
    )
)]
struct ApiDoc;

pub fn load_config() -> Result<ContactsConfig> {
    ContactsConfig::from_env()
}

/// Connects both databases and wires every source into an aggregator.
pub async fn connect_aggregator(
    config: &ContactsConfig,
) -> Result<(ContactAggregator, Pool<Postgres>, Pool<Postgres>)> {
    let app_pool = db::connect(&config.database_url, config.max_connections).await?;
    let indexer_pool = match &config.indexer_database_url {
        Some(url) => db::connect(url, config.max_connections).await?,
        None => app_pool.clone(),
    };

    let registry = sources::default_registry(indexer_pool.clone(), app_pool.clone());
    let profiles = Arc::new(backfill::PgProfileLookup::new(app_pool.clone()));
    Ok((
        ContactAggregator::new(registry, profiles),
        app_pool,
        indexer_pool,
    ))
}

pub async fn run(config: ContactsConfig) -> Result<()> {
    logging::init(SERVICE_NAME);
    metrics::init(SERVICE_NAME);

    let (aggregator, app_pool, indexer_pool) = connect_aggregator(&config).await?;
    tracing::info!(
        sources = ?aggregator.registry().names(),
        separate_indexer = config.indexer_database_url.is_some(),
        "contact sources ready"
    );

    let state = AppState {
        aggregator: Arc::new(aggregator),
        default_selection: config.default_selection(),
        app_pool,
        indexer_pool,
    };

    let router = http::apply_standard_layers(router(state), SERVICE_NAME);
    server::serve(config.addr, router).await
}

pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_endpoint))
        .route("/v1/openapi.json", get(openapi_json))
        .route("/v1/contacts/aggregate", post(api::aggregate_contacts))
        .route("/v1/subjects/:subject/contacts", get(api::list_contacts))
        .route(
            "/v1/subjects/:subject/contacts/:counterparty",
            get(api::get_contact),
        )
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/healthz",
    tag = "health",
    responses(
        (status = 200, description = "Ready", body = HealthStatus),
        (status = 503, description = "A database is unreachable", body = HealthStatus)
    )
)]
async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    let ready = async {
        db::check_ready(&state.app_pool).await?;
        db::check_ready(&state.indexer_pool).await?;
        Ok::<(), anyhow::Error>(())
    }
    .await;

    match ready {
        Ok(_) => (StatusCode::OK, Json(HealthStatus { status: "ok".into() })),
        Err(err) => {
            tracing::warn!(error = %err, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthStatus {
                    status: "unavailable".into(),
                }),
            )
        }
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "health",
    responses((status = 200, description = "Prometheus metrics"))
)]
async fn metrics_endpoint() -> impl IntoResponse {
    metrics::metrics_response(SERVICE_NAME)
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
