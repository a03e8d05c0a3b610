use std::net::SocketAddr;
use std::num::{NonZeroU32, NonZeroUsize};
use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use claim_messages_client::{ClaimsApiConfig, ClaimsDataClient};
use claim_messages_core::{
    AggregationResult, EngineConfig, MessageAggregationEngine, MessageType, PaginationConfig,
    ResolverConfig, UpstreamError, DEFAULT_PAGE_SIZE,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const SERVICE_CONTRACT_VERSION: &str = "service.v1";
const OPENAPI_YAML: &str = include_str!("../../../openapi/openapi.yaml");

type Engine = MessageAggregationEngine<ClaimsDataClient, ClaimsDataClient>;

#[derive(Debug, Clone)]
struct ServiceState {
    engine: Arc<Engine>,
    default_page_size: NonZeroU32,
}

#[derive(Debug, Clone, Serialize)]
struct ServiceEnvelope<T>
where
    T: Serialize,
{
    service_contract_version: &'static str,
    data: T,
}

#[derive(Debug, Clone, Serialize)]
struct ServiceError {
    #[serde(skip)]
    status: StatusCode,
    service_contract_version: &'static str,
    error: String,
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct MessagesParams {
    claim_id: Option<Uuid>,
    #[serde(rename = "type")]
    message_type: Option<String>,
    page: Option<i32>,
    size: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct PageParams {
    page: Option<i32>,
    size: Option<i32>,
}

#[derive(Debug, Parser)]
#[command(name = "claim-messages-service")]
#[command(about = "Local HTTP service for bulk claim validation messages")]
struct Args {
    #[arg(long, default_value = "127.0.0.1:4020")]
    bind: SocketAddr,
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    default_page_size: NonZeroU32,
    #[arg(long, default_value_t = ResolverConfig::default().max_in_flight)]
    max_in_flight: NonZeroUsize,
    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    log: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl ServiceError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            service_contract_version: SERVICE_CONTRACT_VERSION,
            error: message.into(),
        }
    }

    fn bad_gateway(err: &UpstreamError) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            service_contract_version: SERVICE_CONTRACT_VERSION,
            error: format!("validation messages unavailable: {err}"),
        }
    }
}

impl ServiceState {
    fn new(client: ClaimsDataClient, config: EngineConfig) -> Self {
        Self {
            engine: Arc::new(MessageAggregationEngine::new(client.clone(), client, config)),
            default_page_size: config.pagination.default_page_size,
        }
    }

    fn paging(&self, page: Option<i32>, size: Option<i32>) -> (i32, i32) {
        let default_size = i32::try_from(self.default_page_size.get()).unwrap_or(i32::MAX);
        (page.unwrap_or(0), size.unwrap_or(default_size))
    }
}

fn envelope<T>(data: T) -> ServiceEnvelope<T>
where
    T: Serialize,
{
    ServiceEnvelope { service_contract_version: SERVICE_CONTRACT_VERSION, data }
}

fn upstream_failure(submission_id: Uuid) -> impl FnOnce(UpstreamError) -> ServiceError {
    move |err| {
        error!(
            %submission_id,
            status = ?err.status(),
            error = %err,
            "validation message fetch failed"
        );
        ServiceError::bad_gateway(&err)
    }
}

fn app(state: ServiceState) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/openapi", get(openapi))
        .route("/v1/submissions/:submission_id/messages", get(submission_messages))
        .route("/v1/submissions/:submission_id/errors", get(submission_errors))
        .route("/v1/submissions/:submission_id/claims/:claim_id/warnings", get(claim_warnings))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let client = ClaimsDataClient::new(&ClaimsApiConfig::from_env()?)?;
    let config = EngineConfig {
        pagination: PaginationConfig { default_page_size: args.default_page_size },
        resolver: ResolverConfig { max_in_flight: args.max_in_flight },
    };
    info!(
        bind = %args.bind,
        upstream = client.base_url(),
        default_page_size = args.default_page_size.get(),
        max_in_flight = args.max_in_flight.get(),
        "starting claim messages service"
    );

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    axum::serve(listener, app(ServiceState::new(client, config))).await?;
    Ok(())
}

async fn health() -> Json<ServiceEnvelope<HealthResponse>> {
    Json(envelope(HealthResponse { status: "ok" }))
}

async fn openapi() -> impl IntoResponse {
    (StatusCode::OK, [("content-type", "application/yaml; charset=utf-8")], OPENAPI_YAML)
}

async fn submission_messages(
    State(state): State<ServiceState>,
    submission_id: Result<Path<Uuid>, PathRejection>,
    params: Result<Query<MessagesParams>, QueryRejection>,
) -> Result<Json<ServiceEnvelope<AggregationResult>>, ServiceError> {
    let Path(submission_id) =
        submission_id.map_err(|err| ServiceError::bad_request(err.body_text()))?;
    let Query(params) = params.map_err(|err| ServiceError::bad_request(err.body_text()))?;
    let message_type = match params.message_type.as_deref() {
        None => None,
        Some(raw) => Some(
            MessageType::parse(raw)
                .ok_or_else(|| ServiceError::bad_request(format!("unknown message type `{raw}`")))?,
        ),
    };
    let (page, size) = state.paging(params.page, params.size);

    let result = state
        .engine
        .build(submission_id, params.claim_id, message_type, page, size)
        .await
        .map_err(upstream_failure(submission_id))?;
    Ok(Json(envelope(result)))
}

async fn submission_errors(
    State(state): State<ServiceState>,
    submission_id: Result<Path<Uuid>, PathRejection>,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<ServiceEnvelope<AggregationResult>>, ServiceError> {
    let Path(submission_id) =
        submission_id.map_err(|err| ServiceError::bad_request(err.body_text()))?;
    let Query(params) = params.map_err(|err| ServiceError::bad_request(err.body_text()))?;
    let (page, size) = state.paging(params.page, params.size);

    let result = state
        .engine
        .build_errors(submission_id, page, size)
        .await
        .map_err(upstream_failure(submission_id))?;
    Ok(Json(envelope(result)))
}

async fn claim_warnings(
    State(state): State<ServiceState>,
    ids: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> Result<Json<ServiceEnvelope<AggregationResult>>, ServiceError> {
    let Path((submission_id, claim_id)) =
        ids.map_err(|err| ServiceError::bad_request(err.body_text()))?;

    let result = state
        .engine
        .build_all_warnings(submission_id, claim_id)
        .await
        .map_err(upstream_failure(submission_id))?;
    Ok(Json(envelope(result)))
}
