use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, FromRequest, Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::{
    domain::{PollRecord, Voter},
    store::VoterStore,
};


#[derive(Clone)]
pub struct AppState {
    pub store: Arc<VoterStore>,
}

#[derive(Debug)]
pub struct ApiError {
    code: &'static str,
    message: String,
    status: StatusCode,
    details: Map<String, Value>,
}

impl ApiError {
    fn new(code: &'static str, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status,
            details: Map::new(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new("invalid_request", StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", StatusCode::NOT_FOUND, message)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    details: Map<String, Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code.to_string(),
                message: self.message,
                details: self.details,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

/// Json extractor that reports rejections in the API error shape instead of
/// axum's plain-text default.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    axum::Json<T>: FromRequest<S>,
    <axum::Json<T> as FromRequest<S>>::Rejection: std::fmt::Display,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = axum::Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::invalid_request(e.to_string()))?;
        Ok(Self(value))
    }
}

pub fn build_router(store: Arc<VoterStore>) -> Router {
    let app_state = AppState { store };

    Router::new()
        .route("/health", get(health))
        .route("/voters", get(list_voters).post(create_voter))
        .route(
            "/voters/:voter_id",
            get(get_voter)
                .post(create_voter_at)
                .put(update_voter)
                .delete(delete_voter),
        )
        .route(
            "/voters/:voter_id/polls",
            get(voter_history).post(add_poll),
        )
        .route(
            "/voters/:voter_id/polls/:poll_id",
            get(get_poll).put(update_poll).delete(delete_poll),
        )
        .fallback(fallback_not_found)
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            track_api_calls,
        ))
        .layer(Extension(app_state))
}

/// Wraps every route: each request bumps the total-call counter, each
/// non-2xx outcome additionally bumps the error counter. Sitting outside
/// the router proper means 405s, unknown paths, and path-parse rejections
/// are counted too.
async fn track_api_calls(State(state): State<AppState>, req: Request, next: Next) -> Response {
    state.store.record_call();
    let res = next.run(req).await;
    if !res.status().is_success() {
        state.store.record_error();
    }
    res
}

async fn health(Extension(state): Extension<AppState>) -> Json<serde_json::Value> {
    let snap = state.store.health();
    Json(json!({
        "status": "ok",
        "version": crate::version::VERSION,
        "uptime_seconds": snap.uptime.num_seconds(),
        "total_api_calls": snap.total_calls,
        "total_error_calls": snap.error_calls,
    }))
}

async fn list_voters(Extension(state): Extension<AppState>) -> Json<Vec<Voter>> {
    Json(state.store.list_voters().await)
}

async fn create_voter(
    Extension(state): Extension<AppState>,
    ApiJson(voter): ApiJson<Voter>,
) -> (StatusCode, Json<Voter>) {
    state.store.put_voter(voter.clone()).await;
    (StatusCode::CREATED, Json(voter))
}

/// The id-addressed POST performs the same upsert as `POST /voters`, keyed
/// by the body's voter id; the path id only has to parse.
async fn create_voter_at(
    Extension(state): Extension<AppState>,
    Path(_voter_id): Path<u64>,
    ApiJson(voter): ApiJson<Voter>,
) -> (StatusCode, Json<Voter>) {
    state.store.put_voter(voter.clone()).await;
    (StatusCode::CREATED, Json(voter))
}

async fn get_voter(
    Extension(state): Extension<AppState>,
    Path(voter_id): Path<u64>,
) -> Result<Json<Voter>, ApiError> {
    let voter = state
        .store
        .get_voter(voter_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("voter not found: {voter_id}")))?;
    Ok(Json(voter))
}

async fn update_voter(
    Extension(state): Extension<AppState>,
    Path(voter_id): Path<u64>,
    ApiJson(voter): ApiJson<Voter>,
) -> Result<Json<Voter>, ApiError> {
    let voter = state
        .store
        .update_voter(voter_id, voter)
        .await
        .ok_or_else(|| ApiError::not_found(format!("voter not found: {voter_id}")))?;
    Ok(Json(voter))
}

async fn delete_voter(
    Extension(state): Extension<AppState>,
    Path(voter_id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_voter(voter_id).await {
        return Err(ApiError::not_found(format!("voter not found: {voter_id}")));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn voter_history(
    Extension(state): Extension<AppState>,
    Path(voter_id): Path<u64>,
) -> Result<Json<Vec<PollRecord>>, ApiError> {
    let history = state
        .store
        .voter_history(voter_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("voter not found: {voter_id}")))?;
    Ok(Json(history))
}

async fn get_poll(
    Extension(state): Extension<AppState>,
    Path((voter_id, poll_id)): Path<(u64, u64)>,
) -> Result<Json<PollRecord>, ApiError> {
    // A missing voter and a missing history entry are deliberately the same
    // 404 to the caller.
    let record = state.store.get_poll(voter_id, poll_id).await.ok_or_else(|| {
        ApiError::not_found(format!(
            "poll not found: voter_id={voter_id} poll_id={poll_id}"
        ))
    })?;
    Ok(Json(record))
}

async fn add_poll(
    Extension(state): Extension<AppState>,
    Path(voter_id): Path<u64>,
    ApiJson(record): ApiJson<PollRecord>,
) -> Result<(StatusCode, Json<PollRecord>), ApiError> {
    if !state.store.add_poll(voter_id, record.clone()).await {
        return Err(ApiError::not_found(format!("voter not found: {voter_id}")));
    }
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_poll(
    Extension(state): Extension<AppState>,
    Path((voter_id, poll_id)): Path<(u64, u64)>,
    ApiJson(record): ApiJson<PollRecord>,
) -> Result<Json<PollRecord>, ApiError> {
    let record = state
        .store
        .update_poll(voter_id, poll_id, record)
        .await
        .ok_or_else(|| {
            ApiError::not_found(format!(
                "poll not found: voter_id={voter_id} poll_id={poll_id}"
            ))
        })?;
    Ok(Json(record))
}

async fn delete_poll(
    Extension(state): Extension<AppState>,
    Path((voter_id, poll_id)): Path<(u64, u64)>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete_poll(voter_id, poll_id).await {
        return Err(ApiError::not_found(format!(
            "poll not found: voter_id={voter_id} poll_id={poll_id}"
        )));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn fallback_not_found() -> ApiError {
    ApiError::not_found("no such endpoint")
}
