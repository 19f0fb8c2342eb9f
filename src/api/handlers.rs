//! Request Handlers
//!
//! Thin translation between the HTTP surface and the core managers. The
//! caller's publisher identity is resolved by the auth middleware before
//! any handler runs.

use super::{
    errors::ApiError,
    middleware::{AuthedPublisher, RequestId},
    models::*,
};
use crate::directory::PublisherDirectory;
use crate::ledger::{Ledger, RevenueSummaryFilter};
use crate::session::SessionManager;
use crate::types::Page;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state
pub struct AppState {
    pub sessions: SessionManager,
    pub ledger: Ledger,
    pub publishers: Arc<dyn PublisherDirectory>,
    pub version: String,
}

/// Health check handler - minimal response time
/// GET /health
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: state.version.clone(),
    })
}

// ============================================================================
// Game sessions
// ============================================================================

/// POST /api/v1/games/start
pub async fn start_session(
    Extension(request_id): Extension<RequestId>,
    Extension(publisher): Extension<AuthedPublisher>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let session = state
        .sessions
        .start(publisher.0, request.word_id, request.metadata)
        .await
        .map_err(|e| ApiError::from_core(request_id.0, e))?;

    Ok((StatusCode::CREATED, Json(session.into())))
}

/// POST /api/v1/games/:id/guess
pub async fn submit_guess(
    Extension(request_id): Extension<RequestId>,
    Extension(publisher): Extension<AuthedPublisher>,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<GuessRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .sessions
        .submit_guess(session_id, publisher.0, &request.guess)
        .await
        .map_err(|e| ApiError::from_core(request_id.0, e))?;

    Ok(Json(session.into()))
}

/// POST /api/v1/games/:id/complete
pub async fn complete_session(
    Extension(request_id): Extension<RequestId>,
    Extension(publisher): Extension<AuthedPublisher>,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<CompleteRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .sessions
        .complete(session_id, publisher.0, request.won)
        .await
        .map_err(|e| ApiError::from_core(request_id.0, e))?;

    Ok(Json(session.into()))
}

/// GET /api/v1/games?page={n}&limit={n}&completed={bool}
pub async fn list_sessions(
    Extension(request_id): Extension<RequestId>,
    Extension(publisher): Extension<AuthedPublisher>,
    State(state): State<Arc<AppState>>,
    Query(params): Query<SessionsQuery>,
) -> Result<Json<SessionsResponse>, ApiError> {
    let page = Page::new(params.page, params.limit);
    let sessions = state
        .sessions
        .list(publisher.0, page, params.completed)
        .map_err(|e| ApiError::from_core(request_id.0, e))?;

    Ok(Json(SessionsResponse {
        sessions: sessions.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/v1/games/:id
pub async fn get_session(
    Extension(request_id): Extension<RequestId>,
    Extension(publisher): Extension<AuthedPublisher>,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .sessions
        .get(session_id, publisher.0)
        .map_err(|e| ApiError::from_core(request_id.0, e))?;

    Ok(Json(session.into()))
}

// ============================================================================
// Revenue
// ============================================================================

/// POST /api/v1/revenue
pub async fn record_revenue(
    Extension(request_id): Extension<RequestId>,
    Extension(publisher): Extension<AuthedPublisher>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecordRevenueRequest>,
) -> Result<(StatusCode, Json<RevenueEntryResponse>), ApiError> {
    let entry = state
        .ledger
        .record_revenue(
            publisher.0,
            request.revenue_type,
            request.amount,
            request.currency,
            request.game_session_id,
            request.metadata,
        )
        .map_err(|e| ApiError::from_core(request_id.0, e))?;

    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// GET /api/v1/revenue?page={n}&limit={n}&revenue_type={category}
pub async fn list_revenue(
    Extension(request_id): Extension<RequestId>,
    Extension(publisher): Extension<AuthedPublisher>,
    State(state): State<Arc<AppState>>,
    Query(params): Query<RevenueQuery>,
) -> Result<Json<RevenueListResponse>, ApiError> {
    let page = Page::new(params.page, params.limit);
    let entries = state
        .ledger
        .list_revenue(publisher.0, page, params.revenue_type)
        .map_err(|e| ApiError::from_core(request_id.0, e))?;

    Ok(Json(RevenueListResponse {
        revenue: entries.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/v1/revenue/summary?start_date={d}&end_date={d}&revenue_type={c}
pub async fn revenue_summary(
    Extension(request_id): Extension<RequestId>,
    Extension(publisher): Extension<AuthedPublisher>,
    State(state): State<Arc<AppState>>,
    Query(params): Query<RevenueSummaryQuery>,
) -> Result<Json<RevenueSummaryResponse>, ApiError> {
    let filter = RevenueSummaryFilter {
        start: params
            .start_date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc)),
        end: params
            .end_date
            .and_then(|d| d.and_hms_opt(23, 59, 59))
            .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc)),
        category: params.revenue_type,
    };
    let summary = state
        .ledger
        .revenue_summary(publisher.0, filter)
        .map_err(|e| ApiError::from_core(request_id.0, e))?;

    Ok(Json(summary.into()))
}

// ============================================================================
// Payouts and balance
// ============================================================================

/// GET /api/v1/payouts/balance
pub async fn get_balance(
    Extension(request_id): Extension<RequestId>,
    Extension(publisher): Extension<AuthedPublisher>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state
        .ledger
        .balance(publisher.0)
        .map_err(|e| ApiError::from_core(request_id.0, e))?;

    Ok(Json(balance.into()))
}

/// POST /api/v1/payouts/request
pub async fn request_payout(
    Extension(request_id): Extension<RequestId>,
    Extension(publisher): Extension<AuthedPublisher>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<PayoutRequestBody>,
) -> Result<(StatusCode, Json<PayoutResponse>), ApiError> {
    let payout = state
        .ledger
        .request_payout(publisher.0, request.amount_usd, request.payment_method)
        .await
        .map_err(|e| ApiError::from_core(request_id.0, e))?;

    Ok((StatusCode::CREATED, Json(payout.into())))
}

/// GET /api/v1/payouts?page={n}&limit={n}&status={kind}
pub async fn list_payouts(
    Extension(request_id): Extension<RequestId>,
    Extension(publisher): Extension<AuthedPublisher>,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PayoutsQuery>,
) -> Result<Json<PayoutsListResponse>, ApiError> {
    let page = Page::new(params.page, params.limit);
    let payouts = state
        .ledger
        .list_payouts(publisher.0, page, params.status)
        .map_err(|e| ApiError::from_core(request_id.0, e))?;

    Ok(Json(PayoutsListResponse {
        payouts: payouts.into_iter().map(Into::into).collect(),
    }))
}

/// GET /api/v1/payouts/:id
pub async fn get_payout(
    Extension(request_id): Extension<RequestId>,
    Extension(publisher): Extension<AuthedPublisher>,
    State(state): State<Arc<AppState>>,
    Path(payout_id): Path<Uuid>,
) -> Result<Json<PayoutResponse>, ApiError> {
    let payout = state
        .ledger
        .get_payout(payout_id, publisher.0)
        .map_err(|e| ApiError::from_core(request_id.0, e))?;

    Ok(Json(payout.into()))
}

/// POST /api/v1/payouts/:id/mark-paid
pub async fn mark_payout_paid(
    Extension(request_id): Extension<RequestId>,
    Extension(publisher): Extension<AuthedPublisher>,
    State(state): State<Arc<AppState>>,
    Path(payout_id): Path<Uuid>,
) -> Result<Json<PayoutResponse>, ApiError> {
    let payout = state
        .ledger
        .mark_paid(payout_id, publisher.0)
        .await
        .map_err(|e| ApiError::from_core(request_id.0, e))?;

    Ok(Json(payout.into()))
}
