//! Route Definitions
//!
//! Maps URLs to handlers with type-safe routing. Everything under /api/v1
//! requires a resolved, active publisher.

use super::{handlers::*, middleware::publisher_auth_middleware};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build the API router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    let authed = Router::new()
        // Game session lifecycle
        .route("/games/start", post(start_session))
        .route("/games", get(list_sessions))
        .route("/games/:id", get(get_session))
        .route("/games/:id/guess", post(submit_guess))
        .route("/games/:id/complete", post(complete_session))
        // Revenue ledger
        .route("/revenue", post(record_revenue).get(list_revenue))
        .route("/revenue/summary", get(revenue_summary))
        // Payout settlement
        .route("/payouts", get(list_payouts))
        .route("/payouts/balance", get(get_balance))
        .route("/payouts/request", post(request_payout))
        .route("/payouts/:id", get(get_payout))
        .route("/payouts/:id/mark-paid", post(mark_payout_paid))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            publisher_auth_middleware,
        ));

    Router::new()
        // Health check (unauthenticated)
        .route("/health", get(health_handler))
        .nest("/api/v1", authed)
        .with_state(state)
}
