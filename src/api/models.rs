//! API Request and Response Models
//!
//! Request amounts deserialize through serde_json's arbitrary-precision
//! path so JSON numbers reach the ledger as exact decimals. Aggregate
//! money fields are rendered as two-decimal strings.

use crate::ledger::RevenueSummary;
use crate::types::{
    BalanceSummary, GameSession, Guess, PaymentMethod, PayoutRequest, PayoutStatus,
    PayoutStatusKind, RevenueCategory, RevenueEntry, SessionMetadata,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

fn money(amount: Decimal) -> String {
    format!("{:.2}", amount)
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

// ============================================================================
// Game sessions
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct StartSessionRequest {
    pub word_id: Uuid,
    #[serde(flatten)]
    pub metadata: SessionMetadata,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuessRequest {
    pub guess: String,
}

/// `won` is type-checked at the boundary; anything but a JSON boolean is
/// rejected before the core sees it.
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteRequest {
    pub won: bool,
}

#[derive(Debug, Deserialize)]
pub struct SessionsQuery {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub publisher_id: Uuid,
    pub word_id: Uuid,
    pub guesses: Vec<Guess>,
    pub num_guesses: usize,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub won: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub metadata: SessionMetadata,
    pub created_at: DateTime<Utc>,
}

impl From<GameSession> for SessionResponse {
    fn from(session: GameSession) -> Self {
        Self {
            id: session.id,
            publisher_id: session.publisher_id,
            word_id: session.word_id,
            num_guesses: session.num_guesses(),
            completed: session.is_completed(),
            won: session.won(),
            completed_at: session.completed_at(),
            guesses: session.guesses,
            metadata: session.metadata,
            created_at: session.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionResponse>,
}

// ============================================================================
// Revenue
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RecordRevenueRequest {
    pub revenue_type: RevenueCategory,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub game_session_id: Option<Uuid>,
    #[serde(default)]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueEntryResponse {
    pub id: Uuid,
    pub publisher_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_session_id: Option<Uuid>,
    pub revenue_type: RevenueCategory,
    pub amount: Decimal,
    pub currency: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl From<RevenueEntry> for RevenueEntryResponse {
    fn from(entry: RevenueEntry) -> Self {
        Self {
            id: entry.id,
            publisher_id: entry.publisher_id,
            game_session_id: entry.game_session_id,
            revenue_type: entry.category,
            amount: entry.amount,
            currency: entry.currency,
            metadata: entry.metadata,
            created_at: entry.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueListResponse {
    pub revenue: Vec<RevenueEntryResponse>,
}

#[derive(Debug, Deserialize)]
pub struct RevenueQuery {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub revenue_type: Option<RevenueCategory>,
}

#[derive(Debug, Deserialize)]
pub struct RevenueSummaryQuery {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub revenue_type: Option<RevenueCategory>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryTotalResponse {
    pub total: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevenueSummaryResponse {
    pub total_revenue: String,
    pub total_transactions: u64,
    pub by_type: BTreeMap<String, CategoryTotalResponse>,
    pub by_currency: BTreeMap<String, String>,
}

impl From<RevenueSummary> for RevenueSummaryResponse {
    fn from(summary: RevenueSummary) -> Self {
        Self {
            total_revenue: money(summary.total_revenue),
            total_transactions: summary.total_transactions,
            by_type: summary
                .by_category
                .into_iter()
                .map(|(category, totals)| {
                    (
                        category.to_string(),
                        CategoryTotalResponse {
                            total: money(totals.total),
                            count: totals.count,
                        },
                    )
                })
                .collect(),
            by_currency: summary
                .by_currency
                .into_iter()
                .map(|(currency, total)| (currency, money(total)))
                .collect(),
        }
    }
}

// ============================================================================
// Payouts and balance
// ============================================================================

/// Balance aggregate, always reported as USD regardless of the underlying
/// entry currency mix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub total_revenue: String,
    pub total_paid_out: String,
    pub available_balance: String,
    pub currency: String,
}

impl From<BalanceSummary> for BalanceResponse {
    fn from(balance: BalanceSummary) -> Self {
        Self {
            total_revenue: money(balance.total_revenue),
            total_paid_out: money(balance.total_paid_out),
            available_balance: money(balance.available_balance),
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayoutRequestBody {
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount_usd: Decimal,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutResponse {
    pub id: Uuid,
    pub publisher_id: Uuid,
    pub amount_usd: Decimal,
    pub payment_method: PaymentMethod,
    pub status: PayoutStatusKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<PayoutRequest> for PayoutResponse {
    fn from(payout: PayoutRequest) -> Self {
        let (status, processed_at) = match payout.status {
            PayoutStatus::Pending => (PayoutStatusKind::Pending, None),
            PayoutStatus::Processed { processed_at } => {
                (PayoutStatusKind::Processed, Some(processed_at))
            }
        };
        Self {
            id: payout.id,
            publisher_id: payout.publisher_id,
            amount_usd: payout.amount_usd,
            payment_method: payout.payment_method,
            status,
            processed_at,
            period_start: payout.period_start,
            period_end: payout.period_end,
            created_at: payout.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PayoutsQuery {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub status: Option<PayoutStatusKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutsListResponse {
    pub payouts: Vec<PayoutResponse>,
}
