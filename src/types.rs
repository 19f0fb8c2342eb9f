//! Core domain types
//!
//! Lifecycle states are closed sum types with timestamps carried inside the
//! terminal variants, so "completed" and "completed_at set" cannot drift
//! apart. All monetary amounts are `rust_decimal::Decimal`.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Exactly five uppercase ASCII letters. Shared by guess and word validation.
pub fn is_valid_word_text(text: &str) -> bool {
    text.len() == 5 && text.bytes().all(|b| b.is_ascii_uppercase())
}

fn default_metadata() -> Value {
    Value::Object(serde_json::Map::new())
}

// ============================================================================
// Game sessions
// ============================================================================

/// Client context captured when a widget starts a session.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_fingerprint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

/// One submitted guess, appended in call order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Guess {
    pub guess: String,
    pub timestamp: DateTime<Utc>,
}

/// Session lifecycle. `Completed` is terminal; the outcome and completion
/// timestamp exist only inside it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionLifecycle {
    Active,
    Completed {
        won: bool,
        completed_at: DateTime<Utc>,
    },
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GameSession {
    pub id: Uuid,
    pub publisher_id: Uuid,
    pub word_id: Uuid,
    pub guesses: Vec<Guess>,
    pub lifecycle: SessionLifecycle,
    #[serde(default)]
    pub metadata: SessionMetadata,
    pub created_at: DateTime<Utc>,
}

impl GameSession {
    /// Guess count is derived from the sequence, never stored separately.
    pub fn num_guesses(&self) -> usize {
        self.guesses.len()
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.lifecycle, SessionLifecycle::Completed { .. })
    }

    pub fn won(&self) -> Option<bool> {
        match self.lifecycle {
            SessionLifecycle::Active => None,
            SessionLifecycle::Completed { won, .. } => Some(won),
        }
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        match self.lifecycle {
            SessionLifecycle::Active => None,
            SessionLifecycle::Completed { completed_at, .. } => Some(completed_at),
        }
    }
}

// ============================================================================
// Revenue ledger
// ============================================================================

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RevenueCategory {
    GameCompletion,
    AdImpression,
    AdClick,
    Subscription,
    Other,
}

impl RevenueCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevenueCategory::GameCompletion => "game_completion",
            RevenueCategory::AdImpression => "ad_impression",
            RevenueCategory::AdClick => "ad_click",
            RevenueCategory::Subscription => "subscription",
            RevenueCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for RevenueCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable, append-only revenue record. No update or delete exists.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct RevenueEntry {
    pub id: Uuid,
    pub publisher_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_session_id: Option<Uuid>,
    pub category: RevenueCategory,
    pub amount: Decimal,
    pub currency: String,
    #[serde(default = "default_metadata")]
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Payouts
// ============================================================================

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    BankTransfer,
    Paypal,
    Wire,
}

/// Payout lifecycle. Only `pending -> processed` exists; the processed
/// timestamp lives inside the terminal state.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Processed { processed_at: DateTime<Utc> },
}

/// Status discriminant, used for list filters.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatusKind {
    Pending,
    Processed,
}

impl PayoutStatus {
    pub fn kind(&self) -> PayoutStatusKind {
        match self {
            PayoutStatus::Pending => PayoutStatusKind::Pending,
            PayoutStatus::Processed { .. } => PayoutStatusKind::Processed,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PayoutRequest {
    pub id: Uuid,
    pub publisher_id: Uuid,
    pub amount_usd: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(flatten)]
    pub status: PayoutStatus,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl PayoutRequest {
    pub fn is_pending(&self) -> bool {
        matches!(self.status, PayoutStatus::Pending)
    }
}

/// Composite balance view; each sum is computed independently.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BalanceSummary {
    pub total_revenue: Decimal,
    pub total_paid_out: Decimal,
    pub available_balance: Decimal,
}

// ============================================================================
// Pagination
// ============================================================================

pub const DEFAULT_PAGE_LIMIT: usize = 20;
pub const MAX_PAGE_LIMIT: usize = 100;

/// Page/limit pagination, 1-based pages, limit capped server-side.
#[derive(Clone, Copy, Debug)]
pub struct Page {
    pub page: usize,
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, limit: DEFAULT_PAGE_LIMIT }
    }
}

impl Page {
    pub fn new(page: Option<usize>, limit: Option<usize>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1) * self.limit
    }
}
