//! Revenue ledger and payout settlement.
//!
//! Revenue entries are immutable appends; the available balance is derived
//! on every call from the two underlying sets, never cached. Payout
//! admission and settlement run under the publisher-scoped lock so the
//! balance check and the insert are a single serialized step — two racing
//! requests cannot jointly overdraw a balance.

use crate::errors::{StorageError, WordmintError, WordmintResult};
use crate::locks::LockRegistry;
use crate::storage::Storage;
use crate::types::{
    BalanceSummary, Page, PaymentMethod, PayoutRequest, PayoutStatus, PayoutStatusKind,
    RevenueCategory, RevenueEntry,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

const REVENUE_PREFIX: &str = "revenue:entry:";
const REVENUE_INDEX_PREFIX: &str = "revenue:index:";
const PAYOUT_PREFIX: &str = "payout:entry:";
const PAYOUT_INDEX_PREFIX: &str = "payout:index:";

const SCAN_BATCH: usize = 256;

fn revenue_key(publisher_id: Uuid, entry_id: Uuid) -> Vec<u8> {
    format!("{}{}:{}", REVENUE_PREFIX, publisher_id, entry_id).into_bytes()
}

fn revenue_index_key(publisher_id: Uuid, created_millis: u64, entry_id: Uuid) -> Vec<u8> {
    let inv = u64::MAX - created_millis;
    format!("{}{}:{:016x}:{}", REVENUE_INDEX_PREFIX, publisher_id, inv, entry_id).into_bytes()
}

fn payout_key(publisher_id: Uuid, payout_id: Uuid) -> Vec<u8> {
    format!("{}{}:{}", PAYOUT_PREFIX, publisher_id, payout_id).into_bytes()
}

fn payout_index_key(publisher_id: Uuid, created_millis: u64, payout_id: Uuid) -> Vec<u8> {
    let inv = u64::MAX - created_millis;
    format!("{}{}:{:016x}:{}", PAYOUT_INDEX_PREFIX, publisher_id, inv, payout_id).into_bytes()
}

fn scoped_prefix(prefix: &str, publisher_id: Uuid) -> Vec<u8> {
    format!("{}{}:", prefix, publisher_id).into_bytes()
}

/// Last calendar day of the month `date` falls in.
fn end_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = (date.year(), date.month());
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next
        .and_then(|d| d.pred_opt())
        .expect("valid successor month")
}

/// Filters for revenue summaries.
#[derive(Clone, Copy, Debug, Default)]
pub struct RevenueSummaryFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub category: Option<RevenueCategory>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CategoryTotal {
    pub total: Decimal,
    pub count: u64,
}

/// Aggregated revenue view for a publisher.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RevenueSummary {
    pub total_revenue: Decimal,
    pub total_transactions: u64,
    pub by_category: BTreeMap<RevenueCategory, CategoryTotal>,
    pub by_currency: BTreeMap<String, Decimal>,
}

pub struct Ledger {
    storage: Arc<Storage>,
    locks: Arc<LockRegistry>,
}

impl Ledger {
    pub fn new(storage: Arc<Storage>, locks: Arc<LockRegistry>) -> Self {
        Self { storage, locks }
    }

    /// Append an immutable revenue entry. Never reads or mutates payout
    /// state.
    pub fn record_revenue(
        &self,
        publisher_id: Uuid,
        category: RevenueCategory,
        amount: Decimal,
        currency: Option<String>,
        game_session_id: Option<Uuid>,
        metadata: Option<Value>,
    ) -> WordmintResult<RevenueEntry> {
        if amount <= Decimal::ZERO {
            return Err(WordmintError::InvalidInput(
                "Amount must be positive".to_string(),
            ));
        }

        let entry = RevenueEntry {
            id: Uuid::new_v4(),
            publisher_id,
            game_session_id,
            category,
            amount,
            currency: currency.unwrap_or_else(|| "USD".to_string()),
            metadata: metadata.unwrap_or_else(|| Value::Object(serde_json::Map::new())),
            created_at: Utc::now(),
        };

        let bytes = serde_json::to_vec(&entry).map_err(|e| {
            WordmintError::Storage(StorageError::WriteFailed(format!(
                "Failed to encode revenue entry {}: {}",
                entry.id, e
            )))
        })?;
        let created_millis = entry.created_at.timestamp_millis() as u64;
        self.storage.batch_write(&[
            (revenue_key(publisher_id, entry.id), bytes),
            (
                revenue_index_key(publisher_id, created_millis, entry.id),
                Vec::new(),
            ),
        ])?;

        tracing::debug!(
            entry_id = %entry.id,
            publisher_id = %publisher_id,
            category = %category,
            "Revenue recorded"
        );
        Ok(entry)
    }

    /// List revenue entries newest-first with an optional category filter.
    pub fn list_revenue(
        &self,
        publisher_id: Uuid,
        page: Page,
        category: Option<RevenueCategory>,
    ) -> WordmintResult<Vec<RevenueEntry>> {
        let prefix = scoped_prefix(REVENUE_INDEX_PREFIX, publisher_id);
        let offset = page.offset();

        let mut matched = 0usize;
        let mut out = Vec::new();
        let mut cursor: Option<Vec<u8>> = None;

        loop {
            let rows = self.storage.scan_prefix(&prefix, cursor.as_deref(), SCAN_BATCH);
            if rows.is_empty() {
                break;
            }

            for (key, _) in &rows {
                let Some(entry_id) = index_key_id(key) else {
                    continue;
                };
                let Some(entry) = self.load_revenue(publisher_id, entry_id)? else {
                    continue;
                };
                if let Some(want) = category {
                    if entry.category != want {
                        continue;
                    }
                }
                matched += 1;
                if matched > offset && out.len() < page.limit {
                    out.push(entry);
                }
            }

            if out.len() >= page.limit || rows.len() < SCAN_BATCH {
                break;
            }
            cursor = rows.last().map(|(key, _)| key.clone());
        }

        Ok(out)
    }

    /// Aggregate revenue totals, grouped by category and by currency.
    pub fn revenue_summary(
        &self,
        publisher_id: Uuid,
        filter: RevenueSummaryFilter,
    ) -> WordmintResult<RevenueSummary> {
        let mut summary = RevenueSummary::default();

        self.for_each_revenue(publisher_id, |entry| {
            if let Some(start) = filter.start {
                if entry.created_at < start {
                    return;
                }
            }
            if let Some(end) = filter.end {
                if entry.created_at > end {
                    return;
                }
            }
            if let Some(category) = filter.category {
                if entry.category != category {
                    return;
                }
            }

            summary.total_revenue += entry.amount;
            summary.total_transactions += 1;
            let by_category = summary.by_category.entry(entry.category).or_default();
            by_category.total += entry.amount;
            by_category.count += 1;
            *summary.by_currency.entry(entry.currency.clone()).or_default() += entry.amount;
        })?;

        Ok(summary)
    }

    /// Derived on every call: revenue sum minus committed payout sum. Both
    /// `pending` and `processed` payouts count against the balance.
    pub fn available_balance(&self, publisher_id: Uuid) -> WordmintResult<Decimal> {
        Ok(self.total_revenue(publisher_id)? - self.total_committed_payouts(publisher_id)?)
    }

    /// Composite balance view; each sum is computed independently. The
    /// aggregate is always reported in USD regardless of the entry mix.
    pub fn balance(&self, publisher_id: Uuid) -> WordmintResult<BalanceSummary> {
        let total_revenue = self.total_revenue(publisher_id)?;
        let total_paid_out = self.total_committed_payouts(publisher_id)?;
        Ok(BalanceSummary {
            total_revenue,
            total_paid_out,
            available_balance: total_revenue - total_paid_out,
        })
    }

    /// Admit a payout request. The balance check and the insert run as one
    /// step under the publisher lock, so concurrent requests checked
    /// against the same balance cannot both be admitted.
    pub async fn request_payout(
        &self,
        publisher_id: Uuid,
        amount_usd: Decimal,
        payment_method: PaymentMethod,
    ) -> WordmintResult<PayoutRequest> {
        if amount_usd <= Decimal::ZERO {
            return Err(WordmintError::InvalidInput(
                "Amount must be positive".to_string(),
            ));
        }

        let _guard = self.locks.acquire(&format!("ledger:{}", publisher_id)).await;

        let available = self.available_balance(publisher_id)?;
        if amount_usd > available {
            return Err(WordmintError::InsufficientBalance { available });
        }

        let created_at = Utc::now();
        let today = created_at.date_naive();
        let payout = PayoutRequest {
            id: Uuid::new_v4(),
            publisher_id,
            amount_usd,
            payment_method,
            status: PayoutStatus::Pending,
            period_start: today,
            period_end: end_of_month(today),
            created_at,
        };
        self.store_payout(&payout)?;

        tracing::info!(
            payout_id = %payout.id,
            publisher_id = %publisher_id,
            amount = %amount_usd,
            "Payout requested"
        );
        Ok(payout)
    }

    /// Settle a pending payout. The sole transition out of `pending`;
    /// settling twice fails the second time.
    pub async fn mark_paid(
        &self,
        payout_id: Uuid,
        publisher_id: Uuid,
    ) -> WordmintResult<PayoutRequest> {
        let _guard = self.locks.acquire(&format!("ledger:{}", publisher_id)).await;

        let mut payout = self
            .load_payout(publisher_id, payout_id)?
            .ok_or_else(|| WordmintError::NotFound("Payout not found".to_string()))?;
        if !payout.is_pending() {
            return Err(WordmintError::InvalidState(
                "Payout not found or already processed".to_string(),
            ));
        }

        payout.status = PayoutStatus::Processed { processed_at: Utc::now() };
        self.store_payout(&payout)?;

        tracing::info!(payout_id = %payout.id, publisher_id = %publisher_id, "Payout settled");
        Ok(payout)
    }

    pub fn get_payout(&self, payout_id: Uuid, publisher_id: Uuid) -> WordmintResult<PayoutRequest> {
        self.load_payout(publisher_id, payout_id)?
            .ok_or_else(|| WordmintError::NotFound("Payout not found".to_string()))
    }

    /// List payout requests newest-first with an optional status filter.
    pub fn list_payouts(
        &self,
        publisher_id: Uuid,
        page: Page,
        status: Option<PayoutStatusKind>,
    ) -> WordmintResult<Vec<PayoutRequest>> {
        let prefix = scoped_prefix(PAYOUT_INDEX_PREFIX, publisher_id);
        let offset = page.offset();

        let mut matched = 0usize;
        let mut out = Vec::new();
        let mut cursor: Option<Vec<u8>> = None;

        loop {
            let rows = self.storage.scan_prefix(&prefix, cursor.as_deref(), SCAN_BATCH);
            if rows.is_empty() {
                break;
            }

            for (key, _) in &rows {
                let Some(payout_id) = index_key_id(key) else {
                    continue;
                };
                let Some(payout) = self.load_payout(publisher_id, payout_id)? else {
                    continue;
                };
                if let Some(want) = status {
                    if payout.status.kind() != want {
                        continue;
                    }
                }
                matched += 1;
                if matched > offset && out.len() < page.limit {
                    out.push(payout);
                }
            }

            if out.len() >= page.limit || rows.len() < SCAN_BATCH {
                break;
            }
            cursor = rows.last().map(|(key, _)| key.clone());
        }

        Ok(out)
    }

    fn total_revenue(&self, publisher_id: Uuid) -> WordmintResult<Decimal> {
        let mut total = Decimal::ZERO;
        self.for_each_revenue(publisher_id, |entry| total += entry.amount)?;
        Ok(total)
    }

    fn total_committed_payouts(&self, publisher_id: Uuid) -> WordmintResult<Decimal> {
        let prefix = scoped_prefix(PAYOUT_PREFIX, publisher_id);
        let mut total = Decimal::ZERO;
        let mut cursor: Option<Vec<u8>> = None;

        loop {
            let rows = self.storage.scan_prefix(&prefix, cursor.as_deref(), SCAN_BATCH);
            if rows.is_empty() {
                break;
            }
            for (_, value) in &rows {
                let payout: PayoutRequest = serde_json::from_slice(value).map_err(|e| {
                    WordmintError::Storage(StorageError::CorruptedData(format!(
                        "Failed to decode payout: {}",
                        e
                    )))
                })?;
                if matches!(
                    payout.status.kind(),
                    PayoutStatusKind::Pending | PayoutStatusKind::Processed
                ) {
                    total += payout.amount_usd;
                }
            }
            if rows.len() < SCAN_BATCH {
                break;
            }
            cursor = rows.last().map(|(key, _)| key.clone());
        }

        Ok(total)
    }

    fn for_each_revenue<F>(&self, publisher_id: Uuid, mut f: F) -> WordmintResult<()>
    where
        F: FnMut(&RevenueEntry),
    {
        let prefix = scoped_prefix(REVENUE_PREFIX, publisher_id);
        let mut cursor: Option<Vec<u8>> = None;

        loop {
            let rows = self.storage.scan_prefix(&prefix, cursor.as_deref(), SCAN_BATCH);
            if rows.is_empty() {
                break;
            }
            for (_, value) in &rows {
                let entry: RevenueEntry = serde_json::from_slice(value).map_err(|e| {
                    WordmintError::Storage(StorageError::CorruptedData(format!(
                        "Failed to decode revenue entry: {}",
                        e
                    )))
                })?;
                f(&entry);
            }
            if rows.len() < SCAN_BATCH {
                break;
            }
            cursor = rows.last().map(|(key, _)| key.clone());
        }

        Ok(())
    }

    fn load_revenue(
        &self,
        publisher_id: Uuid,
        entry_id: Uuid,
    ) -> WordmintResult<Option<RevenueEntry>> {
        let Some(bytes) = self.storage.get(&revenue_key(publisher_id, entry_id)) else {
            return Ok(None);
        };
        let entry = serde_json::from_slice(&bytes).map_err(|e| {
            WordmintError::Storage(StorageError::CorruptedData(format!(
                "Failed to decode revenue entry {}: {}",
                entry_id, e
            )))
        })?;
        Ok(Some(entry))
    }

    fn load_payout(
        &self,
        publisher_id: Uuid,
        payout_id: Uuid,
    ) -> WordmintResult<Option<PayoutRequest>> {
        let Some(bytes) = self.storage.get(&payout_key(publisher_id, payout_id)) else {
            return Ok(None);
        };
        let payout = serde_json::from_slice(&bytes).map_err(|e| {
            WordmintError::Storage(StorageError::CorruptedData(format!(
                "Failed to decode payout {}: {}",
                payout_id, e
            )))
        })?;
        Ok(Some(payout))
    }

    fn store_payout(&self, payout: &PayoutRequest) -> WordmintResult<()> {
        let bytes = serde_json::to_vec(payout).map_err(|e| {
            WordmintError::Storage(StorageError::WriteFailed(format!(
                "Failed to encode payout {}: {}",
                payout.id, e
            )))
        })?;
        let created_millis = payout.created_at.timestamp_millis() as u64;
        self.storage.batch_write(&[
            (payout_key(payout.publisher_id, payout.id), bytes),
            (
                payout_index_key(payout.publisher_id, created_millis, payout.id),
                Vec::new(),
            ),
        ])
    }
}

fn index_key_id(key: &[u8]) -> Option<Uuid> {
    let key = std::str::from_utf8(key).ok()?;
    Uuid::parse_str(key.rsplit(':').next()?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        ledger: Arc<Ledger>,
        publisher_id: Uuid,
    }

    fn setup() -> Fixture {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(Storage::new(dir.path()).unwrap());
        let ledger = Arc::new(Ledger::new(storage, Arc::new(LockRegistry::new())));
        Fixture { _dir: dir, ledger, publisher_id: Uuid::new_v4() }
    }

    fn record(fx: &Fixture, amount: Decimal) -> RevenueEntry {
        fx.ledger
            .record_revenue(
                fx.publisher_id,
                RevenueCategory::GameCompletion,
                amount,
                None,
                None,
                None,
            )
            .unwrap()
    }

    #[test]
    fn test_record_revenue_rejects_non_positive_amounts() {
        let fx = setup();
        for bad in [Decimal::ZERO, dec!(-0.01), dec!(-100)] {
            let err = fx
                .ledger
                .record_revenue(
                    fx.publisher_id,
                    RevenueCategory::Other,
                    bad,
                    None,
                    None,
                    None,
                )
                .unwrap_err();
            assert!(matches!(err, WordmintError::InvalidInput(_)));
        }
        assert_eq!(fx.ledger.available_balance(fx.publisher_id).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_record_revenue_defaults() {
        let fx = setup();
        let entry = record(&fx, dec!(1.25));
        assert_eq!(entry.currency, "USD");
        assert_eq!(entry.metadata, Value::Object(serde_json::Map::new()));
        assert_eq!(entry.game_session_id, None);
    }

    #[test]
    fn test_available_balance_recomputes_after_each_mutation() {
        let fx = setup();
        assert_eq!(fx.ledger.available_balance(fx.publisher_id).unwrap(), Decimal::ZERO);

        record(&fx, dec!(10.00));
        assert_eq!(fx.ledger.available_balance(fx.publisher_id).unwrap(), dec!(10.00));

        record(&fx, dec!(25.50));
        assert_eq!(fx.ledger.available_balance(fx.publisher_id).unwrap(), dec!(35.50));

        // Balances are publisher-scoped.
        assert_eq!(fx.ledger.available_balance(Uuid::new_v4()).unwrap(), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_payout_deducts_while_pending_and_after_settlement() {
        let fx = setup();
        record(&fx, dec!(10.00));
        record(&fx, dec!(25.50));

        let payout = fx
            .ledger
            .request_payout(fx.publisher_id, dec!(35.50), PaymentMethod::BankTransfer)
            .await
            .unwrap();
        assert!(payout.is_pending());
        assert_eq!(fx.ledger.available_balance(fx.publisher_id).unwrap(), dec!(0.00));

        // A second request immediately after must fail while the first is
        // still pending.
        let err = fx
            .ledger
            .request_payout(fx.publisher_id, dec!(1.00), PaymentMethod::BankTransfer)
            .await
            .unwrap_err();
        match err {
            WordmintError::InsufficientBalance { available } => {
                assert_eq!(available, dec!(0.00))
            }
            other => panic!("expected InsufficientBalance, got {:?}", other),
        }

        // Settling does not change the deduction; the payout counts once.
        fx.ledger.mark_paid(payout.id, fx.publisher_id).await.unwrap();
        let balance = fx.ledger.balance(fx.publisher_id).unwrap();
        assert_eq!(balance.total_revenue, dec!(35.50));
        assert_eq!(balance.total_paid_out, dec!(35.50));
        assert_eq!(balance.available_balance, dec!(0.00));
    }

    #[tokio::test]
    async fn test_overdraw_request_creates_no_payout() {
        let fx = setup();
        record(&fx, dec!(20.00));

        let err = fx
            .ledger
            .request_payout(fx.publisher_id, dec!(20.01), PaymentMethod::Paypal)
            .await
            .unwrap_err();
        match err {
            WordmintError::InsufficientBalance { available } => {
                assert_eq!(available, dec!(20.00))
            }
            other => panic!("expected InsufficientBalance, got {:?}", other),
        }

        let payouts = fx
            .ledger
            .list_payouts(fx.publisher_id, Page::default(), None)
            .unwrap();
        assert!(payouts.is_empty());
        assert_eq!(fx.ledger.available_balance(fx.publisher_id).unwrap(), dec!(20.00));
    }

    #[tokio::test]
    async fn test_request_payout_rejects_non_positive_amounts() {
        let fx = setup();
        record(&fx, dec!(50.00));

        for bad in [Decimal::ZERO, dec!(-5)] {
            let err = fx
                .ledger
                .request_payout(fx.publisher_id, bad, PaymentMethod::BankTransfer)
                .await
                .unwrap_err();
            assert!(matches!(err, WordmintError::InvalidInput(_)));
        }
    }

    #[tokio::test]
    async fn test_mark_paid_is_idempotent_safe() {
        let fx = setup();
        record(&fx, dec!(5.00));
        let payout = fx
            .ledger
            .request_payout(fx.publisher_id, dec!(5.00), PaymentMethod::Wire)
            .await
            .unwrap();

        let settled = fx.ledger.mark_paid(payout.id, fx.publisher_id).await.unwrap();
        assert!(matches!(settled.status, PayoutStatus::Processed { .. }));

        let err = fx
            .ledger
            .mark_paid(payout.id, fx.publisher_id)
            .await
            .unwrap_err();
        match err {
            WordmintError::InvalidState(msg) => {
                assert!(msg.contains("not found or already processed"))
            }
            other => panic!("expected InvalidState, got {:?}", other),
        }

        // Counted once in the paid-out total.
        let balance = fx.ledger.balance(fx.publisher_id).unwrap();
        assert_eq!(balance.total_paid_out, dec!(5.00));
    }

    #[tokio::test]
    async fn test_mark_paid_is_scoped_to_owner() {
        let fx = setup();
        record(&fx, dec!(5.00));
        let payout = fx
            .ledger
            .request_payout(fx.publisher_id, dec!(5.00), PaymentMethod::BankTransfer)
            .await
            .unwrap();

        let err = fx
            .ledger
            .mark_paid(payout.id, Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, WordmintError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_payout_requests_admit_at_most_one() {
        let fx = setup();
        record(&fx, dec!(35.50));

        let a = {
            let ledger = fx.ledger.clone();
            let publisher_id = fx.publisher_id;
            tokio::spawn(async move {
                ledger
                    .request_payout(publisher_id, dec!(35.50), PaymentMethod::BankTransfer)
                    .await
            })
        };
        let b = {
            let ledger = fx.ledger.clone();
            let publisher_id = fx.publisher_id;
            tokio::spawn(async move {
                ledger
                    .request_payout(publisher_id, dec!(35.50), PaymentMethod::BankTransfer)
                    .await
            })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let admitted = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(admitted, 1);
        assert!(results
            .iter()
            .any(|r| matches!(r, Err(WordmintError::InsufficientBalance { .. }))));

        // The joint deduction never exceeds the revenue total.
        let balance = fx.ledger.balance(fx.publisher_id).unwrap();
        assert_eq!(balance.total_paid_out, dec!(35.50));
        assert_eq!(balance.available_balance, dec!(0.00));
    }

    #[tokio::test]
    async fn test_billing_period_is_derived_from_today() {
        let fx = setup();
        record(&fx, dec!(100.00));

        let payout = fx
            .ledger
            .request_payout(fx.publisher_id, dec!(10.00), PaymentMethod::BankTransfer)
            .await
            .unwrap();

        let today = Utc::now().date_naive();
        assert_eq!(payout.period_start, today);
        assert_eq!(payout.period_end, end_of_month(today));
        assert_eq!(payout.period_end.month(), today.month());
    }

    #[test]
    fn test_end_of_month_handles_year_end_and_leap_years() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(end_of_month(d(2026, 8, 6)), d(2026, 8, 31));
        assert_eq!(end_of_month(d(2026, 12, 15)), d(2026, 12, 31));
        assert_eq!(end_of_month(d(2024, 2, 1)), d(2024, 2, 29));
        assert_eq!(end_of_month(d(2025, 2, 28)), d(2025, 2, 28));
        assert_eq!(end_of_month(d(2026, 4, 30)), d(2026, 4, 30));
    }

    #[tokio::test]
    async fn test_list_payouts_filters_by_status() {
        let fx = setup();
        record(&fx, dec!(30.00));

        let first = fx
            .ledger
            .request_payout(fx.publisher_id, dec!(10.00), PaymentMethod::BankTransfer)
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = fx
            .ledger
            .request_payout(fx.publisher_id, dec!(20.00), PaymentMethod::Paypal)
            .await
            .unwrap();
        fx.ledger.mark_paid(first.id, fx.publisher_id).await.unwrap();

        let all = fx
            .ledger
            .list_payouts(fx.publisher_id, Page::default(), None)
            .unwrap();
        let ids: Vec<Uuid> = all.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let pending = fx
            .ledger
            .list_payouts(fx.publisher_id, Page::default(), Some(PayoutStatusKind::Pending))
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second.id);

        let processed = fx
            .ledger
            .list_payouts(
                fx.publisher_id,
                Page::default(),
                Some(PayoutStatusKind::Processed),
            )
            .unwrap();
        assert_eq!(processed.len(), 1);
        assert_eq!(processed[0].id, first.id);

        let fetched = fx.ledger.get_payout(first.id, fx.publisher_id).unwrap();
        assert!(matches!(fetched.status, PayoutStatus::Processed { .. }));

        let err = fx.ledger.get_payout(Uuid::new_v4(), fx.publisher_id).unwrap_err();
        assert!(matches!(err, WordmintError::NotFound(_)));
    }

    #[test]
    fn test_list_revenue_filters_by_category() {
        let fx = setup();
        fx.ledger
            .record_revenue(
                fx.publisher_id,
                RevenueCategory::GameCompletion,
                dec!(1.00),
                None,
                None,
                None,
            )
            .unwrap();
        fx.ledger
            .record_revenue(
                fx.publisher_id,
                RevenueCategory::AdClick,
                dec!(0.35),
                None,
                None,
                None,
            )
            .unwrap();

        let all = fx
            .ledger
            .list_revenue(fx.publisher_id, Page::default(), None)
            .unwrap();
        assert_eq!(all.len(), 2);

        let clicks = fx
            .ledger
            .list_revenue(fx.publisher_id, Page::default(), Some(RevenueCategory::AdClick))
            .unwrap();
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].amount, dec!(0.35));
    }

    #[test]
    fn test_revenue_summary_partitions_by_category_and_currency() {
        let fx = setup();
        fx.ledger
            .record_revenue(
                fx.publisher_id,
                RevenueCategory::GameCompletion,
                dec!(2.00),
                None,
                None,
                None,
            )
            .unwrap();
        fx.ledger
            .record_revenue(
                fx.publisher_id,
                RevenueCategory::GameCompletion,
                dec!(3.00),
                None,
                None,
                None,
            )
            .unwrap();
        fx.ledger
            .record_revenue(
                fx.publisher_id,
                RevenueCategory::AdImpression,
                dec!(0.10),
                Some("EUR".to_string()),
                None,
                None,
            )
            .unwrap();

        let summary = fx
            .ledger
            .revenue_summary(fx.publisher_id, RevenueSummaryFilter::default())
            .unwrap();
        assert_eq!(summary.total_revenue, dec!(5.10));
        assert_eq!(summary.total_transactions, 3);

        let games = &summary.by_category[&RevenueCategory::GameCompletion];
        assert_eq!(games.total, dec!(5.00));
        assert_eq!(games.count, 2);

        assert_eq!(summary.by_currency["USD"], dec!(5.00));
        assert_eq!(summary.by_currency["EUR"], dec!(0.10));

        let filtered = fx
            .ledger
            .revenue_summary(
                fx.publisher_id,
                RevenueSummaryFilter {
                    category: Some(RevenueCategory::AdImpression),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(filtered.total_transactions, 1);
        assert_eq!(filtered.total_revenue, dec!(0.10));
    }
}
