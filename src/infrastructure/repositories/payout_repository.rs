//! Payout Repository Implementation
//!
//! PostgreSQL implementation of payout operations. Amount columns are never
//! updated after insert; only the status (and failure reason) change.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::domain::{Payout, PayoutFilter, PayoutRepository, PayoutSortField, PayoutStatus};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::shared::pagination::{PageRequest, SortOrder};

/// Internal row type matching the payouts table schema.
#[derive(Debug, sqlx::FromRow)]
struct PayoutRow {
    id: i64,
    seller_id: i64,
    reference: Uuid,
    period_start: DateTime<Utc>,
    period_end: DateTime<Utc>,
    amount: Decimal,
    platform_fee: Decimal,
    net_amount: Decimal,
    item_count: i32,
    status: String,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PayoutRow {
    fn into_payout(self) -> Payout {
        Payout {
            id: self.id,
            seller_id: self.seller_id,
            reference: self.reference,
            period_start: self.period_start,
            period_end: self.period_end,
            amount: self.amount,
            platform_fee: self.platform_fee,
            net_amount: self.net_amount,
            item_count: self.item_count,
            status: PayoutStatus::from_str(&self.status),
            failure_reason: self.failure_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, seller_id, reference, period_start, period_end, amount, \
     platform_fee, net_amount, item_count, status, failure_reason, created_at, updated_at";

/// PostgreSQL payout repository implementation.
#[derive(Clone)]
pub struct PgPayoutRepository {
    pool: PgPool,
}

impl PgPayoutRepository {
    /// Create a new PgPayoutRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Append the strict-inequality cursor predicate for the active sort field.
fn push_cursor_predicate(
    qb: &mut QueryBuilder<'_, Postgres>,
    sort: PayoutSortField,
    order: SortOrder,
    cursor: &Value,
) {
    let op = order.cursor_operator();
    match sort {
        PayoutSortField::CreatedAt | PayoutSortField::PeriodStart => {
            if let Some(v) = cursor
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            {
                qb.push(" AND ")
                    .push(sort.column())
                    .push(op)
                    .push_bind(v.with_timezone(&Utc));
            }
        }
        PayoutSortField::Amount => {
            if let Some(v) = cursor.as_f64().and_then(Decimal::from_f64_retain) {
                qb.push(" AND ").push(sort.column()).push(op).push_bind(v);
            }
        }
    }
}

#[async_trait]
impl PayoutRepository for PgPayoutRepository {
    /// Find a payout by its ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Payout>, AppError> {
        let row = sqlx::query_as::<_, PayoutRow>(
            r#"
            SELECT id, seller_id, reference, period_start, period_end, amount,
                   platform_fee, net_amount, item_count, status, failure_reason,
                   created_at, updated_at
            FROM payouts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_payout()))
    }

    /// List payouts with dynamic filters and keyset pagination.
    async fn list(
        &self,
        filter: &PayoutFilter,
        sort: PayoutSortField,
        page: &PageRequest,
    ) -> Result<Vec<Payout>, AppError> {
        let started = Instant::now();

        let mut qb =
            QueryBuilder::new(format!("SELECT {} FROM payouts WHERE TRUE", SELECT_COLUMNS));

        if let Some(seller_id) = filter.seller_id {
            qb.push(" AND seller_id = ").push_bind(seller_id);
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }

        push_cursor_predicate(&mut qb, sort, page.order, &page.cursor);

        qb.push(" ORDER BY ")
            .push(sort.column())
            .push(" ")
            .push(page.order.as_sql())
            .push(", created_at DESC");
        qb.push(" LIMIT ").push_bind(page.fetch_limit());

        let rows = qb
            .build_query_as::<PayoutRow>()
            .fetch_all(&self.pool)
            .await?;

        metrics::record_db_query("list", "payouts", started.elapsed().as_secs_f64());

        Ok(rows.into_iter().map(|r| r.into_payout()).collect())
    }

    /// Insert a new payout.
    async fn create(&self, payout: &Payout) -> Result<Payout, AppError> {
        let row = sqlx::query_as::<_, PayoutRow>(
            r#"
            INSERT INTO payouts (id, seller_id, reference, period_start, period_end,
                                 amount, platform_fee, net_amount, item_count, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, seller_id, reference, period_start, period_end, amount,
                      platform_fee, net_amount, item_count, status, failure_reason,
                      created_at, updated_at
            "#,
        )
        .bind(payout.id)
        .bind(payout.seller_id)
        .bind(payout.reference)
        .bind(payout.period_start)
        .bind(payout.period_end)
        .bind(payout.amount)
        .bind(payout.platform_fee)
        .bind(payout.net_amount)
        .bind(payout.item_count)
        .bind(payout.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_payout())
    }

    /// Update only the status column, plus failure reason when failing.
    async fn update_status(
        &self,
        id: i64,
        status: PayoutStatus,
        failure_reason: Option<String>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE payouts
            SET status = $2, failure_reason = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .bind(failure_reason)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Payout with id {} not found", id)));
        }

        Ok(())
    }
}
