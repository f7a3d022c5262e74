//! Subscription Repository Implementation
//!
//! PostgreSQL implementation of subscription and credit-ledger operations.
//! Balance changes and their ledger entries are written in one transaction;
//! the `credits >= 0` CHECK constraint backstops concurrent overdrafts.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{
    CreditEntry, Subscription, SubscriptionFilter, SubscriptionPlan, SubscriptionRepository,
    SubscriptionSortField, SubscriptionStatus,
};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::shared::pagination::{PageRequest, SortOrder};

/// Internal row type matching the subscriptions table schema.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: i64,
    user_id: i64,
    plan: String,
    credits: i32,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SubscriptionRow {
    fn into_subscription(self) -> Subscription {
        Subscription {
            id: self.id,
            user_id: self.user_id,
            plan: SubscriptionPlan::from_str(&self.plan),
            credits: self.credits,
            status: SubscriptionStatus::from_str(&self.status),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Internal row type matching the credit_entries table schema.
#[derive(Debug, sqlx::FromRow)]
struct CreditEntryRow {
    id: i64,
    subscription_id: i64,
    amount: i32,
    balance_after: i32,
    reason: String,
    created_at: DateTime<Utc>,
}

impl CreditEntryRow {
    fn into_entry(self) -> CreditEntry {
        CreditEntry {
            id: self.id,
            subscription_id: self.subscription_id,
            amount: self.amount,
            balance_after: self.balance_after,
            reason: self.reason,
            created_at: self.created_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, user_id, plan, credits, status, created_at, updated_at";

/// PostgreSQL subscription repository implementation.
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    /// Create a new PgSubscriptionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Append the strict-inequality cursor predicate for the active sort field.
fn push_cursor_predicate(
    qb: &mut QueryBuilder<'_, Postgres>,
    sort: SubscriptionSortField,
    order: SortOrder,
    cursor: &Value,
) {
    let SubscriptionSortField::CreatedAt = sort;
    if let Some(v) = cursor
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
    {
        qb.push(" AND ")
            .push(sort.column())
            .push(order.cursor_operator())
            .push_bind(v.with_timezone(&Utc));
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    /// Find a subscription by its ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Subscription>, AppError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, plan, credits, status, created_at, updated_at
            FROM subscriptions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_subscription()))
    }

    /// Find a user's subscription.
    async fn find_by_user_id(&self, user_id: i64) -> Result<Option<Subscription>, AppError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, plan, credits, status, created_at, updated_at
            FROM subscriptions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_subscription()))
    }

    /// List subscriptions with dynamic filters and keyset pagination.
    async fn list(
        &self,
        filter: &SubscriptionFilter,
        sort: SubscriptionSortField,
        page: &PageRequest,
    ) -> Result<Vec<Subscription>, AppError> {
        let started = Instant::now();

        let mut qb = QueryBuilder::new(format!(
            "SELECT {} FROM subscriptions WHERE TRUE",
            SELECT_COLUMNS
        ));

        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(plan) = filter.plan {
            qb.push(" AND plan = ").push_bind(plan.as_str());
        }

        push_cursor_predicate(&mut qb, sort, page.order, &page.cursor);

        qb.push(" ORDER BY ")
            .push(sort.column())
            .push(" ")
            .push(page.order.as_sql())
            .push(", created_at DESC");
        qb.push(" LIMIT ").push_bind(page.fetch_limit());

        let rows = qb
            .build_query_as::<SubscriptionRow>()
            .fetch_all(&self.pool)
            .await?;

        metrics::record_db_query("list", "subscriptions", started.elapsed().as_secs_f64());

        Ok(rows.into_iter().map(|r| r.into_subscription()).collect())
    }

    /// Check whether a user account already has a subscription.
    async fn user_exists(&self, user_id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Insert a new subscription and its opening ledger entry atomically.
    async fn create(
        &self,
        subscription: &Subscription,
        opening_entry_id: i64,
    ) -> Result<Subscription, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            INSERT INTO subscriptions (id, user_id, plan, credits, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, plan, credits, status, created_at, updated_at
            "#,
        )
        .bind(subscription.id)
        .bind(subscription.user_id)
        .bind(subscription.plan.as_str())
        .bind(subscription.credits)
        .bind(subscription.status.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Subscription for this user already exists".to_string())
            }
            _ => AppError::Database(e),
        })?;

        sqlx::query(
            r#"
            INSERT INTO credit_entries (id, subscription_id, amount, balance_after, reason)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(opening_entry_id)
        .bind(subscription.id)
        .bind(subscription.credits)
        .bind(subscription.credits)
        .bind("opening_grant")
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row.into_subscription())
    }

    /// Update only the status column.
    async fn update_status(&self, id: i64, status: SubscriptionStatus) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE subscriptions SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status.as_str())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Subscription with id {} not found",
                id
            )));
        }

        Ok(())
    }

    /// Apply a signed balance delta and append the ledger entry atomically.
    async fn apply_credit_delta(
        &self,
        subscription_id: i64,
        entry_id: i64,
        amount: i32,
        reason: &str,
    ) -> Result<(Subscription, CreditEntry), AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            UPDATE subscriptions
            SET credits = credits + $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, plan, credits, status, created_at, updated_at
            "#,
        )
        .bind(subscription_id)
        .bind(amount)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
                AppError::Validation("Insufficient credits".to_string())
            }
            _ => AppError::Database(e),
        })?
        .ok_or_else(|| {
            AppError::NotFound(format!("Subscription with id {} not found", subscription_id))
        })?;

        let entry = sqlx::query_as::<_, CreditEntryRow>(
            r#"
            INSERT INTO credit_entries (id, subscription_id, amount, balance_after, reason)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, subscription_id, amount, balance_after, reason, created_at
            "#,
        )
        .bind(entry_id)
        .bind(subscription_id)
        .bind(amount)
        .bind(row.credits)
        .bind(reason)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((row.into_subscription(), entry.into_entry()))
    }

    /// List ledger entries for a subscription, cursor-paginated.
    async fn list_entries(
        &self,
        subscription_id: i64,
        page: &PageRequest,
    ) -> Result<Vec<CreditEntry>, AppError> {
        let mut qb = QueryBuilder::new(
            "SELECT id, subscription_id, amount, balance_after, reason, created_at \
             FROM credit_entries WHERE subscription_id = ",
        );
        qb.push_bind(subscription_id);

        if let Some(v) = page
            .cursor
            .as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        {
            qb.push(" AND created_at")
                .push(page.order.cursor_operator())
                .push_bind(v.with_timezone(&Utc));
        }

        qb.push(" ORDER BY created_at ")
            .push(page.order.as_sql())
            .push(", id DESC");
        qb.push(" LIMIT ").push_bind(page.fetch_limit());

        let rows = qb
            .build_query_as::<CreditEntryRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.into_entry()).collect())
    }
}
