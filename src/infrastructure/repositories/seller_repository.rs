//! Seller Repository Implementation
//!
//! PostgreSQL implementation of seller operations. The aggregate counters
//! are written by an external process and only read here.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{Seller, SellerFilter, SellerRepository, SellerSortField, SellerStatus};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::shared::pagination::{PageRequest, SortOrder};

/// Internal row type matching the sellers table schema.
#[derive(Debug, sqlx::FromRow)]
struct SellerRow {
    id: i64,
    user_id: i64,
    display_name: String,
    status: String,
    commission_rate: Decimal,
    total_sales: i64,
    total_revenue: Decimal,
    average_rating: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SellerRow {
    fn into_seller(self) -> Seller {
        Seller {
            id: self.id,
            user_id: self.user_id,
            display_name: self.display_name,
            status: SellerStatus::from_str(&self.status),
            commission_rate: self.commission_rate,
            total_sales: self.total_sales,
            total_revenue: self.total_revenue,
            average_rating: self.average_rating,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, user_id, display_name, status, commission_rate, total_sales, \
     total_revenue, average_rating, created_at, updated_at";

/// PostgreSQL seller repository implementation.
#[derive(Clone)]
pub struct PgSellerRepository {
    pool: PgPool,
}

impl PgSellerRepository {
    /// Create a new PgSellerRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Append the strict-inequality cursor predicate for the active sort field.
fn push_cursor_predicate(
    qb: &mut QueryBuilder<'_, Postgres>,
    sort: SellerSortField,
    order: SortOrder,
    cursor: &Value,
) {
    let op = order.cursor_operator();
    match sort {
        SellerSortField::CreatedAt => {
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
        SellerSortField::TotalSales => {
            if let Some(v) = cursor.as_i64() {
                qb.push(" AND ").push(sort.column()).push(op).push_bind(v);
            }
        }
        SellerSortField::TotalRevenue | SellerSortField::AverageRating => {
            if let Some(v) = cursor.as_f64().and_then(Decimal::from_f64_retain) {
                qb.push(" AND ").push(sort.column()).push(op).push_bind(v);
            }
        }
    }
}

#[async_trait]
impl SellerRepository for PgSellerRepository {
    /// Find a seller by its ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Seller>, AppError> {
        let row = sqlx::query_as::<_, SellerRow>(
            r#"
            SELECT id, user_id, display_name, status, commission_rate, total_sales,
                   total_revenue, average_rating, created_at, updated_at
            FROM sellers
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_seller()))
    }

    /// Find a seller by the external user account.
    async fn find_by_user_id(&self, user_id: i64) -> Result<Option<Seller>, AppError> {
        let row = sqlx::query_as::<_, SellerRow>(
            r#"
            SELECT id, user_id, display_name, status, commission_rate, total_sales,
                   total_revenue, average_rating, created_at, updated_at
            FROM sellers
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_seller()))
    }

    /// List sellers with dynamic filters and keyset pagination.
    async fn list(
        &self,
        filter: &SellerFilter,
        sort: SellerSortField,
        page: &PageRequest,
    ) -> Result<Vec<Seller>, AppError> {
        let started = Instant::now();

        let mut qb =
            QueryBuilder::new(format!("SELECT {} FROM sellers WHERE TRUE", SELECT_COLUMNS));

        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(search) = &filter.search {
            qb.push(" AND display_name ILIKE ")
                .push_bind(format!("%{}%", search));
        }

        push_cursor_predicate(&mut qb, sort, page.order, &page.cursor);

        qb.push(" ORDER BY ")
            .push(sort.column())
            .push(" ")
            .push(page.order.as_sql())
            .push(", created_at DESC");
        qb.push(" LIMIT ").push_bind(page.fetch_limit());

        let rows = qb
            .build_query_as::<SellerRow>()
            .fetch_all(&self.pool)
            .await?;

        metrics::record_db_query("list", "sellers", started.elapsed().as_secs_f64());

        Ok(rows.into_iter().map(|r| r.into_seller()).collect())
    }

    /// Check whether a user account already has a seller row.
    async fn user_exists(&self, user_id: i64) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM sellers WHERE user_id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Insert a new seller.
    async fn create(&self, seller: &Seller) -> Result<Seller, AppError> {
        let row = sqlx::query_as::<_, SellerRow>(
            r#"
            INSERT INTO sellers (id, user_id, display_name, status, commission_rate)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, display_name, status, commission_rate, total_sales,
                      total_revenue, average_rating, created_at, updated_at
            "#,
        )
        .bind(seller.id)
        .bind(seller.user_id)
        .bind(&seller.display_name)
        .bind(seller.status.as_str())
        .bind(seller.commission_rate)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Seller for this user already exists".to_string())
            }
            _ => AppError::Database(e),
        })?;

        Ok(row.into_seller())
    }

    /// Update profile fields and commission rate.
    ///
    /// The aggregate counters are intentionally not in the SET list; they
    /// belong to the external projection writer.
    async fn update(&self, seller: &Seller) -> Result<Seller, AppError> {
        let row = sqlx::query_as::<_, SellerRow>(
            r#"
            UPDATE sellers
            SET display_name = $2,
                commission_rate = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, user_id, display_name, status, commission_rate, total_sales,
                      total_revenue, average_rating, created_at, updated_at
            "#,
        )
        .bind(seller.id)
        .bind(&seller.display_name)
        .bind(seller.commission_rate)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Seller with id {} not found", seller.id)))?;

        Ok(row.into_seller())
    }

    /// Update only the status column.
    async fn update_status(&self, id: i64, status: SellerStatus) -> Result<(), AppError> {
        let result =
            sqlx::query("UPDATE sellers SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status.as_str())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Seller with id {} not found", id)));
        }

        Ok(())
    }
}
