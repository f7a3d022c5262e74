//! Review Repository Implementation
//!
//! PostgreSQL implementation of review operations.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{Review, ReviewFilter, ReviewRepository, ReviewSortField};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::shared::pagination::{PageRequest, SortOrder};

/// Internal row type matching the reviews table schema.
#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    service_id: i64,
    reviewer_id: i64,
    rating: i32,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ReviewRow {
    fn into_review(self) -> Review {
        Review {
            id: self.id,
            service_id: self.service_id,
            reviewer_id: self.reviewer_id,
            rating: self.rating,
            comment: self.comment,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str =
    "id, service_id, reviewer_id, rating, comment, created_at, updated_at";

/// PostgreSQL review repository implementation.
#[derive(Clone)]
pub struct PgReviewRepository {
    pool: PgPool,
}

impl PgReviewRepository {
    /// Create a new PgReviewRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Append the strict-inequality cursor predicate for the active sort field.
fn push_cursor_predicate(
    qb: &mut QueryBuilder<'_, Postgres>,
    sort: ReviewSortField,
    order: SortOrder,
    cursor: &Value,
) {
    let op = order.cursor_operator();
    match sort {
        ReviewSortField::CreatedAt => {
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
        ReviewSortField::Rating => {
            if let Some(v) = cursor.as_i64() {
                qb.push(" AND ").push(sort.column()).push(op).push_bind(v as i32);
            }
        }
    }
}

#[async_trait]
impl ReviewRepository for PgReviewRepository {
    /// Find a review by its ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Review>, AppError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            SELECT id, service_id, reviewer_id, rating, comment, created_at, updated_at
            FROM reviews
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_review()))
    }

    /// List reviews with dynamic filters and keyset pagination.
    async fn list(
        &self,
        filter: &ReviewFilter,
        sort: ReviewSortField,
        page: &PageRequest,
    ) -> Result<Vec<Review>, AppError> {
        let started = Instant::now();

        let mut qb =
            QueryBuilder::new(format!("SELECT {} FROM reviews WHERE TRUE", SELECT_COLUMNS));

        if let Some(service_id) = filter.service_id {
            qb.push(" AND service_id = ").push_bind(service_id);
        }
        if let Some(rating) = filter.rating {
            qb.push(" AND rating = ").push_bind(rating);
        }

        push_cursor_predicate(&mut qb, sort, page.order, &page.cursor);

        qb.push(" ORDER BY ")
            .push(sort.column())
            .push(" ")
            .push(page.order.as_sql())
            .push(", created_at DESC");
        qb.push(" LIMIT ").push_bind(page.fetch_limit());

        let rows = qb
            .build_query_as::<ReviewRow>()
            .fetch_all(&self.pool)
            .await?;

        metrics::record_db_query("list", "reviews", started.elapsed().as_secs_f64());

        Ok(rows.into_iter().map(|r| r.into_review()).collect())
    }

    /// Check whether a reviewer has already reviewed a service.
    async fn exists_for_reviewer(
        &self,
        service_id: i64,
        reviewer_id: i64,
    ) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE service_id = $1 AND reviewer_id = $2)",
        )
        .bind(service_id)
        .bind(reviewer_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Insert a new review.
    async fn create(&self, review: &Review) -> Result<Review, AppError> {
        let row = sqlx::query_as::<_, ReviewRow>(
            r#"
            INSERT INTO reviews (id, service_id, reviewer_id, rating, comment)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, service_id, reviewer_id, rating, comment, created_at, updated_at
            "#,
        )
        .bind(review.id)
        .bind(review.service_id)
        .bind(review.reviewer_id)
        .bind(review.rating)
        .bind(&review.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Review for this service already exists".to_string())
            }
            _ => AppError::Database(e),
        })?;

        Ok(row.into_review())
    }

    /// Hard-delete a review.
    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
