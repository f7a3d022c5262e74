//! Service Repository Implementation
//!
//! PostgreSQL implementation of service (listing) operations with dynamic
//! filtering and keyset cursor pagination. Every read excludes soft-deleted
//! rows.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{Service, ServiceFilter, ServiceRepository, ServiceSortField, ServiceStatus};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::shared::pagination::{PageRequest, SortOrder};

/// Internal row type matching the services table schema.
#[derive(Debug, sqlx::FromRow)]
struct ServiceRow {
    id: i64,
    slug: String,
    title: String,
    description: String,
    price: Decimal,
    seller_id: i64,
    category_id: Option<i64>,
    status: String,
    sort_order: i32,
    is_featured: bool,
    deleted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ServiceRow {
    /// Convert database row to domain Service entity.
    fn into_service(self) -> Service {
        Service {
            id: self.id,
            slug: self.slug,
            title: self.title,
            description: self.description,
            price: self.price,
            seller_id: self.seller_id,
            category_id: self.category_id,
            status: ServiceStatus::from_str(&self.status),
            sort_order: self.sort_order,
            is_featured: self.is_featured,
            deleted_at: self.deleted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = "s.id, s.slug, s.title, s.description, s.price, s.seller_id, \
     s.category_id, s.status, s.sort_order, s.is_featured, s.deleted_at, s.created_at, \
     s.updated_at";

/// PostgreSQL service repository implementation.
#[derive(Clone)]
pub struct PgServiceRepository {
    pool: PgPool,
}

impl PgServiceRepository {
    /// Create a new PgServiceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Append the strict-inequality cursor predicate for the active sort field.
///
/// The decoded cursor value is typed against the column; a null or
/// unconvertible value appends nothing, which resets to first-page behavior.
fn push_cursor_predicate(
    qb: &mut QueryBuilder<'_, Postgres>,
    sort: ServiceSortField,
    order: SortOrder,
    cursor: &Value,
) {
    let op = order.cursor_operator();
    match sort {
        ServiceSortField::Order => {
            if let Some(v) = cursor.as_i64() {
                qb.push(" AND ").push(sort.column()).push(op).push_bind(v as i32);
            }
        }
        ServiceSortField::Title => {
            if let Some(v) = cursor.as_str() {
                qb.push(" AND ").push(sort.column()).push(op).push_bind(v.to_owned());
            }
        }
        ServiceSortField::Price => {
            if let Some(v) = cursor.as_f64().and_then(Decimal::from_f64_retain) {
                qb.push(" AND ").push(sort.column()).push(op).push_bind(v);
            }
        }
        ServiceSortField::CreatedAt => {
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
    }
}

#[async_trait]
impl ServiceRepository for PgServiceRepository {
    /// Find a non-deleted service by its ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Service>, AppError> {
        let row = sqlx::query_as::<_, ServiceRow>(
            r#"
            SELECT s.id, s.slug, s.title, s.description, s.price, s.seller_id,
                   s.category_id, s.status, s.sort_order, s.is_featured,
                   s.deleted_at, s.created_at, s.updated_at
            FROM services s
            WHERE s.id = $1 AND s.deleted_at IS NULL
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_service()))
    }

    /// Find a non-deleted service by its slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Service>, AppError> {
        let row = sqlx::query_as::<_, ServiceRow>(
            r#"
            SELECT s.id, s.slug, s.title, s.description, s.price, s.seller_id,
                   s.category_id, s.status, s.sort_order, s.is_featured,
                   s.deleted_at, s.created_at, s.updated_at
            FROM services s
            WHERE s.slug = $1 AND s.deleted_at IS NULL
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_service()))
    }

    /// List services with dynamic filters and keyset pagination.
    ///
    /// Every provided filter becomes an independent AND predicate. The query
    /// fetches `limit + 1` rows ordered by the allow-listed sort column with
    /// a `created_at DESC` tiebreaker; the caller turns the extra row into
    /// `hasNextPage`.
    async fn list(
        &self,
        filter: &ServiceFilter,
        sort: ServiceSortField,
        page: &PageRequest,
    ) -> Result<Vec<Service>, AppError> {
        let started = Instant::now();

        let mut qb = QueryBuilder::new(format!("SELECT {} FROM services s", SELECT_COLUMNS));

        // The category join is only needed when filtering by category slug.
        if filter.category_slug.is_some() {
            qb.push(" INNER JOIN service_categories c ON c.id = s.category_id");
        }

        qb.push(" WHERE s.deleted_at IS NULL");

        if let Some(status) = filter.status {
            qb.push(" AND s.status = ").push_bind(status.as_str());
        }
        if let Some(category_id) = filter.category_id {
            qb.push(" AND s.category_id = ").push_bind(category_id);
        }
        if let Some(category_slug) = &filter.category_slug {
            qb.push(" AND c.slug = ").push_bind(category_slug.clone());
        }
        if let Some(is_featured) = filter.is_featured {
            qb.push(" AND s.is_featured = ").push_bind(is_featured);
        }
        if let Some(seller_id) = filter.seller_id {
            qb.push(" AND s.seller_id = ").push_bind(seller_id);
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", search);
            qb.push(" AND (s.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR s.description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        push_cursor_predicate(&mut qb, sort, page.order, &page.cursor);

        qb.push(" ORDER BY ")
            .push(sort.column())
            .push(" ")
            .push(page.order.as_sql())
            .push(", s.created_at DESC");
        qb.push(" LIMIT ").push_bind(page.fetch_limit());

        let rows = qb
            .build_query_as::<ServiceRow>()
            .fetch_all(&self.pool)
            .await?;

        metrics::record_db_query("list", "services", started.elapsed().as_secs_f64());

        Ok(rows.into_iter().map(|r| r.into_service()).collect())
    }

    /// Check whether a slug is taken by another non-deleted row.
    ///
    /// `exclude_id` lets updates skip the row being updated so a service
    /// keeping its own slug never conflicts with itself.
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM services
                WHERE slug = $1
                  AND deleted_at IS NULL
                  AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Insert a new service.
    ///
    /// The partial unique index on slug is the backstop for the
    /// check-then-write race; its violation maps to the same Conflict the
    /// pre-check produces.
    async fn create(&self, service: &Service) -> Result<Service, AppError> {
        let row = sqlx::query_as::<_, ServiceRow>(
            r#"
            INSERT INTO services (id, slug, title, description, price, seller_id,
                                  category_id, status, sort_order, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id, slug, title, description, price, seller_id, category_id,
                      status, sort_order, is_featured, deleted_at, created_at, updated_at
            "#,
        )
        .bind(service.id)
        .bind(&service.slug)
        .bind(&service.title)
        .bind(&service.description)
        .bind(service.price)
        .bind(service.seller_id)
        .bind(service.category_id)
        .bind(service.status.as_str())
        .bind(service.sort_order)
        .bind(service.is_featured)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Service with this slug already exists".to_string())
            }
            _ => AppError::Database(e),
        })?;

        Ok(row.into_service())
    }

    /// Update an existing service.
    async fn update(&self, service: &Service) -> Result<Service, AppError> {
        let row = sqlx::query_as::<_, ServiceRow>(
            r#"
            UPDATE services
            SET slug = $2,
                title = $3,
                description = $4,
                price = $5,
                category_id = $6,
                status = $7,
                sort_order = $8,
                is_featured = $9,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, slug, title, description, price, seller_id, category_id,
                      status, sort_order, is_featured, deleted_at, created_at, updated_at
            "#,
        )
        .bind(service.id)
        .bind(&service.slug)
        .bind(&service.title)
        .bind(&service.description)
        .bind(service.price)
        .bind(service.category_id)
        .bind(service.status.as_str())
        .bind(service.sort_order)
        .bind(service.is_featured)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Service with this slug already exists".to_string())
            }
            _ => AppError::Database(e),
        })?
        .ok_or_else(|| AppError::NotFound(format!("Service with id {} not found", service.id)))?;

        Ok(row.into_service())
    }

    /// Soft-delete a service. The row persists with `deleted_at` set and is
    /// excluded from all subsequent reads.
    async fn soft_delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE services SET deleted_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sql_of(qb: &mut QueryBuilder<'_, Postgres>) -> String {
        qb.sql().to_string()
    }

    #[test]
    fn test_cursor_predicate_uses_strict_inequality() {
        let mut qb = QueryBuilder::new("SELECT 1 WHERE TRUE");
        push_cursor_predicate(
            &mut qb,
            ServiceSortField::Order,
            SortOrder::Asc,
            &json!(10),
        );
        assert!(sql_of(&mut qb).contains("s.sort_order > "));

        let mut qb = QueryBuilder::new("SELECT 1 WHERE TRUE");
        push_cursor_predicate(
            &mut qb,
            ServiceSortField::Order,
            SortOrder::Desc,
            &json!(10),
        );
        assert!(sql_of(&mut qb).contains("s.sort_order < "));
    }

    #[test]
    fn test_null_cursor_adds_no_predicate() {
        let mut qb = QueryBuilder::new("SELECT 1 WHERE TRUE");
        push_cursor_predicate(
            &mut qb,
            ServiceSortField::Order,
            SortOrder::Asc,
            &Value::Null,
        );
        assert_eq!(sql_of(&mut qb), "SELECT 1 WHERE TRUE");
    }

    #[test]
    fn test_mistyped_cursor_adds_no_predicate() {
        // A string cursor against an integer column degrades like null.
        let mut qb = QueryBuilder::new("SELECT 1 WHERE TRUE");
        push_cursor_predicate(
            &mut qb,
            ServiceSortField::Order,
            SortOrder::Asc,
            &json!("not-a-number"),
        );
        assert_eq!(sql_of(&mut qb), "SELECT 1 WHERE TRUE");
    }

    #[test]
    fn test_created_at_cursor_parses_rfc3339() {
        let mut qb = QueryBuilder::new("SELECT 1 WHERE TRUE");
        push_cursor_predicate(
            &mut qb,
            ServiceSortField::CreatedAt,
            SortOrder::Desc,
            &json!("2024-06-01T12:00:00Z"),
        );
        assert!(sql_of(&mut qb).contains("s.created_at < "));
    }
}
