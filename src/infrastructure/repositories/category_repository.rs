//! Category Repository Implementation
//!
//! PostgreSQL implementation of service-category operations.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::domain::{Category, CategoryFilter, CategoryRepository, CategorySortField};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::shared::pagination::{PageRequest, SortOrder};

/// Internal row type matching the service_categories table schema.
#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    slug: String,
    name: String,
    description: Option<String>,
    parent_id: Option<i64>,
    sort_order: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CategoryRow {
    fn into_category(self) -> Category {
        Category {
            id: self.id,
            slug: self.slug,
            name: self.name,
            description: self.description,
            parent_id: self.parent_id,
            sort_order: self.sort_order,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str =
    "id, slug, name, description, parent_id, sort_order, is_active, created_at, updated_at";

/// PostgreSQL category repository implementation.
#[derive(Clone)]
pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    /// Create a new PgCategoryRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Append the strict-inequality cursor predicate for the active sort field.
fn push_cursor_predicate(
    qb: &mut QueryBuilder<'_, Postgres>,
    sort: CategorySortField,
    order: SortOrder,
    cursor: &Value,
) {
    let op = order.cursor_operator();
    match sort {
        CategorySortField::Order => {
            if let Some(v) = cursor.as_i64() {
                qb.push(" AND ").push(sort.column()).push(op).push_bind(v as i32);
            }
        }
        CategorySortField::Name => {
            if let Some(v) = cursor.as_str() {
                qb.push(" AND ").push(sort.column()).push(op).push_bind(v.to_owned());
            }
        }
        CategorySortField::CreatedAt => {
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
impl CategoryRepository for PgCategoryRepository {
    /// Find a category by its ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, AppError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, slug, name, description, parent_id, sort_order, is_active,
                   created_at, updated_at
            FROM service_categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_category()))
    }

    /// Find a category by its slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, AppError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, slug, name, description, parent_id, sort_order, is_active,
                   created_at, updated_at
            FROM service_categories
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_category()))
    }

    /// List categories with dynamic filters and keyset pagination.
    async fn list(
        &self,
        filter: &CategoryFilter,
        sort: CategorySortField,
        page: &PageRequest,
    ) -> Result<Vec<Category>, AppError> {
        let started = Instant::now();

        let mut qb = QueryBuilder::new(format!(
            "SELECT {} FROM service_categories WHERE TRUE",
            SELECT_COLUMNS
        ));

        if let Some(is_active) = filter.is_active {
            qb.push(" AND is_active = ").push_bind(is_active);
        }
        if let Some(parent_id) = filter.parent_id {
            qb.push(" AND parent_id = ").push_bind(parent_id);
        }
        if let Some(search) = &filter.search {
            qb.push(" AND name ILIKE ")
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
            .build_query_as::<CategoryRow>()
            .fetch_all(&self.pool)
            .await?;

        metrics::record_db_query("list", "service_categories", started.elapsed().as_secs_f64());

        Ok(rows.into_iter().map(|r| r.into_category()).collect())
    }

    /// Check whether a slug is taken by another row.
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM service_categories
                WHERE slug = $1 AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Count direct children of a category.
    async fn count_children(&self, id: i64) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM service_categories WHERE parent_id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Insert a new category.
    async fn create(&self, category: &Category) -> Result<Category, AppError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            INSERT INTO service_categories (id, slug, name, description, parent_id,
                                            sort_order, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, slug, name, description, parent_id, sort_order, is_active,
                      created_at, updated_at
            "#,
        )
        .bind(category.id)
        .bind(&category.slug)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.parent_id)
        .bind(category.sort_order)
        .bind(category.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Category with this slug already exists".to_string())
            }
            _ => AppError::Database(e),
        })?;

        Ok(row.into_category())
    }

    /// Update an existing category.
    async fn update(&self, category: &Category) -> Result<Category, AppError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            UPDATE service_categories
            SET slug = $2,
                name = $3,
                description = $4,
                parent_id = $5,
                sort_order = $6,
                is_active = $7,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, slug, name, description, parent_id, sort_order, is_active,
                      created_at, updated_at
            "#,
        )
        .bind(category.id)
        .bind(&category.slug)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.parent_id)
        .bind(category.sort_order)
        .bind(category.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::Conflict("Category with this slug already exists".to_string())
            }
            _ => AppError::Database(e),
        })?
        .ok_or_else(|| {
            AppError::NotFound(format!("Category with id {} not found", category.id))
        })?;

        Ok(row.into_category())
    }

    /// Hard-delete a category.
    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM service_categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
