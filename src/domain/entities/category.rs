//! Service category entity and repository trait.
//!
//! Maps to the `service_categories` table. Categories form a tree through
//! the self-referential `parent_id` column.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::shared::error::AppError;
use crate::shared::pagination::PageRequest;

/// Represents a category in the service catalog.
///
/// Maps to the `service_categories` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - slug: TEXT NOT NULL UNIQUE
/// - name: VARCHAR(120) NOT NULL
/// - description: TEXT NULL
/// - parent_id: BIGINT REFERENCES service_categories(id) -- NULL for roots
/// - sort_order: INTEGER NOT NULL DEFAULT 0
/// - is_active: BOOLEAN NOT NULL DEFAULT TRUE
/// - created_at / updated_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    /// Snowflake ID (primary key)
    pub id: i64,

    /// URL-safe unique identifier
    pub slug: String,

    /// Display name
    pub name: String,

    /// Optional description
    pub description: Option<String>,

    /// Parent category (None for root categories)
    pub parent_id: Option<i64>,

    /// Manual ordering position
    pub sort_order: i32,

    /// Whether the category is shown on the storefront
    pub is_active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Check whether this is a root (top-level) category.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Allow-listed sortable columns for category list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategorySortField {
    #[default]
    Order,
    Name,
    CreatedAt,
}

impl CategorySortField {
    /// Resolve a client-supplied sort name. Returns None for unknown fields.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "order" => Some(Self::Order),
            "name" => Some(Self::Name),
            "createdAt" | "created_at" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    /// Column reference for ORDER BY and the cursor predicate.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Order => "sort_order",
            Self::Name => "name",
            Self::CreatedAt => "created_at",
        }
    }

    /// Sort-field value of a row, as encoded into the next-page cursor.
    pub fn cursor_value(&self, category: &Category) -> Value {
        match self {
            Self::Order => json!(category.sort_order),
            Self::Name => json!(category.name),
            Self::CreatedAt => json!(category.created_at.to_rfc3339()),
        }
    }
}

/// Optional filters for category list queries.
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    /// Case-insensitive substring match over the name
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub parent_id: Option<i64>,
}

/// Repository trait for Category data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Find a category by its Snowflake ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Category>, AppError>;

    /// Find a category by its slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, AppError>;

    /// List categories matching the filter, cursor-paginated.
    async fn list(
        &self,
        filter: &CategoryFilter,
        sort: CategorySortField,
        page: &PageRequest,
    ) -> Result<Vec<Category>, AppError>;

    /// Check whether a slug is already taken by another row.
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool, AppError>;

    /// Count direct children of a category.
    async fn count_children(&self, id: i64) -> Result<i64, AppError>;

    /// Insert a new category.
    async fn create(&self, category: &Category) -> Result<Category, AppError>;

    /// Update an existing category.
    async fn update(&self, category: &Category) -> Result<Category, AppError>;

    /// Hard-delete a category. Returns false when no row matched.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_field_allow_list() {
        assert_eq!(CategorySortField::parse("order"), Some(CategorySortField::Order));
        assert_eq!(CategorySortField::parse("name"), Some(CategorySortField::Name));
        assert_eq!(CategorySortField::parse("slug"), None);
        assert_eq!(CategorySortField::parse("parent_id"), None);
    }

    #[test]
    fn test_is_root() {
        let now = Utc::now();
        let category = Category {
            id: 1,
            slug: "design".into(),
            name: "Design".into(),
            description: None,
            parent_id: None,
            sort_order: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert!(category.is_root());

        let child = Category {
            parent_id: Some(1),
            ..category
        };
        assert!(!child.is_root());
    }
}
