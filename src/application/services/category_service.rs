//! Category Service
//!
//! Handles catalog category management. Categories share the slug-uniqueness
//! contract with services and are hard-deleted, guarded against orphaning
//! child categories.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{Category, CategoryFilter, CategoryRepository, CategorySortField};
use crate::shared::error::AppError;
use crate::shared::pagination::{CursorPage, PageRequest, SortOrder};
use crate::shared::snowflake::SnowflakeGenerator;
use crate::shared::validation::is_valid_slug;

/// Category service trait
#[async_trait]
pub trait CategoryService: Send + Sync {
    /// List categories with filters and cursor pagination
    async fn list_categories(
        &self,
        params: CategoryListParams,
    ) -> Result<CursorPage<Category>, CategoryError>;

    /// Get category by ID
    async fn get_category(&self, category_id: i64) -> Result<Category, CategoryError>;

    /// Get category by slug
    async fn get_category_by_slug(&self, slug: &str) -> Result<Category, CategoryError>;

    /// Create a new category
    async fn create_category(&self, dto: CreateCategoryDto) -> Result<Category, CategoryError>;

    /// Update an existing category
    async fn update_category(
        &self,
        category_id: i64,
        dto: UpdateCategoryDto,
    ) -> Result<Category, CategoryError>;

    /// Delete a category (refused while children exist)
    async fn delete_category(&self, category_id: i64) -> Result<(), CategoryError>;
}

/// List request parameters
#[derive(Debug, Clone, Default)]
pub struct CategoryListParams {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub filter: CategoryFilter,
}

/// Create category request
#[derive(Debug, Clone)]
pub struct CreateCategoryDto {
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
    pub sort_order: i32,
    pub is_active: bool,
}

/// Update category request
#[derive(Debug, Clone, Default)]
pub struct UpdateCategoryDto {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    /// Outer None = untouched, inner None = detach from parent
    pub parent_id: Option<Option<i64>>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

/// Category service errors
#[derive(Debug, thiserror::Error)]
pub enum CategoryError {
    #[error("Category not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CategoryError {
    fn from_repo(e: AppError) -> Self {
        match e {
            AppError::Conflict(msg) => Self::Conflict(msg),
            AppError::NotFound(_) => Self::NotFound,
            other => Self::Internal(other.to_string()),
        }
    }
}

/// CategoryService implementation
pub struct CategoryServiceImpl<C>
where
    C: CategoryRepository,
{
    category_repo: Arc<C>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<C> CategoryServiceImpl<C>
where
    C: CategoryRepository,
{
    pub fn new(category_repo: Arc<C>, id_generator: Arc<SnowflakeGenerator>) -> Self {
        Self {
            category_repo,
            id_generator,
        }
    }

    async fn ensure_parent_exists(&self, parent_id: i64) -> Result<(), CategoryError> {
        self.category_repo
            .find_by_id(parent_id)
            .await
            .map_err(CategoryError::from_repo)?
            .ok_or_else(|| {
                CategoryError::Validation(format!("Parent category {} does not exist", parent_id))
            })?;
        Ok(())
    }
}

#[async_trait]
impl<C> CategoryService for CategoryServiceImpl<C>
where
    C: CategoryRepository + 'static,
{
    async fn list_categories(
        &self,
        params: CategoryListParams,
    ) -> Result<CursorPage<Category>, CategoryError> {
        let sort = match params.sort_by.as_deref() {
            Some(name) => CategorySortField::parse(name).ok_or_else(|| {
                CategoryError::Validation(format!("Unknown sort field: {}", name))
            })?,
            None => CategorySortField::default(),
        };

        let page =
            PageRequest::from_parts(params.cursor.as_deref(), params.limit, params.sort_order);

        let rows = self
            .category_repo
            .list(&params.filter, sort, &page)
            .await
            .map_err(CategoryError::from_repo)?;

        Ok(CursorPage::assemble(rows, &page, |c| sort.cursor_value(c)))
    }

    async fn get_category(&self, category_id: i64) -> Result<Category, CategoryError> {
        self.category_repo
            .find_by_id(category_id)
            .await
            .map_err(CategoryError::from_repo)?
            .ok_or(CategoryError::NotFound)
    }

    async fn get_category_by_slug(&self, slug: &str) -> Result<Category, CategoryError> {
        self.category_repo
            .find_by_slug(slug)
            .await
            .map_err(CategoryError::from_repo)?
            .ok_or(CategoryError::NotFound)
    }

    async fn create_category(&self, dto: CreateCategoryDto) -> Result<Category, CategoryError> {
        if !is_valid_slug(&dto.slug) {
            return Err(CategoryError::Validation(format!(
                "Invalid slug: '{}'",
                dto.slug
            )));
        }

        let taken = self
            .category_repo
            .slug_exists(&dto.slug, None)
            .await
            .map_err(CategoryError::from_repo)?;
        if taken {
            return Err(CategoryError::Conflict(format!(
                "Category with slug '{}' already exists",
                dto.slug
            )));
        }

        if let Some(parent_id) = dto.parent_id {
            self.ensure_parent_exists(parent_id).await?;
        }

        let now = Utc::now();
        let category = Category {
            id: self.id_generator.generate(),
            slug: dto.slug,
            name: dto.name,
            description: dto.description,
            parent_id: dto.parent_id,
            sort_order: dto.sort_order,
            is_active: dto.is_active,
            created_at: now,
            updated_at: now,
        };

        self.category_repo
            .create(&category)
            .await
            .map_err(CategoryError::from_repo)
    }

    async fn update_category(
        &self,
        category_id: i64,
        dto: UpdateCategoryDto,
    ) -> Result<Category, CategoryError> {
        let mut category = self
            .category_repo
            .find_by_id(category_id)
            .await
            .map_err(CategoryError::from_repo)?
            .ok_or(CategoryError::NotFound)?;

        if let Some(slug) = dto.slug {
            if slug != category.slug {
                if !is_valid_slug(&slug) {
                    return Err(CategoryError::Validation(format!("Invalid slug: '{}'", slug)));
                }
                let taken = self
                    .category_repo
                    .slug_exists(&slug, Some(category_id))
                    .await
                    .map_err(CategoryError::from_repo)?;
                if taken {
                    return Err(CategoryError::Conflict(format!(
                        "Category with slug '{}' already exists",
                        slug
                    )));
                }
                category.slug = slug;
            }
        }

        if let Some(name) = dto.name {
            category.name = name;
        }
        if let Some(description) = dto.description {
            category.description = description;
        }
        if let Some(parent_id) = dto.parent_id {
            if let Some(new_parent) = parent_id {
                if new_parent == category_id {
                    return Err(CategoryError::Validation(
                        "A category cannot be its own parent".into(),
                    ));
                }
                self.ensure_parent_exists(new_parent).await?;
            }
            category.parent_id = parent_id;
        }
        if let Some(sort_order) = dto.sort_order {
            category.sort_order = sort_order;
        }
        if let Some(is_active) = dto.is_active {
            category.is_active = is_active;
        }

        self.category_repo
            .update(&category)
            .await
            .map_err(CategoryError::from_repo)
    }

    async fn delete_category(&self, category_id: i64) -> Result<(), CategoryError> {
        let children = self
            .category_repo
            .count_children(category_id)
            .await
            .map_err(CategoryError::from_repo)?;
        if children > 0 {
            return Err(CategoryError::Conflict(format!(
                "Category has {} child categories",
                children
            )));
        }

        let deleted = self
            .category_repo
            .delete(category_id)
            .await
            .map_err(CategoryError::from_repo)?;

        if !deleted {
            return Err(CategoryError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MockCategoryRepository;

    fn sample_category(id: i64, slug: &str) -> Category {
        let now = Utc::now();
        Category {
            id,
            slug: slug.to_string(),
            name: "Design".to_string(),
            description: None,
            parent_id: None,
            sort_order: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn categories(repo: MockCategoryRepository) -> CategoryServiceImpl<MockCategoryRepository> {
        CategoryServiceImpl::new(Arc::new(repo), Arc::new(SnowflakeGenerator::new(1, 0)))
    }

    #[tokio::test]
    async fn test_create_duplicate_slug_conflicts() {
        let mut repo = MockCategoryRepository::new();
        repo.expect_slug_exists().returning(|_, _| Ok(true));

        let dto = CreateCategoryDto {
            slug: "design".to_string(),
            name: "Design".to_string(),
            description: None,
            parent_id: None,
            sort_order: 0,
            is_active: true,
        };

        let result = categories(repo).create_category(dto).await;
        assert!(matches!(result, Err(CategoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_with_children_conflicts() {
        let mut repo = MockCategoryRepository::new();
        repo.expect_count_children().returning(|_| Ok(3));

        let result = categories(repo).delete_category(1).await;
        assert!(matches!(result, Err(CategoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_leaf_category() {
        let mut repo = MockCategoryRepository::new();
        repo.expect_count_children().returning(|_| Ok(0));
        repo.expect_delete().returning(|_| Ok(true));

        assert!(categories(repo).delete_category(1).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_cannot_become_own_parent() {
        let mut repo = MockCategoryRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(sample_category(id, "design"))));

        let dto = UpdateCategoryDto {
            parent_id: Some(Some(1)),
            ..Default::default()
        };

        let result = categories(repo).update_category(1, dto).await;
        assert!(matches!(result, Err(CategoryError::Validation(_))));
    }
}
