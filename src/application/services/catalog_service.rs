//! Service Catalog Service
//!
//! Handles service (listing) management: cursor-paginated listing, slug
//! uniqueness enforcement, and soft deletion.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use crate::domain::{Service, ServiceFilter, ServiceRepository, ServiceSortField, ServiceStatus};
use crate::shared::error::AppError;
use crate::shared::pagination::{CursorPage, PageRequest, SortOrder};
use crate::shared::snowflake::SnowflakeGenerator;
use crate::shared::validation::is_valid_slug;

/// Catalog service trait
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// List services with filters and cursor pagination
    async fn list_services(
        &self,
        params: ServiceListParams,
    ) -> Result<CursorPage<Service>, CatalogError>;

    /// Get service by ID
    async fn get_service(&self, service_id: i64) -> Result<Service, CatalogError>;

    /// Get service by slug
    async fn get_service_by_slug(&self, slug: &str) -> Result<Service, CatalogError>;

    /// Create a new service
    async fn create_service(&self, dto: CreateServiceDto) -> Result<Service, CatalogError>;

    /// Update an existing service
    async fn update_service(
        &self,
        service_id: i64,
        dto: UpdateServiceDto,
    ) -> Result<Service, CatalogError>;

    /// Soft-delete a service
    async fn delete_service(&self, service_id: i64) -> Result<(), CatalogError>;
}

/// List request parameters
#[derive(Debug, Clone, Default)]
pub struct ServiceListParams {
    pub cursor: Option<String>,
    pub limit: Option<i64>,
    /// Raw client value; resolved against the sort-field allow-list
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub filter: ServiceFilter,
}

/// Create service request
#[derive(Debug, Clone)]
pub struct CreateServiceDto {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub seller_id: i64,
    pub category_id: Option<i64>,
    pub status: ServiceStatus,
    pub sort_order: i32,
    pub is_featured: bool,
}

/// Update service request
#[derive(Debug, Clone, Default)]
pub struct UpdateServiceDto {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    /// Outer None = untouched, inner None = clear the category
    pub category_id: Option<Option<i64>>,
    pub status: Option<ServiceStatus>,
    pub sort_order: Option<i32>,
    pub is_featured: Option<bool>,
}

/// Catalog service errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Service not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CatalogError {
    fn from_repo(e: AppError) -> Self {
        match e {
            AppError::Conflict(msg) => Self::Conflict(msg),
            AppError::NotFound(_) => Self::NotFound,
            other => Self::Internal(other.to_string()),
        }
    }
}

/// CatalogService implementation
pub struct CatalogServiceImpl<S>
where
    S: ServiceRepository,
{
    service_repo: Arc<S>,
    id_generator: Arc<SnowflakeGenerator>,
}

impl<S> CatalogServiceImpl<S>
where
    S: ServiceRepository,
{
    pub fn new(service_repo: Arc<S>, id_generator: Arc<SnowflakeGenerator>) -> Self {
        Self {
            service_repo,
            id_generator,
        }
    }
}

#[async_trait]
impl<S> CatalogService for CatalogServiceImpl<S>
where
    S: ServiceRepository + 'static,
{
    async fn list_services(
        &self,
        params: ServiceListParams,
    ) -> Result<CursorPage<Service>, CatalogError> {
        // Resolve the sort field through the allow-list; anything unknown is
        // rejected here rather than reaching the query builder.
        let sort = match params.sort_by.as_deref() {
            Some(name) => ServiceSortField::parse(name)
                .ok_or_else(|| CatalogError::Validation(format!("Unknown sort field: {}", name)))?,
            None => ServiceSortField::default(),
        };

        let page =
            PageRequest::from_parts(params.cursor.as_deref(), params.limit, params.sort_order);

        let rows = self
            .service_repo
            .list(&params.filter, sort, &page)
            .await
            .map_err(CatalogError::from_repo)?;

        Ok(CursorPage::assemble(rows, &page, |s| sort.cursor_value(s)))
    }

    async fn get_service(&self, service_id: i64) -> Result<Service, CatalogError> {
        self.service_repo
            .find_by_id(service_id)
            .await
            .map_err(CatalogError::from_repo)?
            .ok_or(CatalogError::NotFound)
    }

    async fn get_service_by_slug(&self, slug: &str) -> Result<Service, CatalogError> {
        self.service_repo
            .find_by_slug(slug)
            .await
            .map_err(CatalogError::from_repo)?
            .ok_or(CatalogError::NotFound)
    }

    async fn create_service(&self, dto: CreateServiceDto) -> Result<Service, CatalogError> {
        if !is_valid_slug(&dto.slug) {
            return Err(CatalogError::Validation(format!(
                "Invalid slug: '{}'",
                dto.slug
            )));
        }
        if dto.price < Decimal::ZERO {
            return Err(CatalogError::Validation("Price cannot be negative".into()));
        }

        // Optimistic pre-check for fast feedback; the partial unique index
        // backstops the check-then-write race.
        let taken = self
            .service_repo
            .slug_exists(&dto.slug, None)
            .await
            .map_err(CatalogError::from_repo)?;
        if taken {
            return Err(CatalogError::Conflict(format!(
                "Service with slug '{}' already exists",
                dto.slug
            )));
        }

        let now = Utc::now();
        let service = Service {
            id: self.id_generator.generate(),
            slug: dto.slug,
            title: dto.title,
            description: dto.description,
            price: dto.price,
            seller_id: dto.seller_id,
            category_id: dto.category_id,
            status: dto.status,
            sort_order: dto.sort_order,
            is_featured: dto.is_featured,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };

        self.service_repo
            .create(&service)
            .await
            .map_err(CatalogError::from_repo)
    }

    async fn update_service(
        &self,
        service_id: i64,
        dto: UpdateServiceDto,
    ) -> Result<Service, CatalogError> {
        let mut service = self
            .service_repo
            .find_by_id(service_id)
            .await
            .map_err(CatalogError::from_repo)?
            .ok_or(CatalogError::NotFound)?;

        // The uniqueness check runs only when the slug actually changes, and
        // excludes the row being updated so it never conflicts with itself.
        if let Some(slug) = dto.slug {
            if slug != service.slug {
                if !is_valid_slug(&slug) {
                    return Err(CatalogError::Validation(format!("Invalid slug: '{}'", slug)));
                }
                let taken = self
                    .service_repo
                    .slug_exists(&slug, Some(service_id))
                    .await
                    .map_err(CatalogError::from_repo)?;
                if taken {
                    return Err(CatalogError::Conflict(format!(
                        "Service with slug '{}' already exists",
                        slug
                    )));
                }
                service.slug = slug;
            }
        }

        if let Some(title) = dto.title {
            service.title = title;
        }
        if let Some(description) = dto.description {
            service.description = description;
        }
        if let Some(price) = dto.price {
            if price < Decimal::ZERO {
                return Err(CatalogError::Validation("Price cannot be negative".into()));
            }
            service.price = price;
        }
        if let Some(category_id) = dto.category_id {
            service.category_id = category_id;
        }
        if let Some(status) = dto.status {
            service.status = status;
        }
        if let Some(sort_order) = dto.sort_order {
            service.sort_order = sort_order;
        }
        if let Some(is_featured) = dto.is_featured {
            service.is_featured = is_featured;
        }

        self.service_repo
            .update(&service)
            .await
            .map_err(CatalogError::from_repo)
    }

    async fn delete_service(&self, service_id: i64) -> Result<(), CatalogError> {
        let deleted = self
            .service_repo
            .soft_delete(service_id)
            .await
            .map_err(CatalogError::from_repo)?;

        if !deleted {
            return Err(CatalogError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MockServiceRepository;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn sample_service(id: i64, slug: &str) -> Service {
        let now = Utc::now();
        Service {
            id,
            slug: slug.to_string(),
            title: "Logo design".to_string(),
            description: "Custom logo design package".to_string(),
            price: dec!(150.00),
            seller_id: 10,
            category_id: None,
            status: ServiceStatus::Active,
            sort_order: 0,
            is_featured: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn catalog(repo: MockServiceRepository) -> CatalogServiceImpl<MockServiceRepository> {
        CatalogServiceImpl::new(Arc::new(repo), Arc::new(SnowflakeGenerator::new(1, 0)))
    }

    fn create_dto(slug: &str) -> CreateServiceDto {
        CreateServiceDto {
            slug: slug.to_string(),
            title: "Logo design".to_string(),
            description: "Custom logo design package".to_string(),
            price: dec!(150.00),
            seller_id: 10,
            category_id: None,
            status: ServiceStatus::Draft,
            sort_order: 0,
            is_featured: false,
        }
    }

    #[tokio::test]
    async fn test_create_with_taken_slug_conflicts_without_writing() {
        let mut repo = MockServiceRepository::new();
        repo.expect_slug_exists()
            .withf(|slug, exclude| slug == "foo" && exclude.is_none())
            .returning(|_, _| Ok(true));
        // No expectation on create: any insert attempt fails the test.

        let result = catalog(repo).create_service(create_dto("foo")).await;

        assert!(matches!(result, Err(CatalogError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_with_free_slug_inserts() {
        let mut repo = MockServiceRepository::new();
        repo.expect_slug_exists().returning(|_, _| Ok(false));
        repo.expect_create()
            .returning(|s| Ok(s.clone()));

        let created = catalog(repo)
            .create_service(create_dto("logo-design"))
            .await
            .unwrap();

        assert_eq!(created.slug, "logo-design");
        assert!(!created.is_deleted());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_slug() {
        // The repository must never be consulted for a malformed slug.
        let repo = MockServiceRepository::new();

        let result = catalog(repo).create_service(create_dto("Not A Slug")).await;

        assert!(matches!(result, Err(CatalogError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_keeping_own_slug_skips_uniqueness_check() {
        let mut repo = MockServiceRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(sample_service(id, "foo"))));
        // No expectation on slug_exists: the unchanged slug must not trigger
        // a self-conflict lookup.
        repo.expect_update().returning(|s| Ok(s.clone()));

        let dto = UpdateServiceDto {
            slug: Some("foo".to_string()),
            title: Some("Updated title".to_string()),
            ..Default::default()
        };

        let updated = catalog(repo).update_service(1, dto).await.unwrap();
        assert_eq!(updated.title, "Updated title");
        assert_eq!(updated.slug, "foo");
    }

    #[tokio::test]
    async fn test_update_to_taken_slug_conflicts_and_excludes_self() {
        let mut repo = MockServiceRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(sample_service(id, "foo"))));
        repo.expect_slug_exists()
            .withf(|slug, exclude| slug == "bar" && *exclude == Some(1))
            .returning(|_, _| Ok(true));

        let dto = UpdateServiceDto {
            slug: Some("bar".to_string()),
            ..Default::default()
        };

        let result = catalog(repo).update_service(1, dto).await;
        assert!(matches!(result, Err(CatalogError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_list_rejects_unknown_sort_field() {
        let repo = MockServiceRepository::new();

        let params = ServiceListParams {
            sort_by: Some("sellerId".to_string()),
            ..Default::default()
        };

        let result = catalog(repo).list_services(params).await;
        assert!(matches!(result, Err(CatalogError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_assembles_page_from_extra_row() {
        let mut repo = MockServiceRepository::new();
        repo.expect_list().returning(|_, _, page| {
            // Repository contract: up to limit + 1 rows.
            let n = page.fetch_limit();
            Ok((0..n).map(|i| sample_service(i, &format!("svc-{}", i))).collect())
        });

        let params = ServiceListParams {
            limit: Some(2),
            ..Default::default()
        };

        let page = catalog(repo).list_services(params).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.has_next_page);
        assert!(page.next_cursor.is_some());
        assert!(!page.has_previous_page);
    }

    #[tokio::test]
    async fn test_delete_missing_service_is_not_found() {
        let mut repo = MockServiceRepository::new();
        repo.expect_soft_delete().returning(|_| Ok(false));

        let result = catalog(repo).delete_service(99).await;
        assert!(matches!(result, Err(CatalogError::NotFound)));
    }
}
