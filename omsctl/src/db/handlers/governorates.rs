//! Database repository for governorates.

use crate::api::models::pagination::{PagedList, PaginationParams};
use crate::db::{
    errors::{DbError, Result},
    handlers::{
        repository::Repository,
        specification::{Criteria, Specification, fetch_page},
    },
    models::governorates::{GovernorateCreateDBRequest, GovernorateDBResponse, GovernorateUpdateDBRequest},
};
use crate::types::{GovernorateId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

const COLUMNS: &str = "g.id, g.name, g.code, g.created_at, g.updated_at";

/// Filter for listing governorates
#[derive(Debug, Clone, Default)]
pub struct GovernorateFilter {
    pub pagination: PaginationParams,
    pub name: Option<String>,
}

impl Specification for GovernorateFilter {
    fn apply(&self, criteria: &mut Criteria<'_, '_>) {
        criteria.contains("g.name", self.name.as_deref());
    }
}

pub struct Governorates<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Governorates<'c> {
    type CreateRequest = GovernorateCreateDBRequest;
    type UpdateRequest = GovernorateUpdateDBRequest;
    type Response = GovernorateDBResponse;
    type Id = GovernorateId;
    type Filter = GovernorateFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let governorate = sqlx::query_as::<_, GovernorateDBResponse>(
            "INSERT INTO governorates (id, name, code) VALUES ($1, $2, $3)
             RETURNING id, name, code, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.code)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(governorate)
    }

    #[instrument(skip(self), fields(governorate_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let governorate = sqlx::query_as::<_, GovernorateDBResponse>(&format!("SELECT {COLUMNS} FROM governorates g WHERE g.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(governorate)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<PagedList<Self::Response>> {
        fetch_page(&mut *self.db, "governorates g", COLUMNS, filter, "g.name, g.id", &filter.pagination).await
    }

    #[instrument(skip(self), fields(governorate_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM governorates WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(governorate_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let governorate = sqlx::query_as::<_, GovernorateDBResponse>(
            "UPDATE governorates SET
                name = COALESCE($2, name),
                code = COALESCE($3, code),
                updated_at = NOW()
             WHERE id = $1
             RETURNING id, name, code, created_at, updated_at",
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.code)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(governorate)
    }
}

impl<'c> Governorates<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn create_request(name: &str) -> GovernorateCreateDBRequest {
        GovernorateCreateDBRequest {
            name: name.to_string(),
            code: Some(name[..3].to_uppercase()),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_governorate(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Governorates::new(&mut conn);

        let created = repo.create(&create_request("Baghdad")).await.unwrap();
        assert_eq!(created.name, "Baghdad");
        assert_eq!(created.code.as_deref(), Some("BAG"));

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert!(repo.get_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_name_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Governorates::new(&mut conn);

        repo.create(&create_request("Basra")).await.unwrap();
        let err = repo.create(&create_request("Basra")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_only_changes_supplied_fields(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Governorates::new(&mut conn);

        let created = repo.create(&create_request("Najaf")).await.unwrap();
        let updated = repo
            .update(
                created.id,
                &GovernorateUpdateDBRequest {
                    name: Some("Al Najaf".to_string()),
                    code: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Al Najaf");
        assert_eq!(updated.code, created.code);
        assert!(updated.updated_at >= created.updated_at);

        let missing = repo.update(Uuid::new_v4(), &GovernorateUpdateDBRequest::default()).await;
        assert!(matches!(missing, Err(DbError::NotFound)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_and_paginates(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Governorates::new(&mut conn);

        for name in ["Erbil", "Duhok", "Diyala"] {
            repo.create(&create_request(name)).await.unwrap();
        }

        let all = repo.list(&GovernorateFilter::default()).await.unwrap();
        assert_eq!(all.total_count, 3);
        assert_eq!(all.items.iter().map(|g| g.name.as_str()).collect::<Vec<_>>(), vec!["Diyala", "Duhok", "Erbil"]);

        let filtered = repo
            .list(&GovernorateFilter {
                name: Some("d".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(filtered.total_count, 2);

        let page = repo
            .list(&GovernorateFilter {
                pagination: PaginationParams::new(2, 2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_pages, 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_governorate(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Governorates::new(&mut conn);

        let created = repo.create(&create_request("Karbala")).await.unwrap();
        assert!(repo.delete(created.id).await.unwrap());
        assert!(!repo.delete(created.id).await.unwrap());
    }
}
