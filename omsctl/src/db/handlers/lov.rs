//! Database repository for the list-of-values tables.

use crate::api::models::{
    lov::LovKind,
    pagination::{PagedList, PaginationParams},
};
use crate::db::{
    errors::{DbError, Result},
    handlers::{
        repository::Repository,
        specification::{Criteria, Specification, fetch_page},
    },
    models::lov::{LovCreateDBRequest, LovDBResponse, LovUpdateDBRequest},
};
use crate::types::{LovId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

const COLUMNS: &str = "v.id, v.name, v.description, v.created_at, v.updated_at";

#[derive(Debug, Clone, Default)]
pub struct LovFilter {
    pub pagination: PaginationParams,
    pub name: Option<String>,
}

impl Specification for LovFilter {
    fn apply(&self, criteria: &mut Criteria<'_, '_>) {
        criteria.contains("v.name", self.name.as_deref());
    }
}

/// Repository over one list-of-values table, selected by [`LovKind`]
pub struct Lovs<'c> {
    db: &'c mut PgConnection,
    kind: LovKind,
}

#[async_trait::async_trait]
impl<'c> Repository for Lovs<'c> {
    type CreateRequest = LovCreateDBRequest;
    type UpdateRequest = LovUpdateDBRequest;
    type Response = LovDBResponse;
    type Id = LovId;
    type Filter = LovFilter;

    #[instrument(skip(self, request), fields(kind = %self.kind, name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let table = self.kind.table();
        let value = sqlx::query_as::<_, LovDBResponse>(&format!(
            "INSERT INTO {table} AS v (id, name, description) VALUES ($1, $2, $3) RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.description)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(value)
    }

    #[instrument(skip(self), fields(kind = %self.kind, lov_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let table = self.kind.table();
        let value = sqlx::query_as::<_, LovDBResponse>(&format!("SELECT {COLUMNS} FROM {table} v WHERE v.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(value)
    }

    #[instrument(skip(self, filter), fields(kind = %self.kind), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<PagedList<Self::Response>> {
        let source = format!("{} v", self.kind.table());
        fetch_page(&mut *self.db, &source, COLUMNS, filter, "v.name, v.id", &filter.pagination).await
    }

    #[instrument(skip(self), fields(kind = %self.kind, lov_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let table = self.kind.table();
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(kind = %self.kind, lov_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let table = self.kind.table();
        let value = sqlx::query_as::<_, LovDBResponse>(&format!(
            "UPDATE {table} AS v SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
             WHERE v.id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(value)
    }
}

impl<'c> Lovs<'c> {
    pub fn new(db: &'c mut PgConnection, kind: LovKind) -> Self {
        Self { db, kind }
    }
}
