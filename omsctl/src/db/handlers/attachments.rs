//! Database repository for attachment metadata.

use crate::api::{
    models::attachments::AttachmentEntity,
    models::pagination::{PagedList, PaginationParams},
};
use crate::db::{
    errors::{DbError, Result},
    handlers::{
        repository::Repository,
        specification::{Criteria, Specification, fetch_page},
    },
    models::attachments::{AttachmentCreateDBRequest, AttachmentDBResponse, AttachmentUpdateDBRequest},
};
use crate::types::{AttachmentId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

const COLUMNS: &str = "a.id, a.file_name, a.file_path, a.entity_type, a.entity_id, a.created_at, a.updated_at";

#[derive(Debug, Clone, Default)]
pub struct AttachmentFilter {
    pub pagination: PaginationParams,
    pub entity_type: Option<AttachmentEntity>,
    pub entity_id: Option<Uuid>,
}

impl Specification for AttachmentFilter {
    fn apply(&self, criteria: &mut Criteria<'_, '_>) {
        criteria.eq("a.entity_type", self.entity_type).eq("a.entity_id", self.entity_id);
    }
}

pub struct Attachments<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Attachments<'c> {
    type CreateRequest = AttachmentCreateDBRequest;
    type UpdateRequest = AttachmentUpdateDBRequest;
    type Response = AttachmentDBResponse;
    type Id = AttachmentId;
    type Filter = AttachmentFilter;

    #[instrument(skip(self, request), fields(entity_type = %request.entity_type, entity_id = %abbrev_uuid(&request.entity_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let attachment = sqlx::query_as::<_, AttachmentDBResponse>(&format!(
            "INSERT INTO attachments AS a (id, file_name, file_path, entity_type, entity_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&request.file_name)
        .bind(&request.file_path)
        .bind(request.entity_type)
        .bind(request.entity_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(attachment)
    }

    #[instrument(skip(self), fields(attachment_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let attachment = sqlx::query_as::<_, AttachmentDBResponse>(&format!("SELECT {COLUMNS} FROM attachments a WHERE a.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(attachment)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<PagedList<Self::Response>> {
        fetch_page(&mut *self.db, "attachments a", COLUMNS, filter, "a.created_at, a.id", &filter.pagination).await
    }

    #[instrument(skip(self), fields(attachment_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM attachments WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(attachment_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let attachment = sqlx::query_as::<_, AttachmentDBResponse>(&format!(
            "UPDATE attachments AS a SET
                file_name = COALESCE($2, file_name),
                file_path = COALESCE($3, file_path),
                updated_at = NOW()
             WHERE a.id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(&request.file_name)
        .bind(&request.file_path)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(attachment)
    }
}

impl<'c> Attachments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// All attachments of one record, oldest first
    #[instrument(skip(self), fields(entity_id = %abbrev_uuid(&entity_id)), err)]
    pub async fn list_for_entity(&mut self, entity_type: AttachmentEntity, entity_id: Uuid) -> Result<Vec<AttachmentDBResponse>> {
        let attachments = sqlx::query_as::<_, AttachmentDBResponse>(&format!(
            "SELECT {COLUMNS} FROM attachments a
             WHERE a.entity_type = $1 AND a.entity_id = $2
             ORDER BY a.created_at, a.id"
        ))
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(attachments)
    }

    /// Whether the record an attachment would point at exists
    #[instrument(skip(self), fields(entity_id = %abbrev_uuid(&entity_id)), err)]
    pub async fn entity_exists(&mut self, entity_type: AttachmentEntity, entity_id: Uuid) -> Result<bool> {
        let table = entity_type.table();
        let exists = sqlx::query_scalar::<_, bool>(&format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1)"))
            .bind(entity_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(exists)
    }
}
