//! Database repository for lectures.

use crate::api::models::pagination::{PagedList, PaginationParams};
use crate::db::{
    errors::{DbError, Result},
    handlers::{
        repository::Repository,
        specification::{Criteria, Specification, fetch_page},
    },
    models::lectures::{LectureCreateDBRequest, LectureDBResponse, LectureUpdateDBRequest},
};
use crate::types::{GovernorateId, LectureId, LovId, OfficeId, ProfileId, abbrev_uuid};
use chrono::NaiveDate;
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

// Company and lecture type are optional, hence the outer joins
const JOINS: &str = "JOIN offices o ON o.id = l.office_id \
     JOIN governorates g ON g.id = l.governorate_id \
     JOIN profiles p ON p.id = l.profile_id \
     LEFT JOIN companies c ON c.id = l.company_id \
     LEFT JOIN lecture_types lt ON lt.id = l.lecture_type_id";

const COLUMNS: &str = "l.id, l.title, l.date, l.note, l.office_id, o.name AS office_name, \
     l.governorate_id, g.name AS governorate_name, l.profile_id, p.full_name AS profile_full_name, \
     l.company_id, c.name AS company_name, l.lecture_type_id, lt.name AS lecture_type_name, \
     l.created_at, l.updated_at";

/// Filter for listing and searching lectures
#[derive(Debug, Clone, Default)]
pub struct LectureFilter {
    pub pagination: PaginationParams,
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub office_id: Option<OfficeId>,
    pub governorate_id: Option<GovernorateId>,
    pub profile_id: Option<ProfileId>,
    pub company_id: Option<LovId>,
    pub lecture_type_id: Option<LovId>,
}

impl Specification for LectureFilter {
    fn apply(&self, criteria: &mut Criteria<'_, '_>) {
        criteria
            .contains("l.title", self.title.as_deref())
            .on_or_after("l.date", self.start_date)
            .on_or_before("l.date", self.end_date)
            .eq("l.office_id", self.office_id)
            .eq("l.governorate_id", self.governorate_id)
            .eq("l.profile_id", self.profile_id)
            .eq("l.company_id", self.company_id)
            .eq("l.lecture_type_id", self.lecture_type_id);
    }
}

pub struct Lectures<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Lectures<'c> {
    type CreateRequest = LectureCreateDBRequest;
    type UpdateRequest = LectureUpdateDBRequest;
    type Response = LectureDBResponse;
    type Id = LectureId;
    type Filter = LectureFilter;

    #[instrument(skip(self, request), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let lecture = sqlx::query_as::<_, LectureDBResponse>(&format!(
            "WITH l AS (
                INSERT INTO lectures (id, title, date, note, office_id, governorate_id, profile_id,
                                      company_id, lecture_type_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
             )
             SELECT {COLUMNS} FROM l {JOINS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&request.title)
        .bind(request.date)
        .bind(&request.note)
        .bind(request.office_id)
        .bind(request.governorate_id)
        .bind(request.profile_id)
        .bind(request.company_id)
        .bind(request.lecture_type_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(lecture)
    }

    #[instrument(skip(self), fields(lecture_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let lecture = sqlx::query_as::<_, LectureDBResponse>(&format!("SELECT {COLUMNS} FROM lectures l {JOINS} WHERE l.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(lecture)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<PagedList<Self::Response>> {
        let source = format!("lectures l {JOINS}");
        fetch_page(&mut *self.db, &source, COLUMNS, filter, "l.date DESC, l.id", &filter.pagination).await
    }

    #[instrument(skip(self), fields(lecture_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM lectures WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(lecture_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let lecture = sqlx::query_as::<_, LectureDBResponse>(&format!(
            "WITH l AS (
                UPDATE lectures SET
                    title = COALESCE($2, title),
                    date = COALESCE($3, date),
                    note = COALESCE($4, note),
                    office_id = COALESCE($5, office_id),
                    governorate_id = COALESCE($6, governorate_id),
                    profile_id = COALESCE($7, profile_id),
                    company_id = COALESCE($8, company_id),
                    lecture_type_id = COALESCE($9, lecture_type_id),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM l {JOINS}"
        ))
        .bind(id)
        .bind(&request.title)
        .bind(request.date)
        .bind(&request.note)
        .bind(request.office_id)
        .bind(request.governorate_id)
        .bind(request.profile_id)
        .bind(request.company_id)
        .bind(request.lecture_type_id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(lecture)
    }
}

impl<'c> Lectures<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(lecture_id = %abbrev_uuid(&id)), err)]
    pub async fn exists(&mut self, id: LectureId) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM lectures WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(exists)
    }
}
