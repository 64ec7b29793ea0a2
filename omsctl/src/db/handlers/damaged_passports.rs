//! Database repository for damaged passports.

use crate::api::models::pagination::{PagedList, PaginationParams};
use crate::db::{
    errors::{DbError, Result},
    handlers::{
        repository::Repository,
        specification::{Criteria, Specification, fetch_page},
    },
    models::{
        damaged_devices::TypeCountDBResponse,
        damaged_passports::{DamagedPassportCreateDBRequest, DamagedPassportDBResponse, DamagedPassportUpdateDBRequest},
    },
};
use crate::types::{DamagedPassportId, GovernorateId, LovId, OfficeId, ProfileId, abbrev_uuid};
use chrono::NaiveDate;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

const JOINS: &str = "JOIN damaged_types dty ON dty.id = dp.damaged_type_id \
     JOIN offices o ON o.id = dp.office_id \
     JOIN governorates g ON g.id = dp.governorate_id \
     JOIN profiles p ON p.id = dp.profile_id";

const COLUMNS: &str = "dp.id, dp.passport_number, dp.full_name, dp.date, dp.damaged_type_id, dty.name AS damaged_type_name, \
     dp.note, dp.office_id, o.name AS office_name, dp.governorate_id, g.name AS governorate_name, \
     dp.profile_id, p.full_name AS profile_full_name, dp.created_at, dp.updated_at";

/// Filter for listing, searching and counting damaged passports
#[derive(Debug, Clone, Default)]
pub struct DamagedPassportFilter {
    pub pagination: PaginationParams,
    pub passport_number: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub damaged_type_id: Option<LovId>,
    pub office_id: Option<OfficeId>,
    pub governorate_id: Option<GovernorateId>,
    pub profile_id: Option<ProfileId>,
}

impl Specification for DamagedPassportFilter {
    fn apply(&self, criteria: &mut Criteria<'_, '_>) {
        criteria
            .contains("dp.passport_number", self.passport_number.as_deref())
            .on_or_after("dp.date", self.start_date)
            .on_or_before("dp.date", self.end_date)
            .eq("dp.damaged_type_id", self.damaged_type_id)
            .eq("dp.office_id", self.office_id)
            .eq("dp.governorate_id", self.governorate_id)
            .eq("dp.profile_id", self.profile_id);
    }
}

pub struct DamagedPassports<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for DamagedPassports<'c> {
    type CreateRequest = DamagedPassportCreateDBRequest;
    type UpdateRequest = DamagedPassportUpdateDBRequest;
    type Response = DamagedPassportDBResponse;
    type Id = DamagedPassportId;
    type Filter = DamagedPassportFilter;

    #[instrument(skip(self, request), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let passport = sqlx::query_as::<_, DamagedPassportDBResponse>(&format!(
            "WITH dp AS (
                INSERT INTO damaged_passports (id, passport_number, full_name, date, damaged_type_id, note,
                                               office_id, governorate_id, profile_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
             )
             SELECT {COLUMNS} FROM dp {JOINS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&request.passport_number)
        .bind(&request.full_name)
        .bind(request.date)
        .bind(request.damaged_type_id)
        .bind(&request.note)
        .bind(request.office_id)
        .bind(request.governorate_id)
        .bind(request.profile_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(passport)
    }

    #[instrument(skip(self), fields(damaged_passport_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let passport =
            sqlx::query_as::<_, DamagedPassportDBResponse>(&format!("SELECT {COLUMNS} FROM damaged_passports dp {JOINS} WHERE dp.id = $1"))
                .bind(id)
                .fetch_optional(&mut *self.db)
                .await?;

        Ok(passport)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<PagedList<Self::Response>> {
        let source = format!("damaged_passports dp {JOINS}");
        fetch_page(&mut *self.db, &source, COLUMNS, filter, "dp.date DESC, dp.id", &filter.pagination).await
    }

    #[instrument(skip(self), fields(damaged_passport_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM damaged_passports WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(damaged_passport_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let passport = sqlx::query_as::<_, DamagedPassportDBResponse>(&format!(
            "WITH dp AS (
                UPDATE damaged_passports SET
                    passport_number = COALESCE($2, passport_number),
                    full_name = COALESCE($3, full_name),
                    date = COALESCE($4, date),
                    damaged_type_id = COALESCE($5, damaged_type_id),
                    note = COALESCE($6, note),
                    office_id = COALESCE($7, office_id),
                    governorate_id = COALESCE($8, governorate_id),
                    profile_id = COALESCE($9, profile_id),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM dp {JOINS}"
        ))
        .bind(id)
        .bind(&request.passport_number)
        .bind(&request.full_name)
        .bind(request.date)
        .bind(request.damaged_type_id)
        .bind(&request.note)
        .bind(request.office_id)
        .bind(request.governorate_id)
        .bind(request.profile_id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(passport)
    }
}

impl<'c> DamagedPassports<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Serialise writers of one passport number until the surrounding transaction ends.
    ///
    /// Only meaningful inside a transaction; on a bare connection the lock is released at once.
    #[instrument(skip(self, passport_number), err)]
    pub async fn lock_passport_number(&mut self, passport_number: &str) -> Result<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext('damaged_passports:' || $1))")
            .bind(passport_number)
            .execute(&mut *self.db)
            .await?;

        Ok(())
    }

    /// Whether a passport number has already been recorded
    #[instrument(skip(self, passport_number), err)]
    pub async fn passport_number_exists(&mut self, passport_number: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM damaged_passports WHERE passport_number = $1)")
            .bind(passport_number)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(exists)
    }

    /// Count matching records per damaged type (pagination ignored)
    #[instrument(skip(self, filter), err)]
    pub async fn count_by_type(&mut self, filter: &DamagedPassportFilter) -> Result<Vec<TypeCountDBResponse>> {
        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT dty.id AS type_id, dty.name AS type_name, COUNT(*) AS count
             FROM damaged_passports dp
             JOIN damaged_types dty ON dty.id = dp.damaged_type_id
             WHERE 1=1",
        );
        filter.apply(&mut Criteria::new(&mut query));
        query.push(" GROUP BY dty.id, dty.name ORDER BY dty.name, dty.id");

        let counts = query.build_query_as::<TypeCountDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(counts)
    }
}
