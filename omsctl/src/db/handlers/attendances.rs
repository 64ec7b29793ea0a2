//! Database repository for attendance records and attendance statistics.

use crate::api::models::{
    attendances::{StaffType, WorkingHours},
    pagination::{PagedList, PaginationParams},
};
use crate::db::{
    errors::{DbError, Result},
    handlers::{
        repository::Repository,
        specification::{Criteria, Specification, fetch_page},
    },
    models::attendances::{
        AttendanceCreateDBRequest, AttendanceDBResponse, AttendanceTotalsDBResponse, AttendanceUpdateDBRequest,
        GovernorateAttendanceDBResponse, StaffTypeAvailabilityDBResponse, UnavailableOfficeDBResponse,
    },
};
use crate::types::{AttendanceId, GovernorateId, OfficeId, ProfileId, abbrev_uuid};
use chrono::NaiveDate;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

const JOINS: &str = "JOIN offices o ON o.id = a.office_id \
     JOIN governorates g ON g.id = a.governorate_id \
     JOIN profiles p ON p.id = a.profile_id";

const COLUMNS: &str = "a.id, a.date, a.working_hours, a.receiving_staff, a.account_staff, a.printing_staff, \
     a.quality_staff, a.delivery_staff, a.note, a.office_id, o.name AS office_name, a.governorate_id, \
     g.name AS governorate_name, a.profile_id, p.full_name AS profile_full_name, a.created_at, a.updated_at";

const TOTALS: &str = "COUNT(*) AS record_count, \
     COALESCE(SUM(a.receiving_staff), 0)::bigint AS receiving_staff, \
     COALESCE(SUM(a.account_staff), 0)::bigint AS account_staff, \
     COALESCE(SUM(a.printing_staff), 0)::bigint AS printing_staff, \
     COALESCE(SUM(a.quality_staff), 0)::bigint AS quality_staff, \
     COALESCE(SUM(a.delivery_staff), 0)::bigint AS delivery_staff";

/// Filter for listing, searching and aggregating attendance records
#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub pagination: PaginationParams,
    pub working_hours: Option<WorkingHours>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub office_id: Option<OfficeId>,
    pub governorate_id: Option<GovernorateId>,
    pub profile_id: Option<ProfileId>,
}

impl Specification for AttendanceFilter {
    fn apply(&self, criteria: &mut Criteria<'_, '_>) {
        criteria
            .eq("a.working_hours", self.working_hours)
            .on_or_after("a.date", self.start_date)
            .on_or_before("a.date", self.end_date)
            .eq("a.office_id", self.office_id)
            .eq("a.governorate_id", self.governorate_id)
            .eq("a.profile_id", self.profile_id);
    }
}

pub struct Attendances<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Attendances<'c> {
    type CreateRequest = AttendanceCreateDBRequest;
    type UpdateRequest = AttendanceUpdateDBRequest;
    type Response = AttendanceDBResponse;
    type Id = AttendanceId;
    type Filter = AttendanceFilter;

    #[instrument(skip(self, request), fields(office_id = %abbrev_uuid(&request.office_id), date = %request.date), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let attendance = sqlx::query_as::<_, AttendanceDBResponse>(&format!(
            "WITH a AS (
                INSERT INTO attendances (id, date, working_hours, receiving_staff, account_staff, printing_staff,
                                         quality_staff, delivery_staff, note, office_id, governorate_id, profile_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                RETURNING *
             )
             SELECT {COLUMNS} FROM a {JOINS}"
        ))
        .bind(Uuid::new_v4())
        .bind(request.date)
        .bind(request.working_hours)
        .bind(request.receiving_staff)
        .bind(request.account_staff)
        .bind(request.printing_staff)
        .bind(request.quality_staff)
        .bind(request.delivery_staff)
        .bind(&request.note)
        .bind(request.office_id)
        .bind(request.governorate_id)
        .bind(request.profile_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(attendance)
    }

    #[instrument(skip(self), fields(attendance_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let attendance = sqlx::query_as::<_, AttendanceDBResponse>(&format!("SELECT {COLUMNS} FROM attendances a {JOINS} WHERE a.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(attendance)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<PagedList<Self::Response>> {
        let source = format!("attendances a {JOINS}");
        fetch_page(&mut *self.db, &source, COLUMNS, filter, "a.date DESC, a.id", &filter.pagination).await
    }

    #[instrument(skip(self), fields(attendance_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM attendances WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(attendance_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let attendance = sqlx::query_as::<_, AttendanceDBResponse>(&format!(
            "WITH a AS (
                UPDATE attendances SET
                    date = COALESCE($2, date),
                    working_hours = COALESCE($3, working_hours),
                    receiving_staff = COALESCE($4, receiving_staff),
                    account_staff = COALESCE($5, account_staff),
                    printing_staff = COALESCE($6, printing_staff),
                    quality_staff = COALESCE($7, quality_staff),
                    delivery_staff = COALESCE($8, delivery_staff),
                    note = COALESCE($9, note),
                    office_id = COALESCE($10, office_id),
                    governorate_id = COALESCE($11, governorate_id),
                    profile_id = COALESCE($12, profile_id),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM a {JOINS}"
        ))
        .bind(id)
        .bind(request.date)
        .bind(request.working_hours)
        .bind(request.receiving_staff)
        .bind(request.account_staff)
        .bind(request.printing_staff)
        .bind(request.quality_staff)
        .bind(request.delivery_staff)
        .bind(&request.note)
        .bind(request.office_id)
        .bind(request.governorate_id)
        .bind(request.profile_id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(attendance)
    }
}

impl<'c> Attendances<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Record count and summed staff over every record matching the filter (pagination ignored)
    #[instrument(skip(self, filter), err)]
    pub async fn totals(&mut self, filter: &AttendanceFilter) -> Result<AttendanceTotalsDBResponse> {
        let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {TOTALS} FROM attendances a WHERE 1=1"));
        filter.apply(&mut Criteria::new(&mut query));

        let totals = query
            .build_query_as::<AttendanceTotalsDBResponse>()
            .fetch_one(&mut *self.db)
            .await?;

        Ok(totals)
    }

    /// Per governorate: number of offices, how many reported, and summed staff
    #[instrument(skip(self), err)]
    pub async fn governorate_statistics(
        &mut self,
        governorate_id: Option<GovernorateId>,
        date: Option<NaiveDate>,
        working_hours: Option<WorkingHours>,
    ) -> Result<Vec<GovernorateAttendanceDBResponse>> {
        let stats = sqlx::query_as::<_, GovernorateAttendanceDBResponse>(
            "SELECT g.id AS governorate_id, g.name AS governorate_name,
                    COUNT(DISTINCT o.id) AS office_count,
                    COUNT(DISTINCT a.office_id) AS reporting_office_count,
                    COALESCE(SUM(a.receiving_staff), 0)::bigint AS receiving_staff,
                    COALESCE(SUM(a.account_staff), 0)::bigint AS account_staff,
                    COALESCE(SUM(a.printing_staff), 0)::bigint AS printing_staff,
                    COALESCE(SUM(a.quality_staff), 0)::bigint AS quality_staff,
                    COALESCE(SUM(a.delivery_staff), 0)::bigint AS delivery_staff
             FROM governorates g
             LEFT JOIN offices o ON o.governorate_id = g.id
             LEFT JOIN attendances a ON a.office_id = o.id
                 AND ($2::date IS NULL OR a.date = $2)
                 AND ($3::working_hours IS NULL OR a.working_hours = $3)
             WHERE ($1::uuid IS NULL OR g.id = $1)
             GROUP BY g.id, g.name
             ORDER BY g.name, g.id",
        )
        .bind(governorate_id)
        .bind(date)
        .bind(working_hours)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(stats)
    }

    /// Offices with no attendance record for the date (and shift, when given)
    #[instrument(skip(self), err)]
    pub async fn unavailable_offices(
        &mut self,
        date: NaiveDate,
        working_hours: Option<WorkingHours>,
        governorate_id: Option<GovernorateId>,
    ) -> Result<Vec<UnavailableOfficeDBResponse>> {
        let offices = sqlx::query_as::<_, UnavailableOfficeDBResponse>(
            "SELECT o.id AS office_id, o.name AS office_name, o.code AS office_code, g.name AS governorate_name
             FROM offices o
             JOIN governorates g ON g.id = o.governorate_id
             WHERE ($3::uuid IS NULL OR o.governorate_id = $3)
               AND NOT EXISTS (
                   SELECT 1 FROM attendances a
                   WHERE a.office_id = o.id
                     AND a.date = $1
                     AND ($2::working_hours IS NULL OR a.working_hours = $2)
               )
             ORDER BY o.code, o.id",
        )
        .bind(date)
        .bind(working_hours)
        .bind(governorate_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(offices)
    }

    /// Per office: configured count of one staff type against the count reported on a date
    #[instrument(skip(self), err)]
    pub async fn staff_type_availability(
        &mut self,
        staff_type: StaffType,
        date: NaiveDate,
        working_hours: Option<WorkingHours>,
        governorate_id: Option<GovernorateId>,
        office_id: Option<OfficeId>,
    ) -> Result<Vec<StaffTypeAvailabilityDBResponse>> {
        let column = staff_type.column();
        let stats = sqlx::query_as::<_, StaffTypeAvailabilityDBResponse>(&format!(
            "SELECT o.id AS office_id, o.name AS office_name, g.name AS governorate_name,
                    o.{column}::bigint AS expected,
                    COALESCE(SUM(a.{column}), 0)::bigint AS available
             FROM offices o
             JOIN governorates g ON g.id = o.governorate_id
             LEFT JOIN attendances a ON a.office_id = o.id
                 AND a.date = $1
                 AND ($2::working_hours IS NULL OR a.working_hours = $2)
             WHERE ($3::uuid IS NULL OR o.governorate_id = $3)
               AND ($4::uuid IS NULL OR o.id = $4)
             GROUP BY o.id, o.name, o.code, g.name, o.{column}
             ORDER BY o.code, o.id"
        ))
        .bind(date)
        .bind(working_hours)
        .bind(governorate_id)
        .bind(office_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(stats)
    }
}
