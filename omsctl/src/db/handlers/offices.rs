//! Database repository for offices.

use crate::api::models::pagination::{PagedList, PaginationParams};
use crate::db::{
    errors::{DbError, Result},
    handlers::{
        repository::Repository,
        specification::{Criteria, Specification, fetch_page},
    },
    models::offices::{OfficeCreateDBRequest, OfficeDBResponse, OfficeStatisticsDBResponse, OfficeUpdateDBRequest},
};
use crate::types::{GovernorateId, OfficeId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

const SOURCE: &str = "offices o JOIN governorates g ON g.id = o.governorate_id";

const COLUMNS: &str = "o.id, o.name, o.code, o.governorate_id, g.name AS governorate_name, \
     o.receiving_staff, o.account_staff, o.printing_staff, o.quality_staff, o.delivery_staff, \
     o.created_at, o.updated_at";

const STATISTICS_COLUMNS: &str = "o.id, o.name, o.receiving_staff, o.account_staff, o.printing_staff, o.quality_staff, o.delivery_staff";

/// Filter for listing offices
#[derive(Debug, Clone, Default)]
pub struct OfficeFilter {
    pub pagination: PaginationParams,
    pub governorate_id: Option<GovernorateId>,
    pub name: Option<String>,
}

impl Specification for OfficeFilter {
    fn apply(&self, criteria: &mut Criteria<'_, '_>) {
        criteria
            .eq("o.governorate_id", self.governorate_id)
            .contains("o.name", self.name.as_deref());
    }
}

pub struct Offices<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Offices<'c> {
    type CreateRequest = OfficeCreateDBRequest;
    type UpdateRequest = OfficeUpdateDBRequest;
    type Response = OfficeDBResponse;
    type Id = OfficeId;
    type Filter = OfficeFilter;

    #[instrument(skip(self, request), fields(name = %request.name, code = request.code), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let office = sqlx::query_as::<_, OfficeDBResponse>(&format!(
            "WITH o AS (
                INSERT INTO offices (id, name, code, governorate_id, receiving_staff, account_staff, printing_staff, quality_staff, delivery_staff)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
             )
             SELECT {COLUMNS} FROM o JOIN governorates g ON g.id = o.governorate_id"
        ))
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(request.code)
        .bind(request.governorate_id)
        .bind(request.receiving_staff)
        .bind(request.account_staff)
        .bind(request.printing_staff)
        .bind(request.quality_staff)
        .bind(request.delivery_staff)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(office)
    }

    #[instrument(skip(self), fields(office_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let office = sqlx::query_as::<_, OfficeDBResponse>(&format!("SELECT {COLUMNS} FROM {SOURCE} WHERE o.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(office)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<PagedList<Self::Response>> {
        fetch_page(&mut *self.db, SOURCE, COLUMNS, filter, "o.code, o.id", &filter.pagination).await
    }

    #[instrument(skip(self), fields(office_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM offices WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(office_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let office = sqlx::query_as::<_, OfficeDBResponse>(&format!(
            "WITH o AS (
                UPDATE offices SET
                    name = COALESCE($2, name),
                    code = COALESCE($3, code),
                    governorate_id = COALESCE($4, governorate_id),
                    receiving_staff = COALESCE($5, receiving_staff),
                    account_staff = COALESCE($6, account_staff),
                    printing_staff = COALESCE($7, printing_staff),
                    quality_staff = COALESCE($8, quality_staff),
                    delivery_staff = COALESCE($9, delivery_staff),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM o JOIN governorates g ON g.id = o.governorate_id"
        ))
        .bind(id)
        .bind(&request.name)
        .bind(request.code)
        .bind(request.governorate_id)
        .bind(request.receiving_staff)
        .bind(request.account_staff)
        .bind(request.printing_staff)
        .bind(request.quality_staff)
        .bind(request.delivery_staff)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(office)
    }
}

impl<'c> Offices<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Configured staffing of a single office
    #[instrument(skip(self), fields(office_id = %abbrev_uuid(&id)), err)]
    pub async fn statistics(&mut self, id: OfficeId) -> Result<Option<OfficeStatisticsDBResponse>> {
        let stats = sqlx::query_as::<_, OfficeStatisticsDBResponse>(&format!("SELECT {STATISTICS_COLUMNS} FROM offices o WHERE o.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(stats)
    }

    /// Configured staffing of every office, optionally restricted to one governorate
    #[instrument(skip(self), err)]
    pub async fn statistics_by_governorate(&mut self, governorate_id: Option<GovernorateId>) -> Result<Vec<OfficeStatisticsDBResponse>> {
        let stats = sqlx::query_as::<_, OfficeStatisticsDBResponse>(&format!(
            "SELECT {STATISTICS_COLUMNS} FROM offices o
             WHERE ($1::uuid IS NULL OR o.governorate_id = $1)
             ORDER BY o.code, o.id"
        ))
        .bind(governorate_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(stats)
    }

    /// Whether an office exists and belongs to the given governorate
    #[instrument(skip(self), err)]
    pub async fn belongs_to(&mut self, office_id: OfficeId, governorate_id: GovernorateId) -> Result<bool> {
        let found = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM offices WHERE id = $1 AND governorate_id = $2)")
            .bind(office_id)
            .bind(governorate_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(found)
    }

    /// Whether any profile, attendance, damage report or lecture is filed under the office
    #[instrument(skip(self), fields(office_id = %abbrev_uuid(&id)), err)]
    pub async fn has_dependents(&mut self, id: OfficeId) -> Result<bool> {
        let found = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM profiles WHERE office_id = $1)
                 OR EXISTS(SELECT 1 FROM attendances WHERE office_id = $1)
                 OR EXISTS(SELECT 1 FROM damaged_devices WHERE office_id = $1)
                 OR EXISTS(SELECT 1 FROM damaged_passports WHERE office_id = $1)
                 OR EXISTS(SELECT 1 FROM lectures WHERE office_id = $1)
                 OR EXISTS(SELECT 1 FROM monthly_expenses WHERE office_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_governorate;
    use sqlx::PgPool;

    fn create_request(name: &str, code: i32, governorate_id: GovernorateId) -> OfficeCreateDBRequest {
        OfficeCreateDBRequest {
            name: name.to_string(),
            code,
            governorate_id,
            receiving_staff: 4,
            account_staff: 3,
            printing_staff: 2,
            quality_staff: 1,
            delivery_staff: 5,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_office_includes_governorate_name(pool: PgPool) {
        let governorate = create_test_governorate(&pool, "Babil").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Offices::new(&mut conn);

        let office = repo.create(&create_request("Hilla", 101, governorate.id)).await.unwrap();
        assert_eq!(office.governorate_name, "Babil");
        assert_eq!(office.receiving_staff, 4);
        assert_eq!(office.delivery_staff, 5);

        let duplicate = repo.create(&create_request("Hilla 2", 101, governorate.id)).await;
        assert!(matches!(duplicate, Err(DbError::UniqueViolation { .. })));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_negative_staff_is_check_violation(pool: PgPool) {
        let governorate = create_test_governorate(&pool, "Wasit").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Offices::new(&mut conn);

        let mut request = create_request("Kut", 7, governorate.id);
        request.quality_staff = -1;
        assert!(matches!(repo.create(&request).await, Err(DbError::CheckViolation { .. })));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_only_changes_supplied_fields(pool: PgPool) {
        let governorate = create_test_governorate(&pool, "Anbar").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Offices::new(&mut conn);

        let office = repo.create(&create_request("Ramadi", 55, governorate.id)).await.unwrap();
        let updated = repo
            .update(
                office.id,
                &OfficeUpdateDBRequest {
                    printing_staff: Some(9),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.printing_staff, 9);
        assert_eq!(updated.name, "Ramadi");
        assert_eq!(updated.code, 55);
        assert_eq!(updated.receiving_staff, office.receiving_staff);
        assert_eq!(updated.governorate_id, governorate.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_and_statistics_by_governorate(pool: PgPool) {
        let north = create_test_governorate(&pool, "Nineveh").await;
        let south = create_test_governorate(&pool, "Maysan").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Offices::new(&mut conn);

        repo.create(&create_request("Mosul A", 1, north.id)).await.unwrap();
        repo.create(&create_request("Mosul B", 2, north.id)).await.unwrap();
        let amarah = repo.create(&create_request("Amarah", 3, south.id)).await.unwrap();

        let all = repo.list(&OfficeFilter::default()).await.unwrap();
        assert_eq!(all.total_count, 3);

        let north_only = repo
            .list(&OfficeFilter {
                governorate_id: Some(north.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(north_only.total_count, 2);

        let by_name = repo
            .list(&OfficeFilter {
                name: Some("mosul b".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_name.items.len(), 1);

        assert_eq!(repo.statistics_by_governorate(None).await.unwrap().len(), 3);
        assert_eq!(repo.statistics_by_governorate(Some(south.id)).await.unwrap().len(), 1);

        let stats = repo.statistics(amarah.id).await.unwrap().unwrap();
        assert_eq!(stats.name, "Amarah");
        assert_eq!(stats.account_staff, 3);

        assert!(repo.belongs_to(amarah.id, south.id).await.unwrap());
        assert!(!repo.belongs_to(amarah.id, north.id).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_governorate_with_offices_cannot_be_deleted(pool: PgPool) {
        use crate::db::handlers::Governorates;

        let governorate = create_test_governorate(&pool, "Kirkuk").await;
        let mut conn = pool.acquire().await.unwrap();
        Offices::new(&mut conn)
            .create(&create_request("Kirkuk Central", 12, governorate.id))
            .await
            .unwrap();

        let result = Governorates::new(&mut conn).delete(governorate.id).await;
        assert!(matches!(result, Err(DbError::ForeignKeyViolation { .. })));
    }
}
