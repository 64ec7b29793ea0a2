//! Database repository for damaged devices.

use crate::api::models::pagination::{PagedList, PaginationParams};
use crate::db::{
    errors::{DbError, Result},
    handlers::{
        repository::Repository,
        specification::{Criteria, Specification, fetch_page},
    },
    models::damaged_devices::{DamagedDeviceCreateDBRequest, DamagedDeviceDBResponse, DamagedDeviceUpdateDBRequest, TypeCountDBResponse},
};
use crate::types::{DamagedDeviceId, GovernorateId, LovId, OfficeId, ProfileId, abbrev_uuid};
use chrono::NaiveDate;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

const JOINS: &str = "JOIN damaged_device_types ddt ON ddt.id = d.damaged_device_type_id \
     JOIN device_types dt ON dt.id = d.device_type_id \
     JOIN offices o ON o.id = d.office_id \
     JOIN governorates g ON g.id = d.governorate_id \
     JOIN profiles p ON p.id = d.profile_id";

const COLUMNS: &str = "d.id, d.serial_number, d.date, d.damaged_device_type_id, ddt.name AS damaged_device_type_name, \
     d.device_type_id, dt.name AS device_type_name, d.note, d.office_id, o.name AS office_name, \
     d.governorate_id, g.name AS governorate_name, d.profile_id, p.full_name AS profile_full_name, \
     d.created_at, d.updated_at";

/// Filter for listing, searching and counting damaged devices
#[derive(Debug, Clone, Default)]
pub struct DamagedDeviceFilter {
    pub pagination: PaginationParams,
    pub serial_number: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub damaged_device_type_id: Option<LovId>,
    pub device_type_id: Option<LovId>,
    pub office_id: Option<OfficeId>,
    pub governorate_id: Option<GovernorateId>,
    pub profile_id: Option<ProfileId>,
}

impl Specification for DamagedDeviceFilter {
    fn apply(&self, criteria: &mut Criteria<'_, '_>) {
        criteria
            .contains("d.serial_number", self.serial_number.as_deref())
            .on_or_after("d.date", self.start_date)
            .on_or_before("d.date", self.end_date)
            .eq("d.damaged_device_type_id", self.damaged_device_type_id)
            .eq("d.device_type_id", self.device_type_id)
            .eq("d.office_id", self.office_id)
            .eq("d.governorate_id", self.governorate_id)
            .eq("d.profile_id", self.profile_id);
    }
}

pub struct DamagedDevices<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for DamagedDevices<'c> {
    type CreateRequest = DamagedDeviceCreateDBRequest;
    type UpdateRequest = DamagedDeviceUpdateDBRequest;
    type Response = DamagedDeviceDBResponse;
    type Id = DamagedDeviceId;
    type Filter = DamagedDeviceFilter;

    #[instrument(skip(self, request), fields(serial_number = %request.serial_number), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let device = sqlx::query_as::<_, DamagedDeviceDBResponse>(&format!(
            "WITH d AS (
                INSERT INTO damaged_devices (id, serial_number, date, damaged_device_type_id, device_type_id, note,
                                             office_id, governorate_id, profile_id)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING *
             )
             SELECT {COLUMNS} FROM d {JOINS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&request.serial_number)
        .bind(request.date)
        .bind(request.damaged_device_type_id)
        .bind(request.device_type_id)
        .bind(&request.note)
        .bind(request.office_id)
        .bind(request.governorate_id)
        .bind(request.profile_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(device)
    }

    #[instrument(skip(self), fields(damaged_device_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let device = sqlx::query_as::<_, DamagedDeviceDBResponse>(&format!("SELECT {COLUMNS} FROM damaged_devices d {JOINS} WHERE d.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(device)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<PagedList<Self::Response>> {
        let source = format!("damaged_devices d {JOINS}");
        fetch_page(&mut *self.db, &source, COLUMNS, filter, "d.date DESC, d.id", &filter.pagination).await
    }

    #[instrument(skip(self), fields(damaged_device_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM damaged_devices WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(damaged_device_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let device = sqlx::query_as::<_, DamagedDeviceDBResponse>(&format!(
            "WITH d AS (
                UPDATE damaged_devices SET
                    serial_number = COALESCE($2, serial_number),
                    date = COALESCE($3, date),
                    damaged_device_type_id = COALESCE($4, damaged_device_type_id),
                    device_type_id = COALESCE($5, device_type_id),
                    note = COALESCE($6, note),
                    office_id = COALESCE($7, office_id),
                    governorate_id = COALESCE($8, governorate_id),
                    profile_id = COALESCE($9, profile_id),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM d {JOINS}"
        ))
        .bind(id)
        .bind(&request.serial_number)
        .bind(request.date)
        .bind(request.damaged_device_type_id)
        .bind(request.device_type_id)
        .bind(&request.note)
        .bind(request.office_id)
        .bind(request.governorate_id)
        .bind(request.profile_id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(device)
    }
}

impl<'c> DamagedDevices<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Every record with exactly this serial number, newest first
    #[instrument(skip(self), err)]
    pub async fn get_by_serial_number(&mut self, serial_number: &str) -> Result<Vec<DamagedDeviceDBResponse>> {
        let devices = sqlx::query_as::<_, DamagedDeviceDBResponse>(&format!(
            "SELECT {COLUMNS} FROM damaged_devices d {JOINS} WHERE d.serial_number = $1 ORDER BY d.date DESC, d.id"
        ))
        .bind(serial_number)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(devices)
    }

    /// Count matching records per damaged device type (pagination ignored)
    #[instrument(skip(self, filter), err)]
    pub async fn count_by_type(&mut self, filter: &DamagedDeviceFilter) -> Result<Vec<TypeCountDBResponse>> {
        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT ddt.id AS type_id, ddt.name AS type_name, COUNT(*) AS count
             FROM damaged_devices d
             JOIN damaged_device_types ddt ON ddt.id = d.damaged_device_type_id
             WHERE 1=1",
        );
        filter.apply(&mut Criteria::new(&mut query));
        query.push(" GROUP BY ddt.id, ddt.name ORDER BY ddt.name, ddt.id");

        let counts = query.build_query_as::<TypeCountDBResponse>().fetch_all(&mut *self.db).await?;

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::lov::LovKind;
    use crate::test_utils::{TestSite, create_test_lov, create_test_site};
    use sqlx::PgPool;

    struct Types {
        screen: LovId,
        battery: LovId,
        laptop: LovId,
    }

    async fn create_types(pool: &PgPool) -> Types {
        Types {
            screen: create_test_lov(pool, LovKind::DamagedDeviceTypes, "Broken screen").await.id,
            battery: create_test_lov(pool, LovKind::DamagedDeviceTypes, "Dead battery").await.id,
            laptop: create_test_lov(pool, LovKind::DeviceTypes, "Laptop").await.id,
        }
    }

    fn create_request(site: &TestSite, serial: &str, damage: LovId, device: LovId, d: u32) -> DamagedDeviceCreateDBRequest {
        DamagedDeviceCreateDBRequest {
            serial_number: serial.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 4, d).unwrap(),
            damaged_device_type_id: damage,
            device_type_id: device,
            note: None,
            office_id: site.office.id,
            governorate_id: site.governorate.id,
            profile_id: site.profile.id,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_serial_numbers_may_repeat(pool: PgPool) {
        let site = create_test_site(&pool).await;
        let types = create_types(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = DamagedDevices::new(&mut conn);

        let first = repo.create(&create_request(&site, "SN-1", types.screen, types.laptop, 1)).await.unwrap();
        repo.create(&create_request(&site, "SN-1", types.battery, types.laptop, 2)).await.unwrap();
        repo.create(&create_request(&site, "SN-2", types.screen, types.laptop, 3)).await.unwrap();

        assert_eq!(first.damaged_device_type_name, "Broken screen");
        assert_eq!(first.device_type_name, "Laptop");

        let history = repo.get_by_serial_number("SN-1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].damaged_device_type_id, types.battery);

        assert!(repo.get_by_serial_number("SN-404").await.unwrap().is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_search_and_count_by_type(pool: PgPool) {
        let site = create_test_site(&pool).await;
        let types = create_types(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = DamagedDevices::new(&mut conn);

        repo.create(&create_request(&site, "AB-100", types.screen, types.laptop, 1)).await.unwrap();
        repo.create(&create_request(&site, "AB-200", types.screen, types.laptop, 10)).await.unwrap();
        repo.create(&create_request(&site, "XY-300", types.battery, types.laptop, 20)).await.unwrap();

        let all = repo.list(&DamagedDeviceFilter::default()).await.unwrap();
        assert_eq!(all.total_count, 3);

        let by_serial = repo
            .list(&DamagedDeviceFilter {
                serial_number: Some("ab-".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_serial.total_count, 2);

        let by_date = repo
            .list(&DamagedDeviceFilter {
                start_date: NaiveDate::from_ymd_opt(2025, 4, 5),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_date.total_count, 2);

        let counts = repo.count_by_type(&DamagedDeviceFilter::default()).await.unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].type_name, "Broken screen");
        assert_eq!(counts[0].count, 2);
        assert_eq!(counts[1].count, 1);

        let only_battery = repo
            .count_by_type(&DamagedDeviceFilter {
                damaged_device_type_id: Some(types.battery),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(only_battery.len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_only_changes_supplied_fields(pool: PgPool) {
        let site = create_test_site(&pool).await;
        let types = create_types(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = DamagedDevices::new(&mut conn);

        let created = repo.create(&create_request(&site, "CD-1", types.screen, types.laptop, 4)).await.unwrap();
        let updated = repo
            .update(
                created.id,
                &DamagedDeviceUpdateDBRequest {
                    damaged_device_type_id: Some(types.battery),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.damaged_device_type_name, "Dead battery");
        assert_eq!(updated.serial_number, "CD-1");
        assert_eq!(updated.date, created.date);
        assert_eq!(updated.device_type_id, created.device_type_id);

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
    }
}
