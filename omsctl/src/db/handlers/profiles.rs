//! Database repository for staff profiles.

use crate::api::models::pagination::{PagedList, PaginationParams};
use crate::db::{
    errors::{DbError, Result},
    handlers::{
        repository::Repository,
        specification::{Criteria, Specification, fetch_page},
    },
    models::profiles::{ProfileCreateDBRequest, ProfileDBResponse, ProfileUpdateDBRequest},
};
use crate::types::{GovernorateId, OfficeId, ProfileId, UserId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

const JOINS: &str = "JOIN users u ON u.id = p.user_id \
     JOIN offices o ON o.id = p.office_id \
     JOIN governorates g ON g.id = p.governorate_id";

const COLUMNS: &str = "p.id, p.user_id, u.username, p.full_name, p.position, p.office_id, o.name AS office_name, \
     p.governorate_id, g.name AS governorate_name, p.created_at, p.updated_at";

/// Filter for listing and searching profiles
#[derive(Debug, Clone, Default)]
pub struct ProfileFilter {
    pub pagination: PaginationParams,
    pub office_id: Option<OfficeId>,
    pub governorate_id: Option<GovernorateId>,
    pub full_name: Option<String>,
}

impl Specification for ProfileFilter {
    fn apply(&self, criteria: &mut Criteria<'_, '_>) {
        criteria
            .eq("p.office_id", self.office_id)
            .eq("p.governorate_id", self.governorate_id)
            .contains("p.full_name", self.full_name.as_deref());
    }
}

pub struct Profiles<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Profiles<'c> {
    type CreateRequest = ProfileCreateDBRequest;
    type UpdateRequest = ProfileUpdateDBRequest;
    type Response = ProfileDBResponse;
    type Id = ProfileId;
    type Filter = ProfileFilter;

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>(&format!(
            "WITH p AS (
                INSERT INTO profiles (id, user_id, full_name, position, office_id, governorate_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
             )
             SELECT {COLUMNS} FROM p {JOINS}"
        ))
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(&request.full_name)
        .bind(&request.position)
        .bind(request.office_id)
        .bind(request.governorate_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(profile)
    }

    #[instrument(skip(self), fields(profile_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>(&format!("SELECT {COLUMNS} FROM profiles p {JOINS} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(profile)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<PagedList<Self::Response>> {
        let source = format!("profiles p {JOINS}");
        fetch_page(&mut *self.db, &source, COLUMNS, filter, "p.full_name, p.id", &filter.pagination).await
    }

    #[instrument(skip(self), fields(profile_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(profile_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>(&format!(
            "WITH p AS (
                UPDATE profiles SET
                    full_name = COALESCE($2, full_name),
                    position = COALESCE($3, position),
                    office_id = COALESCE($4, office_id),
                    governorate_id = COALESCE($5, governorate_id),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {COLUMNS} FROM p {JOINS}"
        ))
        .bind(id)
        .bind(&request.full_name)
        .bind(&request.position)
        .bind(request.office_id)
        .bind(request.governorate_id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(profile)
    }
}

impl<'c> Profiles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Profile belonging to a user account, if any
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_by_user_id(&mut self, user_id: UserId) -> Result<Option<ProfileDBResponse>> {
        let profile = sqlx::query_as::<_, ProfileDBResponse>(&format!("SELECT {COLUMNS} FROM profiles p {JOINS} WHERE p.user_id = $1"))
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::{create_test_governorate, create_test_office, create_test_user};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_lookup_by_user(pool: PgPool) {
        let governorate = create_test_governorate(&pool, "Dhi Qar").await;
        let office = create_test_office(&pool, governorate.id, 31).await;
        let user = create_test_user(&pool, Role::Supervisor).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Profiles::new(&mut conn);

        let profile = repo
            .create(&ProfileCreateDBRequest {
                user_id: user.id,
                full_name: "Ali Hassan".to_string(),
                position: Some("Clerk".to_string()),
                office_id: office.id,
                governorate_id: governorate.id,
            })
            .await
            .unwrap();

        assert_eq!(profile.username, user.username);
        assert_eq!(profile.office_name, office.name);
        assert_eq!(profile.governorate_name, "Dhi Qar");

        let by_user = repo.get_by_user_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_user.id, profile.id);
        assert!(repo.get_by_user_id(Uuid::new_v4()).await.unwrap().is_none());

        // One profile per user
        let second = repo
            .create(&ProfileCreateDBRequest {
                user_id: user.id,
                full_name: "Someone Else".to_string(),
                position: None,
                office_id: office.id,
                governorate_id: governorate.id,
            })
            .await;
        assert!(matches!(second, Err(DbError::UniqueViolation { .. })));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_and_search_profiles(pool: PgPool) {
        let governorate = create_test_governorate(&pool, "Muthanna").await;
        let first_office = create_test_office(&pool, governorate.id, 41).await;
        let second_office = create_test_office(&pool, governorate.id, 42).await;
        let first_user = create_test_user(&pool, Role::Supervisor).await;
        let second_user = create_test_user(&pool, Role::Manager).await;

        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Profiles::new(&mut conn);

        let first = repo
            .create(&ProfileCreateDBRequest {
                user_id: first_user.id,
                full_name: "Zainab Karim".to_string(),
                position: Some("Officer".to_string()),
                office_id: first_office.id,
                governorate_id: governorate.id,
            })
            .await
            .unwrap();
        repo.create(&ProfileCreateDBRequest {
            user_id: second_user.id,
            full_name: "Omar Salim".to_string(),
            position: None,
            office_id: second_office.id,
            governorate_id: governorate.id,
        })
        .await
        .unwrap();

        let moved = repo
            .update(
                first.id,
                &ProfileUpdateDBRequest {
                    office_id: Some(second_office.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.office_id, second_office.id);
        assert_eq!(moved.full_name, "Zainab Karim");
        assert_eq!(moved.position.as_deref(), Some("Officer"));

        let in_second = repo
            .list(&ProfileFilter {
                office_id: Some(second_office.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(in_second.total_count, 2);

        let by_name = repo
            .list(&ProfileFilter {
                full_name: Some("salim".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(by_name.items.len(), 1);
        assert_eq!(by_name.items[0].full_name, "Omar Salim");
    }
}
