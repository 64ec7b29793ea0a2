//! Database repository for users.

use crate::api::models::pagination::{PagedList, PaginationParams};
use crate::types::{UserId, abbrev_uuid};
use crate::{
    api::models::users::Role,
    db::{
        errors::{DbError, Result},
        handlers::{
            repository::Repository,
            specification::{Criteria, Specification, fetch_page},
        },
        models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
    },
};
use chrono::{DateTime, Utc};
use sqlx::{Connection, FromRow, PgConnection};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

const COLUMNS: &str = "u.id, u.username, u.email, u.created_at, u.updated_at";

/// Filter for listing users
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub pagination: PaginationParams,
    pub search: Option<String>,
}

impl Specification for UserFilter {
    fn apply(&self, criteria: &mut Criteria<'_, '_>) {
        criteria.contains_any(&["u.username", "u.email"], self.search.as_deref());
    }
}

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Roles and permission codes held by a set of users
#[derive(Debug, Default)]
struct Grants {
    roles: HashMap<UserId, Vec<Role>>,
    permissions: HashMap<UserId, Vec<String>>,
}

impl Grants {
    fn attach(&mut self, user: User) -> UserDBResponse {
        UserDBResponse {
            roles: self.roles.remove(&user.id).unwrap_or_default(),
            permissions: self.permissions.remove(&user.id).unwrap_or_default(),
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(username = %request.username), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let user_id = Uuid::new_v4();

        let mut tx = self.db.begin().await?;
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, username, email) VALUES ($1, $2, $3)
             RETURNING id, username, email, created_at, updated_at",
        )
        .bind(user_id)
        .bind(&request.username)
        .bind(&request.email)
        .fetch_one(&mut *tx)
        .await?;

        replace_roles(&mut tx, user_id, &request.roles).await?;
        replace_permissions(&mut tx, user_id, &request.permissions).await?;

        tx.commit().await?;

        let mut grants = self.load_grants(&[user_id]).await?;
        Ok(grants.attach(user))
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users u WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        match user {
            Some(user) => {
                let mut grants = self.load_grants(&[user.id]).await?;
                Ok(Some(grants.attach(user)))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<PagedList<Self::Response>> {
        let page = fetch_page::<User>(&mut *self.db, "users u", COLUMNS, filter, "u.username, u.id", &filter.pagination).await?;

        let ids: Vec<UserId> = page.items.iter().map(|u| u.id).collect();
        let mut grants = self.load_grants(&ids).await?;

        Ok(page.map(|user| grants.attach(user)))
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // This update touches multiple tables, so regardless of the connection passed in, we still need a transaction.
        let user;
        {
            let mut tx = self.db.begin().await?;

            user = sqlx::query_as::<_, User>(
                "UPDATE users SET
                    username = COALESCE($2, username),
                    email = COALESCE($3, email),
                    updated_at = NOW()
                 WHERE id = $1
                 RETURNING id, username, email, created_at, updated_at",
            )
            .bind(id)
            .bind(&request.username)
            .bind(&request.email)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?;

            if let Some(roles) = &request.roles {
                replace_roles(&mut tx, id, roles).await?;
            }
            if let Some(permissions) = &request.permissions {
                replace_permissions(&mut tx, id, permissions).await?;
            }

            tx.commit().await?;
        }

        let mut grants = self.load_grants(&[id]).await?;
        Ok(grants.attach(user))
    }
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_username(&mut self, username: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users u WHERE u.username = $1"))
            .bind(username)
            .fetch_optional(&mut *self.db)
            .await?;

        match user {
            Some(user) => {
                let mut grants = self.load_grants(&[user.id]).await?;
                Ok(Some(grants.attach(user)))
            }
            None => Ok(None),
        }
    }

    async fn load_grants(&mut self, ids: &[UserId]) -> Result<Grants> {
        let mut grants = Grants::default();
        if ids.is_empty() {
            return Ok(grants);
        }

        let roles = sqlx::query_as::<_, (UserId, Role)>("SELECT user_id, role FROM user_roles WHERE user_id = ANY($1) ORDER BY role")
            .bind(ids.to_vec())
            .fetch_all(&mut *self.db)
            .await?;
        for (user_id, role) in roles {
            grants.roles.entry(user_id).or_default().push(role);
        }

        let permissions = sqlx::query_as::<_, (UserId, String)>(
            "SELECT user_id, permission FROM user_permissions WHERE user_id = ANY($1) ORDER BY permission",
        )
        .bind(ids.to_vec())
        .fetch_all(&mut *self.db)
        .await?;
        for (user_id, permission) in permissions {
            grants.permissions.entry(user_id).or_default().push(permission);
        }

        Ok(grants)
    }
}

async fn replace_roles(conn: &mut PgConnection, user_id: UserId, roles: &[Role]) -> Result<()> {
    sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    for role in roles {
        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .bind(role)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn replace_permissions(conn: &mut PgConnection, user_id: UserId, permissions: &[String]) -> Result<()> {
    sqlx::query("DELETE FROM user_permissions WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    for permission in permissions {
        sqlx::query("INSERT INTO user_permissions (user_id, permission) VALUES ($1, $2) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .bind(permission)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn create_request(username: &str, roles: Vec<Role>, permissions: &[&str]) -> UserCreateDBRequest {
        UserCreateDBRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            roles,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_user_with_grants(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let user = repo
            .create(&create_request("supervisor1", vec![Role::Supervisor], &["Ar", "Ac"]))
            .await
            .unwrap();

        assert_eq!(user.username, "supervisor1");
        assert_eq!(user.roles, vec![Role::Supervisor]);
        assert_eq!(user.permissions, vec!["Ac".to_string(), "Ar".to_string()]);

        let fetched = repo.get_by_username("supervisor1").await.unwrap().unwrap();
        assert_eq!(fetched.id, user.id);
        assert_eq!(fetched.permissions, user.permissions);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_username_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        repo.create(&create_request("dup", vec![], &[])).await.unwrap();
        let mut again = create_request("dup", vec![], &[]);
        again.email = "other@example.com".to_string();

        let err = repo.create(&again).await.unwrap_err();
        match err {
            DbError::UniqueViolation { constraint, .. } => assert_eq!(constraint.as_deref(), Some("users_username_unique")),
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_replaces_only_supplied_sets(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let user = repo
            .create(&create_request("manager1", vec![Role::Manager], &["Lr"]))
            .await
            .unwrap();

        // Only permissions supplied: roles and username stay
        let updated = repo
            .update(
                user.id,
                &UserUpdateDBRequest {
                    permissions: Some(vec!["DPr".to_string(), "DPc".to_string()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.username, "manager1");
        assert_eq!(updated.roles, vec![Role::Manager]);
        assert_eq!(updated.permissions, vec!["DPc".to_string(), "DPr".to_string()]);

        // Empty role set clears roles
        let updated = repo
            .update(
                user.id,
                &UserUpdateDBRequest {
                    roles: Some(vec![]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.roles.is_empty());
        assert_eq!(updated.permissions.len(), 2);

        let missing = repo.update(Uuid::new_v4(), &UserUpdateDBRequest::default()).await;
        assert!(matches!(missing, Err(DbError::NotFound)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_users_with_search(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        repo.create(&create_request("alice", vec![Role::Admin], &[])).await.unwrap();
        repo.create(&create_request("bob", vec![Role::Manager], &["Or"])).await.unwrap();
        repo.create(&create_request("carol", vec![], &[])).await.unwrap();

        let all = repo.list(&UserFilter::default()).await.unwrap();
        assert_eq!(all.total_count, 3);
        assert_eq!(all.items[1].username, "bob");
        assert_eq!(all.items[1].permissions, vec!["Or".to_string()]);

        let found = repo
            .list(&UserFilter {
                search: Some("CAROL@".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.items.len(), 1);
        assert_eq!(found.items[0].username, "carol");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_user_cascades_grants(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);

        let user = repo
            .create(&create_request("temp", vec![Role::Supervisor], &["Ar"]))
            .await
            .unwrap();
        assert!(repo.delete(user.id).await.unwrap());
        assert!(repo.get_by_id(user.id).await.unwrap().is_none());

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM user_permissions WHERE user_id = $1")
            .bind(user.id)
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
