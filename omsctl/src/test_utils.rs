//! Fixtures shared by repository and HTTP tests.

use crate::{
    api::models::{
        lov::LovKind,
        users::{CurrentUser, Role},
    },
    auth::session::create_session_token,
    config::{Config, DatabaseConfig, PoolSettings},
    db::{
        handlers::{Governorates, Lovs, Offices, Profiles, Repository, Users},
        models::{
            governorates::{GovernorateCreateDBRequest, GovernorateDBResponse},
            lov::{LovCreateDBRequest, LovDBResponse},
            offices::{OfficeCreateDBRequest, OfficeDBResponse},
            profiles::{ProfileCreateDBRequest, ProfileDBResponse},
            users::{UserCreateDBRequest, UserDBResponse},
        },
    },
    types::GovernorateId,
};
use axum_test::TestServer;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create_test_app(pool: PgPool) -> TestServer {
    let config = create_test_config();

    let app = crate::Application::new_with_pool(config, Some(pool))
        .await
        .expect("Failed to create application");

    app.into_test_server()
}

pub fn create_test_config() -> Config {
    Config {
        database_url: None,
        database: DatabaseConfig {
            // The test pool is handed to the application directly
            url: None,
            pool: PoolSettings {
                max_connections: 1,
                min_connections: 1,
                ..Default::default()
            },
        },
        host: "127.0.0.1".to_string(),
        port: 0,
        admin_username: "admin".to_string(),
        admin_email: "admin@test.com".to_string(),
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        ..Default::default()
    }
}

pub async fn create_test_user(pool: &PgPool, role: Role) -> UserDBResponse {
    create_test_user_with_permissions(pool, role, &[]).await
}

pub async fn create_test_user_with_permissions(pool: &PgPool, role: Role, permissions: &[&str]) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);
    let username = format!("testuser_{}", Uuid::new_v4().simple());

    let user_create = UserCreateDBRequest {
        email: format!("{username}@example.com"),
        username,
        roles: vec![role],
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
    };

    users_repo.create(&user_create).await.expect("Failed to create test user")
}

/// `Authorization` header value carrying a freshly signed token for `user`
pub fn bearer_token(user: &UserDBResponse) -> String {
    let current_user = CurrentUser::from(user.clone());
    let token = create_session_token(&current_user, &create_test_config()).expect("Failed to sign test token");
    format!("Bearer {token}")
}

pub async fn create_test_governorate(pool: &PgPool, name: &str) -> GovernorateDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Governorates::new(&mut conn)
        .create(&GovernorateCreateDBRequest {
            name: name.to_string(),
            code: None,
        })
        .await
        .expect("Failed to create test governorate")
}

pub async fn create_test_office(pool: &PgPool, governorate_id: GovernorateId, code: i32) -> OfficeDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Offices::new(&mut conn)
        .create(&OfficeCreateDBRequest {
            name: format!("Office {code}"),
            code,
            governorate_id,
            receiving_staff: 3,
            account_staff: 2,
            printing_staff: 2,
            quality_staff: 1,
            delivery_staff: 4,
        })
        .await
        .expect("Failed to create test office")
}

pub async fn create_test_lov(pool: &PgPool, kind: LovKind, name: &str) -> LovDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Lovs::new(&mut conn, kind)
        .create(&LovCreateDBRequest {
            name: name.to_string(),
            description: None,
        })
        .await
        .expect("Failed to create test list value")
}

/// A governorate with one office and one staff member profiled in it
pub struct TestSite {
    pub governorate: GovernorateDBResponse,
    pub office: OfficeDBResponse,
    pub user: UserDBResponse,
    pub profile: ProfileDBResponse,
}

pub async fn create_test_site(pool: &PgPool) -> TestSite {
    let suffix = Uuid::new_v4().simple().to_string();
    let governorate = create_test_governorate(pool, &format!("Governorate {}", &suffix[..8])).await;
    let code = 1000 + (Uuid::new_v4().as_u128() % 1_000_000) as i32;
    let office = create_test_office(pool, governorate.id, code).await;
    let user = create_test_user(pool, Role::Supervisor).await;

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let profile = Profiles::new(&mut conn)
        .create(&ProfileCreateDBRequest {
            user_id: user.id,
            full_name: "Test Staff Member".to_string(),
            position: Some("Clerk".to_string()),
            office_id: office.id,
            governorate_id: governorate.id,
        })
        .await
        .expect("Failed to create test profile");

    TestSite {
        governorate,
        office,
        user,
        profile,
    }
}
