use crate::api::handlers::ensure_matching_id;
use crate::api::models::attachments::{AttachmentCreate, AttachmentEntity, AttachmentResponse, AttachmentUpdate};
use crate::auth::permissions::{RequiresPermission, operation, resource};
use crate::db::handlers::{Attachments, Repository};
use crate::db::models::attachments::{AttachmentCreateDBRequest, AttachmentUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::{AppState, types::AttachmentId};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::info;
use uuid::Uuid;

fn attachment_not_found(id: AttachmentId) -> Error {
    Error::NotFound {
        resource: "Attachment".to_string(),
        id: id.to_string(),
    }
}

fn require_text(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::BadRequest {
            message: format!("{field} is required"),
        });
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/attachments/{entity_type}/{entity_id}",
    tag = "attachments",
    summary = "Attachments of a record",
    responses(
        (status = 200, description = "Attachments, oldest first", body = Vec<AttachmentResponse>),
        (status = 400, description = "Invalid entity type"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission ATr"),
        (status = 404, description = "No attachments found for the provided ID"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("entity_type" = String, Path, description = "DamagedDevice, DamagedPassport or Lecture"),
        ("entity_id" = uuid::Uuid, Path, description = "ID of the owning record")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_entity_attachments(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Attachments, operation::ReadAll>,
    Path((entity_type, entity_id)): Path<(String, Uuid)>,
) -> Result<Json<Vec<AttachmentResponse>>> {
    let entity_type: AttachmentEntity = entity_type.parse()?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Attachments::new(&mut pool_conn);

    let attachments = repo.list_for_entity(entity_type, entity_id).await?;
    if attachments.is_empty() {
        return Err(Error::NotFound {
            resource: "Attachments".to_string(),
            id: entity_id.to_string(),
        });
    }
    Ok(Json(attachments.into_iter().map(AttachmentResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/attachments",
    tag = "attachments",
    summary = "Attach a file",
    description = "Records metadata for a file the client has already stored. The owning record must exist.",
    request_body = AttachmentCreate,
    responses(
        (status = 201, description = "Attachment recorded", body = AttachmentResponse),
        (status = 400, description = "Owning record not found, or blank file name or path"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission ATc"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_attachment(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Attachments, operation::CreateAll>,
    Json(create): Json<AttachmentCreate>,
) -> Result<(StatusCode, Json<AttachmentResponse>)> {
    require_text(&create.file_name, "File name")?;
    require_text(&create.file_path, "File path")?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Attachments::new(&mut tx);

    if !repo.entity_exists(create.entity_type, create.entity_id).await? {
        return Err(Error::BadRequest {
            message: format!("No {} found with ID {}.", create.entity_type, create.entity_id),
        });
    }

    let attachment = repo.create(&AttachmentCreateDBRequest::from(create)).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    info!(
        attachment_id = %attachment.id,
        entity_type = %attachment.entity_type,
        entity_id = %attachment.entity_id,
        "Recorded attachment"
    );
    Ok((StatusCode::CREATED, Json(AttachmentResponse::from(attachment))))
}

#[utoipa::path(
    put,
    path = "/attachments/{id}",
    tag = "attachments",
    summary = "Update attachment",
    description = "Renames or relocates the file. The owning record cannot be changed.",
    request_body = AttachmentUpdate,
    responses(
        (status = 200, description = "Attachment updated", body = AttachmentResponse),
        (status = 400, description = "ID mismatch or blank field"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission ATu"),
        (status = 404, description = "Attachment not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Attachment ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_attachment(
    State(state): State<AppState>,
    Path(id): Path<AttachmentId>,
    _: RequiresPermission<resource::Attachments, operation::UpdateAll>,
    Json(update): Json<AttachmentUpdate>,
) -> Result<Json<AttachmentResponse>> {
    ensure_matching_id(id, update.id)?;
    if let Some(file_name) = &update.file_name {
        require_text(file_name, "File name")?;
    }
    if let Some(file_path) = &update.file_path {
        require_text(file_path, "File path")?;
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Attachments::new(&mut pool_conn);

    let attachment = repo.update(id, &AttachmentUpdateDBRequest::from(update)).await?;
    Ok(Json(AttachmentResponse::from(attachment)))
}

#[utoipa::path(
    delete,
    path = "/attachments/{id}",
    tag = "attachments",
    summary = "Delete attachment",
    description = "Removes the metadata only; the stored file is left to the client.",
    responses(
        (status = 204, description = "Attachment deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission ATd"),
        (status = 404, description = "Attachment not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Attachment ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_attachment(
    State(state): State<AppState>,
    Path(id): Path<AttachmentId>,
    _: RequiresPermission<resource::Attachments, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Attachments::new(&mut pool_conn);

    if repo.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(attachment_not_found(id))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{attachments::AttachmentResponse, lectures::LectureResponse, users::Role},
        db::handlers::{Attachments, Repository},
        test_utils::*,
    };
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;
    use sqlx::PgPool;
    use uuid::Uuid;

    async fn create_lecture(app: &TestServer, pool: &PgPool) -> LectureResponse {
        let admin = create_test_user(pool, Role::SuperAdmin).await;
        let site = create_test_site(pool).await;
        let response = app
            .post("/api/v1/lectures")
            .add_header("authorization", bearer_token(&admin))
            .json(&json!({
                "title": "Document handling",
                "date": "2025-05-05",
                "office_id": site.office.id,
                "governorate_id": site.governorate.id,
                "profile_id": site.profile.id
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        response.json()
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_attachment_lifecycle(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["ATr", "ATc", "ATu", "ATd"]).await;
        let token = bearer_token(&user);
        let lecture = create_lecture(&app, &pool).await;

        let response = app
            .post("/api/v1/attachments")
            .add_header("authorization", &token)
            .json(&json!({
                "entity_type": "Lecture",
                "entity_id": lecture.id,
                "file_name": "slides.pdf",
                "file_path": "lectures/2025/slides.pdf"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: AttachmentResponse = response.json();
        assert_eq!(created.entity_id, lecture.id);

        let response = app
            .put(&format!("/api/v1/attachments/{}", created.id))
            .add_header("authorization", &token)
            .json(&json!({"file_name": "slides-final.pdf"}))
            .await;
        response.assert_status_ok();
        let updated: AttachmentResponse = response.json();
        assert_eq!(updated.file_name, "slides-final.pdf");
        assert_eq!(updated.file_path, "lectures/2025/slides.pdf");

        let response = app
            .get(&format!("/api/v1/attachments/lecture/{}", lecture.id))
            .add_header("authorization", &token)
            .await;
        response.assert_status_ok();
        let attachments: Vec<AttachmentResponse> = response.json();
        assert_eq!(attachments.len(), 1);

        let response = app
            .delete(&format!("/api/v1/attachments/{}", created.id))
            .add_header("authorization", &token)
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let response = app
            .get(&format!("/api/v1/attachments/Lecture/{}", lecture.id))
            .add_header("authorization", &token)
            .await;
        response.assert_status_not_found();

        let response = app
            .delete(&format!("/api/v1/attachments/{}", created.id))
            .add_header("authorization", &token)
            .await;
        response.assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_owner_must_exist(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["ATc"]).await;
        let lecture = create_lecture(&app, &pool).await;

        // The lecture exists, but not as a damaged device
        let response = app
            .post("/api/v1/attachments")
            .add_header("authorization", bearer_token(&user))
            .json(&json!({
                "entity_type": "DamagedDevice",
                "entity_id": lecture.id,
                "file_name": "photo.jpg",
                "file_path": "devices/photo.jpg"
            }))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.text(), format!("No damaged device found with ID {}.", lecture.id));

        let mut conn = pool.acquire().await.unwrap();
        let page = Attachments::new(&mut conn).list(&Default::default()).await.unwrap();
        assert_eq!(page.total_count, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_invalid_entity_type(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["ATr"]).await;

        let response = app
            .get(&format!("/api/v1/attachments/invoice/{}", Uuid::new_v4()))
            .add_header("authorization", bearer_token(&user))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.text(), "Invalid entity type.");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_denied_requests(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let reader = create_test_user_with_permissions(&pool, Role::Supervisor, &["ATr"]).await;
        let lecture = create_lecture(&app, &pool).await;
        let body = json!({
            "entity_type": "Lecture",
            "entity_id": lecture.id,
            "file_name": "notes.txt",
            "file_path": "lectures/notes.txt"
        });

        let response = app
            .post("/api/v1/attachments")
            .add_header("authorization", bearer_token(&reader))
            .json(&body)
            .await;
        response.assert_status_forbidden();

        let response = app.post("/api/v1/attachments").json(&body).await;
        response.assert_status_unauthorized();

        let mut conn = pool.acquire().await.unwrap();
        let page = Attachments::new(&mut conn).list(&Default::default()).await.unwrap();
        assert_eq!(page.total_count, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_overlong_file_name_is_bad_request(pool: PgPool) {
        let app = create_test_app(pool.clone()).await;
        let user = create_test_user_with_permissions(&pool, Role::Manager, &["ATc"]).await;
        let lecture = create_lecture(&app, &pool).await;

        let response = app
            .post("/api/v1/attachments")
            .add_header("authorization", bearer_token(&user))
            .json(&json!({
                "entity_type": "Lecture",
                "entity_id": lecture.id,
                "file_name": format!("{}.pdf", "a".repeat(252)),
                "file_path": "lectures/long.pdf"
            }))
            .await;
        response.assert_status_bad_request();
        assert_eq!(response.text(), "Value exceeds the maximum length of 255 characters");

        let mut conn = pool.acquire().await.unwrap();
        let page = Attachments::new(&mut conn).list(&Default::default()).await.unwrap();
        assert_eq!(page.total_count, 0);
    }
}
