use crate::api::handlers::{ensure_matching_id, profiles::ensure_office_in_governorate};
use crate::api::models::expenses::{
    DailyExpenseCreate, DailyExpenseResponse, DailyExpenseUpdate, MonthlyExpensesCreate, MonthlyExpensesResponse,
    MonthlyExpensesSearch, MonthlyExpensesUpdate,
};
use crate::api::models::pagination::{PagedList, PaginationParams};
use crate::auth::permissions::{RequiresPermission, operation, resource};
use crate::db::errors::DbError;
use crate::db::handlers::{DailyExpenses, MonthlyExpenses, Repository, expenses::MonthlyExpensesFilter};
use crate::db::models::expenses::{
    DailyExpenseCreateDBRequest, DailyExpenseUpdateDBRequest, MonthlyExpensesCreateDBRequest, MonthlyExpensesUpdateDBRequest,
    month_start,
};
use crate::errors::{Error, Result};
use crate::{
    AppState,
    types::{DailyExpenseId, MonthlyExpensesId},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::NaiveDate;

fn monthly_expenses_not_found(id: MonthlyExpensesId) -> Error {
    Error::NotFound {
        resource: "Monthly expenses".to_string(),
        id: id.to_string(),
    }
}

fn daily_expense_not_found(id: DailyExpenseId) -> Error {
    Error::NotFound {
        resource: "Daily expense".to_string(),
        id: id.to_string(),
    }
}

fn ensure_within_month(expense_date: NaiveDate, month: NaiveDate) -> Result<()> {
    if month_start(expense_date) != month {
        return Err(Error::BadRequest {
            message: "Expense date must fall within the expense month.".to_string(),
        });
    }
    Ok(())
}

impl From<MonthlyExpensesSearch> for MonthlyExpensesFilter {
    fn from(search: MonthlyExpensesSearch) -> Self {
        Self {
            pagination: search.pagination,
            office_id: search.office_id,
            governorate_id: search.governorate_id,
            profile_id: search.profile_id,
            start_month: search.start_month.map(month_start),
            end_month: search.end_month.map(month_start),
        }
    }
}

#[utoipa::path(
    get,
    path = "/expenses/monthly",
    tag = "expenses",
    summary = "List expense sheets",
    responses(
        (status = 200, description = "Page of expense sheets, newest month first; metadata in the Pagination header", body = Vec<MonthlyExpensesResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Er"),
        (status = 500, description = "Internal server error")
    ),
    params(PaginationParams),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_monthly_expenses(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
    _: RequiresPermission<resource::Expenses, operation::ReadAll>,
) -> Result<PagedList<MonthlyExpensesResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = MonthlyExpenses::new(&mut pool_conn);

    let filter = MonthlyExpensesFilter {
        pagination,
        ..Default::default()
    };
    let page = repo.list(&filter).await?;
    Ok(page.map(MonthlyExpensesResponse::from))
}

#[utoipa::path(
    post,
    path = "/expenses/monthly/search",
    tag = "expenses",
    summary = "Search expense sheets",
    request_body = MonthlyExpensesSearch,
    responses(
        (status = 200, description = "Page of matching expense sheets; metadata in the Pagination header", body = Vec<MonthlyExpensesResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Er"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn search_monthly_expenses(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Expenses, operation::ReadAll>,
    Json(search): Json<MonthlyExpensesSearch>,
) -> Result<PagedList<MonthlyExpensesResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = MonthlyExpenses::new(&mut pool_conn);

    let page = repo.list(&MonthlyExpensesFilter::from(search)).await?;
    Ok(page.map(MonthlyExpensesResponse::from))
}

#[utoipa::path(
    post,
    path = "/expenses/monthly",
    tag = "expenses",
    summary = "Open an expense sheet",
    description = "The month is stored as its first day. An office has at most one sheet per month.",
    request_body = MonthlyExpensesCreate,
    responses(
        (status = 201, description = "Expense sheet opened", body = MonthlyExpensesResponse),
        (status = 400, description = "Note too long, unknown reference, or the office is not in the governorate"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Ec"),
        (status = 409, description = "The office already has a sheet for this month"),
        (status = 500, description = "Internal server error")
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_monthly_expenses(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Expenses, operation::CreateAll>,
    Json(create): Json<MonthlyExpensesCreate>,
) -> Result<(StatusCode, Json<MonthlyExpensesResponse>)> {
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    ensure_office_in_governorate(&mut tx, create.office_id, create.governorate_id).await?;

    let sheet = MonthlyExpenses::new(&mut tx)
        .create(&MonthlyExpensesCreateDBRequest::from(create))
        .await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(MonthlyExpensesResponse::from(sheet))))
}

#[utoipa::path(
    get,
    path = "/expenses/monthly/{id}",
    tag = "expenses",
    summary = "Get expense sheet",
    responses(
        (status = 200, description = "Expense sheet with its count and total", body = MonthlyExpensesResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Er"),
        (status = 404, description = "Expense sheet not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Expense sheet ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_monthly_expenses(
    State(state): State<AppState>,
    Path(id): Path<MonthlyExpensesId>,
    _: RequiresPermission<resource::Expenses, operation::ReadAll>,
) -> Result<Json<MonthlyExpensesResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = MonthlyExpenses::new(&mut pool_conn);

    match repo.get_by_id(id).await? {
        Some(sheet) => Ok(Json(MonthlyExpensesResponse::from(sheet))),
        None => Err(monthly_expenses_not_found(id)),
    }
}

#[utoipa::path(
    put,
    path = "/expenses/monthly/{id}",
    tag = "expenses",
    summary = "Update expense sheet",
    description = "Only the note and the responsible profile can change.",
    request_body = MonthlyExpensesUpdate,
    responses(
        (status = 200, description = "Expense sheet updated", body = MonthlyExpensesResponse),
        (status = 400, description = "ID mismatch, note too long, or unknown profile"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Eu"),
        (status = 404, description = "Expense sheet not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Expense sheet ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_monthly_expenses(
    State(state): State<AppState>,
    Path(id): Path<MonthlyExpensesId>,
    _: RequiresPermission<resource::Expenses, operation::UpdateAll>,
    Json(update): Json<MonthlyExpensesUpdate>,
) -> Result<Json<MonthlyExpensesResponse>> {
    ensure_matching_id(id, update.id)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = MonthlyExpenses::new(&mut pool_conn);

    let sheet = repo
        .update(id, &MonthlyExpensesUpdateDBRequest::from(update))
        .await
        .map_err(|e| match e {
            DbError::NotFound => monthly_expenses_not_found(id),
            other => Error::Database(other),
        })?;
    Ok(Json(MonthlyExpensesResponse::from(sheet)))
}

#[utoipa::path(
    delete,
    path = "/expenses/monthly/{id}",
    tag = "expenses",
    summary = "Delete expense sheet",
    description = "The sheet's daily expenses are deleted with it.",
    responses(
        (status = 204, description = "Expense sheet deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Ed"),
        (status = 404, description = "Expense sheet not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Expense sheet ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_monthly_expenses(
    State(state): State<AppState>,
    Path(id): Path<MonthlyExpensesId>,
    _: RequiresPermission<resource::Expenses, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = MonthlyExpenses::new(&mut pool_conn);

    if repo.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(monthly_expenses_not_found(id))
    }
}

#[utoipa::path(
    get,
    path = "/expenses/monthly/{id}/daily",
    tag = "expenses",
    summary = "List the daily expenses of a sheet",
    responses(
        (status = 200, description = "Daily expenses ordered by date", body = Vec<DailyExpenseResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Er"),
        (status = 404, description = "Expense sheet not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Expense sheet ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_daily_expenses(
    State(state): State<AppState>,
    Path(id): Path<MonthlyExpensesId>,
    _: RequiresPermission<resource::Expenses, operation::ReadAll>,
) -> Result<Json<Vec<DailyExpenseResponse>>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    if MonthlyExpenses::new(&mut pool_conn).get_by_id(id).await?.is_none() {
        return Err(monthly_expenses_not_found(id));
    }

    let expenses = DailyExpenses::new(&mut pool_conn).by_monthly_expenses(id).await?;
    Ok(Json(expenses.into_iter().map(DailyExpenseResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/expenses/monthly/{id}/daily",
    tag = "expenses",
    summary = "Record a daily expense",
    request_body = DailyExpenseCreate,
    responses(
        (status = 201, description = "Daily expense recorded", body = DailyExpenseResponse),
        (status = 400, description = "Invalid description, price or quantity, or the date is outside the sheet's month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Ec"),
        (status = 404, description = "Expense sheet not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Expense sheet ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_daily_expense(
    State(state): State<AppState>,
    Path(id): Path<MonthlyExpensesId>,
    _: RequiresPermission<resource::Expenses, operation::CreateAll>,
    Json(create): Json<DailyExpenseCreate>,
) -> Result<(StatusCode, Json<DailyExpenseResponse>)> {
    create.validate()?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let sheet = MonthlyExpenses::new(&mut tx)
        .get_by_id(id)
        .await?
        .ok_or_else(|| monthly_expenses_not_found(id))?;
    ensure_within_month(create.expense_date, sheet.month)?;

    let expense = DailyExpenses::new(&mut tx)
        .create(&DailyExpenseCreateDBRequest::new(id, create))
        .await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(DailyExpenseResponse::from(expense))))
}

#[utoipa::path(
    put,
    path = "/expenses/daily/{id}",
    tag = "expenses",
    summary = "Update daily expense",
    description = "Only the fields present in the body are changed. A new date must stay within the sheet's month.",
    request_body = DailyExpenseUpdate,
    responses(
        (status = 200, description = "Daily expense updated", body = DailyExpenseResponse),
        (status = 400, description = "ID mismatch, invalid values, or the date is outside the sheet's month"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Eu"),
        (status = 404, description = "Daily expense not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Daily expense ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_daily_expense(
    State(state): State<AppState>,
    Path(id): Path<DailyExpenseId>,
    _: RequiresPermission<resource::Expenses, operation::UpdateAll>,
    Json(update): Json<DailyExpenseUpdate>,
) -> Result<Json<DailyExpenseResponse>> {
    ensure_matching_id(id, update.id)?;
    update.validate()?;
    let request = DailyExpenseUpdateDBRequest::from(update);

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = DailyExpenses::new(&mut tx);
    let existing = repo.get_by_id(id).await?.ok_or_else(|| daily_expense_not_found(id))?;
    if let Some(expense_date) = request.expense_date {
        ensure_within_month(expense_date, existing.month)?;
    }

    let expense = repo.update(id, &request).await?;
    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(DailyExpenseResponse::from(expense)))
}

#[utoipa::path(
    delete,
    path = "/expenses/daily/{id}",
    tag = "expenses",
    summary = "Delete daily expense",
    responses(
        (status = 204, description = "Daily expense deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Missing permission Ed"),
        (status = 404, description = "Daily expense not found"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = uuid::Uuid, Path, description = "Daily expense ID")),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_daily_expense(
    State(state): State<AppState>,
    Path(id): Path<DailyExpenseId>,
    _: RequiresPermission<resource::Expenses, operation::DeleteAll>,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = DailyExpenses::new(&mut pool_conn);

    if repo.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(daily_expense_not_found(id))
    }
}
