//! Database repositories for monthly expense sheets and daily expenses.

use crate::api::models::pagination::{PagedList, PaginationParams};
use crate::db::{
    errors::{DbError, Result},
    handlers::{
        repository::Repository,
        specification::{Criteria, Specification, fetch_page},
    },
    models::expenses::{
        DailyExpenseCreateDBRequest, DailyExpenseDBResponse, DailyExpenseUpdateDBRequest, MonthlyExpensesCreateDBRequest,
        MonthlyExpensesDBResponse, MonthlyExpensesUpdateDBRequest,
    },
};
use crate::types::{DailyExpenseId, GovernorateId, MonthlyExpensesId, OfficeId, ProfileId, abbrev_uuid};
use chrono::NaiveDate;
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

const MONTHLY_JOINS: &str = "JOIN offices o ON o.id = me.office_id \
     JOIN governorates g ON g.id = me.governorate_id \
     JOIN profiles p ON p.id = me.profile_id \
     LEFT JOIN LATERAL ( \
         SELECT COUNT(*) AS expense_count, COALESCE(SUM(de.amount), 0)::BIGINT AS total_amount \
         FROM daily_expenses de WHERE de.monthly_expenses_id = me.id \
     ) totals ON TRUE";

const MONTHLY_COLUMNS: &str = "me.id, me.month, me.note, me.office_id, o.name AS office_name, \
     me.governorate_id, g.name AS governorate_name, me.profile_id, p.full_name AS profile_full_name, \
     totals.expense_count, totals.total_amount, me.created_at, me.updated_at";

const DAILY_JOINS: &str = "JOIN monthly_expenses me ON me.id = de.monthly_expenses_id";

const DAILY_COLUMNS: &str = "de.id, de.monthly_expenses_id, me.month, de.expense_date, de.description, de.price, \
     de.quantity, de.amount, de.note, de.created_at, de.updated_at";

/// Filter for listing and searching expense sheets
#[derive(Debug, Clone, Default)]
pub struct MonthlyExpensesFilter {
    pub pagination: PaginationParams,
    pub office_id: Option<OfficeId>,
    pub governorate_id: Option<GovernorateId>,
    pub profile_id: Option<ProfileId>,
    /// First day of the earliest month to include
    pub start_month: Option<NaiveDate>,
    pub end_month: Option<NaiveDate>,
}

impl Specification for MonthlyExpensesFilter {
    fn apply(&self, criteria: &mut Criteria<'_, '_>) {
        criteria
            .eq("me.office_id", self.office_id)
            .eq("me.governorate_id", self.governorate_id)
            .eq("me.profile_id", self.profile_id)
            .on_or_after("me.month", self.start_month)
            .on_or_before("me.month", self.end_month);
    }
}

pub struct MonthlyExpenses<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for MonthlyExpenses<'c> {
    type CreateRequest = MonthlyExpensesCreateDBRequest;
    type UpdateRequest = MonthlyExpensesUpdateDBRequest;
    type Response = MonthlyExpensesDBResponse;
    type Id = MonthlyExpensesId;
    type Filter = MonthlyExpensesFilter;

    #[instrument(skip(self, request), fields(month = %request.month), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let sheet = sqlx::query_as::<_, MonthlyExpensesDBResponse>(&format!(
            "WITH me AS (
                INSERT INTO monthly_expenses (id, month, note, office_id, governorate_id, profile_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
             )
             SELECT {MONTHLY_COLUMNS} FROM me {MONTHLY_JOINS}"
        ))
        .bind(Uuid::new_v4())
        .bind(request.month)
        .bind(&request.note)
        .bind(request.office_id)
        .bind(request.governorate_id)
        .bind(request.profile_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(sheet)
    }

    #[instrument(skip(self), fields(monthly_expenses_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let sheet = sqlx::query_as::<_, MonthlyExpensesDBResponse>(&format!(
            "SELECT {MONTHLY_COLUMNS} FROM monthly_expenses me {MONTHLY_JOINS} WHERE me.id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(sheet)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<PagedList<Self::Response>> {
        let source = format!("monthly_expenses me {MONTHLY_JOINS}");
        fetch_page(&mut *self.db, &source, MONTHLY_COLUMNS, filter, "me.month DESC, me.id", &filter.pagination).await
    }

    /// Daily expenses go with the sheet
    #[instrument(skip(self), fields(monthly_expenses_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM monthly_expenses WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(monthly_expenses_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let sheet = sqlx::query_as::<_, MonthlyExpensesDBResponse>(&format!(
            "WITH me AS (
                UPDATE monthly_expenses SET
                    note = COALESCE($2, note),
                    profile_id = COALESCE($3, profile_id),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {MONTHLY_COLUMNS} FROM me {MONTHLY_JOINS}"
        ))
        .bind(id)
        .bind(&request.note)
        .bind(request.profile_id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(sheet)
    }
}

impl<'c> MonthlyExpenses<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

pub struct DailyExpenses<'c> {
    db: &'c mut PgConnection,
}

impl<'c> DailyExpenses<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(monthly_expenses_id = %abbrev_uuid(&request.monthly_expenses_id)), err)]
    pub async fn create(&mut self, request: &DailyExpenseCreateDBRequest) -> Result<DailyExpenseDBResponse> {
        let expense = sqlx::query_as::<_, DailyExpenseDBResponse>(&format!(
            "WITH de AS (
                INSERT INTO daily_expenses (id, monthly_expenses_id, expense_date, description, price, quantity, note)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
             )
             SELECT {DAILY_COLUMNS} FROM de {DAILY_JOINS}"
        ))
        .bind(Uuid::new_v4())
        .bind(request.monthly_expenses_id)
        .bind(request.expense_date)
        .bind(&request.description)
        .bind(request.price)
        .bind(request.quantity)
        .bind(&request.note)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(expense)
    }

    #[instrument(skip(self), fields(daily_expense_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: DailyExpenseId) -> Result<Option<DailyExpenseDBResponse>> {
        let expense = sqlx::query_as::<_, DailyExpenseDBResponse>(&format!(
            "SELECT {DAILY_COLUMNS} FROM daily_expenses de {DAILY_JOINS} WHERE de.id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(expense)
    }

    /// Every expense on one sheet, oldest first
    #[instrument(skip(self), fields(monthly_expenses_id = %abbrev_uuid(&monthly_expenses_id)), err)]
    pub async fn by_monthly_expenses(&mut self, monthly_expenses_id: MonthlyExpensesId) -> Result<Vec<DailyExpenseDBResponse>> {
        let expenses = sqlx::query_as::<_, DailyExpenseDBResponse>(&format!(
            "SELECT {DAILY_COLUMNS} FROM daily_expenses de {DAILY_JOINS}
             WHERE de.monthly_expenses_id = $1
             ORDER BY de.expense_date, de.created_at, de.id"
        ))
        .bind(monthly_expenses_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(expenses)
    }

    #[instrument(skip(self, request), fields(daily_expense_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: DailyExpenseId, request: &DailyExpenseUpdateDBRequest) -> Result<DailyExpenseDBResponse> {
        let expense = sqlx::query_as::<_, DailyExpenseDBResponse>(&format!(
            "WITH de AS (
                UPDATE daily_expenses SET
                    expense_date = COALESCE($2, expense_date),
                    description = COALESCE($3, description),
                    price = COALESCE($4, price),
                    quantity = COALESCE($5, quantity),
                    note = COALESCE($6, note),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
             )
             SELECT {DAILY_COLUMNS} FROM de {DAILY_JOINS}"
        ))
        .bind(id)
        .bind(request.expense_date)
        .bind(&request.description)
        .bind(request.price)
        .bind(request.quantity)
        .bind(&request.note)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(expense)
    }

    #[instrument(skip(self), fields(daily_expense_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: DailyExpenseId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM daily_expenses WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestSite, create_test_site};
    use sqlx::PgPool;

    fn sheet_request(site: &TestSite, month: u32) -> MonthlyExpensesCreateDBRequest {
        MonthlyExpensesCreateDBRequest {
            month: NaiveDate::from_ymd_opt(2025, month, 1).unwrap(),
            note: None,
            office_id: site.office.id,
            governorate_id: site.governorate.id,
            profile_id: site.profile.id,
        }
    }

    fn expense_request(sheet: &MonthlyExpensesDBResponse, day: u32, price: i64, quantity: i32) -> DailyExpenseCreateDBRequest {
        DailyExpenseCreateDBRequest {
            monthly_expenses_id: sheet.id,
            expense_date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            description: format!("Supplies {day}"),
            price,
            quantity,
            note: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_sheet_totals_follow_daily_expenses(pool: PgPool) {
        let site = create_test_site(&pool).await;
        let mut conn = pool.acquire().await.unwrap();

        let sheet = MonthlyExpenses::new(&mut conn).create(&sheet_request(&site, 6)).await.unwrap();
        assert_eq!(sheet.expense_count, 0);
        assert_eq!(sheet.total_amount, 0);
        assert_eq!(sheet.office_name, site.office.name);

        let mut daily = DailyExpenses::new(&mut conn);
        let later = daily.create(&expense_request(&sheet, 20, 1500, 2)).await.unwrap();
        assert_eq!(later.amount, 3000);
        assert_eq!(later.month, sheet.month);
        daily.create(&expense_request(&sheet, 3, 250, 4)).await.unwrap();

        let listed = daily.by_monthly_expenses(sheet.id).await.unwrap();
        assert_eq!(listed.iter().map(|e| e.expense_date.format("%d").to_string()).collect::<Vec<_>>(), vec!["03", "20"]);

        let updated = daily
            .update(
                later.id,
                &DailyExpenseUpdateDBRequest {
                    quantity: Some(3),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.amount, 4500);
        assert_eq!(updated.description, "Supplies 20");

        let sheet = MonthlyExpenses::new(&mut conn).get_by_id(sheet.id).await.unwrap().unwrap();
        assert_eq!(sheet.expense_count, 2);
        assert_eq!(sheet.total_amount, 5500);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_one_sheet_per_office_and_month(pool: PgPool) {
        let site = create_test_site(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = MonthlyExpenses::new(&mut conn);

        repo.create(&sheet_request(&site, 6)).await.unwrap();
        repo.create(&sheet_request(&site, 7)).await.unwrap();
        let duplicate = repo.create(&sheet_request(&site, 6)).await;
        assert!(matches!(duplicate, Err(DbError::UniqueViolation { .. })));

        let summer = repo
            .list(&MonthlyExpensesFilter {
                start_month: NaiveDate::from_ymd_opt(2025, 7, 1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(summer.total_count, 1);
        assert_eq!(repo.list(&MonthlyExpensesFilter::default()).await.unwrap().total_count, 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_deleting_sheet_removes_its_expenses(pool: PgPool) {
        let site = create_test_site(&pool).await;
        let mut conn = pool.acquire().await.unwrap();

        let sheet = MonthlyExpenses::new(&mut conn).create(&sheet_request(&site, 6)).await.unwrap();
        let expense = DailyExpenses::new(&mut conn).create(&expense_request(&sheet, 5, 100, 1)).await.unwrap();

        assert!(MonthlyExpenses::new(&mut conn).delete(sheet.id).await.unwrap());
        assert!(DailyExpenses::new(&mut conn).get_by_id(expense.id).await.unwrap().is_none());
        assert!(!MonthlyExpenses::new(&mut conn).delete(sheet.id).await.unwrap());
    }
}
