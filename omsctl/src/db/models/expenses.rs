//! Database models for monthly expense sheets and their daily expenses.

use crate::api::models::expenses::{DailyExpenseCreate, DailyExpenseUpdate, MonthlyExpensesCreate, MonthlyExpensesUpdate};
use crate::types::{DailyExpenseId, GovernorateId, MonthlyExpensesId, OfficeId, ProfileId};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use sqlx::FromRow;

/// First day of the month containing `date`
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[derive(Debug, Clone)]
pub struct MonthlyExpensesCreateDBRequest {
    pub month: NaiveDate,
    pub note: Option<String>,
    pub office_id: OfficeId,
    pub governorate_id: GovernorateId,
    pub profile_id: ProfileId,
}

impl From<MonthlyExpensesCreate> for MonthlyExpensesCreateDBRequest {
    fn from(api: MonthlyExpensesCreate) -> Self {
        Self {
            month: month_start(api.month),
            note: api.note,
            office_id: api.office_id,
            governorate_id: api.governorate_id,
            profile_id: api.profile_id,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MonthlyExpensesUpdateDBRequest {
    pub note: Option<String>,
    pub profile_id: Option<ProfileId>,
}

impl From<MonthlyExpensesUpdate> for MonthlyExpensesUpdateDBRequest {
    fn from(api: MonthlyExpensesUpdate) -> Self {
        Self {
            note: api.note,
            profile_id: api.profile_id,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct MonthlyExpensesDBResponse {
    pub id: MonthlyExpensesId,
    pub month: NaiveDate,
    pub note: Option<String>,
    pub office_id: OfficeId,
    pub office_name: String,
    pub governorate_id: GovernorateId,
    pub governorate_name: String,
    pub profile_id: ProfileId,
    pub profile_full_name: String,
    pub expense_count: i64,
    pub total_amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DailyExpenseCreateDBRequest {
    pub monthly_expenses_id: MonthlyExpensesId,
    pub expense_date: NaiveDate,
    pub description: String,
    pub price: i64,
    pub quantity: i32,
    pub note: Option<String>,
}

impl DailyExpenseCreateDBRequest {
    pub fn new(monthly_expenses_id: MonthlyExpensesId, api: DailyExpenseCreate) -> Self {
        Self {
            monthly_expenses_id,
            expense_date: api.expense_date,
            description: api.description.trim().to_string(),
            price: api.price,
            quantity: api.quantity,
            note: api.note,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DailyExpenseUpdateDBRequest {
    pub expense_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub quantity: Option<i32>,
    pub note: Option<String>,
}

impl From<DailyExpenseUpdate> for DailyExpenseUpdateDBRequest {
    fn from(api: DailyExpenseUpdate) -> Self {
        Self {
            expense_date: api.expense_date,
            description: api.description.map(|d| d.trim().to_string()),
            price: api.price,
            quantity: api.quantity,
            note: api.note,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DailyExpenseDBResponse {
    pub id: DailyExpenseId,
    pub monthly_expenses_id: MonthlyExpensesId,
    /// Month of the owning sheet
    pub month: NaiveDate,
    pub expense_date: NaiveDate,
    pub description: String,
    pub price: i64,
    pub quantity: i32,
    pub amount: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
