//! API request/response models for office expenses.
//!
//! An office keeps one expense sheet per month. Daily expenses are recorded against a sheet and
//! must be dated within its month; the sheet reports their count and total.

use super::pagination::PaginationParams;
use crate::db::models::expenses::{DailyExpenseDBResponse, MonthlyExpensesDBResponse};
use crate::errors::Error;
use crate::types::{DailyExpenseId, GovernorateId, MonthlyExpensesId, OfficeId, ProfileId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MonthlyExpensesCreate {
    /// Any day of the month; stored as the first day
    pub month: NaiveDate,
    pub note: Option<String>,
    #[schema(value_type = String, format = "uuid")]
    pub office_id: OfficeId,
    #[schema(value_type = String, format = "uuid")]
    pub governorate_id: GovernorateId,
    #[schema(value_type = String, format = "uuid")]
    pub profile_id: ProfileId,
}

/// The month and office of a sheet are fixed once created
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MonthlyExpensesUpdate {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub id: Option<MonthlyExpensesId>,
    pub note: Option<String>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub profile_id: Option<ProfileId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MonthlyExpensesResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: MonthlyExpensesId,
    pub month: NaiveDate,
    pub note: Option<String>,
    #[schema(value_type = String, format = "uuid")]
    pub office_id: OfficeId,
    pub office_name: String,
    #[schema(value_type = String, format = "uuid")]
    pub governorate_id: GovernorateId,
    pub governorate_name: String,
    #[schema(value_type = String, format = "uuid")]
    pub profile_id: ProfileId,
    pub profile_full_name: String,
    /// Number of daily expenses on the sheet
    pub expense_count: i64,
    /// Sum of the daily expense amounts
    pub total_amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Search body for expense sheets; absent fields do not filter
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MonthlyExpensesSearch {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub office_id: Option<OfficeId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub governorate_id: Option<GovernorateId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub profile_id: Option<ProfileId>,
    /// Sheets for this month or later
    pub start_month: Option<NaiveDate>,
    /// Sheets for this month or earlier
    pub end_month: Option<NaiveDate>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DailyExpenseCreate {
    /// Must fall within the sheet's month
    pub expense_date: NaiveDate,
    /// At most 200 characters
    pub description: String,
    /// Unit price in whole currency units
    pub price: i64,
    pub quantity: i32,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DailyExpenseUpdate {
    #[schema(value_type = Option<String>, format = "uuid")]
    pub id: Option<DailyExpenseId>,
    pub expense_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub quantity: Option<i32>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DailyExpenseResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: DailyExpenseId,
    #[schema(value_type = String, format = "uuid")]
    pub monthly_expenses_id: MonthlyExpensesId,
    pub expense_date: NaiveDate,
    pub description: String,
    pub price: i64,
    pub quantity: i32,
    /// `price * quantity`
    pub amount: i64,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn validate_expense(description: Option<&str>, price: Option<i64>, quantity: Option<i32>) -> Result<(), Error> {
    if description.is_some_and(|d| d.trim().is_empty()) {
        return Err(Error::BadRequest {
            message: "Description is required.".to_string(),
        });
    }
    if price.is_some_and(|p| p < 0) {
        return Err(Error::BadRequest {
            message: "Price cannot be negative.".to_string(),
        });
    }
    if quantity.is_some_and(|q| q < 1) {
        return Err(Error::BadRequest {
            message: "Quantity must be at least 1.".to_string(),
        });
    }
    Ok(())
}

impl DailyExpenseCreate {
    pub fn validate(&self) -> Result<(), Error> {
        validate_expense(Some(&self.description), Some(self.price), Some(self.quantity))
    }
}

impl DailyExpenseUpdate {
    pub fn validate(&self) -> Result<(), Error> {
        validate_expense(self.description.as_deref(), self.price, self.quantity)
    }
}

impl From<MonthlyExpensesDBResponse> for MonthlyExpensesResponse {
    fn from(db: MonthlyExpensesDBResponse) -> Self {
        Self {
            id: db.id,
            month: db.month,
            note: db.note,
            office_id: db.office_id,
            office_name: db.office_name,
            governorate_id: db.governorate_id,
            governorate_name: db.governorate_name,
            profile_id: db.profile_id,
            profile_full_name: db.profile_full_name,
            expense_count: db.expense_count,
            total_amount: db.total_amount,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<DailyExpenseDBResponse> for DailyExpenseResponse {
    fn from(db: DailyExpenseDBResponse) -> Self {
        Self {
            id: db.id,
            monthly_expenses_id: db.monthly_expenses_id,
            expense_date: db.expense_date,
            description: db.description,
            price: db.price,
            quantity: db.quantity,
            amount: db.amount,
            note: db.note,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
