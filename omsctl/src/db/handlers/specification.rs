//! Composable query predicates for list and search endpoints.
//!
//! A [`Specification`] is a filter object whose optional fields each contribute one
//! `AND <predicate>` fragment to a query that already ends in `WHERE 1=1`. A field that is `None`
//! contributes nothing, so an empty filter selects the same rows as no filter at all.
//!
//! Repositories pair a specification with a fixed JOIN source (the related rows a response
//! includes) and hand both to [`fetch_page`], which runs the count and the page query against the
//! same predicates.

use sqlx::{Encode, FromRow, PgConnection, Postgres, QueryBuilder, Type, postgres::PgRow};
use tracing::instrument;

use crate::{
    api::models::pagination::{PagedList, PaginationParams},
    db::errors::Result,
};

/// A filter that can narrow a `SELECT ... WHERE 1=1` query.
pub trait Specification: Send + Sync {
    fn apply(&self, criteria: &mut Criteria<'_, '_>);
}

/// Specification that matches every row.
#[derive(Debug, Clone, Copy, Default)]
pub struct All;

impl Specification for All {
    fn apply(&self, _criteria: &mut Criteria<'_, '_>) {}
}

/// Predicate builder handed to [`Specification::apply`].
///
/// Column names are pushed verbatim and must come from code, never from a request. Values are
/// always bound as parameters.
pub struct Criteria<'b, 'args> {
    query: &'b mut QueryBuilder<'args, Postgres>,
}

impl<'b, 'args> Criteria<'b, 'args> {
    pub fn new(query: &'b mut QueryBuilder<'args, Postgres>) -> Self {
        Self { query }
    }

    fn push<T>(&mut self, column: &'static str, op: &str, value: T) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        self.query.push(" AND ");
        self.query.push(column);
        self.query.push(op);
        self.query.push_bind(value);
        self
    }

    /// `column = value`
    pub fn eq<T>(&mut self, column: &'static str, value: Option<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        match value {
            Some(value) => self.push(column, " = ", value),
            None => self,
        }
    }

    /// `column >= value`
    pub fn on_or_after<T>(&mut self, column: &'static str, value: Option<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        match value {
            Some(value) => self.push(column, " >= ", value),
            None => self,
        }
    }

    /// `column <= value`
    pub fn on_or_before<T>(&mut self, column: &'static str, value: Option<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        match value {
            Some(value) => self.push(column, " <= ", value),
            None => self,
        }
    }

    /// Case-insensitive substring match. Blank input is treated as absent.
    pub fn contains(&mut self, column: &'static str, value: Option<&str>) -> &mut Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => self.push(column, " ILIKE ", format!("%{}%", escape_like(value))),
            None => self,
        }
    }

    /// Case-insensitive substring match against any of `columns`.
    pub fn contains_any(&mut self, columns: &[&'static str], value: Option<&str>) -> &mut Self {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return self;
        };
        let pattern = format!("%{}%", escape_like(value));

        self.query.push(" AND (");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                self.query.push(" OR ");
            }
            self.query.push(*column);
            self.query.push(" ILIKE ");
            self.query.push_bind(pattern.clone());
        }
        self.query.push(")");
        self
    }
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Fetch one page of rows from `source` matching `spec`.
///
/// `source` is the FROM clause (table plus joins), `columns` the select list and `order_by` a
/// deterministic ordering. The total count is computed with the same predicates.
#[instrument(skip_all, fields(page = pagination.page_number(), size = pagination.page_size()), err)]
pub async fn fetch_page<R>(
    conn: &mut PgConnection,
    source: &str,
    columns: &str,
    spec: &dyn Specification,
    order_by: &str,
    pagination: &PaginationParams,
) -> Result<PagedList<R>>
where
    R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut count_query = QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {source} WHERE 1=1"));
    spec.apply(&mut Criteria::new(&mut count_query));
    let total_count: i64 = count_query.build_query_scalar().fetch_one(&mut *conn).await?;

    let mut query = QueryBuilder::<Postgres>::new(format!("SELECT {columns} FROM {source} WHERE 1=1"));
    spec.apply(&mut Criteria::new(&mut query));
    query.push(" ORDER BY ");
    query.push(order_by);
    query.push(" LIMIT ");
    query.push_bind(pagination.page_size());
    query.push(" OFFSET ");
    query.push_bind(pagination.offset());

    let items = query.build_query_as::<R>().fetch_all(&mut *conn).await?;

    Ok(PagedList::new(items, total_count, pagination))
}
