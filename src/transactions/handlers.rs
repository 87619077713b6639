use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{
        AddTransactionRequest, BalanceResponse, DateQuery, SummaryQuery, TotalExpenseResponse,
        TotalIncomeResponse, TransactionListResponse, TransactionResponse,
    },
    repo::{NewTransaction, Transaction, TransactionType},
    services::{balance, days_bounds, parse_day, parse_transaction_date, total_by_type},
};
use crate::{auth::extractors::AuthUser, error::ApiError, state::AppState};

pub fn write_routes() -> Router<AppState> {
    Router::new().route("/dashboard/add-transaction", post(add_transaction))
}

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/balance", get(get_balance))
        .route("/dashboard/transactions", get(list_transactions))
        .route("/dashboard/date", get(list_by_date))
        .route("/dashboard/summary", get(list_by_range))
        .route("/dashboard/income/income-list", get(list_income))
        .route("/dashboard/income/totalincome", get(total_income))
        .route("/dashboard/expense/expense-list", get(list_expense))
        .route("/dashboard/expense/totalexpense", get(total_expense))
}

/// List endpoints answer 404 rather than an empty 200.
fn found(
    transactions: Vec<Transaction>,
    ok: &str,
    empty: &str,
) -> Result<Json<TransactionListResponse>, ApiError> {
    if transactions.is_empty() {
        return Err(ApiError::NotFound(empty.into()));
    }
    Ok(Json(TransactionListResponse {
        message: ok.into(),
        transactions,
    }))
}

fn required_day(value: Option<&str>, field: &str) -> Result<time::Date, ApiError> {
    let raw = value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::Validation(format!("{field} is required")))?;
    parse_day(raw).ok_or_else(|| ApiError::Validation(format!("{field} must be YYYY-MM-DD")))
}

#[instrument(skip_all)]
pub async fn add_transaction(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<AddTransactionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionResponse>), ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;

    if !body.amount.is_finite() || body.amount < 0.0 {
        return Err(ApiError::Validation(
            "amount must be a non-negative number".into(),
        ));
    }
    let name = body.name.trim();
    if name.is_empty() {
        return Err(ApiError::Validation("name is required".into()));
    }
    let category = body.category.trim();
    if category.is_empty() {
        return Err(ApiError::Validation("category is required".into()));
    }
    let date = parse_transaction_date(&body.date).ok_or_else(|| {
        ApiError::Validation("date must be YYYY-MM-DD or an RFC 3339 timestamp".into())
    })?;

    let transaction = state
        .transactions
        .create(
            user.id,
            NewTransaction {
                name: name.to_string(),
                amount: body.amount,
                category: category.to_string(),
                kind: body.kind,
                date,
            },
        )
        .await?;

    info!(
        user_id = %user.id,
        transaction_id = %transaction.id,
        kind = ?transaction.kind,
        "transaction added"
    );
    Ok((
        StatusCode::CREATED,
        Json(TransactionResponse {
            message: "Transaction added successfully".into(),
            transaction,
        }),
    ))
}

#[instrument(skip_all)]
pub async fn get_balance(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let transactions = state.transactions.list_all(user.id).await?;
    Ok(Json(BalanceResponse {
        message: "Balance fetched successfully".into(),
        balance: balance(&transactions),
    }))
}

#[instrument(skip_all)]
pub async fn list_transactions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let transactions = state.transactions.list_all(user.id).await?;
    found(
        transactions,
        "Transactions fetched successfully",
        "No transactions found",
    )
}

#[instrument(skip_all)]
pub async fn list_by_date(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<DateQuery>, QueryRejection>,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let Query(q) = query.map_err(|e| ApiError::Validation(e.body_text()))?;
    let day = required_day(q.date.as_deref(), "date")?;

    let transactions = state.transactions.list_by_exact_date(user.id, day).await?;
    found(
        transactions,
        "Transactions fetched successfully for the given date",
        "No transactions found for the given date",
    )
}

#[instrument(skip_all)]
pub async fn list_by_range(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    query: Result<Query<SummaryQuery>, QueryRejection>,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let Query(q) = query.map_err(|e| ApiError::Validation(e.body_text()))?;
    let start = required_day(q.startdate.as_deref(), "startdate")?;
    let end = required_day(q.enddate.as_deref(), "enddate")?;
    let Some((from, until)) = days_bounds(start, end) else {
        warn!(%start, %end, "inverted date range");
        return Err(ApiError::Validation(
            "startdate must not be after enddate".into(),
        ));
    };

    let transactions = state
        .transactions
        .list_by_date_range(user.id, from, until)
        .await?;
    found(
        transactions,
        "Transactions fetched successfully for the given date range",
        "No transactions found for the given date range",
    )
}

#[instrument(skip_all)]
pub async fn list_income(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let transactions = state
        .transactions
        .list_by_type(user.id, TransactionType::Income)
        .await?;
    found(
        transactions,
        "Income transactions fetched successfully",
        "No income transactions found",
    )
}

#[instrument(skip_all)]
pub async fn total_income(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<TotalIncomeResponse>, ApiError> {
    let transactions = state
        .transactions
        .list_by_type(user.id, TransactionType::Income)
        .await?;
    let message = if transactions.is_empty() {
        "No income transactions found"
    } else {
        "Total income fetched successfully"
    };
    Ok(Json(TotalIncomeResponse {
        message: message.into(),
        total_income: total_by_type(&transactions, TransactionType::Income),
    }))
}

#[instrument(skip_all)]
pub async fn list_expense(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let transactions = state
        .transactions
        .list_by_type(user.id, TransactionType::Expense)
        .await?;
    found(
        transactions,
        "Expense transactions fetched successfully",
        "No expense transactions found",
    )
}

#[instrument(skip_all)]
pub async fn total_expense(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<TotalExpenseResponse>, ApiError> {
    let transactions = state
        .transactions
        .list_by_type(user.id, TransactionType::Expense)
        .await?;
    let message = if transactions.is_empty() {
        "No expense transactions found"
    } else {
        "Total expense fetched successfully"
    };
    Ok(Json(TotalExpenseResponse {
        message: message.into(),
        total_expense: total_by_type(&transactions, TransactionType::Expense),
    }))
}
