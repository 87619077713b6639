use serde::{Deserialize, Serialize};

use super::repo::{Transaction, TransactionType};

#[derive(Debug, Serialize, Deserialize)]
pub struct AddTransactionRequest {
    pub name: String,
    pub amount: f64,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// RFC 3339 timestamp or `YYYY-MM-DD`.
    pub date: String,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub startdate: Option<String>,
    pub enddate: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionResponse {
    pub message: String,
    pub transaction: Transaction,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionListResponse {
    pub message: String,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub message: String,
    pub balance: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalIncomeResponse {
    pub message: String,
    pub total_income: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalExpenseResponse {
    pub message: String,
    pub total_expense: f64,
}
