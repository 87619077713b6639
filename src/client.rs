//! Typed HTTP client for the ledger API.
//!
//! The bearer token lives in a [`CredentialProvider`] handed to the client at
//! construction: [`ApiClient::login`] stores it, [`ApiClient::logout`] clears it,
//! and every protected call reads it. Callers that want to persist a session
//! supply their own provider.

use std::sync::{Arc, RwLock};

use reqwest::{RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;

use crate::{
    auth::dto::PublicUser,
    transactions::{
        repo::Transaction, AddTransactionRequest, BalanceResponse, TotalExpenseResponse,
        TotalIncomeResponse, TransactionListResponse, TransactionResponse,
    },
};

/// Holds the session token between calls.
pub trait CredentialProvider: Send + Sync {
    fn token(&self) -> Option<String>;
    fn store(&self, token: String);
    fn clear(&self);
}

/// Keeps the token in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryCredentials {
    token: RwLock<Option<String>>,
}

impl CredentialProvider for MemoryCredentials {
    fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn store(&self, token: String) {
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token);
        }
    }

    fn clear(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("not logged in")]
    NotLoggedIn,

    /// The server answered with a non-2xx status.
    #[error("{status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

#[derive(Deserialize)]
struct UserBody {
    user: PublicUser,
}

#[derive(Deserialize)]
struct LoginBody {
    token: String,
    user: PublicUser,
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialProvider>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        authed: bool,
    ) -> Result<T, ClientError> {
        let req = if authed {
            let token = self.credentials.token().ok_or(ClientError::NotLoggedIn)?;
            req.bearer_auth(token)
        } else {
            req
        };

        let res = req.send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res.json::<T>().await?);
        }
        let message = match res.json::<MessageBody>().await {
            Ok(body) => body.message,
            Err(_) => status.to_string(),
        };
        Err(ClientError::Api { status, message })
    }

    /// List endpoints report "nothing found" as 404; here that is an empty list.
    async fn list(&self, req: RequestBuilder) -> Result<Vec<Transaction>, ClientError> {
        match self.send::<TransactionListResponse>(req, true).await {
            Ok(body) => Ok(body.transactions),
            Err(ClientError::Api { status, .. }) if status == StatusCode::NOT_FOUND => {
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<PublicUser, ClientError> {
        let req = self
            .http
            .post(self.url("/auth/register"))
            .json(&json!({ "email": email, "password": password, "name": name }));
        Ok(self.send::<UserBody>(req, false).await?.user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<PublicUser, ClientError> {
        let req = self
            .http
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }));
        let body = self.send::<LoginBody>(req, false).await?;
        self.credentials.store(body.token);
        Ok(body.user)
    }

    /// Forgets the token. The server keeps no session, so nothing is sent.
    pub fn logout(&self) {
        self.credentials.clear();
    }

    pub async fn me(&self) -> Result<PublicUser, ClientError> {
        let req = self.http.get(self.url("/auth/me"));
        Ok(self.send::<UserBody>(req, true).await?.user)
    }

    pub async fn add_transaction(
        &self,
        tx: &AddTransactionRequest,
    ) -> Result<Transaction, ClientError> {
        let req = self.http.post(self.url("/dashboard/add-transaction")).json(tx);
        Ok(self.send::<TransactionResponse>(req, true).await?.transaction)
    }

    pub async fn balance(&self) -> Result<f64, ClientError> {
        let req = self.http.get(self.url("/dashboard/balance"));
        Ok(self.send::<BalanceResponse>(req, true).await?.balance)
    }

    pub async fn transactions(&self) -> Result<Vec<Transaction>, ClientError> {
        self.list(self.http.get(self.url("/dashboard/transactions")))
            .await
    }

    /// `day` is `YYYY-MM-DD`.
    pub async fn transactions_on(&self, day: &str) -> Result<Vec<Transaction>, ClientError> {
        let req = self
            .http
            .get(self.url("/dashboard/date"))
            .query(&[("date", day)]);
        self.list(req).await
    }

    /// Both bounds are inclusive calendar days, `YYYY-MM-DD`.
    pub async fn summary(&self, start: &str, end: &str) -> Result<Vec<Transaction>, ClientError> {
        let req = self
            .http
            .get(self.url("/dashboard/summary"))
            .query(&[("startdate", start), ("enddate", end)]);
        self.list(req).await
    }

    pub async fn income(&self) -> Result<Vec<Transaction>, ClientError> {
        self.list(self.http.get(self.url("/dashboard/income/income-list")))
            .await
    }

    pub async fn expenses(&self) -> Result<Vec<Transaction>, ClientError> {
        self.list(self.http.get(self.url("/dashboard/expense/expense-list")))
            .await
    }

    pub async fn total_income(&self) -> Result<f64, ClientError> {
        let req = self.http.get(self.url("/dashboard/income/totalincome"));
        Ok(self.send::<TotalIncomeResponse>(req, true).await?.total_income)
    }

    pub async fn total_expense(&self) -> Result<f64, ClientError> {
        let req = self.http.get(self.url("/dashboard/expense/totalexpense"));
        Ok(self.send::<TotalExpenseResponse>(req, true).await?.total_expense)
    }
}
