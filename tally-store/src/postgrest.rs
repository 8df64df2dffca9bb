//! PostgREST client (the REST layer Supabase exposes) for the expenses table.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tally_core::RawRecord;
use tracing::debug;

use crate::error::StoreError;
use crate::types::{ExpensePatch, NewExpense, StoreConfig};
use crate::ExpenseStore;

pub struct PostgrestStore {
    http: reqwest::Client,
    config: StoreConfig,
}

impl PostgrestStore {
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(&config.key)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn rest_base(&self) -> String {
        format!("{}/rest/v1", self.config.url.trim_end_matches('/'))
    }

    fn table_url(&self) -> String {
        format!("{}/{}", self.rest_base(), self.config.table)
    }

    fn rpc_url(&self) -> String {
        format!("{}/rpc/{}", self.rest_base(), self.config.monthly_total_rpc)
    }

    async fn send(req: RequestBuilder) -> Result<Response, StoreError> {
        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Status { status, body });
        }
        Ok(resp)
    }

    async fn send_json<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, StoreError> {
        let text = Self::send(req).await?.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ExpenseStore for PostgrestStore {
    async fn insert(&self, expense: &NewExpense) -> Result<RawRecord, StoreError> {
        debug!(category = %expense.category, amount = expense.amount, "inserting expense");
        let req = self
            .http
            .post(self.table_url())
            .header("Prefer", "return=representation")
            .json(expense);
        let rows: Vec<RawRecord> = Self::send_json(req).await?;
        rows.into_iter().next().ok_or(StoreError::Empty("insert"))
    }

    async fn fetch_all(&self) -> Result<Vec<RawRecord>, StoreError> {
        let req = self
            .http
            .get(self.table_url())
            .query(&[("select", "*"), ("order", "time.desc")]);
        let rows: Vec<RawRecord> = Self::send_json(req).await?;
        debug!(rows = rows.len(), "fetched expenses");
        Ok(rows)
    }

    async fn update(&self, id: &str, patch: &ExpensePatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Err(StoreError::NoChanges);
        }
        let filter = format!("eq.{id}");
        let req = self
            .http
            .patch(self.table_url())
            .query(&[(self.config.id_column.as_str(), filter.as_str())])
            .json(patch);
        Self::send(req).await?;
        debug!(id, "updated expense");
        Ok(())
    }

    async fn monthly_total(&self, year: i32, month: u32) -> Result<Option<f64>, StoreError> {
        let req = self
            .http
            .post(self.rpc_url())
            .json(&json!({ "p_year": year, "p_month": month }));
        let value: Value = Self::send_json(req).await?;
        Ok(numeric_total(&value))
    }
}

/// RPC scalars come back as a bare number, a numeric string, or `null`.
fn numeric_total(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        // some deployments wrap scalars as [{"get_monthly_total": 12.0}]
        Value::Array(items) => items.first().and_then(numeric_total),
        Value::Object(map) if map.len() == 1 => map.values().next().and_then(numeric_total),
        _ => None,
    }
}
