// Client for the managed table-store API backing the application. Row-level
// security is enforced server side; this layer only issues the requests.

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

// Error types for remote table operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Store error: {status_code} - {message}")]
    Api { status_code: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("No matching row in {table}")]
    EmptyResult { table: String },
}

// Client configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321/rest/v1".to_string(),
            api_key: String::new(),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Filter {
    Eq(String, String),
    In(String, Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Row selection: column filters, optional ordering, optional limit.
/// Single-row mode is a separate call on the client, not a query flag.
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    pub filters: Vec<Filter>,
    pub order: Option<(String, SortDirection)>,
    pub limit: Option<usize>,
}

impl SelectQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: &str) -> Self {
        self.filters
            .push(Filter::Eq(column.to_string(), value.to_string()));
        self
    }

    pub fn is_in<I, S>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filters.push(Filter::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some((column.to_string(), SortDirection::Ascending));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some((column.to_string(), SortDirection::Descending));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Renders the query into the store's URL parameter grammar.
    pub fn to_query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        for filter in &self.filters {
            match filter {
                Filter::Eq(column, value) => {
                    params.push((column.clone(), format!("eq.{}", value)));
                }
                Filter::In(column, values) => {
                    params.push((column.clone(), format!("in.({})", values.join(","))));
                }
            }
        }

        if let Some((column, direction)) = &self.order {
            let suffix = match direction {
                SortDirection::Ascending => "asc",
                SortDirection::Descending => "desc",
            };
            params.push(("order".to_string(), format!("{}.{}", column, suffix)));
        }

        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }
}

// Table store trait: the persistence seam every flow goes through
#[async_trait]
pub trait TableStore: Send + Sync + 'static {
    // Select matching rows
    async fn select(&self, table: &str, query: SelectQuery) -> Result<Vec<Value>, StoreError>;

    // Select exactly one row
    async fn select_single(&self, table: &str, query: SelectQuery) -> Result<Value, StoreError>;

    // Insert a row, returning the stored representation
    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError>;

    // Update matching rows with a partial patch, returning the updated rows
    async fn update(
        &self,
        table: &str,
        query: SelectQuery,
        patch: Value,
    ) -> Result<Vec<Value>, StoreError>;

    // Invoke a server-side function
    async fn invoke(&self, function: &str, args: Value) -> Result<Value, StoreError>;
}

/// Decode a list of JSON rows into typed records.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>, StoreError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| StoreError::Decode(e.to_string())))
        .collect()
}

/// Decode a single JSON row into a typed record.
pub fn decode_row<T: DeserializeOwned>(row: Value) -> Result<T, StoreError> {
    serde_json::from_value(row).map_err(|e| StoreError::Decode(e.to_string()))
}

/// Identifier of a freshly inserted row.
pub(crate) fn row_id(row: &Value) -> Result<String, StoreError> {
    row.get("id")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| StoreError::Decode("inserted row has no id".to_string()))
}

// HTTP implementation against the hosted table-store endpoint
pub struct RestTableStore {
    config: StoreConfig,
    http: reqwest::Client,
}

impl RestTableStore {
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Ok(Self { config, http })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), table)
    }

    fn rpc_url(&self, function: &str) -> String {
        format!(
            "{}/rpc/{}",
            self.config.base_url.trim_end_matches('/'),
            function
        )
    }

    fn request(&self, method: Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status_code: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    fn correlation_id() -> String {
        format!("{:08x}", rand::random::<u32>())
    }
}

#[async_trait]
impl TableStore for RestTableStore {
    async fn select(&self, table: &str, query: SelectQuery) -> Result<Vec<Value>, StoreError> {
        let request_id = Self::correlation_id();
        debug!(%request_id, table, "select");

        let response = self
            .request(Method::GET, self.table_url(table))
            .query(&query.to_query_params())
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let value = Self::read_json(response).await?;
        match value {
            Value::Array(rows) => {
                debug!(%request_id, rows = rows.len(), "select done");
                Ok(rows)
            }
            other => Err(StoreError::Decode(format!(
                "expected row list, got {}",
                other
            ))),
        }
    }

    async fn select_single(&self, table: &str, query: SelectQuery) -> Result<Value, StoreError> {
        let request_id = Self::correlation_id();
        debug!(%request_id, table, "select single");

        let response = self
            .request(Method::GET, self.table_url(table))
            .query(&query.to_query_params())
            .header("Accept", "application/vnd.pgrst.object+json")
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Self::read_json(response).await
    }

    async fn insert(&self, table: &str, row: Value) -> Result<Value, StoreError> {
        let request_id = Self::correlation_id();
        debug!(%request_id, table, "insert");

        let response = self
            .request(Method::POST, self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        // The store echoes inserted rows back as a one-element list
        match Self::read_json(response).await? {
            Value::Array(rows) => rows.into_iter().next().ok_or_else(|| StoreError::EmptyResult {
                table: table.to_string(),
            }),
            other => Ok(other),
        }
    }

    async fn update(
        &self,
        table: &str,
        query: SelectQuery,
        patch: Value,
    ) -> Result<Vec<Value>, StoreError> {
        let request_id = Self::correlation_id();
        debug!(%request_id, table, "update");

        let response = self
            .request(Method::PATCH, self.table_url(table))
            .query(&query.to_query_params())
            .header("Prefer", "return=representation")
            .json(&patch)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        match Self::read_json(response).await? {
            Value::Array(rows) => Ok(rows),
            other => Err(StoreError::Decode(format!(
                "expected row list, got {}",
                other
            ))),
        }
    }

    async fn invoke(&self, function: &str, args: Value) -> Result<Value, StoreError> {
        let request_id = Self::correlation_id();
        debug!(%request_id, function, "invoke");

        let response = self
            .request(Method::POST, self.rpc_url(function))
            .json(&args)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        Self::read_json(response).await
    }
}


#[cfg(test)]
mod tests {
    use super::mock_store::MockStore;
    use super::*;
    use serde_json::json;
    use tokio_test::assert_ok;

    #[test]
    fn test_query_params_filters_and_order() {
        let query = SelectQuery::new()
            .eq("status", "available")
            .order_asc("price_per_night")
            .limit(20);

        assert_eq!(
            query.to_query_params(),
            vec![
                ("status".to_string(), "eq.available".to_string()),
                ("order".to_string(), "price_per_night.asc".to_string()),
                ("limit".to_string(), "20".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_params_in_list() {
        let query = SelectQuery::new().is_in("id", ["svc-1", "svc-3"]);

        assert_eq!(
            query.to_query_params(),
            vec![("id".to_string(), "in.(svc-1,svc-3)".to_string())]
        );
    }

    #[tokio::test]
    async fn test_mock_select_filters_and_orders() {
        let store = MockStore::new();
        store.seed(
            "rooms",
            vec![
                json!({"id": "r1", "status": "available", "price_per_night": 200.0}),
                json!({"id": "r2", "status": "occupied", "price_per_night": 90.0}),
                json!({"id": "r3", "status": "available", "price_per_night": 120.0}),
            ],
        );

        let rows = store
            .select(
                "rooms",
                SelectQuery::new()
                    .eq("status", "available")
                    .order_asc("price_per_night"),
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["id"], "r3");
        assert_eq!(rows[1]["id"], "r1");
    }

    #[tokio::test]
    async fn test_mock_select_single_empty() {
        let store = MockStore::new();

        let result = store
            .select_single("rooms", SelectQuery::new().eq("id", "missing"))
            .await;

        assert!(matches!(result, Err(StoreError::EmptyResult { .. })));
    }

    #[tokio::test]
    async fn test_mock_insert_assigns_id_and_fails_on_demand() {
        let store = MockStore::new();

        let row = assert_ok!(store.insert("bookings", json!({"guests": 2})).await);
        assert_eq!(row["id"], "bookings-1");

        store.fail_next_inserts(1);
        let result = store.insert("bookings", json!({"guests": 2})).await;
        assert!(matches!(result, Err(StoreError::Api { status_code: 500, .. })));

        // The failed insert must not have stored anything
        assert_eq!(store.rows("bookings").len(), 1);
    }

    #[tokio::test]
    async fn test_mock_update_patches_matching_rows() {
        let store = MockStore::new();
        store.seed(
            "bookings",
            vec![
                json!({"id": "b1", "status": "pending"}),
                json!({"id": "b2", "status": "pending"}),
            ],
        );

        let updated = store
            .update(
                "bookings",
                SelectQuery::new().eq("id", "b1"),
                json!({"status": "confirmed"}),
            )
            .await
            .unwrap();

        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["status"], "confirmed");

        let rows = store.rows("bookings");
        assert_eq!(rows[0]["status"], "confirmed");
        assert_eq!(rows[1]["status"], "pending");
    }
}
