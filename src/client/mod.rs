use std::sync::RwLock;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::error::{Result, SyncError};
use crate::model::Parent;
use crate::schema::DatabaseSchema;

/// Notion REST endpoint.
const NOTION_API_URL: &str = "https://api.notion.com/v1";
/// Pinned API revision sent with every request.
const NOTION_API_VERSION: &str = "2022-06-28";
/// Environment variable consulted when no key is configured explicitly.
const API_KEY_ENV: &str = "NOTION_API_KEY";

static DEFAULT_API_KEY: RwLock<Option<String>> = RwLock::new(None);

/// Sets the process-wide default API key used when none is passed
/// explicitly.
pub fn set_default_api_key(api_key: impl Into<String>) {
    if let Ok(mut slot) = DEFAULT_API_KEY.write() {
        *slot = Some(api_key.into());
    }
}

/// Resolves an API key: an explicit key wins, then the process-wide default,
/// then the `NOTION_API_KEY` environment variable.
pub fn resolve_api_key(explicit: Option<&str>) -> Result<String> {
    if let Some(key) = explicit {
        return Ok(key.to_string());
    }
    if let Ok(slot) = DEFAULT_API_KEY.read() {
        if let Some(key) = slot.as_ref() {
            return Ok(key.clone());
        }
    }
    std::env::var(API_KEY_ENV).map_err(|_| SyncError::MissingApiKey)
}

/// One page of results of a database query. Cursor continuation is not
/// followed; callers see `has_more` and decide what to surface.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResult {
    pub results: Vec<Value>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Minimal Notion REST client carrying the authentication and version
/// headers on every request.
#[derive(Debug, Clone)]
pub struct NotionClient {
    client: reqwest::Client,
    base_url: String,
}

impl NotionClient {
    /// Creates a client authenticated with the given integration token.
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, NOTION_API_URL)
    }

    /// Creates a client from the resolved default credentials.
    pub fn from_env() -> Result<Self> {
        Self::new(&resolve_api_key(None)?)
    }

    /// Creates a client against a custom endpoint. Intended for tests that
    /// stand in for the real service.
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))
                .map_err(|err| SyncError::InvalidApiKey(err.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "Notion-Version",
            HeaderValue::from_static(NOTION_API_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await?;
        Self::decode_response(response).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await?;
        Self::decode_response(response).await
    }

    async fn decode_response(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let parsed: ApiErrorBody = serde_json::from_str(&body).unwrap_or(ApiErrorBody {
                code: None,
                message: None,
            });
            return Err(SyncError::Api {
                status: status.as_u16(),
                code: parsed.code.unwrap_or_else(|| "unknown".to_string()),
                message: parsed.message.unwrap_or(body),
            });
        }
        Ok(response.json().await?)
    }

    /// Queries a database and returns a single page of results.
    #[instrument(level = "debug", skip(self))]
    pub async fn query_database(&self, database_id: &str) -> Result<QueryResult> {
        let raw = self
            .post(&format!("/databases/{database_id}/query"), &json!({}))
            .await?;
        expect_object(&raw, "list")?;
        Ok(serde_json::from_value(raw)?)
    }

    /// Retrieves a database object, including its property schema.
    #[instrument(level = "debug", skip(self))]
    pub async fn retrieve_database(&self, database_id: &str) -> Result<Value> {
        let raw = self.get(&format!("/databases/{database_id}")).await?;
        expect_object(&raw, "database")?;
        Ok(raw)
    }

    /// Creates a database under the given page and returns the raw database
    /// object.
    #[instrument(level = "debug", skip(self, schema))]
    pub async fn create_database(
        &self,
        parent_page_id: &str,
        title: &str,
        schema: &DatabaseSchema,
    ) -> Result<Value> {
        let body = json!({
            "parent": Parent::page(parent_page_id),
            "title": [{ "type": "text", "text": { "content": title } }],
            "properties": schema.to_payload()?,
        });
        let raw = self.post("/databases", &body).await?;
        expect_object(&raw, "database")?;
        debug!("database created");
        Ok(raw)
    }

    /// Creates a page inside the given database from an encoded property
    /// set.
    #[instrument(level = "debug", skip(self, properties))]
    pub async fn create_page(&self, database_id: &str, properties: Value) -> Result<Value> {
        let body = json!({
            "parent": Parent::database(database_id),
            "properties": properties,
        });
        self.post("/pages", &body).await
    }

    /// Lists the direct children of a block.
    #[instrument(level = "debug", skip(self))]
    pub async fn list_block_children(&self, block_id: &str) -> Result<Vec<Value>> {
        let raw = self.get(&format!("/blocks/{block_id}/children")).await?;
        let results = raw
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(results)
    }
}

fn expect_object(raw: &Value, expected: &str) -> Result<()> {
    let object = raw.get("object").and_then(Value::as_str).unwrap_or_default();
    if object != expected {
        return Err(SyncError::Decode(format!(
            "expected a '{expected}' response, received '{object}'"
        )));
    }
    Ok(())
}
