use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::client::NotionClient;
use crate::error::{Result, SyncError};
use crate::frame::Frame;
use crate::schema::DatabaseSchema;
use crate::values::{PageRecords, encode_row};

/// Per-row failure policy applied while uploading a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Abort the upload on the first failing row.
    #[default]
    Strict,
    /// Log the failure and continue with the remaining rows.
    Warn,
    /// Continue silently.
    Ignore,
}

/// Target write behaviour of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Create new pages, leaving existing ones untouched.
    #[default]
    Append,
    /// Clear the database before writing. Not supported yet.
    Replace,
}

/// Options controlling an upload.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    /// Explicit schema. When unset the schema is taken from the target
    /// database, or inferred from the frame when a database is created.
    pub schema: Option<DatabaseSchema>,
    /// Title given to a newly created database.
    pub title: String,
    /// Column to use as the title column during schema inference. Defaults
    /// to the first column.
    pub title_column: Option<String>,
    /// Per-row failure policy.
    pub errors: ErrorPolicy,
    /// Target write behaviour.
    pub mode: WriteMode,
}

/// Result of loading a database.
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// The decoded records in tabular form.
    pub frame: Frame,
    /// The database's property schema.
    pub schema: DatabaseSchema,
    /// Whether the service reported more records than one query returns.
    pub has_more: bool,
}

/// Whether the URL names a database view rather than a plain page. Database
/// views carry a `?v=` marker on the last path segment.
pub fn is_database_url(url: &str) -> bool {
    url.rsplit('/')
        .next()
        .map(|segment| segment.contains("?v="))
        .unwrap_or(false)
}

/// Extracts the object identifier from a Notion URL: the trailing 32 hex
/// digits of the last path segment, returned in dashed UUID form.
pub fn extract_id(url: &str) -> Result<String> {
    let segment = url
        .rsplit('/')
        .next()
        .unwrap_or(url)
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let chars: Vec<char> = segment.chars().collect();
    if chars.len() < 32 {
        return Err(SyncError::InvalidUrl(url.to_string()));
    }
    let raw: String = chars[chars.len() - 32..].iter().collect();
    let id = Uuid::parse_str(&raw).map_err(|_| SyncError::InvalidUrl(url.to_string()))?;
    Ok(id.hyphenated().to_string())
}

/// Loads a database into a frame, together with its schema.
#[instrument(level = "info", skip(client), fields(url = %url))]
pub async fn load(client: &NotionClient, url: &str) -> Result<LoadResult> {
    if !is_database_url(url) {
        return Err(SyncError::InvalidUrl(format!(
            "{url} does not point at a database view"
        )));
    }
    let database_id = extract_id(url)?;

    let query = client.query_database(&database_id).await?;
    let records = PageRecords::from_raw(&query.results)?;
    info!(record_count = records.len(), "decoded query results");
    if query.has_more {
        warn!("database holds more records than a single query returns");
    }

    let database = client.retrieve_database(&database_id).await?;
    let properties = database
        .get("properties")
        .ok_or_else(|| SyncError::Decode("database object is missing properties".to_string()))?;
    let schema = DatabaseSchema::from_raw(properties)?;
    debug!(column_count = schema.len(), "database schema retrieved");

    let frame = records.to_frame(&schema)?;
    Ok(LoadResult {
        frame,
        schema,
        has_more: query.has_more,
    })
}

/// Fetches just the schema of a database.
#[instrument(level = "debug", skip(client))]
pub async fn load_database_schema(
    client: &NotionClient,
    database_id: &str,
) -> Result<DatabaseSchema> {
    let database = client.retrieve_database(database_id).await?;
    let properties = database
        .get("properties")
        .ok_or_else(|| SyncError::Decode("database object is missing properties".to_string()))?;
    DatabaseSchema::from_raw(properties)
}

/// Uploads a frame, creating one page per row. When the URL names a plain
/// page a database is created under it first. Returns the URL of the
/// database that received the rows.
#[instrument(level = "info", skip(client, frame, options), fields(url = %url, rows = frame.len()))]
pub async fn upload(
    client: &NotionClient,
    frame: &Frame,
    url: &str,
    options: UploadOptions,
) -> Result<String> {
    if options.mode != WriteMode::Append {
        return Err(SyncError::Unsupported(
            "only append uploads are supported".to_string(),
        ));
    }

    let (database_id, database_url, schema) = if is_database_url(url) {
        let database_id = extract_id(url)?;
        let schema = match options.schema {
            Some(schema) => schema,
            None => load_database_schema(client, &database_id).await?,
        };
        (database_id, url.to_string(), schema)
    } else {
        let schema = match options.schema {
            Some(schema) => schema,
            None => DatabaseSchema::from_frame(frame, options.title_column.as_deref())?,
        };
        let page_id = extract_id(url)?;
        let database = client
            .create_database(&page_id, &options.title, &schema)
            .await?;
        let database_id = database
            .get("id")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| SyncError::Decode("created database has no id".to_string()))?
            .to_string();
        let database_url = database
            .get("url")
            .and_then(serde_json::Value::as_str)
            .unwrap_or(url)
            .to_string();
        info!(database_id = %database_id, "database created");
        (database_id, database_url, schema)
    };

    let incompatible = schema.incompatible_columns(frame);
    if !incompatible.is_empty() {
        return Err(SyncError::SchemaMismatch(format!(
            "the frame contains columns that are not in the database: {}",
            incompatible.join(", ")
        )));
    }

    // The service lists newly created pages first, so rows are written in
    // reverse to keep the database in frame order.
    let mut uploaded = 0usize;
    for row in (0..frame.len()).rev() {
        match upload_row(client, frame, row, &schema, &database_id).await {
            Ok(()) => uploaded += 1,
            Err(error) => match options.errors {
                ErrorPolicy::Strict => return Err(error),
                ErrorPolicy::Warn => {
                    warn!(row, %error, "failed to upload row");
                }
                ErrorPolicy::Ignore => {}
            },
        }
    }

    info!(uploaded, total = frame.len(), "upload finished");
    Ok(database_url)
}

async fn upload_row(
    client: &NotionClient,
    frame: &Frame,
    row: usize,
    schema: &DatabaseSchema,
    database_id: &str,
) -> Result<()> {
    let properties = encode_row(frame, row, schema)?;
    client.create_page(database_id, properties).await?;
    Ok(())
}
