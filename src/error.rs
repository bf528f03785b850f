use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Error type covering the different failure cases that can occur when the
/// tool loads, translates, or uploads tabular data.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Wrapper for IO failures such as reading or writing workbook files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the HTTP transport.
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Raised when the Notion API answers with a non-success status.
    #[error("Notion API error {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a workbook does not follow the expected sheet conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when an API payload could not be decoded into the wire model.
    #[error("property decode error: {0}")]
    Decode(String),

    /// Raised when a frame does not line up with the database schema.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Raised when a cell cannot be encoded for the property it targets.
    #[error("invalid value '{value}' in column {column}: {reason}")]
    InvalidValue {
        column: String,
        value: String,
        reason: String,
    },

    /// Raised when a select option name contains a comma.
    #[error("invalid option name '{0}': option names cannot contain commas")]
    InvalidOptionName(String),

    /// Raised when an identifier is not UUID shaped.
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// Raised when a date string is not formatted as ISO 8601.
    #[error("invalid ISO 8601 timestamp '{0}'")]
    InvalidTimestamp(String),

    /// Raised when a Notion URL cannot be reduced to an object identifier.
    #[error("unable to extract an object id from URL '{0}'")]
    InvalidUrl(String),

    /// Raised when no API key can be resolved from any source.
    #[error("no API key provided: pass one explicitly, call set_default_api_key, or set NOTION_API_KEY")]
    MissingApiKey,

    /// Raised when the configured API key cannot be used as an HTTP header.
    #[error("invalid API key: {0}")]
    InvalidApiKey(String),

    /// Raised for operations the tool deliberately does not support.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
