use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Result, SyncError};
use crate::frame::parse_timestamp;

/// Longest rich text fragment the API accepts in a single object. Longer
/// strings are split into consecutive fragments on upload.
pub const RICH_TEXT_CONTENT_MAX_LENGTH: usize = 2000;

/// Base colors supported for select options and similar decorations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Default,
    Gray,
    Brown,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    Red,
}

/// Extended color palette used by rich text annotations and blocks, adding
/// the background variants to the base set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtendedColor {
    Default,
    Gray,
    Brown,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    Red,
    GrayBackground,
    BrownBackground,
    OrangeBackground,
    YellowBackground,
    GreenBackground,
    BlueBackground,
    PurpleBackground,
    PinkBackground,
    RedBackground,
}

/// Discriminator carried by rich text objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RichTextKind {
    Text,
    Mention,
    Equation,
}

/// One option of a select or multi-select property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

impl SelectOption {
    /// Builds an option from a plain name. The API reserves the comma as the
    /// option separator, so names containing one are rejected.
    pub fn from_value(name: &str) -> Result<Self> {
        if name.contains(',') {
            return Err(SyncError::InvalidOptionName(name.to_string()));
        }
        Ok(Self {
            id: None,
            name: name.to_string(),
            color: None,
        })
    }
}

/// Option list wrapper as it appears in select configurations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectOptions {
    #[serde(default)]
    pub options: Vec<SelectOption>,
}

impl SelectOptions {
    pub fn from_values<S: AsRef<str>>(values: &[S]) -> Result<Self> {
        let options = values
            .iter()
            .map(|value| SelectOption::from_value(value.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { options })
    }
}

/// Reference to a related page inside a relation property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationValue {
    pub id: String,
}

impl RelationValue {
    /// Builds a relation entry, requiring a UUID shaped identifier.
    pub fn from_value(id: &str) -> Result<Self> {
        validate_uuid(id)?;
        Ok(Self { id: id.to_string() })
    }
}

/// A workspace user as returned by people properties and mentions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default = "default_user_object")]
    pub object: String,
    pub id: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl User {
    /// Builds a user reference for upload, requiring a UUID shaped id.
    pub fn from_value(id: &str) -> Result<Self> {
        validate_uuid(id)?;
        Ok(Self {
            object: default_user_object(),
            id: id.to_string(),
            kind: None,
            name: None,
            avatar_url: None,
        })
    }

    /// Checks the `object` discriminator that every decoded user must carry.
    pub fn validate(&self) -> Result<()> {
        if self.object != "user" {
            return Err(SyncError::Decode(format!(
                "invalid user object value '{}'",
                self.object
            )));
        }
        Ok(())
    }

    /// Display value of the user, when the API included one.
    pub fn value(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

fn default_user_object() -> String {
    "user".to_string()
}

/// A date property value. Bare dates and full datetimes are both carried as
/// ISO 8601 strings on the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DateValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl DateValue {
    /// Builds a date value from an ISO 8601 string, validating the format.
    pub fn from_value(start: &str) -> Result<Self> {
        parse_timestamp(start)?;
        Ok(Self {
            start: Some(start.to_string()),
            end: None,
            time_zone: None,
        })
    }

    /// Checks that both boundaries, where present, are ISO 8601 formatted.
    pub fn validate(&self) -> Result<()> {
        if let Some(start) = &self.start {
            parse_timestamp(start)?;
        }
        if let Some(end) = &self.end {
            parse_timestamp(end)?;
        }
        Ok(())
    }

    /// The parsed start of the range, when one is set.
    pub fn timestamp(&self) -> Result<Option<NaiveDateTime>> {
        match &self.start {
            Some(start) => Ok(Some(parse_timestamp(start)?)),
            None => Ok(None),
        }
    }
}

/// Location of a file, either hosted by Notion or external.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReference {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_time: Option<String>,
}

/// A file property entry or file-bearing block payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external: Option<FileReference>,
}

impl FileValue {
    /// Builds an external file entry pointing at the given URL.
    pub fn external(url: &str) -> Self {
        Self {
            name: Some(url.to_string()),
            kind: "external".to_string(),
            file: None,
            external: Some(FileReference {
                url: url.to_string(),
                expiry_time: None,
            }),
        }
    }

    /// The URL the entry resolves to, following the `type` discriminator.
    pub fn value(&self) -> Option<&str> {
        if self.kind == "file" {
            self.file.as_ref().map(|target| target.url.as_str())
        } else {
            self.external.as_ref().map(|target| target.url.as_str())
        }
    }
}

/// Computed result of a formula property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaResult {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boolean: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateValue>,
}

/// Computed result of a rollup property. Array elements are shaped like
/// property values without the `id` key and are kept as raw JSON here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupValue {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array: Option<Vec<Value>>,
    // The function key is undocumented but present in API responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

/// Text styling attached to a rich text fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: ExtendedColor,
}

/// Hyperlink carried by a text fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLink {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub url: String,
}

/// The literal content of a `text` rich text fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<TextLink>,
}

/// Reference to a page or database used inside mentions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReference {
    pub id: String,
}

/// Link preview payload of a mention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkPreviewMention {
    pub url: String,
}

/// An inline mention of a user, page, database, date, or link preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PageReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_preview: Option<LinkPreviewMention>,
}

/// An inline equation expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equation {
    pub expression: String,
}

/// One rich text fragment. Responses carry `plain_text`; outgoing values only
/// need the `text` payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RichText {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plain_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Annotations>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<RichTextKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mention: Option<Mention>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equation: Option<Equation>,
}

impl RichText {
    /// Builds a plain text fragment for upload.
    pub fn from_value(value: &str) -> Self {
        Self {
            text: Some(TextContent {
                content: value.to_string(),
                link: None,
            }),
            ..Self::default()
        }
    }

    /// Splits a string into fragments no longer than the API limit.
    pub fn encode_chunks(value: &str) -> Vec<Self> {
        let chars: Vec<char> = value.chars().collect();
        chars
            .chunks(RICH_TEXT_CONTENT_MAX_LENGTH)
            .map(|chunk| Self::from_value(&chunk.iter().collect::<String>()))
            .collect()
    }

    /// Display text of the fragment, preferring the response `plain_text`.
    pub fn value(&self) -> &str {
        if let Some(plain_text) = &self.plain_text {
            return plain_text;
        }
        self.text
            .as_ref()
            .map(|text| text.content.as_str())
            .unwrap_or_default()
    }
}

/// Concatenates the display text of a rich text array.
pub fn plain_text(fragments: &[RichText]) -> String {
    fragments.iter().map(RichText::value).collect()
}

/// An emoji icon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emoji {
    #[serde(rename = "type", default = "default_emoji_object")]
    pub kind: String,
    pub emoji: String,
}

fn default_emoji_object() -> String {
    "emoji".to_string()
}

/// Page or block icon: either an emoji or a file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Icon {
    Emoji(Emoji),
    File(FileValue),
}

/// Owner of a page or block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
}

impl Parent {
    /// Parent pointing at a page.
    pub fn page(page_id: &str) -> Self {
        Self {
            kind: "page_id".to_string(),
            database_id: None,
            page_id: Some(page_id.to_string()),
            workspace: None,
            block_id: None,
        }
    }

    /// Parent pointing at a database.
    pub fn database(database_id: &str) -> Self {
        Self {
            kind: "database_id".to_string(),
            database_id: Some(database_id.to_string()),
            page_id: None,
            workspace: None,
            block_id: None,
        }
    }
}

/// Checks that an identifier parses as a UUID, dashed or bare 32-hex.
pub fn validate_uuid(value: &str) -> Result<()> {
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| SyncError::InvalidIdentifier(value.to_string()))
}
