use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::client::NotionClient;
use crate::error::Result;
use crate::model::{self, ExtendedColor, FileValue, Icon, Parent, RichText};

/// Block types this crate understands. Anything else is skipped with a
/// warning so one exotic block cannot fail a whole page parse.
const KNOWN_BLOCK_TYPES: &[&str] = &[
    "paragraph",
    "heading_1",
    "heading_2",
    "heading_3",
    "callout",
    "quote",
    "bulleted_list_item",
    "numbered_list_item",
    "to_do",
    "toggle",
    "code",
    "child_page",
    "child_database",
    "embed",
    "image",
    "video",
    "file",
    "pdf",
    "bookmark",
    "equation",
    "divider",
    "table_of_contents",
    "breadcrumb",
    "link_preview",
    "link_to_page",
];

/// Rich text body shared by paragraphs, quotes, list items, and toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAttributes {
    pub rich_text: Vec<RichText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ExtendedColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Block>>,
}

/// Heading body. Toggleable headings may carry children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingAttributes {
    pub rich_text: Vec<RichText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ExtendedColor>,
    pub is_toggleable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Block>>,
}

/// Callout body with an optional icon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalloutAttributes {
    pub rich_text: Vec<RichText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ExtendedColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Block>>,
}

/// To-do body with its checked state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToDoAttributes {
    pub rich_text: Vec<RichText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ExtendedColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Block>>,
}

/// Code body with caption and language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeAttributes {
    pub rich_text: Vec<RichText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<Vec<RichText>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Title carried by child page and child database blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildPageAttributes {
    pub title: Vec<RichText>,
}

/// File payload shared by image, video, file, and pdf blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAttributes {
    #[serde(flatten)]
    pub value: FileValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<Vec<RichText>>,
}

/// Embedded URL payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedAttributes {
    pub url: String,
}

/// Bookmark payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkAttributes {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<Vec<RichText>>,
}

/// Display equation payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquationAttributes {
    pub expression: String,
}

/// Table of contents payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableOfContentsAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ExtendedColor>,
}

/// Link preview payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkPreviewAttributes {
    pub url: String,
}

/// Link-to-page payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkToPageAttributes {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_id: Option<String>,
}

/// The type-discriminated body of a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockPayload {
    Paragraph {
        paragraph: TextAttributes,
    },
    #[serde(rename = "heading_1")]
    Heading1 {
        heading_1: HeadingAttributes,
    },
    #[serde(rename = "heading_2")]
    Heading2 {
        heading_2: HeadingAttributes,
    },
    #[serde(rename = "heading_3")]
    Heading3 {
        heading_3: HeadingAttributes,
    },
    Callout {
        callout: CalloutAttributes,
    },
    Quote {
        quote: TextAttributes,
    },
    BulletedListItem {
        bulleted_list_item: TextAttributes,
    },
    NumberedListItem {
        numbered_list_item: TextAttributes,
    },
    ToDo {
        to_do: ToDoAttributes,
    },
    Toggle {
        toggle: TextAttributes,
    },
    Code {
        code: CodeAttributes,
    },
    ChildPage {
        child_page: ChildPageAttributes,
    },
    ChildDatabase {
        child_database: ChildPageAttributes,
    },
    Embed {
        embed: EmbedAttributes,
    },
    Image {
        image: FileAttributes,
    },
    Video {
        video: FileAttributes,
    },
    File {
        file: FileAttributes,
    },
    Pdf {
        pdf: FileAttributes,
    },
    Bookmark {
        bookmark: BookmarkAttributes,
    },
    Equation {
        equation: EquationAttributes,
    },
    Divider {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        divider: Option<Value>,
    },
    TableOfContents {
        table_of_contents: TableOfContentsAttributes,
    },
    Breadcrumb {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        breadcrumb: Option<Value>,
    },
    LinkPreview {
        link_preview: LinkPreviewAttributes,
    },
    LinkToPage {
        link_to_page: LinkToPageAttributes,
    },
}

/// A block as returned by the API: the common envelope plus a typed body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default = "default_block_object")]
    pub object: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Parent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_edited_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_children: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
    #[serde(flatten)]
    pub payload: BlockPayload,
}

fn default_block_object() -> String {
    "block".to_string()
}

impl Block {
    /// The nested blocks of this block, for payloads that can carry them.
    pub fn children(&self) -> Option<&[Block]> {
        let children = match &self.payload {
            BlockPayload::Paragraph { paragraph } => &paragraph.children,
            BlockPayload::Heading1 { heading_1 } => &heading_1.children,
            BlockPayload::Heading2 { heading_2 } => &heading_2.children,
            BlockPayload::Heading3 { heading_3 } => &heading_3.children,
            BlockPayload::Callout { callout } => &callout.children,
            BlockPayload::Quote { quote } => &quote.children,
            BlockPayload::BulletedListItem { bulleted_list_item } => &bulleted_list_item.children,
            BlockPayload::NumberedListItem { numbered_list_item } => &numbered_list_item.children,
            BlockPayload::ToDo { to_do } => &to_do.children,
            BlockPayload::Toggle { toggle } => &toggle.children,
            _ => return None,
        };
        children.as_deref()
    }

    /// Attaches nested blocks. Payloads without a children slot ignore the
    /// call, mirroring how the API never reports children for them.
    pub fn set_children(&mut self, value: Vec<Block>) {
        let slot = match &mut self.payload {
            BlockPayload::Paragraph { paragraph } => &mut paragraph.children,
            BlockPayload::Heading1 { heading_1 } => &mut heading_1.children,
            BlockPayload::Heading2 { heading_2 } => &mut heading_2.children,
            BlockPayload::Heading3 { heading_3 } => &mut heading_3.children,
            BlockPayload::Callout { callout } => &mut callout.children,
            BlockPayload::Quote { quote } => &mut quote.children,
            BlockPayload::BulletedListItem { bulleted_list_item } => {
                &mut bulleted_list_item.children
            }
            BlockPayload::NumberedListItem { numbered_list_item } => {
                &mut numbered_list_item.children
            }
            BlockPayload::ToDo { to_do } => &mut to_do.children,
            BlockPayload::Toggle { toggle } => &mut toggle.children,
            _ => return,
        };
        *slot = Some(value);
    }

    /// The rich text body of the block, empty for payloads without one.
    pub fn rich_text(&self) -> &[RichText] {
        match &self.payload {
            BlockPayload::Paragraph { paragraph } => &paragraph.rich_text,
            BlockPayload::Heading1 { heading_1 } => &heading_1.rich_text,
            BlockPayload::Heading2 { heading_2 } => &heading_2.rich_text,
            BlockPayload::Heading3 { heading_3 } => &heading_3.rich_text,
            BlockPayload::Callout { callout } => &callout.rich_text,
            BlockPayload::Quote { quote } => &quote.rich_text,
            BlockPayload::BulletedListItem { bulleted_list_item } => &bulleted_list_item.rich_text,
            BlockPayload::NumberedListItem { numbered_list_item } => &numbered_list_item.rich_text,
            BlockPayload::ToDo { to_do } => &to_do.rich_text,
            BlockPayload::Toggle { toggle } => &toggle.rich_text,
            BlockPayload::Code { code } => &code.rich_text,
            BlockPayload::ChildPage { child_page } => &child_page.title,
            BlockPayload::ChildDatabase { child_database } => &child_database.title,
            _ => &[],
        }
    }

    /// Concatenated display text of the block body.
    pub fn plain_text(&self) -> String {
        model::plain_text(self.rich_text())
    }
}

/// Decodes a single block. Unknown block types are reported as `None` after
/// logging a warning.
pub fn parse_block(data: &Value) -> Result<Option<Block>> {
    let kind = data.get("type").and_then(Value::as_str).unwrap_or_default();
    if !KNOWN_BLOCK_TYPES.contains(&kind) {
        warn!(block_type = kind, "skipping unknown block type");
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(data.clone())?))
}

/// Decodes a list of raw blocks, dropping unknown types.
pub fn parse_blocks(data: &[Value]) -> Result<Vec<Block>> {
    let mut blocks = Vec::with_capacity(data.len());
    for entry in data {
        if let Some(block) = parse_block(entry)? {
            blocks.push(block);
        }
    }
    Ok(blocks)
}

/// Decodes a list of raw blocks and follows `has_children` through the
/// block-children endpoint, attaching nested content in place.
pub async fn parse_blocks_recursive(client: &NotionClient, data: &[Value]) -> Result<Vec<Block>> {
    let mut blocks = parse_blocks(data)?;
    for block in &mut blocks {
        attach_children(client, block).await?;
    }
    Ok(blocks)
}

fn attach_children<'a>(
    client: &'a NotionClient,
    block: &'a mut Block,
) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
    Box::pin(async move {
        if block.has_children != Some(true) {
            return Ok(());
        }
        let Some(id) = block.id.clone() else {
            return Ok(());
        };
        let raw_children = client.list_block_children(&id).await?;
        let mut children = parse_blocks(&raw_children)?;
        for child in &mut children {
            attach_children(client, child).await?;
        }
        block.set_children(children);
        Ok(())
    })
}
