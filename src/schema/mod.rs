use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, SyncError};
use crate::frame::{Cell, Frame};
use crate::model::SelectOptions;

/// Placeholder payload for property types configured without parameters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EmptyConfig {}

/// Number formatting applied by the service when rendering the column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberFormat {
    pub format: String,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            format: "number".to_string(),
        }
    }
}

/// Formula definition of a formula property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaConfig {
    pub expression: String,
}

/// Relation definition linking a column to another database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationConfig {
    pub database_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synced_property_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synced_property_id: Option<String>,
}

/// Rollup definition aggregating over a relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollupConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation_property_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation_property_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollup_property_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollup_property_id: Option<String>,
    pub function: String,
}

/// The typed configuration of one database column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyConfig {
    Title {
        #[serde(default)]
        title: EmptyConfig,
    },
    RichText {
        #[serde(default)]
        rich_text: EmptyConfig,
    },
    Number {
        #[serde(default)]
        number: NumberFormat,
    },
    Select {
        #[serde(default)]
        select: SelectOptions,
    },
    MultiSelect {
        #[serde(default)]
        multi_select: SelectOptions,
    },
    Date {
        #[serde(default)]
        date: EmptyConfig,
    },
    People {
        #[serde(default)]
        people: EmptyConfig,
    },
    Files {
        #[serde(default)]
        files: EmptyConfig,
    },
    Checkbox {
        #[serde(default)]
        checkbox: EmptyConfig,
    },
    Url {
        #[serde(default)]
        url: EmptyConfig,
    },
    Email {
        #[serde(default)]
        email: EmptyConfig,
    },
    PhoneNumber {
        #[serde(default)]
        phone_number: EmptyConfig,
    },
    Formula {
        formula: FormulaConfig,
    },
    Relation {
        relation: RelationConfig,
    },
    Rollup {
        rollup: RollupConfig,
    },
    CreatedTime {
        #[serde(default)]
        created_time: EmptyConfig,
    },
    CreatedBy {
        #[serde(default)]
        created_by: EmptyConfig,
    },
    LastEditedTime {
        #[serde(default)]
        last_edited_time: EmptyConfig,
    },
    LastEditedBy {
        #[serde(default)]
        last_edited_by: EmptyConfig,
    },
}

impl PropertyConfig {
    /// Wire name of the property type.
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyConfig::Title { .. } => "title",
            PropertyConfig::RichText { .. } => "rich_text",
            PropertyConfig::Number { .. } => "number",
            PropertyConfig::Select { .. } => "select",
            PropertyConfig::MultiSelect { .. } => "multi_select",
            PropertyConfig::Date { .. } => "date",
            PropertyConfig::People { .. } => "people",
            PropertyConfig::Files { .. } => "files",
            PropertyConfig::Checkbox { .. } => "checkbox",
            PropertyConfig::Url { .. } => "url",
            PropertyConfig::Email { .. } => "email",
            PropertyConfig::PhoneNumber { .. } => "phone_number",
            PropertyConfig::Formula { .. } => "formula",
            PropertyConfig::Relation { .. } => "relation",
            PropertyConfig::Rollup { .. } => "rollup",
            PropertyConfig::CreatedTime { .. } => "created_time",
            PropertyConfig::CreatedBy { .. } => "created_by",
            PropertyConfig::LastEditedTime { .. } => "last_edited_time",
            PropertyConfig::LastEditedBy { .. } => "last_edited_by",
        }
    }

    /// Whether the column accepts values on page creation. Formula, rollup,
    /// and the created/edited metadata columns are computed by the service.
    pub fn is_editable(&self) -> bool {
        !matches!(
            self,
            PropertyConfig::Formula { .. }
                | PropertyConfig::Rollup { .. }
                | PropertyConfig::CreatedTime { .. }
                | PropertyConfig::CreatedBy { .. }
                | PropertyConfig::LastEditedTime { .. }
                | PropertyConfig::LastEditedBy { .. }
        )
    }
}

/// Ordered column name to property configuration mapping of one database.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DatabaseSchema {
    configs: Vec<(String, PropertyConfig)>,
}

impl DatabaseSchema {
    /// Builds a schema from an ordered list of column configurations.
    pub fn new(configs: Vec<(String, PropertyConfig)>) -> Result<Self> {
        let schema = Self { configs };
        schema.validate()?;
        Ok(schema)
    }

    /// Decodes the `properties` object of a database retrieval response.
    pub fn from_raw(properties: &Value) -> Result<Self> {
        let object = properties.as_object().ok_or_else(|| {
            SyncError::Decode("database properties must be a JSON object".to_string())
        })?;

        let mut configs = Vec::with_capacity(object.len());
        for (name, raw) in object {
            let config: PropertyConfig = serde_json::from_value(raw.clone()).map_err(|err| {
                SyncError::Decode(format!("property '{name}' has an invalid configuration: {err}"))
            })?;
            configs.push((name.clone(), config));
        }

        Self::new(configs)
    }

    /// Infers a schema from the frame contents. The designated column (or
    /// the first one when unset) becomes the mandatory title column; other
    /// columns are typed from the cells they hold.
    pub fn from_frame(frame: &Frame, title_column: Option<&str>) -> Result<Self> {
        if frame.columns().is_empty() {
            return Err(SyncError::SchemaMismatch(
                "cannot infer a schema from a frame without columns".to_string(),
            ));
        }

        let title = match title_column {
            Some(name) => {
                if frame.column_index(name).is_none() {
                    return Err(SyncError::SchemaMismatch(format!(
                        "title column '{name}' is not present in the frame"
                    )));
                }
                name.to_string()
            }
            None => frame.columns()[0].clone(),
        };

        let mut configs = Vec::with_capacity(frame.columns().len());
        for column in frame.columns() {
            let config = if column == &title {
                PropertyConfig::Title {
                    title: EmptyConfig::default(),
                }
            } else {
                infer_column_config(frame, column)?
            };
            configs.push((column.clone(), config));
        }

        Self::new(configs)
    }

    /// Serialises the schema into the `properties` payload used when
    /// creating a database.
    pub fn to_payload(&self) -> Result<Value> {
        let mut payload = Map::new();
        for (name, config) in &self.configs {
            payload.insert(name.clone(), serde_json::to_value(config)?);
        }
        Ok(Value::Object(payload))
    }

    /// The configuration of the named column.
    pub fn get(&self, name: &str) -> Option<&PropertyConfig> {
        self.configs
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, config)| config)
    }

    /// Name of the title column.
    pub fn title_column(&self) -> Option<&str> {
        self.configs
            .iter()
            .find(|(_, config)| matches!(config, PropertyConfig::Title { .. }))
            .map(|(name, _)| name.as_str())
    }

    /// Column names in schema order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.configs.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates over the configurations in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyConfig)> {
        self.configs
            .iter()
            .map(|(name, config)| (name.as_str(), config))
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.configs.len()
    }

    /// Returns `true` when the schema holds no columns.
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Frame columns that have no counterpart in the schema.
    pub fn incompatible_columns(&self, frame: &Frame) -> Vec<String> {
        frame
            .columns()
            .iter()
            .filter(|column| self.get(column).is_none())
            .cloned()
            .collect()
    }

    /// Whether every frame column is present in the schema.
    pub fn is_frame_compatible(&self, frame: &Frame) -> bool {
        self.incompatible_columns(frame).is_empty()
    }

    fn validate(&self) -> Result<()> {
        let titles = self
            .configs
            .iter()
            .filter(|(_, config)| matches!(config, PropertyConfig::Title { .. }))
            .count();
        if titles != 1 {
            return Err(SyncError::SchemaMismatch(format!(
                "a database schema requires exactly one title column, found {titles}"
            )));
        }
        Ok(())
    }
}

/// Types one non-title column from the cells it holds: uniform booleans map
/// to checkbox, numbers to number, timestamps to date, lists to multi-select
/// (collecting the distinct values as options), anything else to rich text.
fn infer_column_config(frame: &Frame, column: &str) -> Result<PropertyConfig> {
    let cells: Vec<&Cell> = frame
        .column_cells(column)
        .into_iter()
        .flatten()
        .filter(|cell| !cell.is_empty())
        .collect();

    if cells.is_empty() {
        return Ok(PropertyConfig::RichText {
            rich_text: EmptyConfig::default(),
        });
    }

    if cells.iter().all(|cell| matches!(cell, Cell::Bool(_))) {
        return Ok(PropertyConfig::Checkbox {
            checkbox: EmptyConfig::default(),
        });
    }
    if cells.iter().all(|cell| matches!(cell, Cell::Number(_))) {
        return Ok(PropertyConfig::Number {
            number: NumberFormat::default(),
        });
    }
    if cells.iter().all(|cell| matches!(cell, Cell::Timestamp(_))) {
        return Ok(PropertyConfig::Date {
            date: EmptyConfig::default(),
        });
    }
    if cells.iter().all(|cell| matches!(cell, Cell::TextList(_))) {
        let mut names: Vec<String> = Vec::new();
        for cell in &cells {
            if let Cell::TextList(values) = cell {
                for value in values {
                    if !names.contains(value) {
                        names.push(value.clone());
                    }
                }
            }
        }
        return Ok(PropertyConfig::MultiSelect {
            multi_select: SelectOptions::from_values(&names)?,
        });
    }

    Ok(PropertyConfig::RichText {
        rich_text: EmptyConfig::default(),
    })
}
