use serde_json::{Map, Value, json};
use tracing::warn;

use crate::error::{Result, SyncError};
use crate::frame::{Cell, Frame, format_timestamp, parse_timestamp};
use crate::model::{
    self, DateValue, FileValue, FormulaResult, RelationValue, RichText, RollupValue, SelectOption,
    User,
};
use crate::schema::{DatabaseSchema, PropertyConfig};

/// Decodes one property value object into a cell, following the `type`
/// discriminator. Unknown property types decode to an empty cell after
/// logging a warning, so a single exotic column cannot fail a whole load.
pub fn decode_property(value: &Value) -> Result<Cell> {
    let kind = value.get("type").and_then(Value::as_str).ok_or_else(|| {
        SyncError::Decode("property value object is missing a type".to_string())
    })?;
    let payload = value
        .get(kind)
        .ok_or_else(|| SyncError::Decode(format!("property value is missing the '{kind}' key")))?;

    match kind {
        "title" | "rich_text" => {
            let fragments: Vec<RichText> = serde_json::from_value(payload.clone())?;
            Ok(text_cell(model::plain_text(&fragments)))
        }
        "number" => Ok(payload.as_f64().map(Cell::Number).unwrap_or(Cell::Empty)),
        "select" => {
            if payload.is_null() {
                return Ok(Cell::Empty);
            }
            let option: SelectOption = serde_json::from_value(payload.clone())?;
            Ok(text_cell(option.name))
        }
        "multi_select" => {
            let options: Vec<SelectOption> = serde_json::from_value(payload.clone())?;
            Ok(Cell::TextList(
                options.into_iter().map(|option| option.name).collect(),
            ))
        }
        "date" => {
            if payload.is_null() {
                return Ok(Cell::Empty);
            }
            let date: DateValue = serde_json::from_value(payload.clone())?;
            date.validate()?;
            Ok(date
                .timestamp()?
                .map(Cell::Timestamp)
                .unwrap_or(Cell::Empty))
        }
        "checkbox" => Ok(payload.as_bool().map(Cell::Bool).unwrap_or(Cell::Empty)),
        "url" | "email" | "phone_number" => Ok(payload
            .as_str()
            .map(|text| text_cell(text.to_string()))
            .unwrap_or(Cell::Empty)),
        "people" => {
            let users: Vec<User> = serde_json::from_value(payload.clone())?;
            let mut names = Vec::with_capacity(users.len());
            for user in &users {
                user.validate()?;
                names.push(user.value().unwrap_or(&user.id).to_string());
            }
            Ok(Cell::TextList(names))
        }
        "files" => {
            let files: Vec<FileValue> = serde_json::from_value(payload.clone())?;
            Ok(Cell::TextList(
                files
                    .iter()
                    .filter_map(|file| file.value().map(str::to_string))
                    .collect(),
            ))
        }
        "relation" => {
            let relations: Vec<RelationValue> = serde_json::from_value(payload.clone())?;
            Ok(Cell::TextList(
                relations.into_iter().map(|relation| relation.id).collect(),
            ))
        }
        "formula" => {
            let formula: FormulaResult = serde_json::from_value(payload.clone())?;
            decode_formula(&formula)
        }
        "rollup" => {
            let rollup: RollupValue = serde_json::from_value(payload.clone())?;
            decode_rollup(&rollup)
        }
        "created_time" | "last_edited_time" => {
            let raw = payload
                .as_str()
                .ok_or_else(|| SyncError::Decode(format!("{kind} must be a string")))?;
            Ok(Cell::Timestamp(parse_timestamp(raw)?))
        }
        "created_by" | "last_edited_by" => {
            let user: User = serde_json::from_value(payload.clone())?;
            user.validate()?;
            Ok(user
                .value()
                .map(|name| text_cell(name.to_string()))
                .unwrap_or(Cell::Empty))
        }
        other => {
            warn!(property_type = other, "skipping unknown property type");
            Ok(Cell::Empty)
        }
    }
}

fn decode_formula(formula: &FormulaResult) -> Result<Cell> {
    match formula.kind.as_str() {
        "string" => Ok(formula
            .string
            .clone()
            .map(text_cell)
            .unwrap_or(Cell::Empty)),
        "number" => Ok(formula.number.map(Cell::Number).unwrap_or(Cell::Empty)),
        "boolean" => Ok(formula.boolean.map(Cell::Bool).unwrap_or(Cell::Empty)),
        "date" => match &formula.date {
            Some(date) => Ok(date
                .timestamp()?
                .map(Cell::Timestamp)
                .unwrap_or(Cell::Empty)),
            None => Ok(Cell::Empty),
        },
        other => Err(SyncError::Decode(format!(
            "formula type '{other}' is invalid"
        ))),
    }
}

fn decode_rollup(rollup: &RollupValue) -> Result<Cell> {
    match rollup.kind.as_str() {
        "number" => Ok(rollup.number.map(Cell::Number).unwrap_or(Cell::Empty)),
        "date" => match &rollup.date {
            Some(date) => Ok(date
                .timestamp()?
                .map(Cell::Timestamp)
                .unwrap_or(Cell::Empty)),
            None => Ok(Cell::Empty),
        },
        // Array elements are property value objects without the id key.
        // Each is decoded on its own and rendered into the list.
        "array" => {
            let elements = rollup.array.as_deref().unwrap_or_default();
            let mut rendered = Vec::with_capacity(elements.len());
            for element in elements {
                let cell = decode_property(element)?;
                if !cell.is_empty() {
                    rendered.push(cell.to_string());
                }
            }
            Ok(Cell::TextList(rendered))
        }
        other => Err(SyncError::Decode(format!(
            "rollup type '{other}' is invalid"
        ))),
    }
}

fn text_cell(text: String) -> Cell {
    if text.is_empty() {
        Cell::Empty
    } else {
        Cell::Text(text)
    }
}

/// The decoded property values of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    /// Page identifier, absent for records built locally.
    pub id: Option<String>,
    properties: Vec<(String, Cell)>,
}

impl PageRecord {
    /// Decodes a page object returned by a database query.
    pub fn from_raw(page: &Value) -> Result<Self> {
        let id = page
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string);
        let properties = page
            .get("properties")
            .and_then(Value::as_object)
            .ok_or_else(|| SyncError::Decode("page object is missing properties".to_string()))?;

        let mut decoded = Vec::with_capacity(properties.len());
        for (name, value) in properties {
            let cell = decode_property(value).map_err(|err| {
                SyncError::Decode(format!("failed to decode property '{name}': {err}"))
            })?;
            decoded.push((name.clone(), cell));
        }

        Ok(Self {
            id,
            properties: decoded,
        })
    }

    /// The decoded cell of the named property.
    pub fn get(&self, name: &str) -> Option<&Cell> {
        self.properties
            .iter()
            .find(|(property, _)| property == name)
            .map(|(_, cell)| cell)
    }
}

/// All records returned by a database query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageRecords {
    records: Vec<PageRecord>,
}

impl PageRecords {
    /// Decodes the `results` array of a database query response.
    pub fn from_raw(results: &[Value]) -> Result<Self> {
        let records = results
            .iter()
            .map(PageRecord::from_raw)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { records })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when no records were decoded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Materialises the records as a frame, with columns in schema order.
    /// Properties a page does not carry become empty cells.
    pub fn to_frame(&self, schema: &DatabaseSchema) -> Result<Frame> {
        let mut frame = Frame::new(schema.columns().map(str::to_string).collect())?;
        for record in &self.records {
            let row = schema
                .columns()
                .map(|column| record.get(column).cloned().unwrap_or(Cell::Empty))
                .collect();
            frame.push_row(row)?;
        }
        Ok(frame)
    }
}

/// Encodes one cell for the property configuration of its column, producing
/// the request fragment used when creating a page. Empty cells and computed
/// columns encode to `None` and are left out of the request.
pub fn encode_property(column: &str, cell: &Cell, config: &PropertyConfig) -> Result<Option<Value>> {
    if cell.is_empty() || !config.is_editable() {
        return Ok(None);
    }

    let encoded = match config {
        PropertyConfig::Title { .. } => {
            json!({ "title": RichText::encode_chunks(&coerce_text(cell)) })
        }
        PropertyConfig::RichText { .. } => {
            json!({ "rich_text": RichText::encode_chunks(&coerce_text(cell)) })
        }
        PropertyConfig::Number { .. } => {
            let number = match cell {
                Cell::Number(value) => *value,
                Cell::Text(value) => value.trim().parse::<f64>().map_err(|_| {
                    invalid_value(column, cell, "expected a number")
                })?,
                _ => return Err(invalid_value(column, cell, "expected a number")),
            };
            json!({ "number": number })
        }
        PropertyConfig::Select { .. } => {
            let option = SelectOption::from_value(&coerce_text(cell))?;
            json!({ "select": option })
        }
        PropertyConfig::MultiSelect { .. } => {
            let options = cell_values(cell)
                .iter()
                .map(|value| SelectOption::from_value(value))
                .collect::<Result<Vec<_>>>()?;
            json!({ "multi_select": options })
        }
        PropertyConfig::Date { .. } => {
            let date = match cell {
                Cell::Timestamp(value) => DateValue::from_value(&format_timestamp(value))?,
                Cell::Text(value) => DateValue::from_value(value)?,
                _ => return Err(invalid_value(column, cell, "expected an ISO 8601 date")),
            };
            json!({ "date": date })
        }
        PropertyConfig::Checkbox { .. } => {
            let Cell::Bool(value) = cell else {
                return Err(invalid_value(column, cell, "expected a boolean"));
            };
            json!({ "checkbox": value })
        }
        PropertyConfig::Url { .. } => json!({ "url": coerce_text(cell) }),
        PropertyConfig::Email { .. } => json!({ "email": coerce_text(cell) }),
        PropertyConfig::PhoneNumber { .. } => json!({ "phone_number": coerce_text(cell) }),
        PropertyConfig::People { .. } => {
            let users = cell_values(cell)
                .iter()
                .map(|id| User::from_value(id))
                .collect::<Result<Vec<_>>>()?;
            json!({ "people": users })
        }
        PropertyConfig::Files { .. } => {
            let files: Vec<FileValue> = cell_values(cell)
                .iter()
                .map(|url| FileValue::external(url))
                .collect();
            json!({ "files": files })
        }
        PropertyConfig::Relation { .. } => {
            let relations = cell_values(cell)
                .iter()
                .map(|id| RelationValue::from_value(id))
                .collect::<Result<Vec<_>>>()?;
            json!({ "relation": relations })
        }
        // Computed columns are filtered out by is_editable above.
        _ => return Ok(None),
    };

    Ok(Some(encoded))
}

/// Encodes one frame row into the `properties` object of a create-page
/// request, skipping empty cells and computed columns.
pub fn encode_row(frame: &Frame, row: usize, schema: &DatabaseSchema) -> Result<Value> {
    let cells = frame.rows().get(row).ok_or_else(|| {
        SyncError::InvalidWorkbook(format!("row {row} is out of bounds"))
    })?;

    let mut properties = Map::new();
    for (column, cell) in frame.columns().iter().zip(cells) {
        let config = schema.get(column).ok_or_else(|| {
            SyncError::SchemaMismatch(format!("column '{column}' is not part of the schema"))
        })?;
        if let Some(encoded) = encode_property(column, cell, config)? {
            properties.insert(column.clone(), encoded);
        }
    }
    Ok(Value::Object(properties))
}

fn coerce_text(cell: &Cell) -> String {
    cell.to_string()
}

fn cell_values(cell: &Cell) -> Vec<String> {
    match cell {
        Cell::TextList(values) => values.clone(),
        other => vec![other.to_string()],
    }
}

fn invalid_value(column: &str, cell: &Cell, reason: &str) -> SyncError {
    SyncError::InvalidValue {
        column: column.to_string(),
        value: cell.to_string(),
        reason: reason.to_string(),
    }
}
