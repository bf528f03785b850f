use chrono::NaiveDate;
use notion_sheets::blocks;
use notion_sheets::frame::{Cell, Frame};
use notion_sheets::model::{RichText, SelectOption};
use notion_sheets::schema::{DatabaseSchema, PropertyConfig};
use notion_sheets::sync::{extract_id, is_database_url};
use notion_sheets::values::{PageRecords, encode_row};
use notion_sheets::SyncError;
use serde_json::json;

fn retrieve_fixture() -> serde_json::Value {
    json!({
        "Name": { "id": "title", "name": "Name", "type": "title", "title": {} },
        "Score": { "id": "a%3Ab", "name": "Score", "type": "number", "number": { "format": "number" } },
        "Stage": { "id": "c%3Ad", "name": "Stage", "type": "select", "select": { "options": [
            { "id": "1", "name": "todo", "color": "gray" },
            { "id": "2", "name": "done", "color": "green" }
        ] } },
        "Tags": { "id": "e%3Af", "name": "Tags", "type": "multi_select", "multi_select": { "options": [] } },
        "Due": { "id": "g%3Ah", "name": "Due", "type": "date", "date": {} },
        "Done": { "id": "i%3Aj", "name": "Done", "type": "checkbox", "checkbox": {} },
        "Owner": { "id": "k%3Al", "name": "Owner", "type": "people", "people": {} },
        "Total": { "id": "m%3An", "name": "Total", "type": "formula", "formula": { "expression": "prop(\"Score\") * 2" } }
    })
}

fn page_fixture() -> serde_json::Value {
    json!({
        "object": "page",
        "id": "59833787-2cf9-4fdf-8782-e53db20768a5",
        "created_time": "2023-01-15T10:30:00.000Z",
        "properties": {
            "Name": { "id": "title", "type": "title", "title": [
                { "type": "text", "plain_text": "Launch", "text": { "content": "Launch" } }
            ] },
            "Score": { "id": "a%3Ab", "type": "number", "number": 9.5 },
            "Stage": { "id": "c%3Ad", "type": "select", "select": { "id": "2", "name": "done", "color": "green" } },
            "Tags": { "id": "e%3Af", "type": "multi_select", "multi_select": [
                { "id": "1", "name": "rust", "color": "orange" },
                { "id": "2", "name": "sync", "color": "blue" }
            ] },
            "Due": { "id": "g%3Ah", "type": "date", "date": { "start": "2023-02-01" } },
            "Done": { "id": "i%3Aj", "type": "checkbox", "checkbox": true },
            "Owner": { "id": "k%3Al", "type": "people", "people": [
                { "object": "user", "id": "6794760a-1f15-45cd-9c65-0dfe42f5135a", "name": "Alice" }
            ] },
            "Total": { "id": "m%3An", "type": "formula", "formula": { "type": "number", "number": 19.0 } }
        }
    })
}

#[test]
fn schema_from_raw_keeps_column_order_and_types() {
    let schema = DatabaseSchema::from_raw(&retrieve_fixture()).expect("schema decoded");

    let columns: Vec<&str> = schema.columns().collect();
    assert_eq!(
        columns,
        vec!["Name", "Score", "Stage", "Tags", "Due", "Done", "Owner", "Total"]
    );
    assert_eq!(schema.title_column(), Some("Name"));
    assert!(matches!(
        schema.get("Stage"),
        Some(PropertyConfig::Select { select }) if select.options.len() == 2
    ));
    assert!(matches!(
        schema.get("Total"),
        Some(PropertyConfig::Formula { formula }) if formula.expression.contains("Score")
    ));
}

#[test]
fn query_results_decode_into_a_frame() {
    let schema = DatabaseSchema::from_raw(&retrieve_fixture()).expect("schema decoded");
    let records = PageRecords::from_raw(&[page_fixture()]).expect("records decoded");
    let frame = records.to_frame(&schema).expect("frame built");

    assert_eq!(frame.len(), 1);
    assert_eq!(frame.cell(0, "Name"), Some(&Cell::Text("Launch".to_string())));
    assert_eq!(frame.cell(0, "Score"), Some(&Cell::Number(9.5)));
    assert_eq!(frame.cell(0, "Stage"), Some(&Cell::Text("done".to_string())));
    assert_eq!(
        frame.cell(0, "Tags"),
        Some(&Cell::TextList(vec!["rust".to_string(), "sync".to_string()]))
    );
    assert_eq!(
        frame.cell(0, "Due"),
        Some(&Cell::Timestamp(
            NaiveDate::from_ymd_opt(2023, 2, 1)
                .expect("date")
                .and_hms_opt(0, 0, 0)
                .expect("datetime")
        ))
    );
    assert_eq!(frame.cell(0, "Done"), Some(&Cell::Bool(true)));
    assert_eq!(
        frame.cell(0, "Owner"),
        Some(&Cell::TextList(vec!["Alice".to_string()]))
    );
    assert_eq!(frame.cell(0, "Total"), Some(&Cell::Number(19.0)));
}

#[test]
fn null_and_unknown_properties_decode_to_empty_cells() {
    let schema = DatabaseSchema::from_raw(&json!({
        "Name": { "type": "title", "title": {} },
        "Stage": { "type": "select", "select": {} }
    }))
    .expect("schema decoded");

    let page = json!({
        "id": "59833787-2cf9-4fdf-8782-e53db20768a5",
        "properties": {
            "Name": { "type": "title", "title": [] },
            "Stage": { "type": "select", "select": null },
            "Verification": { "type": "verification", "verification": {} }
        }
    });

    let records = PageRecords::from_raw(&[page]).expect("records decoded");
    let frame = records.to_frame(&schema).expect("frame built");

    assert_eq!(frame.cell(0, "Name"), Some(&Cell::Empty));
    assert_eq!(frame.cell(0, "Stage"), Some(&Cell::Empty));
}

#[test]
fn rollup_arrays_render_their_elements() {
    let page = json!({
        "id": "59833787-2cf9-4fdf-8782-e53db20768a5",
        "properties": {
            "Name": { "type": "title", "title": [
                { "plain_text": "Totals", "text": { "content": "Totals" } }
            ] },
            "Scores": { "type": "rollup", "rollup": {
                "type": "array",
                "array": [
                    { "type": "number", "number": 4.0 },
                    { "type": "number", "number": 8.0 }
                ],
                "function": "show_original"
            } }
        }
    });

    let records = PageRecords::from_raw(&[page]).expect("records decoded");
    let schema = DatabaseSchema::from_raw(&json!({
        "Name": { "type": "title", "title": {} },
        "Scores": { "type": "rollup", "rollup": {
            "relation_property_name": "Items",
            "function": "show_original"
        } }
    }))
    .expect("schema decoded");
    let frame = records.to_frame(&schema).expect("frame built");

    assert_eq!(
        frame.cell(0, "Scores"),
        Some(&Cell::TextList(vec!["4".to_string(), "8".to_string()]))
    );
}

#[test]
fn schema_inference_types_columns_from_cells() {
    let mut frame = Frame::new(vec![
        "Task".to_string(),
        "Effort".to_string(),
        "Shipped".to_string(),
        "Deadline".to_string(),
        "Labels".to_string(),
        "Notes".to_string(),
    ])
    .expect("frame built");
    frame
        .push_row(vec![
            Cell::Text("Write docs".to_string()),
            Cell::Number(3.0),
            Cell::Bool(false),
            Cell::Timestamp(
                NaiveDate::from_ymd_opt(2024, 5, 1)
                    .expect("date")
                    .and_hms_opt(0, 0, 0)
                    .expect("datetime"),
            ),
            Cell::TextList(vec!["docs".to_string()]),
            Cell::Text("first pass".to_string()),
        ])
        .expect("row pushed");

    let schema = DatabaseSchema::from_frame(&frame, None).expect("schema inferred");

    assert_eq!(schema.title_column(), Some("Task"));
    assert!(matches!(
        schema.get("Effort"),
        Some(PropertyConfig::Number { .. })
    ));
    assert!(matches!(
        schema.get("Shipped"),
        Some(PropertyConfig::Checkbox { .. })
    ));
    assert!(matches!(
        schema.get("Deadline"),
        Some(PropertyConfig::Date { .. })
    ));
    assert!(matches!(
        schema.get("Labels"),
        Some(PropertyConfig::MultiSelect { multi_select }) if multi_select.options.len() == 1
    ));
    assert!(matches!(
        schema.get("Notes"),
        Some(PropertyConfig::RichText { .. })
    ));
}

#[test]
fn inference_requires_the_title_column_to_exist() {
    let frame = Frame::new(vec!["Task".to_string()]).expect("frame built");
    let error = DatabaseSchema::from_frame(&frame, Some("Missing")).expect_err("must fail");
    assert!(matches!(error, SyncError::SchemaMismatch(_)));
}

#[test]
fn encode_row_builds_the_create_page_payload() {
    let schema = DatabaseSchema::from_raw(&json!({
        "Name": { "type": "title", "title": {} },
        "Score": { "type": "number", "number": { "format": "number" } },
        "Tags": { "type": "multi_select", "multi_select": { "options": [] } },
        "Due": { "type": "date", "date": {} },
        "Done": { "type": "checkbox", "checkbox": {} },
        "Parent": { "type": "relation", "relation": { "database_id": "b55c9c91-384d-452b-81db-d1ef79372b75" } },
        "Total": { "type": "formula", "formula": { "expression": "1 + 1" } }
    }))
    .expect("schema decoded");

    let mut frame = Frame::new(vec![
        "Name".to_string(),
        "Score".to_string(),
        "Tags".to_string(),
        "Due".to_string(),
        "Done".to_string(),
        "Parent".to_string(),
        "Total".to_string(),
    ])
    .expect("frame built");
    frame
        .push_row(vec![
            Cell::Text("Widget".to_string()),
            Cell::Number(9.5),
            Cell::TextList(vec!["a".to_string(), "b".to_string()]),
            Cell::Timestamp(
                NaiveDate::from_ymd_opt(2024, 3, 1)
                    .expect("date")
                    .and_hms_opt(0, 0, 0)
                    .expect("datetime"),
            ),
            Cell::Bool(true),
            Cell::TextList(vec!["59833787-2cf9-4fdf-8782-e53db20768a5".to_string()]),
            Cell::Number(19.0),
        ])
        .expect("row pushed");

    let payload = encode_row(&frame, 0, &schema).expect("row encoded");

    assert_eq!(
        payload,
        json!({
            "Name": { "title": [{ "text": { "content": "Widget" } }] },
            "Score": { "number": 9.5 },
            "Tags": { "multi_select": [{ "name": "a" }, { "name": "b" }] },
            "Due": { "date": { "start": "2024-03-01" } },
            "Done": { "checkbox": true },
            "Parent": { "relation": [{ "id": "59833787-2cf9-4fdf-8782-e53db20768a5" }] }
        })
    );
}

#[test]
fn long_text_is_split_into_api_sized_fragments() {
    let long = "x".repeat(4500);
    let fragments = RichText::encode_chunks(&long);

    assert_eq!(fragments.len(), 3);
    let lengths: Vec<usize> = fragments
        .iter()
        .map(|fragment| fragment.value().len())
        .collect();
    assert_eq!(lengths, vec![2000, 2000, 500]);
}

#[test]
fn outgoing_values_are_validated() {
    assert!(matches!(
        SelectOption::from_value("one, two"),
        Err(SyncError::InvalidOptionName(_))
    ));

    let schema = DatabaseSchema::from_raw(&json!({
        "Name": { "type": "title", "title": {} },
        "Parent": { "type": "relation", "relation": { "database_id": "b55c9c91-384d-452b-81db-d1ef79372b75" } },
        "Due": { "type": "date", "date": {} }
    }))
    .expect("schema decoded");

    let mut frame = Frame::new(vec![
        "Name".to_string(),
        "Parent".to_string(),
        "Due".to_string(),
    ])
    .expect("frame built");
    frame
        .push_row(vec![
            Cell::Text("Widget".to_string()),
            Cell::TextList(vec!["not-a-uuid".to_string()]),
            Cell::Empty,
        ])
        .expect("row pushed");
    frame
        .push_row(vec![
            Cell::Text("Widget".to_string()),
            Cell::Empty,
            Cell::Text("next tuesday".to_string()),
        ])
        .expect("row pushed");

    assert!(matches!(
        encode_row(&frame, 0, &schema),
        Err(SyncError::InvalidIdentifier(_))
    ));
    assert!(matches!(
        encode_row(&frame, 1, &schema),
        Err(SyncError::InvalidTimestamp(_))
    ));
}

#[test]
fn blocks_parse_and_unknown_types_are_skipped() {
    let raw = vec![
        json!({
            "object": "block",
            "id": "59833787-2cf9-4fdf-8782-e53db20768a5",
            "type": "heading_1",
            "has_children": false,
            "heading_1": {
                "rich_text": [{ "plain_text": "Overview", "text": { "content": "Overview" } }],
                "is_toggleable": false
            }
        }),
        json!({
            "object": "block",
            "type": "paragraph",
            "paragraph": {
                "rich_text": [{ "plain_text": "Hello ", "text": { "content": "Hello " } },
                              { "plain_text": "world", "text": { "content": "world" } }],
                "color": "default"
            }
        }),
        json!({
            "object": "block",
            "type": "to_do",
            "to_do": {
                "rich_text": [{ "plain_text": "Ship it", "text": { "content": "Ship it" } }],
                "checked": true
            }
        }),
        json!({
            "object": "block",
            "type": "synced_block",
            "synced_block": {}
        }),
        json!({
            "object": "block",
            "type": "code",
            "code": {
                "rich_text": [{ "plain_text": "let x = 1;", "text": { "content": "let x = 1;" } }],
                "language": "rust"
            }
        }),
    ];

    let parsed = blocks::parse_blocks(&raw).expect("blocks parsed");

    assert_eq!(parsed.len(), 4);
    assert_eq!(parsed[0].plain_text(), "Overview");
    assert_eq!(parsed[1].plain_text(), "Hello world");
    assert_eq!(parsed[2].plain_text(), "Ship it");
    assert_eq!(parsed[3].plain_text(), "let x = 1;");
}

#[test]
fn database_urls_are_recognised_and_reduced_to_ids() {
    let database = "https://www.notion.so/acme/0123456789abcdef0123456789abcdef?v=aa11bb22cc33dd44ee55ff6677889900";
    let page = "https://www.notion.so/Roadmap-598337872cf94fdf8782e53db20768a5";

    assert!(is_database_url(database));
    assert!(!is_database_url(page));

    assert_eq!(
        extract_id(database).expect("database id"),
        "01234567-89ab-cdef-0123-456789abcdef"
    );
    assert_eq!(
        extract_id(page).expect("page id"),
        "59833787-2cf9-4fdf-8782-e53db20768a5"
    );

    assert!(matches!(
        extract_id("https://www.notion.so/acme/overview"),
        Err(SyncError::InvalidUrl(_))
    ));
}
