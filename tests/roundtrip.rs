use chrono::NaiveDate;
use notion_sheets::frame::{Cell, Frame};
use notion_sheets::io::{excel_read, excel_write};
use notion_sheets::model::{SelectOption, SelectOptions};
use notion_sheets::schema::{
    DatabaseSchema, EmptyConfig, NumberFormat, PropertyConfig, RelationConfig,
};
use tempfile::tempdir;

fn sample_schema() -> DatabaseSchema {
    DatabaseSchema::new(vec![
        (
            "Name".to_string(),
            PropertyConfig::Title {
                title: EmptyConfig::default(),
            },
        ),
        (
            "Score".to_string(),
            PropertyConfig::Number {
                number: NumberFormat::default(),
            },
        ),
        (
            "Done".to_string(),
            PropertyConfig::Checkbox {
                checkbox: EmptyConfig::default(),
            },
        ),
        (
            "Due".to_string(),
            PropertyConfig::Date {
                date: EmptyConfig::default(),
            },
        ),
        (
            "Tags".to_string(),
            PropertyConfig::MultiSelect {
                multi_select: SelectOptions {
                    options: vec![
                        SelectOption::from_value("rust").expect("option"),
                        SelectOption::from_value("excel").expect("option"),
                    ],
                },
            },
        ),
    ])
    .expect("schema built")
}

fn sample_frame() -> Frame {
    let mut frame = Frame::new(vec![
        "Name".to_string(),
        "Score".to_string(),
        "Done".to_string(),
        "Due".to_string(),
        "Tags".to_string(),
    ])
    .expect("frame built");

    frame
        .push_row(vec![
            Cell::Text("Alice".to_string()),
            Cell::Number(30.0),
            Cell::Bool(true),
            Cell::Timestamp(
                NaiveDate::from_ymd_opt(2024, 3, 1)
                    .expect("date")
                    .and_hms_opt(10, 30, 0)
                    .expect("datetime"),
            ),
            Cell::TextList(vec!["rust".to_string(), "excel".to_string()]),
        ])
        .expect("row pushed");
    frame
        .push_row(vec![
            Cell::Text("Bob".to_string()),
            Cell::Empty,
            Cell::Bool(false),
            Cell::Timestamp(
                NaiveDate::from_ymd_opt(2024, 4, 2)
                    .expect("date")
                    .and_hms_opt(0, 0, 0)
                    .expect("datetime"),
            ),
            Cell::Empty,
        ])
        .expect("row pushed");

    frame
}

#[test]
fn excel_roundtrip_preserves_cells_and_schema() {
    let frame = sample_frame();
    let schema = sample_schema();

    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join("database.xlsx");
    excel_write::write_frame(&xlsx_path, &frame, Some(&schema)).expect("Excel written");

    let (restored_frame, restored_schema) = excel_read::read_frame(&xlsx_path).expect("Excel read");

    assert_eq!(frame, restored_frame);
    assert_eq!(Some(schema), restored_schema);
}

#[test]
fn workbook_without_schema_sheet_reads_plain_cells() {
    let frame = sample_frame();

    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join("plain.xlsx");
    excel_write::write_frame(&xlsx_path, &frame, None).expect("Excel written");

    let (restored_frame, restored_schema) = excel_read::read_frame(&xlsx_path).expect("Excel read");

    assert_eq!(restored_schema, None);
    // Numbers and booleans keep their type through native Excel cells.
    assert_eq!(restored_frame.cell(0, "Score"), Some(&Cell::Number(30.0)));
    assert_eq!(restored_frame.cell(0, "Done"), Some(&Cell::Bool(true)));
    // List cells are written as JSON arrays and recognised on the way back.
    assert_eq!(
        restored_frame.cell(0, "Tags"),
        Some(&Cell::TextList(vec![
            "rust".to_string(),
            "excel".to_string()
        ]))
    );
    // Without a schema the timestamp column comes back as text.
    assert_eq!(
        restored_frame.cell(1, "Due"),
        Some(&Cell::Text("2024-04-02".to_string()))
    );
}

#[test]
fn schema_sheet_restores_parameterised_configs() {
    let schema = DatabaseSchema::new(vec![
        (
            "Name".to_string(),
            PropertyConfig::Title {
                title: EmptyConfig::default(),
            },
        ),
        (
            "Parent".to_string(),
            PropertyConfig::Relation {
                relation: RelationConfig {
                    database_id: "b55c9c91-384d-452b-81db-d1ef79372b75".to_string(),
                    synced_property_name: Some("Children".to_string()),
                    synced_property_id: None,
                },
            },
        ),
    ])
    .expect("schema built");

    let mut frame = Frame::new(vec!["Name".to_string(), "Parent".to_string()]).expect("frame");
    frame
        .push_row(vec![
            Cell::Text("Widget".to_string()),
            Cell::TextList(vec!["b55c9c91-384d-452b-81db-d1ef79372b75".to_string()]),
        ])
        .expect("row pushed");

    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join("typed.xlsx");
    excel_write::write_frame(&xlsx_path, &frame, Some(&schema)).expect("Excel written");

    let (_, restored_schema) = excel_read::read_frame(&xlsx_path).expect("Excel read");
    assert_eq!(Some(schema), restored_schema);
}

#[test]
fn missing_data_sheet_is_rejected() {
    let temp_dir = tempdir().expect("temporary directory");
    let xlsx_path = temp_dir.path().join("empty.xlsx");

    let mut workbook = rust_xlsxwriter::Workbook::new();
    workbook.add_worksheet().set_name("Other").expect("sheet");
    workbook.save(&xlsx_path).expect("workbook saved");

    let error = excel_read::read_frame(&xlsx_path).expect_err("read must fail");
    assert!(error.to_string().contains("missing sheet"));
}
