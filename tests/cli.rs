mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use serde_json::Value as Json;
use sheet_sense::{inference::DataType, quality::QualityLevel, relationships::RelationshipType};

use common::{TestWorkspace, fixture_arg};

#[test]
fn profile_writes_a_complete_document() {
    let workspace = TestWorkspace::new();
    let output = workspace.file("employees.json");
    cargo_bin_cmd!("sheet-sense")
        .args([
            "profile",
            "-i",
            &fixture_arg("employees.csv"),
            "-o",
            output.to_str().unwrap(),
            "--pretty",
        ])
        .assert()
        .success();

    let document = workspace.load_document("employees.json");
    assert_eq!(document.database_info.database_name, "employees");
    assert_eq!(document.database_info.file_type, "csv");
    assert_eq!(document.database_info.sheet_count, 1);
    assert_eq!(document.tables_info.len(), 1);
    assert_eq!(document.tables_info[0].row_count, 4);
    assert_eq!(document.columns_info.len(), 7);
    assert!(document.relationships.is_empty());

    let types = document
        .columns_info
        .iter()
        .map(|c| c.data_type)
        .collect::<Vec<_>>();
    assert_eq!(
        types,
        vec![
            DataType::Integer,
            DataType::Text,
            DataType::Text,
            DataType::Text,
            DataType::Float,
            DataType::Boolean,
            DataType::DateTime,
        ]
    );

    let email = document.column("employees", "email").expect("email");
    assert_eq!(email.null_count, 1);
    assert_eq!(email.null_percentage, 25.0);
    assert_eq!(email.unique_percentage, 75.0);
    assert_eq!(email.quality_level, QualityLevel::Medium);

    assert_eq!(document.summary.quality_counts[&QualityLevel::High], 3);
    assert_eq!(document.summary.quality_counts[&QualityLevel::Medium], 4);
    assert_eq!(document.summary.overall_quality_score, 83);
}

#[test]
fn profile_prints_to_stdout_without_output() {
    let assert = cargo_bin_cmd!("sheet-sense")
        .args(["profile", "-i", &fixture_arg("employees.csv")])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let json: Json = serde_json::from_str(&stdout).expect("json on stdout");
    assert_eq!(json["database_info"]["database_name"], "employees");
    assert_eq!(json["visualizations"][0]["type"], "bar_chart");
    assert_eq!(json["visualizations"][1]["title"], "Quality Distribution");
    assert_eq!(json["visualizations"][2]["type"], "heatmap");
    assert!(json["tables_info"][0].get("columns").is_none());
}

#[test]
fn custom_delimiter_splits_columns() {
    cargo_bin_cmd!("sheet-sense")
        .args([
            "columns",
            "-i",
            &fixture_arg("sales_semicolon.csv"),
            "--delimiter",
            ";",
        ])
        .assert()
        .success()
        .stdout(contains("amount"))
        .stdout(contains("FLOAT"));
}

#[test]
fn empty_input_is_reported_as_an_error() {
    cargo_bin_cmd!("sheet-sense")
        .args(["profile", "-i", &fixture_arg("empty.csv")])
        .assert()
        .failure()
        .stderr(contains("Nothing to profile"));
}

#[test]
fn missing_input_is_reported_as_an_error() {
    let workspace = TestWorkspace::new();
    let missing = workspace.file("missing.csv");
    cargo_bin_cmd!("sheet-sense")
        .args(["profile", "-i", missing.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn columns_report_lists_quality_grades() {
    cargo_bin_cmd!("sheet-sense")
        .args(["columns", "-i", &fixture_arg("employees.csv")])
        .assert()
        .success()
        .stdout(contains("employee_id"))
        .stdout(contains("MEDIUM"))
        .stdout(contains("Overall quality score: 83 across 7 column(s)"));
}

#[test]
fn relationships_report_handles_a_single_table() {
    cargo_bin_cmd!("sheet-sense")
        .args(["relationships", "-i", &fixture_arg("employees.csv")])
        .assert()
        .success()
        .stdout(contains("No relationships detected."));
}

#[test]
fn csv_export_flattens_columns() {
    let workspace = TestWorkspace::new();
    let output = workspace.file("columns.csv");
    cargo_bin_cmd!("sheet-sense")
        .args([
            "export",
            "-i",
            &fixture_arg("employees.csv"),
            "--format",
            "csv",
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let contents = workspace.read("columns.csv");
    let mut lines = contents.lines();
    assert_eq!(
        lines.next(),
        Some(
            "table_name,column_name,ordinal_position,data_type,is_nullable,total_count,null_count,\
             null_percentage,unique_count,unique_percentage,quality_level,quality_score,min,max,\
             mean,std,description,tags,owner"
        )
    );
    assert_eq!(lines.count(), 7);
    assert!(contents.contains("employees,salary,5,FLOAT,true,4,1,25,3,75,MEDIUM,70,99000,120000.5,"));
}

#[test]
fn export_accepts_a_saved_document() {
    let workspace = TestWorkspace::new();
    let document = workspace.file("employees.json");
    cargo_bin_cmd!("sheet-sense")
        .args([
            "profile",
            "-i",
            &fixture_arg("employees.csv"),
            "-o",
            document.to_str().unwrap(),
        ])
        .assert()
        .success();

    cargo_bin_cmd!("sheet-sense")
        .args(["export", "-i", document.to_str().unwrap(), "--format", "csv"])
        .assert()
        .success()
        .stdout(contains("employees,hired_on,7,DATETIME"));
}

#[test]
fn context_overlay_annotates_columns() {
    let workspace = TestWorkspace::new();
    let output = workspace.file("annotated.json");
    cargo_bin_cmd!("sheet-sense")
        .args([
            "profile",
            "-i",
            &fixture_arg("employees.csv"),
            "--context",
            &fixture_arg("employees_context.yml"),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let document = workspace.load_document("annotated.json");
    let email = document.column("employees", "email").expect("email");
    assert_eq!(email.description.as_deref(), Some("Work email address"));
    assert_eq!(email.owner.as_deref(), Some("people-ops"));
    assert_eq!(
        email.tags.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["contact", "pii"]
    );
    let table_email = document.tables_info[0].column("email").expect("linked");
    assert_eq!(table_email.owner.as_deref(), Some("people-ops"));
    let others_annotated = document
        .columns_info
        .iter()
        .filter(|c| c.has_business_context())
        .count();
    assert_eq!(others_annotated, 1);
}

#[test]
fn context_template_lists_every_column() {
    let workspace = TestWorkspace::new();
    let output = workspace.file("context.yml");
    cargo_bin_cmd!("sheet-sense")
        .args([
            "context-template",
            "-i",
            &fixture_arg("employees.csv"),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let overlay = sheet_sense::context::ContextOverlay::load(&output).expect("load template");
    assert_eq!(overlay.columns.len(), 7);
    assert!(overlay.columns.iter().all(|c| c.table == "employees"));
    assert_eq!(overlay.columns[2].column, "email");
}

#[test]
fn unknown_delimiter_is_rejected_by_argument_parsing() {
    cargo_bin_cmd!("sheet-sense")
        .args(["columns", "-i", &fixture_arg("employees.csv"), "--delimiter", "ab"])
        .assert()
        .failure()
        .stderr(contains("Delimiter must be a single character"));
}

#[test]
fn workbook_profiles_every_sheet_and_links_shared_ids() {
    let workspace = TestWorkspace::new();
    let output = workspace.file("company.json");
    cargo_bin_cmd!("sheet-sense")
        .args([
            "profile",
            "-i",
            &fixture_arg("company.xlsx"),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let document = workspace.load_document("company.json");
    assert_eq!(document.database_info.file_type, "xlsx");
    assert_eq!(document.database_info.sheet_count, 2);
    let tables = document
        .tables_info
        .iter()
        .map(|t| (t.table_name.as_str(), t.row_count))
        .collect::<Vec<_>>();
    assert_eq!(tables, vec![("Employees", 4), ("Sales", 3)]);

    let ids = document.column("Sales", "id").expect("Sales.id");
    assert_eq!(ids.data_type, DataType::Integer);
    let amount = document.column("Sales", "amount").expect("Sales.amount");
    assert_eq!(amount.data_type, DataType::Float);

    assert_eq!(document.relationships.len(), 1);
    let link = &document.relationships[0];
    assert_eq!(link.relationship_type, RelationshipType::ExactMatch);
    assert_eq!(link.from.to_string(), "Employees.id");
    assert_eq!(link.to.to_string(), "Sales.id");
}

#[test]
fn sheet_selection_keeps_the_workbook_sheet_count() {
    let workspace = TestWorkspace::new();
    let output = workspace.file("sales.json");
    cargo_bin_cmd!("sheet-sense")
        .args([
            "profile",
            "-i",
            &fixture_arg("company.xlsx"),
            "--sheet",
            "Sales",
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let document = workspace.load_document("sales.json");
    assert_eq!(document.database_info.sheet_count, 2);
    assert_eq!(document.tables_info.len(), 1);
    assert_eq!(document.tables_info[0].table_name, "Sales");
    assert!(document.columns_info.iter().all(|c| c.table_name == "Sales"));
    assert!(document.relationships.is_empty());
}

#[test]
fn missing_sheet_fails_the_run() {
    cargo_bin_cmd!("sheet-sense")
        .args(["profile", "-i", &fixture_arg("company.xlsx"), "--sheet", "Missing"])
        .assert()
        .failure()
        .stderr(contains("not found"));
}
