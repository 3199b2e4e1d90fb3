//! 転記の結合テスト
//!
//! xlsxテンプレートとCSVを実ファイルで用意し、読み込み → 走査 → 照合 → 転記 → 保存を検証

use form_fill_common::{CellValue, Coordinate, SearchStep, SimilarityKind};
use form_fill_rust::config::Config;
use form_fill_rust::session::Session;
use form_fill_rust::{export, loader};
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn coord(s: &str) -> Coordinate {
    s.parse().unwrap()
}

fn text(s: &str) -> Option<CellValue> {
    Some(CellValue::from(s))
}

/// 梱包仕様書風のテンプレート
///
/// ```text
///   A                         B          C   D       E
/// 1 PACKING LIST FOR EXPORT:  (A1:F1 結合)
/// 3 Vendor Information
/// 4 Vendor Code:                             Date:   DD/MM/YYYY
/// 5 Vendor Name:              ________           Width
/// 7 Part No.                  (A7:A8 結合)
/// ```
fn write_template(dir: &Path) -> PathBuf {
    let path = dir.join("packing.xlsx");
    let mut workbook = Workbook::new();
    let format = Format::new();
    let ws = workbook.add_worksheet();
    ws.set_name("Form").unwrap();

    ws.merge_range(0, 0, 0, 5, "PACKING LIST FOR EXPORT:", &format).unwrap();
    ws.write_string(2, 0, "Vendor Information").unwrap();
    ws.write_string(3, 0, "Vendor Code:").unwrap();
    ws.write_string(3, 3, "Date:").unwrap();
    ws.write_string(3, 4, "DD/MM/YYYY").unwrap();
    ws.write_string(4, 0, "Vendor Name:").unwrap();
    ws.write_string(4, 1, "________").unwrap();
    ws.write_string(4, 4, "Width").unwrap();
    ws.merge_range(6, 0, 7, 0, "Part No.", &format).unwrap();
    ws.write_number(9, 5, 42).unwrap();

    workbook.save(&path).unwrap();
    path
}

fn write_data(dir: &Path) -> PathBuf {
    let path = dir.join("parts.csv");
    std::fs::write(
        &path,
        "Vendor Code,Vendor Name,Part No.,Date\n\
         V-001,Acme Corp,PN-100,12/05/2024\n\
         V-002,Beta Ltd,PN-200,13/05/2024\n\
         V-003,Gamma/Delta,PN-300,\n",
    )
    .unwrap();
    path
}

fn session() -> Session {
    Session::new(&Config::default()).unwrap().with_cache(false)
}

#[test]
fn test_fill_packing_list() {
    let dir = tempdir().expect("Failed to create temp dir");
    let template = write_template(dir.path());
    let data = write_data(dir.path());

    let session = session();
    let loaded = session.open_template(&template, None).unwrap();
    assert!(loaded.diagnostics.is_empty());
    assert_eq!(loaded.registry.fields().count(), 4);

    let table = loader::load_data_table(&data, None).unwrap();
    let outcome = session
        .filler()
        .fill(&loaded.spreadsheet, &loaded.registry, &table, 0)
        .unwrap();

    assert_eq!(outcome.filled_count, 4);
    let sheet = &outcome.spreadsheet;
    assert_eq!(sheet.value(coord("B4")).cloned(), text("V-001"));
    assert_eq!(sheet.value(coord("E4")).cloned(), text("12/05/2024"));
    assert_eq!(sheet.value(coord("B5")).cloned(), text("Acme Corp"));
    assert_eq!(sheet.value(coord("B7")).cloned(), text("PN-100"));
    // ラベル・見出しは変更されない
    assert_eq!(sheet.value(coord("A4")).cloned(), text("Vendor Code:"));
    assert_eq!(sheet.value(coord("E5")).cloned(), text("Width"));
    assert!(outcome.writes.iter().all(|w| w.step == SearchStep::Right));
}

#[test]
fn test_fill_no_matching_columns() {
    let dir = tempdir().expect("Failed to create temp dir");
    let template = write_template(dir.path());
    let data = dir.path().join("other.csv");
    std::fs::write(&data, "qqq,zzzz\n1,2\n").unwrap();

    let session = session();
    let loaded = session.open_template(&template, None).unwrap();
    let table = loader::load_data_table(&data, None).unwrap();

    let mut diagnostics = loaded.diagnostics.clone();
    let mappings = session.filler().map(&loaded.registry, &table, &mut diagnostics);
    assert!(!mappings.is_empty());
    assert!(mappings.iter().all(|m| !m.is_mappable));

    let outcome = session
        .filler()
        .fill(&loaded.spreadsheet, &loaded.registry, &table, 0)
        .unwrap();
    assert_eq!(outcome.filled_count, 0);
    assert!(outcome.writes.is_empty());
}

#[test]
fn test_fill_batch_writes_one_file_per_row() {
    let dir = tempdir().expect("Failed to create temp dir");
    let template = write_template(dir.path());
    let data = write_data(dir.path());
    let out_dir = dir.path().join("out");
    std::fs::create_dir_all(&out_dir).unwrap();

    let session = session();
    let loaded = session.open_template(&template, None).unwrap();
    let table = loader::load_data_table(&data, None).unwrap();
    let outcomes = session
        .filler()
        .fill_batch(&loaded.spreadsheet, &loaded.registry, &table)
        .unwrap();
    assert_eq!(outcomes.len(), 3);

    let stem = export::template_stem(&template);
    for outcome in &outcomes {
        let path = export::batch_output_path(&out_dir, &stem, outcome.row_index);
        export::save_spreadsheet(&outcome.spreadsheet, &path).unwrap();
    }

    let third = loader::load_template(&out_dir.join("packing_row003.xlsx"), None).unwrap();
    assert_eq!(third.value(coord("B5")).cloned(), text("Gamma/Delta"));
    // 空値は空文字列として書き込まれ、読み戻すと空セル
    assert_eq!(third.value(coord("E4")), None);

    let first = loader::load_template(&out_dir.join("packing_row001.xlsx"), None).unwrap();
    assert_eq!(first.value(coord("B7")).cloned(), text("PN-100"));
}

#[test]
fn test_row_out_of_range() {
    let dir = tempdir().expect("Failed to create temp dir");
    let template = write_template(dir.path());
    let data = write_data(dir.path());

    let session = session();
    let loaded = session.open_template(&template, None).unwrap();
    let table = loader::load_data_table(&data, None).unwrap();
    let result = session
        .filler()
        .fill(&loaded.spreadsheet, &loaded.registry, &table, 3);

    assert!(matches!(
        result,
        Err(form_fill_common::Error::RowOutOfRange { row: 3, rows: 3 })
    ));
}

#[test]
fn test_basic_strategy_fills_same_fields() {
    let dir = tempdir().expect("Failed to create temp dir");
    let template = write_template(dir.path());
    let data = write_data(dir.path());

    let config = Config {
        strategy: SimilarityKind::Basic,
        ..Default::default()
    };
    let session = Session::new(&config).unwrap().with_cache(false);
    let loaded = session.open_template(&template, None).unwrap();
    let table = loader::load_data_table(&data, None).unwrap();
    let outcome = session
        .filler()
        .fill(&loaded.spreadsheet, &loaded.registry, &table, 1)
        .unwrap();

    assert_eq!(outcome.filled_count, 4);
    assert_eq!(outcome.spreadsheet.value(coord("B4")).cloned(), text("V-002"));
}
