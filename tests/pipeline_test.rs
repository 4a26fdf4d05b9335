//! 変換パイプラインの統合テスト
//!
//! CSV/Excelを一時ディレクトリに作成して run_batch を通す

use rust_xlsxwriter::Workbook;
use sku_mapper::error::SkuMapperError;
use sku_mapper::pipeline::{run_batch, BatchOptions};
use sku_mapper::reader::{self, InputFormat, ReaderOptions};
use sku_mapper_common::{MappingStatus, MasterTable, MatchSource};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn master() -> MasterTable {
    MasterTable::from_json(r#"{"MSKU-1": ["AB123"], "COFFEE_MUG": ["CM002", "MUG_CERAMIC"]}"#)
        .expect("マスタの読み込みに失敗")
}

fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("ファイル作成に失敗");
    path
}

#[test]
fn test_basic_mapping_scenario() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_file(
        dir.path(),
        "sales.csv",
        b"sku,qty\nab-123,1\nAB123 ,2\n,3\nzz-999,4\n",
    );

    let outcome = run_batch(&input, &master(), &BatchOptions::default()).unwrap();

    let statuses: Vec<MappingStatus> = outcome.results.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            MappingStatus::Matched,
            MappingStatus::Matched,
            MappingStatus::Invalid,
            MappingStatus::Unmatched,
        ]
    );

    assert_eq!(outcome.results[0].matched_master_sku.as_deref(), Some("MSKU-1"));
    assert_eq!(outcome.results[1].matched_master_sku.as_deref(), Some("MSKU-1"));
    assert_eq!(outcome.results[0].confidence, 1.0);
    assert_eq!(outcome.results[3].confidence, 0.0);

    let rows: Vec<usize> = outcome.results.iter().map(|r| r.row).collect();
    assert_eq!(rows, vec![2, 3, 4, 5]);

    let report = &outcome.report;
    assert_eq!(report.total_rows, 4);
    assert_eq!(report.matched_count, 2);
    assert_eq!(report.unmatched_count, 1);
    assert_eq!(report.invalid_count, 1);
    assert!(report.is_consistent());
    assert_eq!(outcome.records.len(), 4);
    assert_eq!(outcome.sku_column, "sku");
}

#[test]
fn test_sku_column_detected_by_header_name() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_file(
        dir.path(),
        "orders.csv",
        b"Order Date,Seller SKU,Quantity\n2024-01-01,mug_ceramic,2\n2024-01-02,msku 1,1\n",
    );

    let outcome = run_batch(&input, &master(), &BatchOptions::default()).unwrap();
    assert_eq!(outcome.sku_column, "Seller SKU");

    assert_eq!(outcome.results[0].matched_master_sku.as_deref(), Some("COFFEE_MUG"));
    assert_eq!(outcome.results[0].matched_via, Some(MatchSource::Alias));

    // MSKU自体の表記でも照合できる
    assert_eq!(outcome.results[1].matched_master_sku.as_deref(), Some("MSKU-1"));
    assert_eq!(outcome.results[1].matched_via, Some(MatchSource::Canonical));
}

#[test]
fn test_missing_sku_column_is_schema_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    // ヘッダーにも値にもSKUらしい列が無い
    let input = write_file(dir.path(), "no_sku.csv", b"qty,price\n1,9.99\n2,5.5\n");

    let result = run_batch(&input, &master(), &BatchOptions::default());
    assert!(matches!(result, Err(SkuMapperError::Schema(_))));
}

#[test]
fn test_sku_column_detected_from_values() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_file(
        dir.path(),
        "listing.csv",
        b"qty,price,listing\n1,9.99,ab-123\n2,5.5,zz-999\n3,1.25,CM002\n",
    );

    let outcome = run_batch(&input, &master(), &BatchOptions::default()).unwrap();
    assert_eq!(outcome.sku_column, "listing");
    assert_eq!(outcome.report.total_rows, 3);
    assert_eq!(outcome.report.matched_count, 2);
    assert_eq!(outcome.report.unmatched_count, 1);

    // 推定に使った先頭行も結果に含まれる
    let rows: Vec<usize> = outcome.results.iter().map(|r| r.row).collect();
    assert_eq!(rows, vec![2, 3, 4]);
    assert!(outcome.report.is_consistent());
}

#[test]
fn test_explicit_sku_column_is_not_guessed() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_file(dir.path(), "listing.csv", b"qty,listing\n1,ab-123\n");

    let options = BatchOptions {
        reader: ReaderOptions {
            sku_column: Some("fnsku".into()),
            ..Default::default()
        },
        ..Default::default()
    };
    let result = run_batch(&input, &master(), &options);
    assert!(matches!(result, Err(SkuMapperError::Schema(_))));
}

#[test]
fn test_explicit_sku_column_must_exist() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_file(dir.path(), "sales.csv", b"sku,qty\nab-123,1\n");

    let options = BatchOptions {
        reader: ReaderOptions {
            sku_column: Some("fnsku".into()),
            ..Default::default()
        },
        ..Default::default()
    };
    let result = run_batch(&input, &master(), &options);
    assert!(matches!(result, Err(SkuMapperError::Schema(_))));
}

#[test]
fn test_unsupported_extension_is_format_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_file(dir.path(), "sales.txt", b"sku\nab-123\n");

    let result = run_batch(&input, &master(), &BatchOptions::default());
    assert!(matches!(result, Err(SkuMapperError::Format(_))));
}

#[test]
fn test_oversized_file_is_format_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_file(dir.path(), "sales.csv", b"sku,qty\nab-123,1\nzz-999,2\n");

    let options = BatchOptions {
        reader: ReaderOptions {
            max_file_size: 8,
            ..Default::default()
        },
        ..Default::default()
    };
    let result = run_batch(&input, &master(), &options);
    assert!(matches!(result, Err(SkuMapperError::Format(_))));
}

#[test]
fn test_broken_spreadsheet_is_format_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_file(dir.path(), "broken.xlsx", b"this is not a zip archive");

    let result = run_batch(&input, &master(), &BatchOptions::default());
    assert!(matches!(result, Err(SkuMapperError::Format(_))));
}

#[test]
fn test_missing_input_file() {
    let result = run_batch(
        Path::new("/nonexistent/sales_12345.csv"),
        &master(),
        &BatchOptions::default(),
    );
    assert!(matches!(result, Err(SkuMapperError::FileNotFound(_))));
}

#[test]
fn test_undecodable_row_is_invalid_and_batch_continues() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_file(dir.path(), "sales.csv", b"sku,qty\n\xff\xfe,1\nab-123,2\n");

    let outcome = run_batch(&input, &master(), &BatchOptions::default()).unwrap();

    assert_eq!(outcome.report.total_rows, 2);
    assert_eq!(outcome.results[0].status, MappingStatus::Invalid);
    assert!(outcome.results[0].reason.as_deref().unwrap_or("").contains("UTF-8"));
    // 読めた範囲のSKUは置換文字付きで残る
    assert_eq!(outcome.results[0].original_sku, "\u{fffd}\u{fffd}");
    assert_eq!(outcome.results[1].status, MappingStatus::Matched);
    assert!(outcome.report.is_consistent());
}

#[test]
fn test_undecodable_value_outside_sku_column() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_file(dir.path(), "sales.csv", b"sku,note\nab-123,caf\xe9\n");

    let outcome = run_batch(&input, &master(), &BatchOptions::default()).unwrap();

    assert_eq!(outcome.report.total_rows, 1);
    assert_eq!(outcome.results[0].status, MappingStatus::Matched);
    assert_eq!(outcome.results[0].matched_master_sku.as_deref(), Some("MSKU-1"));

    let note = outcome.records[0]
        .cells
        .get("note")
        .map(|v| v.render())
        .unwrap_or_default();
    assert_eq!(note, "caf\u{fffd}");
}

#[test]
fn test_delimiter_only_row_is_invalid() {
    let dir = tempdir().expect("Failed to create temp dir");
    // 完全な空行は読み飛ばし、区切り文字だけの行は1行として数える
    let input = write_file(dir.path(), "sales.csv", b"sku,qty\nab-123,1\n\n,\nzz-999,2\n");

    let outcome = run_batch(&input, &master(), &BatchOptions::default()).unwrap();
    assert_eq!(outcome.report.total_rows, 3);
    assert_eq!(outcome.report.matched_count, 1);
    assert_eq!(outcome.report.unmatched_count, 1);
    assert_eq!(outcome.report.invalid_count, 1);
    assert_eq!(outcome.results[1].status, MappingStatus::Invalid);
    assert_eq!(outcome.results[1].row, 4);
    assert!(outcome.report.is_consistent());
}

#[test]
fn test_header_only_file_yields_empty_report() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_file(dir.path(), "empty.csv", b"sku,qty\n");

    let outcome = run_batch(&input, &master(), &BatchOptions::default()).unwrap();
    assert_eq!(outcome.report.total_rows, 0);
    assert_eq!(outcome.report.success_rate, 0.0);
    assert!(outcome.results.is_empty());
}

#[test]
fn test_fingerprint_is_stable_sha256() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_file(dir.path(), "sales.csv", b"sku\nab-123\n");

    let first = run_batch(&input, &master(), &BatchOptions::default()).unwrap();
    let second = run_batch(&input, &master(), &BatchOptions::default()).unwrap();

    assert_eq!(first.fingerprint.len(), 64);
    assert_eq!(first.fingerprint, second.fingerprint);
}

#[test]
fn test_csv_content_with_forced_format() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_file(dir.path(), "export.dat", b"sku\nab-123\n");

    let options = BatchOptions {
        format: Some(InputFormat::Csv),
        ..Default::default()
    };
    let outcome = run_batch(&input, &master(), &options).unwrap();
    assert_eq!(outcome.report.matched_count, 1);
}

fn write_workbook(path: &Path) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "Order").unwrap();
    sheet.write_string(0, 1, "SKU").unwrap();

    sheet.write_string(1, 0, "ORD-1").unwrap();
    sheet.write_string(1, 1, "ab-123").unwrap();

    // 数値セルのSKU
    sheet.write_string(2, 0, "ORD-2").unwrap();
    sheet.write_number(2, 1, 4012).unwrap();

    // 4行目は空行
    sheet.write_string(4, 0, "ORD-4").unwrap();
    sheet.write_string(4, 1, "zz-999").unwrap();

    workbook.save(path).unwrap();
}

#[test]
fn test_spreadsheet_input() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = dir.path().join("sales.xlsx");
    write_workbook(&input);

    let table = MasterTable::from_json(r#"{"MSKU-1": ["AB123"], "PLAIN_CUP": ["4012"]}"#).unwrap();
    let outcome = run_batch(&input, &table, &BatchOptions::default()).unwrap();

    assert_eq!(outcome.format, InputFormat::Spreadsheet);
    assert_eq!(outcome.sku_column, "SKU");

    let rows: Vec<usize> = outcome.results.iter().map(|r| r.row).collect();
    assert_eq!(rows, vec![2, 3, 4, 5]);

    assert_eq!(outcome.results[0].matched_master_sku.as_deref(), Some("MSKU-1"));
    assert_eq!(outcome.results[1].original_sku, "4012");
    assert_eq!(outcome.results[1].matched_master_sku.as_deref(), Some("PLAIN_CUP"));
    assert_eq!(outcome.results[2].status, MappingStatus::Invalid);
    assert_eq!(outcome.results[3].status, MappingStatus::Unmatched);
    assert_eq!(outcome.report.invalid_count, 1);
    assert!(outcome.report.is_consistent());
}

#[test]
fn test_missing_sheet_is_format_error() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = dir.path().join("sales.xlsx");
    write_workbook(&input);

    let options = BatchOptions {
        reader: ReaderOptions {
            sheet: Some("NoSuchSheet".into()),
            ..Default::default()
        },
        ..Default::default()
    };
    let result = run_batch(&input, &master(), &options);
    assert!(matches!(result, Err(SkuMapperError::Format(_))));
}

#[test]
fn test_inspect_without_sku_column() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_file(dir.path(), "no_sku.csv", b"qty,price\n1,9.99\n");

    let info = reader::inspect(&input, None, &ReaderOptions::default()).unwrap();
    assert_eq!(info.headers, vec!["qty", "price"]);
    assert!(info.sku_column.is_none());

    // 追加の列名を設定すればSKU列として扱える
    let options = ReaderOptions {
        extra_sku_columns: vec!["qty".into()],
        ..Default::default()
    };
    let info = reader::inspect(&input, None, &options).unwrap();
    assert_eq!(info.sku_column.as_deref(), Some("qty"));
}

#[test]
fn test_inspect_detects_sku_column_from_values() {
    let dir = tempdir().expect("Failed to create temp dir");
    let input = write_file(dir.path(), "listing.csv", b"qty,listing\n1,ab-123\n2,zz-999\n");

    let info = reader::inspect(&input, None, &ReaderOptions::default()).unwrap();
    assert_eq!(info.sku_column.as_deref(), Some("listing"));
}
