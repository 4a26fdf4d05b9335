//! Excel出力（rust_xlsxwriter）
//!
//! records シートに変換結果、summary シートに集計を書き出す

use crate::error::{Result, SkuMapperError};
use crate::pipeline::NormalizedRecord;
use rust_xlsxwriter::*;
use sku_mapper_common::{BatchReport, CellValue, MappingStatus};
use std::path::Path;

pub fn write_workbook(
    records: &[NormalizedRecord],
    columns: &[String],
    report: &BatchReport,
    path: &Path,
) -> Result<()> {
    let mut workbook = Workbook::new();

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xF5F5F5))
        .set_border(FormatBorder::Thin);
    let unmatched_format = Format::new().set_background_color(Color::RGB(0xFFF2CC));
    let invalid_format = Format::new().set_background_color(Color::RGB(0xF4CCCC));

    let worksheet = workbook.add_worksheet();
    worksheet.set_name("records")?;

    for (idx, name) in columns.iter().enumerate() {
        worksheet.write_string_with_format(0, column_index(idx)?, name.as_str(), &header_format)?;
        worksheet.set_column_width(column_index(idx)?, 16)?;
    }
    worksheet.set_freeze_panes(1, 0)?;

    for (i, record) in records.iter().enumerate() {
        let row = row_index(i + 1)?;
        let status_format = match record.status {
            MappingStatus::Matched => None,
            MappingStatus::Unmatched => Some(&unmatched_format),
            MappingStatus::Invalid => Some(&invalid_format),
        };

        for (idx, name) in columns.iter().enumerate() {
            let col = column_index(idx)?;
            match (record.value(name), status_format) {
                (CellValue::Empty, _) => {}
                (CellValue::Number(n), _) => {
                    worksheet.write_number(row, col, n)?;
                }
                (CellValue::Text(s), Some(format)) if name == "mapping_status" => {
                    worksheet.write_string_with_format(row, col, s, format)?;
                }
                (CellValue::Text(s), _) => {
                    worksheet.write_string(row, col, s)?;
                }
            }
        }
    }

    write_summary(workbook.add_worksheet(), report, &header_format)?;

    workbook.save(path)?;
    Ok(())
}

fn write_summary(worksheet: &mut Worksheet, report: &BatchReport, header_format: &Format) -> Result<()> {
    worksheet.set_name("summary")?;
    worksheet.set_column_width(0, 28)?;
    worksheet.set_column_width(1, 12)?;

    let counts = [
        ("total_rows", report.total_rows),
        ("matched", report.matched_count),
        ("unmatched", report.unmatched_count),
        ("invalid", report.invalid_count),
    ];

    worksheet.write_string_with_format(0, 0, "項目", header_format)?;
    worksheet.write_string_with_format(0, 1, "件数", header_format)?;

    let mut row: u32 = 1;
    for (label, count) in counts {
        worksheet.write_string(row, 0, label)?;
        worksheet.write_number(row, 1, count as f64)?;
        row += 1;
    }
    worksheet.write_string(row, 0, "success_rate (%)")?;
    worksheet.write_number(row, 1, (report.success_rate * 10.0).round() / 10.0)?;
    row += 2;

    if !report.top_master_skus.is_empty() {
        worksheet.write_string_with_format(row, 0, "MSKU", header_format)?;
        worksheet.write_string_with_format(row, 1, "件数", header_format)?;
        row += 1;
        for top in &report.top_master_skus {
            worksheet.write_string(row, 0, top.master_sku.as_str())?;
            worksheet.write_number(row, 1, top.count as f64)?;
            row += 1;
        }
    }

    Ok(())
}

fn column_index(idx: usize) -> Result<u16> {
    u16::try_from(idx).map_err(|_| SkuMapperError::Format(format!("列数が多すぎます: {}", idx + 1)))
}

fn row_index(idx: usize) -> Result<u32> {
    u32::try_from(idx).map_err(|_| SkuMapperError::Format(format!("行数が多すぎます: {}", idx)))
}
