//! スプレッドシート読み込み（calamine）
//!
//! 1行目をヘッダーとして扱う。シート未指定時は先頭シート。
//! 使用範囲の外（末尾の空行）は読まない。

use super::RowRead;
use crate::error::{Result, SkuMapperError};
use calamine::{open_workbook_auto, Data, Range, Reader};
use sku_mapper_common::{unique_headers, CellValue, RawRow};
use std::path::Path;

pub struct SheetRows {
    range: Range<Data>,
    /// 次に読む行（Range内の相対位置）
    next: usize,
    height: usize,
    width: usize,
    /// Range先頭行のシート上の行番号（1始まり）
    first_line: usize,
}

pub fn open(path: &Path, sheet: Option<&str>) -> Result<(Vec<String>, SheetRows)> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| SkuMapperError::Format(format!("{}: {}", path.display(), e)))?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| SkuMapperError::Format("シートがありません".into()))?,
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| SkuMapperError::Format(format!("シート「{}」を読めません: {}", sheet_name, e)))?;

    let (height, width) = range.get_size();
    if height == 0 || width == 0 {
        return Err(SkuMapperError::Format(format!("シート「{}」が空です", sheet_name)));
    }

    let headers = unique_headers(
        (0..width).map(|col| range.get((0, col)).map(|d| cell_value(d).render()).unwrap_or_default()),
    );
    let first_line = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);

    tracing::debug!(sheet = %sheet_name, height, width, "シートを読み込みました");

    Ok((
        headers,
        SheetRows {
            range,
            next: 1,
            height,
            width,
            first_line,
        },
    ))
}

impl SheetRows {
    /// 先頭 `limit` 行の値（読み位置は進めない）
    pub fn sample(&self, limit: usize) -> Vec<Vec<String>> {
        (1..self.height.min(limit + 1))
            .map(|r| {
                (0..self.width)
                    .map(|col| self.range.get((r, col)).map(|d| cell_value(d).render()).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    pub fn next_row(&mut self, headers: &[String]) -> Option<Result<RowRead>> {
        if self.next >= self.height {
            return None;
        }

        let r = self.next;
        self.next += 1;

        // 途中の空行も1行として返す（SKUが空なので Invalid になる）
        let mut row = RawRow::new(self.first_line + r);
        for (col, column) in headers.iter().enumerate().take(self.width) {
            let value = self.range.get((r, col)).map(cell_value).unwrap_or_default();
            row.cells.insert(column.clone(), value);
        }

        Some(Ok(Ok(row)))
    }
}

/// セル値の変換（エラーセルは空扱い）
fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::text(s.as_str()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::text(s.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_conversion() {
        assert_eq!(cell_value(&Data::Int(4012)).render(), "4012");
        assert_eq!(cell_value(&Data::Float(12.5)), CellValue::Number(12.5));
        assert_eq!(cell_value(&Data::String("  ".into())), CellValue::Empty);
        assert_eq!(cell_value(&Data::String("WH001".into())), CellValue::Text("WH001".into()));
        assert_eq!(cell_value(&Data::Bool(true)), CellValue::Text("TRUE".into()));
        assert_eq!(cell_value(&Data::Empty), CellValue::Empty);
    }
}
