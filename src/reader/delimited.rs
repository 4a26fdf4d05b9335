//! CSV読み込み（1レコードずつストリーム処理）

use super::RowRead;
use crate::error::{Result, SkuMapperError};
use sku_mapper_common::{unique_headers, CellValue, RawRow, RowError};
use std::collections::VecDeque;
use std::fs::File;
use std::path::Path;

pub struct DelimitedRows {
    records: csv::ByteRecordsIntoIter<File>,
    /// SKU列の推定で先読みしたレコード
    peeked: VecDeque<csv::Result<csv::ByteRecord>>,
    /// 直前に返した行の行番号
    line: usize,
}

/// CSVを開いてヘッダー行を読む
pub fn open(path: &Path) -> Result<(Vec<String>, DelimitedRows)> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| SkuMapperError::Format(format!("{}: {}", path.display(), e)))?;

    let raw = reader
        .byte_headers()
        .map_err(|e| SkuMapperError::Format(format!("ヘッダー行を読めません: {}", e)))?
        .clone();

    if raw.is_empty() {
        return Err(SkuMapperError::Format(format!(
            "ヘッダー行がありません: {}",
            path.display()
        )));
    }

    let names = raw
        .iter()
        .map(|field| std::str::from_utf8(field).map(str::to_string))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| SkuMapperError::Format("ヘッダー行がUTF-8ではありません".into()))?;

    Ok((
        unique_headers(names),
        DelimitedRows {
            records: reader.into_byte_records(),
            peeked: VecDeque::new(),
            line: 1,
        },
    ))
}

impl DelimitedRows {
    /// 先頭 `limit` 行の値（UTF-8でない部分は置換文字）
    ///
    /// 読んだレコードは保持し、`next_row` で先頭から返す。
    pub fn sample(&mut self, limit: usize) -> Vec<Vec<String>> {
        while self.peeked.len() < limit {
            match self.records.next() {
                Some(record) => {
                    let failed = record.is_err();
                    self.peeked.push_back(record);
                    if failed {
                        break;
                    }
                }
                None => break,
            }
        }

        self.peeked
            .iter()
            .filter_map(|record| record.as_ref().ok())
            .map(|record| {
                record
                    .iter()
                    .map(|field| String::from_utf8_lossy(field).into_owned())
                    .collect()
            })
            .collect()
    }

    /// 次の行を読む
    ///
    /// UTF-8として読めない値は置換文字で読み込む。SKU列の値だけは
    /// 照合できないので `RowError` にする。
    pub fn next_row(&mut self, headers: &[String], sku_index: usize) -> Option<Result<RowRead>> {
        let next = match self.peeked.pop_front() {
            Some(record) => Some(record),
            None => self.records.next(),
        };

        let record = match next? {
            Ok(record) => record,
            Err(e) => {
                self.line += 1;
                return Some(match e.kind() {
                    csv::ErrorKind::Io(_) => Err(SkuMapperError::Format(format!(
                        "{}行目付近で読み込みが中断しました: {}",
                        self.line, e
                    ))),
                    _ => Ok(Err(RowError::new(self.line, e.to_string()))),
                });
            }
        };

        self.line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(self.line + 1);

        if record.len() > headers.len() {
            tracing::debug!(
                line = self.line,
                fields = record.len(),
                "ヘッダーより多い列は無視します"
            );
        }

        let mut row = RawRow::new(self.line);
        let mut undecodable_sku = None;

        for (idx, column) in headers.iter().enumerate() {
            let value = match record.get(idx) {
                Some(field) => match std::str::from_utf8(field) {
                    Ok(text) => CellValue::text(text),
                    Err(_) => {
                        let lossy = String::from_utf8_lossy(field).into_owned();
                        if idx == sku_index {
                            undecodable_sku = Some(lossy.clone());
                        } else {
                            tracing::debug!(line = self.line, column = %column, "UTF-8ではない値を置換文字で読み込みました");
                        }
                        CellValue::text(lossy)
                    }
                },
                None => CellValue::Empty,
            };
            row.cells.insert(column.clone(), value);
        }

        if let Some(original) = undecodable_sku {
            return Some(Ok(Err(RowError::new(
                self.line,
                format!("SKU列「{}」がUTF-8ではありません", headers[sku_index]),
            )
            .with_original_sku(original))));
        }

        Some(Ok(Ok(row)))
    }
}
