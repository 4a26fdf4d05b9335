//! 変換パイプライン
//!
//! 入力ファイル → RawRow → MappingResult → BatchReport を1パスで処理する。
//! ファイル全体のエラーが起きた場合は途中結果を返さない。

use crate::error::Result;
use crate::reader::{self, InputFormat, ReaderOptions};
use chrono::Local;
use serde::{Deserialize, Serialize};
use sku_mapper_common::{
    BatchReport, CellValue, MappingReporter, MappingResult, MappingStatus, MasterLookup, RawRow,
    SkuNormalizer, MAPPING_METHOD,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// 入力形式（省略時は拡張子から判定）
    pub format: Option<InputFormat>,
    pub reader: ReaderOptions,
}

/// 出力用の1行（元の列 + 付加列）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    pub row: usize,
    pub cells: BTreeMap<String, CellValue>,
    pub master_sku: Option<String>,
    pub status: MappingStatus,
    pub processed_at: String,
    pub mapping_method: String,
}

impl NormalizedRecord {
    fn new(cells: BTreeMap<String, CellValue>, result: &MappingResult, processed_at: &str) -> Self {
        Self {
            row: result.row,
            cells,
            master_sku: result.matched_master_sku.clone(),
            status: result.status,
            processed_at: processed_at.to_string(),
            mapping_method: MAPPING_METHOD.to_string(),
        }
    }

    /// 出力列の値
    pub fn value(&self, column: &str) -> CellValue {
        match column {
            "MSKU" => self
                .master_sku
                .clone()
                .map(CellValue::Text)
                .unwrap_or_default(),
            "mapping_status" => CellValue::Text(self.status.to_string()),
            "processed_at" => CellValue::Text(self.processed_at.clone()),
            "mapping_method" => CellValue::Text(self.mapping_method.clone()),
            other => self.cells.get(other).cloned().unwrap_or_default(),
        }
    }
}

/// 1バッチの処理結果
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub source: PathBuf,
    /// 入力ファイルのSHA-256
    pub fingerprint: String,
    pub format: InputFormat,
    pub headers: Vec<String>,
    pub sku_column: String,
    pub processed_at: String,
    pub results: Vec<MappingResult>,
    pub records: Vec<NormalizedRecord>,
    pub report: BatchReport,
}

impl BatchOutcome {
    /// 入力ファイル名（拡張子なし）
    pub fn source_stem(&self) -> String {
        self.source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "input".to_string())
    }
}

/// 1ファイルを変換する
pub fn run_batch<L: MasterLookup + ?Sized>(
    path: &Path,
    lookup: &L,
    options: &BatchOptions,
) -> Result<BatchOutcome> {
    let reader = reader::open(path, options.format, &options.reader)?;

    let format = reader.format();
    let headers = reader.headers().to_vec();
    let sku_column = reader.sku_column().to_string();
    let fingerprint = reader.fingerprint().to_string();
    let processed_at = Local::now().to_rfc3339();

    tracing::debug!(batch = %fingerprint, "バッチ開始");

    let normalizer = SkuNormalizer::new(lookup);
    let mut reporter = MappingReporter::new();
    let mut results = Vec::new();
    let mut records = Vec::new();

    for item in reader {
        let (result, cells) = match item? {
            Ok(row) => {
                let result = normalizer.map_row(&row, &sku_column);
                let RawRow { cells, .. } = row;
                (result, cells)
            }
            Err(row_error) => {
                tracing::warn!(line = row_error.line, "{}", row_error.message);
                (normalizer.map_row_error(&row_error), BTreeMap::new())
            }
        };

        if result.status == MappingStatus::Invalid {
            tracing::debug!(
                line = result.row,
                reason = result.reason.as_deref().unwrap_or(""),
                "無効なSKU"
            );
        }

        reporter.record(&result);
        records.push(NormalizedRecord::new(cells, &result, &processed_at));
        results.push(result);
    }

    let report = reporter.finish();

    tracing::info!(
        batch = %fingerprint,
        total = report.total_rows,
        matched = report.matched_count,
        unmatched = report.unmatched_count,
        invalid = report.invalid_count,
        "バッチ完了"
    );

    Ok(BatchOutcome {
        source: path.to_path_buf(),
        fingerprint,
        format,
        headers,
        sku_column,
        processed_at,
        results,
        records,
        report,
    })
}
