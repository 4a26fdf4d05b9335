//! 変換結果の出力
//!
//! - `processed_<入力名>.csv` / `.xlsx` : 元の列 + MSKU, mapping_status, processed_at, mapping_method
//! - `report_<入力名>.json` : BatchReport と行ごとの MappingResult（review で再利用）

pub mod delimited;
pub mod excel;

use crate::cli::ExportFormat;
use crate::error::Result;
use crate::pipeline::BatchOutcome;
use serde::{Deserialize, Serialize};
use sku_mapper_common::{BatchReport, MappingResult};
use std::path::{Path, PathBuf};

/// 元の列の後ろに付加する列
pub const APPENDED_COLUMNS: [&str; 4] = ["MSKU", "mapping_status", "processed_at", "mapping_method"];

/// レポートJSON
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub source: String,
    /// 入力ファイルのSHA-256
    pub fingerprint: String,
    pub sku_column: String,
    pub processed_at: String,
    pub report: BatchReport,
    pub results: Vec<MappingResult>,
}

impl ReportDocument {
    pub fn from_outcome(outcome: &BatchOutcome) -> Self {
        Self {
            source: outcome.source.display().to_string(),
            fingerprint: outcome.fingerprint.clone(),
            sku_column: outcome.sku_column.clone(),
            processed_at: outcome.processed_at.clone(),
            report: outcome.report.clone(),
            results: outcome.results.clone(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// 出力したファイル
#[derive(Debug, Clone)]
pub struct ExportedFiles {
    pub records: Vec<PathBuf>,
    pub report: PathBuf,
}

/// 出力列（元の列と同名の付加列は付加列で置き換える）
pub fn output_columns(headers: &[String]) -> Vec<String> {
    headers
        .iter()
        .filter(|h| !APPENDED_COLUMNS.contains(&h.as_str()))
        .cloned()
        .chain(APPENDED_COLUMNS.iter().map(|c| c.to_string()))
        .collect()
}

pub fn export_outcome(
    outcome: &BatchOutcome,
    format: &ExportFormat,
    output_dir: &Path,
) -> Result<ExportedFiles> {
    std::fs::create_dir_all(output_dir)?;

    let stem = outcome.source_stem();
    let columns = output_columns(&outcome.headers);
    let mut records = Vec::new();

    if matches!(format, ExportFormat::Csv | ExportFormat::Both) {
        let path = output_dir.join(format!("processed_{}.csv", stem));
        println!("- CSVを生成中...");
        delimited::write_records(&outcome.records, &columns, &path)?;
        println!("✔ CSV出力: {}", path.display());
        records.push(path);
    }

    if matches!(format, ExportFormat::Excel | ExportFormat::Both) {
        let path = output_dir.join(format!("processed_{}.xlsx", stem));
        println!("- Excelを生成中...");
        excel::write_workbook(&outcome.records, &columns, &outcome.report, &path)?;
        println!("✔ Excel出力: {}", path.display());
        records.push(path);
    }

    let report = output_dir.join(format!("report_{}.json", stem));
    ReportDocument::from_outcome(outcome).save(&report)?;
    println!("✔ レポート出力: {}", report.display());

    tracing::debug!(files = records.len() + 1, dir = %output_dir.display(), "出力完了");

    Ok(ExportedFiles { records, report })
}
