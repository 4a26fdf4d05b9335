//! 入力ファイル読み込み
//!
//! CSV / スプレッドシートを1行ずつ `RawRow` として返す。
//! イテレータは遅延評価で、一度しか走査できない。
//!
//! - ファイル全体のエラー（読めない・壊れている） → `Err(SkuMapperError)`（バッチ中断）
//! - 行単位のエラー → `Ok(Err(RowError))`（Invalid として記録）

mod delimited;
mod sheet;

use crate::config::{Config, DEFAULT_MAX_FILE_SIZE};
use crate::error::{Result, SkuMapperError};
use sha2::{Digest, Sha256};
use sku_mapper_common::{
    columns::SKU_SAMPLE_SIZE, detect_sku_column, detect_sku_column_by_values, RawRow, RowError,
};
use std::fs::File;
use std::path::Path;

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// 入力形式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Spreadsheet,
}

impl InputFormat {
    /// 拡張子から判定
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(InputFormat::Csv),
            e if SPREADSHEET_EXTENSIONS.contains(&e) => Ok(InputFormat::Spreadsheet),
            _ => Err(SkuMapperError::Format(format!(
                "未対応のファイル形式です: {} (csv/xlsx/xls)",
                path.display()
            ))),
        }
    }
}

impl std::str::FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(InputFormat::Csv),
            "excel" | "xlsx" | "xls" | "spreadsheet" => Ok(InputFormat::Spreadsheet),
            _ => Err(format!("Unknown input format: {}. Use csv or excel", s)),
        }
    }
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFormat::Csv => write!(f, "csv"),
            InputFormat::Spreadsheet => write!(f, "spreadsheet"),
        }
    }
}

/// 読み込みオプション
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// SKU列を明示（指定時は自動検出しない）
    pub sku_column: Option<String>,
    /// 自動検出で優先するヘッダー名
    pub extra_sku_columns: Vec<String>,
    pub sheet: Option<String>,
    pub max_file_size: u64,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            sku_column: None,
            extra_sku_columns: Vec::new(),
            sheet: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl ReaderOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            sku_column: None,
            extra_sku_columns: config.sku_columns.clone(),
            sheet: config.sheet.clone(),
            max_file_size: config.max_file_size,
        }
    }
}

/// 1行の読み込み結果
pub type RowRead = std::result::Result<RawRow, RowError>;

enum RowSource {
    Delimited(delimited::DelimitedRows),
    Sheet(sheet::SheetRows),
}

impl RowSource {
    fn sample(&mut self, limit: usize) -> Vec<Vec<String>> {
        match self {
            RowSource::Delimited(rows) => rows.sample(limit),
            RowSource::Sheet(rows) => rows.sample(limit),
        }
    }
}

/// 行イテレータ
pub struct RowReader {
    format: InputFormat,
    headers: Vec<String>,
    sku_column: String,
    sku_index: usize,
    fingerprint: String,
    source: RowSource,
}

impl RowReader {
    pub fn format(&self) -> InputFormat {
        self.format
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn sku_column(&self) -> &str {
        &self.sku_column
    }

    /// 入力ファイルのSHA-256（バッチID）
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

impl Iterator for RowReader {
    type Item = Result<RowRead>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.source {
            RowSource::Delimited(rows) => rows.next_row(&self.headers, self.sku_index),
            RowSource::Sheet(rows) => rows.next_row(&self.headers),
        }
    }
}

/// ヘッダー確認用（SKU列が無くてもエラーにしない）
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    pub format: InputFormat,
    pub headers: Vec<String>,
    pub sku_column: Option<String>,
}

/// ファイルを開いてSKU列を決定する
pub fn open(path: &Path, format: Option<InputFormat>, options: &ReaderOptions) -> Result<RowReader> {
    let (format, headers, mut source) = open_source(path, format, options)?;

    let sku_index = resolve_sku_column(&headers, &mut source, options)
        .ok_or_else(|| missing_sku_column(&headers, options.sku_column.as_deref()))?;
    let sku_column = headers[sku_index].clone();

    let fingerprint = file_fingerprint(path)?;

    tracing::info!(
        path = %path.display(),
        %format,
        columns = headers.len(),
        sku_column = %sku_column,
        "入力ファイルを開きました"
    );

    Ok(RowReader {
        format,
        headers,
        sku_column,
        sku_index,
        fingerprint,
        source,
    })
}

/// ヘッダーと検出されるSKU列を返す
pub fn inspect(path: &Path, format: Option<InputFormat>, options: &ReaderOptions) -> Result<ColumnInfo> {
    let (format, headers, mut source) = open_source(path, format, options)?;
    let sku_column = resolve_sku_column(&headers, &mut source, options).map(|idx| headers[idx].clone());

    Ok(ColumnInfo {
        format,
        headers,
        sku_column,
    })
}

fn open_source(
    path: &Path,
    format: Option<InputFormat>,
    options: &ReaderOptions,
) -> Result<(InputFormat, Vec<String>, RowSource)> {
    if !path.exists() {
        return Err(SkuMapperError::FileNotFound(path.display().to_string()));
    }

    let format = match format {
        Some(f) => f,
        None => InputFormat::from_path(path)?,
    };

    let size = std::fs::metadata(path)?.len();
    if size > options.max_file_size {
        return Err(SkuMapperError::Format(format!(
            "ファイルサイズが上限を超えています: {} bytes (上限 {} bytes)",
            size, options.max_file_size
        )));
    }

    let (headers, source) = match format {
        InputFormat::Csv => {
            let (headers, rows) = delimited::open(path)?;
            (headers, RowSource::Delimited(rows))
        }
        InputFormat::Spreadsheet => {
            let (headers, rows) = sheet::open(path, options.sheet.as_deref())?;
            (headers, RowSource::Sheet(rows))
        }
    };

    Ok((format, headers, source))
}

/// SKU列を決定する
///
/// ヘッダー名で見つからず列の明示もない場合は、先頭行の値から推定する。
fn resolve_sku_column(headers: &[String], source: &mut RowSource, options: &ReaderOptions) -> Option<usize> {
    if let Some(idx) = detect_sku_column(
        headers,
        options.sku_column.as_deref(),
        &options.extra_sku_columns,
    ) {
        return Some(idx);
    }

    if options.sku_column.is_some() {
        return None;
    }

    let sample = source.sample(SKU_SAMPLE_SIZE);
    let idx = detect_sku_column_by_values(headers.len(), &sample)?;
    tracing::warn!(
        column = %headers[idx],
        "ヘッダー名からSKU列を特定できないため、値の内容から推定しました"
    );
    Some(idx)
}

fn missing_sku_column(headers: &[String], preferred: Option<&str>) -> SkuMapperError {
    let columns = headers.join(", ");
    match preferred {
        Some(name) => SkuMapperError::Schema(format!(
            "指定されたSKU列「{}」がありません (列: {})",
            name, columns
        )),
        None => SkuMapperError::Schema(format!("SKU列が見つかりません (列: {})", columns)),
    }
}

fn file_fingerprint(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
