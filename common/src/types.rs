//! SKU変換の型定義
//!
//! 取り込みパイプラインとCLIで共有される型:
//! - RawRow: 入力ファイルの1行
//! - MappingResult: 1行ごとの変換結果
//! - BatchReport は report.rs を参照

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// セル値（文字列・数値・空）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl CellValue {
    /// 文字列セルを作成（空白のみは Empty）
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(n) => n.is_nan(),
        }
    }

    /// 表示用文字列
    ///
    /// 整数値の数値セルは `.0` を付けない（`1234.0` → `1234`）
    pub fn render(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => render_number(*n),
            CellValue::Empty => String::new(),
        }
    }
}

fn render_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// 入力ファイルの1行（列名 → セル値）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    /// 元ファイルの行番号（1始まり、ヘッダー行を含む）
    pub line: usize,
    pub cells: BTreeMap<String, CellValue>,
}

impl RawRow {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            cells: BTreeMap::new(),
        }
    }

    /// 列を追加（ビルダー形式）
    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.cells.insert(column.into(), value.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }
}

/// 行単位のエラー（バッチは中断せず Invalid として記録）
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{line}行目: {message}")]
pub struct RowError {
    pub line: usize,
    pub message: String,
    /// 読み取れた範囲のSKU（置換文字を含む場合あり）
    pub original_sku: String,
}

impl RowError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
            original_sku: String::new(),
        }
    }

    pub fn with_original_sku(mut self, original_sku: impl Into<String>) -> Self {
        self.original_sku = original_sku.into();
        self
    }
}

/// 変換ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MappingStatus {
    Matched,
    Unmatched,
    Invalid,
}

impl std::fmt::Display for MappingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingStatus::Matched => write!(f, "matched"),
            MappingStatus::Unmatched => write!(f, "unmatched"),
            MappingStatus::Invalid => write!(f, "invalid"),
        }
    }
}

/// どの索引で一致したか
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchSource {
    Alias,
    Canonical,
}

/// 1行の変換結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingResult {
    pub row: usize,

    pub original_sku: String,

    #[serde(default)]
    pub normalized_sku: String,

    #[serde(default)]
    pub matched_master_sku: Option<String>,

    pub status: MappingStatus,

    /// 0.0〜1.0
    pub confidence: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_via: Option<MatchSource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Invalidの理由
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl MappingResult {
    pub fn matched(
        row: usize,
        original_sku: String,
        normalized_sku: String,
        master_sku: String,
        via: MatchSource,
        category: Option<String>,
    ) -> Self {
        Self {
            row,
            original_sku,
            normalized_sku,
            matched_master_sku: Some(master_sku),
            status: MappingStatus::Matched,
            confidence: 1.0,
            matched_via: Some(via),
            category,
            reason: None,
        }
    }

    pub fn unmatched(row: usize, original_sku: String, normalized_sku: String) -> Self {
        Self {
            row,
            original_sku,
            normalized_sku,
            matched_master_sku: None,
            status: MappingStatus::Unmatched,
            confidence: 0.0,
            matched_via: None,
            category: None,
            reason: None,
        }
    }

    pub fn invalid(row: usize, original_sku: String, reason: impl Into<String>) -> Self {
        Self {
            row,
            original_sku,
            normalized_sku: String::new(),
            matched_master_sku: None,
            status: MappingStatus::Invalid,
            confidence: 0.0,
            matched_via: None,
            category: None,
            reason: Some(reason.into()),
        }
    }
}

impl From<&RowError> for MappingResult {
    fn from(err: &RowError) -> Self {
        MappingResult::invalid(err.line, err.original_sku.clone(), err.message.clone())
    }
}
