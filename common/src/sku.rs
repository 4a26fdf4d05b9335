//! SKU文字列の正規化
//!
//! 前後空白を除去し、大文字化し、英数字以外の区切り文字を取り除く。
//! 出力は英字（大文字化済み）と数字のみなので、正規化は冪等。
//! ASCII以外の英字・数字（`Ü`、全角の `ＡＢ１２３` など）は残す。

use crate::types::CellValue;
use regex::Regex;

/// SKUを正規化する
///
/// `"ab-123"` と `"AB123 "` はどちらも `"AB123"` になる。
pub fn normalize_sku(raw: &str) -> String {
    lazy_static::lazy_static! {
        static ref SEPARATORS: Regex = Regex::new(r"[^\p{Alphabetic}\p{Nd}]").unwrap();
    }

    let upper = raw.trim().to_uppercase();
    SEPARATORS.replace_all(&upper, "").into_owned()
}

/// SKUセルの解釈結果
#[derive(Debug, Clone, PartialEq)]
pub enum SkuField {
    /// 正規化後も空でないSKU
    Present { original: String, normalized: String },
    /// 空・欠損・区切り文字のみ
    Missing { original: String, reason: &'static str },
}

/// セル値からSKUを取り出して正規化する
pub fn read_sku_cell(cell: Option<&CellValue>) -> SkuField {
    let cell = match cell {
        Some(c) => c,
        None => {
            return SkuField::Missing {
                original: String::new(),
                reason: "SKU列がありません",
            }
        }
    };

    if cell.is_empty() {
        return SkuField::Missing {
            original: cell.render(),
            reason: "SKUが空です",
        };
    }

    let original = cell.render();
    let normalized = normalize_sku(&original);
    if normalized.is_empty() {
        return SkuField::Missing {
            original,
            reason: "SKUに英数字が含まれていません",
        };
    }

    SkuField::Present {
        original,
        normalized,
    }
}
