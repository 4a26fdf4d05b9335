//! SKU → マスタSKU 照合
//!
//! 1. SKUを正規化（`sku::normalize_sku`）
//! 2. エイリアス索引 → MSKU索引の順に完全一致で照合
//! 3. 空・不正なSKUは Invalid
//!
//! 編集距離などのあいまい照合は行わない。

use crate::master::MasterLookup;
use crate::sku::{read_sku_cell, SkuField};
use crate::types::{CellValue, MappingResult, MatchSource, RawRow, RowError};

/// マッピング方法（出力レコードの `mapping_method` 列）
pub const MAPPING_METHOD: &str = "exact_normalized";

/// SKU照合器（マスタは借用のみ）
pub struct SkuNormalizer<'a, L: MasterLookup + ?Sized> {
    lookup: &'a L,
}

impl<'a, L: MasterLookup + ?Sized> SkuNormalizer<'a, L> {
    pub fn new(lookup: &'a L) -> Self {
        Self { lookup }
    }

    /// 行のSKU列を照合
    pub fn map_row(&self, row: &RawRow, sku_column: &str) -> MappingResult {
        self.map_cell(row.line, row.get(sku_column))
    }

    /// セル値を照合
    pub fn map_cell(&self, line: usize, cell: Option<&CellValue>) -> MappingResult {
        match read_sku_cell(cell) {
            SkuField::Missing { original, reason } => MappingResult::invalid(line, original, reason),
            SkuField::Present {
                original,
                normalized,
            } => self.lookup_normalized(line, original, normalized),
        }
    }

    /// SKU文字列を照合
    pub fn map_sku(&self, line: usize, raw: &str) -> MappingResult {
        let cell = CellValue::text(raw);
        self.map_cell(line, Some(&cell))
    }

    /// 読み込みに失敗した行
    pub fn map_row_error(&self, err: &RowError) -> MappingResult {
        MappingResult::from(err)
    }

    fn lookup_normalized(&self, line: usize, original: String, normalized: String) -> MappingResult {
        let found = self
            .lookup
            .find_by_alias(&normalized)
            .map(|m| (m, MatchSource::Alias))
            .or_else(|| {
                self.lookup
                    .find_canonical(&normalized)
                    .map(|m| (m, MatchSource::Canonical))
            });

        match found {
            Some((master_sku, via)) => {
                let category = self.lookup.category_of(master_sku).map(str::to_string);
                MappingResult::matched(line, original, normalized, master_sku.to_string(), via, category)
            }
            None => MappingResult::unmatched(line, original, normalized),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::master::{MasterSkuEntry, MasterTable};
    use crate::types::MappingStatus;
    use std::collections::HashMap;

    /// エイリアスとMSKU索引を個別に持つ最小実装
    struct SplitLookup {
        aliases: HashMap<String, String>,
        canonical: HashMap<String, String>,
    }

    impl MasterLookup for SplitLookup {
        fn find_by_alias(&self, normalized: &str) -> Option<&str> {
            self.aliases.get(normalized).map(String::as_str)
        }

        fn find_canonical(&self, normalized: &str) -> Option<&str> {
            self.canonical.get(normalized).map(String::as_str)
        }
    }

    #[test]
    fn test_mixed_batch_statuses() {
        let lookup = SplitLookup {
            aliases: HashMap::from([("AB123".to_string(), "MSKU-1".to_string())]),
            canonical: HashMap::new(),
        };
        let normalizer = SkuNormalizer::new(&lookup);

        let statuses: Vec<MappingStatus> = ["ab-123", "AB123 ", "", "zz-999"]
            .iter()
            .enumerate()
            .map(|(i, sku)| normalizer.map_sku(i + 2, sku).status)
            .collect();

        assert_eq!(
            statuses,
            vec![
                MappingStatus::Matched,
                MappingStatus::Matched,
                MappingStatus::Invalid,
                MappingStatus::Unmatched
            ]
        );
    }

    #[test]
    fn test_alias_match_full_confidence() {
        let table = MasterTable::from_entries(vec![MasterSkuEntry::new(
            "WIRELESS_HEADPHONES",
            ["WH001", "HEADPHONE_BT"],
            "Electronics",
        )]);
        let normalizer = SkuNormalizer::new(&table);

        let result = normalizer.map_sku(2, " headphone-bt ");
        assert_eq!(result.status, MappingStatus::Matched);
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.matched_master_sku.as_deref(), Some("WIRELESS_HEADPHONES"));
        assert_eq!(result.matched_via, Some(MatchSource::Alias));
        assert_eq!(result.category.as_deref(), Some("Electronics"));
        assert_eq!(result.original_sku, " headphone-bt ");
        assert_eq!(result.normalized_sku, "HEADPHONEBT");
    }

    #[test]
    fn test_canonical_fallback() {
        let table = MasterTable::from_entries(vec![MasterSkuEntry::new(
            "COFFEE_MUG",
            ["CM002"],
            "",
        )]);
        let normalizer = SkuNormalizer::new(&table);

        let result = normalizer.map_sku(3, "coffee-mug");
        assert_eq!(result.status, MappingStatus::Matched);
        assert_eq!(result.matched_via, Some(MatchSource::Canonical));
        assert_eq!(result.category, None);
    }

    #[test]
    fn test_alias_takes_priority_over_canonical() {
        // "DESKLAMP" は COFFEE_MUG のエイリアスでもあり DESK_LAMP のMSKUでもある
        let table = MasterTable::from_entries(vec![
            MasterSkuEntry::new("DESK_LAMP", ["DL003"], ""),
            MasterSkuEntry::new("COFFEE_MUG", ["desk-lamp"], ""),
        ]);
        let normalizer = SkuNormalizer::new(&table);

        let result = normalizer.map_sku(2, "DESK LAMP");
        assert_eq!(result.matched_master_sku.as_deref(), Some("COFFEE_MUG"));
        assert_eq!(result.matched_via, Some(MatchSource::Alias));
    }

    #[test]
    fn test_empty_sku_invalid_regardless_of_master() {
        let table = MasterTable::from_entries(vec![MasterSkuEntry::new("X", ["", " "], "")]);
        let normalizer = SkuNormalizer::new(&table);

        for cell in [None, Some(CellValue::Empty), Some(CellValue::Text("  ".into()))] {
            let result = normalizer.map_cell(5, cell.as_ref());
            assert_eq!(result.status, MappingStatus::Invalid);
            assert_eq!(result.confidence, 0.0);
            assert!(result.reason.is_some());
        }
    }

    #[test]
    fn test_unmatched_zero_confidence() {
        let table = MasterTable::default();
        let result = SkuNormalizer::new(&table).map_sku(9, "zz-999");
        assert_eq!(result.status, MappingStatus::Unmatched);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.normalized_sku, "ZZ999");
        assert_eq!(result.matched_master_sku, None);
    }

    #[test]
    fn test_non_ascii_letters_are_not_dropped() {
        let table = MasterTable::from_entries(vec![
            MasterSkuEntry::new("PLAIN_BER", ["ber1"], ""),
            MasterSkuEntry::new("HALF_WIDTH", ["AB123"], ""),
        ]);
        let normalizer = SkuNormalizer::new(&table);

        // "Über-1" は "ber1" と別物
        let result = normalizer.map_sku(2, "Über-1");
        assert_eq!(result.status, MappingStatus::Unmatched);
        assert_eq!(result.normalized_sku, "ÜBER1");

        // 全角SKUは空扱いにならない
        let result = normalizer.map_sku(3, "ＡＢ１２３");
        assert_eq!(result.status, MappingStatus::Unmatched);
        assert_eq!(result.normalized_sku, "ＡＢ１２３");
    }

    #[test]
    fn test_map_row_uses_column() {
        let table = MasterTable::from_entries(vec![MasterSkuEntry::new("BLUE_JEANS", ["BJ004"], "")]);
        let row = RawRow::new(4).with("sku", "bj-004").with("qty", 2.0);

        let result = SkuNormalizer::new(&table).map_row(&row, "sku");
        assert_eq!(result.row, 4);
        assert_eq!(result.matched_master_sku.as_deref(), Some("BLUE_JEANS"));

        let missing = SkuNormalizer::new(&table).map_row(&row, "item_code");
        assert_eq!(missing.status, MappingStatus::Invalid);
    }
}
