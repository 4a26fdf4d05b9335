//! バッチ集計
//!
//! MappingResult の列を集計して BatchReport を作る。副作用なし。
//! `matched + unmatched + invalid == total_rows` が常に成り立つ。

use crate::pattern::classify_sku;
use crate::types::{MappingResult, MappingStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const TOP_MASTER_LIMIT: usize = 10;

/// MSKUごとの件数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterSkuCount {
    pub master_sku: String,
    pub count: usize,
}

/// バッチ集計結果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub total_rows: usize,
    pub matched_count: usize,
    pub unmatched_count: usize,
    pub invalid_count: usize,

    /// 照合成功率（%）
    #[serde(default)]
    pub success_rate: f64,

    /// 件数上位のMSKU（最大10件）
    #[serde(default)]
    pub top_master_skus: Vec<MasterSkuCount>,

    /// カテゴリ → 照合件数
    #[serde(default)]
    pub category_counts: BTreeMap<String, usize>,

    /// パターン分類 → 未照合SKU（初出順、重複なし）
    #[serde(default)]
    pub unmatched_groups: BTreeMap<String, Vec<String>>,
}

impl BatchReport {
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a MappingResult>) -> Self {
        let mut reporter = MappingReporter::new();
        for result in results {
            reporter.record(result);
        }
        reporter.finish()
    }

    /// 件数の整合性
    pub fn is_consistent(&self) -> bool {
        self.matched_count + self.unmatched_count + self.invalid_count == self.total_rows
    }
}

/// 逐次集計器
#[derive(Debug, Default)]
pub struct MappingReporter {
    total_rows: usize,
    matched_count: usize,
    unmatched_count: usize,
    invalid_count: usize,
    master_counts: HashMap<String, usize>,
    category_counts: BTreeMap<String, usize>,
    unmatched_groups: BTreeMap<String, Vec<String>>,
}

impl MappingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &MappingResult) {
        self.total_rows += 1;

        match result.status {
            MappingStatus::Matched => {
                self.matched_count += 1;
                if let Some(master_sku) = &result.matched_master_sku {
                    *self.master_counts.entry(master_sku.clone()).or_insert(0) += 1;
                }
                if let Some(category) = result.category.as_deref().filter(|c| !c.is_empty()) {
                    *self.category_counts.entry(category.to_string()).or_insert(0) += 1;
                }
            }
            MappingStatus::Unmatched => {
                self.unmatched_count += 1;
                let sku = result.original_sku.trim();
                if let Some(pattern) = classify_sku(sku) {
                    let group = self.unmatched_groups.entry(pattern.to_string()).or_default();
                    if !group.iter().any(|s| s == sku) {
                        group.push(sku.to_string());
                    }
                }
            }
            MappingStatus::Invalid => {
                self.invalid_count += 1;
            }
        }
    }

    pub fn finish(self) -> BatchReport {
        let success_rate = if self.total_rows > 0 {
            self.matched_count as f64 / self.total_rows as f64 * 100.0
        } else {
            0.0
        };

        let mut top: Vec<MasterSkuCount> = self
            .master_counts
            .into_iter()
            .map(|(master_sku, count)| MasterSkuCount { master_sku, count })
            .collect();
        top.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.master_sku.cmp(&b.master_sku)));
        top.truncate(TOP_MASTER_LIMIT);

        BatchReport {
            total_rows: self.total_rows,
            matched_count: self.matched_count,
            unmatched_count: self.unmatched_count,
            invalid_count: self.invalid_count,
            success_rate,
            top_master_skus: top,
            category_counts: self.category_counts,
            unmatched_groups: self.unmatched_groups,
        }
    }
}
