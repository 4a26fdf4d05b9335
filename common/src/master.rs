//! マスタSKUテーブル
//!
//! マスタSKU（MSKU）とそのエイリアス（出品者ごとのSKU）を管理する。
//! JSON（`{"MSKU": ["sku", ...]}` 形式またはエントリ配列）とCSVから読み込める。
//! 照合は正規化済み文字列の完全一致のみ。

use crate::error::{Error, Result};
use crate::sku::normalize_sku;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

/// マスタ照合のインターフェース
///
/// 引数はすべて `normalize_sku` 済みの文字列。
pub trait MasterLookup {
    /// エイリアス索引からMSKUを引く
    fn find_by_alias(&self, normalized: &str) -> Option<&str>;

    /// MSKU自体の索引からMSKUを引く
    fn find_canonical(&self, normalized: &str) -> Option<&str>;

    /// MSKUのカテゴリ
    fn category_of(&self, _master_sku: &str) -> Option<&str> {
        None
    }
}

/// マスタの1エントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterSkuEntry {
    pub master_sku: String,
    #[serde(default)]
    pub aliases: BTreeSet<String>,
    #[serde(default)]
    pub category: String,
}

impl MasterSkuEntry {
    pub fn new<I, S>(master_sku: impl Into<String>, aliases: I, category: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            master_sku: master_sku.into(),
            aliases: aliases.into_iter().map(Into::into).collect(),
            category: category.into(),
        }
    }
}

/// 同じ正規化キーを複数のMSKUが主張した場合の記録（先に読み込んだ方が有効）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasConflict {
    pub alias: String,
    pub normalized: String,
    pub kept: String,
    pub rejected: String,
}

/// マスタテーブル（バッチ中は読み取り専用）
#[derive(Debug, Clone, Default)]
pub struct MasterTable {
    entries: Vec<MasterSkuEntry>,
    /// MSKU → entries のインデックス
    positions: HashMap<String, usize>,
    /// 正規化エイリアス → entries のインデックス
    alias_index: HashMap<String, usize>,
    /// 正規化MSKU → entries のインデックス
    canonical_index: HashMap<String, usize>,
    conflicts: Vec<AliasConflict>,
}

/// CSVマスタの1行
#[derive(Debug, Deserialize)]
struct MasterCsvRow {
    #[serde(alias = "msku", alias = "MSKU")]
    master_sku: String,
    #[serde(default, alias = "sku", alias = "SKU")]
    alias: String,
    #[serde(default)]
    category: String,
}

impl MasterTable {
    /// エントリから構築（同じMSKUのエントリは統合）
    pub fn from_entries(entries: Vec<MasterSkuEntry>) -> Self {
        let mut table = Self::default();

        for entry in entries {
            let master_sku = entry.master_sku.trim().to_string();
            if master_sku.is_empty() {
                continue;
            }
            let aliases = entry
                .aliases
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty());

            match table.positions.get(&master_sku) {
                Some(&idx) => {
                    let existing = &mut table.entries[idx];
                    existing.aliases.extend(aliases);
                    if existing.category.is_empty() {
                        existing.category = entry.category;
                    }
                }
                None => {
                    table.positions.insert(master_sku.clone(), table.entries.len());
                    table.entries.push(MasterSkuEntry {
                        master_sku,
                        aliases: aliases.collect(),
                        category: entry.category,
                    });
                }
            }
        }

        table.rebuild_index();
        table
    }

    /// JSON文字列から読み込み
    ///
    /// 対応形式:
    /// - `{"WIRELESS_HEADPHONES": ["WH001", "HEADPHONE_BT"]}`
    /// - `[{"masterSku": "...", "aliases": [...], "category": "..."}]`
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;

        let entries = match value {
            serde_json::Value::Object(map) => {
                let mut entries = Vec::with_capacity(map.len());
                for (master_sku, skus) in map {
                    let aliases: Vec<String> = serde_json::from_value(skus).map_err(|e| {
                        Error::InvalidMaster(format!("{} のSKU一覧が不正: {}", master_sku, e))
                    })?;
                    entries.push(MasterSkuEntry::new(master_sku, aliases, ""));
                }
                entries
            }
            serde_json::Value::Array(_) => serde_json::from_value::<Vec<MasterSkuEntry>>(value)?,
            _ => {
                return Err(Error::InvalidMaster(
                    "マスタJSONはオブジェクトか配列である必要があります".into(),
                ))
            }
        };

        Ok(Self::from_entries(entries))
    }

    /// CSV文字列から読み込み（`master_sku,alias,category`、1行1エイリアス）
    pub fn from_csv_str(content: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut entries = Vec::new();
        for (idx, record) in reader.deserialize::<MasterCsvRow>().enumerate() {
            let row = record?;
            if row.master_sku.is_empty() {
                // ヘッダー行が1行目なのでデータは2行目から
                return Err(Error::InvalidMaster(format!("{}行目: MSKUが空です", idx + 2)));
            }
            let aliases = if row.alias.is_empty() {
                Vec::new()
            } else {
                vec![row.alias]
            };
            entries.push(MasterSkuEntry::new(row.master_sku, aliases, row.category));
        }

        Ok(Self::from_entries(entries))
    }

    /// ファイルから読み込み（拡張子 `.csv` はCSV、それ以外はJSON）
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_csv = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        if is_csv {
            Self::from_csv_str(&content)
        } else {
            Self::from_json(&content)
        }
    }

    /// エントリ配列形式のJSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    /// MSKUにエイリアスを追加（MSKUが無ければ新規作成）
    pub fn add_aliases<I>(&mut self, master_sku: &str, aliases: I, category: Option<&str>) -> Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        let master_sku = master_sku.trim();
        if master_sku.is_empty() {
            return Err(Error::InvalidMaster("MSKUが空です".into()));
        }

        let idx = match self.positions.get(master_sku) {
            Some(&idx) => idx,
            None => {
                self.entries.push(MasterSkuEntry::new(master_sku, Vec::<String>::new(), ""));
                let idx = self.entries.len() - 1;
                self.positions.insert(master_sku.to_string(), idx);
                idx
            }
        };

        let entry = &mut self.entries[idx];
        entry.aliases.extend(
            aliases
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty()),
        );
        if let Some(category) = category {
            entry.category = category.to_string();
        }

        self.rebuild_index();
        Ok(())
    }

    fn rebuild_index(&mut self) {
        self.alias_index.clear();
        self.canonical_index.clear();
        self.conflicts.clear();

        for (idx, entry) in self.entries.iter().enumerate() {
            let canonical = normalize_sku(&entry.master_sku);
            if !canonical.is_empty() {
                match self.canonical_index.get(&canonical) {
                    Some(&kept) if kept != idx => self.conflicts.push(AliasConflict {
                        alias: entry.master_sku.clone(),
                        normalized: canonical,
                        kept: self.entries[kept].master_sku.clone(),
                        rejected: entry.master_sku.clone(),
                    }),
                    Some(_) => {}
                    None => {
                        self.canonical_index.insert(canonical, idx);
                    }
                }
            }

            for alias in &entry.aliases {
                let normalized = normalize_sku(alias);
                if normalized.is_empty() {
                    continue;
                }
                match self.alias_index.get(&normalized) {
                    Some(&kept) if kept != idx => self.conflicts.push(AliasConflict {
                        alias: alias.clone(),
                        normalized,
                        kept: self.entries[kept].master_sku.clone(),
                        rejected: entry.master_sku.clone(),
                    }),
                    Some(_) => {}
                    None => {
                        self.alias_index.insert(normalized, idx);
                    }
                }
            }
        }
    }

    pub fn entries(&self) -> &[MasterSkuEntry] {
        &self.entries
    }

    pub fn get(&self, master_sku: &str) -> Option<&MasterSkuEntry> {
        self.positions.get(master_sku).map(|&idx| &self.entries[idx])
    }

    /// 索引構築時に検出した衝突
    pub fn conflicts(&self) -> &[AliasConflict] {
        &self.conflicts
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// マスタの概要
    pub fn summary(&self) -> MasterSummary {
        let mut categories: BTreeMap<String, usize> = BTreeMap::new();
        let mut details = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            if !entry.category.is_empty() {
                *categories.entry(entry.category.clone()).or_insert(0) += 1;
            }
            details.push(MasterDetail {
                master_sku: entry.master_sku.clone(),
                category: entry.category.clone(),
                alias_count: entry.aliases.len(),
                sample_aliases: entry.aliases.iter().take(3).cloned().collect(),
            });
        }

        MasterSummary {
            master_count: self.entries.len(),
            alias_count: self.entries.iter().map(|e| e.aliases.len()).sum(),
            conflict_count: self.conflicts.len(),
            categories,
            details,
        }
    }
}

impl MasterLookup for MasterTable {
    fn find_by_alias(&self, normalized: &str) -> Option<&str> {
        self.alias_index
            .get(normalized)
            .map(|&idx| self.entries[idx].master_sku.as_str())
    }

    fn find_canonical(&self, normalized: &str) -> Option<&str> {
        self.canonical_index
            .get(normalized)
            .map(|&idx| self.entries[idx].master_sku.as_str())
    }

    fn category_of(&self, master_sku: &str) -> Option<&str> {
        self.get(master_sku)
            .map(|e| e.category.as_str())
            .filter(|c| !c.is_empty())
    }
}

/// マスタ概要
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterSummary {
    pub master_count: usize,
    pub alias_count: usize,
    pub conflict_count: usize,
    /// カテゴリ → MSKU数
    pub categories: BTreeMap<String, usize>,
    pub details: Vec<MasterDetail>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterDetail {
    pub master_sku: String,
    pub category: String,
    pub alias_count: usize,
    /// 最大3件
    pub sample_aliases: Vec<String>,
}
