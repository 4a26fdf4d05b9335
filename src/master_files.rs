//! マスタファイルの読み書き

use crate::error::{Result, SkuMapperError};
use sku_mapper_common::MasterTable;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// マスタディレクトリの既定値
pub const DEFAULT_MASTER_DIR: &str = "master";

const MASTER_EXTENSIONS: &[&str] = &["json", "csv"];

/// ディレクトリ直下のマスタファイル一覧（名前順）
pub fn list_master_files(dir: &Path) -> Vec<(String, PathBuf)> {
    if !dir.exists() {
        return Vec::new();
    }

    let mut masters: Vec<(String, PathBuf)> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| MASTER_EXTENSIONS.contains(&ext.to_string_lossy().to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .map(|e| {
            let name = e.file_name().to_string_lossy().to_string();
            (name, e.into_path())
        })
        .collect();

    masters.sort_by(|a, b| a.0.cmp(&b.0));
    masters
}

/// マスタを読み込む（エイリアス重複は警告ログ）
pub fn load_master(path: &Path) -> Result<MasterTable> {
    if !path.exists() {
        return Err(SkuMapperError::FileNotFound(path.display().to_string()));
    }

    let table = MasterTable::from_path(path)?;

    for conflict in table.conflicts() {
        tracing::warn!(
            alias = %conflict.alias,
            kept = %conflict.kept,
            rejected = %conflict.rejected,
            "エイリアスが重複しています（先に読み込んだMSKUを使用）"
        );
    }

    tracing::info!(
        path = %path.display(),
        masters = table.len(),
        "マスタを読み込みました"
    );

    Ok(table)
}

/// マスタを保存（拡張子 `.csv` はCSV、それ以外はJSON）
pub fn save_master(table: &MasterTable, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let is_csv = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        write_master_csv(table, path)?;
    } else {
        std::fs::write(path, table.to_json()?)?;
    }

    tracing::debug!(path = %path.display(), "マスタを保存しました");
    Ok(())
}

/// master_sku,alias,category 形式（エイリアスごとに1行）
fn write_master_csv(table: &MasterTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["master_sku", "alias", "category"])?;

    for entry in table.entries() {
        if entry.aliases.is_empty() {
            writer.write_record([entry.master_sku.as_str(), "", entry.category.as_str()])?;
        }
        for alias in &entry.aliases {
            writer.write_record([entry.master_sku.as_str(), alias.as_str(), entry.category.as_str()])?;
        }
    }

    writer.flush()?;
    Ok(())
}
