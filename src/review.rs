//! 未照合SKUの対話式登録
//!
//! map が出力したレポートJSONから未照合SKUを取り出し、
//! 1件ずつMSKUを入力してマスタに追加する。

use crate::error::{Result, SkuMapperError};
use crate::export::ReportDocument;
use crate::master_files::{load_master, save_master};
use dialoguer::Input;
use sku_mapper_common::{classify_sku, normalize_sku, MappingResult, MappingStatus, MasterTable};
use std::collections::HashSet;
use std::path::Path;

/// 操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewAction {
    /// このSKUをMSKUに登録
    Assign(String),
    /// このSKUをスキップ
    Skip,
    /// 残り全部スキップ（入力済みの登録は保存する）
    SkipAll,
    /// 保存せずに終了
    Quit,
}

/// 未照合SKU（初出順、正規化後の値で重複除去）
pub fn collect_unmatched_skus(results: &[MappingResult]) -> Vec<String> {
    let mut seen = HashSet::new();
    results
        .iter()
        .filter(|r| r.status == MappingStatus::Unmatched)
        .filter(|r| seen.insert(normalize_sku(&r.original_sku)))
        .map(|r| r.original_sku.trim().to_string())
        .collect()
}

/// 入力文字列を操作に変換
pub fn parse_action(input: &str) -> ReviewAction {
    match input.trim() {
        "" | "s" => ReviewAction::Skip,
        "S" => ReviewAction::SkipAll,
        "q" | "Q" => ReviewAction::Quit,
        msku => ReviewAction::Assign(msku.to_string()),
    }
}

/// (SKU, MSKU) の組をマスタに追加し、追加件数を返す
pub fn apply_assignments(table: &mut MasterTable, assignments: &[(String, String)]) -> Result<usize> {
    for (sku, msku) in assignments {
        table.add_aliases(msku, vec![sku.clone()], None)?;
    }
    Ok(assignments.len())
}

/// 対話式で未照合SKUを登録
pub fn run_interactive_review(report_path: &Path, master_path: &Path) -> Result<()> {
    let document = ReportDocument::load(report_path)?;
    let unmatched = collect_unmatched_skus(&document.results);

    if unmatched.is_empty() {
        println!("✓ 未照合のSKUはありません");
        return Ok(());
    }

    let mut table = if master_path.exists() {
        load_master(master_path)?
    } else {
        println!("⚠ マスタが存在しないため新規作成します: {}", master_path.display());
        MasterTable::default()
    };

    let candidates: Vec<String> = table
        .entries()
        .iter()
        .take(10)
        .map(|e| e.master_sku.clone())
        .collect();

    println!("🔎 未照合のSKU: {}件", unmatched.len());
    println!("---");
    println!("操作: MSKUを入力 [s/Enter]スキップ [S]残り全スキップ [q]保存せず終了");
    if !candidates.is_empty() {
        println!("既存MSKU: {}", candidates.join(", "));
    }
    println!("---\n");

    let assignments = match review_loop(&unmatched, prompt_action)? {
        Some(assignments) => assignments,
        None => {
            println!("保存せずに終了します");
            return Ok(());
        }
    };

    if assignments.is_empty() {
        println!("登録はありません");
        return Ok(());
    }

    let added = apply_assignments(&mut table, &assignments)?;
    save_master(&table, master_path)?;

    println!("\n✓ {}件を登録しました: {}", added, master_path.display());

    Ok(())
}

/// 未照合SKUを1件ずつ確認する
///
/// 登録する (SKU, MSKU) の組を返す。`Quit` の場合は `None`。
pub fn review_loop<F>(unmatched: &[String], mut prompt: F) -> Result<Option<Vec<(String, String)>>>
where
    F: FnMut() -> Result<ReviewAction>,
{
    let mut assignments = Vec::new();

    for (count, sku) in unmatched.iter().enumerate() {
        let hint = classify_sku(sku)
            .map(|p| format!(" [{}]", p))
            .unwrap_or_default();
        println!("[{}/{}] {}{}", count + 1, unmatched.len(), sku, hint);

        match prompt()? {
            ReviewAction::Assign(msku) => {
                println!("  → {}\n", msku);
                assignments.push((sku.clone(), msku));
            }
            ReviewAction::Skip => {
                println!("  → スキップ\n");
            }
            ReviewAction::SkipAll => {
                println!("  → 残り全部スキップ\n");
                break;
            }
            ReviewAction::Quit => return Ok(None),
        }
    }

    Ok(Some(assignments))
}

fn prompt_action() -> Result<ReviewAction> {
    let input: String = Input::new()
        .with_prompt("MSKU (s:スキップ S:全スキップ q:保存せず終了)")
        .allow_empty(true)
        .interact_text()
        .map_err(|e| SkuMapperError::Prompt(e.to_string()))?;

    Ok(parse_action(&input))
}
