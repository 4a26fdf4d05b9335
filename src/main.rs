use clap::Parser;
use sku_mapper::{cli, config, error, export, master_files, pipeline, reader, review};
use cli::{Cli, Commands, MasterAction};
use config::Config;
use error::Result;
use sku_mapper_common::{BatchReport, MasterLookup};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::Map { input, master, output, format, sku_column, input_format, sheet, dry_run } => {
            println!("📦 sku-mapper - SKU変換\n");

            // 1. マスタ読み込み
            println!("[1/3] マスタを読み込み中...");
            let master_path = config.resolve_master(master)?;
            let table = master_files::load_master(&master_path)?;
            let summary = table.summary();
            println!(
                "✔ {}件のMSKU / {}件のエイリアス\n",
                summary.master_count, summary.alias_count
            );
            if summary.conflict_count > 0 {
                println!("⚠ 重複エイリアス {}件（先に読み込んだMSKUを使用）\n", summary.conflict_count);
            }

            // 2. 変換
            println!("[2/3] 変換中...");
            let mut reader_options = reader::ReaderOptions::from_config(&config);
            reader_options.sku_column = sku_column;
            if sheet.is_some() {
                reader_options.sheet = sheet;
            }
            let options = pipeline::BatchOptions {
                format: input_format,
                reader: reader_options,
            };
            let outcome = pipeline::run_batch(&input, &table, &options)?;
            println!(
                "✔ {}行を処理 (SKU列: {})\n",
                outcome.report.total_rows, outcome.sku_column
            );

            // 3. 出力
            if dry_run {
                println!("[3/3] 出力をスキップ (--dry-run)");
            } else {
                println!("[3/3] 結果を保存中...");
                let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
                export::export_outcome(&outcome, &format, &output_dir)?;
            }

            print_report(&outcome.report);
            println!("\n✅ 変換完了");
        }

        Commands::Master { action } => match action {
            MasterAction::Show { master } => {
                let master_path = config.resolve_master(master)?;
                let table = master_files::load_master(&master_path)?;
                let summary = table.summary();

                println!("📋 マスタ: {}", master_path.display());
                println!("  MSKU: {}件", summary.master_count);
                println!("  エイリアス: {}件", summary.alias_count);
                if summary.conflict_count > 0 {
                    println!("  重複エイリアス: {}件", summary.conflict_count);
                    for conflict in table.conflicts() {
                        println!(
                            "    {} → {} (無視: {})",
                            conflict.alias, conflict.kept, conflict.rejected
                        );
                    }
                }
                if !summary.categories.is_empty() {
                    println!("  カテゴリ:");
                    for (category, count) in &summary.categories {
                        println!("    {}: {}件", category, count);
                    }
                }
                println!();
                for detail in &summary.details {
                    println!(
                        "  {} ({}件) {}",
                        detail.master_sku,
                        detail.alias_count,
                        detail.sample_aliases.join(", ")
                    );
                }
            }

            MasterAction::Add { msku, skus, category, master } => {
                let master_path = config.resolve_master(master)?;
                let mut table = if master_path.exists() {
                    master_files::load_master(&master_path)?
                } else {
                    Default::default()
                };

                table.add_aliases(&msku, skus.clone(), category.as_deref())?;

                for sku in &skus {
                    let normalized = sku_mapper_common::normalize_sku(sku);
                    match table.find_by_alias(&normalized) {
                        Some(owner) if owner != msku.trim() => {
                            println!("⚠ {} は既に {} に登録されています", sku, owner);
                        }
                        _ => {}
                    }
                }

                master_files::save_master(&table, &master_path)?;
                println!("✔ {} に{}件のSKUを追加しました: {}", msku, skus.len(), master_path.display());
            }

            MasterAction::List { dir } => {
                let dir = dir.unwrap_or_else(|| PathBuf::from(master_files::DEFAULT_MASTER_DIR));
                let masters = master_files::list_master_files(&dir);

                if masters.is_empty() {
                    println!("⚠ {} にマスタファイルがありません", dir.display());
                } else {
                    println!("📋 マスタファイル ({}):", dir.display());
                    for (i, (name, _)) in masters.iter().enumerate() {
                        println!("  {}) {}", i + 1, name);
                    }
                }
            }
        },

        Commands::Review { input, master } => {
            let master_path = config.resolve_master(master)?;
            review::run_interactive_review(&input, &master_path)?;
        }

        Commands::Columns { input, sku_column, input_format, sheet } => {
            let mut options = reader::ReaderOptions::from_config(&config);
            options.sku_column = sku_column;
            if sheet.is_some() {
                options.sheet = sheet;
            }

            let info = reader::inspect(&input, input_format, &options)?;
            println!("📄 {} ({})", input.display(), info.format);
            for (i, header) in info.headers.iter().enumerate() {
                let mark = if info.sku_column.as_deref() == Some(header.as_str()) { " ← SKU列" } else { "" };
                println!("  {:>3}: {}{}", i + 1, header, mark);
            }
            if info.sku_column.is_none() {
                println!("\n⚠ SKU列が見つかりません。--sku-column か `config --add-sku-column` で指定してください");
            }
        }

        Commands::Config { show, set_master, add_sku_column } => {
            let mut config = config;

            if let Some(path) = set_master {
                config.set_master(path)?;
                println!("✔ マスタを設定しました");
            }

            if let Some(name) = add_sku_column {
                config.add_sku_column(name)?;
                println!("✔ SKU列名を追加しました");
            }

            if show {
                println!("設定:");
                println!(
                    "  マスタ: {}",
                    config
                        .master_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "未設定".into())
                );
                println!(
                    "  追加SKU列: {}",
                    if config.sku_columns.is_empty() { "なし".to_string() } else { config.sku_columns.join(", ") }
                );
                println!("  出力先: {}", config.output_dir.display());
                println!("  最大ファイルサイズ: {} bytes", config.max_file_size);
                println!("  シート: {}", config.sheet.as_deref().unwrap_or("先頭シート"));
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(report: &BatchReport) {
    println!("\n📊 集計");
    println!("  合計: {}行", report.total_rows);
    println!("  照合: {}行", report.matched_count);
    println!("  未照合: {}行", report.unmatched_count);
    println!("  無効: {}行", report.invalid_count);
    println!("  成功率: {:.1}%", report.success_rate);

    if !report.top_master_skus.is_empty() {
        println!("\n  上位MSKU:");
        for top in &report.top_master_skus {
            println!("    {}: {}件", top.master_sku, top.count);
        }
    }

    if !report.unmatched_groups.is_empty() {
        println!("\n  未照合SKUの分類:");
        for (group, skus) in &report.unmatched_groups {
            let sample: Vec<&str> = skus.iter().take(5).map(String::as_str).collect();
            println!("    {} ({}件): {}", group, skus.len(), sample.join(", "));
        }
    }
}
