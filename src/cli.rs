use clap::{Parser, Subcommand};
use crate::reader::InputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sku-mapper")]
#[command(about = "販売データのSKUをマスタSKU(MSKU)に変換するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 販売データを変換して結果を出力
    Map {
        /// 入力ファイル（csv/xlsx/xls）
        #[arg(required = true)]
        input: PathBuf,

        /// マスタファイル（json/csv）
        #[arg(short, long)]
        master: Option<PathBuf>,

        /// 出力ディレクトリ（デフォルト: 設定の output_dir）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// 出力形式 (csv/excel/both)
        #[arg(short, long, default_value = "csv")]
        format: ExportFormat,

        /// SKU列名を指定（省略時は自動検出）
        #[arg(short = 'c', long)]
        sku_column: Option<String>,

        /// 入力形式を指定（省略時は拡張子から判定）
        #[arg(long)]
        input_format: Option<InputFormat>,

        /// 読み込むシート名
        #[arg(long)]
        sheet: Option<String>,

        /// 集計だけ表示してファイルを出力しない
        #[arg(long)]
        dry_run: bool,
    },

    /// マスタの確認・編集
    Master {
        #[command(subcommand)]
        action: MasterAction,
    },

    /// 未照合SKUを対話式でマスタに登録
    Review {
        /// map が出力したレポートJSON
        #[arg(required = true)]
        input: PathBuf,

        /// 登録先のマスタファイル
        #[arg(short, long)]
        master: Option<PathBuf>,
    },

    /// 入力ファイルの列とSKU列の検出結果を表示
    Columns {
        /// 入力ファイル
        #[arg(required = true)]
        input: PathBuf,

        /// SKU列名を指定
        #[arg(short = 'c', long)]
        sku_column: Option<String>,

        /// 入力形式を指定
        #[arg(long)]
        input_format: Option<InputFormat>,

        /// 読み込むシート名
        #[arg(long)]
        sheet: Option<String>,
    },

    /// 設定を管理
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 既定のマスタファイルを設定
        #[arg(long)]
        set_master: Option<PathBuf>,

        /// SKU列として扱うヘッダー名を追加
        #[arg(long)]
        add_sku_column: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum MasterAction {
    /// マスタの概要を表示
    Show {
        /// マスタファイル
        #[arg(short, long)]
        master: Option<PathBuf>,
    },

    /// MSKUにエイリアスを追加（MSKUが無ければ作成）
    Add {
        /// マスタSKU
        #[arg(required = true)]
        msku: String,

        /// 追加するSKU
        #[arg(required = true)]
        skus: Vec<String>,

        /// カテゴリ
        #[arg(long)]
        category: Option<String>,

        /// マスタファイル
        #[arg(short, long)]
        master: Option<PathBuf>,
    },

    /// マスタディレクトリ内のファイル一覧
    List {
        /// マスタディレクトリ（デフォルト: master/）
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Excel,
    Both,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "both" => Ok(ExportFormat::Both),
            _ => Err(format!("Unknown format: {}. Use csv, excel, or both", s)),
        }
    }
}
