use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkuMapperError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    /// ファイル全体が読めない（バッチ中断）
    #[error("ファイル形式エラー: {0}")]
    Format(String),

    /// SKU列が見つからない（バッチ中断）
    #[error("スキーマエラー: {0}")]
    Schema(String),

    #[error("マスタが指定されていません。`--master` か `sku-mapper config --set-master PATH` で指定してください")]
    MissingMaster,

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSVエラー: {0}")]
    Csv(#[from] csv::Error),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(#[from] rust_xlsxwriter::XlsxError),

    #[error("対話入力エラー: {0}")]
    Prompt(String),

    #[error(transparent)]
    Common(#[from] sku_mapper_common::Error),
}

pub type Result<T> = std::result::Result<T, SkuMapperError>;
