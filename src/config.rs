use crate::error::{SkuMapperError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// アップロードファイルの上限（16MiB）
pub const DEFAULT_MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

const MASTER_ENV: &str = "SKU_MAPPER_MASTER";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 既定のマスタファイル
    pub master_path: Option<PathBuf>,
    /// SKU列として扱う追加のヘッダー名
    pub sku_columns: Vec<String>,
    pub output_dir: PathBuf,
    pub max_file_size: u64,
    /// 読み込むシート名（省略時は先頭シート）
    pub sheet: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            master_path: None,
            sku_columns: Vec::new(),
            output_dir: PathBuf::from("output"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            sheet: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| SkuMapperError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("sku-mapper").join("config.json"))
    }

    /// マスタファイルを決定する（引数 > 環境変数 > 設定ファイル）
    pub fn resolve_master(&self, explicit: Option<PathBuf>) -> Result<PathBuf> {
        self.resolve_master_from(explicit, std::env::var(MASTER_ENV).ok())
    }

    /// 環境変数の値を渡してマスタを決定する（空白のみの値は未設定扱い）
    pub fn resolve_master_from(&self, explicit: Option<PathBuf>, env_value: Option<String>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path);
        }

        if let Some(path) = env_value.filter(|p| !p.trim().is_empty()) {
            return Ok(PathBuf::from(path));
        }

        self.master_path.clone().ok_or(SkuMapperError::MissingMaster)
    }

    pub fn set_master(&mut self, path: PathBuf) -> Result<()> {
        self.master_path = Some(path);
        self.save()
    }

    pub fn add_sku_column(&mut self, name: String) -> Result<()> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(SkuMapperError::Config("列名が空です".into()));
        }
        if !self.sku_columns.iter().any(|c| c.eq_ignore_ascii_case(&name)) {
            self.sku_columns.push(name);
        }
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_file_size, 16 * 1024 * 1024);
        assert!(config.sku_columns.is_empty());
        assert_eq!(config.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"sku_columns": ["Seller SKU"]}"#).unwrap();
        assert_eq!(config.sku_columns, vec!["Seller SKU".to_string()]);
        assert_eq!(config.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert!(config.master_path.is_none());
    }

    #[test]
    fn test_explicit_master_wins() {
        let config = Config {
            master_path: Some(PathBuf::from("from_config.json")),
            ..Default::default()
        };
        let resolved = config.resolve_master(Some(PathBuf::from("explicit.json"))).unwrap();
        assert_eq!(resolved, PathBuf::from("explicit.json"));
    }

    #[test]
    fn test_master_resolution_order() {
        let config = Config {
            master_path: Some(PathBuf::from("from_config.json")),
            ..Default::default()
        };

        let resolved = config
            .resolve_master_from(Some(PathBuf::from("explicit.json")), Some("from_env.json".into()))
            .unwrap();
        assert_eq!(resolved, PathBuf::from("explicit.json"));

        let resolved = config.resolve_master_from(None, Some("from_env.json".into())).unwrap();
        assert_eq!(resolved, PathBuf::from("from_env.json"));

        let resolved = config.resolve_master_from(None, Some("   ".into())).unwrap();
        assert_eq!(resolved, PathBuf::from("from_config.json"));

        let resolved = config.resolve_master_from(None, None).unwrap();
        assert_eq!(resolved, PathBuf::from("from_config.json"));
    }

    #[test]
    fn test_no_master_anywhere() {
        let config = Config::default();
        assert!(matches!(
            config.resolve_master_from(None, None),
            Err(SkuMapperError::MissingMaster)
        ));
        assert!(matches!(
            config.resolve_master_from(None, Some(String::new())),
            Err(SkuMapperError::MissingMaster)
        ));
    }
}
