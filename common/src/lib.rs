//! SKU Mapper Common Library
//!
//! CLIと取り込みパイプラインで共有される型とロジック

pub mod types;
pub mod error;
pub mod sku;
pub mod master;
pub mod mapper;
pub mod report;
pub mod pattern;
pub mod columns;

pub use types::{CellValue, MappingResult, MappingStatus, MatchSource, RawRow, RowError};
pub use error::{Error, Result};
pub use sku::normalize_sku;
pub use master::{AliasConflict, MasterLookup, MasterSkuEntry, MasterSummary, MasterTable};
pub use mapper::{SkuNormalizer, MAPPING_METHOD};
pub use report::{BatchReport, MappingReporter, MasterSkuCount};
pub use pattern::{classify_sku, SkuPattern};
pub use columns::{detect_sku_column, detect_sku_column_by_values, unique_headers};
