//! 未照合SKUのパターン分類
//!
//! マスタに無いSKUを形状（ブランド語・数字桁数・接頭辞など）でグループ化し、
//! 新しいマッピングを作る際の手掛かりにする。
//! 分類は参考情報で、照合ステータスや信頼度には影響しない。

use regex::Regex;

const BRAND_KEYWORDS: &[&str] = &["FUSKED", "DRAGON", "RUDRAV", "CSTE"];
const SUNGLASS_KEYWORDS: &[&str] = &["SUNGLASS", "GLASSES"];
const ENTERTAINMENT_KEYWORDS: &[&str] = &["MUSIC", "HEIST", "SONG"];
const APPAREL_KEYWORDS: &[&str] = &["PACK OF", "FREE SIZE"];
const HANDICRAFT_KEYWORDS: &[&str] = &["WOODEN", "CANVAS", "CRAFT"];
const ELECTRONICS_PREFIXES: &[&str] = &["ST", "MT", "MY"];

/// SKUの形状による分類
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkuPattern {
    /// ブランド名を含む
    Brand(&'static str),
    Sunglasses,
    Entertainment,
    ApparelAccessories,
    Handicraft,
    /// 15桁以上の数字（先頭3桁）
    NumericOrder(String),
    /// 4桁の数字
    HsnCode(String),
    /// 8〜14桁の数字（先頭2桁）
    NumericProduct(String),
    /// 英字2文字以上 + 数字
    AlphaPrefixed(String),
    /// 8文字以上の英数字（ST/MT/MY始まり）
    Electronics(String),
    MixedAlphanumeric,
    /// UUID形式
    UuidShipment,
    /// 20文字以上でハイフンを含む
    SystemGenerated,
    ShortProductCode,
    ShortMixedCode,
    LongIdentifier,
}

impl std::fmt::Display for SkuPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkuPattern::Brand(brand) => write!(f, "{}_BRAND_PRODUCTS", brand),
            SkuPattern::Sunglasses => write!(f, "SUNGLASSES_CATEGORY"),
            SkuPattern::Entertainment => write!(f, "ENTERTAINMENT_PRODUCTS"),
            SkuPattern::ApparelAccessories => write!(f, "APPAREL_ACCESSORIES"),
            SkuPattern::Handicraft => write!(f, "HANDICRAFT_PRODUCTS"),
            SkuPattern::NumericOrder(prefix) => write!(f, "NUMERIC_ORDER_TYPE_{}", prefix),
            SkuPattern::HsnCode(code) => write!(f, "HSN_CODE_{}", code),
            SkuPattern::NumericProduct(prefix) => write!(f, "NUMERIC_PRODUCT_TYPE_{}", prefix),
            SkuPattern::AlphaPrefixed(prefix) => write!(f, "ALPHANUMERIC_TYPE_{}", prefix),
            SkuPattern::Electronics(prefix) => write!(f, "ELECTRONICS_TYPE_{}", prefix),
            SkuPattern::MixedAlphanumeric => write!(f, "MIXED_ALPHANUMERIC_PRODUCTS"),
            SkuPattern::UuidShipment => write!(f, "UUID_SHIPMENT_IDS"),
            SkuPattern::SystemGenerated => write!(f, "SYSTEM_GENERATED_IDS"),
            SkuPattern::ShortProductCode => write!(f, "SHORT_PRODUCT_CODES"),
            SkuPattern::ShortMixedCode => write!(f, "SHORT_MIXED_CODES"),
            SkuPattern::LongIdentifier => write!(f, "LONG_IDENTIFIER_CODES"),
        }
    }
}

/// SKUを分類する（入力は正規化前のSKU）
///
/// 空文字列は `None`。
pub fn classify_sku(sku: &str) -> Option<SkuPattern> {
    lazy_static::lazy_static! {
        static ref ALPHA_PREFIXED: Regex = Regex::new(r"^([A-Z]{2,})[0-9]+").unwrap();
        static ref LONG_ALNUM: Regex = Regex::new(r"^[A-Z0-9]{8,}$").unwrap();
    }

    let sku = sku.trim();
    if sku.is_empty() {
        return None;
    }
    let upper = sku.to_uppercase();

    if let Some(brand) = BRAND_KEYWORDS.iter().find(|b| upper.contains(*b)) {
        return Some(SkuPattern::Brand(*brand));
    }

    let contains_any = |keywords: &[&str]| keywords.iter().any(|k| upper.contains(k));
    if contains_any(SUNGLASS_KEYWORDS) {
        return Some(SkuPattern::Sunglasses);
    }
    if contains_any(ENTERTAINMENT_KEYWORDS) {
        return Some(SkuPattern::Entertainment);
    }
    if contains_any(APPAREL_KEYWORDS) {
        return Some(SkuPattern::ApparelAccessories);
    }
    if contains_any(HANDICRAFT_KEYWORDS) {
        return Some(SkuPattern::Handicraft);
    }

    let len = upper.chars().count();

    if upper.chars().all(|c| c.is_ascii_digit()) {
        match len {
            n if n >= 15 => return Some(SkuPattern::NumericOrder(upper[..3].to_string())),
            4 => return Some(SkuPattern::HsnCode(upper)),
            n if n >= 8 => return Some(SkuPattern::NumericProduct(upper[..2].to_string())),
            // 短い数字は下の短コード判定へ
            _ => {}
        }
    } else if let Some(caps) = ALPHA_PREFIXED.captures(&upper) {
        return Some(SkuPattern::AlphaPrefixed(caps[1].to_string()));
    } else if LONG_ALNUM.is_match(&upper) {
        return Some(
            match ELECTRONICS_PREFIXES.iter().find(|p| upper.starts_with(*p)) {
                Some(prefix) => SkuPattern::Electronics(prefix.to_string()),
                None => SkuPattern::MixedAlphanumeric,
            },
        );
    } else if len == 36 && upper.matches('-').count() == 4 {
        return Some(SkuPattern::UuidShipment);
    } else if len >= 20 && upper.contains('-') {
        return Some(SkuPattern::SystemGenerated);
    }

    if len <= 10 {
        if upper.chars().all(|c| c.is_alphanumeric()) {
            Some(SkuPattern::ShortProductCode)
        } else {
            Some(SkuPattern::ShortMixedCode)
        }
    } else {
        Some(SkuPattern::LongIdentifier)
    }
}
