//! SKU列の検出とヘッダー整形

/// SKU列を示すヘッダー語（優先度順のグループ、小文字で部分一致）
pub const SKU_INDICATOR_GROUPS: &[&[&str]] = &[
    &["sku", "stock_keeping_unit"],
    &["product_id", "product_code", "item_id", "item_code"],
    &["order_item_id", "orderitem", "order_id"],
    &["product", "item", "part"],
    &["code", "id"],
];

/// SKU列を検出する
///
/// 1. `preferred` が指定されていればその列のみ（大文字小文字無視の完全一致）
/// 2. `extra` の列名（完全一致、記述順）
/// 3. `SKU_INDICATOR_GROUPS` をグループ順に部分一致
///
/// 見つからなければ `None`。
pub fn detect_sku_column(headers: &[String], preferred: Option<&str>, extra: &[String]) -> Option<usize> {
    let find_exact = |name: &str| {
        let name = name.trim();
        headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
    };

    if let Some(preferred) = preferred {
        return find_exact(preferred);
    }

    if let Some(idx) = extra.iter().find_map(|name| find_exact(name.as_str())) {
        return Some(idx);
    }

    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    for group in SKU_INDICATOR_GROUPS {
        for indicator in *group {
            if let Some(idx) = lowered.iter().position(|h| h.contains(indicator)) {
                return Some(idx);
            }
        }
    }

    None
}

/// 内容推定で見る値の数（列ごと）
pub const SKU_SAMPLE_SIZE: usize = 10;

/// 値の内容からSKU列を推定する（ヘッダーで見つからなかった場合）
///
/// `rows` は先頭数行の値（行ごと、ヘッダー順）。各列の空でない値を
/// 最大 `SKU_SAMPLE_SIZE` 件見て、7割以上がSKUらしい最初の列を返す。
pub fn detect_sku_column_by_values(width: usize, rows: &[Vec<String>]) -> Option<usize> {
    (0..width).find(|&col| {
        let values: Vec<&str> = rows
            .iter()
            .filter_map(|row| row.get(col))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .take(SKU_SAMPLE_SIZE)
            .collect();

        if values.is_empty() {
            return false;
        }

        let sku_like = values.iter().filter(|v| looks_like_sku(v)).count();
        sku_like * 10 >= values.len() * 7
    })
}

/// 3文字以上、英数字を含み、数値だけではない
fn looks_like_sku(value: &str) -> bool {
    let digits: String = value.chars().filter(|&c| c != '.').collect();
    let numeric_only = !digits.is_empty() && digits.chars().all(char::is_numeric);

    value.chars().count() >= 3 && value.chars().any(char::is_alphanumeric) && !numeric_only
}

/// ヘッダー名を整える
///
/// 前後空白・BOMを除去し、空のヘッダーは `column_N`、
/// 重複は `name_2`, `name_3` ... にする。
pub fn unique_headers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut headers: Vec<String> = Vec::new();

    for (idx, name) in raw.into_iter().enumerate() {
        let name = name.as_ref().trim_start_matches('\u{feff}').trim();
        let base = if name.is_empty() {
            format!("column_{}", idx + 1)
        } else {
            name.to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 2;
        while headers.contains(&candidate) {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        headers.push(candidate);
    }

    headers
}
