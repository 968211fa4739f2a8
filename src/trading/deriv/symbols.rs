//! 合成指数白名单与自动化平台 app_id

pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";

pub const SYNTHETIC_SYMBOLS: [&str; 16] = [
    "R_10", "R_25", "R_50", "R_75", "R_100", "BOOM300", "BOOM500", "BOOM1000", "CRASH300",
    "CRASH500", "CRASH1000", "1HZ10V", "1HZ25V", "1HZ50V", "1HZ75V", "1HZ100V",
];

/// DBot 的应用 id
pub const BOT_APP_IDS: [u64; 2] = [16929, 19111];

pub fn is_synthetic(symbol: &str) -> bool {
    SYNTHETIC_SYMBOLS
        .iter()
        .any(|s| s.eq_ignore_ascii_case(symbol.trim()))
}

pub fn is_bot_app(app_id: u64) -> bool {
    BOT_APP_IDS.contains(&app_id)
}

/// 从 shortcode 中提取合约品种
///
/// 只在 `_` 分隔的位置做前缀匹配，且品种之后必须是 `_` 或结尾；多个命中时取最长者，
/// 例如 `CALL_R_100_...` 得到 `R_100` 而不是 `R_10`。
pub fn extract_symbol(shortcode: &str) -> &'static str {
    let code = shortcode.trim().to_ascii_uppercase();
    let bytes = code.as_bytes();
    let mut best: Option<&'static str> = None;

    for start in 0..code.len() {
        if start > 0 && bytes[start - 1] != b'_' {
            continue;
        }
        let rest = &code[start..];
        for symbol in SYNTHETIC_SYMBOLS {
            if !rest.starts_with(symbol) {
                continue;
            }
            let bounded = rest.len() == symbol.len() || rest.as_bytes()[symbol.len()] == b'_';
            if bounded && best.map_or(true, |b| symbol.len() > b.len()) {
                best = Some(symbol);
            }
        }
    }

    best.unwrap_or(UNKNOWN_SYMBOL)
}
