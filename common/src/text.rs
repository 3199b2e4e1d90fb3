//! テキスト正規化
//!
//! 小文字化・句読点の空白化・空白の圧縮・トークン化・ストップワード除去。

use std::collections::BTreeSet;

/// キーワード抽出で除外する語
pub const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "in", "is",
    "it", "its", "of", "on", "or", "per", "the", "this", "that", "to", "was", "were", "will",
    "with", "all", "any", "each", "into", "our", "your", "not", "but", "can",
];

/// 正規化（小文字化・英数字以外を空白に・空白を1つに圧縮）
pub fn normalize(text: &str) -> String {
    let replaced: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 正規化済みトークン列
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// キーワード集合（3文字以上、ストップワード除外）
pub fn keywords(text: &str) -> BTreeSet<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| t.chars().count() > 2 && !is_stopword(t))
        .collect()
}
