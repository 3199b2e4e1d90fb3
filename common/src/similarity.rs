//! テキスト類似度
//!
//! 3つのシグナルを組み合わせて [0, 1] のスコアを返す。
//! - 文字列の並び類似度（LCSベース）
//! - キーワード集合のJaccard係数
//! - 2文書TF-IDFベクトルのコサイン類似度（拡張戦略のみ）
//!
//! 戦略は起動時に一度だけ `SimilarityKind` から選択する。

use crate::text::{keywords, normalize};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// 類似度計算の戦略
pub trait SimilarityStrategy: Send + Sync {
    /// 戦略名（表示用）
    fn name(&self) -> &'static str;

    /// 2つのテキストの類似度（0.0〜1.0、対称・反射的）
    fn score(&self, a: &str, b: &str) -> f64;
}

/// 文字列並び + キーワード（0.7 / 0.3）
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicTextSimilarity;

/// 文字列並び + TF-IDF + キーワード（0.4 / 0.4 / 0.2）
#[derive(Debug, Clone, Copy, Default)]
pub struct EnhancedTextSimilarity;

impl SimilarityStrategy for BasicTextSimilarity {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn score(&self, a: &str, b: &str) -> f64 {
        let Some((na, nb)) = prepare(a, b) else {
            return 0.0;
        };
        if na == nb {
            return 1.0;
        }

        let combined = 0.7 * sequence_ratio(&na, &nb) + 0.3 * keyword_overlap(&na, &nb);
        combined.clamp(0.0, 1.0)
    }
}

impl SimilarityStrategy for EnhancedTextSimilarity {
    fn name(&self) -> &'static str {
        "enhanced"
    }

    fn score(&self, a: &str, b: &str) -> f64 {
        let Some((na, nb)) = prepare(a, b) else {
            return 0.0;
        };
        if na == nb {
            return 1.0;
        }

        let combined = 0.4 * sequence_ratio(&na, &nb)
            + 0.4 * tfidf_cosine(&na, &nb)
            + 0.2 * keyword_overlap(&na, &nb);
        combined.clamp(0.0, 1.0)
    }
}

/// 戦略の種類（設定・CLIから選択）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimilarityKind {
    Basic,
    #[default]
    Enhanced,
}

impl SimilarityKind {
    pub fn strategy(&self) -> Box<dyn SimilarityStrategy> {
        match self {
            SimilarityKind::Basic => Box::new(BasicTextSimilarity),
            SimilarityKind::Enhanced => Box::new(EnhancedTextSimilarity),
        }
    }
}

impl std::str::FromStr for SimilarityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" | "b" => Ok(SimilarityKind::Basic),
            "enhanced" | "tfidf" | "e" => Ok(SimilarityKind::Enhanced),
            _ => Err(format!("Unknown strategy: {}. Use basic or enhanced", s)),
        }
    }
}

impl std::fmt::Display for SimilarityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimilarityKind::Basic => write!(f, "basic"),
            SimilarityKind::Enhanced => write!(f, "enhanced"),
        }
    }
}

/// 両方を正規化（どちらかが空ならNone）
fn prepare(a: &str, b: &str) -> Option<(String, String)> {
    let na = normalize(a);
    let nb = normalize(b);
    if na.is_empty() || nb.is_empty() {
        None
    } else {
        Some((na, nb))
    }
}

/// 文字列並び類似度: 2·LCS / (|a| + |b|)
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * lcs_length(&a, &b) as f64 / total as f64
}

/// 最長共通部分列の長さ
fn lcs_length(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// キーワード集合のJaccard係数
///
/// 両方のキーワードが空の場合は、正規化文字列の一致で 1.0 / 0.0。
pub fn keyword_overlap(a: &str, b: &str) -> f64 {
    let ka = keywords(a);
    let kb = keywords(b);
    if ka.is_empty() && kb.is_empty() {
        return if normalize(a) == normalize(b) { 1.0 } else { 0.0 };
    }

    let intersection = ka.intersection(&kb).count();
    let union = ka.union(&kb).count();
    intersection as f64 / union as f64
}

/// 2文書コーパスで学習したTF-IDFベクトルのコサイン類似度
///
/// idf = ln((1 + n) / (1 + df)) + 1、L2正規化。トークンは2文字以上の語。
pub fn tfidf_cosine(a: &str, b: &str) -> f64 {
    let ta = term_counts(a);
    let tb = term_counts(b);
    if ta.is_empty() || tb.is_empty() {
        return if normalize(a) == normalize(b) { 1.0 } else { 0.0 };
    }

    // 引数順に依存しない集計順序にするため語彙はソート済み集合
    let vocabulary: BTreeSet<&str> = ta.keys().chain(tb.keys()).map(String::as_str).collect();
    let n_docs = 2.0_f64;

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for term in vocabulary {
        let fa = ta.get(term).copied().unwrap_or(0) as f64;
        let fb = tb.get(term).copied().unwrap_or(0) as f64;
        let df = (fa > 0.0) as u8 as f64 + (fb > 0.0) as u8 as f64;
        let idf = ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0;

        let wa = fa * idf;
        let wb = fb * idf;
        dot += wa * wb;
        norm_a += wa * wa;
        norm_b += wb * wb;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    (dot / denom).clamp(0.0, 1.0)
}

fn term_counts(text: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for token in normalize(text).split(' ') {
        if token.chars().count() >= 2 {
            *counts.entry(token.to_string()).or_insert(0) += 1;
        }
    }
    counts
}
