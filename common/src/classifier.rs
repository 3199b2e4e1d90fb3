//! セル分類
//!
//! セルのテキストを5つのカテゴリのいずれかに分類する。
//! 規則は優先順位付きの表（`RULES`）で、最初に一致した規則が採用される。
//! 語彙（セクション名・表ヘッダ語・項目キーワード）は `Vocabulary` で宣言的に持ち、
//! 制御フローに触れずに追加できる。

use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// セルカテゴリ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellCategory {
    /// 値の入るセル（空欄・プレースホルダ・数値など）
    DataCell,
    /// 様式のブロック見出し
    SectionHeader,
    /// 表の列見出し（寸法・数量・単位）
    TableHeader,
    /// 入力項目のラベル
    FieldHeader,
    /// 表題
    Title,
}

impl std::fmt::Display for CellCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellCategory::DataCell => write!(f, "data_cell"),
            CellCategory::SectionHeader => write!(f, "section_header"),
            CellCategory::TableHeader => write!(f, "table_header"),
            CellCategory::FieldHeader => write!(f, "field_header"),
            CellCategory::Title => write!(f, "title"),
        }
    }
}

/// 分類語彙
///
/// `Default` は空。組み込み語彙は `Vocabulary::builtin()`。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    /// セクション見出しの語句（部分一致）
    #[serde(default)]
    pub section_phrases: Vec<String>,
    /// 表ヘッダの語（単語境界で一致）
    #[serde(default)]
    pub table_terms: Vec<String>,
    /// 項目ラベルのキーワード（単語境界で一致）
    #[serde(default)]
    pub field_keywords: Vec<String>,
}

impl Vocabulary {
    /// 組み込み語彙
    pub fn builtin() -> Self {
        let to_vec =
            |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        Self {
            section_phrases: to_vec(&[
                "vendor information",
                "supplier information",
                "part information",
                "header information",
                "packaging procedure",
                "packaging instruction",
                "current packaging",
                "packing details",
                "general information",
                "revision history",
                "approved by",
            ]),
            table_terms: to_vec(&[
                "length",
                "width",
                "height",
                "depth",
                "dimension",
                "dimensions",
                "quantity",
                "qty",
                "uom",
                "l-mm",
                "w-mm",
                "h-mm",
                "empty weight",
                "pack weight",
                "gross weight",
                "net weight",
            ]),
            field_keywords: to_vec(&[
                "name",
                "code",
                "date",
                "description",
                "weight",
                "reference",
                "ref",
                "no",
                "number",
                "id",
                "type",
                "location",
                "address",
                "revision",
                "rev",
                "part",
                "vendor",
                "supplier",
                "contact",
                "phone",
                "email",
                "issued",
                "reviewed",
                "prepared",
                "checked",
                "remarks",
                "material",
                "model",
                "serial",
            ]),
        }
    }

    /// 語彙を追加（重複は無視）
    pub fn extend(&mut self, other: &Vocabulary) {
        fn push_unique(dst: &mut Vec<String>, src: &[String]) {
            for item in src {
                if !dst.iter().any(|d| d.eq_ignore_ascii_case(item)) {
                    dst.push(item.clone());
                }
            }
        }
        push_unique(&mut self.section_phrases, &other.section_phrases);
        push_unique(&mut self.table_terms, &other.table_terms);
        push_unique(&mut self.field_keywords, &other.field_keywords);
    }

    /// 組み込み語彙に追加語彙を重ねたもの
    pub fn builtin_with(extra: &Vocabulary) -> Self {
        let mut vocabulary = Self::builtin();
        vocabulary.extend(extra);
        vocabulary
    }
}

lazy_static::lazy_static! {
    // 下線・点・ダッシュのみ
    static ref FILL_RUN_RE: Regex = Regex::new(r"^[\s_.\-–—]+$").unwrap();
    // 括弧で囲まれた内容
    static ref BRACKETED_RE: Regex = Regex::new(r"^[\[({<].*[\])}>]$").unwrap();
    // 入力指示語
    static ref PROMPT_WORD_RE: Regex =
        Regex::new(r"(?i)\b(enter|fill|data|value|input|here)\b").unwrap();
    // dd/mm/yyyy 系
    static ref DMY_RE: Regex = Regex::new(
        r"(?i)^(\d{1,2}|dd|mm)[/\-.](\d{1,2}|mm|dd)[/\-.](\d{2,4}|yy|yyyy)$"
    ).unwrap();
    // yyyy-mm-dd 系
    static ref YMD_RE: Regex =
        Regex::new(r"(?i)^(\d{4}|yyyy)[/\-.](\d{1,2}|mm)[/\-.](\d{1,2}|dd)$").unwrap();
    // 通貨・数値
    static ref NUMERIC_RE: Regex =
        Regex::new(r"^[-+]?[$€£¥₹]?\s*[-+]?(\d[\d,]*(\.\d+)?|\.\d+)\s*%?$").unwrap();
    // 単位略語
    static ref UNIT_RE: Regex =
        Regex::new(r"(?i)\b(mm|cm|kg|kgs|gms|lbs?|qty|pcs|pack)\b").unwrap();
}

/// 分類対象テキストの事前計算値
struct CellText<'a> {
    text: &'a str,
    lower: String,
    chars: usize,
    words: usize,
}

impl<'a> CellText<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            lower: text.to_lowercase(),
            chars: text.chars().count(),
            words: text.split_whitespace().count(),
        }
    }

    fn non_alnum(&self) -> usize {
        self.text.chars().filter(|c| !c.is_alphanumeric()).count()
    }

    fn is_upper(&self) -> bool {
        self.text.chars().any(char::is_alphabetic) && !self.text.chars().any(char::is_lowercase)
    }

    fn is_numeric_only(&self) -> bool {
        self.text
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || c == '.' || c == ',')
    }
}

/// 分類規則
struct Rule {
    name: &'static str,
    category: CellCategory,
    test: fn(&CellClassifier, &CellText) -> bool,
}

/// 優先順位順の規則表
const RULES: &[Rule] = &[
    Rule { name: "blank", category: CellCategory::DataCell, test: rule_blank },
    Rule { name: "placeholder", category: CellCategory::DataCell, test: rule_placeholder },
    Rule { name: "symbolic", category: CellCategory::DataCell, test: rule_symbolic },
    Rule { name: "section", category: CellCategory::SectionHeader, test: rule_section },
    Rule { name: "table", category: CellCategory::TableHeader, test: rule_table },
    Rule { name: "title", category: CellCategory::Title, test: rule_title },
    Rule { name: "field", category: CellCategory::FieldHeader, test: rule_field },
];

/// どの規則にも一致しない場合の規則名
pub const FALLBACK_RULE: &str = "fallback";

fn rule_blank(_: &CellClassifier, t: &CellText) -> bool {
    t.text.is_empty()
}

fn rule_placeholder(_: &CellClassifier, t: &CellText) -> bool {
    FILL_RUN_RE.is_match(t.text)
        || BRACKETED_RE.is_match(t.text)
        || PROMPT_WORD_RE.is_match(t.text)
        || DMY_RE.is_match(t.text)
        || YMD_RE.is_match(t.text)
        || NUMERIC_RE.is_match(t.text)
}

fn rule_symbolic(_: &CellClassifier, t: &CellText) -> bool {
    t.chars <= 10 && t.non_alnum() * 2 > t.chars
}

fn rule_section(c: &CellClassifier, t: &CellText) -> bool {
    let known = c.section_phrases.iter().any(|p| t.lower.contains(p.as_str()));
    let descriptive = t.words > 3 && t.chars > 15 && !t.text.ends_with(':');
    known || descriptive
}

fn rule_table(c: &CellClassifier, t: &CellText) -> bool {
    c.table_re.as_ref().is_some_and(|re| re.is_match(t.text)) || UNIT_RE.is_match(t.text)
}

fn rule_title(_: &CellClassifier, t: &CellText) -> bool {
    t.chars > 50 || (t.is_upper() && t.words >= 4)
}

fn rule_field(c: &CellClassifier, t: &CellText) -> bool {
    let keyword = c.field_re.as_ref().is_some_and(|re| re.is_match(t.text));
    let generic = t.words <= 3
        && (2..=19).contains(&t.chars)
        && !t.is_numeric_only()
        && !t.is_upper();
    keyword || t.text.ends_with(':') || generic
}

/// 規則連鎖による分類器
#[derive(Debug, Clone)]
pub struct CellClassifier {
    vocabulary: Vocabulary,
    section_phrases: Vec<String>,
    table_re: Option<Regex>,
    field_re: Option<Regex>,
}

impl CellClassifier {
    /// 語彙から分類器を構築
    pub fn new(vocabulary: Vocabulary) -> Result<Self> {
        let section_phrases = vocabulary
            .section_phrases
            .iter()
            .map(|p| p.trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        let table_re = word_regex(&vocabulary.table_terms)?;
        let field_re = word_regex(&vocabulary.field_keywords)?;

        Ok(Self {
            vocabulary,
            section_phrases,
            table_re,
            field_re,
        })
    }

    /// 組み込み語彙の分類器
    pub fn builtin() -> Self {
        Self::new(Vocabulary::builtin()).expect("built-in vocabulary is valid")
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// テキストを分類
    pub fn classify(&self, text: Option<&str>) -> CellCategory {
        self.classify_with_rule(text).0
    }

    /// テキストを分類し、一致した規則名も返す
    pub fn classify_with_rule(&self, text: Option<&str>) -> (CellCategory, &'static str) {
        let text = CellText::new(text.unwrap_or("").trim());
        RULES
            .iter()
            .find(|rule| (rule.test)(self, &text))
            .map(|rule| (rule.category, rule.name))
            .unwrap_or((CellCategory::DataCell, FALLBACK_RULE))
    }
}

/// 語のリストから単語境界付きの大文字小文字無視の正規表現を作る
fn word_regex(terms: &[String]) -> Result<Option<Regex>> {
    let alternatives: Vec<String> = terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return Ok(None);
    }

    let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
    Ok(Some(Regex::new(&pattern)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use CellCategory::*;

    fn classify(text: &str) -> CellCategory {
        CellClassifier::builtin().classify(Some(text))
    }

    #[test]
    fn test_blank_is_data() {
        let c = CellClassifier::builtin();
        assert_eq!(c.classify(None), DataCell);
        assert_eq!(c.classify(Some("")), DataCell);
        assert_eq!(c.classify(Some("   \t")), DataCell);
        assert_eq!(c.classify_with_rule(None).1, "blank");
    }

    #[test]
    fn test_placeholders_are_data() {
        for text in [
            "___", "[ ]", "DD/MM/YYYY", "123.45", "....", "- - -", "{value}", "<part no>",
            "Enter here", "12/05/2024", "2024-05-12", "$1,200.00", "45%",
        ] {
            assert_eq!(classify(text), DataCell, "{}", text);
        }
    }

    #[test]
    fn test_symbolic_short_text_is_data() {
        assert_eq!(classify("#/#"), DataCell);
        assert_eq!(CellClassifier::builtin().classify_with_rule(Some("#/#")).1, "symbolic");
    }

    #[test]
    fn test_field_headers() {
        assert_eq!(classify("Vendor Code:"), FieldHeader);
        assert_eq!(classify("Part No."), FieldHeader);
        assert_eq!(classify("Date"), FieldHeader);
        assert_eq!(classify("Issued By"), FieldHeader);
        assert_eq!(classify("Colour"), FieldHeader);
    }

    #[test]
    fn test_section_headers() {
        assert_eq!(
            classify("Primary Packaging Instruction (Primary / Internal)"),
            SectionHeader
        );
        assert_eq!(classify("Vendor Information"), SectionHeader);
        assert_eq!(classify("Approved By"), SectionHeader);
        assert_eq!(classify("Place the parts in the tray carefully"), SectionHeader);
    }

    #[test]
    fn test_table_headers() {
        assert_eq!(classify("L-mm"), TableHeader);
        assert_eq!(classify("Qty/Pack"), TableHeader);
        assert_eq!(classify("Empty Weight"), TableHeader);
        assert_eq!(classify("Width"), TableHeader);
    }

    #[test]
    fn test_titles() {
        assert_eq!(classify("PACKING LIST FOR EXPORT:"), Title);
        let long = "Packaging standard for export shipments of all plastic parts:";
        assert_eq!(classify(long), Title);
    }

    #[test]
    fn test_fallback_is_data() {
        let c = CellClassifier::builtin();
        assert_eq!(c.classify_with_rule(Some("ABC")), (DataCell, FALLBACK_RULE));
    }

    #[test]
    fn test_extended_vocabulary() {
        let extra = Vocabulary {
            section_phrases: vec!["Logistics".into()],
            table_terms: vec!["pallet".into()],
            ..Default::default()
        };
        let c = CellClassifier::new(Vocabulary::builtin_with(&extra)).unwrap();
        assert_eq!(c.classify(Some("Logistics")), SectionHeader);
        assert_eq!(c.classify(Some("Pallet")), TableHeader);
        assert_eq!(CellClassifier::builtin().classify(Some("Pallet")), FieldHeader);
    }

    #[test]
    fn test_empty_vocabulary_does_not_match_everything() {
        let c = CellClassifier::new(Vocabulary::default()).unwrap();
        assert_eq!(c.classify(Some("Colour Shade Option Code X")), SectionHeader);
        assert_eq!(c.classify(Some("Colour")), FieldHeader);
    }
}
