//! 結果の表示
//!
//! 走査・照合・転記の結果を標準出力に表示する。`--json` 指定時はJSONで出力。

use crate::error::Result;
use form_fill_common::{
    CellCategory, CellRecord, DiagnosticKind, Diagnostics, FieldRegistry, FieldWrite,
    MappingResult,
};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
pub struct ScanReport<'a> {
    pub template: String,
    pub sheet: &'a str,
    pub from_cache: bool,
    pub cells: Vec<&'a CellRecord>,
    pub diagnostics: &'a Diagnostics,
}

#[derive(Serialize)]
pub struct MapReport<'a> {
    pub strategy: &'a str,
    pub threshold: f64,
    pub mappings: &'a [MappingResult],
    pub diagnostics: &'a Diagnostics,
}

#[derive(Serialize)]
pub struct FillReport<'a> {
    pub output: String,
    pub row_index: usize,
    pub filled_count: usize,
    pub writes: &'a [FieldWrite],
    pub diagnostics: &'a Diagnostics,
}

pub fn to_json<T: Serialize>(report: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn scan_report<'a>(
    template: &Path,
    sheet: &'a str,
    registry: &'a FieldRegistry,
    diagnostics: &'a Diagnostics,
    from_cache: bool,
) -> ScanReport<'a> {
    ScanReport {
        template: template.display().to_string(),
        sheet,
        from_cache,
        cells: registry.iter().collect(),
        diagnostics,
    }
}

/// 走査結果を表形式で表示
pub fn print_registry(registry: &FieldRegistry) {
    println!("{:<8} {:<15} {:<10} 値", "セル", "分類", "結合");
    for record in registry.iter() {
        let merge = record
            .merged_region
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<8} {:<15} {:<10} {}",
            record.coordinate.to_string(),
            record.category.to_string(),
            merge,
            record.text()
        );
    }

    let count = |category| registry.by_category(category).count();
    println!(
        "\n項目 {} / 見出し {} / 表見出し {} / 表題 {} / データ {}",
        count(CellCategory::FieldHeader),
        count(CellCategory::SectionHeader),
        count(CellCategory::TableHeader),
        count(CellCategory::Title),
        count(CellCategory::DataCell),
    );
}

/// 照合結果を表示（✔ 採用 / ✗ 閾値未満）
pub fn print_mappings(mappings: &[MappingResult]) {
    for m in mappings {
        let mark = if m.is_mappable { "✔" } else { "✗" };
        println!(
            "{} {:<8} {:<30} → {:<30} ({:.3})",
            mark,
            m.field_coordinate.to_string(),
            m.template_label_text,
            m.matched_column_name.as_deref().unwrap_or("-"),
            m.similarity_score
        );
    }

    let mapped = mappings.iter().filter(|m| m.is_mappable).count();
    println!("\n{} / {} 項目が対応", mapped, mappings.len());
}

/// 書き込み内容を表示
pub fn print_writes(writes: &[FieldWrite]) {
    for w in writes {
        println!(
            "  {} → {} [{}] {} = {}",
            w.label_coordinate, w.target_coordinate, w.step, w.column_name, w.value
        );
    }
}

/// 診断を表示（無ければ何もしない）
pub fn print_diagnostics(diagnostics: &Diagnostics) {
    if diagnostics.is_empty() {
        return;
    }
    println!("\n{}", diagnostics_heading(diagnostics));
    for d in diagnostics.iter() {
        match d.coordinate {
            Some(c) => println!("  [{}] {}: {}", d.kind, c, d.message),
            None => println!("  [{}] {}", d.kind, d.message),
        }
    }
}

/// 診断の見出し（種類ごとの件数）
fn diagnostics_heading(diagnostics: &Diagnostics) -> String {
    let kinds = [
        (DiagnosticKind::CellProcessing, "セル除外"),
        (DiagnosticKind::Mapping, "照合失敗"),
        (DiagnosticKind::ResolutionOrWrite, "転記スキップ"),
    ];
    let parts: Vec<String> = kinds
        .iter()
        .filter_map(|(kind, label)| {
            let count = diagnostics.iter().filter(|d| d.kind == *kind).count();
            (count > 0).then(|| format!("{} {}件", label, count))
        })
        .collect();
    format!("⚠ 診断 {}件（{}）:", diagnostics.len(), parts.join(", "))
}
