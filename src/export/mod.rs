//! 転記結果の出力
//!
//! 出力ファイル名の決定とxlsx書き出し。

pub mod excel;

pub use excel::{generate_excel_buffer, save_spreadsheet};

use chrono::Local;
use std::path::{Path, PathBuf};

/// テンプレートのファイル名（拡張子なし）
pub fn template_stem(template: &Path) -> String {
    template
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("form")
        .to_string()
}

/// 単票転記の出力パス
///
/// `output` がファイル名ならそのまま使う。ディレクトリまたは省略時は
/// `<テンプレート名>_<最初の転記値 or rowN>_<日時>.xlsx` を生成する。
pub fn fill_output_path(
    template: &Path,
    output: Option<&Path>,
    first_value: Option<&str>,
    row_index: usize,
) -> PathBuf {
    if let Some(output) = output {
        if !output.is_dir() && output.extension().is_some() {
            return output.to_path_buf();
        }
    }

    let dir = output
        .map(Path::to_path_buf)
        .or_else(|| template.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));

    let part = match first_value.map(str::trim) {
        Some(v) if !v.is_empty() => sanitize(v),
        _ => format!("row{}", row_index + 1),
    };
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    dir.join(format!("{}_{}_{}.xlsx", template_stem(template), part, timestamp))
}

/// 一括転記の出力パス（`<テンプレート名>_row001.xlsx`）
pub fn batch_output_path(output_dir: &Path, stem: &str, row_index: usize) -> PathBuf {
    output_dir.join(format!("{}_row{:03}.xlsx", stem, row_index + 1))
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c => c,
        })
        .collect()
}
