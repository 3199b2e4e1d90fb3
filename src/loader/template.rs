//! テンプレート読み込み（calamine）
//!
//! 値と結合セル範囲を `Spreadsheet` に変換する。読み込めない場合は処理全体が失敗する。

use crate::error::{FormFillError, Result};
use calamine::{open_workbook, Data, DataType, Reader, Xlsx, XlsxError};
use form_fill_common::{CellValue, Coordinate, MergedRegion, Spreadsheet};
use std::path::Path;

/// テンプレートを読み込む
///
/// # Arguments
/// * `path` - xlsxファイル
/// * `sheet` - シート名（省略時は先頭シート）
pub fn load_template(path: &Path, sheet: Option<&str>) -> Result<Spreadsheet> {
    if !path.exists() {
        return Err(FormFillError::FileNotFound(path.display().to_string()));
    }

    let load_err = |e: XlsxError| FormFillError::TemplateLoad(format!("{}: {}", path.display(), e));

    let mut workbook: Xlsx<_> = open_workbook(path).map_err(load_err)?;
    workbook.load_merged_regions().map_err(load_err)?;

    let names = workbook.sheet_names();
    let name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| {
                FormFillError::TemplateLoad(format!(
                    "シート '{}' がありません（{}）",
                    wanted,
                    names.join(", ")
                ))
            })?,
        None => names
            .first()
            .cloned()
            .ok_or_else(|| FormFillError::TemplateLoad("シートがありません".into()))?,
    };

    let range = workbook.worksheet_range(&name).map_err(load_err)?;
    let mut model = Spreadsheet::new(name.clone());

    if let Some((row0, col0)) = range.start() {
        for (r, c, data) in range.used_cells() {
            let coordinate = Coordinate::new(row0 + r as u32 + 1, col0 + c as u32 + 1);
            model.set_value(coordinate, cell_value(data));
        }
    }

    let merges = workbook
        .worksheet_merge_cells(&name)
        .unwrap_or(Ok(Vec::new()))
        .map_err(load_err)?;
    for dims in merges {
        let region = MergedRegion::new(
            dims.start.0 + 1,
            dims.start.1 + 1,
            dims.end.0 + 1,
            dims.end.1 + 1,
        );
        if region.is_single_cell() {
            continue;
        }
        model
            .add_merge(region)
            .map_err(|e| FormFillError::TemplateLoad(e.to_string()))?;
    }

    tracing::debug!(
        sheet = %name,
        cells = model.populated_cells().count(),
        merges = model.merged_regions().len(),
        "template loaded"
    );
    Ok(model)
}

/// calamineのセル値を変換
pub fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Error(e) => CellValue::Error(e.to_string()),
        // 経過時間はシリアル値のまま数値で扱う
        Data::DateTime(dt) if dt.is_duration() => CellValue::Number(dt.as_f64()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => CellValue::DateTime(ndt),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => match data.as_datetime() {
            Some(ndt) => CellValue::DateTime(ndt),
            None => CellValue::Text(s.clone()),
        },
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
