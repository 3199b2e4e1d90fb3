//! 転記元データの読み込み
//!
//! CSV/TSV は csv クレート、Excel/ODS は calamine で読み込む。
//! 1行目を列名とし、列名の前後の空白は除去する。

use super::template::cell_value;
use crate::error::{FormFillError, Result};
use calamine::{open_workbook_auto, Reader};
use form_fill_common::{CellValue, DataTable};
use std::collections::HashSet;
use std::path::Path;

/// 拡張子に応じてデータテーブルを読み込む
pub fn load_data_table(path: &Path, sheet: Option<&str>) -> Result<DataTable> {
    if !path.exists() {
        return Err(FormFillError::FileNotFound(path.display().to_string()));
    }

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let table = match ext.as_str() {
        "csv" => load_delimited(path, b',')?,
        "tsv" | "tab" => load_delimited(path, b'\t')?,
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_workbook(path, sheet)?,
        _ => {
            return Err(FormFillError::DataLoad(format!(
                "未対応の形式です: {} (csv/tsv/xlsx/xls/ods)",
                path.display()
            )))
        }
    };

    tracing::debug!(
        path = %path.display(),
        columns = table.column_names().len(),
        rows = table.row_count(),
        "data table loaded"
    );
    Ok(table)
}

fn load_delimited(path: &Path, delimiter: u8) -> Result<DataTable> {
    let data_err = |e: csv::Error| FormFillError::DataLoad(format!("{}: {}", path.display(), e));

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .map_err(data_err)?;

    let headers = reader.headers().map_err(data_err)?.clone();
    let mut table = DataTable::new(header_names(headers.iter()))?;

    for record in reader.records() {
        let record = record.map_err(data_err)?;
        let values: Vec<CellValue> = record.iter().map(text_value).collect();
        if values.iter().all(CellValue::is_empty) {
            continue;
        }
        table.push_row(values);
    }

    Ok(table)
}

fn load_workbook(path: &Path, sheet: Option<&str>) -> Result<DataTable> {
    let data_err = |e: calamine::Error| FormFillError::DataLoad(format!("{}: {}", path.display(), e));

    let mut workbook = open_workbook_auto(path).map_err(data_err)?;
    let name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| FormFillError::DataLoad("シートがありません".into()))?,
    };
    let range = workbook.worksheet_range(&name).map_err(data_err)?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(DataTable::new(Vec::<String>::new())?);
    };
    let mut table = DataTable::new(header_names(header.iter().map(|d| cell_value(d).to_string())))?;

    for row in rows {
        let values: Vec<CellValue> = row.iter().map(cell_value).collect();
        if values.iter().all(CellValue::is_empty) {
            continue;
        }
        table.push_row(values);
    }

    Ok(table)
}

fn text_value(field: &str) -> CellValue {
    if field.trim().is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(field.to_string())
    }
}

/// 列名を整える（空の列名は `Unnamed: n`、重複には `.1`, `.2` … を付ける）
fn header_names<I, S>(headers: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    headers
        .into_iter()
        .enumerate()
        .map(|(i, h)| {
            let base = match h.as_ref().trim() {
                "" => format!("Unnamed: {}", i),
                name => name.to_string(),
            };
            let mut name = base.clone();
            let mut n = 1;
            while !seen.insert(name.clone()) {
                name = format!("{}.{}", base, n);
                n += 1;
            }
            name
        })
        .collect()
}
