//! Excel生成（rust_xlsxwriter）
//!
//! 転記済みシートを xlsx に書き出す。値と結合セルのみを再現し、書式は引き継がない。

use crate::error::{FormFillError, Result};
use form_fill_common::{has_time_of_day, CellValue, Coordinate, Spreadsheet};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;

/// シートをxlsxファイルとして保存（出力先フォルダがなければ作成）
pub fn save_spreadsheet(sheet: &Spreadsheet, output_path: &Path) -> Result<()> {
    let buffer = generate_excel_buffer(sheet)?;
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(output_path, buffer)?;
    tracing::debug!(path = %output_path.display(), "workbook saved");
    Ok(())
}

/// シートをxlsxのバイト列に変換
pub fn generate_excel_buffer(sheet: &Spreadsheet) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(sheet.name())
        .map_err(|e| excel_error("シート名設定エラー", e))?;

    write_sheet(worksheet, sheet)?;

    workbook
        .save_to_buffer()
        .map_err(|e| excel_error("Excel保存エラー", e))
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Spreadsheet) -> Result<()> {
    let merge_format = Format::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    // 結合範囲を先に作り、アンカーの値は後段で上書きする
    for region in sheet.merged_regions() {
        if region.is_single_cell() {
            continue;
        }
        let (first_row, first_col) = position(region.anchor())?;
        let (last_row, last_col) =
            position(Coordinate::new(region.max_row, region.max_col))?;
        worksheet
            .merge_range(first_row, first_col, last_row, last_col, "", &merge_format)
            .map_err(|e| excel_error("セルマージエラー", e))?;
    }

    for (coordinate, value) in sheet.populated_cells() {
        if sheet.is_interior(coordinate) {
            continue;
        }
        let (row, col) = position(coordinate)?;
        let written = match value {
            CellValue::Empty => continue,
            CellValue::Text(s) | CellValue::Error(s) => worksheet.write_string(row, col, s.as_str()),
            CellValue::Number(n) => worksheet.write_number(row, col, *n),
            CellValue::Bool(b) => worksheet.write_boolean(row, col, *b),
            CellValue::DateTime(dt) => {
                let format = if has_time_of_day(dt) {
                    &datetime_format
                } else {
                    &date_format
                };
                worksheet.write_datetime_with_format(row, col, dt, format)
            }
        };
        written.map_err(|e| excel_error(&format!("{} の書き込みエラー", coordinate), e))?;
    }

    Ok(())
}

/// 1始まりの座標を rust_xlsxwriter の 0始まり (row, col) に変換
fn position(coordinate: Coordinate) -> Result<(u32, u16)> {
    let col = u16::try_from(coordinate.column - 1).map_err(|_| {
        FormFillError::ExcelWrite(format!("列番号が範囲外です: {}", coordinate))
    })?;
    Ok((coordinate.row - 1, col))
}

fn excel_error(context: &str, e: XlsxError) -> FormFillError {
    FormFillError::ExcelWrite(format!("{}: {}", context, e))
}
