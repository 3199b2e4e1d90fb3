//! テンプレート走査
//!
//! 値のある全セルについて結合範囲を解決し、分類して `FieldRegistry` を構築する。
//! 1セルの失敗は診断に記録してそのセルを除外するだけで、走査は中断しない。

use crate::classifier::{CellCategory, CellClassifier};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{Error, Result};
use crate::model::{CellValue, Coordinate, MergedRegion, Spreadsheet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 分類済みセル
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub coordinate: Coordinate,
    pub raw_value: CellValue,
    pub row: u32,
    pub column: u32,
    pub merged_region: Option<MergedRegion>,
    pub category: CellCategory,
}

impl CellRecord {
    /// ラベル文字列
    pub fn text(&self) -> String {
        self.raw_value.to_string().trim().to_string()
    }
}

/// 座標 → 分類済みセル
///
/// 走査ごとに新しく作られ、構築後は変更されない。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldRegistry {
    records: BTreeMap<Coordinate, CellRecord>,
}

impl FieldRegistry {
    pub fn get(&self, c: Coordinate) -> Option<&CellRecord> {
        self.records.get(&c)
    }

    /// 行優先で全レコード
    pub fn iter(&self) -> impl Iterator<Item = &CellRecord> {
        self.records.values()
    }

    /// 項目ラベル（field_header）のレコード
    pub fn fields(&self) -> impl Iterator<Item = &CellRecord> {
        self.by_category(CellCategory::FieldHeader)
    }

    pub fn by_category(&self, category: CellCategory) -> impl Iterator<Item = &CellRecord> {
        self.records.values().filter(move |r| r.category == category)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<CellRecord> for FieldRegistry {
    fn from_iter<I: IntoIterator<Item = CellRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().map(|r| (r.coordinate, r)).collect(),
        }
    }
}

pub struct TemplateScanner<'a> {
    classifier: &'a CellClassifier,
}

impl<'a> TemplateScanner<'a> {
    pub fn new(classifier: &'a CellClassifier) -> Self {
        Self { classifier }
    }

    /// シートを走査してレジストリを構築
    pub fn scan(&self, sheet: &Spreadsheet, diagnostics: &mut Diagnostics) -> FieldRegistry {
        let mut records = BTreeMap::new();

        for (coordinate, value) in sheet.populated_cells() {
            match self.process_cell(sheet, coordinate, value) {
                Ok(record) => {
                    records.insert(coordinate, record);
                }
                Err(e) => diagnostics.record(DiagnosticKind::CellProcessing, &e),
            }
        }

        tracing::debug!(
            sheet = sheet.name(),
            cells = records.len(),
            "template scanned"
        );
        FieldRegistry { records }
    }

    fn process_cell(
        &self,
        sheet: &Spreadsheet,
        coordinate: Coordinate,
        value: &CellValue,
    ) -> Result<CellRecord> {
        if let CellValue::Error(literal) = value {
            return Err(Error::CellProcessing {
                coordinate,
                reason: format!("cell holds error value {}", literal),
            });
        }

        let merged_region = sheet.region_of(coordinate).copied();
        let category = self.classifier.classify(value.as_text().as_deref());

        Ok(CellRecord {
            coordinate,
            raw_value: value.clone(),
            row: coordinate.row,
            column: coordinate.column,
            merged_region,
            category,
        })
    }
}
