//! テンプレートへの転記
//!
//! 走査 → 照合 → 転記先探索 → 書き込み をまとめる。
//! 項目単位の失敗は診断に記録してスキップし、全体は中断しない。
//! バッチ転記は行ごとにテンプレートを複製するため、行どうしが影響し合うことはない。

use crate::classifier::CellClassifier;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{Error, Result};
use crate::mapper::{FieldMapper, MappingResult};
use crate::model::{CellValue, Coordinate, Spreadsheet};
use crate::resolver::{SearchStep, TargetCellResolver};
use crate::scanner::FieldRegistry;
use crate::similarity::SimilarityStrategy;
use crate::table::DataTable;
use serde::Serialize;

/// 1項目分の書き込み記録
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldWrite {
    pub label_coordinate: Coordinate,
    pub target_coordinate: Coordinate,
    pub column_name: String,
    pub value: String,
    pub step: SearchStep,
}

/// 1行分の転記結果
#[derive(Debug, Clone)]
pub struct FillOutcome {
    pub row_index: usize,
    pub spreadsheet: Spreadsheet,
    pub filled_count: usize,
    pub writes: Vec<FieldWrite>,
    pub diagnostics: Diagnostics,
}

pub struct TemplateFiller<'a> {
    classifier: &'a CellClassifier,
    strategy: &'a dyn SimilarityStrategy,
    threshold: f64,
}

impl<'a> TemplateFiller<'a> {
    pub fn new(
        classifier: &'a CellClassifier,
        strategy: &'a dyn SimilarityStrategy,
        threshold: f64,
    ) -> Self {
        Self {
            classifier,
            strategy,
            threshold,
        }
    }

    /// ラベルと列の照合
    pub fn map(
        &self,
        registry: &FieldRegistry,
        table: &DataTable,
        diagnostics: &mut Diagnostics,
    ) -> Vec<MappingResult> {
        FieldMapper::new(self.strategy, self.threshold).map(registry, table, diagnostics)
    }

    /// 指定行のデータでテンプレートを埋める
    pub fn fill(
        &self,
        template: &Spreadsheet,
        registry: &FieldRegistry,
        table: &DataTable,
        row_index: usize,
    ) -> Result<FillOutcome> {
        let mut diagnostics = Diagnostics::new();
        let mappings = self.map(registry, table, &mut diagnostics);
        let mut outcome = self.fill_with_mappings(template, registry, &mappings, table, row_index)?;
        diagnostics.extend(std::mem::take(&mut outcome.diagnostics));
        outcome.diagnostics = diagnostics;
        Ok(outcome)
    }

    /// 全行分を転記（照合は1回だけ行う）
    pub fn fill_batch(
        &self,
        template: &Spreadsheet,
        registry: &FieldRegistry,
        table: &DataTable,
    ) -> Result<Vec<FillOutcome>> {
        let mut diagnostics = Diagnostics::new();
        let mappings = self.map(registry, table, &mut diagnostics);
        if !diagnostics.is_empty() {
            tracing::warn!(count = diagnostics.len(), "mapping issues in batch");
        }

        (0..table.row_count())
            .map(|row| self.fill_with_mappings(template, registry, &mappings, table, row))
            .collect()
    }

    /// 照合済みの結果を使って指定行を転記
    pub fn fill_with_mappings(
        &self,
        template: &Spreadsheet,
        registry: &FieldRegistry,
        mappings: &[MappingResult],
        table: &DataTable,
        row_index: usize,
    ) -> Result<FillOutcome> {
        if row_index >= table.row_count() {
            return Err(Error::RowOutOfRange {
                row: row_index,
                rows: table.row_count(),
            });
        }

        let resolver = TargetCellResolver::new(self.classifier);
        let mut sheet = template.clone();
        let mut writes = Vec::new();
        let mut diagnostics = Diagnostics::new();

        for mapping in mappings.iter().filter(|m| m.is_mappable) {
            match self.fill_field(&resolver, &mut sheet, registry, mapping, table, row_index) {
                Ok(Some(write)) => writes.push(write),
                Ok(None) => diagnostics.push(
                    DiagnosticKind::ResolutionOrWrite,
                    Some(mapping.field_coordinate),
                    format!("no writable cell near '{}'", mapping.template_label_text),
                ),
                Err(e) => diagnostics.record(DiagnosticKind::ResolutionOrWrite, &e),
            }
        }

        tracing::debug!(
            row = row_index,
            filled = writes.len(),
            skipped = diagnostics.len(),
            "row filled"
        );

        Ok(FillOutcome {
            row_index,
            spreadsheet: sheet,
            filled_count: writes.len(),
            writes,
            diagnostics,
        })
    }

    fn fill_field(
        &self,
        resolver: &TargetCellResolver,
        sheet: &mut Spreadsheet,
        registry: &FieldRegistry,
        mapping: &MappingResult,
        table: &DataTable,
        row_index: usize,
    ) -> Result<Option<FieldWrite>> {
        let column = mapping
            .matched_column_name
            .as_deref()
            .ok_or_else(|| Error::Resolution {
                coordinate: mapping.field_coordinate,
                reason: "mapping has no column".into(),
            })?;
        let label = registry
            .get(mapping.field_coordinate)
            .ok_or_else(|| Error::Resolution {
                coordinate: mapping.field_coordinate,
                reason: "label not found in registry".into(),
            })?;

        let Some(candidate) = resolver.resolve(label, sheet)? else {
            return Ok(None);
        };

        // 自身の結合範囲内で見つかった内部セルはアンカーへ振り替える
        let target = match (candidate.step, sheet.region_of(candidate.coordinate)) {
            (SearchStep::InsideMerge, Some(region)) => region.anchor(),
            _ => candidate.coordinate,
        };

        let value = table.display_value(row_index, column);
        sheet.write(target, CellValue::Text(value.clone()))?;

        Ok(Some(FieldWrite {
            label_coordinate: label.coordinate,
            target_coordinate: target,
            column_name: column.to_string(),
            value,
            step: candidate.step,
        }))
    }
}
