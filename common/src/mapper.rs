//! 項目ラベル → データ列の照合
//!
//! 項目ごとに独立した貪欲照合。全列との類似度の最大値を取り、閾値以上なら採用。
//! 異なるラベルが同じ列に対応することは許容する（「日付」欄が2箇所ある様式など）。
//! 同点の場合はテーブルの列順で先に現れた列を採用する。

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{Error, Result};
use crate::model::Coordinate;
use crate::scanner::{CellRecord, FieldRegistry};
use crate::similarity::SimilarityStrategy;
use crate::table::DataTable;
use serde::{Deserialize, Serialize};

/// 既定の類似度閾値
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.3;

/// 照合結果（field_header 1件につき1つ）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingResult {
    pub field_coordinate: Coordinate,
    pub template_label_text: String,
    /// 最高スコアの列（閾値未満でも確認用に保持）
    pub matched_column_name: Option<String>,
    pub similarity_score: f64,
    pub is_mappable: bool,
}

impl MappingResult {
    fn unmapped(record: &CellRecord) -> Self {
        Self {
            field_coordinate: record.coordinate,
            template_label_text: record.text(),
            matched_column_name: None,
            similarity_score: 0.0,
            is_mappable: false,
        }
    }
}

pub struct FieldMapper<'a> {
    strategy: &'a dyn SimilarityStrategy,
    threshold: f64,
}

impl<'a> FieldMapper<'a> {
    pub fn new(strategy: &'a dyn SimilarityStrategy, threshold: f64) -> Self {
        Self {
            strategy,
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// レジストリの全項目ラベルを照合
    pub fn map(
        &self,
        registry: &FieldRegistry,
        table: &DataTable,
        diagnostics: &mut Diagnostics,
    ) -> Vec<MappingResult> {
        registry
            .fields()
            .map(|record| {
                self.map_field(record, table).unwrap_or_else(|e| {
                    diagnostics.record(DiagnosticKind::Mapping, &e);
                    MappingResult::unmapped(record)
                })
            })
            .collect()
    }

    fn map_field(&self, record: &CellRecord, table: &DataTable) -> Result<MappingResult> {
        let label = record.text();
        let mut best: Option<(&str, f64)> = None;

        for column in table.column_names() {
            let score = self.strategy.score(&label, column);
            if !score.is_finite() || !(0.0..=1.0).contains(&score) {
                return Err(Error::Mapping {
                    coordinate: record.coordinate,
                    reason: format!(
                        "{} returned invalid score {} for column '{}'",
                        self.strategy.name(),
                        score,
                        column
                    ),
                });
            }
            // 同点は先の列を優先
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((column.as_str(), score));
            }
        }

        let (matched, score) = match best {
            Some((column, score)) => (Some(column.to_string()), score),
            None => (None, 0.0),
        };
        let is_mappable = matched.is_some() && score >= self.threshold;

        tracing::debug!(
            field = %record.coordinate,
            label = %label,
            column = matched.as_deref().unwrap_or("-"),
            score,
            is_mappable,
            "field mapped"
        );

        Ok(MappingResult {
            field_coordinate: record.coordinate,
            template_label_text: label,
            matched_column_name: matched,
            similarity_score: score,
            is_mappable,
        })
    }
}
