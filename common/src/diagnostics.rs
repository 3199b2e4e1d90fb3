//! 診断情報
//!
//! 処理を止めない（セル・項目単位の）失敗を集めて表示側に渡す。
//! 追加時に `tracing` の警告としても出力する。

use crate::error::Error;
use crate::model::Coordinate;
use serde::Serialize;

/// 回復可能な失敗の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// セルの分類・結合解決に失敗（レジストリから除外）
    CellProcessing,
    /// 類似度計算・照合に失敗（項目は未対応扱い）
    Mapping,
    /// 転記先探索・書き込みに失敗（項目はスキップ）
    ResolutionOrWrite,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::CellProcessing => write!(f, "cell"),
            DiagnosticKind::Mapping => write!(f, "mapping"),
            DiagnosticKind::ResolutionOrWrite => write!(f, "fill"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub coordinate: Option<Coordinate>,
    pub message: String,
}

/// 1回の処理で集めた診断のリスト
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: DiagnosticKind, coordinate: Option<Coordinate>, message: String) {
        match coordinate {
            Some(c) => tracing::warn!(%kind, coordinate = %c, "{}", message),
            None => tracing::warn!(%kind, "{}", message),
        }
        self.entries.push(Diagnostic {
            kind,
            coordinate,
            message,
        });
    }

    /// エラーを診断として記録
    pub fn record(&mut self, kind: DiagnosticKind, error: &Error) {
        let coordinate = match error {
            Error::CellProcessing { coordinate, .. }
            | Error::Mapping { coordinate, .. }
            | Error::Resolution { coordinate, .. } => Some(*coordinate),
            Error::InteriorWrite(c) => Some(*c),
            _ => None,
        };
        self.push(kind, coordinate, error.to_string());
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_extracts_coordinate() {
        let mut diagnostics = Diagnostics::new();
        let error = Error::CellProcessing {
            coordinate: Coordinate::new(2, 1),
            reason: "bad".into(),
        };
        diagnostics.record(DiagnosticKind::CellProcessing, &error);
        diagnostics.record(DiagnosticKind::Mapping, &Error::Config("x".into()));

        let entries: Vec<_> = diagnostics.iter().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].coordinate, Some(Coordinate::new(2, 1)));
        assert_eq!(entries[0].message, "Cell A2: bad");
        assert_eq!(entries[1].coordinate, None);
    }
}
