//! エラー型定義

use crate::model::Coordinate;
use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Merged region {new} overlaps {existing}")]
    MergeOverlap { new: String, existing: String },

    #[error("Cannot write to merged interior cell {0}")]
    InteriorWrite(Coordinate),

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Row {row} out of range (table has {rows} rows)")]
    RowOutOfRange { row: usize, rows: usize },

    #[error("Vocabulary error: {0}")]
    Vocabulary(#[from] regex::Error),

    #[error("Cell {coordinate}: {reason}")]
    CellProcessing { coordinate: Coordinate, reason: String },

    #[error("Mapping for {coordinate}: {reason}")]
    Mapping { coordinate: Coordinate, reason: String },

    #[error("Resolution for {coordinate}: {reason}")]
    Resolution { coordinate: Coordinate, reason: String },
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
