//! Form Fill Common Library
//!
//! 様式（スプレッドシート）の項目自動検出・データ列との照合・転記先探索の中核。
//! ファイル入出力はCLI側で行い、ここでは読み込み済みのモデルのみを扱う。

pub mod model;
pub mod table;
pub mod text;
pub mod similarity;
pub mod classifier;
pub mod scanner;
pub mod mapper;
pub mod resolver;
pub mod filler;
pub mod diagnostics;
pub mod error;

pub use model::{has_time_of_day, CellValue, Coordinate, MergedRegion, Spreadsheet};
pub use table::DataTable;
pub use similarity::{BasicTextSimilarity, EnhancedTextSimilarity, SimilarityKind, SimilarityStrategy};
pub use classifier::{CellCategory, CellClassifier, Vocabulary};
pub use scanner::{CellRecord, FieldRegistry, TemplateScanner};
pub use mapper::{FieldMapper, MappingResult, DEFAULT_SIMILARITY_THRESHOLD};
pub use resolver::{search_order, Candidate, SearchStep, TargetCellResolver};
pub use filler::{FieldWrite, FillOutcome, TemplateFiller};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{Error, Result};
