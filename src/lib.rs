//! form-fill
//!
//! Excel様式のラベルを検出し、表データの列と照合して値を転記する。
//! 判定ロジックは `form-fill-common`、ファイル入出力とCLIはこのクレートが受け持つ。

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod loader;
pub mod report;
pub mod session;

pub use form_fill_common as common;
