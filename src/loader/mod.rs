//! ファイル読み込み
//!
//! テンプレート（xlsx）と転記元データ（CSV / Excel）をモデルに変換する。

pub mod template;
pub mod data;

pub use data::load_data_table;
pub use template::{cell_value, load_template};
