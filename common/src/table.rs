//! 転記元データテーブル
//!
//! 列名（一意・順序付き）と行の列。1行 = 1件の転記レコード。

use crate::error::{Error, Result};
use crate::model::CellValue;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl DataTable {
    /// 列名からテーブルを作成
    ///
    /// 列名は前後の空白を除去する。除去後に重複する場合はエラー。
    pub fn new<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for column in columns {
            let name = column.as_ref().trim().to_string();
            if !seen.insert(name.clone()) {
                return Err(Error::DuplicateColumn(name));
            }
            names.push(name);
        }

        Ok(Self {
            columns: names,
            rows: Vec::new(),
        })
    }

    /// 行を追加（列数に合わせて切り詰め・空値で補完）
    pub fn push_row(&mut self, mut values: Vec<CellValue>) {
        values.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(values);
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 指定行・列の値
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// 転記用の文字列（欠損・空値は空文字列）
    pub fn display_value(&self, row: usize, column: &str) -> String {
        self.value(row, column)
            .map(|v| v.to_string())
            .unwrap_or_default()
    }
}
