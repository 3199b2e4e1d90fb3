//! スプレッドシートモデル
//!
//! セル座標・セル値・結合セル範囲と、それらを保持する `Spreadsheet`。
//! 結合セルの索引は範囲追加時に一度だけ構築し、座標からの参照は O(1)。

use crate::error::{Error, Result};
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// セル座標（行・列とも1始まり）
///
/// 順序は行優先（row → column）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Coordinate {
    pub row: u32,
    pub column: u32,
}

impl Coordinate {
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// 行・列オフセットを適用（1未満になる場合はNone）
    pub fn offset(&self, d_row: i64, d_col: i64) -> Option<Self> {
        let row = i64::from(self.row) + d_row;
        let column = i64::from(self.column) + d_col;
        if row < 1 || column < 1 || row > i64::from(u32::MAX) || column > i64::from(u32::MAX) {
            return None;
        }
        Some(Self::new(row as u32, column as u32))
    }
}

/// 列番号をA1形式の列文字に変換（1 → "A", 27 → "AA"）
pub fn column_letters(column: u32) -> String {
    let mut n = column;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.column), self.row)
    }
}

impl FromStr for Coordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().replace('$', "");
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| Error::InvalidCoordinate(s.clone()))?;
        let (letters, digits) = s.split_at(split);

        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::InvalidCoordinate(s.clone()));
        }

        let mut column: u32 = 0;
        for c in letters.chars() {
            let value = (c.to_ascii_uppercase() as u8 - b'A' + 1) as u32;
            column = column
                .checked_mul(26)
                .and_then(|v| v.checked_add(value))
                .ok_or_else(|| Error::InvalidCoordinate(s.clone()))?;
        }

        let row: u32 = digits
            .parse()
            .map_err(|_| Error::InvalidCoordinate(s.clone()))?;
        if row == 0 {
            return Err(Error::InvalidCoordinate(s.clone()));
        }

        Ok(Self::new(row, column))
    }
}

impl From<Coordinate> for String {
    fn from(c: Coordinate) -> Self {
        c.to_string()
    }
}

impl TryFrom<String> for Coordinate {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// セル値（スカラー）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// 日付・日時（表示は `2024-05-12` または `2024-05-12 09:30:00`）
    DateTime(NaiveDateTime),
    /// `#REF!` などのエラー値
    Error(String),
}

impl CellValue {
    /// 空セル（空白のみの文字列を含む）か
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 分類用テキスト（空ならNone）
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Bool(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::DateTime(dt) if has_time_of_day(dt) => {
                write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
            }
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d")),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}

/// 時刻部分を持つか（0時ちょうどは日付のみ扱い）
pub fn has_time_of_day(dt: &NaiveDateTime) -> bool {
    dt.num_seconds_from_midnight() != 0 || dt.nanosecond() != 0
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

/// 結合セル範囲
///
/// 左上（アンカー）のみ書き込み可能。それ以外は内部セル（読み取り専用）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergedRegion {
    pub min_row: u32,
    pub min_col: u32,
    pub max_row: u32,
    pub max_col: u32,
}

impl MergedRegion {
    /// 範囲を作成（角の順序は正規化する）
    pub fn new(row_a: u32, col_a: u32, row_b: u32, col_b: u32) -> Self {
        Self {
            min_row: row_a.min(row_b),
            min_col: col_a.min(col_b),
            max_row: row_a.max(row_b),
            max_col: col_a.max(col_b),
        }
    }

    pub fn anchor(&self) -> Coordinate {
        Coordinate::new(self.min_row, self.min_col)
    }

    pub fn contains(&self, c: Coordinate) -> bool {
        (self.min_row..=self.max_row).contains(&c.row)
            && (self.min_col..=self.max_col).contains(&c.column)
    }

    /// アンカー以外の範囲内座標か
    pub fn is_interior(&self, c: Coordinate) -> bool {
        self.contains(c) && c != self.anchor()
    }

    /// 1×1（実質的に結合されていない）範囲か
    pub fn is_single_cell(&self) -> bool {
        self.min_row == self.max_row && self.min_col == self.max_col
    }

    /// 範囲内の座標を行優先で列挙
    pub fn cells(&self) -> impl Iterator<Item = Coordinate> {
        let (min_col, max_col) = (self.min_col, self.max_col);
        (self.min_row..=self.max_row)
            .flat_map(move |row| (min_col..=max_col).map(move |column| Coordinate::new(row, column)))
    }
}

impl fmt::Display for MergedRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.anchor(),
            Coordinate::new(self.max_row, self.max_col)
        )
    }
}

impl FromStr for MergedRegion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidCoordinate(s.to_string()))?;
        let start: Coordinate = start.parse()?;
        let end: Coordinate = end.parse()?;
        Ok(Self::new(start.row, start.column, end.row, end.column))
    }
}

/// ワークシート1枚分のモデル
///
/// `Clone` は完全に独立したコピーを返す（バッチ転記の行分離に使う）。
#[derive(Debug, Clone, Default)]
pub struct Spreadsheet {
    name: String,
    cells: BTreeMap<Coordinate, CellValue>,
    merged: Vec<MergedRegion>,
    /// 座標 → merged のインデックス
    merge_index: HashMap<Coordinate, usize>,
}

impl Spreadsheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 値を設定（構築用。結合セルの検査は行わない）
    pub fn set_value(&mut self, c: Coordinate, value: CellValue) {
        if matches!(value, CellValue::Empty) {
            self.cells.remove(&c);
        } else {
            self.cells.insert(c, value);
        }
    }

    /// 結合範囲を追加
    ///
    /// 既存範囲と重なる場合はエラー（1座標は高々1つの範囲に属する）。
    pub fn add_merge(&mut self, region: MergedRegion) -> Result<()> {
        if let Some(existing) = region
            .cells()
            .find_map(|c| self.merge_index.get(&c).map(|&i| self.merged[i]))
        {
            return Err(Error::MergeOverlap {
                new: region.to_string(),
                existing: existing.to_string(),
            });
        }

        let idx = self.merged.len();
        for c in region.cells() {
            self.merge_index.insert(c, idx);
        }
        self.merged.push(region);
        Ok(())
    }

    pub fn value(&self, c: Coordinate) -> Option<&CellValue> {
        self.cells.get(&c)
    }

    /// 空でないセルを行優先で列挙
    pub fn populated_cells(&self) -> impl Iterator<Item = (Coordinate, &CellValue)> {
        self.cells
            .iter()
            .filter(|(_, v)| !matches!(v, CellValue::Empty))
            .map(|(c, v)| (*c, v))
    }

    pub fn merged_regions(&self) -> &[MergedRegion] {
        &self.merged
    }

    /// 座標が属する結合範囲
    pub fn region_of(&self, c: Coordinate) -> Option<&MergedRegion> {
        self.merge_index.get(&c).map(|&i| &self.merged[i])
    }

    /// アンカー以外の結合セルか
    pub fn is_interior(&self, c: Coordinate) -> bool {
        self.region_of(c).is_some_and(|r| r.is_interior(c))
    }

    /// 値を書き込む（結合内部セルへの書き込みは拒否）
    pub fn write(&mut self, c: Coordinate, value: CellValue) -> Result<()> {
        if self.is_interior(c) {
            return Err(Error::InteriorWrite(c));
        }
        self.set_value(c, value);
        Ok(())
    }

    /// 使用範囲の最大行・最大列（空シートは (0, 0)）
    pub fn dimensions(&self) -> (u32, u32) {
        let cells = self.cells.keys().copied();
        let merges = self
            .merged
            .iter()
            .map(|r| Coordinate::new(r.max_row, r.max_col));
        cells
            .chain(merges)
            .fold((0, 0), |(r, c), k| (r.max(k.row), c.max(k.column)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(s: &str) -> Coordinate {
        s.parse().unwrap()
    }

    #[test]
    fn test_coordinate_parse_and_display() {
        assert_eq!(coord("B5"), Coordinate::new(5, 2));
        assert_eq!(coord("aa10"), Coordinate::new(10, 27));
        assert_eq!(coord("$C$3"), Coordinate::new(3, 3));
        assert_eq!(Coordinate::new(10, 27).to_string(), "AA10");
        assert_eq!(Coordinate::new(1, 702).to_string(), "ZZ1");
        assert_eq!(Coordinate::new(1, 703).to_string(), "AAA1");
    }

    #[test]
    fn test_coordinate_parse_invalid() {
        assert!("".parse::<Coordinate>().is_err());
        assert!("12".parse::<Coordinate>().is_err());
        assert!("B".parse::<Coordinate>().is_err());
        assert!("B0".parse::<Coordinate>().is_err());
        assert!("B-1".parse::<Coordinate>().is_err());
    }

    #[test]
    fn test_coordinate_offset() {
        let c = coord("A1");
        assert_eq!(c.offset(0, -1), None);
        assert_eq!(c.offset(2, 1), Some(coord("B3")));
    }

    #[test]
    fn test_coordinate_row_major_order() {
        let mut cs = vec![coord("B2"), coord("A3"), coord("C1"), coord("A2")];
        cs.sort();
        assert_eq!(cs, vec![coord("C1"), coord("A2"), coord("B2"), coord("A3")]);
    }

    #[test]
    fn test_cell_value_display() {
        assert_eq!(CellValue::Number(100.0).to_string(), "100");
        assert_eq!(CellValue::Number(123.45).to_string(), "123.45");
        assert_eq!(CellValue::Bool(true).to_string(), "TRUE");
        assert_eq!(CellValue::Empty.to_string(), "");
        assert!(CellValue::Text("   ".into()).is_empty());
        assert_eq!(CellValue::Empty.as_text(), None);
    }

    #[test]
    fn test_cell_value_datetime_display() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 5, 12).unwrap();
        let midnight = CellValue::DateTime(date.and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(midnight.to_string(), "2024-05-12");
        let morning = CellValue::DateTime(date.and_hms_opt(9, 30, 0).unwrap());
        assert_eq!(morning.to_string(), "2024-05-12 09:30:00");
        assert!(!midnight.is_empty());
    }

    #[test]
    fn test_merged_region_geometry() {
        let r: MergedRegion = "B5:D6".parse().unwrap();
        assert_eq!(r.anchor(), coord("B5"));
        assert!(r.contains(coord("D6")));
        assert!(!r.contains(coord("E6")));
        assert!(r.is_interior(coord("C5")));
        assert!(!r.is_interior(coord("B5")));
        assert_eq!(r.cells().count(), 6);
        assert_eq!(r.cells().nth(3), Some(coord("B6")));
        assert_eq!(r.to_string(), "B5:D6");
    }

    #[test]
    fn test_add_merge_rejects_overlap() {
        let mut sheet = Spreadsheet::new("Sheet1");
        sheet.add_merge("B5:D6".parse().unwrap()).unwrap();
        let err = sheet.add_merge("D6:E7".parse().unwrap()).unwrap_err();
        assert!(matches!(err, Error::MergeOverlap { .. }));
        assert!(sheet.add_merge("E5:F5".parse().unwrap()).is_ok());
        assert_eq!(sheet.merged_regions().len(), 2);
    }

    #[test]
    fn test_write_rejects_interior() {
        let mut sheet = Spreadsheet::new("Sheet1");
        sheet.add_merge("B5:D5".parse().unwrap()).unwrap();
        assert!(sheet.is_interior(coord("C5")));
        assert!(matches!(
            sheet.write(coord("C5"), "x".into()),
            Err(Error::InteriorWrite(_))
        ));
        sheet.write(coord("B5"), "x".into()).unwrap();
        assert_eq!(sheet.value(coord("B5")), Some(&CellValue::from("x")));
    }

    #[test]
    fn test_clone_is_independent() {
        let mut a = Spreadsheet::new("Sheet1");
        a.set_value(coord("A1"), "one".into());
        let mut b = a.clone();
        b.write(coord("A1"), "two".into()).unwrap();
        assert_eq!(a.value(coord("A1")), Some(&CellValue::from("one")));
    }

    #[test]
    fn test_dimensions() {
        let mut sheet = Spreadsheet::new("Sheet1");
        assert_eq!(sheet.dimensions(), (0, 0));
        sheet.set_value(coord("C2"), "x".into());
        sheet.add_merge("A4:B5".parse().unwrap()).unwrap();
        assert_eq!(sheet.dimensions(), (5, 3));
    }

    #[test]
    fn test_coordinate_serde_as_string() {
        let json = serde_json::to_string(&coord("B5")).unwrap();
        assert_eq!(json, "\"B5\"");
        let back: Coordinate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, coord("B5"));
    }
}
