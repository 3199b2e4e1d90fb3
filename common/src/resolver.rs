//! 転記先セルの探索
//!
//! ラベル位置から、結合セルを考慮して書き込み可能な空欄を探す。
//! 探索順は `search_order` が返す候補列で固定されており、単独でテストできる。
//!
//! 1. 同じ行の右方向 5セル
//! 2. 同じ列の下方向 3セル
//! 3. 近傍（行 -1〜+2 × 列 -1〜+5、行優先、ラベル自身を除く）
//! 4. ラベルが結合範囲内なら範囲内（行優先）→ 範囲の右端から 3列

use crate::classifier::{CellCategory, CellClassifier};
use crate::error::{Error, Result};
use crate::model::{Coordinate, MergedRegion, Spreadsheet};
use crate::scanner::CellRecord;
use serde::Serialize;

const RIGHT_RADIUS: i64 = 5;
const BELOW_RADIUS: i64 = 3;
const NEIGHBORHOOD_ROWS: (i64, i64) = (-1, 2);
const NEIGHBORHOOD_COLS: (i64, i64) = (-1, 5);
const BEYOND_MERGE_COLS: u32 = 3;

/// 候補を生成した探索段階
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStep {
    Right,
    Below,
    Neighborhood,
    InsideMerge,
    BeyondMerge,
}

impl std::fmt::Display for SearchStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchStep::Right => write!(f, "right"),
            SearchStep::Below => write!(f, "below"),
            SearchStep::Neighborhood => write!(f, "neighborhood"),
            SearchStep::InsideMerge => write!(f, "inside-merge"),
            SearchStep::BeyondMerge => write!(f, "beyond-merge"),
        }
    }
}

/// 探索候補
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub coordinate: Coordinate,
    pub step: SearchStep,
}

/// ラベル位置からの探索候補を優先順に列挙
pub fn search_order(
    label: Coordinate,
    region: Option<MergedRegion>,
) -> impl Iterator<Item = Candidate> {
    let at = move |step: SearchStep| move |c: Coordinate| Candidate { coordinate: c, step };

    let right = (1..=RIGHT_RADIUS)
        .filter_map(move |d| label.offset(0, d))
        .map(at(SearchStep::Right));

    let below = (1..=BELOW_RADIUS)
        .filter_map(move |d| label.offset(d, 0))
        .map(at(SearchStep::Below));

    let neighborhood = (NEIGHBORHOOD_ROWS.0..=NEIGHBORHOOD_ROWS.1)
        .flat_map(|dr| (NEIGHBORHOOD_COLS.0..=NEIGHBORHOOD_COLS.1).map(move |dc| (dr, dc)))
        .filter(|&offset| offset != (0, 0))
        .filter_map(move |(dr, dc)| label.offset(dr, dc))
        .map(at(SearchStep::Neighborhood));

    let inside = region
        .into_iter()
        .flat_map(|r| r.cells())
        .filter(move |&c| c != label)
        .map(at(SearchStep::InsideMerge));

    let beyond = region
        .into_iter()
        .flat_map(|r| {
            (r.min_row..=r.max_row).flat_map(move |row| {
                (1..=BEYOND_MERGE_COLS)
                    .filter_map(move |d| r.max_col.checked_add(d))
                    .map(move |column| Coordinate::new(row, column))
            })
        })
        .map(at(SearchStep::BeyondMerge));

    right.chain(below).chain(neighborhood).chain(inside).chain(beyond)
}

pub struct TargetCellResolver<'a> {
    classifier: &'a CellClassifier,
}

impl<'a> TargetCellResolver<'a> {
    pub fn new(classifier: &'a CellClassifier) -> Self {
        Self { classifier }
    }

    /// ラベルに対応する転記先を探す
    ///
    /// 見つからなければ `Ok(None)`。レジストリとシートの結合情報が一致しない場合はエラー。
    pub fn resolve(&self, label: &CellRecord, sheet: &Spreadsheet) -> Result<Option<Candidate>> {
        let region = sheet.region_of(label.coordinate).copied();
        if region != label.merged_region {
            return Err(Error::Resolution {
                coordinate: label.coordinate,
                reason: "registry does not match template merge layout".into(),
            });
        }

        let found = search_order(label.coordinate, region).find(|c| self.is_acceptable(sheet, c));
        match &found {
            Some(c) => tracing::debug!(
                label = %label.coordinate,
                target = %c.coordinate,
                step = %c.step,
                "target resolved"
            ),
            None => tracing::debug!(label = %label.coordinate, "no target cell"),
        }
        Ok(found)
    }

    /// 書き込み候補として受け入れ可能か
    ///
    /// 結合内部セルは不可（ただしラベル自身の結合範囲内の探索ではアンカーへ振り替えるため可）。
    /// 空欄または data_cell に分類されるセルのみ。
    fn is_acceptable(&self, sheet: &Spreadsheet, candidate: &Candidate) -> bool {
        let c = candidate.coordinate;
        if candidate.step != SearchStep::InsideMerge && sheet.is_interior(c) {
            return false;
        }

        match sheet.value(c) {
            None => true,
            Some(v) if v.is_empty() => true,
            Some(v) => self.classifier.classify(v.as_text().as_deref()) == CellCategory::DataCell,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostics;
    use crate::scanner::TemplateScanner;

    fn coord(s: &str) -> Coordinate {
        s.parse().unwrap()
    }

    fn label_record(sheet: &Spreadsheet, at: &str) -> CellRecord {
        let classifier = CellClassifier::builtin();
        let registry = TemplateScanner::new(&classifier).scan(sheet, &mut Diagnostics::new());
        registry.get(coord(at)).unwrap().clone()
    }

    fn resolve(sheet: &Spreadsheet, at: &str) -> Option<Candidate> {
        let classifier = CellClassifier::builtin();
        TargetCellResolver::new(&classifier)
            .resolve(&label_record(sheet, at), sheet)
            .unwrap()
    }

    /// ラベル以外を埋めて候補を潰す
    fn fill_around(sheet: &mut Spreadsheet, label: Coordinate, except: &[&str]) {
        for candidate in search_order(label, sheet.region_of(label).copied()) {
            let c = candidate.coordinate;
            if except.iter().any(|e| coord(e) == c) || sheet.is_interior(c) {
                continue;
            }
            sheet.set_value(c, "Vendor Information".into());
        }
    }

    #[test]
    fn test_search_order_without_merge() {
        let order: Vec<_> = search_order(coord("B5"), None).collect();
        let coords: Vec<String> = order.iter().map(|c| c.coordinate.to_string()).collect();

        assert_eq!(&coords[..5], &["C5", "D5", "E5", "F5", "G5"]);
        assert!(order[..5].iter().all(|c| c.step == SearchStep::Right));
        assert_eq!(&coords[5..8], &["B6", "B7", "B8"]);
        // 近傍: 4行 × 7列 - ラベル自身
        assert_eq!(order.len(), 5 + 3 + 27);
        assert_eq!(coords[8], "A4");
        assert_eq!(coords[8 + 7], "A5");
        assert_eq!(coords[8 + 8], "C5");
        assert_eq!(coords.last().map(String::as_str), Some("G7"));
    }

    #[test]
    fn test_search_order_clipped_at_sheet_edge() {
        let coords: Vec<String> = search_order(coord("A1"), None)
            .filter(|c| c.step == SearchStep::Neighborhood)
            .map(|c| c.coordinate.to_string())
            .collect();
        assert_eq!(coords.len(), 3 * 6 - 1);
        assert_eq!(coords[0], "B1");
    }

    #[test]
    fn test_search_order_with_merge() {
        let region: MergedRegion = "B5:C6".parse().unwrap();
        let tail: Vec<Candidate> = search_order(coord("B5"), Some(region))
            .filter(|c| matches!(c.step, SearchStep::InsideMerge | SearchStep::BeyondMerge))
            .collect();
        let coords: Vec<String> = tail.iter().map(|c| c.coordinate.to_string()).collect();
        assert_eq!(coords, vec!["C5", "B6", "C6", "D5", "E5", "F5", "D6", "E6", "F6"]);
        assert_eq!(tail[2].step, SearchStep::InsideMerge);
        assert_eq!(tail[3].step, SearchStep::BeyondMerge);
    }

    #[test]
    fn test_value_right_of_label() {
        let mut sheet = Spreadsheet::new("Sheet1");
        sheet.set_value(coord("B5"), "Part No.".into());
        let found = resolve(&sheet, "B5").unwrap();
        assert_eq!(found.coordinate, coord("C5"));
        assert_eq!(found.step, SearchStep::Right);
    }

    #[test]
    fn test_placeholder_accepted_labels_skipped() {
        let mut sheet = Spreadsheet::new("Sheet1");
        sheet.set_value(coord("B5"), "Part No.".into());
        sheet.set_value(coord("C5"), "Vendor Code:".into());
        sheet.set_value(coord("D5"), "______".into());
        assert_eq!(resolve(&sheet, "B5").unwrap().coordinate, coord("D5"));
    }

    #[test]
    fn test_skips_interior_merged_cells() {
        let mut sheet = Spreadsheet::new("Sheet1");
        sheet.set_value(coord("B5"), "Part No.".into());
        sheet.set_value(coord("C5"), "Vendor Code:".into());
        sheet.add_merge("C5:E5".parse().unwrap()).unwrap();
        // D5, E5 は内部セル → F5
        assert_eq!(resolve(&sheet, "B5").unwrap().coordinate, coord("F5"));
    }

    #[test]
    fn test_falls_back_to_below() {
        let mut sheet = Spreadsheet::new("Sheet1");
        sheet.set_value(coord("B5"), "Part No.".into());
        for col in ["C5", "D5", "E5", "F5", "G5"] {
            sheet.set_value(coord(col), "Vendor Information".into());
        }
        let found = resolve(&sheet, "B5").unwrap();
        assert_eq!(found.coordinate, coord("B6"));
        assert_eq!(found.step, SearchStep::Below);
    }

    #[test]
    fn test_falls_back_to_neighborhood() {
        let mut sheet = Spreadsheet::new("Sheet1");
        sheet.set_value(coord("B5"), "Part No.".into());
        fill_around(&mut sheet, coord("B5"), &["A6"]);
        let found = resolve(&sheet, "B5").unwrap();
        assert_eq!(found.coordinate, coord("A6"));
        assert_eq!(found.step, SearchStep::Neighborhood);
    }

    #[test]
    fn test_inside_merge_when_nothing_else() {
        let mut sheet = Spreadsheet::new("Sheet1");
        sheet.set_value(coord("B5"), "Part No.".into());
        sheet.add_merge("B5:C6".parse().unwrap()).unwrap();
        fill_around(&mut sheet, coord("B5"), &[]);

        let found = resolve(&sheet, "B5").unwrap();
        assert_eq!(found.coordinate, coord("C5"));
        assert_eq!(found.step, SearchStep::InsideMerge);
    }

    #[test]
    fn test_beyond_merge_skips_other_merge_interior() {
        let mut sheet = Spreadsheet::new("Sheet1");
        sheet.set_value(coord("B5"), "Part No.".into());
        sheet.add_merge("B5:I5".parse().unwrap()).unwrap();
        // J5 は別の結合 J4:J5 の内部セル
        sheet.add_merge("J4:J5".parse().unwrap()).unwrap();
        for col in ["C5", "D5", "E5", "F5", "G5", "H5", "I5"] {
            sheet.set_value(coord(col), "Vendor Information".into());
        }
        fill_around(&mut sheet, coord("B5"), &["K5"]);

        let found = resolve(&sheet, "B5").unwrap();
        assert_eq!(found.coordinate, coord("K5"));
        assert_eq!(found.step, SearchStep::BeyondMerge);
    }

    #[test]
    fn test_none_when_everything_occupied() {
        let mut sheet = Spreadsheet::new("Sheet1");
        sheet.set_value(coord("B5"), "Part No.".into());
        fill_around(&mut sheet, coord("B5"), &[]);
        assert_eq!(resolve(&sheet, "B5"), None);
    }

    #[test]
    fn test_stale_registry_is_error() {
        let mut sheet = Spreadsheet::new("Sheet1");
        sheet.set_value(coord("B5"), "Part No.".into());
        let record = label_record(&sheet, "B5");
        sheet.add_merge("B5:C5".parse().unwrap()).unwrap();

        let classifier = CellClassifier::builtin();
        let err = TargetCellResolver::new(&classifier)
            .resolve(&record, &sheet)
            .unwrap_err();
        assert!(matches!(err, Error::Resolution { .. }));
    }
}
