use clap::{Parser, Subcommand};
use form_fill_common::SimilarityKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "form-fill")]
#[command(about = "様式（Excel）の項目を検出してデータを自動転記するツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 照合の採用閾値（0.0-1.0、省略時は設定値）
    #[arg(long, global = true)]
    pub threshold: Option<f64>,

    /// 類似度戦略 (basic/enhanced)
    #[arg(long, global = true)]
    pub strategy: Option<SimilarityKind>,

    /// テンプレートのシート名（省略時は設定値または先頭シート）
    #[arg(long, global = true)]
    pub sheet: Option<String>,

    /// 走査結果キャッシュを使わない
    #[arg(long, global = true)]
    pub no_cache: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// テンプレートを走査してセル分類を表示
    Scan {
        /// テンプレート（xlsx）
        #[arg(required = true)]
        template: PathBuf,

        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// 項目ラベルとデータ列の対応を表示
    Map {
        /// テンプレート（xlsx）
        #[arg(required = true)]
        template: PathBuf,

        /// データファイル（csv/tsv/xlsx/xls/ods）
        #[arg(required = true)]
        data: PathBuf,

        /// データファイルのシート名
        #[arg(long)]
        data_sheet: Option<String>,

        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// データの1行をテンプレートに転記
    Fill {
        /// テンプレート（xlsx）
        #[arg(required = true)]
        template: PathBuf,

        /// データファイル（csv/tsv/xlsx/xls/ods）
        #[arg(required = true)]
        data: PathBuf,

        /// 転記する行番号（0始まり）
        #[arg(short, long, default_value = "0")]
        row: usize,

        /// 出力ファイル/ディレクトリ（省略時はテンプレートと同じフォルダ）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// データファイルのシート名
        #[arg(long)]
        data_sheet: Option<String>,

        /// 転記結果をJSONで保存
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// データの全行をそれぞれ別ファイルに転記
    Batch {
        /// テンプレート（xlsx）
        #[arg(required = true)]
        template: PathBuf,

        /// データファイル（csv/tsv/xlsx/xls/ods）
        #[arg(required = true)]
        data: PathBuf,

        /// 出力ディレクトリ（省略時はテンプレートと同じフォルダ）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// データファイルのシート名
        #[arg(long)]
        data_sheet: Option<String>,
    },

    /// 設定を表示/編集
    Config {
        /// 採用閾値を設定
        #[arg(long)]
        set_threshold: Option<f64>,

        /// 類似度戦略を設定 (basic/enhanced)
        #[arg(long)]
        set_strategy: Option<SimilarityKind>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },

    /// キャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// 対象フォルダ（省略時はカレント）
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fill_with_globals() {
        let cli = Cli::parse_from([
            "form-fill",
            "fill",
            "form.xlsx",
            "data.csv",
            "--row",
            "2",
            "--strategy",
            "basic",
            "--threshold",
            "0.4",
        ]);
        assert_eq!(cli.strategy, Some(SimilarityKind::Basic));
        assert_eq!(cli.threshold, Some(0.4));
        match cli.command {
            Commands::Fill { row, template, .. } => {
                assert_eq!(row, 2);
                assert_eq!(template, PathBuf::from("form.xlsx"));
            }
            _ => panic!("expected fill"),
        }
    }

    #[test]
    fn test_rejects_unknown_strategy() {
        let result = Cli::try_parse_from(["form-fill", "scan", "form.xlsx", "--strategy", "fuzzy"]);
        assert!(result.is_err());
    }
}
