use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormFillError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("テンプレートを読み込めません: {0}")]
    TemplateLoad(String),

    #[error("データファイルを読み込めません: {0}")]
    DataLoad(String),

    #[error("Excel生成エラー: {0}")]
    ExcelWrite(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] form_fill_common::Error),
}

pub type Result<T> = std::result::Result<T, FormFillError>;
