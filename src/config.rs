use crate::error::{FormFillError, Result};
use form_fill_common::{SimilarityKind, Vocabulary, DEFAULT_SIMILARITY_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 照合の採用閾値（0.0〜1.0）
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f64,
    #[serde(default)]
    pub strategy: SimilarityKind,
    /// 既定のシート名（未指定なら先頭シート）
    #[serde(default)]
    pub default_sheet: Option<String>,
    /// 組み込み語彙への追加分
    #[serde(default)]
    pub vocabulary: Vocabulary,
}

fn default_threshold() -> f64 {
    DEFAULT_SIMILARITY_THRESHOLD
}

impl Default for Config {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            strategy: SimilarityKind::default(),
            default_sheet: None,
            vocabulary: Vocabulary::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| FormFillError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("form-fill").join("config.json"))
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(FormFillError::Config(format!(
                "閾値は0.0〜1.0で指定してください: {}",
                self.similarity_threshold
            )));
        }
        Ok(())
    }

    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        self.similarity_threshold = threshold;
        self.validate()?;
        self.save()
    }

    pub fn set_strategy(&mut self, strategy: SimilarityKind) -> Result<()> {
        self.strategy = strategy;
        self.save()
    }

    /// 組み込み語彙に設定の追加語彙を重ねたもの
    pub fn effective_vocabulary(&self) -> Vocabulary {
        Vocabulary::builtin_with(&self.vocabulary)
    }
}
