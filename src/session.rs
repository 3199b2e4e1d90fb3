//! 1回の実行で共有する処理環境
//!
//! 設定から分類器・類似度戦略・閾値を組み立て、テンプレートの読み込みと
//! 走査（キャッシュ利用）をまとめる。

use crate::cache::{cache_key, compute_file_hash, CacheEntry, RegistryCache};
use crate::config::Config;
use crate::error::Result;
use crate::loader;
use form_fill_common::{
    CellClassifier, Diagnostics, FieldRegistry, SimilarityStrategy, Spreadsheet, TemplateFiller,
    TemplateScanner,
};
use std::path::Path;

/// 読み込み・走査済みのテンプレート
#[derive(Debug, Clone)]
pub struct LoadedTemplate {
    pub spreadsheet: Spreadsheet,
    pub registry: FieldRegistry,
    pub diagnostics: Diagnostics,
    pub from_cache: bool,
}

pub struct Session {
    classifier: CellClassifier,
    strategy: Box<dyn SimilarityStrategy>,
    threshold: f64,
    use_cache: bool,
}

impl Session {
    pub fn new(config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: CellClassifier::new(config.effective_vocabulary())?,
            strategy: config.strategy.strategy(),
            threshold: config.similarity_threshold,
            use_cache: true,
        })
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn filler(&self) -> TemplateFiller<'_> {
        TemplateFiller::new(&self.classifier, self.strategy.as_ref(), self.threshold)
    }

    /// テンプレートを読み込んで走査する
    ///
    /// キャッシュ有効時はテンプレートと同じフォルダのキャッシュを参照し、
    /// 診断なしで走査できた結果のみ保存する。
    pub fn open_template(&self, path: &Path, sheet: Option<&str>) -> Result<LoadedTemplate> {
        let spreadsheet = loader::load_template(path, sheet)?;

        if !self.use_cache {
            return Ok(self.scan(spreadsheet));
        }

        let folder = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let key = cache_key(
            &compute_file_hash(path)?,
            spreadsheet.name(),
            self.classifier.vocabulary(),
        )?;

        let mut cache = RegistryCache::load(folder);
        if let Some(registry) = cache.get(&key) {
            tracing::debug!(fields = registry.len(), "registry loaded from cache");
            return Ok(LoadedTemplate {
                spreadsheet,
                registry: registry.clone(),
                diagnostics: Diagnostics::new(),
                from_cache: true,
            });
        }

        let loaded = self.scan(spreadsheet);
        if loaded.diagnostics.is_empty() {
            let entry = CacheEntry {
                template_name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
                sheet_name: loaded.spreadsheet.name().to_string(),
                registry: loaded.registry.clone(),
            };
            cache.insert(key, entry);
            if let Err(e) = cache.save(folder) {
                tracing::warn!(error = %e, "failed to save registry cache");
            }
        }
        Ok(loaded)
    }

    fn scan(&self, spreadsheet: Spreadsheet) -> LoadedTemplate {
        let mut diagnostics = Diagnostics::new();
        let registry = TemplateScanner::new(&self.classifier).scan(&spreadsheet, &mut diagnostics);
        LoadedTemplate {
            spreadsheet,
            registry,
            diagnostics,
            from_cache: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use form_fill_common::SimilarityKind;

    #[test]
    fn test_session_from_config() {
        let config = Config {
            similarity_threshold: 0.5,
            strategy: SimilarityKind::Basic,
            ..Default::default()
        };
        let session = Session::new(&config).unwrap();
        assert_eq!(session.threshold(), 0.5);
        assert_eq!(session.strategy_name(), "basic");
    }

    #[test]
    fn test_session_rejects_invalid_threshold() {
        let config = Config {
            similarity_threshold: -0.1,
            ..Default::default()
        };
        assert!(Session::new(&config).is_err());
    }
}
