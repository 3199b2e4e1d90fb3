//! 走査結果キャッシュモジュール
//!
//! テンプレートのSHA-256・シート名・語彙をキーにして FieldRegistry をキャッシュし、
//! 同じテンプレートの再走査をスキップする。

use crate::error::Result;
use form_fill_common::{FieldRegistry, Vocabulary};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

const CACHE_FILE_NAME: &str = ".form-fill-cache.json";

/// キャッシュファイルの構造
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryCache {
    /// バージョン（互換性チェック用）
    version: u32,
    /// キー → 走査結果のマップ
    entries: HashMap<String, CacheEntry>,
}

/// キャッシュエントリ
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub template_name: String,
    pub sheet_name: String,
    pub registry: FieldRegistry,
}

impl RegistryCache {
    const CURRENT_VERSION: u32 = 2;

    /// キャッシュファイルのパス
    pub fn cache_path(folder: &Path) -> PathBuf {
        folder.join(CACHE_FILE_NAME)
    }

    /// キャッシュファイルを読み込み（無い・壊れている場合は空）
    pub fn load(folder: &Path) -> Self {
        let cache_path = Self::cache_path(folder);
        if !cache_path.exists() {
            return Self::default();
        }

        let file = match File::open(&cache_path) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(path = %cache_path.display(), error = %e, "cache unreadable");
                return Self::default();
            }
        };

        match serde_json::from_reader::<_, RegistryCache>(BufReader::new(file)) {
            Ok(cache) if cache.version == Self::CURRENT_VERSION => cache,
            Ok(cache) => {
                tracing::info!(
                    found = cache.version,
                    expected = Self::CURRENT_VERSION,
                    "cache version mismatch, discarding"
                );
                Self::default()
            }
            Err(e) => {
                tracing::warn!(path = %cache_path.display(), error = %e, "cache corrupt, discarding");
                Self::default()
            }
        }
    }

    /// キャッシュファイルを保存
    pub fn save(&self, folder: &Path) -> Result<()> {
        let file = File::create(Self::cache_path(folder))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// キャッシュファイルを削除（存在しなければ false）
    pub fn clear(folder: &Path) -> Result<bool> {
        let cache_path = Self::cache_path(folder);
        if cache_path.exists() {
            std::fs::remove_file(cache_path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldRegistry> {
        self.entries.get(key).map(|e| &e.registry)
    }

    /// キャッシュに追加（既存のエントリは置き換えない）
    pub fn insert(&mut self, key: String, entry: CacheEntry) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, entry);
        true
    }

    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RegistryCache {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entries: HashMap::new(),
        }
    }
}

/// テンプレートファイルのハッシュ（SHA-256, hex）
pub fn compute_file_hash(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// キャッシュキー（ファイルハッシュ + シート名 + 語彙）
pub fn cache_key(file_hash: &str, sheet_name: &str, vocabulary: &Vocabulary) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(file_hash.as_bytes());
    hasher.update([0u8]);
    hasher.update(sheet_name.as_bytes());
    hasher.update([0u8]);
    hasher.update(serde_json::to_vec(vocabulary)?);
    Ok(hex::encode(hasher.finalize()))
}
