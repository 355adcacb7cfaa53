//! Document vault built on top of StoragePort.
//!
//! Maps vault-relative document paths to storage keys:
//!   drafts/chapter-1.md → "vault:drafts/chapter-1.md"
//!
//! Folders are implicit: a folder is every key sharing its prefix.

use std::rc::Rc;
use async_trait::async_trait;
use scribe_core::ports::{DocumentReader, StoragePort};
use scribe_types::{
    Result, ScribeError,
    reference::is_markdown,
};

const VAULT_PREFIX: &str = "vault:";

pub struct StorageVault {
    storage: Rc<dyn StoragePort>,
}

impl StorageVault {
    pub fn new(storage: Rc<dyn StoragePort>) -> Self {
        Self { storage }
    }

    fn key_for_path(&self, path: &str) -> String {
        format!("{}{}", VAULT_PREFIX, normalize_path(path))
    }

    pub async fn write_document(&self, path: &str, text: &str) -> Result<()> {
        let normalized = normalize_path(path);
        if normalized.is_empty() {
            return Err(ScribeError::Document {
                path: path.to_string(),
                message: "Empty document path".to_string(),
            });
        }
        self.storage
            .set(&self.key_for_path(&normalized), text.as_bytes())
            .await
    }

    pub async fn delete_document(&self, path: &str) -> Result<()> {
        self.storage.delete(&self.key_for_path(path)).await
    }

    /// Every document path in the vault, sorted
    pub async fn list_documents(&self) -> Result<Vec<String>> {
        self.paths_with_prefix(VAULT_PREFIX).await
    }

    /// Markdown documents anywhere under `folder`, sorted. An empty folder
    /// (or `/`) means the whole vault.
    pub async fn markdown_under(&self, folder: &str) -> Result<Vec<String>> {
        let folder = normalize_path(folder);
        let prefix = if folder.is_empty() {
            VAULT_PREFIX.to_string()
        } else {
            format!("{}{}/", VAULT_PREFIX, folder)
        };
        let mut paths = self.paths_with_prefix(&prefix).await?;
        paths.retain(|p| is_markdown(p));
        Ok(paths)
    }

    async fn paths_with_prefix(&self, prefix: &str) -> Result<Vec<String>> {
        let mut paths: Vec<String> = self
            .storage
            .list_keys(prefix)
            .await?
            .into_iter()
            .filter_map(|key| key.strip_prefix(VAULT_PREFIX).map(str::to_string))
            .collect();
        paths.sort();
        Ok(paths)
    }
}

#[async_trait(?Send)]
impl DocumentReader for StorageVault {
    async fn read_document(&self, path: &str) -> Result<String> {
        let bytes = self
            .storage
            .get(&self.key_for_path(path))
            .await?
            .ok_or_else(|| ScribeError::Document {
                path: path.to_string(),
                message: "Document not found".to_string(),
            })?;
        String::from_utf8(bytes).map_err(|e| ScribeError::Document {
            path: path.to_string(),
            message: e.to_string(),
        })
    }
}

/// Vault-relative form: trimmed, no leading or trailing slash
fn normalize_path(path: &str) -> String {
    path.trim().trim_matches('/').to_string()
}
