//! Icon store methods on IconService.
//!
//! Store operations touch the filesystem synchronously, so they run on the
//! blocking pool.

use std::path::PathBuf;

use crate::error::{IconError, Result};
use crate::icons::{decode_base64, IconStore};
use crate::IconService;

impl IconService {
    async fn with_store<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&IconStore) -> Result<T> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| IconError::Other(format!("Icon store task failed: {}", e)))?
    }

    // ========================================
    // Persistence
    // ========================================

    /// Commit a chosen payload. Returns the stored file name.
    pub async fn persist_icon(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        target_url: &str,
    ) -> Result<String> {
        let mime_type = mime_type.to_string();
        let target_url = target_url.to_string();
        self.with_store(move |store| store.persist(&bytes, &mime_type, &target_url))
            .await
    }

    /// Commit a base64 payload as sent by the frontend.
    pub async fn persist_base64(
        &self,
        data: &str,
        mime_type: &str,
        target_url: &str,
    ) -> Result<String> {
        let bytes = decode_base64(data)?;
        self.persist_icon(bytes, mime_type, target_url).await
    }

    /// Commit a `data:` URL preview.
    pub async fn persist_data_url(&self, data_url: &str, target_url: &str) -> Result<String> {
        let data_url = data_url.to_string();
        let target_url = target_url.to_string();
        self.with_store(move |store| store.persist_data_url(&data_url, &target_url))
            .await
    }

    // ========================================
    // Gallery
    // ========================================

    pub async fn list_icons(&self) -> Result<Vec<String>> {
        self.with_store(|store| store.list_icons()).await
    }

    pub async fn delete_icon(&self, file_name: &str) -> Result<()> {
        let file_name = file_name.to_string();
        self.with_store(move |store| store.delete_icon(&file_name))
            .await
    }

    /// Copy an image file from elsewhere on disk into the store.
    pub async fn import_icon(&self, source_path: impl Into<PathBuf>) -> Result<String> {
        let source_path = source_path.into();
        self.with_store(move |store| store.import_icon(&source_path))
            .await
    }

    /// Absolute path of a stored icon.
    pub fn icon_path(&self, file_name: &str) -> Result<PathBuf> {
        self.store.path_of(file_name)
    }
}
