//! CNPJ 查詢結果的持久化快取。
//!
//! 磁碟格式是單一 JSON 物件 `{ "<cnpj>": 結果或 null }`。
//! 負向條目 (null) 也是終態：查過就不再查，配額太貴。
//! 每寫入一筆就 flush，一次中斷最多損失正在寫的那筆。

use crate::domain::model::RegistryInfo;
use crate::domain::ports::Storage;
use crate::utils::error::{EnrichError, Result};
use std::collections::HashMap;

pub struct EnrichmentCache {
    path: String,
    entries: HashMap<String, Option<RegistryInfo>>,
}

impl EnrichmentCache {
    /// 啟動時整檔載入。檔案不存在或為空 → 空快取；
    /// 內容不是合法 JSON → 致命錯誤，不能默默丟掉已付費的查詢結果
    pub async fn load<S: Storage>(storage: &S, path: &str) -> Result<Self> {
        let entries = match storage.read_file(path).await {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|e| EnrichError::CacheError {
                    path: path.to_string(),
                    message: e.to_string(),
                })?
            }
            Err(EnrichError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                HashMap::new()
            }
            Err(e) => return Err(e),
        };

        tracing::debug!("💾 Cache loaded from '{}': {} entries", path, entries.len());
        Ok(Self {
            path: path.to_string(),
            entries,
        })
    }

    /// 外層 None = 沒查過；內層 None = 查過但失敗或無資料（負向條目）
    pub fn get(&self, tax_id: &str) -> Option<&Option<RegistryInfo>> {
        self.entries.get(tax_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 寫入一筆並立刻落盤
    pub async fn put<S: Storage>(
        &mut self,
        storage: &S,
        tax_id: String,
        info: Option<RegistryInfo>,
    ) -> Result<()> {
        self.entries.insert(tax_id, info);
        self.flush(storage).await
    }

    pub async fn flush<S: Storage>(&self, storage: &S) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(&self.entries)?;
        storage.write_file(&self.path, &bytes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EnrichError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn sample_info() -> RegistryInfo {
        RegistryInfo {
            registration_status: Some("Ativa".to_string()),
            activity_code: "4711-3/01".to_string(),
            activity_description: "Comércio varejista".to_string(),
        }
    }

    #[test]
    fn test_missing_file_loads_empty_cache() {
        let storage = MockStorage::new();
        let cache = tokio_test::block_on(EnrichmentCache::load(&storage, "cache.json")).unwrap();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_put_flushes_immediately() {
        let storage = MockStorage::new();
        let mut cache = EnrichmentCache::load(&storage, "cache.json").await.unwrap();

        cache
            .put(&storage, "12345678000195".to_string(), Some(sample_info()))
            .await
            .unwrap();

        let on_disk = storage.get_file("cache.json").await.unwrap();
        let parsed: HashMap<String, Option<RegistryInfo>> =
            serde_json::from_slice(&on_disk).unwrap();
        assert_eq!(parsed.get("12345678000195").unwrap(), &Some(sample_info()));
    }

    #[tokio::test]
    async fn test_negative_entries_survive_reload() {
        let storage = MockStorage::new();

        let mut cache = EnrichmentCache::load(&storage, "cache.json").await.unwrap();
        cache
            .put(&storage, "00000000000000".to_string(), None)
            .await
            .unwrap();
        cache
            .put(&storage, "12345678000195".to_string(), Some(sample_info()))
            .await
            .unwrap();

        let reloaded = EnrichmentCache::load(&storage, "cache.json").await.unwrap();
        assert_eq!(reloaded.len(), 2);
        // 負向條目載回來仍是「查過、無資料」，不會被當成沒查過
        assert_eq!(reloaded.get("00000000000000"), Some(&None));
        assert_eq!(
            reloaded.get("12345678000195"),
            Some(&Some(sample_info()))
        );
        assert_eq!(reloaded.get("99999999999999"), None);
    }

    #[tokio::test]
    async fn test_corrupt_cache_is_fatal() {
        let storage = MockStorage::new();
        storage
            .write_file("cache.json", b"{ not json")
            .await
            .unwrap();

        let result = EnrichmentCache::load(&storage, "cache.json").await;
        assert!(matches!(result, Err(EnrichError::CacheError { .. })));
    }

    #[tokio::test]
    async fn test_empty_file_loads_empty_cache() {
        let storage = MockStorage::new();
        storage.write_file("cache.json", b"").await.unwrap();

        let cache = EnrichmentCache::load(&storage, "cache.json").await.unwrap();
        assert!(cache.is_empty());
    }
}
