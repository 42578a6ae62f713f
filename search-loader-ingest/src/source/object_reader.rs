//! Object storage access.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::path::Path;
use object_store::ObjectStore;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::errors::IngestError;

/// Reads whole exported objects.
#[async_trait]
pub trait ObjectReader: Send + Sync {
    /// Read an object as UTF-8 text.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The full object content
    /// * `Err(IngestError)` - The object is missing, unreadable, or not UTF-8
    async fn read_to_string(&self, bucket: &str, key: &str) -> Result<String, IngestError>;
}

#[derive(Debug, Clone)]
enum Backend {
    S3 { region: Option<String> },
    Local { root: PathBuf },
}

/// `ObjectReader` backed by the `object_store` crate.
///
/// One store is built per bucket on first use and reused afterwards.
pub struct ObjectStoreReader {
    backend: Backend,
    stores: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl ObjectStoreReader {
    /// Read from S3. Credentials and endpoint come from the standard `AWS_*`
    /// environment variables.
    pub fn s3(region: Option<String>) -> Self {
        Self::with_backend(Backend::S3 { region })
    }

    /// Read from a local directory where each bucket is a subdirectory of
    /// `root`.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        Self::with_backend(Backend::Local { root: root.into() })
    }

    fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            stores: Mutex::new(HashMap::new()),
        }
    }

    fn build_store(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, IngestError> {
        match &self.backend {
            Backend::S3 { region } => {
                let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
                if let Some(region) = region {
                    builder = builder.with_region(region);
                }
                let store = builder.build().map_err(|e| {
                    IngestError::storage(format!("Failed to create S3 client for {}: {}", bucket, e))
                })?;
                Ok(Arc::new(store))
            }
            Backend::Local { root } => {
                let store = LocalFileSystem::new_with_prefix(root.join(bucket)).map_err(|e| {
                    IngestError::storage(format!("Failed to open local bucket {}: {}", bucket, e))
                })?;
                Ok(Arc::new(store))
            }
        }
    }

    async fn store_for(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, IngestError> {
        let mut stores = self.stores.lock().await;
        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }

        let store = self.build_store(bucket)?;
        info!(bucket = %bucket, backend = ?self.backend, "Created object store");
        stores.insert(bucket.to_string(), store.clone());
        Ok(store)
    }
}

#[async_trait]
impl ObjectReader for ObjectStoreReader {
    #[instrument(skip(self))]
    async fn read_to_string(&self, bucket: &str, key: &str) -> Result<String, IngestError> {
        let store = self.store_for(bucket).await?;
        let bytes = store.get(&Path::from(key)).await?.bytes().await?;
        debug!(bytes = bytes.len(), "Read object");

        String::from_utf8(bytes.to_vec()).map_err(|e| {
            IngestError::storage(format!("Object s3://{}/{} is not UTF-8: {}", bucket, key, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn bucket_with(files: &[(&str, &[u8])]) -> tempfile::TempDir {
        let root = tempfile::tempdir().unwrap();
        for (key, content) in files {
            let path = root.path().join("exports").join(key);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        root
    }

    #[tokio::test]
    async fn test_local_read() {
        let root = bucket_with(&[("sales/orders/idx/part-0.json", b"{\"_id\": \"1\"}\n")]);
        let reader = ObjectStoreReader::local(root.path());

        let content = reader
            .read_to_string("exports", "sales/orders/idx/part-0.json")
            .await
            .unwrap();

        assert_eq!(content, "{\"_id\": \"1\"}\n");
    }

    #[tokio::test]
    async fn test_local_store_is_reused() {
        let root = bucket_with(&[("a/p1.json", b"1"), ("a/p2.json", b"2")]);
        let reader = ObjectStoreReader::local(root.path());

        assert_eq!(reader.read_to_string("exports", "a/p1.json").await.unwrap(), "1");
        assert_eq!(reader.read_to_string("exports", "a/p2.json").await.unwrap(), "2");
        assert_eq!(reader.stores.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_object_is_storage_error() {
        let root = bucket_with(&[("a/p1.json", b"1")]);
        let reader = ObjectStoreReader::local(root.path());

        let err = reader.read_to_string("exports", "a/missing.json").await.unwrap_err();

        assert!(matches!(err, IngestError::StorageError(_)));
    }

    #[tokio::test]
    async fn test_missing_bucket_is_storage_error() {
        let root = tempfile::tempdir().unwrap();
        let reader = ObjectStoreReader::local(root.path());

        let err = reader.read_to_string("absent", "a/p.json").await.unwrap_err();

        assert!(matches!(err, IngestError::StorageError(_)));
    }

    #[tokio::test]
    async fn test_non_utf8_is_storage_error() {
        let root = bucket_with(&[("a/p.json", &[0xff, 0xfe, 0x00])]);
        let reader = ObjectStoreReader::local(root.path());

        let err = reader.read_to_string("exports", "a/p.json").await.unwrap_err();

        assert!(err.to_string().contains("not UTF-8"));
    }
}
