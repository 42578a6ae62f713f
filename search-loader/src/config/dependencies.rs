//! Dependency initialization and wiring for the search loader.

use std::sync::Arc;
use tracing::info;

use super::Settings;
use crate::catalog::GlueCatalog;
use crate::prepare::IndexPreparer;
use crate::secrets::{EnvSecretResolver, SecretResolver};
use crate::LoaderError;
use search_loader_ingest::{
    BatchSizeEstimator, IngestionDriver, ObjectReader, ObjectStoreReader, UnitProcessor,
};
use search_loader_repository::OpenSearchClient;

/// Container for all initialized dependencies.
pub struct Dependencies {
    pub settings: Settings,
    /// The one cluster handle of this invocation.
    pub search_client: Arc<OpenSearchClient>,
}

impl Dependencies {
    /// Initialize dependencies, resolving credentials from the environment.
    pub async fn new(settings: Settings) -> Result<Self, LoaderError> {
        Self::with_resolver(settings, &EnvSecretResolver).await
    }

    /// Initialize dependencies with a custom secret resolver.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(LoaderError)` - If credentials or the client cannot be set up
    pub async fn with_resolver(
        settings: Settings,
        resolver: &dyn SecretResolver,
    ) -> Result<Self, LoaderError> {
        info!(
            opensearch_url = %settings.opensearch_url,
            secret = ?settings.secret_name,
            ceiling_bytes = settings.ceiling_bytes,
            sample_size = settings.sample_size,
            "Initializing dependencies"
        );

        let credentials = match &settings.secret_name {
            Some(name) => Some(resolver.resolve(name).await?),
            None => None,
        };

        let search_client = OpenSearchClient::new(&settings.opensearch_url, credentials.as_ref())
            .await
            .map_err(|e| LoaderError::config(format!("Failed to create OpenSearch client: {}", e)))?;

        Ok(Self {
            settings,
            search_client: Arc::new(search_client),
        })
    }

    /// Object reader for the configured storage backend.
    pub fn object_reader(&self) -> Arc<dyn ObjectReader> {
        match &self.settings.local_storage_root {
            Some(root) => {
                info!(root = %root.display(), "Reading objects from local storage");
                Arc::new(ObjectStoreReader::local(root.clone()))
            }
            None => Arc::new(ObjectStoreReader::s3(self.settings.aws_region.clone())),
        }
    }

    /// Ingestion driver submitting through the cluster handle.
    pub fn ingestion_driver(&self) -> IngestionDriver {
        IngestionDriver::with_config(
            self.search_client.clone(),
            BatchSizeEstimator::new(self.settings.estimator_config()),
            self.settings.loader_config(),
        )
    }

    /// Processor loading notified objects.
    pub fn unit_processor(&self) -> UnitProcessor {
        UnitProcessor::new(self.object_reader(), self.ingestion_driver())
    }

    /// Data catalog client in the configured region.
    pub async fn glue_catalog(&self, catalog_id: Option<String>) -> GlueCatalog {
        GlueCatalog::new(self.settings.aws_region.clone(), catalog_id).await
    }

    /// Index preparer administering indexes through the cluster handle.
    pub fn index_preparer(&self) -> IndexPreparer {
        IndexPreparer::new(
            self.search_client.clone(),
            self.settings.replicas,
            self.settings.poll_interval,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use search_loader_shared::Credentials;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock resolver counting lookups.
    #[derive(Default)]
    struct CountingResolver {
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl SecretResolver for CountingResolver {
        async fn resolve(&self, _name: &str) -> Result<Credentials, LoaderError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(Credentials::new("loader", "secret"))
        }
    }

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<&str, &str> = vars.iter().copied().collect();
        Settings::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_secret_is_resolved_when_named() {
        let resolver = CountingResolver::default();

        Dependencies::with_resolver(settings(&[("OPENSEARCH_SECRET_NAME", "os")]), &resolver)
            .await
            .unwrap();

        assert_eq!(resolver.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_secret_connects_without_auth() {
        let resolver = CountingResolver::default();

        let deps = Dependencies::with_resolver(settings(&[]), &resolver).await.unwrap();

        assert_eq!(resolver.lookups.load(Ordering::SeqCst), 0);
        assert_eq!(deps.ingestion_driver().config().ceiling_bytes, 52_428_800);
    }

    #[tokio::test]
    async fn test_invalid_url_is_config_error() {
        let result = Dependencies::with_resolver(
            settings(&[("OPENSEARCH_URL", "not a url")]),
            &CountingResolver::default(),
        )
        .await;

        assert!(matches!(result, Err(LoaderError::ConfigError(_))));
    }
}
