//! Cluster credential resolution.

use std::env;

use async_trait::async_trait;
use tracing::debug;

use crate::LoaderError;
use search_loader_shared::Credentials;

/// Resolves a named secret into cluster credentials.
#[async_trait]
pub trait SecretResolver: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<Credentials, LoaderError>;
}

/// Reads secrets from environment variables.
///
/// The secret `prod/opensearch-admin` is read from `PROD_OPENSEARCH_ADMIN`,
/// whose value is `{"username": "...", "password": "..."}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretResolver;

impl EnvSecretResolver {
    /// Environment variable holding the secret `name`.
    pub fn variable_name(name: &str) -> String {
        name.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect()
    }
}

/// Parse a `{"username", "password"}` secret document.
pub fn parse_secret(name: &str, value: &str) -> Result<Credentials, LoaderError> {
    serde_json::from_str(value)
        .map_err(|e| LoaderError::secret(format!("Secret {} is not a credentials document: {}", name, e)))
}

#[async_trait]
impl SecretResolver for EnvSecretResolver {
    async fn resolve(&self, name: &str) -> Result<Credentials, LoaderError> {
        let variable = Self::variable_name(name);
        let value = env::var(&variable)
            .map_err(|e| LoaderError::secret(format!("Secret {} unavailable in {}: {}", name, variable, e)))?;

        debug!(secret = %name, variable = %variable, "Resolved secret");
        parse_secret(name, &value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_name() {
        assert_eq!(
            EnvSecretResolver::variable_name("prod/opensearch-admin"),
            "PROD_OPENSEARCH_ADMIN"
        );
        assert_eq!(EnvSecretResolver::variable_name("os.secret2"), "OS_SECRET2");
    }

    #[test]
    fn test_parse_secret() {
        let credentials =
            parse_secret("s", r#"{"username": "loader", "password": "hunter2", "engine": "os"}"#)
                .unwrap();

        assert_eq!(credentials, Credentials::new("loader", "hunter2"));
    }

    #[test]
    fn test_parse_secret_rejects_incomplete_document() {
        let err = parse_secret("s", r#"{"username": "loader"}"#).unwrap_err();

        assert!(matches!(err, LoaderError::SecretError(_)));
        assert!(err.to_string().contains("password"));
    }

    #[tokio::test]
    async fn test_resolve_from_environment() {
        env::set_var(
            "SEARCH_LOADER_TEST_SECRET",
            r#"{"username": "u", "password": "p"}"#,
        );

        let credentials = EnvSecretResolver
            .resolve("search-loader/test-secret")
            .await
            .unwrap();

        assert_eq!(credentials.username, "u");
        assert_eq!(credentials.password, "p");
    }

    #[tokio::test]
    async fn test_resolve_missing_secret() {
        let err = EnvSecretResolver
            .resolve("search-loader/never-set")
            .await
            .unwrap_err();

        assert!(matches!(err, LoaderError::SecretError(_)));
    }
}
