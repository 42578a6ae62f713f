//! Settings read from the environment.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::LoaderError;
use search_loader_ingest::{EstimatorConfig, LoaderConfig};

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default byte ceiling of one bulk request.
const DEFAULT_CEILING_BYTES: usize = 52_428_800;

/// Default number of records sampled per object.
const DEFAULT_SAMPLE_SIZE: usize = 100;

/// Default share of the ceiling available to records.
const DEFAULT_BUDGET_FRACTION: f64 = 0.8;

/// Default replica count for prepared indexes.
const DEFAULT_REPLICAS: usize = 1;

/// Default delay between document count checks.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 15;

/// Loader settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub opensearch_url: String,
    /// Name of the secret holding the cluster credentials.
    pub secret_name: Option<String>,
    pub ceiling_bytes: usize,
    pub sample_size: usize,
    pub budget_fraction: f64,
    pub aws_region: Option<String>,
    /// Read objects from this directory instead of S3.
    pub local_storage_root: Option<PathBuf>,
    pub replicas: usize,
    pub poll_interval: Duration,
}

impl Settings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_SECRET_NAME`: secret with the cluster credentials (default: none, no auth)
    /// - `BULK_CEILING_BYTES`: bulk request size ceiling (default: 52428800)
    /// - `BULK_SAMPLE_SIZE`: records sampled per object (default: 100)
    /// - `BULK_BUDGET_FRACTION`: share of the ceiling used by records (default: 0.8)
    /// - `AWS_REGION`: region of the export bucket
    /// - `LOCAL_STORAGE_ROOT`: directory standing in for object storage
    /// - `INDEX_REPLICAS`: replicas of prepared indexes (default: 1)
    /// - `INDEX_POLL_INTERVAL_SECS`: document count poll interval (default: 15)
    pub fn from_env() -> Result<Self, LoaderError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read settings through `lookup`, which returns the value of a variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LoaderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let settings = Self {
            opensearch_url: non_empty("OPENSEARCH_URL")
                .unwrap_or_else(|| DEFAULT_OPENSEARCH_URL.to_string()),
            secret_name: non_empty("OPENSEARCH_SECRET_NAME"),
            ceiling_bytes: parse_var(&non_empty, "BULK_CEILING_BYTES", DEFAULT_CEILING_BYTES)?,
            sample_size: parse_var(&non_empty, "BULK_SAMPLE_SIZE", DEFAULT_SAMPLE_SIZE)?,
            budget_fraction: parse_var(&non_empty, "BULK_BUDGET_FRACTION", DEFAULT_BUDGET_FRACTION)?,
            aws_region: non_empty("AWS_REGION"),
            local_storage_root: non_empty("LOCAL_STORAGE_ROOT").map(PathBuf::from),
            replicas: parse_var(&non_empty, "INDEX_REPLICAS", DEFAULT_REPLICAS)?,
            poll_interval: Duration::from_secs(parse_var(
                &non_empty,
                "INDEX_POLL_INTERVAL_SECS",
                DEFAULT_POLL_INTERVAL_SECS,
            )?),
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), LoaderError> {
        if self.ceiling_bytes == 0 {
            return Err(LoaderError::config("BULK_CEILING_BYTES must be positive"));
        }
        if self.sample_size == 0 {
            return Err(LoaderError::config("BULK_SAMPLE_SIZE must be positive"));
        }
        if !(self.budget_fraction > 0.0 && self.budget_fraction <= 1.0) {
            return Err(LoaderError::config(format!(
                "BULK_BUDGET_FRACTION must be in (0, 1], got {}",
                self.budget_fraction
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(LoaderError::config("INDEX_POLL_INTERVAL_SECS must be positive"));
        }
        Ok(())
    }

    /// Estimator configuration for these settings.
    pub fn estimator_config(&self) -> EstimatorConfig {
        EstimatorConfig {
            ceiling_bytes: self.ceiling_bytes,
            budget_fraction: self.budget_fraction,
            min_sample: self.sample_size,
            ..EstimatorConfig::default()
        }
    }

    /// Ingestion driver configuration for these settings.
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            ceiling_bytes: self.ceiling_bytes,
            sample_size: self.sample_size,
        }
    }
}

fn parse_var<T, F>(lookup: &F, name: &str, default: T) -> Result<T, LoaderError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| LoaderError::config(format!("Invalid {} {:?}: {}", name, raw, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use search_loader_ingest::BatchSizeEstimator;
    use search_loader_shared::Record;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, LoaderError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[]).unwrap();

        assert_eq!(settings.opensearch_url, "http://localhost:9200");
        assert_eq!(settings.secret_name, None);
        assert_eq!(settings.ceiling_bytes, 52_428_800);
        assert_eq!(settings.sample_size, 100);
        assert_eq!(settings.budget_fraction, 0.8);
        assert_eq!(settings.replicas, 1);
        assert_eq!(settings.poll_interval, Duration::from_secs(15));
        assert_eq!(settings.local_storage_root, None);
    }

    #[test]
    fn test_overrides() {
        let settings = settings(&[
            ("OPENSEARCH_URL", "https://search.internal:443"),
            ("OPENSEARCH_SECRET_NAME", "prod/opensearch"),
            ("BULK_CEILING_BYTES", "10485760"),
            ("BULK_SAMPLE_SIZE", " 50 "),
            ("BULK_BUDGET_FRACTION", "0.5"),
            ("INDEX_POLL_INTERVAL_SECS", "1"),
        ])
        .unwrap();

        assert_eq!(settings.opensearch_url, "https://search.internal:443");
        assert_eq!(settings.secret_name.as_deref(), Some("prod/opensearch"));
        assert_eq!(settings.loader_config().ceiling_bytes, 10_485_760);
        assert_eq!(settings.loader_config().sample_size, 50);
        assert_eq!(settings.estimator_config().budget_fraction, 0.5);
        assert_eq!(settings.estimator_config().min_sample, 50);
        assert_eq!(settings.poll_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_sample_size_sets_estimation_threshold() {
        let settings = settings(&[("BULK_CEILING_BYTES", "20000"), ("BULK_SAMPLE_SIZE", "50")]).unwrap();
        let estimator = BatchSizeEstimator::new(settings.estimator_config());

        // 50 records of 1026 canonical bytes: 16000 / 1084 rounds to 15.
        let sample: Vec<Record> = (0..50)
            .map(|i| {
                Record::from_json_line(&format!(r#"{{"_id":"{:03}","blob":"{}"}}"#, i, "x".repeat(1000)))
                    .unwrap()
            })
            .collect();

        assert_eq!(estimator.estimate_default(&sample).unwrap(), 15);
    }

    #[test]
    fn test_empty_values_use_defaults() {
        let settings = settings(&[("OPENSEARCH_SECRET_NAME", ""), ("BULK_SAMPLE_SIZE", "")]).unwrap();

        assert_eq!(settings.secret_name, None);
        assert_eq!(settings.sample_size, 100);
    }

    #[test]
    fn test_invalid_numbers_are_errors() {
        for (name, value) in [
            ("BULK_CEILING_BYTES", "fifty"),
            ("BULK_CEILING_BYTES", "-1"),
            ("BULK_CEILING_BYTES", "0"),
            ("BULK_SAMPLE_SIZE", "0"),
            ("BULK_BUDGET_FRACTION", "1.5"),
            ("BULK_BUDGET_FRACTION", "0"),
            ("INDEX_REPLICAS", "one"),
            ("INDEX_POLL_INTERVAL_SECS", "0"),
        ] {
            let result = settings(&[(name, value)]);
            assert!(
                matches!(result, Err(LoaderError::ConfigError(_))),
                "{name}={value} should be rejected"
            );
        }
    }
}
