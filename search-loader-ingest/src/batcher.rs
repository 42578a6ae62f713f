//! Fixed-size batching of a record stream.
//!
//! The batch size is estimated once from a bounded prefix of the stream and
//! then applied to the whole stream. Sizes are not re-estimated if record
//! sizes drift later on: the stream is read once, and memory stays bounded by
//! the sample plus the batch being filled.

use std::iter::FusedIterator;

use crate::errors::IngestError;
use crate::estimator::BatchSizeEstimator;
use search_loader_shared::Record;

/// Upper bound on the capacity reserved for a batch up front.
const MAX_PREALLOCATED_BATCH: usize = 4096;

/// Splits a record stream into batches sized by one up-front estimate.
///
/// Yields `Ok(batch)` until the stream ends. A source error is yielded once,
/// after which the batcher is exhausted.
pub struct StreamBatcher<I> {
    source: I,
    sample: std::vec::IntoIter<Record>,
    batch_size: usize,
    finished: bool,
}

impl<I> StreamBatcher<I>
where
    I: Iterator<Item = Result<Record, IngestError>>,
{
    /// Read up to `sample_size` records, estimate the batch size from them,
    /// and prepare to batch the stream.
    ///
    /// The sampled records are not re-read: they form the start of the first
    /// batches.
    ///
    /// # Errors
    ///
    /// Returns the first source error met while sampling, or an estimation
    /// error.
    pub fn new(
        mut source: I,
        estimator: &BatchSizeEstimator,
        sample_size: usize,
        ceiling_bytes: usize,
    ) -> Result<Self, IngestError> {
        let mut sample = Vec::with_capacity(sample_size.min(MAX_PREALLOCATED_BATCH));
        for record in source.by_ref().take(sample_size) {
            sample.push(record?);
        }

        let batch_size = estimator.estimate(&sample, ceiling_bytes)?;

        Ok(Self {
            source,
            sample: sample.into_iter(),
            batch_size,
            finished: false,
        })
    }

    /// Records per batch; every batch but the last has exactly this many.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl<R> StreamBatcher<std::iter::Map<R, fn(Record) -> Result<Record, IngestError>>>
where
    R: Iterator<Item = Record>,
{
    /// Batch an infallible record stream.
    pub fn from_records<T>(
        records: T,
        estimator: &BatchSizeEstimator,
        sample_size: usize,
        ceiling_bytes: usize,
    ) -> Result<Self, IngestError>
    where
        T: IntoIterator<IntoIter = R>,
    {
        let source = records
            .into_iter()
            .map(Ok as fn(Record) -> Result<Record, IngestError>);
        Self::new(source, estimator, sample_size, ceiling_bytes)
    }
}

impl<I> Iterator for StreamBatcher<I>
where
    I: Iterator<Item = Result<Record, IngestError>>,
{
    type Item = Result<Vec<Record>, IngestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut batch = Vec::with_capacity(self.batch_size.min(MAX_PREALLOCATED_BATCH));
        batch.extend(self.sample.by_ref().take(self.batch_size));

        while batch.len() < self.batch_size {
            match self.source.next() {
                Some(Ok(record)) => batch.push(record),
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                None => {
                    self.finished = true;
                    break;
                }
            }
        }

        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}

impl<I> FusedIterator for StreamBatcher<I> where I: Iterator<Item = Result<Record, IngestError>> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::EstimatorConfig;
    use serde_json::json;
    use std::cell::Cell;

    fn numbered(count: usize) -> Vec<Record> {
        (0..count)
            .map(|i| {
                Record::default()
                    .with_field("_id", format!("{i}"))
                    .with_field("n", i)
            })
            .collect()
    }

    fn ids(batch: &[Record]) -> Vec<usize> {
        batch
            .iter()
            .map(|r| r.fields()["n"].as_u64().unwrap() as usize)
            .collect()
    }

    /// Falls back to a fixed batch size: samples are always shorter than the threshold.
    fn fixed(batch_size: usize) -> BatchSizeEstimator {
        BatchSizeEstimator::new(EstimatorConfig {
            min_sample: batch_size,
            ..EstimatorConfig::default()
        })
    }

    #[test]
    fn test_batch_count_and_sizes() {
        for (len, size) in [(10, 3), (9, 3), (1, 4), (100, 7), (5, 5)] {
            let batcher =
                StreamBatcher::from_records(numbered(len), &fixed(size), size - 1, 1000).unwrap();
            assert_eq!(batcher.batch_size(), size);

            let batches: Vec<Vec<Record>> = batcher.map(Result::unwrap).collect();

            assert_eq!(batches.len(), len.div_ceil(size), "len {len} size {size}");
            let (last, full) = batches.split_last().unwrap();
            assert!(full.iter().all(|b| b.len() == size));
            assert!(!last.is_empty() && last.len() <= size);
        }
    }

    #[test]
    fn test_sample_records_lead_the_output_in_order() {
        let batcher = StreamBatcher::from_records(numbered(10), &fixed(4), 3, 1000).unwrap();

        let flattened: Vec<usize> = batcher.flat_map(|b| ids(&b.unwrap())).collect();

        assert_eq!(flattened, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_sample_larger_than_batch_spans_batches() {
        let batcher = StreamBatcher::from_records(numbered(7), &fixed(2), 1, 1000).unwrap();
        assert_eq!(batcher.batch_size(), 2);

        let estimator = BatchSizeEstimator::new(EstimatorConfig {
            min_sample: 1,
            overhead_bytes: 0,
            budget_fraction: 1.0,
            ..EstimatorConfig::default()
        });
        // Each record is 21 bytes, a 40 byte ceiling fits two per batch.
        let records: Vec<Record> = (0..7)
            .map(|i| Record::default().with_field("_id", format!("r{i}")).with_field("v", 1))
            .collect();
        let batcher = StreamBatcher::from_records(records, &estimator, 5, 40).unwrap();
        assert_eq!(batcher.batch_size(), 2);

        let sizes: Vec<usize> = batcher.map(|b| b.unwrap().len()).collect();
        assert_eq!(sizes, vec![2, 2, 2, 1]);
    }

    #[test]
    fn test_empty_stream_yields_nothing() {
        let mut batcher =
            StreamBatcher::from_records(Vec::new(), &BatchSizeEstimator::default(), 100, 1000)
                .unwrap();
        assert!(batcher.next().is_none());
    }

    #[test]
    fn test_batch_size_is_frozen_after_sampling() {
        let estimator = BatchSizeEstimator::new(EstimatorConfig {
            min_sample: 2,
            overhead_bytes: 0,
            budget_fraction: 1.0,
            ..EstimatorConfig::default()
        });
        let mut records = numbered(2);
        records.extend((2..6).map(|i| {
            Record::default()
                .with_field("_id", format!("{i}"))
                .with_field("n", i)
                .with_field("blob", "x".repeat(10_000))
        }));

        // The two small sampled records are 20 bytes each: 100 / 20 = 5.
        let batcher = StreamBatcher::from_records(records, &estimator, 2, 100).unwrap();
        assert_eq!(batcher.batch_size(), 5);

        let sizes: Vec<usize> = batcher.map(|b| b.unwrap().len()).collect();
        assert_eq!(sizes, vec![5, 1]);
    }

    #[test]
    fn test_source_error_during_sampling() {
        let source = vec![
            Ok(Record::default().with_field("_id", "a")),
            Err(IngestError::parse(2, serde_json::from_str::<Record>("[]").unwrap_err())),
        ];

        let result = StreamBatcher::new(source.into_iter(), &fixed(10), 5, 1000);

        assert!(matches!(result, Err(IngestError::ParseError { line: 2, .. })));
    }

    #[test]
    fn test_source_error_after_sampling_ends_the_stream() {
        let pulled = Cell::new(0);
        let source = (0..10).map(|i| {
            pulled.set(pulled.get() + 1);
            if i == 5 {
                Err(IngestError::parse(i + 1, serde_json::from_str::<Record>("1").unwrap_err()))
            } else {
                Ok(Record::default().with_field("_id", json!(i)))
            }
        });

        let mut batcher = StreamBatcher::new(source, &fixed(3), 2, 1000).unwrap();

        assert_eq!(batcher.next().unwrap().unwrap().len(), 3);
        assert!(matches!(
            batcher.next(),
            Some(Err(IngestError::ParseError { line: 6, .. }))
        ));
        assert!(batcher.next().is_none());
        assert_eq!(pulled.get(), 6);
    }
}
