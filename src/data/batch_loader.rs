// ============================================================
// Layer 4 - Batch Loader
// ============================================================
// Splits the example store into mini-batches, once per epoch.
//
//   epoch():
//     1. order = [0, 1, ..., n-1]
//     2. if shuffle: Fisher-Yates permutation of the whole
//        order (a fresh one every epoch)
//     3. cut `order` into consecutive chunks of batch_size;
//        the last chunk may be shorter
//     4. lazily, per chunk: encode each example and yield
//        the Vec<EncodedExample>
//
// With worker_count > 1 step 4 runs on a rayon pool of that
// many threads. Each worker returns (position, example) and
// the chunk is sorted by position before it is yielded, so
// batch contents and order never depend on worker count.
//
// Reference: rand crate documentation (SliceRandom)
//            rayon crate documentation (ThreadPoolBuilder)

use std::ops::Range;

use burn::data::dataset::Dataset;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::domain::error::ConfigError;
use crate::domain::example::EncodedExample;

/// Produces one lazy sequence of batches per epoch.
pub struct BatchLoader {
    batch_size: usize,
    shuffle: bool,
    worker_count: usize,
    pool: Option<ThreadPool>,
    rng: StdRng,
}

impl BatchLoader {
    /// `worker_count` of 0 is treated as 1 (encode on the calling thread).
    pub fn new(batch_size: usize, shuffle: bool, worker_count: usize) -> Result<Self, ConfigError> {
        if batch_size == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "batch_size".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let worker_count = worker_count.max(1);
        let pool = if worker_count > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(worker_count)
                .thread_name(|i| format!("encode-worker-{i}"))
                .build()
                .map_err(|e| ConfigError::InvalidSetting {
                    field: "num_workers".to_string(),
                    reason: e.to_string(),
                })?;
            Some(pool)
        } else {
            None
        };

        Ok(Self {
            batch_size,
            shuffle,
            worker_count,
            pool,
            rng: StdRng::from_entropy(),
        })
    }

    /// Fix the permutation sequence for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Number of batches an epoch over `len` examples produces.
    pub fn num_batches(&self, len: usize) -> usize {
        len.div_ceil(self.batch_size)
    }

    /// Start a new epoch over `dataset`.
    pub fn epoch<'a, D>(&'a mut self, dataset: &'a D) -> EpochBatches<'a, D>
    where
        D: Dataset<EncodedExample>,
    {
        let mut order: Vec<usize> = (0..dataset.len()).collect();
        if self.shuffle {
            order.shuffle(&mut self.rng);
        }
        tracing::debug!(
            "Epoch order drawn: {} examples, {} batches",
            order.len(),
            self.num_batches(order.len())
        );

        EpochBatches {
            dataset,
            order,
            cursor: 0,
            batch_size: self.batch_size,
            pool: self.pool.as_ref(),
        }
    }
}

/// Lazy batch sequence for a single epoch.
pub struct EpochBatches<'a, D> {
    dataset: &'a D,
    order: Vec<usize>,
    cursor: usize,
    batch_size: usize,
    pool: Option<&'a ThreadPool>,
}

impl<'a, D> EpochBatches<'a, D>
where
    D: Dataset<EncodedExample>,
{
    /// Example indices of the whole epoch, in delivery order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    fn encode_sequential(&self, range: Range<usize>) -> Vec<EncodedExample> {
        self.order[range]
            .iter()
            .filter_map(|&index| self.dataset.get(index))
            .collect()
    }

    fn encode_parallel(&self, pool: &ThreadPool, range: Range<usize>) -> Vec<EncodedExample> {
        let dataset = self.dataset;
        let indices = &self.order[range];

        let mut tagged: Vec<(usize, EncodedExample)> = pool.install(|| {
            indices
                .par_iter()
                .enumerate()
                .filter_map(|(position, &index)| dataset.get(index).map(|ex| (position, ex)))
                .collect()
        });

        tagged.sort_unstable_by_key(|(position, _)| *position);
        tagged.into_iter().map(|(_, ex)| ex).collect()
    }
}

impl<'a, D> Iterator for EpochBatches<'a, D>
where
    D: Dataset<EncodedExample>,
{
    type Item = Vec<EncodedExample>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.order.len() {
            return None;
        }
        let end = (self.cursor + self.batch_size).min(self.order.len());
        let range = self.cursor..end;
        self.cursor = end;

        let batch = match self.pool {
            Some(pool) => self.encode_parallel(pool, range),
            None => self.encode_sequential(range),
        };
        Some(batch)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.order.len() - self.cursor).div_ceil(self.batch_size);
        (remaining, Some(remaining))
    }
}
