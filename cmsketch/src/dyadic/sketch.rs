// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use super::RANGES;
use super::decompose::decompose_mapped;
use super::domain;
use super::domain::MAX_VALUE;
use super::domain::MIN_VALUE;
use super::histogram::HistogramBucket;
use super::histogram::WidthHistogram;
use super::serialization;
use crate::countmin::CountMinSketch;
use crate::countmin::DEFAULT_NUM_BUCKETS;
use crate::countmin::DEFAULT_NUM_HASHES;
use crate::error::Error;
use crate::hash::DEFAULT_SEED;

/// A stack of Count-Min sketches, one per dyadic scale of the signed key domain.
///
/// Level `ℓ` counts the bucket `mapped_key >> ℓ`, so level 0 answers point queries and
/// level 63 holds a single bucket spanning the whole domain. Range, quantile and histogram
/// queries are answered from the per-level estimates of the buckets that cover them.
///
/// See the [dyadic module level documentation](crate::dyadic) for more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DyadicCountMinSketch {
    levels: Vec<CountMinSketch>,
}

impl Default for DyadicCountMinSketch {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_HASHES, DEFAULT_NUM_BUCKETS)
    }
}

impl DyadicCountMinSketch {
    /// Creates an empty sketch whose levels have `num_hashes` rows of `num_buckets` counters.
    ///
    /// # Panics
    ///
    /// Panics if `num_hashes` or `num_buckets` is zero.
    pub fn new(num_hashes: u8, num_buckets: u32) -> Self {
        Self::with_seed(num_hashes, num_buckets, DEFAULT_SEED)
    }

    /// Creates an empty sketch with an explicit hash seed.
    ///
    /// # Panics
    ///
    /// Panics if `num_hashes` or `num_buckets` is zero.
    pub fn with_seed(num_hashes: u8, num_buckets: u32, seed: u64) -> Self {
        let level = CountMinSketch::with_seed(num_hashes, num_buckets, seed);
        Self {
            levels: vec![level; RANGES],
        }
    }

    pub(super) fn from_levels(levels: Vec<CountMinSketch>) -> Self {
        debug_assert_eq!(levels.len(), RANGES);
        Self { levels }
    }

    /// Returns the number of hash functions per level.
    pub fn num_hashes(&self) -> u8 {
        self.levels[0].num_hashes()
    }

    /// Returns the number of counters per row.
    pub fn num_buckets(&self) -> u32 {
        self.levels[0].num_buckets()
    }

    /// Returns the hash seed.
    pub fn seed(&self) -> u64 {
        self.levels[0].seed()
    }

    /// Returns the number of observations inserted.
    pub fn total_weight(&self) -> u64 {
        self.levels[0].total_weight()
    }

    /// Returns true if nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.levels[0].is_empty()
    }

    /// Returns the counter matrix of `level`.
    ///
    /// # Panics
    ///
    /// Panics if `level >= RANGES`.
    pub fn level(&self, level: usize) -> &CountMinSketch {
        &self.levels[level]
    }

    /// Inserts one occurrence of `key`.
    pub fn insert(&mut self, key: i64) -> Result<(), Error> {
        self.insert_with_weight(key, 1)
    }

    /// Inserts `weight` occurrences of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::DomainError`](crate::error::ErrorKind::DomainError) if `key` lies
    /// outside `[MIN_VALUE, MAX_VALUE]` and
    /// [`ErrorKind::CounterOverflow`](crate::error::ErrorKind::CounterOverflow) if the total
    /// weight would overflow. The sketch is left unchanged on error.
    pub fn insert_with_weight(&mut self, key: i64, weight: u64) -> Result<(), Error> {
        let mapped = domain::to_mapped(key)?;
        if weight == 0 {
            return Ok(());
        }
        // every level carries the same total weight
        if self.total_weight().checked_add(weight).is_none() {
            return Err(Error::counter_overflow().with_context("key", key));
        }
        for (level, sketch) in self.levels.iter_mut().enumerate() {
            sketch.update_with_weight(&(mapped >> level), weight)?;
        }
        Ok(())
    }

    /// Returns the estimated number of occurrences of `key`.
    pub fn estimate(&self, key: i64) -> Result<u64, Error> {
        let mapped = domain::to_mapped(key)?;
        Ok(self.levels[0].estimate(&mapped))
    }

    /// Adds every level of `other` into this sketch.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::DimensionMismatch`](crate::error::ErrorKind::DimensionMismatch) if
    /// the shapes or seeds differ, and
    /// [`ErrorKind::CounterOverflow`](crate::error::ErrorKind::CounterOverflow) if the combined
    /// weight does not fit. The sketch is left unchanged on error.
    pub fn merge(&mut self, other: &DyadicCountMinSketch) -> Result<(), Error> {
        self.levels[0].check_compatible(&other.levels[0])?;
        if self.total_weight().checked_add(other.total_weight()).is_none() {
            return Err(Error::counter_overflow());
        }
        for (mine, theirs) in self.levels.iter_mut().zip(other.levels.iter()) {
            mine.merge(theirs)?;
        }
        tracing::trace!(total_weight = self.total_weight(), "merged dyadic sketches");
        Ok(())
    }

    /// Returns the estimated number of observations in `[lo, hi]`.
    ///
    /// The estimate never falls below the true count.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidRange`](crate::error::ErrorKind::InvalidRange) if `lo > hi`
    /// and [`ErrorKind::DomainError`](crate::error::ErrorKind::DomainError) if a bound lies
    /// outside the domain.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cmsketch::dyadic::DyadicCountMinSketch;
    /// let mut sketch = DyadicCountMinSketch::default();
    /// for key in [5, 5, 5, 7, 7, 9] {
    ///     sketch.insert(key).unwrap();
    /// }
    /// assert!(sketch.range_count(5, 7).unwrap() >= 5);
    /// ```
    pub fn range_count(&self, lo: i64, hi: i64) -> Result<u64, Error> {
        if lo > hi {
            return Err(Error::invalid_range(lo, hi));
        }
        self.range_count_mapped(domain::to_mapped(lo)?, domain::to_mapped(hi)?)
    }

    pub(super) fn range_count_mapped(&self, lo: u64, hi: u64) -> Result<u64, Error> {
        decompose_mapped(lo, hi)
            .iter()
            .try_fold(0u64, |acc, range| {
                acc.checked_add(self.levels[range.level() as usize].estimate(&range.bucket()))
            })
            .ok_or_else(Error::counter_overflow)
    }

    /// Returns the smallest key whose estimated prefix count reaches `fraction` of
    /// `total_count`.
    ///
    /// Returns `None` if `total_count` is zero or if the whole domain holds less estimated
    /// mass than the target, so no key can reach it. The search bisects the working domain
    /// and evaluates at most 64 prefix counts.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if
    /// `fraction` is not in `[0.0, 1.0]`.
    pub fn centile(&self, fraction: f64, total_count: u64) -> Result<Option<i64>, Error> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(Error::invalid_argument(format!(
                "fraction must be in [0.0, 1.0], got {fraction}"
            )));
        }
        if total_count == 0 {
            return Ok(None);
        }
        let target = ((fraction * total_count as f64).ceil() as u64).clamp(1, total_count);
        if self.range_count_mapped(0, domain::MAPPED_MAX)? < target {
            return Ok(None);
        }

        let mut lo = 0u64;
        let mut hi = domain::MAPPED_MAX;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.range_count_mapped(0, mid)? >= target {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        Ok(Some(domain::from_mapped(lo)))
    }

    /// Returns the approximate `fraction` quantile of the inserted keys.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cmsketch::dyadic::DyadicCountMinSketch;
    /// let mut sketch = DyadicCountMinSketch::default();
    /// for key in 1..=100 {
    ///     sketch.insert(key).unwrap();
    /// }
    /// let median = sketch.quantile(0.5).unwrap().unwrap();
    /// assert!((1..=50).contains(&median));
    /// ```
    pub fn quantile(&self, fraction: f64) -> Result<Option<i64>, Error> {
        self.centile(fraction, self.total_weight())
    }

    /// Splits `[lo, hi]` into `num_buckets` equal-width buckets and estimates the count of
    /// each. The last bucket absorbs the remainder of the division; when the range holds
    /// fewer keys than `num_buckets`, one bucket per key is produced.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if
    /// `num_buckets` is zero, [`ErrorKind::InvalidRange`](crate::error::ErrorKind::InvalidRange)
    /// if `lo > hi` and [`ErrorKind::DomainError`](crate::error::ErrorKind::DomainError) if a
    /// bound lies outside the domain.
    pub fn width_histogram(
        &self,
        lo: i64,
        hi: i64,
        num_buckets: usize,
    ) -> Result<WidthHistogram<'_>, Error> {
        if num_buckets == 0 {
            return Err(Error::invalid_argument("num_buckets must be at least 1"));
        }
        if lo > hi {
            return Err(Error::invalid_range(lo, hi));
        }
        let lo = domain::to_mapped(lo)?;
        let hi = domain::to_mapped(hi)?;
        Ok(WidthHistogram::new(self, lo, hi, num_buckets as u64))
    }

    /// Splits the domain into up to `num_buckets` buckets of roughly equal estimated count.
    ///
    /// Bucket boundaries are the centiles at `i / num_buckets`. The first bucket starts at
    /// [`MIN_VALUE`] and the last ends at [`MAX_VALUE`]. Boundaries that coincide on skewed
    /// data collapse, producing fewer buckets. An empty sketch yields no buckets.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if
    /// `num_buckets` is zero.
    pub fn depth_histogram(&self, num_buckets: usize) -> Result<Vec<HistogramBucket>, Error> {
        if num_buckets == 0 {
            return Err(Error::invalid_argument("num_buckets must be at least 1"));
        }
        let total = self.range_count(MIN_VALUE, MAX_VALUE)?;
        if total == 0 {
            return Ok(Vec::new());
        }

        let mut buckets = Vec::with_capacity(num_buckets);
        let mut lo = MIN_VALUE;
        for i in 1..=num_buckets {
            let hi = if i == num_buckets {
                MAX_VALUE
            } else {
                let fraction = i as f64 / num_buckets as f64;
                self.centile(fraction, total)?.unwrap_or(MAX_VALUE)
            };
            if hi < lo {
                continue;
            }
            buckets.push(HistogramBucket::new(lo, hi, self.range_count(lo, hi)?));
            if hi == MAX_VALUE {
                break;
            }
            lo = hi + 1;
        }
        Ok(buckets)
    }

    /// Serializes this sketch to bytes.
    pub fn serialize(&self) -> Vec<u8> {
        serialization::serialize(&self.levels)
    }

    /// Deserializes a sketch built with the default seed.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        Self::deserialize_with_seed(bytes, DEFAULT_SEED)
    }

    /// Deserializes a sketch built with `seed`.
    pub fn deserialize_with_seed(bytes: &[u8], seed: u64) -> Result<Self, Error> {
        serialization::deserialize(bytes, seed).map(Self::from_levels)
    }
}
