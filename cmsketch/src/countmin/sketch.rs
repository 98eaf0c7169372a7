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

use super::serialization;
use crate::error::Error;
use crate::hash::DEFAULT_SEED;
use crate::hash::RowHasher;
use crate::hash::SketchKey;

/// Default number of hash functions (rows).
pub const DEFAULT_NUM_HASHES: u8 = 8;
/// Default number of counters per row.
pub const DEFAULT_NUM_BUCKETS: u32 = 1024;

/// A Count-Min sketch: `num_hashes` rows of `num_buckets` counters each.
///
/// Every update increments one counter per row and the estimate of a key is the minimum of
/// its counters, so estimates never fall below the true frequency.
///
/// Every counter is bounded by `total_weight`, since each row's counters sum to it. Guarding
/// the total against overflow therefore guards every counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountMinSketch {
    num_hashes: u8,
    num_buckets: u32,
    seed: u64,
    total_weight: u64,
    hasher: RowHasher,
    counts: Vec<u64>,
}

impl Default for CountMinSketch {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_HASHES, DEFAULT_NUM_BUCKETS)
    }
}

impl CountMinSketch {
    /// Creates an empty sketch using the default seed.
    ///
    /// # Panics
    ///
    /// Panics if `num_hashes` or `num_buckets` is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cmsketch::countmin::CountMinSketch;
    /// let sketch = CountMinSketch::new(8, 1024);
    /// assert!(sketch.is_empty());
    /// ```
    pub fn new(num_hashes: u8, num_buckets: u32) -> Self {
        Self::with_seed(num_hashes, num_buckets, DEFAULT_SEED)
    }

    /// Creates an empty sketch with an explicit hash seed.
    ///
    /// Sketches can only be merged with sketches sharing the same seed.
    ///
    /// # Panics
    ///
    /// Panics if `num_hashes` or `num_buckets` is zero.
    pub fn with_seed(num_hashes: u8, num_buckets: u32, seed: u64) -> Self {
        assert!(num_hashes > 0, "num_hashes must be at least 1");
        assert!(num_buckets > 0, "num_buckets must be at least 1");
        Self::make(num_hashes, num_buckets, seed, 0, None)
    }

    pub(crate) fn make(
        num_hashes: u8,
        num_buckets: u32,
        seed: u64,
        total_weight: u64,
        counts: Option<Vec<u64>>,
    ) -> Self {
        let len = num_hashes as usize * num_buckets as usize;
        let counts = counts.unwrap_or_else(|| vec![0; len]);
        debug_assert_eq!(counts.len(), len);
        Self {
            num_hashes,
            num_buckets,
            seed,
            total_weight,
            hasher: RowHasher::new(seed, num_hashes),
            counts,
        }
    }

    /// Suggests the number of buckets per row for a target relative error.
    ///
    /// # Panics
    ///
    /// Panics if `relative_error` is not in (0.0, 1.0).
    ///
    /// # Examples
    ///
    /// ```
    /// # use cmsketch::countmin::CountMinSketch;
    /// assert_eq!(CountMinSketch::suggest_num_buckets(0.01), 272);
    /// ```
    pub fn suggest_num_buckets(relative_error: f64) -> u32 {
        assert!(
            relative_error > 0.0 && relative_error < 1.0,
            "relative_error must be in (0.0, 1.0), got {relative_error}"
        );
        (std::f64::consts::E / relative_error).ceil() as u32
    }

    /// Suggests the number of hash functions for a target confidence.
    ///
    /// # Panics
    ///
    /// Panics if `confidence` is not in (0.0, 1.0).
    ///
    /// # Examples
    ///
    /// ```
    /// # use cmsketch::countmin::CountMinSketch;
    /// assert_eq!(CountMinSketch::suggest_num_hashes(0.99), 5);
    /// ```
    pub fn suggest_num_hashes(confidence: f64) -> u8 {
        assert!(
            confidence > 0.0 && confidence < 1.0,
            "confidence must be in (0.0, 1.0), got {confidence}"
        );
        let hashes = (1.0 / (1.0 - confidence)).ln().ceil();
        hashes.clamp(1.0, u8::MAX as f64) as u8
    }

    /// Returns the number of hash functions (rows).
    pub fn num_hashes(&self) -> u8 {
        self.num_hashes
    }

    /// Returns the number of counters per row.
    pub fn num_buckets(&self) -> u32 {
        self.num_buckets
    }

    /// Returns the hash seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the sum of all update weights.
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Returns true if no weight has been added.
    pub fn is_empty(&self) -> bool {
        self.total_weight == 0
    }

    /// Returns the additive error per unit of total weight, `e / num_buckets`.
    pub fn relative_error(&self) -> f64 {
        std::f64::consts::E / self.num_buckets as f64
    }

    /// Returns the counter at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the position is outside the matrix.
    pub fn counter(&self, row: usize, col: usize) -> u64 {
        assert!(row < self.num_hashes as usize, "row out of bounds: {row}");
        assert!(col < self.num_buckets as usize, "col out of bounds: {col}");
        self.counts[row * self.num_buckets as usize + col]
    }

    /// Adds one occurrence of `key` and returns its new estimate.
    pub fn update<K: SketchKey + ?Sized>(&mut self, key: &K) -> Result<u64, Error> {
        self.update_with_weight(key, 1)
    }

    /// Adds `weight` occurrences of `key` and returns its new estimate.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::CounterOverflow`](crate::error::ErrorKind::CounterOverflow) if the
    /// total weight would exceed `u64::MAX`. The sketch is left unchanged in that case.
    pub fn update_with_weight<K: SketchKey + ?Sized>(
        &mut self,
        key: &K,
        weight: u64,
    ) -> Result<u64, Error> {
        if weight == 0 {
            return Ok(self.estimate(key));
        }
        self.total_weight = self
            .total_weight
            .checked_add(weight)
            .ok_or_else(Error::counter_overflow)?;
        Ok(key.with_key_bytes(|bytes| {
            let mut estimate = u64::MAX;
            for row in 0..self.num_hashes as usize {
                let index = self.index_of(bytes, row);
                self.counts[index] += weight;
                estimate = estimate.min(self.counts[index]);
            }
            estimate
        }))
    }

    /// Returns the estimated frequency of `key`.
    ///
    /// The estimate is never below the true frequency.
    pub fn estimate<K: SketchKey + ?Sized>(&self, key: &K) -> u64 {
        key.with_key_bytes(|bytes| {
            (0..self.num_hashes as usize)
                .map(|row| self.counts[self.index_of(bytes, row)])
                .min()
                .unwrap_or(0)
        })
    }

    /// Returns an upper bound of the true frequency of `key`.
    ///
    /// The Count-Min estimate only overcounts, so it is itself the upper bound.
    pub fn upper_bound<K: SketchKey + ?Sized>(&self, key: &K) -> u64 {
        self.estimate(key)
    }

    /// Returns a lower bound of the true frequency of `key`, which holds with the confidence
    /// implied by `num_hashes`.
    pub fn lower_bound<K: SketchKey + ?Sized>(&self, key: &K) -> u64 {
        let error = (self.relative_error() * self.total_weight as f64).ceil() as u64;
        self.estimate(key).saturating_sub(error)
    }

    /// Adds the counters of `other` into this sketch.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::DimensionMismatch`](crate::error::ErrorKind::DimensionMismatch) if
    /// the sketches differ in shape or seed, and
    /// [`ErrorKind::CounterOverflow`](crate::error::ErrorKind::CounterOverflow) if the combined
    /// weight does not fit. The sketch is left unchanged on error.
    pub fn merge(&mut self, other: &CountMinSketch) -> Result<(), Error> {
        self.check_compatible(other)?;
        self.total_weight = self
            .total_weight
            .checked_add(other.total_weight)
            .ok_or_else(Error::counter_overflow)?;
        for (count, delta) in self.counts.iter_mut().zip(other.counts.iter()) {
            *count += *delta;
        }
        Ok(())
    }

    /// Serializes this sketch to bytes.
    pub fn serialize(&self) -> Vec<u8> {
        serialization::serialize(self)
    }

    /// Deserializes a sketch built with the default seed.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        Self::deserialize_with_seed(bytes, DEFAULT_SEED)
    }

    /// Deserializes a sketch built with `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidData`](crate::error::ErrorKind::InvalidData) if the bytes
    /// are malformed or were produced with a different seed.
    pub fn deserialize_with_seed(bytes: &[u8], seed: u64) -> Result<Self, Error> {
        serialization::deserialize(bytes, seed)
    }

    pub(crate) fn check_compatible(&self, other: &CountMinSketch) -> Result<(), Error> {
        if self.num_hashes != other.num_hashes {
            return Err(Error::dimension_mismatch(
                "num_hashes",
                self.num_hashes as u64,
                other.num_hashes as u64,
            ));
        }
        if self.num_buckets != other.num_buckets {
            return Err(Error::dimension_mismatch(
                "num_buckets",
                self.num_buckets as u64,
                other.num_buckets as u64,
            ));
        }
        if self.seed != other.seed {
            return Err(Error::dimension_mismatch("seed", self.seed, other.seed));
        }
        Ok(())
    }

    pub(crate) fn counts(&self) -> &[u64] {
        &self.counts
    }

    #[inline]
    fn index_of(&self, key_bytes: &[u8], row: usize) -> usize {
        row * self.num_buckets as usize + self.hasher.column(key_bytes, row, self.num_buckets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_update_returns_running_estimate() {
        let mut sketch = CountMinSketch::new(4, 64);
        assert_eq!(sketch.update(&"a").unwrap(), 1);
        assert_eq!(sketch.update(&"a").unwrap(), 2);
        assert_eq!(sketch.update_with_weight(&"a", 5).unwrap(), 7);
        assert_eq!(sketch.total_weight(), 7);
        assert_eq!(sketch.estimate(&"a"), 7);
    }

    #[test]
    fn test_zero_weight_is_noop() {
        let mut sketch = CountMinSketch::new(2, 16);
        sketch.update(&1i64).unwrap();
        let before = sketch.clone();
        assert_eq!(sketch.update_with_weight(&1i64, 0).unwrap(), 1);
        assert_eq!(sketch, before);
    }

    #[test]
    fn test_each_row_sums_to_total_weight() {
        let mut sketch = CountMinSketch::new(3, 32);
        for key in 0..100i64 {
            sketch.update_with_weight(&key, (key % 3 + 1) as u64).unwrap();
        }
        for row in 0..3 {
            let sum: u64 = (0..32).map(|col| sketch.counter(row, col)).sum();
            assert_eq!(sum, sketch.total_weight());
        }
    }

    #[test]
    fn test_overflow_leaves_sketch_unchanged() {
        let mut sketch = CountMinSketch::new(2, 8);
        sketch.update_with_weight(&7i64, u64::MAX - 1).unwrap();
        let before = sketch.clone();
        let err = sketch.update_with_weight(&8i64, 2).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CounterOverflow);
        assert_eq!(sketch, before);
    }

    #[test]
    fn test_merge_rejects_mismatched_shapes() {
        let mut left = CountMinSketch::new(4, 64);
        let err = left.merge(&CountMinSketch::new(4, 128)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
        let err = left.merge(&CountMinSketch::new(5, 64)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
        let err = left
            .merge(&CountMinSketch::with_seed(4, 64, 1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
    }

    #[test]
    fn test_bounds_bracket_estimate() {
        let mut sketch = CountMinSketch::new(5, 16);
        for key in 0..1000i64 {
            sketch.update(&(key % 50)).unwrap();
        }
        let estimate = sketch.estimate(&3i64);
        assert!(estimate >= 20);
        assert_eq!(sketch.upper_bound(&3i64), estimate);
        assert!(sketch.lower_bound(&3i64) <= estimate);
    }

    #[test]
    #[should_panic(expected = "num_buckets must be at least 1")]
    fn test_zero_buckets_panics() {
        CountMinSketch::new(1, 0);
    }
}
