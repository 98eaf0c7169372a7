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

//! Three-step aggregation protocol for driving sketches from a query engine.
//!
//! An engine keeps one state per group and partition. It calls
//! [`accumulate`](Aggregate::accumulate) once per row, [`combine`](Aggregate::combine) to
//! fold partial states from parallel partitions, and [`finalize`](Aggregate::finalize) once
//! to produce the result. A state of `None` means no rows were seen, which lets the engine
//! start every group without allocating a sketch.
//!
//! ```rust
//! use cmsketch::aggregate::{Aggregate, RangeAggregate};
//!
//! let agg = RangeAggregate::default();
//! let mut left = None;
//! for key in [1, 1, 2] {
//!     left = agg.accumulate(left, key).unwrap();
//! }
//! let mut right = None;
//! for key in [2, 3] {
//!     right = agg.accumulate(right, key).unwrap();
//! }
//! let sketch = agg.finalize(agg.combine(left, right).unwrap()).unwrap();
//! assert_eq!(sketch.total_weight(), 5);
//! assert!(sketch.range_count(1, 2).unwrap() >= 4);
//! ```

use crate::countmin::DEFAULT_NUM_BUCKETS;
use crate::countmin::DEFAULT_NUM_HASHES;
use crate::dyadic::DyadicCountMinSketch;
use crate::error::Error;
use crate::hash::DEFAULT_SEED;
use crate::mfv::MfvSketch;
use crate::mfv::MfvSketchBuilder;
use crate::mfv::Stringify;

/// A sketch-backed aggregate function as seen by a query engine.
pub trait Aggregate {
    /// The sketch carried between steps.
    type Sketch;
    /// One input row.
    type Observation<'a>;
    /// The final result.
    type Output;

    /// Folds one observation into `state`.
    fn accumulate(
        &self,
        state: Option<Self::Sketch>,
        observation: Self::Observation<'_>,
    ) -> Result<Option<Self::Sketch>, Error>;

    /// Folds two partial states into one.
    fn combine(
        &self,
        left: Option<Self::Sketch>,
        right: Option<Self::Sketch>,
    ) -> Result<Option<Self::Sketch>, Error>;

    /// Produces the result of the aggregation.
    fn finalize(&self, state: Option<Self::Sketch>) -> Result<Self::Output, Error>;
}

/// Builds a [`DyadicCountMinSketch`] over `i64` observations for range, quantile and
/// histogram queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeAggregate {
    num_hashes: u8,
    num_buckets: u32,
    seed: u64,
}

impl Default for RangeAggregate {
    fn default() -> Self {
        Self::with_seed(DEFAULT_NUM_HASHES, DEFAULT_NUM_BUCKETS, DEFAULT_SEED)
    }
}

impl RangeAggregate {
    /// # Panics
    ///
    /// Panics if `num_hashes` or `num_buckets` is zero.
    pub fn new(num_hashes: u8, num_buckets: u32) -> Self {
        Self::with_seed(num_hashes, num_buckets, DEFAULT_SEED)
    }

    /// # Panics
    ///
    /// Panics if `num_hashes` or `num_buckets` is zero.
    pub fn with_seed(num_hashes: u8, num_buckets: u32, seed: u64) -> Self {
        assert!(num_hashes > 0, "num_hashes must be at least 1");
        assert!(num_buckets > 0, "num_buckets must be at least 1");
        Self {
            num_hashes,
            num_buckets,
            seed,
        }
    }

    fn empty(&self) -> DyadicCountMinSketch {
        DyadicCountMinSketch::with_seed(self.num_hashes, self.num_buckets, self.seed)
    }
}

impl Aggregate for RangeAggregate {
    type Sketch = DyadicCountMinSketch;
    type Observation<'a> = i64;
    type Output = DyadicCountMinSketch;

    fn accumulate(
        &self,
        state: Option<DyadicCountMinSketch>,
        observation: i64,
    ) -> Result<Option<DyadicCountMinSketch>, Error> {
        let mut sketch = state.unwrap_or_else(|| self.empty());
        sketch.insert(observation)?;
        Ok(Some(sketch))
    }

    fn combine(
        &self,
        left: Option<DyadicCountMinSketch>,
        right: Option<DyadicCountMinSketch>,
    ) -> Result<Option<DyadicCountMinSketch>, Error> {
        match (left, right) {
            (Some(mut left), Some(right)) => {
                left.merge(&right)?;
                Ok(Some(left))
            }
            (left, right) => Ok(left.or(right)),
        }
    }

    fn finalize(&self, state: Option<DyadicCountMinSketch>) -> Result<DyadicCountMinSketch, Error> {
        Ok(state.unwrap_or_else(|| self.empty()))
    }
}

/// Tracks the most frequent byte payloads and renders them with `S` at the end.
#[derive(Debug, Clone)]
pub struct MfvAggregate<S> {
    builder: MfvSketchBuilder,
    capacity: usize,
    stringify: S,
}

impl<S: Stringify> MfvAggregate<S> {
    /// Tracks up to `capacity` values with default sketch parameters.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize, stringify: S) -> Self {
        Self::with_builder(MfvSketch::builder(), capacity, stringify)
    }

    /// Tracks up to `capacity` values with sketches configured by `builder`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn with_builder(builder: MfvSketchBuilder, capacity: usize, stringify: S) -> Self {
        assert!(capacity > 0, "capacity must be at least 1");
        Self {
            builder,
            capacity,
            stringify,
        }
    }
}

impl<S: Stringify> Aggregate for MfvAggregate<S> {
    type Sketch = MfvSketch;
    type Observation<'a> = &'a [u8];
    type Output = Vec<(String, u64)>;

    fn accumulate(
        &self,
        state: Option<MfvSketch>,
        observation: &[u8],
    ) -> Result<Option<MfvSketch>, Error> {
        let mut sketch = match state {
            Some(sketch) => sketch,
            None => self.builder.clone().build(self.capacity)?,
        };
        sketch.offer(observation)?;
        Ok(Some(sketch))
    }

    fn combine(
        &self,
        left: Option<MfvSketch>,
        right: Option<MfvSketch>,
    ) -> Result<Option<MfvSketch>, Error> {
        match (left, right) {
            (Some(mut left), Some(right)) => {
                left.merge(&right)?;
                Ok(Some(left))
            }
            (left, right) => Ok(left.or(right)),
        }
    }

    fn finalize(&self, state: Option<MfvSketch>) -> Result<Vec<(String, u64)>, Error> {
        match state {
            Some(sketch) => sketch.top_k_with(&self.stringify),
            None => Ok(Vec::new()),
        }
    }
}
