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

use std::iter::FusedIterator;

use super::DyadicCountMinSketch;
use super::domain;
use crate::error::Error;

/// One bucket of a histogram: an inclusive key range and its estimated count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistogramBucket {
    lo: i64,
    hi: i64,
    count: u64,
}

impl HistogramBucket {
    pub(crate) fn new(lo: i64, hi: i64, count: u64) -> Self {
        Self { lo, hi, count }
    }

    /// Returns the smallest key of the bucket.
    pub fn lo(&self) -> i64 {
        self.lo
    }

    /// Returns the largest key of the bucket.
    pub fn hi(&self) -> i64 {
        self.hi
    }

    /// Returns the estimated number of observations in `[lo, hi]`.
    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Lazily evaluated equal-width histogram.
///
/// Created by [`DyadicCountMinSketch::width_histogram`]. Each call to `next` runs one range
/// count against the sketch. Cloning the iterator restarts the sequence from the current
/// position, so a fresh clone taken before iteration replays every bucket.
#[derive(Debug, Clone)]
pub struct WidthHistogram<'a> {
    sketch: &'a DyadicCountMinSketch,
    lo: u64,
    hi: u64,
    step: u64,
    num_buckets: u64,
    next: u64,
}

impl<'a> WidthHistogram<'a> {
    /// `lo` and `hi` are mapped bounds with `lo <= hi`; `num_buckets > 0`.
    pub(super) fn new(sketch: &'a DyadicCountMinSketch, lo: u64, hi: u64, num_buckets: u64) -> Self {
        debug_assert!(lo <= hi && num_buckets > 0);
        // never more buckets than keys; the span fits since the domain has 2^63 keys
        let span = hi - lo + 1;
        let num_buckets = num_buckets.min(span);
        Self {
            sketch,
            lo,
            hi,
            step: span / num_buckets,
            num_buckets,
            next: 0,
        }
    }
}

impl Iterator for WidthHistogram<'_> {
    type Item = Result<HistogramBucket, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.num_buckets {
            return None;
        }
        let index = self.next;
        self.next += 1;

        let first = self.lo + index * self.step;
        let last = if index + 1 == self.num_buckets {
            self.hi
        } else {
            first + self.step - 1
        };
        let bucket = self.sketch.range_count_mapped(first, last).map(|count| {
            HistogramBucket::new(domain::from_mapped(first), domain::from_mapped(last), count)
        });
        Some(bucket)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.num_buckets - self.next) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for WidthHistogram<'_> {}

impl FusedIterator for WidthHistogram<'_> {}
