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

//! Canonical dyadic covering of an inclusive key range.
//!
//! The dyadic buckets form a binary tree over the working domain: the root is the single
//! level-63 bucket and every bucket at level `ℓ > 0` splits into two at level `ℓ - 1`.
//! Walking down from the root, a bucket fully inside the query is emitted whole and a
//! disjoint bucket is dropped; only partially covered buckets are split. At most two
//! buckets per level survive, and unit buckets are never partially covered, so the walk
//! stops at level 0 at the latest.

use super::RANGES;
use super::domain;
use crate::error::Error;

const ROOT_LEVEL: u8 = (RANGES - 1) as u8;

/// One dyadic bucket `[bucket · 2^level, (bucket + 1) · 2^level - 1]` of the working domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DyadicRange {
    level: u8,
    bucket: u64,
}

impl DyadicRange {
    pub(crate) fn new(level: u8, bucket: u64) -> Self {
        debug_assert!(level <= ROOT_LEVEL);
        Self { level, bucket }
    }

    /// Returns the scale of this range; the range spans `2^level` keys.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Returns the index of this range among the buckets of its level.
    pub fn bucket(&self) -> u64 {
        self.bucket
    }

    /// Returns the number of keys covered by this range.
    pub fn width(&self) -> u64 {
        1u64 << self.level
    }

    /// Returns the smallest key of this range.
    pub fn lo(&self) -> i64 {
        domain::from_mapped(self.first_mapped())
    }

    /// Returns the largest key of this range.
    pub fn hi(&self) -> i64 {
        domain::from_mapped(self.last_mapped())
    }

    fn first_mapped(&self) -> u64 {
        self.bucket << self.level
    }

    fn last_mapped(&self) -> u64 {
        self.first_mapped() + (self.width() - 1)
    }
}

/// Decomposes `[lo, hi]` into the minimal ordered set of disjoint dyadic ranges whose union
/// is exactly `[lo, hi]`.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidRange`](crate::error::ErrorKind::InvalidRange) if `lo > hi`
/// and [`ErrorKind::DomainError`](crate::error::ErrorKind::DomainError) if a bound lies
/// outside `[MIN_VALUE, MAX_VALUE]`.
///
/// # Examples
///
/// ```
/// # use cmsketch::dyadic::decompose;
/// let ranges = decompose(14, 48).unwrap();
/// assert_eq!(ranges.first().unwrap().lo(), 14);
/// assert_eq!(ranges.last().unwrap().hi(), 48);
/// let covered: u64 = ranges.iter().map(|range| range.width()).sum();
/// assert_eq!(covered, 35);
/// ```
pub fn decompose(lo: i64, hi: i64) -> Result<Vec<DyadicRange>, Error> {
    if lo > hi {
        return Err(Error::invalid_range(lo, hi));
    }
    let lo = domain::to_mapped(lo)?;
    let hi = domain::to_mapped(hi)?;
    Ok(decompose_mapped(lo, hi))
}

/// Same as [`decompose`] on already mapped bounds, `lo <= hi`.
pub(crate) fn decompose_mapped(lo: u64, hi: u64) -> Vec<DyadicRange> {
    debug_assert!(lo <= hi);
    let mut ranges = Vec::new();
    descend(DyadicRange::new(ROOT_LEVEL, 0), lo, hi, &mut ranges);
    ranges
}

fn descend(node: DyadicRange, lo: u64, hi: u64, ranges: &mut Vec<DyadicRange>) {
    let first = node.first_mapped();
    let last = node.last_mapped();
    if last < lo || first > hi {
        return;
    }
    if lo <= first && last <= hi {
        ranges.push(node);
        return;
    }
    // partially covered, hence wider than one key
    let level = node.level - 1;
    descend(DyadicRange::new(level, node.bucket << 1), lo, hi, ranges);
    descend(DyadicRange::new(level, (node.bucket << 1) | 1), lo, hi, ranges);
}
