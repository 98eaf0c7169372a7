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

//! Dyadic range sketch over signed 64-bit keys.
//!
//! The sketch keeps one [`CountMinSketch`](crate::countmin::CountMinSketch) per power-of-two
//! scale of the key domain. A key is shifted into the unsigned working domain
//! `[0, 2^63 - 1]` and level `ℓ` counts the bucket `mapped >> ℓ`. Any inclusive range
//! decomposes into at most two buckets per level, so range counts, quantiles and histograms
//! cost a bounded number of point estimates.
//!
//! Keys must lie in `[MIN_VALUE, MAX_VALUE]`, which is `[-2^62, 2^62 - 1]`. Zero sits at
//! the midpoint of the working domain.
//!
//! # Usage
//!
//! ```rust
//! # use cmsketch::dyadic::DyadicCountMinSketch;
//! let mut sketch = DyadicCountMinSketch::new(4, 256);
//! for key in [5, 5, 5, 7, 7, 9] {
//!     sketch.insert(key).unwrap();
//! }
//! assert!(sketch.range_count(5, 7).unwrap() >= 5);
//! assert!(sketch.estimate(5).unwrap() >= 3);
//!
//! let median = sketch.quantile(0.5).unwrap().unwrap();
//! assert!(median <= 5);
//!
//! let buckets: Vec<_> = sketch
//!     .width_histogram(5, 9, 2)
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(buckets.len(), 2);
//! assert_eq!((buckets[0].lo(), buckets[0].hi()), (5, 6));
//! assert!(buckets[0].count() >= 3);
//! assert!(buckets[1].count() >= 3);
//! ```

mod decompose;
mod domain;
mod histogram;
mod serialization;
mod sketch;

pub use self::decompose::DyadicRange;
pub use self::decompose::decompose;
pub use self::domain::MAX_VALUE;
pub use self::domain::MIN_VALUE;
pub use self::histogram::HistogramBucket;
pub use self::histogram::WidthHistogram;
pub use self::sketch::DyadicCountMinSketch;

/// Number of dyadic levels, one per bit of the working domain.
pub const RANGES: usize = 64;
