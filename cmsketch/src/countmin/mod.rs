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

//! Count-Min sketch implementation for frequency estimation.
//!
//! The Count-Min sketch provides approximate frequency counts for streaming data
//! with configurable relative error and confidence bounds. Its estimates are biased high:
//! hash collisions can only add to a key's counters, never take away.
//!
//! # Usage
//!
//! ```rust
//! use cmsketch::countmin::CountMinSketch;
//!
//! let mut sketch = CountMinSketch::new(5, 256);
//!
//! sketch.update("apple").unwrap();
//! sketch.update_with_weight("banana", 3).unwrap();
//!
//! let banana = sketch.estimate("banana");
//! assert!(banana >= 3);
//!
//! let lower = sketch.lower_bound("banana");
//! assert!(lower <= banana);
//! ```
//!
//! # Merging
//!
//! Sketches with the same shape and seed combine by summing counters, so partial sketches
//! built over independent partitions can be merged in any order.
//!
//! ```rust
//! use cmsketch::countmin::CountMinSketch;
//!
//! let mut left = CountMinSketch::new(8, 1024);
//! let mut right = CountMinSketch::new(8, 1024);
//! for key in [1i64, 1, 2] {
//!     left.update(&key).unwrap();
//! }
//! for key in [2i64, 3] {
//!     right.update(&key).unwrap();
//! }
//! left.merge(&right).unwrap();
//! assert!(left.estimate(&2i64) >= 2);
//! ```
//!
//! # Configuration Helpers
//!
//! ```rust
//! use cmsketch::countmin::CountMinSketch;
//!
//! let num_buckets = CountMinSketch::suggest_num_buckets(0.01);
//! let num_hashes = CountMinSketch::suggest_num_hashes(0.99);
//!
//! let _sketch = CountMinSketch::new(num_hashes, num_buckets);
//! ```

pub(crate) mod serialization;

mod sketch;
pub use self::sketch::CountMinSketch;
pub use self::sketch::DEFAULT_NUM_BUCKETS;
pub use self::sketch::DEFAULT_NUM_HASHES;
