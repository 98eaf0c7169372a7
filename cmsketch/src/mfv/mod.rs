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

//! Most-frequent-value tracker.
//!
//! [`MfvSketch`] keeps a bounded set of candidate values together with their estimated
//! counts. Every offered value updates a [`CountMinSketch`](crate::countmin::CountMinSketch),
//! so a value that was evicted or never tracked still has an over-estimated frequency and can
//! displace an incumbent once its estimate grows past the smallest tracked count.
//!
//! Values are opaque byte payloads. Identical bytes are the same value. The payloads are
//! packed into a growable buffer that is compacted lazily when evictions leave dead space.
//! Converting payloads back to text happens only at output time, through a [`Stringify`].
//!
//! # Usage
//!
//! ```rust
//! # use cmsketch::mfv::{MfvSketch, Utf8Stringify};
//! let mut sketch = MfvSketch::new(2);
//! for value in ["A", "B", "A", "C", "A"] {
//!     sketch.offer(value.as_bytes()).unwrap();
//! }
//! let top = sketch.top_k_with(&Utf8Stringify).unwrap();
//! assert_eq!(top.len(), 2);
//! assert_eq!(top[0].0, "A");
//! assert!(top[0].1 >= 3);
//! ```
//!
//! # Merging
//!
//! ```rust
//! # use cmsketch::mfv::MfvSketch;
//! let mut left = MfvSketch::new(4);
//! let mut right = MfvSketch::new(4);
//! left.offer(b"x").unwrap();
//! right.offer_with_weight(b"x", 2).unwrap();
//! right.offer(b"y").unwrap();
//! left.merge(&right).unwrap();
//! assert_eq!(left.total_weight(), 4);
//! assert_eq!(left.top_k().unwrap()[0].count(), 3);
//! ```

mod buffer;
mod builder;
mod serialization;
mod sketch;
mod stringify;

pub use self::builder::DEFAULT_BUFFER_SIZE;
pub use self::builder::MfvSketchBuilder;
pub use self::sketch::MfvRow;
pub use self::sketch::MfvSketch;
pub use self::stringify::I64Stringify;
pub use self::stringify::Stringify;
pub use self::stringify::Utf8Stringify;
