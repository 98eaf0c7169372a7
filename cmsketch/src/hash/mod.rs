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

//! The hashing scheme that maps keys to counter columns.
//!
//! Each of the `num_hashes` rows of a counter matrix owns a 32-bit seed derived from the
//! sketch seed, and a key lands in column `murmur3(key_bytes, row_seed) mod num_buckets`.
//! Keys are hashed through a canonical byte encoding ([`SketchKey`]) rather than
//! [`std::hash::Hash`], whose output is allowed to vary between platforms and releases.
//! Sketches built on different machines are therefore mergeable as long as they share a seed.

mod murmurhash;

pub(crate) use self::murmurhash::murmur3_64;

/// The seed used when none is configured.
pub const DEFAULT_SEED: u64 = 9001;

/// A value that can be fed to a counter matrix.
///
/// Implementations must produce the same bytes on every platform: integers use their
/// little-endian two's complement representation, text uses UTF-8.
pub trait SketchKey {
    /// Calls `f` with the canonical byte encoding of this key.
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R;
}

macro_rules! impl_sketch_key_for_int {
    ($($name:ty),*) => {
        $(
            impl SketchKey for $name {
                #[inline]
                fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
                    f(&(*self as i64).to_le_bytes())
                }
            }
        )*
    };
}

impl_sketch_key_for_int!(i8, i16, i32, i64, u8, u16, u32);

impl SketchKey for u64 {
    #[inline]
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&self.to_le_bytes())
    }
}

impl SketchKey for [u8] {
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self)
    }
}

impl SketchKey for Vec<u8> {
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self)
    }
}

impl SketchKey for str {
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self.as_bytes())
    }
}

impl SketchKey for String {
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self.as_bytes())
    }
}

impl<T: SketchKey + ?Sized> SketchKey for &T {
    fn with_key_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        (**self).with_key_bytes(f)
    }
}

/// Per-row seeds of a counter matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RowHasher {
    row_seeds: Vec<u32>,
}

impl RowHasher {
    pub(crate) fn new(seed: u64, num_hashes: u8) -> Self {
        let seed_bytes = seed.to_le_bytes();
        let row_seeds = (0..num_hashes as u32)
            .map(|row| murmur3_64(&seed_bytes, row) as u32)
            .collect();
        Self { row_seeds }
    }

    /// Column of `key_bytes` in `row`.
    #[inline]
    pub(crate) fn column(&self, key_bytes: &[u8], row: usize, num_buckets: u32) -> usize {
        (murmur3_64(key_bytes, self.row_seeds[row]) % num_buckets as u64) as usize
    }
}

/// A 16-bit fingerprint of the seed, stored in serialized images so that sketches built
/// with different seeds are rejected on read.
pub(crate) fn compute_seed_hash(seed: u64) -> u16 {
    (murmur3_64(&seed.to_le_bytes(), 0) & 0xffff) as u16
}
