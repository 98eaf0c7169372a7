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

use super::buffer::PayloadBuffer;
use super::sketch::MfvSketch;
use crate::countmin::CountMinSketch;
use crate::countmin::DEFAULT_NUM_BUCKETS;
use crate::countmin::DEFAULT_NUM_HASHES;
use crate::error::Error;
use crate::hash::DEFAULT_SEED;

/// Initial declared size of the payload buffer, in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Builder for [`MfvSketch`] with custom matrix and buffer parameters.
///
/// Unlike [`MfvSketch::new`], invalid parameters are reported as errors from
/// [`build`](Self::build) rather than panics.
#[derive(Debug, Clone)]
pub struct MfvSketchBuilder {
    num_hashes: u8,
    num_buckets: u32,
    seed: u64,
    initial_buffer_size: usize,
}

impl Default for MfvSketchBuilder {
    fn default() -> Self {
        Self {
            num_hashes: DEFAULT_NUM_HASHES,
            num_buckets: DEFAULT_NUM_BUCKETS,
            seed: DEFAULT_SEED,
            initial_buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl MfvSketchBuilder {
    /// Sets the number of hash rows of the frequency matrix.
    pub fn num_hashes(mut self, num_hashes: u8) -> Self {
        self.num_hashes = num_hashes;
        self
    }

    /// Sets the number of counters per row of the frequency matrix.
    pub fn num_buckets(mut self, num_buckets: u32) -> Self {
        self.num_buckets = num_buckets;
        self
    }

    /// Sets the hash seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the initial declared size of the payload buffer. The buffer grows on demand.
    pub fn initial_buffer_size(mut self, initial_buffer_size: usize) -> Self {
        self.initial_buffer_size = initial_buffer_size;
        self
    }

    /// Builds a tracker for up to `capacity` values.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if
    /// `capacity`, `num_hashes` or `num_buckets` is zero, or if the buffer size exceeds
    /// `u32::MAX`.
    pub fn build(self, capacity: usize) -> Result<MfvSketch, Error> {
        if capacity == 0 {
            return Err(Error::invalid_argument("capacity must be at least 1"));
        }
        if capacity > u32::MAX as usize {
            return Err(Error::invalid_argument("capacity must fit in 32 bits")
                .with_context("capacity", capacity));
        }
        if self.num_hashes == 0 {
            return Err(Error::invalid_argument("num_hashes must be at least 1"));
        }
        if self.num_buckets == 0 {
            return Err(Error::invalid_argument("num_buckets must be at least 1"));
        }
        if self.initial_buffer_size > PayloadBuffer::MAX_SIZE {
            return Err(Error::invalid_argument("initial_buffer_size must fit in 32 bits")
                .with_context("initial_buffer_size", self.initial_buffer_size));
        }
        let matrix = CountMinSketch::with_seed(self.num_hashes, self.num_buckets, self.seed);
        Ok(MfvSketch::make(
            matrix,
            capacity,
            Vec::new(),
            PayloadBuffer::new(self.initial_buffer_size),
        ))
    }
}
