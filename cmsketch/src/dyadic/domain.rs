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

//! The bijection between signed keys and the unsigned working domain of the dyadic levels.
//!
//! The signed domain `[MIN_VALUE, MAX_VALUE]` is symmetric about zero and half the width of
//! `i64`, which keeps `hi - lo + 1` and every midpoint representable. Shifting by
//! `-MIN_VALUE` places it on `[0, MAPPED_MAX]`, where dyadic buckets are plain shifts.

use crate::error::Error;

/// Smallest key accepted by the dyadic sketch, `-2^62`.
pub const MIN_VALUE: i64 = i64::MIN >> 1;
/// Largest key accepted by the dyadic sketch, `2^62 - 1`.
pub const MAX_VALUE: i64 = i64::MAX >> 1;

/// Largest working-domain value, `2^63 - 1`.
pub(crate) const MAPPED_MAX: u64 = (MAX_VALUE - MIN_VALUE) as u64;

/// Maps a signed key onto the working domain.
///
/// # Errors
///
/// Returns [`ErrorKind::DomainError`](crate::error::ErrorKind::DomainError) if the key lies
/// outside `[MIN_VALUE, MAX_VALUE]`.
pub(crate) fn to_mapped(key: i64) -> Result<u64, Error> {
    if !(MIN_VALUE..=MAX_VALUE).contains(&key) {
        return Err(Error::out_of_domain(key));
    }
    Ok((key - MIN_VALUE) as u64)
}

/// Inverse of [`to_mapped`].
pub(crate) fn from_mapped(mapped: u64) -> i64 {
    debug_assert!(mapped <= MAPPED_MAX, "mapped value out of range: {mapped}");
    mapped as i64 + MIN_VALUE
}
