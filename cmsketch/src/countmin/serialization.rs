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

//! Binary layout shared by every counter-matrix based sketch.
//!
//! ```text
//! byte 0      preamble longs
//! byte 1      serial version
//! byte 2      family id
//! byte 3      flags
//! byte 4      domain bit-width (0 when the sketch has no dyadic levels)
//! byte 5      unused
//! bytes 6-7   seed hash
//! bytes 8-11  num buckets
//! byte 12     num hashes
//! bytes 13-15 unused
//! bytes 16-23 total weight
//! ```
//!
//! Family specific preamble words follow, then the counters of each matrix in row-major
//! order. Counters are omitted when the sketch is empty.

use super::CountMinSketch;
use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::codec::assert::ensure_preamble_longs_in;
use crate::codec::assert::ensure_serial_version_is;
use crate::codec::family::Family;
use crate::error::Error;
use crate::hash::compute_seed_hash;

pub(crate) const SERIAL_VERSION: u8 = 1;
pub(crate) const FLAGS_IS_EMPTY: u8 = 1 << 0;
pub(crate) const PREAMBLE_LONGS_SHORT: u8 = 3;
pub(crate) const LONG_SIZE_BYTES: usize = 8;

pub(crate) fn make_error(tag: &'static str) -> impl FnOnce(std::io::Error) -> Error {
    move |_| Error::insufficient_data(tag)
}

/// Shape and weight fields common to every matrix based image.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Preamble {
    pub(crate) preamble_longs: u8,
    pub(crate) ranges: u8,
    pub(crate) is_empty: bool,
    pub(crate) num_hashes: u8,
    pub(crate) num_buckets: u32,
    pub(crate) total_weight: u64,
}

pub(crate) fn write_preamble(
    bytes: &mut SketchBytes,
    family: &Family,
    preamble_longs: u8,
    ranges: u8,
    sketch: &CountMinSketch,
) {
    bytes.write_u8(preamble_longs);
    bytes.write_u8(SERIAL_VERSION);
    bytes.write_u8(family.id);
    bytes.write_u8(if sketch.is_empty() { FLAGS_IS_EMPTY } else { 0 });
    bytes.write_u8(ranges);
    bytes.write_u8(0);
    bytes.write_u16_le(compute_seed_hash(sketch.seed()));
    bytes.write_u32_le(sketch.num_buckets());
    bytes.write_u8(sketch.num_hashes());
    bytes.write_zeros(3);
    bytes.write_u64_le(sketch.total_weight());
}

pub(crate) fn read_preamble(
    cursor: &mut SketchSlice<'_>,
    family: &Family,
    seed: u64,
) -> Result<Preamble, Error> {
    let preamble_longs = cursor.read_u8().map_err(make_error("preamble_longs"))?;
    let serial_version = cursor.read_u8().map_err(make_error("serial_version"))?;
    let family_id = cursor.read_u8().map_err(make_error("family_id"))?;
    let flags = cursor.read_u8().map_err(make_error("flags"))?;
    let ranges = cursor.read_u8().map_err(make_error("ranges"))?;
    cursor.skip(1).map_err(make_error("unused"))?;
    let seed_hash = cursor.read_u16_le().map_err(make_error("seed_hash"))?;
    let num_buckets = cursor.read_u32_le().map_err(make_error("num_buckets"))?;
    let num_hashes = cursor.read_u8().map_err(make_error("num_hashes"))?;
    cursor.skip(3).map_err(make_error("unused"))?;
    let total_weight = cursor.read_u64_le().map_err(make_error("total_weight"))?;

    family.validate_id(family_id)?;
    ensure_serial_version_is(SERIAL_VERSION, serial_version)?;
    ensure_preamble_longs_in(&[family.min_pre_longs, family.max_pre_longs], preamble_longs)?;

    let expected_seed_hash = compute_seed_hash(seed);
    if seed_hash != expected_seed_hash {
        return Err(Error::deserial(format!(
            "incompatible seed hash: expected {expected_seed_hash}, got {seed_hash}"
        )));
    }
    if num_hashes == 0 || num_buckets == 0 {
        return Err(Error::deserial(format!(
            "invalid matrix shape: {num_hashes} hashes x {num_buckets} buckets"
        )));
    }
    let is_empty = (flags & FLAGS_IS_EMPTY) != 0;
    if is_empty != (total_weight == 0) {
        return Err(Error::deserial("empty flag disagrees with total weight")
            .with_context("total_weight", total_weight));
    }

    Ok(Preamble {
        preamble_longs,
        ranges,
        is_empty,
        num_hashes,
        num_buckets,
        total_weight,
    })
}

pub(crate) fn write_counters(bytes: &mut SketchBytes, sketch: &CountMinSketch) {
    if sketch.is_empty() {
        return;
    }
    for count in sketch.counts() {
        bytes.write_u64_le(*count);
    }
}

/// Reads one matrix described by `preamble`, checking that every row sums to the total
/// weight.
pub(crate) fn read_counters(
    cursor: &mut SketchSlice<'_>,
    preamble: &Preamble,
    seed: u64,
) -> Result<CountMinSketch, Error> {
    if preamble.is_empty {
        return Ok(CountMinSketch::make(
            preamble.num_hashes,
            preamble.num_buckets,
            seed,
            0,
            None,
        ));
    }

    let num_buckets = preamble.num_buckets as usize;
    let len = preamble.num_hashes as usize * num_buckets;
    if cursor.remaining() / LONG_SIZE_BYTES < len {
        return Err(Error::insufficient_data("counters"));
    }
    let mut counts = Vec::with_capacity(len);
    for _ in 0..len {
        counts.push(cursor.read_u64_le().map_err(make_error("counters"))?);
    }
    for (row, chunk) in counts.chunks(num_buckets).enumerate() {
        let sum = chunk.iter().try_fold(0u64, |acc, count| acc.checked_add(*count));
        if sum != Some(preamble.total_weight) {
            return Err(Error::deserial("row sum disagrees with total weight")
                .with_context("row", row)
                .with_context("total_weight", preamble.total_weight));
        }
    }

    Ok(CountMinSketch::make(
        preamble.num_hashes,
        preamble.num_buckets,
        seed,
        preamble.total_weight,
        Some(counts),
    ))
}

pub(super) fn serialize(sketch: &CountMinSketch) -> Vec<u8> {
    let counters_bytes = if sketch.is_empty() {
        0
    } else {
        sketch.counts().len() * LONG_SIZE_BYTES
    };
    let mut bytes =
        SketchBytes::with_capacity(PREAMBLE_LONGS_SHORT as usize * LONG_SIZE_BYTES + counters_bytes);
    write_preamble(&mut bytes, &Family::COUNTMIN, PREAMBLE_LONGS_SHORT, 0, sketch);
    write_counters(&mut bytes, sketch);
    bytes.into_bytes()
}

pub(super) fn deserialize(bytes: &[u8], seed: u64) -> Result<CountMinSketch, Error> {
    let mut cursor = SketchSlice::new(bytes);
    let preamble = read_preamble(&mut cursor, &Family::COUNTMIN, seed)?;
    if preamble.ranges != 0 {
        return Err(Error::deserial(format!(
            "unexpected domain bit-width {} for a plain CountMin sketch",
            preamble.ranges
        )));
    }
    let sketch = read_counters(&mut cursor, &preamble, seed)?;
    if cursor.remaining() != 0 {
        return Err(Error::deserial("trailing bytes after counters")
            .with_context("remaining", cursor.remaining()));
    }
    Ok(sketch)
}
