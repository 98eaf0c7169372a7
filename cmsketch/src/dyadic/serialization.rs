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

//! A dyadic image is the shared preamble with the domain bit-width set, followed by the
//! counters of every level from 0 to 63. Each level repeats the same shape and total
//! weight, so only the first preamble is written.

use super::RANGES;
use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::codec::family::Family;
use crate::countmin::CountMinSketch;
use crate::countmin::serialization::LONG_SIZE_BYTES;
use crate::countmin::serialization::PREAMBLE_LONGS_SHORT;
use crate::countmin::serialization::read_counters;
use crate::countmin::serialization::read_preamble;
use crate::countmin::serialization::write_counters;
use crate::countmin::serialization::write_preamble;
use crate::error::Error;

pub(super) fn serialize(levels: &[CountMinSketch]) -> Vec<u8> {
    let first = &levels[0];
    let counters_bytes = if first.is_empty() {
        0
    } else {
        levels.len() * first.counts().len() * LONG_SIZE_BYTES
    };
    let mut bytes = SketchBytes::with_capacity(
        PREAMBLE_LONGS_SHORT as usize * LONG_SIZE_BYTES + counters_bytes,
    );
    write_preamble(
        &mut bytes,
        &Family::DYADIC_COUNTMIN,
        PREAMBLE_LONGS_SHORT,
        RANGES as u8,
        first,
    );
    for level in levels {
        write_counters(&mut bytes, level);
    }
    bytes.into_bytes()
}

pub(super) fn deserialize(bytes: &[u8], seed: u64) -> Result<Vec<CountMinSketch>, Error> {
    let mut cursor = SketchSlice::new(bytes);
    let preamble = read_preamble(&mut cursor, &Family::DYADIC_COUNTMIN, seed)?;
    if preamble.ranges as usize != RANGES {
        return Err(Error::deserial(format!(
            "unsupported domain bit-width: expected {RANGES}, got {}",
            preamble.ranges
        )));
    }

    let mut levels = Vec::with_capacity(RANGES);
    for level in 0..RANGES {
        let sketch = read_counters(&mut cursor, &preamble, seed)
            .map_err(|err| err.with_context("level", level))?;
        levels.push(sketch);
    }
    if cursor.remaining() != 0 {
        return Err(Error::deserial("trailing bytes after counters")
            .with_context("remaining", cursor.remaining()));
    }
    Ok(levels)
}
