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

//! An MFV image extends the shared preamble with two more words:
//!
//! ```text
//! bytes 24-27 capacity
//! bytes 28-31 active slot count
//! bytes 32-35 declared buffer size
//! bytes 36-39 buffer bytes used
//! ```
//!
//! The counter matrix follows, then one 16-byte record per slot in admission order
//! (`u32` offset, `u32` length, `u64` count) and finally the used part of the payload buffer.
//! Slot offsets are relative to the start of the image, so an image can be copied anywhere
//! and decoded in place.

use super::buffer::PayloadBuffer;
use super::buffer::PayloadRef;
use super::sketch::MfvSketch;
use super::sketch::Slot;
use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::codec::family::Family;
use crate::countmin::serialization::LONG_SIZE_BYTES;
use crate::countmin::serialization::make_error;
use crate::countmin::serialization::read_counters;
use crate::countmin::serialization::read_preamble;
use crate::countmin::serialization::write_counters;
use crate::countmin::serialization::write_preamble;
use crate::error::Error;

const PREAMBLE_LONGS_MFV: u8 = 5;
const SLOT_SIZE_BYTES: usize = 16;

pub(super) fn serialize(sketch: &MfvSketch) -> Result<Vec<u8>, Error> {
    let matrix = sketch.matrix();
    let slots = sketch.slots();
    let buffer = sketch.buffer();

    let counters_bytes = if matrix.is_empty() {
        0
    } else {
        matrix.counts().len() * LONG_SIZE_BYTES
    };
    let payload_start =
        PREAMBLE_LONGS_MFV as usize * LONG_SIZE_BYTES + counters_bytes + slots.len() * SLOT_SIZE_BYTES;
    let image_len = payload_start + buffer.used();
    if image_len > u32::MAX as usize {
        return Err(Error::invalid_argument("sketch image exceeds 32-bit offsets")
            .with_context("image_len", image_len));
    }

    let mut bytes = SketchBytes::with_capacity(image_len);
    write_preamble(&mut bytes, &Family::MFV, PREAMBLE_LONGS_MFV, 0, matrix);
    bytes.write_u32_le(header_word("capacity", sketch.capacity())?);
    bytes.write_u32_le(header_word("num_active", slots.len())?);
    bytes.write_u32_le(header_word("buffer_size", buffer.size())?);
    bytes.write_u32_le(header_word("buffer_used", buffer.used())?);
    write_counters(&mut bytes, matrix);
    for slot in slots {
        buffer.get(slot.payload)?;
        bytes.write_u32_le((payload_start + slot.payload.offset) as u32);
        bytes.write_u32_le(slot.payload.len as u32);
        bytes.write_u64_le(slot.count);
    }
    bytes.write(buffer.as_bytes());
    debug_assert_eq!(bytes.len(), image_len);
    Ok(bytes.into_bytes())
}

fn header_word(name: &'static str, value: usize) -> Result<u32, Error> {
    u32::try_from(value).map_err(|_| {
        Error::invalid_argument(format!("{name} does not fit in 32 bits"))
            .with_context(name, value)
    })
}

pub(super) fn deserialize(bytes: &[u8], seed: u64) -> Result<MfvSketch, Error> {
    let mut cursor = SketchSlice::new(bytes);
    let preamble = read_preamble(&mut cursor, &Family::MFV, seed)?;
    if preamble.ranges != 0 {
        return Err(Error::deserial(format!(
            "unexpected domain bit-width {} for an MFV sketch",
            preamble.ranges
        )));
    }
    let capacity = cursor.read_u32_le().map_err(make_error("capacity"))? as usize;
    let num_active = cursor.read_u32_le().map_err(make_error("num_active"))? as usize;
    let buffer_size = cursor.read_u32_le().map_err(make_error("buffer_size"))? as usize;
    let buffer_used = cursor.read_u32_le().map_err(make_error("buffer_used"))? as usize;
    if capacity == 0 {
        return Err(Error::deserial("capacity must be at least 1"));
    }
    if num_active > capacity {
        return Err(Error::deserial("more active slots than capacity")
            .with_context("num_active", num_active)
            .with_context("capacity", capacity));
    }
    if preamble.is_empty && num_active != 0 {
        return Err(Error::deserial("empty sketch with active slots")
            .with_context("num_active", num_active));
    }

    let matrix = read_counters(&mut cursor, &preamble, seed)?;

    if cursor.remaining() / SLOT_SIZE_BYTES < num_active {
        return Err(Error::insufficient_data("slots"));
    }
    let mut records = Vec::with_capacity(num_active);
    for _ in 0..num_active {
        let offset = cursor.read_u32_le().map_err(make_error("slot_offset"))? as usize;
        let len = cursor.read_u32_le().map_err(make_error("slot_len"))? as usize;
        let count = cursor.read_u64_le().map_err(make_error("slot_count"))?;
        records.push((offset, len, count));
    }

    let payload_start = cursor.position();
    if cursor.remaining() < buffer_used {
        return Err(Error::insufficient_data("payload_buffer"));
    }
    if cursor.remaining() > buffer_used {
        return Err(Error::deserial("trailing bytes after payload buffer")
            .with_context("remaining", cursor.remaining() - buffer_used));
    }
    let mut payloads = vec![0u8; buffer_used];
    cursor
        .read_exact(&mut payloads)
        .map_err(make_error("payload_buffer"))?;
    let buffer = PayloadBuffer::from_parts(buffer_size, payloads)?;

    let payload_end = payload_start + buffer_used;
    let mut slots = Vec::with_capacity(num_active);
    for (offset, len, count) in records {
        if offset < payload_start || offset + len > payload_end {
            tracing::debug!(offset, len, payload_start, payload_end, "rejected slot reference");
            return Err(Error::buffer_corruption(offset, len, payload_end));
        }
        slots.push(Slot {
            payload: PayloadRef {
                offset: offset - payload_start,
                len,
            },
            count,
        });
    }

    Ok(MfvSketch::make(matrix, capacity, slots, buffer))
}
