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

use cmsketch::countmin::CountMinSketch;
use cmsketch::dyadic::DyadicCountMinSketch;
use cmsketch::error::ErrorKind;
use cmsketch::mfv::MfvSketch;
use googletest::assert_that;
use googletest::prelude::contains_substring;

fn populated_countmin(seed: u64) -> CountMinSketch {
    let mut sketch = CountMinSketch::with_seed(3, 64, seed);
    for i in 0..500u64 {
        sketch.update_with_weight(&(i % 37), i % 5 + 1).unwrap();
    }
    sketch
}

#[test]
fn test_countmin_round_trip() {
    for sketch in [CountMinSketch::new(1, 5), populated_countmin(9001)] {
        let bytes = sketch.serialize();
        let decoded = CountMinSketch::deserialize(&bytes).unwrap();
        assert_eq!(decoded, sketch);
        assert_eq!(decoded.serialize(), bytes);
    }
}

#[test]
fn test_countmin_custom_seed_round_trip() {
    let sketch = populated_countmin(42);
    let decoded = CountMinSketch::deserialize_with_seed(&sketch.serialize(), 42).unwrap();
    assert_eq!(decoded.seed(), 42);
    assert_eq!(decoded.estimate(&3u64), sketch.estimate(&3u64));
}

#[test]
fn test_countmin_wrong_seed() {
    let bytes = populated_countmin(9001).serialize();
    let err = CountMinSketch::deserialize_with_seed(&bytes, 9000).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert_that!(err.message(), contains_substring("incompatible seed hash"));
}

#[test]
fn test_countmin_rejects_corrupted_row() {
    let mut bytes = populated_countmin(9001).serialize();
    // first counter of row zero
    bytes[24] = bytes[24].wrapping_add(1);
    let err = CountMinSketch::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
    assert_that!(err.message(), contains_substring("row sum"));
}

#[test]
fn test_countmin_rejects_truncated_and_trailing_bytes() {
    let bytes = populated_countmin(9001).serialize();
    for len in [0, 7, 23, 24, bytes.len() - 1] {
        let err = CountMinSketch::deserialize(&bytes[..len]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData, "len {len}");
    }
    let mut longer = bytes.clone();
    longer.push(0);
    let err = CountMinSketch::deserialize(&longer).unwrap_err();
    assert_that!(err.message(), contains_substring("trailing bytes"));
}

#[test]
fn test_families_are_not_interchangeable() {
    let countmin = populated_countmin(9001).serialize();
    let mut dyadic = DyadicCountMinSketch::new(2, 8);
    dyadic.insert(1).unwrap();
    let dyadic = dyadic.serialize();
    let mfv = MfvSketch::new(2).serialize().unwrap();

    let err = DyadicCountMinSketch::deserialize(&countmin).unwrap_err();
    assert_that!(err.message(), contains_substring("invalid family"));
    let err = MfvSketch::deserialize(&dyadic).unwrap_err();
    assert_that!(err.message(), contains_substring("invalid family"));
    let err = CountMinSketch::deserialize(&mfv).unwrap_err();
    assert_that!(err.message(), contains_substring("invalid family"));
}

#[test]
fn test_unsupported_serial_version() {
    let mut bytes = populated_countmin(9001).serialize();
    bytes[1] = 2;
    let err = CountMinSketch::deserialize(&bytes).unwrap_err();
    assert_that!(err.message(), contains_substring("unsupported serial version"));
}

#[test]
fn test_dyadic_round_trip() {
    let mut sketch = DyadicCountMinSketch::new(3, 32);
    for key in -50..50 {
        sketch.insert_with_weight(key * 1_000_003, (key.unsigned_abs() % 3) + 1).unwrap();
    }
    let bytes = sketch.serialize();
    let decoded = DyadicCountMinSketch::deserialize(&bytes).unwrap();
    assert_eq!(decoded, sketch);
    assert_eq!(
        decoded.range_count(-1_000_000, 1_000_000).unwrap(),
        sketch.range_count(-1_000_000, 1_000_000).unwrap()
    );

    let err = DyadicCountMinSketch::deserialize_with_seed(&bytes, 7).unwrap_err();
    assert_that!(err.message(), contains_substring("incompatible seed hash"));
}

#[test]
fn test_mfv_round_trip_after_churn() {
    let mut sketch = MfvSketch::builder()
        .num_hashes(3)
        .num_buckets(64)
        .initial_buffer_size(8)
        .build(3)
        .unwrap();
    for i in 0..200u32 {
        let value = format!("value-{}", i % 11);
        sketch.offer_with_weight(value.as_bytes(), (i % 11) as u64 + 1).unwrap();
    }
    let bytes = sketch.serialize().unwrap();
    let decoded = MfvSketch::deserialize(&bytes).unwrap();
    assert_eq!(decoded, sketch);
    assert_eq!(decoded.top_k().unwrap(), sketch.top_k().unwrap());
    assert_eq!(decoded.total_weight(), sketch.total_weight());
    assert_eq!(decoded.buffer_size(), sketch.buffer_size());
    assert_eq!(decoded.serialize().unwrap(), bytes);
}

#[test]
fn test_mfv_rejects_zero_capacity() {
    let mut sketch = MfvSketch::new(2);
    sketch.offer(b"a").unwrap();
    let mut bytes = sketch.serialize().unwrap();
    bytes[24..28].copy_from_slice(&0u32.to_le_bytes());
    let err = MfvSketch::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidData);
}
