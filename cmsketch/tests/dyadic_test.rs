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

use cmsketch::dyadic::DyadicCountMinSketch;
use cmsketch::dyadic::HistogramBucket;
use cmsketch::dyadic::MAX_VALUE;
use cmsketch::dyadic::MIN_VALUE;
use cmsketch::dyadic::RANGES;
use cmsketch::dyadic::decompose;
use cmsketch::error::ErrorKind;
use googletest::assert_that;
use googletest::prelude::eq;
use googletest::prelude::ge;
use proptest::prelude::*;

fn sketch_of(keys: &[i64]) -> DyadicCountMinSketch {
    let mut sketch = DyadicCountMinSketch::default();
    for key in keys {
        sketch.insert(*key).unwrap();
    }
    sketch
}

fn assert_contiguous(buckets: &[HistogramBucket]) {
    for pair in buckets.windows(2) {
        assert_eq!(pair[0].hi() + 1, pair[1].lo(), "{buckets:?}");
    }
}

#[test]
fn test_small_range_scenario() {
    let sketch = sketch_of(&[5, 5, 5, 7, 7, 9]);
    assert_that!(sketch.range_count(5, 7).unwrap(), ge(5));
    assert_that!(sketch.range_count(MIN_VALUE, MAX_VALUE).unwrap(), eq(6));
    assert_that!(sketch.estimate(5).unwrap(), ge(3));
    assert_eq!(sketch.quantile(0.5).unwrap(), Some(5));
    assert_eq!(sketch.quantile(1.0).unwrap(), Some(9));
    assert_eq!(sketch.quantile(0.0).unwrap(), Some(5));
}

#[test]
fn test_partition_merge_scenario() {
    let mut left = sketch_of(&[1, 1, 2]);
    let right = sketch_of(&[2, 3]);
    left.merge(&right).unwrap();

    assert_eq!(left, sketch_of(&[1, 1, 2, 2, 3]));
    assert_eq!(left.total_weight(), 5);
    assert_that!(left.estimate(1).unwrap(), ge(2));
    assert_that!(left.estimate(2).unwrap(), ge(2));
    assert_that!(left.range_count(1, 3).unwrap(), ge(5));
}

#[test]
fn test_negative_keys() {
    let sketch = sketch_of(&[-10, -10, -3, 0, 4]);
    assert_that!(sketch.range_count(-10, -1).unwrap(), ge(3));
    assert_that!(sketch.range_count(MIN_VALUE, -1).unwrap(), ge(3));
    assert_eq!(sketch.quantile(0.4).unwrap(), Some(-10));
    assert_eq!(sketch.quantile(0.6).unwrap(), Some(-3));
}

#[test]
fn test_domain_boundaries() {
    let mut sketch = DyadicCountMinSketch::default();
    sketch.insert(MIN_VALUE).unwrap();
    sketch.insert(MAX_VALUE).unwrap();
    assert_that!(sketch.range_count(MIN_VALUE, MIN_VALUE).unwrap(), ge(1));
    assert_that!(sketch.range_count(MAX_VALUE, MAX_VALUE).unwrap(), ge(1));
    assert_eq!(sketch.quantile(0.0).unwrap(), Some(MIN_VALUE));
    assert_eq!(sketch.quantile(1.0).unwrap(), Some(MAX_VALUE));

    for key in [MIN_VALUE - 1, MAX_VALUE + 1, i64::MIN, i64::MAX] {
        assert_eq!(sketch.insert(key).unwrap_err().kind(), ErrorKind::DomainError);
        assert_eq!(sketch.estimate(key).unwrap_err().kind(), ErrorKind::DomainError);
    }
    assert_eq!(
        sketch.range_count(MIN_VALUE - 1, 0).unwrap_err().kind(),
        ErrorKind::DomainError
    );
    assert_eq!(sketch.total_weight(), 2);
}

#[test]
fn test_invalid_range() {
    let sketch = sketch_of(&[1]);
    let err = sketch.range_count(3, 2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRange);
    let err = sketch.width_histogram(3, 2, 4).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRange);
    let err = sketch.width_histogram(0, 2, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    let err = sketch.depth_histogram(0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn test_width_histogram() {
    let keys: Vec<i64> = (0..100).collect();
    let sketch = sketch_of(&keys);
    let histogram = sketch.width_histogram(0, 99, 4).unwrap();
    assert_eq!(histogram.len(), 4);
    let buckets: Vec<HistogramBucket> = histogram.collect::<Result<_, _>>().unwrap();
    assert_contiguous(&buckets);
    assert_eq!(buckets[0].lo(), 0);
    assert_eq!(buckets[3].hi(), 99);
    for bucket in &buckets {
        assert_eq!(bucket.hi() - bucket.lo() + 1, 25);
        assert_that!(bucket.count(), ge(25));
    }
}

#[test]
fn test_width_histogram_remainder_and_narrow_ranges() {
    let sketch = sketch_of(&[-3, -2, -1]);
    let buckets: Vec<HistogramBucket> = sketch
        .width_histogram(-3, 7, 3)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    let bounds: Vec<(i64, i64)> = buckets.iter().map(|b| (b.lo(), b.hi())).collect();
    assert_eq!(bounds, vec![(-3, -1), (0, 2), (3, 7)]);
    assert_that!(buckets[0].count(), ge(3));

    // more buckets than keys collapses to one bucket per key
    let buckets: Vec<HistogramBucket> = sketch
        .width_histogram(-2, -1, 10)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(buckets.len(), 2);
    assert_eq!((buckets[1].lo(), buckets[1].hi()), (-1, -1));
}

#[test]
fn test_width_histogram_is_replayable() {
    let sketch = sketch_of(&[1, 2, 3]);
    let histogram = sketch.width_histogram(0, 15, 4).unwrap();
    let first: Vec<_> = histogram.clone().map(Result::unwrap).collect();
    let second: Vec<_> = histogram.map(Result::unwrap).collect();
    assert_eq!(first, second);
}

#[test]
fn test_depth_histogram() {
    let keys: Vec<i64> = (1..=100).collect();
    let sketch = sketch_of(&keys);
    let buckets = sketch.depth_histogram(4).unwrap();
    assert_eq!(buckets.len(), 4);
    assert_eq!(buckets[0].lo(), MIN_VALUE);
    assert_eq!(buckets[3].hi(), MAX_VALUE);
    assert_contiguous(&buckets);
    let total: u64 = buckets.iter().map(HistogramBucket::count).sum();
    assert_that!(total, ge(100));
    assert_eq!(buckets[0].hi(), 25);
    assert_eq!(buckets[1].hi(), 50);
    assert_eq!(buckets[2].hi(), 75);
}

#[test]
fn test_depth_histogram_on_skewed_data() {
    let mut sketch = DyadicCountMinSketch::default();
    sketch.insert_with_weight(42, 1000).unwrap();
    let buckets = sketch.depth_histogram(5).unwrap();
    assert_eq!(buckets.len(), 2);
    assert_eq!((buckets[0].lo(), buckets[0].hi()), (MIN_VALUE, 42));
    assert_eq!((buckets[1].lo(), buckets[1].hi()), (43, MAX_VALUE));
    assert_that!(buckets[0].count(), ge(1000));

    assert!(DyadicCountMinSketch::default().depth_histogram(3).unwrap().is_empty());
}

#[test]
fn test_queries_are_idempotent() {
    let sketch = sketch_of(&[10, 20, 20, 30, 40, 40, 40]);
    let before = sketch.clone();
    let first = (
        sketch.range_count(15, 35).unwrap(),
        sketch.quantile(0.5).unwrap(),
        sketch.depth_histogram(3).unwrap(),
    );
    let second = (
        sketch.range_count(15, 35).unwrap(),
        sketch.quantile(0.5).unwrap(),
        sketch.depth_histogram(3).unwrap(),
    );
    assert_eq!(first, second);
    assert_eq!(sketch, before);
}

#[test]
fn test_merge_rejects_mismatch() {
    let mut sketch = DyadicCountMinSketch::new(2, 16);
    let err = sketch.merge(&DyadicCountMinSketch::new(2, 32)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
    let err = sketch
        .merge(&DyadicCountMinSketch::with_seed(2, 16, 1))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
}

#[test]
fn test_decomposition_bound_holds_everywhere() {
    let bounds = [MIN_VALUE, MIN_VALUE + 1, -12345, -1, 0, 1, 77, MAX_VALUE - 1, MAX_VALUE];
    for lo in bounds {
        for hi in bounds {
            if lo > hi {
                continue;
            }
            let ranges = decompose(lo, hi).unwrap();
            assert!(ranges.len() <= 2 * RANGES);
            assert_eq!(ranges.first().unwrap().lo(), lo);
            assert_eq!(ranges.last().unwrap().hi(), hi);
        }
    }
}

fn key() -> impl Strategy<Value = i64> {
    prop_oneof![-1000i64..1000, MIN_VALUE..=MAX_VALUE]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_decomposition_is_exact((lo, hi) in (key(), key()).prop_map(|(a, b)| (a.min(b), a.max(b)))) {
        let ranges = decompose(lo, hi).unwrap();
        prop_assert!(ranges.len() <= 2 * RANGES);
        let mut next = lo;
        for range in &ranges {
            prop_assert_eq!(range.lo(), next);
            prop_assert_eq!((range.hi() - range.lo()) as u64 + 1, range.width());
            prop_assert_eq!(range.lo() - MIN_VALUE, (range.bucket() << range.level()) as i64);
            if range.hi() == hi {
                break;
            }
            next = range.hi() + 1;
        }
        prop_assert_eq!(ranges.last().unwrap().hi(), hi);
    }

    #[test]
    fn test_range_count_never_undercounts(
        keys in prop::collection::vec(-500i64..500, 1..60),
        (lo, hi) in (-600i64..600, -600i64..600).prop_map(|(a, b)| (a.min(b), a.max(b))),
    ) {
        let mut sketch = DyadicCountMinSketch::new(2, 32);
        for key in &keys {
            sketch.insert(*key).unwrap();
        }
        let truth = keys.iter().filter(|key| (lo..=hi).contains(*key)).count() as u64;
        prop_assert!(sketch.range_count(lo, hi).unwrap() >= truth);
        prop_assert_eq!(sketch.range_count(MIN_VALUE, MAX_VALUE).unwrap(), keys.len() as u64);

        let fraction = 0.5;
        let median = sketch.quantile(fraction).unwrap().unwrap();
        let target = (fraction * keys.len() as f64).ceil() as u64;
        prop_assert!(sketch.range_count(MIN_VALUE, median).unwrap() >= target);
    }
}
