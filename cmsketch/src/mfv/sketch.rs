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

use super::builder::DEFAULT_BUFFER_SIZE;
use super::builder::MfvSketchBuilder;
use super::buffer::PayloadBuffer;
use super::buffer::PayloadRef;
use super::serialization;
use super::stringify::Stringify;
use crate::countmin::CountMinSketch;
use crate::error::Error;
use crate::hash::DEFAULT_SEED;

/// One tracked value: where its payload lives and its latest estimated count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Slot {
    pub(crate) payload: PayloadRef,
    pub(crate) count: u64,
}

/// A tracked value returned by [`MfvSketch::top_k`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfvRow {
    payload: Vec<u8>,
    count: u64,
}

impl MfvRow {
    /// Returns the payload bytes of the value.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Returns the estimated count of the value. Never below the true count.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Consumes the row, returning its payload and count.
    pub fn into_parts(self) -> (Vec<u8>, u64) {
        (self.payload, self.count)
    }
}

/// Bounded tracker of the most frequent values in a stream.
///
/// A [`CountMinSketch`] estimates the frequency of every offered payload, including those not
/// currently tracked, and at most `capacity` candidates are kept with their latest estimate.
/// Once the tracker is full, a newcomer replaces the candidate with the smallest count (the
/// earliest admitted among equals) only if its estimate is strictly greater.
///
/// See the [mfv module level documentation](crate::mfv) for more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MfvSketch {
    matrix: CountMinSketch,
    capacity: usize,
    // admission order
    slots: Vec<Slot>,
    buffer: PayloadBuffer,
}

impl MfvSketch {
    /// Creates a tracker for up to `capacity` values with default matrix parameters.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or does not fit in 32 bits.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "capacity must be at least 1");
        assert!(
            capacity <= u32::MAX as usize,
            "capacity must fit in 32 bits, got {capacity}"
        );
        Self::make(
            CountMinSketch::default(),
            capacity,
            Vec::new(),
            PayloadBuffer::new(DEFAULT_BUFFER_SIZE),
        )
    }

    /// Returns a builder for trackers with custom parameters.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cmsketch::mfv::MfvSketch;
    /// let sketch = MfvSketch::builder()
    ///     .num_hashes(4)
    ///     .num_buckets(512)
    ///     .initial_buffer_size(64)
    ///     .build(10)
    ///     .unwrap();
    /// assert_eq!(sketch.capacity(), 10);
    /// assert_eq!(sketch.buffer_size(), 64);
    /// ```
    pub fn builder() -> MfvSketchBuilder {
        MfvSketchBuilder::default()
    }

    pub(super) fn make(
        matrix: CountMinSketch,
        capacity: usize,
        slots: Vec<Slot>,
        buffer: PayloadBuffer,
    ) -> Self {
        Self {
            matrix,
            capacity,
            slots,
            buffer,
        }
    }

    /// Returns the maximum number of tracked values.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of values currently tracked.
    pub fn num_active(&self) -> usize {
        self.slots.len()
    }

    /// Returns the declared size of the payload buffer in bytes.
    pub fn buffer_size(&self) -> usize {
        self.buffer.size()
    }

    /// Returns the position of the payload buffer cursor, dead bytes included.
    pub fn buffer_used(&self) -> usize {
        self.buffer.used()
    }

    /// Returns the total weight offered.
    pub fn total_weight(&self) -> u64 {
        self.matrix.total_weight()
    }

    /// Returns true if nothing has been offered.
    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }

    /// Returns the frequency matrix backing the estimates.
    pub fn matrix(&self) -> &CountMinSketch {
        &self.matrix
    }

    /// Returns the estimated frequency of `payload`, tracked or not.
    pub fn estimate(&self, payload: &[u8]) -> u64 {
        self.matrix.estimate(payload)
    }

    /// Offers one occurrence of the value identified by `payload`.
    pub fn offer(&mut self, payload: &[u8]) -> Result<(), Error> {
        self.offer_with_weight(payload, 1)
    }

    /// Offers `weight` occurrences of the value identified by `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::CounterOverflow`](crate::error::ErrorKind::CounterOverflow) if the
    /// total weight would overflow and
    /// [`ErrorKind::InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if an untracked
    /// payload could not be stored next to the tracked ones within the buffer limit. The
    /// tracker is left unchanged on error.
    pub fn offer_with_weight(&mut self, payload: &[u8], weight: u64) -> Result<(), Error> {
        if weight == 0 {
            return Ok(());
        }
        if self.position(payload)?.is_none() {
            self.ensure_room(payload.len())?;
        }
        let estimate = self.matrix.update_with_weight(payload, weight)?;
        self.admit(payload, estimate)
    }

    /// Folds `other` into this tracker.
    ///
    /// Frequency matrices are summed, the counts of tracked values are refreshed from the
    /// merged matrix, and then every candidate of `other` is offered again in its admission
    /// order at its merged estimate.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::DimensionMismatch`](crate::error::ErrorKind::DimensionMismatch) if
    /// the matrix shape, seed or capacity differ.
    pub fn merge(&mut self, other: &MfvSketch) -> Result<(), Error> {
        self.matrix.check_compatible(&other.matrix)?;
        if self.capacity != other.capacity {
            return Err(Error::dimension_mismatch(
                "capacity",
                self.capacity as u64,
                other.capacity as u64,
            ));
        }
        self.matrix.merge(&other.matrix)?;

        for index in 0..self.slots.len() {
            let payload = self.buffer.get(self.slots[index].payload)?;
            self.slots[index].count = self.matrix.estimate(payload);
        }
        for slot in &other.slots {
            let payload = other.buffer.get(slot.payload)?;
            let estimate = self.matrix.estimate(payload);
            self.admit(payload, estimate)?;
        }
        tracing::debug!(
            num_active = self.slots.len(),
            total_weight = self.total_weight(),
            "merged most-frequent-value sketches"
        );
        Ok(())
    }

    /// Returns the tracked values sorted by count descending, ties in admission order.
    ///
    /// # Examples
    ///
    /// ```
    /// # use cmsketch::mfv::MfvSketch;
    /// let mut sketch = MfvSketch::new(2);
    /// for value in ["a", "b", "a", "c", "a"] {
    ///     sketch.offer(value.as_bytes()).unwrap();
    /// }
    /// let rows = sketch.top_k().unwrap();
    /// assert_eq!(rows.len(), 2);
    /// assert_eq!(rows[0].payload(), b"a");
    /// assert!(rows[0].count() >= 3);
    /// ```
    pub fn top_k(&self) -> Result<Vec<MfvRow>, Error> {
        let mut rows = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            rows.push(MfvRow {
                payload: self.buffer.get(slot.payload)?.to_vec(),
                count: slot.count,
            });
        }
        // stable, and slots are in admission order
        rows.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(rows)
    }

    /// Returns [`top_k`](Self::top_k) with every payload rendered by `stringify`.
    pub fn top_k_with<S: Stringify + ?Sized>(
        &self,
        stringify: &S,
    ) -> Result<Vec<(String, u64)>, Error> {
        Ok(self
            .top_k()?
            .into_iter()
            .map(|row| (stringify.stringify(&row.payload), row.count))
            .collect())
    }

    /// Serializes this tracker to bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, Error> {
        serialization::serialize(self)
    }

    /// Deserializes a tracker built with the default seed.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        Self::deserialize_with_seed(bytes, DEFAULT_SEED)
    }

    /// Deserializes a tracker built with `seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::BufferCorruption`](crate::error::ErrorKind::BufferCorruption) if a
    /// slot references bytes outside the payload section or overlaps another slot, and
    /// [`ErrorKind::InvalidData`](crate::error::ErrorKind::InvalidData) for any other
    /// malformed image.
    pub fn deserialize_with_seed(bytes: &[u8], seed: u64) -> Result<Self, Error> {
        let sketch = serialization::deserialize(bytes, seed)?;
        sketch.check_payloads()?;
        Ok(sketch)
    }

    pub(super) fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub(super) fn buffer(&self) -> &PayloadBuffer {
        &self.buffer
    }

    /// Checks that every live payload lies below the cursor and that no two non-empty
    /// payloads overlap.
    pub(crate) fn check_payloads(&self) -> Result<(), Error> {
        let mut refs: Vec<PayloadRef> = self.slots.iter().map(|slot| slot.payload).collect();
        refs.sort_by_key(|payload| payload.offset);
        let mut end = 0;
        for payload in refs {
            self.buffer.get(payload)?;
            if payload.len == 0 {
                continue;
            }
            if payload.offset < end {
                return Err(Error::buffer_corruption(payload.offset, payload.len, end));
            }
            end = payload.end();
        }
        Ok(())
    }

    fn admit(&mut self, payload: &[u8], estimate: u64) -> Result<(), Error> {
        if let Some(index) = self.position(payload)? {
            self.slots[index].count = estimate;
            return Ok(());
        }
        // checked before any eviction so that storing the newcomer cannot fail
        self.ensure_room(payload.len())?;

        if self.slots.len() >= self.capacity {
            // first minimum is the earliest admitted
            let Some((index, min)) = self
                .slots
                .iter()
                .enumerate()
                .min_by_key(|(_, slot)| slot.count)
            else {
                return Ok(());
            };
            if estimate <= min.count {
                return Ok(());
            }
            let evicted = self.slots.remove(index);
            tracing::debug!(
                evicted_count = evicted.count,
                evicted_len = evicted.payload.len,
                estimate,
                "evicted most-frequent-value candidate"
            );
        }

        let payload = self.store(payload)?;
        self.slots.push(Slot {
            payload,
            count: estimate,
        });
        Ok(())
    }

    /// Fails unless `len` more bytes fit next to every live payload once compacted.
    fn ensure_room(&self, len: usize) -> Result<(), Error> {
        let live: usize = self.slots.iter().map(|slot| slot.payload.len).sum();
        match live.checked_add(len) {
            Some(required) if required <= self.buffer.max_size() => Ok(()),
            _ => Err(
                Error::invalid_argument("payload does not fit within the buffer limit")
                    .with_context("len", len)
                    .with_context("live", live)
                    .with_context("max_size", self.buffer.max_size()),
            ),
        }
    }

    fn position(&self, payload: &[u8]) -> Result<Option<usize>, Error> {
        for (index, slot) in self.slots.iter().enumerate() {
            if self.buffer.get(slot.payload)? == payload {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    fn store(&mut self, payload: &[u8]) -> Result<PayloadRef, Error> {
        if let Some(stored) = self.buffer.append(payload) {
            return Ok(stored);
        }

        let mut live: Vec<&mut PayloadRef> =
            self.slots.iter_mut().map(|slot| &mut slot.payload).collect();
        let reclaimed = self.buffer.compact(&mut live)?;
        tracing::debug!(
            reclaimed,
            used = self.buffer.used(),
            size = self.buffer.size(),
            "compacted payload buffer"
        );
        if let Some(stored) = self.buffer.append(payload) {
            return Ok(stored);
        }

        let old_size = self.buffer.size();
        self.buffer.grow_to_fit(payload.len())?;
        tracing::debug!(old_size, new_size = self.buffer.size(), "grew payload buffer");
        self.buffer
            .append(payload)
            .ok_or_else(|| Error::buffer_corruption(self.buffer.used(), payload.len(), self.buffer.size()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn sketch(capacity: usize, buffer_size: usize) -> MfvSketch {
        MfvSketch::builder()
            .num_hashes(4)
            .num_buckets(256)
            .initial_buffer_size(buffer_size)
            .build(capacity)
            .unwrap()
    }

    #[test]
    fn test_existing_value_updates_count() {
        let mut sketch = sketch(4, 64);
        sketch.offer(b"x").unwrap();
        sketch.offer_with_weight(b"x", 4).unwrap();
        assert_eq!(sketch.num_active(), 1);
        assert_eq!(sketch.buffer_used(), 1);
        let rows = sketch.top_k().unwrap();
        assert_eq!(rows[0].count(), 5);
    }

    #[test]
    fn test_newcomer_must_beat_minimum() {
        let mut sketch = sketch(1, 64);
        sketch.offer_with_weight(b"old", 2).unwrap();
        sketch.offer_with_weight(b"new", 2).unwrap();
        assert_eq!(sketch.top_k().unwrap()[0].payload(), b"old");
        sketch.offer(b"new").unwrap();
        assert_eq!(sketch.top_k().unwrap()[0].payload(), b"new");
        assert_eq!(sketch.num_active(), 1);
    }

    #[test]
    fn test_ties_evict_earliest_admitted() {
        let mut sketch = sketch(2, 64);
        sketch.offer(b"first").unwrap();
        sketch.offer(b"second").unwrap();
        sketch.offer_with_weight(b"third", 2).unwrap();
        let payloads: Vec<_> = sketch
            .top_k()
            .unwrap()
            .into_iter()
            .map(|row| row.into_parts().0)
            .collect();
        assert_eq!(payloads, vec![b"third".to_vec(), b"second".to_vec()]);
    }

    #[test]
    fn test_eviction_compacts_before_growing() {
        let mut sketch = sketch(2, 8);
        sketch.offer(b"aaaa").unwrap();
        sketch.offer(b"bbbb").unwrap();
        assert_eq!(sketch.buffer_used(), 8);
        sketch.offer_with_weight(b"cccc", 3).unwrap();
        // "aaaa" was evicted and its four bytes reused
        assert_eq!(sketch.buffer_size(), 8);
        assert_eq!(sketch.buffer_used(), 8);
        sketch.check_payloads().unwrap();
        let rows = sketch.top_k().unwrap();
        assert_eq!(rows[0].payload(), b"cccc");
        assert_eq!(rows[1].payload(), b"bbbb");
    }

    #[test]
    fn test_large_payload_grows_buffer() {
        let mut sketch = sketch(2, 4);
        sketch.offer(&[7u8; 20]).unwrap();
        assert_eq!(sketch.buffer_size(), 32);
        assert_eq!(sketch.top_k().unwrap()[0].payload(), &[7u8; 20]);
    }

    #[test]
    fn test_zero_weight_is_noop() {
        let mut sketch = sketch(2, 8);
        sketch.offer_with_weight(b"a", 0).unwrap();
        assert!(sketch.is_empty());
        assert_eq!(sketch.num_active(), 0);
    }

    #[test]
    fn test_merge_rejects_different_capacity() {
        let mut left = sketch(2, 8);
        let right = sketch(3, 8);
        let err = left.merge(&right).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
    }

    #[test]
    #[should_panic(expected = "capacity must be at least 1")]
    fn test_zero_capacity_panics() {
        MfvSketch::new(0);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    #[should_panic(expected = "capacity must fit in 32 bits")]
    fn test_oversized_capacity_panics() {
        MfvSketch::new(u32::MAX as usize + 1);
    }

    #[test]
    fn test_payload_over_buffer_limit_keeps_tracked_values() {
        let mut sketch = MfvSketch::make(
            CountMinSketch::new(2, 16),
            1,
            Vec::new(),
            PayloadBuffer::with_max_size(4, 8),
        );
        sketch.offer(b"aaaa").unwrap();

        let err = sketch.offer_with_weight(&[b'x'; 9], 5).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(sketch.total_weight(), 1);
        assert_eq!(sketch.num_active(), 1);
        assert_eq!(sketch.top_k().unwrap()[0].payload(), b"aaaa");

        // room is counted against live payloads, so replacing "aaaa" still works
        sketch.offer_with_weight(b"bbbb", 5).unwrap();
        assert_eq!(sketch.num_active(), 1);
        assert_eq!(sketch.top_k().unwrap()[0].payload(), b"bbbb");
        assert!(sketch.buffer_size() <= 8);
        sketch.check_payloads().unwrap();
    }
}
