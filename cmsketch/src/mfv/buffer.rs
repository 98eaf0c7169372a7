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

//! Packed storage for the payloads of tracked values.
//!
//! Payloads are appended at a cursor that only moves forward. Evicting a value leaves its
//! bytes in place as dead space; the space is reclaimed by [`PayloadBuffer::compact`] once an
//! append no longer fits, and the declared size doubles only if compaction was not enough.

use crate::error::Error;

/// Location of one payload inside a [`PayloadBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PayloadRef {
    pub(crate) offset: usize,
    pub(crate) len: usize,
}

impl PayloadRef {
    pub(crate) fn end(&self) -> usize {
        self.offset + self.len
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PayloadBuffer {
    size: usize,
    max_size: usize,
    // bytes.len() is the append cursor
    bytes: Vec<u8>,
}

impl PayloadBuffer {
    /// Largest declared size, bounded by the 32-bit offsets of the serialized form.
    pub(crate) const MAX_SIZE: usize = u32::MAX as usize;

    pub(crate) fn new(size: usize) -> Self {
        Self {
            size,
            max_size: Self::MAX_SIZE,
            bytes: Vec::with_capacity(size),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_max_size(size: usize, max_size: usize) -> Self {
        Self {
            max_size,
            ..Self::new(size)
        }
    }

    /// Rebuilds a buffer from its declared size and the bytes below the cursor.
    pub(crate) fn from_parts(size: usize, bytes: Vec<u8>) -> Result<Self, Error> {
        if bytes.len() > size || size > Self::MAX_SIZE {
            return Err(Error::buffer_corruption(0, bytes.len(), size));
        }
        Ok(Self {
            size,
            max_size: Self::MAX_SIZE,
            bytes,
        })
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    /// Upper bound of the declared size.
    pub(crate) fn max_size(&self) -> usize {
        self.max_size
    }

    pub(crate) fn used(&self) -> usize {
        self.bytes.len()
    }

    pub(crate) fn free(&self) -> usize {
        self.size - self.bytes.len()
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the payload at `payload`, failing if it reaches past the cursor.
    pub(crate) fn get(&self, payload: PayloadRef) -> Result<&[u8], Error> {
        match payload.offset.checked_add(payload.len) {
            Some(end) if end <= self.bytes.len() => Ok(&self.bytes[payload.offset..end]),
            _ => Err(Error::buffer_corruption(
                payload.offset,
                payload.len,
                self.bytes.len(),
            )),
        }
    }

    /// Appends `payload` at the cursor, or returns `None` if the free space is too small.
    pub(crate) fn append(&mut self, payload: &[u8]) -> Option<PayloadRef> {
        if payload.len() > self.free() {
            return None;
        }
        let offset = self.bytes.len();
        self.bytes.extend_from_slice(payload);
        Some(PayloadRef {
            offset,
            len: payload.len(),
        })
    }

    /// Repacks the live payloads contiguously from offset zero in their current order,
    /// rewriting every reference. Returns the number of bytes reclaimed.
    pub(crate) fn compact(&mut self, live: &mut [&mut PayloadRef]) -> Result<usize, Error> {
        live.sort_by_key(|payload| payload.offset);
        let mut packed = Vec::with_capacity(self.size);
        for payload in live.iter_mut() {
            let offset = packed.len();
            packed.extend_from_slice(self.get(**payload)?);
            payload.offset = offset;
        }
        let reclaimed = self.bytes.len() - packed.len();
        self.bytes = packed;
        Ok(reclaimed)
    }

    /// Doubles the declared size until `len` more bytes fit after the cursor.
    pub(crate) fn grow_to_fit(&mut self, len: usize) -> Result<(), Error> {
        let required = self
            .bytes
            .len()
            .checked_add(len)
            .filter(|required| *required <= self.max_size)
            .ok_or_else(|| {
                Error::invalid_argument("payload buffer would exceed its maximum size")
                    .with_context("used", self.bytes.len())
                    .with_context("len", len)
            })?;
        let mut size = self.size.max(1);
        while size < required {
            size = size.saturating_mul(2);
        }
        self.size = size.min(self.max_size);
        self.bytes.reserve(self.size - self.bytes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_append_until_full() {
        let mut buffer = PayloadBuffer::new(8);
        let first = buffer.append(b"abcde").unwrap();
        assert_eq!(first, PayloadRef { offset: 0, len: 5 });
        assert!(buffer.append(b"wxyz").is_none());
        let second = buffer.append(b"xyz").unwrap();
        assert_eq!(second.offset, 5);
        assert_eq!(buffer.free(), 0);
        assert_eq!(buffer.get(second).unwrap(), b"xyz");
    }

    #[test]
    fn test_get_rejects_refs_past_cursor() {
        let mut buffer = PayloadBuffer::new(16);
        buffer.append(b"abc").unwrap();
        let err = buffer.get(PayloadRef { offset: 2, len: 2 }).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferCorruption);
        let err = buffer
            .get(PayloadRef {
                offset: usize::MAX,
                len: 2,
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferCorruption);
    }

    #[test]
    fn test_compact_drops_dead_bytes() {
        let mut buffer = PayloadBuffer::new(12);
        let _dead = buffer.append(b"dead").unwrap();
        let mut b = buffer.append(b"bb").unwrap();
        let mut a = buffer.append(b"aaa").unwrap();

        let reclaimed = buffer.compact(&mut [&mut a, &mut b]).unwrap();
        assert_eq!(reclaimed, 4);
        assert_eq!(buffer.used(), 5);
        assert_eq!(b, PayloadRef { offset: 0, len: 2 });
        assert_eq!(a, PayloadRef { offset: 2, len: 3 });
        assert_eq!(buffer.get(a).unwrap(), b"aaa");
        assert_eq!(buffer.get(b).unwrap(), b"bb");
    }

    #[test]
    fn test_grow_doubles_until_fit() {
        let mut buffer = PayloadBuffer::new(4);
        buffer.append(b"abc").unwrap();
        buffer.grow_to_fit(10).unwrap();
        assert_eq!(buffer.size(), 16);
        assert!(buffer.append(b"0123456789").is_some());

        let mut empty = PayloadBuffer::new(0);
        empty.grow_to_fit(3).unwrap();
        assert_eq!(empty.size(), 4);
    }

    #[test]
    fn test_grow_stops_at_max_size() {
        let mut buffer = PayloadBuffer::with_max_size(4, 10);
        buffer.append(b"abcd").unwrap();
        buffer.grow_to_fit(6).unwrap();
        assert_eq!(buffer.size(), 10);
        let err = buffer.grow_to_fit(7).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(buffer.size(), 10);
    }

    #[test]
    fn test_from_parts_checks_cursor() {
        let err = PayloadBuffer::from_parts(2, b"abc".to_vec()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BufferCorruption);
        let buffer = PayloadBuffer::from_parts(8, b"abc".to_vec()).unwrap();
        assert_eq!(buffer.free(), 5);
    }
}
