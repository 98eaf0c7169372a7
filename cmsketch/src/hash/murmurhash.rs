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

/// Returns the first 64-bit half of MurmurHash3 x64-128 over `bytes`.
///
/// This is the single hash primitive of the crate. Its output feeds counter indices that are
/// persisted in serialized sketches, so it must never change.
#[inline]
pub(crate) fn murmur3_64(bytes: &[u8], seed: u32) -> u64 {
    mur3::murmurhash3_x64_128(bytes, seed).0
}

#[cfg(test)]
mod tests {
    use super::murmur3_64;

    #[test]
    fn test_remainder() {
        // remainder > 8
        let key = "The quick brown fox jumps over the lazy dog";
        let (h1, h2) = mur3::murmurhash3_x64_128(key.as_bytes(), 0);
        assert_eq!(h1, 0xe34bbc7bbc071b6c);
        assert_eq!(h2, 0x7a433ca9c49a9347);
        assert_eq!(murmur3_64(key.as_bytes(), 0), h1);

        // change one bit
        let key = "The quick brown fox jumps over the lazy eog";
        let (h1, h2) = mur3::murmurhash3_x64_128(key.as_bytes(), 0);
        assert_eq!(h1, 0x362108102c62d1c9);
        assert_eq!(h2, 0x3285cd100292b305);

        // test a remainder < 8
        let key = "The quick brown fox jumps over the lazy dogdogdog";
        assert_eq!(murmur3_64(key.as_bytes(), 0), 0x9c8205300e612fc4);

        // test a remainder = 8
        let key = "The quick brown fox jumps over the lazy1";
        assert_eq!(murmur3_64(key.as_bytes(), 0), 0xe3301a827e5cdfe3);

        // test a remainder = 0
        let key = "The quick brown fox jumps over t";
        assert_eq!(murmur3_64(key.as_bytes(), 0), 0xdf6af91bb29bdacf);
    }

    #[test]
    fn test_seed_changes_output() {
        let key = 42u64.to_le_bytes();
        assert_ne!(murmur3_64(&key, 0), murmur3_64(&key, 1));
        assert_eq!(murmur3_64(&key, 7), murmur3_64(&key, 7));
    }
}
