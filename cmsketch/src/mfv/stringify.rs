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

//! Conversion of tracked payloads to their external text form.

/// Renders an opaque payload as text for final output.
///
/// The sketch never interprets payloads; the caller supplies the conversion that matches how
/// values were encoded when they were offered.
pub trait Stringify {
    /// Converts `payload` to text.
    fn stringify(&self, payload: &[u8]) -> String;
}

impl<F> Stringify for F
where
    F: Fn(&[u8]) -> String,
{
    fn stringify(&self, payload: &[u8]) -> String {
        self(payload)
    }
}

/// Renders payloads as UTF-8, replacing invalid sequences with `U+FFFD`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Utf8Stringify;

impl Stringify for Utf8Stringify {
    fn stringify(&self, payload: &[u8]) -> String {
        String::from_utf8_lossy(payload).into_owned()
    }
}

/// Renders 8-byte little-endian payloads as decimal integers.
///
/// Payloads of any other length are rendered as lowercase hex so that nothing is dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct I64Stringify;

impl Stringify for I64Stringify {
    fn stringify(&self, payload: &[u8]) -> String {
        match <[u8; 8]>::try_from(payload) {
            Ok(bytes) => i64::from_le_bytes(bytes).to_string(),
            Err(_) => payload.iter().map(|byte| format!("{byte:02x}")).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_is_lossy() {
        assert_eq!(Utf8Stringify.stringify(b"apple"), "apple");
        assert_eq!(Utf8Stringify.stringify(&[0x61, 0xff]), "a\u{fffd}");
    }

    #[test]
    fn test_i64_decodes_little_endian() {
        assert_eq!(I64Stringify.stringify(&(-42i64).to_le_bytes()), "-42");
        assert_eq!(I64Stringify.stringify(&[0x0a, 0xff]), "0aff");
    }

    #[test]
    fn test_closure_is_stringify() {
        let upper = |payload: &[u8]| String::from_utf8_lossy(payload).to_uppercase();
        assert_eq!(upper.stringify(b"abc"), "ABC");
    }
}
