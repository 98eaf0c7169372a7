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

//! Error types for cmsketch operations

use std::fmt;

/// ErrorKind is all kinds of Error of cmsketch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An argument passed to a sketch operation is invalid.
    InvalidArgument,
    /// The serialized sketch data is malformed.
    InvalidData,
    /// A range query was issued with `lo > hi`.
    InvalidRange,
    /// Two sketches with different shapes were combined.
    DimensionMismatch,
    /// A counter would exceed its representable maximum.
    CounterOverflow,
    /// An offset/length pair falls outside the declared payload buffer.
    BufferCorruption,
    /// A key lies outside the domain covered by the dyadic levels.
    DomainError,
}

impl ErrorKind {
    /// Convert this error kind instance into static str.
    pub const fn into_static(self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::InvalidData => "InvalidData",
            ErrorKind::InvalidRange => "InvalidRange",
            ErrorKind::DimensionMismatch => "DimensionMismatch",
            ErrorKind::CounterOverflow => "CounterOverflow",
            ErrorKind::BufferCorruption => "BufferCorruption",
            ErrorKind::DomainError => "DomainError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.into_static())
    }
}

/// Error is the error struct returned by all cmsketch functions.
pub struct Error {
    kind: ErrorKind,
    message: String,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    /// Create a new Error with error kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: Vec::default(),
            source: None,
        }
    }

    /// Add more context in error.
    pub fn with_context(mut self, key: &'static str, value: impl ToString) -> Self {
        self.context.push((key, value.to_string()));
        self
    }

    /// Set source for error.
    ///
    /// # Panics
    ///
    /// Panics if the source has been set.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::error::Error as _;
    /// use cmsketch::error::{Error, ErrorKind};
    ///
    /// let mut error = Error::new(ErrorKind::InvalidData, "failed to deserialize sketch");
    /// assert!(error.source().is_none());
    /// error = error.set_source(std::io::Error::new(std::io::ErrorKind::Other, "IO error"));
    /// assert!(error.source().is_some());
    /// ```
    pub fn set_source(mut self, src: impl Into<anyhow::Error>) -> Self {
        assert!(self.source.is_none(), "the source error has been set");
        self.source = Some(src.into());
        self
    }

    /// Return error's kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Return error's message.
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

// Constructors shared by the sketch implementations.
impl Error {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    pub(crate) fn deserial(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidData, message)
    }

    pub(crate) fn insufficient_data(tag: &'static str) -> Self {
        Self::deserial(format!("insufficient data while reading {tag}"))
    }

    pub(crate) fn invalid_family(expected: u8, actual: u8, name: &'static str) -> Self {
        Self::deserial(format!(
            "invalid family: expected {expected} ({name}), got {actual}"
        ))
    }

    pub(crate) fn unsupported_serial_version(expected: u8, actual: u8) -> Self {
        Self::deserial(format!(
            "unsupported serial version: expected {expected}, got {actual}"
        ))
    }

    pub(crate) fn invalid_preamble_longs(expected: u8, actual: u8) -> Self {
        Self::deserial(format!(
            "invalid preamble longs: expected {expected}, got {actual}"
        ))
    }

    pub(crate) fn invalid_range(lo: i64, hi: i64) -> Self {
        Self::new(ErrorKind::InvalidRange, "range lower bound exceeds upper bound")
            .with_context("lo", lo)
            .with_context("hi", hi)
    }

    pub(crate) fn dimension_mismatch(what: &'static str, left: u64, right: u64) -> Self {
        Self::new(
            ErrorKind::DimensionMismatch,
            format!("cannot combine sketches with different {what}"),
        )
        .with_context("left", left)
        .with_context("right", right)
    }

    pub(crate) fn counter_overflow() -> Self {
        Self::new(
            ErrorKind::CounterOverflow,
            "counter would exceed its representable maximum",
        )
    }

    pub(crate) fn buffer_corruption(offset: usize, len: usize, bound: usize) -> Self {
        Self::new(
            ErrorKind::BufferCorruption,
            "payload reference falls outside the buffer",
        )
        .with_context("offset", offset)
        .with_context("len", len)
        .with_context("bound", bound)
    }

    pub(crate) fn out_of_domain(key: i64) -> Self {
        Self::new(ErrorKind::DomainError, "key outside the sketch domain").with_context("key", key)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // If alternate has been specified, we will print like Debug.
        if f.alternate() {
            let mut de = f.debug_struct("Error");
            de.field("kind", &self.kind);
            de.field("message", &self.message);
            de.field("context", &self.context);
            de.field("source", &self.source);
            return de.finish();
        }

        write!(f, "{}", self.kind)?;
        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }
        writeln!(f)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "Context:")?;
            for (k, v) in self.context.iter() {
                writeln!(f, "   {k}: {v}")?;
            }
        }

        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "Source:")?;
            writeln!(f, "   {source:#}")?;
        }

        Ok(())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if !self.context.is_empty() {
            write!(f, ", context: {{ ")?;
            write!(
                f,
                "{}",
                self.context
                    .iter()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )?;
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        if let Some(source) = &self.source {
            write!(f, ", source: {source}")?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|v| v.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = Error::invalid_range(7, 3);
        assert_eq!(err.kind(), ErrorKind::InvalidRange);
        let rendered = err.to_string();
        assert!(rendered.starts_with("InvalidRange"));
        assert!(rendered.contains("lo: 7"));
        assert!(rendered.contains("hi: 3"));
    }

    #[test]
    fn test_debug_lists_context() {
        let err = Error::buffer_corruption(40, 8, 32);
        let rendered = format!("{err:?}");
        assert!(rendered.contains("Context:"));
        assert!(rendered.contains("offset: 40"));
    }
}
