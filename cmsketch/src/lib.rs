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

//! # cmsketch
//!
//! Fixed-memory sketches for frequency, range, quantile and top-K queries over streams.
//!
//! - [`countmin`]: the CountMin counter matrix. Point estimates never undercount.
//! - [`dyadic`]: one counter matrix per dyadic level of the signed 64-bit domain, answering
//!   range counts, quantiles and histograms with a bounded number of lookups.
//! - [`mfv`]: a bounded most-frequent-value tracker over opaque byte payloads.
//! - [`aggregate`]: the accumulate/combine/finalize protocol a query engine drives.
//!
//! Every sketch merges with another sketch of the same shape and seed, and serializes to a
//! little-endian image that can be decoded in another process.
//!
//! Diagnostic events are emitted through [`tracing`]; no subscriber is installed.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod aggregate;
pub mod countmin;
pub mod dyadic;
pub mod error;
pub mod hash;
pub mod mfv;

pub(crate) mod codec;
