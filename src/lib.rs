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

//! `bloomy` is a probabilistic set-membership library offering a classical
//! Bloom filter and a counting Bloom filter that supports deletion.
//!
//! Both variants are built through [`bloom::FilterBuilder`], which derives
//! the bit count and hash count from a target `(expected_elements,
//! false_positive_probability)` pair, or accepts an explicit size.
//!
//! ```
//! use bloomy::bloom::FilterBuilder;
//!
//! let mut filter = FilterBuilder::new(10_000, 0.01).build_bit_filter().unwrap();
//! filter.add_str("apple");
//! assert!(filter.contains_str("apple"));
//! ```
//!
//! The engine is single-threaded by design: no internal locking or atomics.
//! A filter may be shared across threads for read-only access, but any
//! mutating call requires exclusive access enforced by the caller.

pub mod bloom;
pub(crate) mod codec;
pub mod error;
pub(crate) mod hash;
