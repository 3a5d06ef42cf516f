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

//! Bloom filters and counting Bloom filters: compact, constant-time
//! probabilistic set membership with a tunable false-positive rate.
//!
//! ```
//! use bloomy::bloom::FilterBuilder;
//!
//! let mut filter = FilterBuilder::new(10_000, 0.01).build_bit_filter().unwrap();
//! filter.add_str("apple");
//! assert!(filter.contains_str("apple"));
//! assert!(!filter.contains_str("banana"));
//! ```

mod buffer;
mod counting;
mod params;
mod serialization;
mod sketch;

pub use counting::CountingBloomFilter;
pub use params::FilterBuilder;
pub use params::FilterConfig;
pub use sketch::BloomFilter;

pub use crate::hash::Element;
