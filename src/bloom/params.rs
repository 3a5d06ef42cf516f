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

//! Parameter derivation: turning a desired capacity and false-positive
//! probability into a bit-vector size and hash count, and the
//! [`FilterBuilder`] that drives it.

use crate::bloom::counting::CountingBloomFilter;
use crate::bloom::sketch::BloomFilter;
use crate::error::Error;

const MIN_NUM_BITS: u64 = 64;

/// Derives the number of bits `m` needed to hold `expected_elements` items
/// at false-positive probability `false_positive_probability`, rounded up
/// to the next multiple of 64 so the bit vector always spans whole words.
pub(crate) fn suggest_num_bits(expected_elements: u64, false_positive_probability: f64) -> u64 {
    let n = expected_elements as f64;
    let p = false_positive_probability;
    let ln2_sq = std::f64::consts::LN_2 * std::f64::consts::LN_2;
    let raw = (-n * p.ln() / ln2_sq).ceil() as u64;
    raw.max(MIN_NUM_BITS).div_ceil(64) * 64
}

/// Derives the number of hash functions `k` that minimizes the
/// false-positive rate for a filter of `num_bits` bits holding
/// `expected_elements` items.
pub(crate) fn suggest_num_hashes(expected_elements: u64, num_bits: u64) -> u32 {
    let ratio = num_bits as f64 / expected_elements.max(1) as f64;
    ((ratio * std::f64::consts::LN_2).round() as u32).max(1)
}

fn validate(expected_elements: u64, false_positive_probability: f64) -> Result<(), Error> {
    if expected_elements == 0 {
        return Err(Error::invalid_parameters(
            "expected_elements must be greater than zero",
        ));
    }
    if !(false_positive_probability > 0.0 && false_positive_probability < 1.0) {
        return Err(Error::invalid_parameters(format!(
            "false_positive_probability must be in (0, 1), got {false_positive_probability}"
        )));
    }
    Ok(())
}

/// Builds [`BloomFilter`]s and [`CountingBloomFilter`]s from either an
/// accuracy target (`expected_elements`, `false_positive_probability`) or
/// an explicit `(num_bits, num_hashes)` pair.
///
/// ```
/// use bloomy::bloom::FilterBuilder;
///
/// let filter = FilterBuilder::new(10_000, 0.01).build_bit_filter().unwrap();
/// assert!(filter.num_hashes() > 0);
/// ```
#[derive(Debug, Clone)]
pub struct FilterBuilder {
    expected_elements: u64,
    false_positive_probability: f64,
    manual_size: Option<(u64, u32)>,
    repeat_insert: bool,
}

impl FilterBuilder {
    /// Starts a builder targeting `expected_elements` items at
    /// `false_positive_probability` false-positive rate.
    pub fn new(expected_elements: u64, false_positive_probability: f64) -> Self {
        Self {
            expected_elements,
            false_positive_probability,
            manual_size: None,
            repeat_insert: true,
        }
    }

    /// Overrides the accuracy-derived sizing with an explicit bit count
    /// and hash count.
    pub fn with_size(mut self, num_bits: u64, num_hashes: u32) -> Self {
        self.manual_size = Some((num_bits, num_hashes));
        self
    }

    /// Controls whether a built [`CountingBloomFilter`] increments a
    /// counter on every `add` of the same element (`true`, the default)
    /// or treats a repeated `add` of an already-present element as a
    /// no-op (`false`).
    pub fn set_repeat_insert(mut self, repeat_insert: bool) -> Self {
        self.repeat_insert = repeat_insert;
        self
    }

    /// The expected element count this builder was constructed with.
    pub fn n(&self) -> u64 {
        self.expected_elements
    }

    /// The target false-positive probability this builder was constructed
    /// with.
    pub fn p(&self) -> f64 {
        self.false_positive_probability
    }

    /// The derived (or manually set) bit count.
    pub fn m(&self) -> u64 {
        self.resolve().map(|(m, _)| m).unwrap_or(0)
    }

    /// The derived (or manually set) hash count.
    pub fn k(&self) -> u32 {
        self.resolve().map(|(_, k)| k).unwrap_or(0)
    }

    /// Whether a built counting filter increments on repeat inserts.
    pub fn repeat_insert(&self) -> bool {
        self.repeat_insert
    }

    fn resolve(&self) -> Result<(u64, u32), Error> {
        if let Some((num_bits, num_hashes)) = self.manual_size {
            if num_bits == 0 {
                return Err(Error::invalid_parameters("num_bits must be non-zero"));
            }
            if num_hashes == 0 {
                return Err(Error::invalid_parameters("num_hashes must be non-zero"));
            }
            return Ok((num_bits.div_ceil(64) * 64, num_hashes));
        }
        validate(self.expected_elements, self.false_positive_probability)?;
        let num_bits = suggest_num_bits(self.expected_elements, self.false_positive_probability);
        let num_hashes = suggest_num_hashes(self.expected_elements, num_bits);
        Ok((num_bits, num_hashes))
    }

    /// Builds a plain [`BloomFilter`].
    pub fn build_bit_filter(&self) -> Result<BloomFilter, Error> {
        let (num_bits, num_hashes) = self.resolve()?;
        let mut filter = BloomFilter::with_size(num_bits, num_hashes);
        filter.set_config(self.expected_elements, self.false_positive_probability);
        Ok(filter)
    }

    /// Builds a [`CountingBloomFilter`], honoring [`Self::set_repeat_insert`].
    pub fn build_counting_filter(&self) -> Result<CountingBloomFilter, Error> {
        let (num_bits, num_hashes) = self.resolve()?;
        let mut filter = CountingBloomFilter::with_size(num_bits, num_hashes, self.repeat_insert);
        filter.set_config(self.expected_elements, self.false_positive_probability);
        Ok(filter)
    }
}

/// A read-only snapshot of the parameters a filter was built with,
/// returned by `config()` on a filter instance.
///
/// A filter reconstructed via `from_bytes`/`from_int_array` reports
/// `n = 0, p = 0.0` here, since the raw buffer carries no record of the
/// original accuracy target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterConfig {
    pub(crate) n: u64,
    pub(crate) p: f64,
    pub(crate) m: u64,
    pub(crate) k: u32,
    pub(crate) repeat_insert: bool,
}

impl FilterConfig {
    /// The expected element count the filter was built with, or `0` if
    /// reconstructed from a raw buffer.
    pub fn n(&self) -> u64 {
        self.n
    }

    /// The target false-positive probability the filter was built with,
    /// or `0.0` if reconstructed from a raw buffer.
    pub fn p(&self) -> f64 {
        self.p
    }

    /// The bit (or counter) count `m`.
    pub fn m(&self) -> u64 {
        self.m
    }

    /// The hash count `k`.
    pub fn k(&self) -> u32 {
        self.k
    }

    /// Whether the filter increments on repeat inserts (always `false`
    /// for a plain [`BloomFilter`]).
    pub fn repeat_insert(&self) -> bool {
        self.repeat_insert
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggest_num_bits_rounds_to_64() {
        let m = suggest_num_bits(1_000, 0.01);
        assert_eq!(m % 64, 0);
        assert!(m > 0);
    }

    #[test]
    fn test_suggest_num_hashes_at_least_one() {
        assert!(suggest_num_hashes(1_000_000, 64) >= 1);
    }

    #[test]
    fn test_builder_rejects_zero_elements() {
        let err = FilterBuilder::new(0, 0.01).build_bit_filter().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidParameters);
    }

    #[test]
    fn test_builder_rejects_bad_probability() {
        let err = FilterBuilder::new(100, 1.5)
            .build_bit_filter()
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidParameters);
    }

    #[test]
    fn test_builder_with_size_overrides_accuracy() {
        let filter = FilterBuilder::new(100, 0.01)
            .with_size(128, 3)
            .build_bit_filter()
            .unwrap();
        assert_eq!(filter.num_bits(), 128);
        assert_eq!(filter.num_hashes(), 3);
    }

    #[test]
    fn test_builder_repeat_insert_defaults_to_true() {
        let filter = FilterBuilder::new(100, 0.01).build_counting_filter().unwrap();
        assert!(filter.repeat_insert());
    }

    #[test]
    fn test_builder_propagates_repeat_insert_false() {
        let filter = FilterBuilder::new(100, 0.01)
            .set_repeat_insert(false)
            .build_counting_filter()
            .unwrap();
        assert!(!filter.repeat_insert());
    }

    #[test]
    fn test_builder_getters() {
        let builder = FilterBuilder::new(1_000, 0.01);
        assert_eq!(builder.n(), 1_000);
        assert_eq!(builder.p(), 0.01);
        assert!(builder.m() > 0);
        assert!(builder.k() >= 1);
        assert!(builder.repeat_insert());
    }
}
