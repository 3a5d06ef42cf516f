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

use crate::bloom::buffer::NibbleBuffer;
use crate::bloom::params::FilterConfig;
use crate::bloom::serialization;
use crate::error::Error;
use crate::hash;
use crate::hash::Element;

/// A counting Bloom filter: an array of 4-bit saturating counters
/// supporting deletion, at the cost of twice the memory of a plain
/// [`crate::bloom::BloomFilter`] of the same bit count.
///
/// Build one through [`crate::bloom::FilterBuilder`] rather than
/// constructing it directly.
///
/// ```
/// use bloomy::bloom::FilterBuilder;
///
/// let mut filter = FilterBuilder::new(1_000, 0.01)
///     .set_repeat_insert(true)
///     .build_counting_filter()
///     .unwrap();
/// filter.add_str("hello");
/// filter.add_str("hello");
/// assert_eq!(filter.estimate_count_str("hello"), 2);
/// filter.remove_str("hello");
/// assert!(filter.contains_str("hello"));
/// filter.remove_str("hello");
/// assert!(!filter.contains_str("hello"));
/// ```
#[derive(Debug, Clone)]
pub struct CountingBloomFilter {
    counters: NibbleBuffer,
    num_hashes: u32,
    repeat_insert: bool,
    n: u64,
    p: f64,
}

impl CountingBloomFilter {
    pub(crate) fn with_size(num_bits: u64, num_hashes: u32, repeat_insert: bool) -> Self {
        Self {
            counters: NibbleBuffer::new(num_bits),
            num_hashes,
            repeat_insert,
            n: 0,
            p: 0.0,
        }
    }

    pub(crate) fn set_config(&mut self, n: u64, p: f64) {
        self.n = n;
        self.p = p;
    }

    /// Returns a snapshot of the parameters this filter was built with.
    /// Reports `n = 0, p = 0.0` if reconstructed from a raw buffer.
    pub fn config(&self) -> FilterConfig {
        FilterConfig {
            n: self.n,
            p: self.p,
            m: self.counters.num_counters(),
            k: self.num_hashes,
            repeat_insert: self.repeat_insert,
        }
    }

    /// The number of counters `m` backing this filter.
    pub fn num_bits(&self) -> u64 {
        self.counters.num_counters()
    }

    /// The number of hash functions `k` used per element.
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Alias for [`Self::num_hashes`], matching the binding-layer surface.
    pub fn hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Whether `add` of an already-present element increments its
    /// counters (`true`) or is a no-op (`false`).
    pub fn repeat_insert(&self) -> bool {
        self.repeat_insert
    }

    fn indices_for(&self, element: &Element<'_>) -> Vec<u64> {
        hash::hash_indices(
            &element.canonical_bytes(),
            self.num_hashes,
            self.counters.num_counters(),
        )
    }

    /// Returns the `k` counter positions `x` hashes to.
    pub fn get_hash_indices(&self, element: Element<'_>) -> Vec<u64> {
        self.indices_for(&element)
    }

    fn contains_indices(&self, indices: &[u64]) -> bool {
        indices.iter().all(|&i| self.counters.get(i) > 0)
    }

    /// Increments every one of `x`'s `k` counters, saturating at 15. When
    /// [`Self::repeat_insert`] is `false`, a call on an already-present
    /// element is a no-op.
    pub fn add(&mut self, element: Element<'_>) {
        let indices = self.indices_for(&element);
        if !self.repeat_insert && self.contains_indices(&indices) {
            return;
        }
        for idx in indices {
            self.counters.increment(idx);
        }
    }

    /// Convenience wrapper over [`Self::add`] for raw bytes.
    pub fn add_bytes(&mut self, value: &[u8]) {
        self.add(Element::Bytes(value));
    }

    /// Convenience wrapper over [`Self::add`] for UTF-8 strings.
    pub fn add_str(&mut self, value: &str) {
        self.add(Element::Str(value));
    }

    /// Convenience wrapper over [`Self::add`] for signed 64-bit integers.
    pub fn add_int(&mut self, value: i64) {
        self.add(Element::Int(value));
    }

    /// Returns `true` iff every one of `x`'s `k` counters is non-zero.
    pub fn contains(&self, element: Element<'_>) -> bool {
        self.contains_indices(&self.indices_for(&element))
    }

    /// Convenience wrapper over [`Self::contains`] for raw bytes.
    pub fn contains_bytes(&self, value: &[u8]) -> bool {
        self.contains(Element::Bytes(value))
    }

    /// Convenience wrapper over [`Self::contains`] for UTF-8 strings.
    pub fn contains_str(&self, value: &str) -> bool {
        self.contains(Element::Str(value))
    }

    /// Convenience wrapper over [`Self::contains`] for signed 64-bit
    /// integers.
    pub fn contains_int(&self, value: i64) -> bool {
        self.contains(Element::Int(value))
    }

    /// Returns `true` if `x` was already definitely present, `false`
    /// otherwise. Always increments the counters on exit (subject to
    /// [`Self::repeat_insert`]).
    pub fn add_if_not_contains(&mut self, element: Element<'_>) -> bool {
        let indices = self.indices_for(&element);
        let was_present = self.contains_indices(&indices);
        if self.repeat_insert || !was_present {
            for idx in indices {
                self.counters.increment(idx);
            }
        }
        was_present
    }

    /// Decrements every one of `x`'s `k` counters. If any counter was
    /// already zero (the element was not definitely present), the
    /// operation is a no-op on all counters.
    pub fn remove(&mut self, element: Element<'_>) {
        let indices = self.indices_for(&element);
        if !self.contains_indices(&indices) {
            return;
        }
        for idx in indices {
            self.counters.decrement(idx);
        }
    }

    /// Convenience wrapper over [`Self::remove`] for raw bytes.
    pub fn remove_bytes(&mut self, value: &[u8]) {
        self.remove(Element::Bytes(value));
    }

    /// Convenience wrapper over [`Self::remove`] for UTF-8 strings.
    pub fn remove_str(&mut self, value: &str) {
        self.remove(Element::Str(value));
    }

    /// Convenience wrapper over [`Self::remove`] for signed 64-bit
    /// integers.
    pub fn remove_int(&mut self, value: i64) {
        self.remove(Element::Int(value));
    }

    /// Estimates the number of times `x` was added (net of removes), as
    /// the minimum of its `k` counters. Collisions with other elements
    /// can only inflate this estimate, never deflate it.
    pub fn estimate_count(&self, element: Element<'_>) -> u8 {
        self.indices_for(&element)
            .into_iter()
            .map(|i| self.counters.get(i))
            .min()
            .unwrap_or(0)
    }

    /// Convenience wrapper over [`Self::estimate_count`] for UTF-8
    /// strings.
    pub fn estimate_count_str(&self, value: &str) -> u8 {
        self.estimate_count(Element::Str(value))
    }

    /// Convenience wrapper over [`Self::estimate_count`] for signed
    /// 64-bit integers.
    pub fn estimate_count_int(&self, value: i64) -> u8 {
        self.estimate_count(Element::Int(value))
    }

    /// Returns the 4-bit counter at physical index `i`.
    pub fn counter_at(&self, i: u64) -> Result<u8, Error> {
        if i >= self.counters.num_counters() {
            return Err(Error::index_out_of_range(i, self.counters.num_counters()));
        }
        Ok(self.counters.get(i))
    }

    /// Adds every element of `batch` in order.
    pub fn add_batch(&mut self, batch: &[Element<'_>]) {
        for element in batch {
            self.add(element.clone());
        }
    }

    /// Queries every element of `batch`, returning a same-length,
    /// same-order sequence of results.
    pub fn contains_batch(&self, batch: &[Element<'_>]) -> Vec<bool> {
        batch.iter().map(|e| self.contains(e.clone())).collect()
    }

    /// Adds every integer in `batch`.
    pub fn add_int_batch(&mut self, batch: &[i64]) {
        for &value in batch {
            self.add_int(value);
        }
    }

    /// Queries every integer in `batch`.
    pub fn contains_int_batch(&self, batch: &[i64]) -> Vec<bool> {
        batch.iter().map(|&value| self.contains_int(value)).collect()
    }

    /// Returns `true` iff every listed counter is non-zero. `idx` must
    /// have at most `num_hashes()` entries, each `< num_bits()`.
    pub fn contains_hash_indices(&self, idx: &[u64]) -> Result<bool, Error> {
        for &i in idx {
            if i >= self.counters.num_counters() {
                return Err(Error::index_out_of_range(i, self.counters.num_counters()));
            }
        }
        Ok(idx.iter().all(|&i| self.counters.get(i) > 0))
    }

    /// Zeroes every counter.
    pub fn clear(&mut self) {
        self.counters.clear();
    }

    /// `true` iff every counter is zero.
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Returns the underlying counter buffer as raw bytes, two nibbles per
    /// byte, with no header.
    pub fn get_bytes(&self) -> Vec<u8> {
        self.counters.to_bytes()
    }

    /// Returns the underlying counter buffer as little-endian 32-bit
    /// words.
    pub fn get_int_array(&self) -> Vec<u32> {
        self.counters.to_words()
    }

    /// Reconstructs a filter from a raw byte buffer, a previously recorded
    /// hash count, and the `repeat_insert` mode it was built with. The
    /// rebuilt filter reports `m = 2 * buf.len()` and has no knowledge of
    /// the original `(n, p)`.
    pub fn from_bytes(buf: &[u8], num_hashes: u32, repeat_insert: bool) -> Result<Self, Error> {
        if num_hashes == 0 {
            return Err(Error::invalid_buffer("num_hashes must be non-zero"));
        }
        Ok(Self {
            counters: NibbleBuffer::from_bytes(buf)?,
            num_hashes,
            repeat_insert,
            n: 0,
            p: 0.0,
        })
    }

    /// Reconstructs a filter from a raw little-endian word buffer, a
    /// previously recorded hash count, and the `repeat_insert` mode it was
    /// built with.
    pub fn from_int_array(
        words: &[u32],
        num_hashes: u32,
        repeat_insert: bool,
    ) -> Result<Self, Error> {
        if num_hashes == 0 {
            return Err(Error::invalid_buffer("num_hashes must be non-zero"));
        }
        Ok(Self {
            counters: NibbleBuffer::from_words(words)?,
            num_hashes,
            repeat_insert,
            n: 0,
            p: 0.0,
        })
    }

    /// Serializes this filter into the self-describing on-disk format,
    /// which additionally preserves `num_hashes` and `repeat_insert`
    /// across a save/load cycle.
    pub fn serialize(&self) -> Vec<u8> {
        serialization::serialize_counting_filter(self)
    }

    /// Deserializes a filter previously written by [`Self::serialize`].
    pub fn deserialize(buf: &[u8]) -> Result<Self, Error> {
        serialization::deserialize_counting_filter(buf)
    }

    pub(crate) fn counters(&self) -> &NibbleBuffer {
        &self.counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bloom::FilterBuilder;

    #[test]
    fn test_repeat_insert_true_counts_and_removes() {
        let mut filter = FilterBuilder::new(100_000, 0.01)
            .set_repeat_insert(true)
            .build_counting_filter()
            .unwrap();
        filter.add_str("hello");
        filter.add_str("hello");
        assert_eq!(filter.estimate_count_str("hello"), 2);
        filter.remove_str("hello");
        assert_eq!(filter.estimate_count_str("hello"), 1);
        assert!(filter.contains_str("hello"));
        filter.remove_str("hello");
        assert!(!filter.contains_str("hello"));
    }

    #[test]
    fn test_repeat_insert_false_is_idempotent() {
        let mut filter = FilterBuilder::new(100_000, 0.01)
            .set_repeat_insert(false)
            .build_counting_filter()
            .unwrap();
        filter.add_str("hello");
        filter.add_str("hello");
        assert_eq!(filter.estimate_count_str("hello"), 1);
        filter.remove_str("hello");
        assert!(!filter.contains_str("hello"));
    }

    #[test]
    fn test_remove_on_absent_element_is_noop() {
        let mut filter = FilterBuilder::new(1_000, 0.01)
            .build_counting_filter()
            .unwrap();
        filter.add_str("present");
        filter.remove_str("absent");
        assert!(filter.contains_str("present"));
    }

    #[test]
    fn test_counter_saturates_at_fifteen() {
        let mut filter = FilterBuilder::new(1_000, 0.01)
            .set_repeat_insert(true)
            .build_counting_filter()
            .unwrap();
        for _ in 0..30 {
            filter.add_str("hot");
        }
        assert_eq!(filter.estimate_count_str("hot"), 15);
    }

    #[test]
    fn test_counter_at_out_of_range() {
        let filter = FilterBuilder::new(100, 0.01).build_counting_filter().unwrap();
        let err = filter.counter_at(filter.num_bits()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::IndexOutOfRange);
    }

    #[test]
    fn test_serialize_round_trip_preserves_repeat_insert() {
        let mut filter = FilterBuilder::new(1_000, 0.01)
            .set_repeat_insert(true)
            .build_counting_filter()
            .unwrap();
        filter.add_str("persisted");
        let bytes = filter.serialize();
        let restored = CountingBloomFilter::deserialize(&bytes).unwrap();
        assert!(restored.repeat_insert());
        assert!(restored.contains_str("persisted"));
    }
}
