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

use crate::bloom::buffer::BitBuffer;
use crate::bloom::params::FilterConfig;
use crate::bloom::serialization;
use crate::error::Error;
use crate::hash;
use crate::hash::Element;

/// A classical Bloom filter: a packed bit array with no false negatives
/// and a tunable false-positive rate.
///
/// Build one through [`crate::bloom::FilterBuilder`] rather than
/// constructing it directly.
///
/// ```
/// use bloomy::bloom::FilterBuilder;
///
/// let mut filter = FilterBuilder::new(1_000, 0.01).build_bit_filter().unwrap();
/// filter.add_str("hello");
/// assert!(filter.contains_str("hello"));
/// assert!(!filter.contains_str("goodbye"));
/// ```
#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: BitBuffer,
    num_hashes: u32,
    n: u64,
    p: f64,
}

impl BloomFilter {
    pub(crate) fn with_size(num_bits: u64, num_hashes: u32) -> Self {
        Self {
            bits: BitBuffer::new(num_bits),
            num_hashes,
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
            m: self.bits.num_bits(),
            k: self.num_hashes,
            repeat_insert: false,
        }
    }

    /// The number of bits `m` backing this filter.
    pub fn num_bits(&self) -> u64 {
        self.bits.num_bits()
    }

    /// The number of hash functions `k` used per element.
    pub fn num_hashes(&self) -> u32 {
        self.num_hashes
    }

    /// Alias for [`Self::num_hashes`], matching the binding-layer surface.
    pub fn hashes(&self) -> u32 {
        self.num_hashes
    }

    fn indices_for(&self, element: &Element<'_>) -> Vec<u64> {
        hash::hash_indices(&element.canonical_bytes(), self.num_hashes, self.bits.num_bits())
    }

    /// Returns the `k` bit positions `x` hashes to, without touching the
    /// buffer.
    pub fn get_hash_indices(&self, element: Element<'_>) -> Vec<u64> {
        self.indices_for(&element)
    }

    /// Sets every bit `x` hashes to. Idempotent.
    pub fn add(&mut self, element: Element<'_>) {
        for idx in self.indices_for(&element) {
            self.bits.set(idx);
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

    /// Returns `true` if every bit `x` hashes to is set. May return `true`
    /// for a non-member (a false positive); never returns `false` for an
    /// element that was previously added.
    pub fn contains(&self, element: Element<'_>) -> bool {
        self.indices_for(&element).into_iter().all(|i| self.bits.get(i))
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

    /// Returns `true` if `x` was already definitely present (all bits set
    /// before this call), `false` otherwise. Always sets the bits on
    /// exit.
    pub fn add_if_not_contains(&mut self, element: Element<'_>) -> bool {
        let indices = self.indices_for(&element);
        let was_present = indices.iter().all(|&i| self.bits.get(i));
        for idx in indices {
            self.bits.set(idx);
        }
        was_present
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

    /// Adds every string in `batch`.
    pub fn add_str_batch(&mut self, batch: &[&str]) {
        for &value in batch {
            self.add_str(value);
        }
    }

    /// Queries every string in `batch`.
    pub fn contains_str_batch(&self, batch: &[&str]) -> Vec<bool> {
        batch.iter().map(|&value| self.contains_str(value)).collect()
    }

    /// Adds every byte slice in `batch`.
    pub fn add_bytes_batch(&mut self, batch: &[&[u8]]) {
        for &value in batch {
            self.add_bytes(value);
        }
    }

    /// Queries every byte slice in `batch`.
    pub fn contains_bytes_batch(&self, batch: &[&[u8]]) -> Vec<bool> {
        batch.iter().map(|&value| self.contains_bytes(value)).collect()
    }

    /// Returns `true` iff every listed bit is set. `idx` must have at
    /// most `num_hashes()` entries, each `< num_bits()`.
    pub fn contains_hash_indices(&self, idx: &[u64]) -> Result<bool, Error> {
        for &i in idx {
            if i >= self.bits.num_bits() {
                return Err(Error::index_out_of_range(i, self.bits.num_bits()));
            }
        }
        Ok(idx.iter().all(|&i| self.bits.get(i)))
    }

    /// Zeroes the buffer.
    pub fn clear(&mut self) {
        self.bits.clear();
    }

    /// `true` iff no bit is set.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Bit-wise ORs `other`'s buffer into `self`, in place. Fails with
    /// [`crate::error::ErrorKind::Incompatible`] unless both filters share
    /// `(m, k)`.
    pub fn union(&mut self, other: &BloomFilter) -> Result<(), Error> {
        self.check_compatible(other)?;
        self.bits.union_with(&other.bits);
        Ok(())
    }

    /// Bit-wise ANDs `other`'s buffer into `self`, in place. Fails with
    /// [`crate::error::ErrorKind::Incompatible`] unless both filters share
    /// `(m, k)`.
    pub fn intersect(&mut self, other: &BloomFilter) -> Result<(), Error> {
        self.check_compatible(other)?;
        self.bits.intersect_with(&other.bits);
        Ok(())
    }

    fn check_compatible(&self, other: &BloomFilter) -> Result<(), Error> {
        if self.bits.num_bits() != other.bits.num_bits() || self.num_hashes != other.num_hashes {
            return Err(Error::incompatible(format!(
                "filters are not compatible: self=(m={}, k={}), other=(m={}, k={})",
                self.bits.num_bits(),
                self.num_hashes,
                other.bits.num_bits(),
                other.num_hashes
            )));
        }
        Ok(())
    }

    /// Estimates the number of distinct elements added, from the popcount
    /// of the bit buffer: `⌊-(m/k)·ln(1 - X/m)⌋`, saturating at `m` when
    /// every bit is set.
    pub fn estimate_cardinality(&self) -> u64 {
        let m = self.bits.num_bits() as f64;
        let k = f64::from(self.num_hashes);
        let x = self.bits.count_ones();
        if x == 0 {
            return 0;
        }
        if x == self.bits.num_bits() {
            return self.bits.num_bits();
        }
        (-(m / k) * (1.0 - x as f64 / m).ln()).floor() as u64
    }

    /// Returns the underlying bit buffer as raw bytes, little-endian word
    /// order, with no header.
    pub fn get_bytes(&self) -> Vec<u8> {
        self.bits.to_bytes()
    }

    /// Returns the underlying bit buffer as little-endian 32-bit words.
    pub fn get_int_array(&self) -> Vec<u32> {
        self.bits.words().to_vec()
    }

    /// Reconstructs a filter from a raw byte buffer and a previously
    /// recorded hash count. The rebuilt filter reports `m = 8 * buf.len()`
    /// and has no knowledge of the original `(n, p)`.
    pub fn from_bytes(buf: &[u8], num_hashes: u32) -> Result<Self, Error> {
        if num_hashes == 0 {
            return Err(Error::invalid_buffer("num_hashes must be non-zero"));
        }
        Ok(Self {
            bits: BitBuffer::from_bytes(buf)?,
            num_hashes,
            n: 0,
            p: 0.0,
        })
    }

    /// Reconstructs a filter from a raw little-endian word buffer and a
    /// previously recorded hash count.
    pub fn from_int_array(words: &[u32], num_hashes: u32) -> Result<Self, Error> {
        if num_hashes == 0 {
            return Err(Error::invalid_buffer("num_hashes must be non-zero"));
        }
        Ok(Self {
            bits: BitBuffer::from_words(words.to_vec())?,
            num_hashes,
            n: 0,
            p: 0.0,
        })
    }

    /// Serializes this filter into the self-describing on-disk format,
    /// which additionally preserves `num_hashes` across a save/load cycle
    /// (unlike the headerless [`Self::get_bytes`] path).
    pub fn serialize(&self) -> Vec<u8> {
        serialization::serialize_bit_filter(self)
    }

    /// Deserializes a filter previously written by [`Self::serialize`].
    pub fn deserialize(buf: &[u8]) -> Result<Self, Error> {
        serialization::deserialize_bit_filter(buf)
    }

    pub(crate) fn bits(&self) -> &BitBuffer {
        &self.bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bloom::FilterBuilder;

    #[test]
    fn test_no_false_negatives() {
        let mut filter = FilterBuilder::new(1_000, 0.01).build_bit_filter().unwrap();
        for i in 0..500i64 {
            filter.add_int(i);
        }
        for i in 0..500i64 {
            assert!(filter.contains_int(i));
        }
    }

    #[test]
    fn test_concrete_scenario_hello_87() {
        let mut filter = FilterBuilder::new(100_000_000, 0.01)
            .build_bit_filter()
            .unwrap();
        filter.add_bytes(b"hello");
        filter.add_int(87);
        assert!(filter.contains_str("hello"));
        assert!(filter.contains_int(87));
        assert!(!filter.contains_str("hello world"));
    }

    #[test]
    fn test_config_reports_build_parameters() {
        let filter = FilterBuilder::new(1_000, 0.01).build_bit_filter().unwrap();
        let config = filter.config();
        assert_eq!(config.n(), 1_000);
        assert_eq!(config.p(), 0.01);
        assert_eq!(config.m(), filter.num_bits());
        assert_eq!(config.k(), filter.num_hashes());
    }

    #[test]
    fn test_config_zeroed_after_reconstruction() {
        let mut filter = FilterBuilder::new(1_000, 0.01).build_bit_filter().unwrap();
        filter.add_str("x");
        let restored = BloomFilter::from_bytes(&filter.get_bytes(), filter.hashes()).unwrap();
        assert_eq!(restored.config().n(), 0);
        assert_eq!(restored.config().p(), 0.0);
    }

    #[test]
    fn test_add_if_not_contains_toggles() {
        let mut filter = FilterBuilder::new(100, 0.01).build_bit_filter().unwrap();
        assert!(!filter.add_if_not_contains(Element::Str("x")));
        assert!(filter.add_if_not_contains(Element::Str("x")));
        assert!(filter.contains_str("x"));
    }

    #[test]
    fn test_cross_type_equivalence() {
        let mut filter = FilterBuilder::new(1_000, 0.01).build_bit_filter().unwrap();
        filter.add_str("hello");
        assert!(filter.contains_bytes("hello".as_bytes()));
        filter.add_int(42);
        assert!(filter.contains_bytes(&42i64.to_le_bytes()));
    }

    #[test]
    fn test_round_trip_bytes() {
        let mut filter = FilterBuilder::new(1_000, 0.01).build_bit_filter().unwrap();
        filter.add_str("roundtrip");
        let restored = BloomFilter::from_bytes(&filter.get_bytes(), filter.hashes()).unwrap();
        assert!(restored.contains_str("roundtrip"));
        assert!(!restored.contains_str("missing"));
    }

    #[test]
    fn test_round_trip_int_array() {
        let mut filter = FilterBuilder::new(1_000, 0.01).build_bit_filter().unwrap();
        filter.add_int(7);
        let restored =
            BloomFilter::from_int_array(&filter.get_int_array(), filter.hashes()).unwrap();
        assert!(restored.contains_int(7));
    }

    #[test]
    fn test_union_monotonicity() {
        let mut a = FilterBuilder::new(1_000, 0.01).build_bit_filter().unwrap();
        let mut b = FilterBuilder::new(1_000, 0.01).build_bit_filter().unwrap();
        a.add_str("a-only");
        b.add_str("b-only");
        a.union(&b).unwrap();
        assert!(a.contains_str("a-only"));
        assert!(a.contains_str("b-only"));
    }

    #[test]
    fn test_intersection_soundness() {
        let mut a = FilterBuilder::new(1_000, 0.01).build_bit_filter().unwrap();
        let mut b = FilterBuilder::new(1_000, 0.01).build_bit_filter().unwrap();
        a.add_str("shared");
        a.add_str("a-only");
        b.add_str("shared");
        a.intersect(&b).unwrap();
        assert!(a.contains_str("shared"));
    }

    #[test]
    fn test_union_rejects_incompatible() {
        let mut a = FilterBuilder::new(1_000, 0.01).build_bit_filter().unwrap();
        let b = FilterBuilder::new(1_000, 0.01)
            .with_size(128, 3)
            .build_bit_filter()
            .unwrap();
        let err = a.union(&b).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Incompatible);
    }

    #[test]
    fn test_batch_add_contains() {
        let mut filter = FilterBuilder::new(1_000, 0.01).build_bit_filter().unwrap();
        let inserted = [1, 2, 3, 4, 5, 6, 7, 9, 18, 68, 90, 100];
        filter.add_int_batch(&inserted);
        let queried = [1, 2, 3, 4, 5, 6, 7, 9, 18, 68, 90, 100, 190, 290, 390];
        let results = filter.contains_int_batch(&queried);
        assert_eq!(&results[..12], [true; 12]);
        assert_eq!(&results[12..], [false, false, false]);
    }

    #[test]
    fn test_cardinality_estimate_within_budget() {
        let mut filter = FilterBuilder::new(100_000_000, 0.01)
            .build_bit_filter()
            .unwrap();
        for i in 0..10_000_000i64 {
            filter.add_int(i);
        }
        let estimate = filter.estimate_cardinality();
        assert!((9_900_000..=10_100_000).contains(&estimate));
    }

    #[test]
    fn test_contains_hash_indices_out_of_range() {
        let filter = FilterBuilder::new(100, 0.01).build_bit_filter().unwrap();
        let err = filter
            .contains_hash_indices(&[filter.num_bits()])
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::IndexOutOfRange);
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut filter = FilterBuilder::new(1_000, 0.01).build_bit_filter().unwrap();
        filter.add_str("persisted");
        let bytes = filter.serialize();
        let restored = BloomFilter::deserialize(&bytes).unwrap();
        assert!(restored.contains_str("persisted"));
        assert_eq!(restored.hashes(), filter.hashes());
    }
}
