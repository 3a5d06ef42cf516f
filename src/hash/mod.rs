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

//! The double-hashing kernel shared by [`crate::bloom::BloomFilter`] and
//! [`crate::bloom::CountingBloomFilter`].
//!
//! Two independent 64-bit hashes of the canonicalized input are produced
//! with XXH3-64 (via the `xxhash-rust` crate) under two fixed, distinct
//! seeds, then combined with the Kirsch-Mitzenmacher double-hashing scheme
//! to derive `k` near-independent bit positions from a single pair of
//! hashes. Both seeds are part of the on-disk contract: a filter saved by
//! one version of this crate must be loaded by a version using the same
//! seeds, so changing either constant is a format-breaking change.

use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Seed for the first base hash. Part of the on-disk contract; do not
/// change.
pub(crate) const SEED_1: u64 = 0;
/// Seed for the second base hash. Part of the on-disk contract; do not
/// change.
pub(crate) const SEED_2: u64 = 0x9E37_79B9_7F4A_7C15;

/// An element accepted by the filter's typed ingest/query surface.
///
/// Canonicalized to bytes per the encoding rules fixed by the on-disk
/// contract: byte slices pass through unchanged, strings are their UTF-8
/// encoding, and signed 64-bit integers are their little-endian two's
/// complement representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Element<'a> {
    /// Raw bytes, hashed as-is.
    Bytes(&'a [u8]),
    /// A UTF-8 string, hashed as its UTF-8 encoding.
    Str(&'a str),
    /// A signed 64-bit integer, hashed as 8 little-endian bytes.
    Int(i64),
}

impl Element<'_> {
    /// Returns the canonical byte encoding used for hashing.
    pub(crate) fn canonical_bytes(&self) -> std::borrow::Cow<'_, [u8]> {
        match self {
            Element::Bytes(b) => std::borrow::Cow::Borrowed(b),
            Element::Str(s) => std::borrow::Cow::Borrowed(s.as_bytes()),
            Element::Int(n) => std::borrow::Cow::Owned(n.to_le_bytes().to_vec()),
        }
    }
}

/// Computes the two base 64-bit hashes of `bytes` under the fixed seed
/// pair.
pub(crate) fn base_hashes(bytes: &[u8]) -> (u64, u64) {
    let h1 = xxh3_64_with_seed(bytes, SEED_1);
    let h2 = xxh3_64_with_seed(bytes, SEED_2);
    (h1, h2)
}

/// Derives the `k` hash-index sequence for `bytes` into a filter of `m`
/// bits, using Kirsch-Mitzenmacher double hashing:
/// `index_i = (h1 + i * h2) mod m`, with wrapping 64-bit arithmetic before
/// the modulus.
pub(crate) fn hash_indices(bytes: &[u8], num_hashes: u32, num_bits: u64) -> Vec<u64> {
    let (h1, h2) = base_hashes(bytes);
    (0..num_hashes)
        .map(|i| h1.wrapping_add(u64::from(i).wrapping_mul(h2)) % num_bits)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let (h1a, h2a) = base_hashes(b"hello");
        let (h1b, h2b) = base_hashes(b"hello");
        assert_eq!(h1a, h1b);
        assert_eq!(h2a, h2b);
    }

    #[test]
    fn test_seeds_are_distinct() {
        let (h1, h2) = base_hashes(b"some input");
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_hash_indices_agree_across_calls() {
        let a = hash_indices(b"apple", 7, 1024);
        let b = hash_indices(b"apple", 7, 1024);
        assert_eq!(a, b);
        assert_eq!(a.len(), 7);
        assert!(a.iter().all(|&i| i < 1024));
    }

    #[test]
    fn test_cross_type_equivalence() {
        let int_bytes = Element::Int(87).canonical_bytes();
        let direct_bytes = Element::Bytes(&87i64.to_le_bytes()).canonical_bytes();
        assert_eq!(int_bytes.as_ref(), direct_bytes.as_ref());

        let s = "hello";
        let str_bytes = Element::Str(s).canonical_bytes();
        let raw_bytes = Element::Bytes(s.as_bytes()).canonical_bytes();
        assert_eq!(str_bytes.as_ref(), raw_bytes.as_ref());
    }
}
