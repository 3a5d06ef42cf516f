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

//! The self-describing on-disk format: a 32-byte preamble recording the
//! hash count, the original `(n, p)` accuracy target, and (for counting
//! filters) the repeat-insert mode, followed by the headerless buffer
//! bytes. Unlike [`super::sketch::BloomFilter::get_bytes`], round-tripping
//! through this format preserves `(n, p, num_hashes, repeat_insert)`
//! without the caller having to track them out of band.

use crate::bloom::counting::CountingBloomFilter;
use crate::bloom::sketch::BloomFilter;
use crate::codec::Family;
use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::error::Error;

const PREAMBLE_LONGS: u8 = 4;
const SERIAL_VERSION: u8 = 1;
const FLAG_REPEAT_INSERT: u8 = 1 << 0;
const PREAMBLE_BYTES: usize = 32;

fn make_error(tag: &'static str) -> impl FnOnce(std::io::Error) -> Error {
    move |_| Error::insufficient_data(tag)
}

pub(super) fn serialize_bit_filter(filter: &BloomFilter) -> Vec<u8> {
    let data = filter.bits().to_bytes();
    let config = filter.config();
    let mut bytes = SketchBytes::with_capacity(PREAMBLE_BYTES + data.len());
    bytes.write_u8(PREAMBLE_LONGS);
    bytes.write_u8(SERIAL_VERSION);
    bytes.write_u8(Family::BLOOMFILTER.id);
    bytes.write_u8(0); // flags: unused for the bit filter
    bytes.write_u32_le(filter.num_hashes());
    bytes.write_u64_le(filter.num_bits());
    bytes.write_u64_le(config.n());
    bytes.write_f64_le(config.p());
    bytes.write(&data);
    bytes.into_bytes()
}

pub(super) fn deserialize_bit_filter(buf: &[u8]) -> Result<BloomFilter, Error> {
    let (num_hashes, num_bits, n, p, data, _flags) = read_preamble(buf, Family::BLOOMFILTER)?;
    let expected_len = num_bits.div_ceil(32) as usize * 4;
    if data.len() != expected_len {
        return Err(Error::insufficient_data_of(
            "bit buffer",
            format!("expected {expected_len} bytes, got {}", data.len()),
        ));
    }
    BloomFilter::from_bytes(data, num_hashes).map(|mut f| {
        debug_assert_eq!(f.bits().num_bits(), num_bits);
        f.set_config(n, p);
        f
    })
}

pub(super) fn serialize_counting_filter(filter: &CountingBloomFilter) -> Vec<u8> {
    let data = filter.counters().to_bytes();
    let config = filter.config();
    let mut bytes = SketchBytes::with_capacity(PREAMBLE_BYTES + data.len());
    bytes.write_u8(PREAMBLE_LONGS);
    bytes.write_u8(SERIAL_VERSION);
    bytes.write_u8(Family::COUNTING_BLOOMFILTER.id);
    let flags = if filter.repeat_insert() {
        FLAG_REPEAT_INSERT
    } else {
        0
    };
    bytes.write_u8(flags);
    bytes.write_u32_le(filter.num_hashes());
    bytes.write_u64_le(filter.num_bits());
    bytes.write_u64_le(config.n());
    bytes.write_f64_le(config.p());
    bytes.write(&data);
    bytes.into_bytes()
}

pub(super) fn deserialize_counting_filter(buf: &[u8]) -> Result<CountingBloomFilter, Error> {
    let (num_hashes, num_bits, n, p, data, flags) =
        read_preamble(buf, Family::COUNTING_BLOOMFILTER)?;
    let expected_len = num_bits.div_ceil(2) as usize;
    if data.len() != expected_len {
        return Err(Error::insufficient_data_of(
            "counter buffer",
            format!("expected {expected_len} bytes, got {}", data.len()),
        ));
    }
    let repeat_insert = flags & FLAG_REPEAT_INSERT != 0;
    CountingBloomFilter::from_bytes(data, num_hashes, repeat_insert).map(|mut f| {
        f.set_config(n, p);
        f
    })
}

fn read_preamble<'a>(
    buf: &'a [u8],
    expected_family: Family,
) -> Result<(u32, u64, u64, f64, &'a [u8], u8), Error> {
    if buf.len() < PREAMBLE_BYTES {
        return Err(Error::insufficient_data("preamble"));
    }
    let mut cursor = SketchSlice::new(&buf[..PREAMBLE_BYTES]);

    let preamble_longs = cursor.read_u8().map_err(make_error("preamble_longs"))?;
    let serial_version = cursor.read_u8().map_err(make_error("serial_version"))?;
    let family_id = cursor.read_u8().map_err(make_error("family_id"))?;
    let flags = cursor.read_u8().map_err(make_error("flags"))?;
    let num_hashes = cursor.read_u32_le().map_err(make_error("num_hashes"))?;
    let num_bits = cursor.read_u64_le().map_err(make_error("num_bits"))?;
    let n = cursor.read_u64_le().map_err(make_error("n"))?;
    let p = cursor.read_f64_le().map_err(make_error("p"))?;

    if preamble_longs != PREAMBLE_LONGS {
        return Err(Error::invalid_preamble_longs(PREAMBLE_LONGS, preamble_longs));
    }
    if serial_version != SERIAL_VERSION {
        return Err(Error::unsupported_serial_version(
            SERIAL_VERSION,
            serial_version,
        ));
    }
    expected_family.validate_id(family_id)?;
    if num_hashes == 0 {
        return Err(Error::invalid_buffer("num_hashes must be non-zero"));
    }

    Ok((num_hashes, num_bits, n, p, &buf[PREAMBLE_BYTES..], flags))
}
