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

use bloomy::bloom::CountingBloomFilter;
use bloomy::bloom::FilterBuilder;
use bloomy::error::ErrorKind;
use googletest::assert_that;
use googletest::prelude::eq;

#[test]
fn test_repeat_insert_true_counts_every_add_and_removes_one_at_a_time() {
    let mut filter = FilterBuilder::new(1_000, 0.01)
        .set_repeat_insert(true)
        .build_counting_filter()
        .unwrap();

    filter.add_str("hello");
    filter.add_str("hello");
    filter.add_str("hello");
    assert_that!(filter.estimate_count_str("hello"), eq(3));

    filter.remove_str("hello");
    assert!(filter.contains_str("hello"));
    assert_that!(filter.estimate_count_str("hello"), eq(2));

    filter.remove_str("hello");
    filter.remove_str("hello");
    assert!(!filter.contains_str("hello"));
}

#[test]
fn test_repeat_insert_false_is_idempotent_on_add() {
    let mut filter = FilterBuilder::new(1_000, 0.01)
        .set_repeat_insert(false)
        .build_counting_filter()
        .unwrap();

    filter.add_str("hello");
    filter.add_str("hello");
    filter.add_str("hello");
    assert_that!(filter.estimate_count_str("hello"), eq(1));

    filter.remove_str("hello");
    assert!(!filter.contains_str("hello"));
}

#[test]
fn test_removing_an_absent_element_is_a_no_op() {
    let mut filter = FilterBuilder::new(1_000, 0.01)
        .build_counting_filter()
        .unwrap();
    filter.add_str("present");

    filter.remove_str("absent");

    assert!(filter.contains_str("present"));
    assert!(!filter.contains_str("absent"));
}

#[test]
fn test_counter_saturates_instead_of_overflowing() {
    let mut filter = FilterBuilder::new(1_000, 0.01)
        .with_size(8192, 4)
        .set_repeat_insert(true)
        .build_counting_filter()
        .unwrap();

    for _ in 0..50 {
        filter.add_str("hot");
    }
    assert_that!(filter.estimate_count_str("hot"), eq(15));
}

#[test]
fn test_counter_at_rejects_out_of_range_index() {
    let filter = FilterBuilder::new(1_000, 0.01)
        .with_size(64, 3)
        .build_counting_filter()
        .unwrap();
    let err = filter.counter_at(64).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
}

#[test]
fn test_self_describing_round_trip_preserves_repeat_insert_and_counts() {
    let mut filter = FilterBuilder::new(2_500, 0.02)
        .set_repeat_insert(true)
        .build_counting_filter()
        .unwrap();
    filter.add_str("hello");
    filter.add_str("hello");

    let bytes = filter.serialize();
    let restored = CountingBloomFilter::deserialize(&bytes).unwrap();

    assert!(restored.repeat_insert());
    assert_that!(restored.estimate_count_str("hello"), eq(2));
    assert_eq!(restored.config().n(), 2_500);
    assert_eq!(restored.config().p(), 0.02);
}

#[test]
fn test_headerless_round_trip_via_int_array() {
    let mut filter = FilterBuilder::new(1_000, 0.01)
        .build_counting_filter()
        .unwrap();
    filter.add_int(42);

    let words = filter.get_int_array();
    let restored =
        CountingBloomFilter::from_int_array(&words, filter.num_hashes(), filter.repeat_insert())
            .unwrap();
    assert!(restored.contains_int(42));
    assert!(!restored.contains_int(7));
}
