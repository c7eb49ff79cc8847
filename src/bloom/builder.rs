// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::{bit_array::Builder as BitArrayBuilder, FilterType, MAGIC_BYTES, MAX_HASH_COUNT};
use crate::{hash::secondary_hash, FilterKind};
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::Write;

/// More bits per key do not lower the false positive rate in any useful way
const MAX_BITS_PER_KEY: f32 = 64.0;

/// Standard bloom filter builder
#[derive(Debug)]
pub struct Builder {
    /// Raw bytes exposed as bit array
    inner: BitArrayBuilder,

    /// Bit count
    pub(super) m: usize,

    /// Number of hash functions
    pub(super) k: usize,
}

impl Builder {
    /// Appends the filter to `buf`, formatted for the given filter kind.
    ///
    /// Per-block filters use a compact encoding (`bits || k`),
    /// whole-table filters carry a full header.
    #[expect(
        clippy::expect_used,
        reason = "we write into a Vec<u8>, so no I/O error can happen"
    )]
    pub fn build_into(&self, kind: FilterKind, buf: &mut Vec<u8>) {
        match kind {
            FilterKind::PerBlock => {
                buf.write_all(self.inner.bytes()).expect("should not fail");

                #[expect(
                    clippy::cast_possible_truncation,
                    reason = "k is clamped to MAX_HASH_COUNT, which fits into u8"
                )]
                buf.write_u8(self.k as u8).expect("should not fail");
            }
            FilterKind::WholeTable => {
                buf.write_all(&MAGIC_BYTES).expect("should not fail");

                // NOTE: Filter type
                buf.write_u8(FilterType::StandardBloom.into())
                    .expect("should not fail");

                // NOTE: Hash type (unused)
                buf.write_u8(0).expect("should not fail");

                buf.write_u64::<LittleEndian>(self.m as u64)
                    .expect("should not fail");
                buf.write_u64::<LittleEndian>(self.k as u64)
                    .expect("should not fail");
                buf.write_all(self.inner.bytes()).expect("should not fail");
            }
        }
    }

    /// Constructs a bloom filter that can hold `n` items
    /// while maintaining a certain false positive rate `fpr`.
    #[must_use]
    pub fn with_fp_rate(n: usize, fpr: f32) -> Self {
        use std::f32::consts::LN_2;

        let n = n.max(1);

        // NOTE: Some sensible minimum
        let fpr = fpr.clamp(0.000_000_1, 0.999);

        let m = Self::calculate_m(n, fpr).max(8);

        #[expect(
            clippy::cast_precision_loss,
            reason = "bpk tends to be in the range of 0-50, so easily fits into u32"
        )]
        let bpk = (m / n) as f32;

        #[expect(
            clippy::cast_sign_loss,
            clippy::cast_possible_truncation,
            reason = "bpk easily fits into u32 and LN_2 < 1.0, so should still fit into a usize as well"
        )]
        let k = ((bpk * LN_2) as usize).clamp(1, MAX_HASH_COUNT);

        Self {
            inner: BitArrayBuilder::with_capacity(m / 8),
            m,
            k,
        }
    }

    /// Constructs a bloom filter that can hold `n` items
    /// with `bpk` bits per key.
    ///
    /// 10 bits per key is a sensible default.
    #[must_use]
    pub fn with_bpk(n: usize, bpk: f32) -> Self {
        use std::f32::consts::LN_2;

        let n = n.max(1);

        // NOTE: Also catches NaN and infinity
        let bpk = if bpk.is_finite() {
            bpk.clamp(1.0, MAX_BITS_PER_KEY)
        } else {
            MAX_BITS_PER_KEY
        };

        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "bpk tends to be in the range of 0-50, so easily fits into usize"
        )]
        let m = n * (bpk as usize);

        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "bpk easily fits into usize and LN_2 < 1.0, so should still fit into a usize as well"
        )]
        let k = ((bpk * LN_2) as usize).clamp(1, MAX_HASH_COUNT);

        // NOTE: Round up so we don't get too little bits
        let bytes = m.div_ceil(8);

        Self {
            inner: BitArrayBuilder::with_capacity(bytes),
            m: bytes * 8,
            k,
        }
    }

    pub(crate) fn calculate_m(n: usize, fp_rate: f32) -> usize {
        use std::f32::consts::LN_2;

        #[expect(
            clippy::cast_precision_loss,
            reason = "n tends to be in the single millions at most, so f32 should be precise enough"
        )]
        let n = n as f32;
        let ln2_squared = LN_2.powi(2);

        let numerator = n * fp_rate.ln();
        let m = -(numerator / ln2_squared);

        // NOTE: Round up to next byte
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "m already fits, and because we divide, it should definitely fit into usize"
        )]
        let result = ((m / 8.0).ceil() * 8.0) as usize;
        result
    }

    /// Adds the key hash to the filter.
    pub fn set_with_hash(&mut self, mut h1: u64) {
        let mut h2 = secondary_hash(h1);

        for i in 1..=(self.k as u64) {
            let idx = h1 % (self.m as u64);

            #[expect(
                clippy::cast_possible_truncation,
                reason = "filters tend to be pretty small, definitely less than 4 GiB, even for large tables"
            )]
            self.inner.enable_bit(idx as usize);

            h1 = h1.wrapping_add(h2);
            h2 = h2.wrapping_mul(i);
        }
    }

    /// Gets the hash of a key.
    #[must_use]
    pub fn get_hash(key: &[u8]) -> u64 {
        crate::hash::hash64(key)
    }
}
