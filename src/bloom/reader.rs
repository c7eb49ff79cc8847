// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::{bit_array::BitArrayReader, Builder, FilterType, MAGIC_BYTES, MAX_HASH_COUNT};
use crate::{hash::secondary_hash, FilterKind};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

/// A standard bloom filter reader
///
/// The filter uses double hashing instead of `k` hash functions, see:
/// <https://fjall-rs.github.io/post/bloom-filter-hash-sharing>
pub struct StandardBloomFilterReader<'a> {
    /// Raw bytes exposed as bit array
    inner: BitArrayReader<'a>,

    /// Bit count
    m: usize,

    /// Number of hash functions
    k: usize,
}

impl<'a> StandardBloomFilterReader<'a> {
    /// Parses a filter that was built for the given kind.
    pub fn new(kind: FilterKind, slice: &'a [u8]) -> crate::Result<Self> {
        match kind {
            FilterKind::PerBlock => Self::from_compact(slice),
            FilterKind::WholeTable => Self::from_full(slice),
        }
    }

    fn from_compact(slice: &'a [u8]) -> crate::Result<Self> {
        let Some((&k, bits)) = slice.split_last() else {
            return Err(crate::Error::InvalidHeader("BloomFilter"));
        };

        if k == 0 || usize::from(k) > MAX_HASH_COUNT || bits.is_empty() {
            return Err(crate::Error::InvalidHeader("BloomFilter"));
        }

        Ok(Self {
            inner: BitArrayReader::new(bits),
            m: bits.len() * 8,
            k: usize::from(k),
        })
    }

    fn from_full(slice: &'a [u8]) -> crate::Result<Self> {
        let mut reader = Cursor::new(slice);

        // Check header
        let mut magic = [0u8; MAGIC_BYTES.len()];
        reader.read_exact(&mut magic)?;

        if magic != MAGIC_BYTES {
            return Err(crate::Error::InvalidHeader("BloomFilter"));
        }

        // NOTE: Filter type
        let _filter_type = FilterType::try_from(reader.read_u8()?)?;

        // NOTE: Hash type (unused)
        let hash_type = reader.read_u8()?;
        if hash_type != 0 {
            return Err(crate::Error::InvalidTag(("HashType", hash_type)));
        }

        let m = reader.read_u64::<LittleEndian>()?;
        let k = reader.read_u64::<LittleEndian>()?;

        #[expect(
            clippy::cast_possible_truncation,
            reason = "the cursor position is bounded by the slice length"
        )]
        let bits = slice
            .get(reader.position() as usize..)
            .ok_or(crate::Error::InvalidHeader("BloomFilter"))?;

        if m == 0 || m > (bits.len() as u64) * 8 {
            return Err(crate::Error::InvalidHeader("BloomFilter"));
        }

        if k == 0 || k > MAX_HASH_COUNT as u64 {
            return Err(crate::Error::InvalidHeader("BloomFilter"));
        }

        #[expect(
            clippy::cast_possible_truncation,
            reason = "m is bounded by the slice length, k by MAX_HASH_COUNT"
        )]
        Ok(Self {
            inner: BitArrayReader::new(bits),
            m: m as usize,
            k: k as usize,
        })
    }

    /// Returns `true` if the hash may be contained.
    ///
    /// Will never have a false negative.
    #[must_use]
    pub fn contains_hash(&self, mut h1: u64) -> bool {
        let mut h2 = secondary_hash(h1);

        for i in 1..=(self.k as u64) {
            let idx = h1 % (self.m as u64);

            #[expect(
                clippy::cast_possible_truncation,
                reason = "idx < m, which fits into usize"
            )]
            if !self.inner.get(idx as usize) {
                return false;
            }

            h1 = h1.wrapping_add(h2);
            h2 = h2.wrapping_mul(i);
        }

        true
    }

    /// Returns `true` if the item may be contained.
    ///
    /// Will never have a false negative.
    #[must_use]
    pub fn contains(&self, key: &[u8]) -> bool {
        self.contains_hash(Builder::get_hash(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn build(kind: FilterKind, keys: &[&[u8]], mut builder: Builder) -> Vec<u8> {
        for key in keys {
            builder.set_with_hash(Builder::get_hash(key));
        }

        let mut buf = vec![];
        builder.build_into(kind, &mut buf);
        buf
    }

    #[test]
    fn filter_bloom_standard_basic() -> crate::Result<()> {
        let keys: &[&[u8]] = &[
            b"item0", b"item1", b"item2", b"item3", b"item4", b"item5", b"item6", b"item7",
            b"item8", b"item9",
        ];

        for kind in [FilterKind::PerBlock, FilterKind::WholeTable] {
            let filter_bytes = build(kind, keys, Builder::with_fp_rate(10, 0.0001));
            let filter = StandardBloomFilterReader::new(kind, &filter_bytes)?;

            for key in keys {
                assert!(filter.contains(key));
            }

            assert!(!filter.contains(b"asdasdasdasdasdasdasd"));
        }

        Ok(())
    }

    #[test]
    fn filter_bloom_standard_header_round_trip() -> crate::Result<()> {
        let builder = Builder::with_fp_rate(10, 0.0001);
        let (m, k) = (builder.m, builder.k);

        for kind in [FilterKind::PerBlock, FilterKind::WholeTable] {
            let filter_bytes = build(kind, &[b"a"], Builder::with_fp_rate(10, 0.0001));
            let filter = StandardBloomFilterReader::new(kind, &filter_bytes)?;

            assert_eq!(m, filter.m);
            assert_eq!(k, filter.k);
        }

        Ok(())
    }

    #[test]
    fn filter_bloom_standard_fpr() -> crate::Result<()> {
        let item_count = 10_000;
        let wanted_fpr = 0.1;

        let mut filter = Builder::with_fp_rate(item_count, wanted_fpr);

        for key in (0..item_count).map(|_| nanoid::nanoid!()) {
            filter.set_with_hash(Builder::get_hash(key.as_bytes()));
        }

        let mut filter_bytes = vec![];
        filter.build_into(FilterKind::WholeTable, &mut filter_bytes);
        let filter = StandardBloomFilterReader::new(FilterKind::WholeTable, &filter_bytes)?;

        let false_positives = (0..item_count)
            .map(|_| nanoid::nanoid!())
            .filter(|key| filter.contains(key.as_bytes()))
            .count();

        #[expect(clippy::cast_precision_loss)]
        let fpr = false_positives as f32 / item_count as f32;
        assert!(fpr > 0.05);
        assert!(fpr < 0.15);

        Ok(())
    }

    #[test]
    fn filter_bloom_rejects_bad_header() {
        assert!(StandardBloomFilterReader::new(FilterKind::PerBlock, &[]).is_err());
        assert!(StandardBloomFilterReader::new(FilterKind::PerBlock, &[0xFF]).is_err());
        assert!(StandardBloomFilterReader::new(FilterKind::PerBlock, &[0xFF, 0]).is_err());

        assert!(StandardBloomFilterReader::new(FilterKind::WholeTable, &[]).is_err());
        assert!(StandardBloomFilterReader::new(FilterKind::WholeTable, b"nope").is_err());
    }

    fn full_header(m: u64, k: u64, bits: &[u8]) -> Vec<u8> {
        use byteorder::WriteBytesExt;
        use std::io::Write;

        let mut buf = vec![];
        buf.write_all(&MAGIC_BYTES).expect("should write");
        buf.write_u8(FilterType::StandardBloom.into())
            .expect("should write");
        buf.write_u8(0).expect("should write");
        buf.write_u64::<LittleEndian>(m).expect("should write");
        buf.write_u64::<LittleEndian>(k).expect("should write");
        buf.write_all(bits).expect("should write");
        buf
    }

    #[test]
    fn filter_bloom_rejects_huge_hash_count() {
        let filter_bytes = full_header(8, u64::MAX, &[0xFF]);
        assert_eq!(31, filter_bytes.len());

        assert!(matches!(
            StandardBloomFilterReader::new(FilterKind::WholeTable, &filter_bytes),
            Err(crate::Error::InvalidHeader("BloomFilter")),
        ));

        let filter_bytes = full_header(8, MAX_HASH_COUNT as u64 + 1, &[0xFF]);
        assert!(StandardBloomFilterReader::new(FilterKind::WholeTable, &filter_bytes).is_err());

        let filter_bytes = full_header(8, MAX_HASH_COUNT as u64, &[0xFF]);
        let filter = StandardBloomFilterReader::new(FilterKind::WholeTable, &filter_bytes)
            .expect("should be valid");
        assert!(filter.contains(b"a"));

        // compact form stores k as a single byte
        assert!(StandardBloomFilterReader::new(FilterKind::PerBlock, &[0xFF, 255]).is_err());
        assert!(StandardBloomFilterReader::new(FilterKind::PerBlock, &[0xFF, 64]).is_ok());
    }

    #[test]
    fn filter_bloom_rejects_truncated_bits() {
        let mut filter_bytes = build(
            FilterKind::WholeTable,
            &[b"a", b"b"],
            Builder::with_bpk(100, 10.0),
        );
        filter_bytes.truncate(filter_bytes.len() - 1);

        assert!(matches!(
            StandardBloomFilterReader::new(FilterKind::WholeTable, &filter_bytes),
            Err(crate::Error::InvalidHeader("BloomFilter")),
        ));
    }

    #[test]
    fn filter_bloom_rejects_foreign_filter_type() {
        let mut filter_bytes = build(FilterKind::WholeTable, &[b"a"], Builder::with_bpk(1, 10.0));

        if let Some(tag) = filter_bytes.get_mut(MAGIC_BYTES.len()) {
            *tag = 1;
        }

        assert!(matches!(
            StandardBloomFilterReader::new(FilterKind::WholeTable, &filter_bytes),
            Err(crate::Error::InvalidTag(("FilterType", 1))),
        ));
    }
}
