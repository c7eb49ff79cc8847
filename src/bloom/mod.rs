// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Standard bloom filter policy
//!
//! Allows buffering the key hashes before actual filter construction
//! which is needed to properly calculate the filter size, as the number of items
//! are unknown while a table (or a window of it) is being written.

mod bit_array;
mod builder;
mod reader;

pub use builder::Builder;
pub use reader::StandardBloomFilterReader;

use crate::{FilterKeyWriter, FilterKind, FilterPolicy};

/// Header of whole-table bloom filters
pub const MAGIC_BYTES: [u8; 4] = [b'F', b'L', b'T', 1];

/// Upper bound of hash functions per key
///
/// Filters claiming more are treated as corrupt, so a lookup stays cheap.
pub const MAX_HASH_COUNT: usize = 64;

/// Name under which bloom filters are stored in the table's meta blocks
pub const STANDARD_BLOOM_POLICY_NAME: &str = "lsm.std_bloom";

/// Sizing of bloom filters
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum BloomConstructionPolicy {
    /// Fixed amount of bits per key
    BitsPerKey(f32),

    /// Target false positive rate
    FalsePositiveRate(f32),
}

impl Default for BloomConstructionPolicy {
    fn default() -> Self {
        Self::BitsPerKey(10.0)
    }
}

impl BloomConstructionPolicy {
    /// Creates a filter builder for `n` keys.
    #[must_use]
    pub fn init(&self, n: usize) -> Builder {
        match self {
            Self::BitsPerKey(bpk) => Builder::with_bpk(n, *bpk),
            Self::FalsePositiveRate(fpr) => Builder::with_fp_rate(n, *fpr),
        }
    }

    /// Returns `false` if the policy would build useless filters.
    #[must_use]
    pub fn is_active(&self) -> bool {
        match self {
            Self::BitsPerKey(bpk) => *bpk > 0.0,
            Self::FalsePositiveRate(fpr) => *fpr > 0.0,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum FilterType {
    StandardBloom,
}

impl TryFrom<u8> for FilterType {
    type Error = crate::Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::StandardBloom),
            _ => Err(crate::Error::InvalidTag(("FilterType", value))),
        }
    }
}

impl From<FilterType> for u8 {
    fn from(value: FilterType) -> Self {
        match value {
            FilterType::StandardBloom => 0,
        }
    }
}

/// Bloom filter policy
///
/// Implements [`FilterPolicy`] with a standard bloom filter over XXH3 hashes.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BloomFilterPolicy {
    construction: BloomConstructionPolicy,
}

impl BloomFilterPolicy {
    /// Creates a bloom filter policy.
    #[must_use]
    pub fn new(construction: BloomConstructionPolicy) -> Self {
        Self { construction }
    }

    /// Returns how filters are sized.
    #[must_use]
    pub fn construction(&self) -> BloomConstructionPolicy {
        self.construction
    }
}

impl FilterPolicy for BloomFilterPolicy {
    fn name(&self) -> &str {
        STANDARD_BLOOM_POLICY_NAME
    }

    fn new_writer(&self, kind: FilterKind) -> Box<dyn FilterKeyWriter> {
        Box::new(BloomKeyWriter {
            kind,
            construction: self.construction,
            hash_buffer: Vec::new(),
        })
    }

    fn may_contain(&self, kind: FilterKind, filter: &[u8], key: &[u8]) -> bool {
        match StandardBloomFilterReader::new(kind, filter) {
            Ok(reader) => reader.contains(key),
            Err(e) => {
                log::debug!("Unusable {kind:?} bloom filter ({} B): {e}", filter.len());
                true
            }
        }
    }
}

struct BloomKeyWriter {
    kind: FilterKind,
    construction: BloomConstructionPolicy,

    /// Key hashes for AMQ filter
    hash_buffer: Vec<u64>,
}

impl FilterKeyWriter for BloomKeyWriter {
    fn add_key(&mut self, key: &[u8]) {
        self.hash_buffer.push(Builder::get_hash(key));
    }

    fn finish(&mut self, mut buf: Vec<u8>) -> Vec<u8> {
        let n = self.hash_buffer.len();

        log::trace!(
            "Constructing {:?} bloom filter with {n} entries: {:?}",
            self.kind,
            self.construction,
        );

        let mut builder = self.construction.init(n);

        for hash in self.hash_buffer.drain(..) {
            builder.set_with_hash(hash);
        }

        let start = buf.len();
        builder.build_into(self.kind, &mut buf);

        log::trace!("Built bloom filter ({} B)", buf.len() - start);

        buf
    }
}
