// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::{
    trailer::{self, Trailer},
    FilterWriter,
};
use crate::{FilterKeyWriter, FilterKind, FilterPolicy, Slice};
use std::sync::Arc;

/// Being 11 means that we generate a new filter for every 2 KiB of table data
///
/// With 4 KiB data blocks every second filter is empty, which costs
/// nothing but an offset table entry.
pub const FILTER_BASE_LOG: u8 = 11;

/// Converts the current segment data length into an offset table entry.
fn checked_offset(len: usize) -> crate::Result<u32> {
    u32::try_from(len).map_err(|_| crate::Error::FilterTooLarge(len as u64))
}

/// Builds one filter per 2 KiB window of table bytes
///
/// ```text
/// [segments][offset table: (N + 1) x u32 LE][shift: u8]
/// ```
pub struct BlockFilterWriter {
    policy: Arc<dyn FilterPolicy>,
    writer: Box<dyn FilterKeyWriter>,

    /// Number of keys added since the last emitted segment
    count: usize,

    /// Concatenated filter segments
    data: Vec<u8>,

    /// Start offset of every emitted segment inside `data`
    offsets: Vec<u32>,
}

impl BlockFilterWriter {
    /// Creates a writer that builds per-block filters with the given policy.
    #[must_use]
    pub fn new(policy: Arc<dyn FilterPolicy>) -> Self {
        let writer = policy.new_writer(FilterKind::PerBlock);

        Self {
            policy,
            writer,
            count: 0,
            data: Vec::new(),
            offsets: Vec::new(),
        }
    }

    /// Number of segments emitted so far.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.offsets.len()
    }

    fn append_offset(&mut self) -> crate::Result<()> {
        let offset = checked_offset(self.data.len())?;
        self.offsets.push(offset);
        Ok(())
    }

    /// Closes the current window.
    ///
    /// A window without keys becomes an empty range.
    fn emit(&mut self) -> crate::Result<()> {
        self.append_offset()?;

        if self.count == 0 {
            return Ok(());
        }

        let start = self.data.len();
        self.data = self.writer.finish(std::mem::take(&mut self.data));

        log::trace!(
            "Emitted filter segment #{} with {} keys ({} B)",
            self.offsets.len() - 1,
            self.count,
            self.data.len() - start,
        );

        self.count = 0;

        Ok(())
    }
}

impl FilterWriter for BlockFilterWriter {
    fn add_key(&mut self, key: &[u8]) {
        self.count += 1;
        self.writer.add_key(key);
    }

    fn finish_block(&mut self, block_offset: u64) -> crate::Result<()> {
        // NOTE: One data block may span multiple windows,
        // so the condition is re-evaluated after every emitted segment
        while block_offset >> FILTER_BASE_LOG > self.offsets.len() as u64 {
            self.emit()?;
        }

        Ok(())
    }

    fn finish(mut self) -> crate::Result<Vec<u8>> {
        if self.count > 0 {
            self.emit()?;
        }

        // NOTE: Sentinel
        self.append_offset()?;

        let segment_count = self.offsets.len() - 1;
        let data_len = self.data.len();

        trailer::encode_into(&mut self.data, &self.offsets, FILTER_BASE_LOG);

        log::trace!(
            "Finished per-block filter with {segment_count} segments ({data_len} B data, {} B total)",
            self.data.len(),
        );

        Ok(self.data)
    }

    fn meta_name(&self) -> String {
        FilterKind::PerBlock.meta_name(self.policy.name())
    }

    fn policy_name(&self) -> &str {
        self.policy.name()
    }
}

/// Reads a filter built by [`BlockFilterWriter`]
///
/// Immutable after construction, so it can be shared between threads.
#[derive(Clone)]
pub struct BlockFilterReader {
    policy: Arc<dyn FilterPolicy>,
    blob: Slice,
    trailer: Trailer,
}

impl BlockFilterReader {
    /// Parses a per-block filter blob.
    ///
    /// Returns `None` if the blob is structurally invalid, in which
    /// case the table should be read without filtering.
    #[must_use]
    pub fn new(policy: Arc<dyn FilterPolicy>, blob: Slice) -> Option<Self> {
        let Some(trailer) = Trailer::decode(&blob) else {
            log::warn!(
                "Ignoring unusable per-block filter of policy {:?} ({} B)",
                policy.name(),
                blob.len(),
            );
            return None;
        };

        Some(Self {
            policy,
            blob,
            trailer,
        })
    }

    /// Number of filter segments (windows) in the blob.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.trailer.segment_count()
    }

    /// Returns `false` only if the key is definitely not contained
    /// in the data block starting at `block_offset`.
    ///
    /// Out-of-range windows, empty segments and corrupt bounds answer `true`.
    #[must_use]
    pub fn may_contain(&self, block_offset: u64, key: &[u8]) -> bool {
        let index = block_offset
            .checked_shr(u32::from(self.trailer.shift))
            .unwrap_or(0);

        let Ok(index) = usize::try_from(index) else {
            return true;
        };

        let Some((low, high)) = self.trailer.segment_bounds(&self.blob, index) else {
            return true;
        };

        if low >= high || high > self.trailer.data_len {
            return true;
        }

        let Some(segment) = self.blob.get(low as usize..high as usize) else {
            return true;
        };

        self.policy.may_contain(FilterKind::PerBlock, segment, key)
    }
}
