// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use super::FilterWriter;
use crate::{FilterKeyWriter, FilterKind, FilterPolicy, Slice};
use std::sync::Arc;

/// Builds a single filter over all keys of a table
pub struct TableFilterWriter {
    policy: Arc<dyn FilterPolicy>,
    writer: Box<dyn FilterKeyWriter>,

    /// Number of keys added to the filter
    count: usize,
}

impl TableFilterWriter {
    /// Creates a writer that builds a whole-table filter with the given policy.
    #[must_use]
    pub fn new(policy: Arc<dyn FilterPolicy>) -> Self {
        let writer = policy.new_writer(FilterKind::WholeTable);

        Self {
            policy,
            writer,
            count: 0,
        }
    }
}

impl FilterWriter for TableFilterWriter {
    fn add_key(&mut self, key: &[u8]) {
        self.count += 1;
        self.writer.add_key(key);
    }

    fn finish_block(&mut self, _block_offset: u64) -> crate::Result<()> {
        // NOTE: Table-level filters have nothing to do when a block is finished
        Ok(())
    }

    fn finish(mut self) -> crate::Result<Vec<u8>> {
        if self.count == 0 {
            log::trace!("Table filter has no keys - not building filter");
            return Ok(Vec::new());
        }

        let blob = self.writer.finish(Vec::new());

        log::trace!(
            "Finished table filter with {} keys ({} B)",
            self.count,
            blob.len(),
        );

        Ok(blob)
    }

    fn meta_name(&self) -> String {
        FilterKind::WholeTable.meta_name(self.policy.name())
    }

    fn policy_name(&self) -> &str {
        self.policy.name()
    }
}

/// Reads a filter built by [`TableFilterWriter`]
#[derive(Clone)]
pub struct TableFilterReader {
    policy: Arc<dyn FilterPolicy>,
    blob: Slice,
}

impl TableFilterReader {
    /// Wraps a whole-table filter blob.
    ///
    /// Returns `None` for an empty blob, which means "no filter".
    #[must_use]
    pub fn new(policy: Arc<dyn FilterPolicy>, blob: Slice) -> Option<Self> {
        if blob.is_empty() {
            return None;
        }

        Some(Self { policy, blob })
    }

    /// Returns `false` only if the key is definitely not contained in the table.
    #[must_use]
    pub fn may_contain(&self, key: &[u8]) -> bool {
        self.policy
            .may_contain(FilterKind::WholeTable, &self.blob, key)
    }
}
