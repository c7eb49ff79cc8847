// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

mod block;
mod table;
pub(crate) mod trailer;

pub use block::{BlockFilterReader, BlockFilterWriter, FILTER_BASE_LOG};
pub use table::{TableFilterReader, TableFilterWriter};

#[cfg(feature = "metrics")]
use crate::metrics::Metrics;

use crate::{FilterKind, FilterPolicy, Slice};
use enum_dispatch::enum_dispatch;
use std::sync::Arc;

/// Builds filter data while a table is being written
///
/// The table writer passes every key of a data block to [`FilterWriter::add_key`],
/// and after the block is written, the offset where the next block starts
/// to [`FilterWriter::finish_block`].
#[enum_dispatch]
pub trait FilterWriter {
    /// Registers a key of the current data block.
    fn add_key(&mut self, key: &[u8]);

    /// Signals that a data block was written and the next one starts at `block_offset`.
    ///
    /// Offsets must be passed in increasing order.
    fn finish_block(&mut self, block_offset: u64) -> crate::Result<()>;

    /// Returns the finished filter blob.
    ///
    /// An empty blob means there is no filter to store.
    fn finish(self) -> crate::Result<Vec<u8>>;

    /// Name of the meta block the filter is stored under.
    fn meta_name(&self) -> String;

    /// Name of the filter policy.
    fn policy_name(&self) -> &str;
}

/// Any filter writer
#[enum_dispatch(FilterWriter)]
pub enum AnyFilterWriter {
    /// Per-block filter
    Block(BlockFilterWriter),

    /// Whole-table filter
    Table(TableFilterWriter),
}

impl AnyFilterWriter {
    /// Creates a writer for the given filter kind.
    #[must_use]
    pub fn new(kind: FilterKind, policy: Arc<dyn FilterPolicy>) -> Self {
        match kind {
            FilterKind::PerBlock => BlockFilterWriter::new(policy).into(),
            FilterKind::WholeTable => TableFilterWriter::new(policy).into(),
        }
    }

    /// Returns the kind of filter that is built.
    #[must_use]
    pub fn kind(&self) -> FilterKind {
        match self {
            Self::Block(_) => FilterKind::PerBlock,
            Self::Table(_) => FilterKind::WholeTable,
        }
    }
}

#[derive(Clone)]
enum Inner {
    Block(BlockFilterReader),
    Table(TableFilterReader),
}

/// Filter of an opened table
///
/// Immutable, so it can be queried concurrently.
#[derive(Clone)]
pub struct FilterReader {
    inner: Inner,

    #[cfg(feature = "metrics")]
    metrics: Arc<Metrics>,
}

impl From<Inner> for FilterReader {
    fn from(inner: Inner) -> Self {
        Self {
            inner,

            #[cfg(feature = "metrics")]
            metrics: Arc::default(),
        }
    }
}

impl FilterReader {
    /// Builds a reader for a filter blob of the given kind.
    ///
    /// Returns `None` if the blob is unusable.
    #[must_use]
    pub fn new(kind: FilterKind, policy: Arc<dyn FilterPolicy>, blob: Slice) -> Option<Self> {
        let inner = match kind {
            FilterKind::PerBlock => Inner::Block(BlockFilterReader::new(policy, blob)?),
            FilterKind::WholeTable => Inner::Table(TableFilterReader::new(policy, blob)?),
        };

        Some(inner.into())
    }

    /// Looks up the filter of `policy` in a table's meta blocks.
    ///
    /// A whole-table filter is preferred over a per-block filter.
    /// Filters written by other policies are never picked up.
    #[must_use]
    pub fn open<F>(policy: &Arc<dyn FilterPolicy>, lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<Slice>,
    {
        [FilterKind::WholeTable, FilterKind::PerBlock]
            .into_iter()
            .find_map(|kind| {
                let name = kind.meta_name(policy.name());

                let Some(blob) = lookup(&name) else {
                    log::trace!("No filter meta block {name:?}");
                    return None;
                };

                log::debug!("Found filter meta block {name:?} ({} B)", blob.len());

                Self::new(kind, policy.clone(), blob)
            })
    }

    /// Uses a shared metrics handle, so counters can be aggregated over many tables.
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Returns the metrics of this reader.
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Returns the kind of filter that is read.
    #[must_use]
    pub fn kind(&self) -> FilterKind {
        match &self.inner {
            Inner::Block(_) => FilterKind::PerBlock,
            Inner::Table(_) => FilterKind::WholeTable,
        }
    }

    /// Returns `false` only if the key is definitely not contained
    /// in the data block starting at `block_offset`.
    ///
    /// Whole-table filters ignore the block offset.
    #[must_use]
    pub fn may_contain(&self, block_offset: u64, key: &[u8]) -> bool {
        let result = match &self.inner {
            Inner::Block(reader) => reader.may_contain(block_offset, key),
            Inner::Table(reader) => reader.may_contain(key),
        };

        #[cfg(feature = "metrics")]
        self.metrics.record_query(result);

        result
    }
}
