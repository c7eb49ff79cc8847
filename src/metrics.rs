// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering::Relaxed;

/// Filter query counters
#[derive(Debug, Default)]
pub struct Metrics {
    /// Number of filter queries that were performed
    pub(crate) filter_queries: AtomicUsize,

    /// Number of block loads that were skipped because the filter ruled the key out
    pub(crate) filter_hits: AtomicUsize,
}

#[allow(clippy::cast_precision_loss)]
impl Metrics {
    pub(crate) fn record_query(&self, may_contain: bool) {
        self.filter_queries.fetch_add(1, Relaxed);

        if !may_contain {
            self.filter_hits.fetch_add(1, Relaxed);
        }
    }

    /// Number of filter queries that were performed.
    pub fn filter_queries(&self) -> usize {
        self.filter_queries.load(Relaxed)
    }

    /// Number of block loads that were skipped.
    pub fn filter_hits(&self) -> usize {
        self.filter_hits.load(Relaxed)
    }

    /// Filter efficiency in percent (0.0 - 1.0).
    ///
    /// Is 0.0 as long as no query was performed.
    pub fn filter_efficiency(&self) -> f64 {
        let queries = self.filter_queries.load(Relaxed);
        if queries == 0 {
            return 0.0;
        }

        let hits = self.filter_hits.load(Relaxed) as f64;
        hits / queries as f64
    }
}
