// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::{
    bloom::{BloomConstructionPolicy, BloomFilterPolicy},
    AnyFilterWriter, FilterKind, FilterPolicy,
};
use std::sync::Arc;

/// Filter policy entry
///
/// Each level can be configured with a different filter kind and bits per key
#[derive(Copy, Debug, Clone, PartialEq)]
pub enum FilterPolicyEntry {
    /// Skip filter construction
    None,

    /// Per-block bloom filters (one per 2 KiB window of the table)
    Block(BloomConstructionPolicy),

    /// One bloom filter over the whole table
    Table(BloomConstructionPolicy),
}

impl FilterPolicyEntry {
    /// Returns the filter kind, or `None` if no filter should be built.
    #[must_use]
    pub fn kind(&self) -> Option<FilterKind> {
        match self {
            Self::None => None,
            Self::Block(bloom) | Self::Table(bloom) if !bloom.is_active() => None,
            Self::Block(_) => Some(FilterKind::PerBlock),
            Self::Table(_) => Some(FilterKind::WholeTable),
        }
    }

    /// Returns the filter policy, or `None` if no filter should be built.
    #[must_use]
    pub fn policy(&self) -> Option<Arc<dyn FilterPolicy>> {
        match self {
            Self::None => None,
            Self::Block(bloom) | Self::Table(bloom) => {
                if bloom.is_active() {
                    Some(Arc::new(BloomFilterPolicy::new(*bloom)))
                } else {
                    None
                }
            }
        }
    }

    /// Creates a filter writer for a new table.
    #[must_use]
    pub fn writer(&self) -> Option<AnyFilterWriter> {
        Some(AnyFilterWriter::new(self.kind()?, self.policy()?))
    }
}

/// Filter configuration
///
/// Holds one entry per level, the last entry is used for all deeper levels.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig(Vec<FilterPolicyEntry>);

impl std::ops::Deref for FilterConfig {
    type Target = [FilterPolicyEntry];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::all(FilterPolicyEntry::Block(BloomConstructionPolicy::BitsPerKey(
            10.0,
        )))
    }
}

impl FilterConfig {
    /// Returns the entry of the given level.
    #[must_use]
    pub fn get(&self, level: usize) -> FilterPolicyEntry {
        self.0
            .get(level)
            .or_else(|| self.0.last())
            .copied()
            .unwrap_or(FilterPolicyEntry::None)
    }

    /// Uses the same filter policy in every level.
    #[must_use]
    pub fn all(c: FilterPolicyEntry) -> Self {
        Self(vec![c])
    }

    /// Constructs a custom filter policy.
    #[must_use]
    pub fn new(policy: &[FilterPolicyEntry]) -> Self {
        assert!(!policy.is_empty(), "filter policy may not be empty");
        assert!(policy.len() <= 255, "filter policy is too large");
        Self(policy.into())
    }

    /// Creates a filter writer for a table in the given level.
    #[must_use]
    pub fn writer(&self, level: usize) -> Option<AnyFilterWriter> {
        self.get(level).writer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilterWriter;
    use test_log::test;

    #[test]
    fn filter_config_get_falls_back_to_last() {
        let config = FilterConfig::new(&[
            FilterPolicyEntry::Table(BloomConstructionPolicy::BitsPerKey(12.0)),
            FilterPolicyEntry::Block(BloomConstructionPolicy::FalsePositiveRate(0.01)),
            FilterPolicyEntry::None,
        ]);

        assert_eq!(Some(FilterKind::WholeTable), config.get(0).kind());
        assert_eq!(Some(FilterKind::PerBlock), config.get(1).kind());
        assert_eq!(None, config.get(2).kind());
        assert_eq!(None, config.get(6).kind());
        assert!(config.writer(6).is_none());
    }

    #[test]
    fn filter_config_default() {
        let config = FilterConfig::default();
        assert_eq!(1, config.len());

        let writer = config.writer(3).expect("should build filter");
        assert_eq!(FilterKind::PerBlock, writer.kind());
        assert_eq!("filter.lsm.std_bloom", writer.meta_name());
    }

    #[test]
    fn filter_config_inactive_bloom() {
        let entry = FilterPolicyEntry::Table(BloomConstructionPolicy::BitsPerKey(0.0));
        assert_eq!(None, entry.kind());
        assert!(entry.policy().is_none());
        assert!(entry.writer().is_none());
    }

    #[test]
    #[should_panic(expected = "filter policy may not be empty")]
    fn filter_config_empty() {
        let _ = FilterConfig::new(&[]);
    }
}
