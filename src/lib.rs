// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

//! Filter blocks for the sorted tables of an LSM-tree.
//!
//! ##### About
//!
//! Before a table reader loads (and possibly decompresses) a data block to look
//! up a key, it asks the table's filter whether the key can be in there at all.
//! A filter has no false negatives, but a small, bounded false positive rate,
//! so most lookups of absent keys never touch a data block.
//!
//! Two kinds of filters are supported:
//!
//! - **Per-block filters** ([`BlockFilterWriter`], [`BlockFilterReader`]) store one filter
//!   per 2 KiB window of table bytes. A data block starting at byte offset `B` is
//!   covered by filter `B >> 11`, so no per-block pointers need to be stored.
//! - **Whole-table filters** ([`TableFilterWriter`], [`TableFilterReader`]) store
//!   a single filter over every key in the table.
//!
//! The filter algorithm is pluggable through [`FilterPolicy`];
//! a standard bloom filter is provided as [`BloomFilterPolicy`].
//!
//! ##### Corruption
//!
//! Filters only ever make reads cheaper. A blob that cannot be parsed is treated
//! as "no filter", and any ambiguous lookup answers "may contain", so corrupt
//! filter data costs extra block reads, never a wrong answer.
//!
//! ##### Per-block filter layout
//!
//! ```text
//! [segments][offset table: (N + 1) x u32 LE][shift: u8 = 11]
//! ```
//!
//! The last offset table entry (the sentinel) is the length of the segment data.

#![deny(clippy::all, missing_docs, clippy::cargo)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::indexing_slicing)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![warn(clippy::multiple_crate_versions)]
#![allow(clippy::option_if_let_else)]
#![warn(clippy::redundant_feature_names)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

#[doc(hidden)]
pub mod bloom;

/// Configuration
pub mod config;

mod error;
mod filter;
mod hash;

#[cfg(feature = "metrics")]
mod metrics;

mod policy;
mod slice;

pub use {
    bloom::{BloomFilterPolicy, STANDARD_BLOOM_POLICY_NAME},
    config::{BloomConstructionPolicy, FilterConfig, FilterPolicyEntry},
    error::{Error, Result},
    filter::{
        AnyFilterWriter, BlockFilterReader, BlockFilterWriter, FilterReader, FilterWriter,
        TableFilterReader, TableFilterWriter, FILTER_BASE_LOG,
    },
    policy::{parse_meta_name, FilterKeyWriter, FilterKind, FilterPolicy},
    slice::Slice,
};

#[cfg(feature = "metrics")]
pub use metrics::Metrics;
