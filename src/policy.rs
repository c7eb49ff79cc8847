// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Which kind of filter a policy is asked to build or query
///
/// One algorithm family may format its output differently per kind,
/// so the kind is passed into every policy call.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// One filter per fixed-size window of table bytes
    PerBlock,

    /// One filter covering every key in the table
    WholeTable,
}

impl FilterKind {
    /// Prefix of the meta block name under which this kind of filter is stored.
    #[must_use]
    pub fn meta_prefix(self) -> &'static str {
        match self {
            Self::PerBlock => "filter.",
            Self::WholeTable => "fullfilter.",
        }
    }

    /// Meta block name for a filter of this kind built by the given policy.
    #[must_use]
    pub fn meta_name(self, policy_name: &str) -> String {
        format!("{}{policy_name}", self.meta_prefix())
    }
}

/// Splits a meta block name into filter kind and policy name.
///
/// Returns `None` if the name does not denote a filter.
#[must_use]
pub fn parse_meta_name(name: &str) -> Option<(FilterKind, &str)> {
    [FilterKind::WholeTable, FilterKind::PerBlock]
        .into_iter()
        .find_map(|kind| {
            name.strip_prefix(kind.meta_prefix())
                .filter(|policy_name| !policy_name.is_empty())
                .map(|policy_name| (kind, policy_name))
        })
}

/// Accumulates keys for one filter
///
/// Obtained from [`FilterPolicy::new_writer`].
pub trait FilterKeyWriter: Send {
    /// Adds a key to the filter under construction.
    fn add_key(&mut self, key: &[u8]);

    /// Appends the finished filter of all keys added so far to `buf`
    /// and returns the combined buffer.
    ///
    /// Resets the accumulator, so it can be used for the next filter.
    fn finish(&mut self, buf: Vec<u8>) -> Vec<u8>;
}

/// A filter algorithm
///
/// Builds filters through [`FilterKeyWriter`]s and answers membership
/// queries over finished filter bytes.
pub trait FilterPolicy: Send + Sync {
    /// Stable identifier of the policy, embedded in the meta block name.
    ///
    /// Must change whenever the filter format changes.
    fn name(&self) -> &str;

    /// Begins a new key accumulation session.
    fn new_writer(&self, kind: FilterKind) -> Box<dyn FilterKeyWriter>;

    /// Returns `true` if the key may be contained in the filter.
    ///
    /// Must never have a false negative. Malformed filter bytes
    /// should be answered with `true`.
    fn may_contain(&self, kind: FilterKind, filter: &[u8], key: &[u8]) -> bool;
}
