// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

/// Represents errors that can occur while building or decoding filters
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(std::io::Error),

    /// Filter data grew beyond what a 32-bit offset table can address
    ///
    /// Contains the length of the segment data in bytes.
    FilterTooLarge(u64),

    /// Invalid or unparseable filter header
    InvalidHeader(&'static str),

    /// Invalid enum tag
    InvalidTag((&'static str, u8)),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FilterTooLarge(len) => {
                write!(f, "FilterBlockError: filter data is too long ({len} B)")
            }
            e => write!(f, "FilterBlockError: {e:?}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Filter block result
pub type Result<T> = std::result::Result<T, Error>;
