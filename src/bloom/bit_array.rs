// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

const BIT_MASK: u8 = 0b1000_0000_u8;

/// Gets a bit from the byte
fn get_bit(byte: u8, idx: usize) -> bool {
    let bit_mask = BIT_MASK >> idx;

    let masked = byte & bit_mask;
    masked > 0
}

/// Sets a bit in the byte to `true`
#[must_use]
fn enable_bit(byte: u8, idx: usize) -> u8 {
    let bit_mask = BIT_MASK >> idx;
    byte | bit_mask
}

/// Fixed-size bit array
#[derive(Debug)]
pub struct Builder(Box<[u8]>);

impl Builder {
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        let vec = vec![0; bytes];
        Self(vec.into_boxed_slice())
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Sets the i-th bit.
    ///
    /// Bits beyond the array are ignored.
    pub fn enable_bit(&mut self, idx: usize) {
        if let Some(byte) = self.0.get_mut(idx / 8) {
            *byte = enable_bit(*byte, idx % 8);
        }
    }
}

/// Fixed-size bit array reader
#[derive(Debug)]
pub struct BitArrayReader<'a>(&'a [u8]);

impl<'a> BitArrayReader<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self(bytes)
    }

    /// Gets the i-th bit.
    ///
    /// A bit beyond the array reads as set, so truncated filters
    /// can only cause false positives.
    #[must_use]
    pub fn get(&self, idx: usize) -> bool {
        self.0
            .get(idx / 8)
            .is_none_or(|byte| get_bit(*byte, idx % 8))
    }
}
