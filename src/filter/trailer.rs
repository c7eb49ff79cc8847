// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// Size of one offset table entry
pub const OFFSET_SIZE: usize = std::mem::size_of::<u32>();

/// Size of the fixed trailer part: sentinel offset + shift byte
pub const TRAILER_SIZE: usize = OFFSET_SIZE + 1;

/// Encodes the offset table and shift byte behind the segment data.
///
/// `offsets` must already contain the sentinel.
#[expect(
    clippy::expect_used,
    reason = "we write into a Vec<u8>, so no I/O error can happen"
)]
pub fn encode_into(buf: &mut Vec<u8>, offsets: &[u32], shift: u8) {
    buf.reserve(offsets.len() * OFFSET_SIZE + 1);

    for &offset in offsets {
        buf.write_u32::<LittleEndian>(offset)
            .expect("should not fail");
    }

    buf.write_u8(shift).expect("should not fail");
}

/// Decoded trailer of a per-block filter blob
///
/// `[segments][offset table][shift]`
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Trailer {
    /// Length of the segment data, equal to the sentinel offset
    pub data_len: u32,

    /// Number of entries in the offset table, including the sentinel
    pub offset_count: usize,

    /// log2 of the window size in table bytes
    pub shift: u8,
}

impl Trailer {
    /// Parses the trailer from the end of the blob.
    ///
    /// Returns `None` if the blob is structurally invalid.
    #[must_use]
    pub fn decode(blob: &[u8]) -> Option<Self> {
        let (&shift, rest) = blob.split_last()?;

        let sentinel_pos = rest.len().checked_sub(OFFSET_SIZE)?;
        let data_len = read_u32(rest, sentinel_pos)?;

        if data_len as usize > sentinel_pos {
            return None;
        }

        let table_len = rest.len() - data_len as usize;
        if table_len % OFFSET_SIZE != 0 {
            return None;
        }

        Some(Self {
            data_len,
            offset_count: table_len / OFFSET_SIZE,
            shift,
        })
    }

    /// Number of real segments (the sentinel does not start a segment).
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.offset_count.saturating_sub(1)
    }

    /// Reads the offset table entry at `idx`.
    #[must_use]
    pub fn offset(&self, blob: &[u8], idx: usize) -> Option<u32> {
        if idx >= self.offset_count {
            return None;
        }

        read_u32(blob, self.data_len as usize + idx * OFFSET_SIZE)
    }

    /// Returns the `(low, high)` byte bounds of segment `idx`.
    #[must_use]
    pub fn segment_bounds(&self, blob: &[u8], idx: usize) -> Option<(u32, u32)> {
        if idx >= self.segment_count() {
            return None;
        }

        Some((self.offset(blob, idx)?, self.offset(blob, idx + 1)?))
    }
}

fn read_u32(bytes: &[u8], pos: usize) -> Option<u32> {
    let mut reader = bytes.get(pos..)?;
    reader.read_u32::<LittleEndian>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn trailer_encode_layout() {
        let mut buf = vec![0xAA, 0xBB, 0xCC];
        encode_into(&mut buf, &[0, 2, 3], 11);

        assert_eq!(
            [0xAA, 0xBB, 0xCC, 0, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 11],
            &*buf,
        );
    }

    #[test]
    fn trailer_decode() {
        let blob = [0xAA, 0xBB, 0xCC, 0, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 11];
        let trailer = Trailer::decode(&blob).expect("should be valid");

        assert_eq!(3, trailer.data_len);
        assert_eq!(3, trailer.offset_count);
        assert_eq!(2, trailer.segment_count());
        assert_eq!(11, trailer.shift);

        assert_eq!(Some((0, 2)), trailer.segment_bounds(&blob, 0));
        assert_eq!(Some((2, 3)), trailer.segment_bounds(&blob, 1));
        assert_eq!(None, trailer.segment_bounds(&blob, 2));
        assert_eq!(Some(3), trailer.offset(&blob, 2));
        assert_eq!(None, trailer.offset(&blob, 3));
    }

    #[test]
    fn trailer_decode_minimal() {
        let blob = [0, 0, 0, 0, 11];
        let trailer = Trailer::decode(&blob).expect("should be valid");

        assert_eq!(0, trailer.data_len);
        assert_eq!(1, trailer.offset_count);
        assert_eq!(0, trailer.segment_count());
        assert_eq!(None, trailer.segment_bounds(&blob, 0));
    }

    #[test]
    fn trailer_decode_too_short() {
        assert_eq!(None, Trailer::decode(&[]));
        assert_eq!(None, Trailer::decode(&[11]));
        assert_eq!(None, Trailer::decode(&[0, 0, 11]));
        assert_eq!(None, Trailer::decode(&[0, 0, 0, 11]));
    }

    #[test]
    fn trailer_decode_sentinel_out_of_range() {
        // sentinel says 1 byte of data, but there is none
        assert_eq!(None, Trailer::decode(&[1, 0, 0, 0, 11]));
        assert_eq!(None, Trailer::decode(&[0xFF, 0xFF, 0xFF, 0xFF, 11]));
    }

    #[test]
    fn trailer_decode_misaligned_table() {
        // 1 byte data, 5 bytes offset table
        assert_eq!(None, Trailer::decode(&[0xAA, 0xBB, 1, 0, 0, 0, 11]));
    }
}
