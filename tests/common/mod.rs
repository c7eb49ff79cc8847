#![allow(dead_code)]

use lsm_filter_block::{FilterKeyWriter, FilterKind, FilterPolicy, FilterWriter};
use std::sync::Mutex;

/// A data block as the table writer would lay it out
pub struct DataBlock {
    pub offset: u64,
    pub keys: Vec<Vec<u8>>,
}

/// Feeds blocks to a filter writer the way a table writer does:
/// keys of a block first, then the offset where the next block starts.
pub fn write_blocks<W: FilterWriter>(
    writer: &mut W,
    blocks: &[DataBlock],
    end: u64,
) -> lsm_filter_block::Result<()> {
    for (idx, block) in blocks.iter().enumerate() {
        for key in &block.keys {
            writer.add_key(key);
        }

        let next_offset = blocks.get(idx + 1).map_or(end, |next| next.offset);
        writer.finish_block(next_offset)?;
    }

    Ok(())
}

/// Lays out blocks with the given sizes and key counts.
///
/// Returns the blocks and the offset where the last block ends.
pub fn layout(
    sizes_and_key_counts: impl IntoIterator<Item = (u64, usize)>,
) -> (Vec<DataBlock>, u64) {
    let mut offset = 0;
    let mut blocks = vec![];

    for (block_idx, (size, key_count)) in sizes_and_key_counts.into_iter().enumerate() {
        blocks.push(DataBlock {
            offset,
            keys: (0..key_count)
                .map(|key_idx| format!("block{block_idx:05}-key{key_idx:05}").into_bytes())
                .collect(),
        });

        offset += size;
    }

    (blocks, offset)
}

/// Exact set "filter", so lookups of absent keys are deterministic
///
/// Records which kinds it was queried with.
#[derive(Default)]
pub struct ExactPolicy {
    pub queried_kinds: Mutex<Vec<FilterKind>>,
}

struct ExactWriter(Vec<Vec<u8>>);

impl FilterKeyWriter for ExactWriter {
    fn add_key(&mut self, key: &[u8]) {
        self.0.push(key.to_vec());
    }

    fn finish(&mut self, mut buf: Vec<u8>) -> Vec<u8> {
        for key in self.0.drain(..) {
            buf.push(u8::try_from(key.len()).expect("key should be short"));
            buf.extend_from_slice(&key);
        }
        buf
    }
}

impl FilterPolicy for ExactPolicy {
    fn name(&self) -> &str {
        "exact"
    }

    fn new_writer(&self, _kind: FilterKind) -> Box<dyn FilterKeyWriter> {
        Box::new(ExactWriter(vec![]))
    }

    fn may_contain(&self, kind: FilterKind, mut filter: &[u8], key: &[u8]) -> bool {
        self.queried_kinds.lock().expect("lock is poisoned").push(kind);

        while let Some((&len, rest)) = filter.split_first() {
            let Some(candidate) = rest.get(..usize::from(len)) else {
                return true;
            };

            if candidate == key {
                return true;
            }

            filter = rest.get(usize::from(len)..).unwrap_or_default();
        }

        false
    }
}
