#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use lsm_filter_block::{
    AnyFilterWriter, BloomFilterPolicy, FilterKind, FilterPolicy, FilterReader, FilterWriter,
};
use std::sync::Arc;

#[derive(Arbitrary, Debug)]
struct FuzzyBlock {
    size: u16,
    keys: Vec<Vec<u8>>,
}

fuzz_target!(|blocks: Vec<FuzzyBlock>| {
    let policy: Arc<dyn FilterPolicy> = Arc::new(BloomFilterPolicy::default());

    for kind in [FilterKind::PerBlock, FilterKind::WholeTable] {
        let mut writer = AnyFilterWriter::new(kind, policy.clone());
        let mut offset = 0u64;

        for block in &blocks {
            for key in &block.keys {
                writer.add_key(key);
            }

            offset += u64::from(block.size);
            writer.finish_block(offset).expect("should not be too large");
        }

        let blob = writer.finish().expect("should not be too large");
        let has_keys = blocks.iter().any(|block| !block.keys.is_empty());

        let Some(reader) = FilterReader::new(kind, policy.clone(), blob.into()) else {
            assert!(!has_keys, "filter with keys should be readable");
            continue;
        };

        let mut block_offset = 0u64;

        for block in &blocks {
            for key in &block.keys {
                assert!(reader.may_contain(block_offset, key), "false negative");
            }

            block_offset += u64::from(block.size);
        }
    }
});
