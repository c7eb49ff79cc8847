#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use lsm_filter_block::{BloomFilterPolicy, FilterKind, FilterPolicy, FilterReader};
use std::sync::Arc;

#[derive(Arbitrary, Debug)]
struct FuzzyInput {
    blob: Vec<u8>,
    queries: Vec<(u64, Vec<u8>)>,
}

// Arbitrary blobs may be rejected or answer anything, but must never panic
fuzz_target!(|input: FuzzyInput| {
    let policy: Arc<dyn FilterPolicy> = Arc::new(BloomFilterPolicy::default());

    for kind in [FilterKind::PerBlock, FilterKind::WholeTable] {
        let Some(reader) = FilterReader::new(kind, policy.clone(), input.blob.clone().into())
        else {
            continue;
        };

        for (block_offset, key) in &input.queries {
            let _ = reader.may_contain(*block_offset, key);
        }
    }
});
