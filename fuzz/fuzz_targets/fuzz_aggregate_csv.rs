#![no_main]

use std::collections::HashSet;

use libfuzzer_sys::fuzz_target;
use rollup_model::{aggregate_csv, AggregateError};

/// Arbitrary CSV bytes must never panic, and a successful pass must respect the output
/// invariants: unique, trimmed, non-empty departments and consistent row counters.
fuzz_target!(|data: &[u8]| {
    match aggregate_csv(data) {
        Ok(rollup) => {
            assert!(!rollup.summaries.is_empty());

            let mut seen = HashSet::new();
            for summary in &rollup.summaries {
                assert!(!summary.group.is_empty());
                assert_eq!(summary.group.trim(), summary.group);
                assert!(seen.insert(summary.group.as_str()), "duplicate {}", summary.group);
            }

            let stats = &rollup.stats;
            assert_eq!(stats.rows_aggregated + stats.rows_skipped(), stats.rows_read);
            assert!(stats.rows_aggregated >= rollup.summaries.len() as u64);
        }
        Err(AggregateError::UnreadableRow { row, .. }) => assert!(row >= 1),
        Err(_) => {}
    }
});
