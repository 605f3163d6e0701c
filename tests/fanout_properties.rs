// tests/fanout_properties.rs

use proptest::prelude::*;
use procrun::sink::{FanoutWriter, Sink};
use procrun_test_utils::sinks::{MemorySink, shared};

proptest! {
    #[test]
    fn every_sink_receives_the_full_stream(
        chunks in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..64), 0..20),
        sink_count in 1usize..5,
    ) {
        let sinks: Vec<_> = (0..sink_count).map(|_| MemorySink::new().shared()).collect();
        let writer = FanoutWriter::new(sinks.iter().map(shared));

        for chunk in &chunks {
            prop_assert_eq!(writer.write(chunk).unwrap(), chunk.len());
        }

        let expected: Vec<u8> = chunks.concat();
        for sink in &sinks {
            prop_assert_eq!(sink.contents(), expected.clone());
            prop_assert_eq!(sink.write_calls(), chunks.len());
        }
    }

    #[test]
    fn failure_position_decides_who_saw_the_write(
        sink_count in 1usize..6,
        fail_at in 0usize..6,
    ) {
        let fail_at = fail_at % sink_count;
        let sinks: Vec<_> = (0..sink_count)
            .map(|i| {
                if i == fail_at {
                    MemorySink::new().fail_writes("boom").shared()
                } else {
                    MemorySink::new().shared()
                }
            })
            .collect();
        let writer = FanoutWriter::new(sinks.iter().map(shared));

        prop_assert!(writer.write(b"x").is_err());

        for (i, sink) in sinks.iter().enumerate() {
            let expected_calls = usize::from(i <= fail_at);
            prop_assert_eq!(sink.write_calls(), expected_calls);
        }
    }
}
