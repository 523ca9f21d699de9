//! Property-based tests for glypho live
//!
//! These tests verify invariants that must hold for all inputs:
//! - The decoder never panics and ignores chunk boundaries
//! - Only the exact sentinel leaves the container untouched
//! - After any message sequence the container holds the last real payload
//!
//! Run with: cargo test --test property_tests

use proptest::prelude::*;

// ============================================================================
// SSE DECODER TESTS
// ============================================================================

mod decoder_tests {
    use super::*;
    use glypho::realtime::{SseDecoder, SseEvent};

    fn decode_chunked(input: &[u8], cuts: &[usize]) -> Vec<SseEvent> {
        let mut points: Vec<usize> = cuts.iter().map(|c| c % (input.len() + 1)).collect();
        points.sort_unstable();
        points.dedup();

        let mut decoder = SseDecoder::new();
        let mut events = Vec::new();
        let mut start = 0;
        for p in points {
            events.extend(decoder.feed(&input[start..p]));
            start = p;
        }
        events.extend(decoder.feed(&input[start..]));
        events
    }

    fn stream_line() -> impl Strategy<Value = String> {
        prop_oneof![
            "data: [a-z<>/ ]{0,12}",
            "data:[a-z]{0,4}",
            "event: [a-z-]{1,8}",
            "id: [0-9]{1,3}",
            "retry: [0-9]{1,4}",
            ": ?[a-z-]{0,10}",
            Just(String::new()),
        ]
    }

    fn stream() -> impl Strategy<Value = Vec<u8>> {
        (
            prop::collection::vec(stream_line(), 0..30),
            prop::sample::select(vec!["\n", "\r\n", "\r"]),
        )
            .prop_map(|(lines, eol)| {
                let mut s = lines.join(eol);
                s.push_str(eol);
                s.push_str(eol);
                s.into_bytes()
            })
    }

    proptest! {
        /// Invariant: arbitrary bytes never panic the decoder
        #[test]
        fn never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
            let mut decoder = SseDecoder::new();
            let _ = decoder.feed(&bytes);
        }

        /// Invariant: chunk boundaries do not change the decoded events
        #[test]
        fn chunking_invariant(
            input in stream(),
            cuts in prop::collection::vec(any::<usize>(), 0..16),
        ) {
            let whole = SseDecoder::new().feed(&input);
            let chunked = decode_chunked(&input, &cuts);
            prop_assert_eq!(whole, chunked);
        }

        /// Invariant: a single data line comes back verbatim
        #[test]
        fn data_preserved(payload in "[^\r\n]{0,64}") {
            let input = format!("data:{}\n\n", payload);
            let events = SseDecoder::new().feed(input.as_bytes());
            prop_assert_eq!(events.len(), 1);
            let expected = payload.strip_prefix(' ').unwrap_or(&payload);
            prop_assert_eq!(events[0].data.as_str(), expected);
        }
    }
}

// ============================================================================
// PAGE UPDATER TESTS
// ============================================================================

mod updater_tests {
    use super::*;
    use glypho::updater::{Container, Highlighter, PageUpdater, Typesetter, Update};
    use glypho::{Result, SENTINEL};

    struct Memory(String);

    impl Container for Memory {
        fn replace_content(&mut self, html: &str) -> Result<()> {
            self.0 = html.to_string();
            Ok(())
        }

        fn content(&self) -> String {
            self.0.clone()
        }
    }

    struct Noop;

    impl Highlighter<Memory> for Noop {
        fn highlight_all_under(&mut self, _container: &Memory) -> Result<()> {
            Ok(())
        }
    }

    impl Typesetter<Memory> for Noop {
        fn typeset(&mut self, _container: &Memory) -> Result<()> {
            Ok(())
        }
    }

    fn payload() -> impl Strategy<Value = String> {
        prop_oneof![Just(SENTINEL.to_string()), "\\PC{0,24}"]
    }

    proptest! {
        /// Invariant: every payload except the sentinel replaces the content
        #[test]
        fn non_sentinel_replaces(initial in "\\PC{0,16}", p in "\\PC{0,32}") {
            let mut page = PageUpdater::new(Memory(initial.clone()), Noop, Noop);
            let update = page.handle_payload(&p).unwrap();

            if p == SENTINEL {
                prop_assert_eq!(update, Update::Skip);
                prop_assert_eq!(page.container().content(), initial);
            } else {
                prop_assert_eq!(page.container().content(), p);
            }
        }

        /// Invariant: content equals the last non-sentinel payload
        #[test]
        fn last_payload_wins(
            initial in "\\PC{0,16}",
            payloads in prop::collection::vec(payload(), 0..20),
        ) {
            let mut page = PageUpdater::new(Memory(initial.clone()), Noop, Noop);
            for p in &payloads {
                page.handle_payload(p).unwrap();
            }

            let expected = payloads
                .iter()
                .rev()
                .find(|p| p.as_str() != SENTINEL)
                .cloned()
                .unwrap_or(initial);
            prop_assert_eq!(page.container().content(), expected);

            let stats = page.stats();
            prop_assert_eq!(
                stats.updates_applied + stats.sentinels_skipped,
                payloads.len() as u64
            );
            prop_assert_eq!(stats.typeset_runs, stats.updates_applied);
        }
    }
}
