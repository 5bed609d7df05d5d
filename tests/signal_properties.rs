//! Property tests for signal and chunking invariants.
//!
//! 1. Short histories never produce averages or events
//! 2. At most one event per average, and crosses respect their preconditions
//! 3. Touch band edges hold across magnitudes
//! 4. Chunking keeps every chunk under the cap and preserves line order

use proptest::prelude::*;
use tickwatch_core::indicators::AveragePeriod;
use tickwatch_core::report::MIN_CHUNK_CHARS;
use tickwatch_core::signal::is_touch;
use tickwatch_core::{classify, EventKind, MovingAverageSnapshot, ReportAssembler, SignalMode};

// ── Strategies ───────────────────────────────────────────────────────

fn arb_close() -> impl Strategy<Value = f64> {
    (50.0..150.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_mode() -> impl Strategy<Value = SignalMode> {
    prop_oneof![Just(SignalMode::Independent), Just(SignalMode::Exclusive)]
}

fn arb_lines() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z0-9 |.%台積電🔺⬆️]{1,160}", 0..40)
}

const HEADER: &str = "📊 Watchlist 2024-01-03 10:00 (Taipei)";

// ── 1. Short histories ───────────────────────────────────────────────

proptest! {
    #[test]
    fn fewer_closes_than_the_short_window_yield_nothing(
        closes in prop::collection::vec(arb_close(), 0..10),
        price in arb_close(),
        prev in arb_close(),
        mode in arb_mode(),
    ) {
        let snapshot = MovingAverageSnapshot::from_closes(&closes);
        prop_assert_eq!(snapshot, MovingAverageSnapshot::default());

        let events = classify(Some(price), Some(prev), &snapshot, 0.005, mode);
        prop_assert!(events.is_empty());
    }
}

// ── 2. Event consistency ─────────────────────────────────────────────

proptest! {
    #[test]
    fn each_average_reports_at_most_one_consistent_event(
        closes in prop::collection::vec(arb_close(), 21..60),
        price in arb_close(),
        prev in arb_close(),
        tolerance in 0.001..0.05_f64,
    ) {
        let snapshot = MovingAverageSnapshot::from_closes(&closes);
        let events = classify(Some(price), Some(prev), &snapshot, tolerance, SignalMode::Independent);

        for period in AveragePeriod::ALL {
            let on_period: Vec<_> = events.iter().filter(|e| e.period == period).collect();
            prop_assert!(on_period.len() <= 1);

            let pair = snapshot.get(period);
            let current = pair.current.expect("long series has a current average");
            let prior = pair.prior.expect("long series has a prior average");
            if let Some(event) = on_period.first() {
                match event.kind {
                    EventKind::CrossUp => prop_assert!(prev < prior && price > current),
                    EventKind::CrossDown => prop_assert!(prev > prior && price < current),
                    EventKind::Touch => {
                        prop_assert!(is_touch(price, current, tolerance));
                        prop_assert!(!(prev < prior && price > current));
                        prop_assert!(!(prev > prior && price < current));
                    }
                }
            }
        }
    }

    #[test]
    fn exclusive_mode_keeps_one_of_the_independent_events(
        closes in prop::collection::vec(arb_close(), 21..60),
        price in arb_close(),
        prev in arb_close(),
    ) {
        let snapshot = MovingAverageSnapshot::from_closes(&closes);
        let all = classify(Some(price), Some(prev), &snapshot, 0.01, SignalMode::Independent);
        let one = classify(Some(price), Some(prev), &snapshot, 0.01, SignalMode::Exclusive);

        prop_assert_eq!(one.len(), all.len().min(1));
        if let Some(kept) = one.first() {
            prop_assert!(all.contains(kept));
        }
    }

    #[test]
    fn missing_price_never_signals(
        closes in prop::collection::vec(arb_close(), 21..60),
        prev in arb_close(),
        mode in arb_mode(),
    ) {
        let snapshot = MovingAverageSnapshot::from_closes(&closes);
        prop_assert!(classify(None, Some(prev), &snapshot, 0.005, mode).is_empty());
        prop_assert!(classify(Some(f64::NAN), Some(prev), &snapshot, 0.005, mode).is_empty());
    }
}

// ── 3. Touch band ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn prices_inside_the_band_touch(
        average in 1.0..5000.0_f64,
        tolerance in 0.001..0.05_f64,
        position in -0.999..0.999_f64,
    ) {
        let price = average * (1.0 + tolerance * position);
        prop_assert!(is_touch(price, average, tolerance));
    }

    #[test]
    fn prices_outside_the_band_do_not_touch(
        average in 1.0..5000.0_f64,
        tolerance in 0.001..0.05_f64,
        distance in 1.05..3.0_f64,
        above in any::<bool>(),
    ) {
        let offset = tolerance * distance;
        let price = if above { average * (1.0 + offset) } else { average * (1.0 - offset) };
        prop_assert!(!is_touch(price, average, tolerance));
    }
}

// ── 4. Chunking ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn chunks_respect_cap_and_preserve_lines(
        lines in arb_lines(),
        cap in MIN_CHUNK_CHARS..1000,
    ) {
        let assembler = ReportAssembler::new(cap).expect("cap within range");
        let chunks = assembler.chunk(HEADER.to_owned(), lines.clone());

        prop_assert!(!chunks.is_empty());
        for chunk in &chunks {
            prop_assert_eq!(chunk.header.as_str(), HEADER);
            prop_assert!(chunk.text().starts_with(HEADER));
            prop_assert_eq!(chunk.char_len(), chunk.text().chars().count());
            prop_assert!(chunk.char_len() <= cap);
        }

        let rejoined: Vec<String> = chunks.iter().flat_map(|c| c.lines.iter().cloned()).collect();
        prop_assert_eq!(rejoined, lines);
    }

    #[test]
    fn overlong_lines_are_clipped_but_never_dropped(
        lines in prop::collection::vec("[a-z台積電🔺]{1,600}", 1..12),
        cap in MIN_CHUNK_CHARS..400,
    ) {
        let assembler = ReportAssembler::new(cap).expect("cap within range");
        let chunks = assembler.chunk(HEADER.to_owned(), lines.clone());

        for chunk in &chunks {
            prop_assert!(chunk.char_len() <= cap);
        }
        let rejoined: Vec<String> = chunks.iter().flat_map(|c| c.lines.iter().cloned()).collect();
        prop_assert_eq!(rejoined.len(), lines.len());
        for (shown, original) in rejoined.iter().zip(&lines) {
            match shown.strip_suffix('…') {
                Some(kept) if shown != original => prop_assert!(original.starts_with(kept)),
                _ => prop_assert_eq!(shown, original),
            }
        }
    }

    #[test]
    fn chunking_is_minimal_for_adjacent_chunks(
        lines in arb_lines(),
        cap in MIN_CHUNK_CHARS..1000,
    ) {
        let assembler = ReportAssembler::new(cap).expect("cap within range");
        let chunks = assembler.chunk(HEADER.to_owned(), lines);

        // The next chunk's first line would not have fitted in the previous one.
        for pair in chunks.windows(2) {
            let next_line = &pair[1].lines[0];
            prop_assert!(pair[0].char_len() + next_line.chars().count() + 1 > cap);
        }
    }
}

#[test]
fn empty_watchlist_summary_is_one_header_only_chunk() {
    let assembler = ReportAssembler::default();
    let chunks = assembler.chunk(HEADER.to_owned(), Vec::new());
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].lines.is_empty());
    assert_eq!(chunks[0].text(), HEADER);
}
