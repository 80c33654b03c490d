use chrono::{DateTime, Duration, TimeZone, Utc};

use openrange::{
    AnalysisError, Bar, Direction, LevelConfig, LevelKey, LevelScanner, Levels, ReactionAnalyzer,
    ReactionConfig, ScanState, Side, TouchOutcome, analyze_reactions,
};

fn at(day: u32, slot: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 9, 30, 0)
        .single()
        .expect("valid dt")
        + Duration::minutes(5 * slot)
}

fn bar(day: u32, slot: i64, open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar::new(at(day, slot), open, high, low, close)
}

fn levels() -> Levels {
    Levels::compute(105.0, 95.0, &LevelConfig::default()).expect("valid range")
}

fn opening(day: u32) -> Bar {
    bar(day, 0, 100.0, 105.0, 95.0, 100.0)
}

#[test]
fn single_touch_and_retreat_counts_one_bounce() {
    let bars = vec![
        opening(2),
        bar(2, 1, 100.0, 110.0, 99.0, 109.0),
        bar(2, 2, 109.0, 115.0, 108.0, 112.0),
        bar(2, 3, 112.0, 113.0, 105.0, 106.0),
    ];

    let stats = analyze_reactions(&bars, "UTC", &levels(), &ReactionConfig::default())
        .expect("valid tz");

    let a1 = stats.get(LevelKey::A1);
    assert_eq!(a1.touches, 1);
    assert_eq!(a1.bounces, 1);
    assert_eq!(a1.breaks, 0);
    assert!((a1.bounce_rate() - 1.0).abs() < 1e-9);
    assert_eq!(stats.total_touches(), 1, "only A1 was reached");
}

#[test]
fn close_beyond_support_counts_one_break() {
    let bars = vec![
        opening(2),
        bar(2, 1, 96.0, 97.0, 88.0, 90.0),
        bar(2, 2, 90.0, 91.0, 85.0, 86.0),
        bar(2, 3, 86.0, 86.0, 80.0, 81.0),
        bar(2, 4, 81.0, 82.0, 78.0, 79.0),
    ];

    let report = ReactionAnalyzer::new(ReactionConfig::default()).analyze_sessions(
        &bars,
        &openrange::segment_days(&bars, openrange::parse_timezone("UTC").expect("tz")),
        &levels(),
    );

    let b1 = report.stats.get(LevelKey::B1);
    assert_eq!(b1.touches, 1);
    assert_eq!(b1.breaks, 1);
    assert_eq!(b1.bounces, 0);

    let event = &report.events[0];
    assert_eq!(event.level, LevelKey::B1);
    assert_eq!(event.index, 2);
    assert_eq!(event.approach, Direction::Down);
    assert_eq!(event.outcome, TouchOutcome::Break);
    assert_eq!(event.resolved_index, Some(3));
}

#[test]
fn lingering_in_the_band_is_one_touch_until_price_leaves() {
    let bars = vec![
        opening(2),
        bar(2, 1, 100.0, 118.0, 100.0, 117.0),
        bar(2, 2, 117.0, 124.0, 116.0, 123.0),
        bar(2, 3, 123.0, 125.5, 122.0, 124.5),
        bar(2, 4, 124.5, 125.2, 124.2, 124.9),
        bar(2, 5, 124.9, 125.3, 124.5, 125.0),
        bar(2, 6, 125.0, 125.4, 124.6, 124.8),
        bar(2, 7, 124.8, 124.8, 120.0, 121.0),
    ];
    let stats = ReactionAnalyzer::default()
        .analyze(&bars, "UTC", &levels())
        .expect("valid tz");
    let a2 = stats.get(LevelKey::A2);
    assert_eq!(a2.touches, 1, "bars 4..6 stay in the band");
    assert_eq!(a2.bounces, 1);

    let mut extended = bars.clone();
    extended.push(bar(2, 8, 121.0, 125.1, 121.0, 124.0));
    extended.push(bar(2, 9, 124.0, 124.5, 119.0, 120.0));
    let stats = ReactionAnalyzer::default()
        .analyze(&extended, "UTC", &levels())
        .expect("valid tz");
    let a2 = stats.get(LevelKey::A2);
    assert_eq!(a2.touches, 2, "leaving the band re-arms the level");
    assert_eq!(a2.bounces, 2);
}

#[test]
fn bar_spanning_the_band_is_classified_by_its_close() {
    let through = vec![
        opening(2),
        bar(2, 1, 100.0, 110.0, 99.0, 109.0),
        bar(2, 2, 109.0, 118.0, 108.0, 117.0),
    ];
    let stats = ReactionAnalyzer::default()
        .analyze(&through, "UTC", &levels())
        .expect("valid tz");
    assert_eq!(stats.get(LevelKey::A1).breaks, 1);

    let rejected = vec![
        opening(2),
        bar(2, 1, 100.0, 110.0, 99.0, 109.0),
        bar(2, 2, 109.0, 118.0, 108.0, 110.0),
    ];
    let stats = ReactionAnalyzer::default()
        .analyze(&rejected, "UTC", &levels())
        .expect("valid tz");
    assert_eq!(stats.get(LevelKey::A1).bounces, 1);
}

#[test]
fn touch_without_decisive_close_turns_unresolved_after_lookahead() {
    let config = ReactionConfig {
        lookahead: 2,
        ..ReactionConfig::default()
    };
    let bars = vec![
        opening(2),
        bar(2, 1, 100.0, 110.0, 99.0, 109.0),
        bar(2, 2, 109.0, 115.0, 108.0, 112.0),
        bar(2, 3, 112.0, 115.03, 114.96, 115.0),
        bar(2, 4, 115.0, 115.05, 114.95, 115.01),
    ];
    let stats = analyze_reactions(&bars, "UTC", &levels(), &config).expect("valid tz");

    let a1 = stats.get(LevelKey::A1);
    assert_eq!(a1.touches, 1);
    assert_eq!(a1.bounces, 0);
    assert_eq!(a1.breaks, 0);
    assert_eq!(a1.unresolved(), 1);
    assert_eq!(a1.bounce_rate(), 0.0);
}

#[test]
fn pending_touch_does_not_resolve_in_the_next_session() {
    let bars = vec![
        opening(2),
        bar(2, 1, 100.0, 110.0, 99.0, 109.0),
        bar(2, 2, 109.0, 115.0, 108.0, 112.0),
        bar(3, 0, 100.0, 104.0, 96.0, 100.0),
    ];
    let report = ReactionAnalyzer::default().analyze_sessions(
        &bars,
        &openrange::segment_days(&bars, openrange::parse_timezone("UTC").expect("tz")),
        &levels(),
    );

    let a1 = report.stats.get(LevelKey::A1);
    assert_eq!(a1.touches, 1);
    assert_eq!(a1.unresolved(), 1);
    assert_eq!(report.events[0].resolved_index, None);
}

#[test]
fn scanner_walks_through_its_states() {
    let config = ReactionConfig::default();
    let mut scanner = LevelScanner::new(LevelKey::A1, 115.0, &config);
    assert_eq!(scanner.state(), ScanState::Unanchored);

    scanner.step(0, &bar(2, 0, 100.0, 110.0, 99.0, 109.0));
    assert_eq!(scanner.state(), ScanState::Away(Side::Below));

    scanner.step(1, &bar(2, 1, 109.0, 115.0, 108.0, 114.99));
    assert_eq!(
        scanner.state(),
        ScanState::Touching {
            approach: Direction::Up,
            elapsed: 0
        }
    );

    scanner.step(2, &bar(2, 2, 115.0, 117.0, 114.99, 116.5));
    assert_eq!(scanner.state(), ScanState::Resolved(TouchOutcome::Break));

    scanner.step(3, &bar(2, 3, 116.5, 118.0, 116.0, 117.5));
    assert_eq!(scanner.state(), ScanState::Away(Side::Above));

    let events = scanner.finish();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, TouchOutcome::Break);
}

#[test]
fn bars_near_a_level_before_any_anchor_are_not_touches() {
    let bars = vec![bar(2, 0, 114.0, 115.5, 113.0, 115.0), bar(2, 1, 115.0, 115.2, 111.0, 112.0)];
    let stats = ReactionAnalyzer::default()
        .analyze(&bars, "UTC", &levels())
        .expect("valid tz");
    assert_eq!(stats.get(LevelKey::A1).touches, 0);
}

#[test]
fn empty_bars_yield_all_eight_zero_rows() {
    let stats = ReactionAnalyzer::default()
        .analyze(&[], "UTC", &levels())
        .expect("valid tz");

    assert_eq!(stats.rows().len(), 8);
    for (row, key) in stats.rows().iter().zip(LevelKey::ALL) {
        assert_eq!(row.key, key);
        assert_eq!(row.touches, 0);
        assert_eq!(row.bounce_rate(), 0.0);
    }
}

#[test]
fn unknown_timezone_is_rejected() {
    let result = ReactionAnalyzer::default().analyze(&[opening(2)], "Mars/Olympus", &levels());
    assert_eq!(
        result,
        Err(AnalysisError::InvalidTimezone("Mars/Olympus".to_string()))
    );
}
