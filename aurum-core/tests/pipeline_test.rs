//! End-to-end tests of the evaluation cycle through the public API.

use aurum_core::config::Config;
use aurum_core::domain::{Bar, Series};
use aurum_core::engine::{IndicatorEngine, SignalEngine};
use aurum_core::indicators::Smoothing;
use aurum_core::resample::Resampler;
use aurum_core::signal::{
    Action, CrossoverBook, CrossoverDetector, CrossoverInput, CrossoverKind, ExhaustionState,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

// ── Helpers ──────────────────────────────────────────────────────────

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap()
}

fn hourly(closes: &[f64]) -> Series {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base() + Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 500.0,
            }
        })
        .collect();
    Series::new(bars).unwrap()
}

/// Flat daily bars with a constant true range of `range`.
fn daily(n: usize, range: f64) -> Series {
    let bars = (0..n)
        .map(|i| Bar {
            timestamp: base() - Duration::days((n - i) as i64),
            open: 2000.0,
            high: 2000.0 + range / 2.0,
            low: 2000.0 - range / 2.0,
            close: 2000.0,
            volume: 10_000.0,
        })
        .collect();
    Series::new(bars).unwrap()
}

fn linear_rise() -> Vec<f64> {
    (0..20).map(|i| 100.0 + 20.0 * i as f64 / 19.0).collect()
}

fn hourly_engine() -> SignalEngine {
    let mut config = Config::default();
    config.market.bucket_hours = 1;
    SignalEngine::from_config(&config).unwrap()
}

// ── Scenarios ────────────────────────────────────────────────────────

#[test]
fn linear_rise_is_a_buy() {
    let mut book = CrossoverBook::new();
    let eval = hourly_engine()
        .evaluate("GC=F", &hourly(&linear_rise()), &daily(30, 60.0), &mut book)
        .unwrap();

    let snap = eval.snapshot;
    assert!(snap.fast_ema > snap.slow_ema);
    assert_eq!(snap.last_close, 120.0);
    assert!((snap.adr.unwrap() - 60.0).abs() < 1e-9);

    let c = eval.classification;
    assert!(c.ema_distance_pct >= 0.10);
    assert!(c.ema_slope_pct >= 0.03);
    // range 99..121 over an ADR of 60
    assert!((c.adr_consumption.unwrap() - 22.0 / 60.0).abs() < 1e-9);
    assert_eq!(c.exhaustion, Some(ExhaustionState::Optimal));
    assert_eq!(c.action, Action::Buy);
}

#[test]
fn linear_fall_is_a_sell() {
    let falling: Vec<f64> = linear_rise().into_iter().rev().collect();
    let mut book = CrossoverBook::new();
    let eval = hourly_engine()
        .evaluate("SI=F", &hourly(&falling), &daily(30, 60.0), &mut book)
        .unwrap();
    assert!(eval.snapshot.fast_ema < eval.snapshot.slow_ema);
    assert_eq!(eval.classification.action, Action::Sell);
}

#[test]
fn exhausted_range_blocks_the_buy() {
    let mut book = CrossoverBook::new();
    let eval = hourly_engine()
        .evaluate("GC=F", &hourly(&linear_rise()), &daily(30, 20.0), &mut book)
        .unwrap();
    // 22 / 20 = 1.1 of the ADR already used
    assert_eq!(eval.classification.exhaustion, Some(ExhaustionState::Exhausted));
    assert_eq!(eval.classification.action, Action::Wait);
}

#[test]
fn four_hour_buckets_align_on_utc_by_default() {
    let resampler = Resampler::hours(4).unwrap();
    let resampled = resampler.resample(&hourly(&linear_rise()));

    // 20 hourly bars from midnight fill five H4 buckets.
    assert_eq!(resampled.len(), 5);
    for (i, bar) in resampled.bars().iter().enumerate() {
        assert_eq!(bar.timestamp, base() + Duration::hours(4 * i as i64));
        assert_eq!(bar.volume, 2000.0);
    }
    assert_eq!(resampled.last().unwrap().close, 120.0);
}

#[test]
fn configured_engine_aligns_buckets_on_new_york_midnight() {
    let engine = SignalEngine::from_config(&Config::default()).unwrap();
    assert_eq!(engine.resampler().timezone(), chrono_tz::America::New_York);

    // 2024-03-04 00:00 UTC is 19:00 EST the evening before, inside the
    // 16:00 EST bucket; the rest start at 20:00, 00:00, 04:00, 08:00, 12:00.
    let resampled = engine.resampler().resample(&hourly(&linear_rise()));
    let starts: Vec<DateTime<Utc>> = resampled.bars().iter().map(|b| b.timestamp).collect();
    let expected: Vec<DateTime<Utc>> = [-3, 1, 5, 9, 13, 17]
        .iter()
        .map(|h| base() + Duration::hours(*h))
        .collect();
    assert_eq!(starts, expected);
    assert_eq!(resampled.first().unwrap().volume, 500.0);
    assert_eq!(resampled.total_volume(), 20.0 * 500.0);
}

#[test]
fn empty_series_resamples_to_empty_and_is_unavailable() {
    let resampler = Resampler::hours(4).unwrap();
    assert!(resampler.resample(&Series::empty()).is_empty());

    let engine = IndicatorEngine::new(5, 15, 14, Smoothing::Recursive).unwrap();
    assert!(engine.chart(&Series::empty()).unwrap_err().is_data_unavailable());

    let mut book = CrossoverBook::new();
    let err = SignalEngine::from_config(&Config::default())
        .unwrap()
        .evaluate("GC=F", &Series::empty(), &daily(30, 60.0), &mut book)
        .unwrap_err();
    assert!(err.is_data_unavailable());
    assert!(!book.has_prior("GC=F"));
}

#[test]
fn short_daily_series_means_wait_without_exhaustion() {
    let mut book = CrossoverBook::new();
    let eval = hourly_engine()
        .evaluate("GC=F", &hourly(&linear_rise()), &daily(1, 60.0), &mut book)
        .unwrap();
    assert_eq!(eval.snapshot.adr, None);
    assert_eq!(eval.classification.action, Action::Wait);
    assert_eq!(eval.classification.exhaustion, None);
    assert!(book.has_prior("GC=F"));
}

#[test]
fn cross_is_reported_once_then_no_cross() {
    let detector = CrossoverDetector::new(5, 15);
    let mut book = CrossoverBook::new();
    let at = |fast: f64, slow: f64| CrossoverInput {
        fast_ema: fast,
        slow_ema: slow,
        price: 2050.0,
        timestamp: base(),
    };

    assert!(detector.detect(&mut book, "GC=F", at(1.0, 2.0)).is_none());
    let first = detector.detect(&mut book, "GC=F", at(3.0, 2.0)).unwrap();
    assert_eq!(first.kind, CrossoverKind::Upward);
    let second = detector.detect(&mut book, "GC=F", at(3.0, 2.0)).unwrap();
    assert_eq!(second.kind, CrossoverKind::NoCross);
}

#[test]
fn symbols_keep_separate_crossover_memory() {
    let engine = hourly_engine();
    let mut book = CrossoverBook::new();
    let rise = hourly(&linear_rise());
    let fall: Vec<f64> = linear_rise().into_iter().rev().collect();
    let fall = hourly(&fall);
    let d = daily(30, 60.0);

    engine.evaluate("GC=F", &fall, &d, &mut book).unwrap();
    engine.evaluate("SI=F", &rise, &d, &mut book).unwrap();

    let gold = engine.evaluate("GC=F", &rise, &d, &mut book).unwrap();
    let silver = engine.evaluate("SI=F", &rise, &d, &mut book).unwrap();
    assert_eq!(gold.crossover.unwrap().kind, CrossoverKind::Upward);
    assert_eq!(silver.crossover.unwrap().kind, CrossoverKind::NoCross);
    assert_eq!(book.len(), 2);
}

#[test]
fn evaluation_serializes_to_json() {
    let mut book = CrossoverBook::new();
    let eval = hourly_engine()
        .evaluate("GC=F", &hourly(&linear_rise()), &daily(30, 60.0), &mut book)
        .unwrap();
    let json = aurum_core::export::evaluation_json(&eval).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["symbol"], "GC=F");
    assert_eq!(value["classification"]["action"], "buy");
    assert!(value["crossover"].is_null());
}
