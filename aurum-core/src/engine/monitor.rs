//! Monitor cycle: fetch and evaluate every configured instrument once.
//!
//! The caller owns the `CrossoverBook` and decides what a blocked provider
//! means: a one-shot run gives up, a watch loop waits for the next tick with
//! its book intact.

use super::cycle::{Evaluation, SignalEngine};
use crate::config::Config;
use crate::data::{BarInterval, DataError, DataProvider};
use crate::domain::Series;
use crate::signal::CrossoverBook;

/// What one pass over the instruments produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub evaluations: Vec<Evaluation>,
    /// Symbols with no result this cycle (missing data, too few bars).
    pub skipped: Vec<String>,
    /// The provider refused requests (circuit breaker open); the remaining
    /// instruments were not attempted.
    pub provider_blocked: bool,
}

impl CycleReport {
    fn blocked() -> Self {
        Self {
            provider_blocked: true,
            ..Self::default()
        }
    }
}

/// Intraday and daily series for `symbol` over the configured windows.
pub fn fetch_inputs(
    provider: &dyn DataProvider,
    config: &Config,
    symbol: &str,
) -> Result<(Series, Series), DataError> {
    let intraday = provider.fetch_trailing(
        symbol,
        config.market.intraday_interval,
        config.market.intraday_lookback_days,
    )?;
    let daily = provider.fetch_trailing(
        symbol,
        BarInterval::OneDay,
        config.market.daily_lookback_days,
    )?;
    Ok((intraday, daily))
}

/// One pass over `config.instruments`.
///
/// A symbol whose data cannot be fetched or evaluated is logged and skipped;
/// its crossover memory is left as it was. A tripped circuit breaker ends the
/// pass early with `provider_blocked` set.
pub fn run_cycle(
    engine: &SignalEngine,
    provider: &dyn DataProvider,
    config: &Config,
    book: &mut CrossoverBook,
) -> CycleReport {
    if !provider.is_available() {
        tracing::warn!(provider = provider.name(), "provider unavailable, skipping cycle");
        return CycleReport::blocked();
    }

    let mut report = CycleReport::default();
    for instrument in config.instruments.iter() {
        let symbol = instrument.symbol.as_str();
        let (intraday, daily) = match fetch_inputs(provider, config, symbol) {
            Ok(inputs) => inputs,
            Err(DataError::CircuitBreakerTripped) => {
                tracing::warn!(
                    provider = provider.name(),
                    symbol,
                    "circuit breaker tripped, abandoning cycle"
                );
                report.provider_blocked = true;
                break;
            }
            Err(err) => {
                tracing::warn!(symbol, error = %err, "no data this cycle");
                report.skipped.push(symbol.to_string());
                continue;
            }
        };

        match engine.evaluate(symbol, &intraday, &daily, book) {
            Ok(evaluation) => report.evaluations.push(evaluation),
            Err(err) => {
                tracing::warn!(symbol, error = %err, "skipped evaluation");
                report.skipped.push(symbol.to_string());
            }
        }
    }

    tracing::debug!(
        evaluated = report.evaluations.len(),
        skipped = report.skipped.len(),
        blocked = report.provider_blocked,
        "cycle finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::make_series;
    use crate::signal::CrossoverKind;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves the same hourly closes for every symbol; can be switched into
    /// a tripped or unavailable state between cycles.
    struct ScriptedProvider {
        closes: Mutex<Vec<f64>>,
        tripped: AtomicBool,
        available: AtomicBool,
        missing: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(closes: Vec<f64>) -> Self {
            Self {
                closes: Mutex::new(closes),
                tripped: AtomicBool::new(false),
                available: AtomicBool::new(true),
                missing: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn set_closes(&self, closes: Vec<f64>) {
            *self.closes.lock().unwrap() = closes;
        }
    }

    impl DataProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn fetch(
            &self,
            symbol: &str,
            interval: BarInterval,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<Series, DataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.tripped.load(Ordering::SeqCst) {
                return Err(DataError::CircuitBreakerTripped);
            }
            if self.missing == Some(symbol) {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }
            Ok(match interval {
                BarInterval::OneDay => make_series(&[100.0, 101.0, 102.0]),
                BarInterval::OneHour => make_series(&self.closes.lock().unwrap()),
            })
        }

        fn is_available(&self) -> bool {
            self.available.load(Ordering::SeqCst)
        }
    }

    fn setup() -> (SignalEngine, Config) {
        let mut config = Config::default();
        config.market.bucket_hours = 1;
        (SignalEngine::from_config(&config).unwrap(), config)
    }

    fn falling() -> Vec<f64> {
        (0..20).map(|i| 120.0 - i as f64).collect()
    }

    fn rising() -> Vec<f64> {
        (0..20).map(|i| 100.0 + i as f64).collect()
    }

    #[test]
    fn evaluates_every_instrument() {
        let (engine, config) = setup();
        let provider = ScriptedProvider::new(falling());
        let mut book = CrossoverBook::new();

        let report = run_cycle(&engine, &provider, &config, &mut book);
        assert!(!report.provider_blocked);
        assert!(report.skipped.is_empty());
        let symbols: Vec<&str> = report.evaluations.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["GC=F", "SI=F"]);
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn tripped_breaker_skips_cycle_and_keeps_book() {
        let (engine, config) = setup();
        let provider = ScriptedProvider::new(falling());
        let mut book = CrossoverBook::new();

        run_cycle(&engine, &provider, &config, &mut book);
        let seeded = book.clone();

        provider.tripped.store(true, Ordering::SeqCst);
        let report = run_cycle(&engine, &provider, &config, &mut book);
        assert!(report.provider_blocked);
        assert!(report.evaluations.is_empty());
        assert_eq!(book, seeded);

        // Next tick: the book still remembers the falling EMAs.
        provider.tripped.store(false, Ordering::SeqCst);
        provider.set_closes(rising());
        let report = run_cycle(&engine, &provider, &config, &mut book);
        assert!(!report.provider_blocked);
        assert_eq!(report.evaluations.len(), 2);
        for evaluation in &report.evaluations {
            let event = evaluation.crossover.as_ref().unwrap();
            assert_eq!(event.kind, CrossoverKind::Upward);
        }
    }

    #[test]
    fn tripped_breaker_stops_remaining_symbols() {
        let (engine, config) = setup();
        let provider = ScriptedProvider::new(falling());
        provider.tripped.store(true, Ordering::SeqCst);
        let mut book = CrossoverBook::new();

        let report = run_cycle(&engine, &provider, &config, &mut book);
        assert!(report.provider_blocked);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unavailable_provider_is_not_queried() {
        let (engine, config) = setup();
        let provider = ScriptedProvider::new(falling());
        provider.available.store(false, Ordering::SeqCst);
        let mut book = CrossoverBook::new();

        let report = run_cycle(&engine, &provider, &config, &mut book);
        assert!(report.provider_blocked);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert!(book.is_empty());
    }

    #[test]
    fn missing_symbol_is_skipped_not_blocking() {
        let (engine, config) = setup();
        let mut provider = ScriptedProvider::new(falling());
        provider.missing = Some("GC=F");
        let mut book = CrossoverBook::new();

        let report = run_cycle(&engine, &provider, &config, &mut book);
        assert!(!report.provider_blocked);
        assert_eq!(report.skipped, vec!["GC=F".to_string()]);
        assert_eq!(report.evaluations.len(), 1);
        assert!(!book.has_prior("GC=F"));
        assert!(book.has_prior("SI=F"));
    }
}
