//! Crossover detector: fast/slow EMA crosses between consecutive cycles.
//!
//! Upward when the previous cycle had fast <= slow and the current has fast > slow.
//! Downward when the previous cycle had fast >= slow and the current has fast < slow.
//!
//! Only the two most recent snapshots are compared, so a cross that reverses
//! entirely between two cycles is not seen. Memory lives in a caller-owned
//! `CrossoverBook`; the first observation of a symbol only seeds it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverKind {
    Upward,
    Downward,
    NoCross,
}

impl fmt::Display for CrossoverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CrossoverKind::Upward => "upward cross",
            CrossoverKind::Downward => "downward cross",
            CrossoverKind::NoCross => "no cross",
        })
    }
}

/// Classify the transition from (prev_fast, prev_slow) to (fast, slow).
pub fn crossover_kind(prev_fast: f64, prev_slow: f64, fast: f64, slow: f64) -> CrossoverKind {
    if prev_fast <= prev_slow && fast > slow {
        CrossoverKind::Upward
    } else if prev_fast >= prev_slow && fast < slow {
        CrossoverKind::Downward
    } else {
        CrossoverKind::NoCross
    }
}

/// Previous cycle's EMA pair for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrossoverState {
    pub prev_fast: f64,
    pub prev_slow: f64,
}

/// Per-symbol crossover memory. A symbol with no entry has no prior data.
///
/// Owned by the caller for the lifetime of the process; serializable so a
/// caller running cycles in separate processes can persist it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrossoverBook {
    states: BTreeMap<Symbol, CrossoverState>,
}

impl CrossoverBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<&CrossoverState> {
        self.states.get(symbol)
    }

    pub fn has_prior(&self, symbol: &str) -> bool {
        self.states.contains_key(symbol)
    }

    /// Forget a symbol; its next observation seeds again.
    pub fn reset(&mut self, symbol: &str) -> Option<CrossoverState> {
        self.states.remove(symbol)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Crossover outcome handed to notification collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossoverEvent {
    pub symbol: Symbol,
    pub kind: CrossoverKind,
    pub price: f64,
    pub fast_ema: f64,
    pub slow_ema: f64,
    pub fast_span: usize,
    pub slow_span: usize,
    pub timestamp: DateTime<Utc>,
}

impl CrossoverEvent {
    pub fn is_cross(&self) -> bool {
        self.kind != CrossoverKind::NoCross
    }
}

/// Current-cycle inputs for one symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossoverInput {
    pub fast_ema: f64,
    pub slow_ema: f64,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossoverDetector {
    fast_span: usize,
    slow_span: usize,
}

impl CrossoverDetector {
    pub fn new(fast_span: usize, slow_span: usize) -> Self {
        Self {
            fast_span,
            slow_span,
        }
    }

    /// Compare against the stored pair, then overwrite it with the current one.
    ///
    /// Returns `None` on the first observation of `symbol` (state is only seeded).
    pub fn detect(
        &self,
        book: &mut CrossoverBook,
        symbol: &str,
        input: CrossoverInput,
    ) -> Option<CrossoverEvent> {
        let current = CrossoverState {
            prev_fast: input.fast_ema,
            prev_slow: input.slow_ema,
        };
        let previous = book.states.insert(symbol.to_string(), current);

        let Some(prev) = previous else {
            tracing::debug!(symbol, "seeded crossover state");
            return None;
        };

        let kind = crossover_kind(prev.prev_fast, prev.prev_slow, input.fast_ema, input.slow_ema);
        if kind != CrossoverKind::NoCross {
            tracing::info!(
                symbol,
                %kind,
                price = input.price,
                fast = input.fast_ema,
                slow = input.slow_ema,
                "EMA crossover"
            );
        }

        Some(CrossoverEvent {
            symbol: symbol.to_string(),
            kind,
            price: input.price,
            fast_ema: input.fast_ema,
            slow_ema: input.slow_ema,
            fast_span: self.fast_span,
            slow_span: self.slow_span,
            timestamp: input.timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn input(fast: f64, slow: f64) -> CrossoverInput {
        CrossoverInput {
            fast_ema: fast,
            slow_ema: slow,
            price: 2000.0,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn first_call_only_seeds() {
        let detector = CrossoverDetector::new(5, 15);
        let mut book = CrossoverBook::new();

        assert!(detector.detect(&mut book, "GC=F", input(3.0, 2.0)).is_none());
        assert!(book.has_prior("GC=F"));
        assert_eq!(
            book.get("GC=F"),
            Some(&CrossoverState {
                prev_fast: 3.0,
                prev_slow: 2.0
            })
        );
    }

    #[test]
    fn upward_cross_fires_once() {
        let detector = CrossoverDetector::new(5, 15);
        let mut book = CrossoverBook::new();

        detector.detect(&mut book, "GC=F", input(1.0, 2.0));
        let event = detector.detect(&mut book, "GC=F", input(3.0, 2.0)).unwrap();
        assert_eq!(event.kind, CrossoverKind::Upward);
        assert_eq!(event.symbol, "GC=F");
        assert_eq!(event.fast_span, 5);
        assert_eq!(event.slow_span, 15);
        assert_eq!(event.price, 2000.0);
        assert!(event.is_cross());

        let again = detector.detect(&mut book, "GC=F", input(3.0, 2.0)).unwrap();
        assert_eq!(again.kind, CrossoverKind::NoCross);
        assert!(!again.is_cross());
    }

    #[test]
    fn downward_cross() {
        let detector = CrossoverDetector::new(5, 15);
        let mut book = CrossoverBook::new();

        detector.detect(&mut book, "SI=F", input(3.0, 2.0));
        let event = detector.detect(&mut book, "SI=F", input(1.0, 2.0)).unwrap();
        assert_eq!(event.kind, CrossoverKind::Downward);
    }

    #[test]
    fn touching_then_separating_counts_as_cross() {
        assert_eq!(crossover_kind(2.0, 2.0, 2.5, 2.0), CrossoverKind::Upward);
        assert_eq!(crossover_kind(2.0, 2.0, 1.5, 2.0), CrossoverKind::Downward);
        assert_eq!(crossover_kind(2.0, 2.0, 2.0, 2.0), CrossoverKind::NoCross);
        assert_eq!(crossover_kind(1.0, 2.0, 1.5, 2.0), CrossoverKind::NoCross);
    }

    #[test]
    fn symbols_are_independent() {
        let detector = CrossoverDetector::new(5, 15);
        let mut book = CrossoverBook::new();

        detector.detect(&mut book, "GC=F", input(1.0, 2.0));
        // First observation of silver must not see gold's state.
        assert!(detector.detect(&mut book, "SI=F", input(3.0, 2.0)).is_none());
        let gold = detector.detect(&mut book, "GC=F", input(3.0, 2.0)).unwrap();
        assert_eq!(gold.kind, CrossoverKind::Upward);
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn reset_forgets_symbol() {
        let detector = CrossoverDetector::new(5, 15);
        let mut book = CrossoverBook::new();
        detector.detect(&mut book, "GC=F", input(1.0, 2.0));
        assert!(book.reset("GC=F").is_some());
        assert!(book.is_empty());
        assert!(detector.detect(&mut book, "GC=F", input(3.0, 2.0)).is_none());
    }

    #[test]
    fn book_serialization_roundtrip() {
        let detector = CrossoverDetector::new(5, 15);
        let mut book = CrossoverBook::new();
        detector.detect(&mut book, "GC=F", input(1.0, 2.0));
        let json = serde_json::to_string(&book).unwrap();
        let restored: CrossoverBook = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, book);
    }
}
