//! One evaluation cycle for one symbol: resample, indicators, classify, detect.

use serde::Serialize;

use super::indicator_engine::{ChartFrame, IndicatorEngine, IndicatorSnapshot};
use crate::config::Config;
use crate::domain::Series;
use crate::error::SignalError;
use crate::resample::Resampler;
use crate::signal::{
    Classification, CrossoverBook, CrossoverDetector, CrossoverEvent, CrossoverInput,
    SignalClassifier,
};

/// Everything a cycle produced for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub symbol: String,
    pub chart: ChartFrame,
    pub snapshot: IndicatorSnapshot,
    pub classification: Classification,
    /// `None` on the first observation of the symbol.
    pub crossover: Option<CrossoverEvent>,
}

#[derive(Debug, Clone)]
pub struct SignalEngine {
    resampler: Resampler,
    indicators: IndicatorEngine,
    classifier: SignalClassifier,
    detector: CrossoverDetector,
}

impl SignalEngine {
    pub fn new(
        resampler: Resampler,
        indicators: IndicatorEngine,
        classifier: SignalClassifier,
    ) -> Self {
        let detector = CrossoverDetector::new(indicators.fast_span(), indicators.slow_span());
        Self {
            resampler,
            indicators,
            classifier,
            detector,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, SignalError> {
        config.validate()?;
        Ok(Self::new(
            Resampler::hours(config.market.bucket_hours)?.with_timezone(config.market.timezone),
            IndicatorEngine::from_config(&config.indicators)?,
            SignalClassifier::new(config.thresholds, config.exhaustion)?,
        ))
    }

    pub fn resampler(&self) -> &Resampler {
        &self.resampler
    }

    pub fn indicators(&self) -> &IndicatorEngine {
        &self.indicators
    }

    pub fn classifier(&self) -> &SignalClassifier {
        &self.classifier
    }

    /// Evaluate `symbol` from raw intraday bars and daily bars.
    ///
    /// Fails with `DataUnavailable` when the intraday series is empty; the
    /// book is left untouched in that case. An unusable daily series only
    /// removes the ADR: the classifier then answers Wait without an
    /// exhaustion state, and crossover detection still runs.
    pub fn evaluate(
        &self,
        symbol: &str,
        intraday: &Series,
        daily: &Series,
        book: &mut CrossoverBook,
    ) -> Result<Evaluation, SignalError> {
        let resampled = self.resampler.resample(intraday);
        let chart = self.indicators.chart(&resampled)?;

        let adr = match self.indicators.adr(daily) {
            Ok(adr) => Some(adr),
            Err(err) => {
                tracing::warn!(symbol, error = %err, "ADR unavailable, classifying without it");
                None
            }
        };

        let snapshot = self.indicators.snapshot(&chart, adr)?;
        let classification = self.classifier.classify(&snapshot);
        let crossover = self.detector.detect(
            book,
            symbol,
            CrossoverInput {
                fast_ema: snapshot.fast_ema,
                slow_ema: snapshot.slow_ema,
                price: snapshot.last_close,
                timestamp: snapshot.timestamp,
            },
        );

        tracing::debug!(
            symbol,
            bars = chart.len(),
            action = %classification.action,
            distance_pct = classification.ema_distance_pct,
            slope_pct = classification.ema_slope_pct,
            "evaluated"
        );

        Ok(Evaluation {
            symbol: symbol.to_string(),
            chart,
            snapshot,
            classification,
            crossover,
        })
    }
}
