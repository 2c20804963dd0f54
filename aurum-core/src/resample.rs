//! Resampler: aggregates a fine-grained series into fixed-width buckets.
//!
//! Buckets are aligned on the wall clock of an alignment timezone: 4-hour
//! buckets start at 00:00, 04:00, 08:00 ... local time, and follow daylight
//! saving changes. A bucket that spans a transition covers three or five real
//! hours. The default alignment zone is UTC; market configs use the
//! exchange's zone (America/New_York for COMEX).
//!
//! Each non-empty bucket yields one bar: first open, max high, min low, last
//! close, summed volume, stamped with the bucket start in UTC. Empty buckets
//! are dropped.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::domain::{Bar, Series};
use crate::error::SignalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resampler {
    width: Duration,
    timezone: Tz,
}

impl Resampler {
    /// Width must be strictly positive. Buckets align on UTC until
    /// [`with_timezone`](Self::with_timezone) says otherwise.
    pub fn new(width: Duration) -> Result<Self, SignalError> {
        if width <= Duration::zero() {
            return Err(SignalError::config(format!(
                "bucket width must be positive, got {width}"
            )));
        }
        Ok(Self {
            width,
            timezone: Tz::UTC,
        })
    }

    pub fn hours(hours: u32) -> Result<Self, SignalError> {
        Self::new(Duration::hours(i64::from(hours)))
    }

    /// Align buckets on the wall clock of `timezone`.
    pub fn with_timezone(self, timezone: Tz) -> Self {
        Self { timezone, ..self }
    }

    pub fn width(&self) -> Duration {
        self.width
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Start of the bucket containing `ts`.
    ///
    /// The boundary is found on the local wall clock. An ambiguous local
    /// boundary (clocks set back) resolves to its earlier instant; a boundary
    /// that falls into a skipped hour (clocks set forward) is measured back
    /// from `ts` in elapsed wall-clock time.
    pub fn bucket_start(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let width_ms = self.width.num_milliseconds().max(1);
        let local: NaiveDateTime = ts.with_timezone(&self.timezone).naive_local();
        let local_ms = local.and_utc().timestamp_millis();
        let offset = Duration::milliseconds(local_ms.rem_euclid(width_ms));

        self.timezone
            .from_local_datetime(&(local - offset))
            .earliest()
            .map(|start| start.with_timezone(&Utc))
            .unwrap_or(ts - offset)
    }

    /// Aggregate `series` into buckets. An empty input yields an empty series;
    /// callers treat that as "no data available".
    pub fn resample(&self, series: &Series) -> Series {
        let mut out: Vec<Bar> = Vec::new();

        for bar in series.bars() {
            let start = self.bucket_start(bar.timestamp);
            match out.last_mut() {
                // Repeated wall-clock hours can map a later bar to an earlier
                // boundary; it stays in the open bucket so output is ordered.
                Some(current) if start <= current.timestamp => {
                    current.high = current.high.max(bar.high);
                    current.low = current.low.min(bar.low);
                    current.close = bar.close;
                    current.volume += bar.volume;
                }
                _ => out.push(Bar {
                    timestamp: start,
                    ..*bar
                }),
            }
        }

        tracing::trace!(
            input = series.len(),
            output = out.len(),
            width_mins = self.width.num_minutes(),
            timezone = %self.timezone,
            "resampled series"
        );
        Series::from_ordered(out)
    }
}
