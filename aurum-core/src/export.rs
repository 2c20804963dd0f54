//! Export of evaluation artifacts.
//!
//! - **CSV**: the resampled chart with its EMA columns, for plotting tools
//! - **JSON**: a whole `Evaluation`, a batch of them, or a macro snapshot

use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::engine::{ChartFrame, Evaluation};
use crate::macro_context::MacroQuote;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Write the chart as CSV.
///
/// Columns: timestamp, open, high, low, close, volume, then one column per
/// EMA named after its key (e.g. `ema_5`, `ema_15`).
pub fn write_chart_csv<W: Write>(frame: &ChartFrame, writer: W) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);

    wtr.write_record([
        "timestamp",
        "open",
        "high",
        "low",
        "close",
        "volume",
        frame.fast_key.as_str(),
        frame.slow_key.as_str(),
    ])?;

    let fast = frame.fast_ema();
    let slow = frame.slow_ema();
    for (i, bar) in frame.series.bars().iter().enumerate() {
        let column = |values: &[f64]| {
            values
                .get(i)
                .map(|v| format!("{v:.6}"))
                .unwrap_or_default()
        };
        wtr.write_record([
            bar.timestamp.to_rfc3339(),
            format!("{:.6}", bar.open),
            format!("{:.6}", bar.high),
            format!("{:.6}", bar.low),
            format!("{:.6}", bar.close),
            format!("{:.2}", bar.volume),
            column(fast),
            column(slow),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_chart_csv_path(frame: &ChartFrame, path: &Path) -> Result<(), ExportError> {
    let file = std::fs::File::create(path)?;
    write_chart_csv(frame, std::io::BufWriter::new(file))
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn evaluation_json(evaluation: &Evaluation) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(evaluation)?)
}

pub fn evaluations_json(evaluations: &[Evaluation]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(evaluations)?)
}

pub fn macro_json(quotes: &[MacroQuote]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(quotes)?)
}
