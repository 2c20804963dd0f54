pub mod cycle;
pub mod indicator_engine;
pub mod monitor;

pub use cycle::{Evaluation, SignalEngine};
pub use indicator_engine::{ChartFrame, IndicatorEngine, IndicatorSnapshot};
pub use monitor::{fetch_inputs, run_cycle, CycleReport};
