//! Market data boundary: providers, CSV import and the provider circuit breaker.

pub mod circuit_breaker;
pub mod csv_io;
pub mod provider;
pub mod yahoo;

pub use circuit_breaker::CircuitBreaker;
pub use csv_io::{read_bars_csv, read_bars_csv_path, CsvProvider};
pub use provider::{BarInterval, DataError, DataProvider};
pub use yahoo::YahooProvider;
