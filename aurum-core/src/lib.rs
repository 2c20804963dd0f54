//! Aurum Core: trend signal for precious-metals futures.
//!
//! This crate holds the signal pipeline and its collaborators:
//! - Domain types (bars, validated series)
//! - Resampling of intraday bars into H4 buckets aligned on exchange local time
//! - EMA and ADR indicators
//! - Signal classifier (Buy/Sell/Wait plus ADR exhaustion)
//! - Crossover detection against a caller-owned memory
//! - Data providers (Yahoo chart API, CSV), config, export, alerts and a risk toolkit
//! - Monitor cycles over the configured instruments and a macro-context snapshot
//!
//! The pipeline itself does no I/O: providers fetch bars at the boundary and
//! a cycle is a pure function of its inputs plus the crossover book.

pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod export;
pub mod indicators;
pub mod macro_context;
pub mod notify;
pub mod resample;
pub mod risk;
pub mod signal;

pub use error::SignalError;
