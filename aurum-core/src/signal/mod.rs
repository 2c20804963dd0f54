//! Signal classification and crossover detection.

pub mod classifier;
pub mod crossover;

pub use classifier::{
    adr_consumption, classify, Action, Classification, ClassifierThresholds, ExhaustionBands,
    ExhaustionState, SignalClassifier,
};
pub use crossover::{
    crossover_kind, CrossoverBook, CrossoverDetector, CrossoverEvent, CrossoverInput,
    CrossoverKind, CrossoverState,
};
