// Data processing pipeline: record normalization

pub mod processing;

pub use processing::normalize;
