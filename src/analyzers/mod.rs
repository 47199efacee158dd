pub mod coupling;
pub mod metrics;
