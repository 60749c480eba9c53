//! Pipeline entry points.
//!
//! - `run_rates`: Build and save the exchange-rate table
//! - `run_normalize`: Normalize the corpus into year (and region) shards
//! - `run_statistics`: Aggregate shards into a statistics report
//! - `run_pipeline`: All three in sequence
//! - `run_validate`: Check configuration

pub mod normalize;
#[allow(clippy::module_inception)]
pub mod pipeline;
pub mod rates;
pub mod statistics;
pub mod validate;

pub use normalize::{normalize_records, run_normalize};
pub use pipeline::run_pipeline;
pub use rates::{build_rates, run_rates};
pub use statistics::run_statistics;
pub use validate::run_validate;
