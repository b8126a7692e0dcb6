//! Aggregation over the loaded dataset.
//!
//! Everything here is a pure function of the dataset and the user's
//! selection; nothing mutates shared state.

pub mod season;
pub mod trend;
pub mod util;
