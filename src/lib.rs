pub mod analysis;
pub mod cache;
pub mod dataset;
pub mod groups;
pub mod output;
pub mod render;
