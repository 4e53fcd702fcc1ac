pub mod artifact;
pub mod certification;
pub mod dataset;
pub mod error;
pub mod models;
pub mod predict;
pub mod report;
pub mod train;
pub mod tree;
