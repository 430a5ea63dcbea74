//! tapelease library — application logic for the grid evaluator.

pub mod app;
pub mod config;
pub mod errors;
