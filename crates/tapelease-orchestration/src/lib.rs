//! # tapelease-orchestration
//!
//! Parallel evaluation through a resource pool and result analysis.

#![warn(missing_docs)]

pub mod orchestrator;

pub use orchestrator::{
    analyze_agreement, par_evaluate, serial_evaluate, slot_usage, Evaluation, OrchestrationError,
};
