//! # tapelease-tape
//!
//! A small recorded expression tape: the expression `y = f(x)` is recorded
//! once, then replayed at many points to get values and derivatives.
//! Replaying writes into the tape's own Taylor buffer, so a tape is used by
//! one thread at a time; share copies of it through a
//! [`ResourcePool`](tapelease_core::ResourcePool).
#![warn(missing_docs)]

pub mod tape;

pub use tape::{Node, Tape, TapeBuilder, TapeError};
