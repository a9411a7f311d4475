//! resource-stopper library
//!
//! Stops running AWS resources that are not tagged `KeepRunning=true`. The
//! binary in `main.rs` is a thin CLI over [`runner::run`].

pub mod aws;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod provider;
pub mod runner;
pub mod stopper;

// Re-export commonly used types
pub use provider::{ResourceId, ResourceKind, KEEP_RUNNING_TAG};
pub use stopper::{ResourceStopper, StopReport};
