//! Exit code standardization for resource-stopper
//!
//! The invoking scheduler only sees the process exit status, so the codes are
//! kept stable.
//!
//! ## Exit Code Convention
//!
//! - `0` = Success, every configured kind ran to completion
//! - `1` = Partial failure, at least one kind failed and the others ran
//! - `2` = System error (AWS API failure, I/O)
//! - `3` = Configuration error (bad config, unknown kind, unresolved identity)

use crate::error::StopperError;

/// Standard exit codes for resource-stopper
pub mod codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// One or more kinds failed
    pub const PARTIAL_FAILURE: i32 = 1;
    /// System error (AWS API failure, network error)
    pub const SYSTEM_ERROR: i32 = 2;
    /// Configuration error (missing config, invalid credentials)
    pub const CONFIG_ERROR: i32 = 3;
}

/// Map a StopperError to an appropriate exit code
pub fn exit_code_for_error(error: &StopperError) -> i32 {
    use StopperError::*;
    match error {
        Config(_) | Identity(_) => codes::CONFIG_ERROR,
        Aws { .. } | Io(_) | Json(_) => codes::SYSTEM_ERROR,
    }
}

/// Map an error surfaced through `anyhow` at the CLI boundary
pub fn exit_code_for_anyhow(error: &anyhow::Error) -> i32 {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<StopperError>())
        .map(exit_code_for_error)
        .unwrap_or(codes::SYSTEM_ERROR)
}
