//! Error handling and exit codes.

use cartoon_core::constants::exit_codes;
use cartoon_core::error::CartoonError;

/// Map a pool error to its exit code.
pub fn handle_error(err: &CartoonError) -> i32 {
    match err {
        CartoonError::Alloc(_) | CartoonError::Timer(_) | CartoonError::Startup { .. } => {
            exit_codes::ERROR_GENERIC
        }
        CartoonError::Config(_) => exit_codes::ERROR_CONFIG,
        CartoonError::Cancelled => exit_codes::ERROR_CANCELED,
        CartoonError::Timeout(_) => exit_codes::ERROR_TIMEOUT,
    }
}

/// Exit code for an error that reached `main`.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<CartoonError>()
        .map_or(exit_codes::ERROR_GENERIC, handle_error)
}
