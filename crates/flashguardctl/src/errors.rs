//! Exit status for flashguardctl

use flashguard_common::FlashGuardError;

/// Exit code for success (dispatch authorized, lookup answered)
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for general errors
pub const EXIT_GENERAL_ERROR: i32 = 1;

/// Exit code when a dispatch request was denied by either gate
pub const EXIT_DISPATCH_DENIED: i32 = 2;

/// Exit code for invalid invocations (bad arguments, empty location or plan)
pub const EXIT_INVOCATION_MISUSE: i32 = 64;

/// Map a failed command to its exit code
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<FlashGuardError>() {
        Some(FlashGuardError::InvocationMisuse(_))
        | Some(FlashGuardError::InvalidArguments { .. })
        | Some(FlashGuardError::UnknownOperation(_)) => EXIT_INVOCATION_MISUSE,
        _ => EXIT_GENERAL_ERROR,
    }
}
