/// Status code for a successful exit.
pub const EXIT_SUCCESS: i32 = 0;

/// Catch-all status code for processes that exit without a code, such as
/// when terminated by a signal.
pub const EXIT_GENERAL_ERROR: i32 = 1;
