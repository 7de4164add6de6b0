//! Helper macros used across the codec.

/// Returns early with an error if a condition is not met.
///
/// Like `assert!`, but returns `Err($error)` instead of panicking:
///
/// ```ignore
/// ensure!(body_offset <= MAX_HEADER_BYTES, DecodeError::too_large_header(body_offset, MAX_HEADER_BYTES));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
