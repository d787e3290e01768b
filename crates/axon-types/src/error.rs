//! Unified error interface for the axon workspace.
//!
//! Every layer defines its own `thiserror` enum and implements
//! [`ErrorCode`] on it. The code is the stable contract; the `Display`
//! string is free to change between releases.
//!
//! # Code format
//!
//! - `UPPER_SNAKE_CASE`, prefixed with the layer name
//!   (`ENGINE_`, `PANE_`, `MODULE_`, `INGRESS_`)
//! - Stable once published (changing a code is a breaking change)
//!
//! # Example
//!
//! ```
//! use axon_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum QueueError {
//!     Full,
//!     Closed,
//! }
//!
//! impl ErrorCode for QueueError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Full => "QUEUE_FULL",
//!             Self::Closed => "QUEUE_CLOSED",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Full)
//!     }
//! }
//!
//! let err = QueueError::Full;
//! assert_eq!(err.code(), "QUEUE_FULL");
//! assert!(err.is_recoverable());
//! ```

/// Machine-readable error code plus a recoverability hint.
///
/// An error is **recoverable** when retrying the failed operation may
/// succeed without a code or configuration change — a busy channel, a
/// topic that a module has not declared yet. Lifecycle misuse and
/// lookup failures are not recoverable: retrying them verbatim yields
/// the same answer.
pub trait ErrorCode {
    /// Returns the stable machine-readable code for this error.
    fn code(&self) -> &'static str;

    /// Returns whether retrying the operation may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Validates a single error code against the workspace conventions.
///
/// # Panics
///
/// Panics with a descriptive message when the code is empty, carries the
/// wrong prefix, or is not `UPPER_SNAKE_CASE`.
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "error code '{code}' must start with prefix '{expected_prefix}'"
    );
    assert!(
        is_upper_snake_case(code),
        "error code '{code}' must be UPPER_SNAKE_CASE"
    );
}

/// Validates every variant of an error enum at once.
///
/// # Example
///
/// ```
/// use axon_types::{assert_error_codes, ErrorCode};
///
/// #[derive(Debug)]
/// enum MyError { A, B }
///
/// impl ErrorCode for MyError {
///     fn code(&self) -> &'static str {
///         match self {
///             Self::A => "MY_A",
///             Self::B => "MY_B",
///         }
///     }
///     fn is_recoverable(&self) -> bool { false }
/// }
///
/// assert_error_codes(&[MyError::A, MyError::B], "MY_");
/// ```
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
