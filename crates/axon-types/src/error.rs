//! Unified error interface for axon.
//!
//! Every axon error enum implements [`ErrorCode`] so callers on either
//! side of the process boundary can branch on a stable machine-readable
//! code and decide whether a retry is worthwhile.
//!
//! # Example
//!
//! ```
//! use axon_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     NotFound,
//!     Timeout,
//! }
//!
//! impl ErrorCode for MyError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::NotFound => "MY_NOT_FOUND",
//!             Self::Timeout => "MY_TIMEOUT",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Timeout)
//!     }
//! }
//!
//! assert_eq!(MyError::Timeout.code(), "MY_TIMEOUT");
//! assert!(MyError::Timeout.is_recoverable());
//! ```

/// Unified error code interface.
///
/// # Code Format
///
/// - **UPPER_SNAKE_CASE**, prefixed with the owning layer
///   (`RUNTIME_`, `BUS_`, `ROUTER_`)
/// - **Stable**: codes are an API contract and never change once defined
///
/// # Recoverability
///
/// An error is recoverable when retrying the operation may succeed
/// (timeouts, transient handler failures). It is not recoverable when a
/// retry cannot help (unknown component, cyclic graph, misuse after
/// start).
pub trait ErrorCode {
    /// Returns the machine-readable error code.
    fn code(&self) -> &'static str;

    /// Returns whether retrying the failed operation may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Validates that an error code follows axon conventions.
///
/// Checks that the code is non-empty, UPPER_SNAKE_CASE, and carries the
/// expected layer prefix.
///
/// # Panics
///
/// Panics with a descriptive message if validation fails.
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );
    assert!(
        is_upper_snake_case(code),
        "error code '{}' must be UPPER_SNAKE_CASE",
        code
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

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    enum TestError {
        Transient,
        Permanent,
    }

    impl ErrorCode for TestError {
        fn code(&self) -> &'static str {
            match self {
                Self::Transient => "TEST_TRANSIENT",
                Self::Permanent => "TEST_PERMANENT",
            }
        }

        fn is_recoverable(&self) -> bool {
            matches!(self, Self::Transient)
        }
    }

    #[test]
    fn error_code_trait() {
        assert_eq!(TestError::Transient.code(), "TEST_TRANSIENT");
        assert!(TestError::Transient.is_recoverable());
        assert!(!TestError::Permanent.is_recoverable());
    }

    #[test]
    fn assert_error_codes_all_variants() {
        assert_error_codes(&[TestError::Transient, TestError::Permanent], "TEST_");
    }

    #[test]
    #[should_panic(expected = "must start with prefix")]
    fn wrong_prefix_panics() {
        assert_error_code(&TestError::Transient, "WRONG_");
    }

    #[test]
    fn upper_snake_case_rules() {
        assert!(is_upper_snake_case("BUS_TIMEOUT"));
        assert!(is_upper_snake_case("A_B_2"));
        assert!(!is_upper_snake_case(""));
        assert!(!is_upper_snake_case("bus_timeout"));
        assert!(!is_upper_snake_case("_BUS"));
        assert!(!is_upper_snake_case("BUS_"));
        assert!(!is_upper_snake_case("BUS__TIMEOUT"));
    }
}
