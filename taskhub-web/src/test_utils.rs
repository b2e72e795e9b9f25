//! Assertion macros used by unit and integration tests in place of
//! `unwrap()`/`expect()`. Failures report the call site.

/// Unwrap a `Result`, panicking with file and line on `Err`.
///
/// ```rust
/// use taskhub_web::unwrap_ok;
///
/// let parsed: Result<i32, std::num::ParseIntError> = "7".parse();
/// assert_eq!(unwrap_ok!(parsed), 7);
/// ```
#[macro_export]
macro_rules! unwrap_ok {
    ($expr:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("{}:{} - Expected Ok, got Err: {:?}", file!(), line!(), e),
        }
    };
    ($expr:expr, $msg:expr) => {
        match $expr {
            Ok(val) => val,
            Err(e) => panic!("{}:{} - {}: {:?}", file!(), line!(), $msg, e),
        }
    };
}

/// Unwrap an `Option`, panicking with file and line on `None`.
#[macro_export]
macro_rules! unwrap_some {
    ($expr:expr) => {
        match $expr {
            Some(val) => val,
            None => panic!("{}:{} - Expected Some, got None", file!(), line!()),
        }
    };
    ($expr:expr, $msg:expr) => {
        match $expr {
            Some(val) => val,
            None => panic!("{}:{} - {}", file!(), line!(), $msg),
        }
    };
}

/// Assert that a `Result` is `Err`.
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        if let Ok(val) = &$expr {
            panic!("{}:{} - Expected Err, got Ok: {:?}", file!(), line!(), val);
        }
    };
}
