//! Boundary logging macros
//!
//! Every lifecycle event carries `component` (the calling module), `op` and
//! `event`. End events add `duration_ms`; error events add `err.kind`,
//! `err.code` and `err.message`. Any further `key = value` fields are handed
//! to `tracing` unchanged.
//!
//! ```
//! # use opsdesk_core::{log_op_start, log_op_end};
//! log_op_start!("dispatch", entity = "users", operation = "list");
//! log_op_end!("dispatch", duration_ms = 4, status = "success");
//! ```

#[doc(hidden)]
#[macro_export]
macro_rules! __op_event {
    ($level:ident, $op:expr, $event:expr $(, $($field:tt)+)?) => {
        ::tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $event,
            $($($field)+)?
        )
    };
}

/// `event = start` at INFO
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)+)?) => {
        $crate::__op_event!(
            info,
            $op,
            $crate::__types::schema::EVENT_START
            $(, $($field)+)?
        )
    };
}

/// `event = end` at INFO, with the elapsed milliseconds
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {
        $crate::__op_event!(
            info,
            $op,
            $crate::__types::schema::EVENT_END,
            duration_ms = $duration
            $(, $($field)+)?
        )
    };
}

/// `event = end_error` at ERROR
///
/// The error may be anything convertible into `ExError`, so the event always
/// carries a stable `err.code`.
///
/// ```
/// # use opsdesk_core::{log_op_error, errors::OpsError};
/// log_op_error!("dispatch", OpsError::not_found("User"), duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)+)?) => {{
        let ex_err: $crate::errors::ExError = ::std::convert::Into::into($err);
        $crate::__op_event!(
            error,
            $op,
            $crate::__types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err.kind = ?ex_err.kind(),
            err.code = ex_err.code(),
            err.message = ex_err.message()
            $(, $($field)+)?
        )
    }};
}
