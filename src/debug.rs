//! Lifecycle tracing.
//!
//! With the `trace` feature every trace line goes to the console prefixed by
//! the `file:line:` it was emitted from. Without it the macro only type-checks
//! its arguments.

#[cfg(feature = "trace")]
macro_rules! trace {
    ($fmt:literal $(, $args:expr)* $(,)?) => {
        $crate::console::trace(
            format_args!("{}:{}:", file!(), line!()),
            format_args!($fmt $(, $args)*),
        )
    };
}

#[cfg(not(feature = "trace"))]
macro_rules! trace {
    ($fmt:literal $(, $args:expr)* $(,)?) => {
        if false {
            let _ = format_args!($fmt $(, $args)*);
        }
    };
}
