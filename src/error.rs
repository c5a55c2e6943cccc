use thiserror::Error;

/// Errors raised by the type-erased containers.
///
/// Both kinds are contract violations by the caller, so nothing in this crate
/// retries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error
{
    /// A `Function` holding no callable was invoked.
    #[error("called a Function that holds no callable")]
    EmptyCallable,

    /// An `Any` was read as a type other than the one it holds.
    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch
    {
        expected: &'static str,
        found: &'static str,
    },

    /// An empty `Any` was read.
    #[error("no value held, expected `{expected}`")]
    EmptyValue
    {
        expected: &'static str
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
