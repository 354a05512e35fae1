//! [`Error`] for contract violations detected by terminal operators.

/// Errors returned by terminal operators whose result is only defined for some inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The sequence (after filtering) produced no elements.
    #[error("sequence contains no elements")]
    Empty,
    /// The sequence (after filtering) produced more than one element where exactly one was required.
    #[error("sequence contains more than one element")]
    MoreThanOne,
}
