use thiserror::Error;

use crate::gate::Operator;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors of the PDAG boundary.
///
/// Caller bugs inside the editing API (duplicate parents, erasing missing
/// arguments, mutating constant gates) are precondition violations reported
/// by assertions, not by this type. `Error` covers the two recoverable
/// categories: a malformed source model at construction, and I/O failures at
/// the diagnostic-output boundary.
#[derive(Debug, Error)]
pub enum Error {
    /// The source fault tree defines a gate through itself.
    #[error("cyclic fault-tree definition through gate {0:?}")]
    CyclicModel(String),

    /// A K/N formula with a vote number outside `[1, n]`.
    #[error("gate {gate:?}: vote number {vote_number} must be in [1, {args}]")]
    InvalidVoteNumber {
        gate: String,
        vote_number: i32,
        args: usize,
    },

    /// A formula with the wrong number of arguments for its connective.
    #[error("gate {gate:?}: {connective} takes {expected}, got {actual} argument(s)")]
    InvalidArity {
        gate: String,
        connective: Operator,
        expected: String,
        actual: usize,
    },

    /// A formula that lists the same event more than once.
    #[error("gate {gate:?} repeats an argument event")]
    DuplicateFormulaArg { gate: String },

    /// An I/O failure while writing diagnostic output.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
