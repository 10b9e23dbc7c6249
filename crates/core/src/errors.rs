use thiserror::Error;

/// Validation failures raised before anything reaches the store. Display
/// strings are user facing.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("{field} must be {requirement}")]
    OutOfRange { field: &'static str, requirement: &'static str },
    #[error("{0}")]
    InvariantViolation(String),
}
