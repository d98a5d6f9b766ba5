use thiserror::Error;

use super::types::Field;

/// The only failure the engine knows about: an input outside its domain.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DomainError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: Field,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be a finite number")]
    NonFinite { field: Field },

    #[error("{field} of {value} would divide by zero")]
    DivisionByZero { field: Field, value: f64 },

    #[error("invalid economic constant: {0}")]
    Constants(#[from] ConstantsError),
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConstantsError {
    #[error("step size must be > 0, got {0}")]
    StepSize(f64),

    #[error("agency fee must be >= 0, got {0}")]
    AgencyFee(f64),

    #[error("transaction fee rate must be between 0 and 1, got {0}")]
    TransactionFeeRate(f64),

    #[error("base spend anchor must be a finite number >= 0, got {0}")]
    BaseSpendAnchor(f64),

    #[error("step size {step_size} yields too many escalator steps for spend {monthly_spend}")]
    StepCountOverflow { monthly_spend: f64, step_size: f64 },
}
