//! Shared error types for the rotation scheduler

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SharedError {
    #[error("Dish record {dish} is missing required field '{field}'")]
    MissingField { dish: String, field: &'static str },

    #[error("Dish record {dish} has invalid '{field}': {reason}")]
    InvalidField {
        dish: String,
        field: &'static str,
        reason: String,
    },

    #[error("Invalid configuration: {field} = {value}")]
    InvalidConfig { field: String, value: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
