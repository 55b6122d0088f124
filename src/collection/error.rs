use thiserror::Error;

use crate::collection::route::RouteId;

/// Everything that can go wrong while building or editing a route.
///
/// None of these are fatal: the REPL reports them and leaves the collection as
/// it was.
#[derive(Debug, Error, PartialEq)]
pub enum RouteError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be at most {max}, got {value}")]
    AboveMaximum {
        field: &'static str,
        max: f64,
        value: f64,
    },

    #[error("{field} must be greater than {min}, got {value}")]
    NotAboveMinimum {
        field: &'static str,
        min: i64,
        value: i64,
    },

    #[error("invalid {kind} for {field}: {value:?}")]
    Parse {
        field: &'static str,
        kind: &'static str,
        value: String,
    },

    #[error("route with id {0} not found")]
    NotFound(RouteId),

    #[error("field not recognized: {0}")]
    UnknownField(String),

    #[error("no route ids left to allocate after {0}")]
    IdsExhausted(RouteId),
}
