use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelatednessError>;

/// Failures surfaced to callers of the engine.
///
/// Client errors are detected before any corpus work starts. Execution
/// errors abort the whole request; no partial response is produced.
#[derive(Error, Debug)]
pub enum RelatednessError {
    #[error("No queries supplied for generation / scoring")]
    MissingQueries,

    #[error("Request contains no compare node or an empty compare node")]
    EmptyCompare,

    #[error("A request node contains empty or null type.")]
    EmptyType,

    #[error("Values of type \"{field}\" cannot be generated automatically or normalized (adapted as \"{facet_field}\")")]
    UnknownField { field: String, facet_field: String },

    #[error("{0}")]
    InvalidQuery(relgraph_core::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Error executing task: {0}")]
    Execution(#[from] relgraph_core::Error),

    #[error("Task panicked: {0}")]
    TaskPanicked(String),

    #[error("Parallel operation interrupted")]
    Interrupted,
}

impl RelatednessError {
    /// HTTP-style status code: 400 for malformed requests, 500 otherwise
    pub fn status_code(&self) -> u16 {
        match self {
            RelatednessError::MissingQueries
            | RelatednessError::EmptyCompare
            | RelatednessError::EmptyType
            | RelatednessError::UnknownField { .. }
            | RelatednessError::InvalidQuery(_) => 400,
            _ => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
