use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid query \"{query}\": {reason}")]
    InvalidQuery { query: String, reason: String },

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Corpus error: {0}")]
    Corpus(String),

    #[error("Worker pool is shut down")]
    PoolShutdown,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

