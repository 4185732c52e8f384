use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{path}:{line}: {message}")]
    Dataset {
        path: String,
        line: u64,
        message: String,
    },

    #[error("{path}: missing required column '{column}'")]
    MissingColumn { path: String, column: String },

    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    #[error("Rating by user '{user_id}' references unknown book_id '{book_id}'")]
    UnknownBook { user_id: String, book_id: String },

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// True for failures caused by the input CSVs rather than the environment.
    pub fn is_dataset_error(&self) -> bool {
        matches!(
            self,
            Error::Dataset { .. }
                | Error::MissingColumn { .. }
                | Error::EmptyDataset(_)
                | Error::UnknownBook { .. }
        )
    }

    /// True for failures loading a persisted model artifact.
    pub fn is_startup_error(&self) -> bool {
        matches!(self, Error::Artifact(_) | Error::ChecksumMismatch { .. })
    }
}
