use std::path::PathBuf;

pub type Result<T> = core::result::Result<T, Error>;

/// Errors surfaced by the loaders.
///
/// Every variant carries plain text so that [`crate::Redactor`] can scrub
/// secrets from all of them, library errors included.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Bcp command failed. Details:\n{0}")]
    BulkCopy(String),

    #[error("Sqlcmd command failed. Details:\n{0}")]
    Command(String),

    #[error("Failed to launch `{program}`: {message}")]
    Spawn { program: String, message: String },

    #[error("I/O error on {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("Blob staging failed: {0}")]
    Storage(String),

    #[error("Failed to parse command output: {0}")]
    Parse(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            message: error.to_string(),
        }
    }

    /// Rewrite every piece of text carried by the error
    pub(crate) fn map_text(self, f: impl Fn(&str) -> String) -> Self {
        match self {
            Error::Configuration(msg) => Error::Configuration(f(&msg)),
            Error::BulkCopy(msg) => Error::BulkCopy(f(&msg)),
            Error::Command(msg) => Error::Command(f(&msg)),
            Error::Spawn { program, message } => Error::Spawn {
                program: f(&program),
                message: f(&message),
            },
            Error::Io { path, message } => Error::Io {
                path: PathBuf::from(f(&path.to_string_lossy())),
                message: f(&message),
            },
            Error::Storage(msg) => Error::Storage(f(&msg)),
            Error::Parse(msg) => Error::Parse(f(&msg)),
        }
    }
}

impl From<bcpaz_storage::Error> for Error {
    fn from(error: bcpaz_storage::Error) -> Self {
        use bcpaz_storage::Error as StorageError;

        match error {
            StorageError::MalformedConnectionString
            | StorageError::MissingSetting(_)
            | StorageError::InvalidAccountKey
            | StorageError::InvalidEndpoint(_) => Error::Configuration(error.to_string()),
            StorageError::ObjectStoreCreation(_) | StorageError::ObjectStore(_) => {
                Error::Storage(error.to_string())
            }
        }
    }
}

impl From<object_store::Error> for Error {
    fn from(error: object_store::Error) -> Self {
        Error::Storage(error.to_string())
    }
}

impl From<datafusion::arrow::error::ArrowError> for Error {
    fn from(error: datafusion::arrow::error::ArrowError) -> Self {
        Error::Parse(error.to_string())
    }
}
