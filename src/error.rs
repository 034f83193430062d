use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A collaborator answered with a non-2xx status.
    ///
    /// Raised by network implementations of the collaborator traits. The
    /// file-backed ones in `local` have no status to report.
    #[allow(dead_code)]
    #[error("{service} responded with status {status}: {body}")]
    Upstream {
        service: String,
        status: u16,
        body: serde_json::Value,
    },

    #[error("I/O error on {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt JSON in {path}: {source}", path = .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid stored record for '{id}': {source}")]
    InvalidRecord {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Error::Corrupt {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
