//! Error taxonomy shared by every resolver, installer and process helper.

use std::path::{Path, PathBuf};

/// Stable classification of an [`Error`], for callers that only need to branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedLoader,
    VersionResolution,
    Download,
    Install,
    Manifest,
    Io,
    Process,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unsupported loader '{0}'")]
    UnsupportedLoader(String),

    #[error("{0}")]
    VersionResolution(String),

    #[error("{0}")]
    Download(String),

    #[error("{0}")]
    Install(String),

    #[error("{0}")]
    Manifest(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}: {source}")]
    Process {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedLoader(_) => ErrorKind::UnsupportedLoader,
            Error::VersionResolution(_) => ErrorKind::VersionResolution,
            Error::Download(_) => ErrorKind::Download,
            Error::Install(_) => ErrorKind::Install,
            Error::Manifest(_) => ErrorKind::Manifest,
            Error::Io { .. } => ErrorKind::Io,
            Error::Process { .. } => ErrorKind::Process,
        }
    }

    pub(crate) fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub(crate) fn process(message: impl Into<String>, source: std::io::Error) -> Self {
        Error::Process {
            message: message.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
