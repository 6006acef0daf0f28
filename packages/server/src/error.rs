//! Start-up and serving errors.

use thiserror::Error;

use crate::domain::RepositoryError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("unsupported database url '{0}' (expected sqlite:...)")]
    UnsupportedDatabaseUrl(String),

    #[error(transparent)]
    Store(#[from] RepositoryError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server terminated: {0}")]
    Serve(#[source] std::io::Error),
}
