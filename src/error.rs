use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors. Anything that goes wrong while probing a single target is not an
/// `Error`: it becomes an [`Outcome`](crate::http_probe::result::Outcome) instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error("target source {} not found: {source}", .path.display())]
    TargetSourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read target source {}: {source}", .path.display())]
    TargetSource {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("target source {} has no '{column}' column", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("target source {} contains no targets", .path.display())]
    NoTargets { path: PathBuf },

    #[error("invalid config file {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid DNS host '{host}': {source}")]
    DnsHost {
        host: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("failed to set up DNS resolver: {0}")]
    Resolver(#[from] trust_dns_resolver::error::ResolveError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to initialise logging: {0}")]
    Logging(#[from] log::SetLoggerError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
