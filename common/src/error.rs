use std::path::PathBuf;

use thiserror::Error;

/// A target or exclusion value that cannot be expanded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExpansionError {
    #[error("invalid address in CIDR block '{block}'")]
    InvalidCidrAddress { block: String },

    #[error("invalid prefix in CIDR block '{block}': expected 0-32")]
    InvalidCidrPrefix { block: String },

    #[error("IPv6 CIDR block '{block}' cannot be expanded, pass --no-cidr to use it as-is")]
    Ipv6Cidr { block: String },

    #[error("invalid range '{range}': {reason}")]
    InvalidRange { range: String, reason: String },

    #[error("'{spec}' expands to {hosts} addresses, more than the limit of {limit}")]
    TooLarge { spec: String, hosts: u64, limit: u64 },

    #[error("glob pattern '{pattern}' has no candidate list to match against")]
    GlobWithoutCandidates { pattern: String },

    #[error("invalid glob pattern '{pattern}': {reason}")]
    InvalidGlob { pattern: String, reason: String },
}

/// Malformed or conflicting input, detected before any task is generated.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Expansion(#[from] ExpansionError),

    #[error("the path {} could not be read: {source}", .path.display())]
    UnreadableFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0} is empty")]
    EmptyInput(&'static str),

    #[error("{0} and {1} are mutually exclusive")]
    Conflict(&'static str, &'static str),

    #[error("one of {0} or {1} is required")]
    Missing(&'static str, &'static str),

    #[error("--threads must be a positive integer")]
    ZeroThreads,

    #[error("the random directory {} contains no usable lines", .0.display())]
    EmptyRandomDir(PathBuf),
}
