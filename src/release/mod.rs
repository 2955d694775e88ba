//! Release verification: manifest fetch, version agreement, and CDN artifact checks.

pub mod channel;
pub mod http;
pub mod manifest;
pub mod plan;
pub mod releases_index;
pub mod verify;

use thiserror::Error;

/// Environment variable holding the bearer token for the release API.
pub const AUTH_TOKEN_VAR: &str = "AUTH_TOKEN";

/// Get the release API token from the environment.
///
/// An unset variable yields an empty token; the release service decides
/// whether it accepts the request.
pub(crate) fn get_auth_token_from_env() -> String {
    std::env::var(AUTH_TOKEN_VAR).unwrap_or_default()
}

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Invalid channel {name} (expected one of: {expected})")]
    UnknownChannel { name: String, expected: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Release API returned HTTP {status} for {url}: {body}")]
    ManifestStatus { url: String, status: u16, body: String },

    #[error("Multiple most recent versions {}", .versions.join(","))]
    VersionMismatch { versions: Vec<String> },

    #[error("Manifest contains no versioned entries")]
    EmptyManifest,

    #[error("{message} : {url}")]
    ArtifactNotFound {
        url: String,
        message: String,
        status: Option<u16>,
    },

    #[error("{url} could not be found")]
    IndexUnavailable { url: String, status: Option<u16> },

    #[error("Invalid RELEASES line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

pub type VerifyResult<T> = Result<T, VerifyError>;
