//! Error types
//!
//! Every failure a command can hit is one of these variants. The binary maps
//! them onto process exit codes with [`MixerError::exit_code`].

use reqwest::{Method, StatusCode};
use thiserror::Error;

/// Process exit codes
pub mod exit_codes {
    /// General error (fallback for unknown errors)
    pub const GENERAL_ERROR: i32 = 1;
    /// CLI usage error (clap reports these itself)
    pub const USAGE_ERROR: i32 = 2;
    /// Input error (unreadable file, malformed YAML)
    pub const INPUT_ERROR: i32 = 3;
    /// Connection error (DNS, connect, timeout, service lookup)
    pub const CONNECTION_ERROR: i32 = 4;
    /// The configuration service rejected the request
    pub const APPLICATION_ERROR: i32 = 5;
    /// The configuration service answered with something unreadable
    pub const DECODE_ERROR: i32 = 6;
}

/// Errors returned by the Mixer configuration client
#[derive(Debug, Error)]
pub enum MixerError {
    /// The input file could not be read
    #[error("failed opening {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The input document is not valid YAML
    #[error("invalid YAML document: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// The input document parsed but is not a mapping
    #[error("invalid document: expected a mapping at the top level, found {0}")]
    InvalidDocument(&'static str),

    /// Re-encoding a document failed
    #[error("failed encoding request: {0}")]
    Encode(#[source] serde_json::Error),

    /// Network level failure talking to the backend
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend address could not be parsed or resolved
    #[error("{0}")]
    Resolution(String),

    /// Kubernetes API failure while resolving the backend service
    #[error("failed looking up service: {0}")]
    Kube(#[from] kube::Error),

    /// A fetch returned a non-200 status; the message is the status text
    #[error("{0}")]
    Http(String),

    /// A write returned a non-200 status
    #[error("failed to {method} {path} with status {status}: {message}")]
    Application {
        method: Method,
        path: String,
        status: u16,
        message: String,
    },

    /// The response body could not be decoded
    #[error("failed processing response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The response payload could not be rendered
    #[error("failed formatting response: {0}")]
    Format(String),

    /// Writing command output failed
    #[error("failed writing output: {0}")]
    Output(#[source] std::io::Error),
}

impl MixerError {
    /// Build the error reported when a fetch returns a non-200 status
    pub fn from_status(status: StatusCode) -> Self {
        let text = status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.as_str().to_string());
        Self::Http(text)
    }

    /// Exit code the binary reports for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io { .. } | Self::InvalidYaml(_) | Self::InvalidDocument(_) => {
                exit_codes::INPUT_ERROR
            }
            Self::Transport(_) | Self::Resolution(_) | Self::Kube(_) => {
                exit_codes::CONNECTION_ERROR
            }
            Self::Http(_) | Self::Application { .. } => exit_codes::APPLICATION_ERROR,
            Self::Decode(_) | Self::Format(_) => exit_codes::DECODE_ERROR,
            Self::Encode(_) | Self::Output(_) => exit_codes::GENERAL_ERROR,
        }
    }
}

pub type Result<T, E = MixerError> = std::result::Result<T, E>;
