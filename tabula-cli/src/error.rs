//! Error types emitted by the Tabula CLI.

use std::sync::Arc;

use tabula_http::{PersistenceError, TransportBuildError};
use thiserror::Error;

/// Errors emitted by the Tabula CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name.
        field: &'static str,
        /// Environment variable name.
        env: &'static str,
    },
    /// Constructing the HTTP transport failed.
    #[error("failed to build transport for {base_url:?}: {source}")]
    BuildTransport {
        /// Configured base URL.
        base_url: String,
        /// Underlying failure.
        #[source]
        source: TransportBuildError,
    },
    /// Starting the async runtime failed.
    #[error("failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// The service call failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    /// Serializing the command output failed.
    #[error("failed to serialize output: {0}")]
    SerializeOutput(#[source] serde_json::Error),
    /// Writing the command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
