//! Error type for the CLI runtime.

use std::io;
use std::sync::Arc;

use dcslink::ClientError;
use dcslink::telemetry::TelemetryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to initialise logging: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("parameter override '{0}' must look like NAME=VALUE")]
    MalformedOverride(String),
    #[error("object {0} was not found")]
    ObjectNotFound(u64),
    #[error("the simulator connection closed")]
    ConnectionClosed,
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("failed to serialise output: {0}")]
    Serialise(#[from] serde_json::Error),
    #[error("failed to write output: {0}")]
    Write(#[from] io::Error),
}
