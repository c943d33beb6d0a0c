//! Error types for the todo core.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers distinguish "the todo
//! does not exist" from "the service returned an unexpected status." Any other
//! non-success response lands in `HttpError` with the raw status and body.
//! `Transport` is never produced by `TodoClient` itself; hosts report it when
//! the round-trip could not be completed at all.
//!
//! These errors stop at the `ListSync` boundary. The presenter only ever sees
//! their rendered message.

use thiserror::Error;

/// Errors produced while building requests or interpreting responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The service returned 404: the referenced todo does not exist.
    #[error("todo not found")]
    NotFound,

    /// The service returned a non-success status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// The request was rejected before being sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The host could not complete the round-trip.
    #[error("transport failed: {0}")]
    Transport(String),
}

/// Errors loading a `ClientConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

/// A filter name that is not one of the enumerated tabs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown filter: {0}")]
pub struct FilterParseError(pub String);
