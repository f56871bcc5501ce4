//! Error types.
//!
//! Reconciliation itself never fails: a patch that cannot be applied in place
//! is reported as "must reload". Errors only come from the edges: parsing
//! configuration, encoding diagnostics, and wiring a transport of the wrong
//! shape.

use thiserror::Error;

use crate::transport::TransportKind;

/// Errors raised at the crate's fallible edges.
#[derive(Debug, Error)]
pub enum RefreshError {
    /// Configuration JSON did not parse.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A transport flavor name is not recognized.
    #[error("unknown transport flavor `{0}`")]
    UnknownTransport(String),

    /// An environment variable holds a value that cannot be parsed.
    #[error("invalid value `{value}` for {key}")]
    InvalidEnv { key: &'static str, value: String },

    /// The hot handle's shape does not match the configured flavor.
    #[error("transport `{kind}` expects a {expected} hot handle")]
    TransportMismatch {
        kind: TransportKind,
        expected: &'static str,
    },

    /// A snapshot could not be encoded.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// A snapshot could not be decoded.
    #[error("failed to decode snapshot: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Result alias for fallible operations in this crate.
pub type RefreshResult<T> = Result<T, RefreshError>;
