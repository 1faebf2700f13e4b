//! Error types for the SmsGate service.

use thiserror::Error;

/// Main error type for SmsGate operations.
///
/// Admission rejections are not errors; they are reported through
/// [`GateResult`](crate::ratelimit::GateResult).
#[derive(Error, Debug)]
pub enum SmsGateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Layered configuration sources could not be read or merged
    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    /// Message delivery errors
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// gRPC server errors
    #[error("gRPC error: {0}")]
    Grpc(#[from] tonic::transport::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for SmsGate operations.
pub type Result<T> = std::result::Result<T, SmsGateError>;
