//! Unified error types for the Safe coordination core
//!
//! All fallible operations flow through this module so hosts get a
//! consistent, serializable error surface.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all Safe operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafeError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl SafeError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigurationError, msg)
    }

    pub fn not_an_owner(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotAnOwner, msg)
    }

    pub fn insufficient_signatures(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InsufficientSignatures, msg)
    }

    pub fn insufficient_funds(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InsufficientFunds, msg)
    }

    pub fn invalid_signature(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidSignatureFormat, msg)
    }

    pub fn estimation_degraded(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::EstimationDegraded, msg)
    }

    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ExecutionFailed, msg)
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, msg)
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, msg)
    }

    pub fn abi(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::AbiError, msg)
    }

    pub fn signing_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::SigningFailed, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }
}

impl fmt::Display for SafeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for SafeError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Setup errors
    ConfigurationError,

    // Authorization errors
    NotAnOwner,
    InsufficientSignatures,

    // Transaction errors
    InsufficientFunds,
    ExecutionFailed,

    // Signature errors
    InvalidSignatureFormat,
    SigningFailed,

    // Estimation (non-fatal, carried on degraded outcomes)
    EstimationDegraded,

    // Transport errors
    NetworkError,
    Timeout,

    // Parse errors
    ParseError,
    AbiError,

    // Internal
    Internal,
}

/// Result type alias for Safe operations
pub type SafeResult<T> = Result<T, SafeError>;

// Conversions from common error types

impl From<serde_json::Error> for SafeError {
    fn from(e: serde_json::Error) -> Self {
        SafeError::new(ErrorCode::ParseError, e.to_string())
    }
}

impl From<hex::FromHexError> for SafeError {
    fn from(e: hex::FromHexError) -> Self {
        SafeError::new(ErrorCode::ParseError, e.to_string())
    }
}

impl From<reqwest::Error> for SafeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SafeError::new(ErrorCode::Timeout, "Request timed out")
        } else if e.is_connect() {
            SafeError::new(ErrorCode::NetworkError, "Connection failed")
        } else {
            SafeError::new(ErrorCode::NetworkError, e.to_string())
        }
    }
}

impl From<semver::Error> for SafeError {
    fn from(e: semver::Error) -> Self {
        SafeError::new(ErrorCode::ConfigurationError, format!("Invalid version: {}", e))
    }
}
