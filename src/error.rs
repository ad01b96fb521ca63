//! Error types for the export pipeline.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for export operations.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Credential validation errors (empty access id or secret).
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Warehouse connection errors (endpoint unreachable, auth rejected, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Caller input errors (empty or malformed table name).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Query execution errors from the warehouse (bad table, permission denied, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// Spreadsheet serialization errors (cell value not representable).
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration errors (invalid config file, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Host filesystem errors (writing the artifact to disk, etc.)
    #[error("I/O error: {0}")]
    Io(String),
}

impl ExportError {
    /// Creates an invalid-credentials error with the given message.
    pub fn invalid_credentials(msg: impl Into<String>) -> Self {
        Self::InvalidCredentials(msg.into())
    }

    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates an invalid-input error with the given message.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a serialization error with the given message.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an I/O error with the given message.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidCredentials(_) => "Credential Error",
            Self::Connection(_) => "Connection Error",
            Self::InvalidInput(_) => "Input Error",
            Self::Query(_) => "Query Error",
            Self::Serialization(_) => "Serialization Error",
            Self::Config(_) => "Configuration Error",
            Self::Io(_) => "I/O Error",
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for ExportError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type alias using ExportError.
pub type Result<T> = std::result::Result<T, ExportError>;
