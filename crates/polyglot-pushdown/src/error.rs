//! Error types for polyglot-pushdown

use thiserror::Error;

use crate::schema::SchemaError;

/// The result type for optimization and analysis operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while optimizing or analyzing a query
#[derive(Debug, Error)]
pub enum Error {
    /// The metadata provider failed while resolving table variants
    #[error("Metadata error for table {table}: {message}")]
    Metadata { table: String, message: String },

    /// A node could not be serialized to or restored from JSON
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The optimizer configuration document is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// A rewrite rule failed for a reason other than metadata access
    #[error("Rule {rule} failed: {message}")]
    Rule { rule: String, message: String },
}

impl Error {
    /// Create a metadata error
    pub fn metadata(table: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Metadata {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a serialization error with context
    pub fn serialization(context: &str, err: impl std::fmt::Display) -> Self {
        Error::Serialization(format!("{}: {}", context, err))
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Create a rule error
    pub fn rule(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Rule {
            rule: rule.into(),
            message: message.into(),
        }
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::TableNotFound(table) => {
                Error::metadata(table.clone(), format!("table not found: {}", table))
            }
            SchemaError::Unavailable { table, message } => Error::metadata(table, message),
        }
    }
}
