//! SQL Dialect identification
//!
//! Rendering an AST back to SQL is done by an external dialect renderer. This
//! crate only needs a dialect's name, used as a lookup key for per-rule
//! dialect gating, and its federated-table naming convention.
//!
//! Built-in dialects are listed in [`DialectType`]; any other name can be
//! used through [`Dialect::new`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Well-known dialect names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DialectType {
    #[default]
    Generic,
    PostgreSQL,
    MySQL,
    BigQuery,
    Snowflake,
    Trino,
    DuckDB,
    Teradata,
}

impl DialectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialectType::Generic => "generic",
            DialectType::PostgreSQL => "postgresql",
            DialectType::MySQL => "mysql",
            DialectType::BigQuery => "bigquery",
            DialectType::Snowflake => "snowflake",
            DialectType::Trino => "trino",
            DialectType::DuckDB => "duckdb",
            DialectType::Teradata => "teradata",
        }
    }
}

impl fmt::Display for DialectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" | "generic" => Ok(DialectType::Generic),
            "postgresql" | "postgres" => Ok(DialectType::PostgreSQL),
            "mysql" => Ok(DialectType::MySQL),
            "bigquery" => Ok(DialectType::BigQuery),
            "snowflake" => Ok(DialectType::Snowflake),
            "trino" => Ok(DialectType::Trino),
            "duckdb" => Ok(DialectType::DuckDB),
            "teradata" => Ok(DialectType::Teradata),
            _ => Err(format!("Unknown dialect: {}", s)),
        }
    }
}

/// Default dataset suffix that marks a federated table
pub const DEFAULT_FEDERATED_SUFFIX: &str = "_aqfer";

/// Dataset type reported when the dataset segment is only the suffix
pub const DEFAULT_DATASET_TYPE: &str = "default";

/// Naming convention that identifies federated tables.
///
/// A table named `<dataset><suffix>.<table>` is served by the federated
/// provider; the dataset with the suffix removed is its dataset type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FederatedNaming {
    pub dataset_suffix: String,
}

impl Default for FederatedNaming {
    fn default() -> Self {
        Self {
            dataset_suffix: DEFAULT_FEDERATED_SUFFIX.to_string(),
        }
    }
}

impl FederatedNaming {
    pub fn new(dataset_suffix: impl Into<String>) -> Self {
        Self {
            dataset_suffix: dataset_suffix.into(),
        }
    }

    /// Dataset type of a federated table name, or `None` if the name does not
    /// follow the convention.
    ///
    /// ```
    /// use polyglot_pushdown::dialects::FederatedNaming;
    ///
    /// let naming = FederatedNaming::default();
    /// assert_eq!(naming.dataset_type("events_aqfer.impressions").as_deref(), Some("events"));
    /// assert_eq!(naming.dataset_type("public.campaigns"), None);
    /// ```
    pub fn dataset_type(&self, table_name: &str) -> Option<String> {
        if self.dataset_suffix.is_empty() {
            return None;
        }
        let (dataset, _) = table_name.rsplit_once('.')?;
        // Only the segment right before the table name is the dataset
        let dataset = dataset.rsplit('.').next().unwrap_or(dataset);
        let lowered = dataset.to_ascii_lowercase();
        let suffix = self.dataset_suffix.to_ascii_lowercase();
        let stem = lowered.strip_suffix(&suffix)?;
        let stem = &dataset[..stem.len()];
        if stem.is_empty() {
            Some(DEFAULT_DATASET_TYPE.to_string())
        } else {
            Some(stem.to_string())
        }
    }

    pub fn is_federated(&self, table_name: &str) -> bool {
        self.dataset_type(table_name).is_some()
    }
}

/// A target dialect: its name and federated naming convention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialect {
    name: String,
    #[serde(default)]
    federated_naming: FederatedNaming,
}

impl Dialect {
    /// Dialect with an arbitrary name and the default naming convention
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            federated_naming: FederatedNaming::default(),
        }
    }

    /// Built-in dialect
    pub fn get(dialect_type: DialectType) -> Self {
        Self::new(dialect_type.as_str())
    }

    pub fn with_federated_naming(mut self, naming: FederatedNaming) -> Self {
        self.federated_naming = naming;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn federated_naming(&self) -> &FederatedNaming {
        &self.federated_naming
    }

    /// Built-in type for this dialect's name, if it is one
    pub fn dialect_type(&self) -> Option<DialectType> {
        self.name.parse().ok()
    }

    /// Case-insensitive name comparison
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::get(DialectType::Generic)
    }
}

impl From<DialectType> for Dialect {
    fn from(dialect_type: DialectType) -> Self {
        Self::get(dialect_type)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
