//! Table variant metadata
//!
//! This module provides functionality for:
//! - Describing the physical variants of a logical table (partitioning,
//!   clustering, unique keys)
//! - Looking variants up through the [`MetadataProvider`] capability
//! - Deriving the logical base name of a suffixed table name
//!
//! Providers are supplied by the caller. The core never caches their answers
//! across queries.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Errors that can occur during metadata lookups
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Metadata unavailable for {table}: {message}")]
    Unavailable { table: String, message: String },
}

/// Result type for metadata operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Storage layout of a physical variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageFormat {
    #[default]
    Parquet,
    Orc,
    Avro,
    Delta,
    Iceberg,
    /// Any format the provider reports that is not listed above
    Other(String),
}

/// A column the variant is laid out by.
///
/// A dimension may be both a partition key and a clustering (organized-by)
/// key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub column_name: String,
    #[serde(default)]
    pub is_partition_key: bool,
    #[serde(default)]
    pub is_organized_by: bool,
}

impl Dimension {
    pub fn partition(column: impl Into<String>) -> Self {
        Self {
            column_name: column.into(),
            is_partition_key: true,
            is_organized_by: false,
        }
    }

    pub fn organized_by(column: impl Into<String>) -> Self {
        Self {
            column_name: column.into(),
            is_partition_key: false,
            is_organized_by: true,
        }
    }
}

/// One physical variant of a logical table.
///
/// The physical name is `<base_name>_<suffix>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub base_name: String,
    pub suffix: String,
    #[serde(default)]
    pub format: StorageFormat,
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    pub unique_keys: BTreeSet<String>,
}

impl TableMetadata {
    pub fn new(base_name: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            base_name: base_name.into(),
            suffix: suffix.into(),
            format: StorageFormat::default(),
            dimensions: Vec::new(),
            unique_keys: BTreeSet::new(),
        }
    }

    pub fn with_format(mut self, format: StorageFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_dimension(mut self, dimension: Dimension) -> Self {
        self.dimensions.push(dimension);
        self
    }

    pub fn with_unique_key(mut self, column: impl Into<String>) -> Self {
        self.unique_keys.insert(column.into());
        self
    }

    /// Physical table name of this variant
    pub fn physical_name(&self) -> String {
        if self.suffix.is_empty() {
            self.base_name.clone()
        } else {
            format!("{}_{}", self.base_name, self.suffix)
        }
    }

    pub fn is_unique_key(&self, column: &str) -> bool {
        self.unique_keys.contains(column)
    }
}

/// Capability for resolving the physical variants of a logical table.
///
/// Implementations may cross a process boundary. Unknown base names return an
/// empty list, not an error.
pub trait MetadataProvider: Send + Sync {
    fn get_table_variants(&self, base_name: &str) -> SchemaResult<Vec<TableMetadata>>;
}

/// Provider that never has variants
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyMetadata;

impl MetadataProvider for EmptyMetadata {
    fn get_table_variants(&self, _base_name: &str) -> SchemaResult<Vec<TableMetadata>> {
        Ok(Vec::new())
    }
}

/// In-memory provider keyed by base name, preserving registration order.
#[derive(Debug, Clone, Default)]
pub struct MappingMetadata {
    variants: HashMap<String, Vec<TableMetadata>>,
}

impl MappingMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variant under its base name
    pub fn add_variant(&mut self, variant: TableMetadata) {
        self.variants
            .entry(variant.base_name.clone())
            .or_default()
            .push(variant);
    }

    pub fn with_variant(mut self, variant: TableMetadata) -> Self {
        self.add_variant(variant);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }
}

impl MetadataProvider for MappingMetadata {
    fn get_table_variants(&self, base_name: &str) -> SchemaResult<Vec<TableMetadata>> {
        Ok(self.variants.get(base_name).cloned().unwrap_or_default())
    }
}

/// Strip the trailing `_<suffix>` segment of a table name.
///
/// Only the last dotted segment is considered, so dataset qualifiers are kept
/// as they are. Names whose table segment has no underscore, or only a
/// leading one, are returned unchanged.
///
/// ```
/// use polyglot_pushdown::schema::extract_base_table_name;
///
/// assert_eq!(extract_base_table_name("customers_a"), "customers");
/// assert_eq!(extract_base_table_name("customers"), "customers");
/// ```
pub fn extract_base_table_name(name: &str) -> &str {
    let segment_start = name.rfind('.').map_or(0, |i| i + 1);
    match name[segment_start..].rfind('_') {
        Some(idx) if idx > 0 => &name[..segment_start + idx],
        _ => name,
    }
}
