#![allow(dead_code)]
//! Shared fixtures for integration tests

use polyglot_pushdown::builder::*;
use polyglot_pushdown::schema::{
    Dimension, MappingMetadata, MetadataProvider, SchemaError, SchemaResult, StorageFormat,
    TableMetadata,
};
use polyglot_pushdown::SelectStatement;
use std::sync::Mutex;

/// Install a test logger once; repeated calls are no-ops
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Catalog with two customer variants and one keyed orders variant.
///
/// - `customers_a`: partitioned by `region`
/// - `customers_b`: clustered by `status`, unique on `id`
/// - `orders_daily`: partitioned by `order_date`, clustered by `region`
pub fn catalog() -> MappingMetadata {
    MappingMetadata::new()
        .with_variant(
            TableMetadata::new("customers", "a").with_dimension(Dimension::partition("region")),
        )
        .with_variant(
            TableMetadata::new("customers", "b")
                .with_format(StorageFormat::Iceberg)
                .with_dimension(Dimension::organized_by("status"))
                .with_unique_key("id"),
        )
        .with_variant(
            TableMetadata::new("orders", "daily")
                .with_dimension(Dimension::partition("order_date"))
                .with_dimension(Dimension::organized_by("region")),
        )
}

/// Provider that records lookups and fails for configured base names
#[derive(Default)]
pub struct RecordingMetadata {
    pub inner: MappingMetadata,
    pub failing: Vec<String>,
    pub lookups: Mutex<Vec<String>>,
}

impl RecordingMetadata {
    pub fn new(inner: MappingMetadata) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    pub fn failing_on(mut self, base_name: &str) -> Self {
        self.failing.push(base_name.to_string());
        self
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl MetadataProvider for RecordingMetadata {
    fn get_table_variants(&self, base_name: &str) -> SchemaResult<Vec<TableMetadata>> {
        if let Ok(mut lookups) = self.lookups.lock() {
            lookups.push(base_name.to_string());
        }
        if self.failing.iter().any(|f| f == base_name) {
            return Err(SchemaError::Unavailable {
                table: base_name.to_string(),
                message: "catalog unreachable".to_string(),
            });
        }
        self.inner.get_table_variants(base_name)
    }
}

/// `SELECT id FROM customers_x WHERE region = 'NA'`
pub fn region_query() -> SelectStatement {
    select(["id"])
        .from("customers_x")
        .where_(col("region").eq(lit("NA")))
        .build()
}

/// `SELECT id FROM customers WHERE region = 'NA' OR region = 'EU' OR region = 'APAC'`
pub fn region_or_query() -> SelectStatement {
    select(["id"])
        .from("customers")
        .where_(
            col("region")
                .eq(lit("NA"))
                .or(col("region").eq(lit("EU")))
                .or(col("region").eq(lit("APAC"))),
        )
        .build()
}

/// Impressions on a federated dataset joined with a native campaigns table
pub fn impressions_query() -> SelectStatement {
    select([col("imp.campaign_id"), col("imp.device"), count_star()])
        .from_as("events_aqfer.impressions", "imp")
        .join_as("campaigns", "c", col("imp.campaign_id").eq(col("c.id")))
        .where_(
            col("c.status")
                .eq(lit("active"))
                .and(col("imp.event_date").gte(date("2024-01-01"))),
        )
        .group_by([col("imp.campaign_id"), col("imp.device")])
        .build()
}
