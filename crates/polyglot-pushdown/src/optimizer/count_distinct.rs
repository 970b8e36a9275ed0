//! COUNT(DISTINCT key) rewrite
//!
//! `COUNT(DISTINCT col)` equals `COUNT(*)` when `col` is a unique key of the
//! table. Variants of the first FROM table are looked up once per statement,
//! and only when the select list actually holds a candidate.

use log::trace;

use crate::error::Result;
use crate::expressions::{ColumnReference, Expression, SelectStatement};
use crate::schema::{extract_base_table_name, TableMetadata};

use super::optimizer::{OptimizationPhase, OptimizationRule, RuleContext, COUNT_DISTINCT};

#[derive(Debug, Clone, Copy, Default)]
pub struct CountDistinctRewrite;

impl OptimizationRule for CountDistinctRewrite {
    fn name(&self) -> &'static str {
        COUNT_DISTINCT
    }

    fn phase(&self) -> OptimizationPhase {
        OptimizationPhase::Generic
    }

    fn description(&self) -> &'static str {
        "Replace COUNT(DISTINCT unique_key) with COUNT(*)"
    }

    fn apply(&self, statement: &mut SelectStatement, ctx: &RuleContext<'_>) -> Result<bool> {
        let Some(table) = statement.first_table() else {
            return Ok(false);
        };
        let base = extract_base_table_name(&table.name).to_string();

        let mut variants: Option<Vec<TableMetadata>> = None;
        let mut replace = Vec::new();
        for (idx, item) in statement.select_list.iter().enumerate() {
            let Some(column) = distinct_count_column(item) else {
                continue;
            };
            if variants.is_none() {
                variants = Some(ctx.metadata.get_table_variants(&base)?);
            }
            let known = variants.as_deref().unwrap_or_default();
            if let Some(variant) = known.iter().find(|v| v.is_unique_key(&column.column)) {
                trace!(
                    "COUNT(DISTINCT {}) is a unique key of {}, counting rows",
                    column,
                    variant.physical_name()
                );
                replace.push(idx);
            }
        }

        if replace.is_empty() {
            return Ok(false);
        }
        for idx in replace {
            statement.select_list[idx] = Expression::function("COUNT", vec![Expression::Star]);
        }
        Ok(true)
    }
}

/// Column of a `COUNT(DISTINCT col)` entry with a single column argument
fn distinct_count_column(expr: &Expression) -> Option<&ColumnReference> {
    let Expression::FunctionCall(call) = expr else {
        return None;
    };
    if !call.is_named("COUNT") || !call.distinct {
        return None;
    }
    match call.args.as_slice() {
        [Expression::ColumnReference(column)] => Some(column),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::*;
    use crate::dialects::Dialect;
    use crate::error::Error;
    use crate::schema::{MappingMetadata, MetadataProvider, SchemaError, SchemaResult};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn metadata() -> MappingMetadata {
        MappingMetadata::new()
            .with_variant(TableMetadata::new("customers", "a"))
            .with_variant(TableMetadata::new("customers", "b").with_unique_key("id"))
    }

    fn run(statement: &mut SelectStatement, metadata: &dyn MetadataProvider) -> Result<bool> {
        let dialect = Dialect::default();
        let ctx = RuleContext {
            dialect: &dialect,
            metadata,
        };
        CountDistinctRewrite.apply(statement, &ctx)
    }

    #[test]
    fn test_unique_key_becomes_count_star() {
        let mut stmt = select([count_distinct(col("id"))]).from("customers").build();
        assert!(run(&mut stmt, &metadata()).unwrap());
        assert_eq!(stmt.to_string(), "SELECT COUNT(*) FROM customers");
    }

    #[test]
    fn test_non_unique_column_is_kept() {
        let mut stmt = select([count_distinct(col("email"))]).from("customers").build();
        assert!(!run(&mut stmt, &metadata()).unwrap());
        assert_eq!(stmt.to_string(), "SELECT COUNT(DISTINCT email) FROM customers");
    }

    #[test]
    fn test_suffixed_table_uses_base_variants() {
        let mut stmt = select([col("region"), count_distinct(col("c.id"))])
            .from_as("customers_a", "c")
            .group_by(["region"])
            .build();
        assert!(run(&mut stmt, &metadata()).unwrap());
        assert_eq!(
            stmt.to_string(),
            "SELECT region, COUNT(*) FROM customers_a AS c GROUP BY region"
        );
    }

    #[test]
    fn test_plain_count_is_not_touched() {
        let mut stmt = select([count(col("id")), func("count", [col("id"), col("email")])])
            .from("customers")
            .build();
        assert!(!run(&mut stmt, &metadata()).unwrap());
    }

    #[test]
    fn test_no_from_clause() {
        let mut stmt = select([count_distinct(col("id"))]).build();
        assert!(!run(&mut stmt, &metadata()).unwrap());
    }

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    impl MetadataProvider for Counting {
        fn get_table_variants(&self, base_name: &str) -> SchemaResult<Vec<TableMetadata>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SchemaError::TableNotFound(base_name.to_string()));
            }
            Ok(vec![TableMetadata::new(base_name, "a").with_unique_key("id")])
        }
    }

    #[test]
    fn test_variants_looked_up_once() {
        let provider = Counting {
            calls: AtomicUsize::new(0),
            fail: false,
        };
        let mut stmt = select([count_distinct(col("id")), count_distinct(col("name"))])
            .from("customers")
            .build();
        assert!(run(&mut stmt, &provider).unwrap());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            stmt.to_string(),
            "SELECT COUNT(*), COUNT(DISTINCT name) FROM customers"
        );
    }

    #[test]
    fn test_no_candidate_skips_lookup() {
        let provider = Counting {
            calls: AtomicUsize::new(0),
            fail: true,
        };
        let mut stmt = select(["id"]).from("customers").build();
        assert!(!run(&mut stmt, &provider).unwrap());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_metadata_failure_propagates() {
        let provider = Counting {
            calls: AtomicUsize::new(0),
            fail: true,
        };
        let mut stmt = select([count_distinct(col("id"))]).from("customers").build();
        let original = stmt.clone();
        let err = run(&mut stmt, &provider).unwrap_err();
        assert!(matches!(err, Error::Metadata { ref table, .. } if table == "customers"));
        assert_eq!(stmt, original);
    }
}
