//! Table Variant Routing Module
//!
//! Rewrites a logical table reference to the physical variant whose layout
//! best matches the columns the WHERE clause filters on.
//!
//! Only names that already carry a `_<suffix>` are candidates. The suffix is
//! stripped to get the base name, the metadata provider lists the variants
//! of that base, and the reference is renamed to `<base>_<best suffix>`.
//!
//! Scoring, per dimension whose column is used by the WHERE clause:
//! - partition key: +2
//! - organized-by key: +1 (independent, a dimension can add both)
//!
//! The strictly highest score wins; ties keep the first variant. A best score
//! of zero leaves the name alone.

use log::trace;
use std::collections::HashSet;

use crate::error::Result;
use crate::expressions::{Expression, SelectStatement};
use crate::schema::{extract_base_table_name, TableMetadata};

use super::optimizer::{OptimizationPhase, OptimizationRule, RuleContext, TABLE_ROUTING};

/// Routes suffixed table names to their best-scoring physical variant
#[derive(Debug, Clone, Copy, Default)]
pub struct TableVariantRouter;

impl OptimizationRule for TableVariantRouter {
    fn name(&self) -> &'static str {
        TABLE_ROUTING
    }

    fn phase(&self) -> OptimizationPhase {
        OptimizationPhase::Generic
    }

    fn description(&self) -> &'static str {
        "Route logical tables to the physical variant matching WHERE-clause usage"
    }

    fn apply(&self, statement: &mut SelectStatement, ctx: &RuleContext<'_>) -> Result<bool> {
        let used = match statement.where_condition() {
            Some(condition) => where_columns(condition),
            None => return Ok(false),
        };
        if used.is_empty() {
            return Ok(false);
        }

        // Resolve every lookup before renaming so a metadata failure leaves
        // the FROM list as it was
        let mut renames = Vec::new();
        for (idx, table) in statement.tables().iter().enumerate() {
            let base = extract_base_table_name(&table.name);
            if base == table.name {
                continue;
            }
            let variants = ctx.metadata.get_table_variants(base)?;
            let Some(best) = select_best_variant(&variants, &used) else {
                trace!("No variant of {} matches the filtered columns", base);
                continue;
            };
            let routed = routed_name(base, best);
            if routed != table.name {
                trace!("Routing {} to {}", table.name, routed);
                renames.push((idx, routed));
            }
        }

        if renames.is_empty() {
            return Ok(false);
        }
        if let Some(from) = statement.from.as_mut() {
            for (idx, name) in renames {
                from.tables[idx].name = name;
            }
        }
        Ok(true)
    }
}

fn routed_name(base: &str, variant: &TableMetadata) -> String {
    if variant.suffix.is_empty() {
        base.to_string()
    } else {
        format!("{}_{}", base, variant.suffix)
    }
}

/// Score of a variant against the set of filtered columns
pub fn score_variant(variant: &TableMetadata, used: &HashSet<String>) -> u32 {
    variant
        .dimensions
        .iter()
        .filter(|d| used.contains(&d.column_name))
        .map(|d| {
            let mut score = 0;
            if d.is_partition_key {
                score += 2;
            }
            if d.is_organized_by {
                score += 1;
            }
            score
        })
        .sum()
}

/// Variant with the strictly highest positive score; the first one on ties.
pub fn select_best_variant<'a>(
    variants: &'a [TableMetadata],
    used: &HashSet<String>,
) -> Option<&'a TableMetadata> {
    let mut best = None;
    let mut best_score = 0;
    for variant in variants {
        let score = score_variant(variant, used);
        trace!("Variant {} scores {}", variant.physical_name(), score);
        if score > best_score {
            best = Some(variant);
            best_score = score;
        }
    }
    best
}

/// Column names a WHERE condition filters on, as the router sees them.
///
/// At each binary node the left operand counts only when it is a column; the
/// walk continues down the right operand alone. `a = 1 AND b = 2` therefore
/// yields `{b}`: the left conjunct is a binary expression, not a column, and
/// is never descended into.
pub fn where_columns(condition: &Expression) -> HashSet<String> {
    let mut used = HashSet::new();
    collect_where_columns(condition, &mut used);
    used
}

fn collect_where_columns(expr: &Expression, used: &mut HashSet<String>) {
    let Expression::BinaryExpression(binary) = expr else {
        return;
    };
    if let Expression::ColumnReference(column) = &binary.left {
        used.insert(column.column.clone());
    }
    match &binary.right {
        Expression::ColumnReference(column) => {
            used.insert(column.column.clone());
        }
        Expression::BinaryExpression(_) => collect_where_columns(&binary.right, used),
        Expression::Literal(_)
        | Expression::FunctionCall(_)
        | Expression::InExpression(_)
        | Expression::Star => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::*;
    use crate::dialects::Dialect;
    use crate::error::Error;
    use crate::schema::{
        Dimension, MappingMetadata, MetadataProvider, SchemaError, SchemaResult,
    };

    fn metadata() -> MappingMetadata {
        MappingMetadata::new()
            .with_variant(
                TableMetadata::new("customers", "a").with_dimension(Dimension::partition("region")),
            )
            .with_variant(
                TableMetadata::new("customers", "b")
                    .with_dimension(Dimension::organized_by("status")),
            )
    }

    fn route(statement: &mut SelectStatement, metadata: &dyn MetadataProvider) -> Result<bool> {
        let dialect = Dialect::default();
        let ctx = RuleContext {
            dialect: &dialect,
            metadata,
        };
        TableVariantRouter.apply(statement, &ctx)
    }

    fn used(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_partition_key_beats_cluster_key() {
        let mut stmt = select(["id"])
            .from("customers_x")
            .where_(col("region").eq(lit("NA")))
            .build();
        assert!(route(&mut stmt, &metadata()).unwrap());
        assert_eq!(stmt.tables()[0].name, "customers_a");
    }

    #[test]
    fn test_cluster_key_selects_its_variant() {
        let mut stmt = select(["id"])
            .from("customers_a")
            .where_(col("status").eq(lit("active")))
            .build();
        assert!(route(&mut stmt, &metadata()).unwrap());
        assert_eq!(stmt.tables()[0].name, "customers_b");
    }

    #[test]
    fn test_routing_is_idempotent() {
        let mut stmt = select(["id"])
            .from("customers_x")
            .where_(col("region").eq(lit("NA")))
            .build();
        route(&mut stmt, &metadata()).unwrap();
        let once = stmt.clone();
        assert!(!route(&mut stmt, &metadata()).unwrap());
        assert_eq!(stmt, once);
    }

    #[test]
    fn test_unsuffixed_name_is_not_a_candidate() {
        let mut stmt = select(["id"])
            .from("customers")
            .where_(col("region").eq(lit("NA")))
            .build();
        assert!(!route(&mut stmt, &metadata()).unwrap());
        assert_eq!(stmt.tables()[0].name, "customers");
    }

    #[test]
    fn test_zero_score_keeps_name() {
        let mut stmt = select(["id"])
            .from("customers_x")
            .where_(col("email").eq(lit("a@b.c")))
            .build();
        assert!(!route(&mut stmt, &metadata()).unwrap());
        assert_eq!(stmt.tables()[0].name, "customers_x");
    }

    #[test]
    fn test_no_where_clause() {
        let mut stmt = select(["id"]).from("customers_x").build();
        assert!(!route(&mut stmt, &metadata()).unwrap());
    }

    #[test]
    fn test_scores_are_additive() {
        let both = TableMetadata::new("t", "ab").with_dimension(Dimension {
            column_name: "region".to_string(),
            is_partition_key: true,
            is_organized_by: true,
        });
        assert_eq!(score_variant(&both, &used(&["region"])), 3);
        assert_eq!(score_variant(&both, &used(&["status"])), 0);
    }

    #[test]
    fn test_tie_keeps_first_variant() {
        let variants = vec![
            TableMetadata::new("t", "first").with_dimension(Dimension::partition("region")),
            TableMetadata::new("t", "second").with_dimension(Dimension::partition("region")),
        ];
        let best = select_best_variant(&variants, &used(&["region"])).unwrap();
        assert_eq!(best.suffix, "first");
    }

    #[test]
    fn test_where_columns_follow_right_spine_only() {
        // Pins the asymmetric walk: the left conjunct `a = 1` is skipped
        let condition = col("a").eq(lit(1)).and(col("b").eq(lit(2))).into_inner();
        assert_eq!(where_columns(&condition), used(&["b"]));
    }

    #[test]
    fn test_where_columns_right_nested_chain() {
        let condition = col("a")
            .eq(lit(1))
            .and(col("b").eq(lit(2)).and(col("c").eq(col("d"))))
            .into_inner();
        // `b = 2` sits on the left of the inner AND and is skipped too
        assert_eq!(where_columns(&condition), used(&["c", "d"]));
    }

    #[test]
    fn test_routes_every_suffixed_table() {
        let metadata = metadata().with_variant(
            TableMetadata::new("orders", "by_region").with_dimension(Dimension::partition("region")),
        );
        let mut stmt = select(["c.id"])
            .from_as("customers_x", "c")
            .join_as("orders_raw", "o", col("o.customer_id").eq(col("c.id")))
            .where_(col("c.region").eq(lit("EU")))
            .build();
        assert!(route(&mut stmt, &metadata).unwrap());
        assert_eq!(stmt.tables()[0].name, "customers_a");
        assert_eq!(stmt.tables()[1].name, "orders_by_region");
        assert_eq!(stmt.tables()[1].alias.as_deref(), Some("o"));
    }

    struct Unavailable;

    impl MetadataProvider for Unavailable {
        fn get_table_variants(&self, base_name: &str) -> SchemaResult<Vec<TableMetadata>> {
            Err(SchemaError::Unavailable {
                table: base_name.to_string(),
                message: "catalog offline".to_string(),
            })
        }
    }

    #[test]
    fn test_metadata_failure_propagates_without_mutation() {
        let mut stmt = select(["id"])
            .from("customers_x")
            .where_(col("region").eq(lit("NA")))
            .build();
        let original = stmt.clone();
        let err = route(&mut stmt, &Unavailable).unwrap_err();
        assert!(matches!(err, Error::Metadata { ref table, .. } if table == "customers"));
        assert_eq!(stmt, original);
    }
}
