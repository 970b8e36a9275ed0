//! OR-chain to IN-list rewrite
//!
//! Replaces `col = v1 OR col = v2 OR col = v3 ...` with `col IN (v1, v2, v3, ...)`.
//!
//! Chains with fewer than [`MIN_DISJUNCTS`] leaves are left alone. When a
//! chain mixes columns, the first column (in order of appearance) with at
//! least [`MIN_DISJUNCTS`] equalities takes over the whole chain and the
//! other disjuncts are dropped. That is only equivalent when one column owns
//! the chain; the behavior is kept as is and covered by tests.

use log::trace;

use crate::error::Result;
use crate::expressions::{BinaryOperator, ColumnReference, Expression, SelectStatement};

use super::optimizer::{OptimizationPhase, OptimizationRule, RuleContext, OR_TO_IN};

/// Smallest OR chain worth turning into an IN list
pub const MIN_DISJUNCTS: usize = 3;

/// Rewrites OR chains of equalities on one column into an IN list
#[derive(Debug, Clone, Copy, Default)]
pub struct OrToIn;

impl OptimizationRule for OrToIn {
    fn name(&self) -> &'static str {
        OR_TO_IN
    }

    fn phase(&self) -> OptimizationPhase {
        OptimizationPhase::DialectSpecific
    }

    fn description(&self) -> &'static str {
        "Convert OR chains of column equalities into IN lists"
    }

    fn apply(&self, statement: &mut SelectStatement, _ctx: &RuleContext<'_>) -> Result<bool> {
        Ok(match statement.where_clause.as_mut() {
            Some(clause) => rewrite(&mut clause.condition),
            None => false,
        })
    }
}

/// Rewrite `expr` in place, top-down. Returns whether anything changed.
///
/// OR nodes are handled as a whole chain and never descended into. Any other
/// binary node has both operands visited.
pub fn rewrite(expr: &mut Expression) -> bool {
    if expr.is_operator(BinaryOperator::Or) {
        return match collapse_or_chain(expr) {
            Some(replacement) => {
                *expr = replacement;
                true
            }
            None => false,
        };
    }
    match expr {
        Expression::BinaryExpression(binary) => {
            let left = rewrite(&mut binary.left);
            let right = rewrite(&mut binary.right);
            left || right
        }
        Expression::ColumnReference(_)
        | Expression::Literal(_)
        | Expression::FunctionCall(_)
        | Expression::InExpression(_)
        | Expression::Star => false,
    }
}

/// Leaves of an OR chain, left to right. Non-OR nodes are leaves.
pub fn or_leaves(expr: &Expression) -> Vec<&Expression> {
    let mut leaves = Vec::new();
    collect_or_leaves(expr, &mut leaves);
    leaves
}

fn collect_or_leaves<'a>(expr: &'a Expression, leaves: &mut Vec<&'a Expression>) {
    match expr {
        Expression::BinaryExpression(binary) if binary.operator == BinaryOperator::Or => {
            collect_or_leaves(&binary.left, leaves);
            collect_or_leaves(&binary.right, leaves);
        }
        other => leaves.push(other),
    }
}

struct EqualityGroup<'a> {
    key: String,
    column: &'a ColumnReference,
    values: Vec<&'a Expression>,
}

fn collapse_or_chain(chain: &Expression) -> Option<Expression> {
    let leaves = or_leaves(chain);
    if leaves.len() < MIN_DISJUNCTS {
        return None;
    }

    let mut groups: Vec<EqualityGroup<'_>> = Vec::new();
    for leaf in leaves {
        let Some(binary) = leaf.as_binary() else {
            continue;
        };
        if binary.operator != BinaryOperator::Eq {
            continue;
        }
        let Some(column) = binary.left.as_column() else {
            continue;
        };
        let key = column.qualified_name();
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.values.push(&binary.right),
            None => groups.push(EqualityGroup {
                key,
                column,
                values: vec![&binary.right],
            }),
        }
    }

    let group = groups.into_iter().find(|g| g.values.len() >= MIN_DISJUNCTS)?;
    trace!(
        "Collapsing OR chain on {} into IN list of {} values",
        group.key,
        group.values.len()
    );
    Some(Expression::in_list(
        group.column.clone(),
        group.values.into_iter().cloned().collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::*;

    fn region_chain(values: &[&str]) -> Expression {
        values
            .iter()
            .map(|v| col("region").eq(lit(*v)))
            .reduce(|acc, next| acc.or(next))
            .unwrap()
            .into_inner()
    }

    #[test]
    fn test_three_disjuncts_become_in_list() {
        let mut expr = region_chain(&["NA", "EU", "APAC"]);
        assert!(rewrite(&mut expr));
        assert_eq!(expr.to_string(), "region IN ('NA', 'EU', 'APAC')");
    }

    #[test]
    fn test_two_disjuncts_are_kept() {
        let mut expr = region_chain(&["NA", "EU"]);
        let original = expr.clone();
        assert!(!rewrite(&mut expr));
        assert_eq!(expr, original);
    }

    #[test]
    fn test_right_nested_chain_is_flattened() {
        let mut expr = col("region")
            .eq(lit("NA"))
            .or(col("region").eq(lit("EU")).or(col("region").eq(lit("APAC"))))
            .into_inner();
        assert!(rewrite(&mut expr));
        assert_eq!(expr.to_string(), "region IN ('NA', 'EU', 'APAC')");
    }

    #[test]
    fn test_mixed_columns_drop_other_disjuncts() {
        // Pins the lossy rewrite: `status = 'x'` does not survive
        let mut expr = col("region")
            .eq(lit("NA"))
            .or(col("status").eq(lit("x")))
            .or(col("region").eq(lit("EU")))
            .or(col("region").eq(lit("APAC")))
            .into_inner();
        assert!(rewrite(&mut expr));
        assert_eq!(expr.to_string(), "region IN ('NA', 'EU', 'APAC')");
    }

    #[test]
    fn test_first_qualifying_group_wins() {
        let mut expr = col("a")
            .eq(lit(1))
            .or(col("b").eq(lit(1)))
            .or(col("b").eq(lit(2)))
            .or(col("b").eq(lit(3)))
            .or(col("a").eq(lit(2)))
            .or(col("a").eq(lit(3)))
            .into_inner();
        assert!(rewrite(&mut expr));
        // `a` was seen first, so it wins even though `b` filled up earlier
        assert_eq!(expr.to_string(), "a IN (1, 2, 3)");
    }

    #[test]
    fn test_qualified_columns_group_separately() {
        let mut expr = col("c.region")
            .eq(lit("NA"))
            .or(col("region").eq(lit("EU")))
            .or(col("c.region").eq(lit("APAC")))
            .into_inner();
        assert!(!rewrite(&mut expr));
    }

    #[test]
    fn test_no_group_reaches_threshold() {
        let mut expr = col("a")
            .eq(lit(1))
            .or(col("b").eq(lit(2)))
            .or(col("a").gt(lit(3)))
            .into_inner();
        assert!(!rewrite(&mut expr));
    }

    #[test]
    fn test_chain_nested_under_and() {
        let mut expr = col("active")
            .eq(lit(true))
            .and(col("region").eq(lit("NA")).or(col("region").eq(lit("EU"))).or(col("region").eq(lit("APAC"))))
            .into_inner();
        assert!(rewrite(&mut expr));
        assert_eq!(expr.to_string(), "active = TRUE AND region IN ('NA', 'EU', 'APAC')");
    }

    #[test]
    fn test_or_leaves_order() {
        let expr = region_chain(&["NA", "EU", "APAC"]);
        let leaves: Vec<String> = or_leaves(&expr).iter().map(|e| e.to_string()).collect();
        assert_eq!(leaves, vec!["region = 'NA'", "region = 'EU'", "region = 'APAC'"]);
    }
}
