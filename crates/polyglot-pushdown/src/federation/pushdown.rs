//! Single-pass pushable join extraction
//!
//! A narrower view than [`super::FederatedQueryAnalyzer`]: it only reports
//! which joins against the federated table could be pushed down, without
//! building fetch queries or a subquery.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::dialects::Dialect;
use crate::expressions::{BinaryOperator, Expression, SelectStatement, TableReference};

use super::{is_projected, join_columns, references_table, FederatedTableReference};

/// One `federated_column = dimension_column` equality, both unqualified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinColumnPair {
    pub federated_column: String,
    pub dimension_column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushableJoin {
    pub dimension_table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_alias: Option<String>,
    pub conditions: Vec<JoinColumnPair>,
    /// The dimension column of a single-equality join is also needed in the
    /// result. Always `false` for conjoined conditions.
    #[serde(default)]
    pub is_required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AqferPushdownInfo {
    pub federated_table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub pushable_joins: Vec<PushableJoin>,
}

/// Pushable joins of the first federated table in `statement`.
///
/// A join is pushable when its condition is a single equality between a
/// federated column and a dimension column, or an `AND` whose two direct
/// operands are such equalities. Deeper `AND` nesting and `OR` are not
/// pushable. `None` when the query has no federated table.
pub fn extract_pushdown_info(statement: &SelectStatement, dialect: &Dialect) -> Option<AqferPushdownInfo> {
    let naming = dialect.federated_naming();
    let (position, table) = statement
        .tables()
        .iter()
        .enumerate()
        .find(|(_, t)| naming.is_federated(&t.name))?;
    let dataset_type = naming.dataset_type(&table.name)?;
    let federated = FederatedTableReference::new(table, dataset_type, position);

    let pushable_joins = statement
        .tables()
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != position)
        .filter_map(|(_, dimension)| {
            pushable_join(statement, &federated, table.join_condition.as_ref(), dimension)
        })
        .collect();

    Some(AqferPushdownInfo {
        federated_table: federated.table_name,
        alias: federated.alias,
        pushable_joins,
    })
}

/// The dimension's own condition is tried first. The federated entry's
/// condition is used when the federated table comes later in the FROM list
/// and its condition references the dimension.
fn pushable_join(
    statement: &SelectStatement,
    federated: &FederatedTableReference,
    federated_condition: Option<&Expression>,
    dimension: &TableReference,
) -> Option<PushableJoin> {
    let own = dimension
        .join_condition
        .as_ref()
        .and_then(|condition| classify(statement, federated, dimension, condition));
    let Some((conditions, is_required)) = own.or_else(|| {
        federated_condition
            .filter(|condition| references_table(condition, dimension))
            .and_then(|condition| classify(statement, federated, dimension, condition))
    }) else {
        trace!("Join with {} is not pushable", dimension.name);
        return None;
    };

    Some(PushableJoin {
        dimension_table: dimension.name.clone(),
        dimension_alias: dimension.alias.clone(),
        conditions,
        is_required,
    })
}

/// Column pairs of a pushable condition and whether the join is required
fn classify(
    statement: &SelectStatement,
    federated: &FederatedTableReference,
    dimension: &TableReference,
    condition: &Expression,
) -> Option<(Vec<JoinColumnPair>, bool)> {
    let pair = |expr: &Expression| {
        join_columns(expr, federated, dimension).map(|(fed, dim)| JoinColumnPair {
            federated_column: fed.column.clone(),
            dimension_column: dim.column.clone(),
        })
    };

    match condition {
        Expression::BinaryExpression(b) if b.operator == BinaryOperator::And => {
            let conditions = vec![pair(&b.left)?, pair(&b.right)?];
            Some((conditions, false))
        }
        single => {
            let p = pair(single)?;
            let required = is_projected(statement, dimension, &p.dimension_column);
            Some((vec![p], required))
        }
    }
}
