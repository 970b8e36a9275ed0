//! Three-phase federated query analysis
//!
//! 1. **Detection**: find the first FROM entry that follows the dialect's
//!    federated naming convention.
//! 2. **Recognition**: classify the joins between it and every other table.
//! 3. **Split construction**: build the dimension value-fetch queries and the
//!    subquery for the federated provider.
//!
//! The phases run once, in order. A query without a federated table is not
//! applicable and yields `None`.

use log::{debug, trace};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::dialects::{Dialect, FederatedNaming};
use crate::expressions::{
    ColumnReference, Expression, FromClause, SelectStatement, TableReference, WhereClause,
};
use crate::traversal::{columns, conjunction, conjuncts, Accept, ColumnCollector, Visitor};

use super::{
    dimension_join_columns, is_projected, join_columns, strip_qualifiers, DimensionFilter, DimensionJoin,
    FederatedTableReference, FilterCondition,
};

/// Everything needed to run a query split across the native engine and the
/// federated provider
#[derive(Debug, Clone, Serialize)]
pub struct FederatedQueryAnalysis<'a> {
    pub original: &'a SelectStatement,
    pub federated_table: FederatedTableReference,
    pub dimension_filters: Vec<DimensionFilter>,
    pub federated_subquery: SelectStatement,
}

impl FederatedQueryAnalysis<'_> {
    /// Restrict the federated subquery to the key values fetched for a
    /// dimension table by appending `<federated_column> IN (values)`.
    ///
    /// `table` is matched against the dimension aliases first, then the table
    /// names, so a table joined twice is addressed through its alias.
    /// Returns `false` when no dimension filter targets `table` or there are
    /// no values to bind.
    pub fn bind_dimension_values(&mut self, table: &str, values: Vec<Expression>) -> bool {
        if values.is_empty() {
            return false;
        }
        let by_alias = self.dimension_filters.iter().find(|f| {
            f.alias
                .as_deref()
                .is_some_and(|alias| alias.eq_ignore_ascii_case(table))
        });
        let Some(filter) = by_alias.or_else(|| {
            self.dimension_filters
                .iter()
                .find(|f| f.table_name.eq_ignore_ascii_case(table))
        }) else {
            return false;
        };

        let membership = Expression::in_list(ColumnReference::new(filter.federated_column.clone()), values);
        let condition = match self.federated_subquery.where_clause.take() {
            Some(existing) => conjunction(vec![existing.condition, membership]),
            None => Some(membership),
        };
        self.federated_subquery.where_clause = condition.map(WhereClause::new);
        true
    }
}

/// Runs the three analysis phases for one dialect's naming convention
#[derive(Debug, Clone, Copy)]
pub struct FederatedQueryAnalyzer<'d> {
    dialect: &'d Dialect,
}

impl<'d> FederatedQueryAnalyzer<'d> {
    pub fn new(dialect: &'d Dialect) -> Self {
        Self { dialect }
    }

    /// Analyze a query. `None` when it references no federated table.
    pub fn analyze<'a>(&self, statement: &'a SelectStatement) -> Option<FederatedQueryAnalysis<'a>> {
        let Some(mut federated_table) = self.detect(statement) else {
            debug!("No federated table in query for dialect {}, pushdown not applicable", self.dialect);
            return None;
        };
        federated_table.dimension_joins = self.recognize(statement, &federated_table);
        debug!(
            "Federated table {} ({}) has {} dimension join(s)",
            federated_table.table_name,
            federated_table.dataset_type,
            federated_table.dimension_joins.len()
        );
        let (dimension_filters, federated_subquery) = self.build_split(statement, &federated_table);
        Some(FederatedQueryAnalysis {
            original: statement,
            federated_table,
            dimension_filters,
            federated_subquery,
        })
    }

    /// Phase 1: the first FROM entry following the naming convention
    pub fn detect(&self, statement: &SelectStatement) -> Option<FederatedTableReference> {
        let mut detector = FederatedTableDetector {
            naming: self.dialect.federated_naming(),
        };
        statement.accept(&mut detector)
    }

    /// Phase 2: dimension joins against `federated`, in FROM order
    pub fn recognize(
        &self,
        statement: &SelectStatement,
        federated: &FederatedTableReference,
    ) -> Vec<DimensionJoin> {
        let tables = statement.tables();
        let federated_condition = tables
            .get(federated.position)
            .and_then(|t| t.join_condition.as_ref());

        let mut joins = Vec::new();
        for (idx, table) in tables.iter().enumerate() {
            if idx == federated.position {
                continue;
            }
            // The equality may be attached to either entry. An unqualified
            // side is only attributed to the entry carrying the condition.
            let own = table
                .join_condition
                .as_ref()
                .and_then(|condition| dimension_join_columns(condition, federated, table));
            let Some((fed_col, dim_col)) = own.or_else(|| {
                federated_condition.and_then(|condition| join_columns(condition, federated, table))
            }) else {
                trace!("Join with {} is not a single column equality, skipping", table.name);
                continue;
            };

            let conditions = dimension_conditions(statement, table);
            let first = conditions.first();
            let requires_callback =
                first.is_some_and(|f| is_projected(statement, table, &f.column));
            trace!(
                "Dimension join {}.{} = {}.{} ({} filter(s))",
                federated.table_name,
                fed_col.column,
                table.name,
                dim_col.column,
                conditions.len()
            );
            joins.push(DimensionJoin {
                table_name: table.name.clone(),
                alias: table.alias.clone(),
                join_column: fed_col.column.clone(),
                table_column: dim_col.column.clone(),
                filter_column: first.map(|f| f.column.clone()),
                filter_operator: first.map(|f| f.operator),
                filter_value: first.map(|f| f.value.clone()),
                requires_callback,
            });
        }
        joins
    }

    /// Phase 3: value-fetch queries per dimension and the federated subquery
    pub fn build_split(
        &self,
        statement: &SelectStatement,
        federated: &FederatedTableReference,
    ) -> (Vec<DimensionFilter>, SelectStatement) {
        let filters = federated
            .dimension_joins
            .iter()
            .map(|join| {
                let conditions = statement
                    .tables()
                    .iter()
                    .find(|t| t.name == join.table_name && t.alias == join.alias)
                    .map(|t| dimension_conditions(statement, t))
                    .unwrap_or_default();
                DimensionFilter {
                    value_fetch_sql: value_fetch_sql(join, &conditions),
                    table_name: join.table_name.clone(),
                    alias: join.alias.clone(),
                    federated_column: join.join_column.clone(),
                    conditions,
                }
            })
            .collect();

        (filters, federated_subquery(statement, federated))
    }
}

/// `SELECT DISTINCT <join column> FROM <dimension> [WHERE c1 AND c2 ...]`
fn value_fetch_sql(join: &DimensionJoin, conditions: &[FilterCondition]) -> String {
    let mut sql = format!("SELECT DISTINCT {} FROM {}", join.join_column, join.table_name);
    if !conditions.is_empty() {
        let rendered: Vec<String> = conditions.iter().map(|c| c.to_string()).collect();
        sql.push_str(" WHERE ");
        sql.push_str(&rendered.join(" AND "));
    }
    sql
}

/// WHERE conjuncts of the form `<dimension column> <cmp> <literal>`
fn dimension_conditions(statement: &SelectStatement, table: &TableReference) -> Vec<FilterCondition> {
    let Some(condition) = statement.where_condition() else {
        return Vec::new();
    };
    conjuncts(condition)
        .into_iter()
        .filter_map(|conjunct| {
            let binary = conjunct.as_binary()?;
            if !binary.operator.is_comparison() {
                return None;
            }
            let column = binary.left.as_column().filter(|c| table.owns_column(c))?;
            let value = binary.right.as_literal()?;
            Some(FilterCondition {
                column: column.column.clone(),
                operator: binary.operator,
                value: value.clone(),
            })
        })
        .collect()
}

/// Subquery over the federated table alone.
///
/// Projects every federated column the query touches plus the join columns,
/// sorted and unqualified. Keeps the WHERE conjuncts that only involve
/// federated columns.
fn federated_subquery(statement: &SelectStatement, federated: &FederatedTableReference) -> SelectStatement {
    let mut projected: BTreeSet<String> = ColumnCollector::collect(statement)
        .into_iter()
        .filter(|c| federated.owns_column(c))
        .map(|c| c.column)
        .collect();
    projected.extend(federated.dimension_joins.iter().map(|j| j.join_column.clone()));

    let select_list = if projected.is_empty() {
        vec![Expression::Star]
    } else {
        projected.into_iter().map(Expression::column).collect()
    };

    let pushed: Vec<Expression> = statement
        .where_condition()
        .map(conjuncts)
        .unwrap_or_default()
        .into_iter()
        .filter(|conjunct| {
            let refs = columns(conjunct);
            !refs.is_empty() && refs.iter().all(|c| federated.owns_column(c))
        })
        .map(strip_qualifiers)
        .collect();

    SelectStatement {
        select_list,
        from: Some(FromClause::new(vec![TableReference::new(federated.table_name.clone())])),
        where_clause: conjunction(pushed).map(WhereClause::new),
        ..SelectStatement::default()
    }
}

/// Visitor finding the first federated FROM entry
struct FederatedTableDetector<'n> {
    naming: &'n FederatedNaming,
}

impl Visitor for FederatedTableDetector<'_> {
    type Output = Option<FederatedTableReference>;

    fn visit_select(&mut self, select: &SelectStatement) -> Self::Output {
        select.from.as_ref().and_then(|from| from.accept(self))
    }

    fn visit_from(&mut self, from: &FromClause) -> Self::Output {
        from.tables.iter().enumerate().find_map(|(position, table)| {
            let dataset_type = self.naming.dataset_type(&table.name)?;
            trace!("Detected federated table {} at position {}", table.name, position);
            Some(FederatedTableReference::new(table, dataset_type, position))
        })
    }

    fn visit_where(&mut self, _where_clause: &WhereClause) -> Self::Output {
        None
    }

    fn visit_expression(&mut self, _expr: &Expression) -> Self::Output {
        None
    }

    fn visit_federated_table(&mut self, table: &FederatedTableReference) -> Self::Output {
        Some(table.clone())
    }
}
