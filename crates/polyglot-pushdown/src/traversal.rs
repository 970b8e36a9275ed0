//! Tree traversal utilities for the query AST.
//!
//! # Visitors
//!
//! [`Visitor`] is the double-dispatch contract: one method per node category
//! and an [`Accept::accept`] on every node that calls the matching method. The
//! visitor picks its own `Output`. The `walk_*` functions descend into the
//! children of a node for visitors that only need to observe the tree.
//!
//! # Iteration
//!
//! [`DfsIter`] walks an expression depth-first (pre-order). It is the
//! building block for [`columns`] and the other read-only helpers.
//!
//! # Conjuncts
//!
//! [`conjuncts`] flattens nested `AND` chains and [`conjunction`] folds a list
//! back into a left-deep `AND`.

use crate::expressions::{
    BinaryOperator, ColumnReference, Expression, FromClause, SelectStatement, WhereClause,
};
use crate::federation::FederatedTableReference;

/// Double-dispatch visitor over the query AST.
pub trait Visitor {
    type Output;

    fn visit_select(&mut self, select: &SelectStatement) -> Self::Output;
    fn visit_from(&mut self, from: &FromClause) -> Self::Output;
    fn visit_where(&mut self, where_clause: &WhereClause) -> Self::Output;
    fn visit_expression(&mut self, expr: &Expression) -> Self::Output;
    fn visit_federated_table(&mut self, table: &FederatedTableReference) -> Self::Output;
}

/// Nodes that can be visited.
pub trait Accept {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Output;
}

impl Accept for SelectStatement {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_select(self)
    }
}

impl Accept for FromClause {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_from(self)
    }
}

impl Accept for WhereClause {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_where(self)
    }
}

impl Accept for Expression {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_expression(self)
    }
}

impl Accept for FederatedTableReference {
    fn accept<V: Visitor>(&self, visitor: &mut V) -> V::Output {
        visitor.visit_federated_table(self)
    }
}

/// Visit every clause of a statement in source order.
pub fn walk_select<V: Visitor<Output = ()>>(visitor: &mut V, select: &SelectStatement) {
    for expr in &select.select_list {
        visitor.visit_expression(expr);
    }
    if let Some(from) = &select.from {
        visitor.visit_from(from);
    }
    if let Some(where_clause) = &select.where_clause {
        visitor.visit_where(where_clause);
    }
    for expr in &select.group_by {
        visitor.visit_expression(expr);
    }
    if let Some(having) = &select.having {
        visitor.visit_expression(having);
    }
    for item in &select.order_by {
        visitor.visit_expression(&item.expression);
    }
}

/// Visit the join conditions of a FROM clause.
pub fn walk_from<V: Visitor<Output = ()>>(visitor: &mut V, from: &FromClause) {
    for table in &from.tables {
        if let Some(condition) = &table.join_condition {
            visitor.visit_expression(condition);
        }
    }
}

pub fn walk_where<V: Visitor<Output = ()>>(visitor: &mut V, where_clause: &WhereClause) {
    visitor.visit_expression(&where_clause.condition);
}

/// Visit the direct children of an expression.
pub fn walk_expression<V: Visitor<Output = ()>>(visitor: &mut V, expr: &Expression) {
    for child in children(expr) {
        visitor.visit_expression(child);
    }
}

/// Direct children of an expression, left to right.
pub fn children(expr: &Expression) -> Vec<&Expression> {
    match expr {
        Expression::BinaryExpression(b) => vec![&b.left, &b.right],
        Expression::FunctionCall(f) => f.args.iter().collect(),
        Expression::InExpression(in_expr) => in_expr.values.iter().collect(),
        Expression::ColumnReference(_) | Expression::Literal(_) | Expression::Star => Vec::new(),
    }
}

/// Depth-first (pre-order) iterator over an expression tree.
pub struct DfsIter<'a> {
    stack: Vec<&'a Expression>,
}

impl<'a> DfsIter<'a> {
    pub fn new(root: &'a Expression) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a> Iterator for DfsIter<'a> {
    type Item = &'a Expression;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Push in reverse so the leftmost child is visited first
        self.stack.extend(children(node).into_iter().rev());
        Some(node)
    }
}

/// All column references in an expression, in pre-order.
///
/// The column of an `IN` predicate is reported before its values.
pub fn columns(expr: &Expression) -> Vec<&ColumnReference> {
    let mut out = Vec::new();
    for node in DfsIter::new(expr) {
        match node {
            Expression::ColumnReference(c) => out.push(c),
            Expression::InExpression(in_expr) => out.push(&in_expr.column),
            _ => {}
        }
    }
    out
}

/// Flatten nested `AND` chains into their conjuncts.
pub fn conjuncts(expr: &Expression) -> Vec<&Expression> {
    match expr {
        Expression::BinaryExpression(b) if b.operator == BinaryOperator::And => {
            let mut out = conjuncts(&b.left);
            out.extend(conjuncts(&b.right));
            out
        }
        other => vec![other],
    }
}

/// Fold expressions into a left-deep `AND` chain. `None` for an empty list.
pub fn conjunction(exprs: Vec<Expression>) -> Option<Expression> {
    exprs
        .into_iter()
        .reduce(|acc, next| Expression::binary(acc, BinaryOperator::And, next))
}

/// Visitor that gathers every column reference in a statement.
#[derive(Debug, Default)]
pub struct ColumnCollector {
    pub columns: Vec<ColumnReference>,
}

impl ColumnCollector {
    pub fn collect(select: &SelectStatement) -> Vec<ColumnReference> {
        let mut collector = Self::default();
        select.accept(&mut collector);
        collector.columns
    }
}

impl Visitor for ColumnCollector {
    type Output = ();

    fn visit_select(&mut self, select: &SelectStatement) {
        walk_select(self, select);
    }

    fn visit_from(&mut self, from: &FromClause) {
        walk_from(self, from);
    }

    fn visit_where(&mut self, where_clause: &WhereClause) {
        walk_where(self, where_clause);
    }

    fn visit_expression(&mut self, expr: &Expression) {
        self.columns.extend(columns(expr).into_iter().cloned());
    }

    fn visit_federated_table(&mut self, _table: &FederatedTableReference) {}
}
