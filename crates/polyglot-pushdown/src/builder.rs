//! Fluent AST Builder API
//!
//! Provides a programmatic way to construct [`SelectStatement`] and
//! [`Expression`] trees. Parsing SQL text is out of scope for this crate, so
//! the builder is how tests, tools and embedding code assemble queries.
//!
//! # Examples
//!
//! ```
//! use polyglot_pushdown::builder::*;
//!
//! // SELECT c.id FROM customers AS c WHERE c.region = 'NA' LIMIT 10
//! let stmt = select([col("c.id")])
//!     .from_as("customers", "c")
//!     .where_(col("c.region").eq(lit("NA")))
//!     .limit(10)
//!     .build();
//! assert_eq!(
//!     stmt.to_string(),
//!     "SELECT c.id FROM customers AS c WHERE c.region = 'NA' LIMIT 10"
//! );
//! ```

use crate::expressions::*;

// ---------------------------------------------------------------------------
// Expression helpers
// ---------------------------------------------------------------------------

/// Create a column reference expression.
///
/// If `name` contains a dot, it is split on the **last** `.` to produce a
/// table-qualified column (`"c.id"` becomes `c.id`).
pub fn col(name: &str) -> Expr {
    match name.rsplit_once('.') {
        Some((table, column)) => Expr(Expression::qualified_column(table, column)),
        None => Expr(Expression::column(name)),
    }
}

/// Create a literal expression from any type implementing [`IntoLiteral`].
pub fn lit<V: IntoLiteral>(value: V) -> Expr {
    Expr(Expression::Literal(value.into_literal()))
}

pub fn date(value: &str) -> Expr {
    Expr(Expression::Literal(Literal::date(value)))
}

pub fn timestamp(value: &str) -> Expr {
    Expr(Expression::Literal(Literal::timestamp(value)))
}

pub fn null() -> Expr {
    Expr(Expression::null())
}

/// Create a star (`*`) expression.
pub fn star() -> Expr {
    Expr(Expression::Star)
}

/// Create a function call expression.
pub fn func(name: &str, args: impl IntoIterator<Item = Expr>) -> Expr {
    Expr(Expression::function(
        name,
        args.into_iter().map(|a| a.0).collect(),
    ))
}

/// `COUNT(expr)`
pub fn count(expr: Expr) -> Expr {
    func("COUNT", [expr])
}

/// `COUNT(*)`
pub fn count_star() -> Expr {
    func("COUNT", [star()])
}

/// `COUNT(DISTINCT expr)`
pub fn count_distinct(expr: Expr) -> Expr {
    let mut call = FunctionCall::new("COUNT", vec![expr.0]);
    call.distinct = true;
    Expr(Expression::FunctionCall(Box::new(call)))
}

pub fn and(left: Expr, right: Expr) -> Expr {
    left.and(right)
}

pub fn or(left: Expr, right: Expr) -> Expr {
    left.or(right)
}

/// Types that convert into a [`Literal`].
pub trait IntoLiteral {
    fn into_literal(self) -> Literal;
}

impl IntoLiteral for &str {
    fn into_literal(self) -> Literal {
        Literal::string(self)
    }
}

impl IntoLiteral for String {
    fn into_literal(self) -> Literal {
        Literal::string(self)
    }
}

impl IntoLiteral for i32 {
    fn into_literal(self) -> Literal {
        Literal::number(self)
    }
}

impl IntoLiteral for i64 {
    fn into_literal(self) -> Literal {
        Literal::number(self)
    }
}

impl IntoLiteral for f64 {
    fn into_literal(self) -> Literal {
        Literal::number(self)
    }
}

impl IntoLiteral for bool {
    fn into_literal(self) -> Literal {
        Literal::boolean(self)
    }
}

/// Types that convert into an [`Expr`]. Strings become column references.
pub trait IntoExpr {
    fn into_expr(self) -> Expr;
}

impl IntoExpr for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl IntoExpr for Expression {
    fn into_expr(self) -> Expr {
        Expr(self)
    }
}

impl IntoExpr for &str {
    fn into_expr(self) -> Expr {
        col(self)
    }
}

/// A thin wrapper around [`Expression`] that provides fluent operator methods.
#[derive(Debug, Clone)]
pub struct Expr(pub Expression);

impl Expr {
    /// Consume this wrapper and return the inner [`Expression`] node.
    pub fn into_inner(self) -> Expression {
        self.0
    }

    fn binary(self, operator: BinaryOperator, other: Expr) -> Expr {
        Expr(Expression::binary(self.0, operator, other.0))
    }

    pub fn eq(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::Eq, other)
    }

    pub fn neq(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::Neq, other)
    }

    pub fn lt(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::Lt, other)
    }

    pub fn lte(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::Lte, other)
    }

    pub fn gt(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::Gt, other)
    }

    pub fn gte(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::Gte, other)
    }

    pub fn like(self, pattern: Expr) -> Expr {
        self.binary(BinaryOperator::Like, pattern)
    }

    pub fn and(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::And, other)
    }

    pub fn or(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::Or, other)
    }

    pub fn add(self, other: Expr) -> Expr {
        self.binary(BinaryOperator::Add, other)
    }

    /// Produce a `self IN (values...)` membership test.
    ///
    /// Non-column receivers are kept as an equality chain instead, since
    /// [`InExpression`] only tests columns.
    pub fn in_list(self, values: impl IntoIterator<Item = Expr>) -> Expr {
        let values: Vec<Expression> = values.into_iter().map(|v| v.0).collect();
        match self.0 {
            Expression::ColumnReference(column) => Expr(Expression::in_list(column, values)),
            other => {
                let chain = values
                    .into_iter()
                    .map(|v| Expression::binary(other.clone(), BinaryOperator::Eq, v))
                    .reduce(|acc, next| Expression::binary(acc, BinaryOperator::Or, next));
                Expr(chain.unwrap_or(other))
            }
        }
    }
}

impl From<Expr> for Expression {
    fn from(expr: Expr) -> Self {
        expr.0
    }
}

// ---------------------------------------------------------------------------
// Query builders
// ---------------------------------------------------------------------------

/// Start building a SELECT statement with the given select list.
pub fn select<I, E>(expressions: I) -> SelectBuilder
where
    I: IntoIterator<Item = E>,
    E: IntoExpr,
{
    let mut builder = SelectBuilder::default();
    builder.select.select_list = expressions.into_iter().map(|e| e.into_expr().0).collect();
    builder
}

/// Fluent builder for [`SelectStatement`].
#[derive(Debug, Clone, Default)]
pub struct SelectBuilder {
    select: SelectStatement,
}

impl SelectBuilder {
    fn push_table(mut self, table: TableReference) -> Self {
        self.select
            .from
            .get_or_insert_with(FromClause::default)
            .tables
            .push(table);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.select.distinct = true;
        self
    }

    /// Add a FROM entry without alias
    pub fn from(self, table: &str) -> Self {
        self.push_table(TableReference::new(table))
    }

    pub fn from_as(self, table: &str, alias: &str) -> Self {
        self.push_table(TableReference::new(table).with_alias(alias))
    }

    /// `INNER JOIN table ON condition`
    pub fn join(self, table: &str, on: Expr) -> Self {
        self.push_table(TableReference::new(table).joined(JoinType::Inner, Some(on.0)))
    }

    /// `INNER JOIN table AS alias ON condition`
    pub fn join_as(self, table: &str, alias: &str, on: Expr) -> Self {
        self.push_table(
            TableReference::new(table)
                .with_alias(alias)
                .joined(JoinType::Inner, Some(on.0)),
        )
    }

    /// `LEFT JOIN table AS alias ON condition`
    pub fn left_join_as(self, table: &str, alias: &str, on: Expr) -> Self {
        self.push_table(
            TableReference::new(table)
                .with_alias(alias)
                .joined(JoinType::Left, Some(on.0)),
        )
    }

    pub fn cross_join(self, table: &str) -> Self {
        self.push_table(TableReference::new(table).joined(JoinType::Cross, None))
    }

    pub fn where_(mut self, condition: Expr) -> Self {
        self.select.where_clause = Some(WhereClause::new(condition.0));
        self
    }

    pub fn group_by<I, E>(mut self, expressions: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: IntoExpr,
    {
        self.select.group_by = expressions.into_iter().map(|e| e.into_expr().0).collect();
        self
    }

    pub fn having(mut self, condition: Expr) -> Self {
        self.select.having = Some(condition.0);
        self
    }

    pub fn order_by<I, E>(mut self, expressions: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: IntoExpr,
    {
        self.select.order_by = expressions
            .into_iter()
            .map(|e| OrderByItem {
                expression: e.into_expr().0,
                descending: false,
            })
            .collect();
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.select.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.select.offset = Some(offset);
        self
    }

    pub fn build(self) -> SelectStatement {
        self.select
    }
}
