//! SQL Expression AST (Abstract Syntax Tree).
//!
//! This module defines the node types the optimizer and the federated
//! pushdown analyzer operate on. The tree is produced by an external parser
//! and handed back to an external dialect renderer; this crate only walks and
//! rewrites it.
//!
//! # Architecture
//!
//! The central type is [`Expression`], a closed tagged enum with one variant
//! per expression kind. Every traversal site matches it exhaustively, so
//! adding a variant is a compile error until each site handles it.
//!
//! | Group | Types | Purpose |
//! |---|---|---|
//! | **Statement** | [`SelectStatement`] | Root node, owned by the caller |
//! | **Clauses** | [`FromClause`], [`WhereClause`], [`OrderByItem`] | Query clauses |
//! | **Sources** | [`TableReference`], [`JoinType`] | FROM/JOIN entries in source order |
//! | **Expressions** | [`Expression`], [`BinaryExpression`], [`ColumnReference`], [`Literal`], [`FunctionCall`], [`InExpression`] | Scalar and boolean expressions |
//!
//! # JSON
//!
//! Expressions serialize with a `"type"` discriminator (`binary_expression`,
//! `column_reference`, `literal`, `function_call`, `in_expression`, `star`).
//! Join types and literal types serialize as upper-case names. This is the
//! wire format used by inspection tooling.
//!
//! # Display
//!
//! Every node implements [`fmt::Display`] with a generic SQL rendering. It is
//! meant for logging and for the literal value-fetch queries built by the
//! federation analyzer, not as a dialect-aware generator.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Represent any SQL scalar or boolean expression.
///
/// Each node owns its children exclusively; there is no sharing between
/// subtrees and no parent pointers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expression {
    BinaryExpression(Box<BinaryExpression>),
    ColumnReference(ColumnReference),
    Literal(Literal),
    FunctionCall(Box<FunctionCall>),
    InExpression(Box<InExpression>),
    Star,
}

impl Expression {
    /// Unqualified column reference
    pub fn column(name: impl Into<String>) -> Self {
        Expression::ColumnReference(ColumnReference::new(name))
    }

    /// Table-qualified column reference
    pub fn qualified_column(table: impl Into<String>, name: impl Into<String>) -> Self {
        Expression::ColumnReference(ColumnReference::qualified(table, name))
    }

    /// Single-quoted string literal
    pub fn string(value: impl Into<String>) -> Self {
        Expression::Literal(Literal::string(value))
    }

    /// Numeric literal, kept as its source text
    pub fn number(value: impl ToString) -> Self {
        Expression::Literal(Literal::number(value))
    }

    pub fn boolean(value: bool) -> Self {
        Expression::Literal(Literal::boolean(value))
    }

    pub fn null() -> Self {
        Expression::Literal(Literal::null())
    }

    pub fn star() -> Self {
        Expression::Star
    }

    /// Binary expression `left <op> right`
    pub fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Self {
        Expression::BinaryExpression(Box::new(BinaryExpression::new(left, operator, right)))
    }

    /// Function call with positional arguments
    pub fn function(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::FunctionCall(Box::new(FunctionCall::new(name, args)))
    }

    pub fn in_list(column: ColumnReference, values: Vec<Expression>) -> Self {
        Expression::InExpression(Box::new(InExpression { column, values }))
    }

    pub fn as_column(&self) -> Option<&ColumnReference> {
        match self {
            Expression::ColumnReference(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&BinaryExpression> {
        match self {
            Expression::BinaryExpression(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Expression::Literal(l) => Some(l),
            _ => None,
        }
    }

    /// Whether this is a binary expression with the given operator
    pub fn is_operator(&self, operator: BinaryOperator) -> bool {
        matches!(self, Expression::BinaryExpression(b) if b.operator == operator)
    }

    /// Serialize to the JSON inspection format
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::serialization("encoding expression", e))
    }

    /// Restore an expression from the JSON inspection format
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::serialization("decoding expression", e))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::BinaryExpression(b) => write!(f, "{}", b),
            Expression::ColumnReference(c) => write!(f, "{}", c),
            Expression::Literal(l) => write!(f, "{}", l),
            Expression::FunctionCall(func) => write!(f, "{}", func),
            Expression::InExpression(in_expr) => write!(f, "{}", in_expr),
            Expression::Star => write!(f, "*"),
        }
    }
}

/// Binary operators understood by the rewrite rules.
///
/// Serialized as the SQL token so JSON dumps read naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<>", alias = "!=")]
    Neq,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "LIKE")]
    Like,
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::Neq => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::Lte => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Gte => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Like => "LIKE",
        }
    }

    /// Comparison operators produce a boolean from two scalars
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::Neq
                | BinaryOperator::Lt
                | BinaryOperator::Lte
                | BinaryOperator::Gt
                | BinaryOperator::Gte
                | BinaryOperator::Like
        )
    }

    fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::Eq
            | BinaryOperator::Neq
            | BinaryOperator::Lt
            | BinaryOperator::Lte
            | BinaryOperator::Gt
            | BinaryOperator::Gte
            | BinaryOperator::Like => 3,
            BinaryOperator::Add | BinaryOperator::Sub => 4,
            BinaryOperator::Mul | BinaryOperator::Div => 5,
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represent a binary operation `left <operator> right`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryExpression {
    pub left: Expression,
    pub operator: BinaryOperator,
    pub right: Expression,
}

impl BinaryExpression {
    pub fn new(left: Expression, operator: BinaryOperator, right: Expression) -> Self {
        Self {
            left,
            operator,
            right,
        }
    }
}

impl fmt::Display for BinaryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precedence = self.operator.precedence();
        write_operand(f, &self.left, precedence)?;
        write!(f, " {} ", self.operator)?;
        write_operand(f, &self.right, precedence)
    }
}

// Parenthesize operands that bind looser than their parent.
fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Expression, parent: u8) -> fmt::Result {
    match operand {
        Expression::BinaryExpression(b) if b.operator.precedence() < parent => {
            write!(f, "({})", b)
        }
        other => write!(f, "{}", other),
    }
}

/// Represent a column reference, optionally qualified by a table name or alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnReference {
    /// Optional table qualifier (e.g. `c` in `c.status`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// The column name
    pub column: String,
}

impl ColumnReference {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            table: None,
            column: column.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            column: column.into(),
        }
    }

    /// `table.column` when qualified, bare `column` otherwise
    pub fn qualified_name(&self) -> String {
        match &self.table {
            Some(table) => format!("{}.{}", table, self.column),
            None => self.column.clone(),
        }
    }

    /// Copy of this reference without its table qualifier
    pub fn unqualified(&self) -> Self {
        Self::new(self.column.clone())
    }
}

impl fmt::Display for ColumnReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// Kind of a literal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LiteralType {
    String,
    Number,
    Boolean,
    Null,
    Date,
    Timestamp,
    #[default]
    Unknown,
}

/// Represent a literal value.
///
/// Values are stored as their source text so numeric precision survives a
/// round-trip. The kind is serialized as `literal_type` because `type` is the
/// node discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub value: String,
    #[serde(default)]
    pub literal_type: LiteralType,
}

impl Literal {
    pub fn new(value: impl Into<String>, literal_type: LiteralType) -> Self {
        Self {
            value: value.into(),
            literal_type,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(value, LiteralType::String)
    }

    pub fn number(value: impl ToString) -> Self {
        Self::new(value.to_string(), LiteralType::Number)
    }

    pub fn boolean(value: bool) -> Self {
        Self::new(if value { "TRUE" } else { "FALSE" }, LiteralType::Boolean)
    }

    pub fn null() -> Self {
        Self::new("NULL", LiteralType::Null)
    }

    pub fn date(value: impl Into<String>) -> Self {
        Self::new(value, LiteralType::Date)
    }

    pub fn timestamp(value: impl Into<String>) -> Self {
        Self::new(value, LiteralType::Timestamp)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.literal_type {
            LiteralType::String => write!(f, "'{}'", self.value.replace('\'', "''")),
            LiteralType::Number | LiteralType::Unknown => f.write_str(&self.value),
            LiteralType::Boolean => f.write_str(&self.value.to_uppercase()),
            LiteralType::Null => f.write_str("NULL"),
            LiteralType::Date => write!(f, "DATE '{}'", self.value),
            LiteralType::Timestamp => write!(f, "TIMESTAMP '{}'", self.value),
        }
    }
}

/// Represent a function call such as `COUNT(DISTINCT id)` or `UPPER(name)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Vec<Expression>,
    #[serde(default)]
    pub distinct: bool,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Self {
            name: name.into(),
            args,
            distinct: false,
        }
    }

    /// Case-insensitive name comparison
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        write_list(f, &self.args)?;
        f.write_str(")")
    }
}

/// Represent `column IN (v1, v2, ...)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InExpression {
    pub column: ColumnReference,
    pub values: Vec<Expression>,
}

impl fmt::Display for InExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} IN (", self.column)?;
        write_list(f, &self.values)?;
        f.write_str(")")
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Join type of a FROM-list entry.
///
/// The first entry of a FROM list has no join and uses [`JoinType::None`],
/// which serializes as `UNKNOWN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinType {
    #[default]
    #[serde(rename = "UNKNOWN", alias = "NONE")]
    None,
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinType {
    fn keyword(&self) -> Option<&'static str> {
        match self {
            JoinType::None => None,
            JoinType::Inner => Some("INNER JOIN"),
            JoinType::Left => Some("LEFT JOIN"),
            JoinType::Right => Some("RIGHT JOIN"),
            JoinType::Full => Some("FULL JOIN"),
            JoinType::Cross => Some("CROSS JOIN"),
        }
    }
}

/// Represent one FROM or JOIN entry.
///
/// `name` may be dotted (`dataset.table`). The join condition belongs to the
/// entry it is attached to and relates it to entries earlier in the list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableReference {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default)]
    pub join_type: JoinType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_condition: Option<Expression>,
}

impl TableReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            join_type: JoinType::None,
            join_condition: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn joined(mut self, join_type: JoinType, condition: Option<Expression>) -> Self {
        self.join_type = join_type;
        self.join_condition = condition;
        self
    }

    /// The name columns use to qualify this table: the alias if present
    pub fn reference_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Last dotted segment of the table name
    pub fn table_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Whether a column qualifier refers to this table (alias, full name or
    /// unqualified table name, compared case-insensitively)
    pub fn matches_qualifier(&self, qualifier: &str) -> bool {
        if let Some(alias) = &self.alias {
            if alias.eq_ignore_ascii_case(qualifier) {
                return true;
            }
        }
        self.name.eq_ignore_ascii_case(qualifier) || self.table_name().eq_ignore_ascii_case(qualifier)
    }

    /// Whether a column reference is qualified with this table
    pub fn owns_column(&self, column: &ColumnReference) -> bool {
        column
            .table
            .as_deref()
            .is_some_and(|qualifier| self.matches_qualifier(qualifier))
    }
}

impl fmt::Display for TableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(alias) = &self.alias {
            write!(f, " AS {}", alias)?;
        }
        Ok(())
    }
}

/// FROM clause. Entry order is source order and is never changed by rewrites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FromClause {
    pub tables: Vec<TableReference>,
}

impl FromClause {
    pub fn new(tables: Vec<TableReference>) -> Self {
        Self { tables }
    }
}

impl fmt::Display for FromClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, table) in self.tables.iter().enumerate() {
            match (i, table.join_type.keyword()) {
                (0, _) => write!(f, "{}", table)?,
                (_, None) => write!(f, ", {}", table)?,
                (_, Some(keyword)) => write!(f, " {} {}", keyword, table)?,
            }
            if i > 0 {
                if let Some(condition) = &table.join_condition {
                    write!(f, " ON {}", condition)?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhereClause {
    pub condition: Expression,
}

impl WhereClause {
    pub fn new(condition: Expression) -> Self {
        Self { condition }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByItem {
    pub expression: Expression,
    #[serde(default)]
    pub descending: bool,
}

/// Root node of a query.
///
/// Rewrite rules mutate it in place. A rule either replaces a subtree
/// completely or returns an error before touching it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SelectStatement {
    pub select_list: Vec<Expression>,
    #[serde(default)]
    pub distinct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<FromClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<WhereClause>,
    #[serde(default)]
    pub group_by: Vec<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub having: Option<Expression>,
    #[serde(default)]
    pub order_by: Vec<OrderByItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

impl SelectStatement {
    pub fn new() -> Self {
        Self::default()
    }

    /// FROM-list entries in source order (empty without a FROM clause)
    pub fn tables(&self) -> &[TableReference] {
        self.from.as_ref().map(|f| f.tables.as_slice()).unwrap_or(&[])
    }

    pub fn first_table(&self) -> Option<&TableReference> {
        self.tables().first()
    }

    pub fn where_condition(&self) -> Option<&Expression> {
        self.where_clause.as_ref().map(|w| &w.condition)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::serialization("encoding select statement", e))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::serialization("encoding select statement", e))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::serialization("decoding select statement", e))
    }
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        write_list(f, &self.select_list)?;
        if let Some(from) = &self.from {
            write!(f, " FROM {}", from)?;
        }
        if let Some(where_clause) = &self.where_clause {
            write!(f, " WHERE {}", where_clause.condition)?;
        }
        if !self.group_by.is_empty() {
            f.write_str(" GROUP BY ")?;
            write_list(f, &self.group_by)?;
        }
        if let Some(having) = &self.having {
            write!(f, " HAVING {}", having)?;
        }
        if !self.order_by.is_empty() {
            f.write_str(" ORDER BY ")?;
            for (i, item) in self.order_by.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", item.expression)?;
                if item.descending {
                    f.write_str(" DESC")?;
                }
            }
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {}", limit)?;
        }
        if let Some(offset) = self.offset {
            write!(f, " OFFSET {}", offset)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_reference_json() {
        let expr = Expression::qualified_column("c", "status");
        let value = serde_json::to_value(&expr).unwrap();
        assert_eq!(
            value,
            json!({"type": "column_reference", "table": "c", "column": "status"})
        );
    }

    #[test]
    fn test_binary_expression_json() {
        let expr = Expression::binary(
            Expression::column("region"),
            BinaryOperator::Eq,
            Expression::string("NA"),
        );
        let value = serde_json::to_value(&expr).unwrap();
        assert_eq!(value["type"], "binary_expression");
        assert_eq!(value["operator"], "=");
        assert_eq!(value["right"]["type"], "literal");
        assert_eq!(value["right"]["literal_type"], "STRING");
        assert_eq!(value["right"]["value"], "NA");
    }

    #[test]
    fn test_star_and_function_json() {
        let expr = Expression::function("COUNT", vec![Expression::star()]);
        let value = serde_json::to_value(&expr).unwrap();
        assert_eq!(
            value,
            json!({"type": "function_call", "name": "COUNT", "args": [{"type": "star"}], "distinct": false})
        );
    }

    #[test]
    fn test_join_type_names() {
        assert_eq!(serde_json::to_value(JoinType::Inner).unwrap(), "INNER");
        assert_eq!(serde_json::to_value(JoinType::Cross).unwrap(), "CROSS");
        assert_eq!(serde_json::to_value(JoinType::None).unwrap(), "UNKNOWN");
        let parsed: JoinType = serde_json::from_value(json!("NONE")).unwrap();
        assert_eq!(parsed, JoinType::None);
    }

    #[test]
    fn test_literal_type_names() {
        let names: Vec<_> = [
            LiteralType::String,
            LiteralType::Number,
            LiteralType::Boolean,
            LiteralType::Null,
            LiteralType::Date,
            LiteralType::Timestamp,
            LiteralType::Unknown,
        ]
        .iter()
        .map(|t| serde_json::to_value(t).unwrap())
        .collect();
        assert_eq!(
            names,
            vec!["STRING", "NUMBER", "BOOLEAN", "NULL", "DATE", "TIMESTAMP", "UNKNOWN"]
        );
    }

    #[test]
    fn test_statement_json_preserves_nodes() {
        let stmt = SelectStatement {
            select_list: vec![Expression::function("COUNT", vec![Expression::star()])],
            from: Some(FromClause::new(vec![
                TableReference::new("orders").with_alias("o"),
                TableReference::new("customers").with_alias("c").joined(
                    JoinType::Left,
                    Some(Expression::binary(
                        Expression::qualified_column("o", "customer_id"),
                        BinaryOperator::Eq,
                        Expression::qualified_column("c", "id"),
                    )),
                ),
            ])),
            where_clause: Some(WhereClause::new(Expression::in_list(
                ColumnReference::new("region"),
                vec![Expression::string("NA"), Expression::string("EU")],
            ))),
            limit: Some(10),
            ..Default::default()
        };
        let json = stmt.to_json().unwrap();
        assert!(json.contains("\"type\":\"in_expression\""));
        assert!(json.contains("\"join_type\":\"LEFT\""));
        assert_eq!(SelectStatement::from_json(&json).unwrap(), stmt);
    }

    #[test]
    fn test_from_json_error_has_context() {
        let err = Expression::from_json(r#"{"type": "subquery"}"#).unwrap_err();
        assert!(err.to_string().starts_with("Serialization error: decoding expression"));
    }

    #[test]
    fn test_display_parenthesizes_or_under_and() {
        let expr = Expression::binary(
            Expression::binary(
                Expression::column("a"),
                BinaryOperator::Or,
                Expression::column("b"),
            ),
            BinaryOperator::And,
            Expression::column("c"),
        );
        assert_eq!(expr.to_string(), "(a OR b) AND c");
    }

    #[test]
    fn test_display_literals() {
        assert_eq!(Literal::string("O'Brien").to_string(), "'O''Brien'");
        assert_eq!(Literal::number(42).to_string(), "42");
        assert_eq!(Literal::date("2024-01-15").to_string(), "DATE '2024-01-15'");
        assert_eq!(Literal::null().to_string(), "NULL");
    }

    #[test]
    fn test_display_statement() {
        let stmt = SelectStatement {
            select_list: vec![Expression::column("id")],
            distinct: true,
            from: Some(FromClause::new(vec![
                TableReference::new("a"),
                TableReference::new("b")
                    .with_alias("x")
                    .joined(JoinType::Inner, Some(Expression::binary(
                        Expression::qualified_column("a", "id"),
                        BinaryOperator::Eq,
                        Expression::qualified_column("x", "id"),
                    ))),
            ])),
            order_by: vec![OrderByItem {
                expression: Expression::column("id"),
                descending: true,
            }],
            limit: Some(5),
            ..Default::default()
        };
        assert_eq!(
            stmt.to_string(),
            "SELECT DISTINCT id FROM a INNER JOIN b AS x ON a.id = x.id ORDER BY id DESC LIMIT 5"
        );
    }

    #[test]
    fn test_matches_qualifier() {
        let table = TableReference::new("events_aqfer.impressions").with_alias("imp");
        assert!(table.matches_qualifier("imp"));
        assert!(table.matches_qualifier("IMPRESSIONS"));
        assert!(table.matches_qualifier("events_aqfer.impressions"));
        assert!(!table.matches_qualifier("c"));
        assert!(!table.owns_column(&ColumnReference::new("campaign_id")));
    }
}
