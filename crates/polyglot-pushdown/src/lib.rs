//! Polyglot Pushdown - query AST optimization and federated query splitting
//!
//! This library rewrites SQL query trees produced by an external parser and
//! hands them back to an external dialect renderer.
//!
//! # Architecture
//!
//! 1. **Optimizer** - an ordered rule pipeline, gated by phase, configuration
//!    and target dialect:
//!    - table variant routing by partition and clustering metadata
//!    - `COUNT(DISTINCT unique_key)` to `COUNT(*)`
//!    - OR chains of equalities to `IN` lists
//! 2. **Federation** - splits a query over a federated table into dimension
//!    value-fetch queries for the native engine plus a subquery for the
//!    federated provider.
//!
//! Metadata comes from a caller-supplied [`MetadataProvider`].
//!
//! ```
//! use polyglot_pushdown::builder::*;
//! use polyglot_pushdown::schema::{Dimension, MappingMetadata, TableMetadata};
//! use polyglot_pushdown::{Dialect, OptimizationPhase, Optimizer};
//!
//! let metadata = MappingMetadata::new()
//!     .with_variant(TableMetadata::new("customers", "a").with_dimension(Dimension::partition("region")));
//! let mut stmt = select(["id"])
//!     .from("customers_x")
//!     .where_(col("region").eq(lit("NA")))
//!     .build();
//!
//! let optimizer = Optimizer::default();
//! optimizer
//!     .optimize(&mut stmt, OptimizationPhase::Generic, &Dialect::default(), &metadata)
//!     .unwrap();
//! assert_eq!(stmt.to_string(), "SELECT id FROM customers_a WHERE region = 'NA'");
//! ```

pub mod builder;
pub mod dialects;
pub mod error;
pub mod expressions;
pub mod federation;
pub mod optimizer;
pub mod schema;
pub mod traversal;

pub use dialects::{Dialect, DialectType, FederatedNaming};
pub use error::{Error, Result};
pub use expressions::{Expression, SelectStatement};
pub use federation::{
    extract_pushdown_info, AqferPushdownInfo, DimensionFilter, DimensionJoin,
    FederatedQueryAnalysis, FederatedQueryAnalyzer, FederatedTableReference, FilterCondition,
    JoinColumnPair, PushableJoin,
};
pub use optimizer::{
    OptimizationConfig, OptimizationFlags, OptimizationPhase, OptimizationRule, OptimizeSummary,
    Optimizer, RuleContext,
};
pub use schema::{MappingMetadata, MetadataProvider, SchemaError, TableMetadata};
pub use traversal::{Accept, ColumnCollector, DfsIter, Visitor};
