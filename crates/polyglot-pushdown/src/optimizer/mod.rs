//! Query Optimizer Module
//!
//! This module contains the rule pipeline and the built-in rewrite rules:
//! table variant routing, COUNT(DISTINCT) simplification and OR-to-IN
//! conversion.

/// COUNT(DISTINCT unique_key) to COUNT(*)
pub mod count_distinct;
/// Rule pipeline, configuration and gating
pub mod optimizer;
/// OR chains of equalities to IN lists
pub mod or_to_in;
/// Physical table variant selection
pub mod table_routing;

pub use count_distinct::CountDistinctRewrite;
/// Pipeline, rule trait, configuration types and gating functions
pub use optimizer::{
    should_apply_optimization, should_apply_to_dialect, DialectMode, DialectOptimizationConfig,
    OptimizationConfig, OptimizationFlags, OptimizationPhase, OptimizationRule, OptimizeSummary,
    Optimizer, RuleContext, SkipReason, COUNT_DISTINCT, OR_TO_IN, TABLE_ROUTING,
};
pub use or_to_in::{OrToIn, MIN_DISJUNCTS};
pub use table_routing::{select_best_variant, score_variant, where_columns, TableVariantRouter};
