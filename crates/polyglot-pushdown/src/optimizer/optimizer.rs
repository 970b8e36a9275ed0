//! Optimizer Orchestration Module
//!
//! This module provides the main entry point for AST optimization: an
//! [`Optimizer`] value owning an ordered list of rules and an immutable
//! [`OptimizationConfig`]. Rules run in registration order, filtered by
//! phase, by the include/exclude lists, by feature flags and by per-dialect
//! policy.
//!
//! The pipeline is fail-fast: the first rule error aborts the run and is
//! returned as-is. Rewrites already applied by earlier rules stay applied;
//! use [`Optimizer::optimize_cloned`] when all-or-nothing is required.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::dialects::Dialect;
use crate::error::{Error, Result};
use crate::expressions::SelectStatement;
use crate::schema::MetadataProvider;

use super::count_distinct::CountDistinctRewrite;
use super::or_to_in::OrToIn;
use super::table_routing::TableVariantRouter;

/// Rule name of the table variant router
pub const TABLE_ROUTING: &str = "table_routing";
/// Rule name of the OR-chain to IN-list rewrite
pub const OR_TO_IN: &str = "or_to_in";
/// Rule name of the COUNT(DISTINCT key) to COUNT(*) rewrite
pub const COUNT_DISTINCT: &str = "count_distinct";

/// When a rule runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationPhase {
    /// Dialect-independent, once after parsing
    Generic,
    /// Per target dialect, right before rendering
    DialectSpecific,
}

/// Whether a dialect list names the dialects a rule runs for, or the ones it
/// never runs for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectMode {
    Include,
    Exclude,
}

/// Per-rule dialect policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialectOptimizationConfig {
    pub mode: DialectMode,
    #[serde(default)]
    pub dialects: Vec<String>,
}

impl DialectOptimizationConfig {
    pub fn include<I, S>(dialects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: DialectMode::Include,
            dialects: dialects.into_iter().map(Into::into).collect(),
        }
    }

    pub fn exclude<I, S>(dialects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: DialectMode::Exclude,
            dialects: dialects.into_iter().map(Into::into).collect(),
        }
    }

    fn lists(&self, dialect: &str) -> bool {
        self.dialects.iter().any(|d| d.eq_ignore_ascii_case(dialect))
    }

    /// Whether the policy lets a rule run for `dialect`
    pub fn applies_to(&self, dialect: &str) -> bool {
        match self.mode {
            DialectMode::Include => self.lists(dialect),
            DialectMode::Exclude => !self.lists(dialect),
        }
    }
}

/// Feature switches for the built-in rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationFlags {
    pub table_routing: bool,
    pub or_to_in: bool,
    pub count_distinct: bool,
}

impl Default for OptimizationFlags {
    fn default() -> Self {
        Self {
            table_routing: true,
            or_to_in: true,
            count_distinct: true,
        }
    }
}

impl OptimizationFlags {
    /// Flag for a rule name. Rules without a flag are always enabled.
    pub fn is_enabled(&self, rule: &str) -> bool {
        match rule {
            TABLE_ROUTING => self.table_routing,
            OR_TO_IN => self.or_to_in,
            COUNT_DISTINCT => self.count_distinct,
            _ => true,
        }
    }
}

/// Optimizer configuration.
///
/// Built once per [`Optimizer`] and never mutated during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    /// When non-empty, only these rules run
    pub include: Vec<String>,
    /// Rules that never run; wins over `include`
    pub exclude: Vec<String>,
    pub flags: OptimizationFlags,
    /// Dialect policy keyed by rule name
    pub dialects: HashMap<String, DialectOptimizationConfig>,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        let mut dialects = HashMap::new();
        dialects.insert(
            OR_TO_IN.to_string(),
            DialectOptimizationConfig::exclude(["teradata"]),
        );
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            flags: OptimizationFlags::default(),
            dialects,
        }
    }
}

impl OptimizationConfig {
    /// Load a configuration document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::config(format!("invalid optimizer config: {}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::serialization("encoding optimizer config", e))
    }

    pub fn with_include(mut self, rule: impl Into<String>) -> Self {
        self.include.push(rule.into());
        self
    }

    pub fn with_exclude(mut self, rule: impl Into<String>) -> Self {
        self.exclude.push(rule.into());
        self
    }

    pub fn with_flags(mut self, flags: OptimizationFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_dialect_config(
        mut self,
        rule: impl Into<String>,
        config: DialectOptimizationConfig,
    ) -> Self {
        self.dialects.insert(rule.into(), config);
        self
    }
}

/// Whether the include/exclude lists let a rule run.
///
/// Exclusion wins. An empty include list admits every rule; a non-empty one
/// admits only its members.
pub fn should_apply_optimization(name: &str, config: &OptimizationConfig) -> bool {
    if config.exclude.iter().any(|r| r == name) {
        return false;
    }
    config.include.is_empty() || config.include.iter().any(|r| r == name)
}

/// Whether the per-dialect policy lets a rule run for `dialect`.
///
/// Rules without a policy run for every dialect.
pub fn should_apply_to_dialect(name: &str, dialect: &str, config: &OptimizationConfig) -> bool {
    config
        .dialects
        .get(name)
        .map_or(true, |policy| policy.applies_to(dialect))
}

/// What a rule sees besides the tree
pub struct RuleContext<'a> {
    pub dialect: &'a Dialect,
    pub metadata: &'a dyn MetadataProvider,
}

/// A single rewrite rule.
///
/// `apply` gets exclusive access to the statement and reports whether it
/// changed anything. On error the rule must leave the subtree it was working
/// on untouched.
pub trait OptimizationRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn phase(&self) -> OptimizationPhase;

    fn description(&self) -> &'static str {
        "No description available"
    }

    fn apply(&self, statement: &mut SelectStatement, ctx: &RuleContext<'_>) -> Result<bool>;
}

/// Why a registered rule did not run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Phase,
    Disabled,
    Config,
    Dialect,
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptimizeSummary {
    /// Rules that ran and rewrote the tree
    pub applied: Vec<&'static str>,
    /// Rules that ran without changing anything
    pub unchanged: Vec<&'static str>,
    /// Rules filtered out before running
    pub skipped: Vec<(&'static str, SkipReason)>,
}

impl OptimizeSummary {
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Ordered rule pipeline.
///
/// Shared read-only across threads; each run works on the caller's tree.
pub struct Optimizer {
    rules: Vec<Box<dyn OptimizationRule>>,
    config: OptimizationConfig,
}

impl Optimizer {
    /// Optimizer without rules
    pub fn new(config: OptimizationConfig) -> Self {
        Self {
            rules: Vec::new(),
            config,
        }
    }

    /// Optimizer with the built-in rules: table routing and COUNT(DISTINCT)
    /// in the generic phase, OR-to-IN in the dialect-specific phase.
    pub fn with_default_rules(config: OptimizationConfig) -> Self {
        let mut optimizer = Self::new(config);
        optimizer.register(TableVariantRouter);
        optimizer.register(CountDistinctRewrite);
        optimizer.register(OrToIn);
        optimizer
    }

    /// Append a rule; rules run in registration order
    pub fn register<R: OptimizationRule + 'static>(&mut self, rule: R) {
        self.rules.push(Box::new(rule));
    }

    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    /// Names of the registered rules, in order
    pub fn rules(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    fn skip_reason(
        &self,
        rule: &dyn OptimizationRule,
        phase: OptimizationPhase,
        dialect: &Dialect,
    ) -> Option<SkipReason> {
        let name = rule.name();
        if rule.phase() != phase {
            Some(SkipReason::Phase)
        } else if !self.config.flags.is_enabled(name) {
            Some(SkipReason::Disabled)
        } else if !should_apply_optimization(name, &self.config) {
            Some(SkipReason::Config)
        } else if !should_apply_to_dialect(name, dialect.name(), &self.config) {
            Some(SkipReason::Dialect)
        } else {
            None
        }
    }

    /// Run every eligible rule of `phase` over `statement`, in place.
    ///
    /// Stops at the first failing rule and returns its error; the statement
    /// keeps whatever earlier rules did to it.
    pub fn optimize(
        &self,
        statement: &mut SelectStatement,
        phase: OptimizationPhase,
        dialect: &Dialect,
        metadata: &dyn MetadataProvider,
    ) -> Result<OptimizeSummary> {
        let ctx = RuleContext { dialect, metadata };
        let mut summary = OptimizeSummary::default();

        for rule in &self.rules {
            if let Some(reason) = self.skip_reason(rule.as_ref(), phase, dialect) {
                if reason != SkipReason::Phase {
                    debug!(
                        "Skipping rule '{}' for dialect {}: {:?}",
                        rule.name(),
                        dialect,
                        reason
                    );
                }
                summary.skipped.push((rule.name(), reason));
                continue;
            }

            match rule.apply(statement, &ctx) {
                Ok(true) => {
                    debug!("Rule '{}' applied ({:?} phase)", rule.name(), phase);
                    summary.applied.push(rule.name());
                }
                Ok(false) => summary.unchanged.push(rule.name()),
                Err(err) => {
                    debug!("Rule '{}' failed, aborting pipeline: {}", rule.name(), err);
                    return Err(err);
                }
            }
        }

        Ok(summary)
    }

    /// Optimize a copy of `statement`, returning it only if every rule
    /// succeeded. The input is never modified.
    pub fn optimize_cloned(
        &self,
        statement: &SelectStatement,
        phase: OptimizationPhase,
        dialect: &Dialect,
        metadata: &dyn MetadataProvider,
    ) -> Result<SelectStatement> {
        let mut copy = statement.clone();
        self.optimize(&mut copy, phase, dialect, metadata)?;
        Ok(copy)
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::with_default_rules(OptimizationConfig::default())
    }
}
