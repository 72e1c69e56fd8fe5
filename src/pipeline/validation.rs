//! Validation engine for ranking configurations.
//!
//! The engine runs all registered [`ValidationRule`]s against a
//! [`RankConfig`] and collects every diagnostic into a [`ValidationReport`].
//! It never short-circuits on the first error, so users see all problems at
//! once.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use rapid_pagerank::pipeline::validation::ValidationEngine;
//!
//! let report = ValidationEngine::with_defaults().validate(&config);
//! if report.has_errors() {
//!     eprintln!("{report}");
//! }
//! ```

use std::fmt;

use serde::Serialize;

use crate::types::RankConfig;

// ─── Severity ───────────────────────────────────────────────────────────────

/// Whether a diagnostic is a hard error or a soft warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

// ─── Diagnostic ─────────────────────────────────────────────────────────────

/// Stable machine-readable category of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    OutOfRange,
    NotPositive,
    NeverConverges,
}

/// A single validation finding.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: Severity,
    pub code: IssueCode,
    /// Name of the offending configuration field
    pub field: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ValidationDiagnostic {
    pub fn error(code: IssueCode, field: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            field,
            message: message.into(),
            hint: None,
        }
    }

    pub fn warning(code: IssueCode, field: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, field, message)
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, " ({hint})")?;
        }
        Ok(())
    }
}

// ─── Report ─────────────────────────────────────────────────────────────────

/// Collected diagnostics from running all validation rules.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    /// Iterate over error-severity diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// Iterate over warning-severity diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationDiagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// Returns `true` if any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Returns `true` if there are no errors (warnings are acceptable).
    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for err in self.errors() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
            first = false;
        }
        Ok(())
    }
}

// ─── Rule trait ─────────────────────────────────────────────────────────────

/// A single validation rule that inspects a [`RankConfig`] and returns zero
/// or more diagnostics.
pub trait ValidationRule: Send + Sync {
    /// Short, stable identifier for this rule (e.g., `"damping_range"`).
    fn name(&self) -> &str;

    fn validate(&self, config: &RankConfig) -> Vec<ValidationDiagnostic>;
}

// ─── Engine ─────────────────────────────────────────────────────────────────

/// Runs a set of [`ValidationRule`]s against a [`RankConfig`].
pub struct ValidationEngine {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidationEngine {
    /// Create an empty engine with no rules.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create an engine pre-loaded with the default rule set.
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.add_rule(Box::new(DampingRangeRule));
        engine.add_rule(Box::new(PositiveCountsRule));
        engine.add_rule(Box::new(ThresholdRule));
        engine.add_rule(Box::new(NodeLimitRule));
        engine
    }

    /// Register an additional rule.
    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    /// Run all rules against `config` and return the collected report.
    pub fn validate(&self, config: &RankConfig) -> ValidationReport {
        let mut report = ValidationReport::default();
        for rule in &self.rules {
            report.diagnostics.extend(rule.validate(config));
        }
        report
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Concrete rules
// ═══════════════════════════════════════════════════════════════════════════

// ─── 1. damping strictly inside (0, 1) ──────────────────────────────────────

struct DampingRangeRule;

impl ValidationRule for DampingRangeRule {
    fn name(&self) -> &str {
        "damping_range"
    }

    fn validate(&self, config: &RankConfig) -> Vec<ValidationDiagnostic> {
        let d = config.damping;
        if d > 0.0 && d < 1.0 {
            return vec![];
        }
        vec![ValidationDiagnostic::error(
            IssueCode::OutOfRange,
            "damping",
            format!("damping must be strictly between 0 and 1, got {d}"),
        )
        .with_hint("Typical values are 0.85 or 0.9")]
    }
}

// ─── 2. counts must be positive ─────────────────────────────────────────────

struct PositiveCountsRule;

impl ValidationRule for PositiveCountsRule {
    fn name(&self) -> &str {
        "positive_counts"
    }

    fn validate(&self, config: &RankConfig) -> Vec<ValidationDiagnostic> {
        let checks: &[(&'static str, usize)] = &[
            ("max_iterations", config.max_iterations),
            ("top_k", config.top_k),
            ("threads", config.threads),
            ("max_nodes", config.max_nodes),
        ];

        checks
            .iter()
            .filter(|&&(_, value)| value == 0)
            .map(|&(field, _)| {
                ValidationDiagnostic::error(
                    IssueCode::NotPositive,
                    field,
                    format!("{field} must be greater than 0"),
                )
            })
            .collect()
    }
}

// ─── 3. convergence threshold ───────────────────────────────────────────────

struct ThresholdRule;

impl ValidationRule for ThresholdRule {
    fn name(&self) -> &str {
        "threshold"
    }

    fn validate(&self, config: &RankConfig) -> Vec<ValidationDiagnostic> {
        let eps = config.epsilon;
        if !eps.is_finite() || eps < 0.0 {
            vec![ValidationDiagnostic::error(
                IssueCode::OutOfRange,
                "epsilon",
                format!("epsilon must be a finite non-negative number, got {eps}"),
            )]
        } else if eps == 0.0 {
            vec![ValidationDiagnostic::warning(
                IssueCode::NeverConverges,
                "epsilon",
                "a threshold of 0 can never be met; every run uses all iterations",
            )
            .with_hint("Use a small positive value such as 1e-7")]
        } else {
            vec![]
        }
    }
}

// ─── 4. node limit fits the u32 id space ────────────────────────────────────

/// One more than the largest node id a `u32` can carry.
const ADDRESSABLE_NODES: u64 = u32::MAX as u64 + 1;

struct NodeLimitRule;

impl ValidationRule for NodeLimitRule {
    fn name(&self) -> &str {
        "node_limit"
    }

    fn validate(&self, config: &RankConfig) -> Vec<ValidationDiagnostic> {
        if config.max_nodes as u64 <= ADDRESSABLE_NODES {
            return vec![];
        }
        vec![ValidationDiagnostic::error(
            IssueCode::OutOfRange,
            "max_nodes",
            format!(
                "max_nodes must be at most {ADDRESSABLE_NODES}, got {}",
                config.max_nodes
            ),
        )]
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════
