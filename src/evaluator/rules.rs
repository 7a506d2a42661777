//! Metric derivation rules.
//!
//! Each rule pairs an extractor (what to measure) with a classifier (how to
//! judge it). Rules read only the immutable evaluation context, so they can
//! run in any order; adding a rule never touches aggregation.

use crate::artifact::{LogLevel, RunRecord};
use crate::manifest::{Metric, MetricStatus};

use super::config::EvaluatorConfig;

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub record: &'a RunRecord,
    pub parse_warning_count: usize,
    pub config: &'a EvaluatorConfig,
}

/// One row of the metric table.
#[derive(Clone, Copy)]
pub struct MetricRule {
    pub name: &'static str,
    pub description: &'static str,
    pub unit: Option<&'static str>,
    /// Whether the rule emits a metric at all for this context.
    pub applies: fn(&EvaluationContext<'_>) -> bool,
    pub extract: fn(&EvaluationContext<'_>) -> Option<f64>,
    pub classify: fn(Option<f64>, &EvaluationContext<'_>) -> MetricStatus,
}

impl std::fmt::Debug for MetricRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricRule")
            .field("name", &self.name)
            .field("unit", &self.unit)
            .finish_non_exhaustive()
    }
}

impl MetricRule {
    /// Applies the rule, returning `None` when it does not apply.
    pub fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Option<Metric> {
        if !(self.applies)(ctx) {
            return None;
        }
        let value = (self.extract)(ctx);
        let status = (self.classify)(value, ctx);
        let mut metric = Metric::new(self.name, status)
            .with_optional_value(value)
            .with_description(self.description);
        if let Some(unit) = self.unit {
            metric = metric.with_unit(unit);
        }
        Some(metric)
    }
}

/// The standard metric set, in manifest order.
pub const STANDARD_RULES: &[MetricRule] = &[
    MetricRule {
        name: "completion",
        description: "Whether the experience run finished without being aborted",
        unit: None,
        applies: always,
        extract: no_value,
        classify: classify_completion,
    },
    MetricRule {
        name: "duration",
        description: "Time between the first and last logged event",
        unit: Some("s"),
        applies: always,
        extract: extract_duration,
        classify: classify_duration,
    },
    MetricRule {
        name: "warning_count",
        description: "Number of WARNING events in the run log",
        unit: None,
        applies: always,
        extract: extract_warning_count,
        classify: classify_warning_count,
    },
    MetricRule {
        name: "error_count",
        description: "Number of ERROR events in the run log",
        unit: None,
        applies: always,
        extract: extract_error_count,
        classify: classify_error_count,
    },
    MetricRule {
        name: "artifact_integrity",
        description: "Number of run log lines that could not be parsed",
        unit: None,
        applies: integrity_enforced,
        extract: extract_parse_warnings,
        classify: classify_parse_warnings,
    },
];

fn always(_: &EvaluationContext<'_>) -> bool {
    true
}

fn no_value(_: &EvaluationContext<'_>) -> Option<f64> {
    None
}

fn classify_completion(_: Option<f64>, ctx: &EvaluationContext<'_>) -> MetricStatus {
    if ctx.record.completed {
        MetricStatus::Passed
    } else {
        MetricStatus::Failed
    }
}

fn extract_duration(ctx: &EvaluationContext<'_>) -> Option<f64> {
    ctx.record.observed_duration_secs()
}

fn classify_duration(value: Option<f64>, ctx: &EvaluationContext<'_>) -> MetricStatus {
    match (value, ctx.config.duration_threshold) {
        (None, _) => MetricStatus::NoValue,
        (Some(secs), Some(limit)) if secs > limit => MetricStatus::Failed,
        (Some(_), _) => MetricStatus::Passed,
    }
}

fn extract_warning_count(ctx: &EvaluationContext<'_>) -> Option<f64> {
    Some(ctx.record.count(LogLevel::Warning) as f64)
}

fn classify_warning_count(value: Option<f64>, ctx: &EvaluationContext<'_>) -> MetricStatus {
    exceeds(value, ctx.config.warning_threshold as f64)
}

fn extract_error_count(ctx: &EvaluationContext<'_>) -> Option<f64> {
    Some(ctx.record.count(LogLevel::Error) as f64)
}

fn classify_error_count(value: Option<f64>, _: &EvaluationContext<'_>) -> MetricStatus {
    exceeds(value, 0.0)
}

fn integrity_enforced(ctx: &EvaluationContext<'_>) -> bool {
    ctx.config.fail_on_parse_warnings
}

fn extract_parse_warnings(ctx: &EvaluationContext<'_>) -> Option<f64> {
    Some(ctx.parse_warning_count as f64)
}

fn classify_parse_warnings(value: Option<f64>, _: &EvaluationContext<'_>) -> MetricStatus {
    exceeds(value, 0.0)
}

/// FAILED above `limit`, PASSED at or below it, NO_VALUE without a value.
fn exceeds(value: Option<f64>, limit: f64) -> MetricStatus {
    match value {
        None => MetricStatus::NoValue,
        Some(v) if v > limit => MetricStatus::Failed,
        Some(_) => MetricStatus::Passed,
    }
}
