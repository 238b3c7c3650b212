//! Validation issue types.
//!
//! Every violated invariant becomes one [`Issue`]. Issues of a single state
//! are gathered into a [`ValidationReport`]; a [`ValidationError`] carries
//! one or more reports so a caller sees every problem in one pass.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shape of a violated invariant - each variant carries only its needed data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IssueKind {
    /// A mandatory value was not supplied.
    MissingValue { field: String },
    /// A name that must be non-empty is empty.
    EmptyName { field: String },
    /// Fields that must be given together were only partly given.
    IncompleteGroup {
        fields: Vec<String>,
        provided: Vec<String>,
    },
    /// A lower bound is not strictly below its upper bound.
    BoundsOrder {
        min_field: String,
        max_field: String,
        min: f64,
        max: f64,
    },
    /// A value that must be strictly positive is not.
    NonPositive { field: String, value: f64 },
    /// A value that must not be negative is.
    Negative { field: String, value: f64 },
    /// A float is NaN or infinite; the rendered value is kept as text.
    NonFinite { field: String, value: String },
    /// Two keyed maps must share their key set.
    KeyMismatch {
        first_field: String,
        second_field: String,
        first_keys: Vec<String>,
        second_keys: Vec<String>,
    },
    /// Two lists must have the same length.
    LengthMismatch {
        first_field: String,
        second_field: String,
        first_len: usize,
        second_len: usize,
    },
    /// Values that are individually fine but contradict each other.
    Inconsistent {
        fields: Vec<String>,
        values: Vec<String>,
        detail: String,
    },
}

/// A single violated invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Stable invariant name (e.g. "sample_transmission_direct_pairing").
    pub rule: String,
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl Issue {
    pub fn new(rule: impl Into<String>, kind: IssueKind) -> Self {
        Self {
            rule: rule.into(),
            kind,
        }
    }

    pub fn missing(rule: impl Into<String>, field: &str) -> Self {
        Self::new(
            rule,
            IssueKind::MissingValue {
                field: field.to_string(),
            },
        )
    }

    pub fn empty_name(rule: impl Into<String>, field: &str) -> Self {
        Self::new(
            rule,
            IssueKind::EmptyName {
                field: field.to_string(),
            },
        )
    }

    pub fn incomplete_group(rule: impl Into<String>, fields: &[&str], provided: &[&str]) -> Self {
        Self::new(
            rule,
            IssueKind::IncompleteGroup {
                fields: fields.iter().map(ToString::to_string).collect(),
                provided: provided.iter().map(ToString::to_string).collect(),
            },
        )
    }

    pub fn bounds_order(
        rule: impl Into<String>,
        min_field: &str,
        max_field: &str,
        min: f64,
        max: f64,
    ) -> Self {
        Self::new(
            rule,
            IssueKind::BoundsOrder {
                min_field: min_field.to_string(),
                max_field: max_field.to_string(),
                min,
                max,
            },
        )
    }

    pub fn non_positive(rule: impl Into<String>, field: &str, value: f64) -> Self {
        Self::new(
            rule,
            IssueKind::NonPositive {
                field: field.to_string(),
                value,
            },
        )
    }

    pub fn negative(rule: impl Into<String>, field: &str, value: f64) -> Self {
        Self::new(
            rule,
            IssueKind::Negative {
                field: field.to_string(),
                value,
            },
        )
    }

    pub fn non_finite(rule: impl Into<String>, field: &str, value: f64) -> Self {
        Self::new(
            rule,
            IssueKind::NonFinite {
                field: field.to_string(),
                value: value.to_string(),
            },
        )
    }

    pub fn key_mismatch(
        rule: impl Into<String>,
        first_field: &str,
        second_field: &str,
        first_keys: Vec<String>,
        second_keys: Vec<String>,
    ) -> Self {
        Self::new(
            rule,
            IssueKind::KeyMismatch {
                first_field: first_field.to_string(),
                second_field: second_field.to_string(),
                first_keys,
                second_keys,
            },
        )
    }

    pub fn length_mismatch(
        rule: impl Into<String>,
        first_field: &str,
        second_field: &str,
        first_len: usize,
        second_len: usize,
    ) -> Self {
        Self::new(
            rule,
            IssueKind::LengthMismatch {
                first_field: first_field.to_string(),
                second_field: second_field.to_string(),
                first_len,
                second_len,
            },
        )
    }

    pub fn inconsistent(
        rule: impl Into<String>,
        fields: &[&str],
        values: Vec<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(
            rule,
            IssueKind::Inconsistent {
                fields: fields.iter().map(ToString::to_string).collect(),
                values,
                detail: detail.into(),
            },
        )
    }

    /// Fields involved in the issue.
    pub fn fields(&self) -> Vec<&str> {
        match &self.kind {
            IssueKind::MissingValue { field }
            | IssueKind::EmptyName { field }
            | IssueKind::NonPositive { field, .. }
            | IssueKind::Negative { field, .. }
            | IssueKind::NonFinite { field, .. } => vec![field.as_str()],
            IssueKind::IncompleteGroup { fields, .. } | IssueKind::Inconsistent { fields, .. } => {
                fields.iter().map(String::as_str).collect()
            }
            IssueKind::BoundsOrder {
                min_field,
                max_field,
                ..
            } => vec![min_field.as_str(), max_field.as_str()],
            IssueKind::KeyMismatch {
                first_field,
                second_field,
                ..
            }
            | IssueKind::LengthMismatch {
                first_field,
                second_field,
                ..
            } => vec![first_field.as_str(), second_field.as_str()],
        }
    }

    /// Offending values keyed by field name.
    pub fn values(&self) -> BTreeMap<String, String> {
        let mut values = BTreeMap::new();
        match &self.kind {
            IssueKind::MissingValue { field } => {
                values.insert(field.clone(), "None".to_string());
            }
            IssueKind::EmptyName { field } => {
                values.insert(field.clone(), String::new());
            }
            IssueKind::IncompleteGroup { fields, provided } => {
                for field in fields {
                    let state = if provided.contains(field) {
                        "set"
                    } else {
                        "None"
                    };
                    values.insert(field.clone(), state.to_string());
                }
            }
            IssueKind::BoundsOrder {
                min_field,
                max_field,
                min,
                max,
            } => {
                values.insert(min_field.clone(), min.to_string());
                values.insert(max_field.clone(), max.to_string());
            }
            IssueKind::NonPositive { field, value } | IssueKind::Negative { field, value } => {
                values.insert(field.clone(), value.to_string());
            }
            IssueKind::NonFinite { field, value } => {
                values.insert(field.clone(), value.clone());
            }
            IssueKind::KeyMismatch {
                first_field,
                second_field,
                first_keys,
                second_keys,
            } => {
                values.insert(first_field.clone(), format!("[{}]", first_keys.join(", ")));
                values.insert(second_field.clone(), format!("[{}]", second_keys.join(", ")));
            }
            IssueKind::LengthMismatch {
                first_field,
                second_field,
                first_len,
                second_len,
            } => {
                values.insert(first_field.clone(), format!("len {first_len}"));
                values.insert(second_field.clone(), format!("len {second_len}"));
            }
            IssueKind::Inconsistent { fields, values: v, .. } => {
                for (field, value) in fields.iter().zip(v) {
                    values.insert(field.clone(), value.clone());
                }
            }
        }
        values
    }

    /// Human-readable instruction for fixing the issue.
    pub fn message(&self) -> String {
        match &self.kind {
            IssueKind::MissingValue { field } => format!("Provide a value for {field}."),
            IssueKind::EmptyName { field } => format!("{field} must not be empty."),
            IssueKind::IncompleteGroup { fields, provided } => format!(
                "Provide all of [{}] or none of them; only [{}] set.",
                fields.join(", "),
                provided.join(", ")
            ),
            IssueKind::BoundsOrder {
                min_field,
                max_field,
                min,
                max,
            } => format!("{min_field} ({min}) must be smaller than {max_field} ({max})."),
            IssueKind::NonPositive { field, value } => {
                format!("{field} must be positive, got {value}.")
            }
            IssueKind::Negative { field, value } => {
                format!("{field} must not be negative, got {value}.")
            }
            IssueKind::NonFinite { field, value } => {
                format!("{field} must be a finite number, got {value}.")
            }
            IssueKind::KeyMismatch {
                first_field,
                second_field,
                first_keys,
                second_keys,
            } => format!(
                "{first_field} and {second_field} must have the same keys, got [{}] and [{}].",
                first_keys.join(", "),
                second_keys.join(", ")
            ),
            IssueKind::LengthMismatch {
                first_field,
                second_field,
                first_len,
                second_len,
            } => format!(
                "{first_field} and {second_field} must have the same length, \
                 got {first_len} and {second_len}."
            ),
            IssueKind::Inconsistent { detail, .. } => detail.clone(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.rule, self.message())
    }
}

/// Issues found while validating one state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Name of the validated state (e.g. "StateData").
    pub state: String,
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            issues: Vec::new(),
        }
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Returns true if an issue with this rule name was recorded.
    pub fn has_rule(&self, rule: &str) -> bool {
        self.issues.iter().any(|issue| issue.rule == rule)
    }

    /// Issue messages grouped by field name.
    pub fn by_field(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for issue in &self.issues {
            for field in issue.fields() {
                grouped
                    .entry(field.to_string())
                    .or_default()
                    .push(issue.message());
            }
        }
        grouped
    }

    /// Converts the report into a `Result`, failing when any issue was recorded.
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                reports: vec![self],
            })
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {issue}", self.state)?;
        }
        Ok(())
    }
}

/// One or more states failed validation.
///
/// Recoverable by construction: fix the reported fields and validate again.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", render_reports(.reports))]
pub struct ValidationError {
    /// Non-empty reports, one per failing state.
    pub reports: Vec<ValidationReport>,
}

impl ValidationError {
    /// Merges non-empty reports; returns `Ok` when none carry issues.
    pub fn from_reports(reports: Vec<ValidationReport>) -> Result<(), ValidationError> {
        let reports: Vec<ValidationReport> =
            reports.into_iter().filter(|report| !report.is_empty()).collect();
        if reports.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { reports })
        }
    }

    /// Every issue paired with the state it belongs to.
    pub fn issues(&self) -> impl Iterator<Item = (&str, &Issue)> + '_ {
        self.reports.iter().flat_map(|report| {
            report
                .issues
                .iter()
                .map(move |issue| (report.state.as_str(), issue))
        })
    }

    pub fn issue_count(&self) -> usize {
        self.reports.iter().map(ValidationReport::len).sum()
    }

    /// Returns true if any report carries an issue with this rule name.
    pub fn has_rule(&self, rule: &str) -> bool {
        self.reports.iter().any(|report| report.has_rule(rule))
    }

    /// Rule names in report order.
    pub fn rules(&self) -> Vec<&str> {
        self.issues().map(|(_, issue)| issue.rule.as_str()).collect()
    }

    /// Report for a given state name, if that state failed.
    pub fn report(&self, state: &str) -> Option<&ValidationReport> {
        self.reports.iter().find(|report| report.state == state)
    }
}

fn render_reports(reports: &[ValidationReport]) -> String {
    reports
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_ok() {
        assert!(ValidationReport::new("StateData").into_result().is_ok());
    }

    #[test]
    fn incomplete_group_values_mark_provided_fields() {
        let issue = Issue::incomplete_group(
            "sample_transmission_direct_pairing",
            &["sample_transmission", "sample_direct"],
            &["sample_transmission"],
        );
        let values = issue.values();
        assert_eq!(values["sample_transmission"], "set");
        assert_eq!(values["sample_direct"], "None");
        assert_eq!(issue.fields(), vec!["sample_transmission", "sample_direct"]);
    }

    #[test]
    fn non_finite_keeps_rendered_value() {
        let issue = Issue::non_finite("value_finite", "mask.phi_min", f64::NAN);
        assert_eq!(issue.values()["mask.phi_min"], "NaN");
        assert_eq!(
            issue.to_string(),
            "value_finite: mask.phi_min must be a finite number, got NaN."
        );
        let issue = Issue::non_finite("value_finite", "q_max", f64::NEG_INFINITY);
        assert_eq!(issue.message(), "q_max must be a finite number, got -inf.");
    }

    #[test]
    fn error_aggregates_reports() {
        let mut data = ValidationReport::new("StateData");
        data.push(Issue::missing("sample_scatter_required", "sample_scatter"));
        let mut q = ValidationReport::new("StateConvertToQ");
        q.push(Issue::bounds_order("q_range_order", "q_min", "q_max", 2.0, 1.0));
        q.push(Issue::missing("q_xy_max_required", "q_xy_max"));

        let err = ValidationError::from_reports(vec![
            data,
            ValidationReport::new("StateMask"),
            q,
        ])
        .unwrap_err();
        assert_eq!(err.reports.len(), 2);
        assert_eq!(err.issue_count(), 3);
        assert_eq!(
            err.rules(),
            vec!["sample_scatter_required", "q_range_order", "q_xy_max_required"]
        );
        assert!(err.report("StateMask").is_none());
    }

    #[test]
    fn report_groups_messages_by_field() {
        let mut report = ValidationReport::new("StateMask");
        report.push(Issue::bounds_order("radius_order", "radius_min", "radius_max", 0.5, 0.1));
        let grouped = report.by_field();
        assert_eq!(grouped.len(), 2);
        assert_eq!(
            grouped["radius_min"],
            vec!["radius_min (0.5) must be smaller than radius_max (0.1).".to_string()]
        );
    }

    #[test]
    fn issue_serializes_with_rule_and_kind() {
        let issue = Issue::missing("incident_monitor_required", "incident_monitor");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["rule"], "incident_monitor_required");
        assert_eq!(json["MissingValue"]["field"], "incident_monitor");
    }
}
