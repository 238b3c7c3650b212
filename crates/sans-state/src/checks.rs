//! Range checks shared by several leaves.

use sans_model::{Issue, ValidationReport};

/// Optional bounds: both or neither, and strictly ordered when both are set.
pub(crate) fn check_optional_range(
    report: &mut ValidationReport,
    rule: &str,
    (min_field, min): (&str, Option<f64>),
    (max_field, max): (&str, Option<f64>),
) {
    match (min, max) {
        (Some(min), Some(max)) if min >= max => {
            report.push(Issue::bounds_order(
                format!("{rule}_order"),
                min_field,
                max_field,
                min,
                max,
            ));
        }
        (Some(_), None) => report.push(Issue::incomplete_group(
            format!("{rule}_pairing"),
            &[min_field, max_field],
            &[min_field],
        )),
        (None, Some(_)) => report.push(Issue::incomplete_group(
            format!("{rule}_pairing"),
            &[min_field, max_field],
            &[max_field],
        )),
        _ => {}
    }
}

/// Paired lists of lower and upper bounds: equal length, each pair
/// strictly ordered.
pub(crate) fn check_paired_lists(
    report: &mut ValidationReport,
    rule: &str,
    (low_field, low): (&str, &[f64]),
    (high_field, high): (&str, &[f64]),
) {
    if low.len() != high.len() {
        report.push(Issue::length_mismatch(
            format!("{rule}_length"),
            low_field,
            high_field,
            low.len(),
            high.len(),
        ));
    }
    for (index, (low_value, high_value)) in low.iter().zip(high).enumerate() {
        if low_value >= high_value {
            report.push(Issue::bounds_order(
                format!("{rule}_order"),
                &format!("{low_field}[{index}]"),
                &format!("{high_field}[{index}]"),
                *low_value,
                *high_value,
            ));
        }
    }
}
