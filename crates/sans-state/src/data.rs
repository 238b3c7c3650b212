//! Which run files make up a reduction.

use sans_model::{Facility, FileInformation, Instrument, Issue, ValidationReport};

use crate::state::{Leaf, is_set, state_leaf};

/// Period value meaning "use every period of the run".
pub const ALL_PERIODS: i64 = 0;

state_leaf! {
    /// Run files of a reduction and the facts derived from the scatter run.
    pub struct StateData as "StateData" {
        sample_scatter / set_sample_scatter: Option<String> = None,
        sample_scatter_period / set_sample_scatter_period: i64 = ALL_PERIODS,
        sample_transmission / set_sample_transmission: Option<String> = None,
        sample_transmission_period / set_sample_transmission_period: i64 = ALL_PERIODS,
        sample_direct / set_sample_direct: Option<String> = None,
        sample_direct_period / set_sample_direct_period: i64 = ALL_PERIODS,
        can_scatter / set_can_scatter: Option<String> = None,
        can_scatter_period / set_can_scatter_period: i64 = ALL_PERIODS,
        can_transmission / set_can_transmission: Option<String> = None,
        can_transmission_period / set_can_transmission_period: i64 = ALL_PERIODS,
        can_direct / set_can_direct: Option<String> = None,
        can_direct_period / set_can_direct_period: i64 = ALL_PERIODS,
        calibration / set_calibration: Option<String> = None,
        user_file / set_user_file: Option<String> = None,
        sample_scatter_run_number: Option<i64> = None,
        sample_scatter_is_multi_period: bool = false,
        instrument: Instrument = Instrument::NoInstrument,
        facility: Facility = Facility::NoFacility,
        idf_file_path: Option<String> = None,
        ipf_file_path: Option<String> = None,
    }
}

impl StateData {
    /// Returns true if any can run is configured.
    pub fn has_can(&self) -> bool {
        is_set(self.can_scatter.as_ref())
            || is_set(self.can_transmission.as_ref())
            || is_set(self.can_direct.as_ref())
    }
}

/// Transmission and direct runs must be given together.
fn check_pairing(
    report: &mut ValidationReport,
    rule: &str,
    (transmission_field, transmission): (&str, Option<&String>),
    (direct_field, direct): (&str, Option<&String>),
) {
    let provided: Vec<&str> = [(transmission_field, transmission), (direct_field, direct)]
        .into_iter()
        .filter(|(_, value)| is_set(*value))
        .map(|(field, _)| field)
        .collect();
    if provided.len() == 1 {
        report.push(Issue::incomplete_group(
            rule,
            &[transmission_field, direct_field],
            &provided,
        ));
    }
}

impl Leaf for StateData {
    fn check(&self, report: &mut ValidationReport) {
        if !is_set(self.sample_scatter.as_ref()) {
            report.push(Issue::missing("sample_scatter_required", "sample_scatter"));
        }

        check_pairing(
            report,
            "sample_transmission_direct_pairing",
            ("sample_transmission", self.sample_transmission.as_ref()),
            ("sample_direct", self.sample_direct.as_ref()),
        );
        check_pairing(
            report,
            "can_transmission_direct_pairing",
            ("can_transmission", self.can_transmission.as_ref()),
            ("can_direct", self.can_direct.as_ref()),
        );

        let can_transmission_given =
            is_set(self.can_transmission.as_ref()) || is_set(self.can_direct.as_ref());
        if can_transmission_given && !is_set(self.can_scatter.as_ref()) {
            report.push(Issue::missing("can_scatter_required", "can_scatter"));
        }

        let periods = [
            ("sample_scatter_period", self.sample_scatter_period),
            ("sample_transmission_period", self.sample_transmission_period),
            ("sample_direct_period", self.sample_direct_period),
            ("can_scatter_period", self.can_scatter_period),
            ("can_transmission_period", self.can_transmission_period),
            ("can_direct_period", self.can_direct_period),
        ];
        for (field, period) in periods {
            if period < 0 {
                report.push(Issue::negative("period_non_negative", field, period as f64));
            }
        }
    }

    fn apply_file_information(&mut self, info: &dyn FileInformation) {
        self.instrument = info.instrument();
        self.facility = info.facility();
        self.sample_scatter_run_number = Some(i64::from(info.run_number()));
        self.sample_scatter_is_multi_period = info.is_multi_period();
        self.idf_file_path = info
            .idf_file_path()
            .map(|path| path.display().to_string());
        self.ipf_file_path = info
            .ipf_file_path()
            .map(|path| path.display().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Schema, State};

    fn with_scatter() -> StateData {
        StateData {
            sample_scatter: Some("SANS2D00022024".to_string()),
            ..StateData::default()
        }
    }

    #[test]
    fn test_default_fails_only_on_sample_scatter() {
        let err = StateData::default().validate().unwrap_err();
        assert_eq!(err.rules(), vec!["sample_scatter_required"]);
    }

    #[test]
    fn test_transmission_without_direct() {
        let state = StateData {
            sample_transmission: Some("T1".to_string()),
            ..with_scatter()
        };
        let err = state.validate().unwrap_err();
        assert_eq!(err.issue_count(), 1);
        let (_, issue) = err.issues().next().unwrap();
        assert_eq!(issue.rule, "sample_transmission_direct_pairing");
        let values = issue.values();
        assert_eq!(values["sample_transmission"], "set");
        assert_eq!(values["sample_direct"], "None");
    }

    #[test]
    fn test_transmission_and_direct_together_pass() {
        let state = StateData {
            sample_transmission: Some("T1".to_string()),
            sample_direct: Some("D1".to_string()),
            ..with_scatter()
        };
        assert!(state.validate().is_ok());
    }

    #[test]
    fn test_can_transmission_requires_can_scatter() {
        let state = StateData {
            can_transmission: Some("CT".to_string()),
            can_direct: Some("CD".to_string()),
            ..with_scatter()
        };
        let err = state.validate().unwrap_err();
        assert!(err.has_rule("can_scatter_required"));
        assert!(!err.has_rule("can_transmission_direct_pairing"));
    }

    #[test]
    fn test_blank_names_count_as_unset() {
        let state = StateData {
            sample_scatter: Some("  ".to_string()),
            ..StateData::default()
        };
        assert!(state.validate().unwrap_err().has_rule("sample_scatter_required"));
    }

    #[test]
    fn test_negative_periods_reported_individually() {
        let state = StateData {
            sample_scatter_period: -1,
            can_scatter_period: -2,
            ..with_scatter()
        };
        let err = state.validate().unwrap_err();
        assert_eq!(err.issue_count(), 2);
        assert!(err.has_rule("period_non_negative"));
    }

    #[test]
    fn test_file_information_fields_are_read_only() {
        let read_only: Vec<&str> = StateData::schema()
            .iter()
            .filter(|descriptor| !descriptor.is_settable())
            .map(|descriptor| descriptor.name)
            .collect();
        assert_eq!(
            read_only,
            vec![
                "sample_scatter_run_number",
                "sample_scatter_is_multi_period",
                "instrument",
                "facility",
                "idf_file_path",
                "ipf_file_path",
            ]
        );
    }
}
