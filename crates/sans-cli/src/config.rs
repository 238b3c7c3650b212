//! TOML user settings describing one reduction.
//!
//! ```toml
//! [data]
//! sample_scatter = "SANS2D00022024"
//! sample_transmission = "SANS2D00022041"
//! sample_direct = "SANS2D00022048"
//!
//! [move]
//! sample_offset = 0.053
//! [move.lab_detector]
//! x_translation_correction = 0.001
//!
//! [convert_to_q]
//! q_min = 0.001
//! q_max = 0.3
//! ```
//!
//! Every key of a stage table is a state field name. Values go through the
//! builders' `set`, so they are coerced exactly like programmatic input.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use sans_model::{
    FileInformation, FileInformationFactory, Instrument, RunFileInformation,
    StaticSearchDirectories,
};
use sans_state::{AllStates, AllStatesBuilder, BuilderFactory};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

/// Parsed settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserSettings {
    /// Explicit run facts; derived from `data.sample_scatter` when absent.
    pub file_information: Option<FileInformationSettings>,
    #[serde(default)]
    pub data: toml::Table,
    #[serde(default, rename = "move")]
    pub move_state: toml::Table,
    #[serde(default)]
    pub reduction: toml::Table,
    #[serde(default)]
    pub convert_to_q: toml::Table,
    #[serde(default)]
    pub normalize_to_monitor: toml::Table,
    #[serde(default)]
    pub wavelength: toml::Table,
    #[serde(default)]
    pub mask: toml::Table,
    #[serde(default)]
    pub slice_event: toml::Table,
}

/// `[file_information]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileInformationSettings {
    pub instrument: String,
    pub run_number: u32,
    #[serde(default = "default_periods")]
    pub periods: u32,
    pub file_name: Option<String>,
    pub idf_file_path: Option<PathBuf>,
    pub ipf_file_path: Option<PathBuf>,
}

fn default_periods() -> u32 {
    1
}

impl FileInformationSettings {
    fn to_file_information(&self) -> Result<RunFileInformation> {
        let instrument: Instrument = self
            .instrument
            .parse()
            .map_err(|message: String| anyhow!(message))
            .context("[file_information] instrument")?;
        if self.periods == 0 {
            bail!("[file_information] periods must be at least 1");
        }
        let file_name = self
            .file_name
            .clone()
            .unwrap_or_else(|| format!("{}{}", instrument.as_str(), self.run_number));
        let mut info = RunFileInformation::new(file_name, instrument, self.run_number)
            .with_periods(self.periods);
        if let Some(path) = &self.idf_file_path {
            info = info.with_idf_file_path(path);
        }
        if let Some(path) = &self.ipf_file_path {
            info = info.with_ipf_file_path(path);
        }
        Ok(info)
    }
}

/// Reads and parses a settings file.
pub fn load_settings(path: &Path) -> Result<UserSettings> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read settings {}", path.display()))?;
    parse_settings(&text).with_context(|| format!("parse settings {}", path.display()))
}

/// Parses settings from TOML text.
pub fn parse_settings(text: &str) -> Result<UserSettings> {
    Ok(toml::from_str(text)?)
}

impl UserSettings {
    /// Resolves the run's file information.
    ///
    /// The `[file_information]` table wins; otherwise the sample scatter file
    /// is located on the search directories and its name parsed.
    pub fn file_information(
        &self,
        directories: StaticSearchDirectories,
    ) -> Result<Arc<dyn FileInformation>> {
        if let Some(explicit) = &self.file_information {
            debug!(instrument = %explicit.instrument, "using explicit file information");
            return Ok(Arc::new(explicit.to_file_information()?));
        }
        let Some(sample_scatter) = self.data.get("sample_scatter") else {
            bail!("either [file_information] or data.sample_scatter is required");
        };
        let Some(file_name) = sample_scatter.as_str() else {
            bail!("data.sample_scatter must be a string, got {sample_scatter}");
        };
        let periods = match self.data.get("sample_scatter_periods") {
            Some(value) => value
                .as_integer()
                .and_then(|periods| u32::try_from(periods).ok())
                .ok_or_else(|| anyhow!("data.sample_scatter_periods must be a positive integer"))?,
            None => 1,
        };
        let info = FileInformationFactory::new(directories)
            .create_with_periods(file_name, periods)
            .with_context(|| format!("resolve sample scatter '{file_name}'"))?;
        Ok(Arc::new(info))
    }

    /// Builds every state through the factory's builders.
    ///
    /// The result is not validated.
    pub fn build_states(&self, factory: &BuilderFactory) -> Result<AllStates> {
        let mut data = factory.data_builder();
        apply_table("data", &self.data, |field, value| {
            data.set(field, value).map(|_| ())
        })?;

        let mut move_builder = factory.move_builder();
        apply_table("move", &self.move_state, |field, value| {
            move_builder.set(field, value).map(|_| ())
        })?;

        let mut reduction = factory.reduction_builder();
        apply_table("reduction", &self.reduction, |field, value| {
            reduction.set(field, value).map(|_| ())
        })?;

        let mut convert_to_q = factory.convert_to_q_builder();
        apply_table("convert_to_q", &self.convert_to_q, |field, value| {
            convert_to_q.set(field, value).map(|_| ())
        })?;

        let mut normalize = factory.normalize_to_monitor_builder();
        apply_table(
            "normalize_to_monitor",
            &self.normalize_to_monitor,
            |field, value| normalize.set(field, value).map(|_| ()),
        )?;

        let mut wavelength = factory.wavelength_builder();
        apply_table("wavelength", &self.wavelength, |field, value| {
            wavelength.set(field, value).map(|_| ())
        })?;

        let mut mask = factory.mask_builder();
        apply_table("mask", &self.mask, |field, value| {
            mask.set(field, value).map(|_| ())
        })?;

        let mut slice_event = factory.slice_event_builder();
        apply_table("slice_event", &self.slice_event, |field, value| {
            slice_event.set(field, value).map(|_| ())
        })?;

        info!(instrument = %factory.instrument(), "built states from settings");
        Ok(AllStatesBuilder::new(factory)
            .with_data(data.build())
            .with_move(move_builder.build())
            .with_reduction(reduction.build())
            .with_convert_to_q(convert_to_q.build())
            .with_normalize_to_monitor(normalize.build())
            .with_wavelength(wavelength.build())
            .with_mask(mask.build())
            .with_slice_event(slice_event.build())
            .build_unchecked())
    }
}

// `sample_scatter_periods` feeds file information only; it is not a state field.
const FILE_ONLY_KEYS: &[&str] = &["sample_scatter_periods"];

fn apply_table<F>(name: &str, table: &toml::Table, mut set: F) -> Result<()>
where
    F: FnMut(&str, &Value) -> sans_state::Result<()>,
{
    for (key, value) in table {
        if name == "data" && FILE_ONLY_KEYS.contains(&key.as_str()) {
            continue;
        }
        let value = serde_json::to_value(value).with_context(|| format!("[{name}] {key}"))?;
        set(key, &value).with_context(|| format!("[{name}] {key}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stage_tables() {
        let settings = parse_settings(
            r#"
            [data]
            sample_scatter = "LOQ74044"

            [move.lab_detector]
            x_translation_correction = 0.002

            [mask]
            radius_min = 0.038
            "#,
        )
        .unwrap();
        assert_eq!(settings.data["sample_scatter"].as_str(), Some("LOQ74044"));
        assert!(settings.move_state["lab_detector"].is_table());
        assert!(settings.convert_to_q.is_empty());
    }

    #[test]
    fn test_unknown_table_is_rejected() {
        let err = parse_settings("[gravity]\non = true\n").unwrap_err();
        assert!(err.to_string().contains("gravity"), "{err}");
    }

    #[test]
    fn test_explicit_file_information() {
        let settings = parse_settings(
            r#"
            [file_information]
            instrument = "larmor"
            run_number = 2260
            periods = 3
            "#,
        )
        .unwrap();
        let info = settings
            .file_information(StaticSearchDirectories::default())
            .unwrap();
        assert_eq!(info.instrument(), Instrument::Larmor);
        assert_eq!(info.file_name(), "LARMOR2260");
        assert_eq!(info.number_of_periods(), 3);
    }

    #[test]
    fn test_missing_run_reference() {
        let settings = parse_settings("[mask]\nphi_min = -45.0\n").unwrap();
        let err = settings
            .file_information(StaticSearchDirectories::default())
            .unwrap_err();
        assert!(err.to_string().contains("sample_scatter"), "{err}");
    }
}
