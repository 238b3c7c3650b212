use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sans_model::{StaticSearchDirectories, ValidationError};
use sans_state::{AllStates, BuilderFactory, from_json, to_json};
use tracing::{info, info_span, warn};

use crate::config::load_settings;

/// States produced by a command together with their validation result.
#[derive(Debug)]
pub struct Outcome {
    pub states: AllStates,
    pub validation: std::result::Result<(), ValidationError>,
}

impl Outcome {
    fn new(states: AllStates) -> Self {
        let validation = states.validate();
        match &validation {
            Ok(()) => info!("all states valid"),
            Err(error) => info!(issues = error.issue_count(), "validation failed"),
        }
        Self { states, validation }
    }

    pub fn is_valid(&self) -> bool {
        self.validation.is_ok()
    }
}

/// Builds and validates the states described by a settings file.
pub fn run_validate(settings: &Path, directories: StaticSearchDirectories) -> Result<Outcome> {
    let span = info_span!("validate", settings = %settings.display());
    let _guard = span.enter();
    let settings = load_settings(settings)?;
    let file_information = settings.file_information(directories)?;
    let factory = BuilderFactory::for_file(file_information).context("select state builders")?;
    let states = settings.build_states(&factory)?;
    Ok(Outcome::new(states))
}

/// Validates, then writes the property bag to `output` or stdout.
///
/// Nothing is written for invalid states unless `allow_invalid` is set.
pub fn run_encode(
    settings: &Path,
    directories: StaticSearchDirectories,
    output: Option<&Path>,
    allow_invalid: bool,
) -> Result<Outcome> {
    let outcome = run_validate(settings, directories)?;
    if !outcome.is_valid() && !allow_invalid {
        warn!("property bag not written: states are invalid");
        return Ok(outcome);
    }
    let json = to_json(&outcome.states).context("encode property bag")?;
    match output {
        Some(path) => {
            fs::write(path, format!("{json}\n"))
                .with_context(|| format!("write {}", path.display()))?;
            info!(path = %path.display(), "wrote property bag");
        }
        None => println!("{json}"),
    }
    Ok(outcome)
}

/// Decodes and validates a property bag file.
pub fn run_decode(bag: &Path) -> Result<Outcome> {
    let span = info_span!("decode", bag = %bag.display());
    let _guard = span.enter();
    let text = fs::read_to_string(bag).with_context(|| format!("read {}", bag.display()))?;
    let states = from_json(&text).with_context(|| format!("decode {}", bag.display()))?;
    Ok(Outcome::new(states))
}
