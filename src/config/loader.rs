//! Loading and saving preparation specs.

use std::fs;
use std::path::Path;

use super::schema::PrepareSpec;
use super::validate::validate_spec;
use crate::error::{Error, Result};

impl PrepareSpec {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let spec: PrepareSpec = serde_yaml::from_str(yaml)
            .map_err(|e| Error::ConfigError(format!("Failed to parse YAML config: {e}")))?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<()> {
        validate_spec(self).map_err(|e| Error::ConfigError(format!("Invalid config: {e}")))
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Load a preparation spec from a YAML file
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<PrepareSpec> {
    let yaml_content = fs::read_to_string(config_path.as_ref()).map_err(|e| {
        Error::ConfigError(format!(
            "Failed to read config file {}: {}",
            config_path.as_ref().display(),
            e
        ))
    })?;
    PrepareSpec::from_yaml_str(&yaml_content)
}

/// Write a preparation spec as YAML
pub fn save_config<P: AsRef<Path>>(spec: &PrepareSpec, config_path: P) -> Result<()> {
    fs::write(config_path, spec.to_yaml()?)?;
    Ok(())
}
