//! Configuration Loader
//!
//! Environment-aware configuration loading: YAML file discovery, environment detection,
//! environment section merging and `${VAR}` expansion.

use super::error::{ConfigResult, ConfigurationError};
use super::DispatchConfig;
use crate::constants::defaults;
use serde_yaml::Value as YamlValue;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const CONFIG_FILE_NAMES: [&str; 2] = ["dispatch-config.yaml", "dispatch-config.yml"];
const ENVIRONMENT_SECTIONS: [&str; 3] = ["development", "test", "production"];

/// Loaded configuration together with where and for which environment it was loaded
#[derive(Debug)]
pub struct ConfigManager {
    config: DispatchConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment.
    /// Tests use this to avoid touching process environment variables.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            "Loading configuration for environment '{}' from directory: {}",
            environment,
            config_directory.display()
        );

        let mut config = Self::load_and_merge_config(&config_directory, environment)?;
        Self::expand_environment_variables(&mut config)?;
        config.validate()?;

        info!(
            environment = environment,
            bind_address = %config.server.bind_address,
            registry_url = config.discovery.registry_url.as_deref().unwrap_or("none"),
            static_peers = config.discovery.static_peers.len(),
            rules = config.planning.rules.len(),
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Wrap an in-memory configuration, validating it first
    pub fn from_config(
        mut config: DispatchConfig,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        config.execution.environment = environment.to_string();
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory: Self::default_config_directory(),
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Get the current environment
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Get the configuration directory
    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Detect current environment: DISPATCH_ENV || APP_ENV || 'development'
    pub fn detect_environment() -> String {
        env::var("DISPATCH_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    /// DISPATCH_CONFIG_DIR when set, else ./config
    pub fn default_config_directory() -> PathBuf {
        env::var("DISPATCH_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }

    /// Safely read a configuration file with a size limit
    fn read_config_file_safely(path: &Path) -> ConfigResult<String> {
        let metadata = std::fs::metadata(path)
            .map_err(|e| ConfigurationError::file_read_error(path.display().to_string(), e))?;

        if metadata.len() > defaults::MAX_CONFIG_FILE_BYTES {
            return Err(ConfigurationError::invalid_value(
                "file_size",
                metadata.len().to_string(),
                format!(
                    "Configuration file too large ({} bytes > {} byte limit)",
                    metadata.len(),
                    defaults::MAX_CONFIG_FILE_BYTES
                ),
            ));
        }

        if !metadata.is_file() {
            return Err(ConfigurationError::invalid_value(
                "file_type",
                "directory or special file".to_string(),
                "Configuration path must point to a regular file",
            ));
        }

        std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::file_read_error(path.display().to_string(), e))
    }

    /// Find the configuration file
    fn find_config_file(config_directory: &Path) -> ConfigResult<PathBuf> {
        let mut searched_paths = Vec::new();

        for name in CONFIG_FILE_NAMES {
            let config_path = config_directory.join(name);
            searched_paths.push(config_path.clone());

            if config_path.exists() {
                debug!("Found configuration file: {}", config_path.display());
                return Ok(config_path);
            }
        }

        Err(ConfigurationError::config_file_not_found(searched_paths))
    }

    /// Load and merge configuration with environment-specific overrides
    fn load_and_merge_config(
        config_directory: &Path,
        environment: &str,
    ) -> ConfigResult<DispatchConfig> {
        let config_file = Self::find_config_file(config_directory)?;
        let yaml_content = Self::read_config_file_safely(&config_file)?;

        let mut yaml_data: YamlValue = serde_yaml::from_str(&yaml_content)
            .map_err(|e| ConfigurationError::invalid_yaml(config_file.display().to_string(), e))?;

        // An empty file deserializes to null; treat it as an empty mapping
        if yaml_data.is_null() {
            yaml_data = YamlValue::Mapping(Default::default());
        }

        if let Some(env_overrides) = yaml_data
            .get(YamlValue::String(environment.to_string()))
            .cloned()
        {
            debug!(
                "Applying environment-specific overrides for: {}",
                environment
            );
            Self::merge_yaml_values(&mut yaml_data, env_overrides)?;
        }

        if let YamlValue::Mapping(ref mut map) = yaml_data {
            for section in ENVIRONMENT_SECTIONS {
                map.remove(YamlValue::String(section.to_string()));
            }
        }

        let mut config: DispatchConfig = serde_yaml::from_value(yaml_data).map_err(|e| {
            ConfigurationError::invalid_yaml(
                config_file.display().to_string(),
                format!("Failed to deserialize configuration: {e}"),
            )
        })?;

        config.execution.environment = environment.to_string();

        Ok(config)
    }

    /// Recursively merge YAML values (environment overrides into base config)
    fn merge_yaml_values(base: &mut YamlValue, override_value: YamlValue) -> ConfigResult<()> {
        match (&mut *base, override_value) {
            (YamlValue::Mapping(base_map), YamlValue::Mapping(override_map)) => {
                for (key, value) in override_map {
                    if let Some(existing_value) = base_map.get_mut(&key) {
                        Self::merge_yaml_values(existing_value, value)?;
                    } else {
                        base_map.insert(key, value);
                    }
                }
            }
            // An empty environment section overrides nothing
            (_, YamlValue::Null) => {}
            (YamlValue::Mapping(_), other) => {
                return Err(ConfigurationError::config_merge_error(format!(
                    "cannot replace a section with a scalar value: {other:?}"
                )));
            }
            (base_ref, override_val) => {
                *base_ref = override_val;
            }
        }
        Ok(())
    }

    /// Expand `${VAR}` placeholders in discovery addresses
    fn expand_environment_variables(config: &mut DispatchConfig) -> ConfigResult<()> {
        let discovery = &mut config.discovery;

        if let Some(url) = discovery.registry_url.as_mut() {
            *url = expand_placeholders(url, "discovery.registry_url")?;
        }
        if let Some(address) = discovery.self_address.as_mut() {
            *address = expand_placeholders(address, "discovery.self_address")?;
        }
        for peer in discovery.static_peers.iter_mut() {
            *peer = expand_placeholders(peer, "discovery.static_peers")?;
        }

        Ok(())
    }
}

/// Replace every `${VAR}` in `value` with the variable's value.
///
/// An unset variable or an unterminated placeholder is an error.
fn expand_placeholders(value: &str, field: &str) -> ConfigResult<String> {
    let mut expanded = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        expanded.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find('}').ok_or_else(|| {
            ConfigurationError::environment_variable_error(
                after,
                format!("unterminated placeholder in {field}"),
            )
        })?;
        let name = &after[..end];
        let resolved = env::var(name).map_err(|_| {
            ConfigurationError::environment_variable_error(
                name,
                format!("{field} references an unset variable"),
            )
        })?;
        debug!("Expanding environment variable {} in {}", name, field);
        expanded.push_str(&resolved);
        rest = &after[end + 1..];
    }
    expanded.push_str(rest);

    Ok(expanded)
}
