use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::duration::parse_duration;
use crate::forge::ForgeKind;
use crate::orchestrator::Descriptions;

/// Configuration file structure for ci-status.
///
/// Lets a repository pin its status descriptions, timeout and forge instead
/// of repeating flags in every pipeline step. Command-line flags always win.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub forge: ForgeConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RunConfig {
    /// Description while the command runs
    #[serde(default = "default_pending_description")]
    pub pending_description: String,

    /// Description when the command exits with 0
    #[serde(default = "default_success_description")]
    pub success_description: String,

    /// Description when the command exits non-zero
    #[serde(default = "default_failure_description")]
    pub failure_description: String,

    /// Maximum run time, e.g. "10m". Unset or "0" means unbounded.
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ForgeConfig {
    /// Strategy to try first
    pub name: Option<ForgeKind>,

    /// Per-request timeout for status API calls
    #[serde(default = "default_api_timeout")]
    pub api_timeout: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Suppress warnings and noop notices
    #[serde(default)]
    pub silent: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            pending_description: default_pending_description(),
            success_description: default_success_description(),
            failure_description: default_failure_description(),
            timeout: None,
        }
    }
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            name: None,
            api_timeout: default_api_timeout(),
        }
    }
}

fn default_pending_description() -> String {
    Descriptions::default().pending
}

fn default_success_description() -> String {
    Descriptions::default().success
}

fn default_failure_description() -> String {
    Descriptions::default().failure
}

fn default_api_timeout() -> String {
    "30s".to_string()
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./ci-status.toml
    /// 3. ./ci-status.json
    /// 4. ./ci-status.yaml
    /// 5. ./ci-status.yml
    ///
    /// Returns default configuration if no file is found. A specified path
    /// that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_in(Path::new("."), path)
    }

    fn load_in(dir: &Path, path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = [
            "ci-status.toml",
            "ci-status.json",
            "ci-status.yaml",
            "ci-status.yml",
        ];

        for candidate in &candidates {
            let path = dir.join(candidate);
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        let config: Self = match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?,
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?,
        };

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.run_timeout()?;
        self.api_timeout()?;
        Ok(())
    }

    pub fn descriptions(&self) -> Descriptions {
        Descriptions {
            pending: self.run.pending_description.clone(),
            success: self.run.success_description.clone(),
            failure: self.run.failure_description.clone(),
        }
    }

    /// Configured command timeout; `None` when unset.
    pub fn run_timeout(&self) -> Result<Option<Duration>> {
        self.run
            .timeout
            .as_deref()
            .map(parse_duration)
            .transpose()
            .context("run.timeout")
    }

    /// Per-request limit for forge API calls. Zero is rejected: an
    /// unbounded call could hang the whole run.
    pub fn api_timeout(&self) -> Result<Duration> {
        let timeout = parse_duration(&self.forge.api_timeout).context("forge.api-timeout")?;
        if timeout.is_zero() {
            anyhow::bail!("forge.api-timeout must be greater than zero");
        }
        Ok(timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.run.pending_description, "Running...");
        assert_eq!(config.run.success_description, "Passed");
        assert_eq!(config.run.failure_description, "Failed");
        assert_eq!(config.run_timeout().unwrap(), None);
        assert_eq!(config.api_timeout().unwrap(), Duration::from_secs(30));
        assert!(config.forge.name.is_none());
        assert!(!config.output.silent);
    }

    #[test]
    fn test_load_toml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        let toml_content = r#"
[run]
pending-description = "Testing..."
timeout = "10m"

[forge]
name = "generic"
api-timeout = "5s"

[output]
silent = true
"#;
        write!(temp_file, "{}", toml_content).unwrap();

        let config = Config::load(Some(temp_file.path())).unwrap();
        assert_eq!(config.run.pending_description, "Testing...");
        assert_eq!(config.run.success_description, "Passed");
        assert_eq!(
            config.run_timeout().unwrap(),
            Some(Duration::from_secs(600))
        );
        assert_eq!(config.forge.name, Some(ForgeKind::Generic));
        assert_eq!(config.api_timeout().unwrap(), Duration::from_secs(5));
        assert!(config.output.silent);
    }

    #[test]
    fn test_load_json_config() {
        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        let json_content = r#"{
  "run": {
    "success-description": "All green",
    "failure-description": "Broken"
  },
  "forge": {
    "name": "github"
  }
}"#;
        write!(temp_file, "{}", json_content).unwrap();

        let config = Config::load(Some(temp_file.path())).unwrap();
        let descriptions = config.descriptions();
        assert_eq!(descriptions.pending, "Running...");
        assert_eq!(descriptions.success, "All green");
        assert_eq!(descriptions.failure, "Broken");
        assert_eq!(config.forge.name, Some(ForgeKind::Github));
    }

    #[test]
    fn test_load_yaml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".yml").unwrap();
        write!(temp_file, "run:\n  timeout: 90s\noutput:\n  silent: true\n").unwrap();

        let config = Config::load(Some(temp_file.path())).unwrap();
        assert_eq!(config.run_timeout().unwrap(), Some(Duration::from_secs(90)));
        assert!(config.output.silent);
    }

    #[test]
    fn test_invalid_duration_is_rejected() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "[run]\ntimeout = \"soon\"\n").unwrap();

        let err = Config::load(Some(temp_file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("soon"));
    }

    #[test]
    fn test_zero_api_timeout_is_rejected() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "[forge]\napi-timeout = \"0\"\n").unwrap();

        let err = Config::load(Some(temp_file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("greater than zero"));

        let mut config = Config::default();
        config.forge.api_timeout = "0s".to_string();
        assert!(config.api_timeout().is_err());
        config.forge.api_timeout = "250ms".to_string();
        assert_eq!(config.api_timeout().unwrap(), Duration::from_millis(250));
    }

    #[test]
    fn test_unknown_forge_is_rejected() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(temp_file, "[forge]\nname = \"gitlab\"\n").unwrap();

        assert!(Config::load(Some(temp_file.path())).is_err());
    }

    #[test]
    fn test_load_nonexistent_explicit_path() {
        assert!(Config::load(Some(Path::new("nonexistent-ci-status.toml"))).is_err());
    }

    #[test]
    fn test_load_from_candidates() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            temp_dir.path().join("ci-status.yaml"),
            "run:\n  pending-description: From yaml\n",
        )
        .unwrap();

        let config = Config::load_in(temp_dir.path(), None).unwrap();
        assert_eq!(config.run.pending_description, "From yaml");
    }

    #[test]
    fn test_load_without_candidates_gives_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = Config::load_in(temp_dir.path(), None).unwrap();
        assert_eq!(config.run.failure_description, "Failed");
    }
}
