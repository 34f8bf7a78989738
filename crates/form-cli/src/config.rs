use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use form_spec::Mode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::CliResult;

/// Environment variable naming a configuration file when `--config` is absent.
pub const CONFIG_ENV: &str = "FORMKIT_CONFIG";

/// Settings shared by every subcommand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Mode used when a command does not pass `--mode`.
    #[serde(default)]
    pub default_mode: Mode,
    /// Values merged over schema defaults before any values file.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub prefill: Map<String, Value>,
    /// Tracing filter directive, overridden by `FORMKIT_LOG`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl CliConfig {
    /// Loads the explicit path, else `FORMKIT_CONFIG`, else defaults.
    pub fn load(explicit: Option<&Path>) -> CliResult<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => env::var_os(CONFIG_ENV)
                .filter(|value| !value.is_empty())
                .map(PathBuf::from),
        };
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(&path)
            .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config = serde_json::from_str(&contents)
            .map_err(|err| format!("failed to parse config {}: {}", path.display(), err))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, r#"{{ "default_mode": "edit" }}"#).expect("write");
        let config = CliConfig::load(Some(file.path())).expect("config");
        assert_eq!(config.default_mode, Mode::Edit);
        assert!(config.prefill.is_empty());
        assert!(config.log_filter.is_none());
    }

    #[test]
    fn unreadable_path_is_an_error() {
        let err = CliConfig::load(Some(Path::new("/nonexistent/formkit.json"))).expect_err("missing");
        assert!(err.to_string().contains("failed to read config"));
    }
}
