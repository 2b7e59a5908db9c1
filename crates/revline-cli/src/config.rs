//! User configuration loading from TOML files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Per-user configuration for revline
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub user: UserConfig,
    /// File the configuration was loaded from.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct UserConfig {
    #[serde(deserialize_with = "deserialize_env_var")]
    pub name: Option<String>,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub email: Option<String>,
}

/// `${VAR}` values are read from the environment; unset variables count as absent.
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.and_then(|s| {
        let var = s.strip_prefix("${").and_then(|v| v.strip_suffix('}'));
        match var.map(str::to_owned) {
            Some(var) => std::env::var(var).ok().filter(|v| !v.is_empty()),
            None => Some(s),
        }
    }))
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./revline.toml (current directory)
    /// 2. ~/.config/revline/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("revline.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "revline") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.source = Some(path.to_path_buf());

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Commit author, `name <email>`. Falls back to `$USER`.
    pub fn author(&self) -> String {
        let name = self
            .user
            .name
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "revline".to_string());
        match &self.user.email {
            Some(email) => format!("{name} <{email}>"),
            None => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn author_email_from_environment() {
        std::env::set_var("REVLINE_TEST_EMAIL", "screening@example.org");
        let config: Config = toml::from_str(
            r#"
[user]
name = "Second Reviewer"
email = "${REVLINE_TEST_EMAIL}"
"#,
        )
        .unwrap();
        std::env::remove_var("REVLINE_TEST_EMAIL");
        assert_eq!(config.author(), "Second Reviewer <screening@example.org>");
    }

    #[test]
    fn unset_variable_drops_email() {
        let config: Config = toml::from_str(
            r#"
[user]
name = "Solo"
email = "${REVLINE_UNSET_VAR_93211}"
"#,
        )
        .unwrap();
        assert_eq!(config.user.email, None);
        assert_eq!(config.author(), "Solo");
    }

    #[test]
    fn author_from_toml() {
        let toml = r#"
[user]
name = "Ada Reviewer"
email = "ada@example.org"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.author(), "Ada Reviewer <ada@example.org>");
    }
}
