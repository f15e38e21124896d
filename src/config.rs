//! Tool configuration read from `issuegraph.yaml`, plus the API token.

use crate::generate::DEFAULT_TITLE_ATTRIBUTE;
use crate::github::{DEFAULT_API_URL, DEFAULT_PER_PAGE, StateFilter, TOKEN_ENV};
use crate::types::{ColorScheme, DuplicatePolicy, RepoRef};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "issuegraph.yaml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Please set the {0} environment variable")]
    MissingToken(&'static str),
    #[error("{0}")]
    Invalid(String),
}

/// Where issues live and which ones to select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub owner: String,
    pub repo: String,
    pub api_url: String,
    pub labels: Vec<String>,
    /// Extra raw query parameters, e.g. `milestone=3&assignee=octocat`.
    pub query: Option<String>,
    pub state: StateFilter,
    pub per_page: u32,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: "prometheus".to_string(),
            repo: "promcon".to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            labels: vec!["promcon-2019".to_string()],
            query: None,
            state: StateFilter::All,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// Contents of `issuegraph.yaml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GitHubConfig,
    pub colors: ColorScheme,
    pub duplicates: DuplicatePolicy,
    pub title_attribute: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github: GitHubConfig::default(),
            colors: ColorScheme::default(),
            duplicates: DuplicatePolicy::default(),
            title_attribute: DEFAULT_TITLE_ATTRIBUTE.to_string(),
        }
    }
}

impl Config {
    /// Read a config file. Unlike [`Config::discover`], a missing file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        };
        config.validate()?;
        Ok(config)
    }

    /// Use `explicit` if given, else `issuegraph.yaml` in `dir` if present,
    /// else the built-in defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(CONFIG_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Config::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.github.owner.trim().is_empty() || self.github.repo.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "github.owner and github.repo must not be empty".to_string(),
            ));
        }
        if self.github.per_page == 0 {
            return Err(ConfigError::Invalid(
                "github.per_page must be at least 1".to_string(),
            ));
        }
        if self.title_attribute.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "title_attribute must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Issue creation attaches the configured labels to every issue, so at
    /// least one non-blank label is required.
    pub fn require_labels(&self) -> Result<(), ConfigError> {
        if self.github.labels.iter().all(|l| l.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "github.labels must contain at least one label".to_string(),
            ));
        }
        Ok(())
    }

    pub fn repo_ref(&self) -> RepoRef {
        RepoRef::new(&self.github.owner, &self.github.repo)
    }
}

/// Read the API token from the environment.
pub fn github_token() -> Result<String, ConfigError> {
    token_from(std::env::var(TOKEN_ENV).ok())
}

fn token_from(value: Option<String>) -> Result<String, ConfigError> {
    value
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(ConfigError::MissingToken(TOKEN_ENV))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.github.owner, "prometheus");
        assert_eq!(config.github.repo, "promcon");
        assert_eq!(config.github.labels, vec!["promcon-2019"]);
        assert_eq!(config.github.state, StateFilter::All);
        assert_eq!(config.github.per_page, 100);
        assert_eq!(config.colors.open, "coral");
        assert_eq!(config.colors.closed, "chartreuse");
        assert_eq!(config.colors.unmatched, None);
        assert_eq!(config.duplicates, DuplicatePolicy::KeepLast);
        assert_eq!(config.title_attribute, "label");
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "github:\n  owner: acme\n  labels: [roadmap]\ncolors:\n  unmatched: lightgrey\nduplicates: error\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.github.owner, "acme");
        assert_eq!(config.github.repo, "promcon");
        assert_eq!(config.github.labels, vec!["roadmap"]);
        assert_eq!(config.colors.open, "coral");
        assert_eq!(config.colors.unmatched.as_deref(), Some("lightgrey"));
        assert_eq!(config.duplicates, DuplicatePolicy::Error);
    }

    #[test]
    fn test_load_empty_file_is_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "").unwrap();
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }

    #[test]
    fn test_load_invalid_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "github: [not, a, map").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn test_load_rejects_zero_page_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "github:\n  per_page: 0\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_require_labels() {
        let mut config = Config::default();
        assert!(config.require_labels().is_ok());

        config.github.labels = Vec::new();
        assert!(matches!(config.require_labels(), Err(ConfigError::Invalid(_))));

        config.github.labels = vec![" ".to_string()];
        assert!(matches!(config.require_labels(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_discover_without_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::discover(None, dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_discover_finds_file_in_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "github:\n  repo: roadmap\n").unwrap();
        let config = Config::discover(None, dir.path()).unwrap();
        assert_eq!(config.github.repo, "roadmap");
    }

    #[test]
    fn test_discover_explicit_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(matches!(
            Config::discover(Some(&missing), dir.path()),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_token_from() {
        assert_eq!(token_from(Some("abc".to_string())).unwrap(), "abc");
        assert!(matches!(token_from(None), Err(ConfigError::MissingToken(_))));
        assert!(matches!(
            token_from(Some("  ".to_string())),
            Err(ConfigError::MissingToken(_))
        ));
    }
}
