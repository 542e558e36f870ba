use std::path::{Path, PathBuf};

use crate::error::Error;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = ".docstitch.toml";

/// Project configuration loaded from `.docstitch.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Source file extension appended to command paths, without the dot.
    pub extension: String,
    /// Directory that `~` in command paths expands to, relative to the source root.
    pub home: String,
    /// Directory rendered pages are written to.
    pub output: PathBuf,
    /// Directory holding scenario files.
    pub scenarios: PathBuf,
}

/// Raw TOML structure for `.docstitch.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct DocstitchTomlConfig {
    /// See `Config::extension`.
    extension: Option<String>,
    /// See `Config::home`.
    home: Option<String>,
    /// See `Config::output`.
    output: Option<PathBuf>,
    /// See `Config::scenarios`.
    scenarios: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            extension: "rs".to_string(),
            home: "src".to_string(),
            output: PathBuf::from("output"),
            scenarios: PathBuf::from("scenarios"),
        };
    }
}

impl Config {
    /// Load config from `.docstitch.toml` in the given root directory.
    /// Returns the defaults if the file doesn't exist, and an error if it
    /// exists but is malformed.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };
        return Self::parse(&content);
    }

    /// Parse config from TOML content, filling unset keys with defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed or has unknown keys.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let raw: DocstitchTomlConfig = toml::from_str(content)?;
        let defaults = Self::default();
        return Ok(Self {
            extension: raw
                .extension
                .map_or(defaults.extension, |e| return e.trim_start_matches('.').to_string()),
            home: raw.home.unwrap_or(defaults.home),
            output: raw.output.unwrap_or(defaults.output),
            scenarios: raw.scenarios.unwrap_or(defaults.scenarios),
        });
    }

    /// Apply command-line overrides for the scenario and output directories.
    pub fn with_overrides(mut self, scenarios: Option<PathBuf>, output: Option<PathBuf>) -> Self {
        if let Some(dir) = scenarios {
            self.scenarios = dir;
        }
        if let Some(dir) = output {
            self.output = dir;
        }
        return self;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn keys_override_defaults() {
        let config = Config::parse("home = \"src/main/ts\"\nextension = \".ts\"\noutput = \"site\"").unwrap();
        assert_eq!(config.home, "src/main/ts");
        assert_eq!(config.extension, "ts");
        assert_eq!(config.output, PathBuf::from("site"));
        assert_eq!(config.scenarios, PathBuf::from("scenarios"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(Config::parse("outputs = \"x\""), Err(Error::TomlDe(_))));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn cli_overrides_win() {
        let config = Config::default().with_overrides(Some("docs".into()), None);
        assert_eq!(config.scenarios, PathBuf::from("docs"));
        assert_eq!(config.output, PathBuf::from("output"));
    }
}
