//! Configuration for metasplit.
//!
//! Config file resolution order:
//! 1. Explicit path passed to Config::load_from()
//! 2. METASPLIT_CONFIG environment variable
//! 3. Default: <config dir>/metasplit/config.toml

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::Deserialize;

use crate::aggregate::CrossSourceMode;
use crate::{Error, Result};

/// metasplit configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Program used to read and project tables.
    #[serde(default = "default_xsv")]
    pub xsv: PathBuf,

    /// Delimiter of the target table.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Delimiter of metadata tables.
    #[serde(default = "default_delimiter")]
    pub metadata_delimiter: char,

    /// How identifier sets from several metadata queries are combined.
    #[serde(default)]
    pub cross_source_mode: CrossSourceMode,
}

fn default_xsv() -> PathBuf {
    PathBuf::from("xsv")
}

fn default_delimiter() -> char {
    ','
}

impl Default for Config {
    fn default() -> Self {
        Self {
            xsv: default_xsv(),
            delimiter: default_delimiter(),
            metadata_delimiter: default_delimiter(),
            cross_source_mode: CrossSourceMode::default(),
        }
    }
}

impl Config {
    /// Load config from the default location, or use defaults.
    pub fn load() -> Result<Self> {
        match resolve_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a specific file; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, delimiter) in [
            ("delimiter", self.delimiter),
            ("metadata_delimiter", self.metadata_delimiter),
        ] {
            if !delimiter.is_ascii() {
                return Err(Error::Config(format!(
                    "{} must be a single ASCII character, got '{}'",
                    name, delimiter
                )));
            }
        }
        Ok(())
    }
}

/// Parse a delimiter argument: one ASCII character, or `\t` / `tab`.
pub fn parse_delimiter(s: &str) -> Result<char> {
    if s == "\\t" || s.eq_ignore_ascii_case("tab") {
        return Ok('\t');
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        _ => Err(Error::Config(format!(
            "Delimiter must be a single ASCII character, got '{}'",
            s
        ))),
    }
}

/// Resolve the config file path using the standard resolution order.
fn resolve_config_path() -> Option<PathBuf> {
    // 1. Environment variable
    if let Ok(path) = std::env::var("METASPLIT_CONFIG") {
        return Some(PathBuf::from(path));
    }

    // 2. Platform config directory (via directories crate)
    ProjectDirs::from("", "", "metasplit").map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.xsv, PathBuf::from("xsv"));
        assert_eq!(config.delimiter, ',');
        assert_eq!(config.metadata_delimiter, ',');
        assert_eq!(config.cross_source_mode, CrossSourceMode::Union);
    }

    #[test]
    fn test_config_missing_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let loaded = Config::load_from(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_config_full_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "xsv = \"/opt/bin/xsv\"\n\
             delimiter = \"\\t\"\n\
             metadata_delimiter = \";\"\n\
             cross_source_mode = \"intersect\"\n",
        )
        .unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(
            loaded,
            Config {
                xsv: PathBuf::from("/opt/bin/xsv"),
                delimiter: '\t',
                metadata_delimiter: ';',
                cross_source_mode: CrossSourceMode::Intersect,
            }
        );
    }

    #[test]
    fn test_config_partial_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "cross_source_mode = \"intersect\"\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.cross_source_mode, CrossSourceMode::Intersect);
        assert_eq!(loaded.delimiter, ',');
    }

    #[test]
    fn test_config_invalid_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "delimiter = 12\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_config_non_ascii_delimiter() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "delimiter = \"§\"\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter(",").unwrap(), ',');
        assert_eq!(parse_delimiter("\\t").unwrap(), '\t');
        assert_eq!(parse_delimiter("tab").unwrap(), '\t');
        assert_eq!(parse_delimiter("\t").unwrap(), '\t');
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter(",,").is_err());
    }
}
