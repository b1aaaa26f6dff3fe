//! Runtime configuration loaded from TOML.
//!
//! ```toml
//! database_path = "/var/lib/petitions/petitions.sqlite3"
//!
//! [logging]
//! level = "info"
//! dir = "/var/log/petitions"
//!
//! [diff]
//! max_lcs_cells = 4000000
//! ```
//!
//! Every key is optional; missing keys take the defaults below.

use crate::diff::DiffLimits;
use crate::logging::{default_log_level, normalize_level};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub database_path: PathBuf,
    pub logging: LoggingConfig,
    pub diff: DiffLimits,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("petitions.sqlite3"),
            logging: LoggingConfig::default(),
            diff: DiffLimits::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Must be absolute when logging is started.
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            dir: std::env::temp_dir().join("petition-logs"),
        }
    }
}

impl CoreConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "database_path must not be empty".to_string(),
            ));
        }
        normalize_level(&self.logging.level).map_err(ConfigError::Invalid)?;
        if self.diff.max_lcs_cells == 0 {
            return Err(ConfigError::Invalid(
                "diff.max_lcs_cells must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use crate::diff::DEFAULT_MAX_LCS_CELLS;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn empty_document_uses_defaults() {
        let config = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.diff.max_lcs_cells, DEFAULT_MAX_LCS_CELLS);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = CoreConfig::from_toml_str(
            r#"
database_path = "/tmp/p.sqlite3"

[logging]
level = "WARN"

[diff]
max_lcs_cells = 1000
"#,
        )
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/p.sqlite3"));
        assert_eq!(config.logging.level, "WARN");
        assert_eq!(config.logging.dir, CoreConfig::default().logging.dir);
        assert_eq!(config.diff.max_lcs_cells, 1000);
    }

    #[test]
    fn rejects_zero_cell_limit_and_unknown_level() {
        let err = CoreConfig::from_toml_str("[diff]\nmax_lcs_cells = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = CoreConfig::from_toml_str("[logging]\nlevel = \"loud\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = CoreConfig::from_toml_str("database_path = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file_and_reports_missing_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "database_path = \"/srv/petitions.sqlite3\"").unwrap();
        let config = CoreConfig::load(file.path()).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/srv/petitions.sqlite3"));

        let err = CoreConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
