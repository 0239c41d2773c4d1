//! Shared configuration loader for the hilite toolchain.
//!
//! `defaults/hilite.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files on top
//! of those defaults via [`Loader`] before deserializing into [`HiliteConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_TOML: &str = include_str!("../defaults/hilite.default.toml");

/// File picked up from the working directory when no explicit config is given.
pub const LOCAL_CONFIG_FILE: &str = "hilite.toml";

/// Top-level configuration consumed by hilite applications.
#[derive(Debug, Clone, Deserialize)]
pub struct HiliteConfig {
    pub tokenizer: TokenizerConfig,
    pub grammars: GrammarsConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenizerConfig {
    pub max_depth: usize,
    pub include_plain: bool,
}

/// Grammar files registered on top of the bundled grammars.
#[derive(Debug, Clone, Deserialize)]
pub struct GrammarsConfig {
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Filter string understood by env_logger.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Layers sources over the embedded defaults; later sources win key by key.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// A loader holding only the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// The usual lookup for an application run: `explicit` when given (it must exist),
    /// otherwise [LOCAL_CONFIG_FILE] in the working directory if present.
    pub fn discover<P: AsRef<Path>>(explicit: Option<P>) -> Self {
        match explicit {
            Some(path) => Self::new().with_file(path),
            None => Self::new().with_optional_file(LOCAL_CONFIG_FILE),
        }
    }

    /// Layer a TOML file that must exist.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer a TOML file, skipped when absent.
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Set one dotted key (`tokenizer.max_depth`) above every file source.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Merge all sources into a [HiliteConfig]. Unknown log levels and mistyped values fail here.
    pub fn build(self) -> Result<HiliteConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// The embedded defaults alone.
pub fn load_defaults() -> Result<HiliteConfig, ConfigError> {
    Loader::new().build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_default_config() {
        let config = load_defaults().expect("defaults to deserialize");
        assert_eq!(config.tokenizer.max_depth, 32);
        assert!(config.tokenizer.include_plain);
        assert!(config.grammars.paths.is_empty());
        assert_eq!(config.output.format, "tag");
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn supports_overrides() {
        let config = Loader::new()
            .set_override("output.format", "json")
            .expect("override to apply")
            .set_override("tokenizer.max_depth", 4_i64)
            .expect("override to apply")
            .build()
            .expect("config to build");
        assert_eq!(config.output.format, "json");
        assert_eq!(config.tokenizer.max_depth, 4);
    }

    #[test]
    fn layers_user_file_over_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(
            file,
            "[tokenizer]\ninclude_plain = false\n\n[grammars]\npaths = [\"extra.yaml\"]\n\n[logging]\nlevel = \"debug\""
        )
        .expect("write config");

        let config = Loader::new()
            .with_file(file.path())
            .build()
            .expect("config to build");
        assert!(!config.tokenizer.include_plain);
        assert_eq!(config.tokenizer.max_depth, 32);
        assert_eq!(config.grammars.paths, vec![PathBuf::from("extra.yaml")]);
        assert_eq!(config.logging.level.as_filter(), "debug");
    }

    #[test]
    fn optional_file_may_be_missing() {
        let dir = tempfile::tempdir().expect("temp dir");
        let config = Loader::new()
            .with_optional_file(dir.path().join(LOCAL_CONFIG_FILE))
            .build()
            .expect("config to build");
        assert_eq!(config.output.format, "tag");
    }

    #[test]
    fn discover_prefers_explicit_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        writeln!(file, "[output]\nformat = \"yaml\"").expect("write config");

        let config = Loader::discover(Some(file.path()))
            .build()
            .expect("config to build");
        assert_eq!(config.output.format, "yaml");

        let missing = Loader::discover(Some(file.path().with_extension("gone"))).build();
        assert!(missing.is_err());
    }

    #[test]
    fn required_file_must_exist() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = Loader::new()
            .with_file(dir.path().join("missing.toml"))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let result = Loader::new()
            .set_override("logging.level", "loud")
            .expect("override to apply")
            .build();
        assert!(result.is_err());
    }
}
